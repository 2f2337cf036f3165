//! Synchronous file downloads.
//!
//! The body is streamed into a temporary file beside the destination and
//! persisted over it only once the transfer succeeded. A failed download
//! never leaves a partial file at the destination path.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{NetworkError, NetworkResult};
use crate::logging::{span_names, targets};
use crate::request::Request;
use crate::transport::Transport;

/// Download `url` to `path`, returning the number of bytes written.
///
/// Blocks for the whole transfer. Fails on transport errors, on a status of
/// 400 or above, and on any filesystem error.
pub fn download_to_path<H: AsRef<str>>(
    transport: &dyn Transport,
    url: &str,
    path: impl AsRef<Path>,
    headers: &[H],
) -> NetworkResult<u64> {
    let path = path.as_ref();
    let request = Request::get(url).headers(headers.iter().map(|h| h.as_ref().to_string()));
    request.validate()?;

    let span = tracing::debug_span!(
        target: targets::DOWNLOAD,
        span_names::DOWNLOAD,
        url,
        path = %path.display()
    );
    let _entered = span.enter();

    let dir = parent_dir(path);
    let temp = tempfile::Builder::new()
        .prefix(".tickline-")
        .suffix(".part")
        .tempfile_in(&dir)?;

    let mut writer = BufWriter::new(temp);
    let written = transport.download(&request, &mut writer)?;
    writer.flush()?;
    let temp = writer
        .into_inner()
        .map_err(|err| NetworkError::Io(err.error().to_string()))?;

    temp.persist(path)
        .map_err(|err| NetworkError::Io(err.error.to_string()))?;

    tracing::debug!(target: targets::DOWNLOAD, bytes = written, "download complete");
    Ok(written)
}

/// Download `url` to `path`, reporting only whether it worked.
///
/// Failures are logged at `warn`.
pub fn download_file<H: AsRef<str>>(
    transport: &dyn Transport,
    url: &str,
    path: impl AsRef<Path>,
    headers: &[H],
) -> bool {
    let path = path.as_ref();
    match download_to_path(transport, url, path, headers) {
        Ok(_) => true,
        Err(err) => {
            tracing::warn!(
                target: targets::DOWNLOAD,
                url,
                path = %path.display(),
                "download failed: {}",
                err
            );
            false
        }
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
