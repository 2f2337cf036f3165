//! Shared test transport.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;
use tickline_core::{NetworkError, NetworkResult, Request, ResponseHeaders, Transport, TransportReply};

/// A transport whose replies are chosen by URL path.
///
/// - `/ok` replies 200 with body `ok`
/// - `/timeout` fails with a timeout
/// - `/status/<code>` replies with that status and body `status body`
/// - `/echo` replies 200 with the request body and an `x-method` header
/// - `/panic` panics
/// - `/gate/<name>` blocks until [`StubTransport::release`] is called for
///   `name`, then replies 200 with body `name`
#[derive(Default)]
pub struct StubTransport {
    gates: Mutex<HashMap<String, (Sender<()>, Receiver<()>)>>,
    seen: Mutex<Vec<Request>>,
}

impl StubTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn gate(&self, name: &str) -> (Sender<()>, Receiver<()>) {
        self.gates
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| bounded(1))
            .clone()
    }

    /// Let the request blocked on `name` finish.
    pub fn release(&self, name: &str) {
        self.gate(name).0.send(()).unwrap();
    }

    /// Every request performed so far.
    pub fn seen(&self) -> Vec<Request> {
        self.seen.lock().clone()
    }
}

impl Transport for StubTransport {
    fn perform(&self, request: &Request) -> NetworkResult<TransportReply> {
        self.seen.lock().push(request.clone());

        let path = url::Url::parse(&request.url)
            .map(|url| url.path().to_string())
            .unwrap_or_default();

        if let Some(name) = path.strip_prefix("/gate/") {
            let rx = self.gate(name).1;
            rx.recv_timeout(Duration::from_secs(10))
                .map_err(|_| NetworkError::Timeout)?;
            return Ok(reply(200, name));
        }
        if let Some(code) = path.strip_prefix("/status/") {
            let status = code.parse().unwrap_or(500);
            return Ok(reply(status, "status body"));
        }

        match path.as_str() {
            "/ok" => Ok(reply(200, "ok")),
            "/timeout" => Err(NetworkError::Timeout),
            "/panic" => panic!("stub transport panic"),
            "/echo" => {
                let mut reply = reply(200, request.body.as_deref().unwrap_or(""));
                reply
                    .headers
                    .insert("x-method".into(), request.method.as_str().into());
                Ok(reply)
            }
            _ => Ok(reply(404, "")),
        }
    }
}

pub fn reply(status: u16, body: &str) -> TransportReply {
    TransportReply {
        status,
        body: body.to_string(),
        headers: ResponseHeaders::new(),
    }
}
