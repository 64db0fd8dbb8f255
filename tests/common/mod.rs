//! Shared drivers and servers for integration tests.
#![allow(dead_code)]

use std::{
    io::{BufRead, BufReader, Read, Write},
    net::{SocketAddr, TcpListener},
    sync::{mpsc, Arc, Mutex},
    thread,
    time::Duration,
};

use telemetry_logging::{DeliveryError, Driver, Event};

/// Records every delivered event.
#[derive(Default)]
pub struct RecordingDriver {
    events: Mutex<Vec<Event>>,
}

impl RecordingDriver {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|event| event.message().to_string())
            .collect()
    }
}

impl Driver for RecordingDriver {
    fn deliver(&self, event: &Event) -> Result<(), DeliveryError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Appends its label to a shared call log on every delivery.
pub struct SequenceDriver {
    pub label: &'static str,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl Driver for SequenceDriver {
    fn deliver(&self, _event: &Event) -> Result<(), DeliveryError> {
        self.calls.lock().unwrap().push(self.label);
        Ok(())
    }
}

/// Always fails.
pub struct FailingDriver;

impl Driver for FailingDriver {
    fn deliver(&self, _event: &Event) -> Result<(), DeliveryError> {
        Err(DeliveryError::transport("connection refused"))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// A captured HTTP request.
#[derive(Debug)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Start a one-request HTTP backend that answers with `status` and hands the
/// request it saw to the returned receiver.
pub fn start_capture_backend(status: u16) -> (SocketAddr, mpsc::Receiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let (sender, receiver) = mpsc::channel();

    thread::spawn(move || {
        let Ok((mut socket, _)) = listener.accept() else {
            return;
        };
        socket
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();

        let mut reader = BufReader::new(socket.try_clone().unwrap());
        let mut request_line = String::new();
        reader.read_line(&mut request_line).unwrap();

        let mut headers = Vec::new();
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            let line = line.trim_end();
            if line.is_empty() {
                break;
            }
            if let Some((key, value)) = line.split_once(':') {
                headers.push((key.trim().to_string(), value.trim().to_string()));
            }
        }

        let length = headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("content-length"))
            .and_then(|(_, value)| value.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).unwrap();

        let reason = match status {
            200 => "OK",
            201 => "Created",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Unknown",
        };
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            status, reason
        );
        let _ = socket.write_all(response.as_bytes());
        let _ = socket.flush();

        let _ = sender.send(CapturedRequest {
            request_line: request_line.trim_end().to_string(),
            headers,
            body: String::from_utf8(body).unwrap(),
        });
    });

    (addr, receiver)
}
