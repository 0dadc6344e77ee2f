//! Minimal HTTP/1.1 collector that records every POST for integration tests.
//!
//! Each connection carries one request (`Connection: close`). Responses
//! follow a status script; once it runs out, every request gets 200.

use std::collections::{HashMap, VecDeque};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

/// One request as received by the collector.
#[derive(Debug, Clone)]
pub struct Received {
    pub method: String,
    /// Header names lowercased.
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl Received {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn chunk_index(&self) -> usize {
        self.header("x-chunk-index").unwrap().parse().unwrap()
    }
}

#[derive(Clone)]
pub struct Collector {
    pub url: String,
    received: Arc<Mutex<Vec<Received>>>,
}

impl Collector {
    pub fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.received().iter().map(Received::chunk_index).collect()
    }
}

/// Starts a collector answering 200 to everything.
pub fn start() -> Collector {
    start_with_script(Vec::new())
}

/// Starts a collector answering with `statuses` in order, then 200.
pub fn start_with_script(statuses: Vec<u16>) -> Collector {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));
    let script = Arc::new(Mutex::new(VecDeque::from(statuses)));
    let received_srv = Arc::clone(&received);
    thread::spawn(move || {
        // Requests are sequential by construction; handle them inline so the
        // script is consumed in arrival order.
        for stream in listener.incoming().flatten() {
            handle(stream, &received_srv, &script);
        }
    });
    Collector {
        url: format!("http://127.0.0.1:{}/upload", port),
        received,
    }
}

/// A URL on which nothing is listening.
pub fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/upload", port)
}

fn handle(
    mut stream: TcpStream,
    received: &Mutex<Vec<Received>>,
    script: &Mutex<VecDeque<u16>>,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(request) = read_request(&mut stream) else {
        return;
    };
    let status = script.lock().unwrap().pop_front().unwrap_or(200);
    received.lock().unwrap().push(request);
    let reason = if (200..300).contains(&status) { "OK" } else { "Error" };
    let body = format!("{{\"status\":{}}}", status);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Reads request line, headers and a Content-Length body.
fn read_request(stream: &mut TcpStream) -> Option<Received> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let head = std::str::from_utf8(&buf[..header_end]).ok()?;
    let mut lines = head.split("\r\n");
    let method = lines.next()?.split_whitespace().next()?.to_string();
    let mut headers = HashMap::new();
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
        }
    }
    let content_length: usize = headers
        .get("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(content_length);
    Some(Received {
        method,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
