//! Canned-response HTTP server for exercising the real clients in tests.

use crate::config::HttpSettings;
use crate::transport::Transport;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A request as seen by [`serve`]: head (request line plus headers) and body.
#[derive(Debug, Clone)]
pub struct Captured {
    pub head: String,
    pub body: String,
}

/// Answer one connection per entry in `responses`, in order, then stop.
///
/// Returns the base URL (`http://127.0.0.1:PORT`) and the captured requests.
pub async fn serve(responses: Vec<(u16, String)>) -> (String, Arc<Mutex<Vec<Captured>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let captured = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&captured);

    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut socket).await;
            sink.lock().unwrap().push(request);

            let reply = format!(
                "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = socket.write_all(reply.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    (format!("http://{}", addr), captured)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(split) = text.find("\r\n\r\n") {
            let head = text[..split].to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= split + 4 + content_length {
                let body = String::from_utf8_lossy(&buf[split + 4..split + 4 + content_length])
                    .to_string();
                return Captured { head, body };
            }
        }
    }
    Captured {
        head: String::from_utf8_lossy(&buf).to_string(),
        body: String::new(),
    }
}

/// A transport with short backoff so retry tests stay fast.
pub fn fast_transport(max_retries: usize) -> Transport {
    Transport::new(&HttpSettings {
        timeout_secs: 5,
        max_retries,
        base_delay_ms: 1,
        max_delay_secs: 1,
    })
    .unwrap()
}
