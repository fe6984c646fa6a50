//! テスト用の最小HTTPサーバ
//!
//! 全リクエストに同じレスポンスを返し、受信したリクエストを記録する。

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    /// 受信したリクエスト（ヘッダ+ボディをlossyに文字列化）
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn serve(status: u16, content_type: &str, body: Vec<u8>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));

    let recorded = Arc::clone(&requests);
    let content_type = content_type.to_string();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            let recorded = Arc::clone(&recorded);
            let content_type = content_type.clone();
            let body = body.clone();
            tokio::spawn(async move {
                handle(stream, status, &content_type, &body, recorded).await;
            });
        }
    });

    TestServer {
        base_url: format!("http://{}", addr),
        requests,
    }
}

async fn handle(
    mut stream: TcpStream,
    status: u16,
    content_type: &str,
    body: &[u8],
    recorded: Arc<Mutex<Vec<String>>>,
) {
    let request = read_request(&mut stream).await;
    recorded
        .lock()
        .unwrap()
        .push(String::from_utf8_lossy(&request).into_owned());

    let header = format!(
        "HTTP/1.1 {} TEST\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(header.as_bytes()).await;
    let _ = stream.write_all(body).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        data.extend_from_slice(&buf[..n]);
        if request_complete(&data) {
            break;
        }
    }
    data
}

fn request_complete(data: &[u8]) -> bool {
    let Some(header_end) = find(data, b"\r\n\r\n") else {
        return false;
    };
    let header = String::from_utf8_lossy(&data[..header_end]).to_lowercase();
    let body = &data[header_end + 4..];

    for line in header.lines() {
        if let Some(value) = line.strip_prefix("content-length:") {
            let length: usize = value.trim().parse().unwrap_or(0);
            return body.len() >= length;
        }
    }
    if header.contains("transfer-encoding: chunked") {
        return body.ends_with(b"0\r\n\r\n");
    }
    true
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
