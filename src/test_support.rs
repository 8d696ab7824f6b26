//! Fixtures shared by the unit tests of several modules

use std::path::Path;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

/// An MPEG frame header followed by padding is enough for id3 to work with.
pub fn mp3_bytes() -> Vec<u8> {
    let mut data = vec![0xFF, 0xFB, 0x90, 0x64];
    data.resize(418, 0);
    data
}

/// `fLaC` marker, a lone STREAMINFO block and a few bytes of "audio"
pub fn flac_bytes() -> Vec<u8> {
    let mut data = b"fLaC".to_vec();
    data.extend_from_slice(&[0x80, 0x00, 0x00, 0x22]);
    data.extend_from_slice(&[0u8; 34]);
    data.extend_from_slice(&[0xFF, 0xF8, 0x00, 0x00]);
    data
}

pub fn write_fake_audio(path: &Path) {
    let data = match path.extension().and_then(|e| e.to_str()) {
        Some("flac") => flac_bytes(),
        _ => mp3_bytes(),
    };
    std::fs::write(path, data).unwrap();
}

/// Serve a single HTTP response on a local port, returning a thumbnail base URL
pub async fn serve_once(status_line: &'static str, body: &'static [u8]) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 {}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_line,
                body.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(body).await;
            let _ = socket.shutdown().await;
        }
    });
    Url::parse(&format!("http://{}/vi/", addr)).unwrap()
}

/// A base URL on a port nothing listens on
pub fn refused_base() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("http://{}/vi/", addr)).unwrap()
}
