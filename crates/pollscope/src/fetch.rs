use anyhow::{bail, Context, Result};
use pollscope_core::Update;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// One feed cycle: GET /update.json from the monitor endpoint. The server
/// closes the connection after each response, so the body is simply the
/// remainder of the stream.
pub async fn fetch_update(addr: &str) -> Result<Update> {
    let mut stream = TcpStream::connect(addr)
        .await
        .with_context(|| format!("connecting to feed at {addr}"))?;

    let request = format!("GET /update.json HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await?;

    let text = String::from_utf8(response).context("feed response is not UTF-8")?;
    let (head, body) = text
        .split_once("\r\n\r\n")
        .context("malformed HTTP response from feed")?;
    let status = head.lines().next().unwrap_or_default();
    if !status.contains(" 200 ") {
        bail!("feed returned {status}");
    }

    serde_json::from_str(body).context("invalid update payload")
}
