use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Files are sent in chunks of this size.
pub const CHUNK_SIZE: usize = 1024;

pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::new();

    // Status line
    let status_line = format!(
        "{} {} {}\r\n",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.status.reason_phrase()
    );
    buf.extend_from_slice(status_line.as_bytes());

    for (k, v) in &resp.headers {
        buf.extend_from_slice(k.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(v.as_bytes());
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf.extend_from_slice(&resp.body);

    buf
}

pub struct ResponseWriter {
    buffer: Vec<u8>,
    written: usize,
}

impl ResponseWriter {
    pub fn new(response: &Response) -> Self {
        Self {
            buffer: serialize_response(response),
            written: 0,
        }
    }

    pub async fn write_to_stream<W>(&mut self, stream: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        while self.written < self.buffer.len() {
            let n = stream.write(&self.buffer[self.written..]).await?;

            if n == 0 {
                return Err(std::io::ErrorKind::WriteZero.into());
            }

            self.written += n;
        }

        stream.flush().await
    }

    /// Writes the response followed by everything `source` yields, copied in
    /// `CHUNK_SIZE` pieces. Returns the number of body bytes streamed.
    pub async fn write_with_body<W, R>(
        &mut self,
        stream: &mut W,
        source: &mut R,
    ) -> std::io::Result<u64>
    where
        W: AsyncWrite + Unpin,
        R: AsyncRead + Unpin,
    {
        self.write_to_stream(stream).await?;

        let mut chunk = [0u8; CHUNK_SIZE];
        let mut sent = 0u64;
        loop {
            let n = source.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            stream.write_all(&chunk[..n]).await?;
            sent += n as u64;
        }

        stream.flush().await?;
        Ok(sent)
    }
}

/// Sends one of the fixed-body responses (400/404/empty 200).
pub async fn send<W>(stream: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    ResponseWriter::new(response).write_to_stream(stream).await
}
