use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::response::Response;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response into HTTP/1.1 wire bytes.
///
/// Status line and header text are written as Latin-1. Code points above
/// 255 become `?`, and CR/LF become spaces so no field can end a line early.
pub fn serialize_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256 + resp.body.as_ref().map_or(0, Vec::len));

    // Status line
    let status_line = format!(
        "{} {} {}",
        HTTP_VERSION,
        resp.status.as_u16(),
        resp.reason
    );
    push_latin1(&mut buf, &status_line);
    buf.extend_from_slice(b"\r\n");

    // Headers
    for (k, v) in &resp.headers {
        push_latin1(&mut buf, k);
        buf.extend_from_slice(b": ");
        push_latin1(&mut buf, v);
        buf.extend_from_slice(b"\r\n");
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    // Body
    if let Some(body) = &resp.body {
        buf.extend_from_slice(body);
    }

    buf
}

fn push_latin1(buf: &mut Vec<u8>, text: &str) {
    buf.extend(text.chars().map(|c| match c {
        '\r' | '\n' => b' ',
        c if (c as u32) <= 0xFF => c as u32 as u8,
        _ => b'?',
    }));
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

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Writes the whole serialized response, then flushes.
    pub async fn write_to_stream<S>(&mut self, stream: &mut S) -> std::io::Result<()>
    where
        S: AsyncWrite + Unpin,
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
}
