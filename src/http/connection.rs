use std::io;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::router::route;
use crate::http::writer::ResponseWriter;
use crate::static_files::StaticFiles;

/// Per-connection limits.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Upper bound on each individual socket read.
    pub read_timeout: Duration,
    /// Largest header section accepted before the empty line.
    pub max_header_bytes: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(10),
            max_header_bytes: 8192,
        }
    }
}

/// One accepted client connection, served exactly once and then closed.
pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    files: Arc<StaticFiles>,
    settings: ConnectionSettings,
    state: ConnectionState,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter),
    Closed,
}

/// Why reading a request stopped.
#[derive(Debug)]
pub enum ReadError {
    /// The peer closed or reset the connection before the request was complete.
    Reset,
    /// A single read waited longer than the read timeout.
    TimedOut,
    Parse(ParseError),
    Io(io::Error),
}

impl From<io::Error> for ReadError {
    fn from(err: io::Error) -> Self {
        if is_reset(&err) {
            ReadError::Reset
        } else {
            ReadError::Io(err)
        }
    }
}

fn is_reset(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, files: Arc<StaticFiles>, settings: ConnectionSettings) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(4096),
            files,
            settings,
            state: ConnectionState::Reading,
        }
    }

    /// Reads one request, answers it and closes the connection.
    ///
    /// A reset or a read timeout closes the connection without a response.
    /// Errors are only returned when writing the response fails for another
    /// reason; the stream is shut down either way.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let result = self.drive().await;
        let _ = self.stream.shutdown().await;
        result
    }

    async fn drive(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => match self.read_request().await {
                    Ok(req) => {
                        self.state = ConnectionState::Processing(req);
                    }
                    Err(ReadError::Reset) => {
                        tracing::debug!("Connection reset by peer");
                    }
                    Err(ReadError::TimedOut) => {
                        tracing::debug!(
                            timeout_secs = self.settings.read_timeout.as_secs(),
                            "Timed out waiting for request"
                        );
                    }
                    Err(ReadError::Parse(e)) => {
                        tracing::warn!(error = %e, "Rejecting request");
                        let response = match e {
                            ParseError::HeadersTooLarge => Response::headers_too_large(),
                            _ => Response::bad_request(),
                        };
                        self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                    }
                    Err(ReadError::Io(e)) => {
                        tracing::error!(error = %e, "Failed to read request");
                        let response = Response::internal_error(e.to_string());
                        self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                    }
                },

                ConnectionState::Processing(req) => {
                    let response = match route(&req, &self.files).await {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(
                                error = %format!("{:#}", e),
                                method = %req.method,
                                path = %req.target,
                                "Request handling failed"
                            );
                            Response::internal_error(e.to_string())
                        }
                    };

                    tracing::info!(
                        method = %req.method,
                        path = %req.target,
                        status = response.status.as_u16(),
                        "Request handled"
                    );

                    self.state = ConnectionState::Writing(ResponseWriter::new(&response));
                }

                ConnectionState::Writing(mut writer) => {
                    if let Err(e) = writer.write_to_stream(&mut self.stream).await {
                        if is_reset(&e) {
                            tracing::debug!("Peer went away while writing response");
                        } else {
                            return Err(anyhow::Error::new(e).context("failed to write response"));
                        }
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> Result<Request, ReadError> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((_, consumed)) if consumed > self.settings.max_header_bytes => {
                    // A single read can carry the buffer past the bound
                    return Err(ReadError::Parse(ParseError::HeadersTooLarge));
                }
                Ok((request, _)) => return Ok(request),
                Err(ParseError::Incomplete) => {}
                Err(e) => return Err(ReadError::Parse(e)),
            }

            if self.buffer.len() >= self.settings.max_header_bytes {
                return Err(ReadError::Parse(ParseError::HeadersTooLarge));
            }

            let n = timeout(
                self.settings.read_timeout,
                self.stream.read_buf(&mut self.buffer),
            )
            .await
            .map_err(|_| ReadError::TimedOut)??;

            if n == 0 {
                return Err(ReadError::Reset);
            }
        }
    }
}
