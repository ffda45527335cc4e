//! HTTP protocol implementation.
//!
//! A deliberately small HTTP/1.1 server side: one request per connection,
//! GET and HEAD only, no request bodies.
//!
//! # Architecture
//!
//! - **`connection`**: Per-connection state machine, from first byte to close
//! - **`parser`**: Parses a request head out of a byte buffer
//! - **`request`**: HTTP request representation
//! - **`router`**: Method dispatch to the static file handler
//! - **`response`**: HTTP response representation with builder pattern
//! - **`writer`**: Serializes and writes HTTP responses to the client
//! - **`mime`**: MIME type detection based on file extensions
//!
//! # Connection State Machine
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← Wait for the empty line ending the headers
//!        └──────┬──────┘
//!               │ Request parsed         ── reset / timeout ──┐
//!               ▼                                             │
//!        ┌──────────────────┐                                 │
//!        │   Processing     │ ← Route and build the response  │
//!        └──────┬───────────┘                                 │
//!               │ Response ready (or 400/431/500)             │
//!               ▼                                             │
//!        ┌──────────────────┐                                 │
//!        │    Writing       │ ← Single buffered write         │
//!        └──────┬───────────┘                                 │
//!               ▼                                             │
//!        ┌──────────────────┐                                 │
//!        │     Closed       │ ◄───────────────────────────────┘
//!        └──────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use lantern::http::connection::{Connection, ConnectionSettings};
//! use lantern::static_files::StaticFiles;
//! use std::sync::Arc;
//! use tokio::net::TcpListener;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let files = Arc::new(StaticFiles::new("www", "Lantern")?);
//!     let listener = TcpListener::bind("127.0.0.1:8000").await?;
//!
//!     loop {
//!         let (socket, _addr) = listener.accept().await?;
//!         let files = files.clone();
//!         tokio::spawn(async move {
//!             let conn = Connection::new(socket, files, ConnectionSettings::default());
//!             if let Err(e) = conn.run().await {
//!                 eprintln!("Connection error: {}", e);
//!             }
//!         });
//!     }
//! }
//! ```

pub mod request;
pub mod response;
pub mod parser;
pub mod connection;
pub mod router;
pub mod writer;
pub mod mime;
