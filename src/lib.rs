//! Lantern - static file server
//!
//! Core library: HTTP request parsing, static file resolution, response
//! serialization and the connection server.

pub mod config;
pub mod http;
pub mod server;
pub mod static_files;
