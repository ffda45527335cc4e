//! Static file serving.
//!
//! - **`resolve`**: maps a decoded request target to a file under the
//!   document root, refusing anything that escapes it
//! - **`handler`**: builds GET and HEAD responses for a resolved target

pub mod handler;
pub mod resolve;

pub use handler::StaticFiles;
pub use resolve::{Resolution, resolve};
