//! Connection acceptance and worker dispatch.

pub mod dispatch;
pub mod listener;

pub use dispatch::{DispatchError, Dispatcher};
pub use listener::{Server, run};
