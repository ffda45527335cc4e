use crate::http::request::{Method, Request};
use crate::http::response::Response;
use crate::static_files::StaticFiles;

/// Dispatches a request by method.
///
/// GET and HEAD go to the static file handler; every other method is
/// answered with 405 without looking at the target.
pub async fn route(request: &Request, files: &StaticFiles) -> anyhow::Result<Response> {
    match &request.method {
        Method::GET => files.get(&request.target).await,
        Method::HEAD => files.head(&request.target).await,
        Method::Other(_) => Ok(files.method_not_allowed()),
    }
}
