use std::collections::HashMap;

/// HTTP status codes produced by the server.
///
/// - `Ok` (200): File served
/// - `BadRequest` (400): Malformed request line
/// - `Forbidden` (403): Target resolves outside the document root
/// - `NotFound` (404): No such file
/// - `MethodNotAllowed` (405): Anything but GET or HEAD
/// - `RequestHeaderFieldsTooLarge` (431): Header section over the limit
/// - `InternalServerError` (500): Everything else
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK
    Ok,
    /// 400 Bad Request
    BadRequest,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
}

impl StatusCode {
    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::BadRequest => 400,
            StatusCode::Forbidden => 403,
            StatusCode::NotFound => 404,
            StatusCode::MethodNotAllowed => 405,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::InternalServerError => 500,
        }
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use lantern::http::response::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotFound.reason_phrase(), "Not Found");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::Forbidden => "Forbidden",
            StatusCode::NotFound => "Not Found",
            StatusCode::MethodNotAllowed => "Method Not Allowed",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// Represents a complete HTTP response ready to be sent to a client.
#[derive(Debug)]
pub struct Response {
    /// The HTTP status code
    pub status: StatusCode,
    /// Reason phrase written on the status line
    pub reason: String,
    /// HTTP headers as key-value pairs
    pub headers: HashMap<String, String>,
    /// Response body; `None` for headers-only responses
    pub body: Option<Vec<u8>>,
}

/// Builder for constructing HTTP responses in a fluent style.
///
/// # Example
///
/// ```
/// # use lantern::http::response::{ResponseBuilder, StatusCode};
/// let response = ResponseBuilder::new(StatusCode::Ok)
///     .header("Content-Type", "text/html")
///     .body(b"<html></html>".to_vec())
///     .build();
///
/// assert_eq!(response.headers["Content-Length"], "13");
/// ```
pub struct ResponseBuilder {
    status: StatusCode,
    reason: Option<String>,
    headers: HashMap<String, String>,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    /// Creates a new response builder with the specified status code.
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            reason: None,
            headers: HashMap::new(),
            body: None,
        }
    }

    /// Overrides the standard reason phrase.
    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Adds or replaces a header.
    ///
    /// Any `ToString` value is accepted, so sizes can be passed as integers:
    ///
    /// ```ignore
    /// builder.header("Content-Length", metadata.len())
    ///     .header("Connection", "close")
    /// ```
    pub fn header(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.headers.insert(key.into(), value.to_string());
        self
    }

    /// Sets the response body.
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    /// Builds the final Response.
    ///
    /// When a body is present and no Content-Length was given, one matching
    /// the body length is added.
    pub fn build(mut self) -> Response {
        if let Some(body) = &self.body {
            self.headers
                .entry("Content-Length".to_string())
                .or_insert_with(|| body.len().to_string());
        }

        Response {
            status: self.status,
            reason: self
                .reason
                .unwrap_or_else(|| self.status.reason_phrase().to_string()),
            headers: self.headers,
            body: self.body,
        }
    }
}

impl Response {
    /// Creates a 400 Bad Request response.
    pub fn bad_request() -> Self {
        ResponseBuilder::new(StatusCode::BadRequest)
            .header("Connection", "close")
            .body(b"Bad Request".to_vec())
            .build()
    }

    /// Creates a 431 Request Header Fields Too Large response.
    pub fn headers_too_large() -> Self {
        ResponseBuilder::new(StatusCode::RequestHeaderFieldsTooLarge)
            .header("Connection", "close")
            .body(b"Request Header Fields Too Large".to_vec())
            .build()
    }

    /// Creates a 500 Internal Server Error response.
    ///
    /// The error message becomes the reason phrase; the body is fixed.
    pub fn internal_error(reason: impl Into<String>) -> Self {
        ResponseBuilder::new(StatusCode::InternalServerError)
            .reason(reason)
            .body(b"Internal Server Error".to_vec())
            .build()
    }

    /// Looks up a header by exact name.
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|v| v.as_str())
    }
}
