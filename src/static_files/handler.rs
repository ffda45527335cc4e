use anyhow::{Context, Result, bail};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::http::mime;
use crate::http::response::{Response, ResponseBuilder, StatusCode};
use crate::static_files::resolve::{Resolution, resolve};

/// Serves files from a document root.
///
/// Shared read-only between all connections.
#[derive(Debug, Clone)]
pub struct StaticFiles {
    root: PathBuf,
    server_name: String,
}

impl StaticFiles {
    /// Creates a handler for `root`, which must be an existing directory.
    ///
    /// The root is canonicalized once here; every resolved path is checked
    /// against this canonical form.
    pub fn new(root: impl AsRef<Path>, server_name: impl Into<String>) -> Result<Self> {
        let root = root.as_ref();
        let canonical = std::fs::canonicalize(root)
            .with_context(|| format!("document root {} is not accessible", root.display()))?;

        if !canonical.is_dir() {
            bail!("document root {} is not a directory", root.display());
        }

        Ok(Self {
            root: canonical,
            server_name: server_name.into(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Full response for `target`: headers plus the whole file as body.
    pub async fn get(&self, target: &str) -> Result<Response> {
        let (path, metadata) = match self.lookup(target).await? {
            Resolution::File { path, metadata } => (path, metadata),
            Resolution::NotFound => {
                return Ok(self
                    .base(StatusCode::NotFound)
                    .header("Connection", "close")
                    .build());
            }
            Resolution::Forbidden => return Ok(self.forbidden()),
        };

        let body = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;

        tracing::debug!(path = %path.display(), bytes = body.len(), "Serving file");

        Ok(self
            .describe(&path, &metadata)
            .header("Content-Length", body.len())
            .body(body)
            .build())
    }

    /// Headers-only response describing what `get` would send for `target`.
    pub async fn head(&self, target: &str) -> Result<Response> {
        match self.lookup(target).await? {
            Resolution::File { path, metadata } => Ok(self
                .describe(&path, &metadata)
                .header("Content-Length", metadata.len())
                .build()),
            Resolution::NotFound => Ok(self.base(StatusCode::NotFound).build()),
            Resolution::Forbidden => Ok(self.forbidden()),
        }
    }

    pub fn method_not_allowed(&self) -> Response {
        self.base(StatusCode::MethodNotAllowed)
            .header("Allow", "GET, HEAD")
            .header("Connection", "close")
            .build()
    }

    fn forbidden(&self) -> Response {
        self.base(StatusCode::Forbidden)
            .header("Connection", "close")
            .build()
    }

    async fn lookup(&self, target: &str) -> Result<Resolution> {
        let resolution = resolve(&self.root, target)
            .await
            .with_context(|| format!("failed to resolve {}", target))?;

        if matches!(resolution, Resolution::Forbidden) {
            tracing::warn!(path = %target, "Refusing path outside document root");
        }

        Ok(resolution)
    }

    /// Success headers shared by GET and HEAD, minus Content-Length.
    fn describe(&self, path: &Path, metadata: &Metadata) -> ResponseBuilder {
        let mut builder = self
            .base(StatusCode::Ok)
            .header("Connection", "close");

        if let Some(content_type) = mime::content_type_for(path) {
            builder = builder.header("Content-Type", content_type);
        }

        if let Ok(modified) = metadata.modified() {
            builder = builder.header("Last-Modified", httpdate::fmt_http_date(modified));
        }

        builder
    }

    fn base(&self, status: StatusCode) -> ResponseBuilder {
        ResponseBuilder::new(status)
            .header("Date", httpdate::fmt_http_date(SystemTime::now()))
            .header("Server", &self.server_name)
    }
}
