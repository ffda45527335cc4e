//! Target to filesystem path resolution.
//!
//! A target is first normalized without touching the filesystem: `.` is
//! dropped and `..` pops the previous component. A `..` with nothing left to
//! pop would leave the document root and is refused right there. The joined
//! path is then canonicalized, which resolves symlinks, and refused again if
//! the real location is not under the root.

use std::fs::Metadata;
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

const INDEX_FILE: &str = "index.html";

/// Outcome of resolving a request target against the document root.
#[derive(Debug)]
pub enum Resolution {
    /// A regular file under the root.
    File { path: PathBuf, metadata: Metadata },
    /// Nothing servable at that location.
    NotFound,
    /// The target points outside the root.
    Forbidden,
}

/// Resolves `target` under `root`.
///
/// `root` must already be canonical. Directories resolve to their
/// `index.html`. Paths that cannot be canonicalized are `NotFound`; errors
/// reading metadata of an existing path are returned.
pub async fn resolve(root: &Path, target: &str) -> io::Result<Resolution> {
    let Some(relative) = normalize(target) else {
        return Ok(Resolution::Forbidden);
    };

    let mut candidate = match canonical_under(root, &root.join(relative)).await {
        Located::Inside(path) => path,
        Located::Missing => return Ok(Resolution::NotFound),
        Located::Outside => return Ok(Resolution::Forbidden),
    };

    let mut metadata = tokio::fs::metadata(&candidate).await?;

    if metadata.is_dir() {
        candidate = match canonical_under(root, &candidate.join(INDEX_FILE)).await {
            Located::Inside(path) => path,
            Located::Missing => return Ok(Resolution::NotFound),
            Located::Outside => return Ok(Resolution::Forbidden),
        };
        metadata = tokio::fs::metadata(&candidate).await?;
    }

    if !metadata.is_file() {
        return Ok(Resolution::NotFound);
    }

    Ok(Resolution::File {
        path: candidate,
        metadata,
    })
}

/// Lexically normalizes a decoded target into a path relative to the root.
///
/// Returns `None` when `..` climbs above the root.
pub fn normalize(target: &str) -> Option<PathBuf> {
    let mut parts: Vec<&std::ffi::OsStr> = Vec::new();

    for component in Path::new(target).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Some(parts.into_iter().collect())
}

enum Located {
    Inside(PathBuf),
    Missing,
    Outside,
}

// A path that cannot be canonicalized does not exist as far as clients are
// concerned: missing entries, names too long for the filesystem, symlink
// loops and unreadable parents all answer 404.
async fn canonical_under(root: &Path, path: &Path) -> Located {
    match tokio::fs::canonicalize(path).await {
        Ok(real) if real.starts_with(root) => Located::Inside(real),
        Ok(_) => Located::Outside,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Unresolvable path");
            Located::Missing
        }
    }
}
