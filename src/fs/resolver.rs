use std::io;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use thiserror::Error;
use url::Url;

/// Name of the file served in place of a directory listing.
pub const INDEX_FILE: &str = "index.html";

/// Outcome of mapping a request target onto the document root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// A regular file, read fully into memory.
    File {
        path: PathBuf,
        name: String,
        contents: Vec<u8>,
    },
    /// A directory without an index file.
    Directory {
        path: PathBuf,
        /// Decoded request path, used as the listing title.
        request_path: String,
        entries: Vec<DirEntry>,
    },
    NotFound,
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub is_dir: bool,
}

impl DirEntry {
    /// Display label: directories get a trailing `/`.
    pub fn label(&self) -> String {
        if self.is_dir {
            format!("{}/", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The directory below which every served file must live.
///
/// The path is canonicalized once, when the root is opened, and never
/// changes afterwards.
#[derive(Debug, Clone)]
pub struct DocumentRoot {
    path: PathBuf,
}

impl DocumentRoot {
    /// Opens `path` as a document root. Fails if it does not exist or is not
    /// a directory.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = std::fs::canonicalize(path.as_ref())?;
        if !path.is_dir() {
            return Err(io::Error::other(format!(
                "{} is not a directory",
                path.display()
            )));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolves a raw request target to a file, a listing, or nothing.
    ///
    /// Targets whose canonical path falls outside the root resolve to
    /// [`ResolvedTarget::NotFound`], as do missing files, special files and
    /// anything the process may not read.
    pub async fn resolve(&self, target: &str) -> Result<ResolvedTarget, ResolveError> {
        let request_path = decode_target(target);
        if request_path.contains('\0') {
            return Ok(ResolvedTarget::NotFound);
        }

        let candidate = if request_path == "/" {
            self.path.clone()
        } else {
            self.path.join(request_path.trim_start_matches('/'))
        };

        let Some(path) = self.confine(&candidate).await else {
            return Ok(ResolvedTarget::NotFound);
        };

        let Ok(meta) = tokio::fs::metadata(&path).await else {
            return Ok(ResolvedTarget::NotFound);
        };

        if meta.is_dir() {
            let index = path.join(INDEX_FILE);
            if let Some(index) = self.confine(&index).await {
                if tokio::fs::metadata(&index)
                    .await
                    .is_ok_and(|m| m.is_file())
                {
                    return read_file(index).await;
                }
            }
            return list_dir(path, request_path).await;
        }

        if meta.is_file() {
            return read_file(path).await;
        }

        Ok(ResolvedTarget::NotFound)
    }

    /// Canonicalizes `candidate` and returns it only if it is the root or
    /// lies below it. Comparison is per path component.
    async fn confine(&self, candidate: &Path) -> Option<PathBuf> {
        let canonical = tokio::fs::canonicalize(candidate).await.ok()?;
        if canonical.starts_with(&self.path) {
            Some(canonical)
        } else {
            tracing::debug!(
                path = %canonical.display(),
                root = %self.path.display(),
                "Rejected path outside document root"
            );
            None
        }
    }
}

/// Extracts and percent-decodes the path component of a request target.
///
/// Accepts origin-form (`/a/b?q`) and absolute-form (`http://h/a/b`)
/// targets; query and fragment are dropped.
pub fn decode_target(target: &str) -> String {
    let raw = if is_absolute_form(target) {
        match Url::parse(target) {
            Ok(url) => url.path().to_string(),
            Err(_) => strip_query(target).to_string(),
        }
    } else {
        strip_query(target).to_string()
    };

    percent_decode_str(&raw).decode_utf8_lossy().into_owned()
}

fn is_absolute_form(target: &str) -> bool {
    let lower = target.get(..8).unwrap_or(target).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn strip_query(target: &str) -> &str {
    target.split(['?', '#']).next().unwrap_or(target)
}

/// Access problems are reported as not found; anything else is an I/O
/// failure on a path that already passed its existence checks.
fn not_found_or(path: PathBuf, err: io::Error) -> Result<ResolvedTarget, ResolveError> {
    match err.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => Ok(ResolvedTarget::NotFound),
        _ => Err(ResolveError::Io { path, source: err }),
    }
}

async fn read_file(path: PathBuf) -> Result<ResolvedTarget, ResolveError> {
    match tokio::fs::read(&path).await {
        Ok(contents) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(ResolvedTarget::File {
                path,
                name,
                contents,
            })
        }
        Err(e) => not_found_or(path, e),
    }
}

async fn list_dir(path: PathBuf, request_path: String) -> Result<ResolvedTarget, ResolveError> {
    let mut dir = match tokio::fs::read_dir(&path).await {
        Ok(dir) => dir,
        Err(e) => return not_found_or(path, e),
    };

    let mut entries = Vec::new();
    loop {
        let entry = match dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => return Err(ResolveError::Io { path, source: e }),
        };

        // Follow symlinks so linked directories are listed as directories.
        let is_dir = tokio::fs::metadata(entry.path())
            .await
            .is_ok_and(|m| m.is_dir());

        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| b.is_dir.cmp(&a.is_dir).then_with(|| a.name.cmp(&b.name)));

    Ok(ResolvedTarget::Directory {
        path,
        request_path,
        entries,
    })
}
