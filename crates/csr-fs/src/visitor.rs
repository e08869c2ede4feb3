use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use tracing::debug;

use crate::approot::AppRootMatcher;
use crate::error::{FsError, Result};
use crate::path::canonicalize;

/// A resolved scan target. Caches everything downstream consumers need so
/// they never re-stat the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub path: PathBuf,
    pub is_directory: bool,
    pub in_app: bool,
    pub pkg_id: Option<String>,
    pub pkg_root: Option<PathBuf>,
}

impl File {
    fn resolve(path: &Path, matcher: &AppRootMatcher) -> Result<Self> {
        let resolved = canonicalize(path)?;
        let is_directory = resolved.is_dir();
        match matcher.classify(&resolved) {
            Some((pkg_id, pkg_root)) => Ok(Self {
                path: resolved,
                is_directory,
                in_app: true,
                pkg_id: Some(pkg_id),
                pkg_root: Some(pkg_root),
            }),
            None => Ok(Self {
                path: resolved,
                is_directory,
                in_app: false,
                pkg_id: None,
                pkg_root: None,
            }),
        }
    }
}

/// mtime of `path` in unix seconds, used both by the recursive walk's
/// `since` filter and by callers comparing a target against a cached
/// history row's `ts` ( step 2).
pub fn mtime_unix(path: &Path) -> Result<i64> {
    let meta = std::fs::metadata(path).map_err(|source| FsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mtime = meta.modified().map_err(|source| FsError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(mtime.duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0))
}

/// Produces the scan targets for a file-mode or recursive-mode request.
pub struct Visitor {
    matcher: AppRootMatcher,
}

impl Visitor {
    pub fn new(matcher: AppRootMatcher) -> Self {
        Self { matcher }
    }

    /// File mode: resolves `path`. If it lies inside an app, the app's
    /// root is reported instead (the app is scanned as a unit).
    pub fn create(&self, path: &Path) -> Result<File> {
        let file = File::resolve(path, &self.matcher)?;
        if let Some(pkg_root) = file.pkg_root.clone() {
            if pkg_root != file.path {
                return File::resolve(&pkg_root, &self.matcher);
            }
        }
        Ok(file)
    }

    /// Recursive mode: walks `dir`, emitting every regular file whose
    /// mtime exceeds `since` (unix seconds). App roots encountered along
    /// the way are emitted once and not descended into. Paths rejected by
    /// the blacklist are skipped silently.
    pub fn create_targets(&self, dir: &Path, since: i64) -> Result<Vec<File>> {
        let root = File::resolve(dir, &self.matcher)?;
        let mut out = Vec::new();
        self.walk(&root.path, since, &mut out)?;
        Ok(out)
    }

    fn walk(&self, dir: &Path, since: i64, out: &mut Vec<File>) -> Result<()> {
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(source) => return Err(FsError::Io { path: dir.to_path_buf(), source }),
        };

        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(source) => return Err(FsError::Io { path: dir.to_path_buf(), source }),
            };
            let path = entry.path();

            let file = match File::resolve(&path, &self.matcher) {
                Ok(f) => f,
                Err(FsError::Blacklisted(p)) => {
                    debug!(path = %p.display(), "skipping blacklisted path");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if file.in_app && file.pkg_root.as_deref() == Some(file.path.as_path()) {
                out.push(file);
                continue;
            }

            if file.is_directory {
                self.walk(&file.path, since, out)?;
            } else {
                let mtime = mtime_unix(&file.path)?;
                if mtime > since {
                    out.push(file);
                }
            }
        }
        Ok(())
    }
}

impl Default for Visitor {
    fn default() -> Self {
        Self::new(AppRootMatcher::default())
    }
}
