use std::path::{Component, Path, PathBuf};

use crate::error::{FsError, Result};

/// System prefixes a scan must never descend into or report on, checked
/// after canonicalization.
const BLACKLIST_PREFIXES: &[&str] = &["/proc", "/sys", "/dev"];

/// Resolves `.`/`..` against the path's components without touching the
/// filesystem. Does not require the path to exist.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if !matches!(out.components().next_back(), Some(Component::RootDir) | None) {
                    out.pop();
                } else if out.as_os_str().is_empty() {
                    out.push("..");
                }
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True if `path` lies under (or is exactly) one of the blacklisted system
/// prefixes. Expects an already-normalized absolute path.
pub fn is_blacklisted(path: &Path) -> bool {
    BLACKLIST_PREFIXES.iter().any(|prefix| {
        let prefix = Path::new(prefix);
        path == prefix || path.starts_with(prefix)
    })
}

/// Two-stage canonicalization: lexical `.`/`..` resolution, then
/// the system `realpath` (resolving symlinks). Returns
/// `FsError::Blacklisted` if the resolved path falls under a blacklisted
/// prefix; callers should treat that as "silently skip", not an error to
/// surface to a client.
pub fn canonicalize(path: &Path) -> Result<PathBuf> {
    let lexical = lexical_normalize(path);
    let resolved = std::fs::canonicalize(&lexical).map_err(|source| FsError::Io {
        path: lexical.clone(),
        source,
    })?;
    if is_blacklisted(&resolved) {
        return Err(FsError::Blacklisted(resolved));
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_normalize_collapses_dot_and_dotdot() {
        let p = Path::new("/a/b/../c/./d");
        assert_eq!(lexical_normalize(p), PathBuf::from("/a/c/d"));
    }

    #[test]
    fn lexical_normalize_does_not_escape_root() {
        let p = Path::new("/a/../../b");
        assert_eq!(lexical_normalize(p), PathBuf::from("/b"));
    }

    #[test]
    fn blacklist_matches_proc_sys_dev() {
        assert!(is_blacklisted(Path::new("/proc/1/mem")));
        assert!(is_blacklisted(Path::new("/sys/kernel")));
        assert!(is_blacklisted(Path::new("/dev/sda")));
        assert!(!is_blacklisted(Path::new("/home/user/file")));
    }

    #[test]
    fn canonicalize_rejects_blacklisted_path() {
        let err = canonicalize(Path::new("/proc/self")).unwrap_err();
        assert!(matches!(err, FsError::Blacklisted(_)));
    }

    #[test]
    fn canonicalize_resolves_real_path() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("target.txt");
        std::fs::write(&file, b"hi").unwrap();

        let resolved = canonicalize(&file).unwrap();
        assert!(resolved.ends_with("target.txt"));
        assert!(resolved.is_absolute());
    }
}
