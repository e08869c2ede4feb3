use std::path::{Path, PathBuf};

use regex::Regex;

/// A regex-anchored directory template identifying an installed
/// application's root directory, plus how to pull the package id out of a
/// match.
struct AppRootTemplate {
    pattern: Regex,
}

impl AppRootTemplate {
    fn new(pattern: &str) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("app-root template is a valid regex"),
        }
    }

    /// `dir` must be a single path component (one directory name), matched
    /// against the whole pattern.
    fn matches(&self, dir: &str) -> Option<String> {
        let caps = self.pattern.captures(dir)?;
        Some(caps.name("pkg_id").map(|m| m.as_str().to_string()).unwrap_or_else(|| dir.to_string()))
    }
}

/// Classifies paths against a fixed set of app-root directory templates.
///
/// Matching walks a canonical path's ancestors outward-in, since an
/// app-root template only ever anchors one directory component deep under
/// a known app-container path (e.g. `/opt/apps/<pkg_id>`,
/// `/var/lib/app-store/<pkg_id>.app`).
pub struct AppRootMatcher {
    templates: Vec<(PathBuf, AppRootTemplate)>,
}

impl AppRootMatcher {
    /// The default template set recognizes the two conventional app
    /// container layouts this server ships policy for.
    pub fn default_templates() -> Self {
        Self {
            templates: vec![
                (PathBuf::from("/opt/apps"), AppRootTemplate::new(r"^(?P<pkg_id>[A-Za-z0-9_.-]+)$")),
                (
                    PathBuf::from("/var/lib/app-store/apps"),
                    AppRootTemplate::new(r"^(?P<pkg_id>[A-Za-z0-9_.-]+)\.app$"),
                ),
            ],
        }
    }

    pub fn with_templates(templates: Vec<(PathBuf, String)>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|(container, pattern)| (container, AppRootTemplate::new(&pattern)))
                .collect(),
        }
    }

    /// Finds the nearest ancestor of `path` (or `path` itself) that is an
    /// app root, returning `(pkg_id, pkg_root)`. Returns `None` if no
    /// ancestor lies directly under a known app-container directory.
    pub fn classify(&self, path: &Path) -> Option<(String, PathBuf)> {
        for ancestor in path.ancestors() {
            let parent = ancestor.parent()?;
            let dir_name = ancestor.file_name()?.to_str()?;
            for (container, template) in &self.templates {
                if parent == container {
                    if let Some(pkg_id) = template.matches(dir_name) {
                        return Some((pkg_id, ancestor.to_path_buf()));
                    }
                }
            }
        }
        None
    }
}

impl Default for AppRootMatcher {
    fn default() -> Self {
        Self::default_templates()
    }
}
