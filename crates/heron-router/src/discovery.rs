//! File-system route discovery.
//!
//! A [`RouteConvention`] turns file paths under a routes directory into
//! path templates:
//!
//! | File (relative)                    | `route_files()`      | `pages()`                 |
//! |------------------------------------|----------------------|---------------------------|
//! | `todos/route.rs`                   | `/api/todos`         | `/api/todos/route`        |
//! | `todos/[id]/route.rs`              | `/api/todos/{id}`    | `/api/todos/{id}/route`   |
//! | `todos/[id].rs`                    | (skipped)            | `/api/todos/{id}`         |
//! | `docs/[...slug]/index.rs`          | (skipped)            | `/api/docs/{slug}`        |
//! | `(admin)/users/route.rs`           | `/api/users`         | `/api/users/route`        |
//! | `_utils.rs`                        | (skipped)            | (skipped)                 |
//!
//! Discovery only produces templates. Binding a template to an endpoint is
//! the job of [`RouteManifest::from_discovered`](crate::RouteManifest::from_discovered).

use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{RouterError, RouterResult};

/// A file found by discovery and the template it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredRoute {
    /// File path relative to the routes directory.
    pub file: PathBuf,
    /// Path template, e.g. `/api/todos/{id}`.
    pub template: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Layout {
    RouteFiles,
    Pages,
}

/// How files map to path templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConvention {
    layout: Layout,
    base: String,
    extensions: Vec<String>,
}

impl RouteConvention {
    /// Only files named `route.*` are routes; their directory is the path.
    #[must_use]
    pub fn route_files() -> Self {
        Self::with_layout(Layout::RouteFiles)
    }

    /// Every file is a route; the file stem is the last segment and `index`
    /// is elided.
    #[must_use]
    pub fn pages() -> Self {
        Self::with_layout(Layout::Pages)
    }

    fn with_layout(layout: Layout) -> Self {
        Self {
            layout,
            base: String::new(),
            extensions: vec!["rs".to_string()],
        }
    }

    /// Prefixes every template, e.g. `/api`.
    #[must_use]
    pub fn base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        let trimmed = base.trim_matches('/');
        self.base = if trimmed.is_empty() {
            String::new()
        } else {
            format!("/{trimmed}")
        };
        self
    }

    /// Replaces the accepted file extensions (without the dot).
    #[must_use]
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// The template for a file path relative to the routes directory, or
    /// `None` if the file is not a route under this convention.
    ///
    /// ```
    /// use heron_router::RouteConvention;
    /// use std::path::Path;
    ///
    /// let pages = RouteConvention::pages().base("/api");
    /// assert_eq!(
    ///     pages.template_for(Path::new("foo/bar/[baz]/index.rs")).as_deref(),
    ///     Some("/api/foo/bar/{baz}")
    /// );
    /// ```
    pub fn template_for(&self, relative: &Path) -> Option<String> {
        let extension = relative.extension()?.to_str()?;
        if !self.extensions.iter().any(|e| e == extension) {
            return None;
        }
        let stem = relative.file_stem()?.to_str()?;

        let mut segments = Vec::new();
        if let Some(parent) = relative.parent() {
            for component in parent.components() {
                let Component::Normal(name) = component else {
                    return None;
                };
                let name = name.to_str()?;
                if name.starts_with('_') {
                    return None;
                }
                if let Some(segment) = convert_segment(name) {
                    segments.push(segment);
                }
            }
        }

        match self.layout {
            Layout::RouteFiles => {
                if stem != "route" {
                    return None;
                }
            }
            Layout::Pages => {
                if stem.starts_with('_') {
                    return None;
                }
                if stem != "index" {
                    segments.extend(convert_segment(stem));
                }
            }
        }

        let path = segments.join("/");
        Some(match (self.base.is_empty(), path.is_empty()) {
            (true, true) => "/".to_string(),
            (false, true) => self.base.clone(),
            _ => format!("{}/{path}", self.base),
        })
    }

    /// Maps a list of relative file paths, skipping non-routes.
    pub fn templates<I, P>(&self, files: I) -> Vec<DiscoveredRoute>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        files
            .into_iter()
            .filter_map(|file| {
                let file = file.as_ref();
                self.template_for(file).map(|template| DiscoveredRoute {
                    file: file.to_path_buf(),
                    template,
                })
            })
            .collect()
    }

    /// Walks `root` recursively, in file-name order, and maps every route
    /// file found.
    pub fn discover(&self, root: &Path) -> RouterResult<Vec<DiscoveredRoute>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|source| RouterError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(relative) = entry.path().strip_prefix(root) {
                files.push(relative.to_path_buf());
            }
        }

        let routes = self.templates(&files);
        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            routes = routes.len(),
            "discovered routes"
        );
        Ok(routes)
    }
}

/// Converts one file-system segment. `None` means the segment is elided.
fn convert_segment(name: &str) -> Option<String> {
    if name.starts_with('(') && name.ends_with(')') {
        return None;
    }
    if let Some(inner) = name.strip_prefix("[[...").and_then(|s| s.strip_suffix("]]")) {
        return Some(format!("{{{inner}}}"));
    }
    if let Some(inner) = name.strip_prefix("[...").and_then(|s| s.strip_suffix(']')) {
        return Some(format!("{{{inner}}}"));
    }
    if let Some(inner) = name.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        return Some(format!("{{{inner}}}"));
    }
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn template(convention: &RouteConvention, file: &str) -> Option<String> {
        convention.template_for(Path::new(file))
    }

    #[test]
    fn test_pages_convention() {
        let pages = RouteConvention::pages().base("/api").extensions(["ts"]);
        let routes = pages.templates([
            "foo.ts",
            "foo/bar.ts",
            "foo/bar/baz.ts",
            "foo/bar/[baz]/index.ts",
            "foo/bar/[baz]/qux/[fred]/index.ts",
        ]);
        let templates: Vec<&str> = routes.iter().map(|r| r.template.as_str()).collect();
        assert_eq!(
            templates,
            vec![
                "/api/foo",
                "/api/foo/bar",
                "/api/foo/bar/baz",
                "/api/foo/bar/{baz}",
                "/api/foo/bar/{baz}/qux/{fred}",
            ]
        );
    }

    #[test]
    fn test_route_files_convention() {
        let app = RouteConvention::route_files().base("/api/");
        assert_eq!(template(&app, "foo/route.rs").as_deref(), Some("/api/foo"));
        assert_eq!(
            template(&app, "foo/bar/[baz]/qux/[fred]/route.rs").as_deref(),
            Some("/api/foo/bar/{baz}/qux/{fred}")
        );
        assert_eq!(template(&app, "route.rs").as_deref(), Some("/api"));
        assert_eq!(template(&app, "foo/handlers.rs"), None);
    }

    #[test]
    fn test_catch_all_and_groups() {
        let app = RouteConvention::route_files();
        assert_eq!(template(&app, "docs/[...slug]/route.rs").as_deref(), Some("/docs/{slug}"));
        assert_eq!(template(&app, "docs/[[...slug]]/route.rs").as_deref(), Some("/docs/{slug}"));
        assert_eq!(template(&app, "(admin)/users/route.rs").as_deref(), Some("/users"));
        assert_eq!(template(&app, "route.rs").as_deref(), Some("/"));
    }

    #[test]
    fn test_exclusions() {
        let pages = RouteConvention::pages();
        assert_eq!(template(&pages, "_app.rs"), None);
        assert_eq!(template(&pages, "_private/users.rs"), None);
        assert_eq!(template(&pages, "users.md"), None);
        assert_eq!(template(&pages, "../users.rs"), None);
    }

    #[test]
    fn test_discover_walks_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for file in ["todos/route.rs", "todos/[id]/route.rs", "health/route.rs", "todos/model.rs"] {
            let path = dir.path().join(file);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }

        let routes = RouteConvention::route_files()
            .base("/api")
            .discover(dir.path())
            .unwrap();
        let templates: Vec<&str> = routes.iter().map(|r| r.template.as_str()).collect();
        assert_eq!(templates, vec!["/api/health", "/api/todos/{id}", "/api/todos"]);
        assert_eq!(routes[0].file, PathBuf::from("health/route.rs"));
    }

    #[test]
    fn test_discover_missing_root() {
        let result = RouteConvention::pages().discover(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(RouterError::Walk { .. })));
    }
}
