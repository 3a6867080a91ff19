//! Keeps the OpenAPI file on disk in step with the generated document.

use std::io::ErrorKind;
use std::path::Path;

use serde_json::Value;
use tokio::fs;

use crate::error::{DocsError, DocsResult};
use crate::openapi::OpenApi;

/// What [`sync_spec_file`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The file did not exist and was written.
    Created,
    /// The file differed and was rewritten.
    Updated,
    /// The file already matched; nothing was written.
    Unchanged,
}

/// Writes `spec` as pretty JSON to `path` when the file is missing or its
/// content differs.
///
/// Content is compared as JSON values, so formatting differences alone do
/// not trigger a rewrite. An existing file that is not valid JSON is
/// overwritten. Parent directories are created as needed.
///
/// # Example
///
/// ```rust
/// use heron_docs::{sync_spec_file, OpenApi, SyncOutcome};
///
/// # tokio_test::block_on(async {
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("public/openapi.json");
/// let spec = OpenApi::new("Todo API", "1.0.0");
///
/// assert_eq!(sync_spec_file(&path, &spec).await.unwrap(), SyncOutcome::Created);
/// assert_eq!(sync_spec_file(&path, &spec).await.unwrap(), SyncOutcome::Unchanged);
/// # });
/// ```
pub async fn sync_spec_file(path: &Path, spec: &OpenApi) -> DocsResult<SyncOutcome> {
    let io_err = |source| DocsError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file_name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

    let outcome = match fs::read_to_string(path).await {
        Ok(existing) => {
            let current = serde_json::from_str::<Value>(&existing).ok();
            if current.as_ref() == Some(&serde_json::to_value(spec)?) {
                tracing::debug!(path = %path.display(), "OpenAPI spec unchanged");
                return Ok(SyncOutcome::Unchanged);
            }
            tracing::info!("OpenAPI spec changed, regenerating...");
            SyncOutcome::Updated
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!("No OpenAPI spec found, generating `{file_name}`...");
            SyncOutcome::Created
        }
        Err(e) => return Err(io_err(e)),
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut json = spec.to_pretty_json()?;
    json.push('\n');
    fs::write(path, json).await.map_err(io_err)?;

    tracing::info!("OpenAPI spec generated successfully!");
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::PathItem;
    use std::fs;

    fn spec_with_path(path: &str) -> OpenApi {
        let mut spec = OpenApi::new("Todos", "1.0.0");
        spec.paths.insert(path.to_string(), PathItem::default());
        spec
    }

    #[tokio::test]
    async fn test_created_then_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/openapi.json");
        let spec = spec_with_path("/api/todos");

        assert_eq!(sync_spec_file(&path, &spec).await.unwrap(), SyncOutcome::Created);
        assert!(path.exists());
        assert_eq!(sync_spec_file(&path, &spec).await.unwrap(), SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_updated_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");

        sync_spec_file(&path, &spec_with_path("/api/a")).await.unwrap();
        let outcome = sync_spec_file(&path, &spec_with_path("/api/b")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);

        let written: OpenApi =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(written.paths.contains_key("/api/b"));
        assert!(!written.paths.contains_key("/api/a"));
    }

    #[tokio::test]
    async fn test_formatting_differences_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");
        let spec = spec_with_path("/api/todos");
        fs::write(&path, serde_json::to_string(&spec).unwrap()).unwrap();

        assert_eq!(sync_spec_file(&path, &spec).await.unwrap(), SyncOutcome::Unchanged);
    }

    #[tokio::test]
    async fn test_invalid_existing_file_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openapi.json");
        fs::write(&path, "not json").unwrap();

        let outcome = sync_spec_file(&path, &spec_with_path("/api/todos")).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Updated);
    }

    #[tokio::test]
    async fn test_unreadable_path_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be read as a file
        let result = sync_spec_file(dir.path(), &spec_with_path("/api/todos")).await;
        assert!(matches!(result, Err(DocsError::Io { .. })));
    }
}
