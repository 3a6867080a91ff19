//! The documentation route.
//!
//! Serves the ReDoc or Swagger UI page. In development it also regenerates
//! the OpenAPI document from the manifest and syncs it to disk, so the file
//! checked into the repository follows the code.

use std::sync::Arc;

use http::header::HOST;
use http::StatusCode;

use heron_config::{ConfigCell, HeronConfig};
use heron_core::{ApiRequest, ErrorBody, ErrorKind, ResponseHandle, INTERNAL_USER_AGENT};
use heron_docs::{sync_spec_file, DocsResult, OpenApi, SpecAssembler, SyncOutcome};

use crate::error::RouterResult;
use crate::manifest::RouteManifest;

/// Serves the docs page for a manifest.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use heron_config::{ConfigCell, HeronConfig};
/// use heron_core::{ApiRequest, ResponseHandle};
/// use heron_router::{DocsRoute, RouteManifest};
/// use http::{Method, StatusCode};
///
/// let config = Arc::new(ConfigCell::with_config(HeronConfig::production()));
/// let docs = DocsRoute::new(config, Arc::new(RouteManifest::new()));
///
/// # tokio_test::block_on(async {
/// let mut res = ResponseHandle::new();
/// docs.handle(&ApiRequest::new(Method::GET, "/api".parse().unwrap()), &mut res).await;
/// assert_eq!(res.status_code(), StatusCode::OK);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct DocsRoute {
    config: Arc<ConfigCell>,
    manifest: Arc<RouteManifest>,
}

impl DocsRoute {
    /// Creates a docs route reading `config` on every request.
    #[must_use]
    pub const fn new(config: Arc<ConfigCell>, manifest: Arc<RouteManifest>) -> Self {
        Self { config, manifest }
    }

    /// The manifest being documented.
    #[must_use]
    pub fn manifest(&self) -> &RouteManifest {
        &self.manifest
    }

    /// Assembles the OpenAPI document for the manifest under `config`.
    pub fn generate_spec(&self, config: &HeronConfig) -> DocsResult<OpenApi> {
        SpecAssembler::new(config.openapi.clone())
            .assemble(self.manifest.documented(), &config.path_filter())
    }

    /// Assembles the document and writes it to the configured output file
    /// if it changed.
    pub async fn sync_spec(&self, config: &HeronConfig) -> DocsResult<SyncOutcome> {
        let spec = self.generate_spec(config)?;
        sync_spec_file(&config.spec_output, &spec).await
    }

    /// Handles a request, always leaving a finalized response behind.
    pub async fn handle(&self, req: &ApiRequest, res: &mut ResponseHandle) {
        if let Err(error) = self.serve(req, res).await {
            tracing::error!(route = %req.path(), error = %error, "failed to serve docs");
            res.reset();
            res.write_error(ErrorKind::Unexpected, None);
        }
    }

    async fn serve(&self, req: &ApiRequest, res: &mut ResponseHandle) -> RouterResult<()> {
        let config = self.config.current();

        if !config.mode.is_production() {
            if req.user_agent() == Some(INTERNAL_USER_AGENT) {
                let body = ErrorBody::new(format!("{INTERNAL_USER_AGENT} user agent is not allowed."));
                res.status(StatusCode::FORBIDDEN).json(&body)?;
                return Ok(());
            }

            if !config.suppress_info {
                log_init_info(&config, req);
            }

            if config.auto_generate {
                self.sync_spec(&config).await?;
            }
        }

        res.html(config.docs_page().html())?;
        Ok(())
    }
}

fn log_init_info(config: &HeronConfig, req: &ApiRequest) {
    let host = req
        .headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    let proto = req
        .headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    let base_url = format!("{proto}://{host}");

    tracing::info!(
        docs_url = %format!("{base_url}{}", req.path()),
        openapi_url = %format!("{base_url}{}", config.openapi_json_path),
        provider = ?config.docs.provider,
        "Heron docs ready"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::ApiRoute;
    use heron_core::{Operation, RuntimeMode};
    use http::header::{HeaderValue, CONTENT_TYPE, USER_AGENT};
    use http::Method;
    use serde_json::json;

    fn manifest() -> Arc<RouteManifest> {
        Arc::new(
            RouteManifest::new()
                .api("/api/todos", ApiRoute::new().operation("getTodos", Operation::get()))
                .api(
                    "/api/internal/health",
                    ApiRoute::new().operation("health", Operation::get()),
                ),
        )
    }

    fn config_in(dir: &std::path::Path) -> HeronConfig {
        HeronConfig {
            spec_output: dir.join("public/openapi.json"),
            denied_paths: vec!["/api/internal/**".to_string()],
            mode: RuntimeMode::Development,
            ..HeronConfig::default()
        }
    }

    async fn get(docs: &DocsRoute, req: ApiRequest) -> ResponseHandle {
        let mut res = ResponseHandle::new();
        docs.handle(&req, &mut res).await;
        res
    }

    fn docs_request() -> ApiRequest {
        ApiRequest::new(Method::GET, "/api".parse().unwrap())
    }

    #[tokio::test]
    async fn test_serves_html_and_syncs_spec() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let output = config.spec_output.clone();
        let docs = DocsRoute::new(Arc::new(ConfigCell::with_config(config)), manifest());

        let res = get(&docs, docs_request()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(
            res.headers().get(CONTENT_TYPE).unwrap(),
            "text/html; charset=utf-8"
        );
        assert!(std::str::from_utf8(res.body()).unwrap().contains("/openapi.json"));

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(output).unwrap()).unwrap();
        assert!(written["paths"]["/api/todos"]["get"].is_object());
        assert!(written["paths"].get("/api/internal/health").is_none());
    }

    #[tokio::test]
    async fn test_internal_user_agent_forbidden() {
        let dir = tempfile::tempdir().unwrap();
        let docs = DocsRoute::new(
            Arc::new(ConfigCell::with_config(config_in(dir.path()))),
            manifest(),
        );
        let req = docs_request()
            .with_header(USER_AGENT, HeaderValue::from_static(INTERNAL_USER_AGENT));

        let res = get(&docs, req).await;
        assert_eq!(res.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(
            res.body_json(),
            Some(json!({ "message": format!("{INTERNAL_USER_AGENT} user agent is not allowed.") }))
        );
    }

    #[tokio::test]
    async fn test_production_skips_generation() {
        let dir = tempfile::tempdir().unwrap();
        let config = HeronConfig {
            mode: RuntimeMode::Production,
            ..config_in(dir.path())
        };
        let output = config.spec_output.clone();
        let docs = DocsRoute::new(Arc::new(ConfigCell::with_config(config)), manifest());

        let res = get(&docs, docs_request()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_auto_generate_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let config = HeronConfig {
            auto_generate: false,
            ..config_in(dir.path())
        };
        let output = config.spec_output.clone();
        let docs = DocsRoute::new(Arc::new(ConfigCell::with_config(config)), manifest());

        get(&docs, docs_request()).await;
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_generation_failure_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let broken = Arc::new(RouteManifest::new().api(
            "/api/todos",
            ApiRoute::new().operation("getTodos", Operation::get().openapi(json!("not an object"))),
        ));
        let docs = DocsRoute::new(
            Arc::new(ConfigCell::with_config(config_in(dir.path()))),
            broken,
        );

        let res = get(&docs, docs_request()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body_json().unwrap()["message"], ErrorKind::Unexpected.message());
    }

    #[test]
    fn test_generate_spec_keeps_base_document() {
        let mut config = HeronConfig::default();
        config.openapi.info.title = "Todo API".to_string();
        let docs = DocsRoute::new(Arc::new(ConfigCell::new()), manifest());

        let spec = docs.generate_spec(&config).unwrap();
        assert_eq!(spec.info.title, "Todo API");
        assert_eq!(spec.paths.len(), 2);
    }
}
