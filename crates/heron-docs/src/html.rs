//! Documentation pages.
//!
//! The docs route serves a static HTML page that loads either ReDoc or
//! Swagger UI from a CDN and points it at the served OpenAPI JSON.
//!
//! ## Usage
//!
//! ```rust
//! use heron_docs::{DocsPage, DocsProvider};
//!
//! let html = DocsPage::new(DocsProvider::SwaggerUi, "/openapi.json")
//!     .title("Todo API")
//!     .html();
//!
//! assert!(html.contains("swagger-ui"));
//! assert!(html.contains("/openapi.json"));
//! ```

use serde::{Deserialize, Serialize};

/// Which documentation renderer to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DocsProvider {
    /// ReDoc: clean, three-panel reference documentation.
    #[default]
    Redoc,
    /// Swagger UI: interactive explorer.
    SwaggerUi,
}

/// A rendered documentation page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocsPage {
    provider: DocsProvider,
    spec_url: String,
    title: String,
    description: Option<String>,
    favicon_url: Option<String>,
    logo_url: Option<String>,
    redoc_version: String,
    swagger_version: String,
}

impl DocsPage {
    /// Creates a page for a provider, loading the spec from `spec_url`.
    #[must_use]
    pub fn new(provider: DocsProvider, spec_url: impl Into<String>) -> Self {
        Self {
            provider,
            spec_url: spec_url.into(),
            title: "API Documentation".to_string(),
            description: None,
            favicon_url: None,
            logo_url: None,
            redoc_version: "2.1.5".to_string(),
            swagger_version: "5.18.2".to_string(),
        }
    }

    /// Set the page title.
    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the meta description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set the favicon URL.
    #[must_use]
    pub fn favicon_url(mut self, url: impl Into<String>) -> Self {
        self.favicon_url = Some(url.into());
        self
    }

    /// Set the logo URL shown above the docs.
    #[must_use]
    pub fn logo_url(mut self, url: impl Into<String>) -> Self {
        self.logo_url = Some(url.into());
        self
    }

    /// The provider.
    #[must_use]
    pub const fn provider(&self) -> DocsProvider {
        self.provider
    }

    /// The URL the page loads the spec from.
    #[must_use]
    pub fn spec_url(&self) -> &str {
        &self.spec_url
    }

    /// Generate the HTML.
    #[must_use]
    pub fn html(&self) -> String {
        let head = self.head();
        let logo = self
            .logo_url
            .as_deref()
            .map(|url| {
                format!(
                    r#"    <div class="logo"><img src="{}" alt="{}" /></div>
"#,
                    html_escape(url),
                    html_escape(&self.title)
                )
            })
            .unwrap_or_default();
        let body = match self.provider {
            DocsProvider::Redoc => self.redoc_body(),
            DocsProvider::SwaggerUi => self.swagger_body(),
        };

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
{head}</head>
<body>
{logo}{body}</body>
</html>"#
        )
    }

    fn head(&self) -> String {
        let mut head = format!(
            r#"    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{}</title>
"#,
            html_escape(&self.title)
        );
        if let Some(description) = &self.description {
            head.push_str(&format!(
                "    <meta name=\"description\" content=\"{}\">\n",
                html_escape(description)
            ));
        }
        if let Some(favicon) = &self.favicon_url {
            head.push_str(&format!(
                "    <link rel=\"icon\" href=\"{}\">\n",
                html_escape(favicon)
            ));
        }
        if self.provider == DocsProvider::SwaggerUi {
            head.push_str(&format!(
                "    <link rel=\"stylesheet\" href=\"https://unpkg.com/swagger-ui-dist@{}/swagger-ui.css\" />\n",
                self.swagger_version
            ));
        }
        head.push_str("    <style>\n        body { margin: 0; padding: 0; }\n        .logo { padding: 16px; }\n        .logo img { max-height: 48px; }\n    </style>\n");
        head
    }

    fn redoc_body(&self) -> String {
        format!(
            r#"    <redoc spec-url="{spec_url}"></redoc>
    <script src="https://cdn.redoc.ly/redoc/{version}/bundles/redoc.standalone.js"></script>
"#,
            spec_url = html_escape(&self.spec_url),
            version = self.redoc_version,
        )
    }

    fn swagger_body(&self) -> String {
        format!(
            r#"    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@{version}/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {{
            window.ui = SwaggerUIBundle({{
                url: "{spec_url}",
                dom_id: '#swagger-ui',
                deepLinking: true,
                docExpansion: 'list',
                displayRequestDuration: true
            }});
        }};
    </script>
"#,
            version = self.swagger_version,
            spec_url = html_escape(&self.spec_url),
        )
    }
}

/// Simple HTML escape for XSS prevention.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
