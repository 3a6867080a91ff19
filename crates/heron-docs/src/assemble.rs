//! OpenAPI document assembly.
//!
//! The [`SpecAssembler`] takes the user's base document, filters the
//! discovered routes with a [`PathFilter`], asks each retained route for its
//! fragment, and merges the fragments into the document's `paths`. Every
//! other part of the base document is returned unchanged.

use indexmap::IndexMap;

use crate::error::{DocsError, DocsResult};
use crate::filter::PathFilter;
use crate::fragment::Fragment;
use crate::openapi::{OpenApi, PathItem};

/// A route that can describe itself as OpenAPI paths.
pub trait DocumentedRoute: Send + Sync {
    /// Builds the route's paths for the given template.
    fn fragment(&self, template: &str) -> DocsResult<Fragment>;

    /// The paths [`fragment`](Self::fragment) emits for `template`, used to
    /// filter the route before building it. Most routes emit just the
    /// template.
    fn documented_paths(&self, template: &str) -> Vec<String> {
        vec![template.to_string()]
    }
}

/// Builds complete documents from a base document and a set of routes.
///
/// # Example
///
/// ```rust
/// use heron_core::{Operation, Operations};
/// use heron_docs::{route_fragment, DocsResult, DocumentedRoute, Fragment, OpenApi, PathFilter, SpecAssembler};
///
/// struct Todos(Operations);
///
/// impl DocumentedRoute for Todos {
///     fn fragment(&self, template: &str) -> DocsResult<Fragment> {
///         route_fragment(template, &self.0, None)
///     }
/// }
///
/// let mut ops = Operations::new();
/// ops.insert("getTodos".to_string(), Operation::get());
/// let todos = Todos(ops);
///
/// let assembler = SpecAssembler::new(OpenApi::new("Todo API", "1.0.0"));
/// let spec = assembler
///     .assemble([("/api/todos", &todos as &dyn DocumentedRoute)], &PathFilter::new())
///     .unwrap();
///
/// assert_eq!(spec.info.title, "Todo API");
/// assert!(spec.paths["/api/todos"].get.is_some());
/// ```
#[derive(Debug, Clone)]
pub struct SpecAssembler {
    base: OpenApi,
}

impl SpecAssembler {
    /// Creates an assembler for a base document.
    #[must_use]
    pub const fn new(base: OpenApi) -> Self {
        Self { base }
    }

    /// The base document.
    #[must_use]
    pub const fn base(&self) -> &OpenApi {
        &self.base
    }

    /// Assembles the document.
    ///
    /// Every path a route emits is checked against `filter`; excluded paths
    /// are logged and left out, and a route none of whose paths pass is not
    /// built at all. If any retained
    /// route fails to produce its fragment the whole assembly fails with
    /// [`DocsError::RouteGeneration`]. Paths are merged in route order;
    /// when two routes document the same path and method the first wins.
    pub fn assemble<'a, I>(&self, routes: I, filter: &PathFilter) -> DocsResult<OpenApi>
    where
        I: IntoIterator<Item = (&'a str, &'a dyn DocumentedRoute)>,
    {
        let routes: Vec<(&str, &dyn DocumentedRoute, Vec<String>)> = routes
            .into_iter()
            .map(|(template, route)| (template, route, route.documented_paths(template)))
            .collect();
        let outcome = filter.apply(routes.iter().flat_map(|(_, _, documented)| documented));

        if !outcome.excluded.is_empty() {
            tracing::info!(paths = ?outcome.excluded, "ignoring paths excluded by the path filter");
        }

        let mut paths: IndexMap<String, PathItem> = IndexMap::new();
        for (template, route, documented) in routes {
            if !documented.iter().any(|path| filter.is_included(path)) {
                continue;
            }

            let fragment = route.fragment(template).map_err(|source| {
                tracing::error!(route = %template, error = %source, "OpenAPI spec generation failed");
                DocsError::RouteGeneration {
                    route: template.to_string(),
                    source: Box::new(source),
                }
            })?;

            for (path, item) in fragment {
                if filter.is_included(&path) {
                    paths.entry(path).or_default().merge_from(item);
                }
            }
        }

        tracing::debug!(paths = paths.len(), "assembled OpenAPI document");

        let mut spec = self.base.clone();
        spec.paths = paths;
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::route_fragment;
    use heron_core::{Operation, Operations};
    use serde_json::json;

    struct Route(Operations);

    impl DocumentedRoute for Route {
        fn fragment(&self, template: &str) -> DocsResult<Fragment> {
            route_fragment(template, &self.0, None)
        }
    }

    struct Broken;

    impl DocumentedRoute for Broken {
        fn fragment(&self, _template: &str) -> DocsResult<Fragment> {
            Err(DocsError::SchemaConversion {
                reason: "bad schema".to_string(),
            })
        }
    }

    fn route(name: &str, op: Operation) -> Route {
        let mut ops = Operations::new();
        ops.insert(name.to_string(), op);
        Route(ops)
    }

    fn base() -> OpenApi {
        serde_json::from_value(json!({
            "openapi": "3.1.0",
            "info": { "title": "Todos", "version": "1.0.0" },
            "servers": [{ "url": "https://example.com" }],
            "paths": { "/stale": {} },
            "x-extra": 1
        }))
        .unwrap()
    }

    #[test]
    fn test_only_paths_replaced() {
        let todos = route("getTodos", Operation::get());
        let spec = SpecAssembler::new(base())
            .assemble([("/api/todos", &todos as &dyn DocumentedRoute)], &PathFilter::new())
            .unwrap();

        assert_eq!(spec.servers[0].url, "https://example.com");
        assert_eq!(spec.extensions["x-extra"], json!(1));
        assert!(!spec.paths.contains_key("/stale"));
        assert!(spec.paths.contains_key("/api/todos"));
    }

    #[test]
    fn test_filter_excludes_routes() {
        let a = route("a", Operation::get());
        let b = route("b", Operation::get());
        let spec = SpecAssembler::new(base())
            .assemble(
                [
                    ("/api/foo", &a as &dyn DocumentedRoute),
                    ("/api/foo/bar", &b as &dyn DocumentedRoute),
                ],
                &PathFilter::new().allow(["/api/foo/**"]),
            )
            .unwrap();
        assert_eq!(spec.paths.keys().collect::<Vec<_>>(), vec!["/api/foo/bar"]);
    }

    struct MultiPath(Vec<Operations>);

    impl DocumentedRoute for MultiPath {
        fn fragment(&self, template: &str) -> DocsResult<Fragment> {
            let mut paths = Fragment::new();
            for (index, ops) in self.0.iter().enumerate() {
                paths.extend(route_fragment(&format!("{template}/{index}"), ops, None)?);
            }
            Ok(paths)
        }

        fn documented_paths(&self, template: &str) -> Vec<String> {
            (0..self.0.len()).map(|index| format!("{template}/{index}")).collect()
        }
    }

    #[test]
    fn test_filter_applies_to_each_emitted_path() {
        let mut ops = Operations::new();
        ops.insert("op".to_string(), Operation::post());
        let multi = MultiPath(vec![ops.clone(), ops]);
        let spec = SpecAssembler::new(base())
            .assemble(
                [("/api/rpc", &multi as &dyn DocumentedRoute)],
                &PathFilter::new().deny(["/api/rpc/1"]),
            )
            .unwrap();
        assert_eq!(spec.paths.keys().collect::<Vec<_>>(), vec!["/api/rpc/0"]);

        let spec = SpecAssembler::new(base())
            .assemble(
                [("/api/rpc", &multi as &dyn DocumentedRoute)],
                &PathFilter::new().deny(["/api/rpc/*"]),
            )
            .unwrap();
        assert!(spec.paths.is_empty());
    }

    #[test]
    fn test_excluded_broken_route_is_not_built() {
        let ok = route("ok", Operation::get());
        let spec = SpecAssembler::new(base())
            .assemble(
                [
                    ("/api/ok", &ok as &dyn DocumentedRoute),
                    ("/api/broken", &Broken as &dyn DocumentedRoute),
                ],
                &PathFilter::new().deny(["/api/broken"]),
            )
            .unwrap();
        assert_eq!(spec.paths.len(), 1);
    }

    #[test]
    fn test_failure_aborts_assembly() {
        let ok = route("ok", Operation::get());
        let err = SpecAssembler::new(base())
            .assemble(
                [
                    ("/api/ok", &ok as &dyn DocumentedRoute),
                    ("/api/broken", &Broken as &dyn DocumentedRoute),
                ],
                &PathFilter::new(),
            )
            .unwrap_err();
        assert!(matches!(err, DocsError::RouteGeneration { ref route, .. } if route == "/api/broken"));
    }

    #[test]
    fn test_same_path_merges_methods_first_wins() {
        let first = route("first", Operation::get());
        let second = route("second", Operation::get());
        let third = route("third", Operation::post());
        let spec = SpecAssembler::new(base())
            .assemble(
                [
                    ("/api/x", &first as &dyn DocumentedRoute),
                    ("/api/x", &second as &dyn DocumentedRoute),
                    ("/api/x", &third as &dyn DocumentedRoute),
                ],
                &PathFilter::new(),
            )
            .unwrap();
        let item = &spec.paths["/api/x"];
        assert_eq!(item.get.as_ref().unwrap().operation_id.as_deref(), Some("first"));
        assert_eq!(item.post.as_ref().unwrap().operation_id.as_deref(), Some("third"));
    }
}
