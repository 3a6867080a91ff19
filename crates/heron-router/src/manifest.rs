//! The route manifest.
//!
//! A [`RouteManifest`] is the explicit list of (template, endpoint) pairs an
//! application serves. It is used both to dispatch requests and to feed the
//! spec assembler. Matching uses a segment tree: at each position a literal
//! segment is tried before a `{param}` segment, so `/todos/today` wins over
//! `/todos/{id}` for the path `/todos/today`.

use std::sync::Arc;

use indexmap::IndexMap;

use heron_core::{ApiRequest, ResponseHandle, RuntimeMode};
use heron_docs::{DocsResult, DocumentedRoute, Fragment};

use crate::discovery::DiscoveredRoute;
use crate::error::{RouterError, RouterResult};
use crate::route::{decode_path, ApiRoute};
use crate::rpc::{RpcRoute, RPC_OPERATION_PARAM};

/// Something a template can be bound to.
#[derive(Debug, Clone)]
pub enum Endpoint {
    /// A route of per-method operations.
    Api(Arc<ApiRoute>),
    /// A route of named RPC operations, served at `<template>/{operation}`.
    Rpc(Arc<RpcRoute>),
}

impl Endpoint {
    /// Handles a request.
    pub async fn handle(&self, req: &ApiRequest, res: &mut ResponseHandle) {
        match self {
            Self::Api(route) => route.handle(req, res).await,
            Self::Rpc(route) => route.handle(req, res).await,
        }
    }
}

impl From<ApiRoute> for Endpoint {
    fn from(route: ApiRoute) -> Self {
        Self::Api(Arc::new(route))
    }
}

impl From<RpcRoute> for Endpoint {
    fn from(route: RpcRoute) -> Self {
        Self::Rpc(Arc::new(route))
    }
}

impl DocumentedRoute for Endpoint {
    fn fragment(&self, template: &str) -> DocsResult<Fragment> {
        match self {
            Self::Api(route) => route.fragment(template),
            Self::Rpc(route) => route.fragment(template),
        }
    }

    fn documented_paths(&self, template: &str) -> Vec<String> {
        match self {
            Self::Api(route) => route.documented_paths(template),
            Self::Rpc(route) => route.documented_paths(template),
        }
    }
}

/// A successful path match.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The registered template.
    pub template: &'a str,
    /// The bound endpoint.
    pub endpoint: &'a Endpoint,
    /// Percent-decoded path parameters.
    pub params: IndexMap<String, String>,
}

#[derive(Debug)]
struct Entry {
    template: String,
    endpoint: Endpoint,
    param_names: Vec<String>,
}

#[derive(Debug, Default)]
struct Node {
    segment: String,
    entry: Option<usize>,
    static_children: Vec<Node>,
    param_child: Option<Box<Node>>,
}

enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
}

impl Node {
    fn new_static(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            ..Self::default()
        }
    }

    fn insert(&mut self, segments: &[Segment<'_>]) -> &mut Self {
        let Some((first, rest)) = segments.split_first() else {
            return self;
        };
        let child = match first {
            Segment::Static(name) => {
                let index = match self
                    .static_children
                    .binary_search_by(|c| c.segment.as_str().cmp(name))
                {
                    Ok(index) => index,
                    Err(index) => {
                        self.static_children.insert(index, Self::new_static(name));
                        index
                    }
                };
                &mut self.static_children[index]
            }
            Segment::Param(_) => self.param_child.get_or_insert_with(Box::default).as_mut(),
        };
        child.insert(rest)
    }

    fn find<'s>(&self, segments: &[&'s str], values: &mut Vec<&'s str>) -> Option<usize> {
        let Some((first, rest)) = segments.split_first() else {
            return self.entry;
        };

        if let Ok(index) = self
            .static_children
            .binary_search_by(|c| c.segment.as_str().cmp(first))
        {
            if let Some(found) = self.static_children[index].find(rest, values) {
                return Some(found);
            }
        }

        if let Some(child) = &self.param_child {
            values.push(*first);
            if let Some(found) = child.find(rest, values) {
                return Some(found);
            }
            values.pop();
        }

        None
    }
}

/// An ordered set of routes.
///
/// # Example
///
/// ```rust
/// use heron_core::Operation;
/// use heron_router::{ApiRoute, RouteManifest};
///
/// let manifest = RouteManifest::new()
///     .api("/api/todos", ApiRoute::new().operation("getTodos", Operation::get()))
///     .api("/api/todos/{id}", ApiRoute::new().operation("getTodo", Operation::get()));
///
/// let matched = manifest.match_path("/api/todos/42").unwrap();
/// assert_eq!(matched.template, "/api/todos/{id}");
/// assert_eq!(matched.params["id"], "42");
/// ```
#[derive(Debug, Default)]
pub struct RouteManifest {
    entries: Vec<Entry>,
    root: Node,
}

impl RouteManifest {
    /// Creates an empty manifest.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an [`ApiRoute`]. Invalid or conflicting templates are logged
    /// and skipped; use [`insert`](Self::insert) to handle them.
    #[must_use]
    pub fn api(self, template: impl Into<String>, route: ApiRoute) -> Self {
        self.with_endpoint(template.into(), Endpoint::from(route))
    }

    /// Adds an [`RpcRoute`] served at `<template>/{operation}`.
    #[must_use]
    pub fn rpc(self, template: impl Into<String>, route: RpcRoute) -> Self {
        self.with_endpoint(template.into(), Endpoint::from(route))
    }

    fn with_endpoint(mut self, template: String, endpoint: Endpoint) -> Self {
        if let Err(error) = self.insert(template.clone(), endpoint) {
            tracing::warn!(route = %template, error = %error, "skipping route");
        }
        self
    }

    /// Adds an endpoint.
    ///
    /// Returns [`RouterError::InvalidTemplate`] for templates that do not
    /// start with `/` or contain empty or unclosed parameters, and
    /// [`RouterError::ConflictingTemplate`] when another template already
    /// matches exactly the same paths.
    pub fn insert(&mut self, template: impl Into<String>, endpoint: Endpoint) -> RouterResult<()> {
        let template = template.into();
        let mut segments = parse_template(&template)?;
        if matches!(endpoint, Endpoint::Rpc(_)) {
            segments.push(Segment::Param(RPC_OPERATION_PARAM));
        }

        let param_names = segments
            .iter()
            .filter_map(|s| match s {
                Segment::Param(name) => Some((*name).to_string()),
                Segment::Static(_) => None,
            })
            .collect();

        let node = self.root.insert(&segments);
        if let Some(existing) = node.entry {
            return Err(RouterError::ConflictingTemplate {
                template,
                existing: self.entries[existing].template.clone(),
            });
        }
        node.entry = Some(self.entries.len());

        tracing::debug!(route = %template, "registered route");
        self.entries.push(Entry {
            template,
            endpoint,
            param_names,
        });
        Ok(())
    }

    /// Binds discovered files to endpoints.
    ///
    /// `resolve` is called once per discovered route; files it returns
    /// `None` for are logged and skipped.
    pub fn from_discovered<F>(routes: &[DiscoveredRoute], mut resolve: F) -> RouterResult<Self>
    where
        F: FnMut(&DiscoveredRoute) -> Option<Endpoint>,
    {
        let mut manifest = Self::new();
        for route in routes {
            match resolve(route) {
                Some(endpoint) => manifest.insert(route.template.clone(), endpoint)?,
                None => tracing::warn!(
                    file = %route.file.display(),
                    route = %route.template,
                    "no endpoint for discovered route, skipping"
                ),
            }
        }
        Ok(manifest)
    }

    /// Sets the runtime mode of every endpoint, replacing whatever each
    /// route was built with. A server calls this with its configured mode so
    /// introspection follows the configuration.
    pub fn set_mode(&mut self, mode: RuntimeMode) {
        for entry in &mut self.entries {
            match &mut entry.endpoint {
                Endpoint::Api(route) => Arc::make_mut(route).set_mode(mode),
                Endpoint::Rpc(route) => Arc::make_mut(route).set_mode(mode),
            }
        }
    }

    /// Finds the endpoint for a request path.
    pub fn match_path(&self, path: &str) -> Option<RouteMatch<'_>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut values = Vec::new();
        let index = self.root.find(&segments, &mut values)?;
        let entry = &self.entries[index];

        let params = entry
            .param_names
            .iter()
            .cloned()
            .zip(values.into_iter().map(decode_path))
            .collect();

        Some(RouteMatch {
            template: &entry.template,
            endpoint: &entry.endpoint,
            params,
        })
    }

    /// Routes in registration order.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &Endpoint)> {
        self.entries
            .iter()
            .map(|e| (e.template.as_str(), &e.endpoint))
    }

    /// Routes in registration order, as input for the spec assembler.
    pub fn documented(&self) -> impl Iterator<Item = (&str, &dyn DocumentedRoute)> {
        self.entries
            .iter()
            .map(|e| (e.template.as_str(), &e.endpoint as &dyn DocumentedRoute))
    }

    /// Number of routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the manifest has no routes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_template(template: &str) -> RouterResult<Vec<Segment<'_>>> {
    let invalid = |reason: &str| RouterError::InvalidTemplate {
        template: template.to_string(),
        reason: reason.to_string(),
    };

    if !template.starts_with('/') {
        return Err(invalid("must start with '/'"));
    }

    template
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| {
            if let Some(name) = segment.strip_prefix('{') {
                let name = name
                    .strip_suffix('}')
                    .ok_or_else(|| invalid("unclosed parameter"))?;
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("empty or nested parameter name"));
                }
                Ok(Segment::Param(name))
            } else if segment.contains(['{', '}']) {
                Err(invalid("parameters must span a whole segment"))
            } else {
                Ok(Segment::Static(segment))
            }
        })
        .collect()
}
