//! The route table and its matching rules.

use std::collections::HashMap;

use log::debug;

use crate::parser::Method;
use crate::router::error::RouteError;
use crate::router::params::Params;
use crate::router::pattern::PathPattern;

/// A route whose template contains at least one placeholder.
pub struct DynamicRoute<H> {
    pub pattern: PathPattern,
    pub handler: H,
}

/// Result of resolving a method and path.
pub enum MatchOutcome<'a, H> {
    /// A handler was found, possibly the registered 404 handler.
    Found { handler: &'a H, params: Params },
    /// Nothing matched and no 404 handler is registered.
    NotFound { method: Method, path: String },
}

impl<H> MatchOutcome<'_, H> {
    pub fn is_found(&self) -> bool {
        matches!(self, MatchOutcome::Found { .. })
    }
}

/// Maps `(method, path)` to handlers.
///
/// Static routes are looked up by exact path and always win over dynamic
/// routes. Dynamic routes are tried in registration order and the first
/// one that matches (and converts) wins.
pub struct Router<H> {
    static_routes: HashMap<Method, HashMap<String, H>>,
    dynamic_routes: HashMap<Method, Vec<DynamicRoute<H>>>,
    not_found: Option<H>,
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self {
            static_routes: HashMap::new(),
            dynamic_routes: HashMap::new(),
            not_found: None,
        }
    }
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under a method and path template.
    ///
    /// Templates without `<` are static and replace any earlier handler for
    /// the same path. Other templates are compiled and appended to the
    /// method's dynamic list.
    pub fn add_route(&mut self, method: Method, path: &str, handler: H) -> Result<(), RouteError> {
        if PathPattern::is_static(path) {
            self.static_routes
                .entry(method)
                .or_default()
                .insert(path.to_string(), handler);
            return Ok(());
        }

        let pattern = PathPattern::compile(path)?;
        self.dynamic_routes
            .entry(method)
            .or_default()
            .push(DynamicRoute { pattern, handler });
        Ok(())
    }

    /// Register the handler used when no route matches.
    pub fn set_404(&mut self, handler: H) {
        self.not_found = Some(handler);
    }

    /// Resolve a method and path to a handler and its parameters.
    pub fn match_route(&self, method: &Method, path: &str) -> MatchOutcome<'_, H> {
        if let Some(handler) = self.static_routes.get(method).and_then(|routes| routes.get(path)) {
            return MatchOutcome::Found {
                handler,
                params: Params::new(),
            };
        }

        for route in self.dynamic_routes.get(method).into_iter().flatten() {
            match route.pattern.captures(path) {
                Some(Ok(params)) => {
                    return MatchOutcome::Found {
                        handler: &route.handler,
                        params,
                    };
                }
                Some(Err(e)) => {
                    debug!("Skipping route {}: {e}", route.pattern.template());
                }
                None => {}
            }
        }

        match &self.not_found {
            Some(handler) => MatchOutcome::Found {
                handler,
                params: Params::new(),
            },
            None => MatchOutcome::NotFound {
                method: method.clone(),
                path: path.to_string(),
            },
        }
    }

    /// Registered `(method, template)` pairs, sorted for display.
    pub fn endpoints(&self) -> Vec<(&Method, &str)> {
        let mut endpoints: Vec<(&Method, &str)> = self
            .static_routes
            .iter()
            .flat_map(|(method, routes)| routes.keys().map(move |path| (method, path.as_str())))
            .chain(self.dynamic_routes.iter().flat_map(|(method, routes)| {
                routes.iter().map(move |route| (method, route.pattern.template()))
            }))
            .collect();
        endpoints.sort_by(|a, b| a.1.cmp(b.1).then_with(|| a.0.as_str().cmp(b.0.as_str())));
        endpoints
    }

    pub fn has_404(&self) -> bool {
        self.not_found.is_some()
    }
}
