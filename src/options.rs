// Per-call options shared by the sanitize and validate pipelines
use serde::{Deserialize, Serialize};

use crate::config::config;
use crate::params::Route;
use crate::permissions::Auth;

/// Which API a call comes from; picks the `strict_params` default
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiSurface {
    #[default]
    Rest,
    Documents,
}

#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Enables the restricted-relation checks
    pub auth: Option<Auth>,
    /// `None` falls back to the configured flag for the surface
    pub strict_params: Option<bool>,
    /// Route of the request, used to scope extra params
    pub route: Option<Route>,
    /// Field paths allowed by permissions, `None` keeps everything
    pub allowed_fields: Option<Vec<String>>,
    pub surface: ApiSurface,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_auth(mut self, auth: Auth) -> Self {
        self.auth = Some(auth);
        self
    }

    pub fn with_strict_params(mut self, strict: bool) -> Self {
        self.strict_params = Some(strict);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_surface(mut self, surface: ApiSurface) -> Self {
        self.surface = surface;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict_params.unwrap_or_else(|| match self.surface {
            ApiSurface::Rest => config().api.rest.strict_params,
            ApiSurface::Documents => config().api.documents.strict_params,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_strict_flag_wins() {
        assert!(RequestOptions::new().with_strict_params(true).is_strict());
        assert!(!RequestOptions::new()
            .with_surface(ApiSurface::Documents)
            .with_strict_params(false)
            .is_strict());
    }

    #[test]
    fn allowed_fields_builder() {
        let options = RequestOptions::new().with_allowed_fields(["title", "author.name"]);
        assert_eq!(options.allowed_fields, Some(vec!["title".to_string(), "author.name".to_string()]));
    }
}
