//! Cross-origin policy
//!
//! Two namespaces share the configured origin list:
//! - `/api/**`: configured methods, credentials allowed
//! - `/actuator/**`: GET and POST only, no credentials
//!
//! Both accept any request header and let clients cache preflight
//! responses for an hour. Requests carrying an `Origin` that is neither
//! allowed nor the server's own are refused with a bare 403.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// How long browsers may cache a preflight response
pub const PREFLIGHT_MAX_AGE: Duration = Duration::from_secs(3600);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CorsConfigError {
    #[error("At least one allowed origin is required")]
    NoOrigins,

    #[error("Wildcard origin is not allowed when credentials are enabled")]
    WildcardOrigin,

    #[error("Invalid origin: {0}")]
    InvalidOrigin(String),

    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),
}

/// Validated cross-origin policy, ready to be turned into router layers.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
    methods: Vec<Method>,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Result<Self, CorsConfigError> {
        if config.allowed_origins.is_empty() {
            return Err(CorsConfigError::NoOrigins);
        }

        let origins = config
            .allowed_origins
            .iter()
            .map(|origin| {
                if origin == "*" {
                    return Err(CorsConfigError::WildcardOrigin);
                }
                HeaderValue::from_str(origin)
                    .map_err(|_| CorsConfigError::InvalidOrigin(origin.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let methods = config
            .allowed_methods
            .iter()
            .map(|method| {
                Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                    .map_err(|_| CorsConfigError::InvalidMethod(method.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { origins, methods })
    }

    pub fn allows_origin(&self, origin: &HeaderValue) -> bool {
        self.origins.contains(origin)
    }

    /// Layer for `/api/**`.
    ///
    /// Request headers are mirrored back since a literal `*` is not
    /// honored by browsers on credentialed requests.
    pub fn api_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.clone()))
            .allow_methods(self.methods.clone())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true)
            .max_age(PREFLIGHT_MAX_AGE)
    }

    /// Layer for `/actuator/**`.
    pub fn actuator_layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.clone()))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(Any)
            .allow_credentials(false)
            .max_age(PREFLIGHT_MAX_AGE)
    }
}

/// Middleware refusing requests from origins outside the allow-list.
///
/// Requests without an `Origin` header, or whose origin matches the `Host`
/// they were sent to, pass through untouched.
pub async fn reject_disallowed_origin(
    State(policy): State<CorsPolicy>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(origin) = request.headers().get(header::ORIGIN) {
        let host = request.headers().get(header::HOST);
        if !policy.allows_origin(origin) && !is_same_origin(origin, host) {
            tracing::debug!("Rejected request from origin {:?}", origin);
            return StatusCode::FORBIDDEN.into_response();
        }
    }

    next.run(request).await
}

fn is_same_origin(origin: &HeaderValue, host: Option<&HeaderValue>) -> bool {
    let (Ok(origin), Some(Ok(host))) = (origin.to_str(), host.map(HeaderValue::to_str)) else {
        return false;
    };
    origin
        .split_once("://")
        .is_some_and(|(_, authority)| authority.eq_ignore_ascii_case(host))
}
