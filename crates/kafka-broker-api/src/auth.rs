use std::fmt;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::http::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::error::ErrorBody;

const REALM: &str = "kafka-service-broker";

/// Username and password the platform presents on every request
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    username: String,
    password: String,
}

impl fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl BasicCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// true if the `Authorization` header carries these credentials
    fn accepts(&self, header: &str) -> bool {
        let Some(encoded) = header.strip_prefix("Basic ") else {
            return false;
        };
        let Ok(decoded) = STANDARD.decode(encoded.trim()) else {
            return false;
        };
        let Ok(decoded) = String::from_utf8(decoded) else {
            return false;
        };
        match decoded.split_once(':') {
            Some((username, password)) => {
                username == self.username && password == self.password
            }
            None => false,
        }
    }
}

pub(crate) async fn basic_auth(
    State(credentials): State<Arc<BasicCredentials>>,
    request: Request,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|header| credentials.accepts(header));

    if authorized {
        debug!(uri = %request.uri(), "authorized");
        next.run(request).await
    } else {
        warn!(uri = %request.uri(), "rejected unauthorized request");
        (
            StatusCode::UNAUTHORIZED,
            [(WWW_AUTHENTICATE, format!("Basic realm=\"{REALM}\""))],
            Json(ErrorBody::new("unauthorized")),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_matching_credentials() {
        let credentials = BasicCredentials::new("admin", "s3cr:et");
        let header = format!("Basic {}", STANDARD.encode("admin:s3cr:et"));

        assert!(credentials.accepts(&header));
        assert!(!credentials.accepts(&format!("Basic {}", STANDARD.encode("admin:wrong"))));
        assert!(!credentials.accepts("Bearer token"));
        assert!(!credentials.accepts("Basic not-base64!"));
    }

    #[test]
    fn test_debug_hides_password() {
        let credentials = BasicCredentials::new("admin", "hunter2");

        assert!(!format!("{credentials:?}").contains("hunter2"));
    }
}
