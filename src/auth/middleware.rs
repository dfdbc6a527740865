//! Authentication middleware for Axum
//!
//! Verifies the bearer credential and attaches the derived
//! [`RequestingUser`] to the request extensions. The policy layer makes
//! all finer-grained authorization decisions; this middleware only
//! establishes WHO is calling.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use super::jwt::{verify_token, AuthError, Claims, JwtConfig};
use crate::domain::{RequestingUser, Role};

/// Authentication state shared by the protected routes
#[derive(Clone)]
pub struct AuthState {
    pub jwt_config: JwtConfig,
}

/// Derive the per-request caller context from verified claims.
fn requesting_user_from_claims(claims: Claims) -> Result<RequestingUser, AuthError> {
    let role = Role::parse(&claims.role).ok_or(AuthError::UnknownRole)?;
    Ok(RequestingUser {
        uid: claims.sub,
        role,
        seller_id: claims.seller_id,
        email: claims.email,
    })
}

/// Extract token from Authorization header
fn extract_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

/// JWT authentication middleware - requires a valid token
pub async fn auth_middleware(
    State(auth_state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(String::from);
    let Some(auth_header) = auth_header else {
        return auth_error_response(AuthError::MissingToken);
    };

    let Some(token) = extract_token(&auth_header) else {
        return auth_error_response(AuthError::InvalidToken);
    };

    match verify_token(token, &auth_state.jwt_config) {
        Ok(claims) => {
            if claims.is_expired() {
                return auth_error_response(AuthError::ExpiredToken);
            }

            match requesting_user_from_claims(claims) {
                Ok(user) => {
                    request.extensions_mut().insert(user);
                    next.run(request).await
                }
                Err(e) => auth_error_response(e),
            }
        }
        Err(_) => auth_error_response(AuthError::InvalidToken),
    }
}

/// Create an authentication error response
fn auth_error_response(error: AuthError) -> Response {
    let body = Json(json!({
        "success": false,
        "error": error.to_string()
    }));

    (StatusCode::UNAUTHORIZED, body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::middleware;
    use axum::routing::get;
    use axum::{Extension, Router};
    use tower::Service;

    async fn whoami(Extension(user): Extension<RequestingUser>) -> String {
        format!("{}:{}", user.uid, user.role.as_str())
    }

    fn app(config: JwtConfig) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .layer(middleware::from_fn_with_state(
                AuthState { jwt_config: config },
                auth_middleware,
            ))
    }

    async fn send(config: JwtConfig, auth: Option<String>) -> axum::http::Response<Body> {
        let mut builder = Request::builder().method("GET").uri("/whoami");
        if let Some(auth) = auth {
            builder = builder.header("authorization", auth);
        }
        let req = builder.body(Body::empty()).unwrap();

        let mut svc = app(config).into_service();
        svc.call(req).await.unwrap()
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let resp = send(JwtConfig::default(), None).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let resp = send(JwtConfig::default(), Some("Bearer garbage".into())).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn valid_token_reaches_the_handler() {
        let config = JwtConfig::default();
        let token = create_token("acc-1", "seller", None, &config).unwrap();

        let resp = send(config, Some(format!("Bearer {}", token))).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(resp.into_body(), 1024).await.unwrap();
        assert_eq!(&bytes[..], b"acc-1:seller");
    }

    #[tokio::test]
    async fn unknown_role_is_rejected() {
        let config = JwtConfig::default();
        let token = create_token("acc-1", "superuser", None, &config).unwrap();

        let resp = send(config, Some(format!("Bearer {}", token))).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
