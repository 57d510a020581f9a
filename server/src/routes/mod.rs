//! HTTP route definitions.

mod entries;
mod health;
mod settings;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(entries::routes())
        .merge(settings::routes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::live::LiveHub;
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;
    use tower::ServiceExt;

    /// App whose pool never connects; only routes that reject before
    /// touching the database can be exercised.
    fn app() -> Router {
        let config = Config {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "postgres://localhost/journal_test".into(),
            max_connections: 1,
            dev_auth: true,
        };
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        create_routes().with_state(AppState {
            pool,
            config: Arc::new(config),
            live: LiveHub::new_shared(),
        })
    }

    fn request(
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<&str>,
    ) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn status(req: Request<Body>) -> StatusCode {
        app().oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn health_is_public() {
        let req = request(Method::GET, "/health", None, None);
        assert_eq!(status(req).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_token_is_unauthorized() {
        let req = request(Method::GET, "/users/u1/journal-entries", None, None);
        assert_eq!(status(req).await, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn other_owners_collection_is_forbidden() {
        for (method, uri) in [
            (Method::GET, "/users/u2/journal-entries"),
            (Method::DELETE, "/users/u2/journal-entries/e1"),
            (Method::GET, "/users/u2/settings/time-settings"),
        ] {
            let req = request(method, uri, Some("u1"), None);
            assert_eq!(status(req).await, StatusCode::FORBIDDEN, "{uri}");
        }
    }

    #[tokio::test]
    async fn forbidden_body_uses_error_shape() {
        let req = request(Method::GET, "/users/u2/journal-entries", Some("u1"), None);
        let response = app().oneshot(req).await.unwrap();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: journal_engine::ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "permission-denied");
    }

    #[tokio::test]
    async fn patch_rejects_unknown_fields() {
        let req = request(
            Method::PATCH,
            "/users/u1/journal-entries/e1",
            Some("u1"),
            Some(r#"{"timestamp": 5}"#),
        );
        assert_eq!(status(req).await, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn create_requires_date() {
        let req = request(
            Method::POST,
            "/users/u1/journal-entries",
            Some("u1"),
            Some(r#"{"date": "", "morningEnergy": 0, "afternoonEnergy": 0, "eveningEnergy": 0,
                "morningFocus": "", "afternoonMoment": "", "eveningEmotion": "",
                "eveningAuthentic": "", "eveningActing": "", "eveningAdmiration": ""}"#),
        );
        assert_eq!(status(req).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_rejects_timestamp_beyond_storage_range() {
        let req = request(
            Method::POST,
            "/users/u1/journal-entries",
            Some("u1"),
            Some(r#"{"date": "2024-01-01", "morningEnergy": 0, "afternoonEnergy": 0,
                "eveningEnergy": 0, "morningFocus": "", "afternoonMoment": "",
                "eveningEmotion": "", "eveningAuthentic": "", "eveningActing": "",
                "eveningAdmiration": "", "timestamp": 9223372036854775808}"#),
        );
        assert_eq!(status(req).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_unlock_time_is_bad_request() {
        for body in [
            r#"{"morningUnlock": "7am"}"#,
            r#"{"morningUnlock": "+9:+5"}"#,
            r#"{"eveningUnlock": "21:+0"}"#,
        ] {
            let req = request(
                Method::PUT,
                "/users/u1/settings/time-settings",
                Some("u1"),
                Some(body),
            );
            assert_eq!(status(req).await, StatusCode::BAD_REQUEST, "{body}");
        }
    }
}
