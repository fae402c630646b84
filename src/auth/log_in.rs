//! The endpoint for logging in with an email and password.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{Error, auth::AuthState};

/// The credentials entered to log in.
#[derive(Debug, Deserialize)]
pub struct LogInData {
    /// Email entered during log-in.
    pub email: String,
    /// Password entered during log-in.
    pub password: String,
}

/// Handler for log-in requests.
///
/// Each successful log in issues a new session token, earlier tokens stay valid.
///
/// # Errors
///
/// This function will return an error in a few situations.
/// - The request body is not valid JSON or is missing a field.
/// - The email does not belong to a registered user, or the password is not correct.
///   Both cases produce the same error.
/// - An internal error occurred when verifying the password or issuing the token.
pub async fn post_log_in(
    State(state): State<AuthState>,
    body: Result<Json<LogInData>, JsonRejection>,
) -> Result<Json<Value>, Error> {
    let Json(credentials) = body?;

    let mut user = state
        .credential_store
        .find_by_credentials(&credentials.email, &credentials.password)?
        .ok_or(Error::InvalidCredentials)?;

    let token = state.token_service.issue(&user)?;
    state.credential_store.add_token(&mut user, &token)?;

    tracing::info!("User {} logged in", user.id);

    Ok(Json(json!({ "token": token })))
}

#[cfg(test)]
mod log_in_tests {
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::{
        endpoints,
        test_utils::{get_test_server, log_in, register},
    };

    #[tokio::test]
    async fn log_in_succeeds_with_valid_credentials() {
        let server = get_test_server();
        register(&server, "A", "a@x.com").await;

        let token = log_in(&server, "a@x.com").await;

        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn log_in_issues_new_distinct_token() {
        let server = get_test_server();
        let registration = register(&server, "A", "a@x.com").await;
        let registration_token = registration["token"].as_str().unwrap();

        let first_token = log_in(&server, "a@x.com").await;
        let second_token = log_in(&server, "a@x.com").await;

        assert_ne!(first_token, registration_token);
        assert_ne!(first_token, second_token);
    }

    #[tokio::test]
    async fn log_in_accepts_email_in_any_case() {
        let server = get_test_server();
        register(&server, "A", "a@x.com").await;

        log_in(&server, "A@X.com").await;
    }

    #[tokio::test]
    async fn log_in_failures_are_indistinguishable() {
        let server = get_test_server();
        register(&server, "A", "a@x.com").await;

        let wrong_password = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "a@x.com", "password": "definitelyNotTheCorrectPassword"}))
            .await;
        let unknown_email = server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "wrongemail@gmail.com", "password": "secret1"}))
            .await;

        wrong_password.assert_status(StatusCode::UNAUTHORIZED);
        unknown_email.assert_status(StatusCode::UNAUTHORIZED);
        let wrong_password_body = wrong_password.json::<Value>();
        assert_eq!(wrong_password_body, unknown_email.json::<Value>());
        assert_eq!(
            wrong_password_body["error"],
            "Login failed, please check your credentials"
        );
    }

    #[tokio::test]
    async fn log_in_fails_with_missing_credentials() {
        let server = get_test_server();

        server
            .post(endpoints::LOG_IN)
            .json(&json!({"email": "a@x.com"}))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
