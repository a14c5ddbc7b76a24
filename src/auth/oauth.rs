//! Installed-app OAuth flow with a loopback redirect

use crate::auth::secrets::ClientSecrets;
use crate::auth::token::TokenResponse;
use crate::error::{Result, ResumeTailorError};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use colored::Colorize;
use log::{debug, info};
use reqwest::{Client, Url};
use std::collections::HashMap;
use std::future::IntoFuture;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use uuid::Uuid;

const SUCCESS_PAGE: &str = "<html><body><h3>Authorization complete.</h3><p>You can close this tab and return to the terminal.</p></body></html>";
const FAILURE_PAGE: &str = "<html><body><h3>Authorization failed.</h3><p>Check the terminal for details.</p></body></html>";

/// Run the browser consent flow and exchange the returned code for tokens.
pub async fn authorize(http: &Client, secrets: &ClientSecrets, scopes: &[String]) -> Result<TokenResponse> {
    let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://127.0.0.1:{}", port);
    let state = Uuid::new_v4().to_string();

    let url = authorization_url(secrets, scopes, &redirect_uri, &state)?;
    println!("\n{}", "Google authorization required.".bold());
    println!("Open this link in your browser and allow access to Google Docs:\n");
    println!("  {}\n", url.as_str().cyan());
    info!("Waiting for the OAuth redirect on {}", redirect_uri);

    let code = wait_for_code(listener, &state).await?;
    exchange_code(http, secrets, &code, &redirect_uri).await
}

pub fn authorization_url(secrets: &ClientSecrets, scopes: &[String], redirect_uri: &str, state: &str) -> Result<Url> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )
    .map_err(|e| ResumeTailorError::Auth(format!("Invalid auth_uri '{}': {}", secrets.auth_uri, e)))
}

/// Serve the redirect URI until the browser delivers the callback, then shut
/// the listener down.
async fn wait_for_code(listener: TcpListener, expected_state: &str) -> Result<String> {
    let (code_tx, code_rx) = oneshot::channel();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let state = CallbackState {
        expected_state: expected_state.to_string(),
        sender: Arc::new(Mutex::new(Some(code_tx))),
    };
    let app = Router::new().route("/", get(handle_redirect)).with_state(state);

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = stop_rx.await;
        })
        .into_future();
    let outcome = async move {
        let outcome = code_rx.await;
        let _ = stop_tx.send(());
        outcome
    };

    let (served, outcome) = tokio::join!(server, outcome);
    served?;
    outcome.map_err(|_| ResumeTailorError::Auth("Redirect listener stopped before a code arrived".to_string()))?
}

#[derive(Clone)]
struct CallbackState {
    expected_state: String,
    sender: Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>,
}

async fn handle_redirect(
    State(callback): State<CallbackState>,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = match callback_code(&params, &callback.expected_state) {
        Ok(Some(code)) => Ok(code),
        Ok(None) => return (StatusCode::NOT_FOUND, Html("")),
        Err(e) => Err(e),
    };
    debug!("OAuth redirect received (accepted: {})", outcome.is_ok());

    let page = match outcome {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        Err(_) => (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE)),
    };
    if let Some(sender) = callback.sender.lock().await.take() {
        let _ = sender.send(outcome);
    }
    page
}

/// Inspect the redirect's query parameters. `Ok(None)` means the request is
/// not the OAuth callback.
pub fn callback_code(params: &HashMap<String, String>, expected_state: &str) -> Result<Option<String>> {
    if let Some(error) = params.get("error") {
        return Err(ResumeTailorError::Auth(format!("Authorization denied: {}", error)));
    }

    let Some(code) = params.get("code") else {
        return Ok(None);
    };
    if params.get("state").map(String::as_str) != Some(expected_state) {
        return Err(ResumeTailorError::Auth("OAuth state mismatch in redirect".to_string()));
    }
    Ok(Some(code.clone()))
}

pub async fn exchange_code(http: &Client, secrets: &ClientSecrets, code: &str, redirect_uri: &str) -> Result<TokenResponse> {
    request_token(
        http,
        secrets,
        &[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ],
    )
    .await
}

pub async fn refresh(http: &Client, secrets: &ClientSecrets, refresh_token: &str) -> Result<TokenResponse> {
    request_token(
        http,
        secrets,
        &[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
        ],
    )
    .await
}

async fn request_token(http: &Client, secrets: &ClientSecrets, form: &[(&str, &str)]) -> Result<TokenResponse> {
    let response = http
        .post(&secrets.token_uri)
        .form(form)
        .send()
        .await
        .map_err(|e| ResumeTailorError::Auth(format!("Token request failed: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ResumeTailorError::Auth(format!(
            "Token endpoint returned {}: {}",
            status.as_u16(),
            body.trim()
        )));
    }

    response
        .json::<TokenResponse>()
        .await
        .map_err(|e| ResumeTailorError::Auth(format!("Malformed token response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> ClientSecrets {
        ClientSecrets::from_json(r#"{"installed":{"client_id":"cid","client_secret":"cs"}}"#).unwrap()
    }

    #[test]
    fn test_authorization_url_carries_flow_parameters() {
        let scopes = vec!["https://www.googleapis.com/auth/documents".to_string()];
        let url = authorization_url(&secrets(), &scopes, "http://127.0.0.1:4567", "xyz").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        let get = |key: &str| pairs.iter().find(|(k, _)| k.as_str() == key).map(|(_, v)| v.as_str());
        assert_eq!(get("client_id"), Some("cid"));
        assert_eq!(get("redirect_uri"), Some("http://127.0.0.1:4567"));
        assert_eq!(get("scope"), Some("https://www.googleapis.com/auth/documents"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("state"), Some("xyz"));
    }

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_callback_code_returns_code() {
        assert_eq!(
            callback_code(&params(&[("state", "abc"), ("code", "4/0Ad")]), "abc").unwrap(),
            Some("4/0Ad".to_string())
        );
    }

    #[test]
    fn test_callback_code_ignores_unrelated_requests() {
        assert_eq!(callback_code(&params(&[]), "abc").unwrap(), None);
        assert_eq!(callback_code(&params(&[("hl", "en")]), "abc").unwrap(), None);
    }

    #[test]
    fn test_callback_code_rejects_wrong_state_and_denial() {
        assert!(callback_code(&params(&[("state", "evil"), ("code", "c")]), "abc").is_err());
        assert!(callback_code(&params(&[("code", "c")]), "abc").is_err());
        assert!(matches!(
            callback_code(&params(&[("error", "access_denied"), ("state", "abc")]), "abc"),
            Err(ResumeTailorError::Auth(_))
        ));
    }

    fn browser() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_wait_for_code_over_loopback() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let waiting = tokio::spawn(async move { wait_for_code(listener, "s1").await });

        let http = browser();
        let favicon = http
            .get(format!("http://127.0.0.1:{}/favicon.ico", port))
            .send()
            .await
            .unwrap();
        assert_eq!(favicon.status().as_u16(), 404);

        let callback = http
            .get(format!("http://127.0.0.1:{}/?code=the-code&state=s1", port))
            .send()
            .await
            .unwrap();
        assert_eq!(callback.status().as_u16(), 200);
        assert!(callback.text().await.unwrap().contains("Authorization complete"));

        assert_eq!(waiting.await.unwrap().unwrap(), "the-code");
    }

    #[tokio::test]
    async fn test_denied_consent_fails_the_wait() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let waiting = tokio::spawn(async move { wait_for_code(listener, "s1").await });

        let response = browser()
            .get(format!("http://127.0.0.1:{}/?error=access_denied&state=s1", port))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(ResumeTailorError::Auth(message)) if message.contains("access_denied")));
    }
}
