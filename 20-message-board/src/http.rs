use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use percent_encoding::percent_decode_str;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::{
    assets::{FORM_PAGE, NOT_FOUND_PAGE, StaticAssets},
    error::SubmitError,
    relay::RelaySender,
};

/// The form page, and the only path that accepts submissions.
pub const FORM_PATH: &str = "/message.html";

#[derive(Debug, Clone)]
pub struct AppState {
    assets: StaticAssets,
    relay: RelaySender,
}

impl AppState {
    pub fn new(assets: StaticAssets, relay: RelaySender) -> Self {
        Self { assets, relay }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .fallback(dispatch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> Response {
    match method {
        Method::GET | Method::HEAD => handle_get(&state, uri.path()).await,
        Method::POST => handle_post(&state, uri.path(), &body).await,
        _ => not_found(&state).await,
    }
}

/// `/` and the form path serve the form page; anything else is a static lookup.
pub async fn handle_get(state: &AppState, path: &str) -> Response {
    let lookup = match path {
        "/" | FORM_PATH => FORM_PAGE,
        other => other,
    };

    match state.assets.fetch(lookup).await {
        Ok(Some(asset)) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, asset.content_type)],
            asset.bytes,
        )
            .into_response(),
        Ok(None) => not_found(state).await,
        Err(err) => {
            error!(path, error = ?err, "failed to read asset");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Accepts a submission and redirects to `/` without waiting for it to be stored.
pub async fn handle_post(state: &AppState, path: &str, body: &[u8]) -> Response {
    if path != FORM_PATH {
        return not_found(state).await;
    }

    match submit(state, body) {
        Ok(()) => (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response(),
        Err(err) => {
            debug!(error = %err, "rejected submission");
            err.into_response()
        }
    }
}

fn submit(state: &AppState, body: &[u8]) -> Result<(), SubmitError> {
    let submission = Submission::parse(body)?;
    state
        .relay
        .dispatch(&submission.username, &submission.message)?;
    Ok(())
}

async fn not_found(state: &AppState) -> Response {
    match state.assets.fetch(NOT_FOUND_PAGE).await {
        Ok(Some(page)) => (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, page.content_type)],
            page.bytes,
        )
            .into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "not found").into_response(),
        Err(err) => {
            error!(error = ?err, "failed to read not-found page");
            (StatusCode::NOT_FOUND, "not found").into_response()
        }
    }
}

/// A decoded `application/x-www-form-urlencoded` submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub username: String,
    pub message: String,
}

impl Submission {
    /// Splits on `&` and `=` before percent-decoding, so encoded separators
    /// inside values are kept. Exactly `username` and `message` are accepted,
    /// once each.
    pub fn parse(body: &[u8]) -> Result<Self, SubmitError> {
        let text = std::str::from_utf8(body).map_err(|_| SubmitError::NotUtf8)?;
        let mut username = None;
        let mut message = None;

        for pair in text.split('&') {
            let Some((raw_key, raw_value)) = pair
                .split_once('=')
                .filter(|(_, value)| !value.contains('='))
            else {
                return Err(SubmitError::MalformedPair(pair.to_string()));
            };
            let key = form_decode(raw_key)?;
            let value = form_decode(raw_value)?;

            let slot = match key.as_str() {
                "username" => &mut username,
                "message" => &mut message,
                _ => return Err(SubmitError::UnexpectedField(key)),
            };
            if slot.is_some() {
                return Err(SubmitError::DuplicateField(key));
            }
            *slot = Some(value);
        }

        Ok(Self {
            username: username.ok_or(SubmitError::MissingField("username"))?,
            message: message.ok_or(SubmitError::MissingField("message"))?,
        })
    }
}

/// Decodes one form component: `+` is a space and every `%` must start a
/// two-digit hex escape. The decoded bytes must be UTF-8.
fn form_decode(raw: &str) -> Result<String, SubmitError> {
    let bytes = raw.as_bytes();
    let well_formed = bytes.iter().enumerate().all(|(i, &b)| {
        b != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    });
    if !well_formed {
        return Err(SubmitError::MalformedEncoding(raw.to_string()));
    }

    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| SubmitError::MalformedEncoding(raw.to_string()))
}
