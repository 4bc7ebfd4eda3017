//! Mapping of Google API failures onto [`SheetError`].

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::SheetError;

/// `{"error": {...}}` as returned by googleapis.com JSON APIs.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorItem {
    #[serde(default)]
    message: String,
    #[serde(default)]
    reason: String,
}

/// `{"error": "invalid_grant", "error_description": "..."}` from the token endpoint.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Builds the error for a non-success API response.
///
/// `context` names the request, e.g. `values.append`.
pub(crate) fn api_error(status: StatusCode, body: &str, context: &str) -> SheetError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let rate_limited_reason = parsed.as_ref().is_some_and(|b| {
        b.error
            .errors
            .iter()
            .any(|item| item.reason.contains("RateLimitExceeded") || item.reason == "rateLimitExceeded")
    });

    let summary = parsed
        .as_ref()
        .map(|b| b.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| truncate(body, 200));
    let message = format!("{} failed ({}): {}", context, status.as_u16(), summary);

    let error = match status {
        StatusCode::UNAUTHORIZED => SheetError::authentication(message),
        StatusCode::FORBIDDEN if rate_limited_reason => SheetError::rate_limited(message),
        StatusCode::FORBIDDEN => SheetError::permission_denied(message),
        StatusCode::NOT_FOUND => SheetError::not_found(message),
        StatusCode::TOO_MANY_REQUESTS => SheetError::rate_limited(message),
        s if s.is_server_error() => SheetError::server(message),
        _ => SheetError::bad_request(message),
    };

    match parsed {
        Some(body) => error.with_details(
            body.error
                .errors
                .into_iter()
                .map(|item| item.message)
                .filter(|m| !m.is_empty()),
        ),
        None => error,
    }
}

/// Builds the error for a rejected token endpoint request.
pub(crate) fn oauth_error(status: StatusCode, body: &str, context: &str) -> SheetError {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(parsed) => {
            let message = format!("{} failed ({}): {}", context, status.as_u16(), parsed.error);
            let error = if status.is_server_error() {
                SheetError::server(message)
            } else {
                SheetError::authentication(message)
            };
            error.with_details(parsed.error_description)
        }
        Err(_) => api_error(status, body, context),
    }
}

/// Classifies a transport-level failure.
pub(crate) fn request_error(err: reqwest::Error, context: &str) -> SheetError {
    let message = if err.is_timeout() {
        format!("{}: request timed out", context)
    } else if err.is_connect() {
        format!("{}: connection failed: {}", context, err)
    } else {
        format!("{}: request failed: {}", context, err)
    };
    SheetError::network(message).with_source(err)
}

fn truncate(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SheetErrorCode;

    const BAD_RANGE: &str = r#"{
      "error": {
        "code": 400,
        "message": "Unable to parse range: nope!A2",
        "status": "INVALID_ARGUMENT",
        "errors": [
          {"message": "Unable to parse range: nope!A2", "domain": "global", "reason": "badRequest"}
        ]
      }
    }"#;

    #[test]
    fn bad_request_details() {
        let err = api_error(StatusCode::BAD_REQUEST, BAD_RANGE, "values.append");
        assert_eq!(err.code(), SheetErrorCode::BadRequest);
        assert_eq!(
            err.message(),
            "values.append failed (400): Unable to parse range: nope!A2"
        );
        assert_eq!(err.details(), ["Unable to parse range: nope!A2".to_string()]);
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (StatusCode::UNAUTHORIZED, SheetErrorCode::AuthenticationFailed),
            (StatusCode::FORBIDDEN, SheetErrorCode::PermissionDenied),
            (StatusCode::NOT_FOUND, SheetErrorCode::NotFound),
            (StatusCode::TOO_MANY_REQUESTS, SheetErrorCode::RateLimited),
            (StatusCode::BAD_GATEWAY, SheetErrorCode::ServerError),
            (StatusCode::CONFLICT, SheetErrorCode::BadRequest),
        ];
        for (status, code) in cases {
            assert_eq!(api_error(status, "", "values.get").code(), code, "{}", status);
        }
    }

    #[test]
    fn quota_403_is_rate_limited() {
        let body = r#"{"error": {"code": 403, "message": "Quota exceeded",
            "errors": [{"message": "Quota exceeded", "reason": "userRateLimitExceeded"}]}}"#;
        let err = api_error(StatusCode::FORBIDDEN, body, "values.get");
        assert_eq!(err.code(), SheetErrorCode::RateLimited);
    }

    #[test]
    fn non_json_body_is_truncated() {
        let body = "x".repeat(500);
        let err = api_error(StatusCode::INTERNAL_SERVER_ERROR, &body, "values.get");
        assert!(err.message().ends_with("..."));
        assert!(err.details().is_empty());
    }

    #[test]
    fn oauth_invalid_grant() {
        let body = r#"{"error": "invalid_grant", "error_description": "Token has been expired or revoked."}"#;
        let err = oauth_error(StatusCode::BAD_REQUEST, body, "token refresh");
        assert_eq!(err.code(), SheetErrorCode::AuthenticationFailed);
        assert!(err.message().contains("invalid_grant"));
        assert_eq!(err.details(), ["Token has been expired or revoked.".to_string()]);
    }
}
