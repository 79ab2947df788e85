//! HTTP client for the lesson server (`/api/*` and the `/data` mirror).

use lexicard_core::models::api::{HealthResponse, SaveResponse};
use lexicard_core::models::WordEntry;
use lexicard_core::naming::validate_lesson_name;
use lexicard_core::store::parse_lesson;
use lexicard_core::AppError;
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::time::Duration;

/// Lesson server client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    server: String,
}

impl ApiClient {
    /// Build a client for `server` whose requests give up after `timeout`.
    ///
    /// # Errors
    /// [`AppError::BadRequest`] when `server` is not a usable base URL.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, AppError> {
        api_url(server, &[]).map_err(AppError::BadRequest)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| {
                AppError::StorageUnavailable(format!("Failed to build HTTP client: {}", err))
            })?;
        Ok(Self {
            http,
            server: server.to_string(),
        })
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    fn url(&self, segments: &[&str]) -> Result<Url, AppError> {
        api_url(&self.server, segments).map_err(AppError::BadRequest)
    }

    /// `GET /api/health`.
    pub async fn health(&self) -> Result<HealthResponse, AppError> {
        let body = self
            .fetch_text(self.http.get(self.url(&["api", "health"])?), "health")
            .await?;
        decode(&body, "health")
    }

    /// `GET /api/files`.
    pub async fn list_files(&self) -> Result<Vec<String>, AppError> {
        let body = self
            .fetch_text(self.http.get(self.url(&["api", "files"])?), "files")
            .await?;
        decode(&body, "files")
    }

    /// `GET /api/data/{name}`.
    pub async fn read_file(&self, name: &str) -> Result<Vec<WordEntry>, AppError> {
        let name = validate_lesson_name(name)?;
        let body = self
            .fetch_text(self.http.get(self.url(&["api", "data", name])?), name)
            .await?;
        parse_lesson(name, &body)
    }

    /// `GET /data/{name}.json` from the read-only mirror.
    pub async fn read_static(&self, name: &str) -> Result<Vec<WordEntry>, AppError> {
        let name = validate_lesson_name(name)?;
        let file = format!("{}.json", name);
        let body = self
            .fetch_text(self.http.get(self.url(&["data", file.as_str()])?), name)
            .await?;
        parse_lesson(name, &body)
    }

    /// `POST /api/save/{name}` with the complete lesson.
    pub async fn save_file(
        &self,
        name: &str,
        entries: &[WordEntry],
    ) -> Result<SaveResponse, AppError> {
        let name = validate_lesson_name(name)?;
        let request = self
            .http
            .post(self.url(&["api", "save", name])?)
            .json(entries);
        let body = self.fetch_text(request, name).await?;
        decode(&body, name)
    }

    async fn fetch_text(
        &self,
        request: reqwest::RequestBuilder,
        subject: &str,
    ) -> Result<String, AppError> {
        let res = request.send().await.map_err(transport_error)?;
        let status = res.status();
        let body = res.text().await.map_err(transport_error)?;
        if status.is_success() {
            Ok(body)
        } else {
            Err(error_for_status(status, &body, subject))
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(body: &str, subject: &str) -> Result<T, AppError> {
    serde_json::from_str(body).map_err(|err| AppError::Corrupt {
        name: subject.to_string(),
        reason: err.to_string(),
    })
}

fn transport_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::StorageUnavailable(format!("request timed out: {}", err))
    } else {
        AppError::StorageUnavailable(format!("request failed: {}", err))
    }
}

/// Join `segments` onto `server`, percent-encoding each one.
pub fn api_url(server: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url =
        Url::parse(server).map_err(|err| format!("Invalid server URL '{}': {}", server, err))?;
    let mut path = url
        .path_segments_mut()
        .map_err(|_| "Server URL cannot be used as an API base".to_string())?;
    path.pop_if_empty();
    for segment in segments {
        path.push(segment);
    }
    drop(path);
    Ok(url)
}

/// Human-readable message from an error response: the JSON `error` field when
/// present, otherwise the raw body or the status reason.
pub fn error_message_for_response(status: StatusCode, body: &str) -> String {
    if body.trim().is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or(body)
            .to_string();
    }

    body.to_string()
}

fn error_details(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("details")?
        .as_str()
        .map(str::to_string)
}

/// Map a non-success response back onto the store's error taxonomy.
pub fn error_for_status(status: StatusCode, body: &str, subject: &str) -> AppError {
    let message = error_message_for_response(status, body);
    match status {
        StatusCode::BAD_REQUEST if message == "Invalid file name" => {
            AppError::InvalidName(subject.to_string())
        }
        StatusCode::NOT_FOUND => AppError::NotFound(subject.to_string()),
        StatusCode::UNPROCESSABLE_ENTITY => AppError::Corrupt {
            name: subject.to_string(),
            reason: error_details(body).unwrap_or(message),
        },
        status if status.is_server_error() => {
            AppError::StorageUnavailable(format!("{} ({})", message, status))
        }
        _ => AppError::BadRequest(message),
    }
}

#[cfg(test)]
mod tests {
    use super::{api_url, error_for_status, error_message_for_response, ApiClient};
    use lexicard_core::{AppError, DEFAULT_PORT};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn error_message_for_response_prefers_json_error_field() {
        let message =
            error_message_for_response(StatusCode::NOT_FOUND, r#"{"error":"File not found"}"#);
        assert_eq!(message, "File not found");
    }

    #[test]
    fn error_message_for_response_uses_reason_for_empty_body() {
        let message = error_message_for_response(StatusCode::BAD_REQUEST, "   ");
        assert_eq!(message, "Bad Request");
    }

    #[test]
    fn error_for_status_matrix() {
        let invalid = error_for_status(
            StatusCode::BAD_REQUEST,
            r#"{"error":"Invalid file name"}"#,
            "a.b",
        );
        assert!(matches!(invalid, AppError::InvalidName(name) if name == "a.b"));

        let malformed = error_for_status(StatusCode::BAD_REQUEST, "expected array", "lesson1");
        assert!(matches!(malformed, AppError::BadRequest(msg) if msg == "expected array"));

        let missing = error_for_status(StatusCode::NOT_FOUND, "", "lesson9");
        assert!(matches!(missing, AppError::NotFound(name) if name == "lesson9"));

        let corrupt = error_for_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"error":"Failed to read file","details":"EOF while parsing"}"#,
            "broken",
        );
        assert!(matches!(
            corrupt,
            AppError::Corrupt { name, reason }
                if name == "broken" && reason == "EOF while parsing"
        ));

        let down = error_for_status(StatusCode::SERVICE_UNAVAILABLE, "", "lesson1");
        assert!(down.is_reachability());
        let gateway = error_for_status(StatusCode::BAD_GATEWAY, "<html>", "lesson1");
        assert!(gateway.is_reachability());
    }

    #[test]
    fn api_url_encodes_path_segments() {
        let url = api_url(
            &format!("http://127.0.0.1:{}", DEFAULT_PORT),
            &["api", "data", "name/with?reserved#chars"],
        )
        .expect("api_url should build");
        assert_eq!(
            url.as_str(),
            &format!(
                "http://127.0.0.1:{}/api/data/name%2Fwith%3Freserved%23chars",
                DEFAULT_PORT
            )
        );
    }

    #[test]
    fn api_url_appends_segments_to_existing_base_path() {
        let url = api_url(
            &format!("http://127.0.0.1:{}/cards", DEFAULT_PORT),
            &["data", "lesson1.json"],
        )
        .expect("api_url should build");
        assert_eq!(
            url.as_str(),
            &format!("http://127.0.0.1:{}/cards/data/lesson1.json", DEFAULT_PORT)
        );
    }

    #[test]
    fn client_rejects_unusable_server_urls() {
        let err = ApiClient::new("not a url", Duration::from_secs(1)).expect_err("bad url");
        assert!(matches!(err, AppError::BadRequest(_)));
        let err = ApiClient::new("mailto:someone@example.com", Duration::from_secs(1))
            .expect_err("cannot-be-a-base url");
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn invalid_names_fail_before_any_request() {
        let client = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client");
        let err = client.read_file("../etc").await.expect_err("traversal");
        assert!(matches!(err, AppError::InvalidName(_)));
        let err = client.save_file("a b", &[]).await.expect_err("space");
        assert!(matches!(err, AppError::InvalidName(_)));
    }
}
