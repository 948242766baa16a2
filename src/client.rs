//! TestingBot API Client
//!
//! `TestingBotApi` is the capability tool handlers are given; every method
//! maps to one TestingBot REST operation and returns the decoded JSON body.
//! `TestingBotClient` is the reqwest implementation (HTTP basic auth with the
//! account key and secret).

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::ApiError;

/// Remote browser sessions are created on the grid, not the REST API
const SESSION_URL: &str = "https://cloud.testingbot.com/session";

/// Fields that can be changed on a finished test
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TestUpdate {
    pub name: Option<String>,
    pub success: Option<bool>,
    pub build: Option<String>,
    pub extra: Option<String>,
}

impl TestUpdate {
    fn form(&self) -> Vec<(&'static str, String)> {
        let mut form = Vec::new();
        if let Some(name) = &self.name {
            form.push(("test[name]", name.clone()));
        }
        if let Some(success) = self.success {
            form.push(("test[success]", if success { "1" } else { "0" }.to_string()));
        }
        if let Some(build) = &self.build {
            form.push(("test[build]", build.clone()));
        }
        if let Some(extra) = &self.extra {
            form.push(("test[extra]", extra.clone()));
        }
        form
    }
}

/// Profile fields on the current account
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

impl UserUpdate {
    fn form(&self) -> Vec<(&'static str, String)> {
        [
            ("user[first_name]", &self.first_name),
            ("user[last_name]", &self.last_name),
            ("user[email]", &self.email),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}

/// One browser in a screenshot job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreenshotBrowser {
    #[serde(rename = "browserName")]
    pub browser_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub os: String,
}

/// Screenshot job parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenshotRequest {
    pub url: String,
    pub browsers: Vec<ScreenshotBrowser>,
    pub resolution: String,
    #[serde(rename = "waitTime")]
    pub wait_time: u64,
    #[serde(rename = "fullPage")]
    pub full_page: bool,
}

/// Shared handle given to every tool group
pub type SharedApi = Arc<dyn TestingBotApi>;

/// The TestingBot operations tools can call
#[async_trait]
pub trait TestingBotApi: Send + Sync {
    async fn get_browsers(&self, kind: Option<&str>) -> Result<Value, ApiError>;
    async fn get_devices(&self) -> Result<Value, ApiError>;

    async fn get_tests(&self, offset: u64, limit: u64) -> Result<Value, ApiError>;
    async fn get_test_details(&self, session_id: &str) -> Result<Value, ApiError>;
    async fn update_test(&self, session_id: &str, update: &TestUpdate) -> Result<Value, ApiError>;
    async fn delete_test(&self, session_id: &str) -> Result<Value, ApiError>;
    async fn stop_test(&self, session_id: &str) -> Result<Value, ApiError>;

    async fn get_builds(&self, offset: u64, limit: u64) -> Result<Value, ApiError>;
    async fn get_tests_for_build(&self, build_id: i64) -> Result<Value, ApiError>;
    async fn delete_build(&self, build_id: i64) -> Result<Value, ApiError>;

    async fn upload_file(&self, path: &Path) -> Result<Value, ApiError>;
    async fn upload_remote_file(&self, url: &str) -> Result<Value, ApiError>;
    async fn get_storage_files(&self, offset: u64, limit: u64) -> Result<Value, ApiError>;
    async fn delete_storage_file(&self, app_url: &str) -> Result<Value, ApiError>;

    async fn take_screenshot(&self, request: &ScreenshotRequest) -> Result<Value, ApiError>;
    async fn retrieve_screenshots(&self, screenshot_id: &str) -> Result<Value, ApiError>;
    async fn get_screenshot_list(&self, offset: u64, limit: u64) -> Result<Value, ApiError>;

    async fn get_user_info(&self) -> Result<Value, ApiError>;
    async fn update_user_info(&self, update: &UserUpdate) -> Result<Value, ApiError>;

    async fn get_team(&self) -> Result<Value, ApiError>;
    async fn get_users_in_team(&self) -> Result<Value, ApiError>;
    async fn get_user_from_team(&self, user_id: i64) -> Result<Value, ApiError>;

    async fn create_session(&self, capabilities: &Map<String, Value>) -> Result<Value, ApiError>;

    async fn get_tunnel_list(&self) -> Result<Value, ApiError>;
    async fn delete_tunnel(&self, tunnel_id: &str) -> Result<Value, ApiError>;
}

/// reqwest-backed TestingBot client
#[derive(Clone)]
pub struct TestingBotClient {
    http: Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl TestingBotClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(format!("testingbot-mcp/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
        })
    }

    /// Authenticated request against an API-relative path
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        self.request_url(method, &url)
    }

    fn request_url(&self, method: Method, url: &str) -> RequestBuilder {
        debug!(%method, %url, "building request");
        self.http
            .request(method, url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .header(header::ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");
        decode_response(status, &body)
    }

    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, path)).await
    }

    async fn get_page(&self, path: &str, offset: u64, limit: u64) -> Result<Value, ApiError> {
        let request = self
            .request(Method::GET, path)
            .query(&[("offset", offset), ("count", limit)]);
        self.send(request).await
    }

    async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::DELETE, path)).await
    }
}

/// Map an HTTP response onto the client's result type
fn decode_response(status: StatusCode, body: &str) -> Result<Value, ApiError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(ApiError::Authentication(error_message(body, status)));
    }
    if !status.is_success() {
        return Err(ApiError::Status {
            status: status.as_u16(),
            message: error_message(body, status),
        });
    }
    if body.trim().is_empty() {
        return Ok(json!({ "success": true }));
    }
    Ok(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}

/// Pull a readable message out of an error body
fn error_message(body: &str, status: StatusCode) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message", "errors"] {
            match value.get(key) {
                Some(Value::String(s)) => return s.clone(),
                Some(Value::Array(items)) if !items.is_empty() => {
                    return items
                        .iter()
                        .map(|i| i.as_str().map(str::to_string).unwrap_or_else(|| i.to_string()))
                        .collect::<Vec<_>>()
                        .join(", ");
                }
                _ => {}
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        trimmed.chars().take(500).collect()
    }
}

/// `tb://abc123` -> `abc123`
fn storage_id(app_url: &str) -> &str {
    app_url.strip_prefix("tb://").unwrap_or(app_url)
}

#[async_trait]
impl TestingBotApi for TestingBotClient {
    async fn get_browsers(&self, kind: Option<&str>) -> Result<Value, ApiError> {
        let mut request = self.request(Method::GET, "/browsers");
        if let Some(kind) = kind {
            request = request.query(&[("type", kind)]);
        }
        self.send(request).await
    }

    async fn get_devices(&self) -> Result<Value, ApiError> {
        self.get("/devices").await
    }

    async fn get_tests(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.get_page("/tests", offset, limit).await
    }

    async fn get_test_details(&self, session_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/tests/{}", session_id)).await
    }

    async fn update_test(&self, session_id: &str, update: &TestUpdate) -> Result<Value, ApiError> {
        let request = self
            .request(Method::PUT, &format!("/tests/{}", session_id))
            .form(&update.form());
        self.send(request).await
    }

    async fn delete_test(&self, session_id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/tests/{}", session_id)).await
    }

    async fn stop_test(&self, session_id: &str) -> Result<Value, ApiError> {
        let request = self.request(Method::PUT, &format!("/tests/{}/stop", session_id));
        self.send(request).await
    }

    async fn get_builds(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.get_page("/builds", offset, limit).await
    }

    async fn get_tests_for_build(&self, build_id: i64) -> Result<Value, ApiError> {
        self.get(&format!("/builds/{}", build_id)).await
    }

    async fn delete_build(&self, build_id: i64) -> Result<Value, ApiError> {
        self.delete(&format!("/builds/{}", build_id)).await
    }

    async fn upload_file(&self, path: &Path) -> Result<Value, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);

        self.send(self.request(Method::POST, "/storage").multipart(form))
            .await
    }

    async fn upload_remote_file(&self, url: &str) -> Result<Value, ApiError> {
        let request = self
            .request(Method::POST, "/storage")
            .form(&[("url", url)]);
        self.send(request).await
    }

    async fn get_storage_files(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.get_page("/storage", offset, limit).await
    }

    async fn delete_storage_file(&self, app_url: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/storage/{}", storage_id(app_url)))
            .await
    }

    async fn take_screenshot(&self, request: &ScreenshotRequest) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, "/screenshots").json(request))
            .await
    }

    async fn retrieve_screenshots(&self, screenshot_id: &str) -> Result<Value, ApiError> {
        self.get(&format!("/screenshots/{}", screenshot_id)).await
    }

    async fn get_screenshot_list(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.get_page("/screenshots", offset, limit).await
    }

    async fn get_user_info(&self) -> Result<Value, ApiError> {
        self.get("/user").await
    }

    async fn update_user_info(&self, update: &UserUpdate) -> Result<Value, ApiError> {
        let request = self.request(Method::PUT, "/user").form(&update.form());
        self.send(request).await
    }

    async fn get_team(&self) -> Result<Value, ApiError> {
        self.get("/team-management").await
    }

    async fn get_users_in_team(&self) -> Result<Value, ApiError> {
        self.get("/team-management/users").await
    }

    async fn get_user_from_team(&self, user_id: i64) -> Result<Value, ApiError> {
        self.get(&format!("/team-management/users/{}", user_id))
            .await
    }

    async fn create_session(&self, capabilities: &Map<String, Value>) -> Result<Value, ApiError> {
        let request = self
            .request_url(Method::POST, SESSION_URL)
            .json(&json!({ "capabilities": capabilities }));
        self.send(request).await
    }

    async fn get_tunnel_list(&self) -> Result<Value, ApiError> {
        self.get("/tunnel/list").await
    }

    async fn delete_tunnel(&self, tunnel_id: &str) -> Result<Value, ApiError> {
        self.delete(&format!("/tunnel/{}", tunnel_id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success_body() {
        let value = decode_response(StatusCode::OK, r#"{"data": [1, 2]}"#).unwrap();
        assert_eq!(value["data"], json!([1, 2]));
    }

    #[test]
    fn test_decode_empty_body() {
        let value = decode_response(StatusCode::NO_CONTENT, "").unwrap();
        assert_eq!(value, json!({ "success": true }));
    }

    #[test]
    fn test_decode_auth_failure() {
        let err = decode_response(StatusCode::UNAUTHORIZED, r#"{"error": "bad key"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(ref m) if m == "bad key"));
    }

    #[test]
    fn test_decode_status_failure() {
        let err = decode_response(StatusCode::NOT_FOUND, "").unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Not Found");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = decode_response(StatusCode::UNPROCESSABLE_ENTITY, r#"{"errors": ["a", "b"]}"#)
            .unwrap_err();
        assert_eq!(err.to_string(), "TestingBot API returned 422: a, b");
    }

    #[test]
    fn test_storage_id() {
        assert_eq!(storage_id("tb://abc123"), "abc123");
        assert_eq!(storage_id("abc123"), "abc123");
    }

    #[test]
    fn test_update_forms() {
        let update = TestUpdate {
            name: Some("login".into()),
            success: Some(false),
            ..Default::default()
        };
        assert_eq!(
            update.form(),
            vec![("test[name]", "login".to_string()), ("test[success]", "0".to_string())]
        );

        let user = UserUpdate {
            email: Some("a@b.co".into()),
            ..Default::default()
        };
        assert_eq!(user.form(), vec![("user[email]", "a@b.co".to_string())]);
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_io_error() {
        let config = Config::from_lookup(|name| match name {
            "TB_KEY" => Some("k".to_string()),
            "TB_SECRET" => Some("s".to_string()),
            _ => None,
        })
        .unwrap();
        let client = TestingBotClient::new(&config).unwrap();
        let err = client
            .upload_file(Path::new("/definitely/not/here.apk"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
