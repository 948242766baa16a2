//! In-memory TestingBot API used by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use testingbot_mcp::client::{ScreenshotRequest, TestUpdate, UserUpdate};
use testingbot_mcp::{build_registry, ApiError, SharedApi, TestingBotApi, ToolRegistry};

/// One recorded API call: method name plus its arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub args: Value,
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<HashMap<&'static str, Value>>,
    failure: Mutex<Option<(u16, String)>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Canned body for `method`; anything not set answers `{"success": true}`
    pub fn reply(&self, method: &'static str, body: Value) {
        self.replies.lock().unwrap().insert(method, body);
    }

    /// Make every following call fail with `status` / `message`
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(&self, method: &'static str, args: Value) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(Call { method, args });
        if let Some((status, message)) = self.failure.lock().unwrap().clone() {
            return Err(match status {
                401 | 403 => ApiError::Authentication(message),
                status => ApiError::Status { status, message },
            });
        }
        Ok(self
            .replies
            .lock()
            .unwrap()
            .get(method)
            .cloned()
            .unwrap_or_else(|| json!({"success": true})))
    }
}

#[async_trait]
impl TestingBotApi for FakeApi {
    async fn get_browsers(&self, kind: Option<&str>) -> Result<Value, ApiError> {
        self.answer("get_browsers", json!({ "type": kind }))
    }

    async fn get_devices(&self) -> Result<Value, ApiError> {
        self.answer("get_devices", Value::Null)
    }

    async fn get_tests(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.answer("get_tests", json!({ "offset": offset, "limit": limit }))
    }

    async fn get_test_details(&self, session_id: &str) -> Result<Value, ApiError> {
        self.answer("get_test_details", json!(session_id))
    }

    async fn update_test(&self, session_id: &str, update: &TestUpdate) -> Result<Value, ApiError> {
        self.answer(
            "update_test",
            json!({ "session_id": session_id, "update": update }),
        )
    }

    async fn delete_test(&self, session_id: &str) -> Result<Value, ApiError> {
        self.answer("delete_test", json!(session_id))
    }

    async fn stop_test(&self, session_id: &str) -> Result<Value, ApiError> {
        self.answer("stop_test", json!(session_id))
    }

    async fn get_builds(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.answer("get_builds", json!({ "offset": offset, "limit": limit }))
    }

    async fn get_tests_for_build(&self, build_id: i64) -> Result<Value, ApiError> {
        self.answer("get_tests_for_build", json!(build_id))
    }

    async fn delete_build(&self, build_id: i64) -> Result<Value, ApiError> {
        self.answer("delete_build", json!(build_id))
    }

    async fn upload_file(&self, path: &Path) -> Result<Value, ApiError> {
        self.answer("upload_file", json!(path.to_string_lossy()))
    }

    async fn upload_remote_file(&self, url: &str) -> Result<Value, ApiError> {
        self.answer("upload_remote_file", json!(url))
    }

    async fn get_storage_files(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.answer("get_storage_files", json!({ "offset": offset, "limit": limit }))
    }

    async fn delete_storage_file(&self, app_url: &str) -> Result<Value, ApiError> {
        self.answer("delete_storage_file", json!(app_url))
    }

    async fn take_screenshot(&self, request: &ScreenshotRequest) -> Result<Value, ApiError> {
        self.answer("take_screenshot", json!(request))
    }

    async fn retrieve_screenshots(&self, screenshot_id: &str) -> Result<Value, ApiError> {
        self.answer("retrieve_screenshots", json!(screenshot_id))
    }

    async fn get_screenshot_list(&self, offset: u64, limit: u64) -> Result<Value, ApiError> {
        self.answer("get_screenshot_list", json!({ "offset": offset, "limit": limit }))
    }

    async fn get_user_info(&self) -> Result<Value, ApiError> {
        self.answer("get_user_info", Value::Null)
    }

    async fn update_user_info(&self, update: &UserUpdate) -> Result<Value, ApiError> {
        self.answer("update_user_info", json!(update))
    }

    async fn get_team(&self) -> Result<Value, ApiError> {
        self.answer("get_team", Value::Null)
    }

    async fn get_users_in_team(&self) -> Result<Value, ApiError> {
        self.answer("get_users_in_team", Value::Null)
    }

    async fn get_user_from_team(&self, user_id: i64) -> Result<Value, ApiError> {
        self.answer("get_user_from_team", json!(user_id))
    }

    async fn create_session(&self, capabilities: &Map<String, Value>) -> Result<Value, ApiError> {
        self.answer("create_session", Value::Object(capabilities.clone()))
    }

    async fn get_tunnel_list(&self) -> Result<Value, ApiError> {
        self.answer("get_tunnel_list", Value::Null)
    }

    async fn delete_tunnel(&self, tunnel_id: &str) -> Result<Value, ApiError> {
        self.answer("delete_tunnel", json!(tunnel_id))
    }
}

/// Full registry wired to a fresh fake
pub fn registry() -> (ToolRegistry, Arc<FakeApi>) {
    let fake = FakeApi::new();
    let api: SharedApi = fake.clone();
    let registry = build_registry(&api).expect("registry builds");
    (registry, fake)
}
