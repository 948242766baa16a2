//! Test result tools: list, inspect, annotate, delete and stop tests

use chrono::{DateTime, SecondsFormat};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{display, first_truthy, items, paging, present, push_field, truthy, with_api, yes_no, Page};
use crate::client::{SharedApi, TestUpdate};
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};
use crate::util::sanitize_session_id;

const TEST_URL: &str = "https://testingbot.com/members/tests";
const STEP_RESPONSE_PREVIEW: usize = 100;

fn session_schema(description: &'static str) -> ArgumentSchema {
    ArgumentSchema::new().param(ParamSpec::required(
        "sessionId",
        ParamKind::non_empty_string(),
        description,
    ))
}

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getTests",
            "Retrieve a list of recent tests with optional pagination. Returns test details including status, browser, platform, video and duration.",
            paging("Number of tests to retrieve (default: 10, max: 100)"),
            with_api(api, get_tests),
        ),
        ToolDefinition::new(
            "getTestDetails",
            "Get detailed information about a specific test by session ID. Includes logs, screenshots, video URLs, and execution metadata.",
            session_schema("The session ID of the test"),
            with_api(api, get_test_details),
        ),
        ToolDefinition::new(
            "updateTest",
            "Update test metadata such as name, status (passed/failed), and other attributes. Useful for marking tests after execution.",
            session_schema("The session ID of the test to update")
                .param(ParamSpec::optional("name", ParamKind::string(), "New name for the test"))
                .param(ParamSpec::optional(
                    "status",
                    ParamKind::Enum(&["passed", "failed"]),
                    "Mark test as passed or failed",
                ))
                .param(ParamSpec::optional("build", ParamKind::string(), "Build identifier"))
                .param(ParamSpec::optional(
                    "extra",
                    ParamKind::string(),
                    "Additional metadata (JSON string)",
                )),
            with_api(api, update_test),
        ),
        ToolDefinition::new(
            "deleteTest",
            "Delete a test by session ID. This permanently removes the test and its associated data.",
            session_schema("The session ID of the test to delete"),
            with_api(api, delete_test),
        ),
        ToolDefinition::new(
            "stopTest",
            "Stop a running test by session ID. This terminates the test execution immediately.",
            session_schema("The session ID of the test to stop"),
            with_api(api, stop_test),
        ),
    ]
}

fn session_id(args: &ValidatedArgs) -> Result<String, HandlerError> {
    let id = sanitize_session_id(args.str("sessionId").unwrap_or_default());
    if id.is_empty() {
        return Err(HandlerError::Invalid(
            "sessionId contains no usable characters".to_string(),
        ));
    }
    Ok(id)
}

async fn get_tests(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let page: Page = args.parse()?;
    info!(offset = page.offset, limit = page.limit, "Fetching tests");

    let response = api.get_tests(page.offset, page.limit).await?;
    let tests = items(&response);
    info!(count = tests.len(), "Tests fetched successfully");

    Ok(render_test_list(tests, &page))
}

async fn get_test_details(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let session_id = session_id(&args)?;
    info!(session_id = %session_id, "Fetching test details");

    let test = api.get_test_details(&session_id).await?;
    Ok(render_test_details(&session_id, &test))
}

#[derive(Debug, Deserialize)]
struct UpdateArgs {
    name: Option<String>,
    status: Option<String>,
    build: Option<String>,
    extra: Option<String>,
}

impl UpdateArgs {
    fn into_update(self) -> TestUpdate {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        TestUpdate {
            name: non_empty(self.name),
            success: self.status.map(|s| s == "passed"),
            build: non_empty(self.build),
            extra: non_empty(self.extra),
        }
    }
}

async fn update_test(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let session_id = session_id(&args)?;
    let update = args.parse::<UpdateArgs>()?.into_update();
    info!(session_id = %session_id, update = ?update, "Updating test");

    api.update_test(&session_id, &update).await?;
    Ok(format!("Test {} updated successfully.", session_id))
}

async fn delete_test(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let session_id = session_id(&args)?;
    info!(session_id = %session_id, "Deleting test");

    api.delete_test(&session_id).await?;
    Ok(format!("Test {} deleted successfully.", session_id))
}

async fn stop_test(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let session_id = session_id(&args)?;
    info!(session_id = %session_id, "Stopping test");

    api.stop_test(&session_id).await?;
    Ok(format!("Test {} stopped successfully.", session_id))
}

fn status_label(status_id: &Value) -> &'static str {
    match status_id.as_i64() {
        Some(1) => "Passed",
        Some(0) => "Failed",
        _ => "Unknown",
    }
}

fn test_url(test: &Value) -> String {
    format!(
        "{}/{}",
        TEST_URL,
        display(test.get("session_id").unwrap_or(&Value::Null))
    )
}

/// Status and state lines shared by list and detail views
fn push_outcome(out: &mut String, test: &Value) {
    if let Some(status_id) = present(test, "status_id") {
        out.push_str(&format!("- **Status**: {}\n", status_label(status_id)));
    } else if let Some(success) = present(test, "success") {
        out.push_str(&format!("- **Success**: {}\n", yes_no(success)));
    }
    if let Some(state) = truthy(test, "state") {
        push_field(out, "State", state);
    }
}

fn push_environment(out: &mut String, test: &Value) {
    let browser = [
        truthy(test, "browser").map(display),
        first_truthy(test, &["browser_version", "version"]).map(display),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ");
    if !browser.is_empty() {
        out.push_str(&format!("- **Browser**: {}\n", browser));
    }
    if let Some(platform) = first_truthy(test, &["os", "platform", "platform_name"]) {
        push_field(out, "Platform", platform);
    }
}

fn push_timing(out: &mut String, test: &Value) {
    if let Some(duration) = truthy(test, "duration") {
        out.push_str(&format!("- **Duration**: {}s\n", display(duration)));
    }
    if let Some(created) = truthy(test, "created_at") {
        push_field(out, "Created", created);
    }
    if let Some(completed) = truthy(test, "completed_at") {
        push_field(out, "Completed", completed);
    }
}

fn render_test_list(tests: &[Value], page: &Page) -> String {
    let mut out = format!(
        "## Recent Tests (showing {} from offset {})\n\n",
        page.limit, page.offset
    );
    if tests.is_empty() {
        out.push_str("No tests found.\n");
        return out;
    }

    for test in tests {
        out.push_str(&format!(
            "### Test {}\n",
            display(test.get("session_id").unwrap_or(&Value::Null))
        ));
        if let Some(name) = truthy(test, "name") {
            push_field(&mut out, "Name", name);
        }
        push_outcome(&mut out, test);
        push_environment(&mut out, test);
        push_timing(&mut out, test);
        for (key, label) in [("video", "Video"), ("build", "Build"), ("extra", "Extra")] {
            if let Some(value) = truthy(test, key) {
                push_field(&mut out, label, value);
            }
        }
        out.push_str(&format!("- **URL**: {}\n\n", test_url(test)));
    }
    out
}

/// Epoch milliseconds (or an already formatted string) as an ISO-8601 timestamp
fn step_time(time: &Value) -> String {
    time.as_i64()
        .and_then(DateTime::from_timestamp_millis)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| display(time))
}

fn push_steps(out: &mut String, steps: &[Value]) {
    out.push_str(&format!("\n### Test Steps ({} steps)\n", steps.len()));
    for (i, step) in steps.iter().enumerate() {
        out.push_str(&format!(
            "\n**Step {}**: {}\n",
            i + 1,
            display(step.get("command").unwrap_or(&Value::Null))
        ));
        if let Some(arguments) = truthy(step, "arguments") {
            out.push_str(&format!("- Arguments: {}\n", display(arguments)));
        }
        if let Some(response) = truthy(step, "response") {
            let response = display(response);
            let preview: String = response.chars().take(STEP_RESPONSE_PREVIEW).collect();
            let ellipsis = if response.chars().count() > STEP_RESPONSE_PREVIEW {
                "..."
            } else {
                ""
            };
            out.push_str(&format!("- Response: {}{}\n", preview, ellipsis));
        }
        if let Some(time) = truthy(step, "time") {
            out.push_str(&format!("- Time: {}\n", step_time(time)));
        }
    }
}

fn render_test_details(session_id: &str, test: &Value) -> String {
    let mut out = format!("## Test Details: {}\n\n", session_id);

    if let Some(name) = truthy(test, "name") {
        push_field(&mut out, "Name", name);
    }
    push_outcome(&mut out, test);
    if let Some(message) = truthy(test, "status_message") {
        push_field(&mut out, "Status Message", message);
    }
    push_environment(&mut out, test);
    if let Some(device) = truthy(test, "device_name") {
        push_field(&mut out, "Device", device);
    }
    if let Some(kind) = truthy(test, "type") {
        push_field(&mut out, "Type", kind);
    }
    push_timing(&mut out, test);
    if let Some(video) = truthy(test, "video") {
        push_field(&mut out, "Video", video);
    }
    if let Some(thumbs) = test.get("thumbs").and_then(Value::as_array) {
        if !thumbs.is_empty() {
            out.push_str(&format!("- **Screenshots**: {} available\n", thumbs.len()));
        }
    }

    if let Some(logs) = test.get("logs").filter(|l| l.is_object()) {
        out.push_str("\n### Logs\n");
        for (key, label) in [
            ("selenium", "Selenium Log"),
            ("browser", "Browser Log"),
            ("chrome", "Chrome Log"),
            ("vm", "VM Log"),
        ] {
            if let Some(url) = truthy(logs, key) {
                push_field(&mut out, label, url);
            }
        }
    }

    if let Some(build) = truthy(test, "build") {
        out.push('\n');
        push_field(&mut out, "Build", build);
    }
    if let Some(extra) = truthy(test, "extra") {
        push_field(&mut out, "Extra", extra);
    }

    if let Some(steps) = test.get("steps").and_then(Value::as_array) {
        if !steps.is_empty() {
            push_steps(&mut out, steps);
        }
    }

    out.push_str(&format!("\n- **Test URL**: {}\n", test_url(test)));
    if truthy(test, "assets_available").is_some() {
        out.push_str("- **Assets**: Available\n");
    }
    out
}
