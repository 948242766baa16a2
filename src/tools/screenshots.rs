//! Cross-browser screenshot tools

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{display, items, paging, truthy, with_api, Page};
use crate::client::{ScreenshotBrowser, ScreenshotRequest, SharedApi};
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

const DEFAULT_RESOLUTION: &str = "1920x1080";

fn browser_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .param(ParamSpec::required(
            "browserName",
            ParamKind::non_empty_string(),
            "Browser name (chrome, firefox, safari, etc.)",
        ))
        .param(ParamSpec::optional(
            "version",
            ParamKind::string(),
            "Browser version (or 'latest')",
        ))
        .param(ParamSpec::required(
            "os",
            ParamKind::non_empty_string(),
            "Operating system (WIN11, MAC, etc.)",
        ))
}

fn screenshot_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .param(ParamSpec::required("url", ParamKind::Url, "The URL to screenshot"))
        .param(ParamSpec::required(
            "browsers",
            ParamKind::array_of(ParamKind::object_of(browser_schema())),
            "Array of browser configurations",
        ))
        .param(
            ParamSpec::optional(
                "resolution",
                ParamKind::non_empty_string(),
                "Screen resolution (e.g., '1920x1080')",
            )
            .with_default(DEFAULT_RESOLUTION),
        )
        .param(
            ParamSpec::optional(
                "waitTime",
                ParamKind::number(Some(0.0), Some(60.0)),
                "Time to wait before taking screenshot (in seconds, max 60)",
            )
            .with_default(5),
        )
        .param(
            ParamSpec::optional(
                "fullPage",
                ParamKind::Boolean,
                "Capture full page or just viewport",
            )
            .with_default(false),
        )
}

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "takeScreenshot",
            "Take screenshots of a URL across multiple browsers and platforms. Returns a screenshot ID to retrieve results.",
            screenshot_schema(),
            with_api(api, take_screenshot),
        ),
        ToolDefinition::new(
            "retrieveScreenshots",
            "Retrieve screenshot results by screenshot ID. Returns URLs to the generated screenshots.",
            ArgumentSchema::new().param(ParamSpec::required(
                "screenshotId",
                ParamKind::Identifier,
                "The screenshot ID from takeScreenshot",
            )),
            with_api(api, retrieve_screenshots),
        ),
        ToolDefinition::new(
            "getScreenshotList",
            "Get a list of all screenshot jobs with pagination.",
            paging("Number of screenshot jobs to retrieve (default: 10, max: 100)"),
            with_api(api, get_screenshot_list),
        ),
    ]
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScreenshotArgs {
    url: String,
    browsers: Vec<ScreenshotBrowser>,
    resolution: String,
    wait_time: f64,
    full_page: bool,
}

impl From<ScreenshotArgs> for ScreenshotRequest {
    /// The API takes whole seconds; partial seconds round up
    fn from(args: ScreenshotArgs) -> Self {
        Self {
            url: args.url,
            browsers: args.browsers,
            resolution: args.resolution,
            wait_time: args.wait_time.ceil() as u64,
            full_page: args.full_page,
        }
    }
}

async fn take_screenshot(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let request = ScreenshotRequest::from(args.parse::<ScreenshotArgs>()?);
    if request.browsers.is_empty() {
        return Err(HandlerError::Invalid(
            "At least one browser configuration is required".to_string(),
        ));
    }
    info!(url = %request.url, browsers = request.browsers.len(), "Taking screenshots");

    let result = api.take_screenshot(&request).await?;
    Ok(format!(
        "Screenshot job created successfully!\n\n**Screenshot ID**: {}\n\nUse the `retrieveScreenshots` tool with this ID to get the results once processing is complete.",
        display(result.get("id").unwrap_or(&Value::Null))
    ))
}

async fn retrieve_screenshots(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let screenshot_id = args.str("screenshotId").unwrap_or_default();
    info!(screenshot_id, "Retrieving screenshots");

    let result = api.retrieve_screenshots(screenshot_id).await?;
    Ok(render_screenshots(&result))
}

async fn get_screenshot_list(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let page: Page = args.parse()?;
    info!(offset = page.offset, limit = page.limit, "Fetching screenshot list");

    let response = api.get_screenshot_list(page.offset, page.limit).await?;
    Ok(render_jobs(items(&response), &page))
}

fn state(job: &Value) -> String {
    truthy(job, "state")
        .map(display)
        .unwrap_or_else(|| "processing".to_string())
}

fn render_screenshots(result: &Value) -> String {
    let mut out = format!(
        "## Screenshots for {}\n\n**Status**: {}\n\n",
        display(result.get("url").unwrap_or(&Value::Null)),
        state(result)
    );

    let Some(shots) = result.get("screenshots").and_then(Value::as_array) else {
        out.push_str("Screenshots are still processing. Please try again in a moment.\n");
        return out;
    };
    for shot in shots {
        let field = |key: &str| display(shot.get(key).unwrap_or(&Value::Null));
        out.push_str(&format!(
            "### {} {} on {}\n",
            field("browser"),
            field("version"),
            field("os")
        ));
        out.push_str(&format!("- **Screenshot**: {}\n", field("image_url")));
        out.push_str(&format!("- **Thumbnail**: {}\n\n", field("thumb_url")));
    }
    out
}

fn render_jobs(jobs: &[Value], page: &Page) -> String {
    let mut out = format!(
        "## Screenshot Jobs (showing {} from offset {})\n\n",
        page.limit, page.offset
    );
    if jobs.is_empty() {
        out.push_str("No screenshot jobs found.\n");
        return out;
    }

    for job in jobs {
        let field = |key: &str| display(job.get(key).unwrap_or(&Value::Null));
        out.push_str(&format!("### {}\n", field("url")));
        out.push_str(&format!("- **ID**: {}\n", field("id")));
        out.push_str(&format!("- **Status**: {}\n", state(job)));
        out.push_str(&format!("- **Created**: {}\n\n", field("created_at")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let validated = crate::schema::InputSchema::from(screenshot_schema())
            .validate(&json!({
                "url": "https://example.com",
                "browsers": [{"browserName": "chrome", "os": "WIN11"}]
            }))
            .unwrap();
        let request = ScreenshotRequest::from(validated.parse::<ScreenshotArgs>().unwrap());
        assert_eq!(request.resolution, "1920x1080");
        assert_eq!(request.wait_time, 5);
        assert!(!request.full_page);
        assert_eq!(request.browsers[0].version, None);
    }

    #[test]
    fn test_nested_browser_errors_have_paths() {
        let errors = crate::schema::InputSchema::from(screenshot_schema())
            .validate(&json!({
                "url": "https://example.com",
                "browsers": [{"browserName": "chrome", "os": "WIN11"}, {"browserName": "firefox"}],
                "waitTime": 61
            }))
            .unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"browsers[1].os"));
        assert!(fields.contains(&"waitTime"));
    }

    #[test]
    fn test_partial_seconds_round_up() {
        let request = ScreenshotRequest::from(ScreenshotArgs {
            url: "https://example.com".into(),
            browsers: vec![],
            resolution: "800x600".into(),
            wait_time: 2.5,
            full_page: true,
        });
        assert_eq!(request.wait_time, 3);
    }

    #[test]
    fn test_render_screenshots() {
        let text = render_screenshots(&json!({
            "url": "https://example.com",
            "state": "done",
            "screenshots": [{
                "browser": "chrome", "version": "120", "os": "WIN11",
                "image_url": "https://img/1.png", "thumb_url": "https://img/1_t.png"
            }]
        }));
        assert!(text.contains("**Status**: done\n"));
        assert!(text.contains("### chrome 120 on WIN11\n- **Screenshot**: https://img/1.png\n"));
    }

    #[test]
    fn test_render_pending_screenshots() {
        let text = render_screenshots(&json!({"url": "https://example.com"}));
        assert!(text.contains("**Status**: processing\n"));
        assert!(text.ends_with("Please try again in a moment.\n"));
    }

    #[test]
    fn test_render_jobs() {
        let jobs = vec![json!({"id": 5, "url": "https://example.com", "created_at": "today"})];
        let text = render_jobs(&jobs, &Page { offset: 0, limit: 10 });
        assert!(text.contains("### https://example.com\n- **ID**: 5\n- **Status**: processing\n"));
        assert!(render_jobs(&[], &Page { offset: 0, limit: 10 })
            .ends_with("No screenshot jobs found.\n"));
    }
}
