//! Build tools

use serde_json::Value;
use tracing::info;

use super::{display, first_truthy, items, paging, present, with_api, Page};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

fn build_id_schema(description: &'static str) -> ArgumentSchema {
    ArgumentSchema::new().param(ParamSpec::required(
        "buildId",
        ParamKind::integer(None, None),
        description,
    ))
}

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getBuilds",
            "Get a list of builds with optional pagination. Builds group related tests together.",
            paging("Number of builds to retrieve (default: 10, max: 100)"),
            with_api(api, get_builds),
        ),
        ToolDefinition::new(
            "getTestsForBuild",
            "Get all tests associated with a specific build ID.",
            build_id_schema("The build ID"),
            with_api(api, get_tests_for_build),
        ),
        ToolDefinition::new(
            "deleteBuild",
            "Delete a build and all its associated tests by build ID.",
            build_id_schema("The build ID to delete"),
            with_api(api, delete_build),
        ),
    ]
}

fn build_id(args: &ValidatedArgs) -> Result<i64, HandlerError> {
    args.get("buildId")
        .and_then(Value::as_i64)
        .ok_or_else(|| HandlerError::Invalid("buildId must be an integer".to_string()))
}

async fn get_builds(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let page: Page = args.parse()?;
    info!(offset = page.offset, limit = page.limit, "Fetching builds");

    let response = api.get_builds(page.offset, page.limit).await?;
    Ok(render_builds(items(&response), &page))
}

async fn get_tests_for_build(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let build_id = build_id(&args)?;
    info!(build_id, "Fetching tests for build");

    let response = api.get_tests_for_build(build_id).await?;
    Ok(render_build_tests(build_id, items(&response)))
}

async fn delete_build(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let build_id = build_id(&args)?;
    info!(build_id, "Deleting build");

    api.delete_build(build_id).await?;
    Ok(format!("Build {} deleted successfully.", build_id))
}

fn render_builds(builds: &[Value], page: &Page) -> String {
    let mut out = format!(
        "## Recent Builds (showing {} from offset {})\n\n",
        page.limit, page.offset
    );
    if builds.is_empty() {
        out.push_str("No builds found.\n");
        return out;
    }

    for build in builds {
        let field = |key: &str| display(build.get(key).unwrap_or(&Value::Null));
        let title = first_truthy(build, &["name", "id"]).map(display).unwrap_or_default();
        out.push_str(&format!("### Build: {}\n", title));
        out.push_str(&format!("- **ID**: {}\n", field("id")));
        let tests = present(build, "tests").map(display).unwrap_or_else(|| "0".to_string());
        out.push_str(&format!("- **Tests**: {}\n", tests));
        out.push_str(&format!("- **Created**: {}\n\n", field("created_at")));
    }
    out
}

fn render_build_tests(build_id: i64, tests: &[Value]) -> String {
    let mut out = format!("## Tests for Build {}\n\n", build_id);
    if tests.is_empty() {
        out.push_str("No tests found for this build.\n");
        return out;
    }

    for test in tests {
        let field = |key: &str| display(test.get(key).unwrap_or(&Value::Null));
        out.push_str(&format!("### Test {}\n", field("session_id")));
        out.push_str(&format!("- **Status**: {}\n", field("status")));
        out.push_str(&format!(
            "- **Browser**: {} {}\n",
            field("browser"),
            field("version")
        ));
        out.push_str(&format!("- **Platform**: {}\n", field("platform")));
        out.push_str(&format!("- **Duration**: {}s\n\n", field("duration")));
    }
    out
}
