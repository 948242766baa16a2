//! Remote browser sessions driven over the Chrome DevTools Protocol

use serde_json::{Map, Value};
use tracing::info;

use super::{display, with_api};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

/// Optional string arguments copied verbatim into the capabilities
const PASSTHROUGH: &[&str] = &["screenResolution", "timeZone", "name", "build"];

fn session_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .param(ParamSpec::required(
            "browserName",
            ParamKind::non_empty_string(),
            "Browser name (chrome, firefox, edge, safari)",
        ))
        .param(
            ParamSpec::optional(
                "browserVersion",
                ParamKind::string(),
                "Browser version (default: 'latest')",
            )
            .with_default("latest"),
        )
        .param(ParamSpec::required(
            "platform",
            ParamKind::non_empty_string(),
            "Platform/OS (WIN11, WIN10, MONTEREY, BIGSUR, etc.)",
        ))
        .param(ParamSpec::optional(
            "screenResolution",
            ParamKind::string(),
            "Screen resolution (e.g., '1920x1080')",
        ))
        .param(ParamSpec::optional(
            "timeZone",
            ParamKind::string(),
            "Time zone (e.g., 'America/New_York')",
        ))
        .param(ParamSpec::optional(
            "name",
            ParamKind::string(),
            "Session name for identification",
        ))
        .param(ParamSpec::optional("build", ParamKind::string(), "Build identifier"))
        .param(ParamSpec::optional(
            "extraCapabilities",
            ParamKind::Object(None),
            "Additional capabilities as key-value pairs",
        ))
}

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![ToolDefinition::new(
        "createCdpSession",
        "Create a remote browser session on TestingBot and get its CDP (Chrome DevTools Protocol) URL for direct browser control. Use this to automate browsers via CDP clients like Puppeteer or Playwright.",
        session_schema(),
        with_api(api, create_cdp_session),
    )]
}

fn browser_version(args: &ValidatedArgs) -> &str {
    args.str("browserVersion")
        .filter(|v| !v.is_empty())
        .unwrap_or("latest")
}

/// Capabilities for the new session; `extraCapabilities` wins on conflicts
fn capabilities(args: &ValidatedArgs) -> Map<String, Value> {
    let mut caps = Map::new();
    caps.insert(
        "browserName".into(),
        Value::from(args.str("browserName").unwrap_or_default()),
    );
    caps.insert("browserVersion".into(), Value::from(browser_version(args)));
    caps.insert(
        "platform".into(),
        Value::from(args.str("platform").unwrap_or_default()),
    );

    for key in PASSTHROUGH {
        if let Some(value) = args.str(key).filter(|v| !v.is_empty()) {
            caps.insert((*key).to_string(), Value::from(value));
        }
    }

    if let Some(extra) = args.get("extraCapabilities").and_then(Value::as_object) {
        for (key, value) in extra {
            caps.insert(key.clone(), value.clone());
        }
    }
    caps
}

async fn create_cdp_session(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let caps = capabilities(&args);
    info!(
        browser = args.str("browserName").unwrap_or_default(),
        platform = args.str("platform").unwrap_or_default(),
        "Creating CDP session"
    );

    let session = api.create_session(&caps).await?;
    Ok(render_session(&args, &session))
}

fn render_session(args: &ValidatedArgs, session: &Value) -> String {
    let cdp_url = display(session.get("cdp_url").unwrap_or(&Value::Null));
    let mut out = String::from("## CDP Session Created\n\n");
    out.push_str(&format!(
        "- **Session ID**: {}\n",
        display(session.get("session_id").unwrap_or(&Value::Null))
    ));
    out.push_str(&format!("- **CDP URL**: {}\n", cdp_url));
    out.push_str(&format!(
        "- **Browser**: {} {}\n",
        args.str("browserName").unwrap_or_default(),
        browser_version(args)
    ));
    out.push_str(&format!(
        "- **Platform**: {}\n\n",
        args.str("platform").unwrap_or_default()
    ));

    out.push_str("### Connect with Puppeteer\n```javascript\n");
    out.push_str("const puppeteer = require('puppeteer-core');\n");
    out.push_str("const browser = await puppeteer.connect({\n");
    out.push_str(&format!("  browserWSEndpoint: '{}'\n", cdp_url));
    out.push_str("});\n```\n\n");

    out.push_str("### Connect with Playwright\n```javascript\n");
    out.push_str("const { chromium } = require('playwright');\n");
    out.push_str(&format!(
        "const browser = await chromium.connectOverCDP('{}');\n",
        cdp_url
    ));
    out.push_str("```\n");
    out
}
