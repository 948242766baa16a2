//! Browser and device catalog tools

use serde_json::Value;
use tracing::info;

use super::{display, first_truthy, items, push_field, truthy, with_api, yes_no};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

const BROWSER_TYPES: &[&str] = &["web", "mobile"];

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getBrowsers",
            "Get list of available browsers and platforms for testing. Optionally filter by type (web or mobile).",
            ArgumentSchema::new().param(ParamSpec::optional(
                "type",
                ParamKind::Enum(BROWSER_TYPES),
                "Filter browsers by type",
            )),
            with_api(api, get_browsers),
        ),
        ToolDefinition::new(
            "getDevices",
            "Get list of available mobile devices for testing (real devices and simulators).",
            ArgumentSchema::new(),
            with_api(api, get_devices),
        ),
    ]
}

async fn get_browsers(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let kind = args.str("type");
    info!(kind = ?kind, "Fetching browsers");

    let browsers = api.get_browsers(kind).await?;
    Ok(render_browsers(&browsers))
}

async fn get_devices(api: SharedApi, _args: ValidatedArgs) -> Result<String, HandlerError> {
    info!("Fetching devices");

    let devices = api.get_devices().await?;
    Ok(render_devices(&devices))
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn render_browsers(browsers: &Value) -> String {
    if !browsers.is_array() {
        return pretty(browsers);
    }

    let mut out = String::from("## Available Browsers\n\n");
    for browser in items(browsers) {
        let name = first_truthy(browser, &["name", "browserName"]).unwrap_or(&Value::Null);
        out.push_str(&format!("### {}\n", display(name)));
        let platform = first_truthy(browser, &["platform", "os"]).unwrap_or(&Value::Null);
        push_field(&mut out, "Platform", platform);
        let version = first_truthy(browser, &["version", "browserVersion"]).unwrap_or(&Value::Null);
        push_field(&mut out, "Version", version);
        if let Some(device) = truthy(browser, "device") {
            push_field(&mut out, "Device", device);
        }
        out.push('\n');
    }
    out
}

fn render_devices(devices: &Value) -> String {
    if !devices.is_array() {
        return pretty(devices);
    }

    let mut out = String::from("## Available Devices\n\n");
    for device in items(devices) {
        let field = |key: &str| device.get(key).unwrap_or(&Value::Null);
        out.push_str(&format!("### {}\n", display(field("name"))));
        push_field(&mut out, "ID", field("id"));
        push_field(&mut out, "Platform", field("platform"));
        push_field(&mut out, "Version", field("version"));
        out.push_str(&format!("- **Available**: {}\n\n", yes_no(field("available"))));
    }
    out
}
