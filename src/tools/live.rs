//! Live testing sessions
//!
//! `startLiveSession` takes either a desktop or a mobile shape, chosen by
//! `platformType`. The session itself is opened in the user's browser; the
//! tool only derives the environment id and the launch URL, so nothing here
//! talks to the API.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use tracing::info;

use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, TaggedSchema};
use crate::util::is_valid_url;

pub const DESKTOP_OS: &[&str] = &["Windows", "Mac", "Linux"];
pub const DESKTOP_BROWSERS: &[&str] = &["chrome", "firefox", "safari", "edge", "ie"];
pub const MOBILE_PLATFORMS: &[&str] = &["android", "ios"];

const LIVE_START_URL: &str = "https://testingbot.com/members/manual/start";

/// Characters `encodeURIComponent` leaves alone
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn latest() -> String {
    "latest".to_string()
}

/// An empty browser version means "latest"
fn version_or_latest<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let version = String::deserialize(deserializer)?;
    Ok(if version.is_empty() { latest() } else { version })
}

/// Desktop browser session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DesktopSession {
    #[serde(rename = "desiredURL")]
    pub url: String,
    #[serde(rename = "desiredOS")]
    pub os: String,
    #[serde(rename = "desiredOSVersion")]
    pub os_version: String,
    #[serde(rename = "desiredBrowser")]
    pub browser: String,
    #[serde(
        rename = "desiredBrowserVersion",
        default = "latest",
        deserialize_with = "version_or_latest"
    )]
    pub browser_version: String,
}

/// Mobile device session
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MobileSession {
    #[serde(rename = "desiredURL")]
    pub url: String,
    #[serde(rename = "desiredOS")]
    pub platform: String,
    #[serde(rename = "desiredOSVersion")]
    pub platform_version: String,
    #[serde(rename = "desiredDevice")]
    pub device: String,
}

/// A validated live session request
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "platformType", rename_all = "lowercase")]
pub enum LiveSession {
    Desktop(DesktopSession),
    Mobile(MobileSession),
}

impl LiveSession {
    pub fn url(&self) -> &str {
        match self {
            Self::Desktop(d) => &d.url,
            Self::Mobile(m) => &m.url,
        }
    }

    pub fn platform_type(&self) -> &'static str {
        match self {
            Self::Desktop(_) => "desktop",
            Self::Mobile(_) => "mobile",
        }
    }

    /// `browser_version_os_osVersion` or `platform_version_device`
    pub fn environment_id(&self) -> String {
        match self {
            Self::Desktop(d) => format!(
                "{}_{}_{}_{}",
                d.browser.to_lowercase(),
                d.browser_version,
                d.os.to_lowercase(),
                WHITESPACE.replace_all(&d.os_version, "_")
            ),
            Self::Mobile(m) => format!(
                "{}_{}_{}",
                m.platform.to_lowercase(),
                m.platform_version,
                WHITESPACE.replace_all(&m.device, "_")
            ),
        }
    }

    /// Locator that opens the session in TestingBot
    pub fn launch_url(&self) -> Result<String, HandlerError> {
        if !is_valid_url(self.url()) {
            return Err(HandlerError::Invalid("Invalid URL provided".to_string()));
        }
        Ok(format!(
            "{}?browser={}&url={}",
            LIVE_START_URL,
            self.environment_id(),
            utf8_percent_encode(self.url(), URI_COMPONENT)
        ))
    }
}

fn url_param(description: &'static str) -> ParamSpec {
    ParamSpec::required("desiredURL", ParamKind::Url, description)
}

fn desktop_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .param(url_param("The URL to open in the browser"))
        .param(ParamSpec::required(
            "desiredOS",
            ParamKind::Enum(DESKTOP_OS),
            "Operating system (Windows, Mac, or Linux)",
        ))
        .param(ParamSpec::required(
            "desiredOSVersion",
            ParamKind::string(),
            "OS version (e.g., '11', '13', 'Monterey')",
        ))
        .param(ParamSpec::required(
            "desiredBrowser",
            ParamKind::Enum(DESKTOP_BROWSERS),
            "Browser name",
        ))
        .param(
            ParamSpec::optional(
                "desiredBrowserVersion",
                ParamKind::string(),
                "Browser version or 'latest' (default: latest)",
            )
            .with_default("latest"),
        )
}

fn mobile_schema() -> ArgumentSchema {
    ArgumentSchema::new()
        .param(url_param("The URL to open in the mobile browser"))
        .param(ParamSpec::required(
            "desiredOS",
            ParamKind::Enum(MOBILE_PLATFORMS),
            "Mobile platform (android or ios)",
        ))
        .param(ParamSpec::required(
            "desiredOSVersion",
            ParamKind::string(),
            "OS version (e.g., '13.0', '16.0')",
        ))
        .param(ParamSpec::required(
            "desiredDevice",
            ParamKind::non_empty_string(),
            "Device name (e.g., 'iPhone 14', 'Galaxy S23')",
        ))
}

fn live_schema() -> TaggedSchema {
    TaggedSchema::new(
        "platformType",
        "platform type",
        "Platform type: 'desktop' for desktop browsers or 'mobile' for mobile devices",
    )
    .variant("desktop", desktop_schema())
    .variant("mobile", mobile_schema())
}

fn start(session: &LiveSession) -> Result<String, HandlerError> {
    let launch_url = session.launch_url()?;
    info!(
        platform_type = session.platform_type(),
        environment_id = %session.environment_id(),
        url = session.url(),
        "Starting live session"
    );
    Ok(launch_url)
}

fn configuration(session: &LiveSession, with_platform: bool) -> String {
    let mut out = String::from("**Configuration:**\n");
    match session {
        LiveSession::Desktop(d) => {
            if with_platform {
                out.push_str("- Platform: Desktop\n");
            }
            out.push_str(&format!("- Browser: {} {}\n", d.browser, d.browser_version));
            out.push_str(&format!("- OS: {} {}\n", d.os, d.os_version));
            out.push_str(&format!("- URL: {}\n\n", d.url));
        }
        LiveSession::Mobile(m) => {
            if with_platform {
                out.push_str("- Platform: Mobile\n");
            }
            out.push_str(&format!("- Device: {}\n", m.device));
            out.push_str(&format!("- OS: {} {}\n", m.platform, m.platform_version));
            out.push_str(&format!("- URL: {}\n\n", m.url));
        }
    }
    out
}

fn render_generic(session: &LiveSession, launch_url: &str) -> String {
    let mut out = String::from("## Live Session Ready\n\n");
    out.push_str("Your interactive testing session is ready to start!\n\n");
    out.push_str(&format!("**Session URL**: {}\n\n", launch_url));
    out.push_str(&configuration(session, true));
    out.push_str("**Instructions:**\n");
    out.push_str("1. Click the URL above or copy it to your browser\n");
    out.push_str("2. Log in to TestingBot if prompted\n");
    out.push_str("3. The live session will start automatically\n");
    out.push_str("4. Interact with the browser/device in real-time\n");
    out
}

fn render_shortcut(session: &LiveSession, launch_url: &str) -> String {
    let (title, closing) = match session {
        LiveSession::Desktop(_) => (
            "Desktop Live Session Ready",
            "Click the URL above to start your interactive testing session.",
        ),
        LiveSession::Mobile(_) => (
            "Mobile Live Session Ready",
            "Click the URL above to start your interactive mobile testing session.",
        ),
    };
    let mut out = format!("## {}\n\n**Session URL**: {}\n\n", title, launch_url);
    out.push_str(&configuration(session, false));
    out.push_str(closing);
    out
}

pub fn tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "startLiveSession",
            "Start an interactive live testing session on TestingBot. Opens a real browser or mobile device for manual testing. Supports both desktop browsers (Chrome, Firefox, Safari, Edge, IE) and mobile devices (iOS, Android).",
            live_schema(),
            |args| async move {
                let session: LiveSession = args.parse()?;
                let launch_url = start(&session)?;
                Ok(render_generic(&session, &launch_url))
            },
        ),
        ToolDefinition::new(
            "startDesktopLiveSession",
            "Convenience tool to start a desktop browser live testing session. Automatically sets platformType to 'desktop'.",
            desktop_schema(),
            |args| async move {
                let session = LiveSession::Desktop(args.parse()?);
                let launch_url = start(&session)?;
                Ok(render_shortcut(&session, &launch_url))
            },
        ),
        ToolDefinition::new(
            "startMobileLiveSession",
            "Convenience tool to start a mobile device live testing session. Automatically sets platformType to 'mobile'.",
            mobile_schema(),
            |args| async move {
                let session = LiveSession::Mobile(args.parse()?);
                let launch_url = start(&session)?;
                Ok(render_shortcut(&session, &launch_url))
            },
        ),
    ]
}
