//! Account tools

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{display, present, push_field, with_api};
use crate::client::{SharedApi, UserUpdate};
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getUserInfo",
            "Get current user account information including minutes used, plan details, and account status.",
            ArgumentSchema::new(),
            with_api(api, get_user_info),
        ),
        ToolDefinition::new(
            "updateUserInfo",
            "Update user account information such as name, email, or other profile details.",
            ArgumentSchema::new()
                .param(ParamSpec::optional("firstName", ParamKind::string(), "First name"))
                .param(ParamSpec::optional("lastName", ParamKind::string(), "Last name"))
                .param(ParamSpec::optional("email", ParamKind::Email, "Email address")),
            with_api(api, update_user_info),
        ),
    ]
}

async fn get_user_info(api: SharedApi, _args: ValidatedArgs) -> Result<String, HandlerError> {
    info!("Fetching user info");

    let user = api.get_user_info().await?;
    Ok(render_user(&user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileArgs {
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
}

impl From<ProfileArgs> for UserUpdate {
    fn from(args: ProfileArgs) -> Self {
        let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());
        Self {
            first_name: non_empty(args.first_name),
            last_name: non_empty(args.last_name),
            email: non_empty(args.email),
        }
    }
}

async fn update_user_info(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let update = UserUpdate::from(args.parse::<ProfileArgs>()?);
    info!(update = ?update, "Updating user info");

    api.update_user_info(&update).await?;
    Ok("User information updated successfully.".to_string())
}

fn render_user(user: &Value) -> String {
    let field = |key: &str| display(user.get(key).unwrap_or(&Value::Null));
    let mut out = String::from("## User Information\n\n");
    out.push_str(&format!(
        "- **Name**: {} {}\n",
        field("first_name"),
        field("last_name")
    ));
    out.push_str(&format!("- **Email**: {}\n", field("email")));

    for (key, label) in [
        ("minutes_used", "Minutes Used"),
        ("minutes_limit", "Minutes Limit"),
        ("plan", "Plan"),
    ] {
        if let Some(value) = present(user, key) {
            push_field(&mut out, label, value);
        }
    }
    out
}
