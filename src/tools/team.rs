//! Team management tools

use serde_json::Value;
use tracing::info;

use super::{display, items, present, push_field, truthy, with_api, yes_no};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getTeam",
            "Retrieve team settings and information including plan details, team size, and configuration.",
            ArgumentSchema::new(),
            with_api(api, get_team),
        ),
        ToolDefinition::new(
            "getUsersInTeam",
            "Get a list of all users in your team with their roles and permissions.",
            ArgumentSchema::new(),
            with_api(api, get_users_in_team),
        ),
        ToolDefinition::new(
            "getUserFromTeam",
            "Retrieve detailed information about a specific user in your team by their user ID.",
            ArgumentSchema::new().param(ParamSpec::required(
                "userId",
                ParamKind::integer(None, None),
                "The user ID",
            )),
            with_api(api, get_user_from_team),
        ),
    ]
}

async fn get_team(api: SharedApi, _args: ValidatedArgs) -> Result<String, HandlerError> {
    info!("Fetching team settings");

    let response = api.get_team().await?;
    let team = truthy(&response, "data").unwrap_or(&response);
    Ok(render_team(team))
}

async fn get_users_in_team(api: SharedApi, _args: ValidatedArgs) -> Result<String, HandlerError> {
    info!("Fetching team users");

    let response = api.get_users_in_team().await?;
    Ok(render_users(items(&response)))
}

async fn get_user_from_team(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let user_id = args
        .get("userId")
        .and_then(Value::as_i64)
        .ok_or_else(|| HandlerError::Invalid("userId must be an integer".to_string()))?;
    info!(user_id, "Fetching team user details");

    let user = api.get_user_from_team(user_id).await?;
    Ok(render_user(&user))
}

fn push_concurrency(out: &mut String, label: &str, counts: &Value) {
    out.push_str(&format!("**{}**:\n", label));
    for (key, name) in [("vms", "VMs"), ("physical", "Physical")] {
        if let Some(value) = present(counts, key) {
            out.push_str(&format!("- {}: {}\n", name, display(value)));
        }
    }
}

fn render_team(team: &Value) -> String {
    let mut out = String::from("## Team Settings\n\n");

    if let Some(name) = truthy(team, "name") {
        push_field(&mut out, "Team Name", name);
    }
    if let Some(plan) = truthy(team, "plan") {
        push_field(&mut out, "Plan", plan);
    }
    for (key, label) in [
        ("users", "Users"),
        ("parallel_tests", "Parallel Tests"),
        ("max_parallel", "Max Parallel"),
    ] {
        if let Some(value) = present(team, key) {
            push_field(&mut out, label, value);
        }
    }

    if let Some(concurrency) = truthy(team, "concurrency") {
        out.push_str("\n### Concurrency\n");
        if let Some(allowed) = truthy(concurrency, "allowed") {
            push_concurrency(&mut out, "Allowed", allowed);
        }
        if let Some(current) = truthy(concurrency, "current") {
            push_concurrency(&mut out, "Current", current);
        }
    }

    if let Some(created) = truthy(team, "created_at") {
        out.push('\n');
        push_field(&mut out, "Created", created);
    }
    out
}

fn full_name(user: &Value) -> String {
    let part = |key: &str| truthy(user, key).map(display).unwrap_or_default();
    format!("{} {}", part("first_name"), part("last_name"))
        .trim()
        .to_string()
}

fn render_users(users: &[Value]) -> String {
    let mut out = String::from("## Team Users\n\n");
    if users.is_empty() {
        out.push_str("No users found in team.\n");
        return out;
    }

    for user in users {
        let id = display(user.get("id").unwrap_or(&Value::Null));
        let name = full_name(user);
        if name.is_empty() {
            out.push_str(&format!("### User {}\n", id));
        } else {
            out.push_str(&format!("### {}\n", name));
        }
        out.push_str(&format!("- **User ID**: {}\n", id));

        if let Some(email) = truthy(user, "email") {
            push_field(&mut out, "Email", email);
        }
        if let Some(plan) = truthy(user, "plan") {
            push_field(&mut out, "Plan", plan);
        }
        if let Some(roles) = user.get("roles").and_then(Value::as_array) {
            if !roles.is_empty() {
                let roles: Vec<String> = roles.iter().map(display).collect();
                out.push_str(&format!("- **Roles**: {}\n", roles.join(", ")));
            }
        }
        if let Some(read_only) = present(user, "read_only") {
            out.push_str(&format!("- **Read Only**: {}\n", yes_no(read_only)));
        }
        for (key, label) in [
            ("max_concurrent", "Max Concurrent"),
            ("max_concurrent_mobile", "Max Concurrent Mobile"),
            ("seconds", "Seconds"),
        ] {
            if let Some(value) = present(user, key) {
                push_field(&mut out, label, value);
            }
        }
        if let Some(last_login) = truthy(user, "last_login") {
            push_field(&mut out, "Last Login", last_login);
        }
        for (key, label) in [
            ("current_vm_concurrency", "Current VM Concurrency"),
            ("current_physical_concurrency", "Current Physical Concurrency"),
        ] {
            if let Some(value) = present(user, key) {
                push_field(&mut out, label, value);
            }
        }
        out.push('\n');
    }
    out
}

fn render_user(user: &Value) -> String {
    let part = |key: &str| truthy(user, key).map(display).unwrap_or_default();
    let mut out = format!(
        "## User Details: {} {}\n\n",
        part("first_name"),
        part("last_name")
    );
    out.push_str(&format!(
        "- **User ID**: {}\n",
        display(user.get("id").unwrap_or(&Value::Null))
    ));
    out.push_str(&format!(
        "- **Email**: {}\n",
        display(user.get("email").unwrap_or(&Value::Null))
    ));

    for (key, label) in [
        ("first_name", "First Name"),
        ("last_name", "Last Name"),
        ("role", "Role"),
    ] {
        if let Some(value) = truthy(user, key) {
            push_field(&mut out, label, value);
        }
    }
    if let Some(active) = present(user, "active") {
        out.push_str(&format!("- **Active**: {}\n", yes_no(active)));
    }
    if let Some(joined) = truthy(user, "created_at") {
        push_field(&mut out, "Joined", joined);
    }
    if let Some(last_login) = truthy(user, "last_login") {
        push_field(&mut out, "Last Login", last_login);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_team_with_concurrency() {
        let text = render_team(&json!({
            "name": "QA",
            "users": 0,
            "concurrency": {"allowed": {"vms": 10, "physical": 2}, "current": {"vms": 1}},
            "created_at": "2020-01-01"
        }));
        assert!(text.contains("- **Team Name**: QA\n"));
        assert!(text.contains("- **Users**: 0\n"));
        assert!(text.contains("### Concurrency\n**Allowed**:\n- VMs: 10\n- Physical: 2\n"));
        assert!(text.contains("**Current**:\n- VMs: 1\n"));
        assert!(text.contains("\n- **Created**: 2020-01-01\n"));
    }

    #[test]
    fn test_render_users() {
        let text = render_users(&[
            json!({"id": 1, "first_name": "Grace", "last_name": "Hopper", "roles": ["admin", "dev"], "read_only": false}),
            json!({"id": 2}),
        ]);
        assert!(text.contains("### Grace Hopper\n- **User ID**: 1\n"));
        assert!(text.contains("- **Roles**: admin, dev\n"));
        assert!(text.contains("- **Read Only**: No\n"));
        assert!(text.contains("### User 2\n"));
        assert_eq!(render_users(&[]), "## Team Users\n\nNo users found in team.\n");
    }

    #[test]
    fn test_render_user_details() {
        let text = render_user(&json!({
            "id": 9,
            "first_name": "Linus",
            "email": "l@example.com",
            "active": true
        }));
        assert!(text.starts_with("## User Details: Linus \n\n"));
        assert!(text.contains("- **First Name**: Linus\n"));
        assert!(text.contains("- **Active**: Yes\n"));
    }
}
