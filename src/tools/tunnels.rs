//! Tunnel tools

use serde_json::Value;
use tracing::info;

use super::{display, push_field, truthy, with_api};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

const TUNNEL_DOCS: &str = "https://testingbot.com/support/other/tunnel";

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "getTunnelList",
            "Get a list of all active TestingBot tunnels. Tunnels allow you to test websites behind firewalls or on your local machine.",
            ArgumentSchema::new(),
            with_api(api, get_tunnel_list),
        ),
        ToolDefinition::new(
            "deleteTunnel",
            "Delete an active TestingBot tunnel by its ID. This will terminate the tunnel connection.",
            ArgumentSchema::new().param(ParamSpec::required(
                "tunnelId",
                ParamKind::Identifier,
                "The tunnel ID to delete",
            )),
            with_api(api, delete_tunnel),
        ),
    ]
}

async fn get_tunnel_list(api: SharedApi, _args: ValidatedArgs) -> Result<String, HandlerError> {
    info!("Fetching tunnel list");

    let tunnels = api.get_tunnel_list().await?;
    Ok(render_tunnels(&tunnels))
}

async fn delete_tunnel(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let tunnel_id = args.str("tunnelId").unwrap_or_default();
    info!(tunnel_id, "Deleting tunnel");

    api.delete_tunnel(tunnel_id).await?;
    Ok(format!("Tunnel {} deleted successfully.", tunnel_id))
}

fn render_tunnels(tunnels: &Value) -> String {
    let mut out = String::from("## Active Tunnels\n\n");

    let tunnels = match tunnels.as_array() {
        Some(list) if !list.is_empty() => list,
        _ => {
            out.push_str("No active tunnels found.\n\n");
            out.push_str("To start a tunnel, download and run the TestingBot Tunnel:\n");
            out.push_str(TUNNEL_DOCS);
            out.push('\n');
            return out;
        }
    };

    for tunnel in tunnels {
        let id = display(tunnel.get("id").unwrap_or(&Value::Null));
        out.push_str(&format!("### Tunnel {}\n- **ID**: {}\n", id, id));
        for (key, label) in [
            ("status", "Status"),
            ("version", "Version"),
            ("created_at", "Created"),
            ("ip", "IP Address"),
            ("last_heartbeat", "Last Heartbeat"),
        ] {
            if let Some(value) = truthy(tunnel, key) {
                push_field(&mut out, label, value);
            }
        }
        out.push('\n');
    }

    let plural = if tunnels.len() == 1 { "" } else { "s" };
    out.push_str(&format!(
        "\n**Total**: {} active tunnel{}\n",
        tunnels.len(),
        plural
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_tunnels() {
        let text = render_tunnels(&json!([
            {"id": 3, "status": "READY", "ip": "10.0.0.1"},
            {"id": 4}
        ]));
        assert!(text.contains("### Tunnel 3\n- **ID**: 3\n- **Status**: READY\n- **IP Address**: 10.0.0.1\n"));
        assert!(text.ends_with("**Total**: 2 active tunnels\n"));
    }

    #[test]
    fn test_render_single_tunnel_total() {
        let text = render_tunnels(&json!([{"id": "abc"}]));
        assert!(text.ends_with("**Total**: 1 active tunnel\n"));
    }

    #[test]
    fn test_render_no_tunnels() {
        for empty in [json!([]), json!({"unexpected": true})] {
            let text = render_tunnels(&empty);
            assert!(text.contains("No active tunnels found."));
            assert!(text.contains(TUNNEL_DOCS));
        }
    }
}
