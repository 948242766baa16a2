//! TestingBot tool groups
//!
//! Each submodule exposes `tools()` returning its `ToolDefinition`s; the
//! registry is the concatenation of all groups in the order listed in
//! `groups`.

pub mod browsers;
pub mod builds;
pub mod cdp;
pub mod live;
pub mod screenshots;
pub mod storage;
pub mod team;
pub mod test_results;
pub mod tunnels;
pub mod user;

use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::client::SharedApi;
use crate::error::{HandlerError, RegistryError};
use crate::registry::{ToolDefinition, ToolRegistry};
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

/// Every tool group, in registration order
pub fn groups(api: &SharedApi) -> Vec<Vec<ToolDefinition>> {
    vec![
        browsers::tools(api),
        test_results::tools(api),
        builds::tools(api),
        storage::tools(api),
        screenshots::tools(api),
        user::tools(api),
        live::tools(),
        team::tools(api),
        cdp::tools(api),
        tunnels::tools(api),
    ]
}

/// Build the full TestingBot registry
pub fn build_registry(api: &SharedApi) -> Result<ToolRegistry, RegistryError> {
    ToolRegistry::from_groups(groups(api))
}

/// Bind a handler `fn(api, args)` to a shared client
pub(crate) fn with_api<F, Fut>(
    api: &SharedApi,
    handler: F,
) -> impl Fn(ValidatedArgs) -> Fut + Send + Sync + 'static
where
    F: Fn(SharedApi, ValidatedArgs) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
{
    let api = Arc::clone(api);
    move |args| handler(Arc::clone(&api), args)
}

/// `offset` / `limit` pagination parameters
pub(crate) fn paging(limit_description: &'static str) -> ArgumentSchema {
    ArgumentSchema::new()
        .param(
            ParamSpec::optional(
                "offset",
                ParamKind::integer(Some(0.0), None),
                "Offset for pagination (default: 0)",
            )
            .with_default(0),
        )
        .param(
            ParamSpec::optional(
                "limit",
                ParamKind::integer(Some(1.0), Some(100.0)),
                limit_description,
            )
            .with_default(10),
        )
}

#[derive(Debug, Deserialize)]
pub(crate) struct Page {
    pub offset: u64,
    pub limit: u64,
}

/// List payload: either `{"data": [...]}` or a bare array
pub(crate) fn items(value: &Value) -> &[Value] {
    value
        .get("data")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Text form of a JSON scalar; strings unquoted
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Field that is present and not null
pub(crate) fn present<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.get(key).filter(|v| !v.is_null())
}

/// Field that is present and truthy (not null, false, 0 or "")
pub(crate) fn truthy<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    present(value, key).filter(|v| match v {
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64() != Some(0.0),
        _ => true,
    })
}

/// First truthy field among `keys`
pub(crate) fn first_truthy<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| truthy(value, k))
}

/// `- **Label**: value` line
pub(crate) fn push_field(out: &mut String, label: &str, value: &Value) {
    out.push_str(&format!("- **{}**: {}\n", label, display(value)));
}

pub(crate) fn yes_no(value: &Value) -> &'static str {
    match value {
        Value::Bool(true) => "Yes",
        Value::Number(n) if n.as_f64() != Some(0.0) => "Yes",
        Value::String(s) if !s.is_empty() => "Yes",
        _ => "No",
    }
}
