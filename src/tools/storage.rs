//! App storage tools (APK / IPA / ZIP uploads)

use std::path::PathBuf;

use serde_json::Value;
use tracing::info;

use super::{display, items, paging, with_api, Page};
use crate::client::SharedApi;
use crate::error::HandlerError;
use crate::registry::ToolDefinition;
use crate::schema::{ArgumentSchema, ParamKind, ParamSpec, ValidatedArgs};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

pub fn tools(api: &SharedApi) -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "uploadFile",
            "Upload a local file (APK, IPA, or ZIP) to TestingBot storage for mobile app testing. Returns an app_url for use in tests.",
            ArgumentSchema::new().param(ParamSpec::required(
                "localFilePath",
                ParamKind::non_empty_string(),
                "Local path to the file to upload",
            )),
            with_api(api, upload_file),
        ),
        ToolDefinition::new(
            "uploadRemoteFile",
            "Upload a file from a remote URL to TestingBot storage. The file will be downloaded from the URL and stored.",
            ArgumentSchema::new().param(ParamSpec::required(
                "remoteUrl",
                ParamKind::Url,
                "Remote URL of the file to upload",
            )),
            with_api(api, upload_remote_file),
        ),
        ToolDefinition::new(
            "getStorageFiles",
            "List all files in TestingBot storage with pagination.",
            paging("Number of files to retrieve (default: 10, max: 100)"),
            with_api(api, get_storage_files),
        ),
        ToolDefinition::new(
            "deleteStorageFile",
            "Delete a file from TestingBot storage using its app_url.",
            ArgumentSchema::new().param(ParamSpec::required(
                "appUrl",
                ParamKind::non_empty_string(),
                "The app_url of the file to delete",
            )),
            with_api(api, delete_storage_file),
        ),
    ]
}

/// Expand a leading `~` so paths typed by hand resolve
fn local_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).into_owned())
}

fn uploaded(headline: &str, result: &Value) -> String {
    format!(
        "{}\n\n**App URL**: {}\n\nUse this URL in your test capabilities.",
        headline,
        display(result.get("app_url").unwrap_or(&Value::Null))
    )
}

async fn upload_file(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let path = local_path(args.str("localFilePath").unwrap_or_default());
    info!(path = %path.display(), "Uploading file");

    let result = api.upload_file(&path).await?;
    Ok(uploaded("File uploaded successfully!", &result))
}

async fn upload_remote_file(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let url = args.str("remoteUrl").unwrap_or_default();
    info!(url, "Uploading remote file");

    let result = api.upload_remote_file(url).await?;
    Ok(uploaded("Remote file uploaded successfully!", &result))
}

async fn get_storage_files(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let page: Page = args.parse()?;
    info!(offset = page.offset, limit = page.limit, "Fetching storage files");

    let response = api.get_storage_files(page.offset, page.limit).await?;
    Ok(render_files(items(&response), &page))
}

async fn delete_storage_file(api: SharedApi, args: ValidatedArgs) -> Result<String, HandlerError> {
    let app_url = args.str("appUrl").unwrap_or_default();
    info!(app_url, "Deleting storage file");

    api.delete_storage_file(app_url).await?;
    Ok("File deleted successfully from storage.".to_string())
}

fn megabytes(size: Option<&Value>) -> String {
    let bytes = size.and_then(Value::as_f64).unwrap_or(0.0);
    format!("{:.2}", bytes / BYTES_PER_MB)
}

fn render_files(files: &[Value], page: &Page) -> String {
    let mut out = format!(
        "## Storage Files (showing {} from offset {})\n\n",
        page.limit, page.offset
    );
    if files.is_empty() {
        out.push_str("No files found in storage.\n");
        return out;
    }

    for file in files {
        let field = |key: &str| display(file.get(key).unwrap_or(&Value::Null));
        out.push_str(&format!("### {}\n", field("name")));
        out.push_str(&format!("- **App URL**: {}\n", field("app_url")));
        out.push_str(&format!("- **Size**: {} MB\n", megabytes(file.get("size"))));
        out.push_str(&format!("- **Uploaded**: {}\n\n", field("uploaded_at")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_megabytes() {
        assert_eq!(megabytes(Some(&json!(1048576))), "1.00");
        assert_eq!(megabytes(Some(&json!(5_767_168))), "5.50");
        assert_eq!(megabytes(None), "0.00");
    }

    #[test]
    fn test_render_files() {
        let files = vec![json!({
            "name": "app.apk",
            "app_url": "tb://abc",
            "size": 2097152,
            "uploaded_at": "2024-01-01"
        })];
        let text = render_files(&files, &Page { offset: 0, limit: 10 });
        assert!(text.contains("### app.apk\n- **App URL**: tb://abc\n- **Size**: 2.00 MB\n"));
        assert!(render_files(&[], &Page { offset: 0, limit: 10 })
            .ends_with("No files found in storage.\n"));
    }

    #[test]
    fn test_uploaded_message() {
        let text = uploaded("File uploaded successfully!", &json!({"app_url": "tb://xyz"}));
        assert!(text.contains("**App URL**: tb://xyz"));
    }

    #[test]
    fn test_local_path_keeps_plain_paths() {
        assert_eq!(local_path("/tmp/app.apk"), PathBuf::from("/tmp/app.apk"));
    }
}
