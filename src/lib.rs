//! TestingBot MCP Server
//!
//! Exposes the TestingBot REST API as Model Context Protocol tools.
//!
//! # Architecture
//!
//! ```text
//! MCP client ──► MCP Protocol ──► ToolRegistry ──► TestingBotApi ──► TestingBot
//!                  (stdio)            │
//!                                     ├── Schema (validation + coercion)
//!                                     ├── Response (uniform envelope)
//!                                     └── Tools (10 groups, 28 tools)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod response;
pub mod schema;
pub mod tools;
pub mod util;

pub use client::{SharedApi, TestingBotApi, TestingBotClient};
pub use config::Config;
pub use error::{ApiError, ConfigError, FieldError, HandlerError, RegistryError, ToolError};
pub use mcp::{McpRequest, McpResponse, McpServer};
pub use registry::{CatalogEntry, ToolDefinition, ToolRegistry};
pub use response::ToolResponse;
pub use schema::{ArgumentSchema, InputSchema, ParamKind, ParamSpec, TaggedSchema, ValidatedArgs};
pub use tools::build_registry;
