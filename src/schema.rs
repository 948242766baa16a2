//! Argument Schemas
//!
//! Declarative description of what a tool accepts. Each parameter carries a
//! `ParamKind` that decides both how loosely-typed input is coerced and which
//! refinements (bounds, enum membership, URL syntax) apply afterwards.
//!
//! Two shapes exist:
//! - `ArgumentSchema`: an ordered list of parameters
//! - `TaggedSchema`: a discriminant field selecting one of several
//!   `ArgumentSchema` variants
//!
//! Validation never stops at the first failure; every failing parameter
//! contributes a `FieldError`.

use std::collections::HashSet;

use serde::de::DeserializeOwned;
use serde_json::{json, Map, Number, Value};

use crate::error::{FieldError, HandlerError, RegistryError};
use crate::util::{is_valid_email, is_valid_url};

/// Semantic type of a parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String { non_empty: bool },
    /// Accepts numbers and numeric strings
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    /// Accepts booleans and the strings "true"/"false"
    Boolean,
    Enum(&'static [&'static str]),
    /// Absolute URL
    Url,
    Email,
    /// String or integer id, normalized to a string
    Identifier,
    Object(Option<Box<ArgumentSchema>>),
    Array(Box<ParamKind>),
}

impl ParamKind {
    pub fn string() -> Self {
        Self::String { non_empty: false }
    }

    pub fn non_empty_string() -> Self {
        Self::String { non_empty: true }
    }

    pub fn integer(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number {
            min,
            max,
            integer: true,
        }
    }

    pub fn number(min: Option<f64>, max: Option<f64>) -> Self {
        Self::Number {
            min,
            max,
            integer: false,
        }
    }

    pub fn object_of(schema: ArgumentSchema) -> Self {
        Self::Object(Some(Box::new(schema)))
    }

    pub fn array_of(item: ParamKind) -> Self {
        Self::Array(Box::new(item))
    }

    /// JSON Schema fragment for the catalog
    fn descriptor(&self) -> Map<String, Value> {
        let mut out = Map::new();
        match self {
            Self::String { non_empty } => {
                out.insert("type".into(), json!("string"));
                if *non_empty {
                    out.insert("minLength".into(), json!(1));
                }
            }
            Self::Number { min, max, integer } => {
                out.insert(
                    "type".into(),
                    json!(if *integer { "integer" } else { "number" }),
                );
                if let Some(min) = min {
                    out.insert("minimum".into(), json!(min));
                }
                if let Some(max) = max {
                    out.insert("maximum".into(), json!(max));
                }
            }
            Self::Boolean => {
                out.insert("type".into(), json!("boolean"));
            }
            Self::Enum(values) => {
                out.insert("type".into(), json!("string"));
                out.insert("enum".into(), json!(values));
            }
            Self::Url => {
                out.insert("type".into(), json!("string"));
                out.insert("format".into(), json!("uri"));
            }
            Self::Email => {
                out.insert("type".into(), json!("string"));
                out.insert("format".into(), json!("email"));
            }
            Self::Identifier => {
                out.insert("type".into(), json!(["string", "integer"]));
            }
            Self::Object(None) => {
                out.insert("type".into(), json!("object"));
            }
            Self::Object(Some(schema)) => {
                out.insert("type".into(), json!("object"));
                out.insert("properties".into(), Value::Object(schema.properties()));
                out.insert("required".into(), json!(schema.required()));
            }
            Self::Array(item) => {
                out.insert("type".into(), json!("array"));
                out.insert("items".into(), Value::Object(item.descriptor()));
            }
        }
        out
    }

    /// Coerce and refine a present value. `path` names the value in errors.
    fn coerce(&self, value: &Value, path: &str) -> Result<Value, Vec<FieldError>> {
        let fail = |reason: String| Err(vec![FieldError::new(path, reason)]);

        match self {
            Self::String { non_empty } => match value.as_str() {
                Some(s) if *non_empty && s.trim().is_empty() => {
                    fail(format!("{} must not be empty", path))
                }
                Some(s) => Ok(Value::String(s.to_string())),
                None => fail(format!("{} must be a string", path)),
            },
            Self::Number { min, max, integer } => {
                let number = match value {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) if !s.trim().is_empty() => {
                        s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
                    }
                    _ => None,
                };
                let Some(number) = number else {
                    return fail(format!("{} must be a number, received {}", path, value));
                };
                if *integer && number.fract() != 0.0 {
                    return fail(format!("{} must be an integer, received {}", path, number));
                }
                if let Some(min) = min {
                    if number < *min {
                        return fail(format!("{} must be at least {}", path, min));
                    }
                }
                if let Some(max) = max {
                    if number > *max {
                        return fail(format!("{} must be at most {}", path, max));
                    }
                }
                if *integer {
                    // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive
                    if number < i64::MIN as f64 || number >= i64::MAX as f64 {
                        return fail(format!("{} is out of range", path));
                    }
                    let exact = match value {
                        Value::Number(n) => n.as_i64(),
                        Value::String(s) => s.trim().parse::<i64>().ok(),
                        _ => None,
                    };
                    Ok(Value::from(exact.unwrap_or(number as i64)))
                } else {
                    Number::from_f64(number)
                        .map(Value::Number)
                        .ok_or_else(|| vec![FieldError::new(path, format!("{} is not finite", path))])
                }
            }
            Self::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                other => fail(format!("{} must be a boolean, received {}", path, other)),
            },
            Self::Enum(values) => match value.as_str() {
                Some(s) if values.iter().any(|v| *v == s) => Ok(Value::String(s.to_string())),
                _ => fail(format!(
                    "{} must be one of: {}; received {}",
                    path,
                    values.join(", "),
                    value
                )),
            },
            Self::Url => match value.as_str() {
                Some(s) if is_valid_url(s) => Ok(Value::String(s.to_string())),
                _ => fail(format!("{} must be a valid URL, received {}", path, value)),
            },
            Self::Email => match value.as_str() {
                Some(s) if is_valid_email(s) => Ok(Value::String(s.to_string())),
                _ => fail(format!(
                    "{} must be a valid email address, received {}",
                    path, value
                )),
            },
            Self::Identifier => match value {
                Value::String(s) if !s.trim().is_empty() => Ok(Value::String(s.clone())),
                Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::String(n.to_string())),
                other => fail(format!(
                    "{} must be a string or integer id, received {}",
                    path, other
                )),
            },
            Self::Object(schema) => {
                let Some(map) = value.as_object() else {
                    return fail(format!("{} must be an object", path));
                };
                match schema {
                    None => Ok(value.clone()),
                    Some(schema) => schema.validate_at(map, path).map(Value::Object),
                }
            }
            Self::Array(item) => {
                let Some(items) = value.as_array() else {
                    return fail(format!("{} must be an array", path));
                };
                let mut out = Vec::with_capacity(items.len());
                let mut errors = Vec::new();
                for (i, element) in items.iter().enumerate() {
                    match item.coerce(element, &format!("{}[{}]", path, i)) {
                        Ok(v) => out.push(v),
                        Err(mut e) => errors.append(&mut e),
                    }
                }
                if errors.is_empty() {
                    Ok(Value::Array(out))
                } else {
                    Err(errors)
                }
            }
        }
    }

    /// Run the startup check on any nested object schema, including array items
    fn check(&self, tool: &str) -> Result<(), RegistryError> {
        match self {
            Self::Object(Some(nested)) => nested.check(tool),
            Self::Array(item) => item.check(tool),
            _ => Ok(()),
        }
    }
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn required(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind, description)
        }
    }

    /// Set a default; a defaulted parameter is always optional
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self.required = false;
        self
    }

    fn descriptor(&self) -> Value {
        let mut out = self.kind.descriptor();
        out.insert("description".into(), json!(self.description));
        if let Some(default) = &self.default {
            out.insert("default".into(), default.clone());
        }
        Value::Object(out)
    }
}

/// Ordered parameter list for one tool (or one variant)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgumentSchema {
    params: Vec<ParamSpec>,
}

impl ArgumentSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Catalog properties, in declaration order
    pub fn properties(&self) -> Map<String, Value> {
        self.params
            .iter()
            .map(|p| (p.name.to_string(), p.descriptor()))
            .collect()
    }

    /// Parameters that are required and have no default
    pub fn required(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.required && p.default.is_none())
            .map(|p| p.name.to_string())
            .collect()
    }

    /// Validate a raw argument object
    pub fn validate(&self, raw: &Map<String, Value>) -> Result<Map<String, Value>, Vec<FieldError>> {
        self.validate_at(raw, "")
    }

    fn validate_at(
        &self,
        raw: &Map<String, Value>,
        prefix: &str,
    ) -> Result<Map<String, Value>, Vec<FieldError>> {
        let mut out = Map::new();
        let mut errors = Vec::new();

        for spec in &self.params {
            let path = if prefix.is_empty() {
                spec.name.to_string()
            } else {
                format!("{}.{}", prefix, spec.name)
            };

            // null counts as absent
            match raw.get(spec.name).filter(|v| !v.is_null()) {
                None if spec.required => errors.push(FieldError::missing(&path)),
                None => {
                    if let Some(default) = &spec.default {
                        out.insert(spec.name.to_string(), default.clone());
                    }
                }
                Some(value) => match spec.kind.coerce(value, &path) {
                    Ok(v) => {
                        out.insert(spec.name.to_string(), v);
                    }
                    Err(mut e) => errors.append(&mut e),
                },
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    /// Startup check: unique names, required parameters carry no default
    fn check(&self, tool: &str) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for spec in &self.params {
            if !seen.insert(spec.name) {
                return Err(RegistryError::DuplicateParameter {
                    tool: tool.to_string(),
                    param: spec.name.to_string(),
                });
            }
            if spec.required && spec.default.is_some() {
                return Err(RegistryError::RequiredWithDefault {
                    tool: tool.to_string(),
                    param: spec.name.to_string(),
                });
            }
            spec.kind.check(tool)?;
        }
        Ok(())
    }
}

/// A schema whose shape is chosen by a string discriminant
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSchema {
    pub field: &'static str,
    /// Human label used in "unrecognized <label>" errors
    pub label: &'static str,
    pub description: &'static str,
    pub variants: Vec<(&'static str, ArgumentSchema)>,
}

impl TaggedSchema {
    pub fn new(field: &'static str, label: &'static str, description: &'static str) -> Self {
        Self {
            field,
            label,
            description,
            variants: Vec::new(),
        }
    }

    pub fn variant(mut self, tag: &'static str, schema: ArgumentSchema) -> Self {
        self.variants.push((tag, schema));
        self
    }

    fn tags(&self) -> Vec<&'static str> {
        self.variants.iter().map(|(tag, _)| *tag).collect()
    }

    fn properties(&self) -> Map<String, Value> {
        let mut out = Map::new();
        out.insert(
            self.field.to_string(),
            json!({
                "type": "string",
                "enum": self.tags(),
                "description": self.description,
            }),
        );
        for (_, schema) in &self.variants {
            for (name, descriptor) in schema.properties() {
                match out.get(&name).cloned() {
                    None => {
                        out.insert(name, descriptor);
                    }
                    Some(existing) if existing == descriptor => {}
                    Some(existing) => {
                        out.insert(name, merge_any_of(existing, descriptor));
                    }
                }
            }
        }
        out
    }

    /// Discriminant plus fields required by every variant
    fn required(&self) -> Vec<String> {
        let mut required = vec![self.field.to_string()];
        if let Some((_, first)) = self.variants.first() {
            for name in first.required() {
                let in_all = self
                    .variants
                    .iter()
                    .all(|(_, schema)| schema.required().contains(&name));
                if in_all {
                    required.push(name);
                }
            }
        }
        required
    }

    fn validate(&self, raw: &Map<String, Value>) -> Result<ValidatedArgs, Vec<FieldError>> {
        let received = raw.get(self.field);
        let selected = received.and_then(Value::as_str).and_then(|tag| {
            self.variants
                .iter()
                .find(|(candidate, _)| *candidate == tag)
        });

        let Some((tag, schema)) = selected else {
            let received = match received {
                None | Some(Value::Null) => "(none)".to_string(),
                Some(value) => value.to_string(),
            };
            return Err(vec![FieldError::new(
                self.field,
                format!(
                    "unrecognized {} {}; expected one of: {}",
                    self.label,
                    received,
                    self.tags().join(", ")
                ),
            )]);
        };

        let mut values = schema.validate(raw)?;
        values.insert(self.field.to_string(), Value::String(tag.to_string()));
        Ok(ValidatedArgs {
            values,
            variant: Some(*tag),
        })
    }

    fn check(&self, tool: &str) -> Result<(), RegistryError> {
        let mut seen = HashSet::new();
        for (tag, schema) in &self.variants {
            if !seen.insert(*tag) {
                return Err(RegistryError::DuplicateParameter {
                    tool: tool.to_string(),
                    param: format!("{}={}", self.field, tag),
                });
            }
            schema.check(tool)?;
            if schema.params().iter().any(|p| p.name == self.field) {
                return Err(RegistryError::DuplicateParameter {
                    tool: tool.to_string(),
                    param: self.field.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn merge_any_of(existing: Value, incoming: Value) -> Value {
    let description = existing.get("description").cloned();
    let mut options = match existing {
        Value::Object(ref map) if map.contains_key("anyOf") => map
            .get("anyOf")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default(),
        other => vec![other],
    };
    options.push(incoming);

    let mut out = Map::new();
    out.insert("anyOf".into(), Value::Array(options));
    if let Some(description) = description {
        out.insert("description".into(), description);
    }
    Value::Object(out)
}

/// The full input description of a tool
#[derive(Debug, Clone, PartialEq)]
pub enum InputSchema {
    Fields(ArgumentSchema),
    Tagged(TaggedSchema),
}

impl From<ArgumentSchema> for InputSchema {
    fn from(schema: ArgumentSchema) -> Self {
        Self::Fields(schema)
    }
}

impl From<TaggedSchema> for InputSchema {
    fn from(schema: TaggedSchema) -> Self {
        Self::Tagged(schema)
    }
}

impl InputSchema {
    pub fn properties(&self) -> Map<String, Value> {
        match self {
            Self::Fields(schema) => schema.properties(),
            Self::Tagged(schema) => schema.properties(),
        }
    }

    pub fn required(&self) -> Vec<String> {
        match self {
            Self::Fields(schema) => schema.required(),
            Self::Tagged(schema) => schema.required(),
        }
    }

    /// Validate raw call arguments. A missing/null argument object is empty.
    pub fn validate(&self, raw: &Value) -> Result<ValidatedArgs, Vec<FieldError>> {
        let empty = Map::new();
        let map = match raw {
            Value::Null => &empty,
            Value::Object(map) => map,
            other => {
                return Err(vec![FieldError::new(
                    "arguments",
                    format!("arguments must be an object, received {}", other),
                )])
            }
        };

        match self {
            Self::Fields(schema) => schema.validate(map).map(|values| ValidatedArgs {
                values,
                variant: None,
            }),
            Self::Tagged(schema) => schema.validate(map),
        }
    }

    pub(crate) fn check(&self, tool: &str) -> Result<(), RegistryError> {
        match self {
            Self::Fields(schema) => schema.check(tool),
            Self::Tagged(schema) => schema.check(tool),
        }
    }
}

/// Arguments after coercion; only declared parameters survive
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArgs {
    values: Map<String, Value>,
    variant: Option<&'static str>,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Selected variant tag, for tagged schemas
    pub fn variant(&self) -> Option<&'static str> {
        self.variant
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// Deserialize into a typed argument struct
    pub fn parse<T: DeserializeOwned>(&self) -> Result<T, HandlerError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| HandlerError::Decode(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paging() -> ArgumentSchema {
        ArgumentSchema::new()
            .param(
                ParamSpec::optional("offset", ParamKind::integer(Some(0.0), None), "Offset")
                    .with_default(0),
            )
            .param(
                ParamSpec::optional(
                    "limit",
                    ParamKind::integer(Some(1.0), Some(100.0)),
                    "Limit",
                )
                .with_default(10),
            )
    }

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_defaults_substituted() {
        let out = paging().validate(&Map::new()).unwrap();
        assert_eq!(out["offset"], json!(0));
        assert_eq!(out["limit"], json!(10));
    }

    #[test]
    fn test_numeric_strings_coerced() {
        let out = paging()
            .validate(&obj(json!({"offset": "20", "limit": " 5 "})))
            .unwrap();
        assert_eq!(out["offset"], json!(20));
        assert_eq!(out["limit"], json!(5));
    }

    #[test]
    fn test_numeric_bounds() {
        let schema = paging();
        assert!(schema.validate(&obj(json!({"limit": 1}))).is_ok());
        assert!(schema.validate(&obj(json!({"limit": 100}))).is_ok());

        let low = schema.validate(&obj(json!({"limit": 0}))).unwrap_err();
        assert_eq!(low[0].field, "limit");
        assert!(low[0].reason.contains("at least 1"));

        let high = schema.validate(&obj(json!({"limit": 101}))).unwrap_err();
        assert!(high[0].reason.contains("at most 100"));

        assert!(schema.validate(&obj(json!({"offset": -1}))).is_err());
    }

    #[test]
    fn test_unparseable_number_is_validation_failure() {
        let errors = paging()
            .validate(&obj(json!({"limit": "ten"})))
            .unwrap_err();
        assert!(errors[0].reason.contains("must be a number"));
        assert!(paging().validate(&obj(json!({"limit": ""}))).is_err());
        assert!(paging().validate(&obj(json!({"limit": 2.5}))).is_err());
    }

    #[test]
    fn test_integer_outside_i64_is_rejected() {
        let schema = ArgumentSchema::new().param(ParamSpec::required(
            "buildId",
            ParamKind::integer(None, None),
            "Build",
        ));
        for raw in [json!(u64::MAX), json!("1e30"), json!(-1e30)] {
            let errors = schema.validate(&obj(json!({ "buildId": raw }))).unwrap_err();
            assert_eq!(errors[0].reason, "buildId is out of range", "{raw}");
        }

        let out = schema
            .validate(&obj(json!({"buildId": "9007199254740993"})))
            .unwrap();
        assert_eq!(out["buildId"], json!(9007199254740993i64));
        let out = schema.validate(&obj(json!({"buildId": i64::MIN}))).unwrap();
        assert_eq!(out["buildId"], json!(i64::MIN));
    }

    #[test]
    fn test_collects_every_failure() {
        let schema = ArgumentSchema::new()
            .param(ParamSpec::required("sessionId", ParamKind::string(), "id"))
            .param(ParamSpec::required("url", ParamKind::Url, "url"))
            .param(ParamSpec::optional("status", ParamKind::Enum(&["passed", "failed"]), "s"));

        let errors = schema
            .validate(&obj(json!({"url": "nope", "status": "maybe"})))
            .unwrap_err();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0].reason, "missing required parameter sessionId");
        assert!(errors[1].reason.contains("valid URL"));
        assert!(errors[2].reason.contains("one of: passed, failed"));
    }

    #[test]
    fn test_boolean_coercion() {
        let schema = ArgumentSchema::new()
            .param(ParamSpec::optional("fullPage", ParamKind::Boolean, "f").with_default(false));
        assert_eq!(
            schema.validate(&obj(json!({"fullPage": "true"}))).unwrap()["fullPage"],
            json!(true)
        );
        assert_eq!(
            schema.validate(&obj(json!({"fullPage": "false"}))).unwrap()["fullPage"],
            json!(false)
        );
        assert!(schema.validate(&obj(json!({"fullPage": "yes"}))).is_err());
    }

    #[test]
    fn test_nested_array_paths() {
        let browser = ArgumentSchema::new()
            .param(ParamSpec::required("browserName", ParamKind::string(), "b"))
            .param(ParamSpec::required("os", ParamKind::string(), "o"));
        let schema = ArgumentSchema::new().param(ParamSpec::required(
            "browsers",
            ParamKind::array_of(ParamKind::object_of(browser)),
            "browsers",
        ));

        let errors = schema
            .validate(&obj(json!({"browsers": [{"browserName": "chrome", "os": "WIN11"}, {"browserName": "firefox"}]})))
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "browsers[1].os");
    }

    #[test]
    fn test_identifier_accepts_string_or_integer() {
        let schema = ArgumentSchema::new()
            .param(ParamSpec::required("tunnelId", ParamKind::Identifier, "id"));
        assert_eq!(
            schema.validate(&obj(json!({"tunnelId": 42}))).unwrap()["tunnelId"],
            json!("42")
        );
        assert_eq!(
            schema.validate(&obj(json!({"tunnelId": "abc"}))).unwrap()["tunnelId"],
            json!("abc")
        );
        assert!(schema.validate(&obj(json!({"tunnelId": true}))).is_err());
    }

    #[test]
    fn test_unknown_keys_dropped() {
        let out = paging()
            .validate(&obj(json!({"limit": 3, "extra": "ignored"})))
            .unwrap();
        assert!(out.get("extra").is_none());
    }

    #[test]
    fn test_catalog_projection() {
        let schema = ArgumentSchema::new()
            .param(ParamSpec::required("sessionId", ParamKind::string(), "id"))
            .param(ParamSpec::optional("name", ParamKind::string(), "n"));
        let input: InputSchema = schema.into();
        assert_eq!(input.required(), vec!["sessionId".to_string()]);
        let props = input.properties();
        let keys: Vec<_> = props.keys().cloned().collect();
        assert_eq!(keys, vec!["sessionId", "name"]);
        assert_eq!(props["sessionId"]["type"], "string");
    }

    #[test]
    fn test_check_rejects_duplicate_params() {
        let schema: InputSchema = ArgumentSchema::new()
            .param(ParamSpec::required("a", ParamKind::string(), "a"))
            .param(ParamSpec::optional("a", ParamKind::string(), "a"))
            .into();
        assert_eq!(
            schema.check("tool"),
            Err(RegistryError::DuplicateParameter {
                tool: "tool".into(),
                param: "a".into()
            })
        );
    }

    #[test]
    fn test_check_reaches_array_items() {
        let item = ArgumentSchema::new()
            .param(ParamSpec::required("os", ParamKind::string(), "os"))
            .param(ParamSpec::required("os", ParamKind::string(), "os"));
        let schema: InputSchema = ArgumentSchema::new()
            .param(ParamSpec::required(
                "browsers",
                ParamKind::array_of(ParamKind::object_of(item)),
                "browsers",
            ))
            .into();
        assert_eq!(
            schema.check("tool"),
            Err(RegistryError::DuplicateParameter {
                tool: "tool".into(),
                param: "os".into()
            })
        );
    }

    #[test]
    fn test_non_object_arguments_rejected() {
        let schema: InputSchema = paging().into();
        assert!(schema.validate(&json!([1, 2])).is_err());
        assert!(schema.validate(&Value::Null).is_ok());
    }

    fn tagged() -> TaggedSchema {
        TaggedSchema::new("kind", "kind", "Kind")
            .variant(
                "a",
                ArgumentSchema::new()
                    .param(ParamSpec::required("shared", ParamKind::string(), "s"))
                    .param(ParamSpec::required("onlyA", ParamKind::string(), "a")),
            )
            .variant(
                "b",
                ArgumentSchema::new()
                    .param(ParamSpec::required("shared", ParamKind::string(), "s"))
                    .param(ParamSpec::required("onlyB", ParamKind::Enum(&["x"]), "b")),
            )
    }

    #[test]
    fn test_tagged_selects_variant() {
        let schema: InputSchema = tagged().into();
        let out = schema
            .validate(&json!({"kind": "b", "shared": "s", "onlyB": "x"}))
            .unwrap();
        assert_eq!(out.variant(), Some("b"));
        assert_eq!(out.str("kind"), Some("b"));
        assert!(out.get("onlyA").is_none());
    }

    #[test]
    fn test_tagged_other_variant_fields_not_required() {
        let schema: InputSchema = tagged().into();
        let errors = schema.validate(&json!({"kind": "a", "shared": "s"})).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "onlyA");
    }

    #[test]
    fn test_tagged_unrecognized_discriminant() {
        let schema: InputSchema = tagged().into();
        let errors = schema.validate(&json!({"kind": "invalid"})).unwrap_err();
        assert!(errors[0].reason.contains("unrecognized kind \"invalid\""));
        let errors = schema.validate(&json!({})).unwrap_err();
        assert!(errors[0].reason.contains("unrecognized kind (none)"));
    }

    #[test]
    fn test_tagged_catalog() {
        let schema: InputSchema = tagged().into();
        assert_eq!(schema.required(), vec!["kind".to_string(), "shared".to_string()]);
        let props = schema.properties();
        assert_eq!(props["kind"]["enum"], json!(["a", "b"]));
        assert!(props.contains_key("onlyA"));
        assert!(props.contains_key("onlyB"));
    }
}
