//! Capability records: name, description, declared parameters and a handler.

use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::core::error::{Result, SolvedAcError};
use crate::domain::PromptMessage;

pub type JsonObject = serde_json::Map<String, Value>;

/// Where a capability is surfaced on the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Tool,
    /// Parameterized resource; `{name}` segments become arguments.
    ResourceTemplate { uri_template: &'static str },
    Prompt,
    /// Fixed, argument-free resource always available to the host.
    Context { uri: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    String { non_empty: bool },
    /// Accepts JSON integers and decimal strings; prompt arguments and URI
    /// query values always arrive as strings.
    Integer { min: i64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub default: Option<Value>,
}

impl ParamSpec {
    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::String { non_empty: false },
            required: true,
            default: None,
        }
    }

    pub fn non_empty_string(name: &'static str, description: &'static str) -> Self {
        Self {
            kind: ParamKind::String { non_empty: true },
            ..Self::string(name, description)
        }
    }

    pub fn integer(name: &'static str, description: &'static str, min: i64) -> Self {
        Self {
            name,
            description,
            kind: ParamKind::Integer { min },
            required: true,
            default: None,
        }
    }

    /// Make the parameter optional, falling back to `default` when absent.
    pub fn with_default(mut self, default: Value) -> Self {
        self.required = false;
        self.default = Some(default);
        self
    }

    fn coerce(&self, value: &Value) -> Result<Value> {
        match &self.kind {
            ParamKind::String { non_empty } => {
                let s = value.as_str().ok_or_else(|| {
                    SolvedAcError::invalid_argument(format!("field '{}' must be a string", self.name))
                })?;
                if *non_empty && s.trim().is_empty() {
                    return Err(SolvedAcError::invalid_argument(format!(
                        "field '{}' must not be empty",
                        self.name
                    )));
                }
                Ok(Value::String(s.to_owned()))
            }
            ParamKind::Integer { min } => {
                let n = match value {
                    Value::Number(n) => n.as_i64(),
                    Value::String(s) => s.trim().parse::<i64>().ok(),
                    _ => None,
                }
                .ok_or_else(|| {
                    SolvedAcError::invalid_argument(format!("field '{}' must be an integer", self.name))
                })?;
                if n < *min {
                    return Err(SolvedAcError::invalid_argument(format!(
                        "field '{}' must be >= {min}, got {n}",
                        self.name
                    )));
                }
                Ok(json!(n))
            }
        }
    }

    fn schema(&self) -> Value {
        let mut prop = match &self.kind {
            ParamKind::String { .. } => json!({ "type": "string" }),
            ParamKind::Integer { min } => json!({ "type": "integer", "minimum": min }),
        };
        prop["description"] = json!(self.description);
        if let Some(d) = &self.default {
            prop["default"] = d.clone();
        }
        prop
    }
}

/// Check `args` against the declared parameters and return a normalized
/// object: defaults filled in, integers as JSON numbers, undeclared keys
/// dropped.
pub fn validate_arguments(params: &[ParamSpec], args: &JsonObject) -> Result<JsonObject> {
    let mut out = JsonObject::new();
    for p in params {
        match args.get(p.name) {
            None | Some(Value::Null) => {
                if let Some(d) = &p.default {
                    out.insert(p.name.to_owned(), d.clone());
                } else if p.required {
                    return Err(SolvedAcError::invalid_argument(format!(
                        "missing required field: {}",
                        p.name
                    )));
                }
            }
            Some(v) => {
                out.insert(p.name.to_owned(), p.coerce(v)?);
            }
        }
    }
    Ok(out)
}

/// JSON Schema object describing `params`.
pub fn input_schema(params: &[ParamSpec]) -> Value {
    let properties: JsonObject = params
        .iter()
        .map(|p| (p.name.to_owned(), p.schema()))
        .collect();
    let required: Vec<&str> = params.iter().filter(|p| p.required).map(|p| p.name).collect();
    json!({ "type": "object", "properties": properties, "required": required })
}

pub fn arg_str<'a>(args: &'a JsonObject, name: &str) -> Result<&'a str> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| SolvedAcError::invalid_argument(format!("missing required field: {name}")))
}

pub fn arg_u32(args: &JsonObject, name: &str) -> Result<u32> {
    let n = args
        .get(name)
        .and_then(|v| v.as_i64())
        .ok_or_else(|| SolvedAcError::invalid_argument(format!("missing required field: {name}")))?;
    u32::try_from(n)
        .map_err(|_| SolvedAcError::invalid_argument(format!("field '{name}' is out of range: {n}")))
}

/// What a capability hands back to the protocol layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CapabilityOutput {
    Json(Value),
    Messages(Vec<PromptMessage>),
}

/// Handler side of a capability. Arguments are already validated.
#[async_trait]
pub trait CapabilityHandler: Send + Sync {
    async fn invoke(&self, args: JsonObject) -> Result<CapabilityOutput>;
}

type HandlerFuture = Pin<Box<dyn Future<Output = Result<CapabilityOutput>> + Send>>;

/// Adapts an async closure into a [`CapabilityHandler`].
pub struct FnHandler {
    inner: Arc<dyn Fn(JsonObject) -> HandlerFuture + Send + Sync>,
}

impl FnHandler {
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(JsonObject) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<CapabilityOutput>> + Send + 'static,
    {
        Self { inner: Arc::new(move |args| Box::pin(f(args))) }
    }
}

#[async_trait]
impl CapabilityHandler for FnHandler {
    async fn invoke(&self, args: JsonObject) -> Result<CapabilityOutput> {
        (self.inner)(args).await
    }
}

/// One registered capability.
#[derive(Clone)]
pub struct CapabilityRecord {
    pub kind: CapabilityKind,
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
    handler: Arc<dyn CapabilityHandler>,
}

impl CapabilityRecord {
    pub fn new(
        kind: CapabilityKind,
        name: &'static str,
        description: &'static str,
        params: Vec<ParamSpec>,
        handler: impl CapabilityHandler + 'static,
    ) -> Self {
        Self { kind, name, description, params, handler: Arc::new(handler) }
    }

    pub fn input_schema(&self) -> Value {
        input_schema(&self.params)
    }

    /// Validate then dispatch. The handler is never reached with bad input.
    pub async fn invoke(&self, args: &JsonObject) -> Result<CapabilityOutput> {
        let args = validate_arguments(&self.params, args)?;
        self.handler.invoke(args).await
    }
}

impl std::fmt::Debug for CapabilityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRecord")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}
