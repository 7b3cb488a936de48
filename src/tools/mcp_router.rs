//! MCP surface for the capability registry.
//!
//! Tool calls, resource reads and prompt requests are looked up in the
//! [`CapabilityRegistry`] and dispatched to the matching record. Listings are
//! rendered from the records as MCP wire JSON.

use std::sync::Arc;

use rmcp::{
    model::{
        CallToolRequestParam, CallToolResult, GetPromptRequestParam, GetPromptResult,
        ListPromptsResult, ListResourceTemplatesResult, ListResourcesResult, ListToolsResult,
        PaginatedRequestParam, Prompt, ReadResourceRequestParam, ReadResourceResult, Resource,
        ResourceTemplate, ServerCapabilities, ServerInfo, Tool,
    },
    service::RequestContext,
    ErrorData as McpError, RoleServer, ServerHandler,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::core::capability::{CapabilityKind, CapabilityOutput, CapabilityRecord, ParamKind};
use crate::core::error::ErrorKind;
use crate::tools::registry::{CapabilityClass, CapabilityRegistry};

const JSON_MIME: &str = "application/json";

#[derive(Clone)]
pub struct SolvedAcSvc {
    registry: Arc<CapabilityRegistry>,
}

impl SolvedAcSvc {
    pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }
}

/// Factory for transports that build one handler per session.
pub fn make_factory(registry: Arc<CapabilityRegistry>) -> impl Fn() -> SolvedAcSvc + Clone + Send + Sync + 'static {
    move || SolvedAcSvc::new(registry.clone())
}

fn from_wire<T: DeserializeOwned>(value: Value) -> Result<T, McpError> {
    serde_json::from_value(value).map_err(|e| McpError::internal_error(format!("building MCP payload: {e}"), None))
}

fn expect_json(record: &CapabilityRecord, out: CapabilityOutput) -> Result<Value, McpError> {
    match out {
        CapabilityOutput::Json(v) => Ok(v),
        CapabilityOutput::Messages(_) => Err(McpError::internal_error(
            format!("capability '{}' returned messages where JSON was expected", record.name),
            None,
        )),
    }
}

fn tool_wire(record: &CapabilityRecord) -> Value {
    json!({
        "name": record.name,
        "description": record.description,
        "inputSchema": record.input_schema(),
    })
}

fn prompt_wire(record: &CapabilityRecord) -> Value {
    let arguments: Vec<Value> = record
        .params
        .iter()
        .map(|p| {
            let mut description = p.description.to_owned();
            if let ParamKind::Integer { min } = p.kind {
                description.push_str(&format!(" (integer >= {min})"));
            }
            json!({ "name": p.name, "description": description, "required": p.required })
        })
        .collect();
    json!({ "name": record.name, "description": record.description, "arguments": arguments })
}

impl ServerHandler for SolvedAcSvc {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .enable_prompts()
                .build(),
            instructions: Some(
                "solved.ac gateway: look up users, search problems with the solved.ac query \
                 grammar, and use the `solvedac.search-workflow` prompt to turn natural-language \
                 requests into searches."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self
            .registry
            .of_class(CapabilityClass::Tool)
            .map(|r| from_wire::<Tool>(tool_wire(r)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListToolsResult::with_all_items(tools))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, arguments = ?request.arguments, "tools/call");
        let record = self
            .registry
            .find(CapabilityClass::Tool, &request.name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown tool: {}", request.name), None))?;
        let args = request.arguments.unwrap_or_default();
        let out = record.invoke(&args).await?;
        let payload = expect_json(record, out)?;
        tracing::trace!(payload = %payload, "tools/call returning payload");
        from_wire(json!({
            "content": [{ "type": "text", "text": payload.to_string() }],
            "structuredContent": payload,
            "isError": false,
        }))
    }

    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        let resources = self
            .registry
            .records()
            .filter_map(|r| match r.kind {
                CapabilityKind::Context { uri } => Some(from_wire::<Resource>(json!({
                    "uri": uri,
                    "name": r.name,
                    "description": r.description,
                    "mimeType": JSON_MIME,
                }))),
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListResourcesResult::with_all_items(resources))
    }

    async fn list_resource_templates(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourceTemplatesResult, McpError> {
        let templates = self
            .registry
            .records()
            .filter_map(|r| match r.kind {
                CapabilityKind::ResourceTemplate { uri_template } => Some(from_wire::<ResourceTemplate>(json!({
                    "uriTemplate": uri_template,
                    "name": r.name,
                    "description": r.description,
                    "mimeType": JSON_MIME,
                }))),
                _ => None,
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListResourceTemplatesResult::with_all_items(templates))
    }

    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        tracing::debug!(uri = %request.uri, "resources/read");
        let (record, args) = self
            .registry
            .resolve_resource(&request.uri)
            .ok_or_else(|| McpError::resource_not_found(format!("unknown resource: {}", request.uri), None))?;
        let out = record.invoke(&args).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => McpError::resource_not_found(e.to_string(), Some(e.error_data())),
            _ => e.to_mcp_error(),
        })?;
        let payload = expect_json(record, out)?;
        from_wire(json!({
            "contents": [{ "uri": request.uri, "mimeType": JSON_MIME, "text": payload.to_string() }]
        }))
    }

    async fn list_prompts(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        let prompts = self
            .registry
            .of_class(CapabilityClass::Prompt)
            .map(|r| from_wire::<Prompt>(prompt_wire(r)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ListPromptsResult::with_all_items(prompts))
    }

    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        tracing::debug!(prompt = %request.name, "prompts/get");
        let record = self
            .registry
            .find(CapabilityClass::Prompt, &request.name)
            .ok_or_else(|| McpError::invalid_params(format!("unknown prompt: {}", request.name), None))?;
        let args = request.arguments.unwrap_or_default();
        match record.invoke(&args).await? {
            CapabilityOutput::Messages(messages) => from_wire(json!({
                "description": record.description,
                "messages": messages,
            })),
            CapabilityOutput::Json(_) => Err(McpError::internal_error(
                format!("prompt '{}' did not produce messages", record.name),
                None,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::solvedac::SolvedAcClient;
    use crate::infra::config::RemoteSettings;
    use crate::infra::runtime::lifecycle::RemoteClientHandle;
    use crate::tools::solvedac::{build_registry, SEARCH_PROBLEMS_TOOL};

    fn svc() -> SolvedAcSvc {
        let handle = RemoteClientHandle::new(RemoteSettings::default());
        SolvedAcSvc::new(Arc::new(build_registry(SolvedAcClient::new(handle))))
    }

    #[test]
    fn advertises_tools_resources_and_prompts() {
        let info = svc().get_info();
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
        assert!(info.capabilities.prompts.is_some());
    }

    #[test]
    fn tool_descriptors_convert() {
        let svc = svc();
        let rec = svc.registry().find(CapabilityClass::Tool, SEARCH_PROBLEMS_TOOL).unwrap();
        let tool: Tool = from_wire(tool_wire(rec)).unwrap();
        assert_eq!(tool.name, SEARCH_PROBLEMS_TOOL);
        assert_eq!(tool.input_schema["required"], json!(["query"]));
    }

    #[test]
    fn prompt_descriptors_convert() {
        let svc = svc();
        let rec = svc
            .registry()
            .find(CapabilityClass::Prompt, crate::prompts::search_workflow::SEARCH_WORKFLOW_PROMPT)
            .unwrap();
        let wire = prompt_wire(rec);
        assert_eq!(wire["arguments"][0]["name"], "natural_request");
        assert_eq!(wire["arguments"][0]["required"], true);
        assert_eq!(wire["arguments"][1]["required"], false);
        let prompt: Prompt = from_wire(wire).unwrap();
        assert_eq!(prompt.name, "solvedac.search-workflow");
    }

    #[test]
    fn factory_shares_one_registry() {
        let svc = svc();
        let factory = make_factory(svc.registry.clone());
        let a = factory();
        let b = factory();
        assert!(Arc::ptr_eq(&a.registry, &b.registry));
    }
}
