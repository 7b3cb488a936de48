//! solved.ac capabilities: two tools, two resource templates, the search
//! workflow prompt and the `defaults` context.

use serde::Serialize;
use serde_json::json;

use crate::clients::solvedac::SolvedAcClient;
use crate::core::capability::{
    arg_str, arg_u32, CapabilityKind, CapabilityOutput, CapabilityRecord, FnHandler, ParamSpec,
};
use crate::core::error::{Result, SolvedAcError};
use crate::infra::config::DEFAULT_LANGUAGE;
use crate::prompts::search_workflow::{build_search_workflow, SEARCH_WORKFLOW_PROMPT};
use crate::tools::registry::CapabilityRegistry;

pub const GET_USER_INFO_TOOL: &str = "solvedac_get_user_info";
pub const SEARCH_PROBLEMS_TOOL: &str = "solvedac_search_problems";
pub const USER_RESOURCE: &str = "solvedac://users/{handle}";
pub const SEARCH_RESOURCE: &str = "solvedac://problems/search/{stub}";
pub const DEFAULTS_CONTEXT: &str = "solvedac://context/defaults";

fn json_output<T: Serialize>(value: &T) -> Result<CapabilityOutput> {
    serde_json::to_value(value)
        .map(CapabilityOutput::Json)
        .map_err(|source| SolvedAcError::InvalidResponseShape { endpoint: "capability output", source })
}

fn handle_param() -> ParamSpec {
    ParamSpec::non_empty_string("handle", "solved.ac user handle")
}

fn query_param() -> ParamSpec {
    ParamSpec::string("query", "solved.ac search query, e.g. 'tier:g5..p5 tag:dfs'")
}

fn page_param(description: &'static str) -> ParamSpec {
    ParamSpec::integer("page", description, 1).with_default(json!(1))
}

fn user_handler(client: SolvedAcClient) -> FnHandler {
    FnHandler::new(move |args| {
        let client = client.clone();
        async move {
            let handle = arg_str(&args, "handle")?;
            let user = client.fetch_user(handle).await?;
            json_output(&user)
        }
    })
}

fn search_handler(client: SolvedAcClient) -> FnHandler {
    FnHandler::new(move |args| {
        let client = client.clone();
        async move {
            let query = arg_str(&args, "query")?;
            let page = arg_u32(&args, "page")?;
            let result = client.search_problems(query, page).await?;
            json_output(&result)
        }
    })
}

/// Register every solved.ac capability backed by `client`.
pub fn register_solvedac(registry: &mut CapabilityRegistry, client: SolvedAcClient) {
    registry.register(CapabilityRecord::new(
        CapabilityKind::Tool,
        GET_USER_INFO_TOOL,
        "Look up a solved.ac user's rating, tier and solved problem count",
        vec![handle_param()],
        user_handler(client.clone()),
    ));

    registry.register(CapabilityRecord::new(
        CapabilityKind::Tool,
        SEARCH_PROBLEMS_TOOL,
        "Search solved.ac problems by difficulty/tag/keyword query (e.g. tier:g5..p5 tag:dfs)",
        vec![query_param(), page_param("page number, starting at 1")],
        search_handler(client.clone()),
    ));

    registry.register(CapabilityRecord::new(
        CapabilityKind::ResourceTemplate { uri_template: USER_RESOURCE },
        "solvedac-user",
        "Basic information (rating, tier, solved count) of a solved.ac user",
        vec![handle_param()],
        user_handler(client.clone()),
    ));

    registry.register(CapabilityRecord::new(
        CapabilityKind::ResourceTemplate { uri_template: SEARCH_RESOURCE },
        "solvedac-problem-search",
        "Search solved.ac problems; pass ?query=...&page=... (e.g. query='tier:s5..g5 tag:dp'). \
         The path segment is a placeholder and is ignored.",
        vec![
            ParamSpec::string("stub", "placeholder path segment, ignored").with_default(json!("_")),
            query_param(),
            page_param("page number, starting at 1"),
        ],
        search_handler(client),
    ));

    registry.register(CapabilityRecord::new(
        CapabilityKind::Prompt,
        SEARCH_WORKFLOW_PROMPT,
        "Turn a natural-language request into a solved.ac search query and review the \
         matching problems [solvedac, search]",
        vec![
            ParamSpec::string(
                "natural_request",
                "e.g. '실버~골드 사이 DP 5문제, 비슷한 태그는 제외'",
            ),
            page_param("search page"),
        ],
        FnHandler::new(|args| async move {
            let request = arg_str(&args, "natural_request")?;
            let page = arg_u32(&args, "page")?;
            Ok(CapabilityOutput::Messages(build_search_workflow(request, page).to_vec()))
        }),
    ));

    registry.register(CapabilityRecord::new(
        CapabilityKind::Context { uri: DEFAULTS_CONTEXT },
        "defaults",
        "Default parameters",
        vec![],
        FnHandler::new(|_| async { Ok(CapabilityOutput::Json(json!({ "lang": DEFAULT_LANGUAGE }))) }),
    ));
}

pub fn build_registry(client: SolvedAcClient) -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    register_solvedac(&mut registry, client);
    registry
}
