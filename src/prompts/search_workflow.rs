use crate::domain::{PromptMessage, PromptRole};

pub const SEARCH_WORKFLOW_PROMPT: &str = "solvedac.search-workflow";

const ASSISTANT_INSTRUCTIONS: &str = "You are a Solved.ac search assistant.\n\
1) Convert the user's request into a precise Solved.ac query string \
(e.g., `tier:g5..p5 tag:dfs -tag:greedy`).\n\
2) Do NOT browse the web.\n\
3) Call the MCP TOOL `solvedac_search_problems` with {query, page}.\n\
4) Rank the top 5 results by suitability and show: problemId, titleKo, level.";

/// Seed messages turning a natural-language request into a problem search.
/// Pure and deterministic: identical inputs give byte-identical output.
pub fn build_search_workflow(natural_request: &str, page: u32) -> [PromptMessage; 2] {
    let user = format!(
        "요청(자연어): {natural_request}\n\
         페이지: {page}\n\
         규칙: 쿼리를 먼저 제시하고, 이어서 리소스를 호출해 결과를 평가하세요."
    );
    [
        PromptMessage::text(PromptRole::Assistant, ASSISTANT_INSTRUCTIONS),
        PromptMessage::text(PromptRole::User, user),
    ]
}
