//! Wire-level shapes of the solved.ac entities this gateway hands to agents.
//!
//! Parsing is explicit per field: required fields must be present with the
//! right JSON type, `titleKo` defaults to `None`, and any other field the
//! remote adds is never read.

use serde::{Deserialize, Serialize};

/// Snapshot of `GET /user/show`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub handle: String,
    pub tier: i64,
    pub rating: i64,
    pub solved_count: i64,
}

/// One row of a problem search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    pub problem_id: i64,
    #[serde(default)]
    pub title_ko: Option<String>,
    pub level: i64,
    pub is_solvable: bool,
}

/// Body of `GET /search/problem`. `count` is the total number of matches,
/// not the size of this page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemSearchResult {
    pub count: i64,
    pub items: Vec<Problem>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    Assistant,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptContent {
    Text { text: String },
}

/// A single seeded conversation turn, serialized exactly as MCP expects:
/// `{"role": "...", "content": {"type": "text", "text": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,
    pub content: PromptContent,
}

impl PromptMessage {
    pub fn text(role: PromptRole, text: impl Into<String>) -> Self {
        Self {
            role,
            content: PromptContent::Text { text: text.into() },
        }
    }

    pub fn text_content(&self) -> &str {
        match &self.content {
            PromptContent::Text { text } => text,
        }
    }
}
