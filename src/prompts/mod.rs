//! Scripted conversation seeds offered to the host as MCP prompts.

pub mod search_workflow;

pub use search_workflow::build_search_workflow;
