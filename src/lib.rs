pub mod cli;
pub mod clients;
pub mod core;
pub mod domain;
pub mod infra;
pub mod prompts;
pub mod tools;
