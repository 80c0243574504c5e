//! AI Agent: routes free-form requests to summarize, report, scrape, email
//! and general-chat actions backed by an LLM.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod tools;
