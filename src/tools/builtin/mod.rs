//! Built-in action executors.

pub mod email;
pub mod report;
pub mod scrape;
pub mod summarize;

pub use email::EmailDraftTool;
pub use report::ReportTool;
pub use scrape::ScrapeTool;
pub use summarize::SummarizeTool;
