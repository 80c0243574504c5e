//! Agent module: request routing, the conversation session, and the agent loop.

pub mod action;
mod agent_loop;
pub mod router;
pub mod rules;
pub mod session;
pub mod submission;

pub use action::Action;
pub use agent_loop::{Agent, truncate_for_preview};
pub use router::{Classification, NoopObserver, RouteObserver, RouteOutcome, RouteSource, Router};
pub use rules::RulesEngine;
pub use session::{Conversation, PendingState, PendingTurn, Role, Session, Theme, Turn};
pub use submission::{Submission, SubmissionParser};
