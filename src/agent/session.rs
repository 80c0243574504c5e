//! Conversation session: the turn log, the pending flag and the theme.
//!
//! A session moves between two states:
//!
//! ```text
//! Idle ──begin_turn──▶ AwaitingResponse ──finish_turn(Ok | Err)──▶ Idle
//! ```
//!
//! Every `begin_turn` hands out a `PendingTurn` token, and `finish_turn`
//! consumes it on both success and failure. `submit` also resolves the turn
//! when its future is dropped mid-request (a timeout, a cancelled task), so a
//! session driven through `submit` always returns to `Idle`. Callers pairing
//! `begin_turn`/`finish_turn` by hand must finish every token themselves.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::agent::router::{NoopObserver, RouteObserver, RouteOutcome, Router};
use crate::error::SessionError;

/// Author of a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Turn {
    id: Uuid,
    role: Role,
    content: String,
    created_at: DateTime<Utc>,
}

impl Turn {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only, chronologically ordered turn log.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conversation {
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&mut self, turn: Turn) -> &Turn {
        self.turns.push(turn);
        &self.turns[self.turns.len() - 1]
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }
}

/// Whether a request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Idle,
    /// Waiting on the response to the user turn with this id.
    AwaitingResponse { turn_id: Uuid },
}

impl PendingState {
    /// Check if this state allows transitioning to another state.
    pub fn can_transition_to(&self, target: PendingState) -> bool {
        matches!(
            (self, target),
            (Self::Idle, Self::AwaitingResponse { .. }) | (Self::AwaitingResponse { .. }, Self::Idle)
        )
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for PendingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::AwaitingResponse { .. } => write!(f, "awaiting_response"),
        }
    }
}

/// Presentation theme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggle(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("expected 'light' or 'dark', got '{other}'")),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Dark => write!(f, "dark"),
        }
    }
}

/// Proof that a request is in flight. Consumed by [`Session::finish_turn`].
#[derive(Debug)]
#[must_use = "a pending turn must be finished or the session stays busy"]
pub struct PendingTurn {
    turn_id: Uuid,
    request: String,
}

impl PendingTurn {
    pub fn turn_id(&self) -> Uuid {
        self.turn_id
    }

    /// The trimmed user input.
    pub fn request(&self) -> &str {
        &self.request
    }
}

/// A single user's conversation and presentation state.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    conversation: Conversation,
    state: PendingState,
    theme: Theme,
    last_error: Option<String>,
}

impl Session {
    pub fn new(theme: Theme) -> Self {
        Self {
            id: Uuid::new_v4(),
            conversation: Conversation::new(),
            state: PendingState::Idle,
            theme,
            last_error: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn state(&self) -> PendingState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        !self.state.is_idle()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Flip the theme and return the new one.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggle();
        self.theme
    }

    /// Message of the most recent failed request, cleared when the next one begins.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Record the user turn and enter `AwaitingResponse`.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    pub fn begin_turn(&mut self, input: &str) -> Result<Option<PendingTurn>, SessionError> {
        let request = input.trim();
        if request.is_empty() {
            return Ok(None);
        }
        if !self.state.is_idle() {
            return Err(SessionError::Busy);
        }

        let turn_id = self.conversation.append(Turn::new(Role::User, request)).id();
        self.transition(PendingState::AwaitingResponse { turn_id });
        self.last_error = None;

        Ok(Some(PendingTurn {
            turn_id,
            request: request.to_string(),
        }))
    }

    /// Resolve a pending turn. Success appends one assistant turn; failure
    /// records the error. Either way the session returns to `Idle`.
    pub fn finish_turn(
        &mut self,
        pending: PendingTurn,
        result: Result<String, String>,
    ) -> Result<(), SessionError> {
        match self.state {
            PendingState::AwaitingResponse { turn_id } if turn_id == pending.turn_id => {}
            _ => return Err(SessionError::UnknownTurn(pending.turn_id)),
        }

        match result {
            Ok(response) => {
                self.conversation
                    .append(Turn::new(Role::Assistant, response));
            }
            Err(error) => {
                self.last_error = Some(error);
            }
        }
        self.transition(PendingState::Idle);
        Ok(())
    }

    /// Route one user input through `router`, recording both turns.
    ///
    /// Returns `Ok(None)` for blank input. A routing failure is returned
    /// after the session is back to `Idle`.
    pub async fn submit(
        &mut self,
        router: &Router,
        input: &str,
    ) -> Result<Option<RouteOutcome>, SessionError> {
        self.submit_observed(router, input, &NoopObserver).await
    }

    /// `submit`, reporting routing progress to `observer`.
    pub async fn submit_observed(
        &mut self,
        router: &Router,
        input: &str,
        observer: &dyn RouteObserver,
    ) -> Result<Option<RouteOutcome>, SessionError> {
        let Some(pending) = self.begin_turn(input)? else {
            return Ok(None);
        };
        let request = pending.request().to_string();
        let in_flight = InFlight {
            session: self,
            pending: Some(pending),
        };

        match router.route_observed(&request, observer).await {
            Ok(outcome) => {
                in_flight.finish(Ok(outcome.response.clone()))?;
                Ok(Some(outcome))
            }
            Err(e) => {
                in_flight.finish(Err(e.to_string()))?;
                Err(e.into())
            }
        }
    }

    fn transition(&mut self, target: PendingState) {
        debug_assert!(self.state.can_transition_to(target));
        debug!(session = %self.id, from = %self.state, to = %target, "Session transition");
        self.state = target;
    }
}

/// Error recorded when a request is dropped before it resolves.
const CANCELLED: &str = "request cancelled before a response arrived";

/// A turn owned by `submit`. Dropping it unfinished resolves the turn as cancelled.
struct InFlight<'a> {
    session: &'a mut Session,
    pending: Option<PendingTurn>,
}

impl InFlight<'_> {
    fn finish(mut self, result: Result<String, String>) -> Result<(), SessionError> {
        match self.pending.take() {
            Some(pending) => self.session.finish_turn(pending, result),
            None => Ok(()),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            warn!(turn = %pending.turn_id, "Request dropped before a response arrived");
            let _ = self.session.finish_turn(pending, Err(CANCELLED.to_string()));
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::AgentConfig;
    use crate::llm::LlmProvider;
    use crate::llm::testing::{FailingLlm, RecordingLlm, StalledLlm};
    use crate::tools::ToolRegistry;

    fn router(llm: Arc<dyn LlmProvider>) -> Router {
        let config = AgentConfig::default();
        let tools = Arc::new(ToolRegistry::with_builtins(Arc::clone(&llm), &config).unwrap());
        Router::new(llm, tools, &config)
    }

    #[test]
    fn test_state_transitions() {
        let awaiting = PendingState::AwaitingResponse {
            turn_id: Uuid::new_v4(),
        };
        assert!(PendingState::Idle.can_transition_to(awaiting));
        assert!(awaiting.can_transition_to(PendingState::Idle));
        assert!(!PendingState::Idle.can_transition_to(PendingState::Idle));
        assert!(!awaiting.can_transition_to(awaiting));
    }

    #[test]
    fn theme_toggles_and_parses() {
        let mut session = Session::new(Theme::Light);
        assert_eq!(session.toggle_theme(), Theme::Dark);
        assert_eq!(session.toggle_theme(), Theme::Light);
        assert_eq!("DARK".parse::<Theme>(), Ok(Theme::Dark));
        assert!("blue".parse::<Theme>().is_err());
    }

    #[tokio::test]
    async fn submit_appends_user_then_assistant() {
        let llm = Arc::new(RecordingLlm::replying("Hi!"));
        let router = router(llm.clone());
        let mut session = Session::default();

        let outcome = session.submit(&router, "  hello  ").await.unwrap().unwrap();
        assert_eq!(outcome.response, "Hi!");

        let turns = session.conversation().turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role(), Role::User);
        assert_eq!(turns[0].content(), "hello");
        assert_eq!(turns[1].role(), Role::Assistant);
        assert_eq!(turns[1].content(), "Hi!");
        assert!(turns[0].created_at() <= turns[1].created_at());
        assert!(!session.is_pending());
    }

    #[tokio::test]
    async fn blank_input_is_ignored() {
        let llm = Arc::new(RecordingLlm::replying("unused"));
        let router = router(llm.clone());
        let mut session = Session::default();

        for input in ["", "   ", "\n\t"] {
            assert!(session.submit(&router, input).await.unwrap().is_none());
        }
        assert!(session.conversation().is_empty());
        assert_eq!(llm.call_count(), 0);
        assert!(session.state().is_idle());
    }

    #[tokio::test]
    async fn failure_returns_to_idle() {
        let router = router(Arc::new(FailingLlm));
        let mut session = Session::default();

        let err = session.submit(&router, "hello").await.unwrap_err();
        assert!(matches!(err, SessionError::Route(_)));
        assert!(session.state().is_idle());
        assert_eq!(session.conversation().len(), 1);
        assert!(session.last_error().unwrap().contains("backend unavailable"));

        // The next request is accepted.
        let err = session.submit(&router, "again").await.unwrap_err();
        assert!(matches!(err, SessionError::Route(_)));
        assert_eq!(session.conversation().len(), 2);
    }

    #[tokio::test]
    async fn dropped_submit_returns_to_idle() {
        let router = router(Arc::new(StalledLlm));
        let mut session = Session::default();

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            session.submit(&router, "hello"),
        )
        .await
        .is_err();
        assert!(timed_out);

        assert!(session.state().is_idle());
        assert_eq!(session.last_error(), Some(CANCELLED));
        assert_eq!(session.conversation().len(), 1);
        assert!(session.begin_turn("next").unwrap().is_some());
    }

    #[test]
    fn second_begin_while_awaiting_is_busy() {
        let mut session = Session::default();
        let pending = session.begin_turn("first").unwrap().unwrap();
        assert!(matches!(
            session.begin_turn("second"),
            Err(SessionError::Busy)
        ));
        assert_eq!(session.conversation().len(), 1);

        session.finish_turn(pending, Ok("done".into())).unwrap();
        assert!(session.begin_turn("second").unwrap().is_some());
    }

    #[test]
    fn finish_with_foreign_token_is_rejected() {
        let mut first = Session::default();
        let mut second = Session::default();
        let _mine = first.begin_turn("a").unwrap().unwrap();
        let foreign = second.begin_turn("b").unwrap().unwrap();

        assert!(matches!(
            first.finish_turn(foreign, Ok("x".into())),
            Err(SessionError::UnknownTurn(_))
        ));
        assert!(first.is_pending());
    }

    #[tokio::test]
    async fn sequential_submissions_stay_in_order() {
        let llm = Arc::new(RecordingLlm::echo());
        let router = router(llm);
        let mut session = Session::default();

        for input in ["one", "two", "three"] {
            session.submit(&router, input).await.unwrap();
        }

        let contents: Vec<&str> = session
            .conversation()
            .iter()
            .map(Turn::content)
            .collect();
        assert_eq!(contents, vec!["one", "one", "two", "two", "three", "three"]);
        let roles: Vec<Role> = session.conversation().iter().map(Turn::role).collect();
        assert_eq!(
            roles,
            vec![
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }
}
