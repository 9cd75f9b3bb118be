//! Session orchestration.
//!
//! [`App`] owns the conversation state and sequences the single-request
//! lifecycle: an accepted submission appends the user turn, clears the
//! draft, raises the busy guard, and produces the parameters for exactly
//! one outbound request. The matching [`GatewayEvent`] appends the bot-side
//! turn, updates the gateway tracker, and releases the guard. The app is
//! plain mutable state with explicit update functions; the event loop owns
//! the actual spawning and timers.

use std::time::Duration;

use crate::core::gateway::GatewayTracker;
use crate::core::message::Message;
use crate::core::request::{GatewayEvent, RequestParams};
use crate::core::session::SessionInputState;
use crate::core::transcript::Transcript;

/// How long the gateway panel stays highlighted after its contents change.
pub const HIGHLIGHT_DURATION: Duration = Duration::from_millis(1500);

/// Connection parameters shared by every request in the session.
pub struct SessionContext {
    pub client: reqwest::Client,
    pub endpoint: String,
    pub access_token: Option<String>,
}

/// Transient emphasis on the gateway panel. Each pulse bumps the generation;
/// an elapsed timer only clears the highlight it belongs to, so a revert
/// scheduled by an older change can never extinguish a newer one.
#[derive(Debug, Default)]
pub struct HighlightState {
    active: bool,
    generation: u64,
}

impl HighlightState {
    pub fn is_active(&self) -> bool {
        self.active
    }

    fn pulse(&mut self) -> u64 {
        self.generation += 1;
        self.active = true;
        self.generation
    }

    fn expire(&mut self, generation: u64) {
        if generation == self.generation {
            self.active = false;
        }
    }
}

/// Instruction to the event loop: schedule a revert timer for this pulse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightPulse {
    pub generation: u64,
    pub duration: Duration,
}

pub struct App {
    pub transcript: Transcript,
    pub gateway: GatewayTracker,
    pub input: SessionInputState,
    pub highlight: HighlightState,
    session: SessionContext,
    next_request_id: u64,
    in_flight: Option<u64>,
}

impl App {
    pub fn new(session: SessionContext, username: String) -> Self {
        Self {
            transcript: Transcript::new(),
            gateway: GatewayTracker::new(),
            input: SessionInputState::new(username),
            highlight: HighlightState::default(),
            session,
            next_request_id: 1,
            in_flight: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.session.endpoint
    }

    pub fn can_submit(&self) -> bool {
        self.input.can_submit()
    }

    /// Accept the current draft. Returns the parameters for the one outbound
    /// request, or `None` when the gate rejects the submission (the
    /// transcript is untouched in that case).
    ///
    /// On acceptance, the user turn is appended and the draft cleared before
    /// the request parameters are handed out, so the input field reflects
    /// "ready for the next entry" regardless of when the request settles.
    pub fn submit(&mut self) -> Option<RequestParams> {
        let prompt = self.input.draft.trim().to_string();
        if prompt.is_empty() {
            return None;
        }
        let username = self.input.username.trim().to_string();
        if username.is_empty() || self.input.busy {
            return None;
        }

        self.transcript.push(Message::user(prompt.clone()));
        self.input.draft.clear();
        self.input.busy = true;

        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.in_flight = Some(request_id);

        Some(RequestParams {
            client: self.session.client.clone(),
            endpoint: self.session.endpoint.clone(),
            access_token: self.session.access_token.clone(),
            prompt,
            username,
            request_id,
        })
    }

    /// Fold a request outcome back into the session. Events whose id is not
    /// the current in-flight request are dropped; a completion that arrives
    /// after the session moved on must not touch anything.
    ///
    /// Exactly one bot-side entry is appended per accepted submission, and
    /// the busy guard is released on every outcome. The returned pulse, when
    /// present, tells the caller to schedule a highlight revert timer.
    pub fn on_gateway_event(
        &mut self,
        event: GatewayEvent,
        request_id: u64,
    ) -> Option<HighlightPulse> {
        if self.in_flight != Some(request_id) {
            return None;
        }
        self.in_flight = None;

        let pulse = match event {
            GatewayEvent::Completed {
                reply,
                model,
                provider,
            } => {
                let changed = self.gateway.update(model, provider);
                let pulse = changed.then(|| HighlightPulse {
                    generation: self.highlight.pulse(),
                    duration: HIGHLIGHT_DURATION,
                });
                match reply {
                    Some(text) => self.transcript.push(Message::bot(text)),
                    None => self.transcript.push(Message::empty_reply()),
                }
                pulse
            }
            GatewayEvent::Failed { .. } => {
                self.transcript.push(Message::transport_error());
                None
            }
        };

        self.input.busy = false;
        pulse
    }

    /// Clear the highlight if this timer belongs to the latest pulse.
    pub fn on_highlight_elapsed(&mut self, generation: u64) {
        self.highlight.expire(generation);
    }

    /// Escape: discard the draft without touching transcript or gateway
    /// state.
    pub fn cancel_draft(&mut self) {
        self.input.draft.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::{EMPTY_REPLY_TEXT, TRANSPORT_ERROR_TEXT};

    fn test_app(username: &str) -> App {
        let session = SessionContext {
            client: reqwest::Client::new(),
            endpoint: "http://localhost/".to_string(),
            access_token: None,
        };
        App::new(session, username.to_string())
    }

    fn completed(reply: &str, model: &str, provider: &str) -> GatewayEvent {
        GatewayEvent::Completed {
            reply: Some(reply.to_string()),
            model: Some(model.to_string()),
            provider: Some(provider.to_string()),
        }
    }

    fn failed() -> GatewayEvent {
        GatewayEvent::Failed {
            detail: "connection refused".to_string(),
        }
    }

    #[test]
    fn successful_exchange_updates_transcript_and_gateway() {
        let mut app = test_app("alice");
        app.input.draft = "hello".to_string();

        let params = app.submit().expect("gate permits submission");
        assert_eq!(params.prompt, "hello");
        assert_eq!(params.username, "alice");
        assert!(app.input.busy);
        assert!(app.input.draft.is_empty());

        let pulse = app.on_gateway_event(completed("hi there", "m1", "p1"), params.request_id);

        let texts: Vec<&str> = app.transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["hello", "hi there"]);
        assert_eq!(app.gateway.info().model.as_deref(), Some("m1"));
        assert_eq!(app.gateway.info().provider.as_deref(), Some("p1"));
        assert!(!app.input.busy);

        let pulse = pulse.expect("metadata change pulses the highlight");
        assert!(app.highlight.is_active());
        app.on_highlight_elapsed(pulse.generation);
        assert!(!app.highlight.is_active());
    }

    #[test]
    fn failed_exchange_records_error_and_releases_busy() {
        let mut app = test_app("alice");
        app.input.draft = "hello".to_string();

        let params = app.submit().unwrap();
        let pulse = app.on_gateway_event(failed(), params.request_id);

        let texts: Vec<&str> = app.transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["hello", TRANSPORT_ERROR_TEXT]);
        assert!(app.transcript.all()[1].is_error());
        assert!(!app.gateway.info().is_known());
        assert!(!app.input.busy);
        assert!(pulse.is_none());
    }

    #[test]
    fn empty_username_rejects_without_transcript_mutation() {
        let mut app = test_app("  ");
        app.input.draft = "hello".to_string();

        assert!(app.submit().is_none());
        assert!(app.transcript.is_empty());
        assert!(!app.input.busy);
    }

    #[test]
    fn whitespace_draft_is_a_no_op() {
        let mut app = test_app("alice");
        app.input.draft = "   ".to_string();

        assert!(app.submit().is_none());
        assert!(app.transcript.is_empty());
    }

    #[test]
    fn busy_session_rejects_a_second_submission() {
        let mut app = test_app("alice");
        app.input.draft = "first".to_string();
        let params = app.submit().unwrap();

        app.input.draft = "second".to_string();
        assert!(!app.can_submit());
        assert!(app.submit().is_none());
        assert_eq!(app.transcript.len(), 1);

        app.on_gateway_event(completed("ok", "m1", "p1"), params.request_id);
        assert!(app.can_submit());
    }

    #[test]
    fn empty_reply_surfaces_as_placeholder_not_error() {
        let mut app = test_app("alice");
        app.input.draft = "hello".to_string();
        let params = app.submit().unwrap();

        app.on_gateway_event(
            GatewayEvent::Completed {
                reply: None,
                model: Some("m1".to_string()),
                provider: Some("p1".to_string()),
            },
            params.request_id,
        );

        let bot = &app.transcript.all()[1];
        assert_eq!(bot.text, EMPTY_REPLY_TEXT);
        assert!(!bot.is_error());
        assert!(!app.input.busy);
    }

    #[test]
    fn transcript_alternates_across_mixed_outcomes() {
        let mut app = test_app("alice");
        let outcomes = [
            completed("one", "m1", "p1"),
            failed(),
            GatewayEvent::Completed {
                reply: None,
                model: Some("m1".to_string()),
                provider: Some("p1".to_string()),
            },
            completed("four", "m2", "p1"),
        ];

        for (i, outcome) in outcomes.into_iter().enumerate() {
            app.input.draft = format!("message {i}");
            let params = app.submit().expect("idle session accepts submission");
            app.on_gateway_event(outcome, params.request_id);
        }

        assert_eq!(app.transcript.len(), 8);
        for (i, message) in app.transcript.iter().enumerate() {
            assert_eq!(
                message.is_user(),
                i % 2 == 0,
                "entry {i} breaks the user/bot alternation"
            );
        }
        assert!(!app.input.busy);
    }

    #[test]
    fn stale_completion_after_newer_submission_is_dropped() {
        let mut app = test_app("alice");
        app.input.draft = "first".to_string();
        let first = app.submit().unwrap();

        // The first request resolves; a duplicate event for it must then be
        // ignored even though the session is idle again.
        app.on_gateway_event(completed("one", "m1", "p1"), first.request_id);
        assert!(app
            .on_gateway_event(completed("dup", "mX", "pX"), first.request_id)
            .is_none());
        assert_eq!(app.transcript.len(), 2);
        assert_eq!(app.gateway.info().model.as_deref(), Some("m1"));
    }

    #[test]
    fn unchanged_metadata_does_not_pulse() {
        let mut app = test_app("alice");
        app.input.draft = "one".to_string();
        let first = app.submit().unwrap();
        assert!(app
            .on_gateway_event(completed("a", "m1", "p1"), first.request_id)
            .is_some());

        app.input.draft = "two".to_string();
        let second = app.submit().unwrap();
        assert!(app
            .on_gateway_event(completed("b", "m1", "p1"), second.request_id)
            .is_none());
    }

    #[test]
    fn stale_highlight_timer_cannot_clear_a_newer_pulse() {
        let mut app = test_app("alice");

        app.input.draft = "one".to_string();
        let first = app.submit().unwrap();
        let old_pulse = app
            .on_gateway_event(completed("a", "m1", "p1"), first.request_id)
            .unwrap();

        app.input.draft = "two".to_string();
        let second = app.submit().unwrap();
        let new_pulse = app
            .on_gateway_event(completed("b", "m2", "p1"), second.request_id)
            .unwrap();

        // The revert belonging to the first pulse fires late.
        app.on_highlight_elapsed(old_pulse.generation);
        assert!(app.highlight.is_active());

        app.on_highlight_elapsed(new_pulse.generation);
        assert!(!app.highlight.is_active());
    }

    #[test]
    fn cancel_draft_only_touches_the_draft() {
        let mut app = test_app("alice");
        app.input.draft = "typed but regretted".to_string();
        app.cancel_draft();
        assert!(app.input.draft.is_empty());
        assert!(app.transcript.is_empty());
        assert!(!app.gateway.info().is_known());
    }

    #[test]
    fn submission_trims_prompt_and_username() {
        let mut app = test_app(" alice ");
        app.input.draft = "  hello  ".to_string();
        let params = app.submit().unwrap();
        assert_eq!(params.prompt, "hello");
        assert_eq!(params.username, "alice");
        assert_eq!(app.transcript.all()[0].text, "hello");
    }
}
