//! Session input state and the submission gate.

/// The text fields the user edits plus the single-request guard.
#[derive(Debug, Default)]
pub struct SessionInputState {
    pub username: String,
    pub draft: String,
    /// True strictly between request issuance and its resolution. This is
    /// the sole concurrency guard; no locks or queues exist.
    pub busy: bool,
}

impl SessionInputState {
    pub fn new(username: String) -> Self {
        Self {
            username,
            draft: String::new(),
            busy: false,
        }
    }

    pub fn can_submit(&self) -> bool {
        can_submit(&self.username, &self.draft, self.busy)
    }
}

/// The submission gate: true iff the trimmed username and trimmed draft are
/// both non-empty and no request is in flight. Pure; recomputed on every
/// keystroke to drive the submit control's enabled state.
pub fn can_submit(username: &str, draft: &str, busy: bool) -> bool {
    !username.trim().is_empty() && !draft.trim().is_empty() && !busy
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gate_requires_both_fields_and_idle() {
        assert!(can_submit("alice", "hello", false));
        assert!(!can_submit("", "hello", false));
        assert!(!can_submit("alice", "", false));
        assert!(!can_submit("alice", "hello", true));
    }

    #[test]
    fn whitespace_only_fields_count_as_empty() {
        assert!(!can_submit("  ", "hello", false));
        assert!(!can_submit("alice", " \t ", false));
    }

    #[test]
    fn busy_rejects_regardless_of_field_contents() {
        assert!(!can_submit("alice", "hello", true));
        assert!(!can_submit("", "", true));
    }

    #[test]
    fn state_delegates_to_the_gate() {
        let mut state = SessionInputState::new("alice".to_string());
        assert!(!state.can_submit());
        state.draft = "hello".to_string();
        assert!(state.can_submit());
        state.busy = true;
        assert!(!state.can_submit());
    }
}
