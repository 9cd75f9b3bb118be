/// Marker prefixed to the bot-side entry recorded for a failed exchange.
pub const ERROR_MARKER: &str = "❌ Error:";

/// Text recorded when the request fails in transit or the body cannot be
/// decoded.
pub const TRANSPORT_ERROR_TEXT: &str = "❌ Error: Could not reach chatbot.";

/// Text recorded when the worker replies without a usable reply field.
pub const EMPTY_REPLY_TEXT: &str = "No response received.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sender {
    User,
    Bot,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
        }
    }

    pub fn is_user(self) -> bool {
        self == Sender::User
    }
}

/// One turn of the conversation. Immutable once appended to the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            sender,
            text: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text)
    }

    /// Bot-side placeholder for a parseable response with no reply text.
    pub fn empty_reply() -> Self {
        Self::bot(EMPTY_REPLY_TEXT)
    }

    /// Bot-side entry recording a failed exchange.
    pub fn transport_error() -> Self {
        Self::bot(TRANSPORT_ERROR_TEXT)
    }

    pub fn is_user(&self) -> bool {
        self.sender.is_user()
    }

    pub fn is_error(&self) -> bool {
        self.sender == Sender::Bot && self.text.starts_with(ERROR_MARKER)
    }
}
