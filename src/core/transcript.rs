use crate::core::message::Message;

/// Append-only log of exchanged messages, in chronological order.
///
/// A user entry is always pushed before its request goes out; the matching
/// bot-side entry (reply, placeholder, or error) is pushed when that request
/// resolves. Nothing is ever mutated or removed.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
