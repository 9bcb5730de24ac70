use crate::markup::{render_markup, render_plain};

/// Markup shown in an assistant bubble until the first stream event arrives
pub const PLACEHOLDER_HTML: &str = r#"<span class="blinking-cursor">...</span>"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Lifecycle of one bubble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Waiting for the first stream event
    Placeholder,
    Streaming,
    Complete,
    /// The stream failed; `main_text` holds the error message
    Failed,
}

/// One bubble of the chat view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub role: Role,
    pub main_text: String,
    pub status_log: Vec<String>,
    pub state: EntryState,
}

impl ChatEntry {
    fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            main_text: text.to_string(),
            status_log: Vec::new(),
            state: EntryState::Complete,
        }
    }

    fn assistant_placeholder() -> Self {
        Self {
            role: Role::Assistant,
            main_text: String::new(),
            status_log: Vec::new(),
            state: EntryState::Placeholder,
        }
    }

    /// HTML for the main text area of this bubble
    pub fn main_html(&self) -> String {
        match (self.role, self.state) {
            (_, EntryState::Placeholder) => PLACEHOLDER_HTML.to_string(),
            (Role::User, _) | (_, EntryState::Failed) => render_plain(&self.main_text),
            (Role::Assistant, _) => render_markup(&self.main_text),
        }
    }
}

/// Ordered, append-only list of bubbles
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    entries: Vec<ChatEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, text: &str) -> usize {
        self.entries.push(ChatEntry::user(text));
        self.entries.len() - 1
    }

    pub fn push_assistant_placeholder(&mut self) -> usize {
        self.entries.push(ChatEntry::assistant_placeholder());
        self.entries.len() - 1
    }

    pub fn get(&self, index: usize) -> Option<&ChatEntry> {
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut ChatEntry> {
        self.entries.get_mut(index)
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_html() {
        let mut transcript = Transcript::new();
        let index = transcript.push_assistant_placeholder();
        assert_eq!(transcript.get(index).unwrap().main_html(), PLACEHOLDER_HTML);
    }

    #[test]
    fn test_user_text_is_never_rendered_as_markup() {
        let mut transcript = Transcript::new();
        transcript.push_user("**not bold** <i>");
        assert_eq!(
            transcript.last().unwrap().main_html(),
            "**not bold** &lt;i&gt;"
        );
    }
}
