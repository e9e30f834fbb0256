//! Comment thread folding.
//!
//! The repository side stores a note as a flat list of messages. The web
//! application shows it as one comment with replies: the first message is
//! the comment, later messages with text are replies, and the note's state
//! is whatever the last message set it to.

use lexsync_fixture::{CanonicalNode, attrs};

/// Status the web application shows for an unset status.
pub const OPEN: &str = "open";

/// One message of a thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadMessage {
    pub status: Option<String>,
    pub content: String,
}

impl ThreadMessage {
    pub fn new(status: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            status: status.map(str::to_string),
            content: content.into(),
        }
    }

    /// Read a `message` node of the canonical tree.
    pub fn from_node(node: &CanonicalNode) -> Self {
        Self {
            status: node.attribute(attrs::STATUS).map(str::to_string),
            content: node.value(),
        }
    }
}

/// A thread as the web application displays it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadFold {
    pub content: String,
    pub final_status: Option<String>,
    pub reply_contents: Vec<String>,
}

/// An empty status means open.
pub fn normalize_status(status: &str) -> &str {
    if status.is_empty() { OPEN } else { status }
}

/// Fold a message list into comment, current status and replies.
///
/// Messages without text after the first are status changes, not replies.
/// The status is the one on the last message that carries a status at all;
/// a thread where no message carries one has no expected status.
pub fn fold_thread(messages: &[ThreadMessage]) -> Option<ThreadFold> {
    let (head, rest) = messages.split_first()?;
    Some(ThreadFold {
        content: head.content.clone(),
        final_status: messages
            .iter()
            .rev()
            .find_map(|message| message.status.as_deref())
            .map(|status| normalize_status(status).to_string()),
        reply_contents: rest
            .iter()
            .filter(|message| !message.content.is_empty())
            .map(|message| message.content.clone())
            .collect(),
    })
}
