//! The visible conversation log.
//!
//! Renderers only ever append. Text is shown as plain text: no markup is
//! interpreted and terminal control characters are neutralised.

use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::api::Message;

/// Sink for transcript entries, shared by every orchestrator of a session.
///
/// `append` cannot fail; rendering problems are logged and swallowed.
pub trait TranscriptRenderer: Send + Sync {
    fn append(&self, message: Message);
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory append-only transcript.
#[derive(Default)]
pub struct Transcript {
    entries: Mutex<Vec<Message>>,
    scroll_position: Mutex<Option<usize>>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all entries in arrival order
    pub fn messages(&self) -> Vec<Message> {
        lock(&self.entries).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the entry currently scrolled into view (always the newest).
    pub fn scroll_position(&self) -> Option<usize> {
        *lock(&self.scroll_position)
    }
}

impl TranscriptRenderer for Transcript {
    fn append(&self, message: Message) {
        let mut entries = lock(&self.entries);
        entries.push(message);
        *lock(&self.scroll_position) = Some(entries.len() - 1);
    }
}

/// Replace control characters (escape sequences included) so that server or
/// user supplied text cannot drive the terminal. CRLF line endings count as
/// plain newlines.
pub fn plain_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .map(|c| if c.is_control() && c != '\n' && c != '\t' { '\u{FFFD}' } else { c })
        .collect()
}

/// Format one entry the way the terminal shows it.
pub fn format_entry(message: &Message) -> String {
    let mut out = format!("{}\n", message.role().as_str().to_uppercase());
    for line in plain_text(message.text()).lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    for citation in message.citation_lines() {
        out.push_str("    - ");
        out.push_str(&plain_text(&citation).replace('\n', " "));
        out.push('\n');
    }
    out
}

/// Writes entries to a terminal (or any writer), flushing after each one so the
/// newest entry is always on screen.
pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        TerminalRenderer { out: Mutex::new(out) }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> TranscriptRenderer for TerminalRenderer<W> {
    fn append(&self, message: Message) {
        let mut out = lock(&self.out);
        let written = out
            .write_all(format_entry(&message).as_bytes())
            .and_then(|_| out.flush());
        if let Err(e) = written {
            tracing::warn!("Failed to render transcript entry: {}", e);
        }
    }
}
