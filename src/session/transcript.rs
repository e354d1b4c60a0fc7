/// Accumulated transcript text shown to the user.
///
/// Doubles as the status area: connecting and error states overwrite the
/// whole text, stop/close append a marker line. Fragments are trimmed and
/// whitespace-only ones are dropped before they reach the text.
#[derive(Debug, Clone, Default)]
pub struct TranscriptLog {
    text: String,
}

impl TranscriptLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment followed by a line break. Whitespace-only
    /// fragments are a no-op.
    pub fn append(&mut self, fragment: &str) {
        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            return;
        }

        self.text.push_str(trimmed);
        self.text.push('\n');
    }

    /// Append a status marker on its own line (stop/close notices).
    pub fn append_marker(&mut self, marker: &str) {
        self.text.push('\n');
        self.text.push_str(marker);
    }

    /// Replace the whole area with a status line (connecting/error states).
    pub fn overwrite(&mut self, status: &str) {
        self.text.clear();
        self.text.push_str(status);
    }

    /// Read-only snapshot for the rendering collaborator.
    pub fn current_text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_fragments_are_noops() {
        let mut log = TranscriptLog::new();
        log.append("");
        log.append("   ");
        log.append("\t\n");
        assert!(log.is_empty());
    }

    #[test]
    fn fragments_land_one_per_line() {
        let mut log = TranscriptLog::new();
        log.append("hello");
        log.append("world");
        assert_eq!(log.current_text(), "hello\nworld\n");
    }

    #[test]
    fn fragments_are_trimmed() {
        let mut log = TranscriptLog::new();
        log.append("  hello  ");
        assert_eq!(log.current_text(), "hello\n");
    }

    #[test]
    fn overwrite_replaces_everything() {
        let mut log = TranscriptLog::new();
        log.append("hello");
        log.overwrite("Error connecting to server.");
        assert_eq!(log.current_text(), "Error connecting to server.");
    }

    #[test]
    fn markers_start_on_their_own_line() {
        let mut log = TranscriptLog::new();
        log.append("hello");
        log.append_marker("Connection closed.");
        assert_eq!(log.current_text(), "hello\n\nConnection closed.");
    }
}
