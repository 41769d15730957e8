//! Live transcript accumulation.
//!
//! Final segments are appended permanently; the interim segment is a
//! display-only guess overwritten by every new recognition result. The join
//! rule inserts exactly one separating space, and only when the accumulated
//! text does not already end in whitespace, so segments never run together
//! and spaces never double up.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBuffer {
    finalized: String,
    interim: String,
}

impl TranscriptBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a segment the recognition engine will not revise further.
    pub fn push_final(&mut self, segment: &str) {
        if segment.is_empty() {
            return;
        }
        if !self.finalized.is_empty() && !self.finalized.ends_with(char::is_whitespace) {
            self.finalized.push(' ');
        }
        self.finalized.push_str(segment);
        self.interim.clear();
    }

    /// Replace the transient interim segment.
    pub fn set_interim(&mut self, segment: &str) {
        self.interim.clear();
        self.interim.push_str(segment);
    }

    /// The committed transcript, without the interim guess.
    pub fn text(&self) -> &str {
        &self.finalized
    }

    /// What a live view shows: committed text plus the current guess.
    pub fn display(&self) -> String {
        if self.interim.is_empty() {
            return self.finalized.clone();
        }
        if self.finalized.is_empty() {
            return self.interim.clone();
        }
        if self.finalized.ends_with(char::is_whitespace) {
            format!("{}{}", self.finalized, self.interim)
        } else {
            format!("{} {}", self.finalized, self.interim)
        }
    }

    /// Discard the interim guess, leaving the editable seed value.
    pub fn freeze(&mut self) {
        self.interim.clear();
    }

    /// Overwrite the committed text (user edits after recording stops).
    pub fn replace(&mut self, text: &str) {
        self.finalized.clear();
        self.finalized.push_str(text);
        self.interim.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.finalized.is_empty() && self.interim.is_empty()
    }
}
