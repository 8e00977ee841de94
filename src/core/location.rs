//! Shareable location fragment with back/forward history

const MAX_HISTORY: usize = 64;

/// The current page fragment plus the history behind and ahead of it
#[derive(Debug, Clone)]
pub struct Location {
    entries: Vec<String>,
    cursor: usize,
}

impl Default for Location {
    fn default() -> Self {
        Self::new("")
    }
}

impl Location {
    pub fn new(initial: &str) -> Self {
        Self {
            entries: vec![initial.trim().to_string()],
            cursor: 0,
        }
    }

    pub fn fragment(&self) -> &str {
        &self.entries[self.cursor]
    }

    /// Write a fragment. Returns true if a new history entry was pushed;
    /// writing the current value again is a no-op.
    pub fn set(&mut self, fragment: &str) -> bool {
        let fragment = fragment.trim();
        if self.fragment() == fragment {
            return false;
        }
        self.entries.truncate(self.cursor + 1);
        self.entries.push(fragment.to_string());
        if self.entries.len() > MAX_HISTORY {
            let overflow = self.entries.len() - MAX_HISTORY;
            self.entries.drain(..overflow);
        }
        self.cursor = self.entries.len() - 1;
        true
    }

    /// Overwrite the current entry without touching history
    pub fn replace(&mut self, fragment: &str) {
        self.entries[self.cursor] = fragment.trim().to_string();
    }

    pub fn back(&mut self) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.fragment())
    }

    pub fn forward(&mut self) -> Option<&str> {
        if self.cursor + 1 >= self.entries.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.fragment())
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_same_fragment_does_not_push() {
        let mut loc = Location::new("dashboard");
        assert!(!loc.set("dashboard"));
        assert!(loc.set("calendar"));
        assert!(!loc.set("calendar"));
        assert_eq!(loc.len(), 2);
    }

    #[test]
    fn test_back_forward_and_truncate() {
        let mut loc = Location::default();
        loc.set("dashboard");
        loc.set("calendar");
        loc.set("metrics");
        assert_eq!(loc.back(), Some("calendar"));
        assert_eq!(loc.back(), Some("dashboard"));
        assert_eq!(loc.forward(), Some("calendar"));

        // New entry drops the forward branch
        loc.set("alerts");
        assert!(!loc.can_go_forward());
        assert_eq!(loc.back(), Some("calendar"));
    }

    #[test]
    fn test_history_is_capped() {
        let mut loc = Location::new("start");
        for i in 0..(MAX_HISTORY + 10) {
            loc.set(&format!("page-{i}"));
        }
        assert_eq!(loc.len(), MAX_HISTORY);
        assert_eq!(loc.fragment(), format!("page-{}", MAX_HISTORY + 9));
    }
}
