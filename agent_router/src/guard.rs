//! Coarse appropriateness gate applied once per request before routing.

use tracing::debug;

pub const DEFAULT_DENYLIST: [&str; 3] = ["spam", "inappropriate", "offensive"];

#[derive(Debug, Clone)]
pub struct ContentGuard {
    denylist: Vec<String>,
}

impl Default for ContentGuard {
    fn default() -> Self {
        Self::new(DEFAULT_DENYLIST)
    }
}

impl ContentGuard {
    /// Terms are matched case-insensitively as substrings.
    pub fn new<I, S>(denylist: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            denylist: denylist
                .into_iter()
                .map(|term| term.as_ref().to_lowercase())
                .filter(|term| !term.is_empty())
                .collect(),
        }
    }

    pub fn is_appropriate(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        match self.denylist.iter().find(|term| lowered.contains(term.as_str())) {
            Some(term) => {
                debug!(term = %term, "Content matched denylist");
                false
            }
            None => true,
        }
    }

    pub fn denylist(&self) -> &[String] {
        &self.denylist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_denylist() {
        let guard = ContentGuard::default();
        assert!(!guard.is_appropriate("This is spam content"));
        assert!(!guard.is_appropriate("Inappropriate message here"));
        assert!(guard.is_appropriate("This is a normal question"));
        assert!(guard.is_appropriate("How does AI work?"));
    }

    #[test]
    fn test_matching_is_case_insensitive_substring() {
        let guard = ContentGuard::default();
        assert!(!guard.is_appropriate("SPAMMERS everywhere"));
        assert!(!guard.is_appropriate("that was OffEnSiVe"));
    }

    #[test]
    fn test_empty_text_is_appropriate() {
        assert!(ContentGuard::default().is_appropriate(""));
    }

    #[test]
    fn test_custom_denylist_is_lowercased() {
        let guard = ContentGuard::new(["Forbidden", ""]);
        assert_eq!(guard.denylist(), ["forbidden".to_string()]);
        assert!(!guard.is_appropriate("a FORBIDDEN topic"));
        assert!(guard.is_appropriate("spam is fine here"));
    }
}
