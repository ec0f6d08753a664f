//! Host page contract consumed by the lifecycle manager.
//!
//! # Responsibility
//! - Expose the navigation location used as the activation subject.
//! - Expose the document readiness state.
//! - Pass style injection straight through to the page.

/// Document readiness as reported by the host page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    /// True once the page reached its ready point (interactive or complete).
    pub fn is_ready(self) -> bool {
        matches!(self, Self::Interactive | Self::Complete)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Interactive => "interactive",
            Self::Complete => "complete",
        }
    }
}

/// Current navigation location.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageLocation {
    /// Path component, e.g. `/app/settings`.
    pub path: String,
    /// Query string including the leading `?`, or empty.
    pub query: String,
}

impl PageLocation {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: query.into(),
        }
    }

    /// Path plus query string, the subject of match/exclude evaluation.
    pub fn activation_path(&self) -> String {
        format!("{}{}", self.path, self.query)
    }
}

/// Services the embedding page provides to the host and its units.
///
/// Style methods are conveniences; the host never inspects their effect.
pub trait HostPage {
    fn location(&self) -> PageLocation;
    fn ready_state(&self) -> ReadyState;

    /// Appends inline CSS tagged with `owner`.
    fn append_style(&self, _owner: &str, _css: &str) {}
    /// Appends a stylesheet link tagged with `owner`.
    fn append_stylesheet(&self, _owner: &str, _href: &str) {}
    /// Removes every style and stylesheet tagged with `owner`.
    fn remove_styles(&self, _owner: &str) {}
}

#[cfg(test)]
mod tests {
    use super::{PageLocation, ReadyState};

    #[test]
    fn activation_path_appends_query() {
        let location = PageLocation::new("/app/settings", "?tab=1");
        assert_eq!(location.activation_path(), "/app/settings?tab=1");
        assert_eq!(
            PageLocation::new("/", "").activation_path(),
            "/".to_string()
        );
    }

    #[test]
    fn only_interactive_and_complete_are_ready() {
        assert!(!ReadyState::Loading.is_ready());
        assert!(ReadyState::Interactive.is_ready());
        assert!(ReadyState::Complete.is_ready());
    }
}
