//! The explicit list of public repository URIs the principal has opted
//! into — a mode orthogonal to code-host-affiliated sync.

/// Public repository opt-in state.
///
/// The list is edited as free text, one URI per line. When the gate is
/// disabled the effective contribution to a sync request is the empty list
/// regardless of content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublicRepoState {
    repos: Vec<String>,
    pub enabled: bool,
}

impl PublicRepoState {
    #[must_use]
    pub fn new(repos: Vec<String>, enabled: bool) -> Self {
        Self { repos, enabled }
    }

    /// Parse the one-URI-per-line free text form. Surrounding whitespace is
    /// trimmed and blank lines are dropped; order is preserved.
    #[must_use]
    pub fn from_text(text: &str, enabled: bool) -> Self {
        let repos = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self { repos, enabled }
    }

    /// The raw list, independent of the enabled gate.
    #[must_use]
    pub fn repos(&self) -> &[String] {
        &self.repos
    }

    /// The list as contributed to a sync request: empty when disabled.
    #[must_use]
    pub fn effective(&self) -> &[String] {
        if self.enabled { &self.repos } else { &[] }
    }
}
