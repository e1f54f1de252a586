//! Permission grants carried by a personal access token.
//!
//! A token grants actions within four fixed categories. Actions are free-form
//! strings interpreted by downstream consumers (the agent handlers); the
//! categories are closed. Required capabilities are checked as
//! `"category:action"` strings, and anything malformed fails closed.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Category → action-set mapping. Immutable after issuance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionSet {
    #[serde(default)]
    pub llm: BTreeSet<String>,
    #[serde(default)]
    pub agent: BTreeSet<String>,
    #[serde(default)]
    pub project: BTreeSet<String>,
    #[serde(default)]
    pub cli: BTreeSet<String>,
}

impl PermissionSet {
    /// Action set for a category name, or `None` for unknown categories.
    fn actions(&self, category: &str) -> Option<&BTreeSet<String>> {
        match category {
            "llm" => Some(&self.llm),
            "agent" => Some(&self.agent),
            "project" => Some(&self.project),
            "cli" => Some(&self.cli),
            _ => None,
        }
    }

    /// Whether a single `category:action` capability is granted.
    pub fn allows(&self, category: &str, action: &str) -> bool {
        self.actions(category)
            .map(|set| set.contains(action))
            .unwrap_or(false)
    }

    /// Check a list of required `"category:action"` strings.
    ///
    /// Empty list always grants. Entries without a `:`, with an unknown
    /// category, or with an action the token does not hold deny the whole
    /// request — never panic.
    pub fn grants_all(&self, required: &[String]) -> bool {
        required.iter().all(|req| match req.split_once(':') {
            Some((category, action)) => self.allows(category, action),
            None => false,
        })
    }

}
