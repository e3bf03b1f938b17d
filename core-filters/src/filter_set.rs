//! # Filter Set
//!
//! Insertion-ordered mapping from filter name to parameter value.
//!
//! ## Ordering matters
//!
//! The filter graph is a chain: `atempo=1.5,asetrate=96000` does not sound
//! like `asetrate=96000,atempo=1.5`. The set therefore preserves insertion
//! order exactly and never re-sorts. Re-inserting an existing name updates
//! its value **in place**, keeping its position in the chain.
//!
//! ## Validation
//!
//! Names and values are validated on insert so a malformed filter is
//! rejected synchronously, before it can reach the transcoder command line.
//! Graph metacharacters (`,` `;` `=` `[` `]`) are rejected rather than
//! escaped; a parameter that needs them is not a single filter argument.

use serde::{Deserialize, Serialize};
use session_traits::{Result, SessionError};
use std::fmt;

/// A single filter parameter: free-form text or a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Numeric parameter (`atempo=1.5`).
    Number(f64),
    /// Textual parameter (`aformat=s16:48000`—style values are rejected,
    /// see module docs).
    Text(String),
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterValue::Number(n) => write!(f, "{}", n),
            FilterValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        FilterValue::Number(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        FilterValue::Number(n as f64)
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

/// Characters that would change the structure of the filter graph if they
/// appeared inside a name or value.
const GRAPH_METACHARACTERS: &[char] = &[',', ';', '=', '[', ']', '\n', '\r'];

/// Insertion-ordered name → value mapping for the audio filter graph.
///
/// Owned exclusively by the session; pipeline stages receive it by
/// reference and never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    entries: Vec<(String, FilterValue)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or updates a filter.
    ///
    /// An existing name keeps its position in the chain; only its value
    /// changes. Returns [`SessionError::InvalidFilterConfiguration`] for a
    /// malformed name or value, leaving the set untouched.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FilterValue>) -> Result<()> {
        let name = name.into();
        let value = value.into();
        validate_name(&name)?;
        validate_value(&value)?;

        if let Some(entry) = self.entries.iter_mut().find(|(n, _)| *n == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
        Ok(())
    }

    /// Merges `additions` into the set, all or nothing.
    ///
    /// Every pair is validated before any is applied, so a malformed entry
    /// in the middle of the batch leaves the previous set fully active.
    pub fn merge<I, N, V>(&mut self, additions: I) -> Result<()>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<FilterValue>,
    {
        let additions: Vec<(String, FilterValue)> = additions
            .into_iter()
            .map(|(n, v)| (n.into(), v.into()))
            .collect();

        for (name, value) in &additions {
            validate_name(name)?;
            validate_value(value)?;
        }
        for (name, value) in additions {
            // Already validated; insert cannot fail now.
            let _ = self.insert(name, value);
        }
        Ok(())
    }

    /// Removes a filter by name. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(n, _)| n != name);
        self.entries.len() != before
    }

    /// Resets the set to empty.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|(n, _)| n == name)
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Renders the graph string: `name=value` pairs joined with commas, in
    /// insertion order.
    pub fn graph(&self) -> String {
        self.entries
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(",")
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(SessionError::InvalidFilterConfiguration(
            "filter name must not be empty".to_string(),
        ));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(SessionError::InvalidFilterConfiguration(format!(
            "filter name {:?} contains characters outside [A-Za-z0-9_]",
            name
        )));
    }
    Ok(())
}

fn validate_value(value: &FilterValue) -> Result<()> {
    match value {
        FilterValue::Number(n) => {
            if !n.is_finite() {
                return Err(SessionError::InvalidFilterConfiguration(format!(
                    "filter value {} is not a finite number",
                    n
                )));
            }
        }
        FilterValue::Text(s) => {
            if s.is_empty() {
                return Err(SessionError::InvalidFilterConfiguration(
                    "filter value must not be empty".to_string(),
                ));
            }
            if s.contains(GRAPH_METACHARACTERS) {
                return Err(SessionError::InvalidFilterConfiguration(format!(
                    "filter value {:?} contains graph metacharacters",
                    s
                )));
            }
        }
    }
    Ok(())
}
