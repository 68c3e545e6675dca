//! Safe and dangerous keyword sets.

use super::classifier::StatementKind;
use crate::config::KeywordConfig;
use crate::error::GateError;
use std::collections::{BTreeMap, HashSet};

/// The two disjoint, case-insensitive keyword sets that drive validation.
///
/// Built once from configuration and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct KeywordSets {
    safe: BTreeMap<String, StatementKind>,
    dangerous: HashSet<String>,
}

impl KeywordSets {
    /// Build keyword sets, rejecting configurations that would make the gate vacuous.
    pub fn new<S, D>(safe: S, dangerous: D) -> Result<Self, GateError>
    where
        S: IntoIterator<Item = (String, StatementKind)>,
        D: IntoIterator<Item = String>,
    {
        let mut safe_map = BTreeMap::new();
        for (keyword, kind) in safe {
            let keyword = normalize_keyword(&keyword)?;
            if kind == StatementKind::Other {
                return Err(GateError::config(format!(
                    "Safe keyword '{}' must map to a read-only statement kind",
                    keyword
                )));
            }
            safe_map.insert(keyword, kind);
        }

        let dangerous = dangerous
            .into_iter()
            .map(|kw| normalize_keyword(&kw))
            .collect::<Result<HashSet<_>, _>>()?;

        if safe_map.is_empty() {
            return Err(GateError::config("Safe keyword set is empty"));
        }
        if dangerous.is_empty() {
            return Err(GateError::config("Dangerous keyword set is empty"));
        }

        let mut overlap: Vec<&String> = safe_map
            .keys()
            .filter(|kw| dangerous.contains(*kw))
            .collect();
        if !overlap.is_empty() {
            overlap.sort();
            return Err(GateError::config(format!(
                "Keywords listed as both safe and dangerous: {:?}",
                overlap
            )));
        }

        Ok(Self {
            safe: safe_map,
            dangerous,
        })
    }

    /// Build keyword sets from the configuration section.
    pub fn from_config(config: &KeywordConfig) -> Result<Self, GateError> {
        Self::new(
            config.safe.iter().map(|(k, v)| (k.clone(), *v)),
            config.dangerous.iter().cloned(),
        )
    }

    /// Statement kind introduced by a leading keyword, if it is safe.
    pub fn safe_kind(&self, keyword: &str) -> Option<StatementKind> {
        self.safe.get(&keyword.to_ascii_uppercase()).copied()
    }

    pub fn is_dangerous(&self, keyword: &str) -> bool {
        self.dangerous.contains(&keyword.to_ascii_uppercase())
    }

    pub fn dangerous_len(&self) -> usize {
        self.dangerous.len()
    }
}

/// Upper-case a configured keyword and require it to be a single bare word.
fn normalize_keyword(keyword: &str) -> Result<String, GateError> {
    let trimmed = keyword.trim();
    let valid = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$');
    if !valid {
        return Err(GateError::config(format!(
            "Keyword '{}' must be a single bare word",
            keyword
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}
