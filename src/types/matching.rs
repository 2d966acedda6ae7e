//! Symptom match candidates

use serde::{Deserialize, Serialize};

/// How a symptom entered the merged candidate list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    LexicalExact,
    SemanticVerified,
    LexicalPartial,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::LexicalExact => "lexical-exact",
            MatchMethod::SemanticVerified => "semantic-verified",
            MatchMethod::LexicalPartial => "lexical-partial",
        }
    }
}

impl std::fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symptom matched for one query, with its combined score in `[0, 1]`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub symptom: String,
    pub score: f64,
    pub method: MatchMethod,
}

impl MatchCandidate {
    pub fn new(symptom: impl Into<String>, score: f64, method: MatchMethod) -> Self {
        Self {
            symptom: symptom.into(),
            score,
            method,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_serializes_kebab_case() {
        let json = serde_json::to_string(&MatchMethod::SemanticVerified).unwrap();
        assert_eq!(json, "\"semantic-verified\"");
        assert_eq!(MatchMethod::LexicalExact.to_string(), "lexical-exact");
    }
}
