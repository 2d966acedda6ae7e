//! Text normalization shared by queries, symptom phrases and entity names
//!
//! Every comparison in the pipeline happens in the space produced by
//! [`normalize`].

/// Suffixes stripped by [`root_word`], tried in this order
const ROOT_SUFFIXES: &[&str] = &[
    "ness", "iness", "ing", "ed", "ly", "er", "est", "y", "ity", "ies", "s",
];

/// Minimum length of the remainder after stripping a suffix
const MIN_ROOT_LEN: usize = 3;

/// Normalize free text.
///
/// Lower-cases, maps underscores to spaces, drops every character that is not
/// a word character, whitespace or a hyphen, collapses whitespace runs and
/// trims. Total and idempotent.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let c = if c == '_' { ' ' } else { c };
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if c.is_alphanumeric() || c == '-' {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }

    out
}

/// Split already-normalized text into words
pub fn tokenize(normalized: &str) -> Vec<&str> {
    normalized.split(' ').filter(|w| !w.is_empty()).collect()
}

/// Reduce a word to its root with a simple suffix stripper.
///
/// The first suffix in [`ROOT_SUFFIXES`] that matches and leaves at least
/// three characters is removed. `ness` is tried before `iness`, so
/// "happiness" reduces to "happi".
pub fn root_word(word: &str) -> String {
    let word = word.trim().to_lowercase();
    let len = word.chars().count();

    for suffix in ROOT_SUFFIXES {
        let suffix_len = suffix.chars().count();
        if word.ends_with(suffix) && len >= suffix_len + MIN_ROOT_LEN {
            return word[..word.len() - suffix.len()].to_string();
        }
    }

    word
}
