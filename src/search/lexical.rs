//! Lexical matching of free-text queries against the symptom vocabulary
//!
//! The matcher keeps an inverted index from word roots and canonical forms to
//! symptom positions. A query is broken into keywords (the whole phrase, its
//! canonical form and synonyms, and content-word n-grams); every indexed
//! candidate is scored with [`LexicalMatcher::lexical_similarity`] against the
//! query and each keyword, and the best score wins.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::text::{normalize, root_word, tokenize};

use super::regions::is_context_mismatch;
use super::synonyms::SynonymDictionary;

/// Words dropped before n-gram extraction
pub const KEYWORD_STOPWORDS: &[&str] = &[
    "i", "am", "have", "having", "feel", "feeling", "experience", "experiencing", "my", "the",
    "a", "an", "and", "or", "but", "with", "from", "there", "is", "are", "was", "been", "being",
    "has", "had", "do", "does", "did", "will", "would", "could", "should", "may", "might", "can",
    "me", "very", "some", "severe", "mild", "slight", "really", "quite", "just", "also",
    "serious", "recently", "now", "today", "yesterday", "since", "for", "last", "two", "days",
];

/// Filler words ignored when comparing the words of two phrases
const FILLER_WORDS: &[&str] = &[
    "in", "the", "of", "and", "to", "my", "a", "an", "at", "on", "with", "from",
];

/// Words that mark a phrase as a pain description
const PAIN_RELATION_WORDS: &[&str] = &[
    "pain", "ache", "aching", "sore", "discomfort", "hurt", "hurts", "painful",
];

/// Candidate count above which scoring runs on the rayon pool
const PARALLEL_SCAN_THRESHOLD: usize = 1000;

/// Content words must be longer than this to become keywords
const MIN_KEYWORD_CHARS: usize = 2;

/// Lexical matcher over a fixed symptom vocabulary
#[derive(Debug, Clone)]
pub struct LexicalMatcher {
    dictionary: Arc<SynonymDictionary>,
    /// Symptom phrases as given, de-duplicated by normalized form
    symptoms: Vec<String>,
    /// Normalized form of `symptoms[i]`
    normalized: Vec<String>,
    /// root / word / canonical form → positions in `symptoms`
    word_index: HashMap<String, BTreeSet<usize>>,
}

impl LexicalMatcher {
    /// Build the matcher and its inverted index
    pub fn new<S: AsRef<str>>(symptoms: &[S], dictionary: Arc<SynonymDictionary>) -> Self {
        let mut matcher = Self {
            dictionary,
            symptoms: Vec::with_capacity(symptoms.len()),
            normalized: Vec::with_capacity(symptoms.len()),
            word_index: HashMap::new(),
        };

        let mut seen = HashSet::new();
        for symptom in symptoms {
            let norm = normalize(symptom.as_ref());
            if norm.is_empty() || !seen.insert(norm.clone()) {
                continue;
            }
            let position = matcher.symptoms.len();
            matcher.index_symptom(position, &norm);
            matcher.symptoms.push(symptom.as_ref().trim().to_string());
            matcher.normalized.push(norm);
        }

        debug!(
            symptoms = matcher.symptoms.len(),
            index_keys = matcher.word_index.len(),
            "lexical matcher built"
        );
        matcher
    }

    fn index_symptom(&mut self, position: usize, norm: &str) {
        let mut keys = Vec::new();
        for word in tokenize(norm) {
            keys.push(word.to_string());
            keys.push(root_word(word));
            keys.push(self.dictionary.canonical_form(word));
        }
        keys.push(self.dictionary.canonical_form(norm));

        for key in keys {
            self.word_index.entry(key).or_default().insert(position);
        }
    }

    /// Symptom phrases in vocabulary order
    pub fn vocabulary(&self) -> &[String] {
        &self.symptoms
    }

    /// The synonym dictionary shared with this matcher
    pub fn dictionary(&self) -> &SynonymDictionary {
        &self.dictionary
    }

    /// Number of indexed symptoms
    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    /// Check if the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }

    /// Extract keyword phrases from a query.
    ///
    /// Returns, in order and without duplicates: the normalized query, its
    /// phrase-rewritten and canonical forms (plus synonyms when the whole
    /// query is a known phrase), then unigrams, bigrams and trigrams of the
    /// remaining content words with their rewrites and synonyms.
    /// Context-dependent unigrams are skipped when the query has more than
    /// one content word.
    pub fn extract_keywords(&self, query: &str) -> Vec<String> {
        let dict = &*self.dictionary;
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut keywords = KeywordSet::default();
        keywords.push(query.clone());
        keywords.push_expanded(dict, &query);

        let content = keyword_words(&query);
        let multi_word = content.len() > 1;

        for i in 0..content.len() {
            let word = content[i];
            if !(multi_word && dict.is_context_dependent(word)) {
                keywords.push(word.to_string());
                keywords.push(root_word(word));
                if !dict.is_context_dependent(word) {
                    keywords.push_expanded(dict, word);
                }
            }

            if i + 1 < content.len() {
                keywords.push_expanded(dict, &content[i..i + 2].join(" "));
            }
            if i + 2 < content.len() {
                keywords.push_expanded(dict, &content[i..i + 3].join(" "));
            }
        }

        keywords.into_vec()
    }

    /// Number of distinct content unigrams and their roots (at least one).
    ///
    /// Synonym expansions are not counted. Used as the denominator of the
    /// entity diversity bonus.
    pub fn query_symptom_count(&self, query: &str) -> usize {
        let query = normalize(query);
        let content = keyword_words(&query);
        let multi_word = content.len() > 1;

        let mut terms = BTreeSet::new();
        for word in content {
            if multi_word && self.dictionary.is_context_dependent(word) {
                continue;
            }
            terms.insert(word.to_string());
            terms.insert(root_word(word));
        }
        terms.retain(|t: &String| t.chars().count() > MIN_KEYWORD_CHARS);
        terms.len().max(1)
    }

    /// Find vocabulary symptoms matching `query` at or above `threshold`.
    ///
    /// Results are sorted by descending score; equal scores keep vocabulary
    /// order.
    pub fn find_matches(&self, query: &str, threshold: f64) -> Vec<(String, f64)> {
        let query_norm = normalize(query);
        if query_norm.is_empty() || self.symptoms.is_empty() {
            return Vec::new();
        }

        let keywords = self.extract_keywords(&query_norm);
        let mut candidates = self.candidates_for(&keywords);
        if candidates.is_empty() {
            debug!(query = %query_norm, "no indexed candidates, scanning full vocabulary");
            candidates = (0..self.symptoms.len()).collect();
        }

        let terms: Vec<&str> = std::iter::once(query_norm.as_str())
            .chain(keywords.iter().map(String::as_str))
            .collect();
        let score = |&position: &usize| {
            let symptom = &self.normalized[position];
            let best = terms
                .iter()
                .map(|term| self.lexical_similarity(term, symptom))
                .fold(0.0_f64, f64::max);
            (position, best)
        };

        let scored: Vec<(usize, f64)> = if candidates.len() > PARALLEL_SCAN_THRESHOLD {
            candidates.par_iter().map(score).collect()
        } else {
            candidates.iter().map(score).collect()
        };

        let mut matches: Vec<(usize, f64)> = scored
            .into_iter()
            .filter(|(_, s)| *s >= threshold)
            .collect();
        matches.sort_by(|a, b| b.1.total_cmp(&a.1));

        debug!(
            query = %query_norm,
            keywords = keywords.len(),
            candidates = candidates.len(),
            matches = matches.len(),
            "lexical matching done"
        );

        matches
            .into_iter()
            .map(|(position, s)| (self.symptoms[position].clone(), s))
            .collect()
    }

    fn candidates_for(&self, keywords: &[String]) -> Vec<usize> {
        let dict = &*self.dictionary;
        let mut positions = BTreeSet::new();
        let mut collect = |key: &str| {
            if let Some(hits) = self.word_index.get(key) {
                positions.extend(hits.iter().copied());
            }
        };

        for keyword in keywords {
            collect(&dict.canonical_form(keyword));
            for word in tokenize(keyword) {
                collect(word);
                collect(&root_word(word));
                collect(&dict.canonical_form(word));
            }
        }

        positions.into_iter().collect()
    }

    /// Similarity of a query term and a symptom phrase, in `[0, 1]`.
    ///
    /// Rules are evaluated in strict precedence and the first one that
    /// applies decides the score. The context-mismatch guard comes first and
    /// forces 0.0.
    pub fn lexical_similarity(&self, term: &str, symptom: &str) -> f64 {
        let dict = &*self.dictionary;
        let term = normalize(term);
        let symptom = normalize(symptom);
        if term.is_empty() || symptom.is_empty() {
            return 0.0;
        }

        if is_context_mismatch(&term, &symptom) {
            return 0.0;
        }

        if term == symptom {
            return 1.0;
        }

        let term_phrase = dict.normalize_phrase(&term);
        let symptom_phrase = dict.normalize_phrase(&symptom);
        if term_phrase == symptom_phrase {
            return 0.99;
        }

        if dict.are_synonyms(&term, &symptom) {
            return 0.98;
        }
        if dict.are_synonyms(&term_phrase, &symptom_phrase) {
            return 0.97;
        }

        if let (Some(a), Some(b)) = (dict.canonical_of(&term), dict.canonical_of(&symptom)) {
            if a == b {
                return 0.96;
            }
        }

        if self.is_pain_related(&term, &symptom) {
            return 0.95;
        }

        let term_words = tokenize(&term);
        let symptom_words = tokenize(&symptom);

        let has_synonym_pair = content_words(&term_words).any(|t| {
            content_words(&symptom_words).any(|s| t != s && dict.are_synonyms(t, s))
        });
        if has_synonym_pair {
            return 0.92;
        }

        let term_set: HashSet<&str> = term_words.iter().copied().collect();
        let symptom_set: HashSet<&str> = symptom_words.iter().copied().collect();
        if term_set.len() >= 2 && term_set.is_subset(&symptom_set) {
            return 0.95;
        }

        if let ([t], [s]) = (term_words.as_slice(), symptom_words.as_slice()) {
            return self.word_similarity(t, s);
        }

        let best_scores: Vec<f64> = term_words
            .iter()
            .map(|t| {
                symptom_words
                    .iter()
                    .map(|s| self.word_similarity(t, s))
                    .fold(0.0_f64, f64::max)
            })
            .filter(|s| *s > 0.0)
            .collect();

        if !best_scores.is_empty() {
            let avg = best_scores.iter().sum::<f64>() / best_scores.len() as f64;
            let coverage =
                best_scores.len() as f64 / term_words.len().max(symptom_words.len()) as f64;
            return avg * (0.7 + 0.3 * coverage);
        }

        if term_set.is_subset(&symptom_set) {
            return 0.85 * (term_set.len() as f64 / symptom_set.len() as f64);
        }

        let intersection = term_set.intersection(&symptom_set).count();
        if intersection > 0 {
            let union = term_set.union(&symptom_set).count();
            let jaccard = intersection as f64 / union as f64;
            if jaccard >= 0.5 {
                return 0.80 * jaccard;
            }
        }

        let term_len = term.chars().count() as f64;
        let symptom_len = symptom.chars().count() as f64;
        if symptom.contains(term.as_str()) {
            return 0.75 * (term_len / symptom_len);
        }
        if term.contains(symptom.as_str()) {
            return 0.75 * (symptom_len / term_len);
        }

        0.0
    }

    /// Similarity of two single words, in `[0, 1]`
    pub fn word_similarity(&self, a: &str, b: &str) -> f64 {
        if a == b || self.dictionary.are_synonyms(a, b) {
            return 1.0;
        }

        let len_a = a.chars().count();
        let len_b = b.chars().count();
        if len_a >= 3 && len_b >= 3 && (a.contains(b) || b.contains(a)) {
            let ratio = len_a.min(len_b) as f64 / len_a.max(len_b) as f64;
            if ratio >= 0.5 {
                return 0.90 * ratio;
            }
        }

        let ratio = strsim::normalized_levenshtein(a, b);
        if ratio >= 0.60 {
            return 0.85 * ratio;
        }

        0.0
    }

    /// "X pain" relation: both phrases describe pain and share a qualifier
    /// word (or a pair of synonymous qualifiers).
    fn is_pain_related(&self, term: &str, symptom: &str) -> bool {
        let term_words = tokenize(term);
        let symptom_words = tokenize(symptom);

        let has_pain = |words: &[&str]| words.iter().any(|w| PAIN_RELATION_WORDS.contains(w));
        if !has_pain(&term_words) || !has_pain(&symptom_words) {
            return false;
        }

        let qualifiers = |words: &[&str]| -> Vec<String> {
            content_words(words)
                .filter(|w| !PAIN_RELATION_WORDS.contains(w))
                .map(str::to_string)
                .collect()
        };
        let term_q = qualifiers(&term_words);
        let symptom_q = qualifiers(&symptom_words);

        term_q
            .iter()
            .any(|t| symptom_q.iter().any(|s| t == s || self.dictionary.are_synonyms(t, s)))
    }
}

/// Non-stopword query words long enough to be keywords
fn keyword_words(normalized: &str) -> Vec<&str> {
    tokenize(normalized)
        .into_iter()
        .filter(|w| !KEYWORD_STOPWORDS.contains(w) && w.chars().count() > MIN_KEYWORD_CHARS)
        .collect()
}

/// Words of a phrase that are not filler

fn content_words<'a>(words: &'a [&'a str]) -> impl Iterator<Item = &'a str> + 'a {
    words
        .iter()
        .copied()
        .filter(|w| !FILLER_WORDS.contains(w))
}

/// Insertion-ordered, de-duplicated keyword list
#[derive(Default)]
struct KeywordSet {
    items: Vec<String>,
    seen: HashSet<String>,
}

impl KeywordSet {
    fn push(&mut self, keyword: String) {
        if !keyword.is_empty() && self.seen.insert(keyword.clone()) {
            self.items.push(keyword);
        }
    }

    /// Push a phrase, its rewrite and canonical form, and its group's
    /// surface forms when the phrase is a known synonym.
    fn push_expanded(&mut self, dict: &SynonymDictionary, phrase: &str) {
        self.push(phrase.to_string());
        let rewritten = dict.normalize_phrase(phrase);
        let canonical = dict.canonical_form(phrase);
        if dict.is_known(&rewritten) {
            if let Some(forms) = dict.group(&canonical) {
                for form in forms {
                    self.push(form.clone());
                }
            }
        }
        self.push(rewritten);
        self.push(canonical);
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher(symptoms: &[&str]) -> LexicalMatcher {
        LexicalMatcher::new(symptoms, Arc::new(SynonymDictionary::new()))
    }

    #[test]
    fn test_exact_match_dominance() {
        let m = matcher(&[]);
        for s in ["head ache", "pain", "swelling of knee", "pain in upper limbs", "fever"] {
            assert_eq!(m.lexical_similarity(s, s), 1.0, "{}", s);
        }
    }

    #[test]
    fn test_phrase_normalized_match() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("headache", "head ache"), 0.99);
        assert!(m.lexical_similarity("abdominal discomfort", "stomach pain") >= 0.95);
    }

    #[test]
    fn test_synonym_match() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("vertigo", "dizziness"), 0.98);
    }

    #[test]
    fn test_guard_forces_zero() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("knee pain", "pain"), 0.0);
        assert_eq!(m.lexical_similarity("knee pain", "shoulder pain"), 0.0);
        // would otherwise share "swelling"
        assert_eq!(m.lexical_similarity("swelling of knee", "swelling of ankle"), 0.0);
    }

    #[test]
    fn test_pain_relation() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("knee pain", "sore knee"), 0.95);
    }

    #[test]
    fn test_word_synonym_pair() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("feeling hot", "fever at night"), 0.92);
    }

    #[test]
    fn test_subset_match() {
        let m = matcher(&[]);
        assert_eq!(m.lexical_similarity("loss of appetite", "sudden loss of appetite"), 0.95);
    }

    #[test]
    fn test_word_similarity() {
        let m = matcher(&[]);
        assert_eq!(m.word_similarity("fever", "pyrexia"), 1.0);
        assert!((m.word_similarity("swell", "swelling") - 0.90 * 5.0 / 8.0).abs() < 1e-9);
        assert_eq!(m.word_similarity("knee", "tooth"), 0.0);
        let typo = m.word_similarity("vomitting", "vomiting");
        assert!(typo > 0.7 && typo < 0.85, "{}", typo);
    }

    #[test]
    fn test_extract_keywords() {
        let m = matcher(&[]);
        let keywords = m.extract_keywords("I have severe knee pain");
        assert_eq!(keywords[0], "i have severe knee pain");
        assert!(keywords.contains(&"knee".to_string()));
        assert!(keywords.contains(&"knee pain".to_string()));
        assert!(keywords.contains(&"pain in the knee".to_string()));
        // context-dependent unigram dropped in a multi-word query
        assert!(!keywords.contains(&"pain".to_string()));
        assert!(!keywords.contains(&"severe".to_string()));
    }

    #[test]
    fn test_extract_keywords_single_context_word() {
        let m = matcher(&[]);
        assert!(m.extract_keywords("pain").contains(&"pain".to_string()));
        assert!(m.extract_keywords("   ").is_empty());
    }

    #[test]
    fn test_query_symptom_count_ignores_synonyms() {
        let m = matcher(&[]);
        // fever, fev, chills, chill
        assert_eq!(m.query_symptom_count("fever and chills"), 4);
        assert_eq!(m.query_symptom_count("knee pain"), 1);
        assert_eq!(m.query_symptom_count("   "), 1);
    }

    #[test]
    fn test_find_matches_headache() {
        let m = matcher(&["head ache", "pain", "knee swelling", "fever"]);
        let matches = m.find_matches("I have a headache", 0.45);
        assert_eq!(matches[0].0, "head ache");
        assert!(matches[0].1 >= 0.96);
        assert!(!matches.iter().any(|(s, _)| s == "knee swelling"));
    }

    #[test]
    fn test_find_matches_never_bare_pain() {
        let m = matcher(&["pain", "knee swelling", "pain in the knee"]);
        let matches = m.find_matches("knee pain", 0.45);
        assert!(!matches.iter().any(|(s, _)| s == "pain"));
        assert_eq!(matches[0].0, "pain in the knee");
    }

    #[test]
    fn test_find_matches_threshold_and_order() {
        let m = matcher(&["fever", "high fever with chills", "giddiness"]);
        let matches = m.find_matches("fever", 0.45);
        assert_eq!(matches[0], ("fever".to_string(), 1.0));
        for pair in matches.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
        assert!(matches.iter().all(|(_, s)| *s >= 0.45));
        assert!(m.find_matches("", 0.45).is_empty());
    }

    #[test]
    fn test_vocabulary_dedup() {
        let m = matcher(&["Head Ache", "head ache!", "fever"]);
        assert_eq!(m.len(), 2);
        assert_eq!(m.vocabulary()[0], "Head Ache");
    }
}
