//! Context-mismatch guard
//!
//! A hard veto that runs before any positive similarity scoring. It stops a
//! query about one body region from matching a symptom about another one,
//! and stops "knee pain" from matching a bare "pain".

use std::collections::BTreeSet;

use crate::text::tokenize;

/// Words describing pain, which need a body-part qualifier
pub const PAIN_WORDS: &[&str] = &[
    "pain", "ache", "aching", "sore", "hurts", "hurting", "strain", "swelling",
];

/// Anatomical words too generic to identify a region on their own
pub const GENERIC_ANATOMY: &[&str] = &[
    "joint",
    "limb",
    "limbs",
    "muscle",
    "bone",
    "tissue",
    "region",
    "area",
    "extremities",
    "body",
];

const GUARD_STOPWORDS: &[&str] = &[
    "in", "the", "of", "and", "to", "my", "a", "an", "due", "with", "from", "both", "all",
];

/// Body regions and the words that name them
pub const BODY_REGIONS: &[(&str, &[&str])] = &[
    ("head", &["head", "cranial", "skull", "cephalalgia"]),
    ("face", &["face", "facial", "cheek"]),
    ("nose", &["nose", "nasal"]),
    ("eye", &["eye", "eyes", "ocular"]),
    ("mouth", &["mouth", "oral"]),
    ("teeth", &["teeth", "tooth", "dental"]),
    ("neck", &["neck", "cervical", "cervicalgia"]),
    ("shoulder", &["shoulder"]),
    ("arm", &["arm"]),
    ("elbow", &["elbow", "forearm"]),
    ("wrist", &["wrist"]),
    (
        "hand",
        &["hand", "hands", "finger", "fingers", "palm", "dorsum", "thumb"],
    ),
    ("chest", &["chest", "thoracic", "cardiac"]),
    (
        "abdomen",
        &["abdomen", "abdominal", "stomach", "belly", "gastric", "tummy"],
    ),
    ("back", &["back", "spinal", "vertebral", "paravertebral"]),
    ("rectum", &["rectum", "rectal", "anus"]),
    ("hip", &["hip"]),
    ("leg", &["leg"]),
    ("knee", &["knee"]),
    ("ankle", &["ankle"]),
    ("foot", &["foot", "toe", "heel", "calcaneal"]),
];

/// Check if a word is a pain word
pub fn is_pain_word(word: &str) -> bool {
    PAIN_WORDS.contains(&word)
}

/// Regions named by a normalized phrase.
///
/// "upper limb(s)" counts as the arm region and "lower limb(s)" as the leg
/// region.
pub fn regions_in(phrase: &str) -> BTreeSet<&'static str> {
    let words = tokenize(phrase);
    let mut regions = BTreeSet::new();

    let has_limb = words.iter().any(|w| *w == "limb" || *w == "limbs");
    if has_limb && words.contains(&"upper") {
        regions.insert("arm");
    }
    if has_limb && words.contains(&"lower") {
        regions.insert("leg");
    }

    for word in words {
        if is_pain_word(word) || GENERIC_ANATOMY.contains(&word) || GUARD_STOPWORDS.contains(&word)
        {
            continue;
        }
        if let Some((region, _)) = BODY_REGIONS.iter().find(|(_, terms)| terms.contains(&word)) {
            regions.insert(*region);
        }
    }

    regions
}

/// Decide whether a (query term, symptom) pair must be blocked.
///
/// Both arguments are expected to be normalized. Returns `true` when the
/// pair is a mismatch.
pub fn is_context_mismatch(term: &str, symptom: &str) -> bool {
    let term_regions = regions_in(term);
    let symptom_regions = regions_in(symptom);
    let symptom_words = tokenize(symptom);

    if !term_regions.is_empty() && !symptom_regions.is_empty() {
        if !term_regions.is_disjoint(&symptom_regions) {
            return false;
        }
        // an elbow may match "upper limb" / arm phrasing, nothing else nearby
        if term_regions.contains("elbow")
            && symptom_regions.contains("arm")
            && symptom_words.contains(&"upper")
        {
            return false;
        }
        return true;
    }

    if !term_regions.is_empty() {
        return true;
    }

    let term_words = tokenize(term);
    let term_has_pain = term_words.iter().any(|w| is_pain_word(w));
    if term_words.len() > 1 && term_has_pain {
        if let [only] = symptom_words.as_slice() {
            if is_pain_word(only) {
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_in() {
        assert_eq!(regions_in("pain in the knee").into_iter().collect::<Vec<_>>(), vec!["knee"]);
        assert!(regions_in("fever").is_empty());
        assert!(regions_in("joint pain").is_empty());
        assert!(regions_in("weakness of upper limbs").contains("arm"));
        assert!(regions_in("swelling of lower limb").contains("leg"));
        assert!(regions_in("abdominal discomfort").contains("abdomen"));
    }

    #[test]
    fn test_blocks_bare_pain() {
        assert!(is_context_mismatch("knee pain", "pain"));
        assert!(is_context_mismatch("severe pain", "pain"));
        assert!(!is_context_mismatch("pain", "pain"));
    }

    #[test]
    fn test_blocks_disjoint_regions() {
        assert!(is_context_mismatch("knee pain", "shoulder pain"));
        assert!(is_context_mismatch("head pain", "pain in the foot"));
        assert!(!is_context_mismatch("knee pain", "swelling of knee"));
    }

    #[test]
    fn test_blocks_region_missing_from_symptom() {
        assert!(is_context_mismatch("knee pain", "fever"));
        assert!(!is_context_mismatch("fever", "fever with chills"));
    }

    #[test]
    fn test_elbow_upper_limb_allowance() {
        assert!(!is_context_mismatch("elbow pain", "pain in upper limbs"));
        assert!(is_context_mismatch("elbow pain", "pain in arm"));
        assert!(is_context_mismatch("elbow pain", "pain in the hand"));
    }

    #[test]
    fn test_query_without_region_passes() {
        assert!(!is_context_mismatch("headache", "head ache"));
        assert!(!is_context_mismatch("dizziness", "giddiness"));
    }
}
