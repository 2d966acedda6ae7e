//! Synonym dictionary for medical phrase canonicalization
//!
//! A [`SynonymDictionary`] is built once (from the built-in tables, a JSON
//! [`SynonymConfig`], or both) and then shared read-only by the matcher and
//! the verifier.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::text::{normalize, tokenize};

/// Synonym groups - every surface form maps to the canonical term on the left
pub const DEFAULT_SYNONYM_GROUPS: &[(&str, &[&str])] = &[
    // Consciousness
    (
        "unconscious",
        &[
            "unconscious",
            "unconsciousness",
            "loss of consciousness",
            "unresponsive",
            "syncope",
            "fainting",
            "faint",
            "passed out",
            "blackout",
            "insensible",
        ],
    ),
    // Dizziness
    (
        "dizzy",
        &[
            "dizzy",
            "dizziness",
            "vertigo",
            "lightheaded",
            "light headed",
            "giddy",
            "giddiness",
            "spinning sensation",
            "wooziness",
            "woozy",
            "unsteady",
            "off balance",
        ],
    ),
    // Headache
    (
        "headache",
        &[
            "headache",
            "head ache",
            "cephalalgia",
            "head pain",
            "migraine",
            "cranial pain",
            "skull pain",
            "pain in head",
            "pain in the head",
            "ache in head",
            "pain head",
            "head hurts",
            "pain at head",
        ],
    ),
    // Located pain - specific phrases only, never bare "pain"
    (
        "neck pain",
        &[
            "neck pain",
            "cervicalgia",
            "pain in neck",
            "stiff neck",
            "neck ache",
            "sore neck",
            "pain in the neck",
            "neck hurts",
        ],
    ),
    (
        "shoulder pain",
        &[
            "shoulder pain",
            "pain in shoulder",
            "shoulder ache",
            "pain in the shoulder",
            "shoulder hurts",
        ],
    ),
    (
        "back pain",
        &[
            "back pain",
            "backache",
            "pain in back",
            "spinal pain",
            "pain in the back",
            "back hurts",
        ],
    ),
    (
        "chest pain",
        &[
            "chest pain",
            "chest discomfort",
            "angina",
            "cardiac pain",
            "thoracic pain",
            "pain in chest",
            "pain in the chest",
            "chest hurts",
        ],
    ),
    (
        "abdomen pain",
        &[
            "abdomen pain",
            "abdominal pain",
            "abdominal discomfort",
            "abdominal ache",
            "stomach pain",
            "stomach discomfort",
            "belly pain",
            "tummy pain",
            "gastric pain",
            "pain in abdomen",
            "pain in stomach",
            "stomach ache",
            "pain in the abdomen",
            "pain in the stomach",
        ],
    ),
    (
        "joint pain",
        &[
            "joint pain",
            "arthralgia",
            "joint ache",
            "polyarthralgia",
            "pain in joints",
            "pain in the joints",
        ],
    ),
    (
        "ear pain",
        &[
            "ear pain",
            "otalgia",
            "earache",
            "pain in ear",
            "pain in the ear",
            "ear hurts",
        ],
    ),
    (
        "eye pain",
        &[
            "eye pain",
            "ophthalmalgia",
            "pain in eye",
            "eye ache",
            "pain in the eye",
            "eye hurts",
        ],
    ),
    (
        "throat pain",
        &[
            "throat pain",
            "sore throat",
            "pain in throat",
            "pain in the throat",
            "throat hurts",
        ],
    ),
    (
        "tooth pain",
        &[
            "tooth pain",
            "toothache",
            "dental pain",
            "pain in tooth",
            "pain in the tooth",
            "tooth hurts",
        ],
    ),
    ("arm pain", &["arm pain", "pain in arm", "pain in the arm", "arm hurts"]),
    ("leg pain", &["leg pain", "pain in leg", "pain in the leg", "leg hurts"]),
    ("hand pain", &["hand pain", "pain in hand", "pain in the hand", "hand hurts"]),
    ("foot pain", &["foot pain", "pain in foot", "pain in the foot", "foot hurts"]),
    (
        "elbow pain",
        &["elbow pain", "pain in elbow", "pain in the elbow", "elbow hurts"],
    ),
    ("knee pain", &["knee pain", "pain in knee", "pain in the knee", "knee hurts"]),
    (
        "wrist pain",
        &["wrist pain", "pain in wrist", "pain in the wrist", "wrist hurts"],
    ),
    (
        "ankle pain",
        &["ankle pain", "pain in ankle", "pain in the ankle", "ankle hurts"],
    ),
    // Nausea / vomiting
    (
        "nausea",
        &[
            "nausea",
            "nauseated",
            "nauseous",
            "sick to stomach",
            "queasy",
            "queasiness",
            "feeling sick",
        ],
    ),
    (
        "vomiting",
        &[
            "vomiting",
            "vomit",
            "emesis",
            "throwing up",
            "puking",
            "hyperemesis",
            "regurgitation",
        ],
    ),
    (
        "severe pain",
        &[
            "severe pain",
            "intense pain",
            "excruciating pain",
            "unbearable pain",
            "agonizing pain",
            "sharp pain",
            "acute pain",
        ],
    ),
    // Breathing
    (
        "breathless",
        &[
            "breathless",
            "breathlessness",
            "shortness of breath",
            "dyspnoea",
            "dyspnea",
            "difficulty breathing",
            "gasping",
            "labored breathing",
            "cant breathe",
            "wheezing",
        ],
    ),
    // Weakness / fatigue
    (
        "weakness",
        &[
            "weakness",
            "weak",
            "debility",
            "fatigue",
            "tired",
            "tiredness",
            "exhaustion",
            "lethargy",
            "malaise",
            "general weakness",
            "body weakness",
        ],
    ),
    (
        "fatigue",
        &[
            "fatigue",
            "tired",
            "tiredness",
            "exhaustion",
            "weariness",
            "lethargy",
            "lassitude",
            "prostration",
        ],
    ),
    // Temperature
    (
        "fever",
        &[
            "fever",
            "pyrexia",
            "febrile",
            "high temperature",
            "temperature",
            "hot",
            "feverish",
            "hyperthermia",
        ],
    ),
    (
        "chills",
        &[
            "chills",
            "chillness",
            "shivering",
            "shiver",
            "rigor",
            "cold",
            "coldness",
            "hypothermia",
            "frigidity",
        ],
    ),
    (
        "swelling",
        &[
            "swelling",
            "swollen",
            "edema",
            "oedema",
            "inflammation",
            "puffiness",
            "bloating",
            "distension",
            "enlarged",
        ],
    ),
    // Vision / hearing
    (
        "blurred vision",
        &[
            "blurred vision",
            "blurry vision",
            "visual impairment",
            "reduced vision",
            "diminished vision",
            "poor vision",
            "cloudy vision",
            "hazy vision",
            "vision loss",
        ],
    ),
    (
        "blindness",
        &[
            "blindness",
            "blind",
            "vision loss",
            "loss of vision",
            "cannot see",
            "unable to see",
        ],
    ),
    (
        "deafness",
        &[
            "deafness",
            "deaf",
            "hearing loss",
            "loss of hearing",
            "hearing impairment",
            "cannot hear",
            "unable to hear",
        ],
    ),
    (
        "tinnitus",
        &["tinnitus", "ringing in ears", "ear ringing", "buzzing in ears"],
    ),
    // Neurological
    (
        "seizure",
        &[
            "seizure",
            "seizures",
            "convulsion",
            "convulsions",
            "fit",
            "epilepsy",
            "epileptic attack",
            "spasm",
            "status epilepticus",
        ],
    ),
    (
        "tremor",
        &[
            "tremor",
            "tremors",
            "shaking",
            "trembling",
            "quivering",
            "twitching",
            "shivering",
        ],
    ),
    (
        "paralysis",
        &[
            "paralysis",
            "paralyzed",
            "unable to move",
            "cant move",
            "loss of movement",
            "paraplegia",
            "quadriplegia",
            "hemiplegia",
            "immobile",
        ],
    ),
    (
        "numbness",
        &[
            "numbness",
            "numb",
            "tingling",
            "pins and needles",
            "paraesthesia",
            "paresthesia",
            "loss of sensation",
        ],
    ),
    // Bowel / urinary
    (
        "constipation",
        &[
            "constipation",
            "constipated",
            "difficulty passing stool",
            "hard stool",
            "cant pass stool",
        ],
    ),
    (
        "diarrhea",
        &[
            "diarrhea",
            "diarrhoea",
            "loose stool",
            "watery stool",
            "frequent stool",
            "bowel movement",
        ],
    ),
    (
        "urinary retention",
        &[
            "urinary retention",
            "unable to urinate",
            "cant urinate",
            "cant pass urine",
            "difficulty urinating",
            "retention of urine",
        ],
    ),
    (
        "frequent urination",
        &[
            "frequent urination",
            "polyuria",
            "urinary frequency",
            "frequent passing urine",
        ],
    ),
    (
        "speech difficulty",
        &[
            "speech difficulty",
            "slurred speech",
            "dysarthria",
            "cant speak",
            "unable to speak",
            "aphasia",
            "difficulty speaking",
        ],
    ),
    (
        "wheezing",
        &["wheezing", "wheeze", "whistling breath", "noisy breathing"],
    ),
    ("cough", &["cough", "coughing", "productive cough", "dry cough"]),
    // Mental status
    (
        "confusion",
        &[
            "confusion",
            "confused",
            "disoriented",
            "disorientation",
            "delirium",
            "mental confusion",
            "altered mental state",
        ],
    ),
    (
        "anxiety",
        &[
            "anxiety",
            "anxious",
            "nervous",
            "nervousness",
            "worried",
            "panic",
            "fear",
            "fearfulness",
        ],
    ),
    // Skin
    (
        "redness",
        &["redness", "red", "erythema", "flushing", "inflammation"],
    ),
    ("paleness", &["paleness", "pale", "pallor", "white", "colorless"]),
    (
        "cyanosis",
        &[
            "cyanosis",
            "blue",
            "bluish",
            "blue discoloration",
            "bluish discoloration",
        ],
    ),
    (
        "stiffness",
        &["stiffness", "stiff", "rigidity", "rigid", "inflexible"],
    ),
    (
        "palpitation",
        &[
            "palpitation",
            "palpitations",
            "rapid heartbeat",
            "fast heartbeat",
            "irregular heartbeat",
            "heart racing",
        ],
    ),
];

/// Phrase-level rewrites applied before the group lookup
pub const DEFAULT_PHRASE_REWRITES: &[(&str, &str)] = &[
    ("head pain", "headache"),
    ("pain in head", "headache"),
    ("pain in the head", "headache"),
    ("pain head", "headache"),
    ("ache in head", "headache"),
    ("head ache", "headache"),
    ("head hurts", "headache"),
    ("pain at head", "headache"),
    ("stomach pain", "abdomen pain"),
    ("belly pain", "abdomen pain"),
    ("tummy pain", "abdomen pain"),
    ("abdominal pain", "abdomen pain"),
    ("abdominal discomfort", "abdomen pain"),
    ("stomach discomfort", "abdomen pain"),
    ("pain in stomach", "abdomen pain"),
    ("pain in abdomen", "abdomen pain"),
    ("pain in the stomach", "abdomen pain"),
    ("pain in the abdomen", "abdomen pain"),
    ("stomach ache", "abdomen pain"),
    ("ear pain", "otalgia"),
    ("pain in ear", "otalgia"),
    ("earache", "otalgia"),
    ("pain in the ear", "otalgia"),
    ("ear hurts", "otalgia"),
    ("eye pain", "ophthalmalgia"),
    ("pain in eye", "ophthalmalgia"),
    ("pain in the eye", "ophthalmalgia"),
    ("eye hurts", "ophthalmalgia"),
    ("neck pain", "cervicalgia"),
    ("pain in neck", "cervicalgia"),
    ("pain in the neck", "cervicalgia"),
    ("neck hurts", "cervicalgia"),
    ("chest pain", "chest pain"),
    ("pain in chest", "chest pain"),
    ("pain in the chest", "chest pain"),
    ("chest hurts", "chest pain"),
    ("back pain", "back pain"),
    ("pain in back", "back pain"),
    ("pain in the back", "back pain"),
    ("back hurts", "back pain"),
    ("joint pain", "arthralgia"),
    ("pain in joints", "arthralgia"),
    ("pain in the joints", "arthralgia"),
    ("throat pain", "sore throat"),
    ("pain in throat", "sore throat"),
    ("pain in the throat", "sore throat"),
    ("throat hurts", "sore throat"),
    ("arm pain", "arm pain"),
    ("pain in arm", "arm pain"),
    ("pain in the arm", "arm pain"),
    ("leg pain", "leg pain"),
    ("pain in leg", "leg pain"),
    ("pain in the leg", "leg pain"),
    ("hand pain", "hand pain"),
    ("pain in hand", "hand pain"),
    ("pain in the hand", "hand pain"),
    ("foot pain", "foot pain"),
    ("pain in foot", "foot pain"),
    ("pain in the foot", "foot pain"),
    ("elbow pain", "elbow pain"),
    ("pain in elbow", "elbow pain"),
    ("pain in the elbow", "elbow pain"),
    ("knee pain", "knee pain"),
    ("pain in knee", "knee pain"),
    ("pain in the knee", "knee pain"),
    ("wrist pain", "wrist pain"),
    ("pain in wrist", "wrist pain"),
    ("pain in the wrist", "wrist pain"),
    ("ankle pain", "ankle pain"),
    ("pain in ankle", "ankle pain"),
    ("pain in the ankle", "ankle pain"),
    ("shoulder pain", "shoulder pain"),
    ("pain in shoulder", "shoulder pain"),
    ("pain in the shoulder", "shoulder pain"),
    ("cant breathe", "dyspnoea"),
    ("cannot breathe", "dyspnoea"),
    ("difficulty breathing", "dyspnoea"),
    ("hard to breathe", "dyspnoea"),
    ("trouble breathing", "dyspnoea"),
    ("loss of consciousness", "unconscious"),
    ("passed out", "unconscious"),
    ("blacked out", "unconscious"),
    ("cant see", "blindness"),
    ("cannot see", "blindness"),
    ("loss of vision", "blindness"),
    ("cant hear", "deafness"),
    ("cannot hear", "deafness"),
    ("loss of hearing", "deafness"),
    ("cant move", "paralysis"),
    ("cannot move", "paralysis"),
    ("unable to move", "paralysis"),
];

/// Words that are meaningless without a body-part qualifier
pub const CONTEXT_DEPENDENT_WORDS: &[&str] = &[
    "pain",
    "ache",
    "aching",
    "sore",
    "soreness",
    "discomfort",
    "tenderness",
    "hurting",
    "painful",
    "hurts",
];

/// Words accepted as the verb of a "<body part> pain" phrase
const PAIN_PATTERN_WORDS: &[&str] = &["pain", "ache", "hurts"];

/// Determiners accepted in "pain in [the] <body part>"
const PAIN_IN_DETERMINERS: &[&str] = &["the", "my"];

/// A canonical term and its surface forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub canonical: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// A phrase rewrite, e.g. "pain in the head" -> "headache"
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseRewrite {
    pub pattern: String,
    pub canonical: String,
}

/// Synonym configuration as loaded from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynonymConfig {
    /// Keep the built-in tables and layer this config on top
    #[serde(default = "default_true")]
    pub extend_defaults: bool,
    #[serde(default)]
    pub groups: Vec<SynonymGroup>,
    #[serde(default)]
    pub rewrites: Vec<PhraseRewrite>,
    #[serde(default)]
    pub context_dependent: Vec<String>,
}

impl Default for SynonymConfig {
    fn default() -> Self {
        Self {
            extend_defaults: true,
            groups: Vec::new(),
            rewrites: Vec::new(),
            context_dependent: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Immutable synonym and phrase-canonicalization tables
#[derive(Debug, Clone, Default)]
pub struct SynonymDictionary {
    /// Groups in registration order
    groups: Vec<SynonymGroup>,
    /// canonical term → position in `groups`
    group_index: HashMap<String, usize>,
    /// surface form → canonical term (last registration wins)
    surface_to_canonical: HashMap<String, String>,
    /// phrase → rewritten phrase
    rewrites: HashMap<String, String>,
    context_dependent: HashSet<String>,
}

impl SynonymDictionary {
    /// Create a dictionary with the built-in medical vocabulary
    pub fn new() -> Self {
        let mut dict = Self::empty();
        for &(canonical, synonyms) in DEFAULT_SYNONYM_GROUPS {
            dict.register_group(canonical, synonyms.iter().copied());
        }
        for &(pattern, canonical) in DEFAULT_PHRASE_REWRITES {
            dict.register_rewrite(pattern, canonical);
        }
        for word in CONTEXT_DEPENDENT_WORDS {
            dict.context_dependent.insert((*word).to_string());
        }
        dict
    }

    /// Create a dictionary with no entries at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a dictionary from a loaded configuration
    pub fn from_config(config: &SynonymConfig) -> Self {
        let mut dict = if config.extend_defaults {
            Self::new()
        } else {
            Self::empty()
        };

        for group in &config.groups {
            dict.register_group(&group.canonical, group.synonyms.iter().map(String::as_str));
        }
        for rewrite in &config.rewrites {
            dict.register_rewrite(&rewrite.pattern, &rewrite.canonical);
        }
        for word in &config.context_dependent {
            let word = normalize(word);
            if !word.is_empty() {
                dict.context_dependent.insert(word);
            }
        }
        dict
    }

    /// Register a synonym group.
    ///
    /// The canonical term is registered as one of its own surface forms. A
    /// surface form already owned by another group is moved to this one.
    pub fn register_group<'a>(
        &mut self,
        canonical: &str,
        synonyms: impl IntoIterator<Item = &'a str>,
    ) {
        let canonical = normalize(canonical);
        if canonical.is_empty() {
            return;
        }

        let idx = match self.group_index.get(&canonical) {
            Some(&idx) => idx,
            None => {
                self.groups.push(SynonymGroup {
                    canonical: canonical.clone(),
                    synonyms: Vec::new(),
                });
                self.group_index.insert(canonical.clone(), self.groups.len() - 1);
                self.groups.len() - 1
            }
        };

        let forms = std::iter::once(canonical.clone()).chain(synonyms.into_iter().map(normalize));
        for form in forms {
            if form.is_empty() {
                continue;
            }

            if let Some(previous) = self.surface_to_canonical.get(&form) {
                if *previous != canonical {
                    debug!(
                        surface = %form,
                        from = %previous,
                        to = %canonical,
                        "synonym surface form reassigned"
                    );
                    if let Some(&prev_idx) = self.group_index.get(previous) {
                        self.groups[prev_idx].synonyms.retain(|s| *s != form);
                    }
                }
            }

            self.surface_to_canonical.insert(form.clone(), canonical.clone());
            let group = &mut self.groups[idx];
            if !group.synonyms.contains(&form) {
                group.synonyms.push(form);
            }
        }
    }

    /// Register a phrase rewrite
    pub fn register_rewrite(&mut self, pattern: &str, canonical: &str) {
        let pattern = normalize(pattern);
        let canonical = normalize(canonical);
        if !pattern.is_empty() && !canonical.is_empty() {
            self.rewrites.insert(pattern, canonical);
        }
    }

    /// Apply the phrase-level rewrite table.
    ///
    /// Tries an exact lookup first, then the whole-phrase patterns
    /// `<part> (pain|ache|hurts)` and `pain in [the|my] <part>`. Returns the
    /// normalized input when nothing applies.
    pub fn normalize_phrase(&self, phrase: &str) -> String {
        let phrase = normalize(phrase);
        if let Some(rewritten) = self.rewrites.get(&phrase) {
            return rewritten.clone();
        }

        let words = tokenize(&phrase);
        let keys: Vec<String> = match words.as_slice() {
            [part, verb] if PAIN_PATTERN_WORDS.contains(verb) => {
                vec![format!("{} pain", part), format!("pain in {}", part)]
            }
            ["pain", "in", part] => vec![format!("pain in the {}", part), format!("{} pain", part)],
            ["pain", "in", det, part] if PAIN_IN_DETERMINERS.contains(det) => vec![
                format!("pain in {}", part),
                format!("pain in the {}", part),
                format!("{} pain", part),
            ],
            _ => Vec::new(),
        };

        keys.iter()
            .find_map(|key| self.rewrites.get(key))
            .cloned()
            .unwrap_or(phrase)
    }

    /// Direct group lookup of an exact surface form, without phrase rewriting
    pub fn canonical_of(&self, phrase: &str) -> Option<&str> {
        self.surface_to_canonical
            .get(&normalize(phrase))
            .map(String::as_str)
    }

    /// Canonical form of a term: phrase rewrite, then group lookup
    pub fn canonical_form(&self, term: &str) -> String {
        let rewritten = self.normalize_phrase(term);
        match self.surface_to_canonical.get(&rewritten) {
            Some(canonical) => canonical.clone(),
            None => rewritten,
        }
    }

    /// Check if two terms share a canonical form
    pub fn are_synonyms(&self, a: &str, b: &str) -> bool {
        self.canonical_form(a) == self.canonical_form(b)
    }

    /// Check if a word must not be matched or expanded on its own
    pub fn is_context_dependent(&self, word: &str) -> bool {
        self.context_dependent.contains(&normalize(word))
    }

    /// Check if a phrase is a registered surface form
    pub fn is_known(&self, phrase: &str) -> bool {
        self.surface_to_canonical.contains_key(&normalize(phrase))
    }

    /// Surface forms of a canonical group
    pub fn group(&self, canonical: &str) -> Option<&[String]> {
        self.group_index
            .get(&normalize(canonical))
            .map(|&idx| self.groups[idx].synonyms.as_slice())
    }

    /// Surface forms of the group a term belongs to (after canonicalization)
    pub fn synonyms_of(&self, term: &str) -> Option<&[String]> {
        self.group(&self.canonical_form(term))
    }

    /// Expand a term into every registered surface form of its group.
    ///
    /// For multi-word terms each content word is expanded too, except
    /// context-dependent words ("pain", "sore", ...), which only expand when
    /// they are the entire term. The term itself is always first.
    pub fn expand(&self, term: &str) -> Vec<String> {
        let term = normalize(term);
        let mut expanded = vec![term.clone()];
        if term.is_empty() {
            return expanded;
        }

        if let Some(forms) = self.synonyms_of(&term) {
            expanded.extend(forms.iter().cloned());
        }

        let words = tokenize(&term);
        if words.len() > 1 {
            for word in words {
                if self.is_context_dependent(word) {
                    continue;
                }
                if let Some(forms) = self.synonyms_of(word) {
                    expanded.extend(forms.iter().cloned());
                }
            }
        }

        let mut seen = HashSet::new();
        expanded.retain(|s| seen.insert(s.clone()));
        expanded
    }

    /// Number of registered groups
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of registered phrase rewrites
    pub fn rewrite_count(&self) -> usize {
        self.rewrites.len()
    }
}
