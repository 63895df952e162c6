//! Functional-class word lists used to drop prepositions, conjunctions, and
//! interjections before counting (spec.md §4.3 step d).
//!
//! The real morphological analyzer is explicitly out of scope ("contract
//! only" — spec.md §1/§4.3): a dictionary-driven POS tagger would consult a
//! full morphological database to classify `МЕЖД|ПРЕДЛ|СОЮЗ` /
//! `INTJ|PREP|CONJ` forms. This is a fixed, small substitute covering the
//! common closed-class words of each language — enough to satisfy the
//! pipeline's shape and its testable properties, not a claim of
//! linguistic completeness. See DESIGN.md.

use std::collections::HashSet;
use std::sync::LazyLock;

static RUSSIAN_FUNCTIONAL: &[&str] = &[
    // prepositions
    "в", "на", "с", "со", "к", "ко", "от", "до", "из", "у", "о", "об", "обо", "за", "под", "над",
    "при", "про", "для", "без", "через", "между", "перед", "из-за", "из-под",
    // conjunctions
    "и", "а", "но", "или", "да", "что", "чтобы", "если", "когда", "как", "потому", "так",
    // interjections
    "ах", "ох", "эй", "ой", "увы", "ура",
];

static ENGLISH_FUNCTIONAL: &[&str] = &[
    // prepositions
    "in", "on", "at", "by", "for", "with", "about", "against", "between", "into", "through",
    "during", "before", "after", "above", "below", "to", "from", "up", "down", "of", "off",
    "over", "under",
    // conjunctions
    "and", "but", "or", "nor", "so", "yet", "although", "because", "if", "that", "while",
    // interjections
    "oh", "ah", "wow", "ouch", "hey", "alas",
];

static RUSSIAN_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| RUSSIAN_FUNCTIONAL.iter().copied().collect());
static ENGLISH_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| ENGLISH_FUNCTIONAL.iter().copied().collect());

#[must_use]
pub fn is_russian_functional(token: &str) -> bool {
    RUSSIAN_SET.contains(token)
}

#[must_use]
pub fn is_english_functional(token: &str) -> bool {
    ENGLISH_SET.contains(token)
}
