//! Arabic Text Normalization
//!
//! Canonicalizes Arabic text so that spelling variants compare equal.
//! Every component in the pipeline compares normalized text only — no
//! comparison anywhere runs against raw input.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Arabic stop words, stored in normalized form.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "في", "من", "الي", "علي", "عن", "هل", "ما", "هو", "هي", "لا", "نعم",
        "كان", "يكون", "ان", "التي", "الذي", "هذا", "هذه", "ذلك", "تلك", "او",
        "لكن", "ثم", "قد", "كل", "بعض", "اي", "اين", "متي", "كيف", "لماذا",
        "عند", "مع", "ضد", "بين", "حول", "خلال", "قبل", "بعد", "فوق", "تحت",
        "امام", "خلف", "داخل", "خارج", "حتي",
    ]
    .into_iter()
    .collect()
});

/// Normalize Arabic text into its canonical comparison form.
///
/// Removes diacritical marks and tatweel, folds letter-shape variants
/// (أ/إ/آ → ا, ى → ي, ة → ه, ؤ/ئ → ء), collapses consecutive whitespace
/// to one space and trims. Pure, total and idempotent: empty input gives
/// an empty string, and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        let mapped = match ch {
            // Tashkil and the superscript alef carry no lexical meaning.
            '\u{064B}'..='\u{0652}' | '\u{0670}' => None,
            // Tatweel is purely presentational.
            '\u{0640}' => None,
            'أ' | 'إ' | 'آ' => Some('ا'),
            'ى' => Some('ي'),
            'ة' => Some('ه'),
            'ؤ' | 'ئ' => Some('ء'),
            c if c.is_whitespace() => {
                pending_space = !out.is_empty();
                None
            }
            c => Some(c),
        };

        if let Some(c) = mapped {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(c);
        }
    }

    out
}

/// True when the (already normalized) word is a stop word.
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Extract the significant words of a normalized query: longer than two
/// characters and not a stop word. Leading/trailing punctuation is trimmed
/// so `المختصه؟` matches `المختصه`.
pub fn significant_words(normalized: &str) -> Vec<String> {
    words_of(normalized)
        .filter(|w| w.chars().count() > 2 && !is_stop_word(w))
        .map(str::to_string)
        .collect()
}

/// Words of a normalized string with punctuation trimmed off the edges.
pub fn words_of(normalized: &str) -> impl Iterator<Item = &str> + '_ {
    normalized
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}

/// Count the content words remaining after stop-word removal. Short queries
/// by this measure are assumed to depend on conversational context.
pub fn content_word_count(normalized: &str) -> usize {
    words_of(normalized).filter(|w| !is_stop_word(w)).count()
}

/// Contiguous 2- and 3-word windows of a normalized query, in order.
/// Phrase matches outweigh single-word matches in the scorer.
pub fn phrases(normalized: &str) -> Vec<String> {
    let words: Vec<&str> = words_of(normalized).collect();
    let mut out = Vec::new();

    for i in 0..words.len().saturating_sub(1) {
        out.push(format!("{} {}", words[i], words[i + 1]));
        if i + 2 < words.len() {
            out.push(format!("{} {} {}", words[i], words[i + 1], words[i + 2]));
        }
    }

    out
}
