use crate::models::KeywordCount;
use std::collections::HashMap;

/// Tokens shorter than this (in chars, after normalization) are ignored.
pub const MIN_WORD_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "de", "el", "la", "y", "en", "a", "los", "las", "del", "con", "para", "por", "una", "uno",
    "que", "sin", "sus", "mas", "muy", "como", "este", "esta", "the", "and", "for", "with",
];

/// Normalized tokens of `text`, in order of appearance.
///
/// Lowercases, folds Spanish diacritics, splits on anything that is not
/// alphanumeric and drops short tokens and stop words.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize(text)
        .split(|ch: char| !ch.is_alphanumeric())
        .filter(|token| token.chars().count() >= MIN_WORD_LEN)
        .filter(|token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}

/// Word frequencies in first-seen order.
pub fn keyword_frequencies(text: &str) -> Vec<(String, usize)> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut counts: Vec<(String, usize)> = Vec::new();
    for token in tokenize(text) {
        match positions.get(&token) {
            Some(&idx) => counts[idx].1 += 1,
            None => {
                positions.insert(token.clone(), counts.len());
                counts.push((token, 1));
            }
        }
    }
    counts
}

/// Top `top_n` keywords of `text`, most frequent first.
///
/// Equal counts keep first-seen order, so the output is fully determined by
/// the input text.
pub fn analyze_keywords(text: &str, top_n: usize) -> Vec<KeywordCount> {
    let mut counts = keyword_frequencies(text);
    // sort_by is stable
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(top_n)
        .map(|(word, count)| KeywordCount { word, count })
        .collect()
}

fn normalize(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).map(fold_diacritic).collect()
}

fn fold_diacritic(ch: char) -> char {
    match ch {
        'á' | 'à' | 'ä' | 'â' | 'ã' => 'a',
        'é' | 'è' | 'ë' | 'ê' => 'e',
        'í' | 'ì' | 'ï' | 'î' => 'i',
        'ó' | 'ò' | 'ö' | 'ô' | 'õ' => 'o',
        'ú' | 'ù' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}
