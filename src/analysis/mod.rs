pub mod gap;
pub mod identifier;
pub mod keywords;
pub mod report;

pub use keywords::{analyze_keywords, tokenize};
pub use report::assemble_report;

/// Search phrase for the competitor lookup: the first significant words of a title.
pub fn search_phrase(title: &str, max_words: usize) -> String {
    tokenize(title)
        .into_iter()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_phrase_skips_noise() {
        assert_eq!(
            search_phrase("Lente de Cámara para Celular 3 en 1", 3),
            "lente camara celular"
        );
        assert_eq!(search_phrase("", 3), "");
    }
}
