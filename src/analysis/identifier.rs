//! Product identifier extraction from free-form listing URLs.
//!
//! Everything here is pure: no I/O, and malformed input is simply "no match".

use once_cell::sync::Lazy;
use regex::Regex;

/// Marketplace site codes accepted as identifier prefixes.
pub const SITE_CODES: &[&str] = &[
    "MLA", "MLB", "MLM", "MLC", "MCO", "MLU", "MPE", "MLV", "MEC", "MBO", "MPY", "MRD", "MPA",
    "MCR", "MGT", "MHN", "MNI", "MSV",
];

static EXPLICIT_ITEM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)item_id[:=]\s*({})-?(\d+)", SITE_CODES.join("|")))
        .expect("valid regex")
});

/// A site code only counts at the start of a word, so `compe10` is not `MPE10`.
static BARE_ITEM_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?i)(?:^|[^a-z])({})-?(\d+)", SITE_CODES.join("|")))
        .expect("valid regex")
});

/// Returns the canonical `<PREFIX><digits>` identifier found in `url`.
///
/// An explicit `item_id:` token wins over any bare identifier elsewhere in
/// the string (search-result permalinks carry both).
pub fn extract_item_id(url: &str) -> Option<String> {
    [&*EXPLICIT_ITEM_ID, &*BARE_ITEM_ID]
        .into_iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|caps| format!("{}{}", caps[1].to_uppercase(), &caps[2]))
}

/// Site code of a canonical identifier (`MLA123` -> `MLA`).
pub fn site_of(item_id: &str) -> &str {
    item_id
        .char_indices()
        .find(|(_, ch)| ch.is_ascii_digit())
        .map(|(idx, _)| &item_id[..idx])
        .unwrap_or(item_id)
}

/// Placeholder title derived from the permalink slug.
///
/// `/MLA-123-lente-camara-celular-_JM` yields `Lente Camara Celular`.
pub fn title_from_url(url: &str, item_id: &str) -> Option<String> {
    slug_after_id(url, item_id)
        .or_else(|| slug_from_path(url, item_id))
        .map(|slug| humanize_slug(&slug))
        .filter(|title| !title.is_empty())
}

fn slug_after_id(url: &str, item_id: &str) -> Option<String> {
    let digits = &item_id[site_of(item_id).len()..];
    let m = BARE_ITEM_ID
        .captures_iter(url)
        .find(|caps| &caps[2] == digits)?
        .get(0)?;
    let rest = &url[m.end()..];
    let rest = rest.split(['?', '#', '/']).next().unwrap_or_default();
    let rest = rest.split('_').next().unwrap_or_default();
    let slug = rest.trim_matches('-');
    slug.chars()
        .any(|ch| ch.is_alphabetic())
        .then(|| slug.to_string())
}

fn slug_from_path(url: &str, item_id: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let digits = &item_id[site_of(item_id).len()..];
    let segments = parsed.path_segments()?;
    segments
        .filter(|segment| segment.contains('-') && !segment.contains(digits))
        .find(|segment| segment.chars().any(|ch| ch.is_alphabetic()))
        .map(|segment| segment.to_string())
}

fn humanize_slug(slug: &str) -> String {
    slug.split('-')
        .map(|part| {
            urlencoding::decode(part)
                .map(|decoded| decoded.into_owned())
                .unwrap_or_else(|_| part.to_string())
        })
        .filter(|part| !part.trim().is_empty())
        .map(|part| capitalize(&part))
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_item_id_token() {
        assert_eq!(
            extract_item_id("https://www.mercadolibre.com.ar/p/x?pdp_filters=item_id:MLA123456789"),
            Some("MLA123456789".to_string())
        );
    }

    #[test]
    fn explicit_token_wins_over_bare_id() {
        let url = "https://www.mercadolibre.com.ar/lente/p/MLA19283746#item_id:MLA555000111";
        assert_eq!(extract_item_id(url), Some("MLA555000111".to_string()));
    }

    #[test]
    fn bare_id_anywhere_with_or_without_dash() {
        assert_eq!(
            extract_item_id("https://articulo.mercadolibre.com.ar/MLA-1234567890-lente-camara-_JM"),
            Some("MLA1234567890".to_string())
        );
        assert_eq!(
            extract_item_id("MLB987654 trailing text"),
            Some("MLB987654".to_string())
        );
        assert_eq!(
            extract_item_id("https://example.com/x/mlm4455?ref=home"),
            Some("MLM4455".to_string())
        );
    }

    #[test]
    fn site_code_inside_a_word_is_ignored() {
        assert_eq!(extract_item_id("https://example.com/compe10"), None);
        assert_eq!(extract_item_id("https://example.com/xmla123456"), None);
        assert_eq!(
            extract_item_id("https://example.com/compe10/MLA-555"),
            Some("MLA555".to_string())
        );
    }

    #[test]
    fn no_pattern_yields_none() {
        assert_eq!(extract_item_id(""), None);
        assert_eq!(extract_item_id("not a url at all"), None);
        assert_eq!(extract_item_id("https://example.com/item/12345"), None);
        assert_eq!(extract_item_id("MLA-"), None);
    }

    #[test]
    fn site_code_of_identifier() {
        assert_eq!(site_of("MLA123"), "MLA");
        assert_eq!(site_of("MCO9"), "MCO");
    }

    #[test]
    fn title_from_permalink_slug() {
        let url = "https://articulo.mercadolibre.com.ar/MLA-1234567890-lente-camara-celular-_JM";
        assert_eq!(
            title_from_url(url, "MLA1234567890").as_deref(),
            Some("Lente Camara Celular")
        );
    }

    #[test]
    fn title_from_product_page_path() {
        let url = "https://www.mercadolibre.com.ar/lente-macro-zoom/p/MLA19283746";
        assert_eq!(
            title_from_url(url, "MLA19283746").as_deref(),
            Some("Lente Macro Zoom")
        );
    }

    #[test]
    fn title_absent_without_slug() {
        assert_eq!(title_from_url("item_id:MLA123", "MLA123"), None);
    }
}
