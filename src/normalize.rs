//! Text normalization shared by the provider adapters and the display layer.

use html_escape::decode_html_entities;

/// Fallback emitted when a payload carries no usable instructions at all.
pub const NO_INSTRUCTIONS: &str = "No instructions available";

/// Rotation of fallback images for recipes without one of their own.
const DEFAULT_IMAGES: [&str; 5] = [
    "https://images.unsplash.com/photo-1495521821757-a1efb6729352?w=400",
    "https://images.unsplash.com/photo-1504674900247-0877df9cc836?w=400",
    "https://images.unsplash.com/photo-1493770348161-369560ae357d?w=400",
    "https://images.unsplash.com/photo-1476224203421-9ac39bcb3327?w=400",
    "https://images.unsplash.com/photo-1546069901-ba9599a7e63c?w=400",
];

/// Deterministic default image for the n-th recipe of a result list.
pub fn default_image(index: usize) -> &'static str {
    DEFAULT_IMAGES[index % DEFAULT_IMAGES.len()]
}

fn decode_html_symbols(text: &str) -> String {
    // for some reason need to decode twice to get the correct string
    decode_html_entities(&decode_html_entities(text)).into_owned()
}

/// Strip HTML tags from freeform instruction prose, decode named entities
/// and collapse runs of whitespace. Never fails: invalid markup just loses
/// its angle-bracketed spans.
pub fn strip_html_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                // tags separate words, keep a boundary
                text.push(' ');
            }
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    let decoded = decode_html_symbols(&text);
    collapse_whitespace(&decoded)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Unit abbreviations expanded for display. Keys match only when bounded by
/// spaces, so "1 c sugar" expands but a trailing "350 g" does not, exactly
/// as stored strings round-trip unchanged.
const ABBREVIATIONS: [(&str, &str); 15] = [
    ("tb", "tablespoon"),
    ("tbs", "tablespoon"),
    ("tbsp", "tablespoon"),
    ("c", "cup"),
    ("tsp", "teaspoon"),
    ("oz", "ounce"),
    ("lb", "pound"),
    ("lbs", "pounds"),
    ("qt", "quart"),
    ("pt", "pint"),
    ("gal", "gallon"),
    ("ml", "milliliter"),
    ("g", "gram"),
    ("kg", "kilogram"),
    ("mg", "milligram"),
];

/// Expand common unit abbreviations in an ingredient string for display.
///
/// Applied at render/detail time only; stored ingredient strings keep their
/// original abbreviations. Matching is case-insensitive and requires a space
/// on both sides of the abbreviation.
pub fn expand_abbreviations(text: &str) -> String {
    let words: Vec<&str> = text.split(' ').collect();
    let last = words.len().saturating_sub(1);

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 || i == last {
                return (*word).to_string();
            }
            ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| word.eq_ignore_ascii_case(abbr))
                .map(|(_, full)| (*full).to_string())
                .unwrap_or_else(|| (*word).to_string())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_decodes_entities() {
        let html = "<p>Preheat oven to 350&deg;F.</p><b>Mix &amp; bake</b>";
        let text = strip_html_tags(html);
        assert!(!text.contains('<'));
        assert!(!text.contains("&amp;"));
        assert!(text.contains("Mix & bake"));
    }

    #[test]
    fn strip_preserves_plain_text() {
        assert_eq!(strip_html_tags("Boil the pasta."), "Boil the pasta.");
    }

    #[test]
    fn strip_collapses_whitespace() {
        assert_eq!(
            strip_html_tags("Step   one.<br/>   Step two."),
            "Step one. Step two."
        );
    }

    #[test]
    fn strip_handles_empty_input() {
        assert_eq!(strip_html_tags(""), "");
    }

    #[test]
    fn expands_space_bounded_abbreviations() {
        assert_eq!(
            expand_abbreviations("2 tbsp olive oil"),
            "2 tablespoon olive oil"
        );
        assert_eq!(expand_abbreviations("1 c sugar"), "1 cup sugar");
    }

    #[test]
    fn expansion_is_case_insensitive() {
        assert_eq!(
            expand_abbreviations("2 TBSP olive oil"),
            "2 tablespoon olive oil"
        );
    }

    #[test]
    fn edge_words_are_not_expanded() {
        // no surrounding spaces at the string boundaries
        assert_eq!(expand_abbreviations("350 g"), "350 g");
        assert_eq!(expand_abbreviations("g whiz"), "g whiz");
    }

    #[test]
    fn default_image_wraps_around() {
        assert_eq!(default_image(0), default_image(5));
        assert_ne!(default_image(0), default_image(1));
    }
}
