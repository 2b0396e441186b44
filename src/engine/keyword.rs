use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::constraints::GENERIC_COLORS;
use crate::icons::{find_icon_by_keyword, icon_library};

const PRODUCT_NOUNS: &str = "tee|shirt|t-shirt|hoodie|sweatshirt|tote|bag|mug|cup|top|garment|item";
const DESIGN_NOUNS: &str = "text|icon|star|heart|logo|arrow|wave|sun|mountain|design|print";

static SIZE_TOKENS: &[&str] = &["xs", "s", "m", "l", "xl", "2xl"];

static QUANTITY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*(?:items|pcs|pieces|shirts|hoodies|totes|mugs)")
        .expect("quantity regex must compile")
});

static DESIGN_IN_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:star|heart|logo|text|icon|print)\s+in\s+(\w+)")
        .expect("design-in-color regex must compile")
});

static PRODUCT_IN_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:tee|shirt|t-shirt|hoodie|tote|bag|mug)\s+in\s+(\w+)")
        .expect("product-in-color regex must compile")
});

fn color_adjacent_to(color: &str, nouns: &str, text: &str) -> bool {
    let forward = Regex::new(&format!(r"{color}\s*(?:{nouns})")).expect("adjacency regex");
    let reverse =
        Regex::new(&format!(r"(?:{nouns})\s*(?:in|of)?\s*{color}")).expect("adjacency regex");
    forward.is_match(text) || reverse.is_match(text)
}

/// Deterministic keyword extraction over the raw utterance.
///
/// Produces the same raw-update shape as the model path so both feed the
/// shared validator. This path has no I/O and must keep producing usable
/// updates when the model backend is down entirely.
pub fn parse_keyword_updates(message: &str) -> Value {
    let text = message.to_lowercase();
    let mut updates = Map::new();

    // Product nouns. First match wins, mirroring how people lead with the
    // item they want.
    if text.contains("tee") || text.contains("shirt") {
        updates.insert("productId".into(), "classic-tee".into());
    } else if text.contains("hoodie") || text.contains("sweatshirt") {
        updates.insert("productId".into(), "hoodie".into());
    } else if text.contains("tote") || text.contains("bag") {
        updates.insert("productId".into(), "tote".into());
    } else if text.contains("mug") || text.contains("cup") {
        updates.insert("productId".into(), "mug".into());
    }

    // Color tokens, disambiguated by what they sit next to: "navy tee"
    // colors the garment, "white star" colors the design.
    for color in GENERIC_COLORS {
        if !text.contains(color) {
            continue;
        }
        if color_adjacent_to(color, PRODUCT_NOUNS, &text) {
            updates.insert("productColor".into(), (*color).into());
        } else if color_adjacent_to(color, DESIGN_NOUNS, &text) {
            updates.insert("textColor".into(), (*color).into());
        } else if !updates.contains_key("productColor") {
            updates.insert("productColor".into(), (*color).into());
        }
    }

    // "star in red" / "tee in navy" phrasings.
    if let Some(captures) = DESIGN_IN_COLOR_RE.captures(&text) {
        let color = &captures[1];
        if GENERIC_COLORS.contains(&color) {
            updates.insert("textColor".into(), color.into());
        }
    }
    if let Some(captures) = PRODUCT_IN_COLOR_RE.captures(&text) {
        let color = &captures[1];
        if GENERIC_COLORS.contains(&color) {
            updates.insert("productColor".into(), color.into());
        }
    }

    // Sizes as whole words only; "l" inside a word is not a size.
    for size in SIZE_TOKENS {
        let word = Regex::new(&format!(r"\b{size}\b")).expect("size regex");
        if word.is_match(&text) {
            updates.insert("size".into(), size.to_uppercase().into());
            break;
        }
    }

    if let Some(captures) = QUANTITY_RE.captures(&text) {
        if let Ok(qty) = captures[1].parse::<i64>() {
            updates.insert("quantity".into(), qty.into());
        }
    }

    // Icon ids mentioned by name, else the keyword table, so "valentine"
    // still maps to heart with the model path down.
    if let Some(icon) = icon_library()
        .iter()
        .skip(1)
        .find(|icon| text.contains(icon.id))
    {
        updates.insert("iconId".into(), icon.id.into());
    } else if let Some(icon) = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 3)
        .find_map(find_icon_by_keyword)
    {
        updates.insert("iconId".into(), icon.id.into());
    }

    // Occasion and vibe cues feed phrasing and design scoring.
    for (occasion, cues) in [
        ("gift", ["gift", "present", "birthday"].as_slice()),
        ("team", &["team", "group", "club"]),
        ("event", &["event", "party", "concert"]),
        ("personal", &["personal", "myself", "for me"]),
    ] {
        if cues.iter().any(|cue| text.contains(cue)) {
            updates.insert("occasion".into(), occasion.into());
            break;
        }
    }
    for (vibe, cues) in [
        ("minimal", ["minimal", "clean", "simple"].as_slice()),
        ("bold", &["bold", "loud", "statement"]),
        ("retro", &["retro", "vintage"]),
        ("cute", &["cute", "playful"]),
        ("sporty", &["sport", "athletic", "active"]),
    ] {
        if cues.iter().any(|cue| text.contains(cue)) {
            updates.insert("vibe".into(), vibe.into());
            break;
        }
    }

    // Quoted substrings are the design text, verbatim (original casing).
    if let Some(quoted) = first_quoted(message) {
        updates.insert("text".into(), quoted.into());
    }

    Value::Object(updates)
}

fn first_quoted(message: &str) -> Option<&str> {
    for quote in ['"', '\''] {
        let mut parts = message.splitn(3, quote);
        parts.next()?;
        if let (Some(inner), Some(_rest)) = (parts.next(), parts.next()) {
            if !inner.is_empty() {
                return Some(inner);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_detection() {
        assert_eq!(parse_keyword_updates("I want a tee")["productId"], "classic-tee");
        assert_eq!(parse_keyword_updates("a cozy hoodie please")["productId"], "hoodie");
        assert_eq!(parse_keyword_updates("canvas bag")["productId"], "tote");
        assert_eq!(parse_keyword_updates("a coffee cup")["productId"], "mug");
    }

    #[test]
    fn test_color_adjacent_to_product() {
        let updates = parse_keyword_updates("I'd like a navy tee");
        assert_eq!(updates["productColor"], "navy");
        assert!(updates.get("textColor").is_none());
    }

    #[test]
    fn test_color_adjacent_to_design() {
        let updates = parse_keyword_updates("put a white star on it");
        assert_eq!(updates["textColor"], "white");
        assert!(updates.get("productColor").is_none());
    }

    #[test]
    fn test_both_color_roles_in_one_utterance() {
        let updates = parse_keyword_updates("black hoodie with a white star");
        assert_eq!(updates["productColor"], "black");
        assert_eq!(updates["textColor"], "white");
    }

    #[test]
    fn test_lone_color_defaults_to_product() {
        let updates = parse_keyword_updates("burgundy would be nice");
        assert_eq!(updates["productColor"], "burgundy");
    }

    #[test]
    fn test_in_color_patterns() {
        assert_eq!(parse_keyword_updates("star in red please")["textColor"], "red");
        assert_eq!(parse_keyword_updates("the tee in navy")["productColor"], "navy");
    }

    #[test]
    fn test_size_whole_word_only() {
        assert_eq!(parse_keyword_updates("size m please")["size"], "M");
        assert_eq!(parse_keyword_updates("2xl works")["size"], "2XL");
        // "l" inside "lovely" is not a size
        assert!(parse_keyword_updates("lovely design").get("size").is_none());
    }

    #[test]
    fn test_quantity_with_unit() {
        assert_eq!(parse_keyword_updates("I need 12 shirts")["quantity"], 12);
        assert!(parse_keyword_updates("I need 12").get("quantity").is_none());
    }

    #[test]
    fn test_icon_mention() {
        assert_eq!(parse_keyword_updates("add a rocket icon")["iconId"], "rocket");
    }

    #[test]
    fn test_icon_resolved_through_keyword_table() {
        assert_eq!(
            parse_keyword_updates("something for my valentine")["iconId"],
            "heart"
        );
        assert_eq!(
            parse_keyword_updates("caffeine themed please")["iconId"],
            "coffee"
        );
    }

    #[test]
    fn test_quoted_text_double_and_single() {
        assert_eq!(
            parse_keyword_updates("print \"Stay Wild\" on it")["text"],
            "Stay Wild"
        );
        assert_eq!(
            parse_keyword_updates("print 'Dream Big' on it")["text"],
            "Dream Big"
        );
    }

    #[test]
    fn test_occasion_and_vibe_cues() {
        let updates = parse_keyword_updates("a birthday present, something minimal");
        assert_eq!(updates["occasion"], "gift");
        assert_eq!(updates["vibe"], "minimal");
    }

    #[test]
    fn test_empty_message_yields_empty_object() {
        let updates = parse_keyword_updates("hello there");
        assert!(updates.as_object().unwrap().is_empty());
    }
}
