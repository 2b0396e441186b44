use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::engine::extract::extract_json_array;
use crate::engine::llm::ChatBackend;
use crate::engine::prompt::build_design_prompt;
use crate::icons::{icon_by_id, Icon, ICON_NONE};

// ============================================================================
// Token vocabularies
// ============================================================================

// The generator (model or fallback) only ever picks from these closed
// vocabularies. It can produce a boring layout, never an invalid one.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Composition {
    Stacked,
    Badge,
    Split,
    Overlay,
    Minimal,
    Banner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextSize {
    S,
    M,
    L,
    Xl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextStyle {
    Regular,
    Bold,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Font {
    Sans,
    Serif,
    Display,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconPosition {
    Above,
    Below,
    Left,
    Behind,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconScale {
    S,
    M,
    L,
    Xl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Border {
    None,
    Underline,
    Circle,
    DoubleCircle,
    Frame,
}

/// One fully-specified design: every field already validated against its
/// vocabulary, so rendering cannot fail.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignTokens {
    pub name: String,
    pub style: String,
    pub reasoning: String,
    pub composition: Composition,
    pub text_size: TextSize,
    pub text_style: TextStyle,
    pub font: Font,
    pub icon_position: IconPosition,
    pub icon_scale: IconScale,
    pub border: Border,
    pub uppercase: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DesignVariant {
    pub id: String,
    pub name: String,
    pub style: String,
    pub svg: String,
    pub score: u32,
    pub reasoning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDesigns {
    pub variants: Vec<DesignVariant>,
    pub recommended: String,
}

// ============================================================================
// Sanitization
// ============================================================================

fn field_enum<T: serde::de::DeserializeOwned>(raw: &Value, key: &str, default: T) -> T {
    raw.get(key)
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or(default)
}

fn field_string(raw: &Value, key: &str, default: &str) -> String {
    raw.get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Re-validate a raw token object from the generator. Unrecognized values
/// fall back to a fixed default per field; the icon position is forced to
/// agree with whether an icon is actually selected.
pub fn sanitize_design(raw: &Value, has_icon: bool, index: usize) -> DesignTokens {
    let mut tokens = DesignTokens {
        name: field_string(raw, "name", &format!("Design {}", index + 1)),
        style: field_string(raw, "style", ""),
        reasoning: field_string(raw, "reasoning", ""),
        composition: field_enum(raw, "composition", Composition::Minimal),
        text_size: field_enum(raw, "textSize", TextSize::M),
        text_style: field_enum(raw, "textStyle", TextStyle::Bold),
        font: field_enum(raw, "font", Font::Sans),
        icon_position: field_enum(raw, "iconPosition", IconPosition::Above),
        icon_scale: field_enum(raw, "iconScale", IconScale::M),
        border: field_enum(raw, "border", Border::None),
        uppercase: raw
            .get("uppercase")
            .and_then(|v| v.as_bool())
            .unwrap_or(true),
    };

    if !has_icon {
        tokens.icon_position = IconPosition::None;
    } else if tokens.icon_position == IconPosition::None {
        tokens.icon_position = IconPosition::Above;
    }

    tokens
}

// ============================================================================
// Renderer
// ============================================================================

const VIEWBOX: u32 = 400;

fn font_family(font: Font) -> &'static str {
    match font {
        Font::Sans => "'Helvetica Neue', sans-serif",
        Font::Serif => "'Georgia', serif",
        Font::Display => "'Impact', sans-serif",
    }
}

fn font_size(size: TextSize) -> u32 {
    match size {
        TextSize::S => 32,
        TextSize::M => 40,
        TextSize::L => 48,
        TextSize::Xl => 60,
    }
}

fn font_weight(style: TextStyle) -> u32 {
    match style {
        TextStyle::Regular => 400,
        TextStyle::Bold => 700,
        TextStyle::Black => 900,
    }
}

fn icon_scale(scale: IconScale) -> f32 {
    match scale {
        IconScale::S => 1.5,
        IconScale::M => 2.0,
        IconScale::L => 3.0,
        IconScale::Xl => 4.0,
    }
}

/// Hand-tuned text baseline per composition. Split shifts the text right
/// to make room for a left-hand icon.
fn text_anchor(composition: Composition, icon_position: IconPosition) -> (u32, u32) {
    let x = if icon_position == IconPosition::Left {
        250
    } else {
        200
    };
    let y = match composition {
        Composition::Minimal => 200,
        Composition::Stacked => 280,
        Composition::Split => 210,
        Composition::Overlay => 215,
        Composition::Badge => 260,
        Composition::Banner => 210,
    };
    (x, y)
}

fn icon_anchor(position: IconPosition) -> Option<(u32, u32, f32)> {
    match position {
        IconPosition::Above => Some((200, 130, 1.0)),
        IconPosition::Below => Some((200, 270, 1.0)),
        IconPosition::Left => Some((110, 200, 1.0)),
        IconPosition::Behind => Some((200, 200, 0.12)),
        IconPosition::None => None,
    }
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn push_border(parts: &mut Vec<String>, border: Border, text_y: u32) {
    match border {
        Border::None => {}
        Border::Underline => parts.push(format!(
            r#"<line x1="80" y1="{y}" x2="320" y2="{y}" stroke="currentColor" stroke-width="4" />"#,
            y = text_y + 20
        )),
        Border::Circle => parts.push(
            r#"<circle cx="200" cy="200" r="140" fill="none" stroke="currentColor" stroke-width="6" />"#.to_string(),
        ),
        Border::DoubleCircle => {
            parts.push(
                r#"<circle cx="200" cy="200" r="140" fill="none" stroke="currentColor" stroke-width="6" />"#.to_string(),
            );
            parts.push(
                r#"<circle cx="200" cy="200" r="150" fill="none" stroke="currentColor" stroke-width="2" stroke-dasharray="5,5" />"#.to_string(),
            );
        }
        Border::Frame => parts.push(
            r#"<rect x="30" y="30" width="340" height="340" fill="none" stroke="currentColor" stroke-width="4" />"#.to_string(),
        ),
    }
}

fn push_composition_decorations(parts: &mut Vec<String>, composition: Composition) {
    match composition {
        Composition::Split => parts.push(
            r#"<line x1="180" y1="120" x2="180" y2="280" stroke="currentColor" stroke-width="2" />"#.to_string(),
        ),
        Composition::Banner => {
            parts.push(
                r#"<line x1="60" y1="160" x2="340" y2="160" stroke="currentColor" stroke-width="3" />"#.to_string(),
            );
            parts.push(
                r#"<line x1="60" y1="240" x2="340" y2="240" stroke="currentColor" stroke-width="3" />"#.to_string(),
            );
        }
        _ => {}
    }
}

/// Map a validated token set to SVG markup. Pure: same tokens, same markup.
pub fn render_design(tokens: &DesignTokens, text: &str, icon: &Icon) -> String {
    let mut parts: Vec<String> = Vec::new();
    parts.push(format!(
        r#"<svg viewBox="0 0 {VIEWBOX} {VIEWBOX}" xmlns="http://www.w3.org/2000/svg">"#
    ));

    let (text_x, text_y) = text_anchor(tokens.composition, tokens.icon_position);
    push_border(&mut parts, tokens.border, text_y);
    push_composition_decorations(&mut parts, tokens.composition);

    if let Some((x, y, opacity)) = icon_anchor(tokens.icon_position) {
        if !icon.path.is_empty() {
            let scale = icon_scale(tokens.icon_scale);
            // Icon paths are authored on a 24x24 grid; recenter then scale.
            let offset = -12.0 * scale;
            parts.push(format!(
                r#"<g transform="translate({x}, {y})"><path d="{path}" fill="currentColor" opacity="{opacity}" transform="translate({offset:.1}, {offset:.1}) scale({scale:.1})" /></g>"#,
                path = icon.path,
            ));
        }
    }

    let display_text = if tokens.uppercase {
        text.to_uppercase()
    } else {
        text.to_string()
    };
    parts.push(format!(
        r#"<text x="{text_x}" y="{text_y}" font-family="{family}" font-size="{size}" font-weight="{weight}" text-anchor="middle" fill="currentColor">{content}</text>"#,
        family = font_family(tokens.font),
        size = font_size(tokens.text_size),
        weight = font_weight(tokens.text_style),
        content = escape_xml(&display_text),
    ));

    parts.push("</svg>".to_string());
    parts.join("\n")
}

// ============================================================================
// Fallback templates
// ============================================================================

fn fallback_templates(has_icon: bool) -> Vec<DesignTokens> {
    let mut templates = vec![
        DesignTokens {
            name: "Minimal".into(),
            style: "Clean text-focused with subtle accent".into(),
            reasoning: "Clean composition with restrained icon placement.".into(),
            composition: Composition::Minimal,
            text_size: TextSize::L,
            text_style: TextStyle::Bold,
            font: Font::Sans,
            icon_position: IconPosition::Below,
            icon_scale: IconScale::S,
            border: Border::None,
            uppercase: true,
        },
        DesignTokens {
            name: "Bold Statement".into(),
            style: "Maximum impact with large elements".into(),
            reasoning: "Commands attention through scale and contrast.".into(),
            composition: Composition::Stacked,
            text_size: TextSize::Xl,
            text_style: TextStyle::Black,
            font: Font::Display,
            icon_position: IconPosition::Above,
            icon_scale: IconScale::Xl,
            border: Border::Underline,
            uppercase: true,
        },
        DesignTokens {
            name: "Retro Badge".into(),
            style: "Vintage-inspired circular composition".into(),
            reasoning: "Nostalgic aesthetic with circular framing.".into(),
            composition: Composition::Badge,
            text_size: TextSize::M,
            text_style: TextStyle::Bold,
            font: Font::Serif,
            icon_position: IconPosition::Above,
            icon_scale: IconScale::L,
            border: Border::DoubleCircle,
            uppercase: true,
        },
    ];
    if !has_icon {
        for template in &mut templates {
            template.icon_position = IconPosition::None;
        }
    }
    templates
}

/// Which fallback template a vibe plays to; decides the default ordering
/// when the generator is unavailable.
fn vibe_favorite(vibe: Option<&str>) -> Option<&'static str> {
    match vibe {
        Some("minimal") => Some("Minimal"),
        Some("bold") | Some("sporty") => Some("Bold Statement"),
        Some("retro") | Some("cute") => Some("Retro Badge"),
        _ => None,
    }
}

// ============================================================================
// Generation
// ============================================================================

fn assemble(tokens: Vec<DesignTokens>, text: &str, icon: &Icon) -> GeneratedDesigns {
    let variants: Vec<DesignVariant> = tokens
        .iter()
        .take(3)
        .enumerate()
        .map(|(i, t)| DesignVariant {
            // Ids are always A, B, C with a descending synthetic score used
            // only as a default-ordering tie-break.
            id: char::from(b'A' + i as u8).to_string(),
            name: t.name.clone(),
            style: t.style.clone(),
            svg: render_design(t, text, icon),
            score: 90 - (i as u32) * 5,
            reasoning: t.reasoning.clone(),
        })
        .collect();
    let recommended = variants
        .first()
        .map(|v| v.id.clone())
        .unwrap_or_else(|| "A".to_string());
    GeneratedDesigns {
        variants,
        recommended,
    }
}

fn fallback_designs(
    text: &str,
    icon: &Icon,
    has_icon: bool,
    vibe: Option<&str>,
) -> GeneratedDesigns {
    let mut templates = fallback_templates(has_icon);
    if let Some(favorite) = vibe_favorite(vibe) {
        if let Some(pos) = templates.iter().position(|t| t.name == favorite) {
            let favorite = templates.remove(pos);
            templates.insert(0, favorite);
        }
    }
    assemble(templates, text, icon)
}

/// Generate three design variants for the `(text, icon, vibe, occasion)`
/// tuple: propose tokens (model-assisted), sanitize, render. Falls back to
/// the hand-authored templates on any failure so the caller always gets
/// three renderable designs.
pub async fn generate_variants(
    backend: &dyn ChatBackend,
    text: &str,
    icon_id: Option<&str>,
    vibe: Option<&str>,
    occasion: Option<&str>,
) -> GeneratedDesigns {
    let has_icon = icon_id.is_some_and(|id| id != ICON_NONE);
    let icon = icon_id
        .and_then(icon_by_id)
        .or_else(|| icon_by_id("star"))
        .expect("star icon exists in the library");

    let prompt = build_design_prompt(text, icon_id, vibe, occasion);
    let messages = [crate::engine::llm::ChatMessage::system(prompt)];

    match backend.complete(&messages, true).await {
        Ok(raw) => match extract_json_array(&raw, &["designs", "layouts"]) {
            Some(layouts) if !layouts.is_empty() => {
                let tokens: Vec<DesignTokens> = layouts
                    .iter()
                    .take(3)
                    .enumerate()
                    .map(|(i, layout)| sanitize_design(layout, has_icon, i))
                    .collect();
                assemble(tokens, text, icon)
            }
            _ => {
                tracing::warn!("design generator returned no layouts, using templates");
                fallback_designs(text, icon, has_icon, vibe)
            }
        },
        Err(err) => {
            tracing::warn!(error = %err, "design generation failed, using templates");
            fallback_designs(text, icon, has_icon, vibe)
        }
    }
}

/// Pick a readable foreground for a given background color.
pub fn contrast_color(bg_hex: &str) -> &'static str {
    let hex = bg_hex.trim_start_matches('#');
    if hex.len() < 6 || !hex.is_char_boundary(6) {
        return "#1a1a1a";
    }
    let channel =
        |range: std::ops::Range<usize>| u32::from_str_radix(&hex[range], 16).unwrap_or(0) as f64;
    let luminance =
        (0.299 * channel(0..2) + 0.587 * channel(2..4) + 0.114 * channel(4..6)) / 255.0;
    if luminance > 0.5 {
        "#1a1a1a"
    } else {
        "#f5f5f5"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::llm::testing::ScriptedBackend;
    use serde_json::json;

    #[test]
    fn test_sanitize_falls_back_per_field() {
        let raw = json!({
            "name": "Neon",
            "composition": "hexagonal",
            "textSize": "xxl",
            "font": "serif",
            "iconPosition": "left",
            "border": "lasers"
        });
        let tokens = sanitize_design(&raw, true, 0);
        assert_eq!(tokens.name, "Neon");
        assert_eq!(tokens.composition, Composition::Minimal);
        assert_eq!(tokens.text_size, TextSize::M);
        assert_eq!(tokens.font, Font::Serif);
        assert_eq!(tokens.icon_position, IconPosition::Left);
        assert_eq!(tokens.border, Border::None);
    }

    #[test]
    fn test_sanitize_forces_icon_position() {
        let raw = json!({ "iconPosition": "above" });
        assert_eq!(
            sanitize_design(&raw, false, 0).icon_position,
            IconPosition::None
        );
        let raw = json!({ "iconPosition": "none" });
        assert_eq!(
            sanitize_design(&raw, true, 0).icon_position,
            IconPosition::Above
        );
    }

    #[test]
    fn test_sanitize_default_name_by_index() {
        let tokens = sanitize_design(&json!({}), false, 2);
        assert_eq!(tokens.name, "Design 3");
    }

    #[test]
    fn test_render_is_deterministic_and_well_formed() {
        let tokens = &fallback_templates(true)[1];
        let icon = icon_by_id("star").unwrap();
        let first = render_design(tokens, "Stay Wild", icon);
        let second = render_design(tokens, "Stay Wild", icon);
        assert_eq!(first, second);
        assert!(first.starts_with("<svg"));
        assert!(first.ends_with("</svg>"));
        assert!(first.contains("STAY WILD"));
        assert!(first.contains(icon.path));
        // Bold Statement carries an underline
        assert!(first.contains("<line"));
    }

    #[test]
    fn test_render_escapes_text() {
        let tokens = &fallback_templates(false)[0];
        let icon = icon_by_id("star").unwrap();
        let svg = render_design(tokens, "Cats & <Dogs>", icon);
        assert!(svg.contains("CATS &amp; &lt;DOGS&gt;"));
    }

    #[test]
    fn test_render_without_icon_has_no_icon_path() {
        let tokens = &fallback_templates(false)[0];
        let icon = icon_by_id("star").unwrap();
        let svg = render_design(tokens, "Hi", icon);
        assert!(!svg.contains(icon.path));
    }

    #[tokio::test]
    async fn test_generate_from_model_tokens() {
        let layouts = json!([
            { "name": "One", "composition": "badge", "iconPosition": "above" },
            { "name": "Two", "composition": "banner", "iconPosition": "behind" },
            { "name": "Three", "composition": "split", "iconPosition": "left" }
        ]);
        let backend = ScriptedBackend::replying(&layouts.to_string());
        let designs = generate_variants(&backend, "Go Team", Some("star"), None, None).await;

        assert_eq!(designs.variants.len(), 3);
        assert_eq!(designs.variants[0].id, "A");
        assert_eq!(designs.variants[1].id, "B");
        assert_eq!(designs.variants[2].id, "C");
        assert_eq!(designs.recommended, "A");
        assert!(designs.variants[0].score > designs.variants[1].score);
        assert!(designs.variants[1].score > designs.variants[2].score);
        assert_eq!(designs.variants[0].name, "One");
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_backend_failure() {
        let backend = ScriptedBackend::failing();
        let designs = generate_variants(&backend, "Go", Some("star"), None, None).await;
        assert_eq!(designs.variants.len(), 3);
        assert_eq!(designs.variants[0].name, "Minimal");
    }

    #[tokio::test]
    async fn test_generate_falls_back_on_prose_reply() {
        let backend = ScriptedBackend::replying("Here are some lovely ideas for you!");
        let designs = generate_variants(&backend, "Go", None, Some("retro"), None).await;
        assert_eq!(designs.variants.len(), 3);
        // Retro vibe puts the badge template first
        assert_eq!(designs.variants[0].name, "Retro Badge");
        assert_eq!(designs.variants[0].score, 90);
    }

    #[test]
    fn test_contrast_color() {
        assert_eq!(contrast_color("#ffffff"), "#1a1a1a");
        assert_eq!(contrast_color("#1a1a1a"), "#f5f5f5");
        assert_eq!(contrast_color("bogus"), "#1a1a1a");
    }
}
