use crate::catalog::products;
use crate::constraints::{CustomizationLimits, OCCASIONS, TEXT_COLOR_OPTIONS, VIBES};
use crate::engine::conversation::ConversationState;
use crate::engine::discover::DiscoverState;
use crate::icons::icon_library;
use crate::inventory::AcpItem;

/// System prompt for a customization turn. Embeds the current state
/// snapshot and every permitted vocabulary so the model can only pick
/// values the validator will accept. The validator re-checks anyway.
pub fn build_customize_prompt(state: &ConversationState, limits: &CustomizationLimits) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a friendly, confident merch design assistant.\n");
    prompt.push_str("Keep responses concise, helpful, and action-oriented. Ask only one question at a time.\n");
    prompt.push_str("Return ONLY a JSON object with this shape:\n");
    prompt.push_str(r#"{ "assistant": string, "updates": { "stage"?: string, "productId"?: string, "occasion"?: string, "vibe"?: string, "text"?: string, "iconId"?: string, "productColor"?: string, "textColor"?: string, "size"?: string, "quantity"?: number, "action"?: "add_to_cart" | "remove_icon" } }"#);
    prompt.push('\n');
    prompt.push_str("IMPORTANT: You MUST return valid JSON. Do not include any text outside the JSON object. No markdown, no code fences.\n");
    prompt.push_str("NEVER use placeholders like \"string\", \"number\", or type names as values. Always use real values from the catalog.\n\n");

    prompt.push_str("Products:\n");
    for product in products() {
        let colors: Vec<&str> = product.colors.iter().map(|c| c.name.as_str()).collect();
        let sizes = match &product.sizes {
            Some(sizes) => sizes.join(", "),
            None => "one size".to_string(),
        };
        prompt.push_str(&format!(
            "- {} ({}): colors {}. Sizes: {}.\n",
            product.id,
            product.name,
            colors.join(", "),
            sizes
        ));
    }

    let icons: Vec<&str> = icon_library().iter().map(|i| i.id).collect();
    prompt.push_str(&format!("Icons: {}.\n", icons.join(", ")));
    let text_colors: Vec<&str> = TEXT_COLOR_OPTIONS.iter().map(|c| c.name.as_str()).collect();
    prompt.push_str(&format!("Text colors: {}.\n", text_colors.join(", ")));
    prompt.push_str(&format!("Allowed vibes: {}.\n", VIBES.join(", ")));
    prompt.push_str(&format!("Allowed occasions: {}.\n\n", OCCASIONS.join(", ")));

    prompt.push_str("RULES:\n");
    prompt.push_str("- Only support the products listed above. If the user asks for anything else, politely decline and offer the catalog.\n");
    prompt.push_str("- The user can specify product, text, icon, color, size in any order or all at once.\n");
    prompt.push_str("- Set productId and productColor for the garment (e.g., \"navy tee\").\n");
    prompt.push_str("- Set textColor for the design/icon color (e.g., \"white star\", \"red text\").\n");
    prompt.push_str("- When the user mentions text for their design (quoted or not), set updates.text to that text.\n");
    prompt.push_str(&format!(
        "- If the text is over {} characters, ask them to shorten it instead of setting it.\n",
        limits.text_max_length
    ));
    prompt.push_str("- If the user mentions size or quantity, set size/quantity.\n");
    prompt.push_str("- If the user asks to remove the icon, set action: \"remove_icon\" and iconId: \"none\".\n");
    prompt.push_str("- If the user is ready to buy, set action: \"add_to_cart\".\n");
    prompt.push_str("- If you cannot confidently extract a value, leave it out.\n");
    prompt.push_str("- Stage progression is welcome -> product -> intent -> text -> icon -> preview; stages may be skipped when the user supplies several fields at once.\n");

    let missing = state.missing_fields();
    if missing.is_empty() {
        prompt.push_str("- All required fields are filled. The user can customize further or add to cart.\n");
    } else {
        prompt.push_str(&format!(
            "- The user still needs to provide: {}. Guide them toward filling these.\n",
            missing.join(", ")
        ));
    }

    let snapshot = serde_json::json!({
        "stage": state.stage(),
        "product": state.product.as_ref().map(|p| p.id.as_str()),
        "text": state.text,
        "icon": state.icon,
        "productColor": state.product_color,
        "textColor": state.text_color,
        "size": state.size,
        "quantity": state.quantity,
        "occasion": state.occasion,
        "vibe": state.vibe,
    });
    prompt.push_str(&format!("\nCurrent state: {}\n", snapshot));

    prompt
}

/// System prompt for a discovery turn, with the pre-filtered candidate
/// inventory inlined so the model can only select real item ids.
pub fn build_discover_prompt(state: &DiscoverState, candidates: &[AcpItem]) -> String {
    let inventory: Vec<serde_json::Value> = candidates
        .iter()
        .map(|item| {
            serde_json::json!({
                "item_id": item.item_id,
                "title": item.title,
                "description": item.description,
                "price": item.price,
                "availability": item.availability.as_str(),
                "materials": item.attributes.materials,
                "tags": item.attributes.tags,
                "colors": item.attributes.variants.colors.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "lead_time_days": item.attributes.lead_time_days,
                "min_qty": item.attributes.min_qty,
            })
        })
        .collect();

    let mut prompt = String::new();
    prompt.push_str("You are an inventory discovery assistant for custom merch.\n");
    prompt.push_str("Return ONLY a JSON object with this shape:\n");
    prompt.push_str(r#"{ "assistant": string, "updates": { "stage"?: string, "category"?: string, "budgetMax"?: number, "materials"?: string[], "sustainable"?: boolean, "quantity"?: number, "eventDate"?: string, "tags"?: string[], "occasion"?: string, "color"?: string, "leadTimeMax"?: number, "size"?: string }, "selection": { "primaryIds"?: string[], "fallbackIds"?: string[], "rationale"?: string } }"#);
    prompt.push('\n');
    prompt.push_str("Do not include markdown or code fences.\n");
    prompt.push_str("Only use categories: tee, hoodie, tote, mug.\n");
    prompt.push_str("Only use colors: white, black, navy, forest, burgundy, natural, charcoal.\n");
    prompt.push_str("Only use sizes: XS, S, M, L, XL, 2XL.\n");
    prompt.push_str("Only choose item_id values that exist in Inventory.\n");
    prompt.push_str("Prefer 1 primary item and up to 2 fallback items.\n");
    prompt.push_str("If constraints are ambiguous or missing (e.g., no category, no budget, no quantity, no color), ask a clarifying question in assistant.\n");
    prompt.push_str("Use stage progression: welcome -> constraints -> results.\n");
    prompt.push_str(&format!(
        "Current state: {}\n",
        serde_json::to_string(state).unwrap_or_else(|_| "{}".to_string())
    ));
    prompt.push_str(&format!(
        "Inventory: {}\n",
        serde_json::Value::Array(inventory)
    ));

    prompt
}

/// Prompt asking the model to pick three design token sets from the closed
/// vocabularies. The renderer re-validates every field, so the model can
/// produce a boring layout but never a broken one.
pub fn build_design_prompt(
    text: &str,
    icon_id: Option<&str>,
    vibe: Option<&str>,
    occasion: Option<&str>,
) -> String {
    let has_icon = icon_id.is_some_and(|id| id != "none");

    let mut prompt = String::new();
    prompt.push_str("You are a graphic design assistant. Return ONLY valid JSON: an array of exactly 3 design token objects.\n");
    prompt.push_str("Each object picks one value per field from these vocabularies:\n");
    prompt.push_str(r#"{ "name": string, "style": string, "reasoning": string, "composition": "stacked" | "badge" | "split" | "overlay" | "minimal" | "banner", "textSize": "s" | "m" | "l" | "xl", "textStyle": "regular" | "bold" | "black", "font": "sans" | "serif" | "display", "iconPosition": "above" | "below" | "left" | "behind" | "none", "iconScale": "s" | "m" | "l" | "xl", "border": "none" | "underline" | "circle" | "double-circle" | "frame", "uppercase": boolean }"#);
    prompt.push('\n');
    prompt.push_str("RULES:\n");
    prompt.push_str("- Make the 3 designs VERY different from each other.\n");
    prompt.push_str(&format!("- The design text is: \"{}\"\n", text));
    if has_icon {
        prompt.push_str(&format!(
            "- Include the \"{}\" icon in each design (iconPosition must not be \"none\").\n",
            icon_id.unwrap_or_default()
        ));
    } else {
        prompt.push_str("- No icon is selected. Set iconPosition to \"none\".\n");
    }
    if let Some(vibe) = vibe {
        prompt.push_str(&format!("- Design vibe: {}\n", vibe));
    }
    if let Some(occasion) = occasion {
        prompt.push_str(&format!("- Occasion: {}\n", occasion));
    }
    prompt.push_str("- Think about hierarchy, balance, and whitespace.\n");
    prompt.push_str("Return ONLY the JSON array. No markdown, no explanation.\n");

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::product_by_id;

    #[test]
    fn test_customize_prompt_embeds_state_and_vocabularies() {
        let mut state = ConversationState::default();
        state.product = product_by_id("classic-tee").cloned();
        state.text = Some("Stay Wild".into());
        let prompt = build_customize_prompt(&state, &CustomizationLimits::default());

        assert!(prompt.contains("classic-tee"));
        assert!(prompt.contains("Stay Wild"));
        assert!(prompt.contains("ONLY a JSON object"));
        assert!(prompt.contains("remove_icon"));
        // Vocabulary lists are embedded
        assert!(prompt.contains("minimal, bold, retro, cute, sporty"));
    }

    #[test]
    fn test_customize_prompt_lists_missing_fields() {
        let state = ConversationState::default();
        let prompt = build_customize_prompt(&state, &CustomizationLimits::default());
        assert!(prompt.contains("still needs to provide"));
        assert!(prompt.contains("product"));
    }

    #[test]
    fn test_design_prompt_icon_rules() {
        let with = build_design_prompt("GO", Some("star"), Some("bold"), None);
        assert!(with.contains("\"star\" icon"));
        let without = build_design_prompt("GO", None, None, None);
        assert!(without.contains("No icon is selected"));
        let sentinel = build_design_prompt("GO", Some("none"), None, None);
        assert!(sentinel.contains("No icon is selected"));
    }
}
