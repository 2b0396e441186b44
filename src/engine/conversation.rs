use serde::{Deserialize, Serialize};

use crate::catalog::{product_by_id, Product};
use crate::constraints::{validate, Action, CustomizationLimits, SanitizedUpdates};
use crate::engine::extract::extract_json;
use crate::engine::keyword::parse_keyword_updates;
use crate::engine::llm::{ChatBackend, ChatMessage};
use crate::engine::prompt::build_customize_prompt;
use crate::icons::ICON_NONE;

/// How many prior turns ride along to the model.
const HISTORY_WINDOW: usize = 8;

const FALLBACK_PROMPT: &str = "Tell me a bit more about what you'd like to make.";
const OFFLINE_MESSAGE: &str =
    "I'm having trouble connecting right now. I've updated based on what I understood.";

/// Conversation stage. Advisory only: it steers suggested quick replies
/// and prompt phrasing, never functionality. Readiness is the
/// [`ConversationState::can_add_to_cart`] predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Welcome,
    Product,
    Intent,
    Text,
    Icon,
    Generating,
    Preview,
    Complete,
}

impl Stage {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "welcome" => Some(Stage::Welcome),
            "product" => Some(Stage::Product),
            "intent" => Some(Stage::Intent),
            "text" => Some(Stage::Text),
            "icon" => Some(Stage::Icon),
            "generating" => Some(Stage::Generating),
            "preview" => Some(Stage::Preview),
            "complete" => Some(Stage::Complete),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    // Clients may send bare {role, content} pairs; id and timestamp are
    // presentation metadata.
    #[serde(default)]
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    #[serde(default)]
    pub timestamp: i64,
}

/// Accumulated customization state for one conversation. Owned by the
/// client and replayed with each request; the server never stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConversationState {
    pub stage: Option<Stage>,
    pub product: Option<Product>,
    pub occasion: Option<String>,
    pub vibe: Option<String>,
    pub text: Option<String>,
    pub icon: Option<String>,
    pub product_color: Option<String>,
    pub text_color: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<u32>,
    pub messages: Vec<Message>,
}

impl ConversationState {
    pub fn stage(&self) -> Stage {
        self.stage.unwrap_or(Stage::Welcome)
    }

    /// True when the icon slot holds a real icon, not the removal sentinel.
    pub fn has_icon(&self) -> bool {
        matches!(&self.icon, Some(id) if id != ICON_NONE)
    }

    /// Functional gate for the add-to-cart action: a product, something to
    /// print (text or icon), and a resolved garment color. Deliberately
    /// independent of `stage`.
    pub fn can_add_to_cart(&self) -> bool {
        self.product.is_some()
            && (self.text.is_some() || self.has_icon())
            && self.product_color.is_some()
    }

    /// Which slots the assistant should steer the user toward next.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.product.is_none() {
            missing.push("product");
        }
        if self.text.is_none() && !self.has_icon() {
            missing.push("text or icon");
        }
        if self.product_color.is_none() {
            missing.push("color");
        }
        if self.size.is_none()
            && self
                .product
                .as_ref()
                .is_some_and(|p| p.sizes.is_some())
        {
            missing.push("size");
        }
        missing
    }

    /// Apply sanitized updates. All customization fields are monotonic:
    /// a new value overwrites, absence leaves the old value alone, and only
    /// the explicit `remove_icon` action can blank the icon (to the
    /// sentinel, never to null).
    pub fn apply_updates(&mut self, updates: &SanitizedUpdates) {
        if let Some(ref id) = updates.product_id {
            if let Some(product) = product_by_id(id) {
                self.product = Some(product.clone());
            }
        }
        if updates.occasion.is_some() {
            self.occasion = updates.occasion.clone();
        }
        if updates.vibe.is_some() {
            self.vibe = updates.vibe.clone();
        }
        if updates.text.is_some() {
            self.text = updates.text.clone();
        }
        if updates.icon_id.is_some() {
            self.icon = updates.icon_id.clone();
        }
        if updates.product_color.is_some() {
            self.product_color = updates.product_color.clone();
        }
        if updates.text_color.is_some() {
            self.text_color = updates.text_color.clone();
        }
        if updates.size.is_some() {
            self.size = updates.size.clone();
        }
        if updates.quantity.is_some() {
            self.quantity = updates.quantity;
        }
        if updates.action == Some(Action::RemoveIcon) {
            self.icon = Some(ICON_NONE.to_string());
        }
        if let Some(stage) = updates.stage {
            self.stage = Some(stage.max(self.stage()));
        }
        self.advance_stage();
    }

    /// Soft progression: nudge the stage forward once the fields it waits
    /// on are filled. Several fields arriving in one turn may skip stages
    /// entirely; that is fine, the stage is advisory.
    fn advance_stage(&mut self) {
        let suggested = if self.can_add_to_cart() {
            Stage::Preview
        } else if self.product.is_some() && (self.text.is_some() || self.has_icon()) {
            Stage::Icon
        } else if self.product.is_some() && (self.occasion.is_some() || self.vibe.is_some()) {
            Stage::Text
        } else if self.product.is_some() {
            Stage::Intent
        } else {
            Stage::Welcome
        };
        if suggested > self.stage() {
            self.stage = Some(suggested);
        }
    }

    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }
}

/// Cache key for design regeneration: variants are recomputed only when
/// this tuple changes.
pub fn design_key(state: &ConversationState) -> String {
    format!(
        "{}|{}|{}|{}",
        state.text.as_deref().unwrap_or(""),
        state.icon.as_deref().unwrap_or(""),
        state.vibe.as_deref().unwrap_or(""),
        state.occasion.as_deref().unwrap_or("")
    )
}

/// True when the `(text, icon, vibe, occasion)` tuple changed since the
/// last generation; identical tuples are a no-op.
pub fn should_regenerate(state: &ConversationState, last_key: Option<&str>) -> bool {
    last_key != Some(design_key(state).as_str())
}

/// Canned slogan suggestions keyed by occasion.
pub fn suggest_slogans(occasion: Option<&str>) -> &'static [&'static str] {
    match occasion {
        Some("gift") => &[
            "Made With Love",
            "You Are Amazing",
            "Celebrate Good Times",
            "Special For You",
        ],
        Some("team") => &[
            "Stronger Together",
            "Team Spirit",
            "United We Stand",
            "One Team One Dream",
        ],
        Some("event") => &[
            "Make Memories",
            "Good Vibes Only",
            "Celebrate Life",
            "Epic Moments",
        ],
        Some("personal") => &["Be Yourself", "Stay True", "Own Your Story", "Live Fully"],
        _ => &[
            "Stay Wild",
            "Dream Big",
            "Good Vibes",
            "Make It Happen",
            "Born To Create",
            "Never Stop",
        ],
    }
}

/// Outcome of one conversation turn.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineResult {
    pub assistant_message: String,
    pub updates: SanitizedUpdates,
    pub fallback_used: bool,
}

/// Right-biased merge: the deterministic path wins any field both paths
/// populated. Reproducible slot-filling beats model creativity here; the
/// model remains the sole source of reply text and of stage transitions
/// when no rule fires.
pub fn merge_updates(model: SanitizedUpdates, deterministic: SanitizedUpdates) -> SanitizedUpdates {
    SanitizedUpdates {
        stage: deterministic.stage.or(model.stage),
        product_id: deterministic.product_id.or(model.product_id),
        occasion: deterministic.occasion.or(model.occasion),
        vibe: deterministic.vibe.or(model.vibe),
        text: deterministic.text.or(model.text),
        icon_id: deterministic.icon_id.or(model.icon_id),
        product_color: deterministic.product_color.or(model.product_color),
        text_color: deterministic.text_color.or(model.text_color),
        size: deterministic.size.or(model.size),
        quantity: deterministic.quantity.or(model.quantity),
        budget_max: deterministic.budget_max.or(model.budget_max),
        lead_time_max: deterministic.lead_time_max.or(model.lead_time_max),
        materials: deterministic.materials.or(model.materials),
        tags: deterministic.tags.or(model.tags),
        action: deterministic.action.or(model.action),
    }
}

struct ParsedReply {
    assistant: Option<String>,
    raw_updates: serde_json::Value,
}

fn parse_reply(raw: &str) -> Option<ParsedReply> {
    let value = extract_json(raw)?;
    let assistant = value
        .get("assistant")
        .and_then(|a| a.as_str())
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty());
    let raw_updates = value.get("updates").cloned().unwrap_or(serde_json::Value::Null);
    Some(ParsedReply {
        assistant,
        raw_updates,
    })
}

/// Run one customization turn: model extraction with one self-correction
/// retry, deterministic keyword extraction, independent validation of both,
/// and a deterministic-precedence merge.
///
/// Never errors: a dead backend degrades to keyword-only updates plus a
/// fallback message, flagged via `fallback_used`.
pub async fn process_turn(
    backend: &dyn ChatBackend,
    state: &ConversationState,
    user_message: &str,
    history: &[Message],
    limits: &CustomizationLimits,
) -> EngineResult {
    let keyword_raw = parse_keyword_updates(user_message);
    let keyword_updates = validate(&keyword_raw, state.product.as_ref(), limits);

    let system_prompt = build_customize_prompt(state, limits);
    let mut messages: Vec<ChatMessage> = Vec::with_capacity(HISTORY_WINDOW + 2);
    messages.push(ChatMessage::system(system_prompt));
    let tail = history.len().saturating_sub(HISTORY_WINDOW);
    for message in &history[tail..] {
        messages.push(match message.role {
            MessageRole::User => ChatMessage::user(&message.content),
            MessageRole::Assistant => ChatMessage::assistant(&message.content),
        });
    }
    messages.push(ChatMessage::user(user_message));

    let raw = match backend.complete(&messages, true).await {
        Ok(raw) => raw,
        Err(err) => {
            tracing::warn!(error = %err, "model path unavailable, keyword-only turn");
            return EngineResult {
                assistant_message: OFFLINE_MESSAGE.to_string(),
                updates: keyword_updates,
                fallback_used: true,
            };
        }
    };

    let mut parsed = parse_reply(&raw);
    let mut final_raw = raw;

    // One self-correction round: show the model its own invalid output and
    // demand valid JSON.
    if parsed.is_none() {
        tracing::debug!("model reply was not valid JSON, requesting correction");
        messages.push(ChatMessage::assistant(&final_raw));
        messages.push(ChatMessage::system(
            "You failed to provide valid JSON. Correct your previous response and return ONLY a valid JSON object.",
        ));
        if let Ok(retry_raw) = backend.complete(&messages, true).await {
            parsed = parse_reply(&retry_raw);
            if parsed.is_some() {
                final_raw = retry_raw;
            }
        }
    }

    let (assistant_message, model_updates) = match parsed {
        Some(reply) => {
            let updates = validate(&reply.raw_updates, state.product.as_ref(), limits);
            let assistant = reply
                .assistant
                .unwrap_or_else(|| fallback_assistant(&final_raw));
            (assistant, updates)
        }
        None => (fallback_assistant(&final_raw), SanitizedUpdates::default()),
    };

    EngineResult {
        assistant_message,
        updates: merge_updates(model_updates, keyword_updates),
        fallback_used: false,
    }
}

fn fallback_assistant(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        FALLBACK_PROMPT.to_string()
    } else {
        trimmed.to_string()
    }
}
