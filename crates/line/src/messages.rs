//! Translation of [`ReplyPayload`] into LINE Messaging API message objects.
//!
//! Field limits are enforced here by truncating (or dropping surplus items),
//! because the API rejects the whole reply when any one field is too long.

use eatba_core::domain::reply::{
    ButtonMenu, Carousel, CarouselCard, ConfirmPrompt, MenuOption, QuickReplyMenu, ReplyPayload,
};
use serde::Serialize;

use crate::postback::encode_detail;

pub const MAX_TEXT_CHARS: usize = 5_000;
pub const MAX_ALT_TEXT_CHARS: usize = 400;
pub const MAX_TITLE_CHARS: usize = 40;
/// Template text limit when a title or thumbnail is present.
pub const MAX_DECORATED_TEXT_CHARS: usize = 60;
pub const MAX_BUTTONS_TEXT_CHARS: usize = 160;
pub const MAX_CONFIRM_TEXT_CHARS: usize = 240;
pub const MAX_LABEL_CHARS: usize = 20;
pub const MAX_BUTTON_ACTIONS: usize = 4;
pub const MAX_COLUMN_ACTIONS: usize = 3;
pub const MAX_CAROUSEL_COLUMNS: usize = 10;
pub const MAX_QUICK_REPLY_ITEMS: usize = 13;

const CAROUSEL_ALT_TEXT: &str = "餐廳推薦";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LineMessage {
    Text {
        text: String,
        #[serde(rename = "quickReply", skip_serializing_if = "Option::is_none")]
        quick_reply: Option<QuickReply>,
    },
    Template {
        #[serde(rename = "altText")]
        alt_text: String,
        template: Template,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuickReply {
    pub items: Vec<QuickReplyItem>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct QuickReplyItem {
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Template {
    Buttons {
        #[serde(rename = "thumbnailImageUrl", skip_serializing_if = "Option::is_none")]
        thumbnail_image_url: Option<String>,
        title: String,
        text: String,
        actions: Vec<Action>,
    },
    Carousel {
        columns: Vec<CarouselColumn>,
    },
    Confirm {
        text: String,
        actions: Vec<Action>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CarouselColumn {
    #[serde(rename = "thumbnailImageUrl", skip_serializing_if = "Option::is_none")]
    pub thumbnail_image_url: Option<String>,
    pub title: String,
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Action {
    Message {
        label: String,
        text: String,
    },
    Postback {
        label: String,
        data: String,
    },
}

impl Action {
    pub fn message(option: &MenuOption) -> Self {
        Self::Message {
            label: truncate(&option.label, MAX_LABEL_CHARS),
            text: truncate(&option.payload, MAX_TEXT_CHARS),
        }
    }
}

pub fn render(payload: &ReplyPayload) -> LineMessage {
    match payload {
        ReplyPayload::PlainText { text } => {
            LineMessage::Text { text: truncate(text, MAX_TEXT_CHARS), quick_reply: None }
        }
        ReplyPayload::QuickReplyMenu(menu) => render_quick_reply(menu),
        ReplyPayload::ButtonMenu(menu) => render_buttons(menu),
        ReplyPayload::Carousel(carousel) => render_carousel(carousel),
        ReplyPayload::Confirm(prompt) => render_confirm(prompt),
    }
}

pub fn render_all(payloads: &[ReplyPayload]) -> Vec<LineMessage> {
    payloads.iter().map(render).collect()
}

fn render_quick_reply(menu: &QuickReplyMenu) -> LineMessage {
    let items = menu
        .options
        .iter()
        .take(MAX_QUICK_REPLY_ITEMS)
        .map(|option| QuickReplyItem { item_type: "action", action: Action::message(option) })
        .collect();

    LineMessage::Text {
        text: truncate(&menu.text, MAX_TEXT_CHARS),
        quick_reply: Some(QuickReply { items }),
    }
}

fn render_buttons(menu: &ButtonMenu) -> LineMessage {
    let decorated = menu.thumbnail_url.is_some() || !menu.title.is_empty();
    let text_limit = if decorated { MAX_DECORATED_TEXT_CHARS } else { MAX_BUTTONS_TEXT_CHARS };

    LineMessage::Template {
        alt_text: truncate(&alt_text_for(&menu.title, &menu.text), MAX_ALT_TEXT_CHARS),
        template: Template::Buttons {
            thumbnail_image_url: menu.thumbnail_url.clone(),
            title: truncate(&menu.title, MAX_TITLE_CHARS),
            text: truncate(&menu.text, text_limit),
            actions: menu.options.iter().take(MAX_BUTTON_ACTIONS).map(Action::message).collect(),
        },
    }
}

fn render_carousel(carousel: &Carousel) -> LineMessage {
    LineMessage::Template {
        alt_text: CAROUSEL_ALT_TEXT.to_owned(),
        template: Template::Carousel {
            columns: carousel.cards.iter().take(MAX_CAROUSEL_COLUMNS).map(render_column).collect(),
        },
    }
}

fn render_column(card: &CarouselCard) -> CarouselColumn {
    CarouselColumn {
        thumbnail_image_url: card.thumbnail_url.clone(),
        title: truncate(&card.title, MAX_TITLE_CHARS),
        text: truncate(&card.body, MAX_DECORATED_TEXT_CHARS),
        actions: card
            .actions
            .iter()
            .take(MAX_COLUMN_ACTIONS)
            .map(|action| Action::Postback {
                label: truncate(&action.label, MAX_LABEL_CHARS),
                data: encode_detail(action),
            })
            .collect(),
    }
}

fn render_confirm(prompt: &ConfirmPrompt) -> LineMessage {
    LineMessage::Template {
        alt_text: truncate(&prompt.text, MAX_ALT_TEXT_CHARS),
        template: Template::Confirm {
            text: truncate(&prompt.text, MAX_CONFIRM_TEXT_CHARS),
            actions: vec![Action::message(&prompt.confirm), Action::message(&prompt.cancel)],
        },
    }
}

fn alt_text_for(title: &str, text: &str) -> String {
    if title.is_empty() {
        text.to_owned()
    } else {
        format!("{title} {text}")
    }
}

/// Character-based truncation; LINE counts characters, not bytes.
fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
