use serde::{Deserialize, Serialize};

/// Platform-independent reply produced for every inbound message. Delivery
/// adapters translate it into a chat platform's wire format.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReplyPayload {
    PlainText { text: String },
    ButtonMenu(ButtonMenu),
    QuickReplyMenu(QuickReplyMenu),
    Carousel(Carousel),
    Confirm(ConfirmPrompt),
}

impl ReplyPayload {
    pub fn text(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::PlainText { .. } => "plain_text",
            Self::ButtonMenu(_) => "button_menu",
            Self::QuickReplyMenu(_) => "quick_reply_menu",
            Self::Carousel(_) => "carousel",
            Self::Confirm(_) => "confirm",
        }
    }
}

/// A tappable option. `payload` is the text sent back on the user's behalf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuOption {
    pub label: String,
    pub payload: String,
}

impl MenuOption {
    pub fn new(label: impl Into<String>, payload: impl Into<String>) -> Self {
        Self { label: label.into(), payload: payload.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonMenu {
    pub thumbnail_url: Option<String>,
    pub title: String,
    pub text: String,
    pub options: Vec<MenuOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickReplyMenu {
    pub text: String,
    pub options: Vec<MenuOption>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Carousel {
    pub cards: Vec<CarouselCard>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarouselCard {
    pub title: String,
    pub body: String,
    pub thumbnail_url: Option<String>,
    pub actions: Vec<DetailAction>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmPrompt {
    pub text: String,
    pub confirm: MenuOption,
    pub cancel: MenuOption,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    Address,
    Phone,
    Comment,
}

impl DetailKind {
    pub const ALL: [DetailKind; 3] = [Self::Address, Self::Phone, Self::Comment];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Phone => "phone",
            Self::Comment => "comment",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "address" => Some(Self::Address),
            // older cards spelled it `phon`
            "phone" | "phon" => Some(Self::Phone),
            "comment" => Some(Self::Comment),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Address => "餐廳地址",
            Self::Phone => "連絡電話",
            Self::Comment => "餐廳評價",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Address => "這是地址",
            Self::Phone => "這是電話",
            Self::Comment => "這是評論",
        }
    }
}

/// A card action that asks for one detail of the card's restaurant. `value` is
/// resolved when the card is built so the answer needs no catalog lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailAction {
    pub kind: DetailKind,
    pub label: String,
    pub value: String,
}

impl DetailAction {
    pub fn new(kind: DetailKind, value: Option<&str>) -> Self {
        Self {
            kind,
            label: kind.label().to_owned(),
            value: value.unwrap_or(kind.placeholder()).to_owned(),
        }
    }
}
