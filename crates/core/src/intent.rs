use serde::{Deserialize, Serialize};

pub const SAMPLE_TRIGGER: &str = "sample";
pub const RECOMMEND_TRIGGER: &str = "美食推薦";
pub const MARKER_PREFIX: char = '#';
pub const MEAL_SUFFIX: char = '餐';
pub const AREA_SUFFIX: char = '區';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemoKind {
    Buttons,
    Carousel,
    Confirm,
    QuickReply,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", content = "value", rename_all = "snake_case")]
pub enum Intent {
    ShowSamples(DemoKind),
    ShowCategoryMenu,
    /// Carries the full message, marker included, e.g. `#文青早餐`.
    ShowSubcategoryMenu(String),
    /// Carries the area name with the marker stripped, e.g. `中區`.
    ShowRecommendations(String),
    Fallback,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ShowSamples(_) => "show_samples",
            Self::ShowCategoryMenu => "show_category_menu",
            Self::ShowSubcategoryMenu(_) => "show_subcategory_menu",
            Self::ShowRecommendations(_) => "show_recommendations",
            Self::Fallback => "fallback",
        }
    }
}

type Rule = fn(&str) -> Option<Intent>;

/// Evaluated top to bottom; the first rule that matches wins.
const RULES: [(&str, Rule); 4] = [
    ("sample_demo", sample_demo),
    ("recommend_trigger", recommend_trigger),
    ("meal_selection", meal_selection),
    ("area_selection", area_selection),
];

const DEMO_KINDS: [(&str, DemoKind); 3] = [
    ("按鈕sample", DemoKind::Buttons),
    ("輪播sample", DemoKind::Carousel),
    ("確認sample", DemoKind::Confirm),
];

#[derive(Clone, Copy, Debug, Default)]
pub struct IntentRouter;

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    /// Matching is literal on the raw text: no trimming or case folding.
    pub fn classify(&self, text: &str) -> Intent {
        self.classify_with_rule(text).0
    }

    pub fn classify_with_rule(&self, text: &str) -> (Intent, &'static str) {
        RULES
            .iter()
            .find_map(|(name, rule)| rule(text).map(|intent| (intent, *name)))
            .unwrap_or((Intent::Fallback, "fallback"))
    }
}

fn sample_demo(text: &str) -> Option<Intent> {
    if !text.contains(SAMPLE_TRIGGER) {
        return None;
    }
    let kind = DEMO_KINDS
        .iter()
        .find(|(trigger, _)| text.contains(trigger))
        .map(|(_, kind)| *kind)
        .unwrap_or(DemoKind::QuickReply);
    Some(Intent::ShowSamples(kind))
}

fn recommend_trigger(text: &str) -> Option<Intent> {
    text.contains(RECOMMEND_TRIGGER).then_some(Intent::ShowCategoryMenu)
}

fn meal_selection(text: &str) -> Option<Intent> {
    (text.starts_with(MARKER_PREFIX) && text.ends_with(MEAL_SUFFIX))
        .then(|| Intent::ShowSubcategoryMenu(text.to_owned()))
}

fn area_selection(text: &str) -> Option<Intent> {
    if !text.ends_with(AREA_SUFFIX) {
        return None;
    }
    text.strip_prefix(MARKER_PREFIX).map(|area| Intent::ShowRecommendations(area.to_owned()))
}
