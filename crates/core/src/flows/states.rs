use serde::{Deserialize, Serialize};

use crate::domain::item::MealTime;
use crate::intent::{DemoKind, Intent};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogState {
    Idle,
    CategoryChosen(MealTime),
}

impl DialogState {
    pub fn from_session(selection: Option<MealTime>) -> Self {
        match selection {
            Some(category) => Self::CategoryChosen(category),
            None => Self::Idle,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogAction {
    ReplyDemo(DemoKind),
    PresentCategoryMenu,
    PresentAreaMenu(MealTime),
    RememberCategory(MealTime),
    SampleRecommendations { category: MealTime, area: String },
    Acknowledge,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOutcome {
    pub from: DialogState,
    pub to: DialogState,
    pub intent: Intent,
    pub actions: Vec<DialogAction>,
}
