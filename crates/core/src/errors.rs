use thiserror::Error;

use crate::domain::item::MealTime;
use crate::domain::reply::ReplyPayload;
use crate::flows::replies;

/// Failures a conversation can recover from. None of them reach the user as an
/// error; each maps to a reply through [`DialogError::fallback_reply`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DialogError {
    #[error("unknown category selection token `{token}`")]
    UnknownCategoryToken { token: String },
    #[error("area `{subcategory}` is not listed for {category}")]
    UnknownSubcategory { category: MealTime, subcategory: String },
    #[error("no active category selection")]
    NoActiveSession,
    #[error("{category} is not loaded in the catalog")]
    CategoryNotLoaded { category: MealTime },
}

impl DialogError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownCategoryToken { .. } => "unknown_category_token",
            Self::UnknownSubcategory { .. } => "unknown_subcategory",
            Self::NoActiveSession => "no_active_session",
            Self::CategoryNotLoaded { .. } => "category_not_loaded",
        }
    }

    pub fn fallback_reply(&self) -> ReplyPayload {
        match self {
            Self::UnknownCategoryToken { .. } | Self::CategoryNotLoaded { .. } => {
                replies::fallback()
            }
            Self::NoActiveSession => replies::restart_prompt(),
            Self::UnknownSubcategory { subcategory, .. } => replies::unknown_area(subcategory),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::item::MealTime;
    use crate::domain::reply::ReplyPayload;
    use crate::errors::DialogError;
    use crate::flows::replies;

    #[test]
    fn unknown_token_degrades_to_static_fallback() {
        let error = DialogError::UnknownCategoryToken { token: "#宵夜餐".to_owned() };
        assert_eq!(error.fallback_reply(), replies::fallback());
        assert_eq!(error.kind(), "unknown_category_token");
    }

    #[test]
    fn missing_session_prompts_to_restart_the_flow() {
        let ReplyPayload::PlainText { text } = DialogError::NoActiveSession.fallback_reply() else {
            panic!("restart prompt should be plain text");
        };
        assert!(text.contains("美食推薦"));
    }

    #[test]
    fn unknown_area_reply_names_the_area() {
        let error = DialogError::UnknownSubcategory {
            category: MealTime::Dinner,
            subcategory: "大甲區".to_owned(),
        };
        let ReplyPayload::PlainText { text } = error.fallback_reply() else {
            panic!("unknown area reply should be plain text");
        };
        assert!(text.contains("大甲區"));
        assert_eq!(error.to_string(), "area `大甲區` is not listed for dinner");
    }
}
