use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealTime {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealTime {
    pub const ALL: [MealTime; 3] = [Self::Breakfast, Self::Lunch, Self::Dinner];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }

    /// Text a user sends (or a menu button posts) to pick this meal time.
    pub fn selection_token(self) -> &'static str {
        match self {
            Self::Breakfast => "#文青早餐",
            Self::Lunch => "#在地午餐",
            Self::Dinner => "#高檔晚餐",
        }
    }

    pub fn menu_label(self) -> &'static str {
        match self {
            Self::Breakfast => "享用文青早點",
            Self::Lunch => "品嘗在地美食",
            Self::Dinner => "暢享高檔餐廳",
        }
    }

    pub fn dataset_stem(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast_rest",
            Self::Lunch => "lunch_rest",
            Self::Dinner => "dinner_rest",
        }
    }

    pub fn from_selection_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|meal_time| meal_time.selection_token() == token)
    }
}

impl fmt::Display for MealTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported meal time `{0}` (expected breakfast|lunch|dinner)")]
pub struct ParseMealTimeError(pub String);

impl FromStr for MealTime {
    type Err = ParseMealTimeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "breakfast" => Ok(Self::Breakfast),
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => Err(ParseMealTimeError(other.to_owned())),
        }
    }
}

/// A recommendable restaurant. `subcategory` is the area it is listed under.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub description: String,
    pub category: MealTime,
    pub subcategory: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub comment: Option<String>,
}

impl Item {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        category: MealTime,
        subcategory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            category,
            subcategory: subcategory.into(),
            address: None,
            phone: None,
            comment: None,
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn address(&self) -> Option<&str> {
        present(self.address.as_deref())
    }

    pub fn phone(&self) -> Option<&str> {
        present(self.phone.as_deref())
    }

    pub fn comment(&self) -> Option<&str> {
        present(self.comment.as_deref())
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Item, MealTime};

    #[test]
    fn selection_tokens_resolve_back_to_meal_times() {
        for meal_time in MealTime::ALL {
            let token = meal_time.selection_token();
            assert_eq!(MealTime::from_selection_token(token), Some(meal_time));
        }
        assert_eq!(MealTime::from_selection_token("#宵夜餐"), None);
        assert_eq!(MealTime::from_selection_token("文青早餐"), None);
    }

    #[test]
    fn meal_time_parses_case_insensitively() {
        assert_eq!(" Lunch ".parse::<MealTime>(), Ok(MealTime::Lunch));
        assert!("brunch".parse::<MealTime>().is_err());
    }

    #[test]
    fn blank_optional_fields_read_as_absent() {
        let item = Item::new("早安山丘", "07:00-14:00", MealTime::Breakfast, "中區")
            .with_address("   ")
            .with_phone("04-2222-0000");

        assert_eq!(item.address(), None);
        assert_eq!(item.phone(), Some("04-2222-0000"));
        assert_eq!(item.comment(), None);
    }
}
