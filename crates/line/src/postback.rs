use eatba_core::domain::reply::{DetailAction, DetailKind};
use thiserror::Error;

/// LINE rejects postback actions whose `data` exceeds this many characters.
pub const MAX_POSTBACK_DATA_CHARS: usize = 300;

const ACTION_KEY: &str = "action=";
const INFO_SEPARATOR: &str = "&info=";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailPostback {
    pub kind: DetailKind,
    pub value: String,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PostbackError {
    #[error("postback data does not start with `action=`")]
    MissingAction,
    #[error("postback data has no `info` field")]
    MissingInfo,
    #[error("unknown postback action `{0}`")]
    UnknownAction(String),
}

/// Encodes a card action as `action=<kind>&info=<value>`. The value is cut
/// short when the whole string would exceed the LINE data limit.
pub fn encode_detail(action: &DetailAction) -> String {
    let prefix = format!("{ACTION_KEY}{}{INFO_SEPARATOR}", action.kind.as_str());
    let budget = MAX_POSTBACK_DATA_CHARS.saturating_sub(prefix.chars().count());
    let value: String = action.value.chars().take(budget).collect();
    format!("{prefix}{value}")
}

/// The value is everything after the first `&info=`, so it may itself
/// contain `&` or `=`.
pub fn decode_detail(data: &str) -> Result<DetailPostback, PostbackError> {
    let rest = data.strip_prefix(ACTION_KEY).ok_or(PostbackError::MissingAction)?;
    let (kind, value) = rest.split_once(INFO_SEPARATOR).ok_or(PostbackError::MissingInfo)?;
    let kind =
        DetailKind::parse(kind).ok_or_else(|| PostbackError::UnknownAction(kind.to_owned()))?;
    Ok(DetailPostback { kind, value: value.to_owned() })
}

#[cfg(test)]
mod tests {
    use eatba_core::domain::reply::{DetailAction, DetailKind};

    use super::{decode_detail, encode_detail, PostbackError, MAX_POSTBACK_DATA_CHARS};

    #[test]
    fn card_actions_decode_back_to_their_detail() {
        let action = DetailAction::new(DetailKind::Address, Some("台中市西區民生路368巷"));
        let data = encode_detail(&action);
        assert_eq!(data, "action=address&info=台中市西區民生路368巷");

        let decoded = decode_detail(&data).expect("decodes");
        assert_eq!(decoded.kind, DetailKind::Address);
        assert_eq!(decoded.value, "台中市西區民生路368巷");
    }

    #[test]
    fn legacy_phone_spelling_is_understood() {
        let decoded = decode_detail("action=phon&info=04-2222-1234").expect("decodes");
        assert_eq!(decoded.kind, DetailKind::Phone);
        assert_eq!(decoded.value, "04-2222-1234");
    }

    #[test]
    fn values_may_contain_separators() {
        let decoded = decode_detail("action=comment&info=好吃&便宜=推").expect("decodes");
        assert_eq!(decoded.value, "好吃&便宜=推");
    }

    #[test]
    fn long_values_are_cut_to_the_data_limit() {
        let action = DetailAction::new(DetailKind::Comment, Some(&"讚".repeat(400)));
        let data = encode_detail(&action);
        assert_eq!(data.chars().count(), MAX_POSTBACK_DATA_CHARS);
        assert!(decode_detail(&data).is_ok());
    }

    #[test]
    fn malformed_data_is_rejected() {
        assert_eq!(decode_detail("info=x"), Err(PostbackError::MissingAction));
        assert_eq!(decode_detail("action=address"), Err(PostbackError::MissingInfo));
        assert_eq!(
            decode_detail("action=menu&info=x"),
            Err(PostbackError::UnknownAction("menu".to_owned()))
        );
    }
}
