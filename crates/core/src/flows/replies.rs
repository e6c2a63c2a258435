use crate::catalog::AreaGrouping;
use crate::domain::item::MealTime;
use crate::domain::reply::{
    ButtonMenu, Carousel, CarouselCard, ConfirmPrompt, DetailAction, DetailKind, MenuOption,
    QuickReplyMenu, ReplyPayload,
};
use crate::intent::{DemoKind, RECOMMEND_TRIGGER};

pub const CATEGORY_MENU_THUMBNAIL_URL: &str = "https://i.imgur.com/b9oaYpu.jpeg";
pub const FALLBACK_TEXT: &str = "Got it!";
pub const AREA_MENU_TEXT: &str = "請選擇你的所在區域~";
pub const WELCOME_TEXT: &str = "歡迎加入台中吃飽小幫手!!一起探索台中美味，發現更多好吃的餐廳吧!若要使用尋找美食功能，請輸入關鍵字<美食推薦>";

pub fn fallback() -> ReplyPayload {
    ReplyPayload::text(FALLBACK_TEXT)
}

pub fn welcome() -> ReplyPayload {
    ReplyPayload::text(WELCOME_TEXT)
}

pub fn restart_prompt() -> ReplyPayload {
    ReplyPayload::text(format!("請先輸入「{RECOMMEND_TRIGGER}」選擇想吃的餐別，再挑選區域喔!"))
}

pub fn unknown_area(area: &str) -> ReplyPayload {
    ReplyPayload::text(format!("目前沒有「{area}」的餐廳資料，請從區域選單中挑選喔!"))
}

pub fn category_menu() -> ReplyPayload {
    ReplyPayload::ButtonMenu(ButtonMenu {
        thumbnail_url: Some(CATEGORY_MENU_THUMBNAIL_URL.to_owned()),
        title: "歡迎使用!!".to_owned(),
        text: "請選擇要推薦的風格餐廳。".to_owned(),
        options: MealTime::ALL
            .into_iter()
            .map(|meal_time| MenuOption::new(meal_time.menu_label(), meal_time.selection_token()))
            .collect(),
    })
}

pub fn area_menu(grouping: &AreaGrouping) -> ReplyPayload {
    ReplyPayload::QuickReplyMenu(QuickReplyMenu {
        text: AREA_MENU_TEXT.to_owned(),
        options: grouping.areas().map(|area| MenuOption::new(area, format!("#{area}"))).collect(),
    })
}

pub fn detail_answer(kind: DetailKind, value: &str) -> ReplyPayload {
    ReplyPayload::text(format!("{}：{value}", kind.label()))
}

pub fn demo(kind: DemoKind) -> ReplyPayload {
    match kind {
        DemoKind::Buttons => ReplyPayload::ButtonMenu(ButtonMenu {
            thumbnail_url: Some(CATEGORY_MENU_THUMBNAIL_URL.to_owned()),
            title: "按鈕範例".to_owned(),
            text: "點選下方按鈕試試看".to_owned(),
            options: vec![
                MenuOption::new("美食推薦", RECOMMEND_TRIGGER),
                MenuOption::new("輪播範例", "輪播sample"),
                MenuOption::new("確認範例", "確認sample"),
            ],
        }),
        DemoKind::Carousel => ReplyPayload::Carousel(Carousel {
            cards: vec![
                demo_card("範例餐廳一", "週一至週五 08:00-17:00"),
                demo_card("範例餐廳二", "每日 11:00-21:00"),
            ],
        }),
        DemoKind::Confirm => ReplyPayload::Confirm(ConfirmPrompt {
            text: "要開始尋找美食嗎?".to_owned(),
            confirm: MenuOption::new("好啊", RECOMMEND_TRIGGER),
            cancel: MenuOption::new("先不用", "先不用"),
        }),
        DemoKind::QuickReply => ReplyPayload::QuickReplyMenu(QuickReplyMenu {
            text: "快速回覆範例，選一個試試:".to_owned(),
            options: vec![
                MenuOption::new("按鈕", "按鈕sample"),
                MenuOption::new("輪播", "輪播sample"),
                MenuOption::new("確認", "確認sample"),
                MenuOption::new("美食推薦", RECOMMEND_TRIGGER),
            ],
        }),
    }
}

fn demo_card(title: &str, body: &str) -> CarouselCard {
    CarouselCard {
        title: title.to_owned(),
        body: body.to_owned(),
        thumbnail_url: Some(crate::sampler::RESTAURANT_THUMBNAIL_URL.to_owned()),
        actions: DetailKind::ALL.into_iter().map(|kind| DetailAction::new(kind, None)).collect(),
    }
}
