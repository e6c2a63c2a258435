//! Small deterministic catalog for the core, line and server unit tests.

use crate::catalog::StaticCatalogSource;
use crate::domain::item::{Item, MealTime};

pub fn demo_items() -> Vec<Item> {
    use MealTime::{Breakfast, Dinner, Lunch};

    vec![
        Item::new("早安山丘", "07:00-14:00", Breakfast, "中區")
            .with_address("台中市中區民族路45號")
            .with_phone("04-2222-1001")
            .with_comment("蛋餅皮酥脆，鮮奶茶必點"),
        Item::new("第二市場老店", "06:30-13:00", Breakfast, "中區")
            .with_address("台中市中區三民路二段87號"),
        Item::new("光復新村早午餐", "08:00-15:00", Breakfast, "中區").with_phone("04-2222-1003"),
        Item::new("宮原眼科旁豆漿", "05:30-11:00", Breakfast, "中區"),
        Item::new("審計新村咖啡", "09:00-17:00", Breakfast, "西區")
            .with_address("台中市西區民生路368巷")
            .with_comment("老宿舍改建，文青氣氛滿分"),
        Item::new("向上市場蛋餅", "06:00-12:00", Breakfast, "西區"),
        Item::new("一中街厚片", "07:00-13:30", Breakfast, "北區").with_phone("04-2222-1007"),
        Item::new("阿明師老店", "11:00-20:00", Lunch, "中區")
            .with_address("台中市中區中華路一段")
            .with_comment("在地人從小吃到大"),
        Item::new("東海雞腿飯", "10:30-19:30", Lunch, "西屯區"),
        Item::new("逢甲大腸包小腸", "11:00-22:00", Lunch, "西屯區").with_phone("04-2451-0000"),
        Item::new("南屯麵線糊", "10:00-14:00", Lunch, "南屯區"),
        Item::new("金色三麥", "17:00-23:00", Dinner, "西屯區")
            .with_address("台中市西屯區市政路")
            .with_phone("04-2251-0000")
            .with_comment("啤酒搭配德式豬腳"),
        Item::new("鵝房宮", "17:30-22:00", Dinner, "南屯區"),
    ]
}

pub fn demo_source() -> StaticCatalogSource {
    StaticCatalogSource::from_items(demo_items())
}
