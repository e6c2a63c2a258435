pub mod item;
pub mod reply;
