pub mod prelude;

pub mod campaigns;
pub mod character_items;
pub mod characters;
pub mod items;
pub mod sea_orm_active_enums;
pub mod story_posts;
pub mod users;
