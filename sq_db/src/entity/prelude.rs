pub use super::campaigns::Entity as Campaigns;
pub use super::character_items::Entity as CharacterItems;
pub use super::characters::Entity as Characters;
pub use super::items::Entity as Items;
pub use super::story_posts::Entity as StoryPosts;
pub use super::users::Entity as Users;
