//! Text templates for everything sent to the language model.
//!
//! All functions here are pure, the data they format is gathered in [super::context].

use std::fmt::Write;
use itertools::Itertools;
use crate::data::{AuthorType, Campaign, CampaignStatus, Character, StoryPost, Stats};
use crate::dm::context::DmContext;
use crate::dm::themes;

pub const EMPTY_HISTORY: &str = "This is the beginning of the adventure.";
pub const FALLBACK_ITEM_NAME: &str = "Mysterious Item";
/// Separator placed between formatted story posts.
pub const POST_SEPARATOR: &str = "\n\n";

const GUIDELINES: [&str; 10] = [
    "Adapt the story to match the campaign theme and description.",
    "Consider the character's attributes, race, and class when determining outcomes.",
    "Provide vivid descriptions and engage all senses in your narration.",
    "Balance between narrative progression and player agency.",
    "Create compelling NPCs and enemies appropriate to the setting.",
    "Allow for character success based on their strengths, but maintain challenge.",
    "Incorporate items from the character's inventory into the story when appropriate.",
    "Play the role of all NPCs and describe environmental responses to player actions.",
    "Be fair but challenging, rewarding creativity and role-playing.",
    "Respond to the player's last action with appropriate consequences, descriptions, and opportunities for further interaction.",
];

/// `Strength: 16, Dexterity: 12, ...`
pub fn format_attributes(stats: &Stats) -> String {
    stats.named().iter().map(|(name, value)| format!("{name}: {value}")).join(", ")
}

pub fn format_inventory(inventory: &[String]) -> String {
    if inventory.is_empty() {
        "No items".to_string()
    } else {
        inventory.join(", ")
    }
}

/// A single line of conversation, attributed to the character or the DM.
pub fn format_post(post: &StoryPost, character_name: &str) -> String {
    match post.author_type {
        AuthorType::Player => format!("{character_name}: {}", post.content),
        AuthorType::System => format!("DM: {}", post.content),
    }
}

pub fn format_history(history: &[StoryPost], character_name: &str) -> String {
    history.iter().map(|post| format_post(post, character_name)).join(POST_SEPARATOR)
}

pub fn world_context(campaign: &Campaign) -> String {
    format!("{} {}", themes::world_context(&campaign.theme), campaign.description)
}

fn status_name(status: CampaignStatus) -> &'static str {
    match status {
        CampaignStatus::Active => "active",
        CampaignStatus::Completed => "completed",
        CampaignStatus::Paused => "paused",
    }
}

fn character_block(character: &Character, inventory: &[String]) -> String {
    let mut out = format!(
        "- Name: {}\n- Race: {}\n- Class: {}\n- Attributes: {}\n- Inventory: {}",
        character.name,
        character.race,
        character.class,
        format_attributes(&character.stats),
        format_inventory(inventory),
    );
    if !character.backstory.trim().is_empty() {
        let _ = write!(out, "\n- Backstory: {}", character.backstory);
    }
    out
}

/// The system prompt framing a Dungeon Master response.
///
/// The player's input is not part of this prompt, it is sent as the user message.
pub fn dm_system_prompt(ctx: &DmContext) -> String {
    let campaign = &ctx.campaign;
    let history = format_history(&ctx.history, &ctx.character.name);
    let history = if history.is_empty() { EMPTY_HISTORY.to_string() } else { history };
    let guidelines = GUIDELINES
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{}. {line}", i + 1))
        .join("\n");

    format!(
        "You are an AI Dungeon Master for a role-playing game called StoryQuest.

CAMPAIGN INFORMATION:
- Name: {name}
- Theme: {theme}
- Status: {status}
- Description: {description}

PLAYER CHARACTER:
{character}

WORLD CONTEXT:
{world}

RECENT CONVERSATION:
{history}

GUIDELINES FOR THE DUNGEON MASTER:
{guidelines}

Now, respond to the player's action as a skilled and engaging Dungeon Master would, creating an immersive and responsive story experience. \
Your response should move the story forward and end with a situation the player can respond to.",
        name = campaign.name,
        theme = campaign.theme,
        status = status_name(campaign.status),
        description = campaign.description,
        character = character_block(&ctx.character, &ctx.inventory),
        world = world_context(campaign),
    )
}

pub fn campaign_intro_prompt(name: &str, theme: &str, description: &str) -> String {
    format!(
        "You are a skilled Dungeon Master narrating a new adventure.
Craft an engaging introduction for a campaign in the following theme: {theme}.
The campaign is called \"{name}\": {description}
Include details about the setting, atmosphere, and a hook to draw the player in.
Keep it under 500 words. Use rich, descriptive language to set the scene.",
    )
}

pub fn item_prompt(theme: &str, character: &Character) -> String {
    format!(
        "You are a Dungeon Master introducing a new item in a {theme} campaign.
Create a description for an item that would fit this setting and be interesting for {name}, a {race} {class}.
Start with the item's name on its own line, followed by its physical description and a hint at any powers or significance it might have.
Keep it under 150 words.",
        name = character.name,
        race = character.race,
        class = character.class,
    )
}

/// Derive an item name from a generated description.
///
/// Takes the first line, keeping only word characters, whitespace and `-`.
pub fn extract_item_name(description: &str) -> String {
    let first_line = description.lines().next().unwrap_or_default();
    let name: String = first_line
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    let name = name.trim();

    if name.is_empty() {
        FALLBACK_ITEM_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use super::*;

    fn campaign(theme: &str) -> Campaign {
        Campaign {
            id: 1,
            name: "The Sunken Crypt".into(),
            description: "Treasure hunters vanish near the coast.".into(),
            player_id: 1,
            theme: theme.into(),
            status: CampaignStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn character(backstory: &str) -> Character {
        Character {
            id: 1,
            name: "Mira".into(),
            race: "Elf".into(),
            class: "Ranger".into(),
            backstory: backstory.into(),
            campaign_id: 1,
            stats: Stats { strength: 16, dexterity: 12, ..Default::default() },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn post(id: i32, author_type: AuthorType, content: &str) -> StoryPost {
        StoryPost {
            id,
            campaign_id: 1,
            character_id: None,
            content: content.into(),
            author_type,
            is_resolved: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn attributes_are_listed_in_order() {
        let stats = Stats { strength: 16, dexterity: 12, ..Default::default() };
        assert_eq!(
            format_attributes(&stats),
            "Strength: 16, Dexterity: 12, Constitution: 10, Intelligence: 10, Wisdom: 10, Charisma: 10"
        );
    }

    #[test]
    fn history_attributes_speakers() {
        let history = [post(1, AuthorType::System, "You wake up."), post(2, AuthorType::Player, "I stand.")];
        assert_eq!(format_history(&history, "Mira"), "DM: You wake up.\n\nMira: I stand.");
    }

    #[test]
    fn system_prompt_sections() {
        let ctx = DmContext {
            campaign: campaign("horror"),
            character: character(""),
            inventory: vec![],
            history: vec![],
        };
        let prompt = dm_system_prompt(&ctx);

        assert!(prompt.contains("- Status: active"));
        assert!(prompt.contains("- Inventory: No items"));
        assert!(!prompt.contains("Backstory"));
        assert!(prompt.contains("RECENT CONVERSATION:\nThis is the beginning of the adventure."));
        assert!(prompt.contains("WORLD CONTEXT:\nA dark and terrifying setting"));
        assert!(prompt.contains("Treasure hunters vanish near the coast."));
        assert!(prompt.contains("10. Respond to the player's last action"));

        let ctx = DmContext {
            character: character("Raised by wolves."),
            inventory: vec!["Longbow".into(), "Rope".into()],
            history: vec![post(1, AuthorType::Player, "I listen.")],
            ..ctx
        };
        let prompt = dm_system_prompt(&ctx);
        assert!(prompt.contains("- Inventory: Longbow, Rope"));
        assert!(prompt.contains("- Backstory: Raised by wolves."));
        assert!(prompt.contains("Mira: I listen."));
    }

    #[test]
    fn unknown_theme_world() {
        assert_eq!(
            world_context(&campaign("Fantasy")),
            "A world of adventure and mystery. Treasure hunters vanish near the coast."
        );
    }

    #[test]
    fn intro_mentions_campaign() {
        let prompt = campaign_intro_prompt("The Sunken Crypt", "horror", "Treasure hunters vanish.");
        assert!(prompt.contains("theme: horror."));
        assert!(prompt.contains("\"The Sunken Crypt\": Treasure hunters vanish."));
        assert!(prompt.contains("under 500 words"));
    }

    #[test]
    fn item_names() {
        assert_eq!(extract_item_name("**Blade of Dawn**\nA shining sword."), "Blade of Dawn");
        assert_eq!(extract_item_name("Frost-Touched Amulet!"), "Frost-Touched Amulet");
        assert_eq!(extract_item_name("***\nSomething"), FALLBACK_ITEM_NAME);
        assert_eq!(extract_item_name(""), FALLBACK_ITEM_NAME);
    }
}
