use sea_orm::{ModelTrait, QueryOrder};
use sq_db::entity::{campaigns, characters, items};
use sq_db::ReadConnection;
use crate::config::DmConfig;
use crate::data::{Campaign, Character, StoryPost};
use crate::dm::prompt;
use crate::error::Result;
use crate::story::recent_posts;

/// Everything the Dungeon Master gets to know about the current state of a campaign.
#[derive(Debug, Clone, PartialEq)]
pub struct DmContext {
    pub campaign: Campaign,
    pub character: Character,
    /// Names of the items the character holds.
    pub inventory: Vec<String>,
    /// Recent story posts, oldest first, already trimmed to fit the prompt budget.
    pub history: Vec<StoryPost>,
}

/// Gather the context for `character` acting in `campaign`.
///
/// Only posts existing at the time of the call are included.
#[tracing::instrument(skip_all, fields(campaign = campaign.id, character = character.id))]
pub async fn assemble(
    conn: &impl ReadConnection,
    campaign: campaigns::Model,
    character: characters::Model,
    config: &DmConfig,
) -> Result<DmContext> {
    let inventory = character
        .find_related(items::Entity)
        .order_by_asc(items::Column::Name)
        .all(conn)
        .await?
        .into_iter()
        .map(|item| item.name)
        .collect();

    let recent = recent_posts(conn, campaign.id, config.history_window).await?;

    let character = Character::from(character);
    let history = trim_history(recent, &character.name, config.max_context_chars);
    tracing::trace!(posts = history.len(), "Assembled DM context");

    Ok(DmContext {
        campaign: campaign.into(),
        character,
        inventory,
        history,
    })
}

/// Drop the oldest posts until the formatted history fits within `max_chars`.
///
/// The newest post is always kept, its content is cut short if it alone exceeds the budget.
pub fn trim_history(mut history: Vec<StoryPost>, character_name: &str, max_chars: usize) -> Vec<StoryPost> {
    let separator = prompt::POST_SEPARATOR.chars().count();
    let lengths: Vec<usize> = history
        .iter()
        .map(|post| prompt::format_post(post, character_name).chars().count())
        .collect();

    let mut total = lengths.iter().sum::<usize>() + separator * lengths.len().saturating_sub(1);
    let mut skip = 0;
    while total > max_chars && lengths.len() - skip > 1 {
        total -= lengths[skip] + separator;
        skip += 1;
    }
    history.drain(..skip);

    if let [only] = history.as_mut_slice() {
        if total > max_chars {
            let prefix = lengths[skip] - only.content.chars().count();
            let allowed = max_chars.saturating_sub(prefix);
            only.content = only.content.chars().take(allowed).collect();
        }
    }

    history
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use crate::data::AuthorType;
    use super::*;

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
    fn history_within_budget_is_untouched() {
        let history = vec![post(1, AuthorType::System, "Hello"), post(2, AuthorType::Player, "Hi")];
        assert_eq!(trim_history(history.clone(), "Bo", 1000), history);
        assert!(trim_history(vec![], "Bo", 0).is_empty());
    }

    #[test]
    fn oldest_posts_are_dropped_first() {
        // "DM: 0123456789" = 14 chars, "Bo: abcde" = 9 chars
        let history = vec![
            post(1, AuthorType::System, "0123456789"),
            post(2, AuthorType::System, "0123456789"),
            post(3, AuthorType::Player, "abcde"),
        ];

        // Exactly 14 + 2 + 9
        let trimmed = trim_history(history.clone(), "Bo", 25);
        assert_eq!(trimmed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![2, 3]);

        let trimmed = trim_history(history, "Bo", 24);
        assert_eq!(trimmed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn newest_post_is_truncated_on_char_boundary() {
        let history = vec![post(1, AuthorType::System, "old"), post(2, AuthorType::Player, "ééééééééé")];

        let trimmed = trim_history(history, "Bo", 8);

        assert_eq!(trimmed.len(), 1);
        assert_eq!(trimmed[0].id, 2);
        assert_eq!(trimmed[0].content, "éééé");
        assert_eq!(prompt::format_post(&trimmed[0], "Bo").chars().count(), 8);
    }
}
