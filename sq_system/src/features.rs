use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A switchable group of functionality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    /// Always enabled.
    Auth,
    Campaigns,
    Characters,
    Items,
    StoryPosts,
    DmResponses,
}

impl Feature {
    pub const ALL: [Feature; 6] = [
        Feature::Auth,
        Feature::Campaigns,
        Feature::Characters,
        Feature::Items,
        Feature::StoryPosts,
        Feature::DmResponses,
    ];

    /// The environment variable controlling this feature, if it can be controlled at all.
    pub fn env_key(self) -> Option<&'static str> {
        match self {
            Feature::Auth => None,
            Feature::Campaigns => Some("FEATURE_CAMPAIGNS"),
            Feature::Characters => Some("FEATURE_CHARACTERS"),
            Feature::Items => Some("FEATURE_ITEMS"),
            Feature::StoryPosts => Some("FEATURE_STORY_POSTS"),
            Feature::DmResponses => Some("FEATURE_DM_RESPONSES"),
        }
    }
}

/// Runtime toggles for each [Feature].
#[derive(Debug)]
pub struct FeatureFlags {
    flags: RwLock<BTreeMap<Feature, bool>>,
}

impl Default for FeatureFlags {
    /// Everything enabled.
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl FeatureFlags {
    /// Read the flags from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve each flag through `lookup`.
    ///
    /// Unset keys default to enabled, set keys are only enabled when equal to `true` (case-insensitive).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flags = Feature::ALL
            .into_iter()
            .map(|feature| {
                let enabled = feature
                    .env_key()
                    .and_then(&lookup)
                    .map(|value| value.to_lowercase() == "true")
                    .unwrap_or(true);
                (feature, enabled)
            })
            .collect();

        Self { flags: RwLock::new(flags) }
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.flags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&feature)
            .copied()
            .unwrap_or(false)
    }

    pub fn enable(&self, feature: Feature) {
        self.flags.write().unwrap_or_else(PoisonError::into_inner).insert(feature, true);
    }

    /// Disable `feature`, requests to disable [Feature::Auth] are ignored.
    pub fn disable(&self, feature: Feature) {
        if feature == Feature::Auth {
            tracing::debug!("Ignoring request to disable authentication");
            return;
        }
        self.flags.write().unwrap_or_else(PoisonError::into_inner).insert(feature, false);
    }

    /// A snapshot of all flags.
    pub fn all_flags(&self) -> BTreeMap<Feature, bool> {
        self.flags.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;

    #[test]
    fn env_values_are_parsed() {
        let env: HashMap<&str, &str> = [
            ("FEATURE_CAMPAIGNS", "TRUE"),
            ("FEATURE_ITEMS", "false"),
            ("FEATURE_STORY_POSTS", "1"),
        ]
        .into();
        let flags = FeatureFlags::from_lookup(|key| env.get(key).map(|v| v.to_string()));

        assert!(flags.is_enabled(Feature::Campaigns));
        assert!(!flags.is_enabled(Feature::Items));
        assert!(!flags.is_enabled(Feature::StoryPosts));
        // Unset
        assert!(flags.is_enabled(Feature::Characters));
        assert!(flags.is_enabled(Feature::DmResponses));
    }

    #[test]
    fn auth_cannot_be_disabled() {
        let flags = FeatureFlags::default();
        flags.disable(Feature::Auth);
        flags.disable(Feature::Items);

        assert!(flags.is_enabled(Feature::Auth));
        assert!(!flags.is_enabled(Feature::Items));

        flags.enable(Feature::Items);
        assert!(flags.is_enabled(Feature::Items));
    }

    #[test]
    fn flags_serialise_camel_case() -> eyre::Result<()> {
        let flags = FeatureFlags::default();
        flags.disable(Feature::DmResponses);
        let json = serde_json::to_value(flags.all_flags())?;

        assert_eq!(json["storyPosts"], true);
        assert_eq!(json["dmResponses"], false);
        assert_eq!(json["auth"], true);
        Ok(())
    }
}
