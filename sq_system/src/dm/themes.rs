//! Per-theme flavour text.

const DEFAULT_WORLD: &str = "A world of adventure and mystery.";
const DEFAULT_INTRO: &str = "Your adventure begins. What will you do?";

/// A one-line description of the world for the given campaign `theme`.
pub fn world_context(theme: &str) -> &'static str {
    match theme {
        "medieval-fantasy" => "A world of knights, wizards, dragons and ancient magic.",
        "sci-fi" => "A futuristic universe with advanced technology, space travel, and alien civilizations.",
        "post-apocalyptic" => "A devastated world recovering from a catastrophic event that nearly ended civilization.",
        "cyberpunk" => "A dystopian future where advanced technology coexists with social disorder and corporate control.",
        "steampunk" => "An alternate history where steam power remains the dominant form of technology, mixed with fantastical elements.",
        "horror" => "A dark and terrifying setting where supernatural forces threaten the characters' survival and sanity.",
        _ => DEFAULT_WORLD,
    }
}

/// The opening used when no introduction could be generated.
pub fn fallback_intro(theme: &str) -> &'static str {
    match theme {
        "medieval-fantasy" => "Welcome to a world of knights, wizards, and ancient magic. Your adventure begins in a small village on the edge of a vast kingdom.",
        "sci-fi" => "In the distant future, humanity has spread across the stars. Your journey starts aboard a space station orbiting a distant planet.",
        "post-apocalyptic" => "The world as we knew it is gone. Decades after the great collapse, survivors struggle to rebuild civilization.",
        "cyberpunk" => "Neon lights illuminate the rain-slicked streets of the megacity. Corporations rule from their towering skyscrapers while hackers and street samurai navigate the shadows.",
        "steampunk" => "Gears turn and steam hisses in a world of brass and innovation. The industrial revolution has taken a fantastical turn.",
        "horror" => "A sense of dread hangs in the air. Something lurks beyond the veil of normalcy, waiting to be discovered.",
        _ => DEFAULT_INTRO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_themes_use_defaults() {
        assert_eq!(world_context("Fantasy"), DEFAULT_WORLD);
        assert_eq!(fallback_intro("western"), DEFAULT_INTRO);
        assert!(fallback_intro("cyberpunk").starts_with("Neon lights"));
    }
}
