//! # Mood Labels
//!
//! The closed set of moods a chat can be classified into. Every playlist
//! mapping, cache entry and manual override button is keyed by one of these.
//!
//! Two orders matter:
//! - [`Mood::ALL`] is the settings/button order, used for display and for the
//!   persisted mapping.
//! - The classifier walks its own keyword table order, see
//!   [`crate::classifier`].

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// A mood label.
///
/// Declaration order is the settings order, so the derived `Ord` keeps
/// `BTreeMap<Mood, _>` iteration aligned with the settings panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Battle,
    Epic,
    Romantic,
    Dark,
    Calm,
    Energetic,
    Sad,
    Mysterious,
    Cozy,
    Tense,
    Hopeful,
    Melancholic,
}

lazy_static::lazy_static! {
    /// Name lookup used by [`Mood::from_str`]
    static ref MOODS_BY_NAME: HashMap<&'static str, Mood> =
        Mood::ALL.iter().map(|mood| (mood.as_str(), *mood)).collect();
}

impl Mood {
    /// All moods in settings order.
    pub const ALL: [Mood; 12] = [
        Mood::Battle,
        Mood::Epic,
        Mood::Romantic,
        Mood::Dark,
        Mood::Calm,
        Mood::Energetic,
        Mood::Sad,
        Mood::Mysterious,
        Mood::Cozy,
        Mood::Tense,
        Mood::Hopeful,
        Mood::Melancholic,
    ];

    /// Returned by the classifier when nothing matches.
    pub const FALLBACK: Mood = Mood::Calm;

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Mood::Battle => "battle",
            Mood::Epic => "epic",
            Mood::Romantic => "romantic",
            Mood::Dark => "dark",
            Mood::Calm => "calm",
            Mood::Energetic => "energetic",
            Mood::Sad => "sad",
            Mood::Mysterious => "mysterious",
            Mood::Cozy => "cozy",
            Mood::Tense => "tense",
            Mood::Hopeful => "hopeful",
            Mood::Melancholic => "melancholic",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_lowercase();
        MOODS_BY_NAME.get(name.as_str()).copied().ok_or_else(|| {
            anyhow!(
                "Unknown mood `{s}`. Expected one of: {}",
                Mood::ALL.map(Mood::as_str).join(", ")
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for mood in Mood::ALL {
            assert_eq!(mood.as_str().parse::<Mood>().unwrap(), mood);
        }
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!(" Battle ".parse::<Mood>().unwrap(), Mood::Battle);
        assert_eq!("MELANCHOLIC".parse::<Mood>().unwrap(), Mood::Melancholic);
    }

    #[test]
    fn test_unknown_mood_lists_choices() {
        let err = "jazzy".parse::<Mood>().unwrap_err().to_string();
        assert!(err.contains("jazzy"));
        assert!(err.contains("calm"));
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Mood::Mysterious).unwrap();
        assert_eq!(json, "\"mysterious\"");
        let mood: Mood = serde_json::from_str("\"cozy\"").unwrap();
        assert_eq!(mood, Mood::Cozy);
    }

    #[test]
    fn test_settings_order_matches_ord() {
        let mut sorted = Mood::ALL;
        sorted.sort();
        assert_eq!(sorted, Mood::ALL);
    }
}
