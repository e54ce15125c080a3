//! Keyword mood classifier.
//!
//! Scores chat text against a fixed per-mood keyword table and picks the
//! mood with the highest score.
//!
//! ## Scoring
//!
//! ```text
//! score(mood) = |{ keyword in table[mood] : lowercase(text) contains keyword }|
//! winner      = first mood in table order reaching the strict maximum
//!             | Mood::FALLBACK if every score is 0
//! ```
//!
//! ## Known imprecision
//!
//! Matching is plain substring search without word boundaries, so a keyword
//! can fire inside an unrelated word ("war" inside "warm", "run" inside
//! "brunch"). Several keywords are stems ("атак", "люб", "nostalg") and rely on
//! exactly this behaviour, so it is kept as is.
//!
//! A keyword contributes at most 1 to its mood's score, however often it
//! occurs: "fight, fight, fight" scores battle 1, not 3. Repetition in a
//! single message therefore cannot outweigh a second distinct keyword.

use crate::mood::Mood;
use log::{debug, info};

/// Number of trailing chat messages considered by [`classify_recent`].
pub const CONTEXT_WINDOW: usize = 3;

/// Keyword table in classifier iteration order. Ties go to the earlier entry.
pub const KEYWORD_TABLE: [(Mood, &[&str]); 12] = [
    (
        Mood::Battle,
        &[
            "бой", "битва", "сражение", "драка", "атак", "удар", "меч", "оружие", "враг",
            "fight", "battle", "attack", "sword", "combat", "war",
        ],
    ),
    (
        Mood::Romantic,
        &[
            "люб", "поцелу", "объяти", "нежн", "сердц", "страст", "любимый", "любимая",
            "love", "kiss", "embrace", "heart", "passion", "romance", "tender", "darling",
        ],
    ),
    (
        Mood::Dark,
        &[
            "тьма", "темн", "мрак", "зло", "страх", "ужас", "кошмар", "демон",
            "dark", "shadow", "evil", "fear", "horror", "nightmare",
        ],
    ),
    (
        Mood::Sad,
        &[
            "груст", "печал", "слез", "тоск", "одиноч", "плач",
            "sad", "tear", "crying", "lonely", "sorrow", "grief",
        ],
    ),
    (
        Mood::Energetic,
        &[
            "энерг", "быстр", "бег", "прыг", "весел", "радост",
            "energy", "fast", "run", "jump", "excitement", "fun",
        ],
    ),
    (
        Mood::Tense,
        &[
            "напряж", "волнени", "тревог", "опасн", "угроз", "риск",
            "tension", "anxiety", "danger", "threat", "nervous",
        ],
    ),
    (
        Mood::Mysterious,
        &[
            "тайн", "загадк", "странн", "мистик", "скрыт",
            "mystery", "secret", "strange", "mystic", "hidden",
        ],
    ),
    (
        Mood::Cozy,
        &[
            "уют", "тепл", "спокой", "комфорт", "домашн",
            "cozy", "warm", "comfort", "peaceful", "relaxed",
        ],
    ),
    (
        Mood::Epic,
        &[
            "эпич", "величеств", "мощ", "грандиозн", "героич",
            "epic", "grand", "mighty", "heroic", "legendary",
        ],
    ),
    (
        Mood::Hopeful,
        &[
            "надежд", "светл", "радост", "вдохнов", "мечт",
            "hope", "bright", "joy", "dream", "optimistic",
        ],
    ),
    (
        Mood::Melancholic,
        &[
            "меланхол", "задумч", "размышл", "ностальг", "воспомин",
            "melanchol", "pensive", "nostalg", "memory", "wistful",
        ],
    ),
    (
        Mood::Calm,
        &[
            "спокой", "тих", "мир", "покой", "безмятеж",
            "calm", "quiet", "peace", "tranquil", "serene",
        ],
    ),
];

/// Per-mood scores for one piece of text, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodScores {
    scores: Vec<(Mood, u32)>,
}

impl MoodScores {
    /// Score of a single mood.
    #[must_use]
    pub fn get(&self, mood: Mood) -> u32 {
        self.scores
            .iter()
            .find(|(m, _)| *m == mood)
            .map_or(0, |(_, score)| *score)
    }

    /// Scores in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Mood, u32)> + '_ {
        self.scores.iter().copied()
    }

    /// Winning mood and its score. Strict `>` keeps the earliest mood on ties;
    /// all-zero input yields `(Mood::FALLBACK, 0)`.
    #[must_use]
    pub fn best(&self) -> (Mood, u32) {
        self.scores
            .iter()
            .fold((Mood::FALLBACK, 0), |(best, max), &(mood, score)| {
                if score > max {
                    (mood, score)
                } else {
                    (best, max)
                }
            })
    }
}

/// Scores `text` against every mood in the table.
#[must_use]
pub fn score(text: &str) -> MoodScores {
    let lower = text.to_lowercase();
    let scores = KEYWORD_TABLE
        .iter()
        .map(|(mood, keywords)| {
            let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
            (*mood, u32::try_from(hits).unwrap_or(u32::MAX))
        })
        .collect();
    MoodScores { scores }
}

/// Classifies `text` into a mood. Total over any input, including `""`.
///
/// # Examples
///
/// ```
/// use moodtune::classifier::classify;
/// use moodtune::mood::Mood;
///
/// assert_eq!(classify("he drew his sword and attacked"), Mood::Battle);
/// assert_eq!(classify("the weather is nice today"), Mood::Calm);
/// ```
#[must_use]
pub fn classify(text: &str) -> Mood {
    let (mood, max) = score(text).best();
    info!("Mood analysis: {mood} (score: {max})");
    mood
}

/// Joins the trailing [`CONTEXT_WINDOW`] messages with a single space.
#[must_use]
pub fn recent_window<S: AsRef<str>>(messages: &[S]) -> String {
    let start = messages.len().saturating_sub(CONTEXT_WINDOW);
    messages[start..]
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Classifies the most recent messages of a chat. Empty chat yields the fallback.
#[must_use]
pub fn classify_recent<S: AsRef<str>>(messages: &[S]) -> Mood {
    if messages.is_empty() {
        debug!("Empty chat, using fallback mood");
        return Mood::FALLBACK;
    }
    classify(&recent_window(messages))
}
