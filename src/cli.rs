//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Moodtune using Clap derive
//! macros.
//!
//! ## Commands
//!
//! - `classify`: Guess the mood of a piece of text
//! - `moods`: List moods and their configured playlists
//! - `settings`: Inspect or edit the persisted settings
//! - `simulate`: Drive a player session against a scripted widget
//!
//! ## Examples
//!
//! ```bash
//! moodtune classify "he drew his sword and attacked"
//! moodtune settings set-playlist battle https://soundcloud.com/user/sets/fight
//! moodtune simulate library.json -m "the shadows grew darker"
//! ```

use crate::mood::Mood;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// On/off switch argument
#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
pub enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::On
    }
}

/// Main application arguments structure.
#[derive(Parser, Debug)]
#[command(name = "moodtune")]
#[command(about = "Moodtune: mood-driven playlist playback for chat sessions")]
#[command(version)]
pub struct Args {
    /// Settings file to use instead of the platform data directory
    #[arg(long, global = true, env = "MOODTUNE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify text into a mood
    ///
    /// Counts keyword hits per mood and prints the winner. Text without any
    /// recognized keyword falls back to "calm".
    Classify {
        /// Text to analyze
        text: String,

        /// Print the score of every mood
        #[arg(long)]
        scores: bool,
    },

    /// List moods with their configured playlists
    Moods,

    /// Inspect or edit persisted settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Run a player session against a scripted widget
    ///
    /// The library file maps playlist references to track lists:
    /// `{ "https://soundcloud.com/...": [{"id": 1, "title": "...", "user": {"username": "..."}}] }`.
    /// Each message is delivered as an inbound chat message and the virtual
    /// clock is advanced until the session settles.
    Simulate {
        /// JSON playlist library
        library: PathBuf,

        /// Inbound chat message (repeatable, delivered in order)
        #[arg(short, long = "message")]
        messages: Vec<String>,

        /// Mood to request manually before any message
        #[arg(long)]
        mood: Option<Mood>,

        /// Skip to a different track after each transition
        #[arg(long)]
        skip: bool,

        /// Seed for track selection
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Generate shell completions
    ///
    /// Outputs completion script for the specified shell to stdout.
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Generate enhanced shell completions with mood name completion
    CompletionEnhanced {
        /// Shell to generate completions for (bash or fish)
        #[arg(value_enum)]
        shell: Shell,
    },

    /// List mood names for completion scripts (internal use)
    #[command(hide = true)]
    CompleteMoods,
}

/// Settings subcommands.
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Set the playlist reference for a mood
    SetPlaylist {
        mood: Mood,
        /// Playlist URL, e.g. https://soundcloud.com/user/sets/name
        url: String,
    },
    /// Remove the playlist reference for a mood
    ClearPlaylist { mood: Mood },
    /// Enable the extension
    Enable,
    /// Disable the extension
    Disable,
    /// Turn automatic chat analysis on or off
    Auto {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Set the playback volume (0-100)
    Volume {
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_classify() {
        let args = Args::try_parse_from(["moodtune", "classify", "hello", "--scores"]).unwrap();
        match args.command {
            Command::Classify { text, scores } => {
                assert_eq!(text, "hello");
                assert!(scores);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_mood_argument() {
        let args =
            Args::try_parse_from(["moodtune", "settings", "set-playlist", "Dark", "https://x"])
                .unwrap();
        match args.command {
            Command::Settings {
                action: SettingsAction::SetPlaylist { mood, url },
            } => {
                assert_eq!(mood, Mood::Dark);
                assert_eq!(url, "https://x");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_volume_out_of_range_is_rejected() {
        assert!(Args::try_parse_from(["moodtune", "settings", "volume", "101"]).is_err());
    }

    #[test]
    fn test_simulate_repeatable_messages() {
        let args = Args::try_parse_from([
            "moodtune", "simulate", "lib.json", "-m", "one", "--message", "two", "--seed", "3",
        ])
        .unwrap();
        match args.command {
            Command::Simulate { messages, seed, .. } => {
                assert_eq!(messages, vec!["one", "two"]);
                assert_eq!(seed, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_toggle_into_bool() {
        assert!(bool::from(Toggle::On));
        assert!(!bool::from(Toggle::Off));
    }
}
