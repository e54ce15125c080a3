//! Mood-driven playlist playback for chat sessions.
//!
//! Reads recent chat text, guesses a mood from a keyword table, and plays the
//! playlist configured for that mood through an embedded player widget, with
//! short volume fades around mood and track changes.
//!
//! Core modules:
//! - [`classifier`] - Keyword mood classification
//! - [`session`] - Playback state machine (requests, loads, fades, skips)
//! - [`widget`] - Embedded player seam and a scripted implementation
//! - [`fade`] - Linear volume ramps
//! - [`scheduler`] - Virtual-clock timer queue
//!
//! ### Supporting Modules
//!
//! - [`mood`] - The closed set of mood labels
//! - [`settings`] - Persisted settings and storage backends
//! - [`config`] - Data directory management
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```
//! use moodtune::mood::Mood;
//! use moodtune::session::{ChatMessage, PlayerPhase, PlayerSession};
//! use moodtune::settings::{MemoryStore, Settings};
//! use moodtune::widget::{ScriptedWidget, Track};
//!
//! let playlist = "https://soundcloud.com/someone/sets/fights";
//! let mut settings = Settings::default();
//! settings.set_playlist(Mood::Battle, playlist);
//!
//! let widget = ScriptedWidget::new()
//!     .with_playlist(playlist, vec![Track::new(1, "Clash", "Someone")]);
//! let mut session = PlayerSession::new(widget, MemoryStore::with_settings(settings));
//!
//! let chat = vec![ChatMessage::character("He drew his sword and attacked!")];
//! session.on_message_received(&chat[0], &chat);
//! session.settle();
//!
//! assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Battle));
//! ```
//!
//! ## Error Handling
//!
//! Fallible operations return `anyhow::Result`. Most failures degrade to "no
//! music" instead of surfacing: unreadable stored settings are replaced by
//! the defaults, an unconfigured mood produces a warning event, an empty
//! playlist is logged and dropped, a missing render target aborts
//! initialization. Only a failed widget script load is returned as an
//! error.

pub mod classifier;
pub mod cli;
pub mod completion;
pub mod config;
pub mod fade;
pub mod mood;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod widget;
