//! # Moodtune
//!
//! Command-line front end: classify text, manage the persisted mood-to-playlist
//! settings, and run simulated player sessions.
//!
//! ## Usage
//!
//! ```bash
//! moodtune classify "a quiet, serene evening" --scores
//! moodtune settings set-playlist calm https://soundcloud.com/user/sets/calm
//! moodtune moods
//! moodtune simulate library.json -m "the shadows grew darker" --skip
//! ```

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use log::{debug, info};
use moodtune::classifier;
use moodtune::cli::{self, Command, SettingsAction};
use moodtune::completion;
use moodtune::config::RuntimeConfig;
use moodtune::session::{ChatMessage, PlayerSession, SessionEvent};
use moodtune::settings::{self, JsonFileStore, MemoryStore, SettingsStore};
use moodtune::widget::{ScriptedWidget, Track};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Main entry point for the Moodtune application.
///
/// # Logging
///
/// Initializes environment logger which can be controlled via `RUST_LOG`:
/// - `RUST_LOG=debug moodtune simulate lib.json` - Enable debug logging
/// - `RUST_LOG=moodtune::session=trace moodtune ...` - Module-specific logging
fn main() -> Result<()> {
    env_logger::init();

    let args = cli::Args::parse();

    match args.command {
        Command::Classify { text, scores } => {
            let mood = classifier::classify(&text);
            println!("{mood}");
            if scores {
                for (mood, score) in classifier::score(&text).iter() {
                    println!("  {mood:<12} {score}");
                }
            }
        }
        Command::Moods => {
            let config = RuntimeConfig::resolve(args.settings)?;
            let settings = settings::load_or_default(&JsonFileStore::new(config.settings_path));
            for (mood, playlist) in &settings.mood_mapping {
                let shown = if playlist.is_empty() { "-" } else { playlist.as_str() };
                println!("{:<12} {shown}", mood.as_str());
            }
        }
        Command::Settings { action } => {
            let config = RuntimeConfig::resolve(args.settings)?;
            run_settings_action(action, JsonFileStore::new(config.settings_path))?;
        }
        Command::Simulate {
            library,
            messages,
            mood,
            skip,
            seed,
        } => {
            let config = RuntimeConfig::resolve(args.settings)?;
            let stored = settings::load_or_default(&JsonFileStore::new(config.settings_path));
            run_simulation(&library, stored, &messages, mood, skip, seed)?;
        }
        Command::Completion { shell } => {
            let mut cmd = cli::Args::command();
            let shell = completion::shell_to_completion_shell(&shell);
            completion::generate_completions(shell, &mut cmd);
        }
        Command::CompletionEnhanced { shell } => match shell {
            cli::Shell::Bash => completion::generate_enhanced_bash_completion(),
            cli::Shell::Fish => completion::generate_enhanced_fish_completion(),
            _ => {
                return Err(anyhow::anyhow!(
                    "Enhanced completions only supported for bash and fish"
                ))
            }
        },
        Command::CompleteMoods => completion::print_mood_completions(),
    }

    Ok(())
}

fn run_settings_action(action: SettingsAction, mut store: JsonFileStore) -> Result<()> {
    // editing must not clobber a file it could not parse
    let mut settings = store.load()?.unwrap_or_default();

    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
            return Ok(());
        }
        SettingsAction::SetPlaylist { mood, url } => settings.set_playlist(mood, &url),
        SettingsAction::ClearPlaylist { mood } => settings.set_playlist(mood, ""),
        SettingsAction::Enable => settings.enabled = true,
        SettingsAction::Disable => settings.enabled = false,
        SettingsAction::Auto { state } => settings.auto_analyze = state.into(),
        SettingsAction::Volume { level } => settings.set_volume(level),
    }

    store.save(&settings)?;
    info!("Settings written to {}", store.path().display());
    Ok(())
}

fn run_simulation(
    library_path: &Path,
    settings: settings::Settings,
    messages: &[String],
    manual_mood: Option<moodtune::mood::Mood>,
    skip: bool,
    seed: Option<u64>,
) -> Result<()> {
    let raw = fs::read_to_string(library_path)
        .with_context(|| format!("Failed to read playlist library {}", library_path.display()))?;
    let library: HashMap<String, Vec<Track>> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid playlist library {}", library_path.display()))?;
    debug!("Loaded {} playlists into the scripted widget", library.len());

    let widget = ScriptedWidget::with_library(library);
    let mut session = PlayerSession::new(widget, MemoryStore::with_settings(settings));
    if let Some(seed) = seed {
        session = session.with_seed(seed);
    }

    if let Some(mood) = manual_mood {
        let outcome = session.request(mood)?;
        debug!("Manual request for {mood}: {outcome:?}");
        settle_and_report(&mut session, skip);
    }

    let mut chat = Vec::with_capacity(messages.len());
    for text in messages {
        let message = ChatMessage::character(text);
        chat.push(message.clone());
        if !session.on_message_received(&message, &chat) {
            println!("[{:>6}ms] analysis skipped (disabled)", session.now());
        }
        settle_and_report(&mut session, skip);
    }

    session.shutdown()?;
    Ok(())
}

fn settle_and_report<S: SettingsStore>(session: &mut PlayerSession<ScriptedWidget, S>, skip: bool) {
    session.settle();
    report(session);

    if skip {
        if let Some(mood) = session.current_mood() {
            session.skip_to_different_track(mood);
            session.settle();
            report(session);
        }
    }
}

fn report<S: SettingsStore>(session: &mut PlayerSession<ScriptedWidget, S>) {
    let now = session.now();
    for event in session.take_events() {
        match event {
            SessionEvent::Loading { mood } => println!("[{now:>6}ms] loading {mood}"),
            SessionEvent::NowPlaying { mood, track } => println!(
                "[{now:>6}ms] now playing ({mood}): {} - {}",
                track.artist(),
                track.title
            ),
            SessionEvent::PlaybackChanged { playing } => {
                println!("[{now:>6}ms] {}", if playing { "playing" } else { "paused" });
            }
            SessionEvent::Progress { fraction } => {
                println!("[{now:>6}ms] progress {:.0}%", fraction * 100.0);
            }
            SessionEvent::Warning { message } => println!("[{now:>6}ms] warning: {message}"),
        }
    }
}
