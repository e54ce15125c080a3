//! # Integration Tests for Moodtune
//!
//! End-to-end tests through the public API and the compiled binary: chat
//! driven playback, mood changes with fades, skips, settings persistence and
//! the CLI commands.

use anyhow::Result;
use moodtune::mood::Mood;
use moodtune::session::{ChatMessage, PlayerPhase, PlayerSession, RequestOutcome, SessionEvent};
use moodtune::settings::{JsonFileStore, MemoryStore, Settings, SettingsStore};
use moodtune::widget::{ScriptedWidget, Track, WidgetEvent, WidgetOp};
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

const BATTLE: &str = "https://soundcloud.com/test/sets/battle";
const CALM: &str = "https://soundcloud.com/test/sets/calm";
const DARK: &str = "https://soundcloud.com/test/sets/dark";

fn tracks(ids: &[u64]) -> Vec<Track> {
    ids.iter()
        .map(|id| Track::new(*id, &format!("Track {id}"), "Test Artist"))
        .collect()
}

/// Test helper building a widget and settings with three configured moods
fn create_test_session(seed: u64) -> (PlayerSession<ScriptedWidget, MemoryStore>, MemoryStore) {
    let mut settings = Settings::default();
    settings.set_playlist(Mood::Battle, BATTLE);
    settings.set_playlist(Mood::Calm, CALM);
    settings.set_playlist(Mood::Dark, DARK);
    let store = MemoryStore::with_settings(settings);

    let widget = ScriptedWidget::new()
        .with_playlist(BATTLE, tracks(&[1, 2, 3, 4]))
        .with_playlist(CALM, tracks(&[10, 11, 12]))
        .with_playlist(DARK, tracks(&[20, 21]));

    let session = PlayerSession::new(widget, store.clone()).with_seed(seed);
    (session, store)
}

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_moodtune"))
}

/// Test helper writing a playlist library for `simulate`
fn create_test_library(dir: &TempDir) -> Result<PathBuf> {
    let path = dir.path().join("library.json");
    let library = serde_json::json!({
        (BATTLE): [
            {"id": 1, "title": "Clash", "user": {"username": "Drums"}},
            {"id": 2, "title": "Charge", "user": {"username": "Drums"}}
        ],
        (CALM): [
            {"id": 10, "title": "Still Water", "user": {"username": "Harp"}}
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&library)?)?;
    Ok(path)
}

#[cfg(test)]
mod playback_tests {
    use super::*;

    #[test]
    fn test_chat_message_starts_matching_playlist() {
        let (mut session, _) = create_test_session(1);
        let chat = vec![ChatMessage::character("He drew his sword and attacked!")];

        assert!(session.on_message_received(&chat[0], &chat));
        session.settle();

        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Battle));
        assert!(session.is_playing());
        assert_eq!(session.widget().volume(), 50);
        assert_eq!(session.cached_tracks(Mood::Battle).map(<[Track]>::len), Some(4));

        let events = session.take_events();
        assert!(events.contains(&SessionEvent::Loading { mood: Mood::Battle }));
        assert!(events
            .iter()
            .any(|e| matches!(e, SessionEvent::NowPlaying { mood: Mood::Battle, .. })));
    }

    #[test]
    fn test_analysis_uses_recent_window_only() {
        let (mut session, _) = create_test_session(1);
        let chat: Vec<ChatMessage> = [
            "They fought a battle with swords, attack after attack in the war",
            "The day was quiet",
            "A gentle breeze",
            "Nothing happened",
        ]
        .into_iter()
        .map(ChatMessage::character)
        .collect();

        session.on_message_received(&chat[3], &chat);
        session.settle();

        assert_eq!(session.current_mood(), Some(Mood::Calm));
    }

    #[test]
    fn test_user_messages_are_not_analyzed() {
        let (mut session, _) = create_test_session(1);
        let chat = vec![ChatMessage::user("attack the castle")];

        assert!(!session.on_message_received(&chat[0], &chat));
        session.settle();
        assert_eq!(session.phase(), PlayerPhase::Idle);
    }

    #[test]
    fn test_disabled_session_ignores_chat() {
        let (mut session, _) = create_test_session(1);
        session.set_enabled(false);
        let chat = vec![ChatMessage::character("attack the castle")];

        assert!(!session.on_message_received(&chat[0], &chat));
        session.settle();
        assert_eq!(session.phase(), PlayerPhase::Idle);
    }

    #[test]
    fn test_mood_change_fades_out_then_in() -> Result<()> {
        let (mut session, _) = create_test_session(3);
        assert_eq!(session.request(Mood::Calm)?, RequestOutcome::Loading);
        session.settle();
        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Calm));

        session.widget_mut().clear_ops();
        let started = session.now();
        assert_eq!(session.request(Mood::Dark)?, RequestOutcome::FadingOut);
        assert!(session.is_fading());
        session.settle();

        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Dark));
        assert_eq!(session.widget().volume(), 50);
        assert!(session.now() - started >= 2100);

        let ops = session.widget().ops();
        let load = ops
            .iter()
            .position(|op| *op == WidgetOp::Load(DARK.to_string()))
            .expect("dark playlist loaded");
        assert!(ops[..load].contains(&WidgetOp::SetVolume(0)));
        assert_eq!(ops.last(), Some(&WidgetOp::SetVolume(50)));
        Ok(())
    }

    #[test]
    fn test_same_mood_reloads_without_fade() -> Result<()> {
        let (mut session, _) = create_test_session(3);
        session.request(Mood::Calm)?;
        session.settle();

        assert_eq!(session.request(Mood::Calm)?, RequestOutcome::Loading);
        assert!(!session.is_fading());
        session.settle();
        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Calm));
        Ok(())
    }

    #[test]
    fn test_unconfigured_mood_warns() -> Result<()> {
        let (mut session, _) = create_test_session(1);
        assert_eq!(session.request(Mood::Cozy)?, RequestOutcome::Unconfigured);

        let events = session.take_events();
        assert!(matches!(
            events.as_slice(),
            [SessionEvent::Warning { message }] if message.contains("cozy")
        ));
        assert_eq!(session.phase(), PlayerPhase::Idle);
        Ok(())
    }

    #[test]
    fn test_skip_never_repeats_last_track() -> Result<()> {
        for seed in 0..25 {
            let (mut session, _) = create_test_session(seed);
            session.request(Mood::Dark)?;
            session.settle();

            for _ in 0..5 {
                let before = session.last_played_track_id();
                let track = session.skip_to_different_track(Mood::Dark).expect("cached tracks");
                assert_ne!(Some(track.id), before);
                session.settle();
                assert_eq!(session.widget().volume(), 50);
            }
        }
        Ok(())
    }

    #[test]
    fn test_finished_track_advances_without_fade() -> Result<()> {
        let (mut session, _) = create_test_session(1);
        session.request(Mood::Battle)?;
        session.settle();
        session.widget_mut().clear_ops();

        session.handle_widget_event(WidgetEvent::Finished);

        assert_eq!(session.widget().ops(), &[WidgetOp::Next]);
        assert!(!session.is_fading());
        Ok(())
    }

    #[test]
    fn test_toggle_play_pause() -> Result<()> {
        let (mut session, _) = create_test_session(1);
        session.request(Mood::Battle)?;
        session.settle();

        session.toggle_play_pause();
        assert_eq!(session.phase(), PlayerPhase::Paused(Mood::Battle));
        assert!(!session.is_playing());

        session.toggle_play_pause();
        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Battle));
        Ok(())
    }
}

#[cfg(test)]
mod settings_integration_tests {
    use super::*;

    #[test]
    fn test_settings_persist_across_sessions() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("settings.json");

        let mut session =
            PlayerSession::new(ScriptedWidget::new(), JsonFileStore::new(path.clone()));
        session.set_playlist(Mood::Hopeful, "  https://soundcloud.com/test/sets/hope  ");
        session.set_volume(80);
        session.set_auto_analyze(false);
        session.settle();
        assert!(path.exists());

        let reopened = PlayerSession::new(ScriptedWidget::new(), JsonFileStore::new(path));
        let settings = reopened.settings();
        assert_eq!(
            settings.playlist_for(Mood::Hopeful),
            Some("https://soundcloud.com/test/sets/hope")
        );
        assert_eq!(settings.volume, 80);
        assert!(!settings.auto_analyze);
        assert_eq!(reopened.current_volume(), 80);
        Ok(())
    }

    #[test]
    fn test_unknown_mood_key_does_not_disable_session() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("settings.json");
        let stored = serde_json::json!({
            "mood_mapping": { "battle": BATTLE, "jazz": "https://soundcloud.com/test/sets/jazz" }
        });
        std::fs::write(&path, stored.to_string())?;

        let widget = ScriptedWidget::new().with_playlist(BATTLE, tracks(&[1, 2]));
        let mut session = PlayerSession::new(widget, JsonFileStore::new(path));
        assert_eq!(session.settings().playlist_for(Mood::Battle), Some(BATTLE));
        assert_eq!(session.settings().mood_mapping.len(), 12);

        session.request(Mood::Battle)?;
        assert_eq!(session.phase(), PlayerPhase::Playing(Mood::Battle));
        Ok(())
    }

    #[test]
    fn test_corrupt_settings_file_falls_back_to_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, "{ not json")?;

        let session = PlayerSession::new(ScriptedWidget::new(), JsonFileStore::new(path));
        assert_eq!(session.settings(), &Settings::default());
        Ok(())
    }

    #[test]
    fn test_reload_picks_up_new_track_list() -> Result<()> {
        let (mut session, _) = create_test_session(2);
        session.request(Mood::Battle)?;
        session.settle();

        session.widget_mut().set_playlist(BATTLE, tracks(&[40, 41]));
        session.request(Mood::Battle)?;
        session.settle();

        let ids: Vec<u64> = session
            .cached_tracks(Mood::Battle)
            .map(|list| list.iter().map(|t| t.id).collect())
            .unwrap_or_default();
        assert_eq!(ids, vec![40, 41]);
        Ok(())
    }

    #[test]
    fn test_rapid_mutations_write_once() {
        let (mut session, store) = create_test_session(1);
        for volume in [10, 20, 30, 40] {
            session.set_volume(volume);
            session.advance(200);
        }
        assert_eq!(store.save_count(), 0);

        session.settle();
        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored().map(|s| s.volume), Some(40));
    }

    #[test]
    fn test_shutdown_flushes_pending_write() -> Result<()> {
        let (mut session, store) = create_test_session(1);
        session.set_enabled(false);
        session.shutdown()?;

        assert_eq!(store.save_count(), 1);
        assert_eq!(store.stored().map(|s| s.enabled), Some(false));
        Ok(())
    }

    #[test]
    fn test_partial_settings_file_merges_defaults() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("settings.json");
        std::fs::write(&path, r#"{"volume": 250, "mood_mapping": {"dark": "https://x"}}"#)?;

        let settings = JsonFileStore::new(path).load()?.expect("stored settings");
        assert_eq!(settings.volume, 100);
        assert!(settings.enabled);
        assert_eq!(settings.playlist_for(Mood::Dark), Some("https://x"));
        assert_eq!(settings.mood_mapping.len(), 12);
        Ok(())
    }
}

#[cfg(test)]
mod cli_tests {
    use super::*;

    #[test]
    fn test_cli_help_displays_correctly() {
        let output = binary().arg("--help").output().expect("Failed to run help command");

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("moodtune"));
        assert!(stdout.contains("classify"));
        assert!(stdout.contains("settings"));
        assert!(stdout.contains("simulate"));
    }

    #[test]
    fn test_classify_command() {
        let output = binary()
            .args(["classify", "the shadows grew darker", "--scores"])
            .output()
            .expect("Failed to run classify command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.lines().next(), Some("dark"));
        assert!(stdout.contains("melancholic"));
    }

    #[test]
    fn test_settings_round_trip_through_cli() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let settings = temp_dir.path().join("settings.json");

        let status = binary()
            .arg("--settings")
            .arg(&settings)
            .args(["settings", "set-playlist", "battle", BATTLE])
            .status()?;
        assert!(status.success());

        let output = binary().arg("--settings").arg(&settings).arg("moods").output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.lines().any(|l| l.starts_with("battle") && l.contains(BATTLE)));
        assert!(stdout.lines().any(|l| l.starts_with("calm") && l.ends_with('-')));
        Ok(())
    }

    #[test]
    fn test_simulate_plays_classified_mood() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let library = create_test_library(&temp_dir)?;
        let settings = temp_dir.path().join("settings.json");

        binary()
            .arg("--settings")
            .arg(&settings)
            .args(["settings", "set-playlist", "battle", BATTLE])
            .status()?;

        let output = binary()
            .arg("--settings")
            .arg(&settings)
            .arg("simulate")
            .arg(&library)
            .args(["-m", "He drew his sword and attacked!", "--seed", "4"])
            .output()?;

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("loading battle"));
        assert!(stdout.contains("now playing (battle): Drums - "));
        Ok(())
    }

    #[test]
    fn test_completion_generation() {
        let output = binary()
            .args(["completion", "bash"])
            .output()
            .expect("Failed to run completion command");

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("_moodtune"));
        assert!(stdout.contains("complete"));
    }
}
