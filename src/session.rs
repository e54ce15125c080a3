//! # Player Session
//!
//! Owns every piece of mutable playback state for one host session: settings,
//! the widget handle, current mood and volume, the per-mood track cache, the
//! last played track and the single in-flight volume ramp.
//!
//! ## Phases
//!
//! ```text
//! Idle ──request──▶ Loading(m) ──ready──▶ Playing(m) ⇄ Paused(m)
//!   ▲                  ▲                      │
//!   └─empty playlist───┘◀───request(other)────┘ (fade-out first if playing)
//! ```
//!
//! ## Time
//!
//! Nothing here sleeps. Ramp steps, delayed fade-ins, delayed chat analysis
//! and debounced settings writes are tasks on a virtual-clock
//! [`Scheduler`]; the host advances time with [`PlayerSession::advance`].
//! Only one ramp exists at a time and starting a new one cancels the old one
//! together with its completion.

use crate::classifier;
use crate::fade::{RampTick, VolumeRamp, FADE_IN_DELAY_MS, MOOD_FADE_MS, SKIP_FADE_MS};
use crate::mood::Mood;
use crate::scheduler::{Scheduler, TaskId};
use crate::settings::{self, Settings, SettingsStore};
use crate::widget::{PlaylistSource, Track, Widget, WidgetError, WidgetEvent};
use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// Delay between an inbound message and its analysis.
pub const ANALYZE_DELAY_MS: u64 = 1500;

/// Quiet period before mutated settings are written.
pub const SAVE_DEBOUNCE_MS: u64 = 1000;

/// Random draws before falling back to the next different track.
pub const MAX_PICK_ATTEMPTS: u32 = 10;

/// Upper bound (exclusive) of the cache-busting seed.
const SOURCE_SEED_RANGE: u32 = 999_999;

/// Coarse playback phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerPhase {
    Idle,
    Loading(Mood),
    Playing(Mood),
    Paused(Mood),
}

/// What a [`PlayerSession::request`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// No playlist configured for the mood; nothing changed.
    Unconfigured,
    /// The player could not be brought up; nothing changed.
    PlayerUnavailable,
    /// Held until the player signals readiness.
    Deferred,
    /// Fading out the current mood, the new playlist loads afterwards.
    FadingOut,
    /// New playlist loading now.
    Loading,
}

/// Notifications for the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Loading { mood: Mood },
    NowPlaying { mood: Mood, track: Track },
    PlaybackChanged { playing: bool },
    Progress { fraction: f64 },
    Warning { message: String },
}

/// One chat message as delivered by the host event bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
}

impl ChatMessage {
    #[must_use]
    pub fn user(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_user: true,
        }
    }

    #[must_use]
    pub fn character(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_user: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Task {
    RampStep,
    StartFadeIn { duration_ms: u64 },
    Analyze { window: Option<String> },
    PersistSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FadeCompletion {
    LoadPlaylist { mood: Mood, playlist: String },
    SwitchTrack { mood: Mood, index: usize },
}

#[derive(Debug)]
struct ActiveFade {
    ramp: VolumeRamp,
    timer: TaskId,
    on_complete: Option<FadeCompletion>,
}

#[derive(Debug, Clone, Copy)]
struct PendingLoad {
    mood: Mood,
    fade_in: bool,
    previous_phase: PlayerPhase,
    previous_mood: Option<Mood>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Readiness {
    Detached,
    Initializing,
    Ready,
}

/// Playback controller for one host session.
pub struct PlayerSession<W: Widget, S: SettingsStore> {
    widget: W,
    store: S,
    settings: Settings,
    readiness: Readiness,
    phase: PlayerPhase,
    current_mood: Option<Mood>,
    is_playing: bool,
    current_volume: u8,
    last_played_track_id: Option<u64>,
    cached_tracks: HashMap<Mood, Vec<Track>>,
    pending_load: Option<PendingLoad>,
    deferred_request: Option<Mood>,
    fade: Option<ActiveFade>,
    save_timer: Option<TaskId>,
    timers: Scheduler<Task>,
    rng: StdRng,
    events: Vec<SessionEvent>,
    pumping: bool,
}

impl<W: Widget, S: SettingsStore> PlayerSession<W, S> {
    /// Creates a session, loading settings from `store` once. Unreadable
    /// stored settings are logged and replaced by the defaults.
    pub fn new(widget: W, store: S) -> Self {
        let settings = settings::load_or_default(&store);
        info!(
            "Session started (enabled: {}, auto: {}, volume: {}, {} moods configured)",
            settings.enabled,
            settings.auto_analyze,
            settings.volume,
            settings.configured_moods().count()
        );
        Self {
            widget,
            store,
            current_volume: settings.volume,
            settings,
            readiness: Readiness::Detached,
            phase: PlayerPhase::Idle,
            current_mood: None,
            is_playing: false,
            last_played_track_id: None,
            cached_tracks: HashMap::new(),
            pending_load: None,
            deferred_request: None,
            fade: None,
            save_timer: None,
            timers: Scheduler::new(),
            rng: StdRng::from_entropy(),
            events: Vec::new(),
            pumping: false,
        }
    }

    /// Replaces the random source with a seeded one.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    // ---- accessors ----

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn phase(&self) -> PlayerPhase {
        self.phase
    }

    #[must_use]
    pub const fn current_mood(&self) -> Option<Mood> {
        self.current_mood
    }

    #[must_use]
    pub const fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[must_use]
    pub const fn current_volume(&self) -> u8 {
        self.current_volume
    }

    #[must_use]
    pub const fn last_played_track_id(&self) -> Option<u64> {
        self.last_played_track_id
    }

    /// Track list cached by the latest load of `mood`.
    #[must_use]
    pub fn cached_tracks(&self, mood: Mood) -> Option<&[Track]> {
        self.cached_tracks.get(&mood).map(Vec::as_slice)
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.readiness == Readiness::Ready
    }

    #[must_use]
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }

    /// Virtual time in milliseconds.
    #[must_use]
    pub const fn now(&self) -> u64 {
        self.timers.now()
    }

    /// Earliest pending timer, if any.
    #[must_use]
    pub fn next_due(&self) -> Option<u64> {
        self.timers.next_due()
    }

    #[must_use]
    pub fn widget(&self) -> &W {
        &self.widget
    }

    pub fn widget_mut(&mut self) -> &mut W {
        &mut self.widget
    }

    /// Drains the notifications emitted since the last call.
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- lifecycle ----

    /// Brings the player up: attaches the widget and loads a silent source.
    /// Idempotent. A missing render target is logged and aborts
    /// initialization without error.
    ///
    /// # Errors
    ///
    /// Returns an error if the widget script cannot be loaded.
    pub fn initialize(&mut self) -> Result<()> {
        if self.readiness != Readiness::Detached {
            return Ok(());
        }
        match self.widget.attach() {
            Ok(()) => {}
            Err(WidgetError::MissingRenderTarget) => {
                error!("Player render target not found, initialization aborted");
                return Ok(());
            }
            Err(err) => return Err(err).context("Failed to initialize player"),
        }
        debug!("Widget attached, loading placeholder source");
        self.readiness = Readiness::Initializing;
        self.widget.load(&PlaylistSource::placeholder());
        self.pump_widget_events();
        Ok(())
    }

    /// Tears the session down: cancels timers and the active ramp, flushes a
    /// pending settings write.
    ///
    /// # Errors
    ///
    /// Returns an error if the pending settings write fails.
    pub fn shutdown(&mut self) -> Result<()> {
        let flush = self.save_timer.take().is_some();
        self.timers.clear();
        self.fade = None;
        self.pending_load = None;
        self.deferred_request = None;
        if flush {
            self.store
                .save(&self.settings)
                .context("Failed to save settings on shutdown")?;
        }
        info!("Session shut down");
        Ok(())
    }

    // ---- playback ----

    /// Switches playback to `mood`.
    ///
    /// # Errors
    ///
    /// Returns an error only if the player has to be initialized and its
    /// script fails to load.
    pub fn request(&mut self, mood: Mood) -> Result<RequestOutcome> {
        let Some(playlist) = self.settings.playlist_for(mood).map(str::to_string) else {
            warn!("No playlist configured for: {mood}");
            self.events.push(SessionEvent::Warning {
                message: format!("Add a playlist for \"{mood}\""),
            });
            return Ok(RequestOutcome::Unconfigured);
        };

        if self.readiness != Readiness::Ready {
            self.initialize()?;
        }
        let outcome = match self.readiness {
            Readiness::Detached => RequestOutcome::PlayerUnavailable,
            Readiness::Initializing => {
                debug!("Player not ready, holding request for {mood}");
                self.deferred_request = Some(mood);
                RequestOutcome::Deferred
            }
            Readiness::Ready => self.begin_transition(mood, playlist),
        };
        self.pump_widget_events();
        Ok(outcome)
    }

    /// Plays a random track of `mood`'s cached list other than the last one,
    /// with a short fade around the switch. Without a cached list the widget's
    /// own `next` is used. Returns the chosen track.
    pub fn skip_to_different_track(&mut self, mood: Mood) -> Option<Track> {
        let Some(tracks) = self.cached_tracks.get(&mood).filter(|t| !t.is_empty()) else {
            debug!("No cached tracks for {mood}, delegating to widget next");
            self.widget.next();
            self.pump_widget_events();
            return None;
        };

        let index = pick_different_track(tracks, self.last_played_track_id, &mut self.rng);
        let track = tracks[index].clone();
        info!("Skipping to track {}/{}", index + 1, tracks.len());

        self.last_played_track_id = Some(track.id);
        self.start_fade(
            self.current_volume,
            0,
            SKIP_FADE_MS,
            Some(FadeCompletion::SwitchTrack { mood, index }),
        );
        self.pump_widget_events();
        Some(track)
    }

    /// Toggles playback. Does nothing until the player is ready.
    pub fn toggle_play_pause(&mut self) {
        if !self.is_ready() {
            debug!("Play/pause ignored, player not ready");
            return;
        }
        if self.widget.is_paused() {
            self.widget.play();
        } else {
            self.widget.pause();
        }
        self.pump_widget_events();
    }

    // ---- settings mutations ----

    pub fn set_volume(&mut self, volume: u8) {
        self.settings.set_volume(volume);
        self.current_volume = self.settings.volume;
        if self.is_ready() {
            self.widget.set_volume(self.current_volume);
        }
        self.schedule_save();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
        self.schedule_save();
    }

    pub fn set_auto_analyze(&mut self, auto_analyze: bool) {
        self.settings.auto_analyze = auto_analyze;
        self.schedule_save();
    }

    pub fn set_playlist(&mut self, mood: Mood, reference: &str) {
        self.settings.set_playlist(mood, reference);
        self.schedule_save();
    }

    // ---- host events ----

    /// Inbound chat message hook. Schedules a delayed analysis of the recent
    /// chat window unless disabled or the message is the user's own.
    /// Returns whether an analysis was scheduled.
    pub fn on_message_received(&mut self, message: &ChatMessage, chat: &[ChatMessage]) -> bool {
        if !self.settings.enabled || !self.settings.auto_analyze {
            return false;
        }
        if message.is_user {
            return false;
        }
        let window = (!chat.is_empty()).then(|| {
            let texts: Vec<&str> = chat.iter().map(|m| m.text.as_str()).collect();
            classifier::recent_window(&texts)
        });
        debug!("Scheduling mood analysis in {ANALYZE_DELAY_MS}ms");
        self.timers.schedule(ANALYZE_DELAY_MS, Task::Analyze { window });
        true
    }

    /// Widget event entry point for push-style hosts.
    pub fn handle_widget_event(&mut self, event: WidgetEvent) {
        self.on_widget_event(event);
        self.pump_widget_events();
    }

    /// Advances virtual time by `ms`, running every task that falls due.
    pub fn advance(&mut self, ms: u64) {
        let until = self.timers.now().saturating_add(ms);
        self.pump_widget_events();
        while let Some((_, task)) = self.timers.pop_due(until) {
            self.run_task(task);
            self.pump_widget_events();
        }
        self.timers.advance_clock(until);
    }

    /// Runs tasks until none are pending.
    pub fn settle(&mut self) {
        while let Some(due) = self.timers.next_due() {
            self.advance(due.saturating_sub(self.timers.now()));
        }
    }

    /// Drains events buffered by the widget. Re-entrant calls are no-ops; the
    /// outermost pump picks up whatever nested handlers produced.
    pub fn pump_widget_events(&mut self) {
        if self.pumping {
            return;
        }
        self.pumping = true;
        loop {
            let events = self.widget.poll_events();
            if events.is_empty() {
                break;
            }
            for event in events {
                self.on_widget_event(event);
            }
        }
        self.pumping = false;
    }

    // ---- internals ----

    fn begin_transition(&mut self, mood: Mood, playlist: String) -> RequestOutcome {
        match self.current_mood {
            Some(current) if current != mood && self.is_playing => {
                info!("Mood change: {current} -> {mood}");
                self.start_fade(
                    self.current_volume,
                    0,
                    MOOD_FADE_MS,
                    Some(FadeCompletion::LoadPlaylist { mood, playlist }),
                );
                RequestOutcome::FadingOut
            }
            _ => {
                self.load_playlist(&playlist, mood, false);
                RequestOutcome::Loading
            }
        }
    }

    fn load_playlist(&mut self, playlist: &str, mood: Mood, fade_in: bool) {
        info!("Loading playlist for {mood}");
        self.events.push(SessionEvent::Loading { mood });

        self.cached_tracks.remove(&mood);
        self.pending_load = Some(PendingLoad {
            mood,
            fade_in,
            previous_phase: self.phase,
            previous_mood: self.current_mood,
        });
        self.current_mood = Some(mood);
        self.phase = PlayerPhase::Loading(mood);

        let seed = self.rng.gen_range(0..SOURCE_SEED_RANGE);
        self.widget.load(&PlaylistSource::playlist(playlist, seed));
    }

    fn on_widget_event(&mut self, event: WidgetEvent) {
        match event {
            WidgetEvent::Ready => self.on_ready(),
            WidgetEvent::Play => {
                self.is_playing = true;
                if let PlayerPhase::Paused(mood) = self.phase {
                    self.phase = PlayerPhase::Playing(mood);
                }
                self.events.push(SessionEvent::PlaybackChanged { playing: true });
            }
            WidgetEvent::Pause => {
                self.is_playing = false;
                if let PlayerPhase::Playing(mood) = self.phase {
                    self.phase = PlayerPhase::Paused(mood);
                }
                self.events.push(SessionEvent::PlaybackChanged { playing: false });
            }
            WidgetEvent::Progress(fraction) => {
                let fraction = if fraction.is_finite() { fraction.clamp(0.0, 1.0) } else { 0.0 };
                self.events.push(SessionEvent::Progress { fraction });
            }
            WidgetEvent::Finished => {
                // natural end: straight to the widget's next, no fade
                info!("Track finished, advancing");
                self.widget.next();
            }
        }
    }

    fn on_ready(&mut self) {
        match self.readiness {
            Readiness::Detached => {
                debug!("Ready signal before attach ignored");
                return;
            }
            Readiness::Initializing => {
                self.widget.set_volume(self.settings.volume);
                self.readiness = Readiness::Ready;
                info!("Player ready");
                if let Some(mood) = self.deferred_request.take() {
                    if let Some(playlist) = self.settings.playlist_for(mood).map(str::to_string) {
                        self.begin_transition(mood, playlist);
                    }
                }
                return;
            }
            Readiness::Ready => {}
        }

        let Some(pending) = self.pending_load.take() else {
            debug!("Duplicate ready signal ignored");
            return;
        };
        let mood = pending.mood;

        self.widget.set_volume(if pending.fade_in { 0 } else { self.settings.volume });

        let tracks = self.widget.tracks();
        let index = self.widget.current_index();
        let Some(track) = tracks.get(index).or_else(|| tracks.first()).cloned() else {
            warn!("Playlist for {mood} is empty");
            self.phase = pending.previous_phase;
            self.current_mood = pending.previous_mood;
            return;
        };
        info!("Loaded {} tracks for {mood}", tracks.len());

        self.cached_tracks.insert(mood, tracks);
        self.last_played_track_id = Some(track.id);
        // autoplay may be refused by the host
        self.is_playing = !self.widget.is_paused();
        self.phase = if self.is_playing {
            PlayerPhase::Playing(mood)
        } else {
            PlayerPhase::Paused(mood)
        };
        info!("Now playing: {} - {}", track.artist(), track.title);
        self.events.push(SessionEvent::NowPlaying { mood, track });

        if pending.fade_in {
            self.timers.schedule(
                FADE_IN_DELAY_MS,
                Task::StartFadeIn {
                    duration_ms: MOOD_FADE_MS,
                },
            );
        }
    }

    fn start_fade(
        &mut self,
        from: u8,
        to: u8,
        duration_ms: u64,
        on_complete: Option<FadeCompletion>,
    ) {
        if let Some(previous) = self.fade.take() {
            self.timers.cancel(previous.timer);
            debug!("Cancelled in-flight fade towards {}", previous.ramp.target());
        }
        let ramp = VolumeRamp::new(from, to, duration_ms);
        let timer = self.timers.schedule(ramp.step_ms(), Task::RampStep);
        self.fade = Some(ActiveFade {
            ramp,
            timer,
            on_complete,
        });
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::RampStep => self.step_fade(),
            Task::StartFadeIn { duration_ms } => {
                self.start_fade(0, self.settings.volume, duration_ms, None);
            }
            Task::Analyze { window } => {
                let mood = window.as_deref().map_or(Mood::FALLBACK, classifier::classify);
                if let Err(err) = self.request(mood) {
                    error!("Automatic mood playback failed: {err:#}");
                }
            }
            Task::PersistSettings => {
                self.save_timer = None;
                if let Err(err) = self.store.save(&self.settings) {
                    error!("Failed to save settings: {err:#}");
                }
            }
        }
    }

    fn step_fade(&mut self) {
        let Some(mut fade) = self.fade.take() else {
            return;
        };
        let tick = fade.ramp.advance();
        if self.is_ready() {
            self.widget.set_volume(tick.volume());
        }
        match tick {
            RampTick::Level(_) => {
                fade.timer = self.timers.schedule(fade.ramp.step_ms(), Task::RampStep);
                self.fade = Some(fade);
            }
            RampTick::Done(_) => {
                if let Some(completion) = fade.on_complete {
                    self.complete_fade(completion);
                }
            }
        }
    }

    fn complete_fade(&mut self, completion: FadeCompletion) {
        match completion {
            FadeCompletion::LoadPlaylist { mood, playlist } => {
                self.load_playlist(&playlist, mood, true);
            }
            FadeCompletion::SwitchTrack { mood, index } => {
                let track = self.cached_tracks.get(&mood).and_then(|t| t.get(index)).cloned();
                if let Some(track) = track {
                    self.events.push(SessionEvent::NowPlaying { mood, track });
                }
                self.widget.skip_to_index(index);
                self.widget.play();
                self.timers.schedule(
                    FADE_IN_DELAY_MS,
                    Task::StartFadeIn {
                        duration_ms: SKIP_FADE_MS,
                    },
                );
            }
        }
    }

    fn schedule_save(&mut self) {
        if let Some(timer) = self.save_timer.take() {
            self.timers.cancel(timer);
        }
        self.save_timer = Some(self.timers.schedule(SAVE_DEBOUNCE_MS, Task::PersistSettings));
    }
}

/// Picks a random index whose track differs from `last_played`.
///
/// Draws up to [`MAX_PICK_ATTEMPTS`] times; if every draw hit the last played
/// track, the first track with a different id is taken instead. A single-track
/// list (or one where every id is the same) returns a repeat.
///
/// # Panics
///
/// Panics if `tracks` is empty.
pub fn pick_different_track<R: Rng>(
    tracks: &[Track],
    last_played: Option<u64>,
    rng: &mut R,
) -> usize {
    let mut index = rng.gen_range(0..tracks.len());
    let mut attempts = 1;
    while Some(tracks[index].id) == last_played
        && attempts < MAX_PICK_ATTEMPTS
        && tracks.len() > 1
    {
        index = rng.gen_range(0..tracks.len());
        attempts += 1;
    }
    if Some(tracks[index].id) == last_played {
        if let Some(other) = tracks.iter().position(|t| Some(t.id) != last_played) {
            return other;
        }
    }
    index
}
