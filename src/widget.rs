//! # Embedded Player Widget Seam
//!
//! Playback and streaming are delegated to a third-party embedded player.
//! This module defines the capability set the session drives ([`Widget`]),
//! the events it consumes ([`WidgetEvent`]), the track descriptors the widget
//! reports ([`Track`]) and the embed source it loads ([`PlaylistSource`]).
//!
//! [`ScriptedWidget`] is an in-process implementation backed by a static
//! playlist library. It records every operation invoked on it, which makes it
//! the widget of choice for simulation and tests.
//!
//! ## Event delivery
//!
//! Callback-style hosts push events into
//! [`crate::session::PlayerSession::handle_widget_event`]. Widgets that buffer
//! events instead expose them through [`Widget::poll_events`], which the
//! session drains on every pump.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Base URL of the embeddable player.
pub const PLAYER_BASE_URL: &str = "https://w.soundcloud.com/player/";

/// Source loaded while no mood is playing yet.
pub const PLACEHOLDER_PLAYLIST: &str = "https://soundcloud.com/discover";

/// Failures while bringing the widget up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WidgetError {
    /// The container the player renders into does not exist.
    #[error("player render target not found")]
    MissingRenderTarget,
    /// The widget's script could not be loaded.
    #[error("failed to load player script: {0}")]
    ScriptLoad(String),
}

/// Events emitted by the widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidgetEvent {
    Ready,
    Play,
    Pause,
    /// Fractional position in the current track, 0.0..=1.0.
    Progress(f64),
    Finished,
}

/// Uploader of a track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackUser {
    pub username: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Track descriptor as reported by the widget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: u64,
    pub title: String,
    pub user: TrackUser,
    #[serde(default)]
    pub artwork_url: Option<String>,
}

impl Track {
    #[must_use]
    pub fn new(id: u64, title: &str, artist: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            user: TrackUser {
                username: artist.to_string(),
                avatar_url: None,
            },
            artwork_url: None,
        }
    }

    #[must_use]
    pub fn artist(&self) -> &str {
        &self.user.username
    }

    /// Artwork to show: the track's own, else the uploader's avatar, upscaled
    /// to the 300x300 rendition.
    #[must_use]
    pub fn display_artwork(&self) -> Option<String> {
        self.artwork_url
            .as_deref()
            .or(self.user.avatar_url.as_deref())
            .filter(|url| !url.is_empty())
            .map(|url| url.replace("-large", "-t300x300"))
    }
}

/// What the widget is asked to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistSource {
    /// Playlist reference as configured by the user.
    pub playlist: String,
    /// Start playing as soon as the source is ready.
    pub autoplay: bool,
    /// Cache-busting seed appended to the embed URL.
    pub seed: u32,
}

impl PlaylistSource {
    #[must_use]
    pub fn playlist(playlist: &str, seed: u32) -> Self {
        Self {
            playlist: playlist.to_string(),
            autoplay: true,
            seed,
        }
    }

    /// Silent source used to bring the player up.
    #[must_use]
    pub fn placeholder() -> Self {
        Self {
            playlist: PLACEHOLDER_PLAYLIST.to_string(),
            autoplay: false,
            seed: 0,
        }
    }

    /// Full embed URL for an iframe-hosted player.
    #[must_use]
    pub fn embed_url(&self) -> String {
        let url = format!("{PLAYER_BASE_URL}?url={}", encode_component(&self.playlist));
        if !self.autoplay {
            return url;
        }
        format!(
            "{url}&auto_play=true&hide_related=true&show_comments=false&show_user=true\
             &show_reposts=false&show_teaser=false&visual=true&t={}",
            self.seed
        )
    }
}

/// Escapes everything except the URI-component unreserved set.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Capability set of the embedded player.
///
/// Getters are synchronous: implementations answer from the state reported by
/// the latest [`WidgetEvent::Ready`].
pub trait Widget {
    /// Loads the player script (at most once) and binds to the render target.
    /// Safe to call repeatedly.
    ///
    /// # Errors
    ///
    /// [`WidgetError::MissingRenderTarget`] if there is nothing to render into,
    /// [`WidgetError::ScriptLoad`] if the script could not be fetched.
    fn attach(&mut self) -> Result<(), WidgetError>;

    /// Replaces the current source. A [`WidgetEvent::Ready`] follows once the
    /// new source is usable.
    fn load(&mut self, source: &PlaylistSource);

    fn play(&mut self);

    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn set_volume(&mut self, volume: u8);

    /// Tracks of the loaded source, in playlist order.
    fn tracks(&self) -> Vec<Track>;

    fn current_index(&self) -> usize;

    fn skip_to_index(&mut self, index: usize);

    /// Widget's built-in advance to the next track.
    fn next(&mut self);

    /// Buffered events, for widgets that do not push them.
    fn poll_events(&mut self) -> Vec<WidgetEvent> {
        Vec::new()
    }
}

/// Operation recorded by [`ScriptedWidget`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetOp {
    Attach,
    Load(String),
    Play,
    Pause,
    SetVolume(u8),
    SkipTo(usize),
    Next,
}

/// In-process widget over a fixed playlist library.
#[derive(Debug, Default)]
pub struct ScriptedWidget {
    library: HashMap<String, Vec<Track>>,
    ops: Vec<WidgetOp>,
    events: VecDeque<WidgetEvent>,
    tracks: Vec<Track>,
    index: usize,
    paused: bool,
    volume: u8,
    script_loaded: bool,
    script_loads: u32,
    attach_error: Option<WidgetError>,
    hold_ready: bool,
    held: Option<bool>,
    autoplay_blocked: bool,
}

impl ScriptedWidget {
    #[must_use]
    pub fn new() -> Self {
        Self {
            paused: true,
            ..Self::default()
        }
    }

    /// Builds a widget from a `{ "<playlist>": [track, ...] }` map.
    #[must_use]
    pub fn with_library(library: HashMap<String, Vec<Track>>) -> Self {
        Self {
            library,
            ..Self::new()
        }
    }

    #[must_use]
    pub fn with_playlist(mut self, playlist: &str, tracks: Vec<Track>) -> Self {
        self.set_playlist(playlist, tracks);
        self
    }

    /// Replaces the tracks served for `playlist` on its next load.
    pub fn set_playlist(&mut self, playlist: &str, tracks: Vec<Track>) {
        self.library.insert(playlist.to_string(), tracks);
    }

    /// Refuses autoplay, as browsers do without a user gesture.
    pub fn block_autoplay(&mut self, blocked: bool) {
        self.autoplay_blocked = blocked;
    }

    /// Makes the next [`Widget::attach`] calls fail with `error`.
    pub fn fail_attach(&mut self, error: WidgetError) {
        self.attach_error = Some(error);
    }

    /// While set, loads do not signal readiness until [`Self::release_ready`].
    pub fn hold_ready(&mut self, hold: bool) {
        self.hold_ready = hold;
    }

    /// Signals readiness for a held load.
    pub fn release_ready(&mut self) {
        if let Some(autoplay) = self.held.take() {
            self.signal_ready(autoplay);
        }
    }

    /// Queues an arbitrary event, e.g. `Finished` or a duplicate `Ready`.
    pub fn push_event(&mut self, event: WidgetEvent) {
        self.events.push_back(event);
    }

    #[must_use]
    pub fn ops(&self) -> &[WidgetOp] {
        &self.ops
    }

    pub fn clear_ops(&mut self) {
        self.ops.clear();
    }

    /// Every volume set so far, in order.
    #[must_use]
    pub fn volume_history(&self) -> Vec<u8> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                WidgetOp::SetVolume(v) => Some(*v),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub const fn volume(&self) -> u8 {
        self.volume
    }

    #[must_use]
    pub const fn script_loads(&self) -> u32 {
        self.script_loads
    }

    fn signal_ready(&mut self, autoplay: bool) {
        self.events.push_back(WidgetEvent::Ready);
        if autoplay && !self.autoplay_blocked && !self.tracks.is_empty() {
            self.paused = false;
            self.events.push_back(WidgetEvent::Play);
        }
    }
}

impl Widget for ScriptedWidget {
    fn attach(&mut self) -> Result<(), WidgetError> {
        self.ops.push(WidgetOp::Attach);
        if let Some(err) = self.attach_error.clone() {
            return Err(err);
        }
        if !self.script_loaded {
            self.script_loaded = true;
            self.script_loads += 1;
        }
        Ok(())
    }

    fn load(&mut self, source: &PlaylistSource) {
        self.ops.push(WidgetOp::Load(source.playlist.clone()));
        self.tracks = self.library.get(&source.playlist).cloned().unwrap_or_default();
        self.index = 0;
        self.paused = true;
        self.held = None;
        if self.hold_ready {
            self.held = Some(source.autoplay);
        } else {
            self.signal_ready(source.autoplay);
        }
    }

    fn play(&mut self) {
        self.ops.push(WidgetOp::Play);
        self.paused = false;
        self.events.push_back(WidgetEvent::Play);
    }

    fn pause(&mut self) {
        self.ops.push(WidgetOp::Pause);
        self.paused = true;
        self.events.push_back(WidgetEvent::Pause);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_volume(&mut self, volume: u8) {
        self.ops.push(WidgetOp::SetVolume(volume));
        self.volume = volume;
    }

    fn tracks(&self) -> Vec<Track> {
        self.tracks.clone()
    }

    fn current_index(&self) -> usize {
        self.index
    }

    fn skip_to_index(&mut self, index: usize) {
        self.ops.push(WidgetOp::SkipTo(index));
        if index < self.tracks.len() {
            self.index = index;
        }
    }

    fn next(&mut self) {
        self.ops.push(WidgetOp::Next);
        if !self.tracks.is_empty() {
            self.index = (self.index + 1) % self.tracks.len();
        }
    }

    fn poll_events(&mut self) -> Vec<WidgetEvent> {
        self.events.drain(..).collect()
    }
}
