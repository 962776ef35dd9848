//! Interactive timeline state.
//!
//! [`TimelineController`] turns pointer, keyboard and player events into a
//! consistent playback position and in/out [`Selection`]. It performs no I/O:
//! each call to [`handle`](TimelineController::handle) returns the
//! [`PlayerCommand`]s the caller should forward to its media player.
//!
//! ```
//! use framecut::{PlayerCommand, TimelineController, TimelineEvent};
//!
//! let mut timeline = TimelineController::new();
//! timeline.handle(TimelineEvent::MediaLoaded { duration: 10.0 });
//! let commands = timeline.handle(TimelineEvent::TimelineClick { position: 0.25 });
//! assert_eq!(commands, vec![PlayerCommand::Seek(2.5)]);
//! assert_eq!(timeline.selected_time(), Some(2.5));
//! assert!(timeline.can_extract_frame());
//! ```

use log::trace;

use crate::error::FramecutError;
use crate::job::ExtractionJob;
use crate::selection::{Marker, Selection};

/// Keyboard step without a modifier: one frame at 30 fps.
pub const FRAME_STEP: f64 = 1.0 / 30.0;

/// Keyboard step with the modifier held.
pub const SECOND_STEP: f64 = 1.0;

/// Keys the timeline reacts to while focused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    Home,
    End,
    Space,
}

/// Input to the [`TimelineController`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimelineEvent {
    /// The player finished reading metadata for a new source.
    MediaLoaded { duration: f64 },
    /// Click on the timeline bar; `position` is a fraction of its width.
    TimelineClick { position: f64 },
    /// A marker handle was grabbed.
    MarkerPointerDown(Marker),
    /// The pointer moved; `position` is a fraction of the timeline width.
    PointerMove { position: f64 },
    /// The pointer was released anywhere.
    PointerUp,
    /// A key was pressed; `modifier` is the shift state.
    KeyPressed { key: Key, modifier: bool },
    /// The timeline gained or lost keyboard focus.
    FocusChanged(bool),
    /// Transport button: go to the start marker.
    JumpToStart,
    /// Transport button: go to the end marker.
    JumpToEnd,
    /// Transport button: play or pause.
    TogglePlay,
    /// The player's periodic position report.
    TimeUpdate { time: f64 },
}

/// Instruction for the external media player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerCommand {
    Seek(f64),
    Play,
    Pause,
}

/// What the timeline is doing right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Playing,
    DraggingStart,
    DraggingEnd,
    /// Passed through while a click or key moves the playhead.
    Seeking,
}

/// Playback position, selection and interaction state for one source.
#[derive(Debug, Clone)]
pub struct TimelineController {
    duration: f64,
    selection: Selection,
    current_time: f64,
    is_playing: bool,
    selected_time: Option<f64>,
    focused: bool,
    state: InteractionState,
}

impl Default for TimelineController {
    fn default() -> Self {
        Self::new()
    }
}

impl TimelineController {
    /// A controller with no media loaded.
    pub fn new() -> Self {
        Self {
            duration: 0.0,
            selection: Selection::full(0.0),
            current_time: 0.0,
            is_playing: false,
            selected_time: None,
            focused: false,
            state: InteractionState::Idle,
        }
    }

    /// Apply one event and return the commands for the player.
    pub fn handle(&mut self, event: TimelineEvent) -> Vec<PlayerCommand> {
        let before = self.state;
        let commands = match event {
            TimelineEvent::MediaLoaded { duration } => self.media_loaded(duration),
            TimelineEvent::TimelineClick { position } => {
                let time = self.position_to_time(position);
                self.seek_to(time)
            }
            TimelineEvent::MarkerPointerDown(Marker::Start) => {
                self.state = InteractionState::DraggingStart;
                Vec::new()
            }
            TimelineEvent::MarkerPointerDown(Marker::End) => {
                self.state = InteractionState::DraggingEnd;
                Vec::new()
            }
            TimelineEvent::PointerMove { position } => self.pointer_moved(position),
            TimelineEvent::PointerUp => {
                if matches!(
                    self.state,
                    InteractionState::DraggingStart | InteractionState::DraggingEnd
                ) {
                    self.state = self.resting_state();
                }
                Vec::new()
            }
            TimelineEvent::KeyPressed { key, modifier } => self.key_pressed(key, modifier),
            TimelineEvent::FocusChanged(focused) => {
                self.focused = focused;
                Vec::new()
            }
            TimelineEvent::JumpToStart => self.seek_to(self.selection.start()),
            TimelineEvent::JumpToEnd => self.seek_to(self.selection.end()),
            TimelineEvent::TogglePlay => self.toggle_play(),
            TimelineEvent::TimeUpdate { time } => self.time_updated(time),
        };
        if before != self.state {
            trace!("timeline {before:?} -> {:?} on {event:?}", self.state);
        }
        commands
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// The last navigated-to time, if any navigation happened since load.
    pub fn selected_time(&self) -> Option<f64> {
        self.selected_time
    }

    pub fn is_focused(&self) -> bool {
        self.focused
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    /// Whether a single-frame extraction can be requested.
    pub fn can_extract_frame(&self) -> bool {
        self.selected_time.is_some()
    }

    /// Snapshot a single-frame job at the selected time.
    ///
    /// # Errors
    ///
    /// Returns [`FramecutError::MissingSelectedTime`] until the user has
    /// navigated somewhere.
    pub fn frame_job(&self) -> Result<ExtractionJob, FramecutError> {
        self.selected_time
            .map(|timestamp| ExtractionJob::ExtractFrame { timestamp })
            .ok_or(FramecutError::MissingSelectedTime)
    }

    /// Snapshot a cut of the current selection.
    pub fn cut_job(&self) -> ExtractionJob {
        ExtractionJob::CutClip {
            start: self.selection.start(),
            end: self.selection.end(),
        }
    }

    /// Snapshot a reversed cut of the current selection.
    pub fn reversed_cut_job(&self) -> ExtractionJob {
        ExtractionJob::CutClipReversed {
            start: self.selection.start(),
            end: self.selection.end(),
        }
    }

    /// Snapshot a `count`-frame sequence over the current selection.
    pub fn sequence_job(&self, count: usize) -> ExtractionJob {
        ExtractionJob::ExtractFrameSequence {
            start: self.selection.start(),
            end: self.selection.end(),
            count,
        }
    }

    fn resting_state(&self) -> InteractionState {
        if self.is_playing {
            InteractionState::Playing
        } else {
            InteractionState::Idle
        }
    }

    fn position_to_time(&self, position: f64) -> f64 {
        let position = if position.is_finite() {
            position.clamp(0.0, 1.0)
        } else {
            0.0
        };
        position * self.duration
    }

    fn clamp_to_media(&self, time: f64) -> f64 {
        if time.is_finite() {
            time.clamp(0.0, self.duration)
        } else {
            0.0
        }
    }

    fn media_loaded(&mut self, duration: f64) -> Vec<PlayerCommand> {
        self.duration = if duration.is_finite() {
            duration.max(0.0)
        } else {
            0.0
        };
        self.selection = Selection::full(self.duration);
        self.current_time = 0.0;
        self.selected_time = None;
        self.is_playing = false;
        self.state = InteractionState::Idle;
        Vec::new()
    }

    /// Navigation shared by clicks, keys and transport buttons.
    fn seek_to(&mut self, time: f64) -> Vec<PlayerCommand> {
        self.state = InteractionState::Seeking;
        self.current_time = self.clamp_to_media(time);
        self.selected_time = Some(self.current_time);
        self.state = self.resting_state();
        vec![PlayerCommand::Seek(self.current_time)]
    }

    fn pointer_moved(&mut self, position: f64) -> Vec<PlayerCommand> {
        let time = self.position_to_time(position);
        match self.state {
            InteractionState::DraggingStart => {
                let start = self.selection.drag_start(time, self.duration);
                if self.current_time < start {
                    self.current_time = start;
                    return vec![PlayerCommand::Seek(start)];
                }
                Vec::new()
            }
            InteractionState::DraggingEnd => {
                let end = self.selection.drag_end(time, self.duration);
                if self.current_time > end {
                    self.current_time = end;
                    return vec![PlayerCommand::Seek(end)];
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn key_pressed(&mut self, key: Key, modifier: bool) -> Vec<PlayerCommand> {
        if !self.focused {
            return Vec::new();
        }
        let step = if modifier { SECOND_STEP } else { FRAME_STEP };
        match key {
            Key::ArrowLeft => {
                let time = self.selection.clamp(self.current_time - step);
                self.seek_to(time)
            }
            Key::ArrowRight => {
                let time = self.selection.clamp(self.current_time + step);
                self.seek_to(time)
            }
            Key::Home => self.seek_to(self.selection.start()),
            Key::End => self.seek_to(self.selection.end()),
            Key::Space => self.toggle_play(),
        }
    }

    fn toggle_play(&mut self) -> Vec<PlayerCommand> {
        if self.is_playing {
            self.is_playing = false;
            self.state = InteractionState::Idle;
            return vec![PlayerCommand::Pause];
        }

        let mut commands = Vec::new();
        if self.current_time >= self.selection.end() || self.current_time < self.selection.start()
        {
            self.current_time = self.selection.start();
            commands.push(PlayerCommand::Seek(self.current_time));
        }
        self.is_playing = true;
        self.state = InteractionState::Playing;
        commands.push(PlayerCommand::Play);
        commands
    }

    fn time_updated(&mut self, time: f64) -> Vec<PlayerCommand> {
        self.current_time = self.clamp_to_media(time);
        if self.current_time < self.selection.end() {
            return Vec::new();
        }

        let end = self.selection.end();
        self.current_time = end;
        let was_playing = self.is_playing;
        self.is_playing = false;
        if self.state == InteractionState::Playing {
            self.state = InteractionState::Idle;
        }
        if was_playing {
            vec![PlayerCommand::Pause, PlayerCommand::Seek(end)]
        } else {
            vec![PlayerCommand::Seek(end)]
        }
    }
}
