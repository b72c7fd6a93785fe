//! System actor: the player's top-level state machine.
//!
//! It owns the track catalog and the media volume, turns keys into decoder
//! requests, and follows the decoder's open/close answers and status echoes.
//! Every decoder request is asynchronous, so most user actions go through a
//! "prepare" state that waits for the matching answer:
//!
//! ```text
//! WaitingForMedia ──attach──▶ Stopped ──PlayPause──▶ PreparePlay ──open ok──▶ Playing ⇄ Paused
//!        ▲                      ▲  ▲                    │ Stop                  │ Stop / end
//!        │                      │  │                    ▼                       ▼
//!        └──detached──── PrepareStop ◀── PreparePlayPendingStop        PrepareStopPendingPlay
//!                               ▲                                       (close, then open next)
//!                               └──────────────── close done ◀─────────────────┘
//! ```
//!
//! The track to open is re-checked when the open answer arrives: if the
//! user moved to another track meanwhile, the stream just opened is closed
//! instead of played, and the newly selected track is opened after the
//! close completes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{with_timeout, Duration};
use library::Catalog;
use platform::{DisplayNotifier, KeyCode, MediaVolume, PlayStatus};
use playback::{DecodeClient, DecodeMsg, Mailbox, OpenInfo, PlayReport, ReplyHandle};

use crate::config::PlayerConfig;
use crate::cursor::TrackCursor;
use crate::message::SystemMsg;

const MSG_MEDIA_CONNECTED: &str = "USB connection was detected.";
const MSG_OPEN_FAILED: &str = "Could not play this file.";
const MSG_UNSUPPORTED: &str = "This file format is not supported.";

/// System actor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    /// No media mounted.
    WaitingForMedia,
    /// Media scanned, nothing open.
    Stopped,
    /// Open requested, waiting for the answer.
    PreparePlay,
    /// Open requested, then stopped by the user or media loss.
    PreparePlayPendingStop,
    /// Playing.
    Playing,
    /// Paused.
    Paused,
    /// Stop or close requested, waiting for the close answer.
    PrepareStop,
    /// Stop or close requested; another track opens once closed.
    PrepareStopPendingPlay,
}

impl SystemState {
    /// Short label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForMedia => "waiting-for-media",
            Self::Stopped => "stopped",
            Self::PreparePlay => "prepare-play",
            Self::PreparePlayPendingStop => "prepare-play-pending-stop",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::PrepareStop => "prepare-stop",
            Self::PrepareStopPendingPlay => "prepare-stop-pending-play",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Event {
    Key(KeyCode),
    MediaAttached,
    MediaDetached,
    OpenDone,
    OpenFailed,
    CloseDone,
    Status(PlayStatus),
}

/// The system state machine.
pub struct SystemController<'a, M: RawMutex, V: MediaVolume> {
    volume: V,
    catalog: &'a mut Catalog,
    decoder: DecodeClient<'a, M, V::File>,
    reply: ReplyHandle,
    display: &'a dyn DisplayNotifier,
    state: SystemState,
    cursor: TrackCursor,
    open_track: Option<usize>,
    detached: bool,
    report: PlayReport,
    info: OpenInfo,
}

impl<'a, M, V> SystemController<'a, M, V>
where
    M: RawMutex,
    V: MediaVolume,
{
    /// A controller waiting for media.
    ///
    /// `reply` is the handle the decode actor issued for this actor's
    /// listener.
    pub fn new(
        volume: V,
        catalog: &'a mut Catalog,
        decoder: DecodeClient<'a, M, V::File>,
        reply: ReplyHandle,
        display: &'a dyn DisplayNotifier,
        config: &PlayerConfig,
    ) -> Self {
        Self {
            volume,
            catalog,
            decoder,
            reply,
            display,
            state: SystemState::WaitingForMedia,
            cursor: TrackCursor::new(config.repeat),
            open_track: None,
            detached: false,
            report: PlayReport {
                status: PlayStatus::Stop,
                play_secs: 0,
                total_secs: 0,
            },
            info: OpenInfo {
                sample_rate_hz: 0,
                channels: 0,
            },
        }
    }

    /// Current state.
    pub fn state(&self) -> SystemState {
        self.state
    }

    /// Selected track and repeat mode.
    pub fn cursor(&self) -> &TrackCursor {
        &self.cursor
    }

    /// Track whose open was requested last, until it is closed.
    pub fn open_track(&self) -> Option<usize> {
        self.open_track
    }

    /// The scanned catalog.
    pub fn catalog(&self) -> &Catalog {
        self.catalog
    }

    /// The media volume.
    pub fn volume(&self) -> &V {
        &self.volume
    }

    /// Alternate media polling with mail, forever.
    ///
    /// Media is polled before every receive; the receive gives up after
    /// `receive_timeout` so a detach is noticed while nothing else happens.
    pub async fn run<MM: RawMutex>(
        &mut self,
        mailbox: &Mailbox<MM, SystemMsg>,
        receive_timeout: Duration,
    ) -> ! {
        loop {
            if self.poll_media() {
                continue;
            }
            if let Ok(msg) = with_timeout(receive_timeout, mailbox.receive()).await {
                self.handle(msg);
            }
        }
    }

    /// Check the media volume and handle an attach or detach.
    ///
    /// While waiting for media this tries to mount it; otherwise it checks
    /// that the volume is still there, until a detach has been latched.
    /// Returns `true` if an event was handled.
    pub fn poll_media(&mut self) -> bool {
        let event = if self.state == SystemState::WaitingForMedia {
            self.volume.connect().then_some(Event::MediaAttached)
        } else if !self.detached && !self.volume.is_connected() {
            Some(Event::MediaDetached)
        } else {
            None
        };
        match event {
            Some(event) => {
                self.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Process one message.
    pub fn handle(&mut self, msg: SystemMsg) {
        trace!("system: {} in {}", msg.as_str(), self.state.as_str());
        let event = match msg {
            SystemMsg::Key(key) => Event::Key(key),
            SystemMsg::PlayTime(report) => {
                self.report = report;
                Event::Status(report.status)
            }
            SystemMsg::OpenFinished(Ok(info)) => {
                self.info = info;
                Event::OpenDone
            }
            SystemMsg::OpenFinished(Err(_)) => {
                self.info = OpenInfo {
                    sample_rate_hz: 0,
                    channels: 0,
                };
                self.show_play_time();
                self.open_track = None;
                self.cursor.next();
                Event::OpenFailed
            }
            SystemMsg::CloseFinished => {
                self.report.play_secs = 0;
                self.report.total_secs = 0;
                Event::CloseDone
            }
        };
        self.dispatch(event);
    }

    fn dispatch(&mut self, event: Event) {
        let next = match self.state {
            SystemState::WaitingForMedia => self.on_waiting_for_media(event),
            SystemState::Stopped => self.on_stopped(event),
            SystemState::PreparePlay => self.on_prepare_play(event),
            SystemState::PreparePlayPendingStop => self.on_prepare_play_pending_stop(event),
            SystemState::Playing | SystemState::Paused => self.on_playing(event),
            SystemState::PrepareStop => self.on_prepare_stop(event),
            SystemState::PrepareStopPendingPlay => self.on_prepare_stop_pending_play(event),
        };
        if next != self.state {
            debug!("system: {} -> {}", self.state.as_str(), next.as_str());
            self.state = next;
        }
    }

    fn on_waiting_for_media(&mut self, event: Event) -> SystemState {
        match event {
            Event::MediaAttached => {
                self.detached = false;
                self.catalog.scan(&mut self.volume);
                self.cursor.reset(self.catalog.track_count());
                self.display.print_string(MSG_MEDIA_CONNECTED);
                SystemState::Stopped
            }
            Event::Key(KeyCode::Help) => {
                self.display.request_help();
                self.state
            }
            _ => self.state,
        }
    }

    fn on_stopped(&mut self, event: Event) -> SystemState {
        match event {
            Event::Key(KeyCode::PlayPause) => {
                self.show_file_name();
                if self.open_current() {
                    SystemState::PreparePlay
                } else {
                    self.state
                }
            }
            Event::MediaDetached => {
                self.detached = true;
                SystemState::WaitingForMedia
            }
            other => self.common_key(other),
        }
    }

    fn on_prepare_play(&mut self, event: Event) -> SystemState {
        match event {
            Event::Key(KeyCode::Stop) => SystemState::PreparePlayPendingStop,
            Event::Key(KeyCode::Next) => {
                if self.cursor.next() {
                    self.state
                } else {
                    SystemState::PreparePlayPendingStop
                }
            }
            Event::Key(KeyCode::Prev) => {
                if self.cursor.prev() {
                    self.state
                } else {
                    SystemState::PreparePlayPendingStop
                }
            }
            Event::OpenDone if self.track_changed() => {
                self.show_play_time();
                if self.close() {
                    SystemState::PrepareStopPendingPlay
                } else {
                    self.end();
                    SystemState::Stopped
                }
            }
            Event::OpenDone => {
                self.show_play_info();
                if self.start_play() {
                    SystemState::Playing
                } else if self.close() {
                    SystemState::PrepareStop
                } else {
                    self.end();
                    SystemState::Stopped
                }
            }
            Event::OpenFailed => {
                self.display.print_string(MSG_UNSUPPORTED);
                self.end();
                SystemState::Stopped
            }
            Event::MediaDetached => {
                self.detached = true;
                SystemState::PreparePlayPendingStop
            }
            other => self.common_key(other),
        }
    }

    fn on_prepare_play_pending_stop(&mut self, event: Event) -> SystemState {
        match event {
            Event::OpenDone => {
                self.show_play_time();
                if self.close() {
                    SystemState::PrepareStop
                } else {
                    self.end();
                    self.idle_state()
                }
            }
            Event::OpenFailed => {
                self.display.print_string(MSG_UNSUPPORTED);
                self.end();
                self.idle_state()
            }
            Event::MediaDetached => {
                self.detached = true;
                self.state
            }
            other => self.common_key(other),
        }
    }

    fn on_playing(&mut self, event: Event) -> SystemState {
        match event {
            Event::Key(KeyCode::Stop) => {
                if self.stop() {
                    SystemState::PrepareStop
                } else {
                    self.state
                }
            }
            Event::Key(KeyCode::PlayPause) => {
                let sent = if self.state == SystemState::Playing {
                    self.decoder.pause_on()
                } else {
                    self.decoder.pause_off()
                };
                if sent.is_err() {
                    warn!("system: pause toggle dropped");
                }
                self.state
            }
            Event::Key(key @ (KeyCode::Next | KeyCode::Prev)) => {
                if !self.stop() {
                    return self.state;
                }
                let moved = if key == KeyCode::Prev {
                    self.cursor.prev()
                } else {
                    self.cursor.next()
                };
                if moved {
                    SystemState::PrepareStopPendingPlay
                } else {
                    SystemState::PrepareStop
                }
            }
            Event::Key(KeyCode::PlayInfo) => {
                self.show_play_info();
                self.state
            }
            Event::Status(PlayStatus::Stop) => {
                self.show_play_time();
                if !self.close() {
                    self.end();
                    return self.idle_state();
                }
                if self.cursor.next() {
                    SystemState::PrepareStopPendingPlay
                } else {
                    SystemState::PrepareStop
                }
            }
            Event::Status(PlayStatus::Play) => {
                self.show_play_time();
                SystemState::Playing
            }
            Event::Status(PlayStatus::Pause) => {
                self.show_play_time();
                SystemState::Paused
            }
            Event::MediaDetached => {
                self.detached = true;
                if self.stop() {
                    SystemState::PrepareStop
                } else {
                    // The stream errors out on its own once the media is
                    // gone; its stop status takes the normal path.
                    self.state
                }
            }
            other => self.common_key(other),
        }
    }

    fn on_prepare_stop(&mut self, event: Event) -> SystemState {
        match event {
            Event::CloseDone => {
                self.end();
                self.idle_state()
            }
            Event::Status(PlayStatus::Stop) => {
                if self.close() {
                    self.state
                } else {
                    self.end();
                    self.idle_state()
                }
            }
            Event::MediaDetached => {
                self.detached = true;
                self.state
            }
            other => self.common_key(other),
        }
    }

    fn on_prepare_stop_pending_play(&mut self, event: Event) -> SystemState {
        match event {
            Event::Key(KeyCode::Stop) => SystemState::PrepareStop,
            Event::Key(KeyCode::Next) => {
                if self.cursor.next() {
                    self.state
                } else {
                    SystemState::PrepareStop
                }
            }
            Event::Key(KeyCode::Prev) => {
                if self.cursor.prev() {
                    self.state
                } else {
                    SystemState::PrepareStop
                }
            }
            Event::CloseDone => {
                self.end();
                self.show_file_name();
                if self.open_current() {
                    SystemState::PreparePlay
                } else {
                    SystemState::Stopped
                }
            }
            Event::Status(PlayStatus::Stop) => {
                if self.close() {
                    self.state
                } else {
                    self.end();
                    SystemState::Stopped
                }
            }
            Event::MediaDetached => {
                self.detached = true;
                SystemState::PrepareStop
            }
            other => self.common_key(other),
        }
    }

    /// Repeat and help work in every state with media.
    fn common_key(&mut self, event: Event) -> SystemState {
        match event {
            Event::Key(KeyCode::Repeat) => {
                let repeat = self.cursor.toggle_repeat();
                self.display.play_mode(repeat);
            }
            Event::Key(KeyCode::Help) => self.display.request_help(),
            _ => {}
        }
        self.state
    }

    fn idle_state(&self) -> SystemState {
        if self.detached {
            SystemState::WaitingForMedia
        } else {
            SystemState::Stopped
        }
    }

    fn track_changed(&self) -> bool {
        self.open_track != Some(self.cursor.track())
    }

    /// Open the selected track and hand it to the decoder.
    ///
    /// On failure the cursor moves on so the next attempt tries another
    /// track.
    fn open_current(&mut self) -> bool {
        let Some(id) = self.cursor.current() else {
            return false;
        };
        match self.catalog.open_track(&mut self.volume, id) {
            Ok(file) => match self.decoder.open(file, self.reply) {
                Ok(()) => {
                    self.open_track = Some(id.index());
                    return true;
                }
                Err(rejected) => {
                    warn!("system: open request dropped, track {}", id.index());
                    if let DecodeMsg::Open { file, .. } = rejected.into_inner() {
                        self.volume.close_file(file);
                    }
                }
            },
            Err(_) => warn!("system: cannot open track {}", id.index()),
        }
        self.show_play_time();
        self.display.print_string(MSG_OPEN_FAILED);
        self.open_track = None;
        self.cursor.next();
        false
    }

    fn start_play(&mut self) -> bool {
        if self.decoder.play().is_ok() {
            return true;
        }
        warn!("system: play request dropped");
        self.show_play_time();
        self.open_track = None;
        self.cursor.next();
        false
    }

    fn stop(&mut self) -> bool {
        let sent = self.decoder.stop().is_ok();
        if !sent {
            warn!("system: stop request dropped");
        }
        sent
    }

    fn close(&mut self) -> bool {
        let sent = self.decoder.close(self.reply).is_ok();
        if !sent {
            error!("system: close request dropped, finishing locally");
        }
        sent
    }

    /// Forget the open track. The file itself went to the decoder.
    fn end(&mut self) {
        self.open_track = None;
    }

    fn show_play_time(&self) {
        self.display.play_time(
            self.report.status,
            TrackCursor::display_number(self.cursor.track()),
            self.report.play_secs,
            self.report.total_secs,
        );
    }

    fn show_play_info(&self) {
        self.display.play_info(
            TrackCursor::display_number(self.cursor.track()),
            self.info.sample_rate_hz,
            self.info.channels,
        );
    }

    fn show_file_name(&self) {
        if let Some(name) = self.cursor.current().and_then(|id| self.catalog.track_name(id)) {
            self.display.file_name(name);
        }
    }
}
