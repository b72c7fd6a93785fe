//! Mock implementations for testing
//!
//! Every mock is a cheap handle around shared state, so a test can give one
//! clone to the actor under test and keep another to inspect what happened
//! and to deliver completions at a moment of its choosing. Completions are
//! never delivered automatically; the test (or a pump harness) decides the
//! interleaving.

use std::cell::{Cell, Ref, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::string::{String, ToString};
use std::vec;
use std::vec::Vec;

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config::{BYTES_PER_SAMPLE, SLOT_SAMPLES};
use crate::*;

// ── Converter ────────────────────────────────────────────────────────────────

/// Everything a [`MockConverter`] has been asked to do.
#[derive(Debug, Default)]
pub struct ConverterLog {
    /// Last configuration applied.
    pub config: Option<ConverterConfig>,
    /// Number of `start` calls accepted.
    pub starts: u32,
    /// Writes accepted but not yet completed: (buffer tag, sample count).
    pub pending_writes: VecDeque<(u8, usize)>,
    /// Total writes accepted.
    pub writes: u32,
    /// Reads accepted but not yet completed.
    pub pending_reads: VecDeque<SlotId>,
    /// Total reads accepted.
    pub reads: u32,
    /// Converted samples waiting to be read out.
    pub available: usize,
    /// A flush was accepted and has not completed yet.
    pub flushing: bool,
    /// Flushed or cleared and not restarted: reads return what is left.
    pub stopped: bool,
    /// Number of `flush_and_stop` calls accepted.
    pub flushes: u32,
    /// Number of `clear_stop` calls.
    pub clear_stops: u32,
    /// Refuse `start`.
    pub reject_start: bool,
    /// Refuse `write`.
    pub reject_writes: bool,
    /// Refuse `read`.
    pub reject_reads: bool,
    /// Refuse `flush_and_stop`.
    pub reject_flush: bool,
}

/// Sample-rate converter mock. Converts 1:1 and never loses samples.
#[derive(Clone, Default)]
pub struct MockConverter {
    log: Rc<RefCell<ConverterLog>>,
}

/// Write half handed to the decode controller.
#[derive(Clone)]
pub struct MockConverterInput {
    log: Rc<RefCell<ConverterLog>>,
}

/// Read half handed to the audio output controller.
#[derive(Clone)]
pub struct MockConverterOutput {
    log: Rc<RefCell<ConverterLog>>,
}

impl MockConverter {
    /// Create a converter that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// The write half.
    pub fn input(&self) -> MockConverterInput {
        MockConverterInput {
            log: Rc::clone(&self.log),
        }
    }

    /// The read half.
    pub fn output(&self) -> MockConverterOutput {
        MockConverterOutput {
            log: Rc::clone(&self.log),
        }
    }

    /// Inspect the call log.
    pub fn log(&self) -> Ref<'_, ConverterLog> {
        self.log.borrow()
    }

    /// Change failure injection or other log state.
    pub fn with_log<R>(&self, f: impl FnOnce(&mut ConverterLog) -> R) -> R {
        f(&mut self.log.borrow_mut())
    }

    /// Finish the oldest pending write; its samples become readable.
    ///
    /// Returns the buffer tag the completion must carry.
    pub fn complete_write(&self) -> Option<u8> {
        let mut log = self.log.borrow_mut();
        let (buffer, samples) = log.pending_writes.pop_front()?;
        log.available = log.available.saturating_add(samples);
        Some(buffer)
    }

    /// Finish the oldest pending read if it can be satisfied.
    ///
    /// A read is satisfied when a full slot of converted samples is
    /// available, or once the converter is stopping and every queued write
    /// has drained (then it returns whatever is left, possibly nothing). The slot is filled with
    /// `fill` for the samples delivered. Returns the slot and byte count.
    pub fn complete_read<M: RawMutex>(&self, bank: &SlotBank<M>, fill: i32) -> Option<(SlotId, u32)> {
        let mut log = self.log.borrow_mut();
        let slot = *log.pending_reads.front()?;
        let samples = if log.available >= SLOT_SAMPLES {
            SLOT_SAMPLES
        } else if log.stopped && log.pending_writes.is_empty() {
            log.available
        } else {
            return None;
        };
        log.pending_reads.pop_front();
        log.available = log.available.saturating_sub(samples);
        bank.with_slot_mut(slot, |s| {
            if let Some(head) = s.get_mut(..samples) {
                head.fill(fill);
            }
        });
        let bytes = samples.saturating_mul(BYTES_PER_SAMPLE);
        Some((slot, u32::try_from(bytes).unwrap_or(u32::MAX)))
    }

    /// Finish a pending flush once every queued write has drained.
    pub fn complete_flush(&self) -> bool {
        let mut log = self.log.borrow_mut();
        if log.flushing && log.pending_writes.is_empty() {
            log.flushing = false;
            true
        } else {
            false
        }
    }
}

impl ConverterInput for MockConverterInput {
    fn configure(&mut self, config: ConverterConfig) -> Result<(), DriverError> {
        self.log.borrow_mut().config = Some(config);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DriverError> {
        let mut log = self.log.borrow_mut();
        if log.reject_start {
            return Err(DriverError::Rejected);
        }
        log.starts = log.starts.saturating_add(1);
        log.available = 0;
        log.stopped = false;
        Ok(())
    }

    fn write(&mut self, buffer: u8, samples: &[i32]) -> Result<(), DriverError> {
        let mut log = self.log.borrow_mut();
        if log.reject_writes {
            return Err(DriverError::Rejected);
        }
        log.writes = log.writes.saturating_add(1);
        log.pending_writes.push_back((buffer, samples.len()));
        Ok(())
    }

    fn flush_and_stop(&mut self) -> Result<(), DriverError> {
        let mut log = self.log.borrow_mut();
        if log.reject_flush {
            return Err(DriverError::Rejected);
        }
        log.flushes = log.flushes.saturating_add(1);
        log.flushing = true;
        log.stopped = true;
        Ok(())
    }

    fn clear_stop(&mut self) {
        let mut log = self.log.borrow_mut();
        log.clear_stops = log.clear_stops.saturating_add(1);
        log.pending_writes.clear();
        log.flushing = false;
        log.stopped = true;
        log.available = 0;
    }
}

impl ConverterOutput for MockConverterOutput {
    fn read(&mut self, slot: SlotId) -> Result<(), DriverError> {
        let mut log = self.log.borrow_mut();
        if log.reject_reads {
            return Err(DriverError::Rejected);
        }
        log.reads = log.reads.saturating_add(1);
        log.pending_reads.push_back(slot);
        Ok(())
    }
}

// ── DAC ──────────────────────────────────────────────────────────────────────

/// Everything a [`MockDac`] has been asked to do.
#[derive(Debug, Default)]
pub struct DacLog {
    /// Slots queued for playback, oldest first.
    pub pending: VecDeque<SlotId>,
    /// Slots whose playback completed, in order.
    pub played: Vec<SlotId>,
    /// Total writes accepted.
    pub writes: u32,
    /// Refuse writes.
    pub reject_writes: bool,
}

/// DAC mock.
#[derive(Clone, Default)]
pub struct MockDac {
    log: Rc<RefCell<DacLog>>,
}

impl MockDac {
    /// Create a DAC that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the call log.
    pub fn log(&self) -> Ref<'_, DacLog> {
        self.log.borrow()
    }

    /// Change failure injection.
    pub fn set_reject_writes(&self, reject: bool) {
        self.log.borrow_mut().reject_writes = reject;
    }

    /// Finish playing the oldest queued slot.
    pub fn complete_write(&self) -> Option<SlotId> {
        let mut log = self.log.borrow_mut();
        let slot = log.pending.pop_front()?;
        log.played.push(slot);
        Some(slot)
    }
}

impl DacOutput for MockDac {
    fn write(&mut self, slot: SlotId) -> Result<(), DriverError> {
        let mut log = self.log.borrow_mut();
        if log.reject_writes {
            return Err(DriverError::Rejected);
        }
        log.writes = log.writes.saturating_add(1);
        log.pending.push_back(slot);
        Ok(())
    }
}

// ── Media volume ─────────────────────────────────────────────────────────────

/// An open file on a [`MockVolume`]. Dropping it closes the file.
#[derive(Debug)]
pub struct MockFile {
    path: String,
    live: Rc<Cell<usize>>,
}

impl MockFile {
    /// Path the file was opened with.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Drop for MockFile {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

/// In-memory volume holding a fixed set of file paths.
#[derive(Clone, Default)]
pub struct MockVolume {
    files: Rc<RefCell<Vec<String>>>,
    folders: Rc<RefCell<Vec<String>>>,
    present: Rc<Cell<bool>>,
    mounted: Rc<Cell<bool>>,
    live: Rc<Cell<usize>>,
    opened: Rc<RefCell<Vec<String>>>,
    unreadable: Rc<RefCell<Vec<String>>>,
}

impl MockVolume {
    /// A present volume containing `paths` (slash-separated, no leading slash).
    pub fn with_files(paths: &[&str]) -> Self {
        let volume = Self::default();
        volume.present.set(true);
        for path in paths {
            volume.add_file(path);
        }
        volume
    }

    /// Add a file; parent folders are created implicitly.
    pub fn add_file(&self, path: &str) {
        let mut folders = self.folders.borrow_mut();
        let mut end = 0;
        while let Some(pos) = path.get(end..).and_then(|rest| rest.find('/')) {
            end = end.saturating_add(pos);
            let folder = path.get(..end).unwrap_or_default().to_string();
            if !folders.contains(&folder) {
                folders.push(folder);
            }
            end = end.saturating_add(1);
        }
        self.files.borrow_mut().push(path.to_string());
    }

    /// Add an empty folder.
    pub fn add_folder(&self, path: &str) {
        self.folders.borrow_mut().push(path.to_string());
    }

    /// Make `open_file` fail for `path`.
    pub fn make_unreadable(&self, path: &str) {
        self.unreadable.borrow_mut().push(path.to_string());
    }

    /// Plug or unplug the device.
    pub fn set_present(&self, present: bool) {
        self.present.set(present);
        if !present {
            self.mounted.set(false);
        }
    }

    /// File handles currently open (including ones owned by a codec).
    pub fn open_handles(&self) -> usize {
        self.live.get()
    }

    /// Every path passed to a successful `open_file`, in order.
    pub fn opened(&self) -> Vec<String> {
        self.opened.borrow().clone()
    }

    fn parent_of(path: &str) -> &str {
        path.rfind('/').and_then(|i| path.get(..i)).unwrap_or("")
    }

    fn name_of(path: &str) -> &str {
        path.rfind('/')
            .and_then(|i| path.get(i.saturating_add(1)..))
            .unwrap_or(path)
    }
}

impl MediaVolume for MockVolume {
    type File = MockFile;

    fn connect(&mut self) -> bool {
        if self.present.get() {
            self.mounted.set(true);
        }
        self.mounted.get()
    }

    fn is_connected(&mut self) -> bool {
        self.mounted.get() && self.present.get()
    }

    fn read_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(&str, EntryKind),
    ) -> Result<(), MediaError> {
        if !self.is_connected() {
            return Err(MediaError::NotConnected);
        }
        for folder in self.folders.borrow().iter() {
            if Self::parent_of(folder) == path {
                visit(Self::name_of(folder), EntryKind::Folder);
            }
        }
        for file in self.files.borrow().iter() {
            if Self::parent_of(file) == path {
                visit(Self::name_of(file), EntryKind::File);
            }
        }
        Ok(())
    }

    fn open_file(&mut self, path: &str) -> Result<MockFile, MediaError> {
        if !self.is_connected() {
            return Err(MediaError::NotConnected);
        }
        if self.unreadable.borrow().iter().any(|p| p == path) {
            return Err(MediaError::Io);
        }
        if !self.files.borrow().iter().any(|p| p == path) {
            return Err(MediaError::NotFound);
        }
        self.live.set(self.live.get().saturating_add(1));
        self.opened.borrow_mut().push(path.to_string());
        Ok(MockFile {
            path: path.to_string(),
            live: Rc::clone(&self.live),
        })
    }
}

// ── Codec ────────────────────────────────────────────────────────────────────

/// Scripted content of one mock stream.
#[derive(Debug, Clone, Copy)]
pub struct MockStream {
    /// Metadata reported by `open`.
    pub info: StreamInfo,
    /// Blocks produced before end of stream.
    pub blocks: u32,
    /// Frames per block.
    pub frames_per_block: u32,
    /// Fail `open` with this error instead.
    pub open_error: Option<CodecError>,
}

impl MockStream {
    /// A valid stereo 16-bit stream of `blocks` blocks of 4096 frames.
    pub fn stereo(sample_rate: u32, blocks: u32) -> Self {
        Self {
            info: StreamInfo {
                sample_rate,
                channels: 2,
                bits_per_sample: 16,
                total_frames: u64::from(blocks).saturating_mul(4096),
            },
            blocks,
            frames_per_block: 4096,
            open_error: None,
        }
    }
}

/// Everything a [`MockCodec`] has done.
#[derive(Debug, Default)]
pub struct CodecLog {
    /// Paths passed to `open`, in order.
    pub opened: Vec<String>,
    /// Number of `close` calls.
    pub closes: u32,
    /// Blocks produced for the current stream.
    pub blocks_decoded: u32,
}

/// Codec mock. Streams are looked up by file path; unknown paths get the
/// default stream.
#[derive(Clone)]
pub struct MockCodec {
    streams: Rc<RefCell<Vec<(String, MockStream)>>>,
    default: MockStream,
    current: Rc<RefCell<Option<(MockFile, MockStream)>>>,
    log: Rc<RefCell<CodecLog>>,
}

impl MockCodec {
    /// A codec that plays `default` for every file.
    pub fn new(default: MockStream) -> Self {
        Self {
            streams: Rc::new(RefCell::new(Vec::new())),
            default,
            current: Rc::new(RefCell::new(None)),
            log: Rc::new(RefCell::new(CodecLog::default())),
        }
    }

    /// Use `stream` for the file at `path`.
    pub fn set_stream(&self, path: &str, stream: MockStream) {
        self.streams.borrow_mut().push((path.to_string(), stream));
    }

    /// Inspect the call log.
    pub fn log(&self) -> Ref<'_, CodecLog> {
        self.log.borrow()
    }

    /// Whether a stream is currently open.
    pub fn is_open(&self) -> bool {
        self.current.borrow().is_some()
    }
}

impl StreamCodec for MockCodec {
    type Stream = MockFile;

    fn open(&mut self, stream: MockFile) -> Result<StreamInfo, CodecError> {
        let script = self
            .streams
            .borrow()
            .iter()
            .find(|(p, _)| p == stream.path())
            .map_or(self.default, |(_, s)| *s);
        {
            let mut log = self.log.borrow_mut();
            log.opened.push(stream.path().to_string());
            log.blocks_decoded = 0;
        }
        if let Some(err) = script.open_error {
            // The file is dropped (closed) here, like a decoder that fails
            // while reading metadata.
            return Err(err);
        }
        *self.current.borrow_mut() = Some((stream, script));
        Ok(script.info)
    }

    fn decode_next(&mut self, sink: &mut dyn BlockSink) -> Result<BlockStatus, CodecError> {
        let current = self.current.borrow();
        let Some((_, script)) = current.as_ref() else {
            return Err(CodecError::NotOpen);
        };
        let mut log = self.log.borrow_mut();
        if log.blocks_decoded >= script.blocks {
            return Ok(BlockStatus::EndOfStream);
        }
        let frames = script.frames_per_block;
        let value = i32::try_from(log.blocks_decoded).unwrap_or(i32::MAX).saturating_add(1);
        let plane = vec![value; usize::try_from(frames).unwrap_or(0)];
        let planes: Vec<&[i32]> = (0..script.info.channels).map(|_| plane.as_slice()).collect();
        let header = BlockHeader {
            first_frame: Some(u64::from(log.blocks_decoded).saturating_mul(u64::from(frames))),
            frames,
        };
        log.blocks_decoded = log.blocks_decoded.saturating_add(1);
        drop(log);
        let _ = sink.write_block(header, &planes);
        Ok(BlockStatus::Decoded)
    }

    fn close(&mut self) {
        self.current.borrow_mut().take();
        let mut log = self.log.borrow_mut();
        log.closes = log.closes.saturating_add(1);
    }
}

// ── Display ──────────────────────────────────────────────────────────────────

/// One recorded display notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    /// `play_time`
    PlayTime {
        /// Status shown.
        status: PlayStatus,
        /// 1-based track number.
        track_no: u32,
        /// Seconds played.
        play_secs: u32,
        /// Track length in seconds.
        total_secs: u32,
    },
    /// `play_info`
    PlayInfo {
        /// 1-based track number.
        track_no: u32,
        /// Source rate.
        sample_rate_hz: u32,
        /// Source channels.
        channels: u8,
    },
    /// `play_mode`
    PlayMode(bool),
    /// `file_name`
    FileName(String),
    /// `print_string`
    Print(String),
    /// `input_string`
    Input(String, bool),
    /// `request_help`
    Help,
}

/// Display notifier that records every call.
#[derive(Default)]
pub struct RecordingDisplay {
    events: RefCell<Vec<DisplayEvent>>,
}

impl RecordingDisplay {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far.
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.borrow().clone()
    }

    /// Only the free-text status lines.
    pub fn printed(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Print(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn push(&self, event: DisplayEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl DisplayNotifier for RecordingDisplay {
    fn play_time(&self, status: PlayStatus, track_no: u32, play_secs: u32, total_secs: u32) {
        self.push(DisplayEvent::PlayTime {
            status,
            track_no,
            play_secs,
            total_secs,
        });
    }

    fn play_info(&self, track_no: u32, sample_rate_hz: u32, channels: u8) {
        self.push(DisplayEvent::PlayInfo {
            track_no,
            sample_rate_hz,
            channels,
        });
    }

    fn play_mode(&self, repeat: bool) {
        self.push(DisplayEvent::PlayMode(repeat));
    }

    fn file_name(&self, path: &str) {
        self.push(DisplayEvent::FileName(path.to_string()));
    }

    fn print_string(&self, text: &str) {
        self.push(DisplayEvent::Print(text.to_string()));
    }

    fn input_string(&self, text: &str, finished: bool) {
        self.push(DisplayEvent::Input(text.to_string(), finished));
    }

    fn request_help(&self) {
        self.push(DisplayEvent::Help);
    }
}

// ── Input ────────────────────────────────────────────────────────────────────

/// Switch mock replaying a scripted level per sample; idle (released) after.
#[derive(Default)]
pub struct MockSwitch {
    levels: VecDeque<bool>,
}

impl MockSwitch {
    /// Released for `before` samples, held for `held`, then released.
    pub fn pulse(before: usize, held: usize) -> Self {
        let mut levels = VecDeque::new();
        levels.extend(core::iter::repeat(false).take(before));
        levels.extend(core::iter::repeat(true).take(held));
        Self { levels }
    }
}

impl Switch for MockSwitch {
    fn is_active(&mut self) -> bool {
        self.levels.pop_front().unwrap_or(false)
    }
}

/// Console mock fed from a byte script.
#[derive(Default)]
pub struct MockConsole {
    bytes: VecDeque<u8>,
}

impl MockConsole {
    /// Queue `text` byte by byte.
    pub fn typed(text: &str) -> Self {
        Self {
            bytes: text.bytes().collect(),
        }
    }

    /// Queue more bytes.
    pub fn push_str(&mut self, text: &str) {
        self.bytes.extend(text.bytes());
    }
}

impl ConsoleInput for MockConsole {
    fn read_byte(&mut self) -> Option<u8> {
        self.bytes.pop_front()
    }
}

/// Touch panel mock returning queued keys one poll at a time.
#[derive(Default)]
pub struct MockTouch {
    keys: VecDeque<Option<KeyCode>>,
}

impl MockTouch {
    /// Queue one poll result.
    pub fn push(&mut self, key: Option<KeyCode>) {
        self.keys.push_back(key);
    }
}

impl TouchPanel for MockTouch {
    fn poll_key(&mut self) -> Option<KeyCode> {
        self.keys.pop_front().flatten()
    }
}
