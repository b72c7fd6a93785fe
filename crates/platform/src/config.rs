//! Application configuration and constants
//!
//! Every buffer size, cadence and limit in the player is derived from the
//! values here. Nothing else in the workspace hardcodes a sample rate or a
//! slot count.

/// The application name
pub const APP_NAME: &str = "Rivulet";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Output format ───────────────────────────────────────────────────────────

/// Fixed converter output rate fed to the DAC.
pub const OUTPUT_SAMPLE_RATE_HZ: u32 = 96_000;

/// The DAC is always driven in stereo; mono sources are duplicated.
pub const OUTPUT_CHANNELS: usize = 2;

/// Audio bits carried in each 32-bit output sample.
pub const OUTPUT_BITS_PER_SAMPLE: u32 = 24;

/// Low padding bits below the audio data in each 32-bit container.
pub const OUTPUT_PADDING_BITS: u32 = 8;

/// Bytes per interleaved output sample (one channel).
pub const BYTES_PER_SAMPLE: usize = 4;

// ── Audio output ring ───────────────────────────────────────────────────────

/// Duration of one PCM output slot.
pub const SLOT_DURATION_MS: u32 = 10;

/// Frames (one sample per channel) in one PCM output slot.
pub const SLOT_FRAMES: usize = (OUTPUT_SAMPLE_RATE_HZ as usize / 1000) * SLOT_DURATION_MS as usize;

/// Interleaved samples in one PCM output slot.
pub const SLOT_SAMPLES: usize = SLOT_FRAMES * OUTPUT_CHANNELS;

/// Byte size of one PCM output slot, as reported by converter read completions.
pub const SLOT_BYTES: usize = SLOT_SAMPLES * BYTES_PER_SAMPLE;

/// Number of PCM output slots; equals the converter read-pipeline depth.
pub const PCM_SLOT_COUNT: usize = 9;

/// Filled slots required before the first DAC write after activation.
pub const OUTPUT_START_THRESHOLD: usize = 3;

/// Filled slots required before each DAC write once output is running.
pub const OUTPUT_UPDATE_THRESHOLD: usize = 1;

// ── Decode side ─────────────────────────────────────────────────────────────

/// Largest codec block accepted, in frames.
pub const MAX_BLOCK_FRAMES: usize = 16_384;

/// Smallest codec block a conforming stream may use, in frames.
pub const MIN_BLOCK_FRAMES: usize = 192;

/// Duration of one zero-filled unit written while paused.
pub const PAUSE_UNIT_MS: u32 = 50;

/// Interleaved samples in one zero-filled pause unit.
pub const PAUSE_UNIT_SAMPLES: usize =
    (PAUSE_UNIT_MS as usize * INPUT_MAX_SAMPLE_RATE_HZ as usize / 1000) * OUTPUT_CHANNELS;

/// Interleaved samples in the largest codec block after stereo expansion.
pub const MAX_BLOCK_SAMPLES: usize = MAX_BLOCK_FRAMES * OUTPUT_CHANNELS;

/// Capacity of one decode write buffer, in interleaved samples.
pub const DECODE_BUFFER_SAMPLES: usize = MAX_BLOCK_SAMPLES + PAUSE_UNIT_SAMPLES;

/// Number of decode write buffers cycled through the converter.
pub const DECODE_BUFFER_COUNT: usize = 3;

// ── Accepted input streams ──────────────────────────────────────────────────

/// Lowest accepted source sample rate.
pub const INPUT_MIN_SAMPLE_RATE_HZ: u32 = 22_050;

/// Highest accepted source sample rate.
pub const INPUT_MAX_SAMPLE_RATE_HZ: u32 = 96_000;

/// Highest accepted source channel count.
pub const INPUT_MAX_CHANNELS: u8 = 2;

// ── Mailboxes ───────────────────────────────────────────────────────────────

/// Capacity of every actor mailbox.
pub const MAILBOX_DEPTH: usize = 12;

/// How long the system controller blocks on its mailbox before re-polling
/// the media volume for attach/detach.
pub const SYSTEM_RECEIVE_TIMEOUT_MS: u64 = 10;

// ── Input ───────────────────────────────────────────────────────────────────

/// Input poller tick period.
pub const INPUT_TICK_MS: u64 = 2;

/// A switch must read active this long before it is reported.
pub const SWITCH_DECISION_MS: u64 = 50;

/// Consecutive active ticks needed to report a switch press.
pub const SWITCH_DECISION_TICKS: u32 = (SWITCH_DECISION_MS / INPUT_TICK_MS) as u32;

/// Touch panel polling period, in ticks.
pub const TOUCH_PERIOD_TICKS: u32 = 25;

/// Command-line polling period, in ticks.
pub const COMMAND_PERIOD_TICKS: u32 = 1;

/// The cadence counter wraps after this many ticks.
pub const INPUT_CADENCE_TICKS: u32 = 25;

/// Command-line buffer size including the terminator slot.
pub const COMMAND_LINE_BYTES: usize = 32;

// ── Catalog ─────────────────────────────────────────────────────────────────

/// Folders registered by one scan, including the root.
pub const MAX_FOLDERS: usize = 99;

/// Tracks registered by one scan.
pub const MAX_TRACKS: usize = 999;

/// Deepest folder level descended into (root is depth 0).
pub const MAX_FOLDER_DEPTH: u8 = 8;

/// Longest reconstructed path, in bytes.
pub const MAX_PATH_BYTES: usize = 511;

/// Longest single file or folder name kept in the catalog, in bytes.
pub const MAX_NAME_BYTES: usize = 255;

/// Track ids at or above this value display as track 0.
pub const DISPLAY_TRACK_LIMIT: u32 = 999;

/// Longest status string forwarded to the display.
pub const DISPLAY_TEXT_BYTES: usize = 64;
