//! Rivulet desktop simulator
//!
//! Plays a host folder as if it were the USB stick: FLAC files are decoded
//! with symphonia, converted to the DAC rate with rubato and recorded to a
//! WAV file at the DAC's pace. The terminal display draws on stdout; log
//! output goes to stderr.
//!
//! ```bash
//! cargo run -p firmware --bin simulator --features simulator -- ./music \
//!     --wav out.wav --script "playpause;next" --seconds 20
//! ```

// Desktop binary: errors are reported through anyhow.
#![allow(missing_docs)]

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use embassy_futures::join::join3;
use embassy_futures::select::{select3, Either3};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_time::{Duration, Timer};
use firmware::sim::{FlacCodec, RateConverter, Relay, SimConsole, StdoutTerminal, WavDac};
use firmware::{run_player, AudioDrivers, InputSources, Mailboxes, PlayerConfig};
use library::{Catalog, LocalVolume};
use platform::config::{APP_NAME, APP_VERSION, SLOT_DURATION_MS};
use platform::{NoSwitch, NoTouch};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "simulator")]
#[command(about = "Rivulet FLAC player on the desktop", long_about = None)]
#[command(version)]
struct Args {
    /// Folder standing in for the USB stick
    music: PathBuf,
    /// WAV file recording the DAC output
    #[arg(long, default_value = "rivulet.wav")]
    wav: PathBuf,
    /// Start with repeat mode off
    #[arg(long)]
    no_repeat: bool,
    /// Commands to type at start-up, separated by ';' (e.g. "playpause;next")
    #[arg(long)]
    script: Option<String>,
    /// Idle input ticks after each scripted command
    #[arg(long, default_value_t = 500)]
    script_gap: usize,
    /// Stop after this many seconds
    #[arg(long)]
    seconds: Option<u64>,
    /// Record as fast as possible instead of in real time
    #[arg(long)]
    fast: bool,
    /// Do not read commands from stdin
    #[arg(long)]
    no_stdin: bool,
    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!(
        "{} {} simulator, media folder {}",
        APP_NAME,
        APP_VERSION,
        args.music.display()
    );

    let mailboxes: Box<Mailboxes<NoopRawMutex, std::fs::File>> = Box::new(Mailboxes::new());
    let decode_relay = Relay::new();
    let audio_relay = Relay::new();
    let converter = RateConverter::new(&decode_relay, &audio_relay, &mailboxes.slots);
    let dac = WavDac::create(&args.wav, &mailboxes.slots, &audio_relay)
        .with_context(|| format!("creating {}", args.wav.display()))?;
    let mut buffers = playback::decode::boxed_buffers().context("allocating decode buffers")?;
    let mut catalog = Box::new(Catalog::new());

    let mut console = SimConsole::new();
    if let Some(script) = &args.script {
        let commands = script.split(';').filter(|c| !c.trim().is_empty());
        console = console.with_script(commands, args.script_gap);
    }
    if !args.no_stdin {
        console = console.with_stdin();
    }

    let config = PlayerConfig::default().with_repeat(!args.no_repeat);
    let pace = (!args.fast).then(|| Duration::from_millis(u64::from(SLOT_DURATION_MS)));

    let player = run_player(
        &*mailboxes,
        LocalVolume::new(args.music.clone()),
        &mut *catalog,
        AudioDrivers {
            codec: FlacCodec::new(),
            converter_in: converter.input(),
            converter_out: converter.output(),
            dac: dac.clone(),
        },
        InputSources {
            switch: NoSwitch,
            touch: NoTouch,
            console,
        },
        &mut *buffers,
        StdoutTerminal,
        &config,
    );
    let drivers = join3(
        decode_relay.forward(&mailboxes.decode),
        audio_relay.forward(&mailboxes.audio_out),
        dac.run(pace),
    );
    let deadline = async {
        match args.seconds {
            Some(secs) => Timer::after(Duration::from_secs(secs)).await,
            None => core::future::pending::<()>().await,
        }
    };

    match select3(player, drivers, deadline).await {
        Either3::First(Ok(never)) => match never {},
        Either3::First(Err(err)) => bail!("wiring the player failed: {err}"),
        Either3::Second((never, _, _)) => never,
        Either3::Third(()) => {}
    }

    dac.finish()
        .with_context(|| format!("finalizing {}", args.wav.display()))?;
    tracing::info!(
        "recorded {} slots to {}",
        dac.slots_played(),
        args.wav.display()
    );
    Ok(())
}
