//! typeworm - keystroke macro recorder and player
//!
//! Records presses from a Linux keyboard into `.tw` timeline files and
//! plays them back through uinput.

use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use typeworm::prelude::*;
use typeworm::recorder::platform::current::{DEFAULT_KEYBOARD_NAME, DEFAULT_KEYBOARD_PHYS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    #[value(alias = "rec", alias = "r")]
    Record,
    #[value(alias = "play", alias = "p")]
    Playback,
}

#[derive(Parser)]
#[command(name = "typeworm")]
#[command(about = "Record keystrokes and play them back with their original timing")]
#[command(version)]
struct Cli {
    /// Start in record/rec/r or playback/play/p mode
    #[arg(long, value_enum)]
    mode: Mode,

    /// Timeline file. In session mode: a template with one %d when
    /// recording, a directory or a starting file when playing back
    #[arg(long)]
    path: PathBuf,

    /// Milliseconds between inputs on playback (0 keeps the recorded timings)
    #[arg(long, default_value_t = 0)]
    wait: u64,

    /// Skip the deadtime before the first input on playback
    #[arg(long, default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    trim: bool,

    /// Record over an existing file
    #[arg(long)]
    overwrite: bool,

    /// Record or play back several files, steered by the stop/next/redo keys
    #[arg(long)]
    session: bool,

    /// First number substituted into the record session template
    #[arg(long, default_value_t = 0)]
    offset: usize,

    /// Start over from the first file after the last one in a playback session
    #[arg(long = "loop", default_value_t = true, action = ArgAction::Set, num_args = 0..=1, default_missing_value = "true")]
    looping: bool,

    /// Key that ends a recording or a session; never recorded
    #[arg(long, default_value = ControlKeys::DEFAULT_STOP)]
    stop_key: String,

    /// Session key that moves on to the next file
    #[arg(long, default_value = ControlKeys::DEFAULT_NEXT)]
    next_key: String,

    /// Session key that repeats the last file
    #[arg(long, default_value = ControlKeys::DEFAULT_REDO)]
    redo_key: String,

    /// Substring of the physical keyboard's name
    #[arg(long, default_value = DEFAULT_KEYBOARD_NAME)]
    keyboard_name: String,

    /// Substring of the physical keyboard's physical path
    #[arg(long, default_value = DEFAULT_KEYBOARD_PHYS)]
    keyboard_phys: String,

    /// Read from this /dev/input/event* node instead of searching
    #[arg(long)]
    device: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Output<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Error>,
}

impl<T: Serialize> Output<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(e: Error) -> Output<()> {
        Output {
            success: false,
            data: None,
            error: Some(e),
        }
    }
}

fn print_json<T: Serialize>(output: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(output)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let json = cli.json;
    let result = match (cli.mode, cli.session) {
        (Mode::Record, false) => record(&cli).and_then(|r| report(json, r)),
        (Mode::Playback, false) => playback(&cli).and_then(|r| report(json, r)),
        (Mode::Record, true) => record_session(&cli).and_then(|r| report(json, r)),
        (Mode::Playback, true) => playback_session(&cli).and_then(|r| report(json, r)),
    };

    if let Err(e) = result {
        if json {
            if let Some(err) = e.downcast_ref::<Error>() {
                let _ = print_json(&Output::<()>::err(err.clone()));
            }
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn report<T: Serialize>(json: bool, data: T) -> Result<()> {
    if json {
        print_json(&Output::ok(data))?;
    }
    Ok(())
}

fn open_keyboard(cli: &Cli) -> Result<EvdevKeyboard> {
    let keyboard = match &cli.device {
        Some(path) => EvdevKeyboard::open(path)?,
        None => EvdevKeyboard::find(&cli.keyboard_name, &cli.keyboard_phys)?,
    };
    Ok(keyboard)
}

fn controls(cli: &Cli, registry: &KeyRegistry) -> Result<ControlKeys> {
    Ok(ControlKeys::new(registry, &cli.stop_key, &cli.next_key, &cli.redo_key)?)
}

fn record(cli: &Cli) -> Result<CaptureReport> {
    let registry = KeyRegistry::standard();
    let config = CaptureConfig::new(&cli.path, cli.stop_key.as_str()).overwrite(cli.overwrite);
    if !registry.contains(&config.stop) {
        return Err(Error::unknown_label("stop", &config.stop).into());
    }
    config.policy.check_record(&config.path, config.overwrite)?;

    let mut keyboard = open_keyboard(cli)?;
    Ok(Recorder::new(&registry, config).capture(&mut keyboard)?)
}

fn playback(cli: &Cli) -> Result<PlaybackReport> {
    let registry = KeyRegistry::standard();
    let config = PlaybackConfig::new(&cli.path)
        .wait(Duration::from_millis(cli.wait))
        .trim(cli.trim);
    Ok(Replayer::new(&registry, config).play(|| UinputKeyboard::create(&registry))?)
}

fn record_session(cli: &Cli) -> Result<SessionReport> {
    let registry = KeyRegistry::standard();
    let config = RecordSessionConfig::new(&cli.path, controls(cli, &registry)?)
        .offset(cli.offset)
        .overwrite(cli.overwrite);
    let session = RecordSession::new(&registry, config)?;

    let mut keyboard = open_keyboard(cli)?;
    Ok(session.run(&mut keyboard)?)
}

fn playback_session(cli: &Cli) -> Result<SessionReport> {
    let registry = KeyRegistry::standard();
    let config = PlaybackSessionConfig::discover(&cli.path, controls(cli, &registry)?, PathPolicy::default())?
        .wait(Duration::from_millis(cli.wait))
        .trim(cli.trim)
        .looping(cli.looping);
    let mut session = PlaybackSession::new(&registry, config, || UinputKeyboard::create(&registry))?;

    let mut keyboard = open_keyboard(cli)?;
    Ok(session.run(&mut keyboard)?)
}
