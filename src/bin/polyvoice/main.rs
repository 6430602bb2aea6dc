//! polyvoice - play the engine from the computer keyboard
//!
//! Run with: cargo run --release -- --timbre DX7_E_PIANO_1

mod app;
mod keyboard;
mod ui;

use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};

use polyvoice::{engine::WavResources, EngineConfig, PresetBank, SustainPolicy};

#[derive(Debug, Parser)]
#[command(version, about = "Polyphonic FM and sample synth in the terminal")]
struct Args {
    /// Preset bank JSON; the built-in bank is used when omitted
    #[arg(long)]
    bank: Option<PathBuf>,

    /// WAV file played by sample timbres
    #[arg(long)]
    sample: Option<PathBuf>,

    /// WAV impulse response for the reverb
    #[arg(long)]
    impulse: Option<PathBuf>,

    /// Timbre selected at startup
    #[arg(long, default_value = polyvoice::preset::DX7_E_PIANO_1)]
    timbre: String,

    #[arg(long, default_value_t = 256)]
    max_voices: usize,

    #[arg(long, value_enum, default_value_t = PolicyArg::ReleaseOnPedalUp)]
    sustain_policy: PolicyArg,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    ReleaseOnPedalUp,
    Latch,
}

impl From<PolicyArg> for SustainPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ReleaseOnPedalUp => SustainPolicy::ReleaseOnPedalUp,
            PolicyArg::Latch => SustainPolicy::Latch,
        }
    }
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();

    let bank = match &args.bank {
        Some(path) => PresetBank::from_path(path)
            .wrap_err_with(|| format!("failed to load preset bank {}", path.display()))?,
        None => PresetBank::builtin(),
    };
    if bank.resolve(&args.timbre).is_none() {
        return Err(eyre!("unknown timbre `{}`", args.timbre));
    }

    let config = EngineConfig {
        max_voices: args.max_voices,
        sustain_policy: args.sustain_policy.into(),
        ..EngineConfig::default()
    };

    app::Polyvoice::new(config, Arc::new(bank))
        .timbre(&args.timbre)
        .resources(WavResources::new(args.sample, args.impulse))
        .run()
}
