//! EVT 3.0 decoder CLI application.
//!
//! Decodes Prophesee EVT 3.0 raw files to CSV or binary output.

use anyhow::{Context, Result};
use clap::Parser;
use evt3_core::{output, DecoderConfig, Evt3Decoder, FieldOrder, SensorMetadata};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

/// EVT 3.0 raw file decoder for Prophesee event cameras.
///
/// Decodes .raw files in EVT 3.0 format to human-readable CSV or efficient binary formats.
#[derive(Parser, Debug)]
#[command(name = "evt3-decode")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input EVT3 .raw file path
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output file path (.csv, .bin)
    ///
    /// The output format is determined by the file extension:
    /// - .csv: Comma-separated values (human-readable)
    /// - .bin: Binary format (efficient, for programmatic access)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    /// Field order for CSV output.
    ///
    /// Format: comma-separated field names (x, y, p, t)
    ///
    /// Examples:
    /// - "x,y,p,t" (default)
    /// - "t,x,y,p" (timestamp first)
    /// - "x,y,t,p"
    #[arg(short, long, default_value = "x,y,p,t")]
    format: String,

    /// Output file for trigger events (optional)
    #[arg(short, long, value_name = "PATH")]
    triggers: Option<PathBuf>,

    /// Sensor width, overriding the file header
    #[arg(long, requires = "height")]
    width: Option<u32>,

    /// Sensor height, overriding the file header
    #[arg(long, requires = "width")]
    height: Option<u32>,

    /// Skip words with reserved type nibbles instead of failing
    #[arg(long)]
    lenient: bool,

    /// Discard words until the first TIME_HIGH, even without a file header
    #[arg(long, conflicts_with = "no_sync")]
    sync: bool,

    /// Decode every word, even in recordings with a file header
    #[arg(long)]
    no_sync: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn decoder_config(&self) -> DecoderConfig {
        let mut config =
            DecoderConfig::default().with_sensor(self.sensor_override().unwrap_or_default());
        if self.sync || self.no_sync {
            config = config.sync_on_time_high(self.sync);
        }
        if self.lenient {
            config = config.lenient();
        }
        config
    }

    fn sensor_override(&self) -> Option<SensorMetadata> {
        Some(SensorMetadata::new(self.width?, self.height?))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    debug!("{:?}", args);

    let field_order = FieldOrder::from_str(&args.format)
        .context("Invalid field format. Use comma-separated: x,y,p,t")?;

    let progress = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .context("Invalid progress template")?,
        );
        pb
    };

    let start_time = Instant::now();

    progress.set_message(format!(
        "Decoding {:?}...",
        args.input.file_name().unwrap_or_default()
    ));

    let mut decoder = Evt3Decoder::with_config(args.decoder_config());
    let (events, triggers) = if args.sensor_override().is_some() {
        decoder.decode_file_as_configured(&args.input)
    } else {
        decoder.decode_file(&args.input)
    }
    .with_context(|| format!("Failed to decode EVT3 file {:?}", args.input))?;

    let decode_duration = start_time.elapsed();
    info!(
        "decoded {} CD events, {} triggers in {:.2}s",
        events.len(),
        triggers.len(),
        decode_duration.as_secs_f64()
    );

    progress.set_message(format!(
        "Writing to {:?}...",
        args.output.file_name().unwrap_or_default()
    ));

    let output_ext = args
        .output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("csv");

    match output_ext.to_lowercase().as_str() {
        "csv" => {
            output::write_csv(&args.output, &events, field_order)
                .context("Failed to write CSV output")?;
        }
        "bin" => {
            output::write_binary(&args.output, &events).context("Failed to write binary output")?;
        }
        _ => {
            anyhow::bail!(
                "Unsupported output format: .{}. Use .csv or .bin",
                output_ext
            );
        }
    }

    if let Some(trigger_path) = &args.triggers {
        if !triggers.is_empty() {
            output::write_trigger_csv(trigger_path, &triggers)
                .context("Failed to write trigger CSV")?;
            info!("wrote {} triggers to {:?}", triggers.len(), trigger_path);
        }
    }

    let total_duration = start_time.elapsed();

    progress.finish_with_message(format!(
        "Done! Decoded {} events in {:.2}s (sensor: {}x{})",
        events.len(),
        total_duration.as_secs_f64(),
        events.sensor_width(),
        events.sensor_height()
    ));

    if !args.quiet {
        let stats = decoder.stats();
        let events_per_sec = events.len() as f64 / total_duration.as_secs_f64();
        eprintln!();
        eprintln!("Summary:");
        eprintln!("  Input:        {:?}", args.input);
        eprintln!("  Output:       {:?}", args.output);
        if output_ext.eq_ignore_ascii_case("csv") {
            eprintln!("  Columns:      {}", field_order.header());
        }
        eprintln!("  CD Events:    {}", events.len());
        eprintln!("  Triggers:     {}", triggers.len());
        eprintln!(
            "  Sensor:       {}x{}",
            events.sensor_width(),
            events.sensor_height()
        );
        if stats.words > 0 {
            eprintln!("  Words:        {}", stats.words);
            eprintln!("  Skipped:      {}", stats.skipped_words + stats.unsynced_words);
        }
        eprintln!("  Duration:     {:.3}s", total_duration.as_secs_f64());
        eprintln!("  Throughput:   {:.0} events/s", events_per_sec);
    }

    Ok(())
}
