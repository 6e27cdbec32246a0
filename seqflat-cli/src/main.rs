//! seqflat CLI Tool
//!
//! Command-line interface for inspecting multi-track timeline documents and
//! flattening them into a single visible track.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use seqflat_core::document::{read_timeline, write_timeline};
use seqflat_core::{
    CancelFlag, ClipView, Outcome, ProgressHost, Timeline, TimelineQuery, TrackerHost,
};
use seqflat_flatten::{
    ActionOutcome, FlattenAction, FlattenConfig, ANALYSIS_TITLE, DEFAULT_TRACK_NAME,
};
use seqflat_resolver::{resolve_visibility, OccurrenceMap};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "seqflat")]
#[command(about = "seqflat - flatten stacked timeline tracks into the single track you actually see")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "debug" or "seqflat_resolver=debug" (defaults to RUST_LOG, then info)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show timeline information
    Info {
        /// Input timeline document
        input: PathBuf,
    },

    /// Print which clip is visible over time
    Resolve {
        /// Input timeline document
        input: PathBuf,
    },

    /// Add a flattened track to a timeline document
    Flatten {
        /// Input timeline document
        input: PathBuf,

        /// Output timeline document
        #[arg(short, long)]
        output: PathBuf,

        /// Name of the flattened track
        #[arg(long, default_value = DEFAULT_TRACK_NAME)]
        track_name: String,

        /// Leave the original tracks enabled
        #[arg(long)]
        keep_source_tracks: bool,

        /// Log progress every N percent
        #[arg(long, default_value = "10")]
        report_step: u8,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Info { input } => info_timeline(&input)?,

        Commands::Resolve { input } => resolve_timeline(&input)?,

        Commands::Flatten {
            input,
            output,
            track_name,
            keep_source_tracks,
            report_step,
        } => {
            let config = FlattenConfig {
                track_name,
                hide_source_tracks: !keep_source_tracks,
            };
            flatten_timeline(&input, &output, config, report_step)?
        }
    }

    Ok(())
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_timeline(input: &Path) -> Result<Timeline> {
    debug!(path = %input.display(), "Loading timeline");
    let file = File::open(input)
        .with_context(|| format!("Failed to open timeline {}", input.display()))?;
    read_timeline(BufReader::new(file)).context("Failed to read timeline document")
}

fn info_timeline(input: &Path) -> Result<()> {
    let timeline = load_timeline(input)?;
    print_info(&timeline);
    Ok(())
}

fn resolve_timeline(input: &Path) -> Result<()> {
    let timeline = load_timeline(input)?;

    let host = TrackerHost::new(CancelFlag::new());
    let mut analysis = host.begin(ANALYSIS_TITLE);
    let occurrences = match resolve_visibility(&timeline, &mut analysis)
        .context("Failed to resolve visibility")?
    {
        Outcome::Done(occurrences) => occurrences,
        Outcome::Cancelled => bail!("Visibility scan was cancelled"),
    };

    print_occurrences(&timeline, &occurrences);
    Ok(())
}

fn flatten_timeline(
    input: &Path,
    output: &Path,
    config: FlattenConfig,
    report_step: u8,
) -> Result<()> {
    println!("Flattening timeline: {}", input.display());
    println!("Output: {}", output.display());

    let mut timeline = load_timeline(input)?;
    let host = TrackerHost::new(CancelFlag::new()).with_report_step(report_step);
    let action = FlattenAction::new(config);

    match action
        .trigger(Some(&mut timeline), &host)
        .context("Failed to flatten timeline")?
    {
        ActionOutcome::Flattened {
            track_index,
            clip_count,
            hidden_tracks,
        } => {
            println!(
                "Added track '{}' at index {} with {} clips",
                action.config().track_name,
                track_index,
                clip_count
            );
            if !hidden_tracks.is_empty() {
                println!("Disabled {} source tracks", hidden_tracks.len());
            }
        }
        ActionOutcome::Cancelled | ActionOutcome::NoActiveTimeline => {
            println!("Nothing flattened, {} left unchanged", input.display());
            return Ok(());
        }
    }

    let file = File::create(output).context("Failed to create output file")?;
    write_timeline(BufWriter::new(file), &timeline)
        .context("Failed to write timeline document")?;

    println!("Successfully wrote {}", output.display());
    Ok(())
}

fn print_info(timeline: &Timeline) {
    println!("\n=== Timeline Information ===");
    println!("Name: {}", timeline.name);
    println!("Duration: {} frames", timeline.duration);
    println!("Tracks: {}", timeline.tracks().len());
    println!("Clips: {}", timeline.clips().count());

    println!("\n=== Tracks (top first) ===");
    for (index, track) in timeline.tracks().iter().enumerate().rev() {
        println!(
            "  [{}] {}{}",
            index,
            track.name,
            if track.enabled { "" } else { " (disabled)" }
        );
        for clip in track.clips().iter().take(10) {
            println!(
                "      {} {} {} from {} src {:.2}..{:.2}{}{}",
                clip.id,
                clip.name,
                clip.range,
                clip.media,
                clip.source_in,
                clip.source_out(),
                if clip.speed != 1.0 {
                    format!(" x{}", clip.speed)
                } else {
                    String::new()
                },
                if clip.enabled { "" } else { " (disabled)" }
            );
        }
        if track.clips().len() > 10 {
            println!("      ... and {} more clips", track.clips().len() - 10);
        }
    }
}

fn print_occurrences(timeline: &Timeline, occurrences: &OccurrenceMap) {
    println!("\n=== Visible Clips ===");
    println!(
        "{} occurrences of {} clips covering {} of {} frames",
        occurrences.occurrence_count(),
        occurrences.len(),
        occurrences.visible_frames(),
        timeline.duration
    );

    for occurrence in occurrences.in_time_order() {
        match timeline.clip(occurrence.clip) {
            Some(clip) => println!(
                "  {} {} {} (track {}) src {:.2}..{:.2}",
                occurrence.range,
                clip.id,
                clip.name,
                clip.owning_track(),
                clip.map_timeline_to_source(occurrence.first()),
                clip.map_timeline_to_source(occurrence.last())
            ),
            None => println!("  {} {} (missing)", occurrence.range, occurrence.clip),
        }
    }
}
