//! # CLI Module
//!
//! Command-line interface for the photo classifier.
//!
//! ## Usage
//! ```bash
//! # Classify everything under ~/Incoming
//! photosort run ~/Incoming --photo-dest ~/Photos --image-dest ~/Images --video-dest ~/Videos
//!
//! # Load paths and tuning from a config file, override the workers
//! photosort run --config sort.json --workers 8
//!
//! # JSON output for scripting
//! photosort run ~/Incoming -c sort.json --output json
//!
//! # Inspect the dedup index
//! photosort stats --recent 20
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use indicatif::{ProgressBar, ProgressStyle};
use photosort::config::RunConfig;
use photosort::core::index::SqliteIndex;
use photosort::core::pipeline::{Pipeline, PipelineResult};
use photosort::error::Result;
use photosort::events::{ClassifyEvent, Event, EventChannel, PipelineEvent, ScanEvent};
use std::path::PathBuf;
use std::thread;

/// Photosort - Classify and dedup photo/video trees
#[derive(Parser, Debug)]
#[command(name = "photosort")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify an input tree into the destination roots
    Run {
        /// Root directory to classify
        input: Option<PathBuf>,

        /// Configuration file (JSON); flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Destination root for photos (images with capture metadata)
        #[arg(long)]
        photo_dest: Option<PathBuf>,

        /// Destination root for other images
        #[arg(long)]
        image_dest: Option<PathBuf>,

        /// Destination root for videos
        #[arg(long)]
        video_dest: Option<PathBuf>,

        /// Dedup index database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Worker thread count (0 = all cores)
        #[arg(short, long)]
        workers: Option<usize>,

        /// Placed files per index commit
        #[arg(long)]
        batch_size: Option<usize>,

        /// Skip files smaller than this many bytes
        #[arg(long)]
        min_size: Option<u64>,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show dedup index statistics
    Stats {
        /// Dedup index database path
        #[arg(long)]
        database: Option<PathBuf>,

        /// Show the N most recently indexed files
        #[arg(long, default_value = "10")]
        recent: usize,

        /// Delete every index record (files on disk are untouched)
        #[arg(long)]
        reset: bool,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

/// Run the CLI
pub fn run() -> Result<()> {
    photosort::init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            config,
            photo_dest,
            image_dest,
            video_dest,
            database,
            workers,
            batch_size,
            min_size,
            output,
            verbose,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::load(&path)?,
                None => RunConfig::default(),
            };
            if let Some(input) = input {
                run_config.input = input;
            }
            if let Some(dest) = photo_dest {
                run_config.photo_dest = dest;
            }
            if let Some(dest) = image_dest {
                run_config.image_dest = dest;
            }
            if let Some(dest) = video_dest {
                run_config.video_dest = dest;
            }
            if let Some(path) = database {
                run_config.database = path;
            }
            if let Some(workers) = workers {
                run_config.workers = workers;
            }
            if let Some(batch_size) = batch_size {
                run_config.batch_size = batch_size;
            }
            if let Some(min_size) = min_size {
                run_config.min_file_size = min_size;
            }
            run_classify(run_config, output, verbose)
        }
        Commands::Stats {
            database,
            recent,
            reset,
            output,
        } => run_stats(database, recent, reset, output),
    }
}

fn run_classify(config: RunConfig, output: OutputFormat, verbose: bool) -> Result<()> {
    let term = Term::stderr();

    if matches!(output, OutputFormat::Pretty) {
        term.write_line(&format!(
            "{} {}",
            style("Photosort").bold().cyan(),
            style(env!("CARGO_PKG_VERSION")).dim()
        ))
        .ok();
        term.write_line("").ok();
    }

    let pipeline = Pipeline::builder(config).build()?;

    let (sender, receiver) = EventChannel::new();

    // Progress bar for pretty output
    let progress = if matches!(output, OutputFormat::Pretty) {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("█▓░"),
        );
        Some(pb)
    } else {
        None
    };

    let progress_clone = progress.clone();
    let verbose_clone = verbose;

    // Handle events in a separate thread
    let event_thread = thread::spawn(move || {
        for event in receiver.iter() {
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_message(format!("{}", phase));
                    }
                }
                Event::Scan(ScanEvent::Completed { total_candidates }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_length(total_candidates as u64);
                    }
                }
                Event::Classify(ClassifyEvent::Progress(p)) => {
                    if let Some(ref pb) = progress_clone {
                        pb.set_position(p.completed as u64);
                        if verbose_clone {
                            pb.set_message(format!(
                                "{} (dups: {}, skips: {})",
                                p.current_path.file_name().unwrap_or_default().to_string_lossy(),
                                p.duplicates,
                                p.precheck_skips
                            ));
                        }
                    }
                }
                Event::Pipeline(PipelineEvent::Completed { .. }) => {
                    if let Some(ref pb) = progress_clone {
                        pb.finish_and_clear();
                    }
                }
                _ => {}
            }
        }
    });

    let result = pipeline.run_with_events(&sender);

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let result = result?;

    match output {
        OutputFormat::Pretty => print_pretty_results(&term, &result, verbose),
        OutputFormat::Json => print_json_results(&result),
    }

    Ok(())
}

fn print_pretty_results(term: &Term, result: &PipelineResult, verbose: bool) {
    let s = &result.summary;

    term.write_line("").ok();
    term.write_line(&format!("{} Run Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();

    term.write_line(&format!(
        "  {} files handled in {:.1}s ({:.0}/s)",
        style(s.total_seen()).cyan(),
        s.duration_ms as f64 / 1000.0,
        s.throughput()
    ))
    .ok();
    term.write_line(&format!("  {} placed", style(s.processed).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} exact duplicates removed",
        style(s.duplicates).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} skipped by the fast pre-check",
        style(s.precheck_skips).dim()
    ))
    .ok();
    term.write_line(&format!(
        "  {} filtered (wrong type or too small)",
        style(s.filtered).dim()
    ))
    .ok();
    if s.pruned_dirs > 0 {
        term.write_line(&format!(
            "  {} emptied directories removed",
            style(s.pruned_dirs).dim()
        ))
        .ok();
    }

    if s.errors > 0 {
        term.write_line("").ok();
        term.write_line(&format!(
            "  {} {} files had errors and were left in place",
            style("!").yellow().bold(),
            style(s.errors).yellow()
        ))
        .ok();
        if verbose {
            for error in &result.errors {
                term.write_line(&format!("    {}", style(error).dim())).ok();
            }
        } else {
            term.write_line(&format!(
                "    {}",
                style("(re-run with --verbose to list them)").dim()
            ))
            .ok();
        }
    }

    term.write_line("").ok();
}

fn print_json_results(result: &PipelineResult) {
    let s = &result.summary;
    let output = serde_json::json!({
        "processed": s.processed,
        "duplicates": s.duplicates,
        "precheck_skips": s.precheck_skips,
        "filtered": s.filtered,
        "errors": s.errors,
        "committed": s.committed,
        "pruned_dirs": s.pruned_dirs,
        "duration_ms": s.duration_ms,
        "error_messages": result.errors,
    });

    println!("{}", serde_json::to_string_pretty(&output).unwrap());
}

fn run_stats(
    database: Option<PathBuf>,
    recent: usize,
    reset: bool,
    output: OutputFormat,
) -> Result<()> {
    let db_path = database.unwrap_or_else(|| RunConfig::default().database);
    let index = SqliteIndex::open(&db_path)?;
    if reset {
        index.clear()?;
        Term::stderr()
            .write_line(&format!("{} index cleared", style("✓").green().bold()))
            .ok();
    }
    let stats = index.stats()?;
    let rows = index.recent(recent)?;

    match output {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "database": db_path,
                "total": stats.total,
                "photos": stats.photos,
                "images": stats.images,
                "videos": stats.videos,
                "recent": rows.iter().map(|r| {
                    serde_json::json!({
                        "fingerprint": r.fingerprint,
                        "size": r.size,
                        "category": r.category.as_str(),
                        "created_date": r.created_date,
                        "processed_at": r.processed_at,
                    })
                }).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output).unwrap());
        }
        OutputFormat::Pretty => {
            let term = Term::stdout();
            term.write_line(&format!(
                "{} {}",
                style("Index:").bold(),
                db_path.display()
            ))
            .ok();
            term.write_line("").ok();
            term.write_line(&format!("  {} files indexed", style(stats.total).cyan()))
                .ok();
            term.write_line(&format!("    {} photos", style(stats.photos).cyan()))
                .ok();
            term.write_line(&format!("    {} images", style(stats.images).cyan()))
                .ok();
            term.write_line(&format!("    {} videos", style(stats.videos).cyan()))
                .ok();

            if !rows.is_empty() {
                term.write_line("").ok();
                term.write_line(&format!("{}", style("Most recent:").bold())).ok();
                for row in &rows {
                    term.write_line(&format!(
                        "  {} {} {} ({} bytes)",
                        style(&row.created_date).dim(),
                        row.category.as_str(),
                        &row.fingerprint[..row.fingerprint.len().min(12)],
                        row.size
                    ))
                    .ok();
                }
            }
        }
    }

    Ok(())
}
