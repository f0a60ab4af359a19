//! Command-line driver for the TidalSim pipeline.
//!
//! Each subcommand wires a slice of `tidalsim_core`'s public API together
//! against files on disk: parse a trace, extract basic blocks, embed
//! intervals, snapshot an MTR, reconstruct and dump a cache image, or plan
//! and split a checkpoint run. This binary performs no clustering, ELF
//! scraping, or simulator invocation — it is scaffolding around the
//! library, not a new pipeline stage.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tidalsim_core::bb::extract;
use tidalsim_core::cache::mtr::mtr_ckpts_from_inst_points;
use tidalsim_core::cache::serialize;
use tidalsim_core::checkpoint::cmd::{checkpoint_dirs, inst_points_dump};
use tidalsim_core::checkpoint::split_loadarch;
use tidalsim_core::embed::embed;
use tidalsim_core::trace::TraceParser;
use tidalsim_core::{CacheParams, Mtr, TidalSimError};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "tidalsim",
    author,
    version,
    about = "SimPoint-style RISC-V trace analysis and cache-state reconstruction"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the basic-block map from a trace log and print its markers.
    ExtractBb {
        /// Path to the functional simulator's instruction log.
        log: PathBuf,
        /// The log interleaves commit lines with instruction lines.
        #[arg(long)]
        commit_log: bool,
        /// Print the marker list as JSON instead of plain text.
        #[arg(long)]
        json: bool,
    },
    /// Extract basic blocks, then embed the trace into interval vectors.
    Embed {
        /// Path to the functional simulator's instruction log.
        log: PathBuf,
        /// Number of instructions per interval.
        #[arg(long)]
        interval_length: usize,
        /// The log interleaves commit lines with instruction lines.
        #[arg(long)]
        commit_log: bool,
    },
    /// Build per-instruction-point MTR snapshots from a full commit log.
    MtrSnapshot {
        /// Path to the functional simulator's full commit log.
        log: PathBuf,
        /// Cache block size in bytes.
        #[arg(long)]
        block_size: u64,
        /// Comma-separated, strictly increasing instruction commit points.
        #[arg(long, value_delimiter = ',')]
        inst_points: Vec<u64>,
    },
    /// Reconstruct a cache image from a saved MTR snapshot and dump it.
    CacheImage {
        /// Path to a JSON file describing the `CacheParams`.
        #[arg(long)]
        params: PathBuf,
        /// Path to a saved `mtr.json` snapshot.
        #[arg(long)]
        mtr: PathBuf,
        /// Optional DRAM image to populate block data from.
        #[arg(long)]
        dram: Option<PathBuf>,
        /// Base address of the DRAM image.
        #[arg(long, default_value = "0x80000000")]
        dram_base: String,
        /// Directory to write the tag/data array dumps into.
        #[arg(long)]
        out_dir: PathBuf,
        /// Filename prefix for the dumped arrays.
        #[arg(long, default_value = "ckpt_")]
        prefix: String,
    },
    /// Print the command plan and expected line count for a checkpoint run.
    CheckpointPlan {
        /// Starting PC, as a hex address (e.g. `0x80000000`).
        #[arg(long)]
        start_pc: String,
        /// Comma-separated, strictly increasing instruction commit points.
        #[arg(long, value_delimiter = ',')]
        inst_points: Vec<u64>,
        /// Number of harts to dump register state for at each checkpoint.
        #[arg(long, default_value_t = 1)]
        n_harts: u32,
        /// Base directory checkpoint subdirectories are created under.
        #[arg(long)]
        base_dir: PathBuf,
    },
    /// Split an already-captured combined `loadarch` log per checkpoint.
    SplitLoadarch {
        /// The combined `loadarch` file produced by running a checkpoint plan.
        #[arg(long)]
        combined: PathBuf,
        /// Starting PC the checkpoint plan used, as a hex address.
        #[arg(long)]
        start_pc: String,
        /// Comma-separated, strictly increasing instruction commit points.
        #[arg(long, value_delimiter = ',')]
        inst_points: Vec<u64>,
        /// Number of harts the checkpoint plan dumped register state for.
        #[arg(long, default_value_t = 1)]
        n_harts: u32,
        /// Base directory checkpoint subdirectories live under.
        #[arg(long)]
        base_dir: PathBuf,
    },
}

fn parse_hex_addr(s: &str) -> Result<u64, TidalSimError> {
    let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    u64::from_str_radix(digits, 16).map_err(|_| TidalSimError::MalformedLog {
        line_no: 0,
        text: s.to_string(),
    })
}

fn read_lines(path: &PathBuf) -> Result<std::vec::IntoIter<String>, TidalSimError> {
    let content = fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect::<Vec<_>>().into_iter())
}

fn run() -> Result<(), TidalSimError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::ExtractBb { log, commit_log, json } => {
            let lines = read_lines(&log)?;
            let parser = TraceParser::new(lines, commit_log);
            let bb_map = extract(parser)?;
            if json {
                println!("{}", serde_json::to_string_pretty(bb_map.markers())?);
            } else {
                tracing::info!(basic_blocks = bb_map.len(), "extracted basic-block map");
                for (pc, id) in bb_map.markers() {
                    match id {
                        Some(id) => println!("{pc:#x}: bb{id}"),
                        None => println!("{pc:#x}: -"),
                    }
                }
            }
            Ok(())
        }
        Commands::Embed {
            log,
            interval_length,
            commit_log,
        } => {
            let lines: Vec<String> = read_lines(&log)?.collect();
            let bb_map = extract(TraceParser::new(lines.clone().into_iter(), commit_log))?;
            let parser = TraceParser::new(lines.into_iter(), commit_log);
            for interval in embed(parser, &bb_map, interval_length)? {
                let interval = interval?;
                println!(
                    "{}",
                    serde_json::json!({
                        "instret": interval.instret,
                        "inst_start": interval.inst_start,
                        "inst_count": interval.inst_count,
                        "embedding": interval.embedding,
                    })
                );
            }
            Ok(())
        }
        Commands::MtrSnapshot {
            log,
            block_size,
            inst_points,
        } => {
            let lines = read_lines(&log)?;
            let mut parser = TraceParser::new(lines, true);
            let snapshots = mtr_ckpts_from_inst_points(&mut parser, block_size, &inst_points)?;
            println!("{}", serde_json::to_string_pretty(&snapshots)?);
            Ok(())
        }
        Commands::CacheImage {
            params,
            mtr,
            dram,
            dram_base,
            out_dir,
            prefix,
        } => {
            let params: CacheParams = serde_json::from_str(&fs::read_to_string(params)?)?;
            let mtr: Mtr = serde_json::from_str(&fs::read_to_string(mtr)?)?;
            let dram_base = parse_hex_addr(&dram_base)?;

            let image = match dram {
                Some(path) => {
                    let mut file = fs::File::open(path)?;
                    mtr.as_cache(&params, Some(&mut file), dram_base)?
                }
                None => mtr.as_cache::<std::io::Cursor<Vec<u8>>>(&params, None, dram_base)?,
            };

            fs::create_dir_all(&out_dir)?;
            serialize::dump(&image, &out_dir, &prefix)?;
            tracing::info!(dir = %out_dir.display(), "wrote cache image dump");
            Ok(())
        }
        Commands::CheckpointPlan {
            start_pc,
            inst_points,
            n_harts,
            base_dir,
        } => {
            let start_pc = parse_hex_addr(&start_pc)?;
            let plan = inst_points_dump(start_pc, &inst_points, n_harts, &base_dir)?;
            for line in &plan.lines {
                println!("{line}");
            }
            tracing::info!(expected_lines = plan.expected_lines, "checkpoint plan generated");
            Ok(())
        }
        Commands::SplitLoadarch {
            combined,
            start_pc,
            inst_points,
            n_harts,
            base_dir,
        } => {
            let start_pc = parse_hex_addr(&start_pc)?;
            let plan = inst_points_dump(start_pc, &inst_points, n_harts, &base_dir)?;
            let dirs = checkpoint_dirs(&base_dir, start_pc, &inst_points);
            for dir in &dirs {
                fs::create_dir_all(dir)?;
            }
            let combined_log = fs::read_to_string(combined)?;
            split_loadarch(&combined_log, plan.expected_lines, &dirs)?;
            tracing::info!(checkpoints = dirs.len(), "split combined loadarch log");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "tidalsim failed");
            ExitCode::FAILURE
        }
    }
}
