mod alignment;
mod alleles;
mod bam_io;
mod pair_index;
mod prune;
mod removal;

use anyhow::Result;
use clap::Parser;
use log::info;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use crate::alignment::open_text_input;
use crate::prune::{check_config, PruneConfig, Pruner};

/// hicprune - Allelic contig pruning for Hi-C scaffolding
///
/// Removes redundant read support between contigs declared allelic and
/// keeps, per partner contig, only the best-supported link into each
/// allele group. Writes the removal reports and a pruned alignment file.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Allele contig table (tab-separated; two metadata fields, then
    /// member contigs per line)
    #[clap(short = 'i', long = "table")]
    table: PathBuf,

    /// Input alignments: BAM, or SAM-style text with --sam-text
    #[clap(short = 'b', long = "bam")]
    bam: PathBuf,

    /// Output directory for reports and the pruned alignment file
    #[clap(short = 'o', long = "out-dir", default_value = ".")]
    out_dir: PathBuf,

    /// Treat the alignment input as tab-separated text lines (optionally
    /// bgzip-compressed) instead of BAM
    #[clap(long = "sam-text")]
    sam_text: bool,

    /// Verbosity (-v for debug)
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode (errors only)
    #[clap(long = "quiet", conflicts_with = "verbose")]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::new()
        .filter_level(if args.quiet {
            log::LevelFilter::Error
        } else {
            match args.verbose {
                0 => log::LevelFilter::Info,
                _ => log::LevelFilter::Debug,
            }
        })
        .init();

    let config = PruneConfig {
        table: args.table,
        alignments: args.bam,
        out_dir: args.out_dir,
        sam_text: args.sam_text,
    };
    check_config(&config)?;
    std::fs::create_dir_all(&config.out_dir)?;

    let pruner = Pruner::new(config.clone());
    let removal = pruner.run()?;
    info!("Removing {} reads", removal.len());

    if config.sam_text {
        let out_path = config.out_dir.join("prunning.sam");
        let input = open_text_input(&config.alignments)?;
        let mut output = BufWriter::new(File::create(&out_path)?);
        let (kept, dropped) = bam_io::write_pruned_text(input, &mut output, &removal)?;
        info!(
            "Wrote {} records to {} ({} dropped)",
            kept,
            out_path.display(),
            dropped
        );
    } else {
        let out_path = config.out_dir.join("prunning.bam");
        bam_io::write_pruned_bam(&config.alignments, &out_path, &removal)?;
    }

    Ok(())
}
