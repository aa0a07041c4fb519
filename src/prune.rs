use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use log::info;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::alignment::open_text_input;
use crate::alleles::{read_allele_table, AlleleGroup};
use crate::bam_io;
use crate::pair_index::{join_reads, ContigPairKey, PairSupportIndex};
use crate::removal::RemovalSet;

/// One candidate edge considered during best-edge selection: `candidate`
/// is the allele-group member, `source` is the genome-wide partner contig
/// it links to. Built per group, consumed immediately.
#[derive(Debug, Clone)]
struct Decision {
    source: String,
    candidate: String,
    support: usize,
    reads: Vec<String>,
}

/// Pruning configuration
#[derive(Debug, Clone)]
pub struct PruneConfig {
    /// Allele-group table path
    pub table: PathBuf,
    /// Alignment input: BAM, or SAM-style text when `sam_text` is set
    pub alignments: PathBuf,
    /// Directory receiving the report files
    pub out_dir: PathBuf,
    /// Treat the alignment input as tab-separated text lines
    pub sam_text: bool,
}

/// Drives the three pruning stages in order: aggregate pair support,
/// eliminate intra-group links, select best cross-group edges. Owns the
/// report files; returns the accumulated removal set for the sink.
pub struct Pruner {
    config: PruneConfig,
}

impl Pruner {
    pub fn new(config: PruneConfig) -> Self {
        Pruner { config }
    }

    pub fn run(&self) -> Result<RemovalSet> {
        let index = self.aggregate()?;
        info!(
            "Indexed {} contig pairs across {} contigs",
            index.pair_count(),
            index.contig_count()
        );

        let table_input = open_text_input(&self.config.table)
            .with_context(|| format!("cannot open allele table {}", self.config.table.display()))?;
        let groups = read_allele_table(table_input)?;
        info!("Read {} allele groups", groups.len());

        let mut allele_out = self.report_writer("removedb_Allele.txt")?;
        let mut log_out = self.report_writer("log.txt")?;
        let mut nonbest_out = self.report_writer("removedb_nonBest.txt")?;

        let mut removal = RemovalSet::new();
        for group in &groups {
            let resolved =
                eliminate_within_group(&index, group, &mut removal, &mut allele_out)?;
            writeln!(log_out, ">{}", group.line)?;
            select_best_edges(
                &index,
                group,
                &resolved,
                &mut removal,
                &mut log_out,
                &mut nonbest_out,
            )?;
        }

        allele_out.flush()?;
        log_out.flush()?;
        nonbest_out.flush()?;

        Ok(removal)
    }

    fn aggregate(&self) -> Result<PairSupportIndex> {
        let mut index = PairSupportIndex::new();
        let n = if self.config.sam_text {
            let input = open_text_input(&self.config.alignments).with_context(|| {
                format!(
                    "cannot open alignment stream {}",
                    self.config.alignments.display()
                )
            })?;
            index.aggregate_lines(input)?
        } else {
            bam_io::aggregate_bam(&self.config.alignments, &mut index)?
        };
        info!("Aggregated {} alignment records", n);
        Ok(index)
    }

    fn report_writer(&self, name: &str) -> Result<BufWriter<File>> {
        let path = self.config.out_dir.join(name);
        let file =
            File::create(&path).with_context(|| format!("cannot create {}", path.display()))?;
        Ok(BufWriter::new(file))
    }
}

/// Stage two: resolve every link between declared alleles.
///
/// Any read pairing two members of the same group is assumed to be
/// spurious cross-mapping, so all of its support is flagged. Returns the
/// canonical keys of every intra-group pair (with or without evidence);
/// the best-edge stage must not reconsider them.
pub fn eliminate_within_group<W: Write>(
    index: &PairSupportIndex,
    group: &AlleleGroup,
    removal: &mut RemovalSet,
    allele_out: &mut W,
) -> Result<HashSet<ContigPairKey>> {
    let members = &group.members;
    let mut resolved = HashSet::new();

    for i in 0..members.len() {
        for j in (i + 1)..members.len() {
            let key = ContigPairKey::new(&members[i], &members[j]);
            if let Some(reads) = index.support(&key) {
                writeln!(
                    allele_out,
                    "{}\t{}\t{}",
                    key.first,
                    key.second,
                    join_reads(reads)
                )?;
                removal.flag_all(reads);
            }
            resolved.insert(key);
        }
    }

    Ok(resolved)
}

/// Stage three: keep each partner contig's single best-supported link
/// into the group, flag everything else.
///
/// Every group member competes against the full contig universe. The
/// decisions are grouped by partner (`source`); within a source the first
/// candidate to reach the maximum support count is retained, later ties
/// do not displace it.
pub fn select_best_edges<W1: Write, W2: Write>(
    index: &PairSupportIndex,
    group: &AlleleGroup,
    resolved: &HashSet<ContigPairKey>,
    removal: &mut RemovalSet,
    log_out: &mut W1,
    nonbest_out: &mut W2,
) -> Result<()> {
    let mut decisions: Vec<Decision> = Vec::new();

    for candidate in &group.members {
        for source in index.contigs() {
            let key = ContigPairKey::new(candidate, source);
            if resolved.contains(&key) {
                continue;
            }
            let Some(reads) = index.support(&key) else {
                continue;
            };

            let decision = Decision {
                source: source.to_string(),
                candidate: candidate.clone(),
                support: reads.len(),
                reads: reads.to_vec(),
            };
            writeln!(
                log_out,
                "{}\t{}\t{}\t{}",
                decision.source,
                decision.candidate,
                decision.support,
                join_reads(&decision.reads)
            )?;
            decisions.push(decision);
        }
    }

    prune_non_best(&decisions, removal, nonbest_out)
}

/// Apply the best-edge rule to one group's batch of decisions: per
/// source, retain the first candidate reaching the maximum support and
/// flag the rest.
fn prune_non_best<W: Write>(
    decisions: &[Decision],
    removal: &mut RemovalSet,
    nonbest_out: &mut W,
) -> Result<()> {
    // source -> (retained candidate, its support); strict > only, so the
    // first candidate at the maximum wins
    let mut best: IndexMap<&str, (&str, usize)> = IndexMap::new();
    for d in decisions {
        match best.get_mut(d.source.as_str()) {
            None => {
                best.insert(&d.source, (&d.candidate, d.support));
            }
            Some(entry) if d.support > entry.1 => {
                *entry = (&d.candidate, d.support);
            }
            Some(_) => {}
        }
    }

    for d in decisions {
        let (retained, _) = best[d.source.as_str()];
        if retained == d.candidate {
            continue;
        }
        writeln!(
            nonbest_out,
            "{}\t{}\t{}\tremove\t{}",
            d.source,
            d.candidate,
            d.support,
            join_reads(&d.reads)
        )?;
        removal.flag_all(&d.reads);
    }

    Ok(())
}

/// Validate that every configured input path is non-empty before any
/// stage runs.
pub fn check_config(config: &PruneConfig) -> Result<()> {
    if config.table.as_os_str().is_empty() {
        bail!("allele table path is empty");
    }
    if config.alignments.as_os_str().is_empty() {
        bail!("alignment input path is empty");
    }
    if config.out_dir.as_os_str().is_empty() {
        bail!("output directory path is empty");
    }
    Ok(())
}
