/// Contig-pair support index built from the alignment stream.
///
/// This is the aggregation stage of the pruning pipeline: it only
/// accumulates evidence, all decisions happen later against the finished
/// index.
use anyhow::Result;
use indexmap::IndexMap;
use std::io::BufRead;

use crate::alignment::{parse_alignment_line, AlignmentRecord};

/// Unordered contig pair in canonical (lexicographically sorted) form so
/// that (A,B) and (B,A) look up the same entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContigPairKey {
    pub first: String,
    pub second: String,
}

impl ContigPairKey {
    pub fn new(ctg1: &str, ctg2: &str) -> Self {
        if ctg1 <= ctg2 {
            ContigPairKey {
                first: ctg1.to_string(),
                second: ctg2.to_string(),
            }
        } else {
            ContigPairKey {
                first: ctg2.to_string(),
                second: ctg1.to_string(),
            }
        }
    }
}

/// Aggregated pair-support and contig-occurrence indexes.
///
/// Both maps keep insertion order: pair support lists reads in stream
/// order, and the contig index enumerates contigs in first-seen order,
/// which fixes the candidate order (and therefore tie-breaking) in the
/// best-edge stage.
#[derive(Debug, Default)]
pub struct PairSupportIndex {
    /// Canonical pair -> supporting read ids, stream order, duplicates kept
    pairs: IndexMap<ContigPairKey, Vec<String>>,

    /// Contig name -> alignment occurrence count; the key set is the
    /// candidate universe for best-edge selection
    contigs: IndexMap<String, u64>,
}

impl PairSupportIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one alignment record into the index.
    ///
    /// Records whose mate is "=" (same contig) carry no inter-contig
    /// linkage and are skipped entirely. "*" mates are not special-cased
    /// here; they are dropped later by the output sink.
    pub fn observe(&mut self, rec: &AlignmentRecord) {
        if rec.mate_is_self() {
            return;
        }

        let key = ContigPairKey::new(&rec.query_contig, &rec.mate_contig);
        self.pairs
            .entry(key)
            .or_default()
            .push(rec.read_id.clone());
        *self.contigs.entry(rec.query_contig.clone()).or_insert(0) += 1;
        *self.contigs.entry(rec.mate_contig.clone()).or_insert(0) += 1;
    }

    /// Consume a stream of SAM-style text lines, one record per line.
    /// A line with fewer than 7 fields aborts the whole aggregation.
    pub fn aggregate_lines<R: BufRead>(&mut self, reader: R) -> Result<u64> {
        let mut seen = 0u64;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let rec = parse_alignment_line(&line, idx + 1)?;
            self.observe(&rec);
            seen += 1;
        }
        Ok(seen)
    }

    pub fn support(&self, key: &ContigPairKey) -> Option<&[String]> {
        self.pairs.get(key).map(|v| v.as_slice())
    }

    /// All known contigs in first-seen order
    pub fn contigs(&self) -> impl Iterator<Item = &str> {
        self.contigs.keys().map(|s| s.as_str())
    }

    pub fn contig_count(&self) -> usize {
        self.contigs.len()
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}

/// Join read ids the way the report files expect: every id followed by a
/// comma, including the last one.
pub fn join_reads(reads: &[String]) -> String {
    let mut out = String::with_capacity(reads.iter().map(|r| r.len() + 1).sum());
    for r in reads {
        out.push_str(r);
        out.push(',');
    }
    out
}
