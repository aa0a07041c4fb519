/// BAM-backed alignment source and pruned-output sink.
///
/// The aggregation core only sees `AlignmentRecord`s; this module renders
/// BAM records into that shape with SAM text semantics for the mate
/// contig ("=" when it equals the query contig, "*" when unmapped), so
/// BAM and text inputs feed the pipeline identically.
use anyhow::{bail, Context, Result};
use log::info;
use rust_htslib::bam::{self, Read as BamRead};
use std::io::{BufRead, Write};
use std::path::Path;

use crate::alignment::AlignmentRecord;
use crate::pair_index::PairSupportIndex;
use crate::removal::RemovalSet;

fn contig_name(header: &bam::HeaderView, tid: i32) -> String {
    if tid < 0 {
        "*".to_string()
    } else {
        String::from_utf8_lossy(header.tid2name(tid as u32)).into_owned()
    }
}

fn mate_name(header: &bam::HeaderView, tid: i32, mtid: i32) -> String {
    if mtid < 0 {
        "*".to_string()
    } else if mtid == tid {
        "=".to_string()
    } else {
        String::from_utf8_lossy(header.tid2name(mtid as u32)).into_owned()
    }
}

/// Stream a BAM file into the pair-support index. Returns the number of
/// records seen.
pub fn aggregate_bam<P: AsRef<Path>>(path: P, index: &mut PairSupportIndex) -> Result<u64> {
    let path = path.as_ref();
    let mut reader = bam::Reader::from_path(path)
        .with_context(|| format!("cannot open BAM {}", path.display()))?;
    let header = reader.header().clone();

    let mut seen = 0u64;
    for result in reader.records() {
        let rec = result?;
        index.observe(&AlignmentRecord {
            read_id: String::from_utf8_lossy(rec.qname()).into_owned(),
            query_contig: contig_name(&header, rec.tid()),
            mate_contig: mate_name(&header, rec.tid(), rec.mtid()),
        });
        seen += 1;
    }
    Ok(seen)
}

/// Second pass over the BAM: drop unmapped-mate records and every record
/// whose read id was flagged, re-emit the rest under the input's header.
/// Returns the number of records written.
pub fn write_pruned_bam<P: AsRef<Path>>(
    input: P,
    output: P,
    removal: &RemovalSet,
) -> Result<u64> {
    let input = input.as_ref();
    let output = output.as_ref();
    let mut reader = bam::Reader::from_path(input)
        .with_context(|| format!("cannot open BAM {}", input.display()))?;
    let header = bam::Header::from_template(reader.header());
    let mut writer = bam::Writer::from_path(output, &header, bam::Format::Bam)
        .with_context(|| format!("cannot create BAM {}", output.display()))?;

    let mut kept = 0u64;
    for result in reader.records() {
        let rec = result?;
        if rec.mtid() < 0 {
            continue;
        }
        if removal.contains(&String::from_utf8_lossy(rec.qname())) {
            continue;
        }
        writer.write(&rec)?;
        kept += 1;
    }
    info!("Wrote {} records to {}", kept, output.display());
    Ok(kept)
}

/// Text-mode sink with the same drop rules as `write_pruned_bam`,
/// operating on SAM-style lines. Returns (kept, dropped).
pub fn write_pruned_text<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    removal: &RemovalSet,
) -> Result<(u64, u64)> {
    let mut kept = 0u64;
    let mut dropped = 0u64;

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 7 {
            bail!(
                "alignment line {} has {} tab-separated fields, need at least 7",
                idx + 1,
                fields.len()
            );
        }
        if fields[6] == "*" || removal.contains(fields[0]) {
            dropped += 1;
            continue;
        }
        writeln!(writer, "{}", line)?;
        kept += 1;
    }

    Ok((kept, dropped))
}
