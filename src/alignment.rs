use anyhow::{bail, Result};
use noodles::bgzf;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Mate contig marker meaning "same contig as the query" in SAM text
pub const MATE_SELF: &str = "=";
/// Mate contig marker meaning "mate unmapped" in SAM text
pub const MATE_UNMAPPED: &str = "*";

/// One paired alignment observation, reduced to the fields the pruning
/// pipeline needs. Produced one at a time by the text parser or the BAM
/// stream and consumed immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignmentRecord {
    pub read_id: String,
    pub query_contig: String,
    pub mate_contig: String,
}

impl AlignmentRecord {
    /// True when the mate maps to the same contig as the query (SAM "=")
    pub fn mate_is_self(&self) -> bool {
        self.mate_contig == MATE_SELF
    }

    /// True when the mate is unmapped (SAM "*")
    pub fn mate_is_unmapped(&self) -> bool {
        self.mate_contig == MATE_UNMAPPED
    }
}

/// Parse one SAM-style text line into an AlignmentRecord.
///
/// Field layout follows the SAM body convention: field 0 = read name,
/// field 2 = reference contig, field 6 = mate contig. Fields 1, 3, 4, 5
/// and anything past 6 are ignored. The line must not carry its
/// terminator (`BufRead::lines` form). `line_no` is 1-based and only
/// used for the error message.
pub fn parse_alignment_line(line: &str, line_no: usize) -> Result<AlignmentRecord> {
    let fields: Vec<&str> = line.split('\t').collect();

    if fields.len() < 7 {
        bail!(
            "alignment line {} has {} tab-separated fields, need at least 7",
            line_no,
            fields.len()
        );
    }

    Ok(AlignmentRecord {
        read_id: fields[0].to_string(),
        query_contig: fields[2].to_string(),
        mate_contig: fields[6].to_string(),
    })
}

/// Open a text input file and auto-detect bgzip compression, returning a
/// boxed BufRead
pub fn open_text_input<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;

    // Check by file extension (faster than reading magic bytes)
    let is_compressed = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz" || ext == "bgz")
        .unwrap_or(false);

    if is_compressed {
        Ok(Box::new(BufReader::new(bgzf::io::reader::Reader::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
