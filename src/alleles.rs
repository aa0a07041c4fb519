/// Allele-group table parsing.
///
/// Each line declares one group of contigs representing the same locus:
/// two leading metadata fields (typically chromosome and position, opaque
/// here), then the member contig names. The verbatim line is kept because
/// the decision log echoes it as a ">" header.
use anyhow::Result;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleGroup {
    /// Original table line, unmodified
    pub line: String,
    /// Member contig names, in table order (fields 2..n)
    pub members: Vec<String>,
}

/// Read the allele-group table. Lines with three or fewer tab-separated
/// fields cannot declare two members and are skipped.
pub fn read_allele_table<R: BufRead>(reader: R) -> Result<Vec<AlleleGroup>> {
    let mut groups = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() <= 3 {
            continue;
        }

        let members = fields[2..].iter().map(|s| s.to_string()).collect();
        groups.push(AlleleGroup { line, members });
    }

    Ok(groups)
}
