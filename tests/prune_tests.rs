/// End-to-end tests for the pruning pipeline over text-mode inputs
use pretty_assertions::assert_eq;
use std::fs;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

use hicprune::bam_io::write_pruned_text;
use hicprune::prune::{PruneConfig, Pruner};

fn write_temp(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

fn sam_line(read: &str, ctg: &str, mate: &str) -> String {
    format!("{read}\t0\t{ctg}\t1\t60\t50M\t{mate}\t1\t0\tACGT\tFFFF\n")
}

fn run_pipeline(alignments: &str, table: &str) -> (TempDir, hicprune::removal::RemovalSet) {
    let aln = write_temp(alignments);
    let tbl = write_temp(table);
    let out = TempDir::new().unwrap();

    let pruner = Pruner::new(PruneConfig {
        table: tbl.path().to_path_buf(),
        alignments: aln.path().to_path_buf(),
        out_dir: out.path().to_path_buf(),
        sam_text: true,
    });
    let removal = pruner.run().unwrap();
    (out, removal)
}

#[test]
fn end_to_end_single_group() {
    // r1/r2 link ctgA-ctgB, r3 links ctgA-ctgC; ctgA and ctgC are alleles
    let alignments = format!(
        "{}{}{}",
        sam_line("r1", "ctgA", "ctgB"),
        sam_line("r2", "ctgA", "ctgB"),
        sam_line("r3", "ctgA", "ctgC"),
    );
    let table = "meta\tmeta\tctgA\tctgC\n";

    let (out, removal) = run_pipeline(&alignments, table);

    // the intra-group link ctgA-ctgC is resolved, flagging r3 only
    assert!(removal.contains("r3"));
    assert!(!removal.contains("r1"));
    assert!(!removal.contains("r2"));
    assert_eq!(removal.len(), 1);

    let allele = fs::read_to_string(out.path().join("removedb_Allele.txt")).unwrap();
    assert_eq!(allele, "ctgA\tctgC\tr3,\n");

    // ctgB's only candidate into the group is ctgA with support 2: it is
    // retained, so the non-best report stays empty
    let log = fs::read_to_string(out.path().join("log.txt")).unwrap();
    assert_eq!(log, ">meta\tmeta\tctgA\tctgC\nctgB\tctgA\t2\tr1,r2,\n");

    let nonbest = fs::read_to_string(out.path().join("removedb_nonBest.txt")).unwrap();
    assert_eq!(nonbest, "");
}

#[test]
fn non_best_links_are_pruned_with_first_seen_tie_break() {
    // ctgZ links to group members ctgA (2 reads), ctgB (3), ctgC (3).
    // ctgB reaches the maximum first and wins the tie against ctgC.
    let alignments = format!(
        "{}{}{}{}{}{}{}{}",
        sam_line("a1", "ctgA", "ctgZ"),
        sam_line("a2", "ctgZ", "ctgA"),
        sam_line("b1", "ctgB", "ctgZ"),
        sam_line("b2", "ctgB", "ctgZ"),
        sam_line("b3", "ctgZ", "ctgB"),
        sam_line("c1", "ctgC", "ctgZ"),
        sam_line("c2", "ctgC", "ctgZ"),
        sam_line("c3", "ctgC", "ctgZ"),
    );
    let table = "chr1\t500\tctgA\tctgB\tctgC\n";

    let (out, removal) = run_pipeline(&alignments, table);

    for r in ["a1", "a2", "c1", "c2", "c3"] {
        assert!(removal.contains(r), "{r} should be flagged");
    }
    for r in ["b1", "b2", "b3"] {
        assert!(!removal.contains(r), "{r} must survive");
    }

    let nonbest = fs::read_to_string(out.path().join("removedb_nonBest.txt")).unwrap();
    assert_eq!(
        nonbest,
        "ctgZ\tctgA\t2\tremove\ta1,a2,\nctgZ\tctgC\t3\tremove\tc1,c2,c3,\n"
    );
}

#[test]
fn self_mates_never_enter_the_index() {
    let alignments = format!(
        "{}{}",
        sam_line("r1", "ctgA", "="),
        sam_line("r2", "ctgA", "ctgB"),
    );
    let table = "m\tm\tctgA\tctgB\n";

    let (out, removal) = run_pipeline(&alignments, table);

    // only the genuine inter-contig link exists, and it is intra-group
    assert!(removal.contains("r2"));
    assert!(!removal.contains("r1"));
    let allele = fs::read_to_string(out.path().join("removedb_Allele.txt")).unwrap();
    assert_eq!(allele, "ctgA\tctgB\tr2,\n");
}

#[test]
fn groups_too_small_are_ignored() {
    let alignments = sam_line("r1", "ctgA", "ctgB");
    // first line has only one member (3 fields) and must be skipped
    let table = "m\tm\tctgA\nm\tm\tctgA\tctgB\n";

    let (out, removal) = run_pipeline(&alignments, table);

    assert!(removal.contains("r1"));
    let log = fs::read_to_string(out.path().join("log.txt")).unwrap();
    // only the surviving group produced a header
    assert_eq!(log, ">m\tm\tctgA\tctgB\n");
}

#[test]
fn reruns_are_byte_identical() {
    let alignments = format!(
        "{}{}{}{}",
        sam_line("r1", "ctgA", "ctgB"),
        sam_line("r2", "ctgB", "ctgC"),
        sam_line("r3", "ctgA", "ctgC"),
        sam_line("r4", "ctgA", "ctgB"),
    );
    let table = "chr1\t1\tctgA\tctgB\nchr2\t2\tctgB\tctgC\n";

    let (out1, removal1) = run_pipeline(&alignments, table);
    let (out2, removal2) = run_pipeline(&alignments, table);

    assert_eq!(removal1.len(), removal2.len());
    for name in ["removedb_Allele.txt", "removedb_nonBest.txt", "log.txt"] {
        let a = fs::read_to_string(out1.path().join(name)).unwrap();
        let b = fs::read_to_string(out2.path().join(name)).unwrap();
        assert_eq!(a, b, "{name} differs between runs");
    }
}

#[test]
fn malformed_alignment_line_aborts_the_run() {
    let aln = write_temp("r1\tctgA\tctgB\n");
    let tbl = write_temp("m\tm\tctgA\tctgB\n");
    let out = TempDir::new().unwrap();

    let pruner = Pruner::new(PruneConfig {
        table: tbl.path().to_path_buf(),
        alignments: aln.path().to_path_buf(),
        out_dir: out.path().to_path_buf(),
        sam_text: true,
    });
    let err = pruner.run().unwrap_err();
    assert!(err.to_string().contains("line 1"), "got: {err}");
}

#[test]
fn missing_inputs_surface_the_offending_path() {
    let out = TempDir::new().unwrap();
    let pruner = Pruner::new(PruneConfig {
        table: out.path().join("no_such_table"),
        alignments: out.path().join("no_such_aln"),
        out_dir: out.path().to_path_buf(),
        sam_text: true,
    });
    let err = pruner.run().unwrap_err();
    assert!(err.to_string().contains("no_such_aln"), "got: {err}");
}

#[test]
fn sink_filters_the_original_stream() {
    let alignments = format!(
        "{}{}{}{}",
        sam_line("r1", "ctgA", "ctgB"),
        sam_line("r2", "ctgA", "ctgC"),
        sam_line("r2", "ctgC", "ctgA"),
        sam_line("r9", "ctgA", "*"),
    );
    let table = "m\tm\tctgA\tctgC\n";

    let (_out, removal) = run_pipeline(&alignments, table);
    assert!(removal.contains("r2"));

    let mut pruned = Vec::new();
    let (kept, dropped) =
        write_pruned_text(alignments.as_bytes(), &mut pruned, &removal).unwrap();

    // r1 survives; both r2 records and the unmapped-mate r9 drop
    assert_eq!(kept, 1);
    assert_eq!(dropped, 3);
    assert_eq!(
        String::from_utf8(pruned).unwrap(),
        sam_line("r1", "ctgA", "ctgB")
    );
}
