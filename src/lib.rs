// Library exports for hicprune
pub mod alignment;
pub mod alleles;
pub mod bam_io;
pub mod pair_index;
pub mod prune;
pub mod removal;
