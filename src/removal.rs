/// Accumulating set of read ids flagged for removal
///
/// Append-only: both decision stages add to it, nothing ever leaves. The
/// count per read is how many times it was flagged; downstream filtering
/// only cares about membership.
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct RemovalSet {
    reads: IndexMap<String, u64>,
}

impl RemovalSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flag one read id for removal
    pub fn flag(&mut self, read_id: &str) {
        match self.reads.get_mut(read_id) {
            Some(count) => *count += 1,
            None => {
                self.reads.insert(read_id.to_string(), 1);
            }
        }
    }

    /// Flag every read id in a supporting-read list
    pub fn flag_all<'a, I: IntoIterator<Item = &'a String>>(&mut self, read_ids: I) {
        for r in read_ids {
            self.flag(r);
        }
    }

    pub fn contains(&self, read_id: &str) -> bool {
        self.reads.contains_key(read_id)
    }

    /// Number of distinct flagged reads
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// How many times a read was flagged (0 if never)
    pub fn flag_count(&self, read_id: &str) -> u64 {
        self.reads.get(read_id).copied().unwrap_or(0)
    }
}
