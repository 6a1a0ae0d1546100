//! Block distribution of a global index space over the PEs of a group.
//!
//! Every index is owned by exactly one PE. Each PE owns `len / num_pes`
//! consecutive indices and the first `len % num_pes` PEs own one extra,
//! so ownership depends only on `len` and `num_pes`.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerRange {
    pub pe: usize,
    pub start: usize,
    pub end: usize,
}

impl OwnerRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }
}

/// Owner-range table, computed once from the global length and the PE count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerTable {
    len: usize,
    entries: Vec<OwnerRange>,
}

impl OwnerTable {
    pub fn block(len: usize, num_pes: usize) -> OwnerTable {
        assert!(num_pes > 0, "a group has at least one pe");
        let base = len / num_pes;
        let extra = len % num_pes;
        let mut start = 0;
        let entries = (0..num_pes)
            .map(|pe| {
                let size = base + usize::from(pe < extra);
                let entry = OwnerRange {
                    pe,
                    start,
                    end: start + size,
                };
                start += size;
                entry
            })
            .collect();
        OwnerTable { len, entries }
    }

    /// Global length of the distributed index space.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_pes(&self) -> usize {
        self.entries.len()
    }

    pub fn range(&self, pe: usize) -> Range<usize> {
        self.entries[pe].as_range()
    }

    pub fn local_len(&self, pe: usize) -> usize {
        self.entries[pe].len()
    }

    /// PE owning `index`, or `None` when the index is out of bounds.
    pub fn owner_of(&self, index: usize) -> Option<usize> {
        if index >= self.len {
            return None;
        }
        // first entry whose end is past the index; empty ranges are skipped naturally
        let pos = self.entries.partition_point(|e| e.end <= index);
        Some(self.entries[pos].pe)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnerRange> {
        self.entries.iter()
    }

    /// Entries overlapping the global range `[start, end)`, clipped to it.
    pub fn overlapping(&self, start: usize, end: usize) -> impl Iterator<Item = OwnerRange> + '_ {
        self.entries.iter().filter_map(move |e| {
            let lo = e.start.max(start);
            let hi = e.end.min(end);
            (lo < hi).then(|| OwnerRange {
                pe: e.pe,
                start: lo,
                end: hi,
            })
        })
    }
}
