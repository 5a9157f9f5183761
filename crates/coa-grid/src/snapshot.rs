//! Immutable record snapshots
//!
//! Every load produces a new snapshot with a fresh epoch. Row identities are
//! derived once from each record's slot in the snapshot, so they stay stable
//! while the view is filtered and re-sorted.

use std::collections::HashMap;

use coa_core::Record;

use crate::{RowId, resolve_row_id};

/// Generation counter for record snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SnapshotEpoch(pub u64);

impl SnapshotEpoch {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    epoch: SnapshotEpoch,
    records: Vec<Record>,
    row_ids: Vec<RowId>,
    slots: HashMap<RowId, usize>,
}

impl Snapshot {
    pub fn new(epoch: SnapshotEpoch, records: Vec<Record>) -> Self {
        let row_ids: Vec<RowId> = records
            .iter()
            .enumerate()
            .map(|(slot, record)| resolve_row_id(record, Some(slot)))
            .collect();
        let slots = row_ids
            .iter()
            .enumerate()
            .map(|(slot, id)| (id.clone(), slot))
            .collect();

        Self {
            epoch,
            records,
            row_ids,
            slots,
        }
    }

    pub fn epoch(&self) -> SnapshotEpoch {
        self.epoch
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, slot: usize) -> Option<&Record> {
        self.records.get(slot)
    }

    pub fn row_id(&self, slot: usize) -> Option<&RowId> {
        self.row_ids.get(slot)
    }

    pub fn slot_of(&self, row_id: &RowId) -> Option<usize> {
        self.slots.get(row_id).copied()
    }

    /// Slot indices in load order, the input of the view pipeline
    pub fn all_slots(&self) -> Vec<usize> {
        (0..self.records.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_duplicate_records_get_distinct_identities() {
        let record = Record::new("a.pdf").with_sample_id("S1");
        let snapshot = Snapshot::new(SnapshotEpoch(1), vec![record.clone(), record]);

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.row_id(0).unwrap().as_str(), "a.pdf-S1--idx-0");
        assert_eq!(snapshot.row_id(1).unwrap().as_str(), "a.pdf-S1--idx-1");
        assert_eq!(snapshot.slot_of(&RowId::from("a.pdf-S1--idx-1")), Some(1));
        assert_eq!(snapshot.slot_of(&RowId::from("nope")), None);
    }

    #[test]
    fn test_epoch_advances() {
        assert_eq!(SnapshotEpoch::default().next(), SnapshotEpoch(1));
    }
}
