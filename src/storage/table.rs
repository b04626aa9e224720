use crate::core::Record;
use std::sync::{Arc, RwLock};

/// Shared handle onto one table. Each table carries its own lock.
pub(crate) type TableHandle = Arc<RwLock<Table>>;

/// Rows of one table plus a version bumped on every write.
///
/// Collection writes compute their edit against a snapshot with no lock held
/// and only commit if the version is still the one they read.
#[derive(Debug, Clone, Default)]
pub(crate) struct Table {
    rows: Vec<Record>,
    version: u64,
}

/// A prepared change to a table, in row positions of the snapshot it was
/// computed from.
#[derive(Debug)]
pub(crate) enum Edit {
    Replace(Vec<(usize, Record)>),
    /// Positions in ascending order
    Remove(Vec<usize>),
}

impl Edit {
    pub(crate) fn is_empty(&self) -> bool {
        match self {
            Self::Replace(rows) => rows.is_empty(),
            Self::Remove(positions) => positions.is_empty(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Replace(rows) => rows.len(),
            Self::Remove(positions) => positions.len(),
        }
    }
}

impl Table {
    pub(crate) fn handle() -> TableHandle {
        Arc::new(RwLock::new(Self::default()))
    }

    pub(crate) fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    pub(crate) fn snapshot(&self) -> (Vec<Record>, u64) {
        (self.rows.clone(), self.version)
    }

    pub(crate) fn append(&mut self, records: Vec<Record>) {
        self.rows.extend(records);
        self.version += 1;
    }

    pub(crate) fn apply(&mut self, edit: Edit) {
        match edit {
            Edit::Replace(rows) => {
                for (i, record) in rows {
                    self.rows[i] = record;
                }
            }
            Edit::Remove(positions) => {
                let mut i = 0;
                self.rows.retain(|_| {
                    let keep = positions.binary_search(&i).is_err();
                    i += 1;
                    keep
                });
            }
        }
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rows(ids: &[i64]) -> Vec<Record> {
        ids.iter()
            .map(|id| json!({"id": id}).as_object().cloned().unwrap())
            .collect()
    }

    #[test]
    fn test_append_bumps_version() {
        let mut table = Table::default();
        assert_eq!(table.version(), 0);

        table.append(rows(&[1, 2]));
        assert_eq!(table.version(), 1);
        assert_eq!(table.rows().len(), 2);
    }

    #[test]
    fn test_remove_by_position() {
        let mut table = Table::default();
        table.append(rows(&[1, 1, 2, 1]));

        table.apply(Edit::Remove(vec![0, 3]));
        assert_eq!(table.rows(), rows(&[1, 2]).as_slice());
        assert_eq!(table.version(), 2);
    }

    #[test]
    fn test_replace_by_position() {
        let mut table = Table::default();
        table.append(rows(&[1, 2, 3]));

        table.apply(Edit::Replace(rows(&[9]).into_iter().map(|r| (1, r)).collect()));
        assert_eq!(table.rows(), rows(&[1, 9, 3]).as_slice());
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut table = Table::default();
        table.append(rows(&[1]));

        let (snapshot, version) = table.snapshot();
        table.append(rows(&[2]));

        assert_eq!(snapshot.len(), 1);
        assert_ne!(version, table.version());
    }
}
