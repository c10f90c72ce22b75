//! Pairwise minimum edge-spacing table.

use serde::{Deserialize, Serialize};

/// Errors raised when constructing an edge-spacing table.
#[derive(Debug, thiserror::Error)]
pub enum SpacingTableError {
    /// The flat entry vector does not match `classes × classes`.
    #[error("spacing table has {got} entries, expected {expected} for {classes} edge classes")]
    WrongEntryCount {
        /// Number of edge classes declared.
        classes: usize,
        /// Expected entry count (`classes²`).
        expected: usize,
        /// Actual entry count supplied.
        got: usize,
    },
    /// A spacing entry is negative.
    #[error("spacing table entry ({a}, {b}) is negative: {value}")]
    NegativeEntry {
        /// Row (right-edge class of the left cell).
        a: usize,
        /// Column (left-edge class of the right cell).
        b: usize,
        /// The offending value.
        value: i64,
    },
}

/// Dense pairwise minimum-gap table indexed by edge-type class.
///
/// `spacing(a, b)` is the minimum free gap required between a cell whose
/// right edge has class `a` and an abutting cell to its right whose left
/// edge has class `b`. Classes outside the table require no extra gap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSpacingTable {
    classes: usize,
    entries: Vec<i64>,
}

impl EdgeSpacingTable {
    /// Creates a table with the given number of classes and no required gaps.
    pub fn empty(classes: usize) -> Self {
        Self {
            classes,
            entries: vec![0; classes * classes],
        }
    }

    /// Creates a table from a row-major flat entry vector.
    pub fn from_entries(classes: usize, entries: Vec<i64>) -> Result<Self, SpacingTableError> {
        let expected = classes * classes;
        if entries.len() != expected {
            return Err(SpacingTableError::WrongEntryCount {
                classes,
                expected,
                got: entries.len(),
            });
        }
        for (i, &value) in entries.iter().enumerate() {
            if value < 0 {
                return Err(SpacingTableError::NegativeEntry {
                    a: i / classes,
                    b: i % classes,
                    value,
                });
            }
        }
        Ok(Self { classes, entries })
    }

    /// Returns the number of edge classes this table covers.
    pub fn classes(&self) -> usize {
        self.classes
    }

    /// Returns the minimum gap between right-edge class `a` and left-edge class `b`.
    pub fn spacing(&self, a: u16, b: u16) -> i64 {
        let (a, b) = (a as usize, b as usize);
        if a >= self.classes || b >= self.classes {
            return 0;
        }
        self.entries[a * self.classes + b]
    }

    /// Sets the minimum gap for the `(a, b)` class pair.
    pub fn set(&mut self, a: u16, b: u16, gap: i64) {
        let (a, b) = (a as usize, b as usize);
        if a < self.classes && b < self.classes {
            self.entries[a * self.classes + b] = gap;
        }
    }
}

impl Default for EdgeSpacingTable {
    fn default() -> Self {
        Self::empty(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_requires_no_gap() {
        let table = EdgeSpacingTable::empty(3);
        assert_eq!(table.spacing(0, 2), 0);
        assert_eq!(table.spacing(2, 1), 0);
    }

    #[test]
    fn from_entries_roundtrip() {
        let table = EdgeSpacingTable::from_entries(2, vec![0, 10, 10, 20]).unwrap();
        assert_eq!(table.spacing(0, 0), 0);
        assert_eq!(table.spacing(0, 1), 10);
        assert_eq!(table.spacing(1, 0), 10);
        assert_eq!(table.spacing(1, 1), 20);
    }

    #[test]
    fn wrong_entry_count_rejected() {
        let err = EdgeSpacingTable::from_entries(2, vec![0, 1, 2]).unwrap_err();
        assert!(matches!(
            err,
            SpacingTableError::WrongEntryCount {
                classes: 2,
                expected: 4,
                got: 3
            }
        ));
    }

    #[test]
    fn negative_entry_rejected() {
        let err = EdgeSpacingTable::from_entries(2, vec![0, -5, 0, 0]).unwrap_err();
        assert!(matches!(err, SpacingTableError::NegativeEntry { value: -5, .. }));
    }

    #[test]
    fn out_of_range_class_is_zero() {
        let table = EdgeSpacingTable::from_entries(2, vec![1, 2, 3, 4]).unwrap();
        assert_eq!(table.spacing(5, 0), 0);
        assert_eq!(table.spacing(0, 9), 0);
    }

    #[test]
    fn set_updates_entry() {
        let mut table = EdgeSpacingTable::empty(2);
        table.set(1, 0, 40);
        assert_eq!(table.spacing(1, 0), 40);
        assert_eq!(table.spacing(0, 1), 0);
    }

    #[test]
    fn serde_roundtrip() {
        let table = EdgeSpacingTable::from_entries(2, vec![0, 10, 10, 0]).unwrap();
        let json = serde_json::to_string(&table).unwrap();
        let restored: EdgeSpacingTable = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.spacing(0, 1), 10);
    }
}
