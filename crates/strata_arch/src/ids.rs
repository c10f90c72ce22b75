//! Opaque ID newtypes for architecture entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and
//! `Serialize`/`Deserialize`. These IDs reference rows and regions within a
//! placement architecture model.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a placement row.
    RowId
);

define_id!(
    /// Opaque, copyable ID for a rectilinear capacity region.
    RegionId
);

impl RegionId {
    /// The implicit default region that unconstrained cells belong to.
    pub const DEFAULT: RegionId = RegionId(0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn id_roundtrip() {
        let id = RowId::from_raw(42);
        assert_eq!(id.as_raw(), 42);
    }

    #[test]
    fn id_equality() {
        let a = RegionId::from_raw(3);
        let b = RegionId::from_raw(3);
        let c = RegionId::from_raw(4);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn default_region_is_zero() {
        assert_eq!(RegionId::DEFAULT.as_raw(), 0);
    }

    #[test]
    fn id_hash_in_set() {
        let mut set = HashSet::new();
        set.insert(RowId::from_raw(1));
        set.insert(RowId::from_raw(2));
        set.insert(RowId::from_raw(1));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", RowId::from_raw(7)), "7");
    }

    #[test]
    fn id_serde_roundtrip() {
        let id = RegionId::from_raw(55);
        let json = serde_json::to_string(&id).unwrap();
        let restored: RegionId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, restored);
    }
}
