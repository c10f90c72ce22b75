//! Cell orientations and their coordinate transforms.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the eight manufacturing orientations of a placed cell.
///
/// Names follow the usual convention: `N` is the unrotated orientation,
/// `S` is rotated 180°, `E`/`W` are the 90° rotations, and the `F` variants
/// are mirrored about the Y axis before rotation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Orientation {
    /// Unrotated.
    N,
    /// Rotated 90° counter-clockwise.
    W,
    /// Rotated 180°.
    S,
    /// Rotated 270° counter-clockwise.
    E,
    /// Mirrored about the Y axis.
    Fn,
    /// Mirrored, then rotated 90° counter-clockwise.
    Fw,
    /// Mirrored, then rotated 180°.
    Fs,
    /// Mirrored, then rotated 270° counter-clockwise.
    Fe,
}

impl Orientation {
    /// Transforms a center-relative pin offset into this orientation.
    pub fn transform(self, dx: i64, dy: i64) -> (i64, i64) {
        match self {
            Orientation::N => (dx, dy),
            Orientation::S => (-dx, -dy),
            Orientation::Fn => (-dx, dy),
            Orientation::Fs => (dx, -dy),
            Orientation::W => (-dy, dx),
            Orientation::E => (dy, -dx),
            Orientation::Fw => (dy, dx),
            Orientation::Fe => (-dy, -dx),
        }
    }

    /// Returns `true` for orientations that mirror the cell horizontally,
    /// swapping its left and right edge types.
    pub fn flips_horizontal(self) -> bool {
        matches!(self, Orientation::S | Orientation::Fn)
    }

    /// Returns `true` for the 90°/270° rotations, which swap width and height.
    ///
    /// Row-based placement never proposes these, but snapshots may carry them
    /// on fixed macro cells.
    pub fn is_rotated(self) -> bool {
        matches!(
            self,
            Orientation::W | Orientation::E | Orientation::Fw | Orientation::Fe
        )
    }
}

impl Default for Orientation {
    fn default() -> Self {
        Orientation::N
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Orientation::N => "N",
            Orientation::W => "W",
            Orientation::S => "S",
            Orientation::E => "E",
            Orientation::Fn => "FN",
            Orientation::Fw => "FW",
            Orientation::Fs => "FS",
            Orientation::Fe => "FE",
        };
        write!(f, "{s}")
    }
}
