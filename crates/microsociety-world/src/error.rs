//! Error types for the `microsociety-world` crate.

use microsociety_types::{ObjectKind, TileCoord};

/// Errors that can occur during grid operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorldError {
    /// The coordinate lies outside the grid.
    #[error("tile {coord} is outside the {width}x{height} grid")]
    OutOfBounds {
        /// The rejected coordinate.
        coord: TileCoord,
        /// Grid width in tiles.
        width: u32,
        /// Grid height in tiles.
        height: u32,
    },

    /// The tile has no object to remove.
    #[error("tile {coord} holds no object")]
    NoObject {
        /// The empty tile.
        coord: TileCoord,
    },

    /// The tile already holds an object.
    #[error("tile {coord} is already occupied by {existing:?}")]
    Occupied {
        /// The occupied tile.
        coord: TileCoord,
        /// The object already present.
        existing: ObjectKind,
    },

    /// Structures are permanent and cannot be removed.
    #[error("cannot remove permanent structure {kind:?} at {coord}")]
    PermanentStructure {
        /// The structure tile.
        coord: TileCoord,
        /// The structure kind.
        kind: ObjectKind,
    },

    /// The grid dimensions are unusable.
    #[error("invalid grid dimensions {width}x{height}: {reason}")]
    InvalidDimensions {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
        /// Why the dimensions were rejected.
        reason: &'static str,
    },
}
