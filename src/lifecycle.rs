//! Versioned extents across the Bronze, Silver and Gold layers.
//!
//! Every table the warehouse holds lives in an [`ExtentCell`]. A cell is
//! replaced as a whole, never edited in place, and each replacement gets a new
//! [`ExtentVersion`] linked to its parent. Gold views published as snapshots
//! are written through the [`VersionStore`].

pub mod extent;
pub mod layers;
pub mod storage;
pub mod version;

pub use extent::{Extent, ExtentCell};
pub use layers::Layer;
pub use storage::{DataLocation, PublishedVersion, SnapshotFormat, VersionStore};
pub use version::{ExtentVersion, VersionHistory};
