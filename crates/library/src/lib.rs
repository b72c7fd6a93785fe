//! Track catalog: folder scan of removable media into a flat play list.
//!
//! # Modules
//!
//! - [`catalog`]: `Catalog` arena of folders and tracks, path rebuild
//! - [`scan`]: breadth-first volume walk and `.flac`/`.fla` filter
//! - `local`: host directory volume (`std` feature)

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod fmt;

pub mod catalog;
pub mod scan;

#[cfg(any(test, feature = "std"))]
pub mod local;

pub use catalog::{Catalog, CatalogError, FolderId, TrackId, TrackPath};
pub use scan::{is_track_name, ScanSummary};

#[cfg(any(test, feature = "std"))]
pub use local::LocalVolume;
