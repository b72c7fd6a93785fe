//! Removable media volume contract.
//!
//! The volume is polled, not interrupt driven: the system controller asks
//! [`MediaVolume::connect`] while waiting for media and
//! [`MediaVolume::is_connected`] otherwise.

use thiserror_no_std::Error;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EntryKind {
    /// A sub-folder.
    Folder,
    /// A regular file.
    File,
}

/// Media access errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MediaError {
    /// No volume is mounted.
    #[error("media not connected")]
    NotConnected,
    /// The path does not name an existing entry.
    #[error("not found")]
    NotFound,
    /// The device reported a read failure.
    #[error("i/o error")]
    Io,
}

/// A mounted (or mountable) removable volume.
pub trait MediaVolume {
    /// Open file handle. Dropping it closes the file.
    type File;

    /// Try to attach and mount the volume. Returns `true` once mounted.
    fn connect(&mut self) -> bool;

    /// Whether the mounted volume is still present.
    fn is_connected(&mut self) -> bool;

    /// List the entries of the folder at `path` (`""` is the root).
    ///
    /// `visit` receives each entry name (no path prefix) and kind.
    fn read_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(&str, EntryKind),
    ) -> Result<(), MediaError>;

    /// Open the file at `path` for reading.
    fn open_file(&mut self, path: &str) -> Result<Self::File, MediaError>;

    /// Close a file handle that was never handed to the decoder.
    fn close_file(&mut self, file: Self::File) {
        drop(file);
    }
}
