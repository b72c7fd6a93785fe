//! Catalog: fixed-capacity arena of folders and tracks.
//!
//! Folders and tracks are stored in two flat lists. Every entry keeps only
//! its own name and the index of its parent folder; full paths are rebuilt
//! on demand by walking the parent links up to the root.
//!
//! Folder 0 is always the root. It has no parent and an empty name, so
//! rebuilt paths are relative to the volume root (`"rock/a.flac"`).
//!
//! A full catalog is ~260 KB; keep it in a static or a `Box`, never on a
//! task stack.

use heapless::{String, Vec};
use platform::config::{MAX_FOLDERS, MAX_FOLDER_DEPTH, MAX_NAME_BYTES, MAX_PATH_BYTES, MAX_TRACKS};
use platform::{MediaError, MediaVolume};
use thiserror_no_std::Error;

/// Fixed-capacity entry name.
pub type Name = String<MAX_NAME_BYTES>;

/// Fixed-capacity volume-relative path.
pub type TrackPath = String<MAX_PATH_BYTES>;

/// Catalog errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CatalogError {
    /// The folder list is full.
    #[error("folder limit reached")]
    FolderLimit,
    /// The track list is full.
    #[error("track limit reached")]
    TrackLimit,
    /// A folder would exceed the maximum nesting depth.
    #[error("folder too deep")]
    TooDeep,
    /// An entry name does not fit the name buffer.
    #[error("name too long")]
    NameTooLong,
    /// The rebuilt path does not fit the path buffer.
    #[error("path too long")]
    PathTooLong,
    /// No track with this id.
    #[error("unknown track")]
    UnknownTrack,
    /// No folder with this id.
    #[error("unknown folder")]
    UnknownFolder,
    /// The volume refused to open the track.
    #[error("media error: {0}")]
    Media(MediaError),
}

/// Index of a folder in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FolderId(u8);

impl FolderId {
    /// The root folder.
    pub const ROOT: Self = Self(0);

    /// Position in the folder list.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

/// Index of a track in the catalog (catalog order is play order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrackId(u16);

impl TrackId {
    /// The first track.
    pub const FIRST: Self = Self(0);

    /// Wrap a raw index, or `None` beyond the track capacity.
    pub fn new(index: usize) -> Option<Self> {
        if index < MAX_TRACKS {
            u16::try_from(index).ok().map(Self)
        } else {
            None
        }
    }

    /// Position in the track list.
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

#[derive(Debug, Clone)]
struct Folder {
    name: Name,
    parent: Option<FolderId>,
    /// Root is depth 1.
    depth: u8,
}

#[derive(Debug, Clone)]
struct Track {
    name: Name,
    folder: FolderId,
}

/// The scanned folder tree and flat track list.
pub struct Catalog {
    folders: Vec<Folder, MAX_FOLDERS>,
    tracks: Vec<Track, MAX_TRACKS>,
}

impl Catalog {
    /// An empty catalog holding only the root folder.
    pub fn new() -> Self {
        let mut catalog = Self {
            folders: Vec::new(),
            tracks: Vec::new(),
        };
        catalog.reset();
        catalog
    }

    /// Drop every folder and track except the root.
    pub fn reset(&mut self) {
        self.folders.clear();
        self.tracks.clear();
        // Capacity is at least one, so the root always fits.
        let _ = self.folders.push(Folder {
            name: Name::new(),
            parent: None,
            depth: 1,
        });
    }

    /// Number of folders, root included.
    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    /// Number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// `true` when no tracks were found.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The folder registered at position `index`, if any.
    pub fn folder_id(&self, index: usize) -> Option<FolderId> {
        if index < self.folders.len() {
            u8::try_from(index).ok().map(FolderId)
        } else {
            None
        }
    }

    /// Whether `folder` may contain sub-folders.
    pub fn can_nest(&self, folder: FolderId) -> bool {
        self.folders
            .get(folder.index())
            .is_some_and(|f| f.depth < MAX_FOLDER_DEPTH)
    }

    /// Register a sub-folder of `parent`.
    pub fn add_folder(&mut self, name: &str, parent: FolderId) -> Result<FolderId, CatalogError> {
        let depth = self
            .folders
            .get(parent.index())
            .ok_or(CatalogError::UnknownFolder)?
            .depth;
        if depth >= MAX_FOLDER_DEPTH {
            return Err(CatalogError::TooDeep);
        }
        let id = u8::try_from(self.folders.len())
            .map(FolderId)
            .map_err(|_| CatalogError::FolderLimit)?;
        let folder = Folder {
            name: to_name(name)?,
            parent: Some(parent),
            depth: depth.saturating_add(1),
        };
        self.folders.push(folder).map_err(|_| CatalogError::FolderLimit)?;
        Ok(id)
    }

    /// Register a track file found in `folder`.
    pub fn add_track(&mut self, name: &str, folder: FolderId) -> Result<TrackId, CatalogError> {
        if self.folders.get(folder.index()).is_none() {
            return Err(CatalogError::UnknownFolder);
        }
        let id = TrackId::new(self.tracks.len()).ok_or(CatalogError::TrackLimit)?;
        let track = Track {
            name: to_name(name)?,
            folder,
        };
        self.tracks.push(track).map_err(|_| CatalogError::TrackLimit)?;
        Ok(id)
    }

    /// File name of a track.
    pub fn track_name(&self, id: TrackId) -> Option<&str> {
        self.tracks.get(id.index()).map(|t| t.name.as_str())
    }

    /// Volume-relative path of a folder (`""` for the root).
    pub fn folder_path(&self, id: FolderId) -> Result<TrackPath, CatalogError> {
        let mut path = TrackPath::new();
        self.push_folder_path(&mut path, id)?;
        Ok(path)
    }

    /// Volume-relative path of a track.
    pub fn track_path(&self, id: TrackId) -> Result<TrackPath, CatalogError> {
        let track = self.tracks.get(id.index()).ok_or(CatalogError::UnknownTrack)?;
        let mut path = TrackPath::new();
        self.push_folder_path(&mut path, track.folder)?;
        push_component(&mut path, &track.name)?;
        Ok(path)
    }

    /// Open a track for reading.
    pub fn open_track<V: MediaVolume>(
        &self,
        volume: &mut V,
        id: TrackId,
    ) -> Result<V::File, CatalogError> {
        let path = self.track_path(id)?;
        volume.open_file(&path).map_err(CatalogError::Media)
    }

    /// Append the path of `id` to `out` by collecting ancestors, then writing
    /// them root-first.
    fn push_folder_path(&self, out: &mut TrackPath, id: FolderId) -> Result<(), CatalogError> {
        let mut chain: Vec<FolderId, { MAX_FOLDER_DEPTH as usize }> = Vec::new();
        let mut cursor = id;
        loop {
            let folder = self.folders.get(cursor.index()).ok_or(CatalogError::UnknownFolder)?;
            match folder.parent {
                Some(parent) => {
                    chain.push(cursor).map_err(|_| CatalogError::TooDeep)?;
                    cursor = parent;
                }
                None => break,
            }
        }
        for folder in chain.iter().rev() {
            let name = self
                .folders
                .get(folder.index())
                .map(|f| f.name.as_str())
                .ok_or(CatalogError::UnknownFolder)?;
            push_component(out, name)?;
        }
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

fn to_name(name: &str) -> Result<Name, CatalogError> {
    let mut out = Name::new();
    out.push_str(name).map_err(|_| CatalogError::NameTooLong)?;
    Ok(out)
}

fn push_component(path: &mut TrackPath, name: &str) -> Result<(), CatalogError> {
    if !path.is_empty() {
        path.push('/').map_err(|_| CatalogError::PathTooLong)?;
    }
    path.push_str(name).map_err(|_| CatalogError::PathTooLong)
}
