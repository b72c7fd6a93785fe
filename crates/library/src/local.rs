//! Local directory as a media volume (desktop simulator and `xtask scan`).

use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::string::String;
use std::vec::Vec;

use platform::{EntryKind, MediaError, MediaVolume};

/// A directory on the host file system standing in for removable media.
///
/// The volume is "attached" while the directory exists. Listings are sorted
/// by name so scans are reproducible across host file systems.
#[derive(Debug, Clone)]
pub struct LocalVolume {
    root: PathBuf,
    mounted: bool,
}

impl LocalVolume {
    /// A volume rooted at `root`. Nothing is touched until [`MediaVolume::connect`].
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            mounted: false,
        }
    }

    /// The host directory backing this volume.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|c| !c.is_empty())
            .fold(self.root.clone(), |acc, c| acc.join(c))
    }
}

fn media_error(err: &std::io::Error) -> MediaError {
    match err.kind() {
        ErrorKind::NotFound => MediaError::NotFound,
        _ => MediaError::Io,
    }
}

impl MediaVolume for LocalVolume {
    type File = File;

    fn connect(&mut self) -> bool {
        self.mounted = self.root.is_dir();
        self.mounted
    }

    fn is_connected(&mut self) -> bool {
        self.mounted && self.root.is_dir()
    }

    fn read_dir(
        &mut self,
        path: &str,
        visit: &mut dyn FnMut(&str, EntryKind),
    ) -> Result<(), MediaError> {
        if !self.is_connected() {
            return Err(MediaError::NotConnected);
        }
        let mut entries: Vec<(String, EntryKind)> = fs::read_dir(self.resolve(path))
            .map_err(|e| media_error(&e))?
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let kind = if entry.file_type().ok()?.is_dir() {
                    EntryKind::Folder
                } else {
                    EntryKind::File
                };
                // Names that are not UTF-8 cannot be stored in the catalog.
                entry.file_name().into_string().ok().map(|name| (name, kind))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, kind) in &entries {
            visit(name, *kind);
        }
        Ok(())
    }

    fn open_file(&mut self, path: &str) -> Result<File, MediaError> {
        if !self.is_connected() {
            return Err(MediaError::NotConnected);
        }
        File::open(self.resolve(path)).map_err(|e| media_error(&e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Catalog, TrackId};
    use std::io::Read;

    fn touch(root: &std::path::Path, rel: &str, body: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_root_never_connects() {
        let dir = tempfile::tempdir().unwrap();
        let mut volume = LocalVolume::new(dir.path().join("absent"));
        assert!(!volume.connect());
        assert_eq!(volume.open_file("a.flac").unwrap_err(), MediaError::NotConnected);
    }

    #[test]
    fn removing_the_directory_detaches() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("usb");
        fs::create_dir(&root).unwrap();
        let mut volume = LocalVolume::new(&root);
        assert!(volume.connect());
        fs::remove_dir(&root).unwrap();
        assert!(!volume.is_connected());
    }

    #[test]
    fn scan_of_directory_tree_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.flac", b"b");
        touch(dir.path(), "a.FLA", b"a");
        touch(dir.path(), "notes.txt", b"");
        touch(dir.path(), "album/02.flac", b"2");
        touch(dir.path(), "album/01.flac", b"1");

        let mut volume = LocalVolume::new(dir.path());
        assert!(volume.connect());
        let mut catalog = Box::new(Catalog::new());
        let summary = catalog.scan(&mut volume);
        assert_eq!(summary.tracks, 4);

        let paths: Vec<String> = (0..catalog.track_count())
            .filter_map(TrackId::new)
            .map(|id| catalog.track_path(id).unwrap().as_str().to_string())
            .collect();
        assert_eq!(paths, ["a.FLA", "b.flac", "album/01.flac", "album/02.flac"]);

        let mut file = catalog.open_track(&mut volume, TrackId::new(2).unwrap()).unwrap();
        let mut body = String::new();
        file.read_to_string(&mut body).unwrap();
        assert_eq!(body, "1");
    }

    #[test]
    fn missing_file_maps_to_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let mut volume = LocalVolume::new(dir.path());
        volume.connect();
        assert_eq!(volume.open_file("gone.flac").unwrap_err(), MediaError::NotFound);
    }
}
