//! Scanner: breadth-first walk of a media volume into a [`Catalog`].
//!
//! Folders are visited in registration order, so the folder list doubles as
//! the work queue: the root first, then its sub-folders, then theirs. Within
//! a folder, entries keep the order the volume lists them in. Track ids
//! therefore follow the same breadth-first order, which is the play order.
//!
//! Entries that do not fit (folder or track limit, nesting depth, name
//! length) are skipped, never fatal. A folder that cannot be listed is
//! skipped as well.

use platform::{EntryKind, MediaVolume};

use crate::catalog::{Catalog, FolderId};

/// Outcome of one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanSummary {
    /// Folders registered, root included.
    pub folders: usize,
    /// Tracks registered.
    pub tracks: usize,
    /// Entries dropped because a limit was reached.
    pub skipped: usize,
    /// Folders that could not be listed.
    pub unreadable: usize,
}

/// Returns `true` for `.flac` and `.fla` file names, in any letter case.
pub fn is_track_name(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("flac") || ext.eq_ignore_ascii_case("fla"))
}

impl Catalog {
    /// Replace the catalog contents with a fresh scan of `volume`.
    pub fn scan<V: MediaVolume>(&mut self, volume: &mut V) -> ScanSummary {
        self.reset();
        let mut summary = ScanSummary::default();

        let mut next = 0usize;
        while let Some(folder) = self.folder_id(next) {
            next = next.saturating_add(1);

            let Ok(path) = self.folder_path(folder) else {
                summary.unreadable = summary.unreadable.saturating_add(1);
                continue;
            };
            let nest = self.can_nest(folder);
            let listed = volume.read_dir(&path, &mut |name, kind| {
                let registered = match kind {
                    EntryKind::Folder => nest && self.add_folder(name, folder).is_ok(),
                    EntryKind::File if is_track_name(name) => self.add_track(name, folder).is_ok(),
                    EntryKind::File => return,
                };
                if !registered {
                    summary.skipped = summary.skipped.saturating_add(1);
                }
            });
            if listed.is_err() {
                warn!("scan: folder {} unreadable", folder.index());
                summary.unreadable = summary.unreadable.saturating_add(1);
            }
        }

        summary.folders = self.folder_count();
        summary.tracks = self.track_count();
        info!(
            "scan: {} folders, {} tracks, {} skipped",
            summary.folders,
            summary.tracks,
            summary.skipped
        );
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::config::{MAX_FOLDERS, MAX_FOLDER_DEPTH, MAX_TRACKS};
    use platform::mocks::MockVolume;
    use platform::MediaVolume;

    fn scan(volume: &MockVolume) -> (Box<Catalog>, ScanSummary) {
        let mut volume = volume.clone();
        volume.connect();
        let mut catalog = Box::new(Catalog::new());
        let summary = catalog.scan(&mut volume);
        (catalog, summary)
    }

    fn paths(catalog: &Catalog) -> Vec<String> {
        (0..catalog.track_count())
            .filter_map(crate::TrackId::new)
            .map(|id| catalog.track_path(id).unwrap().as_str().to_string())
            .collect()
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        assert!(is_track_name("a.flac"));
        assert!(is_track_name("B.FLAC"));
        assert!(is_track_name("c.Fla"));
        assert!(is_track_name("dots.in.name.flac"));
        assert!(!is_track_name("flac"));
        assert!(!is_track_name("a.flac.txt"));
        assert!(!is_track_name("a.mp3"));
        assert!(!is_track_name("a.flacc"));
    }

    #[test]
    fn tracks_follow_breadth_first_order() {
        let volume = MockVolume::with_files(&[
            "b/deep/3.flac",
            "a/2.flac",
            "1.flac",
            "cover.jpg",
            "b/4.FLA",
        ]);
        let (catalog, summary) = scan(&volume);
        assert_eq!(paths(&catalog), ["1.flac", "b/4.FLA", "a/2.flac", "b/deep/3.flac"]);
        assert_eq!(summary.tracks, 4);
        assert_eq!(summary.folders, 4);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn rescan_replaces_contents() {
        let volume = MockVolume::with_files(&["1.flac"]);
        let (mut catalog, _) = scan(&volume);
        volume.add_file("2.flac");
        let mut v = volume.clone();
        catalog.scan(&mut v);
        assert_eq!(paths(&catalog), ["1.flac", "2.flac"]);
    }

    #[test]
    fn depth_limit_skips_deeper_folders_but_keeps_their_siblings_tracks() {
        let mut deep = String::new();
        for _ in 1..=MAX_FOLDER_DEPTH {
            deep.push_str("d/");
        }
        deep.push_str("lost.flac");
        let mut kept = String::new();
        for _ in 1..MAX_FOLDER_DEPTH {
            kept.push_str("d/");
        }
        kept.push_str("kept.flac");
        let volume = MockVolume::with_files(&[deep.as_str(), kept.as_str()]);

        let (catalog, summary) = scan(&volume);
        assert_eq!(paths(&catalog), [kept]);
        assert_eq!(summary.folders, usize::from(MAX_FOLDER_DEPTH));
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn limits_skip_extra_entries() {
        let volume = MockVolume::with_files(&[]);
        for i in 0..MAX_FOLDERS {
            volume.add_folder(&format!("f{i}"));
        }
        for i in 0..=MAX_TRACKS {
            volume.add_file(&format!("t{i}.flac"));
        }
        let (catalog, summary) = scan(&volume);
        assert_eq!(catalog.folder_count(), MAX_FOLDERS);
        assert_eq!(catalog.track_count(), MAX_TRACKS);
        assert_eq!(summary.skipped, 2);
    }

    #[test]
    fn disconnected_volume_yields_empty_catalog() {
        let volume = MockVolume::with_files(&["1.flac"]);
        let mut unmounted = volume.clone();
        let mut catalog = Box::new(Catalog::new());
        let summary = catalog.scan(&mut unmounted);
        assert!(catalog.is_empty());
        assert_eq!(summary.unreadable, 1);
    }

    #[test]
    fn open_track_uses_rebuilt_path() {
        let volume = MockVolume::with_files(&["x/y.flac"]);
        let (catalog, _) = scan(&volume);
        let mut v = volume.clone();
        let file = catalog.open_track(&mut v, crate::TrackId::FIRST).unwrap();
        assert_eq!(file.path(), "x/y.flac");
        assert_eq!(volume.open_handles(), 1);
        drop(file);
        assert_eq!(volume.open_handles(), 0);
    }
}
