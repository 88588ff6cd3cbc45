//! Filesystem picture collection.
//!
//! New entries are written to a hidden pending file next to their final
//! location and only become visible once [`MediaStore::publish`] renames
//! them into place, so a half-written photo never shows up in the library.

use super::StorageError;
use crate::image_ref::ImageRef;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Mode given to published photos; the pending file starts out as 0600.
#[cfg(unix)]
const PUBLISHED_MODE: u32 = 0o644;

/// Collection-relative path identifying an existing entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryId(PathBuf);

impl EntryId {
    pub fn relative_path(&self) -> &Path {
        &self.0
    }
}

/// An inserted entry whose content is still being written.
#[derive(Debug)]
pub struct PendingEntry {
    target: PathBuf,
    file: NamedTempFile,
}

impl PendingEntry {
    pub fn target(&self) -> &Path {
        &self.target
    }

    pub fn writer(&mut self) -> BufWriter<&mut fs::File> {
        BufWriter::new(self.file.as_file_mut())
    }
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reserve a unique file name inside `relative_dir` without creating it.
    pub fn reserve(
        &self,
        display_name: &str,
        relative_dir: &str,
    ) -> Result<PathBuf, StorageError> {
        let dir = self.collection_dir(relative_dir)?;
        Ok(unique_target(&dir, display_name))
    }

    /// Create a pending entry; it is invisible until published.
    pub fn insert(
        &self,
        display_name: &str,
        relative_dir: &str,
    ) -> Result<PendingEntry, StorageError> {
        let dir = self.collection_dir(relative_dir)?;
        let target = unique_target(&dir, display_name);
        let file = tempfile::Builder::new()
            .prefix(".pending-")
            .suffix(".tmp")
            .tempfile_in(&dir)
            .map_err(|source| StorageError::io(&dir, source))?;
        Ok(PendingEntry { target, file })
    }

    /// Flush the pending content and move it to its final name.
    pub fn publish(&self, mut entry: PendingEntry) -> Result<ImageRef, StorageError> {
        let target = entry.target.clone();
        entry
            .file
            .as_file_mut()
            .flush()
            .and_then(|()| entry.file.as_file().sync_all())
            .map_err(|source| StorageError::io(&target, source))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            entry
                .file
                .as_file()
                .set_permissions(fs::Permissions::from_mode(PUBLISHED_MODE))
                .map_err(|source| StorageError::io(&target, source))?;
        }
        entry
            .file
            .persist_noclobber(&target)
            .map_err(|err| StorageError::io(&target, err.error))?;
        log::debug!("published {}", target.display());
        Ok(ImageRef::from_path(&target))
    }

    /// Look a reference up in the collection; outside files have no id.
    pub fn entry_id(&self, reference: &ImageRef) -> Option<EntryId> {
        let root = fs::canonicalize(&self.root).ok()?;
        let path = fs::canonicalize(reference.to_path()).ok()?;
        if !path.is_file() {
            return None;
        }
        path.strip_prefix(&root)
            .ok()
            .map(|rel| EntryId(rel.to_path_buf()))
    }

    /// Canonical reference for an entry id.
    pub fn entry_uri(&self, id: &EntryId) -> ImageRef {
        ImageRef::from_path(&self.root.join(&id.0))
    }

    fn collection_dir(&self, relative_dir: &str) -> Result<PathBuf, StorageError> {
        let dir = if relative_dir.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative_dir)
        };
        fs::create_dir_all(&dir).map_err(|source| StorageError::io(&dir, source))?;
        Ok(dir)
    }
}

fn unique_target(dir: &Path, display_name: &str) -> PathBuf {
    let candidate = dir.join(display_name);
    if !candidate.exists() {
        return candidate;
    }
    let name = Path::new(display_name);
    let stem = name
        .file_stem()
        .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned());
    let ext = name
        .extension()
        .map(|s| format!(".{}", s.to_string_lossy()))
        .unwrap_or_default();
    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{stem} ({counter}){ext}"));
        if !candidate.exists() {
            return candidate;
        }
        counter = counter.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_entry_is_hidden_until_published() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = MediaStore::new(dir.path());
        let mut entry = store.insert("shot.jpg", "MyApp").expect("insert");
        let target = entry.target().to_path_buf();
        entry.writer().write_all(b"pixels").expect("write");
        assert!(!target.exists());

        let uri = store.publish(entry).expect("publish");
        assert_eq!(uri.to_path(), target);
        assert_eq!(fs::read(&target).expect("read"), b"pixels");
        let leftovers: Vec<_> = fs::read_dir(dir.path().join("MyApp"))
            .expect("list")
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().starts_with(".pending-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn dropped_pending_entry_leaves_nothing_behind() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = MediaStore::new(dir.path());
        let entry = store.insert("shot.jpg", "").expect("insert");
        drop(entry);
        assert_eq!(fs::read_dir(dir.path()).expect("list").count(), 0);
    }

    #[test]
    fn names_do_not_collide() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = MediaStore::new(dir.path());
        fs::write(dir.path().join("a.jpg"), b"x").expect("seed");
        let reserved = store.reserve("a.jpg", "").expect("reserve");
        assert_eq!(reserved, dir.path().join("a (1).jpg"));
    }

    #[test]
    fn entry_id_only_for_files_inside_collection() {
        let root = tempfile::tempdir().expect("root");
        let outside = tempfile::tempdir().expect("outside");
        let store = MediaStore::new(root.path());

        let inside_path = root.path().join("MyApp").join("p.jpg");
        fs::create_dir_all(inside_path.parent().expect("parent")).expect("mkdir");
        fs::write(&inside_path, b"x").expect("write");
        let outside_path = outside.path().join("p.jpg");
        fs::write(&outside_path, b"x").expect("write");

        let id = store
            .entry_id(&ImageRef::from_path(&inside_path))
            .expect("inside id");
        assert_eq!(id.relative_path(), Path::new("MyApp/p.jpg"));
        assert_eq!(
            fs::canonicalize(store.entry_uri(&id).to_path()).expect("canon"),
            fs::canonicalize(&inside_path).expect("canon")
        );
        assert!(store.entry_id(&ImageRef::from_path(&outside_path)).is_none());
        assert!(
            store
                .entry_id(&ImageRef::from_path(&root.path().join("missing.jpg")))
                .is_none()
        );
    }
}
