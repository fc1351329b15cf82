//! Virtual file store for one project
//!
//! Files are a flat list of [`FileRecord`]s. Folders are derived from path
//! prefixes through a [`FileTree`] built on demand, and a folder that must
//! exist without real children is kept alive by a `.gitkeep` placeholder.
//!
//! Every structural change runs against a staged copy of the file set. The
//! staged copy is persisted first and only then committed, so a failed write
//! leaves the in-memory state exactly as it was.

mod tree;

use std::collections::{HashMap, HashSet};

use appforge_core::paths::{self, PLACEHOLDER_NAME};
use appforge_core::prelude::*;
use appforge_core::{FileKind, FileRecord};
use appforge_store::{keys, JsonStoreExt, KeyValueStore, SharedStore};

pub use tree::{FileTree, FolderNode};

// ─────────────────────────────────────────────────────────────────────────────
// File Set
// ─────────────────────────────────────────────────────────────────────────────

/// Records plus the editor pointers that refer into them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct FileSet {
    files: Vec<FileRecord>,
    current_file: Option<String>,
    main_preview_file: Option<String>,
}

impl FileSet {
    fn tree(&self) -> FileTree {
        FileTree::build(&self.files)
    }

    fn position(&self, path: &str) -> Option<usize> {
        self.files.iter().position(|r| r.path == path)
    }

    fn has_record(&self, path: &str) -> bool {
        self.position(path).is_some()
    }

    fn real_file_index(&self, path: &str) -> Result<usize> {
        self.position(path)
            .filter(|&idx| !self.files[idx].is_placeholder())
            .ok_or_else(|| Error::file_not_found(path))
    }

    fn is_real_file(&self, path: &str) -> bool {
        self.real_file_index(path).is_ok()
    }

    fn first_real_file(&self) -> Option<String> {
        self.files
            .iter()
            .find(|r| !r.is_placeholder())
            .map(|r| r.path.clone())
    }

    fn is_free(&self, tree: &FileTree, path: &str) -> bool {
        !self.has_record(path) && !tree.contains_folder(path)
    }

    /// Check that `path` can be taken by a new file or folder
    fn ensure_free(&self, tree: &FileTree, path: &str) -> Result<()> {
        if !self.is_free(tree, path) {
            return Err(Error::already_exists(path));
        }
        if let Some(file) = paths::ancestors(path)
            .into_iter()
            .find(|ancestor| self.has_record(ancestor))
        {
            return Err(Error::invalid_path(path, format!("'{}' is a file", file)));
        }
        Ok(())
    }

    /// First free path produced by `candidate(0)`, `candidate(1)`, ...
    fn first_free(&self, tree: &FileTree, candidate: impl Fn(usize) -> String) -> String {
        let mut n = 0;
        loop {
            let path = candidate(n);
            if self.is_free(tree, &path) {
                return path;
            }
            n += 1;
        }
    }

    /// Move both editor pointers through `map` where it yields a new path
    fn repoint(&mut self, map: impl Fn(&str) -> Option<String>) {
        for pointer in [&mut self.current_file, &mut self.main_preview_file] {
            if let Some(moved) = pointer.as_deref().and_then(&map) {
                *pointer = Some(moved);
            }
        }
    }

    /// Drop pointers whose file no longer exists
    fn fix_pointers(&mut self) {
        if self
            .current_file
            .as_deref()
            .is_some_and(|p| !self.is_real_file(p))
        {
            self.current_file = self.first_real_file();
        }
        if self
            .main_preview_file
            .as_deref()
            .is_some_and(|p| !self.is_real_file(p))
        {
            self.main_preview_file = None;
        }
    }

    /// Rewrite every path under `node` to live under `new_prefix`
    fn rebase_subtree(&mut self, node: &FolderNode, new_prefix: &str) {
        let moves: HashMap<String, String> = node
            .descendant_paths()
            .into_iter()
            .filter_map(|old| paths::rebase(&old, &node.path, new_prefix).map(|new| (old, new)))
            .collect();

        for record in &mut self.files {
            if let Some(new) = moves.get(&record.path) {
                record.path = new.clone();
            }
        }
        self.repoint(|p| moves.get(p).cloned());
    }
}

fn copy_file_name(name: &str, n: usize) -> String {
    let suffix = copy_suffix(n);
    match paths::split_extension(name) {
        (stem, Some(ext)) => format!("{}{}.{}", stem, suffix, ext),
        (stem, None) => format!("{}{}", stem, suffix),
    }
}

fn copy_suffix(n: usize) -> String {
    if n == 0 {
        "_copy".to_string()
    } else {
        format!("_copy_{}", n)
    }
}

fn reject_placeholder_name(path: &str) -> Result<()> {
    if paths::is_placeholder(path) {
        return Err(Error::validation(format!(
            "'{}' is reserved for empty folders",
            PLACEHOLDER_NAME
        )));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Virtual File Store
// ─────────────────────────────────────────────────────────────────────────────

/// The authoritative file list of one project
#[derive(Debug)]
pub struct VirtualFileStore {
    store: SharedStore,
    project_id: String,
    state: FileSet,
    dirty: bool,
}

impl VirtualFileStore {
    /// Load a project's files, falling back to the pre-project legacy keys
    pub fn open(store: SharedStore, project_id: impl Into<String>) -> Self {
        let project_id = project_id.into();
        let files = sanitize(load_files(&*store, &project_id));
        let current_file = load_pointer(
            &*store,
            &keys::current_file(&project_id),
            keys::LEGACY_CURRENT_FILE,
        );
        let main_preview_file = load_pointer(
            &*store,
            &keys::main_preview_file(&project_id),
            keys::LEGACY_MAIN_PREVIEW_FILE,
        );

        let mut state = FileSet {
            files,
            current_file,
            main_preview_file,
        };
        state.fix_pointers();
        debug!(
            "Opened file store for {} ({} records)",
            project_id,
            state.files.len()
        );

        Self {
            store,
            project_id,
            state,
            dirty: false,
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// All records in insertion order, placeholders included
    pub fn records(&self) -> &[FileRecord] {
        &self.state.files
    }

    pub fn current_file(&self) -> Option<&str> {
        self.state.current_file.as_deref()
    }

    pub fn main_preview_file(&self) -> Option<&str> {
        self.state.main_preview_file.as_deref()
    }

    pub fn tree(&self) -> FileTree {
        self.state.tree()
    }

    /// Whether file contents or paths changed since the last call
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Run `op` on a staged copy, persist it, then commit
    fn stage<T>(&mut self, op: impl FnOnce(&mut FileSet) -> Result<T>) -> Result<T> {
        let mut staged = self.state.clone();
        let value = op(&mut staged)?;
        if staged != self.state {
            self.persist(&staged)?;
            self.dirty |= staged.files != self.state.files;
            self.state = staged;
        }
        Ok(value)
    }

    /// Write every changed key, restoring the earlier values if any write fails
    fn persist(&self, staged: &FileSet) -> Result<()> {
        let mut touched = Vec::new();
        let result = self.persist_keys(staged, &mut touched);
        if result.is_err() {
            self.restore(touched);
        }
        result
    }

    fn persist_keys(
        &self,
        staged: &FileSet,
        touched: &mut Vec<(String, Option<Vec<u8>>)>,
    ) -> Result<()> {
        if staged.files != self.state.files {
            let key = keys::project_files(&self.project_id);
            touched.push((key.clone(), self.store.get(&key)?));
            self.store.write_json(&key, &staged.files)?;
        }
        if staged.current_file != self.state.current_file {
            let key = keys::current_file(&self.project_id);
            touched.push((key.clone(), self.store.get(&key)?));
            persist_pointer(&*self.store, &key, staged.current_file.as_deref())?;
        }
        if staged.main_preview_file != self.state.main_preview_file {
            let key = keys::main_preview_file(&self.project_id);
            touched.push((key.clone(), self.store.get(&key)?));
            persist_pointer(&*self.store, &key, staged.main_preview_file.as_deref())?;
        }
        Ok(())
    }

    fn restore(&self, touched: Vec<(String, Option<Vec<u8>>)>) {
        for (key, previous) in touched.into_iter().rev() {
            let restored = match previous {
                Some(bytes) => self.store.set(&key, &bytes),
                None => self.store.remove(&key),
            };
            if let Err(e) = restored {
                warn!("Failed to restore {} after a failed write: {}", key, e);
            }
        }
    }

    // ─────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────

    /// Create a file; `kind` is derived from the extension when `None`.
    ///
    /// Becomes the current file when no file is open.
    pub fn create_file(
        &mut self,
        path: &str,
        content: impl Into<String>,
        kind: Option<FileKind>,
    ) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        reject_placeholder_name(&path)?;
        let record = match kind {
            Some(kind) => FileRecord::with_kind(&path, content, kind),
            None => FileRecord::new(&path, content),
        };

        self.stage(|set| {
            set.ensure_free(&set.tree(), &record.path)?;
            if set.current_file.is_none() {
                set.current_file = Some(record.path.clone());
            }
            set.files.push(record);
            Ok(())
        })?;

        debug!("Created file {}", path);
        Ok(path)
    }

    /// Look up a real file
    pub fn read_file(&self, path: &str) -> Result<&FileRecord> {
        let path = paths::normalize_entry(path)?;
        let idx = self.state.real_file_index(&path)?;
        Ok(&self.state.files[idx])
    }

    /// Replace a file's content
    pub fn write_content(&mut self, path: &str, content: impl Into<String>) -> Result<()> {
        let path = paths::normalize_entry(path)?;
        let content = content.into();
        self.stage(|set| {
            let idx = set.real_file_index(&path)?;
            set.files[idx].content = content;
            Ok(())
        })
    }

    /// Rename a file; the editor pointers follow it
    pub fn rename_file(&mut self, old_path: &str, new_path: &str) -> Result<String> {
        let old = paths::normalize_entry(old_path)?;
        let new = paths::normalize_entry(new_path)?;
        reject_placeholder_name(&new)?;

        self.stage(|set| {
            let idx = set.real_file_index(&old)?;
            if old == new {
                return Ok(());
            }
            set.ensure_free(&set.tree(), &new)?;
            set.files[idx].path = new.clone();
            set.repoint(|p| (p == old).then(|| new.clone()));
            Ok(())
        })?;

        info!("Renamed file {} -> {}", old, new);
        Ok(new)
    }

    /// Delete one file
    pub fn delete_file(&mut self, path: &str) -> Result<()> {
        let path = paths::normalize_entry(path)?;
        self.stage(|set| {
            let idx = set.real_file_index(&path)?;
            set.files.remove(idx);
            set.fix_pointers();
            Ok(())
        })?;
        info!("Deleted file {}", path);
        Ok(())
    }

    /// Copy a file to the first free `_copy`, `_copy_1`, ... sibling name
    pub fn duplicate_file(&mut self, path: &str) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        let copy = self.stage(|set| {
            let idx = set.real_file_index(&path)?;
            let folder = paths::parent(&path);
            let name = paths::file_name(&path);
            let target =
                set.first_free(&set.tree(), |n| paths::join(folder, &copy_file_name(name, n)));

            let mut record = set.files[idx].clone();
            record.path = target.clone();
            set.files.insert(idx + 1, record);
            Ok(target)
        })?;
        info!("Duplicated file {} -> {}", path, copy);
        Ok(copy)
    }

    /// Move a file into another folder (`""` for the root)
    pub fn move_file(&mut self, path: &str, target_folder: &str) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        let target_folder = paths::normalize(target_folder)?;

        let moved = self.stage(|set| {
            let idx = set.real_file_index(&path)?;
            let tree = set.tree();
            if !tree.contains_folder(&target_folder) {
                return Err(Error::folder_not_found(&target_folder));
            }
            let new = paths::join(&target_folder, paths::file_name(&path));
            if new == path {
                return Ok(new);
            }
            set.ensure_free(&tree, &new)?;
            set.files[idx].path = new.clone();
            set.repoint(|p| (p == path).then(|| new.clone()));
            Ok(new)
        })?;

        if moved != path {
            info!("Moved file {} -> {}", path, moved);
        }
        Ok(moved)
    }

    // ─────────────────────────────────────────────────────────
    // Folders
    // ─────────────────────────────────────────────────────────

    /// Create an empty folder by writing its placeholder record
    pub fn create_folder(&mut self, path: &str) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        reject_placeholder_name(&path)?;
        self.stage(|set| {
            set.ensure_free(&set.tree(), &path)?;
            set.files.push(FileRecord::placeholder(&path));
            Ok(())
        })?;
        debug!("Created folder {}", path);
        Ok(path)
    }

    /// Rename a folder, rewriting every descendant path
    pub fn rename_folder(&mut self, old_path: &str, new_path: &str) -> Result<String> {
        let old = paths::normalize_entry(old_path)?;
        let new = paths::normalize_entry(new_path)?;
        reject_placeholder_name(&new)?;

        self.stage(|set| {
            let tree = set.tree();
            let node = tree
                .folder(&old)
                .ok_or_else(|| Error::folder_not_found(&old))?;
            if old == new {
                return Ok(());
            }
            if paths::is_inside(&new, &old) {
                return Err(Error::invalid_move(
                    &old,
                    &new,
                    "destination is inside the folder",
                ));
            }
            set.ensure_free(&tree, &new)?;
            set.rebase_subtree(node, &new);
            Ok(())
        })?;

        info!("Renamed folder {} -> {}", old, new);
        Ok(new)
    }

    /// Delete a folder and everything beneath it; returns the records removed
    pub fn delete_folder(&mut self, path: &str) -> Result<usize> {
        let path = paths::normalize_entry(path)?;
        let removed = self.stage(|set| {
            let tree = set.tree();
            let node = tree
                .folder(&path)
                .ok_or_else(|| Error::folder_not_found(&path))?;
            let doomed: HashSet<String> = node.descendant_paths().into_iter().collect();

            let before = set.files.len();
            set.files.retain(|r| !doomed.contains(&r.path));
            set.fix_pointers();
            Ok(before - set.files.len())
        })?;
        info!("Deleted folder {} ({} records)", path, removed);
        Ok(removed)
    }

    /// Copy a folder to the first free `_copy`, `_copy_1`, ... sibling
    pub fn duplicate_folder(&mut self, path: &str) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        let copy = self.stage(|set| {
            let tree = set.tree();
            let node = tree
                .folder(&path)
                .ok_or_else(|| Error::folder_not_found(&path))?;
            let parent = paths::parent(&path);
            let name = node.name();
            let target = set.first_free(&tree, |n| {
                paths::join(parent, &format!("{}{}", name, copy_suffix(n)))
            });

            let sources: HashSet<String> = node.descendant_paths().into_iter().collect();
            let copies: Vec<FileRecord> = set
                .files
                .iter()
                .filter(|r| sources.contains(&r.path))
                .filter_map(|r| {
                    paths::rebase(&r.path, &path, &target).map(|new| FileRecord {
                        path: new,
                        ..r.clone()
                    })
                })
                .collect();
            set.files.extend(copies);
            Ok(target)
        })?;
        info!("Duplicated folder {} -> {}", path, copy);
        Ok(copy)
    }

    /// Move a folder under another folder (`""` for the root)
    pub fn move_folder(&mut self, path: &str, target_folder: &str) -> Result<String> {
        let path = paths::normalize_entry(path)?;
        let target_folder = paths::normalize(target_folder)?;

        let moved = self.stage(|set| {
            let tree = set.tree();
            let node = tree
                .folder(&path)
                .ok_or_else(|| Error::folder_not_found(&path))?;
            if !tree.contains_folder(&target_folder) {
                return Err(Error::folder_not_found(&target_folder));
            }
            if paths::is_same_or_inside(&target_folder, &path) {
                return Err(Error::invalid_move(
                    &path,
                    &target_folder,
                    "a folder cannot be moved into itself",
                ));
            }
            let new = paths::join(&target_folder, node.name());
            if new == path {
                return Ok(new);
            }
            set.ensure_free(&tree, &new)?;
            set.rebase_subtree(node, &new);
            Ok(new)
        })?;

        if moved != path {
            info!("Moved folder {} -> {}", path, moved);
        }
        Ok(moved)
    }

    // ─────────────────────────────────────────────────────────
    // Views and pointers
    // ─────────────────────────────────────────────────────────

    /// Every derived folder, sorted
    pub fn list_folders(&self) -> Vec<String> {
        self.state.tree().folder_paths()
    }

    /// Real files sorted by path, optionally filtered by a case-insensitive
    /// substring of the path
    pub fn list_files(&self, filter: Option<&str>) -> Vec<&FileRecord> {
        let needle = filter
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_lowercase);

        let mut files: Vec<&FileRecord> = self
            .state
            .files
            .iter()
            .filter(|r| !r.is_placeholder())
            .filter(|r| match &needle {
                Some(needle) => r.path.to_lowercase().contains(needle.as_str()),
                None => true,
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        files
    }

    /// Point the editor at a file, or clear it with `None`
    pub fn set_current_file(&mut self, path: Option<&str>) -> Result<()> {
        let path = path.map(paths::normalize_entry).transpose()?;
        self.stage(|set| {
            if let Some(path) = &path {
                set.real_file_index(path)?;
            }
            set.current_file = path;
            Ok(())
        })
    }

    /// Choose the file rendered by the preview, or clear it with `None`
    pub fn set_main_preview_file(&mut self, path: Option<&str>) -> Result<()> {
        let path = path.map(paths::normalize_entry).transpose()?;
        self.stage(|set| {
            if let Some(path) = &path {
                set.real_file_index(path)?;
            }
            set.main_preview_file = path;
            Ok(())
        })
    }

    /// Write a batch of records, replacing files with the same path and
    /// keeping every other file
    ///
    /// When no main preview is chosen yet, `preview` becomes it if it names
    /// one of the resulting files. Files and pointers are persisted together.
    pub fn replace_all(
        &mut self,
        records: Vec<FileRecord>,
        preview: Option<&str>,
    ) -> Result<usize> {
        let preview = preview.map(paths::normalize_entry).transpose()?;
        let records = records
            .into_iter()
            .map(|mut record| {
                record.path = paths::normalize_entry(&record.path)?;
                reject_placeholder_name(&record.path)?;
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;
        let count = records.len();

        self.stage(|set| {
            for record in records {
                match set.position(&record.path) {
                    Some(idx) => set.files[idx] = record,
                    None => {
                        set.ensure_free(&set.tree(), &record.path)?;
                        set.files.push(record);
                    }
                }
            }
            if set.current_file.is_none() {
                set.current_file = set.first_real_file();
            }
            if set.main_preview_file.is_none() {
                set.main_preview_file = preview.filter(|path| set.is_real_file(path));
            }
            Ok(())
        })?;

        debug!("Wrote {} generated files into {}", count, self.project_id);
        Ok(count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

fn load_files(store: &dyn KeyValueStore, project_id: &str) -> Vec<FileRecord> {
    let key = keys::project_files(project_id);
    if let Some(files) = store.load_or_discard::<Vec<FileRecord>>(&key) {
        return files;
    }

    match store.load_or_discard::<Vec<FileRecord>>(keys::LEGACY_PROJECT_FILES) {
        Some(files) => {
            info!(
                "Migrating {} legacy files into project {}",
                files.len(),
                project_id
            );
            if let Err(e) = store.write_json(&key, &files) {
                warn!("Failed to migrate legacy files for {}: {}", project_id, e);
            }
            files
        }
        None => Vec::new(),
    }
}

fn load_pointer(store: &dyn KeyValueStore, key: &str, legacy_key: &str) -> Option<String> {
    if let Some(value) = store.read_string(key) {
        return Some(value).filter(|v| !v.is_empty());
    }

    let legacy = store.read_string(legacy_key).filter(|v| !v.is_empty())?;
    if let Err(e) = store.write_string(key, &legacy) {
        warn!("Failed to migrate legacy key {}: {}", legacy_key, e);
    }
    Some(legacy)
}

fn persist_pointer(store: &dyn KeyValueStore, key: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => store.write_string(key, value),
        None => store.remove(key),
    }
}

/// Drop records with unusable or duplicate paths from loaded data
fn sanitize(files: Vec<FileRecord>) -> Vec<FileRecord> {
    let mut seen = HashSet::new();
    files
        .into_iter()
        .filter_map(|mut record| match paths::normalize_entry(&record.path) {
            Ok(path) if seen.insert(path.clone()) => {
                record.path = path;
                Some(record)
            }
            Ok(path) => {
                warn!("Dropping duplicate file record {}", path);
                None
            }
            Err(e) => {
                warn!("Dropping file record: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::ErrorCategory;
    use appforge_store::MemoryStore;
    use std::sync::Arc;

    const PROJECT: &str = "project_1_abc";

    fn open(paths: &[&str]) -> (SharedStore, VirtualFileStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut vfs = VirtualFileStore::open(store.clone(), PROJECT);
        for path in paths {
            vfs.create_file(path, format!("content of {}", path), None)
                .unwrap();
        }
        vfs.take_dirty();
        (store, vfs)
    }

    fn file_paths(vfs: &VirtualFileStore) -> Vec<String> {
        vfs.list_files(None).iter().map(|r| r.path.clone()).collect()
    }

    fn persisted_paths(store: &SharedStore) -> Vec<String> {
        let mut files: Vec<String> = store
            .load_or_default::<Vec<FileRecord>>(&keys::project_files(PROJECT))
            .into_iter()
            .map(|r| r.path)
            .collect();
        files.sort();
        files
    }

    fn used_bytes(store: &SharedStore) -> usize {
        store
            .keys()
            .unwrap()
            .iter()
            .map(|key| key.len() + store.get(key).unwrap().unwrap().len())
            .sum()
    }

    /// Copy every entry of `store` into a store limited to `capacity` bytes
    fn bounded_copy(store: &SharedStore, capacity: usize) -> SharedStore {
        let bounded: SharedStore = Arc::new(MemoryStore::with_capacity(capacity));
        for key in store.keys().unwrap() {
            bounded.set(&key, &store.get(&key).unwrap().unwrap()).unwrap();
        }
        bounded
    }

    fn assert_unique(vfs: &VirtualFileStore) {
        let mut seen = HashSet::new();
        for record in vfs.records() {
            assert!(seen.insert(record.path.clone()), "duplicate {}", record.path);
        }
    }

    // ─────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_create_file_derives_kind_and_persists() {
        let (store, mut vfs) = open(&[]);
        let path = vfs.create_file("/src/app.js", "let x = 1;", None).unwrap();

        assert_eq!(path, "src/app.js");
        assert_eq!(vfs.read_file("src/app.js").unwrap().kind, FileKind::Js);
        assert_eq!(vfs.current_file(), Some("src/app.js"));
        assert!(vfs.take_dirty());
        assert!(!vfs.take_dirty());
        assert_eq!(persisted_paths(&store), vec!["src/app.js"]);
    }

    #[test]
    fn test_create_file_with_explicit_kind() {
        let (_, mut vfs) = open(&[]);
        vfs.create_file("logo", "data:image/png;base64,AAAA", Some(FileKind::Image))
            .unwrap();
        assert_eq!(vfs.read_file("logo").unwrap().kind, FileKind::Image);
    }

    #[test]
    fn test_create_file_rejects_existing_paths() {
        let (_, mut vfs) = open(&["index.html", "src/app.js"]);

        let err = vfs.create_file("index.html", "", None).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        // Path already used by a folder
        let err = vfs.create_file("src", "", None).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        // Ancestor is a file
        let err = vfs.create_file("index.html/inner.txt", "", None).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { .. }));

        assert!(vfs.create_file(".gitkeep", "", None).is_err());
        assert!(vfs.create_file("a/../b", "", None).is_err());
        assert_eq!(file_paths(&vfs), vec!["index.html", "src/app.js"]);
    }

    #[test]
    fn test_write_content_marks_dirty() {
        let (store, mut vfs) = open(&["index.html"]);
        vfs.write_content("index.html", "<h1>Hi</h1>").unwrap();
        assert!(vfs.take_dirty());

        let reopened = VirtualFileStore::open(store, PROJECT);
        assert_eq!(reopened.read_file("index.html").unwrap().content, "<h1>Hi</h1>");

        let err = vfs.write_content("missing.txt", "x").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_rename_file_onto_existing_fails_and_changes_nothing() {
        let (_, mut vfs) = open(&["a/b.txt", "a/c.txt"]);
        let err = vfs.rename_file("a/b.txt", "a/c.txt").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        assert_eq!(file_paths(&vfs), vec!["a/b.txt", "a/c.txt"]);
        assert_eq!(vfs.read_file("a/c.txt").unwrap().content, "content of a/c.txt");
        assert!(!vfs.take_dirty());
    }

    #[test]
    fn test_rename_file_moves_pointers() {
        let (_, mut vfs) = open(&["index.html", "about.html"]);
        vfs.set_current_file(Some("about.html")).unwrap();
        vfs.set_main_preview_file(Some("about.html")).unwrap();

        vfs.rename_file("about.html", "pages/about.html").unwrap();

        assert_eq!(vfs.current_file(), Some("pages/about.html"));
        assert_eq!(vfs.main_preview_file(), Some("pages/about.html"));
        assert_eq!(file_paths(&vfs), vec!["index.html", "pages/about.html"]);
    }

    #[test]
    fn test_rename_file_to_same_path_is_noop() {
        let (_, mut vfs) = open(&["index.html"]);
        assert_eq!(vfs.rename_file("index.html", "/index.html/").unwrap(), "index.html");
        assert!(!vfs.take_dirty());
    }

    #[test]
    fn test_rename_missing_file() {
        let (_, mut vfs) = open(&["index.html"]);
        let err = vfs.rename_file("nope.html", "x.html").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_delete_file_falls_back_current_pointer() {
        let (_, mut vfs) = open(&["index.html", "style.css"]);
        vfs.set_current_file(Some("index.html")).unwrap();

        vfs.delete_file("index.html").unwrap();
        assert_eq!(vfs.current_file(), Some("style.css"));

        vfs.delete_file("style.css").unwrap();
        assert_eq!(vfs.current_file(), None);
        assert!(vfs.list_files(None).is_empty());
    }

    #[test]
    fn test_delete_file_skips_placeholders_in_fallback() {
        let (_, mut vfs) = open(&[]);
        vfs.create_folder("empty").unwrap();
        vfs.create_file("only.txt", "", None).unwrap();
        vfs.delete_file("only.txt").unwrap();
        assert_eq!(vfs.current_file(), None);
        assert_eq!(vfs.list_folders(), vec!["empty"]);
    }

    #[test]
    fn test_duplicate_file_picks_first_free_name() {
        let (_, mut vfs) = open(&["src/app.js"]);

        assert_eq!(vfs.duplicate_file("src/app.js").unwrap(), "src/app_copy.js");
        assert_eq!(vfs.duplicate_file("src/app.js").unwrap(), "src/app_copy_1.js");
        assert_eq!(vfs.duplicate_file("src/app.js").unwrap(), "src/app_copy_2.js");
        assert_eq!(
            vfs.read_file("src/app_copy_1.js").unwrap().content,
            "content of src/app.js"
        );
        assert_unique(&vfs);
    }

    #[test]
    fn test_duplicate_file_without_extension() {
        let (_, mut vfs) = open(&["Makefile", ".env"]);
        assert_eq!(vfs.duplicate_file("Makefile").unwrap(), "Makefile_copy");
        assert_eq!(vfs.duplicate_file(".env").unwrap(), ".env_copy");
    }

    #[test]
    fn test_duplicate_file_skips_folder_names() {
        let (_, mut vfs) = open(&["notes", "notes_copy/inner.txt"]);
        assert_eq!(vfs.duplicate_file("notes").unwrap(), "notes_copy_1");
    }

    #[test]
    fn test_move_file() {
        let (_, mut vfs) = open(&["index.html", "src/app.js", "lib/app.js"]);

        assert_eq!(vfs.move_file("index.html", "src").unwrap(), "src/index.html");
        assert_eq!(vfs.current_file(), Some("src/index.html"));

        // Already in that folder
        assert_eq!(vfs.move_file("src/index.html", "/src/").unwrap(), "src/index.html");

        // Collision at the destination
        let err = vfs.move_file("lib/app.js", "src").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        // Destination folder must exist
        let err = vfs.move_file("lib/app.js", "nowhere").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        assert_eq!(vfs.move_file("lib/app.js", "").unwrap(), "app.js");
        assert_eq!(file_paths(&vfs), vec!["app.js", "src/app.js", "src/index.html"]);
    }

    // ─────────────────────────────────────────────────────────
    // Folders
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_create_folder_uses_placeholder() {
        let (store, mut vfs) = open(&["src/app.js"]);
        vfs.create_folder("assets/images").unwrap();

        assert_eq!(vfs.list_folders(), vec!["assets", "assets/images", "src"]);
        assert_eq!(file_paths(&vfs), vec!["src/app.js"]);
        assert!(persisted_paths(&store).contains(&"assets/images/.gitkeep".to_string()));

        let err = vfs.create_folder("src").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        let err = vfs.create_folder("src/app.js").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert!(vfs.create_folder("/").is_err());
    }

    #[test]
    fn test_rename_folder_rewrites_only_descendants() {
        let (_, mut vfs) = open(&[
            "src/app.js",
            "src/lib/util.js",
            "srcx/other.js",
            "index.html",
        ]);
        vfs.set_current_file(Some("src/lib/util.js")).unwrap();

        vfs.rename_folder("src", "app").unwrap();

        assert_eq!(
            file_paths(&vfs),
            vec!["app/app.js", "app/lib/util.js", "index.html", "srcx/other.js"]
        );
        assert_eq!(vfs.current_file(), Some("app/lib/util.js"));
        assert_eq!(vfs.list_folders(), vec!["app", "app/lib", "srcx"]);
    }

    #[test]
    fn test_rename_folder_failures() {
        let (_, mut vfs) = open(&["a/x.txt", "b/y.txt", "c.txt"]);

        let err = vfs.rename_folder("missing", "z").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);

        let err = vfs.rename_folder("a", "b").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        let err = vfs.rename_folder("a", "c.txt").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        let err = vfs.rename_folder("a", "a/inner").unwrap_err();
        assert!(matches!(err, Error::InvalidMove { .. }));

        assert_eq!(file_paths(&vfs), vec!["a/x.txt", "b/y.txt", "c.txt"]);
    }

    #[test]
    fn test_rename_folder_keeps_placeholders() {
        let (_, mut vfs) = open(&[]);
        vfs.create_folder("empty/deep").unwrap();
        vfs.rename_folder("empty", "full").unwrap();
        assert_eq!(vfs.list_folders(), vec!["full", "full/deep"]);
    }

    #[test]
    fn test_delete_folder_removes_exactly_descendants() {
        let (_, mut vfs) = open(&["x/y.txt", "x/z/w.txt", "xy.txt", "other/x.txt"]);
        vfs.set_current_file(Some("x/z/w.txt")).unwrap();

        assert_eq!(vfs.delete_folder("x").unwrap(), 2);

        assert_eq!(file_paths(&vfs), vec!["other/x.txt", "xy.txt"]);
        assert_eq!(vfs.list_folders(), vec!["other"]);
        assert_eq!(vfs.current_file(), Some("xy.txt"));

        let err = vfs.delete_folder("x").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_duplicate_folder() {
        let (_, mut vfs) = open(&["site/index.html", "site/css/main.css"]);

        assert_eq!(vfs.duplicate_folder("site").unwrap(), "site_copy");
        assert_eq!(vfs.duplicate_folder("site").unwrap(), "site_copy_1");

        assert_eq!(
            file_paths(&vfs),
            vec![
                "site/css/main.css",
                "site/index.html",
                "site_copy/css/main.css",
                "site_copy/index.html",
                "site_copy_1/css/main.css",
                "site_copy_1/index.html",
            ]
        );
        assert_eq!(
            vfs.read_file("site_copy/index.html").unwrap().content,
            "content of site/index.html"
        );
        assert_unique(&vfs);
    }

    #[test]
    fn test_duplicate_empty_folder_keeps_placeholder() {
        let (_, mut vfs) = open(&[]);
        vfs.create_folder("src/empty").unwrap();
        let copy = vfs.duplicate_folder("src/empty").unwrap();

        assert_eq!(copy, "src/empty_copy");
        assert!(vfs.list_folders().contains(&"src/empty_copy".to_string()));
        assert!(vfs.list_files(None).is_empty());
    }

    #[test]
    fn test_move_folder() {
        let (_, mut vfs) = open(&["a/one.txt", "a/b/two.txt", "c/three.txt", "d/a/x.txt"]);

        let err = vfs.move_folder("a", "a/b").unwrap_err();
        assert!(matches!(err, Error::InvalidMove { .. }));
        let err = vfs.move_folder("a", "a").unwrap_err();
        assert!(matches!(err, Error::InvalidMove { .. }));

        // Destination already has a folder with that name
        let err = vfs.move_folder("a", "d").unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }));

        // Moving into the current parent is a no-op
        assert_eq!(vfs.move_folder("a/b", "a").unwrap(), "a/b");

        assert_eq!(vfs.move_folder("a", "c").unwrap(), "c/a");
        assert_eq!(
            file_paths(&vfs),
            vec!["c/a/b/two.txt", "c/a/one.txt", "c/three.txt", "d/a/x.txt"]
        );

        assert_eq!(vfs.move_folder("c/a/b", "").unwrap(), "b");
        assert!(vfs.list_folders().contains(&"b".to_string()));
    }

    // ─────────────────────────────────────────────────────────
    // Views
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_list_files_filter_is_case_insensitive() {
        let (_, mut vfs) = open(&["src/Button.js", "src/app.js", "README.md"]);
        vfs.create_folder("buttons").unwrap();

        let hits: Vec<&str> = vfs
            .list_files(Some("BUTTON"))
            .iter()
            .map(|r| r.path.as_str())
            .collect();
        assert_eq!(hits, vec!["src/Button.js"]);

        assert_eq!(vfs.list_files(Some("  ")).len(), 3);
    }

    #[test]
    fn test_replace_all_overwrites_and_keeps_rest() {
        let (_, mut vfs) = open(&["index.html", "notes.md"]);
        let written = vfs
            .replace_all(
                vec![
                    FileRecord::new("index.html", "<main></main>"),
                    FileRecord::new("styles.css", "body {}"),
                ],
                None,
            )
            .unwrap();

        assert_eq!(written, 2);
        assert_eq!(file_paths(&vfs), vec!["index.html", "notes.md", "styles.css"]);
        assert_eq!(vfs.read_file("index.html").unwrap().content, "<main></main>");
    }

    #[test]
    fn test_replace_all_picks_preview_only_when_unset() {
        let (_, mut vfs) = open(&[]);
        vfs.replace_all(
            vec![FileRecord::new("index.html", ""), FileRecord::new("app.js", "")],
            Some("/index.html"),
        )
        .unwrap();
        assert_eq!(vfs.main_preview_file(), Some("index.html"));
        assert_eq!(vfs.current_file(), Some("index.html"));

        vfs.set_main_preview_file(Some("app.js")).unwrap();
        vfs.replace_all(vec![FileRecord::new("index.html", "<p></p>")], Some("index.html"))
            .unwrap();
        assert_eq!(vfs.main_preview_file(), Some("app.js"));

        vfs.set_main_preview_file(None).unwrap();
        vfs.replace_all(Vec::new(), Some("missing.html")).unwrap();
        assert_eq!(vfs.main_preview_file(), None);
    }

    #[test]
    fn test_set_pointer_requires_existing_file() {
        let (_, mut vfs) = open(&["index.html"]);
        assert!(vfs.set_current_file(Some("missing.html")).is_err());
        assert!(vfs.set_main_preview_file(Some("missing.html")).is_err());
        vfs.set_current_file(None).unwrap();
        assert_eq!(vfs.current_file(), None);
    }

    #[test]
    fn test_path_set_stays_unique_across_operations() {
        let (_, mut vfs) = open(&["a.txt", "b.txt", "dir/c.txt"]);
        let _ = vfs.create_file("a.txt", "", None);
        let _ = vfs.rename_file("b.txt", "a.txt");
        let _ = vfs.rename_file("b.txt", "dir/c.txt");
        vfs.duplicate_file("a.txt").unwrap();
        let _ = vfs.rename_file("a_copy.txt", "a.txt");
        vfs.delete_file("a.txt").unwrap();
        vfs.rename_file("a_copy.txt", "a.txt").unwrap();
        vfs.duplicate_folder("dir").unwrap();
        let _ = vfs.move_folder("dir_copy", "");
        let _ = vfs.rename_folder("dir_copy", "dir");
        assert_unique(&vfs);
        assert_eq!(
            file_paths(&vfs),
            vec!["a.txt", "b.txt", "dir/c.txt", "dir_copy/c.txt"]
        );
    }

    // ─────────────────────────────────────────────────────────
    // Persistence
    // ─────────────────────────────────────────────────────────

    #[test]
    fn test_reopen_restores_files_and_pointers() {
        let (store, mut vfs) = open(&["index.html", "style.css"]);
        vfs.set_current_file(Some("style.css")).unwrap();
        vfs.set_main_preview_file(Some("index.html")).unwrap();

        let reopened = VirtualFileStore::open(store, PROJECT);
        assert_eq!(file_paths(&reopened), vec!["index.html", "style.css"]);
        assert_eq!(reopened.current_file(), Some("style.css"));
        assert_eq!(reopened.main_preview_file(), Some("index.html"));
    }

    #[test]
    fn test_storage_failure_leaves_state_unchanged() {
        let store: SharedStore = Arc::new(MemoryStore::with_capacity(200));
        let mut vfs = VirtualFileStore::open(store.clone(), PROJECT);
        vfs.create_file("a.txt", "small", None).unwrap();
        vfs.take_dirty();

        let err = vfs.create_file("b.txt", "x".repeat(500), None).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(file_paths(&vfs), vec!["a.txt"]);
        assert!(!vfs.take_dirty());

        let err = vfs.write_content("a.txt", "y".repeat(500)).unwrap_err();
        assert!(err.is_storage());
        assert_eq!(vfs.read_file("a.txt").unwrap().content, "small");
    }

    #[test]
    fn test_failed_pointer_write_restores_file_list() {
        let (store, vfs) = open(&["a.txt"]);
        assert_eq!(vfs.current_file(), Some("a.txt"));
        let store = bounded_copy(&store, used_bytes(&store) + 1);
        let mut vfs = VirtualFileStore::open(store.clone(), PROJECT);

        // The longer file list fits, the longer pointer does not
        let err = vfs.rename_file("a.txt", "ab.txt").unwrap_err();
        assert!(err.is_storage());
        assert_eq!(file_paths(&vfs), vec!["a.txt"]);
        assert_eq!(persisted_paths(&store), vec!["a.txt"]);

        let reopened = VirtualFileStore::open(store, PROJECT);
        assert_eq!(file_paths(&reopened), vec!["a.txt"]);
        assert_eq!(reopened.current_file(), Some("a.txt"));
    }

    #[test]
    fn test_replace_all_failure_persists_nothing() {
        let site = || {
            vec![
                FileRecord::new("index.html", "<h1>Hi</h1>"),
                FileRecord::new("styles.css", "h1 { color: teal; }"),
            ]
        };
        let (sizing, mut vfs) = open(&[]);
        vfs.replace_all(site(), Some("index.html")).unwrap();
        let needed = used_bytes(&sizing);

        // Everything but the last pointer fits
        let store: SharedStore = Arc::new(MemoryStore::with_capacity(needed - 1));
        let mut vfs = VirtualFileStore::open(store.clone(), PROJECT);
        let err = vfs.replace_all(site(), Some("index.html")).unwrap_err();

        assert!(err.is_storage());
        assert!(vfs.records().is_empty());
        assert_eq!(vfs.current_file(), None);
        assert_eq!(vfs.main_preview_file(), None);
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_keys_are_migrated() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .write_json(
                keys::LEGACY_PROJECT_FILES,
                &vec![FileRecord::new("index.html", "<p>old</p>")],
            )
            .unwrap();
        store.set(keys::LEGACY_CURRENT_FILE, b"index.html").unwrap();
        store
            .write_string(keys::LEGACY_MAIN_PREVIEW_FILE, "index.html")
            .unwrap();

        let vfs = VirtualFileStore::open(store.clone(), PROJECT);

        assert_eq!(file_paths(&vfs), vec!["index.html"]);
        assert_eq!(vfs.current_file(), Some("index.html"));
        assert_eq!(vfs.main_preview_file(), Some("index.html"));
        assert_eq!(persisted_paths(&store), vec!["index.html"]);
        assert_eq!(
            store.read_string(&keys::current_file(PROJECT)).as_deref(),
            Some("index.html")
        );
        // Legacy keys are left in place
        assert!(store.contains(keys::LEGACY_PROJECT_FILES).unwrap());
    }

    #[test]
    fn test_corrupt_files_key_is_discarded() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store.set(&keys::project_files(PROJECT), b"[{broken").unwrap();

        let vfs = VirtualFileStore::open(store.clone(), PROJECT);
        assert!(vfs.records().is_empty());
        assert!(!store.contains(&keys::project_files(PROJECT)).unwrap());
    }

    #[test]
    fn test_loaded_records_are_sanitized() {
        let store: SharedStore = Arc::new(MemoryStore::new());
        store
            .write_json(
                &keys::project_files(PROJECT),
                &vec![
                    FileRecord::new("/index.html", "1"),
                    FileRecord::new("index.html", "2"),
                    FileRecord::new("a/../b", "3"),
                ],
            )
            .unwrap();
        store
            .write_string(&keys::current_file(PROJECT), "gone.html")
            .unwrap();

        let vfs = VirtualFileStore::open(store, PROJECT);
        assert_eq!(file_paths(&vfs), vec!["index.html"]);
        assert_eq!(vfs.read_file("index.html").unwrap().content, "1");
        assert_eq!(vfs.current_file(), Some("index.html"));
    }
}
