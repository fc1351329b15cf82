//! Folder tree derived from a flat list of file records
//!
//! Folders are never stored. A tree is rebuilt on demand from the record
//! paths, and folder operations read their subtree from it before rewriting
//! the affected paths in one batch.

use std::collections::{BTreeMap, BTreeSet};

use appforge_core::{paths, FileRecord};

/// One derived folder and everything beneath it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderNode {
    /// Full folder path; `""` for the root
    pub path: String,

    /// Child folders keyed by name
    pub folders: BTreeMap<String, FolderNode>,

    /// Names of real (non-placeholder) files directly in this folder
    pub files: BTreeSet<String>,

    /// Whether a placeholder record sits directly in this folder
    pub has_placeholder: bool,
}

impl FolderNode {
    fn child(path: String) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    /// Folder name (empty for the root)
    pub fn name(&self) -> &str {
        paths::file_name(&self.path)
    }

    /// Every record path beneath this folder, placeholders included
    pub fn descendant_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths(&self, out: &mut Vec<String>) {
        if self.has_placeholder {
            out.push(paths::placeholder_for(&self.path));
        }
        out.extend(self.files.iter().map(|name| paths::join(&self.path, name)));
        for folder in self.folders.values() {
            folder.collect_paths(out);
        }
    }

    fn insert(&mut self, segments: &[&str], is_placeholder: bool) {
        match segments {
            [] => {}
            [name] => {
                if is_placeholder {
                    self.has_placeholder = true;
                } else {
                    self.files.insert((*name).to_string());
                }
            }
            [folder, rest @ ..] => {
                let path = paths::join(&self.path, folder);
                self.folders
                    .entry((*folder).to_string())
                    .or_insert_with(|| FolderNode::child(path))
                    .insert(rest, is_placeholder);
            }
        }
    }

    fn render_into(&self, prefix: &str, out: &mut String) {
        let mut entries: Vec<(String, Option<&FolderNode>)> = self
            .folders
            .values()
            .map(|folder| (format!("{}/", folder.name()), Some(folder)))
            .collect();
        entries.extend(self.files.iter().map(|name| (name.clone(), None)));

        let count = entries.len();
        for (idx, (label, folder)) in entries.into_iter().enumerate() {
            let last = idx + 1 == count;
            out.push_str(prefix);
            out.push_str(if last { "└── " } else { "├── " });
            out.push_str(&label);
            out.push('\n');
            if let Some(folder) = folder {
                let nested = format!("{}{}", prefix, if last { "    " } else { "│   " });
                folder.render_into(&nested, out);
            }
        }
    }
}

/// Folder tree for one project's records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    root: FolderNode,
}

impl FileTree {
    pub fn build(records: &[FileRecord]) -> Self {
        let mut root = FolderNode::default();
        for record in records {
            let segments: Vec<&str> = record.path.split('/').collect();
            root.insert(&segments, record.is_placeholder());
        }
        Self { root }
    }

    pub fn root(&self) -> &FolderNode {
        &self.root
    }

    /// Look up a folder; `""` is the root and always exists
    pub fn folder(&self, path: &str) -> Option<&FolderNode> {
        if path.is_empty() {
            return Some(&self.root);
        }
        path.split('/')
            .try_fold(&self.root, |node, segment| node.folders.get(segment))
    }

    pub fn contains_folder(&self, path: &str) -> bool {
        self.folder(path).is_some()
    }

    /// Every derived folder path (root excluded), sorted
    pub fn folder_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        let mut stack: Vec<&FolderNode> = self.root.folders.values().collect();
        while let Some(node) = stack.pop() {
            out.push(node.path.clone());
            stack.extend(node.folders.values());
        }
        out.sort();
        out
    }

    /// Render an indented text view, folders before files
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.root.render_into("", &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::new(*p, "")).collect()
    }

    #[test]
    fn test_build_derives_folders() {
        let tree = FileTree::build(&records(&[
            "index.html",
            "src/app.js",
            "src/components/Button.js",
            "assets/.gitkeep",
        ]));

        assert_eq!(tree.folder_paths(), vec!["assets", "src", "src/components"]);
        assert!(tree.contains_folder(""));
        assert!(tree.contains_folder("src/components"));
        assert!(!tree.contains_folder("src/app.js"));
        assert!(!tree.contains_folder("missing"));

        let assets = tree.folder("assets").unwrap();
        assert!(assets.has_placeholder);
        assert!(assets.files.is_empty());
    }

    #[test]
    fn test_descendant_paths_include_placeholders() {
        let tree = FileTree::build(&records(&["x/y.txt", "x/z/w.txt", "x/e/.gitkeep", "y.txt"]));
        let mut paths = tree.folder("x").unwrap().descendant_paths();
        paths.sort();
        assert_eq!(paths, vec!["x/e/.gitkeep", "x/y.txt", "x/z/w.txt"]);
    }

    #[test]
    fn test_folder_paths_sort_like_strings() {
        let tree = FileTree::build(&records(&["a/b/c.txt", "a-b/d.txt", "ab/e.txt"]));
        assert_eq!(tree.folder_paths(), vec!["a", "a-b", "a/b", "ab"]);
    }

    #[test]
    fn test_render() {
        let tree = FileTree::build(&records(&["index.html", "src/app.js", "src/lib/util.js"]));
        let expected = "\
├── src/
│   ├── lib/
│   │   └── util.js
│   └── app.js
└── index.html
";
        assert_eq!(tree.render(), expected);
    }

    #[test]
    fn test_empty_tree() {
        let tree = FileTree::build(&[]);
        assert!(tree.folder_paths().is_empty());
        assert_eq!(tree.render(), "");
        assert!(tree.root().files.is_empty());
    }
}
