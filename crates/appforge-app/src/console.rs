//! Per-project console log and its command interpreter

use appforge_core::prelude::*;
use appforge_core::ConsoleEntry;
use appforge_store::{keys, JsonStoreExt, SharedStore};

use crate::config::ConsoleSettings;
use crate::vfs::VirtualFileStore;

const HELP_TEXT: &str = "\
Available commands:
  help            Show this help
  clear           Clear the console
  ls [folder]     List a folder (default: project root)
  cat <path>      Print a file
  echo <text>     Print text
  tree            Show the project tree";

/// Append-only console history for one project
#[derive(Debug)]
pub struct ConsoleLog {
    store: SharedStore,
    project_id: String,
    entries: Vec<ConsoleEntry>,
    commands: Vec<String>,
    max_entries: usize,
    max_commands: usize,
}

impl ConsoleLog {
    pub fn open(
        store: SharedStore,
        project_id: impl Into<String>,
        limits: &ConsoleSettings,
    ) -> Self {
        let project_id = project_id.into();
        let entries: Vec<ConsoleEntry> =
            store.load_or_default(&keys::console_history(&project_id));
        let commands: Vec<String> =
            store.load_or_default(&keys::console_cmd_history(&project_id));

        let mut log = Self {
            store,
            project_id,
            entries,
            commands,
            max_entries: limits.max_entries.max(1),
            max_commands: limits.max_commands.max(1),
        };
        trim_front(&mut log.entries, log.max_entries);
        trim_front(&mut log.commands, log.max_commands);
        log
    }

    pub fn entries(&self) -> &[ConsoleEntry] {
        &self.entries
    }

    /// The last `n` entries
    pub fn latest(&self, n: usize) -> &[ConsoleEntry] {
        &self.entries[self.entries.len().saturating_sub(n)..]
    }

    /// Previously run commands, oldest first
    pub fn command_history(&self) -> &[String] {
        &self.commands
    }

    /// Append an entry, dropping the oldest past the cap
    pub fn append(&mut self, entry: ConsoleEntry) -> Result<()> {
        self.commit(Some(entry), None, false)
    }

    /// Remove every entry; command history is kept
    pub fn clear(&mut self) -> Result<()> {
        self.commit(None, None, true)
    }

    /// Run one command line against the project's files and log the result
    pub fn run(&mut self, line: &str, vfs: &VirtualFileStore) -> Result<()> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }

        let (name, args) = match line.split_once(char::is_whitespace) {
            Some((name, args)) => (name, args.trim()),
            None => (line, ""),
        };
        debug!("Console command '{}' in {}", name, self.project_id);

        if name == "clear" {
            return self.commit(None, Some(line.to_string()), true);
        }

        let mut staged = vec![ConsoleEntry::command(line)];
        staged.push(execute(name, args, vfs));
        self.commit_many(staged, Some(line.to_string()), false)
    }

    fn commit(
        &mut self,
        entry: Option<ConsoleEntry>,
        command: Option<String>,
        clear: bool,
    ) -> Result<()> {
        self.commit_many(entry.into_iter().collect(), command, clear)
    }

    /// Stage the new history, persist it, then swap it in
    fn commit_many(
        &mut self,
        new_entries: Vec<ConsoleEntry>,
        command: Option<String>,
        clear: bool,
    ) -> Result<()> {
        let mut entries = if clear { Vec::new() } else { self.entries.clone() };
        entries.extend(new_entries);
        trim_front(&mut entries, self.max_entries);

        self.store
            .write_json(&keys::console_history(&self.project_id), &entries)?;

        if let Some(command) = command {
            let mut commands = self.commands.clone();
            commands.push(command);
            trim_front(&mut commands, self.max_commands);
            self.store
                .write_json(&keys::console_cmd_history(&self.project_id), &commands)?;
            self.commands = commands;
        }

        self.entries = entries;
        Ok(())
    }
}

fn trim_front<T>(items: &mut Vec<T>, max: usize) {
    if items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}

/// Produce the response entry for a non-`clear` command
fn execute(name: &str, args: &str, vfs: &VirtualFileStore) -> ConsoleEntry {
    match name {
        "help" => ConsoleEntry::output(HELP_TEXT),
        "echo" => ConsoleEntry::output(args),
        "ls" => list_folder(args, vfs),
        "cat" => print_file(args, vfs),
        "tree" => {
            let tree = vfs.tree().render();
            if tree.is_empty() {
                ConsoleEntry::system("(empty project)")
            } else {
                ConsoleEntry::output(tree.trim_end())
            }
        }
        other => ConsoleEntry::error(format!("command not found: {}", other)),
    }
}

fn list_folder(folder: &str, vfs: &VirtualFileStore) -> ConsoleEntry {
    let normalized = match appforge_core::paths::normalize(folder) {
        Ok(path) => path,
        Err(e) => return ConsoleEntry::error(format!("ls: {}", e)),
    };
    let tree = vfs.tree();
    let Some(node) = tree.folder(&normalized) else {
        return ConsoleEntry::error(format!("ls: {}: No such folder", folder));
    };

    let mut lines: Vec<String> = node
        .folders
        .values()
        .map(|child| format!("{}/", child.name()))
        .collect();
    lines.extend(node.files.iter().cloned());

    if lines.is_empty() {
        ConsoleEntry::system("(empty)")
    } else {
        ConsoleEntry::output(lines.join("\n"))
    }
}

fn print_file(path: &str, vfs: &VirtualFileStore) -> ConsoleEntry {
    if path.is_empty() {
        return ConsoleEntry::error("cat: missing file operand");
    }
    match vfs.read_file(path) {
        Ok(record) if record.kind.is_binary() => ConsoleEntry::system(format!(
            "{}: {} file ({} bytes encoded)",
            record.path,
            record.kind,
            record.content.len()
        )),
        Ok(record) => ConsoleEntry::output(record.content.clone()),
        Err(_) => ConsoleEntry::error(format!("cat: {}: No such file", path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use appforge_core::{ConsoleEntryType, FileKind};
    use appforge_store::MemoryStore;
    use std::sync::Arc;

    const PROJECT: &str = "project_1_abc";

    fn setup() -> (SharedStore, VirtualFileStore, ConsoleLog) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let mut vfs = VirtualFileStore::open(store.clone(), PROJECT);
        vfs.create_file("index.html", "<h1>Hello</h1>", None).unwrap();
        vfs.create_file("src/app.js", "console.log(1);", None).unwrap();
        vfs.create_file("logo.png", "data:image/png;base64,AAAA", Some(FileKind::Image))
            .unwrap();
        let console = ConsoleLog::open(store.clone(), PROJECT, &ConsoleSettings::default());
        (store, vfs, console)
    }

    fn last(console: &ConsoleLog) -> &ConsoleEntry {
        console.entries().last().unwrap()
    }

    #[test]
    fn test_append_persists() {
        let (store, _, mut console) = setup();
        console.append(ConsoleEntry::system("Project created")).unwrap();

        let reopened = ConsoleLog::open(store, PROJECT, &ConsoleSettings::default());
        assert_eq!(reopened.entries().len(), 1);
        assert_eq!(reopened.entries()[0].output, "Project created");
        assert_eq!(reopened.entries()[0].entry_type, ConsoleEntryType::System);
    }

    #[test]
    fn test_history_is_capped() {
        let (store, _, _) = setup();
        let limits = ConsoleSettings {
            max_entries: 3,
            max_commands: 2,
        };
        let mut console = ConsoleLog::open(store, PROJECT, &limits);
        for i in 0..5 {
            console.append(ConsoleEntry::output(format!("line {}", i))).unwrap();
        }
        let outputs: Vec<&str> = console.entries().iter().map(|e| e.output.as_str()).collect();
        assert_eq!(outputs, vec!["line 2", "line 3", "line 4"]);
        assert_eq!(console.latest(2).len(), 2);
        assert_eq!(console.latest(10).len(), 3);
    }

    #[test]
    fn test_run_records_command_and_output() {
        let (_, vfs, mut console) = setup();
        console.run("echo  hello world ", &vfs).unwrap();

        let entries = console.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entry_type, ConsoleEntryType::Command);
        assert_eq!(entries[0].command.as_deref(), Some("echo  hello world"));
        assert_eq!(entries[1].output, "hello world");
        assert_eq!(console.command_history(), &["echo  hello world".to_string()]);
    }

    #[test]
    fn test_ls_and_tree() {
        let (_, vfs, mut console) = setup();

        console.run("ls", &vfs).unwrap();
        assert_eq!(last(&console).output, "src/\nindex.html\nlogo.png");

        console.run("ls src", &vfs).unwrap();
        assert_eq!(last(&console).output, "app.js");

        console.run("ls nope", &vfs).unwrap();
        assert_eq!(last(&console).entry_type, ConsoleEntryType::Error);

        console.run("tree", &vfs).unwrap();
        assert!(last(&console).output.contains("└── logo.png"));
    }

    #[test]
    fn test_cat() {
        let (_, vfs, mut console) = setup();

        console.run("cat index.html", &vfs).unwrap();
        assert_eq!(last(&console).output, "<h1>Hello</h1>");

        console.run("cat logo.png", &vfs).unwrap();
        assert_eq!(last(&console).entry_type, ConsoleEntryType::System);

        console.run("cat missing.txt", &vfs).unwrap();
        assert_eq!(last(&console).output, "cat: missing.txt: No such file");

        console.run("cat", &vfs).unwrap();
        assert_eq!(last(&console).entry_type, ConsoleEntryType::Error);
    }

    #[test]
    fn test_unknown_command_is_error() {
        let (_, vfs, mut console) = setup();
        console.run("rm -rf /", &vfs).unwrap();
        assert_eq!(last(&console).entry_type, ConsoleEntryType::Error);
        assert_eq!(last(&console).output, "command not found: rm");
    }

    #[test]
    fn test_clear_keeps_command_history() {
        let (store, vfs, mut console) = setup();
        console.run("help", &vfs).unwrap();
        console.run("clear", &vfs).unwrap();

        assert!(console.entries().is_empty());
        assert_eq!(console.command_history(), &["help".to_string(), "clear".to_string()]);

        let reopened = ConsoleLog::open(store, PROJECT, &ConsoleSettings::default());
        assert!(reopened.entries().is_empty());
        assert_eq!(reopened.command_history().len(), 2);
    }

    #[test]
    fn test_blank_line_is_ignored() {
        let (_, vfs, mut console) = setup();
        console.run("   ", &vfs).unwrap();
        assert!(console.entries().is_empty());
        assert!(console.command_history().is_empty());
    }

    #[test]
    fn test_storage_failure_keeps_history() {
        let store: SharedStore = Arc::new(MemoryStore::with_capacity(600));
        let vfs = VirtualFileStore::open(store.clone(), PROJECT);
        let mut console = ConsoleLog::open(store, PROJECT, &ConsoleSettings::default());

        let err = console
            .append(ConsoleEntry::output("x".repeat(1000)))
            .unwrap_err();
        assert!(err.is_storage());
        assert!(console.entries().is_empty());

        console.run("echo hi", &vfs).unwrap();
        assert_eq!(console.entries().len(), 2);
    }
}
