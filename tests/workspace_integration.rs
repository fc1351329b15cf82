//! Integration tests: full sessions over a directory-backed store
//!
//! Run with: cargo test --test workspace_integration

use std::path::Path;
use std::sync::Arc;

use appforge::cli::{self, Cli};
use appforge_app::config::Settings;
use appforge_app::{FlowStage, NotificationLevel, Workspace};
use appforge_store::{keys, FileStore, KeyValueStore, SharedStore};
use clap::Parser;
use tempfile::tempdir;

// ─────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────

fn open_workspace(dir: &Path) -> Workspace {
    let store: SharedStore = Arc::new(FileStore::open(dir).unwrap());
    Workspace::open(store, Settings::default())
}

/// Parse and run one command line, returning (ok, stdout)
async fn run_cli(workspace: &mut Workspace, args: &[&str]) -> (bool, String) {
    let mut argv = vec!["appforge"];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let mut out = Vec::new();
    let ok = cli::execute(workspace, cli.command, &mut out).await.unwrap();
    (ok, String::from_utf8(out).unwrap())
}

// ─────────────────────────────────────────────────────────
// Sessions
// ─────────────────────────────────────────────────────────

#[test]
fn test_session_persists_across_reopen() {
    let temp = tempdir().unwrap();

    let project_id = {
        let mut ws = open_workspace(temp.path());
        let project = ws.create_project("Recipe collection").unwrap();
        ws.create_file("index.html", "<h1>Recipes</h1>").unwrap();
        ws.create_folder("assets/img").unwrap();
        ws.create_file("notes/todo.md", "- soup").unwrap();
        ws.move_folder("notes", "assets").unwrap();
        project.id
    };

    let mut ws = open_workspace(temp.path());
    assert_eq!(ws.active_project_id(), Some(project_id.as_str()));
    assert_eq!(
        ws.read_file("assets/notes/todo.md").unwrap().content,
        "- soup"
    );
    assert_eq!(ws.list_folders(), ["assets", "assets/img", "assets/notes"]);
    assert_eq!(ws.files().unwrap().current_file(), Some("index.html"));
}

#[test]
fn test_delete_project_removes_every_key() {
    let temp = tempdir().unwrap();
    let store: SharedStore = Arc::new(FileStore::open(temp.path()).unwrap());
    let mut ws = Workspace::open(store.clone(), Settings::default());

    let project = ws.create_project("Throwaway").unwrap();
    ws.create_file("a.txt", "x").unwrap();
    ws.run_console("echo hi");
    assert!(store.contains(&keys::project_files(&project.id)).unwrap());

    assert!(ws.delete_project(&project.id));
    for key in keys::project_scoped(&project.id) {
        assert!(!store.contains(&key).unwrap(), "{} survived delete", key);
    }
    assert!(!store.contains(keys::CURRENT_PROJECT_ID).unwrap());
}

#[test]
fn test_duplicate_project_copies_files() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let source = ws.create_project("Original").unwrap();
    ws.create_file("src/app.js", "let x = 1;").unwrap();

    let copy = ws.duplicate_project(&source.id).unwrap();
    assert_eq!(copy.name, "Original (Copy)");

    assert!(ws.open_project(&copy.id));
    assert_eq!(ws.read_file("src/app.js").unwrap().content, "let x = 1;");

    // Edits to the copy leave the original alone
    assert!(ws.write_file("src/app.js", "let x = 2;"));
    assert!(ws.open_project(&source.id));
    assert_eq!(ws.read_file("src/app.js").unwrap().content, "let x = 1;");
}

#[test]
fn test_corrupt_saved_projects_start_empty() {
    let temp = tempdir().unwrap();
    {
        let store = FileStore::open(temp.path()).unwrap();
        store.set(keys::SAVED_PROJECTS, b"{ definitely not json").unwrap();
    }

    let mut ws = open_workspace(temp.path());
    assert!(ws.projects().is_empty());
    assert!(ws.create_project("Fresh start").is_some());
}

// ─────────────────────────────────────────────────────────
// Command Line
// ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cli_file_commands() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let (ok, out) = run_cli(&mut ws, &["project", "create", "My", "shop"]).await;
    assert!(ok);
    assert!(out.contains("My shop"));

    let (ok, _) = run_cli(&mut ws, &["file", "new", "index.html", "--content", "<b>hi</b>"]).await;
    assert!(ok);
    let (ok, out) = run_cli(&mut ws, &["file", "mkdir", "pages"]).await;
    assert!(ok);
    assert_eq!(out.trim(), "pages");

    let (ok, out) = run_cli(&mut ws, &["file", "mv", "index.html", "pages"]).await;
    assert!(ok);
    assert_eq!(out.trim(), "pages/index.html");

    let (ok, out) = run_cli(&mut ws, &["file", "tree"]).await;
    assert!(ok);
    assert!(out.contains("pages"));
    assert!(out.contains("index.html"));

    let (ok, out) = run_cli(&mut ws, &["highlight", "pages/index.html"]).await;
    assert!(ok);
    assert!(out.contains("<span"));

    let (ok, out) = run_cli(&mut ws, &["file", "rm", "pages"]).await;
    assert!(ok);
    assert!(out.starts_with("removed"));
    assert!(ws.list_files(None).is_empty());
}

#[tokio::test]
async fn test_cli_failure_leaves_notification() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let (ok, out) = run_cli(&mut ws, &["file", "cat", "missing.txt"]).await;
    assert!(!ok);
    assert!(out.is_empty());

    let notifications = ws.take_notifications();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].level, NotificationLevel::Warning);
    assert_eq!(notifications[0].message, "No project is open");
}

#[tokio::test]
async fn test_cli_listing_without_project_explains_why() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let commands: [&[&str]; 3] = [&["file", "ls"], &["file", "ls", "--folders"], &["file", "tree"]];
    for args in commands {
        let (ok, out) = run_cli(&mut ws, args).await;
        assert!(!ok, "{:?} succeeded", args);
        assert!(out.is_empty());

        let notifications = ws.take_notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "No project is open");
    }
}

#[tokio::test]
async fn test_cli_console_prints_new_entries() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());
    run_cli(&mut ws, &["project", "create", "Console"]).await;

    let (ok, out) = run_cli(&mut ws, &["console", "echo", "hello", "there"]).await;
    assert!(ok);
    assert_eq!(out, "> echo hello there\nhello there\n");

    let (ok, out) = run_cli(&mut ws, &["console", "frobnicate"]).await;
    assert!(ok);
    assert!(out.contains("command not found: frobnicate"));
}

#[tokio::test(start_paused = true)]
async fn test_cli_generate_reports_stages() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let (ok, out) = run_cli(&mut ws, &["generate", "A", "blog", "about", "tea"]).await;
    assert!(ok);
    assert!(out.starts_with("thinking..."));
    assert!(out.contains("building..."));
    assert!(out.contains("wrote index.html"));
    assert!(out.contains("wrote script.js"));
    assert_eq!(ws.generation_state().stage, FlowStage::Idle);

    let (_, out) = run_cli(&mut ws, &["project", "list"]).await;
    assert!(out.contains("A blog about tea"));
}

#[tokio::test]
async fn test_cli_plan() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let (ok, out) = run_cli(&mut ws, &["plan"]).await;
    assert!(ok);
    assert_eq!(out.trim(), "FREE (0 of 5 projects)");

    let (ok, out) = run_cli(&mut ws, &["plan", "set", "big_teams"]).await;
    assert!(ok);
    assert_eq!(out.trim(), "BIG TEAMS (0 of unlimited projects)");
}

#[tokio::test]
async fn test_cli_unknown_plan_lists_choices() {
    let temp = tempdir().unwrap();
    let mut ws = open_workspace(temp.path());

    let cli = Cli::try_parse_from(["appforge", "plan", "set", "enterprise"]).unwrap();
    let mut out = Vec::new();
    let err = cli::execute(&mut ws, cli.command, &mut out).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "unknown plan 'enterprise', expected one of: FREE, PRO, TEAMS, BIG TEAMS"
    );
}
