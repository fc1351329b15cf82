//! Command-line interface: argument definitions and dispatch

use std::io::{Read, Write};
use std::path::PathBuf;

use appforge_app::{FlowStage, Workspace};
use appforge_core::{paths, Plan};
use clap::{Parser, Subcommand};
use color_eyre::eyre::eyre;
use color_eyre::Result;

/// AppForge - local project workspace with mock AI generation
#[derive(Parser, Debug)]
#[command(name = "appforge")]
#[command(about = "Manage AppForge projects, files and mock generations", long_about = None)]
pub struct Cli {
    /// Store directory (defaults to the platform data directory)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory holding config.toml
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage saved projects
    #[command(subcommand)]
    Project(ProjectCommand),

    /// Work with the open project's files
    #[command(subcommand)]
    File(FileCommand),

    /// Print a file as highlighted markup
    Highlight { path: String },

    /// Generate a site into the open project
    Generate {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },

    /// Run a console command against the open project
    Console {
        #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
        line: Vec<String>,
    },

    /// Mock account session
    #[command(subcommand)]
    Auth(AuthCommand),

    /// Show or change the plan
    Plan {
        #[command(subcommand)]
        action: Option<PlanCommand>,
    },

    /// Write a default config.toml
    Init,
}

#[derive(Subcommand, Debug)]
pub enum ProjectCommand {
    /// List saved projects
    List,
    /// Create and open a project named after a prompt
    Create {
        #[arg(required = true, num_args = 1..)]
        prompt: Vec<String>,
    },
    Duplicate { id: String },
    Delete { id: String },
    /// Toggle the featured flag
    Feature { id: String },
    Rename { id: String, name: String },
    /// Make a project the open one
    Open { id: String },
}

#[derive(Subcommand, Debug)]
pub enum FileCommand {
    /// List files, optionally filtered by a case-insensitive path substring
    Ls {
        #[arg(long)]
        filter: Option<String>,

        /// List folders instead of files
        #[arg(long)]
        folders: bool,
    },
    Tree,
    Cat { path: String },
    /// Create a file
    New {
        path: String,
        #[arg(long, default_value = "")]
        content: String,
    },
    Mkdir { path: String },
    /// Replace a file's content (read from stdin when omitted)
    Write { path: String, content: Option<String> },
    /// Rename a file or folder
    Rename { from: String, to: String },
    /// Delete a file or folder
    Rm { path: String },
    /// Duplicate a file or folder next to itself
    Cp { path: String },
    /// Move a file or folder into another folder ("" or "/" for the root)
    Mv { path: String, target: String },
}

#[derive(Subcommand, Debug)]
pub enum AuthCommand {
    Register {
        username: String,
        email: String,
        password: String,
    },
    Login { email: String, password: String },
    Logout,
    /// Show the logged-in user
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum PlanCommand {
    /// Switch plan (FREE, PRO, TEAMS, BIG TEAMS)
    Set { plan: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// Dispatch
// ─────────────────────────────────────────────────────────────────────────────

/// Execute one command against the workspace, writing results to `out`
///
/// Returns `false` when the workspace rejected the operation; the reason is
/// left in the workspace's notifications.
pub async fn execute(
    workspace: &mut Workspace,
    command: Command,
    out: &mut impl Write,
) -> Result<bool> {
    match command {
        Command::Project(cmd) => project(workspace, cmd, out),
        Command::File(cmd) => file(workspace, cmd, out),
        Command::Highlight { path } => match workspace.highlighted(&path) {
            Some(markup) => {
                writeln!(out, "{}", markup)?;
                Ok(true)
            }
            None => Ok(false),
        },
        Command::Generate { prompt } => generate(workspace, &prompt.join(" "), out).await,
        Command::Console { line } => console(workspace, &line.join(" "), out),
        Command::Auth(cmd) => auth(workspace, cmd, out).await,
        Command::Plan { action } => plan(workspace, action, out),
        Command::Init => Err(eyre!("init is handled before the workspace opens")),
    }
}

fn project(workspace: &mut Workspace, cmd: ProjectCommand, out: &mut impl Write) -> Result<bool> {
    let ok = match cmd {
        ProjectCommand::List => {
            let active = workspace.active_project_id().map(str::to_string);
            for project in workspace.projects() {
                let marker = if active.as_deref() == Some(project.id.as_str()) {
                    '*'
                } else {
                    ' '
                };
                let star = if project.is_featured { "★ " } else { "" };
                writeln!(
                    out,
                    "{} {}  {}{}  ({})",
                    marker,
                    project.id,
                    star,
                    project.name,
                    project.last_modified.format("%Y-%m-%d %H:%M")
                )?;
            }
            true
        }
        ProjectCommand::Create { prompt } => match workspace.create_project(&prompt.join(" ")) {
            Some(project) => {
                writeln!(out, "{}  {}", project.id, project.name)?;
                true
            }
            None => false,
        },
        ProjectCommand::Duplicate { id } => match workspace.duplicate_project(&id) {
            Some(copy) => {
                writeln!(out, "{}  {}", copy.id, copy.name)?;
                true
            }
            None => false,
        },
        ProjectCommand::Delete { id } => workspace.delete_project(&id),
        ProjectCommand::Feature { id } => match workspace.toggle_featured(&id) {
            Some(featured) => {
                let state = if featured { "featured" } else { "not featured" };
                writeln!(out, "{} is now {}", id, state)?;
                true
            }
            None => false,
        },
        ProjectCommand::Rename { id, name } => workspace.rename_project(&id, &name),
        ProjectCommand::Open { id } => workspace.open_project(&id),
    };
    Ok(ok)
}

/// Whether `path` names an existing folder of the open project
fn is_folder(workspace: &Workspace, path: &str) -> bool {
    let Ok(path) = paths::normalize(path) else {
        return false;
    };
    !path.is_empty() && workspace.tree().is_some_and(|tree| tree.contains_folder(&path))
}

fn print_path(out: &mut impl Write, path: Option<String>) -> Result<bool> {
    match path {
        Some(path) => {
            writeln!(out, "{}", path)?;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn file(workspace: &mut Workspace, cmd: FileCommand, out: &mut impl Write) -> Result<bool> {
    match cmd {
        FileCommand::Ls { filter, folders } => {
            if !workspace.require_project() {
                return Ok(false);
            }
            if folders {
                for folder in workspace.list_folders() {
                    writeln!(out, "{}/", folder)?;
                }
            } else {
                for record in workspace.list_files(filter.as_deref()) {
                    writeln!(out, "{:<8} {}", record.kind.as_str(), record.path)?;
                }
            }
            Ok(true)
        }
        FileCommand::Tree => match workspace.tree() {
            Some(tree) => {
                write!(out, "{}", tree.render())?;
                Ok(true)
            }
            None => Ok(workspace.require_project()),
        },
        FileCommand::Cat { path } => match workspace.read_file(&path) {
            Some(record) => {
                writeln!(out, "{}", record.content)?;
                Ok(true)
            }
            None => Ok(false),
        },
        FileCommand::New { path, content } => {
            let created = workspace.create_file(&path, &content);
            print_path(out, created)
        }
        FileCommand::Mkdir { path } => {
            let created = workspace.create_folder(&path);
            print_path(out, created)
        }
        FileCommand::Write { path, content } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            Ok(workspace.write_file(&path, &content))
        }
        FileCommand::Rename { from, to } => {
            let renamed = if is_folder(workspace, &from) {
                workspace.rename_folder(&from, &to)
            } else {
                workspace.rename_file(&from, &to)
            };
            print_path(out, renamed)
        }
        FileCommand::Rm { path } => {
            if is_folder(workspace, &path) {
                match workspace.delete_folder(&path) {
                    Some(removed) => {
                        writeln!(out, "removed {} entries", removed)?;
                        Ok(true)
                    }
                    None => Ok(false),
                }
            } else {
                Ok(workspace.delete_file(&path))
            }
        }
        FileCommand::Cp { path } => {
            let copy = if is_folder(workspace, &path) {
                workspace.duplicate_folder(&path)
            } else {
                workspace.duplicate_file(&path)
            };
            print_path(out, copy)
        }
        FileCommand::Mv { path, target } => {
            let moved = if is_folder(workspace, &path) {
                workspace.move_folder(&path, &target)
            } else {
                workspace.move_file(&path, &target)
            };
            print_path(out, moved)
        }
    }
}

/// Start a generation and report each stage as the flow moves
async fn generate(workspace: &mut Workspace, prompt: &str, out: &mut impl Write) -> Result<bool> {
    let mut rx = workspace.generation_flow().subscribe();
    if !workspace.start_generation(prompt) {
        return Ok(false);
    }

    loop {
        let stage = rx.borrow_and_update().stage;
        if stage == FlowStage::Idle {
            break;
        }
        writeln!(out, "{}...", stage)?;
        out.flush()?;
        if rx.changed().await.is_err() {
            break;
        }
    }

    match workspace.poll_generation() {
        Some(written) => {
            for path in written {
                writeln!(out, "wrote {}", path)?;
            }
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Run a console line and print only the entries it added
fn console(workspace: &mut Workspace, line: &str, out: &mut impl Write) -> Result<bool> {
    let last_id = workspace.console_entries().last().map(|entry| entry.id.clone());
    if !workspace.run_console(line) {
        return Ok(false);
    }

    let entries = workspace.console_entries();
    let start = last_id
        .and_then(|id| entries.iter().position(|entry| entry.id == id))
        .map_or(0, |idx| idx + 1);
    for entry in &entries[start..] {
        writeln!(out, "{}", entry.output)?;
    }
    Ok(true)
}

async fn auth(workspace: &mut Workspace, cmd: AuthCommand, out: &mut impl Write) -> Result<bool> {
    let user = match cmd {
        AuthCommand::Register {
            username,
            email,
            password,
        } => workspace.register(&username, &email, &password).await,
        AuthCommand::Login { email, password } => workspace.login(&email, &password).await,
        AuthCommand::Logout => return Ok(workspace.logout()),
        AuthCommand::Whoami => workspace.current_user(),
    };

    match user {
        Some(user) => {
            writeln!(
                out,
                "{} <{}>  plan {}  credits {}",
                user.username, user.email, user.plan, user.credits
            )?;
            Ok(true)
        }
        None => {
            writeln!(out, "not logged in")?;
            Ok(false)
        }
    }
}

fn plan_names() -> String {
    Plan::ALL
        .iter()
        .map(Plan::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn plan(workspace: &mut Workspace, action: Option<PlanCommand>, out: &mut impl Write) -> Result<bool> {
    if let Some(PlanCommand::Set { plan }) = action {
        let Some(plan) = Plan::parse(&plan) else {
            return Err(eyre!("unknown plan '{}', expected one of: {}", plan, plan_names()));
        };
        if !workspace.set_plan(plan) {
            return Ok(false);
        }
    }

    let plan = workspace.plan();
    let limit = plan
        .project_limit()
        .map_or_else(|| "unlimited".to_string(), |limit| limit.to_string());
    writeln!(
        out,
        "{} ({} of {} projects)",
        plan,
        workspace.projects().len(),
        limit
    )?;
    Ok(true)
}
