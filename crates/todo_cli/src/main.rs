//! `todo` command line entry point.
//!
//! # Responsibility
//! - Map subcommands onto `todo_core::TodoService` operations.
//! - Render records as plain text or JSON on stdout; errors go to stderr.

mod terminal;

use clap::{Parser, Subcommand};
use log::debug;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use terminal::TerminalHost;
use todo_core::{
    default_log_level, display_id, init_logging, CreateTodoRequest, FileTodoRepository,
    StoreConfig, TodoPatch, TodoRecord, TodoService, TodoSettings, TodoSummary,
};

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(name = "todo", version, about = "File-backed todo store")]
struct Cli {
    /// Store directory (overrides TODO_STORE_PATH and the `.todos` default)
    #[arg(long, global = true)]
    store: Option<String>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Never prompt; stale locks are reported instead of stolen
    #[arg(long, global = true)]
    no_input: bool,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List todos, open first
    List {
        /// Include closed todos
        #[arg(short, long)]
        all: bool,
    },
    /// Fuzzy-search todos by id, title, tags and status
    Search {
        #[arg(num_args = 1.., required = true)]
        query: Vec<String>,
    },
    /// Print one todo
    Get { id: String },
    /// Create a todo
    Create {
        title: String,
        #[arg(short, long = "tag")]
        tags: Vec<String>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Replace selected fields of a todo
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Replaces the whole tag list
        #[arg(short, long = "tag")]
        tags: Option<Vec<String>>,
        #[arg(short, long)]
        status: Option<String>,
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Append text to a todo body
    Append { id: String, text: String },
    /// Set the status of a todo
    Status { id: String, status: String },
    /// Mark a todo closed
    Close { id: String },
    /// Delete a todo
    Delete { id: String },
    /// Show who holds the lock on a todo
    Lock { id: String },
    /// Delete closed todos older than the configured retention
    Gc,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(log_dir) = &cli.log_dir {
        init_logging(default_log_level(), log_dir)?;
    }

    let host = TerminalHost::detect(cli.no_input)?;
    let config = match cli.store.as_deref() {
        Some(path) => StoreConfig::resolve(&host, Some(path)),
        None => StoreConfig::from_host(&host),
    };
    debug!(
        "event=cli_start module=cli status=ok root={}",
        config.root.display()
    );
    let service: TodoService<FileTodoRepository, TerminalHost> =
        TodoService::open(&config, host);
    let json = cli.json;

    match cli.command {
        Command::List { all } => {
            let summaries = service
                .list()?
                .into_iter()
                .filter(|summary| all || !summary.is_closed())
                .collect::<Vec<_>>();
            print_summaries(&summaries, json)
        }
        Command::Search { query } => print_summaries(&service.search(&query.join(" "))?, json),
        Command::Get { id } => match service.get(&id)? {
            Some(record) => print_record(&record, json),
            None => Err(format!("Todo {} not found", display_id(id.trim())).into()),
        },
        Command::Create {
            title,
            tags,
            status,
            body,
        } => {
            let record = service.create(CreateTodoRequest {
                title,
                tags,
                status,
                body,
            })?;
            print_record(&record, json)
        }
        Command::Update {
            id,
            title,
            tags,
            status,
            body,
        } => {
            let record = service.update(
                &id,
                TodoPatch {
                    title,
                    tags,
                    status,
                    body,
                },
            )?;
            print_record(&record, json)
        }
        Command::Append { id, text } => print_record(&service.append(&id, &text)?, json),
        Command::Status { id, status } => {
            print_record(&service.update_status(&id, &status)?, json)
        }
        Command::Close { id } => print_record(&service.update_status(&id, "closed")?, json),
        Command::Delete { id } => {
            let record = service.delete(&id)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                println!("Deleted {}", display_id(&record.id));
            }
            Ok(())
        }
        Command::Lock { id } => {
            match service.lock_status(&id)? {
                None => println!("unlocked"),
                Some(status) => {
                    let owner = status
                        .marker
                        .map(|marker| match marker.session {
                            Some(session) => format!("session {session}, pid {}", marker.pid),
                            None => format!("pid {}", marker.pid),
                        })
                        .unwrap_or_else(|| "unknown owner".to_string());
                    let state = if status.stale { "stale" } else { "held" };
                    println!("{state} by {owner}, age {}s", status.age.as_secs());
                }
            }
            Ok(())
        }
        Command::Gc => {
            let removed = service.collect_garbage(&TodoSettings::load(&config))?;
            if json {
                println!("{}", serde_json::json!({ "removed": removed }));
            } else {
                println!("Removed {removed} closed todo(s)");
            }
            Ok(())
        }
    }
}

fn print_summaries(summaries: &[TodoSummary], json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summaries)?);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No todos.");
    }
    for summary in summaries {
        println!("{}", summary_line(summary));
    }
    Ok(())
}

fn print_record(record: &TodoRecord, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }
    println!("{}", summary_line(&record.summary()));
    if !record.created_at.is_empty() {
        println!("created {}", record.created_at);
    }
    if !record.body.is_empty() {
        println!();
        print!("{}", record.body);
    }
    Ok(())
}

fn summary_line(summary: &TodoSummary) -> String {
    let mut line = format!(
        "{} [{}] {}",
        display_id(&summary.id),
        summary.status,
        summary.title
    );
    if !summary.tags.is_empty() {
        line.push_str(&format!(" #{}", summary.tags.join(" #")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::{summary_line, Cli, Command};
    use clap::Parser;
    use todo_core::TodoSummary;

    #[test]
    fn summary_line_shows_display_id_status_and_tags() {
        let summary = TodoSummary {
            id: "1a2b3c4d".to_string(),
            title: "Fix login".to_string(),
            tags: vec!["auth".to_string(), "urgent".to_string()],
            status: "open".to_string(),
            created_at: String::new(),
        };
        assert_eq!(
            summary_line(&summary),
            "TODO-1a2b3c4d [open] Fix login #auth #urgent"
        );
    }

    #[test]
    fn create_accepts_repeated_tags() {
        let cli = Cli::parse_from(["todo", "create", "Fix login", "-t", "a", "--tag", "b"]);
        match cli.command {
            Command::Create { title, tags, .. } => {
                assert_eq!(title, "Fix login");
                assert_eq!(tags, vec!["a", "b"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn update_without_tags_leaves_them_unset() {
        let cli = Cli::parse_from(["todo", "--json", "update", "abc", "--status", "done"]);
        assert!(cli.json);
        match cli.command {
            Command::Update { tags, status, .. } => {
                assert!(tags.is_none());
                assert_eq!(status.as_deref(), Some("done"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
