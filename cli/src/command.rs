//! One line of interactive input, parsed with clap.

use clap::{Parser, Subcommand};
use todo_sync::{Intent, Status, TodoId};

#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
pub struct Line {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Add a todo
    Add {
        #[arg(long, default_value = "incomplete")]
        status: Status,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// List todos
    #[command(alias = "display")]
    Show,
    /// Flip a todo between complete and incomplete
    Check { id: u64 },
    /// Change a todo's title, and optionally its status
    Edit {
        id: u64,
        #[arg(long)]
        status: Option<Status>,
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// Delete a todo
    Delete { id: u64 },
    /// Reload todos from the server
    Refresh,
    Exit,
}

impl Command {
    /// `current` is the status the store holds for the edited todo, if any.
    pub fn into_intent(self, current: impl FnOnce(TodoId) -> Option<Status>) -> Option<Intent> {
        match self {
            Command::Add { status, title } => Some(Intent::Add {
                title: title.join(" "),
                status,
            }),
            Command::Check { id } => Some(Intent::Toggle { id: TodoId(id) }),
            Command::Edit { id, status, title } => {
                let id = TodoId(id);
                Some(Intent::Edit {
                    id,
                    title: title.join(" "),
                    status: status.or_else(|| current(id)).unwrap_or_default(),
                })
            }
            Command::Delete { id } => Some(Intent::Delete { id: TodoId(id) }),
            Command::Show | Command::Refresh | Command::Exit => None,
        }
    }
}

pub fn parse(line: &str) -> Result<Command, clap::Error> {
    Line::try_parse_from(line.split_whitespace()).map(|line| line.command)
}
