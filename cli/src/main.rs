mod command;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use todo_sync::{ControllerOptions, IntentOutcome, RemoteTodoClient, SyncConfig, TodoSyncController};
use tracing_subscriber::EnvFilter;

use crate::command::Command;

const PROMPT: &str = "Type add, show, check, edit, delete, refresh or exit: ";

#[derive(Parser, Debug)]
#[command(about = "Interactive todo list kept in sync with the todo API")]
struct Cli {
    /// Collection endpoint; overrides API_URL
    #[arg(long)]
    api_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = SyncConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
        config.validate()?;
    }
    tracing::debug!(?config, "starting");

    let client = RemoteTodoClient::from_config(&config)?;
    let controller = TodoSyncController::new(client, ControllerOptions::from(&config));
    report(&controller.refresh().await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(PROMPT.as_bytes()).await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("You entered an unknown command.\n{err}");
                continue;
            }
        };

        match command {
            Command::Exit => break,
            Command::Show => show(&controller),
            Command::Refresh => report(&controller.refresh().await),
            other => {
                if let Some(intent) = other.into_intent(|id| controller.get(id).map(|t| t.status)) {
                    report(&controller.dispatch(intent).await);
                }
            }
        }
    }

    println!("Bye!");
    Ok(())
}

fn show(controller: &TodoSyncController) {
    let todos = controller.get_all();
    if todos.is_empty() {
        println!("No todos");
        return;
    }
    for todo in todos {
        let mark = if todo.is_complete() { 'x' } else { ' ' };
        println!("[{mark}] {:>4}  {}  ({})", todo.id.0, todo.title, todo.display_time());
    }
}

fn report(outcome: &IntentOutcome) {
    match outcome {
        IntentOutcome::Succeeded(message) => println!("{message}"),
        IntentOutcome::Failed { message, .. } => println!("error: {message}"),
    }
}
