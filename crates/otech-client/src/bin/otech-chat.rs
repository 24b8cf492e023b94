//! Terminal front-end for the Otech assistant.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use otech_client::{
    Attachment, ConversationController, HttpTransport, Message, SubmissionStatus,
};
use otech_protocol::Role;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Parser)]
#[command(author, version, about = "Chat with the Otech assistant from a terminal.")]
struct Cli {
    /// Base URL of the assistant server
    #[arg(long, env = "OTECH_SERVER", default_value = "http://localhost:8080")]
    server: String,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

enum Command<'a> {
    Attach(&'a str),
    Detach,
    History,
    Quit,
    Unknown(&'a str),
    Say(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let Some(rest) = line.strip_prefix('/') else {
        return Command::Say(line);
    };
    let (name, arg) = rest.split_once(' ').unwrap_or((rest, ""));
    match name {
        "attach" => Command::Attach(arg.trim()),
        "detach" => Command::Detach,
        "history" => Command::History,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(name),
    }
}

fn speaker(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Gemini",
    }
}

fn print_message(message: &Message) {
    println!("{}: {}", speaker(message.role), message.content);
}

fn prompt() -> Result<()> {
    print!("> ");
    io::stdout().flush().context("flushing stdout")
}

fn init_logging(verbose: u8) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("otech_client={level},otech_chat={level}")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let transport = HttpTransport::new(cli.server);
    let mut controller = ConversationController::new();

    println!("Otech AI Assistant ({})", transport.base_url());
    println!("Commands: /attach <file.csv>, /detach, /history, /quit");
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("reading stdin")? {
        match parse_command(line.trim_end()) {
            Command::Quit => break,
            Command::Attach("") => eprintln!("usage: /attach <file.csv>"),
            Command::Attach(path) => match Attachment::from_path(path).await {
                Ok(attachment) => {
                    println!("Attached {}", attachment.file_name());
                    controller.attach(attachment);
                }
                Err(err) => eprintln!("Error: {err}"),
            },
            Command::Detach => match controller.detach() {
                Some(attachment) => println!("Removed {}", attachment.file_name()),
                None => println!("No file attached"),
            },
            Command::History => controller.messages().iter().for_each(print_message),
            Command::Unknown(name) => eprintln!("unknown command: /{name}"),
            Command::Say(text) => {
                controller.set_input(text);
                match controller.submit(&transport).await {
                    Ok(()) => match controller.status() {
                        SubmissionStatus::Error(failure) => {
                            eprintln!("Error: {}", failure.message)
                        }
                        _ => {
                            if let Some(reply) = controller.messages().last() {
                                print_message(reply);
                            }
                        }
                    },
                    Err(err) => eprintln!("{err}"),
                }
            }
        }
        prompt()?;
    }

    Ok(())
}
