pub mod commands;

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "eatba",
    about = "Eatba operator CLI",
    long_about = "Inspect eatba configuration and restaurant data, check readiness, \
                  and replay conversations locally.",
    after_help = "Examples:\n  eatba doctor --json\n  eatba catalog --category breakfast\n  \
                  eatba chat --user U1 --seed 7 美食推薦 '#文青早餐' '#中區'"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, restaurant data and LINE credential readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "List meal times, areas and restaurant counts from the configured data dir")]
    Catalog {
        #[arg(long, help = "Only show one meal time (breakfast|lunch|dinner)")]
        category: Option<String>,
    },
    #[command(about = "Run messages through the dialog and print each reply as JSON")]
    Chat {
        #[arg(long, default_value = "cli-user", help = "User id the session is kept under")]
        user: String,
        #[arg(long, help = "Seed the recommendation sampler for repeatable output")]
        seed: Option<u64>,
        #[arg(help = "Messages to send; read from stdin, one per line, when omitted")]
        messages: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Catalog { category } => commands::catalog::run(category.as_deref()),
        Command::Chat { user, seed, messages } => {
            let messages = if messages.is_empty() { read_stdin_lines() } else { messages };
            commands::chat::run(&user, seed, &messages)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn read_stdin_lines() -> Vec<String> {
    io::stdin().lock().lines().map_while(Result::ok).filter(|line| !line.is_empty()).collect()
}
