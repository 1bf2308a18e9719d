pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "seafoodtruck",
    about = "Seattle food truck bot operator CLI",
    long_about = "Inspect configuration, check readiness, and preview bot replies without Slack.",
    after_help = "Examples:\n  seafoodtruck doctor --json\n  seafoodtruck config\n  seafoodtruck ask find events for tomorrow\n  seafoodtruck ask --fixtures trucks.json find trucks at 123"
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
    #[command(about = "Validate config, Slack token, broadcast settings and food truck API reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Answer mention text as the bot would and print the Block Kit pages")]
    Ask {
        #[arg(long, help = "Serve lookups from a JSON fixtures file instead of the live API")]
        fixtures: Option<PathBuf>,
        #[arg(required = true, num_args = 1.., help = "Mention text, without the bot mention")]
        text: Vec<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => {
            commands::CommandResult { exit_code: 0, output: commands::doctor::run(json) }
        }
        Command::Ask { fixtures, text } => commands::ask::run(&text.join(" "), fixtures.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
