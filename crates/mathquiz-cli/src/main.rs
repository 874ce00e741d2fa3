//! mathquiz CLI: play the timed arithmetic quiz in a terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use mathquiz_core::Operator;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "mathquiz", version, about = "Timed arithmetic quiz")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game
    Play {
        /// Game mode: add, subtract, multiply (shows a menu if omitted)
        #[arg(long)]
        mode: Option<Operator>,

        /// Seed for reproducible problems
        #[arg(long)]
        seed: Option<u64>,

        /// Time allowed per question in milliseconds
        #[arg(long)]
        time_limit_ms: Option<u64>,

        /// Countdown tick in milliseconds
        #[arg(long)]
        tick_ms: Option<u64>,

        /// Starting lives
        #[arg(long)]
        lives: Option<u32>,

        /// Print one JSON snapshot per line instead of text
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config file
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("mathquiz=warn".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            mode,
            seed,
            time_limit_ms,
            tick_ms,
            lives,
            json,
            config,
        } => {
            commands::play::execute(commands::play::PlayOptions {
                mode,
                seed,
                time_limit_ms,
                tick_ms,
                lives,
                json,
                config,
            })
            .await
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
