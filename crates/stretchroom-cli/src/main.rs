use clap::{Parser, Subcommand};

mod commands;
mod logging;

#[derive(Parser)]
#[command(name = "stretchroom", version, about = "Stretchroom routine player")]
pub(crate) struct Cli {
    /// Debug logging for stretchroom crates (overridden by STRETCHROOM_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a routine with countdown, chime and announcements
    Play(commands::play::PlayArgs),
    /// Print a routine's stretches in playback order
    Show(commands::show::ShowArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions(commands::completions::CompletionsArgs),
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Play(args) => commands::play::run(args),
        Commands::Show(args) => commands::show::run(args),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
