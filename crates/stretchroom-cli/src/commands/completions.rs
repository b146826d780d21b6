use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::Cli;

#[derive(Args)]
pub struct CompletionsArgs {
    /// Target shell
    shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut command = Cli::command();
    clap_complete::generate(args.shell, &mut command, "stretchroom", &mut std::io::stdout());
    Ok(())
}
