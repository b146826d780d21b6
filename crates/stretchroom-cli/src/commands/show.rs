use std::path::PathBuf;

use clap::Args;
use stretchroom_core::{format_countdown, load_routine};

#[derive(Args)]
pub struct ShowArgs {
    /// Routine file (.json or .toml)
    file: PathBuf,
    /// Print the sorted stretches as JSON
    #[arg(long)]
    json: bool,
}

pub fn run(args: ShowArgs) -> Result<(), Box<dyn std::error::Error>> {
    let routine = load_routine(&args.file)?;
    let sorted = routine.sorted();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sorted)?);
        return Ok(());
    }

    println!("{} ({})", routine.name, routine.color);
    for (i, stretch) in sorted.iter().enumerate() {
        let sides = if stretch.switch_sides { "  [both sides]" } else { "" };
        println!(
            "{:>3}. {:<32} {:>6}{sides}",
            i + 1,
            stretch.name,
            format_countdown(stretch.duration_seconds)
        );
    }
    let total = u32::try_from(routine.total_seconds()).unwrap_or(u32::MAX);
    println!("     {:<32} {:>6}", "total", format_countdown(total));
    Ok(())
}
