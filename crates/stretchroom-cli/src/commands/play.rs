use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use stretchroom_core::{
    format_countdown, load_routine, Config, CueSequencer, Event, PlayState, PlaybackEngine,
    Routine, ValidationError,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

#[derive(Args)]
pub struct PlayArgs {
    /// Routine file (.json or .toml)
    file: PathBuf,
    /// Platform profile, overriding the config ("native" or "browser")
    #[arg(long)]
    profile: Option<String>,
    /// Print events as JSON lines instead of a live countdown
    #[arg(long)]
    json: bool,
    /// Chime only, no spoken announcements
    #[arg(long)]
    no_speech: bool,
}

/// Commands typed at the player prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Play when paused, pause when playing.
    Toggle,
    Play,
    Pause,
    Skip,
    Back,
    Restart,
    Quit,
}

pub fn parse_command(line: &str) -> Option<PlayerCommand> {
    let command = match line.trim().to_ascii_lowercase().as_str() {
        "" | "p" => PlayerCommand::Toggle,
        "play" | "resume" => PlayerCommand::Play,
        "pause" => PlayerCommand::Pause,
        "s" | "n" | "skip" | "next" => PlayerCommand::Skip,
        "b" | "back" | "prev" => PlayerCommand::Back,
        "r" | "restart" => PlayerCommand::Restart,
        "q" | "quit" | "stop" => PlayerCommand::Quit,
        _ => return None,
    };
    Some(command)
}

const HELP: &str = "enter/p: play-pause  s: skip  b: back  r: restart  q: quit";

pub fn run(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let routine = load_routine(&args.file)?;
    if routine.stretches.is_empty() {
        return Err(ValidationError::EmptyCollection(format!(
            "routine '{}' has no stretches",
            routine.name
        ))
        .into());
    }

    let mut config = Config::load_or_default();
    if let Some(profile) = &args.profile {
        config.set("platform.profile", profile)?;
    }
    if args.no_speech {
        config.speech.enabled = false;
    }
    let cues = config.cue_sequencer()?;
    tracing::debug!(profile = ?cues.profile(), "audio configured");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(routine, cues, args.json))
}

async fn session(
    routine: Routine,
    cues: CueSequencer,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let title = routine.name.clone();
    let mut engine = PlaybackEngine::new(&routine.stretches, cues).with_on_finish(move || {
        tracing::info!(routine = %title, "routine completed");
    });
    let mut display = Display { json, name: routine.name };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    if !json {
        eprintln!("{HELP}");
    }
    // Starting from the command line counts as the user gesture.
    if let Some(event) = engine.gesture_start() {
        display.event(&engine, &event)?;
    }
    ticker.reset();

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match engine.tick() {
                    Some(event) => display.event(&engine, &event)?,
                    None if engine.state() == PlayState::Playing => display.status(&engine)?,
                    None => {}
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line {
                    Ok(Some(line)) => {
                        let Some(command) = parse_command(&line) else {
                            eprintln!("unknown command '{}'; {HELP}", line.trim());
                            continue;
                        };
                        if command == PlayerCommand::Quit {
                            if let Some(event) = engine.stop() {
                                display.event(&engine, &event)?;
                            }
                            break;
                        }
                        if let Some(event) = apply(&mut engine, command) {
                            // A re-armed countdown gets a full first second.
                            ticker.reset();
                            display.event(&engine, &event)?;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin closed");
                        stdin_open = false;
                    }
                }
            }
        }

        if !stdin_open && !keeps_running(engine.state()) {
            // Without input nothing can resume a paused session.
            if engine.state() != PlayState::Finished {
                if let Some(event) = engine.stop() {
                    display.event(&engine, &event)?;
                }
            }
            break;
        }
    }
    Ok(())
}

/// Whether a session with no more input still has ticks to run.
fn keeps_running(state: PlayState) -> bool {
    state == PlayState::Playing
}

fn apply(engine: &mut PlaybackEngine, command: PlayerCommand) -> Option<Event> {
    match command {
        PlayerCommand::Toggle if engine.state() == PlayState::Playing => engine.pause(),
        PlayerCommand::Toggle | PlayerCommand::Play => engine.gesture_start(),
        PlayerCommand::Pause => engine.pause(),
        PlayerCommand::Skip => engine.skip(),
        PlayerCommand::Back => engine.back(),
        PlayerCommand::Restart => engine.restart(),
        PlayerCommand::Quit => engine.stop(),
    }
}

/// `[2/5] Hamstring  0:18` plus the state when not playing.
pub fn status_line(engine: &PlaybackEngine) -> String {
    let name = engine.current_stretch().map(|s| s.name.as_str()).unwrap_or("");
    let mut line = format!(
        "[{}/{}] {}  {}",
        engine.current_index() + 1,
        engine.total_count(),
        name,
        format_countdown(engine.seconds_remaining())
    );
    match engine.state() {
        PlayState::Playing => {}
        PlayState::Paused => line.push_str("  (paused)"),
        PlayState::Idle => line.push_str("  (stopped)"),
        PlayState::Finished => line.push_str("  (finished)"),
    }
    line
}

struct Display {
    json: bool,
    name: String,
}

impl Display {
    fn event(&mut self, engine: &PlaybackEngine, event: &Event) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.json {
            let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
            writeln!(out, "{line}")?;
            return out.flush();
        }
        match event {
            Event::RoutineFinished { .. } => {
                writeln!(out, "\nDone! You completed {}", self.name)?;
                writeln!(out, "r: go again  q: quit")?;
            }
            Event::Stopped { .. } => writeln!(out)?,
            _ => {
                write!(out, "\n{}", status_line(engine))?;
            }
        }
        out.flush()
    }

    fn status(&mut self, engine: &PlaybackEngine) -> std::io::Result<()> {
        if self.json {
            return Ok(());
        }
        let mut out = std::io::stdout().lock();
        // Overwrite the current line; pad to clear a longer previous one.
        write!(out, "\r{:<60}", status_line(engine))?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stretchroom_core::Stretch;

    #[test]
    fn parses_short_and_long_commands() {
        assert_eq!(parse_command(""), Some(PlayerCommand::Toggle));
        assert_eq!(parse_command(" P "), Some(PlayerCommand::Toggle));
        assert_eq!(parse_command("skip"), Some(PlayerCommand::Skip));
        assert_eq!(parse_command("b"), Some(PlayerCommand::Back));
        assert_eq!(parse_command("Restart"), Some(PlayerCommand::Restart));
        assert_eq!(parse_command("q"), Some(PlayerCommand::Quit));
        assert_eq!(parse_command("jump"), None);
    }

    fn engine() -> PlaybackEngine {
        PlaybackEngine::new(
            &[Stretch::new("Neck", 75, 0), Stretch::new("Calf", 30, 1)],
            CueSequencer::silent(),
        )
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let mut engine = engine();
        assert!(matches!(
            apply(&mut engine, PlayerCommand::Toggle),
            Some(Event::StretchStarted { .. })
        ));
        assert!(matches!(
            apply(&mut engine, PlayerCommand::Toggle),
            Some(Event::Paused { .. })
        ));
        assert!(matches!(
            apply(&mut engine, PlayerCommand::Toggle),
            Some(Event::Resumed { .. })
        ));
    }

    #[test]
    fn only_playing_sessions_outlive_their_input() {
        assert!(keeps_running(PlayState::Playing));
        assert!(!keeps_running(PlayState::Paused));
        assert!(!keeps_running(PlayState::Idle));
        assert!(!keeps_running(PlayState::Finished));
    }

    #[test]
    fn status_line_shows_progress_and_state() {
        let mut engine = engine();
        engine.play(false);
        assert_eq!(status_line(&engine), "[1/2] Neck  1:15");
        engine.skip();
        engine.pause();
        assert_eq!(status_line(&engine), "[2/2] Calf  30  (paused)");
    }
}
