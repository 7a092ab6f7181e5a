//! Interactive focus session driven by single-letter commands on stdin.
//!
//! ```text
//! p        start / pause / resume
//! s        stop
//! b, f     app went to background / came back to foreground
//! y, n, c  answer the open prompt (yes, no, cancel)
//! d N      select an N-minute work duration
//! k NAME   select a category
//! ?        print a state snapshot
//! q        quit
//! ```
//!
//! Every event is printed as one JSON line on stdout. Rejected commands go
//! to stderr.

use clap::Args;
use fokus_core::driver::Outcome;
use fokus_core::{
    Answer, Command, Event, LifecycleEvent, LifecycleMonitor, PlatformState, TimerDriver,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::{open_context, CliResult};

#[derive(Args)]
pub struct FocusArgs {
    /// Work minutes for this session (one of timer.duration_presets)
    #[arg(long)]
    minutes: Option<u32>,
    /// Category for this session
    #[arg(long)]
    category: Option<String>,
    /// Also print the per-second tick events
    #[arg(long)]
    ticks: bool,
}

/// What a line of input asks for.
#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Platform(PlatformState),
    Quit,
}

pub fn run(args: FocusArgs) -> CliResult {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(session(args))
}

async fn session(args: FocusArgs) -> CliResult {
    let ctx = open_context()?;
    let presets = ctx.config().timer.duration_presets.clone();
    let driver = TimerDriver::new(ctx);

    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (life_tx, life_rx) = mpsc::unbounded_channel::<LifecycleEvent>();
    let (ev_tx, ev_rx) = mpsc::channel(64);

    let monitor = LifecycleMonitor::new();
    let _subscription = monitor.subscribe(move |edge| {
        // The driver may already be gone during shutdown.
        let _ = life_tx.send(edge);
    });

    if let Some(minutes) = args.minutes {
        if !presets.contains(&minutes) {
            return Err(format!("--minutes must be one of {presets:?}").into());
        }
        cmd_tx.send(Command::SelectDuration(minutes)).await?;
    }
    if let Some(category) = args.category {
        cmd_tx.send(Command::SelectCategory(category)).await?;
    }
    cmd_tx.send(Command::Snapshot).await?;

    let ui = console(&monitor, cmd_tx, ev_rx, &presets, args.ticks);
    let (ui_result, _ctx) = tokio::join!(ui, driver.run(cmd_rx, life_rx, ev_tx));
    ui_result
}

async fn console(
    monitor: &LifecycleMonitor,
    commands: mpsc::Sender<Command>,
    mut events: mpsc::Receiver<Outcome>,
    presets: &[u32],
    show_ticks: bool,
) -> CliResult {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let input = match line? {
                    Some(line) => parse_input(&line, presets),
                    None => {
                        stdin_open = false;
                        Ok(Some(Input::Quit))
                    }
                };
                match input {
                    Ok(Some(Input::Command(command))) => {
                        if commands.send(command).await.is_err() {
                            break;
                        }
                    }
                    Ok(Some(Input::Platform(state))) => {
                        monitor.notify(state);
                    }
                    Ok(Some(Input::Quit)) => {
                        stdin_open = false;
                        let _ = commands.send(Command::Shutdown).await;
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{message}"),
                }
            }
            outcome = events.recv() => match outcome {
                None => break,
                Some(Ok(event)) => {
                    if show_ticks || !matches!(event, Event::Ticked { .. }) {
                        println!("{}", serde_json::to_string(&event)?);
                    }
                }
                Some(Err(e)) => eprintln!("rejected: {e}"),
            },
        }
    }
    Ok(())
}

fn parse_input(line: &str, presets: &[u32]) -> Result<Option<Input>, String> {
    let line = line.trim();
    let (head, rest) = line
        .split_once(char::is_whitespace)
        .map(|(h, r)| (h, r.trim()))
        .unwrap_or((line, ""));

    let input = match head {
        "" => return Ok(None),
        "p" => Input::Command(Command::Toggle),
        "s" => Input::Command(Command::Stop),
        "b" => Input::Platform(PlatformState::Background),
        "f" => Input::Platform(PlatformState::Active),
        "?" => Input::Command(Command::Snapshot),
        "q" => Input::Quit,
        "d" => {
            let minutes: u32 = rest
                .parse()
                .map_err(|_| format!("expected minutes after d, got {rest:?}"))?;
            if !presets.contains(&minutes) {
                return Err(format!("duration must be one of {presets:?}"));
            }
            Input::Command(Command::SelectDuration(minutes))
        }
        "k" if !rest.is_empty() => Input::Command(Command::SelectCategory(rest.to_string())),
        "y" => Input::Command(Command::Answer(Answer::Yes)),
        "n" => Input::Command(Command::Answer(Answer::No)),
        "c" => Input::Command(Command::Answer(Answer::Cancel)),
        other => return Err(format!("unknown command: {other}")),
    };
    Ok(Some(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRESETS: &[u32] = &[15, 25, 45, 60];

    #[test]
    fn test_parse_basic_letters() {
        assert_eq!(
            parse_input("p", PRESETS),
            Ok(Some(Input::Command(Command::Toggle)))
        );
        assert_eq!(
            parse_input(" b ", PRESETS),
            Ok(Some(Input::Platform(PlatformState::Background)))
        );
        assert_eq!(parse_input("", PRESETS), Ok(None));
        assert_eq!(parse_input("q", PRESETS), Ok(Some(Input::Quit)));
        assert!(parse_input("x", PRESETS).is_err());
    }

    #[test]
    fn test_parse_duration_checks_presets() {
        assert_eq!(
            parse_input("d 45", PRESETS),
            Ok(Some(Input::Command(Command::SelectDuration(45))))
        );
        assert!(parse_input("d 30", PRESETS).is_err());
        assert!(parse_input("d", PRESETS).is_err());
    }

    #[test]
    fn test_parse_category_keeps_spaces() {
        assert_eq!(
            parse_input("k Side Project", PRESETS),
            Ok(Some(Input::Command(Command::SelectCategory(
                "Side Project".into()
            ))))
        );
    }

    #[test]
    fn test_prompt_answers() {
        assert_eq!(
            parse_input("y", PRESETS),
            Ok(Some(Input::Command(Command::Answer(Answer::Yes))))
        );
        assert_eq!(
            parse_input("c", PRESETS),
            Ok(Some(Input::Command(Command::Answer(Answer::Cancel))))
        );
        assert!(parse_input("k", PRESETS).is_err());
    }
}
