//! Interactive focus session driven by line commands on stdin.
//!
//! Domain events are printed as one JSON object per line on stdout while the
//! session runs; `hide`/`show` stand in for the host losing and regaining
//! focus.

use focusarena_core::session::{self, ArenaOptions};
use focusarena_core::{reward, Config, Database, Event, FocusMode, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::CommandResult;

const LAST_MODE_KEY: &str = "session.last_mode";

/// One parsed line of user input.
#[derive(Debug, PartialEq)]
enum Input {
    Start,
    Pause,
    Resume,
    GiveUp,
    Reset,
    Hide,
    Show,
    Mode(String),
    Status,
    Quit,
    Blank,
    Unknown(String),
}

impl Input {
    fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Input::Blank;
        };
        match head.to_ascii_lowercase().as_str() {
            "start" => Input::Start,
            "pause" => Input::Pause,
            "resume" => Input::Resume,
            "give-up" | "giveup" => Input::GiveUp,
            "reset" => Input::Reset,
            "hide" => Input::Hide,
            "show" => Input::Show,
            "mode" => Input::Mode(words.next().unwrap_or_default().to_string()),
            "status" => Input::Status,
            "quit" | "exit" => Input::Quit,
            _ => Input::Unknown(line.trim().to_string()),
        }
    }
}

pub fn run(mode: Option<&str>) -> CommandResult {
    let config = Config::load()?;
    let db = Database::open()?;

    let mode = match mode {
        Some(id) => {
            let mode: FocusMode = id.parse()?;
            db.kv_set(LAST_MODE_KEY, mode.id())?;
            mode
        }
        None => db
            .kv_get(LAST_MODE_KEY)?
            .and_then(|id| id.parse().ok())
            .unwrap_or(config.session.default_mode),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(drive(&config, &db, mode))
}

async fn drive(config: &Config, db: &Database, mode: FocusMode) -> CommandResult {
    let reconciler = reward::from_config(config)?;
    tracing::info!(reconciler = reconciler.name(), mode = %mode, "focus arena ready");

    let options = ArenaOptions {
        mode,
        ..ArenaOptions::from_config(config)
    };
    let (handle, tasks) = session::spawn(reconciler, options);
    let printer = tokio::spawn(print_events(handle.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !dispatch(&handle, db, Input::parse(&line)).await? {
            break;
        }
    }

    handle.shutdown().await?;
    tasks.join().await?;
    drop(handle);
    printer.await?;
    Ok(())
}

/// Forward one input to the session. Returns `false` when the loop should stop.
async fn dispatch(
    handle: &SessionHandle,
    db: &Database,
    input: Input,
) -> Result<bool, Box<dyn std::error::Error>> {
    match input {
        Input::Start => handle.start().await?,
        Input::Pause => handle.pause().await?,
        Input::Resume => handle.resume().await?,
        Input::GiveUp => handle.give_up().await?,
        Input::Reset => handle.reset().await?,
        Input::Hide => handle.hidden().await?,
        Input::Show => handle.visible().await?,
        Input::Mode(id) => match id.parse::<FocusMode>() {
            Ok(mode) => {
                handle.select_mode(mode).await?;
                if let Err(e) = db.kv_set(LAST_MODE_KEY, mode.id()) {
                    tracing::warn!(error = %e, "failed to remember focus mode");
                }
            }
            Err(e) => eprintln!("error: {e}"),
        },
        Input::Status => {
            let status = handle.status().await?;
            println!("{}", serde_json::to_string(&status)?);
        }
        Input::Quit => return Ok(false),
        Input::Blank => {}
        Input::Unknown(line) => eprintln!("unknown command: {line}"),
    }
    Ok(true)
}

async fn print_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::warn!(error = %e, kind = event.kind(), "failed to encode event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event printer fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_session_commands() {
        assert_eq!(Input::parse("start"), Input::Start);
        assert_eq!(Input::parse("  Pause "), Input::Pause);
        assert_eq!(Input::parse("give-up"), Input::GiveUp);
        assert_eq!(Input::parse("hide"), Input::Hide);
        assert_eq!(Input::parse("show"), Input::Show);
        assert_eq!(Input::parse("quit"), Input::Quit);
    }

    #[test]
    fn parses_mode_argument() {
        assert_eq!(Input::parse("mode deep-work"), Input::Mode("deep-work".into()));
        assert_eq!(Input::parse("mode"), Input::Mode(String::new()));
    }

    #[test]
    fn blank_and_unknown_lines() {
        assert_eq!(Input::parse("   "), Input::Blank);
        assert_eq!(Input::parse("dance now"), Input::Unknown("dance now".into()));
    }
}
