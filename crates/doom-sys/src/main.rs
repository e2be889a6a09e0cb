// Entry point: parse the command line, load the archives, then run game
// tics against the wall clock until the session asks to quit.
//
// There is no window here. Frames and sound go to the null sinks; stdin
// lines stand in for a keyboard so a headless run can be paused or quit.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver};
use crossbeam::select;

use doom_common::common::{com_printf, set_console_sink};
use doom_common::d_config::{find_iwad, DoomConfig};
use doom_common::d_event::{Event, EventQueueSender};
use doom_common::doom_error::{DoomError, DoomResult};
use doom_common::doomdef::{KEY_ESCAPE, KEY_PAUSE, KEY_RCTRL, TICRATE};
use doom_common::i_system::{ConsoleSink, NullGraphics, NullSound};
use doom_common::m_argv::ComArgs;
use doom_game::d_main::DoomMain;
use doom_game::g_demo::FileDemoSink;

/// Console output straight to the terminal.
struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn write(&mut self, text: &str) {
        let mut out = io::stdout().lock();
        let _ = out.write_all(text.as_bytes());
        let _ = out.flush();
    }

    fn set_title(&mut self, title: &str) {
        log::info!("title: {}", title.trim());
    }
}

/// What a line typed on stdin means.
enum Command {
    Key(i32),
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "q" | "quit" => Some(Command::Quit),
        "p" | "pause" => Some(Command::Key(KEY_PAUSE)),
        "f" | "fire" => Some(Command::Key(KEY_RCTRL)),
        "" | "esc" => Some(Command::Key(KEY_ESCAPE)),
        _ => None,
    }
}

/// Reads stdin on its own thread. Keys go to the event queue as a press and
/// release; a quit request comes back over the returned channel.
fn spawn_input_thread(events: EventQueueSender) -> Receiver<()> {
    let (quit_tx, quit_rx) = channel::bounded(1);
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(Command::Key(key)) => {
                    events.post_event(Event::key_down(key));
                    events.post_event(Event::key_up(key));
                }
                Some(Command::Quit) => {
                    let _ = quit_tx.try_send(());
                    break;
                }
                None => log::debug!("unknown input {:?}", line),
            }
        }
    });
    quit_rx
}

fn run(mut config: DoomConfig) -> DoomResult<()> {
    if config.iwad.is_none() {
        config.iwad = std::env::current_dir().ok().and_then(|dir| find_iwad(&dir));
    }
    let max_tics = config.max_tics;

    let mut doom = DoomMain::new(
        config,
        Box::new(NullGraphics::default()),
        Box::new(NullSound::default()),
        Box::new(FileDemoSink::new(".")),
    )?;

    let quit = spawn_input_thread(doom.event_sender());
    let ticker = channel::tick(Duration::from_secs(1) / TICRATE as u32);
    let start = Instant::now();

    'main: loop {
        select! {
            recv(ticker) -> _ => {}
            recv(quit) -> _ => break 'main,
        }

        // run every tic that is due, so a slow frame does not slow the game
        let due = (start.elapsed().as_secs_f64() * TICRATE as f64) as u64 + 1;
        while doom.tics_run < due {
            if doom.finished() || max_tics.is_some_and(|max| doom.tics_run >= max) {
                break 'main;
            }
            doom.run_tic()?;
        }
    }

    log::info!("ran {} tics in {:.1}s", doom.tics_run, start.elapsed().as_secs_f64());
    doom.shutdown()
}

/// Console text for an error that ended the run. Fatal errors were already
/// printed by `i_error` when they were raised.
fn exit_message(err: &DoomError) -> Option<String> {
    match err {
        DoomError::Fatal(_) => None,
        other => Some(format!("{}\n", other)),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    set_console_sink(Box::new(StdoutConsole));

    let args = ComArgs::from_args(std::env::args());
    let config = DoomConfig::from_args(&args);

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(msg) = exit_message(&err) {
                com_printf(&msg);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors_are_not_printed_twice() {
        assert_eq!(exit_message(&DoomError::Fatal("Z_Malloc failure".into())), None);
        assert_eq!(
            exit_message(&DoomError::LumpNotFound("DEMO4".into())).as_deref(),
            Some("W_GetNumForName: DEMO4 not found!\n")
        );
    }

    #[test]
    fn test_parse_command() {
        assert!(matches!(parse_command(" q "), Some(Command::Quit)));
        assert!(matches!(parse_command("pause"), Some(Command::Key(KEY_PAUSE))));
        assert!(matches!(parse_command(""), Some(Command::Key(KEY_ESCAPE))));
        assert!(parse_command("jump").is_none());
    }
}
