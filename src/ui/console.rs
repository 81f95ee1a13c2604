use std::io::BufRead;
use std::path::PathBuf;

use crate::app::WidgetEvent;

/// Start the console reader on a dedicated OS thread. Each recognized line
/// becomes a `WidgetEvent`; the thread exits when stdin or the channel
/// closes.
pub fn start_reader(sender: async_channel::Sender<WidgetEvent>) {
    std::thread::Builder::new()
        .name("console-reader".into())
        .spawn(move || reader_loop(sender))
        .expect("Failed to spawn console thread");
}

fn reader_loop(sender: async_channel::Sender<WidgetEvent>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        match parse_command(&line) {
            Some(event) => {
                if sender.send_blocking(event).is_err() {
                    log::info!("event channel closed, exiting console reader");
                    return;
                }
            }
            None => {
                let trimmed = line.trim();
                if trimmed.eq_ignore_ascii_case("file") || trimmed.eq_ignore_ascii_case("f") {
                    println!("usage: file <path>");
                } else if !trimmed.is_empty() {
                    println!("unrecognized command {trimmed:?} (type 'help' for the list)");
                }
            }
        }
    }

    // stdin is gone; ask the loop to wind down.
    log::info!("stdin closed, requesting shutdown");
    let _ = sender.send_blocking(WidgetEvent::Shutdown);
}

/// Map a console line to a widget event. `None` means the line is empty or
/// not a known command.
pub fn parse_command(line: &str) -> Option<WidgetEvent> {
    let trimmed = line.trim();
    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (trimmed, ""),
    };

    match command.to_ascii_lowercase().as_str() {
        "record" | "rec" | "r" => Some(WidgetEvent::RecordPressed),
        "stop" | "s" => Some(WidgetEvent::StopPressed),
        "keep" | "use" | "k" => Some(WidgetEvent::KeepPressed),
        "discard" | "retry" | "d" => Some(WidgetEvent::DiscardPressed),
        "file" | "f" if !rest.is_empty() => Some(WidgetEvent::FileChosen(PathBuf::from(rest))),
        "submit" | "analyze" => Some(WidgetEvent::SubmitPressed),
        "status" | "st" => Some(WidgetEvent::StatusRequested),
        "help" | "h" | "?" => Some(WidgetEvent::HelpRequested),
        "quit" | "exit" | "q" => Some(WidgetEvent::Shutdown),
        _ => None,
    }
}
