use crate::app::{ui_state, AppState, CapturePhase, UiState};
use crate::payload::{human_size, CapturedAudio, MediaType};

const RULE: &str = "----------------------------------------";

pub fn print_banner(state: &AppState) {
    println!("soundcheck: record or pick an audio clip and send it for analysis");
    println!("service: {}", state.config.server_url);
    if !state.capture_supported {
        flash_hint(
            "no audio input device found: recording is disabled, file selection still works",
        );
    }
    println!("type 'help' for commands");
}

pub fn print_help(state: &AppState) {
    println!("commands:");
    println!(
        "  record        capture a clip from the microphone ({}s countdown, {}s max)",
        state.config.countdown_ticks, state.config.recording_budget_secs
    );
    println!("  stop          end the recording before the time runs out");
    println!("  keep          make the recorded clip the one to submit");
    println!("  discard       drop the recorded clip");
    println!(
        "  file <path>   choose an audio file ({}; up to {})",
        MediaType::allowed_list(),
        human_size(state.config.max_payload_bytes)
    );
    println!("  submit        send the clip to {}", state.config.server_url);
    println!("  status        show where the widget is");
    println!("  quit          exit");
}

pub fn print_status(state: &AppState) {
    let phase = match state.phase {
        CapturePhase::Idle => "idle".to_string(),
        CapturePhase::Countdown { remaining } => {
            format!("countdown, recording starts in {remaining}s")
        }
        CapturePhase::Recording { remaining } => format!("recording, {remaining}s left"),
        CapturePhase::Previewing => "previewing a recorded clip".to_string(),
        CapturePhase::Committed => "recorded clip ready to submit".to_string(),
        CapturePhase::FileSelected => "file ready to submit".to_string(),
        CapturePhase::Submitting => "waiting for the analysis service".to_string(),
    };
    println!("state: {phase}");

    match (&state.payload, &state.preview) {
        (Some(clip), _) => println!(
            "clip:  {}, captured {}",
            describe_clip(clip),
            clip.captured_at
        ),
        (None, Some(clip)) => println!("clip:  {} (not kept yet)", describe_clip(clip)),
        (None, None) => println!("clip:  none"),
    }

    println!("ready: {}", available_commands(ui_state(state)).join(", "));
}

pub fn print_countdown(remaining: u32) {
    println!("recording in {remaining}...");
}

pub fn print_recording_started(budget_secs: u32) {
    println!("recording now ({budget_secs}s max, 'stop' ends it early)");
}

pub fn print_recording_tick(remaining: u32) {
    println!("recording... {remaining}s left");
}

pub fn print_preview(clip: &CapturedAudio) {
    println!("clip captured: {}", describe_clip(clip));
    println!("'keep' makes it the clip to submit, 'discard' throws it away");
}

pub fn print_committed(clip: &CapturedAudio) {
    println!("kept {}; 'submit' sends it for analysis", clip.filename);
}

pub fn print_discarded() {
    println!("recording discarded");
}

pub fn print_file_selected(clip: &CapturedAudio) {
    println!("selected {}; 'submit' sends it for analysis", describe_clip(clip));
}

pub fn print_submitting(clip: &CapturedAudio) {
    println!("analyzing {}, waiting for the service...", clip.filename);
}

/// Render the service's response wholesale, set off from the command flow.
pub fn print_report(body: &str) {
    let trimmed = body.trim();
    println!("{RULE}");
    if trimmed.is_empty() {
        println!("(the service returned an empty response)");
    } else {
        println!("{trimmed}");
    }
    println!("{RULE}");
}

/// Transient error line. Takes anything displayable so both `CaptureError`
/// values and pre-rendered failure strings land in the same place.
pub fn flash_error(err: &dyn std::fmt::Display) {
    println!("!! {err}");
}

/// Transient notice that is not an error.
pub fn flash_hint(hint: &str) {
    println!("-- {hint}");
}

/// Notice for a command that cannot run in the current phase.
pub fn flash_busy(phase: CapturePhase) {
    let text = match phase {
        CapturePhase::Countdown { .. } => "hold on, the countdown is running",
        CapturePhase::Recording { .. } => "recording is in progress ('stop' ends it early)",
        CapturePhase::Submitting => "analysis is in progress, hang tight",
        _ => "that is not available right now",
    };
    flash_hint(text);
}

fn describe_clip(clip: &CapturedAudio) -> String {
    match clip.duration_secs {
        Some(secs) => format!(
            "{} ({}, {}, {secs:.1}s)",
            clip.filename,
            clip.media_type.mime(),
            human_size(clip.size_bytes())
        ),
        None => format!(
            "{} ({}, {})",
            clip.filename,
            clip.media_type.mime(),
            human_size(clip.size_bytes())
        ),
    }
}

fn available_commands(ui: UiState) -> Vec<&'static str> {
    let mut commands = Vec::new();
    if ui.can_record {
        commands.push("record");
    }
    if ui.can_stop {
        commands.push("stop");
    }
    if ui.can_keep {
        commands.push("keep");
    }
    if ui.can_discard {
        commands.push("discard");
    }
    if ui.can_choose_file {
        commands.push("file <path>");
    }
    if ui.can_submit {
        commands.push("submit");
    }
    commands.push("status");
    commands.push("help");
    commands.push("quit");
    commands
}
