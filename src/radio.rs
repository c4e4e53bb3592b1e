//! Radio enable/disable screen.
//!
//! Two session shapes: with the wireless-management service absent the
//! screen is purely instructional and only "back" works; with it present
//! the enabled flag is re-read from the raw status byte every frame and a
//! commit asks the service for the opposite state.

use log::warn;

use crate::input::{InputSource, KEY_A, KEY_B};
use crate::menu::MenuFrame;
use crate::presence::wireless_module_running;
use crate::render::{line_y, RenderSurface, TextColor, MARGIN_X, STATUS_X, TITLE_Y};
use crate::services::{ProcessDirectory, WirelessService, WirelessSession};

/// Radio toggle screen.
pub fn wireless_screen<I, S, W, P>(
    frame: &mut MenuFrame<'_, I, S>,
    wireless: &mut W,
    processes: &mut P,
) where
    I: InputSource,
    S: RenderSurface,
    W: WirelessService,
    P: ProcessDirectory,
{
    frame.screen.wipe();

    let nwm_running = wireless_module_running(processes);

    loop {
        let enabled = wireless.radio_enabled();
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Toggle Wi-Fi");
            surface.draw_text(MARGIN_X, line_y(0), TextColor::White, "A: toggle  B: back");

            if nwm_running {
                surface.draw_text(MARGIN_X, line_y(1), TextColor::White, "Current status:");
                let (color, label) = if enabled {
                    (TextColor::Green, " Enabled ")
                } else {
                    (TextColor::Red, " Disabled ")
                };
                surface.draw_text(STATUS_X, line_y(1), color, label);
            } else {
                surface.draw_text(
                    MARGIN_X,
                    line_y(1),
                    TextColor::Red,
                    "The wireless service is not running.",
                );
                surface.draw_text(
                    MARGIN_X,
                    line_y(2),
                    TextColor::Red,
                    "In Test Menu, toggle Wi-Fi with R+RIGHT.",
                );
                surface.draw_text(
                    MARGIN_X,
                    line_y(3),
                    TextColor::Red,
                    "Otherwise, try again once it has started.",
                );
            }
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_A) && nwm_running {
            set_radio(wireless, !enabled);
        } else if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}

/// Fire-and-forget enable/disable command.
///
/// The outcome is not checked: the flag rendered on the next pass comes from
/// a fresh status-byte read, so a rejected command corrects itself visually.
fn set_radio<W: WirelessService>(wireless: &mut W, enabled: bool) {
    match wireless.open() {
        Ok(mut session) => {
            if let Err(err) = session.set_enabled(enabled) {
                warn!("[wireless] set_enabled({enabled}) rejected: {err}");
            }
        }
        Err(err) => warn!("[wireless] management service unavailable: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KEY_A, KEY_B};
    use crate::menu::MenuFrame;
    use crate::render::Screen;
    use crate::services::sim::{
        RecordingSurface, ScriptedInput, SimProcesses, SimWireless,
    };
    use tokio_util::sync::CancellationToken;

    fn run(
        wireless: &SimWireless,
        processes: &SimProcesses,
        script: &[u32],
    ) -> RecordingSurface {
        let mut wireless = wireless.clone();
        let mut processes = processes.clone();
        let mut input = ScriptedInput::new(script.iter().copied());
        let screen = Screen::new(RecordingSurface::default());
        let cancel = CancellationToken::new();
        let mut frame = MenuFrame::new(&mut input, &screen, &cancel);
        wireless_screen(&mut frame, &mut wireless, &mut processes);
        screen.into_inner()
    }

    #[test]
    fn test_absent_service_accepts_no_toggle_input() {
        let wireless = SimWireless::new(false);
        let processes = SimProcesses::with_names(&["loader", "fs", "pm", "menu", "home"]);

        let surface = run(&wireless, &processes, &[KEY_A, KEY_A, KEY_B]);

        assert!(wireless.commands().is_empty());
        assert!(surface.contains("The wireless service is not running."));
        assert!(surface.contains("R+RIGHT"));
    }

    #[test]
    fn test_commit_requests_opposite_state() {
        let wireless = SimWireless::new(false);
        let processes = SimProcesses::with_names(&["loader", "nwm"]);

        run(&wireless, &processes, &[KEY_A, KEY_B]);

        assert_eq!(wireless.commands(), vec![true]);
        assert!(wireless.enabled());
    }

    #[test]
    fn test_two_commits_return_to_initial_state() {
        let wireless = SimWireless::new(true);
        let processes = SimProcesses::with_names(&["nwm"]);

        run(&wireless, &processes, &[KEY_A, KEY_A, KEY_B]);

        assert_eq!(wireless.commands(), vec![false, true]);
        assert!(wireless.enabled());
    }

    #[test]
    fn test_status_rendered_from_fresh_read() {
        let wireless = SimWireless::new(true);
        let processes = SimProcesses::with_names(&["nwm"]);

        let surface = run(&wireless, &processes, &[KEY_A, KEY_B]);

        // Last frame re-read the byte the commit had already flipped.
        assert!(surface.contains(" Disabled "));
        assert_eq!(surface.color_of(" Disabled "), Some(TextColor::Red));
    }

    #[test]
    fn test_unavailable_session_is_tolerated() {
        let wireless = SimWireless::new(false);
        wireless.reject_sessions(true);
        let processes = SimProcesses::with_names(&["nwm"]);

        run(&wireless, &processes, &[KEY_A, KEY_B]);

        assert!(wireless.commands().is_empty());
        assert!(!wireless.enabled());
    }
}
