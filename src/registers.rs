//! Hardware register toggles.
//!
//! Two menu screens flip hardware-control registers: the status-LED blink
//! pattern and the power-management interrupt mask. Both go through the same
//! read-modify-write commit: open a service session, read the current bytes,
//! apply a transform, write them back, drop the session.
//!
//! A failed write is never surfaced to the operator. The screens render from
//! a fresh read on the next pass, so the display converges on whatever the
//! hardware actually holds.

use log::warn;

use crate::input::{InputSource, KEY_A, KEY_B};
use crate::menu::MenuFrame;
use crate::render::{line_y, RenderSurface, TextColor, MARGIN_X, STATUS_X, TITLE_Y};
use crate::services::{RegisterService, RegisterSession};

/// Widest register any screen touches, in bytes.
pub const MAX_REGISTER_WIDTH: usize = 4;

/// Address and width of one hardware-control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterSpec {
    pub address: u8,
    pub width: usize,
}

/// Status-LED blink pattern register.
pub const LED_PATTERN: RegisterSpec = RegisterSpec {
    address: 0x28,
    width: 1,
};

/// Power-management interrupt mask. Bit 0 set means the power-button press
/// interrupt is suppressed.
pub const POWER_IRQ_MASK: RegisterSpec = RegisterSpec {
    address: 0x18,
    width: 4,
};

/// Bit of [`POWER_IRQ_MASK`] controlling the power button.
pub const POWER_BUTTON_BIT: u8 = 0;

/// How a commit rewrites the register bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Bitwise NOT of every byte.
    InvertBytes,
    /// XOR a single bit, counted from bit 0 of the first byte.
    ToggleBit(u8),
}

impl Transform {
    pub fn apply(self, bytes: &mut [u8]) {
        match self {
            Self::InvertBytes => {
                for byte in bytes.iter_mut() {
                    *byte = !*byte;
                }
            }
            Self::ToggleBit(bit) => {
                let index = (bit / 8) as usize;
                if index < bytes.len() {
                    bytes[index] ^= 1 << (bit % 8);
                }
            }
        }
    }
}

/// One read-modify-write commit against `spec`.
///
/// Returns the bytes handed to the write, or `None` when the session or the
/// read failed. A rejected write is logged and otherwise ignored: the next
/// render re-reads ground truth, which also re-syncs the view.
pub fn toggle_register<R: RegisterService>(
    registers: &mut R,
    spec: RegisterSpec,
    transform: Transform,
) -> Option<[u8; MAX_REGISTER_WIDTH]> {
    debug_assert!(spec.width <= MAX_REGISTER_WIDTH);

    let mut session = match registers.open() {
        Ok(session) => session,
        Err(err) => {
            warn!("[registers] hardware-control service unavailable: {err}");
            return None;
        }
    };

    let mut value = [0u8; MAX_REGISTER_WIDTH];
    let bytes = &mut value[..spec.width];
    if let Err(err) = session.read_register(spec.address, bytes) {
        warn!("[registers] read of {:#04x} failed: {err}", spec.address);
        return None;
    }

    transform.apply(bytes);

    if let Err(err) = session.write_register(spec.address, bytes) {
        warn!("[registers] write to {:#04x} failed: {err}", spec.address);
    }
    Some(value)
}

/// Fresh read of `spec`, zeros when the service or the read fails.
fn read_register<R: RegisterService>(
    registers: &mut R,
    spec: RegisterSpec,
) -> [u8; MAX_REGISTER_WIDTH] {
    let mut value = [0u8; MAX_REGISTER_WIDTH];
    match registers.open() {
        Ok(mut session) => {
            if let Err(err) = session.read_register(spec.address, &mut value[..spec.width]) {
                warn!("[registers] read of {:#04x} failed: {err}", spec.address);
            }
        }
        Err(err) => warn!("[registers] hardware-control service unavailable: {err}"),
    }
    value
}

/// LED toggle screen: commit inverts the whole blink-pattern byte.
pub fn led_screen<I, S, R>(frame: &mut MenuFrame<'_, I, S>, registers: &mut R)
where
    I: InputSource,
    S: RenderSurface,
    R: RegisterService,
{
    frame.screen.wipe();

    loop {
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Toggle LEDs");
            surface.draw_text(MARGIN_X, line_y(0), TextColor::White, "A: toggle  B: back");
            surface.draw_text(MARGIN_X, line_y(1), TextColor::Red, "Warning:");
            surface.draw_text(
                MARGIN_X,
                line_y(2),
                TextColor::White,
                "  * LED state resets when entering sleep mode.",
            );
            surface.draw_text(
                MARGIN_X,
                line_y(3),
                TextColor::White,
                "  * Unavailable while the battery is low.",
            );
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_A) {
            toggle_register(registers, LED_PATTERN, Transform::InvertBytes);
        } else if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}

/// Power-button screen: commit flips bit 0 of the interrupt mask.
///
/// The displayed mask is read once on entry and refreshed by the re-read
/// each commit performs, not on every frame.
pub fn power_button_screen<I, S, R>(frame: &mut MenuFrame<'_, I, S>, registers: &mut R)
where
    I: InputSource,
    S: RenderSurface,
    R: RegisterService,
{
    frame.screen.wipe();

    let mut irq_mask = read_register(registers, POWER_IRQ_MASK);

    loop {
        let suppressed = irq_mask[0] & (1 << POWER_BUTTON_BIT) != 0;
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Power button state");
            surface.draw_text(MARGIN_X, line_y(0), TextColor::White, "A: toggle  B: back");
            surface.draw_text(MARGIN_X, line_y(1), TextColor::White, "Current status:");
            let (color, label) = if suppressed {
                (TextColor::Red, " Disabled ")
            } else {
                (TextColor::Green, " Enabled ")
            };
            surface.draw_text(STATUS_X, line_y(1), color, label);
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_A) {
            if let Some(value) =
                toggle_register(registers, POWER_IRQ_MASK, Transform::ToggleBit(POWER_BUTTON_BIT))
            {
                irq_mask = value;
            }
        } else if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::menu::MenuFrame;
    use crate::render::Screen;
    use crate::services::sim::{RecordingSurface, ScriptedInput, SimRegisters};
    use tokio_util::sync::CancellationToken;

    fn run_led(registers: &SimRegisters, script: &[u32]) {
        let mut registers = registers.clone();
        let mut input = ScriptedInput::new(script.iter().copied());
        let screen = Screen::new(RecordingSurface::default());
        let cancel = CancellationToken::new();
        let mut frame = MenuFrame::new(&mut input, &screen, &cancel);
        led_screen(&mut frame, &mut registers);
    }

    fn run_power(registers: &SimRegisters, script: &[u32]) -> RecordingSurface {
        let mut registers = registers.clone();
        let mut input = ScriptedInput::new(script.iter().copied());
        let screen = Screen::new(RecordingSurface::default());
        let cancel = CancellationToken::new();
        let mut frame = MenuFrame::new(&mut input, &screen, &cancel);
        power_button_screen(&mut frame, &mut registers);
        screen.into_inner()
    }

    // ==================== Transform Tests ====================

    #[test]
    fn test_invert_bytes() {
        let mut bytes = [0b1011_0100];
        Transform::InvertBytes.apply(&mut bytes);
        assert_eq!(bytes, [0b0100_1011]);
    }

    #[test]
    fn test_toggle_bit_touches_only_that_bit() {
        let mut bytes = [0x04, 0xFF, 0x00, 0x80];
        Transform::ToggleBit(0).apply(&mut bytes);
        assert_eq!(bytes, [0x05, 0xFF, 0x00, 0x80]);
        Transform::ToggleBit(0).apply(&mut bytes);
        assert_eq!(bytes, [0x04, 0xFF, 0x00, 0x80]);
    }

    #[test]
    fn test_toggle_bit_out_of_range_is_ignored() {
        let mut bytes = [0x00];
        Transform::ToggleBit(8).apply(&mut bytes);
        assert_eq!(bytes, [0x00]);
    }

    // ==================== Commit Tests ====================

    #[test]
    fn test_toggle_register_round_trips() {
        let mut registers = SimRegisters::new();
        registers.set(LED_PATTERN.address, &[0xAA]);

        toggle_register(&mut registers, LED_PATTERN, Transform::InvertBytes);
        assert_eq!(registers.get(LED_PATTERN.address), vec![0x55]);

        toggle_register(&mut registers, LED_PATTERN, Transform::InvertBytes);
        assert_eq!(registers.get(LED_PATTERN.address), vec![0xAA]);
    }

    #[test]
    fn test_rejected_write_leaves_register_untouched() {
        let mut registers = SimRegisters::new();
        registers.set(LED_PATTERN.address, &[0xAA]);
        registers.reject_writes(true);

        // The commit still reports the bytes it tried to write.
        let attempted = toggle_register(&mut registers, LED_PATTERN, Transform::InvertBytes);
        assert_eq!(attempted.map(|v| v[0]), Some(0x55));
        assert_eq!(registers.get(LED_PATTERN.address), vec![0xAA]);
    }

    // ==================== Screen Tests ====================

    #[test]
    fn test_led_commits_follow_parity() {
        let registers = SimRegisters::new();
        registers.set(LED_PATTERN.address, &[0b1100_0011]);

        // One commit: complement.
        run_led(&registers, &[KEY_A, KEY_B]);
        assert_eq!(registers.get(LED_PATTERN.address), vec![0b0011_1100]);

        // Two more commits: back to the complement of the initial value.
        run_led(&registers, &[KEY_A, KEY_A, KEY_B]);
        assert_eq!(registers.get(LED_PATTERN.address), vec![0b0011_1100]);
    }

    #[test]
    fn test_power_button_mask_flips_bit_zero_only() {
        let registers = SimRegisters::new();
        registers.set(POWER_IRQ_MASK.address, &[0x04, 0x10, 0x00, 0x00]);

        let surface = run_power(&registers, &[KEY_A, KEY_B]);
        assert_eq!(
            registers.get(POWER_IRQ_MASK.address),
            vec![0x05, 0x10, 0x00, 0x00]
        );
        // Display reflects the commit-time re-read.
        assert!(surface.contains(" Disabled "));

        let surface = run_power(&registers, &[KEY_A, KEY_B]);
        assert_eq!(
            registers.get(POWER_IRQ_MASK.address),
            vec![0x04, 0x10, 0x00, 0x00]
        );
        assert!(surface.contains(" Enabled "));
    }

    #[test]
    fn test_exit_signal_leaves_led_screen() {
        let mut registers = SimRegisters::new();
        registers.set(LED_PATTERN.address, &[0x00]);

        let cancel = CancellationToken::new();
        let mut input =
            ScriptedInput::new([KEY_A]).cancel_when_exhausted(cancel.clone());
        let screen = Screen::new(RecordingSurface::default());
        let mut frame = MenuFrame::new(&mut input, &screen, &cancel);
        led_screen(&mut frame, &mut registers);

        // The loop ran the one scripted commit and then left on the signal.
        assert_eq!(registers.get(LED_PATTERN.address), vec![0xFF]);
    }
}
