//! Scripted end-to-end run of the configuration menu against simulated
//! services.
//!
//! Walks every menu entry the way an operator would and logs the resulting
//! hardware state. Run with:
//!
//! ```text
//! RUST_LOG=info cargo run --features sim --bin sysconfig-sim
//! ```

use log::info;
use tokio_util::sync::CancellationToken;

use sysconfig_menu::input::{KEY_A, KEY_B, KEY_RIGHT};
use sysconfig_menu::registers::{LED_PATTERN, POWER_IRQ_MASK};
use sysconfig_menu::services::sim::{
    RecordingSurface, ScriptedInput, SimNetwork, SimProcesses, SimRegisters, SimWireless,
};
use sysconfig_menu::{MenuEntry, MenuFrame, Screen, SysconfigMenu, MENU_ENTRIES, MENU_TITLE};

fn main() {
    env_logger::init();

    let registers = SimRegisters::new();
    registers.set(LED_PATTERN.address, &[0x55]);
    registers.set(POWER_IRQ_MASK.address, &[0x01, 0x00, 0x00, 0x00]);

    let processes = SimProcesses::with_names(&["loader", "fs", "pm", "menu", "nwm"]);
    let wireless = SimWireless::new(false);
    let network = SimNetwork::establishing("SIMNET");

    let mut menu = SysconfigMenu::new(
        registers.clone(),
        processes,
        wireless.clone(),
        network.clone(),
    );

    info!("{MENU_TITLE}: entries in order:");
    for entry in MENU_ENTRIES {
        info!("  - {}", menu.label(entry));
    }

    // One operator pass: toggle the LEDs, enable the radio, re-enable the
    // power button, force a connection on slot 2, then release it.
    let passes: [(MenuEntry, &[u32]); 5] = [
        (MenuEntry::LedToggle, &[KEY_A, KEY_B]),
        (MenuEntry::WirelessToggle, &[KEY_A, KEY_B]),
        (MenuEntry::PowerButtonToggle, &[KEY_A, KEY_B]),
        (MenuEntry::WifiConnection, &[KEY_RIGHT, KEY_A, KEY_B]),
        (MenuEntry::WifiConnection, &[KEY_B]),
    ];

    for (entry, script) in passes {
        info!("entering '{}'", menu.label(entry));
        let cancel = CancellationToken::new();
        let mut input =
            ScriptedInput::new(script.iter().copied()).cancel_when_exhausted(cancel.clone());
        let screen = Screen::new(RecordingSurface::default());
        let mut frame = MenuFrame::new(&mut input, &screen, &cancel);
        menu.activate(entry, &mut frame);

        let surface = screen.into_inner();
        for (_, _, _, text) in surface.lines() {
            info!("    | {text}");
        }
    }

    info!(
        "final state: led={:#04x} irq_mask={:02x?} radio_enabled={} forced={} open_sessions={}",
        registers.get(LED_PATTERN.address).first().copied().unwrap_or(0),
        registers.get(POWER_IRQ_MASK.address),
        wireless.enabled(),
        menu.connection_forced(),
        network.open_sessions(),
    );
}
