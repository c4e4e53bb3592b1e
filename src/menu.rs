//! The system-configuration menu: entries, labels, and dispatch.
//!
//! Navigation, highlighting, and text layout belong to the host menu
//! framework; this module owns what is specific to the configuration
//! screens. Entries form a closed set dispatched through one `match`, and
//! the first entry's label and action are derived each time they are asked
//! for from the association state rather than kept in a mutable table.
//!
//! [`MenuFrame`] is the loop frame every screen runs inside: it bundles the
//! input source, the locked drawing surface, and the cooperative exit
//! signal, with the shared poll cadence.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::association::{self, AssociationController};
use crate::input::{InputSource, Keys};
use crate::radio;
use crate::registers;
use crate::render::{RenderSurface, Screen};
use crate::services::{NetworkConfigService, ProcessDirectory, RegisterService, WirelessService};

/// Title of the whole menu.
pub const MENU_TITLE: &str = "System configuration";

/// Poll timeout of every screen loop; also the redraw cadence while idle.
pub const MENU_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Per-screen loop frame: input, locked surface, and the external exit
/// signal, which every loop polls once per iteration.
pub struct MenuFrame<'a, I, S> {
    pub input: &'a mut I,
    pub screen: &'a Screen<S>,
    pub cancel: &'a CancellationToken,
}

impl<'a, I, S> MenuFrame<'a, I, S>
where
    I: InputSource,
    S: RenderSurface,
{
    pub fn new(input: &'a mut I, screen: &'a Screen<S>, cancel: &'a CancellationToken) -> Self {
        Self {
            input,
            screen,
            cancel,
        }
    }

    /// Poll for newly pressed keys at the menu cadence.
    pub fn poll(&mut self) -> Keys {
        self.input.wait_input_with_timeout(MENU_POLL_INTERVAL)
    }

    /// Cooperative exit: true once the host wants every menu loop gone.
    /// An in-progress hardware mutation is not rolled back.
    pub fn should_exit(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// The configuration screens, in menu order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuEntry {
    /// Force or release a Wi-Fi association, depending on current state.
    WifiConnection,
    LedToggle,
    WirelessToggle,
    PowerButtonToggle,
}

/// Fixed entry order presented to the host menu framework.
pub const MENU_ENTRIES: [MenuEntry; 4] = [
    MenuEntry::WifiConnection,
    MenuEntry::LedToggle,
    MenuEntry::WirelessToggle,
    MenuEntry::PowerButtonToggle,
];

/// The system-configuration menu and the services its screens drive.
pub struct SysconfigMenu<R, P, W, N>
where
    N: NetworkConfigService,
{
    registers: R,
    processes: P,
    wireless: W,
    network: N,
    association: AssociationController<N::Session>,
}

impl<R, P, W, N> SysconfigMenu<R, P, W, N>
where
    R: RegisterService,
    P: ProcessDirectory,
    W: WirelessService,
    N: NetworkConfigService,
{
    pub fn new(registers: R, processes: P, wireless: W, network: N) -> Self {
        Self {
            registers,
            processes,
            wireless,
            network,
            association: AssociationController::new(),
        }
    }

    /// True while a forced association is held.
    pub fn connection_forced(&self) -> bool {
        self.association.is_forced()
    }

    /// Label for `entry`, derived from current state.
    pub fn label(&self, entry: MenuEntry) -> &'static str {
        match entry {
            MenuEntry::WifiConnection => {
                if self.association.is_forced() {
                    "Disable forced Wi-Fi connection"
                } else {
                    "Force Wi-Fi connection"
                }
            }
            MenuEntry::LedToggle => "Toggle LEDs",
            MenuEntry::WirelessToggle => "Toggle Wi-Fi",
            MenuEntry::PowerButtonToggle => "Power button state",
        }
    }

    /// Run the screen behind `entry` until it returns.
    pub fn activate<I, S>(&mut self, entry: MenuEntry, frame: &mut MenuFrame<'_, I, S>)
    where
        I: InputSource,
        S: RenderSurface,
    {
        match entry {
            MenuEntry::WifiConnection => {
                if self.association.is_forced() {
                    association::disconnect_screen(frame, &mut self.association);
                } else {
                    association::connection_screen(
                        frame,
                        &mut self.network,
                        &mut self.association,
                    );
                }
            }
            MenuEntry::LedToggle => registers::led_screen(frame, &mut self.registers),
            MenuEntry::WirelessToggle => {
                radio::wireless_screen(frame, &mut self.wireless, &mut self.processes)
            }
            MenuEntry::PowerButtonToggle => {
                registers::power_button_screen(frame, &mut self.registers)
            }
        }
    }
}
