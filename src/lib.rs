//! Interactive system-configuration screens for a device-control overlay.
//!
//! The operator toggles hardware-backed settings (status LEDs, wireless
//! radio, power-button interrupt mask) and can force or release a Wi-Fi
//! association on one of three access-point slots. The host system supplies
//! input polling, drawing, and the hardware/network services; everything it
//! supplies is modeled as a trait in [`services`], [`input`], and
//! [`render`], so the screens themselves are testable on any machine.
//!
//! Settings are live hardware state only: nothing here persists across a
//! power cycle.

pub mod association;
pub mod config;
pub mod input;
pub mod menu;
pub mod presence;
pub mod radio;
pub mod registers;
pub mod render;
pub mod services;

// Re-export commonly used items
pub use association::{AssociationController, AssociationResult, LinkState};
pub use config::{ApSlot, AssociationConfig, EulaVersion};
pub use input::{InputSource, Keys};
pub use menu::{MenuEntry, MenuFrame, SysconfigMenu, MENU_ENTRIES, MENU_TITLE};
pub use render::{RenderSurface, Screen, TextColor};
pub use services::ServiceError;
