//! Forced Wi-Fi association control.
//!
//! A forced connection is an association this menu establishes and holds
//! open outside normal automatic connection management. The controller owns
//! the whole lifecycle:
//!
//! - [`AssociationController::connect`] runs the asynchronous handshake for
//!   one access-point slot and, on success, keeps the service session alive
//!   inside [`LinkState::Forced`].
//! - [`AssociationController::release`] drops that session, which is what
//!   releases the association.
//!
//! The menu layer queries [`AssociationController::is_forced`] every frame
//! to decide whether its first entry reads "connect" or "disconnect".

use std::mem;

use log::{info, warn};
use tokio::sync::oneshot;

use crate::config::{ApSlot, AssociationConfig};
use crate::input::{InputSource, KEY_A, KEY_B, KEY_LEFT, KEY_RIGHT};
use crate::menu::MenuFrame;
use crate::render::{line_y, RenderSurface, TextColor, MARGIN_X, TITLE_Y};
use crate::services::{AssociationSession, NetworkConfigService};

/// Outcome of one handshake attempt, rendered once and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationResult {
    /// Slot the attempt targeted.
    pub slot: ApSlot,
    /// Negotiated network name; present exactly when the attempt succeeded.
    pub ssid: Option<String>,
}

impl AssociationResult {
    pub fn succeeded(&self) -> bool {
        self.ssid.is_some()
    }
}

/// Whether a forced association is currently held.
pub enum LinkState<S> {
    Disconnected,
    /// The session value keeps the underlying service session open; dropping
    /// it would drop the forced association.
    Forced { session: S, ssid: String },
}

/// Owner of the forced-connection state.
pub struct AssociationController<S> {
    state: LinkState<S>,
}

impl<S> Default for AssociationController<S> {
    fn default() -> Self {
        Self {
            state: LinkState::Disconnected,
        }
    }
}

impl<S> AssociationController<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_forced(&self) -> bool {
        matches!(self.state, LinkState::Forced { .. })
    }

    /// SSID of the held association, if any.
    pub fn ssid(&self) -> Option<&str> {
        match &self.state {
            LinkState::Forced { ssid, .. } => Some(ssid),
            LinkState::Disconnected => None,
        }
    }

    /// Run the connect handshake for `slot`.
    ///
    /// Steps: open a service session, narrow the default config to the slot,
    /// issue the non-blocking connect request bound to a one-shot completion
    /// event, then wait on that event with no timeout. The wait cannot be
    /// cancelled from the menu; the service ends it by signalling completion
    /// or dropping the event. Success requires both the signalled wait and
    /// the SSID query.
    ///
    /// On success the session is retained in [`LinkState::Forced`]; on any
    /// failure it is dropped before returning, so no idle session lingers.
    pub fn connect<N>(&mut self, network: &mut N, slot: ApSlot) -> AssociationResult
    where
        N: NetworkConfigService<Session = S>,
        S: AssociationSession,
    {
        // Anything previously held is released before a new attempt.
        self.state = LinkState::Disconnected;

        let mut session = match network.open() {
            Ok(session) => session,
            Err(err) => {
                warn!("[netcfg] session open failed: {err}");
                return AssociationResult { slot, ssid: None };
            }
        };

        let config = AssociationConfig::for_slot(slot);
        let (ready_tx, ready_rx) = oneshot::channel();

        let mut negotiated = None;
        match session.connect_async(&config, ready_tx) {
            Ok(()) => {
                if ready_rx.blocking_recv().is_ok() {
                    match session.ssid() {
                        Ok(ssid) => negotiated = Some(ssid),
                        Err(err) => warn!("[netcfg] ssid query failed: {err}"),
                    }
                } else {
                    warn!("[netcfg] completion event dropped without a signal");
                }
            }
            Err(err) => warn!("[netcfg] connect request rejected: {err}"),
        }
        // Both event endpoints are gone past this point, whatever happened.

        match negotiated {
            Some(ssid) => {
                info!(
                    "[netcfg] forced connection established on slot {}: {ssid}",
                    slot.display_number()
                );
                self.state = LinkState::Forced {
                    session,
                    ssid: ssid.clone(),
                };
                AssociationResult {
                    slot,
                    ssid: Some(ssid),
                }
            }
            None => {
                info!(
                    "[netcfg] connection attempt on slot {} failed",
                    slot.display_number()
                );
                drop(session);
                AssociationResult { slot, ssid: None }
            }
        }
    }

    /// Drop the held association, if any. Returns whether one was held.
    pub fn release(&mut self) -> bool {
        match mem::replace(&mut self.state, LinkState::Disconnected) {
            LinkState::Forced { session, ssid } => {
                drop(session);
                info!("[netcfg] forced connection to {ssid} released");
                true
            }
            LinkState::Disconnected => false,
        }
    }
}

/// Length of the three-slot selector line.
const SLOT_LINE_LEN: usize = 11;

/// Selector line with `>N<` around the selected slot, e.g. `">1<  2   3 "`.
fn slot_line(selected: ApSlot) -> String {
    let mut line = String::with_capacity(SLOT_LINE_LEN + 1);
    for index in 0..crate::config::AP_SLOT_COUNT {
        let marked = index == selected.index();
        line.push(if marked { '>' } else { ' ' });
        line.push(char::from(b'1' + index));
        line.push(if marked { '<' } else { ' ' });
        line.push(' ');
    }
    line.pop();
    line
}

/// Slot-selection screen, entered from the menu's "connect" entry.
///
/// Left/right cycle the slot with wraparound; commit runs the handshake and
/// shows its result screen. After a successful handshake the whole screen
/// exits: the forced session is held by the controller now, and re-entering
/// the selector would allow stacking a second one.
pub fn connection_screen<I, S, N>(
    frame: &mut MenuFrame<'_, I, S>,
    network: &mut N,
    controller: &mut AssociationController<N::Session>,
) where
    I: InputSource,
    S: RenderSurface,
    N: NetworkConfigService,
{
    frame.screen.wipe();

    let mut slot = ApSlot::FIRST;
    loop {
        let selector = slot_line(slot);
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Force Wi-Fi connection");
            surface.draw_text(MARGIN_X, line_y(0), TextColor::White, "A: connect");
            surface.draw_text(MARGIN_X, line_y(1), TextColor::White, &selector);
            surface.draw_text(MARGIN_X, line_y(2), TextColor::White, "B: back");
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_A) {
            let result = controller.connect(network, slot);
            let forced = result.succeeded();
            result_screen(frame, &result);
            if forced {
                return;
            }
            frame.screen.wipe();
        } else if pressed.contains(KEY_LEFT) {
            slot = slot.prev();
        } else if pressed.contains(KEY_RIGHT) {
            slot = slot.next();
        } else if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}

/// Result screen for one handshake attempt; leaves on explicit cancel.
fn result_screen<I, S>(frame: &mut MenuFrame<'_, I, S>, result: &AssociationResult)
where
    I: InputSource,
    S: RenderSurface,
{
    let (color, line) = match &result.ssid {
        Some(ssid) => (
            TextColor::Green,
            format!(
                "Connection forced (slot {}): {ssid}",
                result.slot.display_number()
            ),
        ),
        None => (
            TextColor::Red,
            format!("Connection failed (slot {})", result.slot.display_number()),
        ),
    };

    frame.screen.wipe();
    loop {
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Force Wi-Fi connection");
            surface.draw_text(MARGIN_X, line_y(0), color, &line);
            surface.draw_text(MARGIN_X, line_y(2), TextColor::White, "B: back");
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}

/// Disconnect screen, entered from the menu's "disconnect" entry.
pub fn disconnect_screen<I, S, Sess>(
    frame: &mut MenuFrame<'_, I, S>,
    controller: &mut AssociationController<Sess>,
) where
    I: InputSource,
    S: RenderSurface,
{
    frame.screen.wipe();

    controller.release();

    loop {
        frame.screen.frame(|surface| {
            surface.draw_text(MARGIN_X, TITLE_Y, TextColor::Title, "Force Wi-Fi connection");
            surface.draw_text(
                MARGIN_X,
                line_y(0),
                TextColor::Green,
                "Forced connection released.",
            );
            surface.draw_text(MARGIN_X, line_y(2), TextColor::White, "B: back");
        });

        let pressed = frame.poll();
        if pressed.contains(KEY_B) {
            return;
        }
        if frame.should_exit() {
            return;
        }
    }
}
