//! Scripted in-memory collaborators for tests and the simulation binary.
//!
//! Every type here is cheaply cloneable; clones share the same underlying
//! state, so a test can hand a clone to the menu and keep one for
//! inspection afterwards.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::AssociationConfig;
use crate::input::{InputSource, Keys};
use crate::render::{RenderSurface, TextColor};
use crate::services::{
    AssociationSession, NetworkConfigService, ProcessDirectory, RegisterService, RegisterSession,
    ServiceError, WirelessService, WirelessSession,
};

/// Input source replaying a fixed key script, one poll per entry.
///
/// Once the script runs dry every poll times out with [`Keys::NONE`]; an
/// optional cancellation token fires at that point so a loop that is still
/// running sees the external exit signal instead of spinning forever.
pub struct ScriptedInput {
    script: VecDeque<Keys>,
    on_exhausted: Option<CancellationToken>,
}

impl ScriptedInput {
    pub fn new(keys: impl IntoIterator<Item = u32>) -> Self {
        Self {
            script: keys.into_iter().map(Keys).collect(),
            on_exhausted: None,
        }
    }

    /// Cancel `token` once the script is exhausted.
    pub fn cancel_when_exhausted(mut self, token: CancellationToken) -> Self {
        self.on_exhausted = Some(token);
        self
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl InputSource for ScriptedInput {
    fn wait_input_with_timeout(&mut self, _timeout: Duration) -> Keys {
        match self.script.pop_front() {
            Some(keys) => keys,
            None => {
                if let Some(token) = &self.on_exhausted {
                    token.cancel();
                }
                Keys::NONE
            }
        }
    }
}

/// Render surface that records every `draw_text` call since the last clear.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    lines: Vec<(i32, i32, TextColor, String)>,
    flushes: usize,
}

impl RecordingSurface {
    /// True if any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|(_, _, _, text)| text.contains(needle))
    }

    /// Color of the first recorded line containing `needle`.
    pub fn color_of(&self, needle: &str) -> Option<TextColor> {
        self.lines
            .iter()
            .find(|(_, _, _, text)| text.contains(needle))
            .map(|(_, _, color, _)| *color)
    }

    pub fn lines(&self) -> &[(i32, i32, TextColor, String)] {
        &self.lines
    }

    pub fn flushes(&self) -> usize {
        self.flushes
    }
}

impl RenderSurface for RecordingSurface {
    fn clear(&mut self) {
        self.lines.clear();
    }

    fn draw_text(&mut self, x: i32, y: i32, color: TextColor, text: &str) {
        self.lines.push((x, y, color, text.to_string()));
    }

    fn flush(&mut self) {
        self.flushes += 1;
    }
}

// ==================== Hardware registers ====================

/// In-memory register bank behind the hardware-control service.
#[derive(Clone, Default)]
pub struct SimRegisters {
    bank: Rc<RefCell<HashMap<u8, Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl SimRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or overwrite a register.
    pub fn set(&self, address: u8, bytes: &[u8]) {
        self.bank.borrow_mut().insert(address, bytes.to_vec());
    }

    /// Current register value (empty if never written).
    pub fn get(&self, address: u8) -> Vec<u8> {
        self.bank.borrow().get(&address).cloned().unwrap_or_default()
    }

    /// Make every subsequent write fail with [`ServiceError::RequestRejected`].
    pub fn reject_writes(&self, reject: bool) {
        self.fail_writes.set(reject);
    }
}

impl RegisterService for SimRegisters {
    type Session = SimRegisterSession;

    fn open(&mut self) -> Result<Self::Session, ServiceError> {
        Ok(SimRegisterSession {
            bank: Rc::clone(&self.bank),
            fail_writes: Rc::clone(&self.fail_writes),
        })
    }
}

pub struct SimRegisterSession {
    bank: Rc<RefCell<HashMap<u8, Vec<u8>>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl RegisterSession for SimRegisterSession {
    fn read_register(&mut self, address: u8, out: &mut [u8]) -> Result<(), ServiceError> {
        let bank = self.bank.borrow();
        match bank.get(&address) {
            Some(bytes) if bytes.len() >= out.len() => {
                out.copy_from_slice(&bytes[..out.len()]);
                Ok(())
            }
            _ => Err(ServiceError::QueryFailed),
        }
    }

    fn write_register(&mut self, address: u8, bytes: &[u8]) -> Result<(), ServiceError> {
        if self.fail_writes.get() {
            return Err(ServiceError::RequestRejected);
        }
        self.bank.borrow_mut().insert(address, bytes.to_vec());
        Ok(())
    }
}

// ==================== Process directory ====================

/// Fixed process table. `None` names simulate processes that cannot be
/// opened for a name query.
#[derive(Clone, Default)]
pub struct SimProcesses {
    table: Rc<RefCell<Vec<(u32, Option<String>)>>>,
}

impl SimProcesses {
    /// Table with the given short names, PIDs assigned from 1 upwards.
    pub fn with_names(names: &[&str]) -> Self {
        let table = names
            .iter()
            .enumerate()
            .map(|(index, name)| (index as u32 + 1, Some((*name).to_string())))
            .collect();
        Self {
            table: Rc::new(RefCell::new(table)),
        }
    }

    pub fn push(&self, pid: u32, name: &str) {
        self.table.borrow_mut().push((pid, Some(name.to_string())));
    }

    /// A process whose name query fails.
    pub fn push_unreadable(&self, pid: u32) {
        self.table.borrow_mut().push((pid, None));
    }
}

impl ProcessDirectory for SimProcesses {
    fn list_pids(&mut self, out: &mut [u32]) -> usize {
        let table = self.table.borrow();
        let count = table.len().min(out.len());
        for (slot, (pid, _)) in out.iter_mut().zip(table.iter()) {
            *slot = *pid;
        }
        count
    }

    fn process_name(&mut self, pid: u32) -> Result<String, ServiceError> {
        self.table
            .borrow()
            .iter()
            .find(|(candidate, _)| *candidate == pid)
            .and_then(|(_, name)| name.clone())
            .ok_or(ServiceError::QueryFailed)
    }
}

// ==================== Wireless management ====================

/// Radio status byte plus a log of every enable/disable command issued.
#[derive(Clone)]
pub struct SimWireless {
    enabled: Rc<Cell<bool>>,
    commands: Rc<RefCell<Vec<bool>>>,
    fail_open: Rc<Cell<bool>>,
}

impl SimWireless {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: Rc::new(Cell::new(enabled)),
            commands: Rc::new(RefCell::new(Vec::new())),
            fail_open: Rc::new(Cell::new(false)),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Every `set_enabled` argument seen so far, in order.
    pub fn commands(&self) -> Vec<bool> {
        self.commands.borrow().clone()
    }

    pub fn reject_sessions(&self, reject: bool) {
        self.fail_open.set(reject);
    }
}

impl WirelessService for SimWireless {
    type Session = SimWirelessSession;

    fn radio_enabled(&mut self) -> bool {
        self.enabled.get()
    }

    fn open(&mut self) -> Result<Self::Session, ServiceError> {
        if self.fail_open.get() {
            return Err(ServiceError::SessionUnavailable);
        }
        Ok(SimWirelessSession {
            enabled: Rc::clone(&self.enabled),
            commands: Rc::clone(&self.commands),
        })
    }
}

pub struct SimWirelessSession {
    enabled: Rc<Cell<bool>>,
    commands: Rc<RefCell<Vec<bool>>>,
}

impl WirelessSession for SimWirelessSession {
    fn set_enabled(&mut self, enabled: bool) -> Result<(), ServiceError> {
        self.commands.borrow_mut().push(enabled);
        self.enabled.set(enabled);
        Ok(())
    }
}

// ==================== Association service ====================

/// How a simulated connect request plays out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectBehavior {
    /// Handshake completes and the SSID query returns this name.
    Establish(String),
    /// Completion event fires but the SSID query fails.
    SignalWithoutSsid,
    /// Request accepted, then the event is abandoned unsignalled, so the
    /// caller's wait fails.
    AbandonWait,
    /// The connect request itself is rejected.
    RejectRequest,
}

/// Simulated network-configuration service.
///
/// Tracks how many sessions are currently open so tests can prove that a
/// failed handshake releases its session and a forced one keeps it.
#[derive(Clone)]
pub struct SimNetwork {
    behavior: Rc<RefCell<ConnectBehavior>>,
    open_sessions: Rc<Cell<usize>>,
    connect_requests: Rc<Cell<usize>>,
    last_config: Rc<RefCell<Option<AssociationConfig>>>,
    fail_open: Rc<Cell<bool>>,
}

impl SimNetwork {
    pub fn with_behavior(behavior: ConnectBehavior) -> Self {
        Self {
            behavior: Rc::new(RefCell::new(behavior)),
            open_sessions: Rc::new(Cell::new(0)),
            connect_requests: Rc::new(Cell::new(0)),
            last_config: Rc::new(RefCell::new(None)),
            fail_open: Rc::new(Cell::new(false)),
        }
    }

    /// Service whose handshakes succeed with the given SSID.
    pub fn establishing(ssid: &str) -> Self {
        Self::with_behavior(ConnectBehavior::Establish(ssid.to_string()))
    }

    /// Swap the scripted behavior for subsequent requests.
    pub fn set_behavior(&self, behavior: ConnectBehavior) {
        *self.behavior.borrow_mut() = behavior;
    }

    /// Sessions currently open (not yet dropped).
    pub fn open_sessions(&self) -> usize {
        self.open_sessions.get()
    }

    pub fn connect_requests(&self) -> usize {
        self.connect_requests.get()
    }

    /// Config carried by the most recent connect request.
    pub fn last_config(&self) -> Option<AssociationConfig> {
        self.last_config.borrow().clone()
    }

    pub fn reject_sessions(&self, reject: bool) {
        self.fail_open.set(reject);
    }
}

impl NetworkConfigService for SimNetwork {
    type Session = SimAssociationSession;

    fn open(&mut self) -> Result<Self::Session, ServiceError> {
        if self.fail_open.get() {
            return Err(ServiceError::SessionUnavailable);
        }
        self.open_sessions.set(self.open_sessions.get() + 1);
        Ok(SimAssociationSession {
            behavior: Rc::clone(&self.behavior),
            open_sessions: Rc::clone(&self.open_sessions),
            connect_requests: Rc::clone(&self.connect_requests),
            last_config: Rc::clone(&self.last_config),
            associated: false,
        })
    }
}

pub struct SimAssociationSession {
    behavior: Rc<RefCell<ConnectBehavior>>,
    open_sessions: Rc<Cell<usize>>,
    connect_requests: Rc<Cell<usize>>,
    last_config: Rc<RefCell<Option<AssociationConfig>>>,
    associated: bool,
}

impl Drop for SimAssociationSession {
    fn drop(&mut self) {
        self.open_sessions.set(self.open_sessions.get() - 1);
    }
}

impl AssociationSession for SimAssociationSession {
    fn connect_async(
        &mut self,
        config: &AssociationConfig,
        ready: oneshot::Sender<()>,
    ) -> Result<(), ServiceError> {
        self.connect_requests.set(self.connect_requests.get() + 1);
        *self.last_config.borrow_mut() = Some(config.clone());

        let behavior = self.behavior.borrow().clone();
        match behavior {
            ConnectBehavior::RejectRequest => Err(ServiceError::RequestRejected),
            ConnectBehavior::AbandonWait => {
                drop(ready);
                Ok(())
            }
            ConnectBehavior::SignalWithoutSsid => {
                let _ = ready.send(());
                Ok(())
            }
            ConnectBehavior::Establish(_) => {
                self.associated = true;
                let _ = ready.send(());
                Ok(())
            }
        }
    }

    fn ssid(&mut self) -> Result<String, ServiceError> {
        match (&*self.behavior.borrow(), self.associated) {
            (ConnectBehavior::Establish(ssid), true) => Ok(ssid.clone()),
            _ => Err(ServiceError::QueryFailed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{KEY_A, KEY_B};

    #[test]
    fn test_scripted_input_replays_then_times_out() {
        let mut input = ScriptedInput::new([KEY_A, KEY_B]);
        assert_eq!(
            input.wait_input_with_timeout(Duration::from_millis(1)),
            Keys(KEY_A)
        );
        assert_eq!(
            input.wait_input_with_timeout(Duration::from_millis(1)),
            Keys(KEY_B)
        );
        assert_eq!(
            input.wait_input_with_timeout(Duration::from_millis(1)),
            Keys::NONE
        );
    }

    #[test]
    fn test_scripted_input_cancels_on_exhaustion() {
        let token = CancellationToken::new();
        let mut input = ScriptedInput::new([KEY_A]).cancel_when_exhausted(token.clone());
        input.wait_input_with_timeout(Duration::from_millis(1));
        assert!(!token.is_cancelled());
        input.wait_input_with_timeout(Duration::from_millis(1));
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_register_bank_read_write() {
        let mut registers = SimRegisters::new();
        registers.set(0x28, &[0xAA]);

        let mut session = registers.open().unwrap();
        let mut value = [0u8; 1];
        session.read_register(0x28, &mut value).unwrap();
        assert_eq!(value, [0xAA]);

        session.write_register(0x28, &[0x55]).unwrap();
        assert_eq!(registers.get(0x28), vec![0x55]);
    }

    #[test]
    fn test_register_read_of_unseeded_address_fails() {
        let mut registers = SimRegisters::new();
        let mut session = registers.open().unwrap();
        let mut value = [0u8; 1];
        assert_eq!(
            session.read_register(0x99, &mut value),
            Err(ServiceError::QueryFailed)
        );
    }

    #[test]
    fn test_association_session_count_tracks_drops() {
        let mut network = SimNetwork::establishing("NET");
        let session = network.open().unwrap();
        assert_eq!(network.open_sessions(), 1);
        drop(session);
        assert_eq!(network.open_sessions(), 0);
    }
}
