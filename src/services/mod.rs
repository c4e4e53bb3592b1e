//! Collaborator service contracts.
//!
//! The menus never touch hardware or the network stack directly; everything
//! goes through the host system's services, modeled here as traits:
//!
//! - [`RegisterService`] - hardware-control register access
//! - [`ProcessDirectory`] - live process enumeration
//! - [`WirelessService`] - radio status byte and enable/disable commands
//! - [`NetworkConfigService`] - the association (connect) service
//!
//! Services that the original protocol opens and closes around each use hand
//! out a session value from `open()`; dropping the session closes it. The
//! association service exploits this deliberately: a forced connection is
//! held open exactly as long as its session value is owned (see
//! [`crate::association::LinkState`]).

use std::fmt;

use tokio::sync::oneshot;

use crate::config::AssociationConfig;

#[cfg(any(test, feature = "sim"))]
pub mod sim;

/// Errors reported by collaborator services.
///
/// The menus mostly consume these locally: transient failures are logged and
/// the next render re-reads ground truth instead of surfacing an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    /// The service session could not be opened.
    SessionUnavailable,
    /// The service rejected a command or write.
    RequestRejected,
    /// A read or query did not produce a value.
    QueryFailed,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SessionUnavailable => write!(f, "service session unavailable"),
            Self::RequestRejected => write!(f, "request rejected by service"),
            Self::QueryFailed => write!(f, "service query failed"),
        }
    }
}

impl std::error::Error for ServiceError {}

/// Hardware-control service owning the device registers.
pub trait RegisterService {
    type Session: RegisterSession;

    fn open(&mut self) -> Result<Self::Session, ServiceError>;
}

/// One open hardware-control session. Dropping it closes the session.
pub trait RegisterSession {
    /// Fresh read of `out.len()` bytes from the register at `address`.
    fn read_register(&mut self, address: u8, out: &mut [u8]) -> Result<(), ServiceError>;

    /// Replace the register at `address` with `bytes`.
    fn write_register(&mut self, address: u8, bytes: &[u8]) -> Result<(), ServiceError>;
}

/// Enumeration of live processes.
pub trait ProcessDirectory {
    /// Fill `out` with live process IDs and return how many were written.
    /// When more processes exist than `out` can hold, the overflow is
    /// silently dropped.
    fn list_pids(&mut self, out: &mut [u32]) -> usize;

    /// Short name of the process, opened briefly for the query. Processes
    /// that cannot be opened report an error and are skipped by callers.
    fn process_name(&mut self, pid: u32) -> Result<String, ServiceError>;
}

/// Wireless-management service.
pub trait WirelessService {
    type Session: WirelessSession;

    /// Current radio-enabled flag, read from the raw status byte. This does
    /// not require (and does not open) a management session.
    fn radio_enabled(&mut self) -> bool;

    fn open(&mut self) -> Result<Self::Session, ServiceError>;
}

/// One open wireless-management session. Dropping it closes the session.
pub trait WirelessSession {
    fn set_enabled(&mut self, enabled: bool) -> Result<(), ServiceError>;
}

/// Network-configuration (association) service.
pub trait NetworkConfigService {
    type Session: AssociationSession;

    fn open(&mut self) -> Result<Self::Session, ServiceError>;
}

/// One open association session.
///
/// Dropping the session releases any association it holds; keeping it alive
/// is what keeps a forced connection up.
pub trait AssociationSession {
    /// Issue a non-blocking connect request. The service signals `ready`
    /// once the handshake has finished, successfully or not; a request that
    /// never completes at the service level simply never signals.
    fn connect_async(
        &mut self,
        config: &AssociationConfig,
        ready: oneshot::Sender<()>,
    ) -> Result<(), ServiceError>;

    /// Name of the currently associated network.
    fn ssid(&mut self) -> Result<String, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ServiceError::SessionUnavailable.to_string(),
            "service session unavailable"
        );
        assert_eq!(
            ServiceError::RequestRejected.to_string(),
            "request rejected by service"
        );
        assert_eq!(ServiceError::QueryFailed.to_string(), "service query failed");
    }
}
