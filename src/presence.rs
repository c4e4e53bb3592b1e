//! Wireless-service presence detection.
//!
//! Toggling the radio is only safe while the wireless-management service is
//! running, so the radio screen checks for it once on entry. The check walks
//! the live process list through a fixed-capacity buffer and looks for the
//! service's short-name prefix.

use log::debug;

use crate::services::ProcessDirectory;

/// Capacity of the PID buffer. Enumeration past this many processes is
/// silently truncated; the service, when present, starts early enough to
/// land well inside the window.
pub const PROCESS_LIST_CAPACITY: usize = 64;

/// Short-name prefix of the wireless-management service process.
pub const WIRELESS_MODULE_PREFIX: &str = "nwm";

/// True if a process whose short name starts with [`WIRELESS_MODULE_PREFIX`]
/// is currently running.
///
/// Computed once per menu entry, not per frame: a service that starts or
/// stops while a screen is open is not noticed until the screen is
/// re-entered. Processes that cannot be opened for the name query are
/// skipped.
pub fn wireless_module_running<P: ProcessDirectory>(processes: &mut P) -> bool {
    let mut pids = [0u32; PROCESS_LIST_CAPACITY];
    let count = processes.list_pids(&mut pids).min(PROCESS_LIST_CAPACITY);
    debug!("[presence] scanning {count} processes");

    pids[..count].iter().any(|&pid| {
        match processes.process_name(pid) {
            Ok(name) => name.starts_with(WIRELESS_MODULE_PREFIX),
            Err(_) => false,
        }
    })
}
