//! Service classification based on well-known port numbers.
//!
//! Provides mapping from port numbers to conventional service names.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Name returned for ports with no conventional service.
pub const UNKNOWN_SERVICE: &str = "unknown";

/// Static map of well-known ports to service names.
static PORT_SERVICES: LazyLock<HashMap<u16, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    m.insert(20, "ftp-data");
    m.insert(21, "ftp");
    m.insert(22, "ssh");
    m.insert(23, "telnet");
    m.insert(25, "smtp");
    m.insert(53, "dns");
    m.insert(80, "http");
    m.insert(110, "pop3");
    m.insert(143, "imap");
    m.insert(443, "https");
    m.insert(465, "smtps");
    m.insert(587, "smtp-submission");
    m.insert(636, "ldaps");
    m.insert(993, "imaps");
    m.insert(995, "pop3s");
    m.insert(1433, "mssql");
    m.insert(3306, "mysql");
    m.insert(3389, "rdp");
    m.insert(5432, "postgresql");
    m.insert(5900, "vnc");
    m.insert(6379, "redis");
    m.insert(8080, "http-alt");
    m.insert(8443, "https-alt");
    m.insert(27017, "mongodb");

    m
});

/// Look up the conventional service name for a given port.
///
/// Returns `None` if the port is not in the well-known services table.
pub fn get_service_name(port: u16) -> Option<&'static str> {
    PORT_SERVICES.get(&port).copied()
}

/// Classify a port, falling back to [`UNKNOWN_SERVICE`].
pub fn classify(port: u16) -> &'static str {
    get_service_name(port).unwrap_or(UNKNOWN_SERVICE)
}
