//! Banner grabbing for open TCP connections.
//!
//! Some services greet first (FTP, SSH); others only answer once spoken
//! to, so a minimal protocol-specific trigger is written before the single
//! bounded read. Failure to get a banner is normal and degrades to
//! [`NO_BANNER`].

use crate::config::ScanConfig;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

/// Placeholder used when a service sends nothing readable.
pub const NO_BANNER: &str = "no banner";

/// Replacement for line breaks so a banner fits on one output line.
const LINE_DELIMITER: &str = " | ";

/// Marker appended to truncated banners.
const ELLIPSIS: &str = "...";

/// Payload written before reading, if the port's protocol needs prompting.
///
/// FTP (21) and SSH (22) servers greet first, as do most unlisted services.
pub fn trigger_for(port: u16, host: &str) -> Option<Vec<u8>> {
    match port {
        80 | 8080 => Some(
            format!("HEAD / HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n").into_bytes(),
        ),
        25 | 587 => Some(b"EHLO portsweep\r\n".to_vec()),
        110 => Some(b"CAPA\r\n".to_vec()),
        143 => Some(b"A001 CAPABILITY\r\n".to_vec()),
        _ => None,
    }
}

/// Grab a banner from an established connection.
///
/// Writes the trigger for `port` (if any), then performs exactly one read of
/// at most `max_banner_length` bytes. Both steps are bounded by
/// [`ScanConfig::banner_timeout`].
pub async fn probe_banner<S>(stream: &mut S, port: u16, host: &str, config: &ScanConfig) -> String
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let deadline = config.banner_timeout();

    if let Some(payload) = trigger_for(port, host) {
        match timeout(deadline, stream.write_all(&payload)).await {
            Ok(Ok(())) => {}
            _ => return NO_BANNER.to_string(),
        }
    }

    let mut buffer = vec![0u8; config.max_banner_length];
    match timeout(deadline, stream.read(&mut buffer)).await {
        Ok(Ok(n)) if n > 0 => {
            let raw = String::from_utf8_lossy(&buffer[..n]);
            let banner = sanitize_banner(&raw, config.max_banner_length);
            if banner.is_empty() {
                NO_BANNER.to_string()
            } else {
                banner
            }
        }
        _ => NO_BANNER.to_string(),
    }
}

/// Make a raw banner safe for single-line display.
///
/// Trims surrounding whitespace, joins lines with `" | "`, replaces tabs
/// with spaces and other control characters with `.`, then truncates to
/// `max_len` characters plus `"..."`. Applying it twice changes nothing.
pub fn sanitize_banner(raw: &str, max_len: usize) -> String {
    let joined = raw
        .trim()
        .replace("\r\n", "\n")
        .replace('\n', LINE_DELIMITER);

    let printable: String = joined
        .chars()
        .map(|c| match c {
            '\t' => ' ',
            c if c.is_control() => '.',
            c => c,
        })
        .collect();

    if printable.chars().count() > max_len {
        let mut truncated: String = printable.chars().take(max_len).collect();
        truncated.push_str(ELLIPSIS);
        truncated
    } else {
        printable
    }
}
