//! Errors returned by the printer client.

use std::time::Duration;

/// Shorthand for results carrying an [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Everything that can abort a printer operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The hostname did not resolve to an IPv4 address.
    #[error(
        "Cannot resolve hostname '{host}' to IPv4 address: {reason}\n\
         Possible solutions:\n  \
         • Check if the printer is powered on and connected to the network\n  \
         • Try using the IP address directly\n  \
         • Set the printer's IP address in the config file\n  \
         • Check your network connection and DNS/mDNS settings{hint}"
    )]
    Resolution {
        /// The hostname that failed to resolve.
        host: String,
        /// Why resolution failed.
        reason: String,
        /// Extra diagnostic appended to the message, empty when there is none.
        hint: String,
    },

    /// The TCP connect did not complete in time.
    #[error(
        "Connection to '{host}:{port}' timed out after {} seconds.\n\
         The hostname resolved but the printer is not responding on port {port}.\n\
         Possible solutions:\n  \
         • Check if the printer is powered on and not in sleep mode\n  \
         • Verify the printer is on the same network segment\n  \
         • Check firewall settings on your computer and network\n  \
         • Try restarting the printer",
        .timeout.as_secs()
    )]
    ConnectTimeout {
        /// The host we tried to reach.
        host: String,
        /// The port we tried to reach.
        port: u16,
        /// How long we waited.
        timeout: Duration,
    },

    /// The printer actively refused the connection.
    #[error(
        "Connection to '{host}:{port}' was refused.\n\
         Possible solutions:\n  \
         • Check if port {port} is correct (usually 9100 for label printers)\n  \
         • Verify the printer's network service is running\n  \
         • Try restarting the printer"
    )]
    ConnectRefused {
        /// The host we tried to reach.
        host: String,
        /// The port we tried to reach.
        port: u16,
    },

    /// Any other OS-level failure while connecting.
    #[error(
        "Cannot connect to printer at '{host}:{port}': {source}\n\
         Possible solutions:\n  \
         • Verify the hostname or IP address is correct\n  \
         • Check your network connection\n  \
         • Ensure the printer is on the same network"
    )]
    Connect {
        /// The host we tried to reach.
        host: String,
        /// The port we tried to reach.
        port: u16,
        /// The underlying socket error.
        source: std::io::Error,
    },

    /// A read or write on an established connection failed.
    #[error("Transport error talking to the printer: {0}")]
    Transport(#[from] std::io::Error),

    /// The reply did not start with the expected document header.
    #[error("Expected a XML status response first: {prefix:?}")]
    Header {
        /// The first bytes that were actually received.
        prefix: String,
    },

    /// The printer answered with a non-zero status code.
    #[error("The XML status code is not OK{}", comment_suffix(.comment))]
    Status {
        /// The status code reported by the printer.
        code: i64,
        /// The comment attached to the status, if any.
        comment: Option<String>,
    },

    /// The reply framing is broken.
    #[error("Malformed reply from the printer: {0}")]
    Framing(String),

    /// A required field was absent from the reply.
    #[error("Could not parse XML for {0}")]
    FieldMissing(&'static str),

    /// The printer did not turn idle before the deadline.
    #[error("Printer did not turn idle within {} seconds (last state: {last_state})", .timeout.as_secs_f64())]
    IdleTimeout {
        /// How long we waited.
        timeout: Duration,
        /// The last `print_state` observed, or `UNKNOWN` when none was read.
        last_state: String,
    },

    /// A release was requested but no job token was given or held.
    #[error("No job token to release: pass one explicitly or lock the printer first")]
    NoJobToken,
}

fn comment_suffix(comment: &Option<String>) -> String {
    match comment {
        Some(comment) => format!(": \"{comment}\""),
        None => ".".to_string(),
    }
}
