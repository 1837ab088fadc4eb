//! Error types for the zone sync tool.
//!
//! All fallible operations in this crate return [`Result<T>`], which uses
//! the [`Error`] enum for error variants. There are no retries anywhere;
//! every failure is surfaced immediately with an informative value.

use std::process::ExitStatus;

/// Errors that can occur while reading, composing, or publishing zone data.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// File system I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A search pattern failed to compile as a regular expression.
    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Two record variants were registered under the same marker.
    ///
    /// This is a configuration error in the descriptor table itself,
    /// detected before any parsing takes place. It is fatal at startup
    /// and never recovered.
    #[error("Duplicate record marker {marker:?}")]
    DuplicateMarker {
        /// The marker claimed by more than one variant.
        marker: &'static str,
    },

    /// A data line begins with a marker no record variant claims.
    #[error("Unknown record marker {marker:?} in line {line:?}")]
    UnknownMarker {
        /// The unrecognized leading character(s).
        marker: String,
        /// The full offending line.
        line: String,
    },

    /// An `ends` line in the lease log carries an unparsable timestamp.
    #[error("Malformed lease expiration: {0:?}")]
    MalformedExpiration(String),

    /// A MAC override line did not contain a MAC address and a host name.
    #[error("Malformed MAC override line: {0:?}")]
    MacOverride(String),

    /// No lease exists for the queried MAC address.
    ///
    /// This is the expected miss case for hosts that are currently
    /// offline; callers recover from it rather than abort.
    #[error("MAC {0} not found in leases")]
    LeaseNotFound(String),

    /// Invalid run configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The external zone compiler exited with a failure status.
    #[error("tinydns-data failed: {status}")]
    Compiler {
        /// The compiler's exit status, reported verbatim.
        status: ExitStatus,
    },
}

/// A specialized Result type for zone sync operations.
pub type Result<T> = std::result::Result<T, Error>;
