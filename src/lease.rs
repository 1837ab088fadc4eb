//! DHCP lease log parsing.
//!
//! This module reconstructs structured lease records from a dhcpd lease
//! log and resolves, per MAC address, the most authoritative binding.
//! The log is a sequence of blocks:
//!
//! ```text
//! lease 10.0.0.23 {
//!   starts 3 2024/02/07 08:00:00;
//!   ends 3 2024/02/07 20:00:00;
//!   hardware ethernet aa:bb:cc:dd:ee:ff;
//!   client-hostname "printer";
//! }
//! ```
//!
//! Parsing is a two-state machine: between blocks, or inside one. Only
//! fully closed blocks are emitted; an unterminated trailing block is
//! dropped. Unrecognized keys inside a block are ignored, as is any
//! stray content between blocks.

use std::collections::HashSet;
use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{Error, Result};
use crate::files;

/// Timestamp layout used by `ends` lines, interpreted as local time.
const EXPIRATION_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// One DHCP binding reconstructed from the lease log.
///
/// MAC, expiration, and host name may each be absent when the block did
/// not carry the corresponding line. A lease with no expiration orders
/// below every lease that has one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// The leased IP address, from the block's opening line.
    pub ip: String,

    /// The client's hardware address.
    pub mac: Option<String>,

    /// When the binding expires (local time).
    pub expiration: Option<NaiveDateTime>,

    /// The client-reported host name, normalized by
    /// [`normalize_host_name`].
    pub host_name: Option<String>,
}

impl Lease {
    fn new(ip: String) -> Self {
        Self {
            ip,
            mac: None,
            expiration: None,
            host_name: None,
        }
    }

    /// Folds one line from inside the block into the lease.
    fn apply_line(&mut self, line: &str) -> Result<()> {
        let line = line.strip_suffix(';').unwrap_or(line);
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["ends", _weekday, date, time, ..] => {
                let stamp = format!("{date} {time}");
                self.expiration = Some(
                    NaiveDateTime::parse_from_str(&stamp, EXPIRATION_FORMAT)
                        .map_err(|_| Error::MalformedExpiration(line.to_string()))?,
                );
            }
            ["ends", ..] => {
                return Err(Error::MalformedExpiration(line.to_string()));
            }
            ["hardware", "ethernet", mac, ..] => {
                self.mac = Some((*mac).to_string());
            }
            ["client-hostname", name, ..] => {
                // A name that normalizes to nothing never overwrites a
                // previously seen value.
                if let Some(normalized) = normalize_host_name(name) {
                    self.host_name = Some(normalized);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// Normalizes a client-supplied host name into a usable DNS label.
///
/// Quote characters are dropped, path separators, underscores and
/// spaces become dashes, any leading run of dashes is stripped, and the
/// remainder is lower-cased. Returns `None` when nothing usable is
/// left.
pub fn normalize_host_name(raw: &str) -> Option<String> {
    let name: String = raw
        .chars()
        .filter(|character| !matches!(character, '"' | '\''))
        .map(|character| match character {
            '/' | '\\' | '_' | ' ' => '-',
            other => other,
        })
        .collect();
    let name = name.trim_start_matches('-');
    if name.is_empty() {
        None
    } else {
        Some(name.to_lowercase())
    }
}

/// The line-at-a-time parser: either between blocks or accumulating one.
#[derive(Debug, Default)]
struct Parser {
    current: Option<Lease>,
    leases: Vec<Lease>,
}

impl Parser {
    fn feed(&mut self, line: &str) -> Result<()> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }
        if line.starts_with('}') {
            // Closing brace outside a block is tolerated like any other
            // unexpected content.
            if let Some(lease) = self.current.take() {
                self.leases.push(lease);
            }
        } else if let Some(lease) = self.current.as_mut() {
            lease.apply_line(line)?;
        } else if let Some(rest) = line.strip_prefix("lease ")
            && let Some(ip) = rest.split_whitespace().next()
        {
            self.current = Some(Lease::new(ip.to_string()));
        }
        Ok(())
    }

    fn finish(self) -> Leases {
        // Any unterminated trailing block in self.current is dropped.
        let mut leases = self.leases;
        leases.sort_by(|a, b| b.expiration.cmp(&a.expiration));
        Leases { leases }
    }
}

/// Every lease parsed from one log, most current first.
///
/// The sequence is sorted descending by expiration after the parse, so
/// the first entry found for a MAC during a scan is the latest-expiring
/// one. The store is read-only after construction.
#[derive(Debug, Clone, Default)]
pub struct Leases {
    leases: Vec<Lease>,
}

impl Leases {
    /// Parses a lease log from a file.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors and fails fast on a malformed expiration
    /// timestamp.
    pub fn load(path: &Path) -> Result<Self> {
        let mut parser = Parser::default();
        for line in files::read_lines(path)? {
            parser.feed(&line?)?;
        }
        Ok(parser.finish())
    }

    /// Parses a lease log from in-memory text.
    pub fn parse(text: &str) -> Result<Self> {
        let mut parser = Parser::default();
        for line in text.lines() {
            parser.feed(line)?;
        }
        Ok(parser.finish())
    }

    /// Returns the most current (latest-expiring) lease for a MAC.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LeaseNotFound`] when no lease carries the MAC.
    pub fn by_mac(&self, mac: &str) -> Result<&Lease> {
        self.leases
            .iter()
            .find(|lease| lease.mac.as_deref() == Some(mac))
            .ok_or_else(|| Error::LeaseNotFound(mac.to_string()))
    }

    /// Yields, for every MAC that appears in the log, the single most
    /// current lease for it. Leases with no MAC are skipped.
    ///
    /// The iterator borrows the store and can be restarted by calling
    /// this again.
    pub fn unique(&self) -> impl Iterator<Item = &Lease> {
        let mut seen = HashSet::new();
        self.leases
            .iter()
            .filter(move |lease| lease.mac.as_deref().is_some_and(|mac| seen.insert(mac)))
    }

    /// All leases in descending expiration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Lease> {
        self.leases.iter()
    }

    /// The number of leases parsed, duplicates included.
    pub fn len(&self) -> usize {
        self.leases.len()
    }

    /// Whether the log contained no complete lease blocks.
    pub fn is_empty(&self) -> bool {
        self.leases.is_empty()
    }
}

impl<'a> IntoIterator for &'a Leases {
    type Item = &'a Lease;
    type IntoIter = std::slice::Iter<'a, Lease>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
