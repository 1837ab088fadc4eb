//! # dhcp2tinydns
//!
//! Maintains an authoritative tinydns zone whose dynamic records are
//! synthesized from a DHCP server's lease log.
//!
//! The zone data file is line oriented: one record per line, with a
//! leading marker character selecting the record type. This crate models
//! that format, parses dhcpd lease logs, and composes both into the
//! single `data` file tinydns serves from, replaced atomically so a
//! concurrent reader never sees a partial zone.
//!
//! ## Architecture
//!
//! - [`Record`] - One zone data line; a closed set of typed variants
//!   with marker-based parsing and serialization
//! - [`Section`] - An ordered group of records, optionally bound to a
//!   backing file
//! - [`Authority`] - The whole zone: ordered sections, directory or
//!   named-file loading, search, and atomic merge
//! - [`Leases`] - The parsed lease log, resolving the most current
//!   lease per MAC address
//! - [`sync`] - The driver that derives records from leases and
//!   publishes the composed zone
//!
//! Everything is single-threaded and synchronous; operations run to
//! completion or fail outright, and nothing is retried.

pub mod authority;
pub mod config;
pub mod error;
pub mod files;
pub mod lease;
pub mod record;
pub mod section;
pub mod sync;

pub use authority::Authority;
pub use config::Config;
pub use error::{Error, Result};
pub use lease::{Lease, Leases};
pub use record::Record;
pub use section::Section;
