//! The tinydns zone data model.
//!
//! A zone data file is line oriented: each line is one record, and the
//! leading marker character selects the record variant. The remainder of
//! the line is a `:`-separated list of positional fields. See
//! <http://cr.yp.to/djbdns/tinydns-data.html> for the full description of
//! the format and what every field means.
//!
//! Field values are opaque strings; no semantic validation (IP syntax,
//! numeric TTL range) happens at this layer.
//!
//! # Markers
//!
//! | Variant          | Marker(s)                                        |
//! |------------------|--------------------------------------------------|
//! | [`Location`]     | `%`                                              |
//! | [`NameServer`]   | `.` (authoritative) / `&` (delegated)            |
//! | [`Alias`]        | `=` (with PTR) / `+` (no PTR) / `-` (disabled)   |
//! | [`MailExchange`] | `@`                                              |
//! | [`Text`]         | `'`                                              |
//! | [`Pointer`]      | `^`                                              |
//! | [`Cname`]        | `C`                                              |
//! | [`Soa`]          | `Z`                                              |
//! | [`Generic`]      | `:`                                              |
//! | [`Comment`]      | `#`                                              |
//! | `Blank`          | (empty line)                                     |

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{Error, Result};

/// Associates a location name with a client IP address prefix.
///
/// The name can be used in the `location` field of other records, which
/// restricts them to clients whose address matches the prefix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub ip_prefix: String,
}

/// An authoritative or delegated name server for a domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameServer {
    pub domain: String,
    pub ip: String,
    pub server_name: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
    /// Serialized as `.` when set, `&` (a plain delegation) when not.
    pub authoritative: bool,
}

impl Default for NameServer {
    fn default() -> Self {
        Self {
            domain: String::new(),
            ip: String::new(),
            server_name: String::new(),
            ttl: String::new(),
            stamp: String::new(),
            location: String::new(),
            authoritative: true,
        }
    }
}

/// A host name for an IP address, the workhorse record of the zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alias {
    pub host_name: String,
    pub ip: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
    /// Whether a reverse PTR record is created too (`=` vs `+`).
    pub ptr: bool,
    /// A disabled alias (`-`) is kept in the file but not served.
    pub disabled: bool,
}

impl Default for Alias {
    fn default() -> Self {
        Self {
            host_name: String::new(),
            ip: String::new(),
            ttl: String::new(),
            stamp: String::new(),
            location: String::new(),
            ptr: true,
            disabled: false,
        }
    }
}

/// A mail server for a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailExchange {
    pub domain: String,
    pub ip: String,
    pub server_name: String,
    pub distance: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// Freeform text served for a host name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Text {
    pub host_name: String,
    pub text: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// A reverse lookup record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pointer {
    pub reverse_name: String,
    pub host_name: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// A name that refers to a target alias.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cname {
    pub host_name: String,
    pub target: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// A start-of-authority statement for a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Soa {
    pub host_name: String,
    pub name_server: String,
    pub contact: String,
    pub serial: String,
    pub refresh_time: String,
    pub retry_time: String,
    pub expire_time: String,
    pub min_time: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// A record of a type tinydns does not support directly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generic {
    pub host_name: String,
    pub record_type: String,
    pub data: String,
    pub ttl: String,
    pub stamp: String,
    pub location: String,
}

/// An information-only line in the data file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comment {
    pub text: String,
}

/// One line of a tinydns zone data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Location(Location),
    NameServer(NameServer),
    Alias(Alias),
    MailExchange(MailExchange),
    Text(Text),
    Pointer(Pointer),
    Cname(Cname),
    Soa(Soa),
    Generic(Generic),
    Comment(Comment),
    /// An empty line, used only to space records out for readability.
    Blank,
}

/// Positional field values from a split data line.
///
/// Missing trailing values read as empty strings, so short lines fill
/// their remaining fields with the defaults the format implies.
struct Values(std::vec::IntoIter<String>);

impl Values {
    fn new(values: Vec<String>) -> Self {
        Self(values.into_iter())
    }

    fn next(&mut self) -> String {
        self.0.next().unwrap_or_default()
    }
}

/// One entry of the variant registry: the markers a variant answers to
/// and the constructor that builds it from a split line.
struct Descriptor {
    markers: &'static [&'static str],
    build: fn(marker: &str, values: Values) -> Record,
}

/// The variant registry, in marker-table order.
///
/// This is the single site where record variants are registered. Markers
/// must be unique across the whole list; [`MarkerTable::build`] rejects
/// the table otherwise.
static DESCRIPTORS: &[Descriptor] = &[
    Descriptor { markers: &["%"], build: build_location },
    Descriptor { markers: &[".", "&"], build: build_name_server },
    Descriptor { markers: &["=", "+", "-"], build: build_alias },
    Descriptor { markers: &["@"], build: build_mail_exchange },
    Descriptor { markers: &["'"], build: build_text },
    Descriptor { markers: &["^"], build: build_pointer },
    Descriptor { markers: &["C"], build: build_cname },
    Descriptor { markers: &["Z"], build: build_soa },
    Descriptor { markers: &[":"], build: build_generic },
    Descriptor { markers: &["#"], build: build_comment },
    Descriptor { markers: &[""], build: build_blank },
];

fn build_location(_marker: &str, mut values: Values) -> Record {
    Record::Location(Location {
        name: values.next(),
        ip_prefix: values.next(),
    })
}

fn build_name_server(marker: &str, mut values: Values) -> Record {
    Record::NameServer(NameServer {
        domain: values.next(),
        ip: values.next(),
        server_name: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
        authoritative: marker == ".",
    })
}

fn build_alias(marker: &str, mut values: Values) -> Record {
    Record::Alias(Alias {
        host_name: values.next(),
        ip: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
        ptr: marker != "+",
        disabled: marker == "-",
    })
}

fn build_mail_exchange(_marker: &str, mut values: Values) -> Record {
    Record::MailExchange(MailExchange {
        domain: values.next(),
        ip: values.next(),
        server_name: values.next(),
        distance: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_text(_marker: &str, mut values: Values) -> Record {
    Record::Text(Text {
        host_name: values.next(),
        text: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_pointer(_marker: &str, mut values: Values) -> Record {
    Record::Pointer(Pointer {
        reverse_name: values.next(),
        host_name: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_cname(_marker: &str, mut values: Values) -> Record {
    Record::Cname(Cname {
        host_name: values.next(),
        target: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_soa(_marker: &str, mut values: Values) -> Record {
    Record::Soa(Soa {
        host_name: values.next(),
        name_server: values.next(),
        contact: values.next(),
        serial: values.next(),
        refresh_time: values.next(),
        retry_time: values.next(),
        expire_time: values.next(),
        min_time: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_generic(_marker: &str, mut values: Values) -> Record {
    Record::Generic(Generic {
        host_name: values.next(),
        record_type: values.next(),
        data: values.next(),
        ttl: values.next(),
        stamp: values.next(),
        location: values.next(),
    })
}

fn build_comment(_marker: &str, values: Values) -> Record {
    // Rejoin so a comment containing `:` survives the positional split.
    let text = values.0.collect::<Vec<_>>().join(":");
    Record::Comment(Comment { text })
}

fn build_blank(_marker: &str, _values: Values) -> Record {
    Record::Blank
}

/// Marker lookup table built from [`DESCRIPTORS`].
struct MarkerTable {
    entries: HashMap<&'static str, &'static Descriptor>,
}

impl MarkerTable {
    /// Builds the table, rejecting any marker registered twice.
    fn build(descriptors: &'static [Descriptor]) -> Result<Self> {
        let mut entries = HashMap::new();
        for descriptor in descriptors {
            for &marker in descriptor.markers {
                if entries.insert(marker, descriptor).is_some() {
                    return Err(Error::DuplicateMarker { marker });
                }
            }
        }
        Ok(Self { entries })
    }

    /// Resolves the variant for a stripped data line.
    ///
    /// The marker is a fixed-width prefix, so the longest registered
    /// marker that prefixes the line wins. The empty marker matches only
    /// the empty line.
    fn resolve(&self, line: &str) -> Option<(&'static str, &'static Descriptor)> {
        if line.is_empty() {
            return self.entries.get("").map(|descriptor| ("", *descriptor));
        }
        self.entries
            .iter()
            .filter(|(marker, _)| !marker.is_empty() && line.starts_with(**marker))
            .max_by_key(|(marker, _)| marker.len())
            .map(|(marker, descriptor)| (*marker, *descriptor))
    }
}

fn marker_table() -> Result<&'static MarkerTable> {
    static TABLE: OnceLock<MarkerTable> = OnceLock::new();
    if let Some(table) = TABLE.get() {
        return Ok(table);
    }
    let table = MarkerTable::build(DESCRIPTORS)?;
    Ok(TABLE.get_or_init(|| table))
}

/// Validates marker uniqueness across all registered record variants.
///
/// Call this once at startup so a duplicate registration fails the
/// process before any data is read. Parsing also goes through the same
/// table, so library users that skip this call still get the error on
/// first use rather than a silently shadowed variant.
pub fn verify_marker_table() -> Result<()> {
    marker_table().map(|_| ())
}

impl Record {
    /// Parses one data line into its record variant.
    ///
    /// The line is stripped, the marker resolved against the variant
    /// registry, and the remainder split on `:` into positional fields.
    /// Missing trailing fields default to the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownMarker`] when no variant claims the
    /// line's leading character, naming both the marker and the line.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim();
        let table = marker_table()?;
        let (marker, descriptor) =
            table.resolve(line).ok_or_else(|| Error::UnknownMarker {
                marker: line.chars().take(1).collect(),
                line: line.to_string(),
            })?;
        let values = line[marker.len()..]
            .split(':')
            .map(str::to_string)
            .collect();
        Ok((descriptor.build)(marker, Values::new(values)))
    }

    /// The marker this record serializes under.
    ///
    /// For variants whose marker encodes a flag, the flag decides: a
    /// non-authoritative [`NameServer`] yields `&`, a disabled
    /// [`Alias`] yields `-`, and so on.
    pub fn marker(&self) -> &'static str {
        match self {
            Record::Location(_) => "%",
            Record::NameServer(r) => {
                if r.authoritative {
                    "."
                } else {
                    "&"
                }
            }
            Record::Alias(r) => {
                if r.disabled {
                    "-"
                } else if r.ptr {
                    "="
                } else {
                    "+"
                }
            }
            Record::MailExchange(_) => "@",
            Record::Text(_) => "'",
            Record::Pointer(_) => "^",
            Record::Cname(_) => "C",
            Record::Soa(_) => "Z",
            Record::Generic(_) => ":",
            Record::Comment(_) => "#",
            Record::Blank => "",
        }
    }

    /// The declared field names of this record's variant, in line order.
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            Record::Location(_) => &["name", "ip_prefix"],
            Record::NameServer(_) => {
                &["domain", "ip", "server_name", "ttl", "stamp", "location"]
            }
            Record::Alias(_) => &["host_name", "ip", "ttl", "stamp", "location"],
            Record::MailExchange(_) => &[
                "domain",
                "ip",
                "server_name",
                "distance",
                "ttl",
                "stamp",
                "location",
            ],
            Record::Text(_) => &["host_name", "text", "ttl", "stamp", "location"],
            Record::Pointer(_) => {
                &["reverse_name", "host_name", "ttl", "stamp", "location"]
            }
            Record::Cname(_) => &["host_name", "target", "ttl", "stamp", "location"],
            Record::Soa(_) => &[
                "host_name",
                "name_server",
                "contact",
                "serial",
                "refresh_time",
                "retry_time",
                "expire_time",
                "min_time",
                "ttl",
                "stamp",
                "location",
            ],
            Record::Generic(_) => &[
                "host_name",
                "record_type",
                "data",
                "ttl",
                "stamp",
                "location",
            ],
            Record::Comment(_) => &["text"],
            Record::Blank => &[],
        }
    }

    fn values(&self) -> Vec<&str> {
        match self {
            Record::Location(r) => vec![&r.name, &r.ip_prefix],
            Record::NameServer(r) => vec![
                &r.domain,
                &r.ip,
                &r.server_name,
                &r.ttl,
                &r.stamp,
                &r.location,
            ],
            Record::Alias(r) => {
                vec![&r.host_name, &r.ip, &r.ttl, &r.stamp, &r.location]
            }
            Record::MailExchange(r) => vec![
                &r.domain,
                &r.ip,
                &r.server_name,
                &r.distance,
                &r.ttl,
                &r.stamp,
                &r.location,
            ],
            Record::Text(r) => {
                vec![&r.host_name, &r.text, &r.ttl, &r.stamp, &r.location]
            }
            Record::Pointer(r) => vec![
                &r.reverse_name,
                &r.host_name,
                &r.ttl,
                &r.stamp,
                &r.location,
            ],
            Record::Cname(r) => {
                vec![&r.host_name, &r.target, &r.ttl, &r.stamp, &r.location]
            }
            Record::Soa(r) => vec![
                &r.host_name,
                &r.name_server,
                &r.contact,
                &r.serial,
                &r.refresh_time,
                &r.retry_time,
                &r.expire_time,
                &r.min_time,
                &r.ttl,
                &r.stamp,
                &r.location,
            ],
            Record::Generic(r) => vec![
                &r.host_name,
                &r.record_type,
                &r.data,
                &r.ttl,
                &r.stamp,
                &r.location,
            ],
            Record::Comment(r) => vec![&r.text],
            Record::Blank => Vec::new(),
        }
        .into_iter()
        .map(String::as_str)
        .collect()
    }

    /// Returns the value of a field by name, or `None` when the field is
    /// not part of this variant's schema.
    pub fn field(&self, name: &str) -> Option<&str> {
        let index = self.field_names().iter().position(|field| *field == name)?;
        self.values().into_iter().nth(index)
    }

    /// Returns true when `field` is declared by this variant and its
    /// value contains a match for the pattern (substring search, not
    /// anchored). An unknown field name is never an error.
    pub fn matches(&self, field: &str, pattern: &Regex) -> bool {
        self.field(field)
            .is_some_and(|value| pattern.is_match(value))
    }

    /// Serializes the record to its data-file line, newline included.
    ///
    /// Trailing empty fields produce no trailing separators. Comments
    /// serialize their text verbatim and blank records serialize to an
    /// empty line; neither is subject to the trailing trim.
    pub fn to_line(&self) -> String {
        match self {
            Record::Blank => "\n".to_string(),
            Record::Comment(comment) => format!("#{}\n", comment.text),
            _ => {
                let mut fields = self.values().join(":");
                while fields.ends_with(':') {
                    fields.pop();
                }
                format!("{}{}\n", self.marker(), fields)
            }
        }
    }
}

impl From<Location> for Record {
    fn from(record: Location) -> Self {
        Record::Location(record)
    }
}

impl From<NameServer> for Record {
    fn from(record: NameServer) -> Self {
        Record::NameServer(record)
    }
}

impl From<Alias> for Record {
    fn from(record: Alias) -> Self {
        Record::Alias(record)
    }
}

impl From<MailExchange> for Record {
    fn from(record: MailExchange) -> Self {
        Record::MailExchange(record)
    }
}

impl From<Text> for Record {
    fn from(record: Text) -> Self {
        Record::Text(record)
    }
}

impl From<Pointer> for Record {
    fn from(record: Pointer) -> Self {
        Record::Pointer(record)
    }
}

impl From<Cname> for Record {
    fn from(record: Cname) -> Self {
        Record::Cname(record)
    }
}

impl From<Soa> for Record {
    fn from(record: Soa) -> Self {
        Record::Soa(record)
    }
}

impl From<Generic> for Record {
    fn from(record: Generic) -> Self {
        Record::Generic(record)
    }
}

impl From<Comment> for Record {
    fn from(record: Comment) -> Self {
        Record::Comment(record)
    }
}
