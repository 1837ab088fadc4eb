//! Ordered groups of zone records.
//!
//! A [`Section`] is a group of records that belong together, optionally
//! bound to a backing file. Bound sections load from and persist to that
//! file; unbound sections exist only in memory and are used for
//! synthetic content such as generated records.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::Result;
use crate::files;
use crate::record::Record;

/// An ordered sequence of records, optionally bound to a file.
#[derive(Debug, Clone, Default)]
pub struct Section {
    file_name: Option<PathBuf>,
    records: Vec<Record>,
}

impl Section {
    /// Creates an empty, in-memory-only section.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty section bound to a backing file.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            file_name: Some(path.into()),
            records: Vec::new(),
        }
    }

    /// The backing file, if the section is bound to one.
    pub fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    /// The records in this section, in order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// Appends records, preserving call order.
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) {
        self.records.extend(records);
    }

    /// Replaces the record sequence with the parsed contents of the
    /// backing file. A no-op for unbound sections.
    ///
    /// # Errors
    ///
    /// Fails on the first unparsable line; the in-memory sequence is
    /// left unchanged in that case.
    pub fn read(&mut self) -> Result<()> {
        let Some(path) = &self.file_name else {
            return Ok(());
        };
        let mut records = Vec::new();
        for line in files::read_lines(path)? {
            records.push(Record::parse(&line?)?);
        }
        self.records = records;
        Ok(())
    }

    /// Persists the section to its backing file through the atomic
    /// writer. A no-op for unbound sections.
    pub fn write(&self) -> Result<()> {
        let Some(path) = &self.file_name else {
            return Ok(());
        };
        files::save(&self.to_text(), path)
    }

    /// Returns the records whose `field` value matches `pattern`, in
    /// sequence order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Pattern`](crate::Error::Pattern) when the
    /// pattern is not a valid regular expression.
    pub fn search(&self, field: &str, pattern: &str) -> Result<Vec<&Record>> {
        let regex = Regex::new(pattern)?;
        Ok(self
            .records
            .iter()
            .filter(|record| record.matches(field, &regex))
            .collect())
    }

    /// The section's on-disk representation: every record's serialized
    /// line, concatenated in sequence order.
    pub fn to_text(&self) -> String {
        self.records.iter().map(Record::to_line).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Alias, Comment};

    fn alias(host_name: &str, ip: &str) -> Record {
        Record::from(Alias {
            host_name: host_name.to_string(),
            ip: ip.to_string(),
            ..Default::default()
        })
    }

    #[test]
    fn test_add_preserves_order() {
        let mut section = Section::new();
        section.add([alias("a.example.com", "10.0.0.1")]);
        section.add([
            alias("b.example.com", "10.0.0.2"),
            alias("c.example.com", "10.0.0.3"),
        ]);
        assert_eq!(
            section.to_text(),
            "=a.example.com:10.0.0.1\n=b.example.com:10.0.0.2\n=c.example.com:10.0.0.3\n"
        );
    }

    #[test]
    fn test_search_filters_by_field() {
        let mut section = Section::new();
        section.add([
            alias("web.example.com", "10.0.0.1"),
            alias("db.example.com", "10.0.0.2"),
            Record::from(Comment {
                text: " web servers".to_string(),
            }),
        ]);

        let matches = section.search("host_name", "^web").unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].field("ip"), Some("10.0.0.1"));

        // The comment's only field is "text", so it never matches here.
        let all = section.search("host_name", "").unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_search_rejects_bad_pattern() {
        let section = Section::new();
        assert!(section.search("host_name", "[unclosed").is_err());
    }

    #[test]
    fn test_unbound_read_and_write_are_no_ops() {
        let mut section = Section::new();
        section.add([alias("a.example.com", "10.0.0.1")]);
        section.read().unwrap();
        section.write().unwrap();
        assert_eq!(section.records().len(), 1);
    }

    #[test]
    fn test_write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.static");

        let mut section = Section::from_file(&path);
        section.add([
            Record::from(Comment {
                text: " static hosts".to_string(),
            }),
            alias("a.example.com", "10.0.0.1"),
            Record::Blank,
            alias("b.example.com", "10.0.0.2"),
        ]);
        section.write().unwrap();

        let mut reread = Section::from_file(&path);
        reread.read().unwrap();
        assert_eq!(reread.records(), section.records());
    }

    #[test]
    fn test_read_replaces_previous_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hosts.static");
        std::fs::write(&path, "=a.example.com:10.0.0.1\n").unwrap();

        let mut section = Section::from_file(&path);
        section.add([alias("stale.example.com", "10.9.9.9")]);
        section.read().unwrap();
        assert_eq!(section.records().len(), 1);
        assert_eq!(section.records()[0].field("host_name"), Some("a.example.com"));
    }
}
