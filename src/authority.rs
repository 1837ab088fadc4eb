//! Whole-zone composition.
//!
//! An [`Authority`] is the entire authoritative DNS data served by
//! tinydns: an ordered sequence of [`Section`]s. Concatenation order is
//! significant — when the same name appears twice, later sections
//! override earlier ones in the effective zone.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::files;
use crate::record::Record;
use crate::section::Section;

/// Recompiles the zone's binary data by running `tinydns-data` in the
/// tinydns root directory. This is what makes merged changes go live.
///
/// # Errors
///
/// A non-zero exit from the compiler is fatal and reported verbatim as
/// [`Error::Compiler`]; failure to launch it at all surfaces as
/// [`Error::Io`].
pub fn compile(root: &Path) -> Result<()> {
    debug!(root = %root.display(), "running tinydns-data");
    let status = Command::new("tinydns-data").current_dir(root).status()?;
    if !status.success() {
        return Err(Error::Compiler { status });
    }
    Ok(())
}

/// The entire authoritative zone, as an ordered sequence of sections.
#[derive(Debug, Clone, Default)]
pub struct Authority {
    sections: VecDeque<Section>,
}

impl Authority {
    /// Creates an empty zone.
    pub fn new() -> Self {
        Self::default()
    }

    /// The zone's sections, in concatenation order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Replaces the section list with one section per matching plain
    /// file in `dir`, each read from disk.
    ///
    /// Entries are filtered by optional file-name `prefix` and `suffix`
    /// and read in file-name order, so the resulting zone does not
    /// depend on filesystem enumeration order.
    pub fn read_directory(
        &mut self,
        dir: &Path,
        prefix: Option<&str>,
        suffix: Option<&str>,
    ) -> Result<()> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if prefix.is_some_and(|prefix| !name.starts_with(prefix)) {
                continue;
            }
            if suffix.is_some_and(|suffix| !name.ends_with(suffix)) {
                continue;
            }
            paths.push(entry.path());
        }
        paths.sort();
        self.read_named(paths)
    }

    /// Replaces the section list with one section per named file, in
    /// exactly the caller's order.
    pub fn read_named<I>(&mut self, paths: I) -> Result<()>
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        let mut sections = VecDeque::new();
        for path in paths {
            let mut section = Section::from_file(path);
            section.read()?;
            sections.push_back(section);
        }
        self.sections = sections;
        Ok(())
    }

    /// Inserts a section before the first current section.
    pub fn prepend(&mut self, section: Section) {
        self.sections.push_front(section);
    }

    /// Inserts a section after the last current section.
    pub fn append(&mut self, section: Section) {
        self.sections.push_back(section);
    }

    /// Returns every record in the zone whose `field` value matches
    /// `pattern`, concatenated in section order.
    pub fn search(&self, field: &str, pattern: &str) -> Result<Vec<&Record>> {
        let regex = Regex::new(pattern)?;
        Ok(self
            .sections
            .iter()
            .flat_map(|section| {
                section
                    .records()
                    .iter()
                    .filter(|record| record.matches(field, &regex))
            })
            .collect())
    }

    /// The zone's full text: section texts joined by a blank line.
    pub fn to_text(&self) -> String {
        self.sections
            .iter()
            .map(Section::to_text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Atomically replaces tinydns's `data` file under `root` with this
    /// zone's text.
    ///
    /// The write is delegated to the atomic writer; there are no
    /// partial writes of the zone's own making.
    pub fn merge(&self, root: &Path) -> Result<()> {
        let data_path = root.join("data");
        info!(path = %data_path.display(), "merging zone data");
        files::save(&self.to_text(), &data_path)
    }
}
