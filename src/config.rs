use std::path::PathBuf;

use crate::error::{Error, Result};

/// Resolved run configuration for one sync pass.
#[derive(Debug, Clone)]
pub struct Config {
    /// Domain the leased hosts belong to, without a leading dot.
    pub domain: String,
    /// Location of the dhcpd leases file.
    pub leases_file: PathBuf,
    /// Optional file of hard-coded MAC-to-host-name mappings.
    pub mac_file: Option<PathBuf>,
    /// The tinydns root directory, holding the live `data` file.
    pub tinydns_root: PathBuf,
    /// Static zone files read ahead of the derived records. An empty
    /// list means "every `.static` file under the tinydns root".
    pub static_files: Vec<PathBuf>,
    /// Print the merged zone instead of publishing it.
    pub dry_run: bool,
}

impl Config {
    /// Normalizes the configuration: leading dots are stripped from the
    /// domain, which must not end up empty.
    pub fn resolve(mut self) -> Result<Self> {
        self.domain = self.domain.trim_start_matches('.').to_string();
        if self.domain.is_empty() {
            return Err(Error::Config("domain must not be empty".to_string()));
        }
        Ok(self)
    }
}
