//! The lease-to-zone sync driver.
//!
//! One pass reads the static zone sections, derives an [`Alias`] record
//! for every currently leased host, and publishes the composed zone:
//!
//! 1. Static input files become the zone's leading sections, prefixed
//!    by a warning section naming their origin.
//! 2. The MAC override file contributes records for hosts that do not
//!    report their own name; overridden names take precedence over the
//!    lease-reported ones.
//! 3. Every remaining unique lease with a usable host name contributes
//!    a record under the configured domain.
//! 4. The zone replaces tinydns's `data` file atomically and the
//!    external compiler makes it live (skipped on a dry run).

use std::collections::HashSet;
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use tracing::{debug, info};

use crate::authority::{self, Authority};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::files;
use crate::lease::{Lease, Leases};
use crate::record::{Alias, Comment, Record};
use crate::section::Section;

/// Floor for derived record TTLs, in seconds.
const TTL_MIN: i64 = 60;

/// Ceiling for derived record TTLs, in seconds.
const TTL_MAX: i64 = 86_400;

/// TTL for a derived record: seconds until the lease expires, clamped
/// to [`TTL_MIN`]..=[`TTL_MAX`]. A lease with no expiration has nothing
/// left to live and clamps to the floor.
fn derived_ttl(lease: &Lease, now: NaiveDateTime) -> String {
    let remaining = lease
        .expiration
        .map_or(0, |ends| (ends - now).num_seconds());
    remaining.clamp(TTL_MIN, TTL_MAX).to_string()
}

fn comment(text: impl Into<String>) -> Record {
    Record::from(Comment { text: text.into() })
}

fn derived_alias(host_name: &str, domain: &str, lease: &Lease, now: NaiveDateTime) -> Record {
    Record::from(Alias {
        host_name: format!("{host_name}.{domain}"),
        ip: lease.ip.clone(),
        ttl: derived_ttl(lease, now),
        ..Default::default()
    })
}

/// Reads the MAC override file: one `<mac> <host name>` pair per line,
/// separated by whitespace. Blank lines are skipped.
///
/// # Errors
///
/// A non-blank line without both tokens is [`Error::MacOverride`].
fn read_mac_overrides(path: &Path) -> Result<Vec<(String, String)>> {
    let mut overrides = Vec::new();
    for line in files::read_lines(path)? {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next()) {
            (Some(mac), Some(host_name)) => {
                overrides.push((mac.to_string(), host_name.to_string()));
            }
            _ => return Err(Error::MacOverride(line.to_string())),
        }
    }
    Ok(overrides)
}

/// Composes the full zone for the given instant: static sections behind
/// a warning header, then the section of lease-derived records.
pub fn compose(config: &Config, now: NaiveDateTime) -> Result<Authority> {
    let mut zone = Authority::new();
    if config.static_files.is_empty() {
        if config.tinydns_root.is_dir() {
            zone.read_directory(&config.tinydns_root, None, Some(".static"))?;
        }
    } else {
        zone.read_named(config.static_files.iter().cloned())?;
    }

    let mut warning = Section::new();
    warning.add([
        comment(" DO NOT EDIT! ALL CHANGES WILL BE LOST!"),
        comment(" This file is generated automatically from the following files."),
        comment(" Edit them instead:"),
    ]);
    let sources: Vec<Record> = zone
        .sections()
        .filter_map(Section::file_name)
        .map(|path| comment(path.display().to_string()))
        .collect();
    warning.add(sources);
    zone.prepend(warning);

    let leases = Leases::load(&config.leases_file)?;
    info!(
        leases = leases.len(),
        file = %config.leases_file.display(),
        "parsed lease log"
    );

    let mut dynamics = Section::new();
    dynamics.add([comment(format!(
        "{} DHCP-Leased records for the {} domain {}",
        "#".repeat(18),
        config.domain,
        "#".repeat(19)
    ))]);

    // Host names claimed by the override file; lease-reported names do
    // not get a second record for them.
    let mut overridden = HashSet::new();
    if let Some(path) = &config.mac_file {
        for (mac, host_name) in read_mac_overrides(path)? {
            overridden.insert(host_name.clone());
            match leases.by_mac(&mac) {
                Ok(lease) => {
                    dynamics.add([derived_alias(&host_name, &config.domain, lease, now)]);
                }
                Err(Error::LeaseNotFound(_)) => {
                    debug!(%mac, %host_name, "no current lease for override");
                }
                Err(error) => return Err(error),
            }
        }
    }

    for lease in leases.unique() {
        if let Some(host_name) = &lease.host_name
            && !overridden.contains(host_name)
        {
            dynamics.add([derived_alias(host_name, &config.domain, lease, now)]);
        }
    }
    zone.append(dynamics);

    Ok(zone)
}

/// Runs one sync pass: compose the zone, then either print it (dry run)
/// or merge it into the tinydns root and recompile the live data.
pub fn run(config: &Config) -> Result<()> {
    let zone = compose(config, Local::now().naive_local())?;
    if config.dry_run {
        print!("{}", zone.to_text());
        return Ok(());
    }
    zone.merge(&config.tinydns_root)?;
    authority::compile(&config.tinydns_root)?;
    info!(root = %config.tinydns_root.display(), "zone published");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{NaiveDate, TimeDelta};

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 7)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn lease_expiring_in(seconds: i64) -> Lease {
        Lease {
            ip: "10.0.0.1".to_string(),
            mac: Some("aa:aa:aa:aa:aa:aa".to_string()),
            expiration: Some(noon() + TimeDelta::seconds(seconds)),
            host_name: Some("host".to_string()),
        }
    }

    #[test]
    fn test_ttl_clamps_to_floor() {
        assert_eq!(derived_ttl(&lease_expiring_in(30), noon()), "60");
    }

    #[test]
    fn test_ttl_clamps_to_ceiling() {
        assert_eq!(derived_ttl(&lease_expiring_in(1_000_000), noon()), "86400");
    }

    #[test]
    fn test_ttl_passes_through_in_range() {
        assert_eq!(derived_ttl(&lease_expiring_in(3600), noon()), "3600");
    }

    #[test]
    fn test_ttl_without_expiration_is_the_floor() {
        let lease = Lease {
            expiration: None,
            ..lease_expiring_in(0)
        };
        assert_eq!(derived_ttl(&lease, noon()), "60");
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        config: Config,
    }

    fn fixture(leases_log: &str, mac_overrides: Option<&str>) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tinydns");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(
            root.join("hosts.static"),
            "=gateway.example.com:10.0.0.254\n",
        )
        .unwrap();

        let leases_file = dir.path().join("dhcpd.leases");
        std::fs::write(&leases_file, leases_log).unwrap();

        let mac_file = mac_overrides.map(|content| {
            let path = dir.path().join("macs");
            std::fs::write(&path, content).unwrap();
            path
        });

        let config = Config {
            domain: "example.com".to_string(),
            leases_file,
            mac_file,
            tinydns_root: root,
            static_files: Vec::new(),
            dry_run: false,
        };
        Fixture { _dir: dir, config }
    }

    fn lease_block(ip: &str, mac: &str, host_name: &str) -> String {
        format!(
            "lease {ip} {{\n  ends 3 2024/02/07 13:00:00;\n  hardware ethernet {mac};\n  \
             client-hostname \"{host_name}\";\n}}\n"
        )
    }

    #[test]
    fn test_compose_layers_warning_statics_and_dynamics() {
        let fixture = fixture(&lease_block("10.0.0.7", "aa:aa:aa:aa:aa:aa", "laptop"), None);
        let zone = compose(&fixture.config, noon()).unwrap();
        let text = zone.to_text();

        let static_path = fixture.config.tinydns_root.join("hosts.static");
        let expected_header = format!(
            "# DO NOT EDIT! ALL CHANGES WILL BE LOST!\n\
             # This file is generated automatically from the following files.\n\
             # Edit them instead:\n\
             #{}\n",
            static_path.display()
        );
        assert!(text.starts_with(&expected_header), "got: {text}");
        assert!(text.contains("=gateway.example.com:10.0.0.254\n"));
        assert!(text.contains("DHCP-Leased records for the example.com domain"));
        assert!(text.ends_with("=laptop.example.com:10.0.0.7:3600\n"), "got: {text}");
    }

    #[test]
    fn test_override_takes_precedence_over_lease_name() {
        let fixture = fixture(
            &lease_block("10.0.0.7", "aa:aa:aa:aa:aa:aa", "laptop"),
            Some("aa:aa:aa:aa:aa:aa laptop\n"),
        );
        let zone = compose(&fixture.config, noon()).unwrap();
        let matches = zone.search("host_name", "^laptop").unwrap();
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn test_override_without_lease_is_skipped() {
        let fixture = fixture(
            &lease_block("10.0.0.7", "aa:aa:aa:aa:aa:aa", "laptop"),
            Some("ff:ff:ff:ff:ff:ff printer\n"),
        );
        let zone = compose(&fixture.config, noon()).unwrap();
        assert!(zone.search("host_name", "printer").unwrap().is_empty());
        assert_eq!(zone.search("host_name", "^laptop").unwrap().len(), 1);
    }

    #[test]
    fn test_malformed_override_line_is_fatal() {
        let fixture = fixture(
            &lease_block("10.0.0.7", "aa:aa:aa:aa:aa:aa", "laptop"),
            Some("aa:aa:aa:aa:aa:aa\n"),
        );
        let result = compose(&fixture.config, noon());
        assert!(matches!(result, Err(Error::MacOverride(_))));
    }

    #[test]
    fn test_lease_without_host_name_derives_nothing() {
        let log = "lease 10.0.0.7 {\n  ends 3 2024/02/07 13:00:00;\n  \
                   hardware ethernet aa:aa:aa:aa:aa:aa;\n}\n";
        let fixture = fixture(log, None);
        let zone = compose(&fixture.config, noon()).unwrap();
        assert!(zone.search("ip", "10\\.0\\.0\\.7").unwrap().is_empty());
    }

    #[test]
    fn test_explicit_static_files_keep_their_order() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("a.static");
        let first = dir.path().join("z.static");
        std::fs::write(&first, "=one.example.com:10.0.0.1\n").unwrap();
        std::fs::write(&second, "=two.example.com:10.0.0.2\n").unwrap();
        let leases_file = dir.path().join("dhcpd.leases");
        std::fs::write(&leases_file, "").unwrap();

        let config = Config {
            domain: "example.com".to_string(),
            leases_file,
            mac_file: None,
            tinydns_root: dir.path().join("missing-root"),
            static_files: vec![first, second],
            dry_run: true,
        };
        let zone = compose(&config, noon()).unwrap();
        let matches = zone.search("host_name", "example").unwrap();
        assert_eq!(matches[0].field("host_name"), Some("one.example.com"));
        assert_eq!(matches[1].field("host_name"), Some("two.example.com"));
    }

    #[test]
    fn test_missing_root_without_statics_yields_dynamics_only() {
        let dir = tempfile::tempdir().unwrap();
        let leases_file = dir.path().join("dhcpd.leases");
        std::fs::write(&leases_file, lease_block("10.0.0.7", "aa:aa:aa:aa:aa:aa", "laptop"))
            .unwrap();

        let config = Config {
            domain: "example.com".to_string(),
            leases_file,
            mac_file: None,
            tinydns_root: PathBuf::from("/nonexistent/tinydns"),
            static_files: Vec::new(),
            dry_run: true,
        };
        let zone = compose(&config, noon()).unwrap();
        assert_eq!(zone.sections().count(), 2);
        assert_eq!(zone.search("host_name", "^laptop").unwrap().len(), 1);
    }
}
