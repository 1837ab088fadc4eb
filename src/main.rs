use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dhcp2tinydns::{Config, Result, record, sync};

#[derive(Parser)]
#[command(name = "dhcp2tinydns")]
#[command(author, version, about = "A utility to add DHCP-leased hosts to tinydns", long_about = None)]
struct Cli {
    /// The domain to which hosts should belong. For example, with the
    /// domain set to example.com, the host jdoe is added to tinydns as
    /// jdoe.example.com when it is assigned an address via DHCP.
    #[arg(short, long)]
    domain: String,

    /// Don't modify tinydns data. Write to standard output instead.
    #[arg(long)]
    dry_run: bool,

    /// The location of the dhcpd leases file.
    #[arg(short, long, default_value = "/var/lib/dhcpd/dhcpd.leases")]
    leases: PathBuf,

    /// The path to a file of hard-coded MAC address to hostname
    /// mappings: a MAC address, whitespace, then the host name on each
    /// line. Useful for hosts that do not report their own name.
    #[arg(short, long)]
    macfile: Option<PathBuf>,

    /// The tinydns root directory.
    #[arg(short, long, default_value = "/etc/djbdns/tinydns")]
    root: PathBuf,

    /// Files that contain static tinydns host information, concatenated
    /// ahead of the DHCP-derived records (default: ROOT/*.static).
    #[arg(short, long, num_args = 0..)]
    r#static: Vec<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .init();

    record::verify_marker_table()?;

    let config = Config {
        domain: cli.domain,
        leases_file: cli.leases,
        mac_file: cli.macfile,
        tinydns_root: cli.root,
        static_files: cli.r#static,
        dry_run: cli.dry_run,
    }
    .resolve()?;

    info!(domain = %config.domain, dry_run = config.dry_run, "syncing zone");
    sync::run(&config)
}
