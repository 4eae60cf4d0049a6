//! Command-line interface.

use clap::Parser;
use liveness::FamilyFilter;

/// Live liveness display for a set of hosts, one ping process per
/// resolved address.
#[derive(Debug, Parser)]
#[command(name = "pingmon", version, about = "Concurrent ping liveness monitor")]
pub struct Cli {
    /// Hostnames or address literals to monitor.
    #[arg(required = true)]
    pub targets: Vec<String>,

    /// Probe IPv4 addresses only.
    #[arg(short = '4', long = "ipv4", conflicts_with = "ipv6")]
    pub ipv4: bool,

    /// Probe IPv6 addresses only.
    #[arg(short = '6', long = "ipv6")]
    pub ipv6: bool,
}

impl Cli {
    pub fn family_filter(&self) -> FamilyFilter {
        if self.ipv4 {
            FamilyFilter::V4Only
        } else if self.ipv6 {
            FamilyFilter::V6Only
        } else {
            FamilyFilter::Both
        }
    }
}
