//! Concurrent liveness monitoring over external probe processes.
//!
//! This crate supervises one reachability-probe subprocess per resolved
//! address per target host, multiplexes their output through a single
//! cooperative event loop, keeps a bounded rolling history of per-tick
//! outcomes for each probe, and judges liveness by recency of the last
//! observed success rather than by individual events.
//!
//! # Architecture
//!
//! - [`Probe`]/[`Target`]: one external process and its derived state,
//!   up to two per target (one per address family).
//! - [`EventMux`]: bounded single-consumer wait over all probe output
//!   streams.
//! - [`Monitor`]: the driver loop — event dispatch, exit detection,
//!   the fixed-cadence verdict tick and renderer invocation, and the
//!   fatal all-probes-dead escalation.
//! - [`Resolver`]/[`Renderer`]: external collaborators behind traits.
//!
//! # Example
//!
//! ```no_run
//! use liveness::{AddrFamily, EventMux, Monitor, Probe, Renderer, Target, ping_path};
//! use std::time::SystemTime;
//!
//! struct LogRenderer;
//!
//! impl Renderer for LogRenderer {
//!     fn frame(&mut self, targets: &[Target], _now: SystemTime) -> common::Result<()> {
//!         for target in targets {
//!             for probe in target.probes() {
//!                 println!(
//!                     "{} {} alive={} failures={}",
//!                     target.name(),
//!                     probe.address(),
//!                     probe.is_alive(),
//!                     probe.fail_count()
//!                 );
//!             }
//!         }
//!         Ok(())
//!     }
//! }
//!
//! # async fn example() -> common::Result<()> {
//! let ping = ping_path()?;
//! let mux = EventMux::new();
//! let probe = Probe::spawn(
//!     0,
//!     &ping,
//!     "127.0.0.1".parse::<std::net::IpAddr>().unwrap(),
//!     AddrFamily::V4,
//!     mux.sender(),
//! )?;
//! let target = Target::new("localhost", Some(probe), None)?;
//!
//! let mut monitor = Monitor::new(vec![target], mux, LogRenderer);
//! let result = monitor.run().await;
//! monitor.shutdown().await;
//! result
//! # }
//! ```

pub mod monitor;
pub mod mux;
pub mod probe;
pub mod render;
pub mod resolve;
pub mod types;

pub use monitor::Monitor;
pub use mux::{EventMux, ProbeEvent};
pub use probe::{Probe, SUCCESS_PREFIX, Target, is_success_line, ping_command, ping_path};
pub use render::{FAMILY_WIDTH, Layout, Renderer, STATUS_WIDTH};
pub use resolve::{FamilyFilter, ResolvedTarget, Resolver, SystemResolver, resolve_targets};
pub use types::{
    AddrFamily, HISTORY_SIZE, History, MUX_WAIT, Outcome, ProbeId, TICK_INTERVAL,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_lines_match_the_success_signature() {
        assert!(is_success_line(
            "64 bytes from 203.0.113.5: icmp_seq=3 ttl=52 time=11.9 ms"
        ));
        assert!(!is_success_line("ping: sendmsg: Network is unreachable"));
    }

    #[test]
    fn history_starts_full_of_unknowns() {
        let history = History::new();
        assert_eq!(history.len(), HISTORY_SIZE);
        assert!(history.iter().all(|o| o == Outcome::Unknown));
    }
}
