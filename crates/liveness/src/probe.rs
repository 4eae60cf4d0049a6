//! Probe process lifecycle and the target data model.

use crate::mux::{ProbeEvent, spawn_reader};
use crate::types::{AddrFamily, History, Outcome, ProbeId, TICK_INTERVAL};
use common::{Error, Result};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Prefix of a reply line from the external probe tool (iputils ping
/// with the default payload, under a C locale).
pub const SUCCESS_PREFIX: &str = "64 bytes from ";

/// Whether a probe output line reports a successful reply.
///
/// Anything else (headers, errors, statistics) is informational chatter
/// and is not a failure by itself: only the absence of success lines
/// drives a failure verdict.
pub fn is_success_line(line: &str) -> bool {
    line.starts_with(SUCCESS_PREFIX)
}

/// Locate the external probe executable on PATH.
pub fn ping_path() -> Result<PathBuf> {
    let path = std::env::var_os("PATH").ok_or_else(|| Error::config("PATH is not set"))?;
    std::env::split_paths(&path)
        .map(|dir| dir.join("ping"))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| Error::config("no ping executable found on PATH"))
}

/// Build the probe command for one address: one ICMP echo per second,
/// numeric output, stdin closed, stdout captured, fixed locale so the
/// success-line signature is stable across hosts.
pub fn ping_command(ping: &Path, address: IpAddr, family: AddrFamily) -> Command {
    let mut cmd = Command::new(ping);
    match family {
        AddrFamily::V4 => cmd.arg("-4"),
        AddrFamily::V6 => cmd.arg("-6"),
    };
    cmd.arg("-n")
        .arg("-i")
        .arg("1")
        .arg(address.to_string())
        .env("LANG", "C")
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());
    cmd
}

/// The live supervision unit for one address of one target: one running
/// external probe process plus the state derived from its output.
pub struct Probe {
    id: ProbeId,
    address: IpAddr,
    family: AddrFamily,
    child: Option<Child>,
    last_success: Option<Instant>,
    history: History,
    fail_count: u64,
}

impl Probe {
    /// Spawn the external probe process for `address` and register its
    /// stdout with the multiplexer channel.
    pub fn spawn(
        id: ProbeId,
        ping: &Path,
        address: IpAddr,
        family: AddrFamily,
        events: mpsc::Sender<ProbeEvent>,
    ) -> Result<Self> {
        Self::spawn_command(id, address, family, ping_command(ping, address, family), events)
    }

    /// Spawn from a caller-supplied command whose stdout is piped.
    ///
    /// One [`ProbeEvent::Line`] is emitted per complete output line and
    /// one [`ProbeEvent::Eof`] when the stream closes.
    pub fn spawn_command(
        id: ProbeId,
        address: IpAddr,
        family: AddrFamily,
        mut command: Command,
        events: mpsc::Sender<ProbeEvent>,
    ) -> Result<Self> {
        command.kill_on_drop(true);
        let mut child = command
            .spawn()
            .map_err(|e| Error::probe(format!("failed to spawn probe for {address}: {e}")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::probe(format!("probe for {address} has no stdout")))?;
        spawn_reader(id, stdout, events);
        debug!(id, %address, %family, "probe spawned");

        Ok(Self {
            id,
            address,
            family,
            child: Some(child),
            last_success: None,
            history: History::new(),
            fail_count: 0,
        })
    }

    pub fn id(&self) -> ProbeId {
        self.id
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn family(&self) -> AddrFamily {
        self.family
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn fail_count(&self) -> u64 {
        self.fail_count
    }

    pub fn last_success(&self) -> Option<Instant> {
        self.last_success
    }

    /// Whether the probe process is still running (as last observed).
    pub fn is_alive(&self) -> bool {
        self.child.is_some()
    }

    /// Record one output line. Lines without the success signature are
    /// discarded silently.
    pub fn note_line(&mut self, line: &str, now: Instant) {
        if is_success_line(line) {
            self.last_success = Some(now);
        }
    }

    /// Non-blocking exit check. Returns true if the process was observed
    /// to have completed on this call.
    pub fn poll_exit(&mut self) -> bool {
        let Some(child) = self.child.as_mut() else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                warn!(id = self.id, address = %self.address, %status, "probe process exited");
                self.child = None;
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(id = self.id, address = %self.address, error = %e, "probe poll failed");
                self.child = None;
                true
            }
        }
    }

    /// Reap the process after its output stream reached EOF.
    ///
    /// A process that closed stdout but kept running can emit no
    /// further replies, so it is killed rather than waited on: the wait
    /// after a kill is prompt, an open-ended wait here would stall the
    /// whole monitor loop.
    pub async fn reap(&mut self) {
        if let Some(mut child) = self.child.take() {
            match child.try_wait() {
                Ok(Some(status)) => {
                    warn!(id = self.id, address = %self.address, %status, "probe process exited");
                }
                Ok(None) => {
                    warn!(id = self.id, address = %self.address, "probe closed stdout while running, killing");
                    if let Err(e) = child.start_kill() {
                        warn!(id = self.id, address = %self.address, error = %e, "failed to kill probe");
                    }
                    let _ = child.wait().await;
                }
                Err(e) => {
                    warn!(id = self.id, address = %self.address, error = %e, "probe reap failed");
                }
            }
        }
    }

    /// Staleness verdict at `now`: up iff the last success is within one
    /// tick interval. `None` for a dead probe.
    pub fn judge(&self, now: Instant) -> Option<Outcome> {
        if self.child.is_none() {
            return None;
        }
        Some(judge(self.last_success, now))
    }

    /// Apply one tick: append the verdict to the history, bumping the
    /// failure count on a down verdict. Dead probes are skipped; their
    /// state is reported out-of-band through [`Probe::is_alive`].
    pub fn record_tick(&mut self, now: Instant) -> Option<Outcome> {
        let outcome = self.judge(now)?;
        self.history.push(outcome);
        if outcome == Outcome::Down {
            self.fail_count += 1;
        }
        Some(outcome)
    }

    /// Kill the process if still alive and reap it. Called on every exit
    /// path so no child outlives the monitor.
    pub async fn terminate(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.start_kill() {
                warn!(id = self.id, address = %self.address, error = %e, "failed to kill probe");
            }
            let _ = child.wait().await;
            debug!(id = self.id, address = %self.address, "probe terminated");
        }
    }
}

/// Staleness predicate: up iff the most recent success is no older than
/// the tick interval.
fn judge(last_success: Option<Instant>, now: Instant) -> Outcome {
    match last_success {
        Some(at) if now.duration_since(at) <= TICK_INTERVAL => Outcome::Up,
        _ => Outcome::Down,
    }
}

/// An operator-entered host identity owning up to two probes, one per
/// address family that resolved.
pub struct Target {
    name: String,
    v4: Option<Probe>,
    v6: Option<Probe>,
}

impl Target {
    /// A target needs at least one probe to be accepted.
    pub fn new(name: impl Into<String>, v4: Option<Probe>, v6: Option<Probe>) -> Result<Self> {
        let name = name.into();
        if v4.is_none() && v6.is_none() {
            return Err(Error::probe(format!("target {name} has no probes")));
        }
        Ok(Self { name, v4, v6 })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn probes(&self) -> impl Iterator<Item = &Probe> {
        self.v4.iter().chain(self.v6.iter())
    }

    pub fn probes_mut(&mut self) -> impl Iterator<Item = &mut Probe> {
        self.v4.iter_mut().chain(self.v6.iter_mut())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn success_line_predicate() {
        assert!(is_success_line(
            "64 bytes from 192.0.2.1: icmp_seq=1 ttl=64 time=0.045 ms"
        ));
        assert!(!is_success_line(
            "PING 192.0.2.1 (192.0.2.1) 56(84) bytes of data."
        ));
        assert!(!is_success_line("From 192.0.2.254 icmp_seq=1 Time to live exceeded"));
        assert!(!is_success_line(""));
    }

    #[test]
    fn judge_staleness_boundary() {
        let now = Instant::now();
        assert_eq!(judge(None, now), Outcome::Down);
        assert_eq!(judge(Some(now), now), Outcome::Up);
        assert_eq!(judge(Some(now - TICK_INTERVAL), now), Outcome::Up);
        assert_eq!(
            judge(Some(now - TICK_INTERVAL - Duration::from_millis(1)), now),
            Outcome::Down
        );
    }

    #[test]
    fn ping_command_shape() {
        let addr: IpAddr = "192.0.2.7".parse().unwrap();
        let cmd = ping_command(Path::new("/usr/bin/ping"), addr, AddrFamily::V4);
        let args: Vec<_> = cmd.as_std().get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, vec!["-4", "-n", "-i", "1", "192.0.2.7"]);

        let envs: Vec<_> = cmd.as_std().get_envs().collect();
        assert!(
            envs.iter()
                .any(|(k, v)| k.to_str() == Some("LC_ALL") && v.and_then(|v| v.to_str()) == Some("C"))
        );
    }

    #[test]
    fn target_requires_a_probe() {
        assert!(Target::new("empty", None, None).is_err());
    }
}
