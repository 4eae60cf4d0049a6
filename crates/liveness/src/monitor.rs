//! Monitor loop: event dispatch, exit detection, tick scheduling and
//! verdict computation.

use crate::mux::{EventMux, ProbeEvent};
use crate::probe::{Probe, Target};
use crate::render::Renderer;
use crate::types::{MUX_WAIT, ProbeId, TICK_INTERVAL};
use common::{Error, Result};
use std::time::{Duration, Instant, SystemTime};
use tracing::{debug, info};

/// Outcome of one tick pass across all probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TickVerdict {
    Continue,
    AllDead,
}

/// The monitoring driver: one cooperative loop multiplexing probe
/// output, detecting process exits and running the fixed-cadence
/// verdict/render tick.
///
/// All probe state is mutated only from this loop; the tick phase
/// finishes updating every history before the all-dead check or the
/// renderer read any of it.
pub struct Monitor<R> {
    targets: Vec<Target>,
    mux: EventMux,
    renderer: R,
    tick_interval: Duration,
    mux_wait: Duration,
}

impl<R: Renderer> Monitor<R> {
    pub fn new(targets: Vec<Target>, mux: EventMux, renderer: R) -> Self {
        Self {
            targets,
            mux,
            renderer,
            tick_interval: TICK_INTERVAL,
            mux_wait: MUX_WAIT,
        }
    }

    /// Override the tick cadence. Tests run with a compressed clock.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Run until every probe has died.
    ///
    /// Each iteration: one bounded multiplexer wait, a non-blocking exit
    /// sweep over all live probes, then the tick phase once its interval
    /// has elapsed. A tick appends verdicts, renders one frame and
    /// escalates to [`Error::AllProbesDead`] when nothing is left to
    /// supervise. The final frame is rendered before the escalation so
    /// the operator sees the terminal state.
    pub async fn run(&mut self) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            match self.mux.wake(self.mux_wait).await {
                Some(ProbeEvent::Line { id, line }) => {
                    self.handle_line(id, &line, Instant::now());
                }
                Some(ProbeEvent::Eof { id }) => self.handle_eof(id).await,
                None => {}
            }

            self.poll_exits();

            if last_tick.elapsed() >= self.tick_interval {
                let now = Instant::now();
                let verdict = self.tick(now);
                self.renderer.frame(&self.targets, SystemTime::now())?;
                last_tick = now;
                if verdict == TickVerdict::AllDead {
                    return Err(Error::AllProbesDead);
                }
            }
        }
    }

    /// Terminate every probe process still alive. Called on every exit
    /// path of the run, including operator interrupt.
    pub async fn shutdown(&mut self) {
        for target in &mut self.targets {
            for probe in target.probes_mut() {
                probe.terminate().await;
            }
        }
        info!("all probe processes terminated");
    }

    fn handle_line(&mut self, id: ProbeId, line: &str, now: Instant) {
        if let Some(probe) = self.probe_mut(id) {
            probe.note_line(line, now);
        }
    }

    async fn handle_eof(&mut self, id: ProbeId) {
        if let Some(probe) = self.probe_mut(id) {
            probe.reap().await;
        }
    }

    /// Non-blocking exit sweep, run on every wake so an exit is observed
    /// before any later output from that probe would be.
    fn poll_exits(&mut self) {
        for target in &mut self.targets {
            for probe in target.probes_mut() {
                probe.poll_exit();
            }
        }
    }

    /// One verdict pass over every probe.
    fn tick(&mut self, now: Instant) -> TickVerdict {
        let mut any_alive = false;
        for target in &mut self.targets {
            for probe in target.probes_mut() {
                if let Some(outcome) = probe.record_tick(now) {
                    any_alive = true;
                    debug!(id = probe.id(), address = %probe.address(), ?outcome, "tick");
                }
            }
        }
        if any_alive {
            TickVerdict::Continue
        } else {
            TickVerdict::AllDead
        }
    }

    fn probe_mut(&mut self, id: ProbeId) -> Option<&mut Probe> {
        self.targets
            .iter_mut()
            .flat_map(|target| target.probes_mut())
            .find(|probe| probe.id() == id)
    }
}
