//! Pingmon binary: a live liveness display driven by one ping process
//! per resolved address per target host.

mod cli;
mod render;

use clap::Parser;
use cli::Cli;
use common::Result;
use liveness::{
    AddrFamily, EventMux, Layout, Monitor, Probe, ProbeId, ResolvedTarget, SystemResolver, Target,
    ping_path, resolve_targets,
};
use render::TermRenderer;
use std::net::IpAddr;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    common::logging::init();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ping = ping_path()?;

    let resolved = resolve_targets(&SystemResolver, &cli.targets, cli.family_filter()).await?;

    let mux = EventMux::new();
    let (renderer, targets) = prepare(&ping, resolved, &mux, TermRenderer::new).await?;
    let probe_count: usize = targets.iter().map(|t| t.probes().count()).sum();
    info!(targets = targets.len(), probes = probe_count, "monitoring started");

    let mut monitor = Monitor::new(targets, mux, renderer);
    let outcome = {
        let run = monitor.run();
        tokio::pin!(run);
        tokio::select! {
            res = &mut run => res,
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                Ok(())
            }
        }
    };
    monitor.shutdown().await;
    outcome
}

/// Build the renderer for the computed layout, then spawn the probes.
/// The order is load-bearing: a rejected display must fail before any
/// probe process exists.
async fn prepare<R>(
    ping: &Path,
    resolved: Vec<ResolvedTarget>,
    mux: &EventMux,
    make_renderer: impl FnOnce(Layout, usize) -> Result<R>,
) -> Result<(R, Vec<Target>)> {
    let layout = Layout::measure(&resolved);
    let probe_count: usize = resolved
        .iter()
        .map(|t| usize::from(t.v4.is_some()) + usize::from(t.v6.is_some()))
        .sum();
    let renderer = make_renderer(layout, probe_count)?;
    let targets = spawn_targets(ping, resolved, mux).await?;
    Ok((renderer, targets))
}

/// Spawn every probe for the resolved set. On failure, probes spawned
/// so far are terminated before the error propagates.
async fn spawn_targets(
    ping: &Path,
    resolved: Vec<ResolvedTarget>,
    mux: &EventMux,
) -> Result<Vec<Target>> {
    let mut targets: Vec<Target> = Vec::with_capacity(resolved.len());
    let mut next_id: ProbeId = 0;

    for entry in resolved {
        match spawn_target(ping, entry, &mut next_id, mux) {
            Ok(target) => targets.push(target),
            Err(e) => {
                for target in &mut targets {
                    for probe in target.probes_mut() {
                        probe.terminate().await;
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(targets)
}

fn spawn_target(
    ping: &Path,
    entry: ResolvedTarget,
    next_id: &mut ProbeId,
    mux: &EventMux,
) -> Result<Target> {
    let mut spawn = |address: IpAddr, family: AddrFamily| -> Result<Probe> {
        let id = *next_id;
        *next_id += 1;
        Probe::spawn(id, ping, address, family, mux.sender())
    };

    let v4 = entry
        .v4
        .map(|a| spawn(IpAddr::V4(a), AddrFamily::V4))
        .transpose()?;
    let v6 = entry
        .v6
        .map(|a| spawn(IpAddr::V6(a), AddrFamily::V6))
        .transpose()?;
    Target::new(entry.name, v4, v6)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Error;

    #[tokio::test]
    async fn renderer_failure_prevents_any_probe_spawn() {
        let resolved = vec![ResolvedTarget {
            name: "alpha.example".to_string(),
            v4: Some("192.0.2.1".parse().unwrap()),
            v6: None,
        }];
        let mux = EventMux::new();

        // The bogus ping path would surface as a probe error if the
        // spawn phase ran; the render error proves it never did.
        let result = prepare(
            Path::new("/nonexistent/ping"),
            resolved,
            &mux,
            |_layout, _probe_count| -> Result<()> { Err(Error::render("display too small")) },
        )
        .await;

        assert!(matches!(result, Err(Error::Render(_))));
    }
}
