//! Terminal renderer for the live display.

use chrono::{DateTime, Local};
use common::{Error, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use liveness::{FAMILY_WIDTH, Layout, Outcome, Renderer, STATUS_WIDTH, Target};
use std::io::{Stdout, Write, stdout};
use std::time::SystemTime;

const GLYPH_UP: char = '#';
const GLYPH_DOWN: char = '.';
const GLYPH_UNKNOWN: char = ' ';

/// Crossterm-backed renderer: alternate screen, one header line, one
/// row per probe.
pub struct TermRenderer {
    out: Stdout,
    layout: Layout,
}

impl TermRenderer {
    /// Enter the alternate screen after checking there is room for the
    /// computed layout. Fails before any probe process exists when the
    /// terminal is too small.
    pub fn new(layout: Layout, probe_count: usize) -> Result<Self> {
        let (cols, rows) = terminal::size()?;
        let need_cols = layout.required_cols();
        let need_rows = layout.required_rows(probe_count);
        if cols < need_cols || rows < need_rows {
            return Err(Error::render(format!(
                "display too small: need {need_cols}x{need_rows}, have {cols}x{rows}"
            )));
        }

        let mut out = stdout();
        execute!(out, terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(Self { out, layout })
    }
}

impl Renderer for TermRenderer {
    fn frame(&mut self, targets: &[Target], now: SystemTime) -> Result<()> {
        let when: DateTime<Local> = now.into();
        queue!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0),
            style::Print(format!("pingmon  {}", when.format("%Y-%m-%d %H:%M:%S")))
        )?;

        let mut row = 1u16;
        for target in targets {
            for probe in target.probes() {
                let strip: String = probe.history().iter().map(glyph).collect();
                let status = status_cell(probe.is_alive(), probe.fail_count());
                queue!(
                    self.out,
                    cursor::MoveTo(0, row),
                    style::Print(format!(
                        "{name:<nw$} {addr:<aw$} {family:<fw$} {strip} {status}",
                        name = target.name(),
                        addr = probe.address(),
                        family = probe.family(),
                        nw = self.layout.name_width,
                        aw = self.layout.addr_width,
                        fw = FAMILY_WIDTH,
                    ))
                )?;
                row += 1;
            }
        }

        self.out.flush()?;
        Ok(())
    }
}

impl Drop for TermRenderer {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, terminal::LeaveAlternateScreen);
    }
}

/// The trailing cell of a probe row, padded to the width the layout
/// reserves for it.
fn status_cell(alive: bool, fail_count: u64) -> String {
    if alive {
        format!("{fail_count:>width$}", width = STATUS_WIDTH)
    } else {
        format!("{:>width$}", "DEAD", width = STATUS_WIDTH)
    }
}

fn glyph(outcome: Outcome) -> char {
    match outcome {
        Outcome::Up => GLYPH_UP,
        Outcome::Down => GLYPH_DOWN,
        Outcome::Unknown => GLYPH_UNKNOWN,
    }
}
