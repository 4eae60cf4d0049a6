//! Renderer contract and display layout.

use crate::probe::Target;
use crate::resolve::ResolvedTarget;
use crate::types::HISTORY_SIZE;
use common::Result;
use std::time::SystemTime;

/// Width of the trailing status cell ("DEAD" or the failure count).
pub const STATUS_WIDTH: usize = 5;

/// Width of the address-family cell ("v4" or "v6").
pub const FAMILY_WIDTH: usize = 2;

/// Column widths for the live display, measured once from the resolved
/// target set and threaded explicitly to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub name_width: usize,
    pub addr_width: usize,
}

impl Layout {
    /// Measure the widest name and address across the resolved set.
    pub fn measure(targets: &[ResolvedTarget]) -> Self {
        let mut name_width = 0;
        let mut addr_width = 0;
        for target in targets {
            name_width = name_width.max(target.name.len());
            if let Some(a) = target.v4 {
                addr_width = addr_width.max(a.to_string().len());
            }
            if let Some(a) = target.v6 {
                addr_width = addr_width.max(a.to_string().len());
            }
        }
        Self {
            name_width,
            addr_width,
        }
    }

    /// Columns one probe row needs: name, address, family, history
    /// strip and status cell, space-separated.
    pub fn required_cols(&self) -> u16 {
        (self.name_width + 1 + self.addr_width + 1 + FAMILY_WIDTH + 1 + HISTORY_SIZE + 1 + STATUS_WIDTH)
            as u16
    }

    /// Rows needed for `probe_count` probe rows plus the header line.
    pub fn required_rows(&self, probe_count: usize) -> u16 {
        (probe_count + 1) as u16
    }
}

/// Draws one frame of the live display from a full state snapshot.
///
/// Implementations validate their drawing area at construction, before
/// any probe process is spawned.
pub trait Renderer {
    fn frame(&mut self, targets: &[Target], now: SystemTime) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(name: &str, v4: Option<&str>, v6: Option<&str>) -> ResolvedTarget {
        ResolvedTarget {
            name: name.to_string(),
            v4: v4.map(|a| a.parse().unwrap()),
            v6: v6.map(|a| a.parse().unwrap()),
        }
    }

    #[test]
    fn measure_takes_the_widest_name_and_address() {
        let targets = vec![
            resolved("a", Some("192.0.2.1"), None),
            resolved("a-much-longer-name", None, Some("2001:db8::beef")),
        ];
        let layout = Layout::measure(&targets);
        assert_eq!(layout.name_width, "a-much-longer-name".len());
        assert_eq!(layout.addr_width, "2001:db8::beef".len());
    }

    #[test]
    fn required_area_accounts_for_every_column() {
        let layout = Layout {
            name_width: 10,
            addr_width: 15,
        };
        let expected = 10 + 1 + 15 + 1 + FAMILY_WIDTH + 1 + HISTORY_SIZE + 1 + STATUS_WIDTH;
        assert_eq!(layout.required_cols(), expected as u16);
        assert_eq!(layout.required_rows(3), 4);
    }
}
