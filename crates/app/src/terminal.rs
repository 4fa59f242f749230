use std::io::{self, Write};

use tan_flicker_core::{StateCode, Surface, BAR_COUNT};

const PIXELS_PER_CELL: f64 = 4.0;
const MAX_CELLS_PER_BAR: f64 = 32.0;

/// Draws the five bars of one flicker code as a line of block characters.
#[derive(Debug)]
pub struct TerminalSurface {
    label: String,
    base_scale_px: f64,
    scale_px: f64,
    code: Option<StateCode>,
    playing: bool,
}

impl TerminalSurface {
    pub fn new(label: impl Into<String>, base_scale_px: f64) -> Self {
        Self {
            label: label.into(),
            base_scale_px,
            scale_px: base_scale_px,
            code: None,
            playing: false,
        }
    }

    pub fn line(&self) -> String {
        let width = (self.scale_px / PIXELS_PER_CELL)
            .round()
            .clamp(1.0, MAX_CELLS_PER_BAR) as usize;
        let bars: Vec<String> = (0..BAR_COUNT)
            .map(|bar| {
                let lit = self.code.is_some_and(|code| code.bar(bar));
                (if lit { "█" } else { " " }).repeat(width)
            })
            .collect();
        let indicator = if self.playing { ">" } else { "=" };
        format!("{indicator} {} |{}|", self.label, bars.join("|"))
    }
}

impl Surface for TerminalSurface {
    fn base_scale_px(&self) -> f64 {
        self.base_scale_px
    }

    fn apply_state(&mut self, code: StateCode) {
        self.code = Some(code);
    }

    fn apply_scale(&mut self, scale_px: f64) {
        self.scale_px = scale_px;
    }

    fn set_play_indicator(&mut self, running: bool) {
        self.playing = running;
    }
}

/// Redraws `lines` in place of the previously drawn block of the same height.
pub fn redraw(lines: &[String], first: bool) -> io::Result<()> {
    let mut out = io::stdout().lock();
    if !first {
        write!(out, "\x1b[{}A", lines.len())?;
    }
    for line in lines {
        writeln!(out, "\r\x1b[2K{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn huge_scale_is_capped_to_a_terminal_line() {
        let mut surface = TerminalSurface::new("#0", 8.0);
        surface.apply_scale(1e300);
        surface.apply_state(StateCode::clock_high(0xf));

        let cells = surface.line().chars().filter(|&c| c == '█').count();
        assert_eq!(cells, BAR_COUNT * MAX_CELLS_PER_BAR as usize);
    }
}
