use std::fmt;

use conv_engine::{
    CellTrace, Coord, Explorer, HyperparameterSet, KernelPreset, OutputDimensions, ReceptiveField,
    geometry::padded_dimensions,
};
use scanner::ScanState;
use serde::Serialize;

/// Everything the explorer knows about the current snapshot and selection.
#[derive(Debug, Serialize)]
pub struct Report {
    pub params: HyperparameterSet,
    pub kernel: KernelPreset,
    pub effective_kernel_size: usize,
    pub padded_size: (usize, usize),
    pub output_dims: OutputDimensions,
    pub diagnostics: Vec<String>,
    pub scan: ScanState,
    pub receptive_field: Option<ReceptiveField>,
    pub kernel_center: Option<Coord>,
    pub kernel_taps: Vec<Coord>,
    pub trace: Option<CellTrace>,
    pub output: Option<Vec<Vec<i64>>>,
}

impl Report {
    pub fn new(explorer: &Explorer, scan: ScanState) -> Self {
        let selected = scan.selected;

        Self {
            params: *explorer.params(),
            kernel: explorer.kernel(),
            effective_kernel_size: explorer.effective_kernel_size(),
            padded_size: padded_dimensions(explorer.params()),
            output_dims: explorer.output_dims(),
            diagnostics: explorer.diagnostics().iter().map(|d| d.to_string()).collect(),
            scan,
            receptive_field: selected.map(|c| explorer.receptive_field(c.x, c.y)),
            kernel_center: selected.map(|c| explorer.kernel_center(c.x, c.y)),
            kernel_taps: selected
                .map(|c| explorer.kernel_taps(c.x, c.y))
                .unwrap_or_default(),
            trace: selected
                .filter(|_| explorer.show_values())
                .and_then(|c| explorer.trace(c.x, c.y)),
            output: explorer
                .output()
                .map(|grid| grid.rows().into_iter().map(|row| row.to_vec()).collect()),
        }
    }

    /// One line describing the selected cell, `None` without a selection.
    pub fn selection_line(&self) -> Option<String> {
        let Coord { x, y } = self.scan.selected?;
        let mut parts = vec![format!("selected ({x}, {y})")];

        if let Some(rf) = &self.receptive_field {
            parts.push(format!(
                "reads [{}..={}, {}..={}]",
                rf.start_x, rf.end_x, rf.start_y, rf.end_y
            ));
        }
        if let Some(c) = &self.kernel_center {
            parts.push(format!("centered at ({}, {})", c.x, c.y));
        }
        parts.push(format!("with {} taps", self.kernel_taps.len()));
        if let Some(trace) = &self.trace {
            parts.push(format!("= {} ({:.2})", trace.value, trace.raw));
        }

        Some(parts.join(" "))
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.params;
        let (pw, ph) = self.padded_size;

        writeln!(
            f,
            "input {}x{} (padded {pw}x{ph}), kernel {} stride {} padding {} dilation {}",
            p.input_width(),
            p.input_height(),
            p.kernel_size(),
            p.stride(),
            p.padding(),
            p.dilation(),
        )?;
        writeln!(
            f,
            "effective kernel {}, output {}x{}",
            self.effective_kernel_size, self.output_dims.width, self.output_dims.height
        )?;

        for d in &self.diagnostics {
            writeln!(f, "warning: {d}")?;
        }

        if let Some(line) = self.selection_line() {
            writeln!(f, "{line}")?;
        }

        if let Some(rows) = &self.output {
            let width = rows
                .iter()
                .flatten()
                .map(|v| v.to_string().len())
                .max()
                .unwrap_or(1);

            writeln!(f, "output ({}):", self.kernel)?;
            for row in rows {
                let cells: Vec<String> = row.iter().map(|v| format!("{v:>width$}")).collect();
                writeln!(f, "  {}", cells.join(" "))?;
            }
        }

        Ok(())
    }
}
