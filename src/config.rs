use conv_engine::{ArchPreset, HyperparameterSet, KernelPreset};
use serde_json::Value;

const DEFAULT_INTERVAL_MS: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

/// How long to run the scan for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanDraft {
    pub interval_ms: u64,
    pub ticks: usize,
}

/// A snapshot replacing the current hyperparameters once `after` ticks have elapsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweepStep {
    pub after: usize,
    pub params: HyperparameterSet,
}

/// Explorer setup parsed from a JSON config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplorerDraft {
    pub params: HyperparameterSet,
    pub kernel: KernelPreset,
    pub show_values: bool,
    pub scan: ScanDraft,
    pub sweep: Vec<SweepStep>,
    pub report: ReportFormat,
}

impl Default for ExplorerDraft {
    fn default() -> Self {
        Self {
            params: HyperparameterSet::default(),
            kernel: KernelPreset::default(),
            show_values: true,
            scan: ScanDraft {
                interval_ms: DEFAULT_INTERVAL_MS,
                ticks: 0,
            },
            sweep: Vec::new(),
            report: ReportFormat::Text,
        }
    }
}

/// Loads an [`ExplorerDraft`] from a JSON file.
///
/// # Errors
/// Returns a human-readable string if the file cannot be read or parsed.
pub fn load(path: &str) -> Result<ExplorerDraft, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read '{path}': {e}"))?;

    parse(&content)
}

/// Parses an [`ExplorerDraft`], every missing field takes its default.
///
/// # Errors
/// Returns a human-readable string if the JSON is malformed or a field is out of range.
pub fn parse(content: &str) -> Result<ExplorerDraft, String> {
    let val: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;
    let defaults = ExplorerDraft::default();

    let params = parse_params(&val, &defaults.params).map_err(|e| format!("params: {e}"))?;

    let kernel = match val["kernel"].as_str() {
        Some(name) => name.parse::<KernelPreset>().map_err(|e| e.to_string())?,
        None => defaults.kernel,
    };

    let show_values = match &val["show_values"] {
        Value::Null => defaults.show_values,
        v => v.as_bool().ok_or("show_values must be a boolean")?,
    };

    let scan = &val["scan"];
    let scan = ScanDraft {
        interval_ms: uint(scan, "interval_ms", defaults.scan.interval_ms as usize)? as u64,
        ticks: uint(scan, "ticks", defaults.scan.ticks)?,
    };

    let report = match val["report"].as_str().unwrap_or("text") {
        "text" => ReportFormat::Text,
        "json" => ReportFormat::Json,
        other => return Err(format!("unknown report format: {other}")),
    };

    let mut sweep = Vec::new();
    if let Some(steps) = val["sweep"].as_array() {
        let mut prev = params;
        for (i, step) in steps.iter().enumerate() {
            let after = uint(step, "after", sweep.last().map_or(1, |s: &SweepStep| s.after + 1))
                .map_err(|e| format!("sweep {i}: {e}"))?;
            let params = parse_params(step, &prev).map_err(|e| format!("sweep {i}: {e}"))?;

            sweep.push(SweepStep { after, params });
            prev = params;
        }
    }

    if sweep.windows(2).any(|w| w[1].after < w[0].after) {
        return Err("sweep steps must be sorted by 'after'".into());
    }

    Ok(ExplorerDraft {
        params,
        kernel,
        show_values,
        scan,
        sweep,
        report,
    })
}

/// Builds a set from `base`, an optional `preset` and the explicit fields of `val`, in that order.
fn parse_params(val: &Value, base: &HyperparameterSet) -> Result<HyperparameterSet, String> {
    let base = match val["preset"].as_str() {
        Some(name) => name
            .parse::<ArchPreset>()
            .map_err(|e| e.to_string())?
            .apply(base),
        None => *base,
    };

    let fields = if val["params"].is_object() {
        &val["params"]
    } else {
        val
    };

    HyperparameterSet::new(
        uint(fields, "input_width", base.input_width())?,
        uint(fields, "input_height", base.input_height())?,
        uint(fields, "kernel_size", base.kernel_size())?,
        uint(fields, "stride", base.stride())?,
        uint(fields, "padding", base.padding())?,
        uint(fields, "dilation", base.dilation())?,
    )
    .map_err(|e| e.to_string())
}

fn uint(val: &Value, key: &str, default: usize) -> Result<usize, String> {
    match &val[key] {
        Value::Null => Ok(default),
        v => v
            .as_u64()
            .map(|n| n as usize)
            .ok_or_else(|| format!("{key} must be a non-negative integer")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_default() {
        assert_eq!(parse("{}").unwrap(), ExplorerDraft::default());
    }

    #[test]
    fn preset_then_explicit_fields() {
        let draft = parse(
            r#"{
                "preset": "strided",
                "params": { "input_width": 9, "padding": 0 },
                "kernel": "blur",
                "scan": { "interval_ms": 80, "ticks": 12 },
                "report": "json"
            }"#,
        )
        .unwrap();

        let p = draft.params;
        assert_eq!(
            (p.input_width(), p.input_height(), p.kernel_size(), p.stride(), p.padding()),
            (9, 12, 3, 2, 0)
        );
        assert_eq!(draft.kernel, KernelPreset::Blur);
        assert_eq!(draft.scan, ScanDraft { interval_ms: 80, ticks: 12 });
        assert_eq!(draft.report, ReportFormat::Json);
    }

    #[test]
    fn sweep_builds_on_the_previous_step() {
        let draft = parse(
            r#"{
                "sweep": [
                    { "after": 3, "stride": 2 },
                    { "dilation": 2 }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(draft.sweep.len(), 2);
        assert_eq!(draft.sweep[0].after, 3);
        assert_eq!(draft.sweep[1].after, 4);
        assert_eq!(draft.sweep[1].params.stride(), 2);
        assert_eq!(draft.sweep[1].params.dilation(), 2);
    }

    #[test]
    fn sweep_can_lose_and_regain_the_output() {
        let draft = parse(
            r#"{
                "scan": { "ticks": 6 },
                "sweep": [
                    { "after": 2, "dilation": 20 },
                    { "after": 4, "dilation": 1 }
                ]
            }"#,
        )
        .unwrap();

        let dims = |params: &HyperparameterSet| conv_engine::geometry::output_dimensions(params);
        assert!(dims(&draft.params).is_positive());
        assert!(!dims(&draft.sweep[0].params).is_positive());
        assert!(dims(&draft.sweep[1].params).is_positive());
        assert_eq!(draft.sweep[1].params, draft.params);
    }

    #[test]
    fn demo_config() {
        let draft = parse(include_str!("../demos/scan.json")).unwrap();

        assert_eq!(draft.params.stride(), 2);
        assert_eq!(draft.sweep.len(), 3);
        assert_eq!(draft.sweep[1].params.dilation(), 3);
        assert_eq!(draft.sweep[2].params.dilation(), 1);
        assert_eq!(draft.sweep[2].params.input_width(), 9);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(r#"{ "params": { "stride": 0 } }"#).is_err());
        assert!(parse(r#"{ "params": { "padding": -1 } }"#).is_err());
        assert!(parse(r#"{ "kernel": "gaussian" }"#).is_err());
        assert!(parse(r#"{ "show_values": "yes" }"#).is_err());
        assert!(parse(r#"{ "sweep": [{ "after": 5 }, { "after": 2 }] }"#).is_err());
    }
}
