mod config;
mod report;
mod session;

use std::env;

use anyhow::Result;
use conv_engine::Explorer;
use log::{info, warn};
use scanner::{ScanState, ticker};
use tokio::sync::mpsc;

use crate::{
    config::{ExplorerDraft, ReportFormat},
    report::Report,
    session::Session,
};

const TICK_BUFFER: usize = 8;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::init();

    let draft = match env::args().nth(1) {
        Some(path) => config::load(&path).map_err(anyhow::Error::msg)?,
        None => ExplorerDraft::default(),
    };

    let mut session = Session::new(&draft);
    print_report(session.explorer(), session.state(), draft.report)?;

    if draft.scan.ticks > 0 {
        run_scan(&mut session, draft.report).await?;
    }

    Ok(())
}

/// Drives the scan until the requested amount of ticks, applying the sweep along the way.
///
/// A step that leaves no output stops the scan, it's restarted once a later step brings the
/// output back.
async fn run_scan(session: &mut Session, format: ReportFormat) -> Result<()> {
    let Some(mut task) = session.start() else {
        warn!("the current hyperparameters produce no output, nothing to scan");
        return Ok(());
    };

    loop {
        let (tx, mut rx) = mpsc::channel(TICK_BUFFER);
        let handle = ticker::spawn(task, tx);

        while session.is_running() && !session.is_done() {
            let Some(tick) = rx.recv().await else {
                break;
            };

            if !session.tick(tick) {
                continue;
            }

            while session.apply_next_due() {
                print_report(session.explorer(), session.state(), format)?;
            }

            print_selection(session.explorer(), session.state(), format, session.ticks())?;
        }

        let forced = !session.is_running();
        session.stop();
        drop(rx);
        handle.await?;

        if session.is_done() {
            break;
        }
        if !forced {
            info!(ticks = session.ticks(); "scan ended early");
            break;
        }

        match session.resume() {
            Some(next) => {
                print_report(session.explorer(), session.state(), format)?;
                task = next;
            }
            None => {
                warn!(pending = session.pending_steps(), ticks = session.ticks(); "scan left idle");
                break;
            }
        }
    }

    Ok(())
}

fn print_report(explorer: &Explorer, scan: ScanState, format: ReportFormat) -> Result<()> {
    let report = Report::new(explorer, scan);

    match format {
        ReportFormat::Text => print!("{report}"),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }

    Ok(())
}

fn print_selection(
    explorer: &Explorer,
    scan: ScanState,
    format: ReportFormat,
    tick: usize,
) -> Result<()> {
    match format {
        ReportFormat::Text => {
            if let Some(line) = Report::new(explorer, scan).selection_line() {
                println!("tick {tick}: {line}");
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string(&scan)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use conv_engine::Coord;
    use tokio::time::{self, Instant};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn scan_resumes_after_the_output_comes_back() {
        let draft = config::parse(
            r#"{
                "scan": { "interval_ms": 100, "ticks": 6 },
                "sweep": [
                    { "after": 2, "dilation": 20 },
                    { "after": 4, "dilation": 1 }
                ]
            }"#,
        )
        .unwrap();
        let mut session = Session::new(&draft);

        let begin = Instant::now();
        time::timeout(Duration::from_secs(5), run_scan(&mut session, ReportFormat::Json))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.ticks(), 6);
        assert_eq!(session.pending_steps(), 0);
        assert!(!session.is_running());
        assert_eq!(session.state().selected, Some(Coord::new(4, 0)));
        assert_eq!(begin.elapsed(), Duration::from_millis(600));
    }

    #[tokio::test(start_paused = true)]
    async fn scan_stays_idle_when_the_sweep_never_recovers() {
        let draft = config::parse(
            r#"{
                "scan": { "interval_ms": 60, "ticks": 10 },
                "sweep": [{ "after": 3, "kernel_size": 30 }]
            }"#,
        )
        .unwrap();
        let mut session = Session::new(&draft);

        time::timeout(Duration::from_secs(5), run_scan(&mut session, ReportFormat::Json))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(session.ticks(), 3);
        assert_eq!(session.state().selected, None);
    }
}
