use std::{collections::HashMap, time::Duration};

use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use yt2blog_core::{EventReceiver, PipelineEvent, ProgressStatus, ProgressTracker, Stage, UsageLedger};

pub fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// What the renderer saw by the time the event stream closed.
pub struct RunReport {
    pub tracker: ProgressTracker,
    pub usage: UsageLedger,
}

/// Draw one spinner per running stage until every bus handle is dropped.
pub async fn render_events(mut rx: EventReceiver) -> RunReport {
    let multi = MultiProgress::new();
    let mut spinners: HashMap<Stage, ProgressBar> = HashMap::new();
    let mut tracker = ProgressTracker::new();
    let mut usage = UsageLedger::new();

    while let Some(enriched) = rx.recv().await {
        match enriched.event {
            PipelineEvent::Progress { stage, status } => {
                if let Err(e) = tracker.apply(stage, status) {
                    tracing::warn!(error = %e, "ignoring out-of-order progress event");
                    continue;
                }
                match status {
                    ProgressStatus::Pending => {}
                    ProgressStatus::InProgress => {
                        let pb = multi.add(create_spinner(&format!("{}...", stage.title())));
                        spinners.insert(stage, pb);
                    }
                    ProgressStatus::Complete => {
                        if let Some(pb) = spinners.remove(&stage) {
                            pb.finish_with_message(format!(
                                "{} {}",
                                style("✓").green().bold(),
                                stage.title()
                            ));
                        }
                    }
                    ProgressStatus::Error => {
                        if let Some(pb) = spinners.remove(&stage) {
                            pb.finish_with_message(format!(
                                "{} {} {}",
                                style("✗").red().bold(),
                                stage.title(),
                                style("(failed)").dim()
                            ));
                        }
                    }
                }
            }
            PipelineEvent::TokenUsage(cost) => usage.record(cost),
        }
    }

    // Stages still spinning were cancelled by a sibling failure.
    for (stage, pb) in spinners {
        pb.finish_with_message(format!(
            "{} {} {}",
            style("-").dim(),
            stage.title(),
            style("(cancelled)").dim()
        ));
    }

    RunReport { tracker, usage }
}
