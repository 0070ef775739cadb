//! Stage keys and status tracking for a pipeline run.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

/// Well-known pipeline phases reported on the progress channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    WebSearch,
    GenerationAcademic,
    GenerationCreative,
    GenerationTechnical,
    AcademicVerification,
    CreativeVerification,
    TechnicalVerification,
    FinalGeneration,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::WebSearch,
        Stage::GenerationAcademic,
        Stage::GenerationCreative,
        Stage::GenerationTechnical,
        Stage::AcademicVerification,
        Stage::CreativeVerification,
        Stage::TechnicalVerification,
        Stage::FinalGeneration,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Stage::WebSearch => "web-search",
            Stage::GenerationAcademic => "generation-academic",
            Stage::GenerationCreative => "generation-creative",
            Stage::GenerationTechnical => "generation-technical",
            Stage::AcademicVerification => "academic-verification",
            Stage::CreativeVerification => "creative-verification",
            Stage::TechnicalVerification => "technical-verification",
            Stage::FinalGeneration => "final-generation",
        }
    }

    /// Human readable label for progress displays.
    pub fn title(&self) -> &'static str {
        match self {
            Stage::WebSearch => "Web search",
            Stage::GenerationAcademic => "Academic draft",
            Stage::GenerationCreative => "Creative draft",
            Stage::GenerationTechnical => "Technical draft",
            Stage::AcademicVerification => "Academic critique",
            Stage::CreativeVerification => "Creative critique",
            Stage::TechnicalVerification => "Technical critique",
            Stage::FinalGeneration => "Final article",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProgressStatus {
    Pending,
    InProgress,
    Complete,
    Error,
}

impl ProgressStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressStatus::Complete | ProgressStatus::Error)
    }
}

impl fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProgressStatus::Pending => "pending",
            ProgressStatus::InProgress => "in-progress",
            ProgressStatus::Complete => "complete",
            ProgressStatus::Error => "error",
        })
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("illegal transition for {stage}: {from:?} -> {to}")]
pub struct TransitionError {
    pub stage: Stage,
    pub from: Option<ProgressStatus>,
    pub to: ProgressStatus,
}

/// Caller-side view of stage statuses.
///
/// Accepts `pending -> in-progress -> {complete | error}` per stage. A stage may
/// always be reset to `pending`, which starts a new run for that key.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    current: HashMap<Stage, ProgressStatus>,
    history: HashMap<Stage, Vec<ProgressStatus>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, stage: Stage, status: ProgressStatus) -> Result<(), TransitionError> {
        let from = self.current.get(&stage).copied();
        let legal = match (from, status) {
            (_, ProgressStatus::Pending) => true,
            (Some(ProgressStatus::Pending), ProgressStatus::InProgress) => true,
            (Some(ProgressStatus::InProgress), s) => s.is_terminal(),
            _ => false,
        };

        if !legal {
            return Err(TransitionError {
                stage,
                from,
                to: status,
            });
        }

        if status == ProgressStatus::Pending {
            self.history.insert(stage, Vec::new());
        }
        self.current.insert(stage, status);
        self.history.entry(stage).or_default().push(status);
        Ok(())
    }

    pub fn status(&self, stage: Stage) -> Option<ProgressStatus> {
        self.current.get(&stage).copied()
    }

    /// Statuses observed for `stage` since it was last reset to `pending`.
    pub fn history(&self, stage: Stage) -> &[ProgressStatus] {
        self.history.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn failed_stages(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| self.status(*s) == Some(ProgressStatus::Error))
            .collect()
    }
}
