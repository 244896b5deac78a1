use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::PipelineSettings;
use crate::models::{FindingStatus, StudyType};
use crate::pipeline::llm::LlmGenerate;
use crate::pipeline::storage::GuidelineRetriever;

/// One stage's Markdown output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub stage: String,
    pub status: FindingStatus,
    pub text: String,
}

impl Finding {
    pub fn completed(stage: &str, text: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: FindingStatus::Completed,
            text,
        }
    }

    pub fn degraded(stage: &str, text: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: FindingStatus::Degraded,
            text,
        }
    }

    pub fn not_applicable(stage: &str, text: String) -> Self {
        Self {
            stage: stage.to_string(),
            status: FindingStatus::NotApplicable,
            text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.status == FindingStatus::Degraded
    }
}

/// Position of a run in `Start → Classified → Audited(n) → Reported → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "checks", rename_all = "snake_case")]
pub enum PipelinePhase {
    Start,
    Classified,
    Audited(usize),
    Reported,
    Done,
}

impl PipelinePhase {
    /// The only phase allowed to follow `self`.
    pub fn next(self, compliance_checks: usize) -> Option<PipelinePhase> {
        match self {
            PipelinePhase::Start => Some(PipelinePhase::Classified),
            PipelinePhase::Classified if compliance_checks == 0 => Some(PipelinePhase::Reported),
            PipelinePhase::Classified => Some(PipelinePhase::Audited(1)),
            PipelinePhase::Audited(n) if n < compliance_checks => Some(PipelinePhase::Audited(n + 1)),
            PipelinePhase::Audited(_) => Some(PipelinePhase::Reported),
            PipelinePhase::Reported => Some(PipelinePhase::Done),
            PipelinePhase::Done => None,
        }
    }
}

/// Partial state produced by one stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub study_type: Option<StudyType>,
    pub findings: Vec<Finding>,
    pub report: Option<String>,
}

impl StateUpdate {
    pub fn finding(finding: Finding) -> Self {
        Self {
            findings: vec![finding],
            ..Self::default()
        }
    }

    pub fn with_study_type(mut self, study_type: StudyType) -> Self {
        self.study_type = Some(study_type);
        self
    }

    pub fn with_report(mut self, report: String) -> Self {
        self.report = Some(report);
        self
    }
}

/// Accumulating state of one run.
#[derive(Debug, Clone)]
pub struct PipelineState {
    manuscript: String,
    study_type: Option<StudyType>,
    findings: Vec<Finding>,
    report: Option<String>,
    phase: PipelinePhase,
}

impl PipelineState {
    pub fn new(manuscript: &str) -> Self {
        Self {
            manuscript: manuscript.to_string(),
            study_type: None,
            findings: Vec::new(),
            report: None,
            phase: PipelinePhase::Start,
        }
    }

    pub fn manuscript(&self) -> &str {
        &self.manuscript
    }

    /// Detected study type; `Unknown` until the classifier has run.
    pub fn study_type(&self) -> StudyType {
        self.study_type.unwrap_or(StudyType::Unknown)
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn report(&self) -> Option<&str> {
        self.report.as_deref()
    }

    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Merge a stage's update: findings append, study type and report overwrite.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(study_type) = update.study_type {
            self.study_type = Some(study_type);
        }
        self.findings.extend(update.findings);
        if let Some(report) = update.report {
            self.report = Some(report);
        }
    }

    pub(crate) fn advance(&mut self, phase: PipelinePhase) {
        self.phase = phase;
    }

    pub(crate) fn into_parts(self) -> (StudyType, Vec<Finding>, Option<String>) {
        let study_type = self.study_type();
        (study_type, self.findings, self.report)
    }
}

/// Collaborators shared by every stage of a run.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    /// `None` when no generation backend could be initialised.
    pub llm: Option<&'a dyn LlmGenerate>,
    pub retriever: &'a dyn GuidelineRetriever,
    pub settings: &'a PipelineSettings,
}

/// One step of the audit: reads the state, returns a partial update.
/// Stages never fail; problems become degraded findings.
pub trait AuditStage {
    fn name(&self) -> &str;
    fn run(&self, state: &PipelineState, ctx: &StageContext<'_>) -> StateUpdate;
}

/// Terminal value of a run.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub run_id: Uuid,
    pub study_type: StudyType,
    pub findings: Vec<Finding>,
    pub report: String,
    pub completed_at: DateTime<Utc>,
}

impl AuditReport {
    pub fn degraded_findings(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.is_degraded())
    }
}
