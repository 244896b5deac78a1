use chrono::Utc;
use uuid::Uuid;

use super::classify::ClassifierStage;
use super::compliance::ComplianceStage;
use super::synthesis::{render_fallback_report, SynthesisStage};
use super::types::{AuditReport, AuditStage, PipelinePhase, PipelineState, StageContext};
use crate::config::PipelineSettings;
use crate::pipeline::llm::LlmGenerate;
use crate::pipeline::storage::GuidelineRetriever;

/// Runs one manuscript through classifier → compliance checks → synthesis.
///
/// Stages run strictly in sequence on one thread. Each run owns its state,
/// so one pipeline can serve concurrent runs.
pub struct AuditPipeline<'a> {
    llm: Option<&'a dyn LlmGenerate>,
    retriever: &'a dyn GuidelineRetriever,
    settings: PipelineSettings,
    compliance: Vec<ComplianceStage>,
}

impl<'a> AuditPipeline<'a> {
    /// Pipeline with the standard compliance checks. `llm` is `None` when no
    /// generation backend is available; the run then degrades but still
    /// produces a report.
    pub fn new(
        llm: Option<&'a dyn LlmGenerate>,
        retriever: &'a dyn GuidelineRetriever,
        settings: PipelineSettings,
    ) -> Self {
        let compliance = ComplianceStage::standard(&settings);
        Self {
            llm,
            retriever,
            settings,
            compliance,
        }
    }

    /// Replace the compliance checks (run in the given order).
    pub fn with_checks(mut self, checks: Vec<ComplianceStage>) -> Self {
        self.compliance = checks;
        self
    }

    pub fn compliance_checks(&self) -> &[ComplianceStage] {
        &self.compliance
    }

    /// Audit one manuscript. Never fails: every problem is recorded as a
    /// degraded finding and the report is always rendered.
    pub fn run(&self, manuscript: &str) -> AuditReport {
        let run_id = Uuid::new_v4();
        let _span = tracing::info_span!("audit_run", run_id = %run_id).entered();
        tracing::info!(
            chars = manuscript.chars().count(),
            checks = self.compliance.len(),
            backend = self.llm.is_some(),
            "Audit started"
        );

        let ctx = StageContext {
            llm: self.llm,
            retriever: self.retriever,
            settings: &self.settings,
        };
        let mut state = PipelineState::new(manuscript);

        self.step(&ClassifierStage, &mut state, &ctx);
        for stage in &self.compliance {
            self.step(stage, &mut state, &ctx);
        }
        self.step(&SynthesisStage, &mut state, &ctx);
        self.advance(&mut state);
        debug_assert_eq!(state.phase(), PipelinePhase::Done);

        let (study_type, findings, report) = state.into_parts();
        let report = match report {
            Some(report) if !report.trim().is_empty() => report,
            _ => render_fallback_report(study_type, &findings),
        };

        let degraded = findings.iter().filter(|f| f.is_degraded()).count();
        tracing::info!(
            study_type = study_type.as_str(),
            findings = findings.len(),
            degraded,
            "Audit complete"
        );

        AuditReport {
            run_id,
            study_type,
            findings,
            report,
            completed_at: Utc::now(),
        }
    }

    fn step(&self, stage: &dyn AuditStage, state: &mut PipelineState, ctx: &StageContext<'_>) {
        let update = stage.run(state, ctx);
        state.apply(update);
        self.advance(state);
        tracing::debug!(stage = stage.name(), phase = ?state.phase(), "Stage complete");
    }

    fn advance(&self, state: &mut PipelineState) {
        if let Some(next) = state.phase().next(self.compliance.len()) {
            state.advance(next);
        }
    }
}
