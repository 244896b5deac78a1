use super::prompt::{
    build_synthesis_prompt, FINDING_DELIMITER, REPORT_TITLE, SYNTHESIS_SYSTEM_PROMPT,
};
use super::types::{AuditStage, Finding, PipelineState, StageContext, StateUpdate};
use super::AuditError;
use crate::models::StudyType;

pub const SYNTHESIS_STAGE: &str = "synthesis";

/// Consolidates every finding into the final report.
pub struct SynthesisStage;

impl SynthesisStage {
    fn synthesize(findings_block: &str, study_type: StudyType, ctx: &StageContext<'_>) -> Result<String, AuditError> {
        let llm = ctx.llm.ok_or_else(|| {
            AuditError::BackendUnavailable("no language model backend is initialised".into())
        })?;
        let text = llm.generate(
            SYNTHESIS_SYSTEM_PROMPT,
            &build_synthesis_prompt(findings_block, study_type),
        )?;
        let text = text.trim();
        if text.is_empty() {
            return Err(AuditError::BackendUnavailable("empty synthesis reply".into()));
        }
        Ok(text.to_string())
    }
}

impl AuditStage for SynthesisStage {
    fn name(&self) -> &str {
        SYNTHESIS_STAGE
    }

    fn run(&self, state: &PipelineState, ctx: &StageContext<'_>) -> StateUpdate {
        let study_type = state.study_type();
        let findings_block = join_findings(state.findings());

        let (finding, synthesis) = match Self::synthesize(&findings_block, study_type, ctx) {
            Ok(text) => (
                Finding::completed(SYNTHESIS_STAGE, "**Synthesis:** completed".into()),
                Some(text),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "Synthesis failed, rendering fallback report");
                (
                    Finding::degraded(
                        SYNTHESIS_STAGE,
                        format!("**Synthesis:** could not run ({e}); showing the raw findings instead"),
                    ),
                    None,
                )
            }
        };

        let mut all: Vec<Finding> = state.findings().to_vec();
        all.push(finding.clone());
        let report = match synthesis {
            Some(text) => render_report(study_type, &text, &all),
            None => render_fallback_report(study_type, &all),
        };

        StateUpdate::finding(finding).with_report(report)
    }
}

/// Findings text in append order, joined by the finding delimiter.
pub fn join_findings(findings: &[Finding]) -> String {
    findings
        .iter()
        .map(|f| f.text.as_str())
        .collect::<Vec<_>>()
        .join(FINDING_DELIMITER)
}

/// Report with a synthesis: summary first, detailed findings after.
pub fn render_report(study_type: StudyType, synthesis: &str, findings: &[Finding]) -> String {
    let details = stage_findings(findings);
    format!(
        "{}\n**Detected Type:** {study_type}\n\n---\n\n{synthesis}\n\n---\n\n## Detailed findings\n\n{}\n\n---\n\n{}",
        REPORT_TITLE,
        join_findings(&details),
        unavailable_checks_section(findings)
    )
}

/// Report without a synthesis: title, detected type and the verbatim findings.
pub fn render_fallback_report(study_type: StudyType, findings: &[Finding]) -> String {
    let details = stage_findings(findings);
    format!(
        "{}\n**Detected Type:** {study_type}\n\n---\n\n{}\n\n---\n\n{}",
        REPORT_TITLE,
        join_findings(&details),
        unavailable_checks_section(findings)
    )
}

fn stage_findings(findings: &[Finding]) -> Vec<Finding> {
    findings
        .iter()
        .filter(|f| f.stage != SYNTHESIS_STAGE)
        .cloned()
        .collect()
}

/// Closing section naming every degraded finding.
pub fn unavailable_checks_section(findings: &[Finding]) -> String {
    let mut section = String::from("## Checks that could not run\n");
    let degraded: Vec<&Finding> = findings.iter().filter(|f| f.is_degraded()).collect();
    if degraded.is_empty() {
        section.push_str("\nNone. Every check ran.\n");
        return section;
    }
    section.push('\n');
    for finding in degraded {
        let reason = finding
            .text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .last()
            .unwrap_or("");
        section.push_str(&format!("- **{}**: {reason}\n", finding.stage));
    }
    section
}
