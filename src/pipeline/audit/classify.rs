use super::excerpt::ExcerptPolicy;
use super::prompt::{build_classifier_prompt, CLASSIFIER_SYSTEM_PROMPT};
use super::types::{AuditStage, Finding, PipelineState, StageContext, StateUpdate};
use super::AuditError;
use crate::models::StudyType;

pub const CLASSIFIER_STAGE: &str = "classifier";

/// Assigns the manuscript one label from the closed study-type set.
pub struct ClassifierStage;

impl ClassifierStage {
    /// Classify the leading budget of `manuscript`.
    pub fn classify(manuscript: &str, ctx: &StageContext<'_>) -> Result<StudyType, AuditError> {
        let llm = ctx.llm.ok_or_else(|| {
            AuditError::BackendUnavailable("no language model backend is initialised".into())
        })?;
        let snippet = ExcerptPolicy::Leading(ctx.settings.classifier_budget).select(manuscript);
        let reply = llm.generate(CLASSIFIER_SYSTEM_PROMPT, &build_classifier_prompt(snippet))?;

        let study_type = parse_study_type(&reply);
        if study_type == StudyType::Other {
            tracing::debug!(reply = %reply.trim(), "Classifier reply outside the label set");
        }
        Ok(study_type)
    }
}

impl AuditStage for ClassifierStage {
    fn name(&self) -> &str {
        CLASSIFIER_STAGE
    }

    fn run(&self, state: &PipelineState, ctx: &StageContext<'_>) -> StateUpdate {
        match Self::classify(state.manuscript(), ctx) {
            Ok(study_type) => {
                tracing::info!(study_type = study_type.as_str(), "Manuscript classified");
                StateUpdate::finding(Finding::completed(
                    CLASSIFIER_STAGE,
                    format!("**Paper classified as:** {study_type}"),
                ))
                .with_study_type(study_type)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed");
                StateUpdate::finding(Finding::degraded(
                    CLASSIFIER_STAGE,
                    format!(
                        "**Paper classified as:** {}\n\nClassification could not run: {e}",
                        StudyType::Unknown
                    ),
                ))
                .with_study_type(StudyType::Unknown)
            }
        }
    }
}

/// Keywords searched in a reply that is not an exact label, in order;
/// first match wins. Same precedence as the compliance routing rules.
const LABEL_KEYWORDS: &[(&str, StudyType)] = &[
    ("systematic", StudyType::SystematicReview),
    ("meta analysis", StudyType::MetaAnalysis),
    ("observational", StudyType::Observational),
    ("randomi", StudyType::RandomizedTrial),
];

/// Map a free-text model reply onto the study-type set: exact label first,
/// then keyword containment; anything else becomes `Other`.
pub fn parse_study_type(reply: &str) -> StudyType {
    let key = normalize_label(reply);
    StudyType::CLASSIFIABLE
        .iter()
        .copied()
        .find(|t| normalize_label(t.as_str()) == key)
        .or_else(|| {
            LABEL_KEYWORDS
                .iter()
                .find(|(keyword, _)| key.contains(keyword))
                .map(|(_, study_type)| *study_type)
        })
        .unwrap_or(StudyType::Other)
}

/// Lowercase, hyphen/space-insensitive form with wrapping quotes, markdown
/// emphasis and trailing punctuation removed.
fn normalize_label(text: &str) -> String {
    let trimmed = text
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '_'))
        .trim_end_matches(|c: char| matches!(c, '.' | '!' | ':' | ';' | ','))
        .trim();
    trimmed
        .to_lowercase()
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
