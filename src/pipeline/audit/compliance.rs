use super::excerpt::ExcerptPolicy;
use super::prompt::{build_compliance_prompt, COMPLIANCE_SYSTEM_PROMPT};
use super::types::{AuditStage, Finding, PipelineState, StageContext, StateUpdate};
use super::AuditError;
use crate::config::PipelineSettings;
use crate::models::{GuidelineCategory, StudyType};

/// Study-type routing for the type-specific check. Case-insensitive
/// substring match on the study-type label; first match wins.
pub struct RoutingRule {
    pub keywords: &'static [&'static str],
    pub category: GuidelineCategory,
    pub query: &'static str,
}

pub const ROUTING_RULES: &[RoutingRule] = &[
    RoutingRule {
        keywords: &["systematic", "meta-analysis", "meta analysis"],
        category: GuidelineCategory::SystematicReview,
        query: "PRISMA guidelines, systematic review, meta-analysis checklist, heterogeneity",
    },
    RoutingRule {
        keywords: &["observational"],
        category: GuidelineCategory::Causality,
        query: "causality, causal language, confounding, observational study guidelines",
    },
];

/// The routing rule for a study-type label, if any applies.
pub fn route_study_type(label: &str) -> Option<&'static RoutingRule> {
    let lower = label.to_lowercase();
    ROUTING_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lower.contains(k)))
}

/// Where a check takes its guideline category and query from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckTarget {
    Fixed {
        category: GuidelineCategory,
        query: &'static str,
    },
    /// Chosen from the detected study type through `ROUTING_RULES`.
    Routed,
}

/// A category-scoped compliance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceCheck {
    pub stage: &'static str,
    pub title: &'static str,
    pub target: CheckTarget,
    pub excerpt: ExcerptPolicy,
    pub focus: &'static str,
    pub pass_phrase: &'static str,
}

pub struct ComplianceStage {
    check: ComplianceCheck,
}

impl ComplianceStage {
    pub fn new(check: ComplianceCheck) -> Self {
        Self { check }
    }

    pub fn statistics() -> Self {
        Self::new(ComplianceCheck {
            stage: "statistics",
            title: "Statistics Check",
            target: CheckTarget::Fixed {
                category: GuidelineCategory::Statistics,
                query: "p-values, confidence intervals, effect sizes, exact p-values, statistical reporting guidelines",
            },
            excerpt: ExcerptPolicy::FullText,
            focus: "Identify the 3-5 most critical statistical reporting errors.",
            pass_phrase: "Statistics Check: Pass",
        })
    }

    pub fn figures_tables(half_width: usize) -> Self {
        Self::new(ComplianceCheck {
            stage: "figures-tables",
            title: "Figures & Tables Check",
            target: CheckTarget::Fixed {
                category: GuidelineCategory::FiguresTables,
                query: "figures, tables, data presentation, axis labels, precision of reported numbers",
            },
            excerpt: ExcerptPolicy::Centered(half_width),
            focus: "Identify problems in how figures, tables and reported numbers are presented.",
            pass_phrase: "Figures & Tables Check: Pass",
        })
    }

    pub fn type_specific(terminal_budget: usize) -> Self {
        Self::new(ComplianceCheck {
            stage: "type-specific",
            title: "Type-specific Check",
            target: CheckTarget::Routed,
            excerpt: ExcerptPolicy::Terminal(terminal_budget),
            focus: "Focus on the Discussion and Conclusion and identify any violations.",
            pass_phrase: "Type-specific Check: Pass",
        })
    }

    /// The standard checks, in run order.
    pub fn standard(settings: &PipelineSettings) -> Vec<Self> {
        vec![
            Self::statistics(),
            Self::figures_tables(settings.centered_half_width),
            Self::type_specific(settings.terminal_budget),
        ]
    }

    pub fn check(&self) -> &ComplianceCheck {
        &self.check
    }

    fn heading(&self, study_type: StudyType) -> String {
        match self.check.target {
            CheckTarget::Fixed { .. } => format!("### {}", self.check.title),
            CheckTarget::Routed => format!("### {} ({study_type})", self.check.title),
        }
    }

    fn evaluate(
        &self,
        category: GuidelineCategory,
        query: &str,
        state: &PipelineState,
        ctx: &StageContext<'_>,
    ) -> Result<String, AuditError> {
        let llm = ctx.llm.ok_or_else(|| {
            AuditError::BackendUnavailable("no language model backend is initialised".into())
        })?;
        let chunks = ctx
            .retriever
            .retrieve(query, ctx.settings.top_k, Some(category))?;
        if chunks.is_empty() {
            return Err(AuditError::EmptyCorpus(category.to_string()));
        }
        tracing::debug!(
            stage = self.check.stage,
            category = category.as_str(),
            chunks = chunks.len(),
            "Guidelines retrieved"
        );

        let rules = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        let excerpt = self.check.excerpt.select(state.manuscript());

        let prompt = build_compliance_prompt(
            self.check.focus,
            self.check.pass_phrase,
            &rules,
            excerpt,
            state.study_type(),
        );
        Ok(llm.generate(COMPLIANCE_SYSTEM_PROMPT, &prompt)?)
    }
}

impl AuditStage for ComplianceStage {
    fn name(&self) -> &str {
        self.check.stage
    }

    fn run(&self, state: &PipelineState, ctx: &StageContext<'_>) -> StateUpdate {
        let study_type = state.study_type();
        let heading = self.heading(study_type);

        let (category, query) = match self.check.target {
            CheckTarget::Fixed { category, query } => (category, query),
            CheckTarget::Routed => match route_study_type(study_type.as_str()) {
                Some(rule) => (rule.category, rule.query),
                None => {
                    tracing::info!(
                        stage = self.check.stage,
                        study_type = study_type.as_str(),
                        "No type-specific check applies"
                    );
                    return StateUpdate::finding(Finding::not_applicable(
                        self.check.stage,
                        format!("{heading}\nNo additional type-specific check applies to this study type."),
                    ));
                }
            },
        };

        match self.evaluate(category, query, state, ctx) {
            Ok(response) => StateUpdate::finding(Finding::completed(
                self.check.stage,
                format!("{heading}\n{}", response.trim()),
            )),
            Err(e) => {
                tracing::warn!(
                    stage = self.check.stage,
                    category = category.as_str(),
                    error = %e,
                    "Compliance check degraded"
                );
                let reason = match &e {
                    AuditError::EmptyCorpus(_) | AuditError::Configuration(_) => {
                        format!("Guideline retrieval for {category} failed: {e}")
                    }
                    AuditError::BackendUnavailable(_) => format!("Check could not run: {e}"),
                };
                StateUpdate::finding(Finding::degraded(
                    self.check.stage,
                    format!("{heading}\n{reason}"),
                ))
            }
        }
    }
}
