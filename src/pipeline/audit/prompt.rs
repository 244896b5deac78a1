use crate::models::StudyType;

/// Separator between findings wherever they are concatenated.
pub const FINDING_DELIMITER: &str = "\n\n---\n\n";

pub const REPORT_TITLE: &str = "# Manuscript Guideline Audit Report";

pub const CLASSIFIER_SYSTEM_PROMPT: &str = "You classify biomedical research manuscripts by study design. \
Reply with the category name only, without explanation or punctuation.";

pub const COMPLIANCE_SYSTEM_PROMPT: &str = "You are a statistical editor for a medical journal. \
Check the manuscript text strictly against the guidelines you are given. \
Be specific and brief; quote the manuscript where it helps.";

pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You are the senior statistical editor for a medical journal. \
You consolidate audit findings into a decision-ready report. \
Use only the information in the findings you are given; never add new issues.";

/// Prompt asking for one label from the classifiable set.
pub fn build_classifier_prompt(snippet: &str) -> String {
    let labels: Vec<String> = StudyType::CLASSIFIABLE
        .iter()
        .map(|t| format!("'{}'", t.as_str()))
        .collect();
    format!(
        "Analyze the following introduction/abstract. Classify strictly as one of: {}. \
         Return ONLY the category name.\n\nText: {snippet}",
        labels.join(", ")
    )
}

/// Prompt for one compliance check.
pub fn build_compliance_prompt(
    focus: &str,
    pass_phrase: &str,
    rules: &str,
    excerpt: &str,
    study_type: StudyType,
) -> String {
    format!(
        "Study type: {study_type}\n\n\
         GUIDELINES:\n{rules}\n\n\
         PAPER TEXT:\n{excerpt}\n\n\
         {focus} Report each violation briefly. If the text is compliant, say '{pass_phrase}'."
    )
}

/// Prompt for the final consolidation over all findings.
pub fn build_synthesis_prompt(findings_block: &str, study_type: StudyType) -> String {
    format!(
        "Detected study type: {study_type}\n\n\
         AUDIT FINDINGS:\n{findings_block}\n\n\
         Using only the findings above, write a Markdown report with these sections:\n\
         ## Overall summary\n\
         ## Blocking issues\n\
         ## Important but fixable issues\n\
         ## Minor issues\n\
         ## Provisional recommendation\n\
         The recommendation is a single line. Write 'None' under any empty section."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifier_prompt_lists_every_label() {
        let prompt = build_classifier_prompt("Abstract text");
        for label in StudyType::CLASSIFIABLE {
            assert!(prompt.contains(label.as_str()));
        }
        assert!(prompt.ends_with("Text: Abstract text"));
        assert!(!prompt.contains("Unknown"));
    }

    #[test]
    fn compliance_prompt_carries_all_inputs() {
        let prompt = build_compliance_prompt(
            "Identify statistical reporting errors.",
            "Statistics Check: Pass",
            "Report exact p-values.",
            "p < 0.05",
            StudyType::Observational,
        );
        assert!(prompt.contains("Observational Study"));
        assert!(prompt.contains("Report exact p-values."));
        assert!(prompt.contains("p < 0.05"));
        assert!(prompt.contains("'Statistics Check: Pass'"));
    }

    #[test]
    fn synthesis_prompt_names_every_section() {
        let prompt = build_synthesis_prompt("finding", StudyType::MetaAnalysis);
        for section in [
            "Overall summary",
            "Blocking issues",
            "Important but fixable issues",
            "Minor issues",
            "Provisional recommendation",
        ] {
            assert!(prompt.contains(section));
        }
    }
}
