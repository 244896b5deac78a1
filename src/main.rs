use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use manuscript_auditor::config::{self, AuditConfig};
use manuscript_auditor::pipeline::audit::AuditPipeline;
use manuscript_auditor::pipeline::extraction::{DocumentExtractor, TextExtractor};
use manuscript_auditor::pipeline::llm::backends_from_config;
use manuscript_auditor::pipeline::storage::{build_knowledge_base, BuildStrictness, BuildSummary};

#[derive(Parser, Debug)]
#[command(name = "manuscript-auditor", version, about = "Audit research manuscripts against reporting guidelines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load, embed and smoke-test the guideline corpus.
    BuildKb {
        /// Guidelines folder (overrides AUDIT_GUIDELINES_DIR).
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Fail if any audited category has no guideline material.
        #[arg(long)]
        strict: bool,
    },
    /// Audit one manuscript and print the report.
    Audit {
        /// Manuscript file (.txt, .md, or .pdf with the `pdfium` feature).
        file: PathBuf,
        /// Guidelines folder (overrides AUDIT_GUIDELINES_DIR).
        #[arg(long)]
        dir: Option<PathBuf>,
        /// Print the full audit result as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    manuscript_auditor::init_tracing();
    tracing::info!("{} v{}", config::APP_NAME, config::APP_VERSION);

    let mut config = AuditConfig::from_env().context("Invalid configuration")?;

    match cli.command {
        Commands::BuildKb { dir, strict } => {
            if let Some(dir) = dir {
                config.guidelines_dir = dir;
            }
            let strictness = strictness(strict || config.strict_build);
            let backends = backends_from_config(&config).context("Failed to initialise backends")?;
            let extractor = Arc::new(DocumentExtractor::with_defaults());

            let (_, summary) = build_knowledge_base(&config, extractor, backends.embedder, strictness)
                .with_context(|| {
                    format!("Knowledge base build failed for {}", config.guidelines_dir.display())
                })?;
            print_summary(&config, &summary);
        }
        Commands::Audit { file, dir, json } => {
            if let Some(dir) = dir {
                config.guidelines_dir = dir;
            }
            let extractor = Arc::new(DocumentExtractor::with_defaults());
            let manuscript = extractor
                .extract(&file)
                .with_context(|| format!("Failed to read manuscript {}", file.display()))?;

            let backends = backends_from_config(&config).context("Failed to initialise backends")?;
            let (kb, summary) = build_knowledge_base(
                &config,
                extractor,
                Arc::clone(&backends.embedder),
                strictness(config.strict_build),
            )
            .with_context(|| {
                format!("Knowledge base build failed for {}", config.guidelines_dir.display())
            })?;
            if summary.skipped {
                tracing::warn!(
                    reason = summary.skip_reason.as_deref().unwrap_or("unknown"),
                    "No guidelines loaded; every compliance check will be reported as not run"
                );
            }

            let pipeline = AuditPipeline::new(
                Some(backends.generator.as_ref()),
                &kb,
                config.settings.clone(),
            );
            let result = pipeline.run(&manuscript);

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", result.report);
            }
        }
    }

    Ok(())
}

fn strictness(strict: bool) -> BuildStrictness {
    if strict {
        BuildStrictness::Strict
    } else {
        BuildStrictness::Lenient
    }
}

fn print_summary(config: &AuditConfig, summary: &BuildSummary) {
    if summary.skipped {
        println!(
            "Knowledge base not built from {}: {}",
            config.guidelines_dir.display(),
            summary.skip_reason.as_deref().unwrap_or("no guideline material")
        );
        return;
    }
    println!(
        "Knowledge base built: {} documents, {} chunks from {}",
        summary.documents,
        summary.chunks,
        config.guidelines_dir.display()
    );
    for (category, chunks) in &summary.category_chunks {
        println!("  {:<18} {chunks}", category.as_str());
    }
    if !summary.missing_categories.is_empty() {
        let missing: Vec<&str> = summary.missing_categories.iter().map(|c| c.as_str()).collect();
        println!("Missing guideline material for: {}", missing.join(", "));
    }
}
