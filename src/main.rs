//! MedVerify CLI: fact-check one health claim against a local MedGemma model
//! and PubMed, printing the report as JSON.

use std::io::{self, IsTerminal, Read, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use medverify_lib::config::{AppConfig, APP_NAME, APP_VERSION};
use medverify_lib::models::Claim;
use medverify_lib::pipeline::evidence::{EvidenceRetriever, PubMedClient};
use medverify_lib::pipeline::generation::{find_best_model, ClaimAnalyzer, OllamaClient};
use medverify_lib::pipeline::orchestrator::Orchestrator;

#[derive(Parser)]
#[command(name = "medverify")]
#[command(about = "Fact-check a health claim with MedGemma and PubMed", long_about = None)]
#[command(version = APP_VERSION)]
struct Cli {
    /// Claim to check (read from stdin when omitted)
    claim: Option<String>,

    /// Skip the PubMed lookup
    #[arg(long)]
    no_evidence: bool,

    /// Ollama model to use instead of the best installed MedGemma
    #[arg(long, value_name = "NAME")]
    model: Option<String>,

    /// Do not echo generated text to stderr
    #[arg(long)]
    quiet: bool,

    /// Single-line JSON output
    #[arg(long)]
    compact: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    medverify_lib::init_tracing();
    tracing::info!("{} v{}", APP_NAME, APP_VERSION);

    let config = AppConfig::from_env();
    // Reject bad input before touching Ollama or PubMed.
    let claim = resolve_claim(cli.claim, read_claim_from_stdin, config.max_claim_chars)?;

    let ollama = Arc::new(
        OllamaClient::new(&config.ollama_url, config.connect_timeout)
            .context("Failed to build Ollama client")?,
    );
    let model = match cli.model.or_else(|| config.model.clone()) {
        Some(model) => model,
        None => find_best_model(ollama.as_ref())
            .with_context(|| format!("Could not select a model from {}", ollama.base_url()))?,
    };

    let analyzer = ClaimAnalyzer::new(ollama, &model, &config);
    let retriever = if cli.no_evidence {
        None
    } else {
        let pubmed = PubMedClient::new(&config).context("Failed to build PubMed client")?;
        Some(EvidenceRetriever::new(pubmed, &config))
    };
    let orchestrator = Orchestrator::new(analyzer, retriever);

    let quiet = cli.quiet;
    let report = orchestrator.analyze(claim.as_str(), |fragment| {
        if !quiet {
            eprint!("{fragment}");
            let _ = io::stderr().flush();
        }
    })?;
    if !quiet {
        eprintln!();
    }

    let json = if cli.compact {
        serde_json::to_string(&report)?
    } else {
        serde_json::to_string_pretty(&report)?
    };
    println!("{json}");
    Ok(())
}

/// Claim from the argument, else from `read_stdin`, validated.
fn resolve_claim<F>(arg: Option<String>, read_stdin: F, max_chars: usize) -> Result<Claim>
where
    F: FnOnce() -> Result<String>,
{
    let raw = match arg {
        Some(claim) => claim,
        None => read_stdin()?,
    };
    Ok(Claim::parse(&raw, max_chars)?)
}

fn read_claim_from_stdin() -> Result<String> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("No claim given; pass it as an argument or pipe it on stdin");
    }
    let mut claim = String::new();
    stdin
        .read_to_string(&mut claim)
        .context("Failed to read claim from stdin")?;
    Ok(claim)
}
