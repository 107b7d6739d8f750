mod replay;
mod sink;

use std::path::Path;

use anyhow::Context;
use colocate_core::{AnchorLocation, AppConfig, CategoryLexicon};
use colocate_resolver::{Orchestrator, OrchestratorConfig};
use tracing_subscriber::EnvFilter;

use crate::replay::ReplaySessionFactory;
use crate::sink::JsonFileSink;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = colocate_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = %config.env,
        host_brand = %config.host_brand,
        workers = config.workers,
        "colocate starting"
    );
    if !config.fail_safe_configured {
        tracing::warn!(
            fail_safe = %config.fail_safe,
            "COLOCATE_FAIL_SAFE not set; failed anchors will be reported using the default policy"
        );
    }

    let lexicon = load_lexicon(&config)?;
    let anchors_path = config
        .anchors_path
        .as_deref()
        .context("COLOCATE_ANCHORS_PATH must point at a JSON array of anchors")?;
    let anchors = load_anchors(anchors_path)?;
    let fixture_path = config
        .fixture_path
        .as_deref()
        .context("COLOCATE_FIXTURE_PATH must point at a recorded lookup/search fixture")?;
    let factory = ReplaySessionFactory::from_path(fixture_path)?;

    let sink = JsonFileSink::new(&config.output_dir);
    let prior = sink.load_previous().await;

    let orchestrator = Orchestrator::new(
        factory,
        &lexicon,
        OrchestratorConfig::from_app_config(&config),
    );
    let report = orchestrator.run(anchors, prior, &sink).await;

    let qualifying = report.results.iter().filter(|r| r.qualifies).count();
    println!(
        "resolved {} anchors ({} failed, {} carried forward); {} qualify; results in {}",
        report.results.len(),
        report.failed,
        report.carried_forward,
        qualifying,
        sink.path_for(colocate_resolver::FINAL_LABEL).display()
    );

    Ok(())
}

fn load_lexicon(config: &AppConfig) -> anyhow::Result<CategoryLexicon> {
    match &config.lexicon_path {
        Some(path) => {
            let lexicon = colocate_core::load_lexicon(path)?;
            tracing::info!(
                path = %path.display(),
                brands = lexicon.known_brands.len(),
                "loaded category lexicon"
            );
            Ok(lexicon)
        }
        None => Ok(CategoryLexicon::default()),
    }
}

fn load_anchors(path: &Path) -> anyhow::Result<Vec<AnchorLocation>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading anchors {}", path.display()))?;
    let anchors: Vec<AnchorLocation> = serde_json::from_str(&text)
        .with_context(|| format!("parsing anchors {}", path.display()))?;
    tracing::info!(path = %path.display(), count = anchors.len(), "loaded anchors");
    Ok(anchors)
}
