//! Load sample jobs for one owner from a JSON file.
//!
//! Usage: `jobtrack-seed <jobs.json> <owner-id>`
//!
//! The file holds an array of `{company, position, status?, jobType?, createdAt?}`.

use anyhow::{bail, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use jobtrack_api::{ApiConfig, AppState, StoreBackend};
use jobtrack_models::{Job, JobFields, UserId};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedJob {
    #[serde(flatten)]
    fields: JobFields,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let _ = rustls::crypto::ring::default_provider().install_default();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(path), Some(owner)) = (args.next(), args.next()) else {
        bail!("usage: jobtrack-seed <jobs.json> <owner-id>");
    };

    let raw = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;
    let records: Vec<SeedJob> =
        serde_json::from_str(&raw).with_context(|| format!("Invalid job list in {}", path))?;

    let config = ApiConfig::from_env().context("Invalid configuration")?;
    if config.store_backend == StoreBackend::Memory {
        warn!("STORE_BACKEND is memory; seeded jobs are dropped when this process exits");
    }
    let state = AppState::new(config)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to open store: {}", e))?;

    let owner = UserId::from(owner);
    for (i, record) in records.into_iter().enumerate() {
        let changes = record
            .fields
            .into_changes()
            .with_context(|| format!("Record {} is invalid", i))?;
        let mut job = Job::new(owner.clone(), changes);
        if let Some(created_at) = record.created_at {
            job = job.with_created_at(created_at);
        }
        state
            .jobs
            .store()
            .insert(&job)
            .await
            .with_context(|| format!("Failed to insert record {}", i))?;
    }

    let total = state.jobs.count_all(&owner).await?;
    info!(owner = %owner, total, "Seeding complete");
    Ok(())
}
