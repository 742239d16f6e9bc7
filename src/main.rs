use anyhow::Result;
use tracing::{error, info};

use challenge_runner::config::WorkerConfig;
use challenge_runner::jobs::run::process_run_job;
use challenge_runner::jobs::WorkerJob;
use challenge_runner::redis_manager::RedisManager;
use challenge_runner::{ExecutionService, LanguageRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("challenge_runner=info".parse()?),
        )
        .init();

    dotenvy::dotenv().ok();

    let config = WorkerConfig::from_env()?;

    let registry = LanguageRegistry::from_env()?;
    info!("Loaded language configurations: {:?}", registry.languages());

    let service = ExecutionService::new(&registry, config.default_timeout, config.version_timeout)?;

    info!("Starting Challenge Runner...");

    let mut redis = RedisManager::connect(&config.redis_url).await?;

    info!("Waiting for jobs...");

    loop {
        match redis.pop_job().await? {
            WorkerJob::Run(job) => {
                info!(
                    "Received run job: submission_id={}, language={}, cases={}",
                    job.submission_id,
                    job.language,
                    job.test_cases.len()
                );

                let result = process_run_job(&job, &service).await;

                if let Err(e) = redis.push_result(&result).await {
                    error!(
                        "Failed to push result for submission {}: {}",
                        job.submission_id, e
                    );
                }

                if let Some(challenge_id) = &job.challenge_id {
                    if let Err(e) = redis.publish_progress(&result.progress(challenge_id)).await {
                        error!("Failed to publish progress: {}", e);
                    }
                }
            }
        }
    }
}
