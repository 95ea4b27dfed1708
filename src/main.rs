use std::path::PathBuf;

use clap::Parser;
use ecr_janitor::{
    aws,
    cleanup::{CleanupRunner, collect_in_use_images},
    clusters::{EksCluster, WorkloadSource},
    config::JanitorConfig,
    observability,
    registry::{EcrRegistry, ImageRegistry},
};

/// CLI arguments for ecr-janitor
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Deletes ECR images that are past retention and unused by any EKS workload",
    long_about = None
)]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "/config.toml")]
    config_file: PathBuf,

    /// Log what would be deleted without deleting anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let config = match JanitorConfig::from_file(&args.config_file) {
        Ok(c) => c,
        Err(e) => {
            eprintln!(
                "Failed to load config from {}: {}",
                args.config_file.display(),
                e
            );
            std::process::exit(1);
        }
    };

    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {e}");
        std::process::exit(1);
    }

    let policy = config.policy();

    tracing::info!(
        config_file = %args.config_file.display(),
        clusters = config.clusters.len(),
        policy_type = policy.kind(),
        policy_number = policy.number(),
        "Starting ecr-janitor, deleting {}",
        policy
    );

    if config.clusters.is_empty() {
        tracing::warn!(
            "No clusters configured. No image will be considered in use, so every \
             image selected by the lifecycle policy is eligible for deletion."
        );
    }

    let base = aws::base_sdk_config(&config.aws).await;
    if let Err(e) = aws::credentials(&base).await {
        tracing::error!(error = %e, "Failed to resolve AWS credentials");
        std::process::exit(1);
    }

    let sources: Vec<Box<dyn WorkloadSource>> = config
        .clusters
        .iter()
        .map(|cluster| {
            Box::new(EksCluster::new(
                &cluster.name,
                config.cluster_region(cluster).map(str::to_string),
                cluster.role_arn.clone(),
                cluster.workloads.clone(),
                base.clone(),
            )) as Box<dyn WorkloadSource>
        })
        .collect();

    let in_use_images = collect_in_use_images(&sources, config.cleanup.concurrency).await;
    tracing::info!(
        images = in_use_images.len(),
        "Collected in-use images from all clusters"
    );

    let registry_config = aws::scoped_sdk_config(
        &base,
        config.registry_region(),
        config.registry.role_arn.as_deref(),
    )
    .await;
    let registry = EcrRegistry::new(&registry_config);

    let repositories = match registry
        .list_repositories(&config.registry.selection())
        .await
    {
        Ok(repositories) => repositories,
        Err(e) => {
            tracing::error!(error = %e, "Failed to list target repositories");
            std::process::exit(1);
        }
    };

    let runner = CleanupRunner::new(registry, policy, &config.cleanup).dry_run(args.dry_run);
    let summary = runner.run(&repositories, &in_use_images).await;

    let dry_run_msg = if runner.is_dry_run() { " (DRY RUN)" } else { "" };
    tracing::info!(
        repositories = summary.repositories.len(),
        deleted = summary.deleted(),
        would_delete = summary.would_delete(),
        delete_failures = summary.delete_failures(),
        failed_repositories = summary.failed_repositories(),
        "Cleanup complete{}",
        dry_run_msg
    );
}
