//! Store administration: migrations and health

use std::process::ExitCode;

use serde::Serialize;

use crate::output::{format_output, OutputFormat};
use crate::{AppContext, Cli};
use amity_storage::StorageBackend;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MigrateReport {
    success: bool,
    schema_version: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthReport {
    success: bool,
    version: &'static str,
    server_time: String,
    store: &'static str,
}

pub async fn migrate(cli: &Cli, ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let version = ctx.storage.migrate().await?;
    tracing::info!("Schema at version {}", version);

    match cli.output_format() {
        OutputFormat::Json => {
            let report = MigrateReport {
                success: true,
                schema_version: version,
            };
            println!("{}", format_output(&report, OutputFormat::Json));
        }
        OutputFormat::Table if !cli.quiet => println!("Schema at version {}", version),
        OutputFormat::Table => {}
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn health(cli: &Cli, ctx: &AppContext) -> anyhow::Result<ExitCode> {
    let healthy = match ctx.storage.health_check().await {
        Ok(healthy) => healthy,
        Err(e) => {
            tracing::warn!("Store health check failed: {}", e);
            false
        }
    };

    let report = HealthReport {
        success: healthy,
        version: env!("CARGO_PKG_VERSION"),
        server_time: chrono::Utc::now().to_rfc3339(),
        store: if healthy { "ok" } else { "unavailable" },
    };

    match cli.output_format() {
        OutputFormat::Json => println!("{}", format_output(&report, OutputFormat::Json)),
        OutputFormat::Table => {
            println!("amity {}", report.version);
            println!("  server time: {}", report.server_time);
            println!("  store: {}", report.store);
        }
    }

    Ok(if healthy {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
