//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::TapConfig;
use crate::engine::SyncEngine;
use crate::error::{Error, Result};
use crate::streams::{self, ResourceConfig};
use crate::types::Record;
use chrono::{SecondsFormat, Utc};
use futures::StreamExt;
use serde_json::{json, Value};
use std::io::Write;
use tracing::{error, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing messages to stdout
    pub async fn run(&self) -> Result<()> {
        let mut stdout = std::io::stdout();
        self.run_with_output(&mut stdout).await
    }

    /// Run the CLI command, writing messages to `out`
    pub async fn run_with_output<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check(out).await,
            Commands::Discover => self.discover(out),
            Commands::Read { streams } => self.read(streams.as_deref(), out).await,
        }
    }

    /// Load the tap configuration
    fn load_config(&self) -> Result<TapConfig> {
        // Inline config takes precedence
        if let Some(json_str) = &self.cli.config_json {
            return TapConfig::from_json_str(json_str);
        }

        if let Some(path) = &self.cli.config {
            return TapConfig::from_file(path);
        }

        Err(Error::config(
            "No configuration given (use --config or --config-json)",
        ))
    }

    /// Check the credential
    async fn check<W: Write>(&self, out: &mut W) -> Result<()> {
        let config = self.load_config()?;
        info!(base_url = %config.base_url, "Checking connection");

        let message = match SyncEngine::new(config).check().await {
            Ok(()) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "SUCCEEDED",
                    "message": "Connection successful"
                }
            }),
            Err(e) => json!({
                "type": "CONNECTION_STATUS",
                "connectionStatus": {
                    "status": "FAILED",
                    "message": format!("Connection failed: {e}")
                }
            }),
        };

        self.output_message(out, &message)
    }

    /// Print the catalog
    fn discover<W: Write>(&self, out: &mut W) -> Result<()> {
        self.output_message(out, &catalog_message(&streams::catalog()))
    }

    /// Sync the selected streams one after another
    async fn read<W: Write>(&self, selection: Option<&str>, out: &mut W) -> Result<()> {
        let config = self.load_config()?;
        let selected = select_streams(selection)?;
        let engine = SyncEngine::new(config);

        let mut failed = Vec::new();

        for resource in &selected {
            self.output_message(out, &schema_message(resource))?;

            let mut stream = match engine.extract(resource) {
                Ok(stream) => stream,
                Err(e) => {
                    error!(stream = %resource.name, error = %e, "Stream not started");
                    failed.push(resource.name.clone());
                    continue;
                }
            };

            while let Some(item) = stream.next().await {
                match item {
                    Ok(record) => self.output_message(out, &record_message(&record))?,
                    Err(e) => {
                        error!(stream = %resource.name, error = %e, "Stream failed");
                        failed.push(resource.name.clone());
                        break;
                    }
                }
            }

            let stats = stream.stats();
            info!(
                stream = %resource.name,
                requests = stats.requests,
                pages = stats.pages,
                records = stats.records,
                retries = stats.total_retries(),
                duration_ms = stats.duration_ms,
                "Stream summary"
            );
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::Other(format!(
                "{} of {} stream(s) failed: {}",
                failed.len(),
                selected.len(),
                failed.join(", ")
            )))
        }
    }

    /// Output a message
    fn output_message<W: Write>(&self, out: &mut W, msg: &Value) -> Result<()> {
        let line = match self.cli.format {
            OutputFormat::Json => serde_json::to_string(msg)?,
            OutputFormat::Pretty => serde_json::to_string_pretty(msg)?,
        };
        writeln!(out, "{line}")?;
        Ok(())
    }
}

/// Resolve a comma-separated stream selection, keeping catalog order
pub fn select_streams(selection: Option<&str>) -> Result<Vec<ResourceConfig>> {
    let names: Vec<&str> = selection
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .collect();

    if names.is_empty() {
        return Ok(streams::catalog());
    }

    for name in &names {
        streams::find_stream(name)?;
    }

    Ok(streams::catalog()
        .into_iter()
        .filter(|resource| names.contains(&resource.name.as_str()))
        .collect())
}

fn open_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": true
    })
}

/// Singer RECORD message
pub fn record_message(record: &Record) -> Value {
    json!({
        "type": "RECORD",
        "stream": record.stream,
        "record": record.data,
        "time_extracted": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    })
}

/// Singer SCHEMA message
pub fn schema_message(resource: &ResourceConfig) -> Value {
    json!({
        "type": "SCHEMA",
        "stream": resource.name,
        "schema": open_schema(),
        "key_properties": resource.primary_keys,
        "bookmark_properties": resource.replication_key.iter().collect::<Vec<_>>()
    })
}

/// CATALOG message describing every resource
pub fn catalog_message(resources: &[ResourceConfig]) -> Value {
    let streams: Vec<Value> = resources
        .iter()
        .map(|resource| {
            json!({
                "tap_stream_id": resource.name,
                "stream": resource.name,
                "key_properties": resource.primary_keys,
                "replication_key": resource.replication_key,
                "replication_method": if resource.replication_key.is_some() {
                    "INCREMENTAL"
                } else {
                    "FULL_TABLE"
                },
                "pagination": resource.pagination.name(),
                "schema": open_schema()
            })
        })
        .collect();

    json!({
        "type": "CATALOG",
        "catalog": {
            "streams": streams
        }
    })
}
