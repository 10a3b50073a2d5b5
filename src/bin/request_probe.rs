//! request-probe: 通过完整请求管线发起单次调用的命令行工具
//!
//! Usage:
//!   request-probe <METHOD> <URL> [JSON_DATA] [--quiet] [--silent] [--config <file>]
//!
//! `JSON_DATA` is sent as the query for GET/DELETE and as the body otherwise.

use anyhow::{bail, Context};
use request_pipeline::session::{CredentialSource, InMemoryCredentialStore, NoCredentials};
use request_pipeline::{PipelineConfig, RequestOptions, RequestPipeline};
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    println!(
        r#"request-probe: issue one call through the request pipeline

USAGE:
    request-probe <METHOD> <URL> [JSON_DATA] [OPTIONS]

OPTIONS:
    --quiet                 Do not emit failure notifications
    --silent                Do not participate in the busy indicator
    --config <file>         Load pipeline configuration from YAML

ENVIRONMENT:
    APP_API_BASE_URL        Base URL for relative paths
    APP_HTTP_TIMEOUT_MS     Transport timeout in milliseconds
    APP_TOKEN               Bearer token to attach
    RUST_LOG                Log filter (default: info)"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || matches!(args[0].as_str(), "help" | "--help" | "-h") {
        print_usage();
        return Ok(());
    }

    let mut positional = Vec::new();
    let mut options = RequestOptions::default();
    let mut config_path = None;
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--quiet" => options = options.notify_on_error(false),
            "--silent" => options = options.show_busy_indicator(false),
            "--config" => config_path = Some(iter.next().context("--config needs a file")?),
            _ => positional.push(arg),
        }
    }
    if positional.len() < 2 {
        print_usage();
        bail!("expected <METHOD> <URL>");
    }

    let method: Method = positional[0]
        .to_uppercase()
        .parse()
        .with_context(|| format!("unknown method '{}'", positional[0]))?;
    let url = positional[1].clone();
    let data: Value = match positional.get(2) {
        Some(raw) => serde_json::from_str(raw).context("JSON_DATA is not valid JSON")?,
        None => Value::Null,
    };

    let config = match config_path {
        Some(path) => PipelineConfig::from_yaml_file(&path)
            .with_context(|| format!("failed to load {}", path))?
            .with_env_overrides(),
        None => PipelineConfig::from_env(),
    };

    let credentials: Arc<dyn CredentialSource> = match std::env::var("APP_TOKEN") {
        Ok(token) => Arc::new(InMemoryCredentialStore::with_token(token)),
        Err(_) => Arc::new(NoCredentials),
    };

    let pipeline = RequestPipeline::builder()
        .config(config)
        .credentials(credentials)
        .build()?;

    match pipeline.request::<Value, _>(method, &url, &data, options).await {
        Ok(data) => {
            println!("{}", serde_json::to_string_pretty(&data)?);
            Ok(())
        }
        Err(err) => match err.record() {
            Some(record) => {
                println!("{}", serde_json::to_string_pretty(record)?);
                std::process::exit(2);
            }
            None => Err(err.into()),
        },
    }
}
