//! Command handlers.

use anyhow::{Context, bail};
use assetpress_api::{Action, AppState, AssetGroups, TagRenderer};
use assetpress_cache::{FilesystemCache, build_cache};
use assetpress_compress::Compressors;
use assetpress_core::AssetKind;
use assetpress_core::ports::{Compressor, JobCache};
use assetpress_engine::{
    Coordinator, Dispatcher, ExecutionStrategy, JobContext, JobOutcome, JobSpec,
    ProcessDispatcher, create_dispatcher,
};
use assetpress_fingerprint::FingerprintCodec;
use assetpress_notify::create_notifier;
use std::path::Path;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

use crate::config::AppConfig;

fn job_context(config: &AppConfig, cache: Arc<dyn JobCache>) -> Arc<JobContext> {
    Arc::new(JobContext::new(
        cache,
        Compressors::from_config(&config.compressor, config.engine.debug),
        create_notifier(&config.notify),
        &config.engine,
    ))
}

fn dispatcher(
    config: &AppConfig,
    config_path: Option<&Path>,
    context: Arc<JobContext>,
) -> anyhow::Result<Arc<dyn Dispatcher>> {
    // Workers must load the same file the server did.
    if let (ExecutionStrategy::Process, Some(path)) = (config.engine.strategy, config_path) {
        let worker = match &config.engine.worker_program {
            Some(program) => ProcessDispatcher::new(program).with_args(["job"]),
            None => ProcessDispatcher::current_exe()?,
        };
        let worker = worker.with_args(["--config".to_string(), path.display().to_string()]);
        return Ok(Arc::new(worker));
    }
    Ok(create_dispatcher(&config.engine, context)?)
}

pub async fn serve(
    mut config: AppConfig,
    config_path: Option<&Path>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let codec = Arc::new(
        FingerprintCodec::from_config(&config.fingerprint)
            .context("fingerprint.secret_key must be set")?,
    );
    let cache = build_cache(&config.cache)?;
    let context = job_context(&config, cache.clone());
    let dispatcher = dispatcher(&config, config_path, context)?;
    let coordinator = Arc::new(Coordinator::new(cache, dispatcher, config.engine.clone())?);

    info!(
        content_root = %config.fingerprint.content_root.display(),
        strategy = ?config.engine.strategy,
        "Starting assetpress"
    );
    assetpress_api::serve(&config.server, Arc::new(AppState::new(codec, coordinator))).await?;
    Ok(())
}

pub fn encode(
    config: &AppConfig,
    kind: AssetKind,
    group: &str,
    files: &[String],
    append: bool,
    tag: bool,
) -> anyhow::Result<()> {
    let codec = Arc::new(FingerprintCodec::from_config(&config.fingerprint)?);

    if tag {
        let action = if append { Action::Append } else { Action::Compress };
        let mut groups = AssetGroups::new();
        for file in files {
            groups.add(kind, action, group, file.as_str())?;
        }
        let renderer = TagRenderer::new(codec, config.fingerprint.content_url.clone())
            .with_mount(config.server.mount.clone())
            .with_expand(config.server.expand);
        println!("{}", renderer.render(&groups, kind)?);
        return Ok(());
    }

    let payload = codec.encode(kind, files, group)?;
    println!("token:     {}", payload.token());
    println!("signature: {}", payload.signature());
    println!("url:       {}{}", config.server.mount.trim_end_matches('/'), payload.path(append));
    Ok(())
}

pub fn decode(
    config: &AppConfig,
    kind: AssetKind,
    group: &str,
    token: &str,
    signature: &str,
) -> anyhow::Result<()> {
    let codec = FingerprintCodec::from_config(&config.fingerprint)?;
    let payload = codec.decode(kind, group, token, signature)?;
    println!("group:    {}", payload.group());
    println!("mod_time: {}", payload.mod_time());
    for file in payload.files() {
        println!("  {}", file);
    }
    Ok(())
}

pub async fn compress(config: &AppConfig, kind: AssetKind, file: &Path) -> anyhow::Result<()> {
    let source = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("cannot read {}", file.display()))?;
    let compressors = Compressors::from_config(&config.compressor, config.engine.debug);
    let output = compressors.for_kind(kind).compress(&source).await?;
    print!("{}", output);
    Ok(())
}

pub async fn clear_cache(config: &AppConfig, keys: &[String], all: bool) -> anyhow::Result<()> {
    let cache = build_cache(&config.cache)?;
    if !cache.is_shared() {
        warn!(backend = %cache.name(), "Cache is process-local; nothing to clear");
        return Ok(());
    }

    if all {
        let dir = config
            .cache
            .directory
            .clone()
            .unwrap_or_else(FilesystemCache::default_dir);
        let removed = FilesystemCache::new(dir)
            .with_compression(config.cache.compression)
            .clear()
            .await?;
        println!("removed {} entries", removed);
        return Ok(());
    }

    if keys.is_empty() {
        bail!("give at least one key, or --all");
    }
    for key in keys {
        cache.delete(key).await?;
        println!("removed {}", key);
    }
    Ok(())
}

pub fn show_config(config: &AppConfig) -> anyhow::Result<()> {
    print!("{}", serde_yaml::to_string(&config.redacted())?);
    Ok(())
}

/// Worker side of the process strategy.
pub async fn run_job(config: &AppConfig) -> anyhow::Result<()> {
    let mut input = String::new();
    tokio::io::stdin()
        .read_to_string(&mut input)
        .await
        .context("cannot read job from stdin")?;
    let spec: JobSpec = serde_json::from_str(&input).context("invalid job spec")?;

    let cache = build_cache(&config.cache)?;
    match job_context(config, cache).run(spec).await? {
        JobOutcome::Failed(reason) => warn!(reason = %reason, "Job recorded a failure"),
        outcome => info!(outcome = ?outcome, "Job done"),
    }
    Ok(())
}
