use super::parse_format;
use crate::codec::standard::StandardCodec;
use crate::config::SearchConfig;
use crate::core::{ShrinkReport, TargetSize};
use crate::reporting::ConsoleProgressReporter;
use crate::{cli::default_output_path, ShrinkRequest, Shrinker};
use anyhow::{bail, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// shrink コマンドの引数をまとめた構造体
#[derive(Debug, Clone, Default)]
pub struct ShrinkOptions {
    pub input: PathBuf,
    pub output: Option<PathBuf>,
    pub target_kb: Option<f64>,
    pub target_mb: Option<f64>,
    pub format: Option<String>,
    pub workers: Option<usize>,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

fn kilobytes(bytes: u64) -> f64 {
    bytes as f64 / 1024.0
}

pub(crate) fn load_config(path: Option<&PathBuf>, workers: Option<usize>) -> Result<SearchConfig> {
    let mut config = match path {
        Some(path) => SearchConfig::from_json_file(path)?,
        None => SearchConfig::default(),
    };
    if let Some(workers) = workers {
        config = config.with_worker_count(workers);
    }
    config.validate()?;
    Ok(config)
}

pub async fn execute_shrink(options: ShrinkOptions) -> Result<ShrinkReport> {
    let target = match (options.target_kb, options.target_mb) {
        (Some(kb), None) => TargetSize::from_kilobytes(kb)?,
        (None, Some(mb)) => TargetSize::from_megabytes(mb)?,
        _ => bail!("--target-kb か --target-mb のどちらか一方を指定してください"),
    };
    let format = parse_format(options.format.as_deref())?;
    let config = load_config(options.config.as_ref(), options.workers)?;
    let output = options
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&options.input));

    let reporter = if options.json || options.quiet {
        ConsoleProgressReporter::quiet()
    } else {
        ConsoleProgressReporter::new()
    };
    let shrinker = Shrinker::new(Arc::new(StandardCodec::new()), reporter, config);

    let mut request = ShrinkRequest::new(&options.input, &output, target);
    if let Some(format) = format {
        request = request.with_format(format);
    }
    let report = shrinker.shrink(&request).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("📄 出力ファイル: {}", report.output.display());
        println!("   - 元のサイズ: {:.1} KB", kilobytes(report.original_bytes));
        println!("   - 縮小後: {:.1} KB", kilobytes(report.final_bytes));
        println!("   - {}", report.summary());
        if report.image_failures > 0 {
            println!(
                "⚠️  {}枚の画像は処理できず元のまま残っています",
                report.image_failures
            );
        }
    }

    Ok(report)
}
