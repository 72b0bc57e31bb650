use super::parse_format;
use super::shrink::load_config;
use crate::codec::standard::StandardCodec;
use crate::core::{Scale, TrialArtifact, TrialParams};
use crate::reporting::NoOpProgressReporter;
use crate::Shrinker;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

/// trial コマンドの引数をまとめた構造体
#[derive(Debug, Clone)]
pub struct TrialOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub quality: u8,
    pub scale: f64,
    pub format: Option<String>,
    pub workers: Option<usize>,
}

pub async fn execute_trial(options: TrialOptions) -> Result<TrialArtifact> {
    let format = parse_format(options.format.as_deref())?;
    let params = TrialParams::new(options.quality, Scale::from_factor(options.scale)?);
    let config = load_config(None, options.workers)?;
    let shrinker = Shrinker::new(Arc::new(StandardCodec::new()), NoOpProgressReporter, config);

    println!("🔧 トライアル {params}: {}", options.input.display());
    let artifact = shrinker
        .run_single_trial(&options.input, format, params, &options.output)
        .await?;

    println!("✅ {} ({:.1} KB)", artifact.path.display(), artifact.size_bytes as f64 / 1024.0);
    println!(
        "   - 画像: {} 枚中 {} 枚を再エンコード",
        artifact.images.total_files, artifact.images.succeeded
    );
    for failure in &artifact.images.failures {
        eprintln!("✗ {} - {}", failure.item, failure.error);
    }

    Ok(artifact)
}
