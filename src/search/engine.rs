use super::cache::ArtifactCache;
use crate::config::SearchConfig;
use crate::core::{
    ShrinkError, ShrinkResult, TargetSize, TrialArtifact, TrialParams, TrialRecord,
};
use crate::reporting::ProgressReporter;
use crate::trial::TrialExecutor;
use std::path::Path;

/// 探索状態と結果
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub found_fit: bool,
    /// 目標を満たした中で最後に見つかったパラメータ
    pub best: Option<TrialParams>,
    /// 最後に実行したパラメータ
    pub last: Option<TrialParams>,
    pub trials_run: usize,
    pub history: Vec<TrialRecord>,
}

impl SearchOutcome {
    /// 出力として報告するパラメータ。見つからなければ最後のトライアル
    pub fn reported(&self) -> Option<TrialParams> {
        if self.found_fit {
            self.best
        } else {
            self.last
        }
    }

    fn keep_list(&self) -> Vec<TrialParams> {
        self.best.iter().chain(self.last.iter()).copied().collect()
    }
}

/// スケール順 × 品質の二分探索でサイズ目標を満たすパラメータを探す
pub struct SearchEngine<'a, E: ?Sized, R: ?Sized> {
    executor: &'a E,
    reporter: &'a R,
    config: &'a SearchConfig,
}

impl<'a, E, R> SearchEngine<'a, E, R>
where
    E: TrialExecutor + ?Sized,
    R: ProgressReporter + ?Sized,
{
    pub fn new(executor: &'a E, reporter: &'a R, config: &'a SearchConfig) -> Self {
        Self {
            executor,
            reporter,
            config,
        }
    }

    /// キャッシュにあればそれを使い、なければ実行してキャッシュに入れる
    async fn trial(
        &self,
        params: TrialParams,
        cache: &mut ArtifactCache,
        outcome: &mut SearchOutcome,
    ) -> ShrinkResult<TrialArtifact> {
        if let Some(artifact) = cache.get(params) {
            return Ok(artifact.clone());
        }

        let slot = cache.slot_for(params);
        let artifact = self.executor.run_trial(params, &slot).await?;
        outcome.trials_run += 1;
        cache.insert(artifact.clone());
        Ok(artifact)
    }

    pub async fn run(
        &self,
        target: TargetSize,
        cache: &mut ArtifactCache,
    ) -> ShrinkResult<SearchOutcome> {
        self.config.validate()?;
        let scales = self.config.scales()?;
        let mut outcome = SearchOutcome::default();

        for scale in scales {
            let mut low = i32::from(self.config.quality_min);
            let mut high = i32::from(self.config.quality_max);

            for _ in 0..self.config.probes_per_scale {
                if low > high {
                    break;
                }
                let mid = (low + high) / 2;
                // low >= quality_min >= 1, high <= quality_max <= 100
                let params = TrialParams::new(mid as u8, scale);

                let artifact = self.trial(params, cache, &mut outcome).await?;
                let fits = target.fits(artifact.size_bytes);
                log::info!(
                    "トライアル {params}: {} bytes (目標 {} bytes) {}",
                    artifact.size_bytes,
                    target.bytes(),
                    if fits { "OK" } else { "NG" }
                );
                self.reporter.report_trial(&artifact, fits).await;

                outcome.history.push(TrialRecord {
                    params,
                    size_bytes: artifact.size_bytes,
                    fits,
                    image_failures: artifact.images.failed_count(),
                });
                outcome.last = Some(params);

                if fits {
                    outcome.best = Some(params);
                    outcome.found_fit = true;
                    low = mid + 1;
                } else {
                    high = mid - 1;
                }

                cache.retain_only(&outcome.keep_list());
            }

            self.reporter
                .report_scale_finished(scale, outcome.found_fit)
                .await;
            if outcome.found_fit {
                break;
            }
        }

        if !outcome.found_fit {
            log::warn!(
                "目標 {} bytes を満たすパラメータが見つかりませんでした",
                target.bytes()
            );
        }
        Ok(outcome)
    }

    /// 報告するパラメータの成果物を `output` にコピーする。キャッシュから消えていれば再実行する
    pub async fn materialize(
        &self,
        outcome: &mut SearchOutcome,
        cache: &mut ArtifactCache,
        output: &Path,
    ) -> ShrinkResult<TrialArtifact> {
        let params = outcome
            .reported()
            .ok_or_else(|| ShrinkError::configuration("トライアルが1回も実行されていません"))?;

        if !cache.contains(params) {
            log::debug!("{params} の成果物がキャッシュにないため再実行します");
        }
        let artifact = self.trial(params, cache, outcome).await?;

        let size_bytes = tokio::fs::copy(&artifact.path, output).await.map_err(|e| {
            ShrinkError::io(format!("{} への書き出し", output.display()), e)
        })?;

        Ok(TrialArtifact {
            path: output.to_path_buf(),
            size_bytes,
            ..artifact
        })
    }
}
