// 探索と実行器の性質テスト
use crate::fixtures::*;
use doc_shrink::{
    codec::standard::StandardCodec,
    config::SearchConfig,
    core::{Document, Scale, ShrinkOutcome, TargetSize, TrialParams},
    reporting::NoOpProgressReporter,
    trial::{ContainerTrialExecutor, PdfTrialExecutor, TrialExecutor},
    ShrinkRequest, Shrinker,
};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn shrinker() -> Shrinker<StandardCodec, NoOpProgressReporter> {
    Shrinker::new(
        Arc::new(StandardCodec::new()),
        NoOpProgressReporter::new(),
        SearchConfig::default(),
    )
}

fn params(quality: u8, scale: f64) -> TrialParams {
    TrialParams::new(quality, Scale::from_factor(scale).unwrap())
}

async fn single_trial(input: &Path, params: TrialParams, output: &Path) -> u64 {
    shrinker()
        .run_single_trial(input, None, params, output)
        .await
        .unwrap()
        .size_bytes
}

#[tokio::test]
async fn test_size_grows_with_quality_at_fixed_scale() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("report.docx");
    write_docx(&input, &[("word/media/image1.jpg", jpeg_bytes(400, 300, 100))]);

    let mut sizes = Vec::new();
    for quality in [20, 50, 80] {
        let output = temp_dir.path().join(format!("q{quality}.docx"));
        sizes.push(single_trial(&input, params(quality, 0.75), &output).await);
    }

    assert!(sizes[0] <= sizes[1], "{sizes:?}");
    assert!(sizes[1] <= sizes[2], "{sizes:?}");
}

#[tokio::test]
async fn test_best_pair_matches_output_bytes() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("report.docx");
    let output = temp_dir.path().join("report_out.docx");
    write_docx(
        &input,
        &[
            ("word/media/image1.jpg", jpeg_bytes(600, 400, 100)),
            ("word/media/image2.jpg", jpeg_bytes(300, 300, 100)),
        ],
    );
    let target = TargetSize::from_bytes(file_size(&input) / 3).unwrap();

    let report = shrinker()
        .shrink(&ShrinkRequest::new(&input, &output, target))
        .await
        .unwrap();
    assert!(report.met_target());

    let replay = temp_dir.path().join("replay.docx");
    single_trial(&input, report.chosen.unwrap(), &replay).await;

    assert_eq!(fs::read(&output).unwrap(), fs::read(&replay).unwrap());
}

#[tokio::test]
async fn test_unreachable_target_returns_most_aggressive_trial() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("sheet.xlsx");
    let output = temp_dir.path().join("sheet_out.xlsx");
    write_xlsx(&input, &[("xl/media/image1.jpeg", jpeg_bytes(320, 320, 100))]);

    let config = SearchConfig::default().with_probes_per_scale(2);
    let shrinker = Shrinker::new(
        Arc::new(StandardCodec::new()),
        NoOpProgressReporter::new(),
        config,
    );
    let request = ShrinkRequest::new(&input, &output, TargetSize::from_bytes(64).unwrap());
    let report = shrinker.shrink(&request).await.unwrap();

    assert_eq!(report.outcome, ShrinkOutcome::TargetMissed);
    assert!(!report.met_target());
    // 2回の試行: 52 → 30
    assert_eq!(report.chosen, Some(params(30, 0.25)));
    assert_eq!(report.trials_run, 8);
    assert!(report.summary().starts_with("Target Met: false"));

    let replay = temp_dir.path().join("replay.xlsx");
    single_trial(&input, params(30, 0.25), &replay).await;
    assert_eq!(fs::read(&output).unwrap(), fs::read(&replay).unwrap());
}

#[tokio::test]
async fn test_input_is_never_modified() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("report.docx");
    write_docx(&input, &[("word/media/image1.jpg", jpeg_bytes(256, 256, 100))]);
    let before = fs::read(&input).unwrap();

    let target = TargetSize::from_bytes(file_size(&input) / 2).unwrap();
    shrinker()
        .shrink(&ShrinkRequest::new(&input, temp_dir.path().join("out.docx"), target))
        .await
        .unwrap();

    assert_eq!(fs::read(&input).unwrap(), before);
}

#[tokio::test]
async fn test_pdf_trials_start_from_original() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("slides.pdf");
    write_pdf(&input, &[(320, 240, 100)]);
    let document = Document::open(&input, None).unwrap();
    let executor = PdfTrialExecutor::prepare(&document, Arc::new(StandardCodec::new()))
        .await
        .unwrap();

    executor
        .run_trial(params(10, 0.5), &temp_dir.path().join("low.pdf"))
        .await
        .unwrap();
    let chained = temp_dir.path().join("chained.pdf");
    executor.run_trial(params(90, 0.5), &chained).await.unwrap();

    let fresh = temp_dir.path().join("fresh.pdf");
    single_trial(&input, params(90, 0.5), &fresh).await;

    assert_eq!(fs::read(chained).unwrap(), fs::read(fresh).unwrap());
}

#[tokio::test]
async fn test_container_trials_do_not_accumulate() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("report.docx");
    write_docx(&input, &[("word/media/image1.jpg", jpeg_bytes(320, 240, 100))]);
    let document = Document::open(&input, None).unwrap();
    let executor =
        ContainerTrialExecutor::prepare(&document, Arc::new(StandardCodec::new()), 4)
            .await
            .unwrap();

    executor
        .run_trial(params(15, 0.75), &temp_dir.path().join("first.docx"))
        .await
        .unwrap();
    let chained = temp_dir.path().join("chained.docx");
    executor.run_trial(params(60, 0.75), &chained).await.unwrap();

    let fresh = temp_dir.path().join("fresh.docx");
    single_trial(&input, params(60, 0.75), &fresh).await;

    assert_eq!(fs::read(chained).unwrap(), fs::read(fresh).unwrap());
}
