// エンドツーエンド統合テスト
use crate::fixtures::*;
use doc_shrink::{
    codec::standard::StandardCodec,
    config::SearchConfig,
    core::{DocumentFormat, Scale, ShrinkOutcome, TargetSize, TrialParams},
    reporting::NoOpProgressReporter,
    shrink_document, ShrinkRequest, Shrinker,
};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

#[tokio::test]
async fn test_large_docx_image_fits_quarter_target() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("photo_report.docx");
    let output = temp_dir.path().join("photo_report_compressed.docx");
    write_docx(
        &input,
        &[("word/media/image1.jpg", jpeg_bytes(2000, 2000, 100))],
    );
    let original = file_size(&input);
    let target_mb = (original / 4) as f64 / BYTES_PER_MB;

    let report = shrink_document(&input, &output, target_mb, "docx")
        .await
        .unwrap();

    assert_eq!(report.outcome, ShrinkOutcome::TargetMet);
    assert!(report.met_target());
    let chosen = report.chosen.expect("a fitting pair should be reported");
    assert!(report.summary().starts_with("Target Met: true"));
    assert!(report.trials_run >= 1);

    // 出力は報告されたパラメータで作られたもの
    assert_eq!(file_size(&output), report.final_bytes);
    assert!(report.final_bytes <= report.target_bytes);
    let image = image::load_from_memory(&read_entry(&output, "word/media/image1.jpg")).unwrap();
    let expected_side = (2000.0 * chosen.scale.factor()).round() as u32;
    assert_eq!((image.width(), image.height()), (expected_side, expected_side));
    assert_eq!(read_entry(&output, "word/document.xml"), DOCUMENT_XML);
}

#[tokio::test]
async fn test_pdf_shrinks_below_target() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("slides.pdf");
    let output = temp_dir.path().join("slides_small.pdf");
    write_pdf(&input, &[(480, 360, 100), (360, 360, 100)]);
    let target = TargetSize::from_bytes(file_size(&input) / 2).unwrap();

    let shrinker = Shrinker::new(
        Arc::new(StandardCodec::new()),
        NoOpProgressReporter::new(),
        SearchConfig::default(),
    );
    let request = ShrinkRequest::new(&input, &output, target).with_format(DocumentFormat::Pdf);
    let report = shrinker.shrink(&request).await.unwrap();

    assert!(report.met_target());
    assert_eq!(report.image_failures, 0);
    assert_eq!(file_size(&output), report.final_bytes);

    let reloaded = lopdf::Document::load(&output).unwrap();
    assert_eq!(reloaded.get_pages().len(), 2);
}

#[tokio::test]
async fn test_xlsx_keeps_png_as_png() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("book.xlsx");
    let output = temp_dir.path().join("book_small.xlsx");
    write_xlsx(
        &input,
        &[
            ("xl/media/image1.png", png_bytes(300, 300)),
            ("xl/media/image2.jpeg", jpeg_bytes(300, 300, 100)),
        ],
    );

    let shrinker = Shrinker::new(
        Arc::new(StandardCodec::new()),
        NoOpProgressReporter::new(),
        SearchConfig::default().with_worker_count(2),
    );
    let params = TrialParams::new(40, Scale::from_factor(0.5).unwrap());
    let artifact = shrinker
        .run_single_trial(&input, None, params, &output)
        .await
        .unwrap();

    assert_eq!(artifact.images.total_files, 2);
    assert_eq!(artifact.images.succeeded, 2);
    let png = read_entry(&output, "xl/media/image1.png");
    assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (150, 150));
    assert_eq!(entry_names(&output), entry_names(&input));
}

#[tokio::test]
async fn test_target_above_original_copies_verbatim() {
    let temp_dir = TempDir::new().unwrap();
    let input = temp_dir.path().join("small.docx");
    let output = temp_dir.path().join("small_out.docx");
    write_docx(&input, &[("word/media/image1.jpg", jpeg_bytes(64, 64, 90))]);

    let report = shrink_document(&input, &output, 10.0, "docx").await.unwrap();

    assert_eq!(report.outcome, ShrinkOutcome::AlreadyUnderTarget);
    assert_eq!(report.summary(), "Already under target");
    assert_eq!(report.trials_run, 0);
    assert_eq!(report.chosen, None);
    assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());
}
