use crate::core::{ReencodeMetadata, Scale, TrialParams};
use anyhow::Result;
use async_trait::async_trait;
use image::DynamicImage;
use mockall::automock;
use std::path::Path;

pub mod pdf;
pub mod standard;

/// 再エンコード対象のラスタ画像拡張子（大文字小文字は区別しない）
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// 拡張子が対象のラスタ形式かどうか
pub fn is_supported_raster(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// 倍率適用後のピクセルサイズ（各辺最低1ピクセル）
pub fn scaled_dimensions(width: u32, height: u32, scale: Scale) -> (u32, u32) {
    let factor = scale.factor();
    let scale_side = |side: u32| ((f64::from(side) * factor).round() as u32).max(1);
    (scale_side(width), scale_side(height))
}

/// PDF埋め込み画像の色空間
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedColorSpace {
    Rgb,
    Gray,
}

impl EmbeddedColorSpace {
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Rgb => "DeviceRGB",
            Self::Gray => "DeviceGray",
        }
    }
}

/// PDFへ埋め込むためにJPEG化された画像
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: EmbeddedColorSpace,
}

/// ラスタ画像の再エンコード能力を抽象化するトレイト
#[automock]
#[async_trait]
pub trait RasterCodec: Send + Sync {
    /// ファイルを指定の品質・倍率で再エンコードして上書きする
    async fn reencode_file(&self, path: &Path, params: TrialParams) -> Result<ReencodeMetadata>;

    /// デコード済みの画像をPDF埋め込み用に再エンコードする（同期処理）
    fn encode_embedded(&self, image: &DynamicImage, params: TrialParams) -> Result<EmbeddedImage>;
}
