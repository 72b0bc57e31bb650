use super::{scaled_dimensions, EmbeddedColorSpace, EmbeddedImage, RasterCodec};
use crate::core::{ReencodeMetadata, Scale, TrialParams};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// `image` クレートによる標準的なコーデック実装
#[derive(Clone, Debug, Default)]
pub struct StandardCodec;

impl StandardCodec {
    pub fn new() -> Self {
        Self
    }
}

/// 倍率が1未満ならLanczos3でリサンプリングする
pub fn resample(image: DynamicImage, scale: Scale) -> (DynamicImage, bool) {
    if scale.is_full() {
        return (image, false);
    }
    let (width, height) = scaled_dimensions(image.width(), image.height(), scale);
    (image.resize_exact(width, height, FilterType::Lanczos3), true)
}

/// JPEGエンコード。グレースケールは8bit輝度、それ以外は8bit RGBに揃える
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<(Vec<u8>, EmbeddedColorSpace)> {
    let quality = quality.clamp(1, 100);
    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    let color_space = if image.color().has_color() {
        let rgb = image.to_rgb8();
        encoder
            .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .context("JPEGエンコードに失敗")?;
        EmbeddedColorSpace::Rgb
    } else {
        let luma = image.to_luma8();
        encoder
            .write_image(luma.as_raw(), luma.width(), luma.height(), ExtendedColorType::L8)
            .context("JPEGエンコードに失敗")?;
        EmbeddedColorSpace::Gray
    };

    Ok((buffer, color_space))
}

/// PNGエンコード（最大圧縮 + 適応フィルタ）。品質パラメータは使わない
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buffer, CompressionType::Best, PngFilterType::Adaptive);
    encoder
        .write_image(
            image.as_bytes(),
            image.width(),
            image.height(),
            image.color().into(),
        )
        .context("PNGエンコードに失敗")?;
    Ok(buffer)
}

/// バイト列を検出したフォーマットのまま再エンコードする
pub fn reencode_bytes(data: &[u8], params: TrialParams) -> Result<(Vec<u8>, ReencodeMetadata)> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .context("画像フォーマットの判定に失敗")?;
    let format = reader.format();
    let image = reader.decode().context("画像のデコードに失敗")?;

    let original_dimensions = (image.width(), image.height());
    let (image, was_resized) = resample(image, params.scale);

    let encoded = match format {
        Some(ImageFormat::Jpeg) => encode_jpeg(&image, params.quality)?.0,
        Some(ImageFormat::Png) => {
            let encoded = encode_png(&image)?;
            // パレットPNGはトゥルーカラー化で大きくなりうるので元のまま残す
            if encoded.len() >= data.len() {
                let metadata = ReencodeMetadata {
                    original_bytes: data.len() as u64,
                    encoded_bytes: data.len() as u64,
                    original_dimensions,
                    final_dimensions: original_dimensions,
                    was_resized: false,
                };
                return Ok((data.to_vec(), metadata));
            }
            encoded
        }
        other => bail!("未対応の画像フォーマット: {other:?}"),
    };

    let metadata = ReencodeMetadata {
        original_bytes: data.len() as u64,
        encoded_bytes: encoded.len() as u64,
        original_dimensions,
        final_dimensions: (image.width(), image.height()),
        was_resized,
    };
    Ok((encoded, metadata))
}

/// ファイルを読み込み、再エンコードして同じパスに書き戻す
pub fn reencode_in_place(path: &Path, params: TrialParams) -> Result<ReencodeMetadata> {
    let data =
        std::fs::read(path).with_context(|| format!("読み込みに失敗: {}", path.display()))?;
    let (encoded, metadata) = reencode_bytes(&data, params)
        .with_context(|| format!("再エンコードに失敗: {}", path.display()))?;
    if encoded != data {
        std::fs::write(path, encoded)
            .with_context(|| format!("書き込みに失敗: {}", path.display()))?;
    }
    Ok(metadata)
}

#[async_trait]
impl RasterCodec for StandardCodec {
    async fn reencode_file(&self, path: &Path, params: TrialParams) -> Result<ReencodeMetadata> {
        tokio::task::spawn_blocking({
            let path = path.to_path_buf();
            move || reencode_in_place(&path, params)
        })
        .await
        .context("Failed to spawn blocking task for image re-encoding")?
    }

    fn encode_embedded(&self, image: &DynamicImage, params: TrialParams) -> Result<EmbeddedImage> {
        let (image, _) = resample(image.clone(), params.scale);
        let (data, color_space) = encode_jpeg(&image, params.quality)?;
        Ok(EmbeddedImage {
            data,
            width: image.width(),
            height: image.height(),
            color_space,
        })
    }
}
