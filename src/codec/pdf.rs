// PDF書き換え - ページツリーから辿れる画像の再埋め込み
//
// 画像はコーデックでJPEG化し、残りのストリームは lopdf で再圧縮する。

use super::RasterCodec;
use crate::core::{BatchReport, ImageOutcome, ReencodeMetadata, TrialParams};
use anyhow::{anyhow, bail, Context, Result};
use image::{DynamicImage, GrayImage, ImageFormat, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashSet;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

const MAX_PARENT_DEPTH: usize = 32;

pub fn load_document(path: &Path) -> Result<Document> {
    Document::load(path).with_context(|| format!("PDFの解析に失敗: {}", path.display()))
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

fn resolve_dict<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Dictionary> {
    match resolve(doc, object)? {
        Object::Dictionary(dict) => Some(dict),
        Object::Stream(stream) => Some(&stream.dict),
        _ => None,
    }
}

fn name_of(object: &Object) -> Option<&[u8]> {
    match object {
        Object::Name(name) => Some(name.as_slice()),
        _ => None,
    }
}

fn integer_of(doc: &Document, dict: &Dictionary, key: &[u8]) -> Option<i64> {
    match resolve(doc, dict.get(key).ok()?)? {
        Object::Integer(value) => Some(*value),
        _ => None,
    }
}

fn filter_names(doc: &Document, dict: &Dictionary) -> Vec<Vec<u8>> {
    let Some(filter) = dict.get(b"Filter").ok().and_then(|f| resolve(doc, f)) else {
        return Vec::new();
    };
    match filter {
        Object::Name(name) => vec![name.clone()],
        Object::Array(items) => items
            .iter()
            .filter_map(|item| name_of(item).map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

fn subtype_is(dict: &Dictionary, subtype: &[u8]) -> bool {
    dict.get(b"Subtype").ok().and_then(name_of) == Some(subtype)
}

/// ページのリソース辞書（/Parent からの継承を含む）
fn page_resources(doc: &Document, page_id: ObjectId) -> Option<&Dictionary> {
    let mut node = doc.get_dictionary(page_id).ok();
    for _ in 0..MAX_PARENT_DEPTH {
        let dict = node?;
        if let Some(resources) = dict.get(b"Resources").ok().and_then(|r| resolve_dict(doc, r)) {
            return Some(resources);
        }
        node = dict
            .get(b"Parent")
            .ok()
            .and_then(|parent| parent.as_reference().ok())
            .and_then(|id| doc.get_dictionary(id).ok());
    }
    None
}

fn collect_from_resources(
    doc: &Document,
    resources: &Dictionary,
    visited: &mut HashSet<ObjectId>,
    images: &mut Vec<ObjectId>,
) {
    let Some(xobjects) = resources.get(b"XObject").ok().and_then(|x| resolve_dict(doc, x)) else {
        return;
    };

    for (_, entry) in xobjects.iter() {
        let Object::Reference(id) = entry else {
            continue;
        };
        if !visited.insert(*id) {
            continue;
        }
        let Ok(Object::Stream(stream)) = doc.get_object(*id) else {
            continue;
        };

        if subtype_is(&stream.dict, b"Image") {
            images.push(*id);
        } else if subtype_is(&stream.dict, b"Form") {
            // フォームXObject内の画像も対象
            if let Some(inner) = stream
                .dict
                .get(b"Resources")
                .ok()
                .and_then(|r| resolve_dict(doc, r))
            {
                collect_from_resources(doc, inner, visited, images);
            }
        }
    }
}

/// 全ページから到達できる画像XObjectのID（重複なし、ページ順）
pub fn collect_image_ids(doc: &Document) -> Vec<ObjectId> {
    let mut visited = HashSet::new();
    let mut images = Vec::new();
    for page_id in doc.get_pages().into_values() {
        if let Some(resources) = page_resources(doc, page_id) {
            collect_from_resources(doc, resources, &mut visited, &mut images);
        }
    }
    images
}

pub fn page_count(doc: &Document) -> usize {
    doc.get_pages().len()
}

/// 色空間からチャンネル数を求める（DeviceRGB / DeviceGray / ICCBased のみ）
fn color_channels(doc: &Document, dict: &Dictionary) -> Result<u32> {
    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|cs| resolve(doc, cs))
        .ok_or_else(|| anyhow!("ColorSpace がありません"))?;

    match color_space {
        Object::Name(name) if name == b"DeviceRGB" => Ok(3),
        Object::Name(name) if name == b"DeviceGray" => Ok(1),
        Object::Array(items) if items.first().and_then(name_of) == Some(&b"ICCBased"[..]) => {
            let profile = items
                .get(1)
                .and_then(|p| resolve_dict(doc, p))
                .ok_or_else(|| anyhow!("ICCプロファイルを解決できません"))?;
            match integer_of(doc, profile, b"N") {
                Some(3) => Ok(3),
                Some(1) => Ok(1),
                other => bail!("未対応のICCBasedチャンネル数: {other:?}"),
            }
        }
        other => bail!("未対応の色空間: {other:?}"),
    }
}

fn decode_raw_image(doc: &Document, stream: &Stream, raw: Vec<u8>) -> Result<DynamicImage> {
    let dict = &stream.dict;
    let width = integer_of(doc, dict, b"Width").unwrap_or(0);
    let height = integer_of(doc, dict, b"Height").unwrap_or(0);
    if width <= 0 || height <= 0 {
        bail!("画像サイズが不正です: {width}x{height}");
    }
    let bits = integer_of(doc, dict, b"BitsPerComponent").unwrap_or(0);
    if bits != 8 {
        bail!("未対応のビット深度: {bits}");
    }

    let (width, height) = (width as u32, height as u32);
    let channels = color_channels(doc, dict)?;
    let expected = (width as usize) * (height as usize) * (channels as usize);
    if raw.len() < expected {
        bail!("画像データが不足しています: {} < {expected}", raw.len());
    }
    let pixels = raw[..expected].to_vec();

    let image = if channels == 3 {
        RgbImage::from_raw(width, height, pixels).map(DynamicImage::ImageRgb8)
    } else {
        GrayImage::from_raw(width, height, pixels).map(DynamicImage::ImageLuma8)
    };
    image.ok_or_else(|| anyhow!("ピクセルバッファの構築に失敗"))
}

/// 画像ストリームをデコードする（DCTDecode / FlateDecode / 無圧縮）
pub fn decode_image_stream(doc: &Document, stream: &Stream) -> Result<DynamicImage> {
    if let Ok(Object::Boolean(true)) = stream.dict.get(b"ImageMask") {
        bail!("ImageMask は対象外です");
    }

    let filters = filter_names(doc, &stream.dict);
    match filters.as_slice() {
        [filter] if filter == b"DCTDecode" => {
            image::load_from_memory_with_format(&stream.content, ImageFormat::Jpeg)
                .context("JPEGのデコードに失敗")
        }
        [] => decode_raw_image(doc, stream, stream.content.clone()),
        [filter] if filter == b"FlateDecode" => {
            let raw = stream
                .decompressed_content()
                .map_err(|e| anyhow!("FlateDecodeの展開に失敗: {e}"))?;
            decode_raw_image(doc, stream, raw)
        }
        other => {
            let names: Vec<String> = other
                .iter()
                .map(|f| String::from_utf8_lossy(f).to_string())
                .collect();
            bail!("未対応のフィルタ: {names:?}")
        }
    }
}

fn reencode_image<C: RasterCodec + ?Sized>(
    doc: &Document,
    codec: &C,
    id: ObjectId,
    params: TrialParams,
) -> Result<(Stream, ReencodeMetadata)> {
    let stream = match doc.get_object(id) {
        Ok(Object::Stream(stream)) => stream,
        _ => bail!("画像ストリームではありません"),
    };

    let image = decode_image_stream(doc, stream)?;
    let embedded = codec.encode_embedded(&image, params)?;

    let metadata = ReencodeMetadata {
        original_bytes: stream.content.len() as u64,
        encoded_bytes: embedded.data.len() as u64,
        original_dimensions: (image.width(), image.height()),
        final_dimensions: (embedded.width, embedded.height),
        was_resized: (image.width(), image.height()) != (embedded.width, embedded.height),
    };

    // /SMask などその他のキーは元の辞書から引き継ぐ
    let mut dict = stream.dict.clone();
    dict.set("Width", Object::Integer(i64::from(embedded.width)));
    dict.set("Height", Object::Integer(i64::from(embedded.height)));
    dict.set(
        "ColorSpace",
        Object::Name(embedded.color_space.pdf_name().as_bytes().to_vec()),
    );
    dict.set("BitsPerComponent", Object::Integer(8));
    dict.set("Filter", Object::Name(b"DCTDecode".to_vec()));
    dict.remove(b"DecodeParms");
    dict.remove(b"Decode");

    let replacement = Stream::new(dict, embedded.data).with_compression(false);
    Ok((replacement, metadata))
}

/// 全ページの画像を指定パラメータで再埋め込みする。失敗した画像はそのまま残す
pub fn rewrite_images<C: RasterCodec + ?Sized>(
    doc: &mut Document,
    codec: &C,
    params: TrialParams,
) -> BatchReport {
    let start_time = Instant::now();
    let mut outcomes = Vec::new();

    for id in collect_image_ids(doc) {
        let item = format!("{} {} R", id.0, id.1);
        match reencode_image(doc, codec, id, params) {
            Ok((replacement, metadata)) => {
                doc.objects.insert(id, Object::Stream(replacement));
                outcomes.push(ImageOutcome::Success { item, metadata });
            }
            Err(error) => {
                log::debug!("PDF画像 {item} をスキップ: {error:#}");
                outcomes.push(ImageOutcome::Failed {
                    item,
                    error: format!("{error:#}"),
                });
            }
        }
    }

    BatchReport::from_outcomes(outcomes, start_time.elapsed().as_millis() as u64)
}

/// コンテンツストリームを再圧縮して書き出し、書き込んだバイト数を返す
pub fn save_document(doc: &mut Document, output: &Path) -> Result<u64> {
    doc.compress();

    let file = std::fs::File::create(output)
        .with_context(|| format!("出力ファイルを作成できません: {}", output.display()))?;
    let mut writer = BufWriter::new(file);
    doc.save_to(&mut writer)
        .with_context(|| format!("PDFの書き込みに失敗: {}", output.display()))?;
    writer.flush()?;
    drop(writer);

    Ok(std::fs::metadata(output)?.len())
}
