/// Image preprocessing for dashboard inference.
///
/// Uploaded bytes (PNG/JPEG/BMP/GIF) are decoded, resized to the model's
/// input geometry and scaled to `[0, 1]`. Normalization with the model's
/// mean/std happens later, inside `LoadedModel::predict`.

use image::imageops::FilterType;

/// Decodes `bytes` and returns a flat, channel-major input of length
/// `channels * width * height`.
///
/// `channels` must be 1 (grayscale) or 3 (RGB planes: all R, then all G,
/// then all B).
pub fn image_bytes_to_input(
    bytes: &[u8],
    channels: usize,
    width: u32,
    height: u32,
) -> Result<Vec<f64>, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    match channels {
        1 => {
            let gray = resized.to_luma8();
            Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
        }
        3 => {
            let rgb = resized.to_rgb8();
            Ok((0..3)
                .flat_map(|c| rgb.pixels().map(move |p| p.0[c] as f64 / 255.0))
                .collect())
        }
        n => Err(format!("unsupported channel count {}", n)),
    }
}
