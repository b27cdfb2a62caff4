//! テクスチャ管理（Infrastructure層）
//!
//! エンジン側テクスチャの確保・再利用と、推論入力画像への変換。
//! - 同一寸法・フォーマットならテクスチャ再利用
//! - 寸法変更時のみ再割り当て

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::{CameraImage, EngineImage, PixelFormat, TextureId};

/// プロセス内で一意なテクスチャIDの採番
static NEXT_TEXTURE_ID: AtomicU64 = AtomicU64::new(1);

fn allocate_texture_id() -> TextureId {
    TextureId(NEXT_TEXTURE_ID.fetch_add(1, Ordering::Relaxed))
}

/// エンジン側テクスチャの代理
///
/// 実エンジンではGPUリソースに相当する。寸法・フォーマットと
/// 直近に転写されたピクセル列を保持する。
#[derive(Debug)]
pub struct Texture {
    id: TextureId,
    width: u32,
    height: u32,
    format: PixelFormat,
    pixels: Vec<u8>,
}

impl Texture {
    fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        Self {
            id: allocate_texture_id(),
            width,
            height,
            format,
            pixels: vec![0u8; len],
        }
    }

    pub fn id(&self) -> TextureId {
        self.id
    }

    fn matches(&self, width: u32, height: u32, format: PixelFormat) -> bool {
        self.width == width && self.height == height && self.format == format
    }

    /// ピクセル列を上書き転写する
    ///
    /// 長さが一致しない転写は破棄する（確保時に寸法を固定しているため
    /// 通常は到達しない）。
    fn write_pixels(&mut self, pixels: &[u8]) {
        if pixels.len() == self.pixels.len() {
            self.pixels.copy_from_slice(pixels);
        } else {
            tracing::warn!(
                "Texture write skipped: pixel length {} does not match texture {}",
                pixels.len(),
                self.pixels.len()
            );
        }
    }
}

/// テクスチャ確保・再利用マネージャ
///
/// 寸法とフォーマットが同じ間は既存テクスチャへ上書き転写し、
/// リソースの再割り当てを最小化する。
pub struct TextureStaging {
    texture: Option<Texture>,
    realloc_count: u64,
}

impl TextureStaging {
    /// 新しいテクスチャマネージャを作成
    pub fn new() -> Self {
        Self {
            texture: None,
            realloc_count: 0,
        }
    }

    /// カメラ画像をテクスチャへ転写する
    ///
    /// # Arguments
    /// - `image`: 転写元のカメラ画像（呼び出し側で検証済みであること）
    ///
    /// # Returns
    /// 転写先テクスチャのID（再割り当て時は新しいID、それ以外は既存のID）
    pub fn upload(&mut self, image: &CameraImage) -> TextureId {
        let reusable = self
            .texture
            .as_ref()
            .is_some_and(|t| t.matches(image.width, image.height, image.format));

        if !reusable {
            // 寸法またはフォーマットが変わった場合のみ再割り当て
            self.texture = None;
            self.realloc_count += 1;
            tracing::debug!(
                "Texture allocated: {}x{} ({:?}), allocation #{}",
                image.width,
                image.height,
                image.format,
                self.realloc_count
            );
        }

        let texture = self
            .texture
            .get_or_insert_with(|| Texture::new(image.width, image.height, image.format));
        texture.write_pixels(&image.pixels);
        texture.id()
    }

    /// 現在のテクスチャのピクセル列を読み戻し、そのまま再転写する
    ///
    /// 転写とエンジン読み出しの間にピクセルストアが陳腐化しうるため、
    /// 送信前に毎回行う。
    ///
    /// # Returns
    /// - `true`: 再転写を行った
    /// - `false`: テクスチャ未確保のため何もしなかった
    pub fn refresh(&mut self) -> bool {
        let Some(texture) = self.texture.as_mut() else {
            return false;
        };
        let snapshot = texture.pixels.clone();
        texture.write_pixels(&snapshot);
        true
    }

    /// テクスチャを解放する
    ///
    /// ストリーム停止時に呼ぶ。次の転写で再割り当てされる。
    pub fn release(&mut self) {
        if self.texture.take().is_some() {
            tracing::debug!("Texture released");
        }
    }

    /// 現在のテクスチャからエンジン画像スナップショットを作成
    ///
    /// ピクセル列はコピーされ、以降の転写の影響を受けない。
    ///
    /// # Returns
    /// - `Some(EngineImage)`: 転写済みテクスチャが存在する場合
    /// - `None`: まだ一度も転写されていない場合
    pub fn engine_image(&self) -> Option<EngineImage> {
        let texture = self.texture.as_ref()?;
        Some(EngineImage::new(
            texture.id,
            texture.width,
            texture.height,
            texture.format,
            Arc::from(texture.pixels.as_slice()),
        ))
    }

    /// 現在のテクスチャID
    pub fn current_id(&self) -> Option<TextureId> {
        self.texture.as_ref().map(|t| t.id)
    }

    /// これまでの再割り当て回数
    #[allow(dead_code)]
    pub fn realloc_count(&self) -> u64 {
        self.realloc_count
    }
}

impl Default for TextureStaging {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(width: u32, height: u32, format: PixelFormat, fill: u8) -> CameraImage {
        let len = width as usize * height as usize * format.bytes_per_pixel();
        CameraImage::new(width, height, format, vec![fill; len])
    }

    #[test]
    fn test_same_dimensions_reuse_texture() {
        let mut staging = TextureStaging::new();

        let first = staging.upload(&image(4, 4, PixelFormat::Rgb888, 1));
        let second = staging.upload(&image(4, 4, PixelFormat::Rgb888, 2));

        assert_eq!(first, second);
        assert_eq!(staging.realloc_count(), 1);
    }

    #[test]
    fn test_dimension_change_reallocates() {
        let mut staging = TextureStaging::new();

        let first = staging.upload(&image(4, 4, PixelFormat::Rgb888, 1));
        let second = staging.upload(&image(8, 4, PixelFormat::Rgb888, 1));

        assert_ne!(first, second);
        assert_eq!(staging.realloc_count(), 2);
    }

    #[test]
    fn test_format_change_reallocates() {
        let mut staging = TextureStaging::new();

        let first = staging.upload(&image(4, 4, PixelFormat::Rgb888, 1));
        let second = staging.upload(&image(4, 4, PixelFormat::Rgba8888, 1));

        assert_ne!(first, second);
        assert_eq!(staging.realloc_count(), 2);
    }

    #[test]
    fn test_reuse_overwrites_pixels() {
        let mut staging = TextureStaging::new();

        staging.upload(&image(2, 2, PixelFormat::Grayscale8, 7));
        staging.upload(&image(2, 2, PixelFormat::Grayscale8, 9));

        let engine = staging.engine_image().unwrap();
        assert!(engine.pixels.iter().all(|&b| b == 9));
    }

    #[test]
    fn test_engine_image_before_upload_is_none() {
        let staging = TextureStaging::new();
        assert!(staging.engine_image().is_none());
    }

    #[test]
    fn test_engine_image_snapshot_is_independent() {
        let mut staging = TextureStaging::new();

        staging.upload(&image(2, 2, PixelFormat::Grayscale8, 1));
        let snapshot = staging.engine_image().unwrap();
        staging.upload(&image(2, 2, PixelFormat::Grayscale8, 2));

        // スナップショットは後続の転写の影響を受けない
        assert!(snapshot.pixels.iter().all(|&b| b == 1));
    }

    #[test]
    fn test_texture_ids_are_unique_across_instances() {
        let mut a = TextureStaging::new();
        let mut b = TextureStaging::new();

        let id_a = a.upload(&image(2, 2, PixelFormat::Rgb888, 0));
        let id_b = b.upload(&image(2, 2, PixelFormat::Rgb888, 0));

        assert_ne!(id_a, id_b);
    }

    #[test]
    fn test_refresh_keeps_texture_and_pixels() {
        let mut staging = TextureStaging::new();

        let id = staging.upload(&image(2, 2, PixelFormat::Grayscale8, 5));
        assert!(staging.refresh());

        assert_eq!(staging.current_id(), Some(id));
        let engine = staging.engine_image().unwrap();
        assert!(engine.pixels.iter().all(|&b| b == 5));
    }

    #[test]
    fn test_refresh_without_texture_is_noop() {
        let mut staging = TextureStaging::new();
        assert!(!staging.refresh());
    }

    #[test]
    fn test_release_drops_texture() {
        let mut staging = TextureStaging::new();

        staging.upload(&image(2, 2, PixelFormat::Rgb888, 1));
        staging.release();

        assert!(staging.current_id().is_none());
        assert!(staging.engine_image().is_none());

        // 解放後の転写は再割り当てになる
        staging.upload(&image(2, 2, PixelFormat::Rgb888, 1));
        assert_eq!(staging.realloc_count(), 2);
    }
}
