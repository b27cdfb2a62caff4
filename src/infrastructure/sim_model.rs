/// シミュレートされた手指検出モデル
///
/// 実機モデルなしで開発・テストを行うための決定論的なモデル実装。
/// 指定した経過時間までは「手なし」を返し、以降は画面中央付近に
/// 1つの手（21ランドマーク）を返し続ける。

use crate::domain::{DetectionResult, DomainResult, EngineImage, Landmark};
use crate::infrastructure::landmarker::DetectionModel;

/// 1つの手を構成するランドマーク数（手首1点 + 5指×4関節）
const LANDMARKS_PER_HAND: usize = 21;

/// シミュレートされた手指検出モデル
pub struct SimulatedHandModel {
    /// この経過時間（ミリ秒）以降のフレームで手を検出する
    hand_appear_after_ms: i64,
}

impl SimulatedHandModel {
    /// 新しいシミュレートモデルを作成
    pub fn new(hand_appear_after_ms: i64) -> Self {
        Self {
            hand_appear_after_ms,
        }
    }

    /// 合成した手のランドマークを生成
    ///
    /// 手首を下端中央に置き、5本の指を上方向に伸ばした形状。
    /// 座標は正規化済み（0.0-1.0）。
    fn synthesize_hand() -> Vec<Landmark> {
        let mut landmarks = Vec::with_capacity(LANDMARKS_PER_HAND);

        // 手首
        landmarks.push(Landmark::new(0.5, 0.8, 0.0));

        // 5指 × 4関節（付け根から指先へ）
        for finger in 0..5 {
            let base_x = 0.3 + finger as f32 * 0.1;
            for joint in 0..4 {
                let t = (joint + 1) as f32 / 4.0;
                landmarks.push(Landmark::new(base_x, 0.8 - t * 0.5, -0.01 * t));
            }
        }

        landmarks
    }
}

impl DetectionModel for SimulatedHandModel {
    fn detect(&mut self, _image: &EngineImage, timestamp_ms: i64) -> DomainResult<DetectionResult> {
        if timestamp_ms >= self.hand_appear_after_ms {
            Ok(DetectionResult::with_hand(
                timestamp_ms,
                Self::synthesize_hand(),
            ))
        } else {
            Ok(DetectionResult::none(timestamp_ms))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PixelFormat, TextureId};
    use std::sync::Arc;

    fn test_image() -> EngineImage {
        EngineImage::new(
            TextureId(7),
            4,
            4,
            PixelFormat::Rgb888,
            Arc::from(vec![0u8; 48].as_slice()),
        )
    }

    #[test]
    fn test_no_hand_before_appearance_time() {
        let mut model = SimulatedHandModel::new(500);
        let result = model.detect(&test_image(), 499).unwrap();
        assert!(!result.has_hand());
        assert_eq!(result.timestamp_ms, 499);
    }

    #[test]
    fn test_hand_appears_at_threshold() {
        let mut model = SimulatedHandModel::new(500);
        let result = model.detect(&test_image(), 500).unwrap();
        assert!(result.has_hand());
        assert_eq!(result.hands.len(), 1);
        assert_eq!(result.hands[0].len(), LANDMARKS_PER_HAND);
    }

    #[test]
    fn test_landmarks_are_normalized() {
        let mut model = SimulatedHandModel::new(0);
        let result = model.detect(&test_image(), 100).unwrap();
        for landmark in &result.hands[0] {
            assert!((0.0..=1.0).contains(&landmark.x));
            assert!((0.0..=1.0).contains(&landmark.y));
        }
    }

    #[test]
    fn test_zero_delay_detects_immediately() {
        let mut model = SimulatedHandModel::new(0);
        let result = model.detect(&test_image(), 0).unwrap();
        assert!(result.has_hand());
    }
}
