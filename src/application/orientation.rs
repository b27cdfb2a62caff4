//! 器具向き判定（Application層）
//!
//! 器具カテゴリごとの固定基準軸と、前方ベクトルとの内積による判定。

use glam::Vec3;

use crate::domain::{InstrumentKind, InstrumentPose, OrientationVerdict};

/// 向き判定プロファイル
///
/// 器具カテゴリから基準軸を、設定からしきい値を確定させた判定器。
/// セッション中は不変で、Tickごとに `classify()` を呼び出す。
#[derive(Debug, Clone, Copy)]
pub struct OrientationProfile {
    kind: InstrumentKind,
    reference_axis: Vec3,
    threshold: f32,
}

impl OrientationProfile {
    /// カテゴリとしきい値からプロファイルを作成
    pub fn new(kind: InstrumentKind, threshold: f32) -> Self {
        Self {
            kind,
            reference_axis: kind.reference_axis(),
            threshold,
        }
    }

    #[allow(dead_code)]
    pub fn kind(&self) -> InstrumentKind {
        self.kind
    }

    #[allow(dead_code)]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// 現在の姿勢を判定する
    ///
    /// 前方ベクトル（単位ベクトル前提）と基準軸の内積がしきい値を
    /// 厳密に超えた場合のみ正位。しきい値ちょうどは要調整側に倒す。
    pub fn classify(&self, pose: &InstrumentPose) -> OrientationVerdict {
        let dot = pose.forward.dot(self.reference_axis);
        if dot > self.threshold {
            OrientationVerdict::Correct
        } else {
            OrientationVerdict::Incorrect
        }
    }
}
