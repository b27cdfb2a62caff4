/// コア型定義
///
/// Domain層の中心となるデータ構造。
/// Tickごとの処理で共有される不変の型。

use std::sync::Arc;

use glam::Vec3;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// カメラストリームのピクセルフォーマット
///
/// ARセッションに登録するフォーマット。登録済みフォーマットの
/// フレームのみがストリームから供給される。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// RGB 24bit（3バイト/ピクセル）
    #[default]
    Rgb888,
    /// RGBA 32bit（4バイト/ピクセル）
    Rgba8888,
    /// グレースケール 8bit（1バイト/ピクセル）
    Grayscale8,
}

impl PixelFormat {
    /// 1ピクセルあたりのバイト数
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            Self::Rgb888 => 3,
            Self::Rgba8888 => 4,
            Self::Grayscale8 => 1,
        }
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgb888 => "rgb888",
            Self::Rgba8888 => "rgba8888",
            Self::Grayscale8 => "grayscale8",
        }
    }
}

/// ARセッションから供給される生のカメラ画像
///
/// 1Tickに1回取得され、同じTick内でトラッカーへ引き渡される一時データ。
/// 次のTickで上書きされるため保持しない。
#[derive(Debug, Clone)]
pub struct CameraImage {
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
    /// ピクセルフォーマット
    pub format: PixelFormat,
    /// ピクセルデータ（連続メモリ、長さは width * height * bytes_per_pixel）
    pub pixels: Vec<u8>,
}

impl CameraImage {
    /// 新しいカメラ画像を作成
    #[allow(dead_code)]
    pub fn new(width: u32, height: u32, format: PixelFormat, pixels: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            pixels,
        }
    }

    /// 宣言されたフォーマットに対する期待バイト数
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }

    /// 画像が有効か判定
    ///
    /// 幅・高さが0、またはピクセル長がフォーマットと一致しない画像は
    /// 無効（デバイス再構成中など）。無効な画像はそのTickでは「フレームなし」
    /// として扱われる。
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && self.pixels.len() == self.expected_len()
    }
}

/// エンジン側テクスチャリソースの識別子
///
/// 再割り当てが起きたかどうかをIDの変化で追跡できる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// 推論エンジンへ渡すエンジンネイティブ形式の画像
///
/// コピー元テクスチャのIDと寸法、スナップショット時点のピクセル列を持つ。
/// ピクセル列はArc共有で、ワーカースレッドへの引き渡しが安価。
#[derive(Debug, Clone)]
pub struct EngineImage {
    /// コピー元テクスチャの識別子
    pub texture: TextureId,
    /// 画像の幅
    pub width: u32,
    /// 画像の高さ
    pub height: u32,
    /// ピクセルフォーマット
    pub format: PixelFormat,
    /// スナップショットされたピクセルデータ
    pub pixels: Arc<[u8]>,
}

impl EngineImage {
    /// テクスチャスナップショットから作成
    pub fn new(
        texture: TextureId,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixels: Arc<[u8]>,
    ) -> Self {
        Self {
            texture,
            width,
            height,
            format,
            pixels,
        }
    }
}

/// 検出されたハンドランドマーク1点（正規化画像座標）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// 1回の推論完了で得られる検出結果
///
/// 完了コールバック経由で非同期に届く。保持されるのは常に「最後に完了した」
/// 結果のみで、タイムスタンプ順は保証されない（到着順で上書き）。
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    /// 対応する送信タイムスタンプ（ミリ秒、トラッカーの単調クロック基準）
    pub timestamp_ms: i64,
    /// 検出された手ごとのランドマーク列（手が検出されなければ空）
    pub hands: Vec<Vec<Landmark>>,
}

impl DetectionResult {
    /// 検出なしの結果を作成
    pub fn none(timestamp_ms: i64) -> Self {
        Self {
            timestamp_ms,
            hands: Vec::new(),
        }
    }

    /// 1つの手を検出した結果を作成
    pub fn with_hand(timestamp_ms: i64, landmarks: Vec<Landmark>) -> Self {
        Self {
            timestamp_ms,
            hands: vec![landmarks],
        }
    }

    /// 非空のランドマーク列を持つ手が存在するか
    pub fn has_hand(&self) -> bool {
        self.hands.iter().any(|hand| !hand.is_empty())
    }
}

/// ARセッションが追跡する器具の3D姿勢
///
/// Tickごとに読み取られる入力。forwardはSDK契約上単位ベクトル。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentPose {
    /// ワールド座標系での位置
    pub position: Vec3,
    /// 器具の前方方向（単位ベクトル）
    pub forward: Vec3,
}

impl InstrumentPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }
}

/// 器具カテゴリ
///
/// カテゴリごとに固定のワールド基準軸が定義される。
/// 軸とのなす角（内積）で正しい持ち方の向きを判定する。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    /// ハサミ類: 垂直上向き（+Y）が正位
    #[default]
    Scissors,
    /// メス類: 水平前向き（+Z）が正位
    Scalpel,
}

impl InstrumentKind {
    /// カテゴリに対応する固定の基準軸
    pub fn reference_axis(&self) -> Vec3 {
        match self {
            Self::Scissors => Vec3::Y,
            Self::Scalpel => Vec3::Z,
        }
    }

    #[allow(dead_code)]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scissors => "scissors",
            Self::Scalpel => "scalpel",
        }
    }
}

/// ガイダンス表示の状態
///
/// 1器具セッションにつき常にちょうど1つがアクティブ。
/// 遷移は一方向のみ（HandAligned到達後にGripGuidanceへ戻ることはない）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AlignmentState {
    /// 初期状態: 把持位置ガイドと手のゴースト表示
    #[default]
    GripGuidance,
    /// 手の整列が確認され、遅延遷移が発火した後の状態
    HandAligned,
    /// ユーザー操作で開始される向き確認モード（開始後は解除されない）
    OrientationCheck,
}

/// 向き判定の結果
///
/// OrientationCheck中に毎Tick再計算される。Tickをまたいでキャッシュしない。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationVerdict {
    /// 基準軸とほぼ平行（dot > threshold）
    Correct,
    /// 要調整
    Incorrect,
}

impl OrientationVerdict {
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Correct)
    }
}

/// 手のゴースト表示に適用するマテリアル
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GhostMaterial {
    /// 未整列（青系ゴースト）
    Neutral,
    /// 整列済み（緑系ゴースト）
    Aligned,
}

/// 方向インジケーター（シャフト＋矢頭2つ）に適用する色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowColor {
    /// 正しい向き（緑）
    Correct,
    /// 要調整（赤）
    NeedsAdjustment,
}
