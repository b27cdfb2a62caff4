/// Port定義（Clean Architectureのインターフェース）
///
/// Domain層が外部実装に依存するための抽象trait。
/// Infrastructure層がこれらを実装し、Application層がDIで注入する。
use std::sync::Arc;

use crossbeam_channel::Receiver;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::domain::{
    ArrowColor, CameraImage, DetectionResult, DomainError, DomainResult, EngineImage,
    GhostMaterial, InstrumentPose, PixelFormat,
};

/// ARセッションのライフサイクルイベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// カメラストリームが開始した（フォーマット登録のタイミング）
    Started,
    /// カメラストリームが停止した（フォーマット解除のタイミング）
    Stopped,
}

/// ライフサイクル購読ハンドル
///
/// `ArSessionPort::subscribe_lifecycle()` が返す受信側。
/// このハンドルをdropすると購読は自動的に解除される（送信側が切断を検知する）。
/// 解除漏れを型で防ぐため、生のReceiverは公開しない。
pub struct LifecycleEvents {
    rx: Receiver<LifecycleEvent>,
}

impl LifecycleEvents {
    /// 受信チャネルから購読ハンドルを構築する（Infrastructure層向け）
    pub fn from_receiver(rx: Receiver<LifecycleEvent>) -> Self {
        Self { rx }
    }

    /// 溜まっているイベントを1件取り出す（ノンブロッキング）
    ///
    /// # Returns
    /// - `Some(event)`: 未処理のイベントがあった
    /// - `None`: イベントなし、または送信側が切断済み
    pub fn try_next(&self) -> Option<LifecycleEvent> {
        self.rx.try_recv().ok()
    }
}

/// ARセッションポート: カメラフィードと機器トラッキングを抽象化
#[allow(dead_code)]
pub trait ArSessionPort: Send {
    /// ライフサイクルイベントの購読を開始する
    ///
    /// 返されたハンドルの生存期間が購読期間。dropで解除される。
    fn subscribe_lifecycle(&mut self) -> LifecycleEvents;

    /// カメラフレームのピクセルフォーマット登録を設定/解除する
    ///
    /// # Arguments
    /// - `format`: 要求するピクセルフォーマット
    /// - `enable`: true=登録、false=解除
    ///
    /// # Returns
    /// - `true`: セッションがフォーマットを受理した
    /// - `false`: 非対応フォーマット等で拒否された
    fn set_frame_format(&mut self, format: PixelFormat, enable: bool) -> bool;

    /// 最新のカメラフレームを取得する
    ///
    /// # Returns
    /// - `Some(image)`: 新しいフレームが利用可能
    /// - `None`: フレーム未着（セッション起動直後など）
    fn current_frame(&mut self) -> Option<CameraImage>;

    /// トラッキング中の機器の現在姿勢を取得する
    ///
    /// # Returns
    /// - `Some(pose)`: 機器がトラッキングされている
    /// - `None`: 機器がロスト中
    fn instrument_pose(&self) -> Option<InstrumentPose>;
}

/// 推論デリゲート（実行デバイスの指定）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Delegate {
    /// CPU実行
    Cpu,
    /// GPU実行（モバイルARでの推奨構成）
    Gpu,
}

/// ランドマーカーの実行モード
///
/// カメラストリームを逐次処理するため、本システムはライブストリームのみ扱う。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningMode {
    /// 連続フレーム入力・非同期コールバック返却
    LiveStream,
}

/// 検出結果コールバック
///
/// 推論ワーカースレッドから呼ばれるため `Send + Sync` を要求する。
pub type DetectionCallback = Arc<dyn Fn(DetectionResult) + Send + Sync>;

/// 手ランドマーク推論エンジンの構築オプション
#[derive(Clone)]
pub struct HandLandmarkerOptions {
    /// モデルアセットのバイト列（空は構成エラー）
    pub model_asset: Vec<u8>,
    /// 実行デリゲート
    pub delegate: Delegate,
    /// 実行モード
    pub running_mode: RunningMode,
    /// 同時検出する手の最大数
    pub num_hands: u32,
    /// 手検出の最小信頼度 [0.0, 1.0]
    pub min_detection_confidence: f32,
    /// 手存在判定の最小信頼度 [0.0, 1.0]
    pub min_presence_confidence: f32,
    /// トラッキング継続の最小信頼度 [0.0, 1.0]
    pub min_tracking_confidence: f32,
}

#[allow(dead_code)]
impl HandLandmarkerOptions {
    /// 信頼度しきい値のデフォルト値
    pub const DEFAULT_CONFIDENCE: f32 = 0.5;
    /// 同時検出数のデフォルト値（本システムは片手のみ扱う）
    pub const DEFAULT_NUM_HANDS: u32 = 1;

    /// モデルアセットを指定してデフォルト構成を作成する
    pub fn with_model(model_asset: Vec<u8>) -> Self {
        Self {
            model_asset,
            delegate: Delegate::Gpu,
            running_mode: RunningMode::LiveStream,
            num_hands: Self::DEFAULT_NUM_HANDS,
            min_detection_confidence: Self::DEFAULT_CONFIDENCE,
            min_presence_confidence: Self::DEFAULT_CONFIDENCE,
            min_tracking_confidence: Self::DEFAULT_CONFIDENCE,
        }
    }

    /// オプションの妥当性を検証する
    ///
    /// # Returns
    /// - `Ok(())`: 全項目が有効
    /// - `Err(DomainError::Configuration)`: モデル未指定または範囲外の値
    pub fn validate(&self) -> DomainResult<()> {
        if self.model_asset.is_empty() {
            return Err(DomainError::Configuration(
                "model asset is empty; hand tracking cannot start".to_string(),
            ));
        }
        if self.num_hands == 0 {
            return Err(DomainError::Configuration(
                "num_hands must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            ("min_detection_confidence", self.min_detection_confidence),
            ("min_presence_confidence", self.min_presence_confidence),
            ("min_tracking_confidence", self.min_tracking_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::Configuration(format!(
                    "{} must be within [0.0, 1.0], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// ランドマーク推論ポート: 非同期推論エンジンを抽象化
///
/// 実装は内部にワーカーを持ち、submitは即座に返る。
/// 結果は構築時に渡したコールバック経由で通知される。
#[allow(dead_code)]
pub trait LandmarkerPort: Send {
    /// フレームを推論キューへ投入する
    ///
    /// キューが埋まっている場合は古いフレームを破棄して最新を優先する。
    ///
    /// # Arguments
    /// - `image`: エンジンネイティブ形式の入力画像
    /// - `timestamp_ms`: フレームの単調タイムスタンプ（ミリ秒）
    ///
    /// # Returns
    /// - `Ok(())`: 投入成功（古いフレームの破棄を含む）
    /// - `Err(DomainError::Inference)`: ワーカー停止済み
    fn submit(&mut self, image: EngineImage, timestamp_ms: i64) -> DomainResult<()>;
}

/// 提示シーンポート: オーバーレイ描画を抽象化
///
/// 全操作は冪等なsetterであり失敗しない。
/// コアはシーンの状態を読み戻さない（書き込み専用）。
#[allow(dead_code)]
pub trait ScenePort: Send {
    /// 把持ゾーンインジケーターの表示/非表示
    fn set_grip_zone_visible(&mut self, visible: bool);

    /// 手ゴーストの表示/非表示
    fn set_hand_ghost_visible(&mut self, visible: bool);

    /// 手ゴーストのマテリアル切り替え
    fn set_hand_ghost_material(&mut self, material: GhostMaterial);

    /// 正解姿勢の機器モデルの表示/非表示
    fn set_oriented_instrument_visible(&mut self, visible: bool);

    /// ガイドラインの有効/無効
    fn set_guideline_enabled(&mut self, enabled: bool);

    /// ガイドラインの両端点を更新する
    fn set_guideline(&mut self, from: Vec3, to: Vec3);

    /// 方向インジケーター（シャフトと両矢頭）の色を一括更新する
    fn set_arrow_color(&mut self, color: ArrowColor);
}

/// 入力ポート: ポインター押下状態を抽象化
///
/// レベル（押しているか否か）のみを公開する。エッジ検出はApplication層の責務。
#[allow(dead_code)]
pub trait InputPort: Send + Sync {
    /// ポインターが現在押下されているか
    fn pointer_pressed(&self) -> bool;
}
