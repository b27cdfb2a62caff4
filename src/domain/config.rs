//! 設定管理
//!
//! TOML設定ファイルの読み込みとDomain型への変換。

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use glam::Vec3;

use crate::domain::{Delegate, DomainError, DomainResult, HandLandmarkerOptions, InstrumentKind, PixelFormat};

/// ランドマーク推論バックエンド
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum TrackerBackend {
    /// 決定論的なシミュレーション実装（デフォルト、実機・モデル不要）
    #[default]
    Simulated,
    /// MediaPipe Tasksによる実機推論（将来実装）
    MediapipeTask,
}

/// アプリケーション設定のルート構造
#[allow(dead_code)]
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct AppConfig {
    /// カメラフィード設定
    pub camera: CameraConfig,
    /// ハンドトラッキング設定
    pub tracker: TrackerConfig,
    /// オーバーレイガイダンス設定
    pub overlay: OverlayConfig,
    /// 器具向き判定設定
    pub orientation: OrientationConfig,
    /// セッションループ設定
    pub session: SessionConfig,
}

/// カメラフィード設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CameraConfig {
    /// ARセッションへ登録するピクセルフォーマット
    ///
    /// 選択肢: "rgb888", "rgba8888", "grayscale8"
    /// デフォルト: "rgb888"
    #[serde(default)]
    pub format: PixelFormat,

    /// カメラフレームの幅（ピクセル）
    ///
    /// スクリプトセッション（デモ実行）でのフレーム生成に使用される。
    /// 実機セッションでは実際のストリーム解像度が優先される。
    pub frame_width: u32,

    /// カメラフレームの高さ（ピクセル）
    pub frame_height: u32,
}

impl CameraConfig {
    /// デフォルトのフレーム幅（ピクセル）
    pub const DEFAULT_FRAME_WIDTH: u32 = 640;
    /// デフォルトのフレーム高さ（ピクセル）
    pub const DEFAULT_FRAME_HEIGHT: u32 = 480;
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            format: PixelFormat::default(),
            frame_width: Self::DEFAULT_FRAME_WIDTH,
            frame_height: Self::DEFAULT_FRAME_HEIGHT,
        }
    }
}

/// ハンドトラッキング設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TrackerConfig {
    /// 推論バックエンド
    ///
    /// 選択肢: "simulated" (シミュレーション), "mediapipe-task" (実機推論、将来実装)
    /// デフォルト: "simulated"
    #[serde(default)]
    pub backend: TrackerBackend,

    /// モデルアセットのファイルパス（backend = "mediapipe-task" の場合のみ有効）
    ///
    /// 空文字列または読み込み失敗の場合、トラッカーは非アクティブのまま
    /// 起動する（アプリ全体は停止しない）
    #[serde(default)]
    pub model_path: String,

    /// 推論デリゲート
    ///
    /// 選択肢: "cpu", "gpu"
    /// デフォルト: "gpu"
    pub delegate: Delegate,

    /// 同時検出する手の最大数
    ///
    /// デフォルト: 1
    pub num_hands: u32,

    /// 手検出の最小信頼度 [0.0, 1.0]
    pub min_detection_confidence: f32,

    /// 手存在判定の最小信頼度 [0.0, 1.0]
    pub min_presence_confidence: f32,

    /// トラッキング継続の最小信頼度 [0.0, 1.0]
    pub min_tracking_confidence: f32,

    /// 手が検出され始めるまでの経過時間（ミリ秒、backend = "simulated" の場合のみ有効）
    ///
    /// デフォルト: 500ms
    #[serde(default = "default_hand_appear_after_ms")]
    pub hand_appear_after_ms: i64,
}

fn default_hand_appear_after_ms() -> i64 {
    TrackerConfig::DEFAULT_HAND_APPEAR_AFTER_MS
}

impl TrackerConfig {
    /// シミュレーションで手が現れるまでのデフォルト経過時間（ミリ秒）
    pub const DEFAULT_HAND_APPEAR_AFTER_MS: i64 = 500;

    /// モデルアセットのバイト列から推論エンジンの構築オプションを組み立てる
    pub fn landmarker_options(&self, model_asset: Vec<u8>) -> HandLandmarkerOptions {
        let mut options = HandLandmarkerOptions::with_model(model_asset);
        options.delegate = self.delegate;
        options.num_hands = self.num_hands;
        options.min_detection_confidence = self.min_detection_confidence;
        options.min_presence_confidence = self.min_presence_confidence;
        options.min_tracking_confidence = self.min_tracking_confidence;
        options
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            backend: TrackerBackend::default(),
            model_path: String::new(),
            delegate: Delegate::Gpu,
            num_hands: HandLandmarkerOptions::DEFAULT_NUM_HANDS,
            min_detection_confidence: HandLandmarkerOptions::DEFAULT_CONFIDENCE,
            min_presence_confidence: HandLandmarkerOptions::DEFAULT_CONFIDENCE,
            min_tracking_confidence: HandLandmarkerOptions::DEFAULT_CONFIDENCE,
            hand_appear_after_ms: Self::DEFAULT_HAND_APPEAR_AFTER_MS,
        }
    }
}

/// オーバーレイガイダンス設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OverlayConfig {
    /// 手の整列検知から把持ゾーンを隠すまでの遅延（ミリ秒）
    ///
    /// デフォルト: 2000ms
    pub grip_hide_delay_ms: u64,

    /// 開いた手のゴーストのワールド座標 [x, y, z]（ガイドラインの終点）
    ///
    /// 省略時はガイドラインの端点更新をスキップする
    #[serde(default)]
    pub open_hand_anchor: Option<[f32; 3]>,
}

impl OverlayConfig {
    /// デフォルトの把持ゾーン非表示遅延（ミリ秒）
    pub const DEFAULT_GRIP_HIDE_DELAY_MS: u64 = 2000;

    /// 把持ゾーン非表示遅延をDurationとして取得
    pub fn grip_hide_delay(&self) -> Duration {
        Duration::from_millis(self.grip_hide_delay_ms)
    }

    /// 開いた手のアンカー座標をVec3として取得
    pub fn open_hand_anchor_vec(&self) -> Option<Vec3> {
        self.open_hand_anchor.map(Vec3::from_array)
    }
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            grip_hide_delay_ms: Self::DEFAULT_GRIP_HIDE_DELAY_MS,
            open_hand_anchor: None,
        }
    }
}

/// 器具向き判定設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrientationConfig {
    /// 判定対象の器具カテゴリ
    ///
    /// 選択肢: "scissors" (基準軸+Y), "scalpel" (基準軸+Z)
    /// デフォルト: "scissors"
    #[serde(default)]
    pub instrument: InstrumentKind,

    /// 整列判定のしきい値（基準軸との内積、これを超えたら正位）
    ///
    /// デフォルト: 0.9（約25度以内）
    pub threshold: f32,
}

impl OrientationConfig {
    /// デフォルトの整列しきい値
    pub const DEFAULT_THRESHOLD: f32 = 0.9;
}

impl Default for OrientationConfig {
    fn default() -> Self {
        Self {
            instrument: InstrumentKind::default(),
            threshold: Self::DEFAULT_THRESHOLD,
        }
    }
}

/// セッションループ設定
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SessionConfig {
    /// Tick間隔（ミリ秒）
    ///
    /// デフォルト: 16ms（約60Hz）
    pub tick_interval_ms: u64,

    /// 統計情報の出力間隔（秒）
    pub stats_interval_sec: u64,

    /// 実行の打ち切り時間（ミリ秒、デモ実行向け）
    ///
    /// 省略時は外部から停止されるまで実行を続ける
    #[serde(default)]
    pub run_duration_ms: Option<u64>,
}

impl SessionConfig {
    /// デフォルトのTick間隔（ミリ秒）
    pub const DEFAULT_TICK_INTERVAL_MS: u64 = 16;
    /// デフォルトの統計出力間隔（秒）
    pub const DEFAULT_STATS_INTERVAL_SEC: u64 = 10;

    #[allow(dead_code)]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[allow(dead_code)]
    pub fn run_duration(&self) -> Option<Duration> {
        self.run_duration_ms.map(Duration::from_millis)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: Self::DEFAULT_TICK_INTERVAL_MS,
            stats_interval_sec: Self::DEFAULT_STATS_INTERVAL_SEC,
            run_duration_ms: None,
        }
    }
}

impl AppConfig {
    /// TOMLファイルから設定を読み込む
    #[allow(dead_code)]
    pub fn from_file<P: AsRef<Path>>(path: P) -> DomainResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DomainError::Configuration(format!("Failed to read config file: {}", e))
        })?;

        toml::from_str(&content)
            .map_err(|e| DomainError::Configuration(format!("Failed to parse config file: {}", e)))
    }

    /// デフォルト設定をTOMLファイルに書き出す
    #[allow(dead_code)]
    pub fn write_default<P: AsRef<Path>>(path: P) -> DomainResult<()> {
        let config = Self::default();
        let content = toml::to_string_pretty(&config).map_err(|e| {
            DomainError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(path, content)
            .map_err(|e| DomainError::Configuration(format!("Failed to write config file: {}", e)))
    }

    /// 設定の妥当性を検証
    #[allow(dead_code)]
    pub fn validate(&self) -> DomainResult<()> {
        // カメラフレーム寸法の検証
        if self.camera.frame_width == 0 || self.camera.frame_height == 0 {
            return Err(DomainError::Configuration(
                "Camera frame width and height must be greater than 0".to_string(),
            ));
        }

        // トラッカー設定の検証
        if self.tracker.num_hands == 0 {
            return Err(DomainError::Configuration(
                "num_hands must be at least 1".to_string(),
            ));
        }
        for (name, value) in [
            (
                "min_detection_confidence",
                self.tracker.min_detection_confidence,
            ),
            (
                "min_presence_confidence",
                self.tracker.min_presence_confidence,
            ),
            (
                "min_tracking_confidence",
                self.tracker.min_tracking_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DomainError::Configuration(format!(
                    "{} must be within [0.0, 1.0]",
                    name
                )));
            }
        }
        if self.tracker.hand_appear_after_ms < 0 {
            return Err(DomainError::Configuration(
                "hand_appear_after_ms must be non-negative".to_string(),
            ));
        }

        // 向き判定しきい値の検証（単位ベクトル同士の内積の定義域）
        if !(-1.0..=1.0).contains(&self.orientation.threshold) {
            return Err(DomainError::Configuration(
                "Orientation threshold must be within [-1.0, 1.0]".to_string(),
            ));
        }

        // Tick間隔の検証
        if self.session.tick_interval_ms == 0 {
            return Err(DomainError::Configuration(
                "Tick interval must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.camera.format, PixelFormat::Rgb888);
        assert_eq!(config.overlay.grip_hide_delay_ms, 2000);
        assert_eq!(config.orientation.threshold, 0.9);
        assert_eq!(config.session.tick_interval_ms, 16);
        assert_eq!(config.tracker.backend, TrackerBackend::Simulated);
    }

    #[test]
    fn test_config_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());

        // 不正なしきい値
        config.orientation.threshold = 1.5;
        assert!(config.validate().is_err());

        config.orientation.threshold = 0.9;

        // 不正なTick間隔
        config.session.tick_interval_ms = 0;
        assert!(config.validate().is_err());

        config.session.tick_interval_ms = 16;

        // 不正な信頼度
        config.tracker.min_detection_confidence = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tracker_backend_parsing() {
        let toml = r#"backend = "mediapipe-task""#;

        #[derive(Deserialize)]
        struct Probe {
            backend: TrackerBackend,
        }

        let probe: Probe = toml::from_str(toml).unwrap();
        assert_eq!(probe.backend, TrackerBackend::MediapipeTask);
    }

    #[test]
    fn test_grip_hide_delay_duration() {
        let config = OverlayConfig {
            grip_hide_delay_ms: 1500,
            open_hand_anchor: None,
        };
        assert_eq!(config.grip_hide_delay(), Duration::from_millis(1500));
    }

    #[test]
    fn test_open_hand_anchor_conversion() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.open_hand_anchor_vec(), None);

        config.open_hand_anchor = Some([1.0, 2.0, 3.0]);
        assert_eq!(config.open_hand_anchor_vec(), Some(Vec3::new(1.0, 2.0, 3.0)));
    }

    #[test]
    fn test_landmarker_options_from_tracker_config() {
        let mut tracker = TrackerConfig::default();
        tracker.delegate = Delegate::Cpu;
        tracker.min_tracking_confidence = 0.7;

        let options = tracker.landmarker_options(vec![0xAB]);

        assert_eq!(options.delegate, Delegate::Cpu);
        assert_eq!(options.min_tracking_confidence, 0.7);
        assert_eq!(options.model_asset, vec![0xAB]);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        AppConfig::write_default(&path).unwrap();
        let config = AppConfig::from_file(&path).unwrap();

        assert!(config.validate().is_ok());
        assert_eq!(config.overlay.grip_hide_delay_ms, 2000);
    }

    #[test]
    fn test_config_loads() {
        // config.tomlが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml").expect("config.tomlが読み込めません");

        // 基本的なバリデーション
        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");

        // 各セクションが存在することを確認
        assert!(
            config.session.tick_interval_ms > 0,
            "tick_interval_msは0より大きい必要があります"
        );
        assert!(
            config.camera.frame_width > 0,
            "フレーム幅は0より大きい必要があります"
        );
        assert!(
            (-1.0..=1.0).contains(&config.orientation.threshold),
            "しきい値は[-1.0, 1.0]の範囲にある必要があります"
        );
    }

    #[test]
    fn test_config_example_loads() {
        // config.toml.exampleが正常に読み込めることを確認
        let config = AppConfig::from_file("config.toml.example")
            .expect("config.toml.exampleが読み込めません");

        // 基本的なバリデーション
        config
            .validate()
            .expect("設定値のバリデーションに失敗しました");
    }

    #[test]
    fn test_full_config_parsing() {
        let toml = r#"
            [camera]
            format = "rgb888"
            frame_width = 640
            frame_height = 480

            [tracker]
            backend = "simulated"
            model_path = ""
            delegate = "gpu"
            num_hands = 1
            min_detection_confidence = 0.5
            min_presence_confidence = 0.5
            min_tracking_confidence = 0.5
            hand_appear_after_ms = 500

            [overlay]
            grip_hide_delay_ms = 2000
            open_hand_anchor = [0.0, 1.1, 0.4]

            [orientation]
            instrument = "scalpel"
            threshold = 0.85

            [session]
            tick_interval_ms = 16
            stats_interval_sec = 10
        "#;
        let config: AppConfig = toml::from_str(toml).unwrap();

        assert_eq!(config.orientation.instrument, InstrumentKind::Scalpel);
        assert_eq!(config.orientation.threshold, 0.85);
        assert_eq!(
            config.overlay.open_hand_anchor_vec(),
            Some(Vec3::new(0.0, 1.1, 0.4))
        );
        assert!(config.validate().is_ok());
    }
}
