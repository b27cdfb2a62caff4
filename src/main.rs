mod application;
mod domain;
mod infrastructure;
mod logging;

use crate::application::session::Session;
use crate::application::tracker::HandTracker;
use crate::domain::config::{AppConfig, TrackerBackend};
use crate::infrastructure::input::SharedPointerState;
use crate::infrastructure::landmarker::build_landmarker;
use crate::infrastructure::mock_ar::ScriptedArSession;
use crate::infrastructure::overlay_scene::OverlayScene;
use crate::logging::init_logging;
use std::path::PathBuf;
use std::time::Duration;

/// 向き確認開始タップを注入するまでの時間
///
/// 手の出現（約0.5秒）と整列完了までの遅延（2秒）を待ってから押す。
const TAP_DELAY_MS: u64 = 4_000;

fn main() {
    // ログシステムの初期化（非同期ファイル出力）
    let log_dir = PathBuf::from("logs");
    let _guard = init_logging("info", false, Some(log_dir));
    // 注意: _guardはmain終了まで保持する必要がある（Dropでログスレッドが終了）

    tracing::info!("SteadyHands starting...");

    match run() {
        Ok(_) => {
            tracing::info!("SteadyHands terminated gracefully.");
        }
        Err(e) => {
            tracing::error!("Fatal error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// アプリケーションのメイン処理
fn run() -> Result<(), Box<dyn std::error::Error>> {
    // 設定ファイルの読み込み（存在しない場合はデフォルト設定を使用）
    let config = match AppConfig::from_file("config.toml") {
        Ok(config) => {
            tracing::info!("Loaded configuration from config.toml");
            config
        }
        Err(e) => {
            tracing::warn!("Failed to load config.toml: {:?}, using defaults", e);
            AppConfig::default()
        }
    };

    // 設定の検証
    config.validate()?;

    tracing::info!("Configuration validated successfully");
    tracing::info!(
        "Camera: {}x{} format={:?}",
        config.camera.frame_width,
        config.camera.frame_height,
        config.camera.format
    );
    tracing::info!(
        "Tracker: backend={:?}, delegate={:?}, num_hands={}",
        config.tracker.backend,
        config.tracker.delegate,
        config.tracker.num_hands
    );
    tracing::info!(
        "Orientation: instrument={:?}, threshold={}",
        config.orientation.instrument,
        config.orientation.threshold
    );

    // モデルアセットの読み込みとトラッカー起動
    // 読み込み失敗や未対応バックエンドの場合、トラッカーは非アクティブの
    // まま起動し、手検出なしでセッションを継続する
    let model_asset = load_model_asset(&config);
    let options = config.tracker.landmarker_options(model_asset);
    let tracker_config = config.tracker.clone();
    let tracker = HandTracker::start(
        options,
        Box::new(move |options, callback| build_landmarker(&tracker_config, options, callback)),
    );

    // スクリプトセッションとシーンの初期化
    // セッション開始はスクリプト側が初回ポーリングで通知する
    tracing::info!("Initializing scripted AR session...");
    let mut ar_session =
        ScriptedArSession::new(config.camera.frame_width, config.camera.frame_height);
    let mut scene = OverlayScene::new();
    let input = SharedPointerState::new();

    // 一定時間後に向き確認開始のタップを注入する
    let tap = input.clone();
    let tap_handle = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(TAP_DELAY_MS));
        tap.set_pressed(true);
        tracing::info!("Scripted tap: orientation check requested");
        std::thread::sleep(Duration::from_millis(100));
        tap.set_pressed(false);
    });

    // セッションの実行（ブロッキング）
    let mut session = Session::new(&config, tracker);
    session.run(&mut ar_session, &mut scene, &input)?;

    let _ = tap_handle.join();

    tracing::info!(
        "Final scene: state={:?}, grip_zone={}, hand_ghost={} ({:?}), instrument={}, guideline={}, arrow={:?}",
        session.alignment_state(),
        scene.grip_zone_visible(),
        scene.hand_ghost_visible(),
        scene.ghost_material(),
        scene.oriented_instrument_visible(),
        scene.guideline_enabled(),
        scene.arrow_color(),
    );

    Ok(())
}

/// バックエンドに応じたモデルアセットを読み込む
///
/// 読み込みに失敗した場合は空のバイト列を返す。空のアセットは
/// オプション検証で弾かれ、トラッカーは非アクティブになる。
fn load_model_asset(config: &AppConfig) -> Vec<u8> {
    match config.tracker.backend {
        TrackerBackend::Simulated => {
            // シミュレートバックエンドはアセットの中身を参照しない
            vec![0u8]
        }
        TrackerBackend::MediapipeTask => match std::fs::read(&config.tracker.model_path) {
            Ok(bytes) => {
                tracing::info!(
                    "Loaded model asset: {} ({} bytes)",
                    config.tracker.model_path,
                    bytes.len()
                );
                bytes
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to load model asset {}: {:?}",
                    config.tracker.model_path,
                    e
                );
                Vec::new()
            }
        },
    }
}
