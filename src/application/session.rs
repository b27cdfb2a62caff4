//! セッション制御モジュール
//!
//! カメラフィード → 推論投入 → 結果読み取り → ガイダンス更新の
//! 1パスをTickとして駆動します。推論以外は全て単一スレッドで実行され、
//! 推論結果だけがワーカースレッドからコールバック経由で届きます。

use std::time::{Duration, Instant};

use tracing::info;

use crate::application::alignment::AlignmentController;
use crate::application::feed::CameraFeed;
use crate::application::orientation::OrientationProfile;
use crate::application::stats::{StatKind, StatsCollector};
use crate::application::tracker::HandTracker;
use crate::domain::{AppConfig, ArSessionPort, DomainResult, InputPort, ScenePort};

/// トレーニングセッションの実行コンテキスト
pub struct Session {
    feed: CameraFeed,
    tracker: HandTracker,
    controller: AlignmentController,
    stats: StatsCollector,
    tick_interval: Duration,
    run_duration: Option<Duration>,
    /// 統計用: 最後に観測した検出結果のタイムスタンプ
    last_seen_result_ms: Option<i64>,
}

impl Session {
    /// 設定と起動済みトラッカーからセッションを組み立てる
    pub fn new(config: &AppConfig, tracker: HandTracker) -> Self {
        let profile = OrientationProfile::new(
            config.orientation.instrument,
            config.orientation.threshold,
        );
        let controller = AlignmentController::new(
            profile,
            config.overlay.grip_hide_delay(),
            config.overlay.open_hand_anchor_vec(),
        );

        Self {
            feed: CameraFeed::new(config.camera.format),
            tracker,
            controller,
            stats: StatsCollector::new(Duration::from_secs(config.session.stats_interval_sec)),
            tick_interval: config.session.tick_interval(),
            run_duration: config.session.run_duration(),
            last_seen_result_ms: None,
        }
    }

    /// フィード購読とシーン初期状態の設定を行う
    ///
    /// runが内部で呼ぶため、Tick単位で駆動する場合のみ直接呼び出す。
    pub fn start(&mut self, session: &mut dyn ArSessionPort, scene: &mut dyn ScenePort) {
        self.feed.start(session);
        self.controller.initialize(scene);
    }

    /// フィード購読を解除する
    pub fn stop(&mut self, session: &mut dyn ArSessionPort) {
        self.feed.stop(session);
    }

    /// セッションを実行する（ブロッキング）
    ///
    /// 打ち切り時間が設定されていない場合はプロセス終了まで回り続ける。
    pub fn run(
        &mut self,
        session: &mut dyn ArSessionPort,
        scene: &mut dyn ScenePort,
        input: &dyn InputPort,
    ) -> DomainResult<()> {
        info!(
            "Session starting: tracker_active={}, tick_interval={:?}",
            self.tracker.is_active(),
            self.tick_interval
        );

        self.start(session, scene);

        let started = Instant::now();
        loop {
            let tick_start = Instant::now();
            self.tick(session, scene, input);

            if let Some(limit) = self.run_duration {
                if started.elapsed() >= limit {
                    info!("Run duration reached, stopping session");
                    break;
                }
            }

            // Tick間隔に満たない分だけスリープ（超過時は即座に次のTickへ）
            let elapsed = tick_start.elapsed();
            if elapsed < self.tick_interval {
                std::thread::sleep(self.tick_interval - elapsed);
            }
        }

        self.stop(session);
        info!("Session stopped");
        Ok(())
    }

    /// 1Tick分の処理
    ///
    /// 処理順は固定: ライフサイクル/フレーム取得 → 推論投入 →
    /// 最新結果の読み取り → 器具姿勢の取得 → ガイダンス更新。
    pub fn tick(
        &mut self,
        session: &mut dyn ArSessionPort,
        scene: &mut dyn ScenePort,
        input: &dyn InputPort,
    ) {
        let tick_start = Instant::now();

        // 1. フレーム取得（ライフサイクルイベントの反映を含む）
        let acquire_start = Instant::now();
        self.feed.update(session);
        self.stats
            .record_duration(StatKind::Acquire, acquire_start.elapsed());

        // 2. 推論投入（新しいフレームがあるTickのみ）
        if let Some(image) = self.feed.take_fresh() {
            self.stats.record_frame();
            let submit_start = Instant::now();
            self.tracker.submit(image);
            self.stats
                .record_duration(StatKind::Inference, submit_start.elapsed());
        } else {
            self.stats.record_missed_frame();
        }

        // 3. 最新結果の読み取り（非消費・ノンブロッキング）
        let latest = self.tracker.latest_result();
        if let Some(result) = &latest {
            // 新しく到着した結果のみ統計に数える
            if self.last_seen_result_ms != Some(result.timestamp_ms) {
                self.last_seen_result_ms = Some(result.timestamp_ms);
                self.stats.record_result(result.has_hand());
            }
        }
        let hand_present = latest.map(|r| r.has_hand()).unwrap_or(false);

        // 4. 器具姿勢の取得とガイダンス更新
        let pose = session.instrument_pose();
        let alignment_start = Instant::now();
        self.controller.update(hand_present, pose, input, scene);
        self.stats
            .record_duration(StatKind::Alignment, alignment_start.elapsed());

        self.stats
            .record_duration(StatKind::EndToEnd, tick_start.elapsed());
        if self.stats.should_report() {
            self.stats.report_and_reset();
        }
    }

    /// 現在のガイダンス状態（テスト・ログ用）
    #[allow(dead_code)]
    pub fn alignment_state(&self) -> crate::domain::AlignmentState {
        self.controller.state()
    }
}
