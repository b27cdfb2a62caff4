//! ハンドトラッカー（Application層）
//!
//! フレームの推論投入と、完了コールバック経由で届く検出結果の保持。
//! 推論エンジンが構築できない場合は非アクティブのまま動作を続けます
//! （アプリ全体は停止しない）。

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::application::latest_slot::LatestSlot;
use crate::domain::{
    DetectionCallback, DetectionResult, DomainResult, EngineImage, HandLandmarkerOptions,
    LandmarkerPort,
};

/// 推論エンジンを構築するファクトリ
///
/// バックエンド実装（シミュレーション/実機）の選択はmainの責務。
pub type LandmarkerFactory = dyn FnOnce(
    HandLandmarkerOptions,
    DetectionCallback,
) -> DomainResult<Box<dyn LandmarkerPort>>;

/// 非同期ハンドランドマーク推論の送信側と受信側をまとめたコンポーネント
///
/// - 送信: Tickごとに最新フレームを投入（ブロックしない）
/// - 受信: コールバックが最新結果スロットへ上書き保存
/// - 読み取り: `latest_result()` は常に直近の完了結果を返す（非消費）
pub struct HandTracker {
    landmarker: Option<Box<dyn LandmarkerPort>>,
    latest: LatestSlot<DetectionResult>,
    epoch: Instant,
    last_timestamp_ms: i64,
    submit_count: u64,
}

impl HandTracker {
    /// トラッカーを起動する
    ///
    /// オプション検証またはエンジン構築に失敗した場合、エラーを記録して
    /// 非アクティブなトラッカーを返す。以降の `submit()` は何もせず、
    /// `latest_result()` は常に `None` を返す。
    ///
    /// # Arguments
    /// - `options`: 推論エンジンの構築オプション
    /// - `build`: エンジン構築ファクトリ（コールバックを受け取る）
    pub fn start(options: HandLandmarkerOptions, build: Box<LandmarkerFactory>) -> Self {
        let latest = LatestSlot::new();
        let slot = latest.clone();
        let callback: DetectionCallback = Arc::new(move |result| slot.store(result));

        let landmarker = match options
            .validate()
            .and_then(|_| build(options, callback))
        {
            Ok(landmarker) => {
                debug!("Hand landmarker started");
                Some(landmarker)
            }
            Err(e) => {
                // エンジン不在はこのコンポーネントのみの停止にとどめる
                error!("Hand tracking disabled: {}", e);
                None
            }
        };

        Self {
            landmarker,
            latest,
            epoch: Instant::now(),
            last_timestamp_ms: -1,
            submit_count: 0,
        }
    }

    /// このトラッカーが推論を行うか
    pub fn is_active(&self) -> bool {
        self.landmarker.is_some()
    }

    /// フレームを推論へ送る
    ///
    /// タイムスタンプは起動時からの経過ミリ秒。同一ミリ秒内に複数回
    /// 送信された場合は+1して厳密な単調増加を維持する。
    /// 非アクティブ時は何もしない。
    pub fn submit(&mut self, image: EngineImage) {
        let Some(landmarker) = self.landmarker.as_mut() else {
            return;
        };

        let mut timestamp_ms = self.epoch.elapsed().as_millis() as i64;
        if timestamp_ms <= self.last_timestamp_ms {
            timestamp_ms = self.last_timestamp_ms + 1;
        }
        self.last_timestamp_ms = timestamp_ms;

        match landmarker.submit(image, timestamp_ms) {
            Ok(()) => {
                self.submit_count += 1;
                #[cfg(debug_assertions)]
                if self.submit_count.is_multiple_of(60) {
                    debug!(
                        "Frame submitted: timestamp={}ms (count: {})",
                        timestamp_ms, self.submit_count
                    );
                }
            }
            Err(e) => {
                // ワーカー停止後の復帰は想定しない。以降は非アクティブ
                warn!("Landmark submission failed, disabling tracker: {}", e);
                self.landmarker = None;
            }
        }
    }

    /// 最後に完了した検出結果を取得する（非消費・ノンブロッキング）
    ///
    /// # Returns
    /// - `Some(result)`: 一度でも推論が完了していれば直近の結果
    /// - `None`: まだ結果がない、またはトラッカーが非アクティブ
    pub fn latest_result(&self) -> Option<DetectionResult> {
        self.latest.load()
    }

    /// 直近結果に手が含まれるか
    ///
    /// 結果が1つもない場合は「手なし」として扱う（起動直後や
    /// エンジン不在時の既定動作）。
    #[allow(dead_code)]
    pub fn hand_present(&self) -> bool {
        self.latest.load().map(|r| r.has_hand()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DomainError, Landmark, PixelFormat, TextureId};
    use std::sync::Mutex;

    struct RecordingLandmarker {
        timestamps: Arc<Mutex<Vec<i64>>>,
        fail: bool,
    }

    impl LandmarkerPort for RecordingLandmarker {
        fn submit(&mut self, _image: EngineImage, timestamp_ms: i64) -> DomainResult<()> {
            if self.fail {
                return Err(DomainError::Inference("worker is gone".to_string()));
            }
            self.timestamps.lock().unwrap().push(timestamp_ms);
            Ok(())
        }
    }

    fn test_image() -> EngineImage {
        EngineImage::new(
            TextureId(1),
            2,
            2,
            PixelFormat::Rgb888,
            vec![0u8; 12].into(),
        )
    }

    fn recording_tracker(
        fail: bool,
    ) -> (HandTracker, Arc<Mutex<Vec<i64>>>, Arc<Mutex<Option<DetectionCallback>>>) {
        let timestamps = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::new(Mutex::new(None));

        let timestamps_clone = Arc::clone(&timestamps);
        let captured_clone = Arc::clone(&captured);
        let tracker = HandTracker::start(
            HandLandmarkerOptions::with_model(vec![1]),
            Box::new(move |_options, callback| {
                *captured_clone.lock().unwrap() = Some(callback);
                Ok(Box::new(RecordingLandmarker {
                    timestamps: timestamps_clone,
                    fail,
                }))
            }),
        );

        (tracker, timestamps, captured)
    }

    #[test]
    fn test_timestamps_strictly_increase() {
        let (mut tracker, timestamps, _) = recording_tracker(false);

        // 同一ミリ秒内の連続送信でも単調増加が維持される
        for _ in 0..5 {
            tracker.submit(test_image());
        }

        let recorded = timestamps.lock().unwrap();
        assert_eq!(recorded.len(), 5);
        for pair in recorded.windows(2) {
            assert!(pair[1] > pair[0], "timestamps must strictly increase: {:?}", recorded);
        }
    }

    #[test]
    fn test_empty_model_leaves_tracker_inactive() {
        let tracker = HandTracker::start(
            HandLandmarkerOptions::with_model(Vec::new()),
            Box::new(|_options, _callback| {
                panic!("factory must not run when validation fails");
            }),
        );

        assert!(!tracker.is_active());
        assert_eq!(tracker.latest_result(), None);
    }

    #[test]
    fn test_factory_failure_leaves_tracker_inactive() {
        let mut tracker = HandTracker::start(
            HandLandmarkerOptions::with_model(vec![1]),
            Box::new(|_options, _callback| {
                Err(DomainError::Configuration("backend unavailable".to_string()))
            }),
        );

        assert!(!tracker.is_active());

        // 非アクティブでもsubmitは安全に無視される
        tracker.submit(test_image());
        assert_eq!(tracker.latest_result(), None);
        assert!(!tracker.hand_present());
    }

    #[test]
    fn test_callback_updates_latest_result() {
        let (tracker, _, captured) = recording_tracker(false);
        let callback = captured.lock().unwrap().clone().unwrap();

        assert_eq!(tracker.latest_result(), None);

        callback(DetectionResult::with_hand(10, vec![Landmark::new(0.5, 0.5, 0.0)]));

        let result = tracker.latest_result().unwrap();
        assert_eq!(result.timestamp_ms, 10);
        assert!(tracker.hand_present());
    }

    #[test]
    fn test_out_of_order_results_keep_last_arrival() {
        // 完了順の逆転時も「最後に到着した結果」を保持する
        let (tracker, _, captured) = recording_tracker(false);
        let callback = captured.lock().unwrap().clone().unwrap();

        callback(DetectionResult::with_hand(200, vec![Landmark::new(0.1, 0.1, 0.0)]));
        callback(DetectionResult::none(100));

        let result = tracker.latest_result().unwrap();
        assert_eq!(result.timestamp_ms, 100);
        assert!(!tracker.hand_present());
    }

    #[test]
    fn test_submit_failure_disables_tracker() {
        let (mut tracker, _, _) = recording_tracker(true);
        assert!(tracker.is_active());

        tracker.submit(test_image());

        assert!(!tracker.is_active());
        // 以降の送信も安全
        tracker.submit(test_image());
    }

    #[test]
    fn test_latest_result_is_not_consumed() {
        let (tracker, _, captured) = recording_tracker(false);
        let callback = captured.lock().unwrap().clone().unwrap();

        callback(DetectionResult::none(5));

        assert!(tracker.latest_result().is_some());
        assert!(tracker.latest_result().is_some());
    }
}
