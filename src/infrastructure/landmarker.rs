//! 手指ランドマーク推論エンジン（Infrastructure層）
//!
//! 推論モデルを専用ワーカースレッドで駆動し、LandmarkerPort traitを実装します。
//! 投入キューはbounded(1)で、満杯時は待機中の古いフレームを破棄して
//! 最新フレームに差し替えます（低レイテンシ最優先）。

use crate::domain::{
    DetectionCallback, DetectionResult, DomainError, DomainResult, EngineImage,
    HandLandmarkerOptions, LandmarkerPort, TrackerBackend, TrackerConfig,
};
use crate::infrastructure::sim_model::SimulatedHandModel;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::thread::JoinHandle;

/// 推論モデルの抽象
///
/// ワーカースレッド内から呼び出されるため、Sendが必要。
pub trait DetectionModel: Send {
    /// 1フレーム分の推論を実行する
    ///
    /// # Arguments
    /// - `image` - エンジン側テクスチャを参照する入力画像
    /// - `timestamp_ms` - 単調増加タイムスタンプ（ミリ秒）
    fn detect(&mut self, image: &EngineImage, timestamp_ms: i64) -> DomainResult<DetectionResult>;
}

/// 推論ジョブ（フレームとタイムスタンプのペア）
struct Job {
    image: EngineImage,
    timestamp_ms: i64,
}

/// ワーカースレッド駆動のランドマーカー
///
/// submitは即座に戻り、結果はコールバック経由で通知されます。
pub struct ThreadedLandmarker {
    /// Drop時にNoneへ落としてワーカーの受信ループを終了させる
    tx: Option<Sender<Job>>,
    /// 満杯時に古いジョブを破棄するための受信ハンドル
    pending_rx: Receiver<Job>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedLandmarker {
    /// モデルをワーカースレッドへ移してランドマーカーを起動する
    pub fn spawn<M>(model: M, callback: DetectionCallback) -> Self
    where
        M: DetectionModel + 'static,
    {
        let (tx, rx) = bounded::<Job>(1);

        let worker = {
            let rx = rx.clone();
            std::thread::spawn(move || {
                Self::worker_loop(model, rx, callback);
            })
        };

        Self {
            tx: Some(tx),
            pending_rx: rx,
            worker: Some(worker),
        }
    }

    /// ワーカースレッドのメインループ
    fn worker_loop<M: DetectionModel>(
        mut model: M,
        rx: Receiver<Job>,
        callback: DetectionCallback,
    ) {
        tracing::info!("Landmark worker thread started");

        #[cfg(debug_assertions)]
        let mut detect_count = 0u64;

        while let Ok(job) = rx.recv() {
            match model.detect(&job.image, job.timestamp_ms) {
                Ok(result) => {
                    #[cfg(debug_assertions)]
                    {
                        detect_count += 1;
                        if detect_count.is_multiple_of(60) {
                            tracing::debug!(
                                "Detection completed: timestamp={}ms, hands={}, count={}",
                                result.timestamp_ms,
                                result.hands.len(),
                                detect_count
                            );
                        }
                    }

                    (callback)(result);
                }
                Err(e) => {
                    #[cfg(debug_assertions)]
                    tracing::error!("Detection error: {:?}", e);
                    #[cfg(not(debug_assertions))]
                    let _ = e;
                }
            }
        }

        tracing::info!("Landmark worker thread stopped");
    }
}

impl LandmarkerPort for ThreadedLandmarker {
    fn submit(&mut self, image: EngineImage, timestamp_ms: i64) -> DomainResult<()> {
        let Some(tx) = self.tx.as_ref() else {
            return Err(DomainError::Inference(
                "landmark worker is shut down".to_string(),
            ));
        };

        let job = Job {
            image,
            timestamp_ms,
        };

        match tx.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => {
                // 満杯: 待機中の古いフレームを破棄して最新を積み直す。
                // ワーカーが直前に取り出した場合try_recvは空振りするが、
                // どちらでもスロットは空くため再送は成功する。
                let _ = self.pending_rx.try_recv();
                match tx.try_send(job) {
                    Ok(()) => Ok(()),
                    Err(TrySendError::Full(_)) => {
                        // 単一プロデューサのため到達しない想定。フレームを1枚落とすだけ。
                        #[cfg(debug_assertions)]
                        tracing::debug!("Frame dropped: queue refilled unexpectedly");
                        Ok(())
                    }
                    Err(TrySendError::Disconnected(_)) => Err(DomainError::Inference(
                        "landmark worker has terminated".to_string(),
                    )),
                }
            }
            Err(TrySendError::Disconnected(_)) => Err(DomainError::Inference(
                "landmark worker has terminated".to_string(),
            )),
        }
    }
}

impl Drop for ThreadedLandmarker {
    fn drop(&mut self) {
        // Senderを先に落とすとワーカーのrecvがErrになりループが終了する
        self.tx.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// 設定からランドマーカーバックエンドを組み立てる
///
/// # Arguments
/// - `config` - トラッカー設定（バックエンド種別と出現遅延）
/// - `options` - 検証済みのランドマーカーオプション
/// - `callback` - 検出結果の通知先
///
/// # Returns
/// - `Ok(Box<dyn LandmarkerPort>)` - 起動済みのランドマーカー
/// - `Err(DomainError::Configuration)` - バックエンドが利用できない場合
pub fn build_landmarker(
    config: &TrackerConfig,
    options: HandLandmarkerOptions,
    callback: DetectionCallback,
) -> DomainResult<Box<dyn LandmarkerPort>> {
    match config.backend {
        TrackerBackend::Simulated => {
            tracing::info!(
                "Building simulated landmarker: delegate={:?}, num_hands={}, appear_after={}ms",
                options.delegate,
                options.num_hands,
                config.hand_appear_after_ms
            );
            let model = SimulatedHandModel::new(config.hand_appear_after_ms);
            Ok(Box::new(ThreadedLandmarker::spawn(model, callback)))
        }
        TrackerBackend::MediapipeTask => Err(DomainError::Configuration(
            "mediapipe-task backend is not available in this build".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PixelFormat, TextureId};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn test_image() -> EngineImage {
        EngineImage::new(
            TextureId(1),
            4,
            4,
            PixelFormat::Rgb888,
            Arc::from(vec![0u8; 48].as_slice()),
        )
    }

    /// 受け取ったタイムスタンプを記録するだけのモデル
    ///
    /// 記録は遅延より先に行うため、キュー取り出しを外部から観測できる。
    struct RecordingModel {
        seen: Arc<Mutex<Vec<i64>>>,
        delay: Option<Duration>,
    }

    impl DetectionModel for RecordingModel {
        fn detect(
            &mut self,
            _image: &EngineImage,
            timestamp_ms: i64,
        ) -> DomainResult<DetectionResult> {
            self.seen.lock().unwrap().push(timestamp_ms);
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            Ok(DetectionResult::none(timestamp_ms))
        }
    }

    #[test]
    fn test_submit_delivers_result_via_callback() {
        let received = Arc::new(Mutex::new(Vec::<i64>::new()));
        let received_clone = Arc::clone(&received);
        let callback: DetectionCallback = Arc::new(move |result| {
            received_clone.lock().unwrap().push(result.timestamp_ms);
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = RecordingModel {
            seen: Arc::clone(&seen),
            delay: None,
        };

        let mut landmarker = ThreadedLandmarker::spawn(model, callback);
        landmarker.submit(test_image(), 10).unwrap();

        // ワーカー処理完了を待つ
        for _ in 0..100 {
            if !received.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(*received.lock().unwrap(), vec![10]);
    }

    #[test]
    fn test_full_queue_replaces_pending_frame() {
        let received = Arc::new(Mutex::new(Vec::<i64>::new()));
        let received_clone = Arc::clone(&received);
        let callback: DetectionCallback = Arc::new(move |result| {
            received_clone.lock().unwrap().push(result.timestamp_ms);
        });

        let seen = Arc::new(Mutex::new(Vec::new()));
        // 1件目の処理を長引かせ、その間に2件を投入してキュー差し替えを起こす
        let model = RecordingModel {
            seen: Arc::clone(&seen),
            delay: Some(Duration::from_millis(300)),
        };

        let mut landmarker = ThreadedLandmarker::spawn(model, callback);
        landmarker.submit(test_image(), 1).unwrap();
        // ワーカーが1件目を取り出すまで待機
        for _ in 0..200 {
            if !seen.lock().unwrap().is_empty() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        landmarker.submit(test_image(), 2).unwrap();
        landmarker.submit(test_image(), 3).unwrap();

        // Dropで全ジョブの処理完了を待ち合わせる
        drop(landmarker);

        // 2はキュー内で3に差し替えられ、処理されるのは1と3のみ
        assert_eq!(*seen.lock().unwrap(), vec![1, 3]);
        assert_eq!(*received.lock().unwrap(), vec![1, 3]);
    }

    #[test]
    fn test_drop_joins_worker() {
        let callback: DetectionCallback = Arc::new(|_| {});
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = RecordingModel {
            seen: Arc::clone(&seen),
            delay: None,
        };

        let mut landmarker = ThreadedLandmarker::spawn(model, callback);
        landmarker.submit(test_image(), 5).unwrap();
        drop(landmarker);

        // Drop完了時点で投入済みジョブは処理済み
        assert_eq!(*seen.lock().unwrap(), vec![5]);
    }

    #[test]
    fn test_build_simulated_backend() {
        let config = TrackerConfig::default();
        let callback: DetectionCallback = Arc::new(|_| {});
        let landmarker = build_landmarker(
            &config,
            HandLandmarkerOptions::with_model(vec![1]),
            callback,
        );
        assert!(landmarker.is_ok());
    }

    #[test]
    fn test_build_mediapipe_backend_unavailable() {
        let config = TrackerConfig {
            backend: TrackerBackend::MediapipeTask,
            ..TrackerConfig::default()
        };
        let callback: DetectionCallback = Arc::new(|_| {});
        let result = build_landmarker(
            &config,
            HandLandmarkerOptions::with_model(vec![1]),
            callback,
        );
        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }
}
