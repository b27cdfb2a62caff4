/// スクリプト駆動のARセッションアダプタ
///
/// 実機のARトラッキングSDKなしで開発・テストを行うためのArSessionPort実装。
/// 合成カメラフレームを供給し、器具姿勢は「横倒しからゆっくり起き上がる」
/// スクリプトに従って変化する。明示的に開始・停止を通知していない場合は
/// 初回ポーリングでStartedを流す。
use crate::domain::{
    ArSessionPort, CameraImage, InstrumentPose, LifecycleEvent, LifecycleEvents, PixelFormat,
};
use crossbeam_channel::{unbounded, Sender};
use glam::Vec3;

/// スクリプト駆動のARセッションアダプタ
pub struct ScriptedArSession {
    width: u32,
    height: u32,
    /// set_frame_formatで登録されたフォーマット（未登録ならフレームを返さない）
    frame_format: Option<PixelFormat>,
    started: bool,
    /// 一度でも開始・停止を通知したか。未通知なら初回ポーリングで自動開始する
    announced: bool,
    frame_counter: u64,
    /// このフレーム数までは器具姿勢を返さない
    pose_appear_after: u64,
    /// 姿勢出現から正位に達するまでのフレーム数
    pose_settle_frames: u64,
    lifecycle_tx: Option<Sender<LifecycleEvent>>,
}

impl ScriptedArSession {
    /// 新しいスクリプトセッションを作成
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            frame_format: None,
            started: false,
            announced: false,
            frame_counter: 0,
            pose_appear_after: 30,
            pose_settle_frames: 60,
            lifecycle_tx: None,
        }
    }

    /// 器具姿勢スクリプトのタイミングを変更する
    #[allow(dead_code)]
    pub fn with_pose_schedule(mut self, appear_after: u64, settle_frames: u64) -> Self {
        self.pose_appear_after = appear_after;
        self.pose_settle_frames = settle_frames.max(1);
        self
    }

    /// セッション開始を通知する
    pub fn announce_started(&mut self) {
        self.started = true;
        self.announced = true;
        if let Some(tx) = &self.lifecycle_tx {
            let _ = tx.send(LifecycleEvent::Started);
        }
        tracing::info!("Scripted AR session started");
    }

    /// セッション停止を通知する
    #[allow(dead_code)]
    pub fn announce_stopped(&mut self) {
        self.started = false;
        self.announced = true;
        if let Some(tx) = &self.lifecycle_tx {
            let _ = tx.send(LifecycleEvent::Stopped);
        }
        tracing::info!("Scripted AR session stopped");
    }

    /// 供給済みフレーム数
    #[allow(dead_code)]
    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }
}

impl ArSessionPort for ScriptedArSession {
    fn subscribe_lifecycle(&mut self) -> LifecycleEvents {
        let (tx, rx) = unbounded();
        self.lifecycle_tx = Some(tx);
        LifecycleEvents::from_receiver(rx)
    }

    fn set_frame_format(&mut self, format: PixelFormat, enable: bool) -> bool {
        self.frame_format = if enable { Some(format) } else { None };
        tracing::info!("Frame format {}: {:?}", if enable { "registered" } else { "unregistered" }, format);
        true
    }

    fn current_frame(&mut self) -> Option<CameraImage> {
        // 未通知のまま使われた場合は初回ポーリングで開始を流す
        if !self.announced {
            self.announce_started();
        }
        if !self.started {
            return None;
        }
        let format = self.frame_format?;

        self.frame_counter += 1;

        // フレーム番号で変化する単純なグラデーション画像
        let len = self.width as usize * self.height as usize * format.bytes_per_pixel();
        let mut pixels = vec![0u8; len];
        for (i, px) in pixels.iter_mut().enumerate() {
            *px = ((i as u64 + self.frame_counter) % 256) as u8;
        }

        Some(CameraImage::new(self.width, self.height, format, pixels))
    }

    fn instrument_pose(&self) -> Option<InstrumentPose> {
        if !self.started || self.frame_counter < self.pose_appear_after {
            return None;
        }

        // 横倒し（+X向き）から正位（+Y向き）へ起き上がるスクリプト
        let progress = (self.frame_counter - self.pose_appear_after) as f32
            / self.pose_settle_frames as f32;
        let t = progress.min(1.0);
        let forward = (Vec3::X * (1.0 - t) + Vec3::Y * t).normalize();

        Some(InstrumentPose::new(Vec3::new(0.0, 0.1, -0.3), forward))
    }
}
