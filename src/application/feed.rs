//! カメラフィード（Application層）
//!
//! ARセッションのライフサイクルに追従してピクセルフォーマットを登録し、
//! Tickごとにカメラフレームをテクスチャへ転写します。

use tracing::{debug, info, warn};

use crate::domain::{ArSessionPort, EngineImage, LifecycleEvent, LifecycleEvents, PixelFormat, TextureId};
use crate::infrastructure::texture::TextureStaging;

/// カメラフレームの取得とテクスチャ転写を担うコンポーネント
///
/// フォーマット登録はライフサイクルイベント駆動:
/// - Started: フォーマットを登録（拒否された場合は警告のみ、ポーリングは継続）
/// - Stopped: フォーマットを解除し、テクスチャを解放
///
/// フレームの有無はストリーム側が決める。未登録の間は通常absentが返る。
pub struct CameraFeed {
    format: PixelFormat,
    events: Option<LifecycleEvents>,
    registered: bool,
    staging: TextureStaging,
    fresh: bool,
    frame_count: u64,
}

impl CameraFeed {
    /// 指定フォーマットのフィードを作成
    pub fn new(format: PixelFormat) -> Self {
        Self {
            format,
            events: None,
            registered: false,
            staging: TextureStaging::new(),
            fresh: false,
            frame_count: 0,
        }
    }

    /// ライフサイクルイベントの購読を開始する
    pub fn start(&mut self, session: &mut dyn ArSessionPort) {
        self.events = Some(session.subscribe_lifecycle());
        info!("Camera feed subscribed to session lifecycle");
    }

    /// 購読とフォーマット登録を解除し、テクスチャを解放する
    ///
    /// ハンドルのdropが購読解除に相当するため、解除漏れは起きない。
    pub fn stop(&mut self, session: &mut dyn ArSessionPort) {
        if self.registered {
            session.set_frame_format(self.format, false);
            self.registered = false;
        }
        self.events = None;
        self.staging.release();
        self.fresh = false;
        info!("Camera feed unsubscribed");
    }

    /// Tick処理: ライフサイクル反映 → フレーム取得 → テクスチャ転写
    ///
    /// イベントの反映はフレーム取得より先に行う（Started直後のTickで
    /// 登録済み状態になってからフレームを読む）。登録に失敗していても
    /// ポーリング自体は続ける。
    pub fn update(&mut self, session: &mut dyn ArSessionPort) {
        self.drain_lifecycle(session);

        let Some(image) = session.current_frame() else {
            return;
        };

        if !image.is_valid() {
            // 寸法0や長さ不一致はデバイス再構成中とみなして読み飛ばす
            debug!(
                "Skipping invalid camera frame: {}x{}, {} bytes",
                image.width,
                image.height,
                image.pixels.len()
            );
            return;
        }

        self.staging.upload(&image);
        self.fresh = true;

        self.frame_count += 1;
        #[cfg(debug_assertions)]
        if self.frame_count.is_multiple_of(60) {
            // 60フレーム（約1秒@60Hz）に1回ログ出力
            debug!(
                "Frame uploaded: {}x{} (count: {})",
                image.width, image.height, self.frame_count
            );
        }
    }

    /// このTickで転写されたフレームをエンジン画像として取り出す
    ///
    /// 取り出しによりフレッシュ状態は消費される（同一Tick内での
    /// 二重送信を防ぐ）。次のTickで再び転写されれば再度取り出せる。
    ///
    /// 取り出し前にテクスチャの読み戻し再転写を毎回行う。転写から
    /// エンジン読み出しまでの間にストアが陳腐化しうるため。
    pub fn take_fresh(&mut self) -> Option<EngineImage> {
        if !self.fresh {
            return None;
        }
        self.fresh = false;
        self.staging.refresh();
        self.staging.engine_image()
    }

    /// 現在の転写先テクスチャID
    #[allow(dead_code)]
    pub fn texture_id(&self) -> Option<TextureId> {
        self.staging.current_id()
    }

    /// フォーマット登録済みか
    #[allow(dead_code)]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    fn drain_lifecycle(&mut self, session: &mut dyn ArSessionPort) {
        let Some(events) = &self.events else {
            return;
        };

        // try_nextはノンブロッキング。溜まったイベントを全て反映する
        while let Some(event) = events.try_next() {
            match event {
                LifecycleEvent::Started => {
                    if session.set_frame_format(self.format, true) {
                        self.registered = true;
                        info!("Pixel format registered: {:?}", self.format);
                    } else {
                        warn!(
                            "Session rejected pixel format {:?}; feed stays unregistered",
                            self.format
                        );
                    }
                }
                LifecycleEvent::Stopped => {
                    session.set_frame_format(self.format, false);
                    self.registered = false;
                    self.staging.release();
                    self.fresh = false;
                    info!("Pixel format unregistered: {:?}", self.format);
                }
            }
        }
    }
}
