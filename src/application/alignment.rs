//! 整列ガイダンス制御（Application層）
//!
//! 手の整列検知、把持ゾーンの遅延非表示、向き確認モードの
//! 状態遷移を1つの状態機械として管理します。
//!
//! # 状態遷移
//! - GripGuidance → HandAligned: 手の検知後、遅延タイマーの発火で遷移
//! - 任意の状態 → OrientationCheck: ポインター押下エッジで遷移
//! - OrientationCheckからの離脱、HandAlignedからGripGuidanceへの逆行はない

use std::time::Duration;

use glam::Vec3;
use tracing::{debug, info};

use crate::application::input_detector::PointerPressDetector;
use crate::application::one_shot::OneShotTimer;
use crate::application::orientation::OrientationProfile;
use crate::domain::{
    AlignmentState, ArrowColor, GhostMaterial, InputPort, InstrumentPose, OrientationVerdict,
    ScenePort,
};

/// ガイダンス状態機械
///
/// シーンへの出力は冪等なsetterのみで、シーン状態の読み戻しは行わない。
pub struct AlignmentController {
    state: AlignmentState,
    profile: OrientationProfile,
    grip_timer: OneShotTimer,
    press_detector: PointerPressDetector,
    open_hand_anchor: Option<Vec3>,
    last_verdict: Option<OrientationVerdict>,
}

impl AlignmentController {
    /// コントローラを作成
    ///
    /// # Arguments
    /// - `profile`: 器具の向き判定プロファイル
    /// - `grip_hide_delay`: 手の検知から把持ガイドを隠すまでの遅延
    /// - `open_hand_anchor`: ガイドライン終点のワールド座標（省略可）
    pub fn new(
        profile: OrientationProfile,
        grip_hide_delay: Duration,
        open_hand_anchor: Option<Vec3>,
    ) -> Self {
        Self {
            state: AlignmentState::GripGuidance,
            profile,
            grip_timer: OneShotTimer::new(grip_hide_delay),
            press_detector: PointerPressDetector::new(),
            open_hand_anchor,
            last_verdict: None,
        }
    }

    /// 初期表示状態をシーンへ反映する
    ///
    /// 把持ガイドと手ゴーストのみ表示。向き確認系は非表示から始まる。
    pub fn initialize(&mut self, scene: &mut dyn ScenePort) {
        scene.set_grip_zone_visible(true);
        scene.set_hand_ghost_visible(true);
        scene.set_hand_ghost_material(GhostMaterial::Neutral);
        scene.set_oriented_instrument_visible(false);
        scene.set_guideline_enabled(false);
        scene.set_arrow_color(ArrowColor::NeedsAdjustment);
        info!("Alignment guidance initialized: state={:?}", self.state);
    }

    /// 現在の状態
    pub fn state(&self) -> AlignmentState {
        self.state
    }

    /// Tick処理
    ///
    /// 処理順: ポインターエッジ → 手の整列検知 → タイマー発火 → 向き判定。
    /// 同一Tickで押下とタイマー発火が重なった場合、状態はOrientationCheckに
    /// なり、タイマーは表示の後始末のみを行う。
    ///
    /// # Arguments
    /// - `hand_present`: 直近の検出結果に手が含まれるか
    /// - `pose`: 器具の現在姿勢（ロスト中はNone）
    /// - `input`: ポインター入力
    /// - `scene`: 提示シーン
    pub fn update(
        &mut self,
        hand_present: bool,
        pose: Option<InstrumentPose>,
        input: &dyn InputPort,
        scene: &mut dyn ScenePort,
    ) {
        // 1. ポインター押下エッジ: どの状態からでも向き確認モードへ
        if self.press_detector.is_just_pressed(input)
            && self.state != AlignmentState::OrientationCheck
        {
            self.state = AlignmentState::OrientationCheck;
            scene.set_oriented_instrument_visible(true);
            scene.set_guideline_enabled(true);
            info!("Orientation check started");
        }

        // 2. 手の整列検知（GripGuidance中のみ）
        if self.state == AlignmentState::GripGuidance {
            if hand_present {
                scene.set_hand_ghost_material(GhostMaterial::Aligned);
                // 待機中の再予約は無視される（検知のたびに呼んでよい）
                if self.grip_timer.schedule() {
                    debug!("Grip zone hide scheduled");
                }
            } else {
                // 手がロストしてもタイマーは取り消さない
                scene.set_hand_ghost_material(GhostMaterial::Neutral);
            }
        }

        // 3. タイマー発火: 表示の後始末と、GripGuidanceからの遷移
        if self.grip_timer.fire_ready() {
            scene.set_grip_zone_visible(false);
            scene.set_hand_ghost_visible(false);
            if self.state == AlignmentState::GripGuidance {
                self.state = AlignmentState::HandAligned;
                scene.set_oriented_instrument_visible(true);
                info!("Hand aligned; grip guidance dismissed");
            }
            // OrientationCheck中の発火は表示処理のみ（状態は変わらない）
        }

        // 4. 向き判定（OrientationCheck中のみ、毎Tick再計算）
        if self.state == AlignmentState::OrientationCheck {
            if let Some(pose) = pose {
                let verdict = self.profile.classify(&pose);
                scene.set_arrow_color(if verdict.is_correct() {
                    ArrowColor::Correct
                } else {
                    ArrowColor::NeedsAdjustment
                });

                if self.last_verdict != Some(verdict) {
                    debug!("Orientation verdict changed: {:?}", verdict);
                    self.last_verdict = Some(verdict);
                }

                if let Some(anchor) = self.open_hand_anchor {
                    scene.set_guideline(pose.position, anchor);
                }
            }
            // 器具ロスト中は直前の表示を維持する（このTickでは更新しない）
        }
    }
}
