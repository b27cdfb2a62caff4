/// オーバーレイシーンアダプタ
///
/// ScenePort traitのヘッドレス実装。レンダラーに接続する代わりに
/// 現在の表示状態を保持し、状態変化をログに出力する。
/// 実機ではエンジン側のシーングラフ操作に置き換わる想定。
use crate::domain::{ArrowColor, GhostMaterial, ScenePort};
use glam::Vec3;

/// オーバーレイシーンアダプタ
pub struct OverlayScene {
    grip_zone_visible: bool,
    hand_ghost_visible: bool,
    ghost_material: GhostMaterial,
    oriented_instrument_visible: bool,
    guideline_enabled: bool,
    guideline: Option<(Vec3, Vec3)>,
    arrow_color: ArrowColor,
}

impl OverlayScene {
    /// 新しいオーバーレイシーンを作成
    ///
    /// 初期状態は全要素非表示。表示制御はセッション側が行う。
    pub fn new() -> Self {
        Self {
            grip_zone_visible: false,
            hand_ghost_visible: false,
            ghost_material: GhostMaterial::Neutral,
            oriented_instrument_visible: false,
            guideline_enabled: false,
            guideline: None,
            arrow_color: ArrowColor::NeedsAdjustment,
        }
    }

    pub fn grip_zone_visible(&self) -> bool {
        self.grip_zone_visible
    }

    pub fn hand_ghost_visible(&self) -> bool {
        self.hand_ghost_visible
    }

    pub fn ghost_material(&self) -> GhostMaterial {
        self.ghost_material
    }

    pub fn oriented_instrument_visible(&self) -> bool {
        self.oriented_instrument_visible
    }

    pub fn guideline_enabled(&self) -> bool {
        self.guideline_enabled
    }

    #[allow(dead_code)]
    pub fn guideline(&self) -> Option<(Vec3, Vec3)> {
        self.guideline
    }

    pub fn arrow_color(&self) -> ArrowColor {
        self.arrow_color
    }
}

impl Default for OverlayScene {
    fn default() -> Self {
        Self::new()
    }
}

impl ScenePort for OverlayScene {
    fn set_grip_zone_visible(&mut self, visible: bool) {
        if self.grip_zone_visible != visible {
            tracing::debug!("Scene: grip zone visible={}", visible);
        }
        self.grip_zone_visible = visible;
    }

    fn set_hand_ghost_visible(&mut self, visible: bool) {
        if self.hand_ghost_visible != visible {
            tracing::debug!("Scene: hand ghost visible={}", visible);
        }
        self.hand_ghost_visible = visible;
    }

    fn set_hand_ghost_material(&mut self, material: GhostMaterial) {
        if self.ghost_material != material {
            tracing::debug!("Scene: hand ghost material={:?}", material);
        }
        self.ghost_material = material;
    }

    fn set_oriented_instrument_visible(&mut self, visible: bool) {
        if self.oriented_instrument_visible != visible {
            tracing::debug!("Scene: oriented instrument visible={}", visible);
        }
        self.oriented_instrument_visible = visible;
    }

    fn set_guideline_enabled(&mut self, enabled: bool) {
        if self.guideline_enabled != enabled {
            tracing::debug!("Scene: guideline enabled={}", enabled);
        }
        self.guideline_enabled = enabled;
    }

    fn set_guideline(&mut self, from: Vec3, to: Vec3) {
        // 毎Tick更新されるためログは出さない
        self.guideline = Some((from, to));
    }

    fn set_arrow_color(&mut self, color: ArrowColor) {
        if self.arrow_color != color {
            tracing::debug!("Scene: arrow color={:?}", color);
        }
        self.arrow_color = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_all_hidden() {
        let scene = OverlayScene::new();
        assert!(!scene.grip_zone_visible());
        assert!(!scene.hand_ghost_visible());
        assert!(!scene.oriented_instrument_visible());
        assert!(!scene.guideline_enabled());
        assert_eq!(scene.ghost_material(), GhostMaterial::Neutral);
        assert_eq!(scene.arrow_color(), ArrowColor::NeedsAdjustment);
    }

    #[test]
    fn test_setters_update_state() {
        let mut scene = OverlayScene::new();

        scene.set_grip_zone_visible(true);
        scene.set_hand_ghost_material(GhostMaterial::Aligned);
        scene.set_arrow_color(ArrowColor::Correct);
        scene.set_guideline(Vec3::ZERO, Vec3::Y);

        assert!(scene.grip_zone_visible());
        assert_eq!(scene.ghost_material(), GhostMaterial::Aligned);
        assert_eq!(scene.arrow_color(), ArrowColor::Correct);
        assert_eq!(scene.guideline(), Some((Vec3::ZERO, Vec3::Y)));
    }
}
