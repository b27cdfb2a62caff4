//! 入力検出ユーティリティ（Application層）
//!
//! ポインター押下のエッジ検出（立ち上がり）を提供します。
//!
//! # 使用例
//! 向き確認モードの開始トリガー（押し続けではなく、押した瞬間のみ検出）。

use crate::domain::ports::InputPort;

/// ポインターの押下状態を検知（エッジ検出用）
///
/// 前回の状態と比較して、ポインターが押された瞬間（立ち上がりエッジ）を検知します。
pub struct PointerPressDetector {
    previous_state: bool,
}

impl PointerPressDetector {
    /// 新しいPointerPressDetectorを作成
    pub fn new() -> Self {
        Self {
            previous_state: false,
        }
    }

    /// ポインターが押された瞬間かをチェック（立ち上がりエッジ検出）
    ///
    /// # Arguments
    /// - `input`: InputPort trait実装（抽象化されたポインター入力）
    ///
    /// # Returns
    /// - `true`: 前回チェック時は押されておらず、今回押されている（立ち上がりエッジ）
    /// - `false`: それ以外（押され続けている、離されている、押されていない）
    pub fn is_just_pressed(&mut self, input: &dyn InputPort) -> bool {
        let current_state = input.pointer_pressed();
        let edge = !self.previous_state && current_state;
        self.previous_state = current_state;
        edge
    }

    /// 現在の状態をリセット
    #[allow(dead_code)]
    pub fn reset(&mut self) {
        self.previous_state = false;
    }
}

impl Default for PointerPressDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockInput {
        pressed: bool,
    }

    impl InputPort for MockInput {
        fn pointer_pressed(&self) -> bool {
            self.pressed
        }
    }

    #[test]
    fn test_edge_detection() {
        let mut detector = PointerPressDetector::new();

        // 初期状態: 押されていない
        let input = MockInput { pressed: false };
        assert!(!detector.is_just_pressed(&input));

        // 押された瞬間: エッジ検出
        let input = MockInput { pressed: true };
        assert!(detector.is_just_pressed(&input));

        // 押され続けている: エッジなし
        let input = MockInput { pressed: true };
        assert!(!detector.is_just_pressed(&input));

        // 離された
        let input = MockInput { pressed: false };
        assert!(!detector.is_just_pressed(&input));

        // 再度押された: エッジ検出
        let input = MockInput { pressed: true };
        assert!(detector.is_just_pressed(&input));
    }

    #[test]
    fn test_reset() {
        let mut detector = PointerPressDetector::new();

        // 押された瞬間
        let input = MockInput { pressed: true };
        assert!(detector.is_just_pressed(&input));

        // リセット
        detector.reset();

        // 再度押された瞬間として検出される
        let input = MockInput { pressed: true };
        assert!(detector.is_just_pressed(&input));
    }
}
