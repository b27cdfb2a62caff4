//! ポインタ入力アダプタ（Infrastructure層）
//!
//! ホスト側ランタイムから押下状態を書き込める共有フラグでInputPort traitを実装します。

use crate::domain::InputPort;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// スレッド間で共有できるポインタ押下状態
///
/// Cloneはフラグを共有する（書き込み側と読み取り側で同じ状態を見る）。
#[derive(Clone)]
pub struct SharedPointerState {
    pressed: Arc<AtomicBool>,
}

impl SharedPointerState {
    /// 新しいポインタ状態を作成（初期状態: 非押下）
    pub fn new() -> Self {
        Self {
            pressed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 押下状態を書き込む（ホスト側ランタイムから呼ばれる）
    pub fn set_pressed(&self, pressed: bool) {
        self.pressed.store(pressed, Ordering::Relaxed);
    }
}

impl Default for SharedPointerState {
    fn default() -> Self {
        Self::new()
    }
}

impl InputPort for SharedPointerState {
    fn pointer_pressed(&self) -> bool {
        self.pressed.load(Ordering::Relaxed)
    }
}
