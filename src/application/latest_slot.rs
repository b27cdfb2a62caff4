//! 最新値スロット（Application層）
//!
//! 書き込みスレッドと読み取りスレッド間で「最後に書かれた値」のみを共有します。
//! キューイングは行わず、読み取りは非消費・ノンブロッキング。

use std::sync::{Arc, Mutex};

/// 最新値のみを保持する共有スロット
///
/// 書き込みは到着順に上書きし、読み取りは常に直近の書き込みを返す。
/// タイムスタンプ順の到着は保証しないため、順序が必要な場合は
/// 値自身が持つタイムスタンプで判断すること。
#[derive(Debug)]
pub struct LatestSlot<T> {
    inner: Arc<Mutex<Option<T>>>,
}

impl<T> LatestSlot<T> {
    /// 空のスロットを作成
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(None)),
        }
    }

    /// 値を上書き保存する（以前の値は破棄）
    pub fn store(&self, value: T) {
        *self.inner.lock().unwrap() = Some(value);
    }

    /// 直近の値のコピーを取得する（スロットは消費されない）
    ///
    /// # Returns
    /// - `Some(value)`: 一度でも書き込まれていれば直近の値
    /// - `None`: まだ何も書き込まれていない
    pub fn load(&self) -> Option<T>
    where
        T: Clone,
    {
        self.inner.lock().unwrap().clone()
    }
}

// derive(Clone)はT: Cloneを要求するため手動実装（Arcの共有のみ）
impl<T> Clone for LatestSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for LatestSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_returns_none() {
        let slot: LatestSlot<i64> = LatestSlot::new();
        assert_eq!(slot.load(), None);
    }

    #[test]
    fn test_store_and_load() {
        let slot = LatestSlot::new();
        slot.store(42i64);

        assert_eq!(slot.load(), Some(42));
        // 読み取りは非消費
        assert_eq!(slot.load(), Some(42));
    }

    #[test]
    fn test_last_writer_wins_by_arrival_order() {
        // タイムスタンプが逆転して到着しても、後から書かれた値が残る
        let slot = LatestSlot::new();
        slot.store(200i64);
        slot.store(100i64);

        assert_eq!(slot.load(), Some(100));
    }

    #[test]
    fn test_clone_shares_storage() {
        let writer = LatestSlot::new();
        let reader = writer.clone();

        writer.store("hello");

        assert_eq!(reader.load(), Some("hello"));
    }

    #[test]
    fn test_cross_thread_store() {
        let slot = LatestSlot::new();
        let writer = slot.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..100u32 {
                writer.store(i);
            }
        });

        handle.join().unwrap();
        assert_eq!(slot.load(), Some(99));
    }
}
