//! ワンショットタイマー（Application層）
//!
//! Tickループ内で使う遅延発火の管理。専用スレッドやコールバックは使わず、
//! 期限の到来をTickごとに確認する方式。

use std::time::{Duration, Instant};

/// 遅延発火を1件だけ管理するワンショットタイマー
///
/// すでに待機中の場合、`schedule()` は何もしない。連続して予約しても
/// 期限が延びたり多重発火したりすることはない。
#[derive(Debug)]
pub struct OneShotTimer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl OneShotTimer {
    /// 指定の遅延を持つアイドル状態のタイマーを作成
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// 発火を予約する
    ///
    /// # Returns
    /// - `true`: 新規に予約した（現在時刻 + 遅延が期限になる）
    /// - `false`: すでに待機中のため何もしなかった
    pub fn schedule(&mut self) -> bool {
        if self.deadline.is_some() {
            return false;
        }
        self.deadline = Some(Instant::now() + self.delay);
        true
    }

    /// 期限が到来していれば発火し、アイドル状態へ戻る
    ///
    /// # Returns
    /// - `true`: この呼び出しで発火した（呼び出し側が発火時の処理を行う）
    /// - `false`: 待機中でない、または期限前
    pub fn fire_ready(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// 待機中か
    #[allow(dead_code)]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// 予約を取り消してアイドル状態へ戻す
    #[allow(dead_code)]
    pub fn cancel(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_schedule_is_idempotent_while_pending() {
        let mut timer = OneShotTimer::new(Duration::from_millis(50));

        assert!(timer.schedule());
        // 待機中の再予約は無視される
        assert!(!timer.schedule());
        assert!(!timer.schedule());
        assert!(timer.is_pending());
    }

    #[test]
    fn test_fires_only_after_delay() {
        let mut timer = OneShotTimer::new(Duration::from_millis(30));
        timer.schedule();

        // 期限前は発火しない
        assert!(!timer.fire_ready());

        thread::sleep(Duration::from_millis(40));

        assert!(timer.fire_ready());
        // 発火は1回のみ
        assert!(!timer.fire_ready());
        assert!(!timer.is_pending());
    }

    #[test]
    fn test_repeated_schedule_does_not_extend_deadline() {
        let mut timer = OneShotTimer::new(Duration::from_millis(30));
        timer.schedule();

        thread::sleep(Duration::from_millis(20));
        // 期限直前の再予約でも期限は延びない
        timer.schedule();
        thread::sleep(Duration::from_millis(15));

        assert!(timer.fire_ready());
    }

    #[test]
    fn test_can_reschedule_after_fire() {
        let mut timer = OneShotTimer::new(Duration::from_millis(5));

        timer.schedule();
        thread::sleep(Duration::from_millis(10));
        assert!(timer.fire_ready());

        // 発火後は再予約できる
        assert!(timer.schedule());
        assert!(timer.is_pending());
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut timer = OneShotTimer::new(Duration::from_millis(5));
        timer.schedule();

        timer.cancel();

        assert!(!timer.is_pending());
        thread::sleep(Duration::from_millis(10));
        assert!(!timer.fire_ready());
    }

    #[test]
    fn test_zero_delay_fires_immediately() {
        let mut timer = OneShotTimer::new(Duration::ZERO);
        timer.schedule();

        assert!(timer.fire_ready());
    }
}
