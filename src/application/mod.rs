//! Application Layer
//!
//! セッション駆動、手指トラッキング、整列ガイダンスなどのユースケースを実装します。
//!
//! ## モジュール構成
//! - `session`: セッション制御（取得→推論→ガイダンスの1パス駆動）
//! - `feed`: カメラフレーム取得とテクスチャ転送
//! - `tracker`: 手指ランドマーク推論の投入と最新結果保持
//! - `alignment`: 把持ガイダンスと向き確認の状態遷移
//! - `orientation`: 器具の向き判定
//! - `stats`: 統計情報管理（FPS、レイテンシ、検出率）

pub mod alignment;
pub mod feed;
pub mod input_detector;
pub mod latest_slot;
pub mod one_shot;
pub mod orientation;
pub mod session;
pub mod stats;
pub mod tracker;
