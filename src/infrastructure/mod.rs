//! Infrastructure層: 外部技術の統合
//!
//! Domain層のtraitを実装し、エンジン側リソース（テクスチャ/シーン/入力）と接続する。

pub mod input;
pub mod landmarker;
pub mod mock_ar;
pub mod overlay_scene;
pub mod sim_model;
pub mod texture;
