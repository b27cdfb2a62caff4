/// エラー型定義
///
/// Domain層の統一エラー型。thiserrorを使用して型安全なエラー処理を提供します。
///
/// # 設計方針
/// - unwrap()の使用を禁止し、明示的なエラーハンドリングを強制
/// - Result型でエラー伝播を明示化
/// - Tickループ内では全エラーをその場で処理し、呼び出し元へは伝播させない
///   （最悪の結果は「そのTickで表示が更新されない」こと）

use thiserror::Error;

/// Domain層の統一エラー型
#[allow(dead_code)]
#[derive(Error, Debug)]
pub enum DomainError {
    /// 設定関連のエラー
    ///
    /// 不正な設定値、モデルアセットの欠落など。
    /// セッションを終了させず、該当コンポーネントのみ縮退動作に入る。
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 初期化エラー
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// カメラフィード関連のエラー
    #[error("Camera error: {0}")]
    Camera(String),

    /// 推論（ランドマーク検出）関連のエラー
    #[error("Inference error: {0}")]
    Inference(String),

    /// その他のエラー
    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Domain層の統一Result型
pub type DomainResult<T> = Result<T, DomainError>;
