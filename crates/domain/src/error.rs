//! # 送信エラー定義
//!
//! プロバイダごとに異なる失敗応答を、共通の 4 種別に正規化したエラー型。
//!
//! ## エラーの種類
//!
//! | 種別 | 意味 | code |
//! |------|------|------|
//! | `InvalidRequest` | プロバイダがリクエストの形式・内容を拒否した | 0 |
//! | `Unauthorized` | 認証情報が拒否された | 0 |
//! | `Delivery` | 受け付けられたが配信できない（クォータ、課金など） | 0 |
//! | `Unexpected` | 上記に分類できない失敗（通信エラー、未知のステータスなど） | 保持した値 |
//!
//! ## 使用例
//!
//! ```rust
//! use omnimail_domain::{MailError, MailErrorKind, UNKNOWN_ERROR_CODE};
//!
//! let error = MailError::unexpected("Unknown error", UNKNOWN_ERROR_CODE);
//!
//! match error.kind() {
//!     MailErrorKind::Unauthorized => { /* 認証情報を見直す */ }
//!     MailErrorKind::Unexpected => assert_eq!(error.code(), 603),
//!     _ => {}
//! }
//! ```

use std::error::Error as StdError;

use strum::IntoStaticStr;
use thiserror::Error;

/// プロバイダの応答を分類できなかった場合の内部エラーコード
///
/// HTTP ステータスコードと衝突しない値を使う。
pub const UNKNOWN_ERROR_CODE: i32 = 603;

/// 元のエラー（cause）を保持するための型
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// メール送信エラー
///
/// 呼び出し側は [`kind()`](MailError::kind) で種別を判定する。
/// メッセージはプロバイダが返した文言を優先し、無ければ既定の文言を使う。
#[derive(Debug, Error)]
pub enum MailError {
    /// リクエスト不正（宛先の形式不備、必須項目の欠落など）
    #[error("{0}")]
    InvalidRequest(String),

    /// 認証失敗
    #[error("{0}")]
    Unauthorized(String),

    /// 配信不可（クォータ超過、支払い未完了など）
    #[error("{0}")]
    Delivery(String),

    /// 予期しないエラー
    ///
    /// 通信エラーや未知の応答など。元のエラーのメッセージとコードを保持し、
    /// 元のエラー自体は `source` から辿れる。
    #[error("{message}")]
    Unexpected {
        message: String,
        code:    i32,
        #[source]
        source:  Option<BoxError>,
    },
}

/// [`MailError`] の種別
///
/// ログのフィールドなどで使う軽量な判別子。snake_case で文字列化される。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum MailErrorKind {
    InvalidRequest,
    Unauthorized,
    Delivery,
    Unexpected,
}

impl MailError {
    /// リクエスト不正エラーを生成する
    ///
    /// `message` が `None` または空の場合は既定の文言を使う。
    pub fn invalid_request(message: Option<String>) -> Self {
        Self::InvalidRequest(or_default(message, "リクエストが不正です"))
    }

    /// 認証失敗エラーを生成する
    pub fn unauthorized(message: Option<String>) -> Self {
        Self::Unauthorized(or_default(message, "認証に失敗しました"))
    }

    /// 配信不可エラーを生成する
    pub fn delivery(message: Option<String>) -> Self {
        Self::Delivery(or_default(message, "メールを配信できませんでした"))
    }

    /// 元のエラーを持たない予期しないエラーを生成する
    pub fn unexpected(message: impl Into<String>, code: i32) -> Self {
        Self::Unexpected {
            message: message.into(),
            code,
            source: None,
        }
    }

    /// 下位のエラーを予期しないエラーとして包む
    ///
    /// メッセージは元のエラーの `Display` をそのまま引き継ぐ。
    pub fn wrap(source: impl Into<BoxError>, code: i32) -> Self {
        let source = source.into();
        Self::Unexpected {
            message: source.to_string(),
            code,
            source: Some(source),
        }
    }

    pub fn kind(&self) -> MailErrorKind {
        match self {
            Self::InvalidRequest(_) => MailErrorKind::InvalidRequest,
            Self::Unauthorized(_) => MailErrorKind::Unauthorized,
            Self::Delivery(_) => MailErrorKind::Delivery,
            Self::Unexpected { .. } => MailErrorKind::Unexpected,
        }
    }

    /// エラーコードを返す
    ///
    /// 分類済みの 3 種別は 0、`Unexpected` は保持しているコード。
    pub fn code(&self) -> i32 {
        match self {
            Self::Unexpected { code, .. } => *code,
            _ => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::InvalidRequest(message)
            | Self::Unauthorized(message)
            | Self::Delivery(message)
            | Self::Unexpected { message, .. } => message,
        }
    }
}

fn or_default(message: Option<String>, default: &str) -> String {
    message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| default.to_string())
}
