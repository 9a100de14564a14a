//! # トランスポート層エラー定義
//!
//! プロバイダとの通信や添付ファイルの読み書きで発生するエラーを表現する。
//!
//! これらはプロバイダが返した「分類可能な失敗」ではなく、送信処理そのものの失敗である。
//! アダプタの境界で [`MailError::Unexpected`] に包んで呼び出し側へ返す。

use omnimail_domain::MailError;
use thiserror::Error;

/// トランスポート層で発生するエラー
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP 通信エラー（接続失敗、タイムアウトなど）
    #[error("HTTP 通信エラー: {0}")]
    Http(#[from] reqwest::Error),

    /// 添付ファイルの読み書きエラー
    #[error("I/O エラー: {0}")]
    Io(#[from] std::io::Error),

    /// メッセージ組み立てエラー
    ///
    /// MIME メッセージやリクエストの構築に失敗した場合に使用する。
    #[error("メッセージ組み立てエラー: {0}")]
    Build(String),
}

impl TransportError {
    /// 元のエラーが持つ数値コードを返す
    ///
    /// - HTTP: ステータスコード（応答が無ければ 0）
    /// - I/O: OS のエラー番号（無ければ 0）
    pub fn code(&self) -> i32 {
        match self {
            Self::Http(e) => e.status().map_or(0, |s| i32::from(s.as_u16())),
            Self::Io(e) => e.raw_os_error().unwrap_or(0),
            Self::Build(_) => 0,
        }
    }

    /// 元のエラーのメッセージ（種別の接頭辞を含まない）
    pub fn inner_message(&self) -> String {
        match self {
            Self::Http(e) => e.to_string(),
            Self::Io(e) => e.to_string(),
            Self::Build(message) => message.clone(),
        }
    }
}

impl From<TransportError> for MailError {
    fn from(err: TransportError) -> Self {
        MailError::Unexpected {
            message: err.inner_message(),
            code:    err.code(),
            source:  Some(Box::new(err)),
        }
    }
}
