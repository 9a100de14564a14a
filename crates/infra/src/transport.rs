//! # トランスポート
//!
//! 組み立て済みのリクエストを各プロバイダへ送信し、応答をそのまま返す層。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: プロバイダごとに送信トレイトを定義し、アダプタは
//!   トレイト経由でのみ通信する。テストでは [`mock`](crate::mock) の偽実装に差し替える
//! - **応答の解釈はしない**: ステータスコードや応答コードの分類はアダプタ側の責務
//! - **タイムアウトはここで扱う**: HTTP クライアントに [`REQUEST_TIMEOUT`] を設定する

use std::time::Duration;

pub mod mailgun;
pub mod sendinblue;
pub mod ses;

pub use mailgun::{
    MailgunFile,
    MailgunFileField,
    MailgunMessage,
    MailgunResponse,
    MailgunTransport,
    ReqwestMailgunTransport,
};
pub use sendinblue::{
    ReqwestSendinblueTransport,
    SendinbluePayload,
    SendinblueResponse,
    SendinblueTransport,
};
pub use ses::{AwsSesTransport, SesFailure, SesRawRequest, SesTransport};

/// HTTP リクエストのタイムアウト
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// タイムアウト設定済みの HTTP クライアントを作成する
pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()
}
