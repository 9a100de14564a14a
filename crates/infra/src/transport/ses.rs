//! Amazon SES トランスポート
//!
//! AWS SES v2 API の `SendEmail` に、組み立て済みの MIME メッセージ（Raw）を渡して送信する。

use async_trait::async_trait;
use aws_sdk_sesv2::{
    Client,
    error::{DisplayErrorContext, ProvideErrorMetadata},
    primitives::Blob,
    types::{Destination, EmailContent, RawMessage},
};
use omnimail_domain::error::BoxError;
use thiserror::Error;

/// SES に渡す Raw メッセージ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SesRawRequest {
    /// エンベロープの送信元
    pub from: String,
    pub to:   Vec<String>,
    pub cc:   Vec<String>,
    pub bcc:  Vec<String>,
    /// RFC 5322 形式のメッセージ本体
    pub raw:  Vec<u8>,
}

/// SES 呼び出しの失敗
///
/// `code` は SES のエラーコード（`MessageRejected` など）。
/// 通信エラーなどでコードが得られない場合は `None`。
#[derive(Debug, Error)]
#[error("{message}")]
pub struct SesFailure {
    pub code:    Option<String>,
    pub message: String,
    #[source]
    pub source:  Option<BoxError>,
}

impl SesFailure {
    pub fn new(code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code:    code.map(str::to_string),
            message: message.into(),
            source:  None,
        }
    }
}

/// SES への送信トレイト
#[async_trait]
pub trait SesTransport: Send + Sync {
    async fn send_raw(&self, request: SesRawRequest) -> Result<(), SesFailure>;
}

/// AWS SDK による SES トランスポート
pub struct AwsSesTransport {
    client: Client,
}

impl AwsSesTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// AWS の標準的な認証情報チェーンからクライアントを作成する
    ///
    /// 環境変数、共有設定ファイル、インスタンスプロファイルの順で解決される。
    pub async fn from_env() -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .load()
            .await;
        Self::new(Client::new(&config))
    }
}

#[async_trait]
impl SesTransport for AwsSesTransport {
    #[tracing::instrument(skip_all, level = "debug", fields(from = %request.from))]
    async fn send_raw(&self, request: SesRawRequest) -> Result<(), SesFailure> {
        let SesRawRequest {
            from,
            to,
            cc,
            bcc,
            raw,
        } = request;

        let destination = Destination::builder()
            .set_to_addresses(Some(to))
            .set_cc_addresses(Some(cc))
            .set_bcc_addresses(Some(bcc))
            .build();

        let raw_message = RawMessage::builder()
            .data(Blob::new(raw))
            .build()
            .map_err(|e| SesFailure::new(None, format!("Raw メッセージ構築失敗: {e}")))?;

        self.client
            .send_email()
            .from_email_address(from)
            .destination(destination)
            .content(EmailContent::builder().raw(raw_message).build())
            .send()
            .await
            .map_err(|e| {
                let detail = DisplayErrorContext(&e).to_string();
                let service = e.into_service_error();
                SesFailure {
                    code:    service.code().map(str::to_string),
                    message: service.message().map_or(detail, str::to_string),
                    source:  Some(Box::new(service)),
                }
            })?;

        Ok(())
    }
}
