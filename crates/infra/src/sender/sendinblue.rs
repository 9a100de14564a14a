//! SendinBlue 送信実装
//!
//! メールを SendinBlue の JSON ペイロードに変換して送信する。
//! 添付は base64 に変換してペイロードに埋め込むため、一時ファイルは作らない。

use std::sync::Arc;

use async_trait::async_trait;
use omnimail_domain::{Attachment, Email, MailError, UNKNOWN_ERROR_CODE};

use super::EmailSender;
use crate::{
    error::TransportError,
    logger::{self, EmailLogger},
    mapping::{address_entry, address_map, encode_attachments, inline_key},
    transport::{
        ReqwestSendinblueTransport,
        SendinbluePayload,
        SendinblueResponse,
        SendinblueTransport,
    },
};

/// SendinBlue の応答の解釈
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendinblueOutcome {
    /// `code` が `"success"`
    Success,
    /// `code` が `"failure"` または `"error"`
    Rejected(Option<String>),
    /// 応答ボディ、または `code` が無い
    Missing,
    /// 上記以外の `code`
    Unknown(String),
}

impl SendinblueOutcome {
    pub fn from_response(response: Option<&SendinblueResponse>) -> Self {
        let Some(response) = response else {
            return Self::Missing;
        };
        match response.code.as_deref() {
            None | Some("") => Self::Missing,
            Some("success") => Self::Success,
            Some("failure" | "error") => Self::Rejected(response.message.clone()),
            Some(other) => Self::Unknown(other.to_string()),
        }
    }

    fn into_result(self) -> Result<(), MailError> {
        match self {
            Self::Success => Ok(()),
            Self::Rejected(message) => Err(MailError::invalid_request(message)),
            Self::Missing => Err(MailError::unexpected("Unknown exception", UNKNOWN_ERROR_CODE)),
            Self::Unknown(code) => {
                tracing::warn!(%code, "SendinBlue が想定外の応答コードを返した");
                Err(MailError::unexpected("Unknown error", UNKNOWN_ERROR_CODE))
            }
        }
    }
}

/// SendinBlue 送信
pub struct SendinblueEmailSender {
    transport: Arc<dyn SendinblueTransport>,
    logger:    Option<Arc<dyn EmailLogger>>,
}

impl SendinblueEmailSender {
    pub fn new(
        transport: Arc<dyn SendinblueTransport>,
        logger: Option<Arc<dyn EmailLogger>>,
    ) -> Self {
        Self { transport, logger }
    }

    /// アクセスキーから、reqwest で通信する送信インスタンスを作成
    ///
    /// `base_url` は通常 [`DEFAULT_BASE_URL`](crate::transport::sendinblue::DEFAULT_BASE_URL)。
    pub fn with_access_key(
        access_key: impl Into<String>,
        base_url: &str,
        logger: Option<Arc<dyn EmailLogger>>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestSendinblueTransport::new(access_key, base_url)?;
        Ok(Self::new(Arc::new(transport), logger))
    }

    async fn try_send(&self, email: &Email) -> Result<(), MailError> {
        let payload = build_payload(email).await?;
        let response = self.transport.send_email(&payload).await?;
        SendinblueOutcome::from_response(response.as_ref()).into_result()
    }
}

#[async_trait]
impl EmailSender for SendinblueEmailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(provider = "sendinblue"))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let result = self.try_send(email).await;
        logger::report(self.logger.as_ref(), email, &result);
        result
    }
}

/// メールを SendinBlue のペイロードに変換する
pub(crate) async fn build_payload(email: &Email) -> Result<SendinbluePayload, TransportError> {
    let (regular, inline) = Attachment::partition(email.attachments());

    Ok(SendinbluePayload {
        to:           address_map(email.to()),
        cc:           address_map(email.cc()),
        bcc:          address_map(email.bcc()),
        from:         [address_entry(email.from())].into_iter().collect(),
        reply_to:     address_map(email.reply_to()),
        subject:      email.subject().to_string(),
        text:         email.text_body().map(str::to_string),
        html:         email.html_body().map(str::to_string),
        attachment:   encode_attachments(&regular, Attachment::name).await?,
        inline_image: encode_attachments(&inline, inline_key).await?,
    })
}
