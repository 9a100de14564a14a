//! SendinBlue トランスポート
//!
//! SendinBlue API v2.0 の `POST {base_url}/email` に JSON で送信する。
//! 認証は `api-key` ヘッダ。
//!
//! SendinBlue は失敗時も JSON ボディの `code` で結果を返すため、
//! HTTP ステータスでは判定せずボディをそのまま返す。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    error::TransportError,
    mapping::{AddressMap, EncodedFiles},
};

/// SendinBlue API の既定のベース URL
pub const DEFAULT_BASE_URL: &str = "https://api.sendinblue.com/v2.0";

const API_KEY_HEADER: &str = "api-key";

/// SendinBlue に送信するペイロード
///
/// 値の無いフィールド（空の宛先リストや添付なし）は JSON から省略する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendinbluePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to:           Option<AddressMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cc:           Option<AddressMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bcc:          Option<AddressMap>,
    pub from:         AddressMap,
    #[serde(rename = "replyto", skip_serializing_if = "Option::is_none")]
    pub reply_to:     Option<AddressMap>,
    pub subject:      String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text:         Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html:         Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attachment:   Option<EncodedFiles>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inline_image: Option<EncodedFiles>,
}

/// SendinBlue の応答ボディ
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SendinblueResponse {
    /// `"success"` / `"failure"` / `"error"`
    pub code:    Option<String>,
    pub message: Option<String>,
}

/// SendinBlue への送信トレイト
#[async_trait]
pub trait SendinblueTransport: Send + Sync {
    /// ペイロードを送信し、応答ボディを返す
    ///
    /// 応答ボディが無い、または JSON として解釈できない場合は `Ok(None)`。
    async fn send_email(
        &self,
        payload: &SendinbluePayload,
    ) -> Result<Option<SendinblueResponse>, TransportError>;
}

/// reqwest による SendinBlue トランスポート
pub struct ReqwestSendinblueTransport {
    access_key: String,
    base_url:   String,
    client:     reqwest::Client,
}

impl ReqwestSendinblueTransport {
    /// 新しいトランスポートを作成する
    ///
    /// # 引数
    ///
    /// - `access_key`: SendinBlue のアクセスキー
    /// - `base_url`: API のベース URL（例: `https://api.sendinblue.com/v2.0`）
    pub fn new(access_key: impl Into<String>, base_url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            access_key: access_key.into(),
            base_url:   base_url.trim_end_matches('/').to_string(),
            client:     super::http_client()?,
        })
    }
}

#[async_trait]
impl SendinblueTransport for ReqwestSendinblueTransport {
    #[tracing::instrument(skip_all, level = "debug")]
    async fn send_email(
        &self,
        payload: &SendinbluePayload,
    ) -> Result<Option<SendinblueResponse>, TransportError> {
        let response = self
            .client
            .post(format!("{}/email", self.base_url))
            .header(API_KEY_HEADER, &self.access_key)
            .json(payload)
            .send()
            .await?;

        read_response(response).await
    }
}

/// HTTP 応答ボディを [`SendinblueResponse`] として読む
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> Result<Option<SendinblueResponse>, TransportError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str(&body).ok())
}
