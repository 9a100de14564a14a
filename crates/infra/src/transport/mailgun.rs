//! Mailgun トランスポート
//!
//! `POST {base_url}/v3/{domain}/messages` に multipart/form-data で送信する。
//! 認証は Basic 認証（ユーザー名 `api`、パスワードに API キー）。

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

use crate::error::TransportError;

/// Mailgun API の既定のベース URL（US リージョン）
pub const DEFAULT_BASE_URL: &str = "https://api.mailgun.net";

/// 送信するファイルのフォームフィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailgunFileField {
    /// 通常添付（`attachment`）
    Attachment,
    /// インライン画像（`inline`）
    Inline,
}

impl MailgunFileField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Attachment => "attachment",
            Self::Inline => "inline",
        }
    }
}

/// 送信するファイル 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailgunFile {
    pub field:     MailgunFileField,
    /// 読み出すファイルのパス（一時ファイルの場合もある）
    pub path:      PathBuf,
    /// 受信側に見えるファイル名（インライン画像では Content-ID）
    pub file_name: String,
}

/// 組み立て済みの Mailgun メッセージ
///
/// `fields` は同じキーを複数回含みうる（`to` / `cc` / `bcc` は 1 アドレスずつ追加する）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailgunMessage {
    pub fields: Vec<(String, String)>,
    pub files:  Vec<MailgunFile>,
}

impl MailgunMessage {
    pub fn push_field(&mut self, key: &str, value: impl Into<String>) {
        self.fields.push((key.to_string(), value.into()));
    }

    /// 指定キーの値をすべて返す
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

/// Mailgun の応答
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailgunResponse {
    /// HTTP ステータスコード
    pub status:  u16,
    /// 応答ボディの `message`（JSON で無い場合は `None`）
    pub message: Option<String>,
}

/// Mailgun への送信トレイト
#[async_trait]
pub trait MailgunTransport: Send + Sync {
    /// メッセージを送信し、応答をそのまま返す
    ///
    /// ステータスコードの解釈は行わない。通信自体の失敗のみ `Err` になる。
    async fn post_message(
        &self,
        domain: &str,
        message: &MailgunMessage,
    ) -> Result<MailgunResponse, TransportError>;
}

/// reqwest による Mailgun トランスポート
pub struct ReqwestMailgunTransport {
    api_key:  String,
    base_url: String,
    client:   reqwest::Client,
}

impl ReqwestMailgunTransport {
    /// 新しいトランスポートを作成する
    ///
    /// # 引数
    ///
    /// - `api_key`: Mailgun の API キー
    /// - `base_url`: API のベース URL（例: `https://api.eu.mailgun.net`）
    pub fn new(api_key: impl Into<String>, base_url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            api_key:  api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client:   super::http_client()?,
        })
    }

    fn messages_url(&self, domain: &str) -> String {
        format!("{}/v3/{}/messages", self.base_url, domain)
    }

    async fn build_form(message: &MailgunMessage) -> Result<Form, TransportError> {
        let mut form = Form::new();

        for (key, value) in &message.fields {
            form = form.text(key.clone(), value.clone());
        }

        for file in &message.files {
            let bytes = tokio::fs::read(&file.path).await?;
            let part = Part::bytes(bytes).file_name(file.file_name.clone());
            form = form.part(file.field.as_str(), part);
        }

        Ok(form)
    }
}

#[async_trait]
impl MailgunTransport for ReqwestMailgunTransport {
    #[tracing::instrument(skip_all, level = "debug", fields(%domain))]
    async fn post_message(
        &self,
        domain: &str,
        message: &MailgunMessage,
    ) -> Result<MailgunResponse, TransportError> {
        let form = Self::build_form(message).await?;

        let response = self
            .client
            .post(self.messages_url(domain))
            .basic_auth("api", Some(&self.api_key))
            .multipart(form)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Mailgun のエラー応答ボディ（`{"message": "..."}`）
#[derive(Debug, Deserialize)]
struct MailgunBody {
    message: Option<String>,
}

/// HTTP 応答をステータスコードと `message` に分解する
///
/// ボディが JSON で無い場合も失敗にはせず、`message` を `None` とする。
pub(crate) async fn read_response(
    response: reqwest::Response,
) -> Result<MailgunResponse, TransportError> {
    let status = response.status().as_u16();
    let body = response.text().await?;

    let message = serde_json::from_str::<MailgunBody>(&body)
        .ok()
        .and_then(|b| b.message);

    Ok(MailgunResponse { status, message })
}
