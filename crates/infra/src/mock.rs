//! # テスト用モック
//!
//! 送信アダプタのテストで使用する偽トランスポートと記録用ロガー。
//! `test-utils` feature を有効にすることで、他クレートからも利用可能。
//!
//! ```toml
//! [dev-dependencies]
//! omnimail-infra = { workspace = true, features = ["test-utils"] }
//! ```

use std::{
    io,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use omnimail_domain::Email;

use crate::{
    error::TransportError,
    logger::EmailLogger,
    transport::{
        MailgunMessage,
        MailgunResponse,
        MailgunTransport,
        SendinbluePayload,
        SendinblueResponse,
        SendinblueTransport,
        SesFailure,
        SesRawRequest,
        SesTransport,
    },
};

// ===== RecordingLogger =====

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub level:   LogLevel,
    pub message: String,
    /// ログ出力時に渡されたメールの件名
    pub subject: String,
}

/// 呼び出しを記録するロガー
#[derive(Clone, Default)]
pub struct RecordingLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl RecordingLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().unwrap().clone()
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages(LogLevel::Info)
    }

    pub fn errors(&self) -> Vec<String> {
        self.messages(LogLevel::Error)
    }

    fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.level == level)
            .map(|e| e.message)
            .collect()
    }

    fn record(&self, level: LogLevel, message: &str, context: &Email) {
        self.entries.lock().unwrap().push(LogEntry {
            level,
            message: message.to_string(),
            subject: context.subject().to_string(),
        });
    }
}

impl EmailLogger for RecordingLogger {
    fn info(&self, message: &str, context: &Email) {
        self.record(LogLevel::Info, message, context);
    }

    fn error(&self, message: &str, context: &Email) {
        self.record(LogLevel::Error, message, context);
    }
}

// ===== FakeMailgunTransport =====

/// [`FakeMailgunTransport`] が受け取ったリクエスト
#[derive(Debug, Clone)]
pub struct SentMailgunMessage {
    pub domain:        String,
    pub message:       MailgunMessage,
    /// 送信時点での各ファイルの内容（`message.files` と同じ順）
    pub file_contents: Vec<Vec<u8>>,
}

#[derive(Debug, Clone)]
enum MailgunReply {
    Status { status: u16, message: Option<String> },
    /// OS エラー番号を持つ I/O エラー
    Fail(i32),
}

/// 固定の応答を返す Mailgun トランスポート
#[derive(Clone)]
pub struct FakeMailgunTransport {
    reply: MailgunReply,
    sent:  Arc<Mutex<Vec<SentMailgunMessage>>>,
}

impl FakeMailgunTransport {
    pub fn with_status(status: u16) -> Self {
        Self {
            reply: MailgunReply::Status {
                status,
                message: None,
            },
            sent:  Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 通信に失敗するトランスポート
    pub fn failing(raw_os_error: i32) -> Self {
        Self {
            reply: MailgunReply::Fail(raw_os_error),
            sent:  Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 応答ボディの `message` を設定する
    pub fn with_message(mut self, text: &str) -> Self {
        if let MailgunReply::Status { message, .. } = &mut self.reply {
            *message = Some(text.to_string());
        }
        self
    }

    pub fn sent(&self) -> Vec<SentMailgunMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailgunTransport for FakeMailgunTransport {
    async fn post_message(
        &self,
        domain: &str,
        message: &MailgunMessage,
    ) -> Result<MailgunResponse, TransportError> {
        let file_contents = message
            .files
            .iter()
            .map(|file| std::fs::read(&file.path).unwrap_or_default())
            .collect();
        self.sent.lock().unwrap().push(SentMailgunMessage {
            domain: domain.to_string(),
            message: message.clone(),
            file_contents,
        });

        match &self.reply {
            MailgunReply::Status { status, message } => Ok(MailgunResponse {
                status:  *status,
                message: message.clone(),
            }),
            MailgunReply::Fail(code) => Err(io::Error::from_raw_os_error(*code).into()),
        }
    }
}

// ===== FakeSendinblueTransport =====

#[derive(Debug, Clone)]
enum SendinblueReply {
    Body(Option<SendinblueResponse>),
    Fail(i32),
}

/// 固定の応答を返す SendinBlue トランスポート
#[derive(Clone)]
pub struct FakeSendinblueTransport {
    reply: SendinblueReply,
    sent:  Arc<Mutex<Vec<SendinbluePayload>>>,
}

impl FakeSendinblueTransport {
    /// 指定した応答ボディを返す（`None` は応答ボディなし）
    pub fn replying(response: Option<SendinblueResponse>) -> Self {
        Self {
            reply: SendinblueReply::Body(response),
            sent:  Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// 指定した `code` と `message` を持つ応答を返す
    pub fn with_code(code: &str, message: &str) -> Self {
        Self::replying(Some(SendinblueResponse {
            code:    Some(code.to_string()),
            message: Some(message.to_string()),
        }))
    }

    pub fn success() -> Self {
        Self::with_code("success", "Email sent successfully.")
    }

    /// 通信に失敗するトランスポート
    pub fn failing(raw_os_error: i32) -> Self {
        Self {
            reply: SendinblueReply::Fail(raw_os_error),
            sent:  Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent(&self) -> Vec<SendinbluePayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SendinblueTransport for FakeSendinblueTransport {
    async fn send_email(
        &self,
        payload: &SendinbluePayload,
    ) -> Result<Option<SendinblueResponse>, TransportError> {
        self.sent.lock().unwrap().push(payload.clone());

        match &self.reply {
            SendinblueReply::Body(response) => Ok(response.clone()),
            SendinblueReply::Fail(code) => Err(io::Error::from_raw_os_error(*code).into()),
        }
    }
}

// ===== FakeSesTransport =====

/// 固定の結果を返す SES トランスポート
#[derive(Clone, Default)]
pub struct FakeSesTransport {
    failure: Option<(Option<String>, String)>,
    sent:    Arc<Mutex<Vec<SesRawRequest>>>,
}

impl FakeSesTransport {
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// SES のエラーコードとメッセージで失敗する
    pub fn failing(code: Option<&str>, message: &str) -> Self {
        Self {
            failure: Some((code.map(str::to_string), message.to_string())),
            sent:    Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn sent(&self) -> Vec<SesRawRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SesTransport for FakeSesTransport {
    async fn send_raw(&self, request: SesRawRequest) -> Result<(), SesFailure> {
        self.sent.lock().unwrap().push(request);

        match &self.failure {
            Some((code, message)) => Err(SesFailure::new(code.as_deref(), message.clone())),
            None => Ok(()),
        }
    }
}
