//! Mailgun 送信実装
//!
//! メールを Mailgun のフォームフィールドに変換して送信する。
//! メモリ上の内容しか持たない添付は一時ファイルに書き出してから送る。

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use omnimail_domain::{Attachment, AttachmentSource, Email, MailError, UNKNOWN_ERROR_CODE};

use super::EmailSender;
use crate::{
    error::TransportError,
    logger::{self, EmailLogger},
    mapping::{format_address, join_addresses},
    temp_file::TempFileSet,
    transport::{
        MailgunFile,
        MailgunFileField,
        MailgunMessage,
        MailgunTransport,
        ReqwestMailgunTransport,
    },
};

/// Mailgun の HTTP ステータスの解釈
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailgunOutcome {
    Success,
    InvalidRequest,
    Unauthorized,
    DeliveryFailed,
    Unknown(u16),
}

impl MailgunOutcome {
    pub fn from_status(status: u16) -> Self {
        match status {
            200 => Self::Success,
            400 => Self::InvalidRequest,
            401 => Self::Unauthorized,
            402 => Self::DeliveryFailed,
            other => Self::Unknown(other),
        }
    }

    /// 送信結果に変換する
    ///
    /// `message` は応答ボディの `message`。分類済みのエラーのメッセージとして使う。
    fn into_result(self, message: Option<String>) -> Result<(), MailError> {
        match self {
            Self::Success => Ok(()),
            Self::InvalidRequest => Err(MailError::invalid_request(message)),
            Self::Unauthorized => Err(MailError::unauthorized(message)),
            Self::DeliveryFailed => Err(MailError::delivery(message)),
            Self::Unknown(status) => {
                tracing::warn!(status, "Mailgun が想定外のステータスを返した");
                Err(MailError::unexpected("Unknown error", UNKNOWN_ERROR_CODE))
            }
        }
    }
}

/// Mailgun 送信
pub struct MailgunEmailSender {
    domain:    String,
    transport: Arc<dyn MailgunTransport>,
    logger:    Option<Arc<dyn EmailLogger>>,
}

impl MailgunEmailSender {
    /// 新しい Mailgun 送信インスタンスを作成
    ///
    /// # 引数
    ///
    /// - `domain`: Mailgun に登録済みの送信ドメイン
    /// - `transport`: Mailgun API への送信を行うトランスポート
    /// - `logger`: 送信結果のロガー（不要なら `None`）
    pub fn new(
        domain: impl Into<String>,
        transport: Arc<dyn MailgunTransport>,
        logger: Option<Arc<dyn EmailLogger>>,
    ) -> Self {
        Self {
            domain: domain.into(),
            transport,
            logger,
        }
    }

    /// API キーと送信ドメインから、reqwest で通信する送信インスタンスを作成
    ///
    /// `base_url` は [`DEFAULT_BASE_URL`](crate::transport::mailgun::DEFAULT_BASE_URL)（US リージョン）または
    /// `https://api.eu.mailgun.net`（EU リージョン）。
    pub fn with_api_key(
        api_key: impl Into<String>,
        domain: impl Into<String>,
        base_url: &str,
        logger: Option<Arc<dyn EmailLogger>>,
    ) -> Result<Self, TransportError> {
        let transport = ReqwestMailgunTransport::new(api_key, base_url)?;
        Ok(Self::new(domain, Arc::new(transport), logger))
    }

    async fn try_send(&self, email: &Email, temp_files: &mut TempFileSet) -> Result<(), MailError> {
        let message = build_message(email, temp_files)?;
        let response = self.transport.post_message(&self.domain, &message).await?;
        MailgunOutcome::from_status(response.status).into_result(response.message)
    }
}

#[async_trait]
impl EmailSender for MailgunEmailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(provider = "mailgun", domain = %self.domain))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let mut temp_files = TempFileSet::new();

        let result = self.try_send(email, &mut temp_files).await;
        logger::report(self.logger.as_ref(), email, &result);

        temp_files.release();
        result
    }
}

/// メールを Mailgun のフォームフィールドとファイルに変換する
///
/// メモリ上の内容から作成した一時ファイルは `temp_files` が所有する。
pub(crate) fn build_message(
    email: &Email,
    temp_files: &mut TempFileSet,
) -> Result<MailgunMessage, TransportError> {
    let mut message = MailgunMessage::default();

    message.push_field("from", format_address(email.from()));
    for (key, addresses) in [("to", email.to()), ("cc", email.cc()), ("bcc", email.bcc())] {
        for address in addresses {
            message.push_field(key, format_address(address));
        }
    }
    if let Some(reply_to) = join_addresses(email.reply_to()) {
        message.push_field("h:Reply-To", reply_to);
    }
    message.push_field("subject", email.subject());
    if let Some(text) = email.text_body() {
        message.push_field("text", text);
    }
    if let Some(html) = email.html_body() {
        message.push_field("html", html);
    }

    let (regular, inline) = Attachment::partition(email.attachments());
    for attachment in regular {
        if let Some(path) = file_path(attachment, temp_files)? {
            message.files.push(MailgunFile {
                field: MailgunFileField::Attachment,
                path,
                file_name: attachment.name().to_string(),
            });
        }
    }
    for attachment in inline {
        if let Some(path) = file_path(attachment, temp_files)? {
            message.files.push(MailgunFile {
                field: MailgunFileField::Inline,
                path,
                file_name: attachment.content_id().unwrap_or_default().to_string(),
            });
        }
    }

    Ok(message)
}

/// 添付ファイルの送信元パスを決める（読み出し元が無ければ `None`）
fn file_path(
    attachment: &Attachment,
    temp_files: &mut TempFileSet,
) -> Result<Option<PathBuf>, TransportError> {
    match attachment.source() {
        Some(AttachmentSource::Path(path)) => Ok(Some(path.to_path_buf())),
        Some(AttachmentSource::Content(content)) => Ok(Some(temp_files.create(content)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use omnimail_domain::MailErrorKind;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;
    use crate::mock::{FakeMailgunTransport, LogLevel, RecordingLogger};

    fn make_sender(transport: &FakeMailgunTransport, logger: &RecordingLogger) -> MailgunEmailSender {
        MailgunEmailSender::new(
            "mg.example.com",
            Arc::new(transport.clone()),
            Some(Arc::new(logger.clone())),
        )
    }

    fn make_email() -> Email {
        Email::new(("from@example.com", "送信者"))
            .add_to(("to@example.com", "宛先"))
            .with_subject("月次レポート")
            .with_text_body("本文")
    }

    #[rstest]
    #[case::成功(200, None)]
    #[case::リクエスト不正(400, Some(MailErrorKind::InvalidRequest))]
    #[case::認証失敗(401, Some(MailErrorKind::Unauthorized))]
    #[case::配信不可(402, Some(MailErrorKind::Delivery))]
    #[case::想定外(500, Some(MailErrorKind::Unexpected))]
    #[case::存在しないドメイン(404, Some(MailErrorKind::Unexpected))]
    #[tokio::test]
    async fn ステータスコードをエラー種別に変換する(
        #[case] status: u16,
        #[case] expected: Option<MailErrorKind>,
    ) {
        let transport = FakeMailgunTransport::with_status(status);
        let logger = RecordingLogger::new();
        let sender = make_sender(&transport, &logger);

        let result = sender.send(&make_email()).await;

        assert_eq!(result.as_ref().err().map(MailError::kind), expected);
        assert_eq!(logger.entries().len(), 1);
    }

    #[test]
    fn api_keyとベースurlから送信インスタンスを作成できる() {
        let sender = MailgunEmailSender::with_api_key(
            "key-xxx",
            "mg.example.com",
            crate::transport::mailgun::DEFAULT_BASE_URL,
            None,
        )
        .unwrap();

        assert_eq!(sender.domain, "mg.example.com");
        assert!(sender.logger.is_none());
    }

    #[tokio::test]
    async fn 未知のステータスはコード603を返す() {
        let transport = FakeMailgunTransport::with_status(503);
        let sender = make_sender(&transport, &RecordingLogger::new());

        let err = sender.send(&make_email()).await.unwrap_err();

        assert_eq!(err.code(), UNKNOWN_ERROR_CODE);
        assert_eq!(err.message(), "Unknown error");
    }

    #[tokio::test]
    async fn 成功時は件名を含むinfoを1回出力する() {
        let transport = FakeMailgunTransport::with_status(200);
        let logger = RecordingLogger::new();
        let sender = make_sender(&transport, &logger);

        sender.send(&make_email()).await.unwrap();

        assert_eq!(logger.infos(), vec!["Email sent: '月次レポート'".to_string()]);
        assert!(logger.errors().is_empty());
        assert_eq!(transport.sent()[0].domain, "mg.example.com");
    }

    #[tokio::test]
    async fn 失敗時はプロバイダのメッセージでerrorを出力する() {
        let transport = FakeMailgunTransport::with_status(400).with_message("'to' parameter is missing");
        let logger = RecordingLogger::new();
        let sender = make_sender(&transport, &logger);

        let err = sender.send(&make_email()).await.unwrap_err();

        assert_eq!(err.kind(), MailErrorKind::InvalidRequest);
        assert_eq!(err.message(), "'to' parameter is missing");
        let entries = logger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[0].message, "Email error: ''to' parameter is missing'");
    }

    #[tokio::test]
    async fn 通信エラーはコードを保持したunexpectedになる() {
        let transport = FakeMailgunTransport::failing(111);
        let logger = RecordingLogger::new();
        let sender = make_sender(&transport, &logger);

        let err = sender.send(&make_email()).await.unwrap_err();

        assert_eq!(err.kind(), MailErrorKind::Unexpected);
        assert_eq!(err.code(), 111);
        assert_eq!(err.message(), std::io::Error::from_raw_os_error(111).to_string());
        assert_eq!(logger.errors().len(), 1);
    }

    #[test]
    fn 宛先と本文をフォームフィールドに変換する() {
        let email = Email::new(("from@example.com", "送信者"))
            .add_to(("a@example.com", "A"))
            .add_to("b@example.com")
            .add_cc("c@example.com")
            .add_bcc("d@example.com")
            .add_bcc("e@example.com")
            .add_reply_to(("r1@example.com", "R1"))
            .add_reply_to("r2@example.com")
            .with_subject("件名")
            .with_text_body("")
            .with_html_body("<p>本文</p>");
        let mut temp_files = TempFileSet::new();

        let message = build_message(&email, &mut temp_files).unwrap();

        assert_eq!(message.values("from"), vec!["\"送信者\" <from@example.com>"]);
        assert_eq!(message.values("to"), vec!["\"A\" <a@example.com>", "b@example.com"]);
        assert_eq!(message.values("cc"), vec!["c@example.com"]);
        assert_eq!(message.values("bcc"), vec!["d@example.com", "e@example.com"]);
        assert_eq!(
            message.values("h:Reply-To"),
            vec!["\"R1\" <r1@example.com>, r2@example.com"]
        );
        assert_eq!(message.values("subject"), vec!["件名"]);
        assert!(message.values("text").is_empty());
        assert_eq!(message.values("html"), vec!["<p>本文</p>"]);
        assert!(message.files.is_empty());
    }

    #[test]
    fn reply_toが無ければヘッダを付けない() {
        let mut temp_files = TempFileSet::new();

        let message = build_message(&make_email(), &mut temp_files).unwrap();

        assert!(message.values("h:Reply-To").is_empty());
    }

    #[test]
    fn 添付を通常添付とインライン画像に振り分ける() {
        let email = make_email()
            .add_attachment(Attachment::from_path("report.pdf", "/srv/files/report.pdf"))
            .add_attachment(Attachment::from_content("logo.png", b"png".to_vec()).with_content_id("logo"))
            .add_attachment(Attachment::new("empty.txt"));
        let mut temp_files = TempFileSet::new();

        let message = build_message(&email, &mut temp_files).unwrap();

        assert_eq!(message.files.len(), 2);
        assert_eq!(message.files[0].field, MailgunFileField::Attachment);
        assert_eq!(message.files[0].path, PathBuf::from("/srv/files/report.pdf"));
        assert_eq!(message.files[0].file_name, "report.pdf");
        assert_eq!(message.files[1].field, MailgunFileField::Inline);
        assert_eq!(message.files[1].file_name, "logo");
        // パス指定の添付と読み出し元の無い添付は一時ファイルを作らない
        assert_eq!(temp_files.len(), 1);
    }

    #[tokio::test]
    async fn 一時ファイルは送信後に削除される() {
        let transport = FakeMailgunTransport::with_status(200);
        let sender = make_sender(&transport, &RecordingLogger::new());
        let email = make_email()
            .add_attachment(Attachment::from_content("a.txt", b"hello".to_vec()))
            .add_attachment(Attachment::from_content("b.png", b"png".to_vec()).with_content_id("b"));

        sender.send(&email).await.unwrap();

        let sent = transport.sent();
        assert_eq!(sent[0].file_contents, vec![b"hello".to_vec(), b"png".to_vec()]);
        for file in &sent[0].message.files {
            assert!(!file.path.exists(), "{} が残っている", file.path.display());
        }
    }

    #[tokio::test]
    async fn 失敗時も一時ファイルは削除される() {
        let transport = FakeMailgunTransport::with_status(402);
        let sender = make_sender(&transport, &RecordingLogger::new());
        let email = make_email().add_attachment(Attachment::from_content("a.txt", b"hello".to_vec()));

        let err = sender.send(&email).await.unwrap_err();

        assert_eq!(err.kind(), MailErrorKind::Delivery);
        let sent = transport.sent();
        assert_eq!(sent[0].file_contents, vec![b"hello".to_vec()]);
        assert!(!sent[0].message.files[0].path.exists());
    }

    #[tokio::test]
    async fn 通信エラー時も一時ファイルは削除される() {
        let transport = FakeMailgunTransport::failing(104);
        let sender = make_sender(&transport, &RecordingLogger::new());
        let email = make_email().add_attachment(Attachment::from_content("a.txt", b"hello".to_vec()));

        sender.send(&email).await.unwrap_err();

        assert!(!transport.sent()[0].message.files[0].path.exists());
    }

    #[test]
    fn 同じメールからは同じメッセージを組み立てる() {
        let email = make_email()
            .add_cc(("c@example.com", "C"))
            .add_attachment(Attachment::from_content("a.txt", b"hello".to_vec()));
        let mut first_files = TempFileSet::new();
        let mut second_files = TempFileSet::new();

        let first = build_message(&email, &mut first_files).unwrap();
        let second = build_message(&email, &mut second_files).unwrap();

        assert_eq!(first.fields, second.fields);
        assert_eq!(
            std::fs::read(&first.files[0].path).unwrap(),
            std::fs::read(&second.files[0].path).unwrap()
        );
        assert_eq!(first.files[0].file_name, second.files[0].file_name);
    }
}
