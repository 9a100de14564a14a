//! 送信フローの統合テスト
//!
//! 公開 API のみを使い、トランスポートを差し替えてアダプタ全体の動作を確認する。
//! ネットワークには接続しない。
//!
//! 実行方法:
//! ```bash
//! cargo test -p omnimail-infra --test send_flow_test
//! ```

use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use omnimail_domain::{Attachment, Email, MailErrorKind};
use omnimail_infra::{
    EmailLogger,
    EmailSender,
    MailgunEmailSender,
    SendinblueEmailSender,
    TransportError,
    config::{self, MailBackend, MailerConfig},
    transport::{
        MailgunMessage,
        MailgunResponse,
        MailgunTransport,
        SendinbluePayload,
        SendinblueResponse,
        SendinblueTransport,
    },
};
use pretty_assertions::assert_eq;

/// 受け取ったファイルのパスと、その時点でファイルが存在したかを記録する
#[derive(Clone, Default)]
struct InspectingMailgun {
    seen: Arc<Mutex<Vec<(PathBuf, bool)>>>,
}

#[async_trait]
impl MailgunTransport for InspectingMailgun {
    async fn post_message(
        &self,
        _domain: &str,
        message: &MailgunMessage,
    ) -> Result<MailgunResponse, TransportError> {
        let mut seen = self.seen.lock().unwrap();
        for file in &message.files {
            seen.push((file.path.clone(), file.path.exists()));
        }
        Ok(MailgunResponse {
            status:  200,
            message: Some("Queued. Thank you.".to_string()),
        })
    }
}

/// ペイロードを記録して固定の応答を返す
#[derive(Clone, Default)]
struct CapturingSendinblue {
    payloads: Arc<Mutex<Vec<SendinbluePayload>>>,
}

#[async_trait]
impl SendinblueTransport for CapturingSendinblue {
    async fn send_email(
        &self,
        payload: &SendinbluePayload,
    ) -> Result<Option<SendinblueResponse>, TransportError> {
        self.payloads.lock().unwrap().push(payload.clone());
        Ok(Some(SendinblueResponse {
            code:    Some("error".to_string()),
            message: Some("Sender not verified".to_string()),
        }))
    }
}

#[derive(Default)]
struct CountingLogger {
    infos:  Mutex<Vec<String>>,
    errors: Mutex<Vec<String>>,
}

impl EmailLogger for CountingLogger {
    fn info(&self, message: &str, _context: &Email) {
        self.infos.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str, _context: &Email) {
        self.errors.lock().unwrap().push(message.to_string());
    }
}

fn make_email(subject: &str) -> Email {
    Email::new(("from@example.com", "Sender"))
        .add_to("to@example.com")
        .with_subject(subject)
        .with_text_body("本文")
        .add_attachment(Attachment::from_content("memo.txt", b"memo".to_vec()))
        .add_attachment(Attachment::from_content("logo.png", b"png".to_vec()).with_content_id("logo"))
}

#[tokio::test]
async fn mailgunは送信中だけ一時ファイルを保持する() {
    let transport = InspectingMailgun::default();
    let logger = Arc::new(CountingLogger::default());
    let sender = MailgunEmailSender::new(
        "mg.example.com",
        Arc::new(transport.clone()),
        Some(logger.clone()),
    );

    sender.send(&make_email("添付付き")).await.unwrap();

    let seen = transport.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 2);
    for (path, existed) in seen {
        assert!(existed, "送信時に {} が存在すること", path.display());
        assert!(!path.exists(), "送信後に {} が削除されていること", path.display());
    }
    assert_eq!(*logger.infos.lock().unwrap(), vec!["Email sent: '添付付き'".to_string()]);
}

#[tokio::test]
async fn 送信インスタンスは複数タスクから共有できる() {
    let transport = InspectingMailgun::default();
    let sender: Arc<dyn EmailSender> = Arc::new(MailgunEmailSender::new(
        "mg.example.com",
        Arc::new(transport.clone()),
        None,
    ));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let sender = Arc::clone(&sender);
            tokio::spawn(async move { sender.send(&make_email(&format!("通知 {i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let seen = transport.seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 8);
    assert!(seen.iter().all(|(path, _)| !path.exists()));
}

#[tokio::test]
async fn sendinblueのエラー応答はinvalid_requestとして記録される() {
    let transport = CapturingSendinblue::default();
    let logger = Arc::new(CountingLogger::default());
    let sender = SendinblueEmailSender::new(Arc::new(transport.clone()), Some(logger.clone()));

    let err = sender.send(&make_email("失敗する送信")).await.unwrap_err();

    assert_eq!(err.kind(), MailErrorKind::InvalidRequest);
    assert_eq!(err.message(), "Sender not verified");
    assert!(logger.infos.lock().unwrap().is_empty());
    assert_eq!(
        *logger.errors.lock().unwrap(),
        vec!["Email error: 'Sender not verified'".to_string()]
    );

    let payloads = transport.payloads.lock().unwrap();
    let inline = payloads[0].inline_image.as_ref().unwrap();
    assert_eq!(inline["logo"], "cG5n");
    assert_eq!(payloads[0].attachment.as_ref().unwrap()["memo.txt"], "bWVtbw==");
}

#[tokio::test]
async fn 設定が無ければnoopの送信インスタンスを作成する() {
    let config = MailerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(config.backend, MailBackend::Noop);

    let sender = config::create_sender(&config, None).await.unwrap();

    sender.send(&make_email("送信しない")).await.unwrap();
}
