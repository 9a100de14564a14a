//! # 送信結果ロガー
//!
//! 送信成功・失敗時に呼ばれる任意のロガー。
//!
//! ## 設計方針
//!
//! - **注入される協調者**: 各アダプタは `Option<Arc<dyn EmailLogger>>` を受け取る。
//!   `None` の場合は何もしない（エラーではない）
//! - **呼び出し点は 2 つだけ**: 送信成功時の `info` と、失敗時の `error`
//! - **既定実装**: [`TracingEmailLogger`] は `tracing` のイベントとして出力する

use std::sync::Arc;

use omnimail_domain::{Email, MailError};

/// 送信結果ロガー
///
/// `context` には送信しようとしたメールが渡される。
pub trait EmailLogger: Send + Sync {
    fn info(&self, message: &str, context: &Email);

    fn error(&self, message: &str, context: &Email);
}

/// `tracing` に出力するロガー
///
/// subscriber の設定は呼び出し側のアプリケーションが行う。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEmailLogger;

impl EmailLogger for TracingEmailLogger {
    fn info(&self, message: &str, context: &Email) {
        tracing::info!(
            from = context.from().email(),
            to_count = context.to().len(),
            subject = context.subject(),
            "{message}"
        );
    }

    fn error(&self, message: &str, context: &Email) {
        tracing::error!(
            from = context.from().email(),
            to_count = context.to().len(),
            subject = context.subject(),
            "{message}"
        );
    }
}

/// 送信結果をロガーに報告する
///
/// 成功時は件名を、失敗時はエラーメッセージを含めて 1 回だけ出力する。
pub(crate) fn report(
    logger: Option<&Arc<dyn EmailLogger>>,
    email: &Email,
    result: &Result<(), MailError>,
) {
    let Some(logger) = logger else {
        return;
    };

    match result {
        Ok(()) => logger.info(&format!("Email sent: '{}'", email.subject()), email),
        Err(e) => logger.error(&format!("Email error: '{}'", e.message()), email),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use omnimail_domain::UNKNOWN_ERROR_CODE;
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;
    use crate::mock::{LogLevel, RecordingLogger};

    fn make_email() -> Email {
        Email::new("from@example.com")
            .add_to("to@example.com")
            .with_subject("月次レポート")
    }

    #[test]
    fn 成功時は件名を含むinfoを1回出力する() {
        let recorder = RecordingLogger::new();
        let logger: Arc<dyn EmailLogger> = Arc::new(recorder.clone());

        report(Some(&logger), &make_email(), &Ok(()));

        let entries = recorder.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Info);
        assert_eq!(entries[0].message, "Email sent: '月次レポート'");
        assert_eq!(entries[0].subject, "月次レポート");
    }

    #[test]
    fn 失敗時はエラーメッセージを含むerrorを1回出力する() {
        let recorder = RecordingLogger::new();
        let logger: Arc<dyn EmailLogger> = Arc::new(recorder.clone());
        let result = Err(MailError::unexpected("Unknown error", UNKNOWN_ERROR_CODE));

        report(Some(&logger), &make_email(), &result);

        let entries = recorder.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level, LogLevel::Error);
        assert_eq!(entries[0].message, "Email error: 'Unknown error'");
    }

    #[test]
    fn ロガーが無くても何も起きない() {
        report(None, &make_email(), &Ok(()));
    }

    // ===== TracingEmailLogger =====

    #[derive(Debug, Clone)]
    struct CapturedEvent {
        level:   tracing::Level,
        message: String,
        fields:  Vec<(String, String)>,
    }

    /// テスト用にログイベントをキャプチャする Layer
    #[derive(Clone, Default)]
    struct CaptureLayer {
        events: Arc<Mutex<Vec<CapturedEvent>>>,
    }

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for CaptureLayer {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            let mut visitor = FieldVisitor::default();
            event.record(&mut visitor);

            self.events.lock().unwrap().push(CapturedEvent {
                level:   *event.metadata().level(),
                message: visitor.message.unwrap_or_default(),
                fields:  visitor.fields,
            });
        }
    }

    #[derive(Default)]
    struct FieldVisitor {
        message: Option<String>,
        fields:  Vec<(String, String)>,
    }

    impl tracing::field::Visit for FieldVisitor {
        fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
            if field.name() == "message" {
                self.message = Some(format!("{value:?}"));
            } else {
                self.fields
                    .push((field.name().to_string(), format!("{value:?}")));
            }
        }

        fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
            self.fields
                .push((field.name().to_string(), value.to_string()));
        }
    }

    #[test]
    fn tracing_loggerは件名と送信元をフィールドに出力する() {
        let capture = CaptureLayer::default();
        let subscriber = tracing_subscriber::registry().with(capture.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let logger = TracingEmailLogger;
        logger.info("Email sent: '月次レポート'", &make_email());
        logger.error("Email error: 'Unknown error'", &make_email());

        let events = capture.events.lock().unwrap().clone();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].level, tracing::Level::INFO);
        assert_eq!(events[0].message, "Email sent: '月次レポート'");
        assert!(
            events[0]
                .fields
                .contains(&("subject".to_string(), "月次レポート".to_string()))
        );
        assert!(
            events[0]
                .fields
                .contains(&("from".to_string(), "from@example.com".to_string()))
        );
        assert_eq!(events[1].level, tracing::Level::ERROR);
        assert_eq!(events[1].message, "Email error: 'Unknown error'");
    }
}
