//! Noop 送信実装
//!
//! プロバイダへは何も送らず、送信成功として扱う。
//! 送信を無効化した環境（`MAIL_BACKEND` 未設定時の既定値）で使う。

use std::sync::Arc;

use async_trait::async_trait;
use omnimail_domain::{Address, Email, MailError};

use super::EmailSender;
use crate::logger::{self, EmailLogger};

/// Noop 送信
///
/// ロガーが設定されていれば、他のアダプタと同じく成功時の info を 1 回出力する。
#[derive(Clone, Default)]
pub struct NoopEmailSender {
    logger: Option<Arc<dyn EmailLogger>>,
}

impl NoopEmailSender {
    pub fn new(logger: Option<Arc<dyn EmailLogger>>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl EmailSender for NoopEmailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(provider = "noop"))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let recipients: Vec<&str> = email
            .to()
            .iter()
            .chain(email.cc())
            .chain(email.bcc())
            .map(Address::email)
            .collect();
        tracing::debug!(
            ?recipients,
            attachments = email.attachments().len(),
            "送信を無効化しているためプロバイダへは送らない"
        );

        let result = Ok(());
        logger::report(self.logger.as_ref(), email, &result);
        result
    }
}
