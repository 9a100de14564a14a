//! # メール送信
//!
//! 正規化された [`Email`] をプロバイダごとのリクエストに変換して送信する。
//!
//! ## 設計方針
//!
//! - **trait による抽象化**: [`EmailSender`] でメール送信を抽象化し、
//!   呼び出し側は `Arc<dyn EmailSender>` としてプロバイダを意識せずに使う
//! - **4 つの実装**: Mailgun、SendinBlue、Amazon SES（本番用）、Noop（テスト・無効化用）
//! - **結果の正規化**: プロバイダ固有の応答はアダプタの境界で [`MailError`] に分類する
//! - **1 回だけ試行**: リトライ・キューイングは行わない

mod mailgun;
mod noop;
mod sendinblue;
mod ses;

use async_trait::async_trait;
pub use mailgun::{MailgunEmailSender, MailgunOutcome};
pub use noop::NoopEmailSender;
use omnimail_domain::{Email, MailError};
pub use sendinblue::{SendinblueEmailSender, SendinblueOutcome};
pub use ses::{SesEmailSender, classify_ses_error};

/// メール送信トレイト
///
/// 1 回の呼び出しでプロバイダへのリクエストは最大 1 回。
/// ロガーが設定されていれば、成功時に info、失敗時に error を 1 回だけ出力する。
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// メールを送信する
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}
