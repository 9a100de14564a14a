//! # Omnimail インフラ層
//!
//! 正規化された [`Email`](omnimail_domain::Email) を各メール配信プロバイダの
//! API 形式に変換して送信する。
//!
//! ## 設計方針
//!
//! このクレートはドメイン層の値オブジェクトを受け取り、プロバイダ固有の
//! リクエスト組み立て・送信・応答の解釈を担う。どのプロバイダを使っても
//! 呼び出し側から見える契約は [`EmailSender`] 1 つで、失敗は
//! [`MailError`](omnimail_domain::MailError) に正規化される。
//!
//! ## 責務
//!
//! - **送信アダプタ**: Mailgun / SendinBlue / Amazon SES / Noop
//! - **トランスポート**: 実際の HTTP / SDK 呼び出し（テスト時は差し替え可能）
//! - **ロガー**: 送信成功・失敗時に呼ばれる任意のロガー
//! - **設定**: 環境変数からバックエンドを選択して送信インスタンスを作成
//!
//! ## 依存関係
//!
//! ```text
//! sender → transport
//!    ↓         ↓
//!  mapping   error
//!    ↓
//!  domain
//! ```
//!
//! ## モジュール構成
//!
//! - [`sender`] - `EmailSender` トレイトと各プロバイダのアダプタ
//! - [`transport`] - プロバイダ API への送信
//! - [`mapping`] - アドレス・添付の変換ユーティリティ
//! - [`temp_file`] - Mailgun 送信中の一時ファイル管理
//! - [`logger`] - 送信結果のロガー
//! - [`config`] - 環境変数による設定と送信インスタンスの生成
//! - [`error`] - トランスポート層エラー定義
//!
//! ## 使用例
//!
//! ```rust,ignore
//! use std::sync::Arc;
//!
//! use omnimail_domain::Email;
//! use omnimail_infra::{config::{self, MailerConfig}, logger::TracingEmailLogger};
//!
//! async fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = MailerConfig::from_env()?;
//!     let sender = config::create_sender(&config, Some(Arc::new(TracingEmailLogger))).await?;
//!
//!     let email = Email::new("from@example.com")
//!         .add_to("to@example.com")
//!         .with_subject("Hello, world!")
//!         .with_text_body("Hello World! How are you?");
//!
//!     sender.send(&email).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod mapping;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod sender;
pub mod temp_file;
pub mod transport;

pub use error::TransportError;
pub use logger::{EmailLogger, TracingEmailLogger};
pub use sender::{
    EmailSender,
    MailgunEmailSender,
    NoopEmailSender,
    SendinblueEmailSender,
    SesEmailSender,
};
