//! # Omnimail ドメイン層
//!
//! プロバイダに依存しないメール送信のドメインモデルを定義する。
//!
//! ## 設計方針
//!
//! - **正規化されたメール**: 送信元・宛先・本文・添付を 1 つの [`Email`] で表現し、
//!   各プロバイダ固有の形式への変換はインフラ層（`omnimail-infra`）が担う
//! - **エラー分類の共有**: どのプロバイダでも失敗は [`MailError`] の 4 種別に正規化される
//! - **読み取り専用**: [`Email`] / [`Attachment`] は呼び出し側が組み立て、送信側は借用のみ行う
//!
//! ## 依存関係の方向
//!
//! ```text
//! infra → domain
//! ```
//!
//! ドメイン層は HTTP クライアントやプロバイダ SDK に一切依存しない。
//!
//! ## モジュール構成
//!
//! - [`email`] - メール・アドレス・添付ファイルの値オブジェクト
//! - [`error`] - 送信失敗の分類
//!
//! ## 使用例
//!
//! ```rust
//! use omnimail_domain::{Address, Attachment, Email};
//!
//! let email = Email::new(Address::with_name("from@example.com", "送信者"))
//!     .add_to("to@example.com")
//!     .with_subject("請求書のご案内")
//!     .with_text_body("請求書を添付します。")
//!     .add_attachment(Attachment::from_content("invoice.txt", b"total: 100".to_vec()));
//!
//! assert_eq!(email.to().len(), 1);
//! assert_eq!(email.attachments().len(), 1);
//! ```

pub mod email;
pub mod error;

pub use email::{Address, Attachment, AttachmentSource, Email};
pub use error::{MailError, MailErrorKind, UNKNOWN_ERROR_CODE};
