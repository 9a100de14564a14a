//! # メール送信設定
//!
//! 環境変数から送信バックエンドの設定を読み込み、[`EmailSender`] を作成する。
//!
//! `MAIL_BACKEND` 環境変数で送信バックエンドを切り替える:
//! - `mailgun`: Mailgun 経由で送信（`MAILGUN_API_KEY` / `MAILGUN_DOMAIN` が必須）
//! - `sendinblue`: SendinBlue 経由で送信（`SENDINBLUE_ACCESS_KEY` が必須）
//! - `ses`: Amazon SES v2 経由で送信（認証情報は AWS の標準チェーンから解決）
//! - `noop`: 送信しない（ログ出力のみ、未設定時の既定値）

use std::{env, fmt, sync::Arc};

use strum::{Display, EnumString};
use thiserror::Error;

use crate::{
    error::TransportError,
    logger::EmailLogger,
    sender::{
        EmailSender,
        MailgunEmailSender,
        NoopEmailSender,
        SendinblueEmailSender,
        SesEmailSender,
    },
    transport::{mailgun, sendinblue},
};

/// 設定の読み込み・送信インスタンス作成時のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("環境変数 {0} が設定されていません")]
    Missing(&'static str),

    #[error("未対応のメール送信バックエンドです: {0}")]
    UnknownBackend(String),

    #[error("送信クライアントの作成に失敗しました: {0}")]
    Client(#[from] TransportError),
}

/// 送信バックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum MailBackend {
    Mailgun,
    Sendinblue,
    Ses,
    Noop,
}

/// Mailgun の設定
#[derive(Clone)]
pub struct MailgunConfig {
    pub api_key:  String,
    /// 送信ドメイン
    pub domain:   String,
    /// API のベース URL（EU リージョンでは `https://api.eu.mailgun.net`）
    pub base_url: String,
}

impl fmt::Debug for MailgunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailgunConfig")
            .field("api_key", &"[REDACTED]")
            .field("domain", &self.domain)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// SendinBlue の設定
#[derive(Clone)]
pub struct SendinblueConfig {
    pub access_key: String,
    pub base_url:   String,
}

impl fmt::Debug for SendinblueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SendinblueConfig")
            .field("access_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// メール送信の設定
///
/// 選択したバックエンドの設定のみが `Some` になる。
#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub backend:    MailBackend,
    pub mailgun:    Option<MailgunConfig>,
    pub sendinblue: Option<SendinblueConfig>,
}

impl MailerConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意の参照関数から設定を読み込む
    ///
    /// 空文字の値は未設定として扱う。
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let backend = match get("MAIL_BACKEND") {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::UnknownBackend(value))?,
            None => MailBackend::Noop,
        };

        let mailgun = match backend {
            MailBackend::Mailgun => Some(MailgunConfig {
                api_key:  required("MAILGUN_API_KEY")?,
                domain:   required("MAILGUN_DOMAIN")?,
                base_url: get("MAILGUN_BASE_URL")
                    .unwrap_or_else(|| mailgun::DEFAULT_BASE_URL.to_string()),
            }),
            _ => None,
        };

        let sendinblue = match backend {
            MailBackend::Sendinblue => Some(SendinblueConfig {
                access_key: required("SENDINBLUE_ACCESS_KEY")?,
                base_url:   get("SENDINBLUE_BASE_URL")
                    .unwrap_or_else(|| sendinblue::DEFAULT_BASE_URL.to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            backend,
            mailgun,
            sendinblue,
        })
    }
}

/// 設定に従って送信インスタンスを作成する
///
/// `ses` の場合は AWS の設定（リージョン・認証情報）を読み込むため非同期。
pub async fn create_sender(
    config: &MailerConfig,
    logger: Option<Arc<dyn EmailLogger>>,
) -> Result<Arc<dyn EmailSender>, ConfigError> {
    let sender: Arc<dyn EmailSender> = match config.backend {
        MailBackend::Mailgun => {
            let mailgun = config
                .mailgun
                .as_ref()
                .ok_or(ConfigError::Missing("MAILGUN_API_KEY"))?;
            Arc::new(MailgunEmailSender::with_api_key(
                mailgun.api_key.clone(),
                mailgun.domain.clone(),
                &mailgun.base_url,
                logger,
            )?)
        }
        MailBackend::Sendinblue => {
            let sendinblue = config
                .sendinblue
                .as_ref()
                .ok_or(ConfigError::Missing("SENDINBLUE_ACCESS_KEY"))?;
            Arc::new(SendinblueEmailSender::with_access_key(
                sendinblue.access_key.clone(),
                &sendinblue.base_url,
                logger,
            )?)
        }
        MailBackend::Ses => Arc::new(SesEmailSender::from_env(logger).await),
        MailBackend::Noop => Arc::new(NoopEmailSender::new(logger)),
    };

    tracing::info!(backend = %config.backend, "メール送信バックエンドを初期化");
    Ok(sender)
}
