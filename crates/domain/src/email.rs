//! # メール
//!
//! 送信するメールの正規化モデルを定義する。
//!
//! ## ドメイン用語
//!
//! | 型 | ドメイン用語 | 備考 |
//! |---|------------|------|
//! | [`Email`] | 送信メール | 送信元 1 件、宛先（to/cc/bcc/reply-to）、件名、本文、添付 |
//! | [`Address`] | メールアドレス + 表示名 | 同一性はメールアドレスのみで判定 |
//! | [`Attachment`] | 添付ファイル | `content_id` があればインライン画像 |
//! | [`AttachmentSource`] | 添付の読み出し元 | パス優先、次にメモリ上の内容 |
//!
//! ## 設計方針
//!
//! - **インライン判定は content-id のみ**: 通常添付とインライン画像は同じリストに並び、
//!   `content_id` の有無だけで振り分ける
//! - **空文字は未設定扱い**: 本文・表示名・content-id の空文字は `None` として扱い、
//!   プロバイダに空の値を送らない
//! - **検証しない**: 宛先の有無などの妥当性はプロバイダのエラーコードに委ねる

use std::{
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// メールアドレスと表示名の組
///
/// 等価性・ハッシュはメールアドレスのみで判定する。表示名は表示用ラベルに過ぎない。
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Address {
    email: String,
    name:  Option<String>,
}

impl Address {
    /// 表示名なしのアドレスを作成する
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name:  None,
        }
    }

    /// 表示名付きのアドレスを作成する
    pub fn with_name(email: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            name:  Some(name.into()),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// 表示名を返す（空文字は `None`）
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.email == other.email
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.email.hash(state);
    }
}

impl From<&str> for Address {
    fn from(email: &str) -> Self {
        Self::new(email)
    }
}

impl From<String> for Address {
    fn from(email: String) -> Self {
        Self::new(email)
    }
}

impl From<(&str, &str)> for Address {
    fn from((email, name): (&str, &str)) -> Self {
        Self::with_name(email, name)
    }
}

/// 添付ファイル
///
/// `path` と `content` のどちらか一方が設定されている想定。
/// どちらも無い添付は送信時に黙ってスキップされる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    /// ファイル名
    name:       String,
    /// インライン画像として参照される場合の Content-ID
    content_id: Option<String>,
    /// ファイルシステム上のパス
    path:       Option<PathBuf>,
    /// メモリ上の内容
    content:    Option<Vec<u8>>,
}

/// 添付ファイルのバイト列の読み出し元
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentSource<'a> {
    /// 既存ファイルから読む
    Path(&'a Path),
    /// メモリ上の内容をそのまま使う
    Content(&'a [u8]),
}

impl Attachment {
    /// 読み出し元を持たない添付を作成する
    ///
    /// [`with_path`](Self::with_path) / [`with_content`](Self::with_content) で後から設定する。
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name:       name.into(),
            content_id: None,
            path:       None,
            content:    None,
        }
    }

    /// ファイルパスを読み出し元とする添付を作成する
    pub fn from_path(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::new(name).with_path(path)
    }

    /// メモリ上の内容を読み出し元とする添付を作成する
    pub fn from_content(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self::new(name).with_content(content)
    }

    /// Content-ID を設定し、インライン画像として扱う
    pub fn with_content_id(mut self, content_id: impl Into<String>) -> Self {
        self.content_id = Some(content_id.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content-ID を返す（空文字は `None`）
    pub fn content_id(&self) -> Option<&str> {
        self.content_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn content(&self) -> Option<&[u8]> {
        self.content.as_deref()
    }

    /// インライン画像かどうか
    pub fn is_inline(&self) -> bool {
        self.content_id().is_some()
    }

    /// バイト列の読み出し元を決定する
    ///
    /// 優先順位:
    /// 1. 空でないパス
    /// 2. 空でない内容
    /// 3. どちらも無ければ `None`（送信対象外）
    pub fn source(&self) -> Option<AttachmentSource<'_>> {
        if let Some(path) = self.path().filter(|p| !p.as_os_str().is_empty()) {
            return Some(AttachmentSource::Path(path));
        }
        self.content()
            .filter(|c| !c.is_empty())
            .map(AttachmentSource::Content)
    }

    /// 添付を通常添付とインライン画像に振り分ける
    ///
    /// 戻り値は `(通常添付, インライン画像)`。各添付はちょうど一方に入る。
    pub fn partition(attachments: &[Attachment]) -> (Vec<&Attachment>, Vec<&Attachment>) {
        attachments.iter().partition(|a| !a.is_inline())
    }
}

/// 送信メール
///
/// 呼び出し側が組み立て、送信側（`EmailSender` 実装）は借用して読むだけ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    from:        Address,
    #[serde(default)]
    to:          Vec<Address>,
    #[serde(default)]
    cc:          Vec<Address>,
    #[serde(default)]
    bcc:         Vec<Address>,
    #[serde(default)]
    reply_to:    Vec<Address>,
    #[serde(default)]
    subject:     String,
    text_body:   Option<String>,
    html_body:   Option<String>,
    #[serde(default)]
    attachments: Vec<Attachment>,
}

impl Email {
    /// 送信元を指定して空のメールを作成する
    pub fn new(from: impl Into<Address>) -> Self {
        Self {
            from:        from.into(),
            to:          Vec::new(),
            cc:          Vec::new(),
            bcc:         Vec::new(),
            reply_to:    Vec::new(),
            subject:     String::new(),
            text_body:   None,
            html_body:   None,
            attachments: Vec::new(),
        }
    }

    pub fn add_to(mut self, address: impl Into<Address>) -> Self {
        self.to.push(address.into());
        self
    }

    pub fn add_cc(mut self, address: impl Into<Address>) -> Self {
        self.cc.push(address.into());
        self
    }

    pub fn add_bcc(mut self, address: impl Into<Address>) -> Self {
        self.bcc.push(address.into());
        self
    }

    pub fn add_reply_to(mut self, address: impl Into<Address>) -> Self {
        self.reply_to.push(address.into());
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = subject.into();
        self
    }

    pub fn with_text_body(mut self, body: impl Into<String>) -> Self {
        self.text_body = Some(body.into());
        self
    }

    pub fn with_html_body(mut self, body: impl Into<String>) -> Self {
        self.html_body = Some(body.into());
        self
    }

    pub fn add_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn from(&self) -> &Address {
        &self.from
    }

    pub fn to(&self) -> &[Address] {
        &self.to
    }

    pub fn cc(&self) -> &[Address] {
        &self.cc
    }

    pub fn bcc(&self) -> &[Address] {
        &self.bcc
    }

    pub fn reply_to(&self) -> &[Address] {
        &self.reply_to
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// プレーンテキスト本文（空文字は `None`）
    pub fn text_body(&self) -> Option<&str> {
        self.text_body.as_deref().filter(|body| !body.is_empty())
    }

    /// HTML 本文（空文字は `None`）
    pub fn html_body(&self) -> Option<&str> {
        self.html_body.as_deref().filter(|body| !body.is_empty())
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }
}
