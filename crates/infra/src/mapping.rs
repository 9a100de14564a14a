//! # アドレス・添付の変換ユーティリティ
//!
//! 各アダプタで共有する純粋な変換関数。
//!
//! - アドレス 1 件を `"表示名" <email>` 形式または素のアドレスに整形する
//! - アドレスのリストを連結文字列、またはメールアドレス → 表示名のマップにする
//! - 添付ファイルの内容を読み出し元（パス優先）から取得し、base64 に変換する

use std::{borrow::Cow, collections::BTreeMap, io};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use omnimail_domain::{Address, Attachment, AttachmentSource};

/// メールアドレス → 表示名（表示名が無ければ空文字）
pub type AddressMap = BTreeMap<String, String>;

/// キー（ファイル名または Content-ID）→ base64 エンコード済みの内容
pub type EncodedFiles = BTreeMap<String, String>;

/// アドレスを表示用文字列に整形する
///
/// 表示名があれば `"表示名" <email>`、無ければメールアドレスのみ。
/// 表示名中の `"` と `\\` はエスケープする（RFC 5322 の quoted-string）。
pub fn format_address(address: &Address) -> String {
    match address.name() {
        Some(name) => format!("\"{}\" <{}>", quote_escape(name), address.email()),
        None => address.email().to_string(),
    }
}

fn quote_escape(name: &str) -> Cow<'_, str> {
    if !name.contains(['"', '\\']) {
        return Cow::Borrowed(name);
    }
    let mut escaped = String::with_capacity(name.len() + 2);
    for c in name.chars() {
        if matches!(c, '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

/// アドレスのリストを `, ` 区切りで連結する
///
/// 空のリストは `None`。
pub fn join_addresses(addresses: &[Address]) -> Option<String> {
    if addresses.is_empty() {
        return None;
    }
    Some(
        addresses
            .iter()
            .map(format_address)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// アドレスのリストをメールアドレス → 表示名のマップにする
///
/// 空のリストは空マップではなく `None`（フィールドごと省略するため）。
/// 同じメールアドレスが複数ある場合は後のものが優先される。
pub fn address_map(addresses: &[Address]) -> Option<AddressMap> {
    if addresses.is_empty() {
        return None;
    }
    Some(addresses.iter().map(address_entry).collect())
}

/// アドレス 1 件をマップのエントリにする
pub fn address_entry(address: &Address) -> (String, String) {
    (
        address.email().to_string(),
        address.name().unwrap_or_default().to_string(),
    )
}

/// 添付ファイルの内容を読み出す
///
/// パスの場合はファイルを読み、メモリ上の内容はそのまま借用する。
pub async fn read_source(source: AttachmentSource<'_>) -> io::Result<Cow<'_, [u8]>> {
    match source {
        AttachmentSource::Path(path) => tokio::fs::read(path).await.map(Cow::Owned),
        AttachmentSource::Content(content) => Ok(Cow::Borrowed(content)),
    }
}

/// 添付ファイル群を base64 に変換し、`key` で得たキーのマップにする
///
/// 読み出し元が無い添付、および内容が空の添付はスキップする。
/// 結果が空の場合は `None`。
pub async fn encode_attachments(
    attachments: &[&Attachment],
    key: fn(&Attachment) -> &str,
) -> io::Result<Option<EncodedFiles>> {
    let mut encoded = EncodedFiles::new();

    for &attachment in attachments {
        let Some(source) = attachment.source() else {
            continue;
        };
        let content = read_source(source).await?;
        if content.is_empty() {
            continue;
        }
        encoded.insert(key(attachment).to_string(), STANDARD.encode(&content));
    }

    Ok((!encoded.is_empty()).then_some(encoded))
}

/// インライン画像のキー（Content-ID）
pub fn inline_key(attachment: &Attachment) -> &str {
    attachment.content_id().unwrap_or_default()
}
