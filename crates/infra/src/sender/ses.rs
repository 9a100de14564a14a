//! Amazon SES 送信実装
//!
//! メールを lettre で MIME メッセージに組み立て、SES v2 の Raw 送信で送る。
//!
//! MIME の構造は次の通り（該当する部分が無ければその階層は省略する）:
//!
//! ```text
//! multipart/mixed
//! ├── multipart/related
//! │   ├── multipart/alternative (text/plain + text/html)
//! │   └── インライン画像 (Content-ID 付き)
//! └── 通常添付
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use lettre::{
    Message,
    message::{
        Attachment as MimeAttachment,
        Mailbox,
        MultiPart,
        MultiPartBuilder,
        SinglePart,
        header::ContentType,
    },
};
use omnimail_domain::{
    Address,
    Attachment,
    Email,
    MailError,
    MailErrorKind,
    UNKNOWN_ERROR_CODE,
};

use super::EmailSender;
use crate::{
    error::TransportError,
    logger::{self, EmailLogger},
    mapping::read_source,
    transport::{AwsSesTransport, SesFailure, SesRawRequest, SesTransport},
};

/// Amazon SES 送信
pub struct SesEmailSender {
    transport: Arc<dyn SesTransport>,
    logger:    Option<Arc<dyn EmailLogger>>,
}

impl SesEmailSender {
    pub fn new(transport: Arc<dyn SesTransport>, logger: Option<Arc<dyn EmailLogger>>) -> Self {
        Self { transport, logger }
    }

    /// AWS の標準的な認証情報チェーンを使う送信インスタンスを作成
    pub async fn from_env(logger: Option<Arc<dyn EmailLogger>>) -> Self {
        Self::new(Arc::new(AwsSesTransport::from_env().await), logger)
    }

    async fn try_send(&self, email: &Email) -> Result<(), MailError> {
        let request = build_request(email).await?;
        self.transport
            .send_raw(request)
            .await
            .map_err(classify_ses_error)
    }
}

#[async_trait]
impl EmailSender for SesEmailSender {
    #[tracing::instrument(skip_all, level = "debug", fields(provider = "ses"))]
    async fn send(&self, email: &Email) -> Result<(), MailError> {
        let result = self.try_send(email).await;
        logger::report(self.logger.as_ref(), email, &result);
        result
    }
}

/// SES のエラーコードを [`MailError`] に分類する
pub fn classify_ses_error(failure: SesFailure) -> MailError {
    match kind_for_code(failure.code.as_deref()) {
        MailErrorKind::InvalidRequest => MailError::invalid_request(Some(failure.message)),
        MailErrorKind::Unauthorized => MailError::unauthorized(Some(failure.message)),
        MailErrorKind::Delivery => MailError::delivery(Some(failure.message)),
        MailErrorKind::Unexpected => MailError::wrap(failure, UNKNOWN_ERROR_CODE),
    }
}

fn kind_for_code(code: Option<&str>) -> MailErrorKind {
    match code {
        Some("BadRequestException" | "InvalidParameterValue" | "NotFoundException") => {
            MailErrorKind::InvalidRequest
        }
        Some(
            "InvalidClientTokenId"
            | "SignatureDoesNotMatch"
            | "UnrecognizedClientException"
            | "AccessDeniedException",
        ) => MailErrorKind::Unauthorized,
        Some(
            "MessageRejected"
            | "MailFromDomainNotVerifiedException"
            | "AccountSuspendedException"
            | "SendingPausedException"
            | "LimitExceededException"
            | "TooManyRequestsException",
        ) => MailErrorKind::Delivery,
        _ => MailErrorKind::Unexpected,
    }
}

/// メールを SES の Raw 送信リクエストに変換する
pub(crate) async fn build_request(email: &Email) -> Result<SesRawRequest, TransportError> {
    let mut builder = Message::builder()
        .from(mailbox(email.from())?)
        .subject(email.subject());
    for address in email.to() {
        builder = builder.to(mailbox(address)?);
    }
    for address in email.cc() {
        builder = builder.cc(mailbox(address)?);
    }
    for address in email.bcc() {
        builder = builder.bcc(mailbox(address)?);
    }
    for address in email.reply_to() {
        builder = builder.reply_to(mailbox(address)?);
    }

    let body = build_body(email).await?;
    let message = match body {
        Part::Single(part) => builder.singlepart(part),
        Part::Multi(part) => builder.multipart(part),
    }
    .map_err(|e| TransportError::Build(e.to_string()))?;

    let emails = |addresses: &[Address]| {
        addresses
            .iter()
            .map(|a| a.email().to_string())
            .collect::<Vec<_>>()
    };

    Ok(SesRawRequest {
        from: email.from().email().to_string(),
        to:   emails(email.to()),
        cc:   emails(email.cc()),
        bcc:  emails(email.bcc()),
        raw:  message.formatted(),
    })
}

/// MIME のパート（単一またはマルチパート）
enum Part {
    Single(SinglePart),
    Multi(MultiPart),
}

impl Part {
    fn append_to(self, parent: MultiPartBuilder) -> MultiPart {
        match self {
            Self::Single(part) => parent.singlepart(part),
            Self::Multi(part) => parent.multipart(part),
        }
    }
}

async fn build_body(email: &Email) -> Result<Part, TransportError> {
    let mut body = match (email.text_body(), email.html_body()) {
        (Some(text), Some(html)) => Part::Multi(
            MultiPart::alternative()
                .singlepart(SinglePart::plain(text.to_string()))
                .singlepart(SinglePart::html(html.to_string())),
        ),
        (None, Some(html)) => Part::Single(SinglePart::html(html.to_string())),
        (text, None) => Part::Single(SinglePart::plain(text.unwrap_or_default().to_string())),
    };

    let (regular, inline) = Attachment::partition(email.attachments());

    let inline_parts = attachment_parts(&inline).await?;
    if !inline_parts.is_empty() {
        let related = inline_parts
            .into_iter()
            .fold(body.append_to(MultiPart::related()), MultiPart::singlepart);
        body = Part::Multi(related);
    }

    let regular_parts = attachment_parts(&regular).await?;
    if !regular_parts.is_empty() {
        let mixed = regular_parts
            .into_iter()
            .fold(body.append_to(MultiPart::mixed()), MultiPart::singlepart);
        body = Part::Multi(mixed);
    }

    Ok(body)
}

/// 添付ファイルを MIME パートにする（読み出し元が無い添付はスキップ）
async fn attachment_parts(attachments: &[&Attachment]) -> Result<Vec<SinglePart>, TransportError> {
    let mut parts = Vec::with_capacity(attachments.len());

    for &attachment in attachments {
        let Some(source) = attachment.source() else {
            continue;
        };
        let content = read_source(source).await?.into_owned();
        let content_type = content_type(attachment.name())?;

        let mime = match attachment.content_id() {
            Some(content_id) => MimeAttachment::new_inline(content_id.to_string()),
            None => MimeAttachment::new(attachment.name().to_string()),
        };
        parts.push(mime.body(content, content_type));
    }

    Ok(parts)
}

/// ファイル名の拡張子から Content-Type を推定する
fn content_type(file_name: &str) -> Result<ContentType, TransportError> {
    let mime = mime_guess::from_path(file_name).first_or_octet_stream();
    ContentType::parse(mime.as_ref()).map_err(|e| TransportError::Build(e.to_string()))
}

fn mailbox(address: &Address) -> Result<Mailbox, TransportError> {
    let email = address
        .email()
        .parse()
        .map_err(|e| TransportError::Build(format!("{}: {e}", address.email())))?;
    Ok(Mailbox::new(address.name().map(str::to_string), email))
}
