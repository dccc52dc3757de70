//! MIME part tree and message structure.

use crate::content_type::ContentType;
use crate::encoding::{TransferEncoding, decode_charset, encode_charset, encode_quoted_printable};
use crate::error::{Error, Result};
use crate::header::Headers;
use std::borrow::Cow;
use std::fmt::{self, Write as _};

/// Charset assumed for text parts that do not declare one.
pub const DEFAULT_CHARSET: &str = "utf-8";

/// Headers that describe an entity's content rather than the message.
const CONTENT_HEADERS: [&str; 2] = ["content-type", "content-transfer-encoding"];

/// Textual leaf part (`text/*`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPart {
    sub_type: String,
    charset: Option<String>,
    body: String,
    headers: Headers,
}

impl TextPart {
    /// Creates a text part with an explicit charset and subtype.
    #[must_use]
    pub fn new(
        body: impl Into<String>,
        charset: impl Into<String>,
        sub_type: impl Into<String>,
    ) -> Self {
        Self {
            sub_type: sub_type.into().to_lowercase(),
            charset: Some(charset.into()),
            body: body.into(),
            headers: Headers::new(),
        }
    }

    /// Creates a `text/plain` part in UTF-8.
    #[must_use]
    pub fn plain(body: impl Into<String>) -> Self {
        Self::new(body, DEFAULT_CHARSET, "plain")
    }

    /// Creates a `text/html` part in UTF-8.
    #[must_use]
    pub fn html(body: impl Into<String>) -> Self {
        Self::new(body, DEFAULT_CHARSET, "html")
    }

    /// Adds an extra header such as `Content-ID` or `Content-Disposition`.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// Replaces the extra headers.
    #[must_use]
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Media subtype (`html`, `plain`, ...).
    #[must_use]
    pub fn sub_type(&self) -> &str {
        &self.sub_type
    }

    /// Declared charset, if any.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Decoded body text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Extra headers carried alongside the content type.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Checks if this is a `text/html` part.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.sub_type.eq_ignore_ascii_case("html")
    }

    /// Body bytes in the declared charset, with the charset label to write.
    ///
    /// Text the declared charset cannot carry is written as UTF-8 and
    /// labelled accordingly.
    fn encoded_body(&self) -> (Cow<'_, [u8]>, Option<&str>) {
        let utf8 = Cow::Borrowed(self.body.as_bytes());
        match self.charset.as_deref() {
            Some(label) => match encode_charset(&self.body, label) {
                Some(bytes) => (bytes, Some(label)),
                None => (utf8, Some(DEFAULT_CHARSET)),
            },
            None if self.body.is_ascii() => (utf8, None),
            None => (utf8, Some(DEFAULT_CHARSET)),
        }
    }

    /// Full content type including the charset parameter.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        let ct = ContentType::new("text", self.sub_type.clone());
        match &self.charset {
            Some(charset) => ct.with_parameter("charset", charset.clone()),
            None => ct,
        }
    }
}

/// Opaque part that is carried through untouched.
///
/// Attachments, inline images and multipart subtypes other than
/// alternative, related and mixed (for example `multipart/signed`) end up
/// here with their raw, still transfer-encoded body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtherPart {
    headers: Headers,
    body: String,
}

impl OtherPart {
    /// Creates an opaque part from its content type and raw body.
    #[must_use]
    pub fn new(content_type: &ContentType, body: impl Into<String>) -> Self {
        let mut headers = Headers::new();
        headers.add("Content-Type", content_type.to_string());
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Creates an opaque part from a full header block and raw body.
    #[must_use]
    pub fn from_raw(headers: Headers, body: impl Into<String>) -> Self {
        Self {
            headers,
            body: body.into(),
        }
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    /// All headers of the part, including `Content-Type`.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Raw body as it will be written.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Declared content type, `application/octet-stream` when absent or invalid.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        self.headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(|| ContentType::new("application", "octet-stream"))
    }
}

/// Node of a message body tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    /// `text/*` leaf.
    Text(TextPart),
    /// `multipart/alternative`: renderings of the same content.
    Alternative(Vec<Part>),
    /// `multipart/related`: main part first, then the resources it references.
    Related(Vec<Part>),
    /// `multipart/mixed`: independent content such as body plus attachments.
    Mixed(Vec<Part>),
    /// Anything else.
    Other(OtherPart),
}

impl Part {
    /// Parses a MIME entity (header block, empty line, body).
    ///
    /// # Errors
    ///
    /// Returns an error if a multipart entity lacks a boundary or its
    /// delimiters, or if a text body cannot be decoded.
    pub fn parse(raw: &str) -> Result<Self> {
        let (head, body) = split_entity(raw);
        Self::from_entity(Headers::parse(head), body)
    }

    fn from_entity(headers: Headers, body: &str) -> Result<Self> {
        // RFC 2045: a missing or unparseable content type means text/plain
        let content_type = headers
            .get("content-type")
            .and_then(|v| ContentType::parse(v).ok())
            .unwrap_or_else(ContentType::text_plain);

        if content_type.is_multipart() {
            let sub_type = content_type.sub_type.as_str();
            if !matches!(sub_type, "alternative" | "related" | "mixed") {
                return Ok(Self::Other(OtherPart::from_raw(headers, body)));
            }

            let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
            let children = split_multipart(body, boundary)?
                .into_iter()
                .map(Self::parse)
                .collect::<Result<Vec<_>>>()?;

            return Ok(match sub_type {
                "alternative" => Self::Alternative(children),
                "related" => Self::Related(children),
                _ => Self::Mixed(children),
            });
        }

        if content_type.is_text() {
            let encoding = headers
                .get("content-transfer-encoding")
                .map_or(TransferEncoding::SevenBit, TransferEncoding::parse);
            let text = decode_charset(encoding.decode(body)?, content_type.charset())?;

            let mut extra = headers;
            for name in CONTENT_HEADERS {
                extra.remove(name);
            }

            return Ok(Self::Text(TextPart {
                sub_type: content_type.sub_type.clone(),
                charset: content_type.charset().map(str::to_string),
                body: text,
                headers: extra,
            }));
        }

        Ok(Self::Other(OtherPart::from_raw(headers, body)))
    }

    /// Content type of this node. Containers carry no boundary here.
    #[must_use]
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Text(text) => text.content_type(),
            Self::Alternative(_) => ContentType::new("multipart", "alternative"),
            Self::Related(_) => ContentType::new("multipart", "related"),
            Self::Mixed(_) => ContentType::new("multipart", "mixed"),
            Self::Other(other) => other.content_type(),
        }
    }

    /// Child parts of a container, empty for leaves.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        match self {
            Self::Alternative(parts) | Self::Related(parts) | Self::Mixed(parts) => parts,
            Self::Text(_) | Self::Other(_) => &[],
        }
    }

    /// All `text/html` leaves in depth-first order.
    #[must_use]
    pub fn html_parts(&self) -> Vec<&TextPart> {
        let mut found = Vec::new();
        self.collect_html(&mut found);
        found
    }

    fn collect_html<'a>(&'a self, found: &mut Vec<&'a TextPart>) {
        match self {
            Self::Text(text) if text.is_html() => found.push(text),
            _ => {
                for child in self.children() {
                    child.collect_html(found);
                }
            }
        }
    }

    fn write_entity(&self, out: &mut String, path: &str) -> fmt::Result {
        match self {
            Self::Text(text) => {
                let (bytes, charset) = text.encoded_body();
                let mut content_type = ContentType::new("text", text.sub_type.as_str());
                if let Some(charset) = charset {
                    content_type = content_type.with_parameter("charset", charset);
                }
                write!(out, "Content-Type: {content_type}\r\n")?;
                write!(
                    out,
                    "Content-Transfer-Encoding: {}\r\n",
                    TransferEncoding::QuotedPrintable
                )?;
                write!(out, "{}\r\n", text.headers)?;
                out.push_str(&encode_quoted_printable(&bytes));
            }
            Self::Alternative(parts) | Self::Related(parts) | Self::Mixed(parts) => {
                let boundary = format!("=_mailinline_{path}");
                let content_type = ContentType::multipart(
                    self.content_type().sub_type,
                    boundary.as_str(),
                );
                write!(out, "Content-Type: {content_type}\r\n\r\n")?;
                for (index, part) in parts.iter().enumerate() {
                    write!(out, "--{boundary}\r\n")?;
                    part.write_entity(out, &format!("{path}.{index}"))?;
                    out.push_str("\r\n");
                }
                write!(out, "--{boundary}--\r\n")?;
            }
            Self::Other(other) => {
                write!(out, "{}\r\n", other.headers)?;
                out.push_str(other.body.strip_suffix("\r\n").unwrap_or(&other.body));
            }
        }
        Ok(())
    }
}

impl From<TextPart> for Part {
    fn from(part: TextPart) -> Self {
        Self::Text(part)
    }
}

impl From<OtherPart> for Part {
    fn from(part: OtherPart) -> Self {
        Self::Other(part)
    }
}

/// Email message: top-level headers plus an optional body tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    headers: Headers,
    body: Option<Part>,
}

impl Message {
    /// Creates a message without a body.
    #[must_use]
    pub const fn new(headers: Headers) -> Self {
        Self {
            headers,
            body: None,
        }
    }

    /// Sets the body, builder style.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Part>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Message headers (without the body's content headers).
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Gets the Subject header.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.headers.get("subject")
    }

    /// Current body tree.
    #[must_use]
    pub const fn body(&self) -> Option<&Part> {
        self.body.as_ref()
    }

    /// Installs a new body tree.
    pub fn set_body(&mut self, body: impl Into<Part>) {
        self.body = Some(body.into());
    }

    /// Parses an RFC 5322 message into headers and a body tree.
    ///
    /// `Content-*` headers move onto the body entity; `MIME-Version` is
    /// dropped and regenerated on output.
    ///
    /// # Errors
    ///
    /// Returns an error if the body tree cannot be parsed.
    pub fn parse(raw: &str) -> Result<Self> {
        let (head, body) = split_entity(raw);
        let all = Headers::parse(head);

        let mut headers = Headers::new();
        let mut entity = Headers::new();
        for (name, value) in all.iter() {
            if CONTENT_HEADERS.iter().any(|h| name.eq_ignore_ascii_case(h)) {
                entity.add(name, value);
            } else if !name.eq_ignore_ascii_case("mime-version") {
                headers.add(name, value);
            }
        }

        let body = if entity.is_empty() && body.trim().is_empty() {
            None
        } else {
            Some(Part::from_entity(entity, body)?)
        };

        Ok(Self { headers, body })
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write!(out, "{}", self.headers)?;
        out.push_str("MIME-Version: 1.0\r\n");
        match &self.body {
            Some(body) => body.write_entity(&mut out, "0")?,
            None => out.push_str("\r\n"),
        }
        f.write_str(&out)
    }
}

/// Splits an entity at the first empty line.
fn split_entity(raw: &str) -> (&str, &str) {
    if let Some(rest) = raw.strip_prefix("\r\n") {
        return ("", rest);
    }
    if let Some(rest) = raw.strip_prefix('\n') {
        return ("", rest);
    }

    let crlf = raw.find("\r\n\r\n").map(|i| (i, i + 4));
    let lf = raw.find("\n\n").map(|i| (i, i + 2));
    match [crlf, lf].into_iter().flatten().min() {
        Some((head_end, body_start)) => (&raw[..head_end], &raw[body_start..]),
        None => (raw, ""),
    }
}

/// Splits a multipart body into its raw child entities.
fn split_multipart<'a>(body: &'a str, boundary: &str) -> Result<Vec<&'a str>> {
    let delimiter = format!("--{boundary}");
    let close = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut start: Option<usize> = None;
    let mut offset = 0;

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if trimmed == delimiter || trimmed == close {
            if let Some(s) = start {
                parts.push(strip_line_break(&body[s..offset]));
            }
            if trimmed == close {
                return Ok(parts);
            }
            start = Some(offset + line.len());
        }
        offset += line.len();
    }

    // Unterminated multipart: keep what follows the last delimiter
    match start {
        Some(s) => {
            parts.push(strip_line_break(&body[s..]));
            Ok(parts)
        }
        None => Err(Error::InvalidMultipart(format!(
            "no delimiter for boundary {boundary}"
        ))),
    }
}

/// The line break before a delimiter belongs to the delimiter.
fn strip_line_break(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}
