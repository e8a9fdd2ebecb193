//! Content type sniffing from leading bytes.
//!
//! # Responsibilities
//! - Classify a buffer by magic bytes without trusting declared headers
//! - Never look past the first [`SNIFF_LEN`] bytes
//!
//! # Design Decisions
//! - Byte order marks and markup prefixes are checked first; binary
//!   signatures come from `infer`
//! - `infer`'s text matchers are ignored, so shell scripts and similar files
//!   sniff as plain text
//! - Anything unrecognised is either plain text or `application/octet-stream`
//!   depending on the presence of binary control bytes

use std::io::{self, SeekFrom};

use infer::MatcherType;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt};

/// Maximum number of bytes examined.
pub const SNIFF_LEN: usize = 512;

pub const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
pub const OCTET_STREAM: &str = "application/octet-stream";

const HTML_PREFIXES: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Return the MIME type of `data`, examining at most [`SNIFF_LEN`] bytes.
pub fn sniff(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if data.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be";
    }
    if data.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le";
    }
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TEXT_PLAIN;
    }

    let markup = trim_leading_whitespace(data);
    if HTML_PREFIXES.iter().any(|p| matches_html_prefix(markup, p)) {
        return "text/html; charset=utf-8";
    }
    if markup.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if let Some(kind) = infer::get(data).filter(|k| k.matcher_type() != MatcherType::Text) {
        return kind.mime_type();
    }

    if data.iter().any(|&b| is_binary_byte(b)) {
        OCTET_STREAM
    } else {
        TEXT_PLAIN
    }
}

/// Sniff from the reader's current position, then seek back to it.
pub async fn sniff_reader<R>(reader: &mut R) -> io::Result<&'static str>
where
    R: AsyncRead + AsyncSeek + Unpin,
{
    let start = reader.stream_position().await?;

    let mut buf = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    reader.seek(SeekFrom::Start(start)).await?;
    Ok(sniff(&buf[..filled]))
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let skip = data
        .iter()
        .take_while(|&&b| matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .count();
    &data[skip..]
}

// HTML prefixes match case-insensitively and must be followed by a tag
// terminator so "<Banana" is not "<B".
fn matches_html_prefix(data: &[u8], prefix: &[u8]) -> bool {
    if data.len() <= prefix.len() || !data[..prefix.len()].eq_ignore_ascii_case(prefix) {
        return false;
    }
    matches!(data[prefix.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    #[test]
    fn test_binary_signatures() {
        assert_eq!(sniff(PNG_HEADER), "image/png");
        assert_eq!(sniff(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F']), "image/jpeg");
        assert_eq!(sniff(b"GIF89a\x01\x00\x01\x00"), "image/gif");
        assert_eq!(sniff(b"%PDF-1.7\n"), "application/pdf");
    }

    #[test]
    fn test_markup() {
        assert_eq!(sniff(b"  \n<html><body>hi</body></html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<!doctype html>"), "text/html; charset=utf-8");
        assert_eq!(sniff(b"<?xml version=\"1.0\"?><a/>"), "text/xml; charset=utf-8");
    }

    #[test]
    fn test_text_and_binary() {
        assert_eq!(sniff(b"now is the time"), TEXT_PLAIN);
        assert_eq!(sniff(b""), TEXT_PLAIN);
        assert_eq!(sniff(&[0x00, 0x01, 0x02, 0x03]), OCTET_STREAM);
        assert_eq!(sniff(&[0xFF, 0xFE, b'h', 0x00]), "text/plain; charset=utf-16le");
    }

    #[test]
    fn test_scripts_are_plain_text() {
        assert_eq!(sniff(b"#!/bin/sh\necho hello\n"), TEXT_PLAIN);
        assert_eq!(sniff(b"#!/usr/bin/env python3\nprint(1)\n"), TEXT_PLAIN);
    }

    #[test]
    fn test_only_leading_bytes_examined() {
        let mut data = vec![b'a'; SNIFF_LEN];
        data.push(0x00);
        assert_eq!(sniff(&data), TEXT_PLAIN);
    }

    #[tokio::test]
    async fn test_reader_position_restored() {
        let mut content = b"prefix".to_vec();
        content.extend_from_slice(PNG_HEADER);
        content.extend(std::iter::repeat(0u8).take(2048));

        let mut cursor = Cursor::new(content);
        cursor.set_position(6);

        assert_eq!(sniff_reader(&mut cursor).await.unwrap(), "image/png");
        assert_eq!(cursor.position(), 6);
    }
}
