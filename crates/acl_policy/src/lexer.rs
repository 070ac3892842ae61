//! Shared lexer for the three source file sub-languages.
//!
//! Token classes are tried in a fixed order at each position: identifier,
//! `@`-prefixed object reference, dotted-quad address, 8-digit date, port
//! token. The order matters: `ssh` and `ssh-http` are identifiers, never
//! ports, while `22` and `1024-2048` are ports and `20261231` is a date.
//!
//! Comment lines start with `#` or `;` in the first column and run to the
//! end of the line. A `#` anywhere else is a lex error.

use crate::error::{Error, Result};

/// Lexical class of a [`Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Bare word: `[a-zA-Z][a-zA-Z0-9_-]*`. Keywords and service names.
    Ident,
    /// `@`-prefixed reference to another object, sigil included.
    Object,
    /// Dotted-quad address with an optional `/prefix`.
    Address,
    /// Eight consecutive digits (YYYYMMDD).
    Date,
    /// Port number or range: `22`, `1024-2048`, `-1024`, `8080-`.
    Port,
}

/// One lexed token with its source position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical class.
    pub kind: TokenKind,
    /// Exact source text.
    pub text: String,
    /// 1-based source line.
    pub line: usize,
    /// 1-based source column.
    pub column: usize,
}

/// Tokenizes `input`.
///
/// # Errors
///
/// Returns [`Error::Lex`] when a character does not start any token class.
pub fn lex(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();

    for (idx, line) in input.lines().enumerate() {
        let line_no = idx + 1;
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        let bytes = line.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            if bytes[pos].is_ascii_whitespace() {
                pos += 1;
                continue;
            }

            let (kind, len) = scan_token(bytes, pos).ok_or_else(|| Error::Lex {
                line: line_no,
                column: pos + 1,
                reason: format!(
                    "unexpected character `{}`",
                    line[pos..].chars().next().unwrap_or('?')
                ),
            })?;

            tokens.push(Token {
                kind,
                text: line[pos..pos + len].to_string(),
                line: line_no,
                column: pos + 1,
            });
            pos += len;
        }
    }

    Ok(tokens)
}

/// Scans one token starting at `pos`, returning its kind and byte length.
fn scan_token(bytes: &[u8], pos: usize) -> Option<(TokenKind, usize)> {
    let c = bytes[pos];

    if c.is_ascii_alphabetic() {
        return Some((TokenKind::Ident, scan_ident(bytes, pos)));
    }
    if c == b'@' {
        return scan_object(bytes, pos).map(|len| (TokenKind::Object, len));
    }
    if c.is_ascii_digit() {
        return Some(scan_numeric(bytes, pos));
    }
    if c == b'-' {
        return scan_open_range(bytes, pos).map(|len| (TokenKind::Port, len));
    }
    None
}

fn scan_ident(bytes: &[u8], start: usize) -> usize {
    let mut end = start + 1;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    end - start
}

const fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// `@` followed by at least one non-whitespace character.
fn scan_object(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start + 1;
    while end < bytes.len() && !bytes[end].is_ascii_whitespace() {
        end += 1;
    }
    (end > start + 1).then_some(end - start)
}

/// A token starting with a digit: address, date, or port, in that order.
fn scan_numeric(bytes: &[u8], start: usize) -> (TokenKind, usize) {
    if let Some(len) = scan_address(bytes, start) {
        return (TokenKind::Address, len);
    }
    if bytes.len() >= start + 8 && bytes[start..start + 8].iter().all(u8::is_ascii_digit) {
        return (TokenKind::Date, 8);
    }
    (TokenKind::Port, scan_port(bytes, start))
}

fn scan_address(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start;
    for octet in 0..4 {
        if octet > 0 {
            if end >= bytes.len() || bytes[end] != b'.' {
                return None;
            }
            end += 1;
        }
        let digits = count_digits(bytes, end);
        if digits == 0 {
            return None;
        }
        end += digits;
    }
    // Optional prefix length, at most two digits.
    if end < bytes.len() && bytes[end] == b'/' {
        let digits = count_digits(bytes, end + 1).min(2);
        if digits > 0 {
            end += 1 + digits;
        }
    }
    Some(end - start)
}

fn count_digits(bytes: &[u8], from: usize) -> usize {
    bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Up to five digits, then an optional `-` with an alphanumeric tail.
fn scan_port(bytes: &[u8], start: usize) -> usize {
    let mut end = start + count_digits(bytes, start).min(5);
    if end < bytes.len() && bytes[end] == b'-' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
            end += 1;
        }
    }
    end - start
}

/// Open-ended range with a leading `-`, e.g. `-1024`.
fn scan_open_range(bytes: &[u8], start: usize) -> Option<usize> {
    let mut end = start + 1;
    while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    (end > start + 1).then_some(end - start)
}
