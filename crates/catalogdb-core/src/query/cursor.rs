//! Opaque page cursor tokens.
//!
//! Wire layout before hex encoding:
//! `version(1) | signature(32) | id(16) | value tag(1) | value bytes`.

use crate::{
    error::CursorError,
    query::plan::{QueryPlan, SortKey},
    types::EntityId,
    value::Value,
};
use std::fmt::Write as _;
use ulid::Ulid;

const CURSOR_VERSION: u8 = 1;
const HEADER_LEN: usize = 1 + 32 + 16 + 1;

// Decode bound for untrusted token input.
const MAX_CURSOR_TOKEN_HEX_LEN: usize = 8 * 1024;

const TAG_BOOL: u8 = 0;
const TAG_TEXT: u8 = 1;
const TAG_TEXT_LIST: u8 = 2;

///
/// Cursor
///
/// "Last item returned" under one query plan.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Cursor {
    signature: [u8; 32],
    boundary: SortKey,
}

impl Cursor {
    pub(crate) fn new(plan: &QueryPlan, boundary: SortKey) -> Self {
        Self {
            signature: plan.signature(),
            boundary,
        }
    }

    pub(crate) const fn boundary(&self) -> &SortKey {
        &self.boundary
    }

    /// Decode a token and bind it to `plan`. A token minted under a different
    /// collection, ordering or predicate is rejected.
    pub(crate) fn resume(plan: &QueryPlan, token: &str) -> Result<Self, CursorError> {
        let cursor = Self::decode(token)?;
        if cursor.signature != plan.signature() {
            return Err(CursorError::SignatureMismatch {
                collection: plan.collection,
            });
        }

        Ok(cursor)
    }

    pub(crate) fn encode(&self) -> String {
        let mut bytes = Vec::with_capacity(HEADER_LEN + 16);
        bytes.push(CURSOR_VERSION);
        bytes.extend_from_slice(&self.signature);
        bytes.extend_from_slice(&self.boundary.id.to_bytes());

        match &self.boundary.value {
            Value::Bool(flag) => {
                bytes.push(TAG_BOOL);
                bytes.push(u8::from(*flag));
            }
            Value::Text(text) => {
                bytes.push(TAG_TEXT);
                bytes.extend_from_slice(text.as_bytes());
            }
            Value::TextList(items) => {
                bytes.push(TAG_TEXT_LIST);
                for item in items {
                    let len = u32::try_from(item.len()).unwrap_or(u32::MAX);
                    bytes.extend_from_slice(&len.to_be_bytes());
                    bytes.extend_from_slice(item.as_bytes());
                }
            }
        }

        encode_hex(&bytes)
    }

    pub(crate) fn decode(token: &str) -> Result<Self, CursorError> {
        let bytes = decode_hex(token)?;
        if bytes.len() < HEADER_LEN {
            return Err(malformed("token is truncated"));
        }
        if bytes[0] != CURSOR_VERSION {
            return Err(malformed(format!("unsupported version {}", bytes[0])));
        }

        let mut signature = [0u8; 32];
        signature.copy_from_slice(&bytes[1..33]);
        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[33..49]);
        let value = decode_value(bytes[49], &bytes[HEADER_LEN..])?;

        Ok(Self {
            signature,
            boundary: SortKey {
                value,
                id: EntityId::from_ulid(Ulid::from_bytes(id)),
            },
        })
    }
}

fn decode_value(tag: u8, body: &[u8]) -> Result<Value, CursorError> {
    match tag {
        TAG_BOOL => match body {
            [0] => Ok(Value::Bool(false)),
            [1] => Ok(Value::Bool(true)),
            _ => Err(malformed("invalid boolean boundary")),
        },
        TAG_TEXT => decode_text(body).map(Value::Text),
        TAG_TEXT_LIST => {
            let mut items = Vec::new();
            let mut rest = body;
            while !rest.is_empty() {
                let Some((len, tail)) = rest.split_first_chunk::<4>() else {
                    return Err(malformed("truncated list item length"));
                };
                let len = u32::from_be_bytes(*len) as usize;
                if tail.len() < len {
                    return Err(malformed("truncated list item"));
                }
                let (item, tail) = tail.split_at(len);
                items.push(decode_text(item)?);
                rest = tail;
            }
            Ok(Value::TextList(items))
        }
        other => Err(malformed(format!("unknown value tag {other}"))),
    }
}

fn decode_text(bytes: &[u8]) -> Result<String, CursorError> {
    String::from_utf8(bytes.to_vec()).map_err(|_| malformed("boundary text is not UTF-8"))
}

fn malformed(reason: impl Into<String>) -> CursorError {
    CursorError::Malformed {
        reason: reason.into(),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

fn decode_hex(token: &str) -> Result<Vec<u8>, CursorError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(malformed("token is empty"));
    }
    if token.len() > MAX_CURSOR_TOKEN_HEX_LEN {
        return Err(malformed(format!(
            "token exceeds {MAX_CURSOR_TOKEN_HEX_LEN} hex characters"
        )));
    }
    if !token.len().is_multiple_of(2) {
        return Err(malformed("odd number of hex characters"));
    }

    token
        .as_bytes()
        .chunks_exact(2)
        .enumerate()
        .map(|(pair, chunk)| {
            let hi = hex_nibble(chunk[0]);
            let lo = hex_nibble(chunk[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => Ok((hi << 4) | lo),
                _ => Err(malformed(format!(
                    "invalid hex character near position {}",
                    pair * 2 + 1
                ))),
            }
        })
        .collect()
}

const fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
