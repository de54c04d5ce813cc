//! Payload model, JSON wire codec and frame checksum
//!
//! Application payloads are small ordered mappings of string keys to
//! string or number values, the shape sensor nodes use to report readings
//! (`{"node":"02","temp":"21","pres":"101013"}`). On the wire a payload is
//! its compact JSON rendering as raw UTF-8 bytes; insertion order is
//! preserved and is the serialization order, so two nodes building the
//! same payload produce identical frames.
//!
//! The optional frame checksum is the two's complement of the byte sum of
//! the JSON text, mod 256. Verification sums every received byte including
//! the trailing checksum byte: a zero result means intact, anything else is
//! corruption and the text must not be parsed.
//!
//! Malformed JSON is a [`PayloadError`], deliberately distinct from a
//! checksum mismatch: the former is a codec failure, the latter is wire
//! corruption.

use core::fmt::Write;
use core::str;

use heapless::{String, Vec};

/// Maximum number of key/value entries in one payload.
pub const MAX_ENTRIES: usize = 16;
/// Maximum key length in bytes.
pub const MAX_KEY_LEN: usize = 16;
/// Maximum string value length in bytes.
pub const MAX_STR_LEN: usize = 48;

/// Payload key.
pub type Key = String<MAX_KEY_LEN>;

/// A payload value: string or number.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    Str(String<MAX_STR_LEN>),
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(x) => Some(*x),
            _ => None,
        }
    }
}

/// Error type for payload construction and JSON codec failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// A key, value, entry table or output buffer ran out of capacity.
    Overflow,
    /// The received bytes are not valid UTF-8.
    NotUtf8,
    /// The text is not a flat JSON object of string/number values.
    Syntax,
    /// A number token did not parse.
    BadNumber,
    /// An unsupported escape sequence inside a string.
    BadEscape,
}

/// Ordered key→value mapping exchanged between nodes.
///
/// Fixed capacity, built per call, never retained by the driver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    entries: Vec<(Key, Value), MAX_ENTRIES>,
}

impl Payload {
    pub fn new() -> Self {
        Payload::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Insert or replace an entry. Replacing keeps the entry's original
    /// position.
    pub fn insert(&mut self, key: &str, value: Value) -> Result<(), PayloadError> {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            *existing = value;
            return Ok(());
        }
        let mut owned = Key::new();
        owned.push_str(key).map_err(|_| PayloadError::Overflow)?;
        self.entries
            .push((owned, value))
            .map_err(|_| PayloadError::Overflow)
    }

    pub fn insert_str(&mut self, key: &str, value: &str) -> Result<(), PayloadError> {
        let mut owned = String::new();
        owned.push_str(value).map_err(|_| PayloadError::Overflow)?;
        self.insert(key, Value::Str(owned))
    }

    pub fn insert_int(&mut self, key: &str, value: i64) -> Result<(), PayloadError> {
        self.insert(key, Value::Int(value))
    }

    pub fn insert_float(&mut self, key: &str, value: f64) -> Result<(), PayloadError> {
        self.insert(key, Value::Float(value))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    /// Serialize to compact JSON.
    pub fn encode_json<const N: usize>(&self, out: &mut String<N>) -> Result<(), PayloadError> {
        out.push('{').map_err(|_| PayloadError::Overflow)?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                out.push(',').map_err(|_| PayloadError::Overflow)?;
            }
            write_json_string(out, key.as_str())?;
            out.push(':').map_err(|_| PayloadError::Overflow)?;
            match value {
                Value::Str(s) => write_json_string(out, s.as_str())?,
                Value::Int(n) => write!(out, "{}", n).map_err(|_| PayloadError::Overflow)?,
                Value::Float(x) => write!(out, "{}", x).map_err(|_| PayloadError::Overflow)?,
            }
        }
        out.push('}').map_err(|_| PayloadError::Overflow)
    }

    /// Parse a compact JSON object.
    pub fn from_json(text: &str) -> Result<Self, PayloadError> {
        let mut parser = Parser {
            bytes: text.as_bytes(),
            text,
            pos: 0,
        };
        let payload = parser.object()?;
        parser.skip_whitespace();
        if parser.pos != parser.bytes.len() {
            return Err(PayloadError::Syntax);
        }
        Ok(payload)
    }

    /// Parse raw received bytes as UTF-8 JSON.
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, PayloadError> {
        let text = str::from_utf8(bytes).map_err(|_| PayloadError::NotUtf8)?;
        Self::from_json(text)
    }
}

/// Two's complement of the byte sum mod 256.
///
/// Appended to a frame, it makes the sum of the whole frame zero; a
/// nonzero result over a received frame means corruption.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes
        .iter()
        .fold(0u8, |sum, b| sum.wrapping_add(*b))
        .wrapping_neg()
}

fn write_json_string<const N: usize>(out: &mut String<N>, s: &str) -> Result<(), PayloadError> {
    out.push('"').map_err(|_| PayloadError::Overflow)?;
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
        .map_err(|_| PayloadError::Overflow)?;
    }
    out.push('"').map_err(|_| PayloadError::Overflow)
}

struct Parser<'a> {
    bytes: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn skip_whitespace(&mut self) {
        while let Some(b) = self.bytes.get(self.pos) {
            if matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Result<(), PayloadError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(PayloadError::Syntax)
        }
    }

    fn object(&mut self) -> Result<Payload, PayloadError> {
        self.skip_whitespace();
        self.expect(b'{')?;
        let mut payload = Payload::new();
        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(payload);
        }
        loop {
            self.skip_whitespace();
            let key: Key = self.string()?;
            self.skip_whitespace();
            self.expect(b':')?;
            self.skip_whitespace();
            let value = self.value()?;
            payload
                .entries
                .push((key, value))
                .map_err(|_| PayloadError::Overflow)?;
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    return Ok(payload);
                }
                _ => return Err(PayloadError::Syntax),
            }
        }
    }

    fn value(&mut self) -> Result<Value, PayloadError> {
        match self.peek() {
            Some(b'"') => Ok(Value::Str(self.string()?)),
            Some(b'-') | Some(b'0'..=b'9') => self.number(),
            _ => Err(PayloadError::Syntax),
        }
    }

    fn string<const N: usize>(&mut self) -> Result<String<N>, PayloadError> {
        self.expect(b'"')?;
        let mut out = String::new();
        let mut run_start = self.pos;
        loop {
            match self.peek() {
                Some(b'"') => {
                    out.push_str(&self.text[run_start..self.pos])
                        .map_err(|_| PayloadError::Overflow)?;
                    self.pos += 1;
                    return Ok(out);
                }
                Some(b'\\') => {
                    out.push_str(&self.text[run_start..self.pos])
                        .map_err(|_| PayloadError::Overflow)?;
                    self.pos += 1;
                    let escaped = match self.peek() {
                        Some(b'"') => '"',
                        Some(b'\\') => '\\',
                        Some(b'/') => '/',
                        Some(b'n') => '\n',
                        Some(b'r') => '\r',
                        Some(b't') => '\t',
                        _ => return Err(PayloadError::BadEscape),
                    };
                    out.push(escaped).map_err(|_| PayloadError::Overflow)?;
                    self.pos += 1;
                    run_start = self.pos;
                }
                Some(_) => self.pos += 1,
                None => return Err(PayloadError::Syntax),
            }
        }
    }

    fn number(&mut self) -> Result<Value, PayloadError> {
        let start = self.pos;
        let mut float = false;
        while let Some(b) = self.peek() {
            match b {
                b'0'..=b'9' | b'-' | b'+' => self.pos += 1,
                b'.' | b'e' | b'E' => {
                    float = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }
        let token = &self.text[start..self.pos];
        if float {
            token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| PayloadError::BadNumber)
        } else {
            token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| PayloadError::BadNumber)
        }
    }
}
