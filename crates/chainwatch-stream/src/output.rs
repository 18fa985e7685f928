use chrono::{DateTime, Utc};

use chainwatch_types::{ChainwatchError, ErrorKind, ErrorValue, Result};

use crate::config::CodecConfig;
use crate::traits::Writeable;

pub(crate) const ERROR_TAG_GENERIC: u8 = 0;
pub(crate) const ERROR_TAG_SCRIPT: u8 = 1;

/// Append-only binary encoder. Refuses to write anything a `StreamInput`
/// with the same [`CodecConfig`] would reject.
#[derive(Debug, Default, Clone)]
pub struct StreamOutput {
    buf: Vec<u8>,
    config: CodecConfig,
}

impl StreamOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: CodecConfig) -> Self {
        Self {
            buf: Vec::new(),
            config,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn write_byte(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Variable-length unsigned int: 7 bits per byte, high bit set while more follow.
    pub fn write_vint(&mut self, mut value: u32) {
        while value >= 0x80 {
            self.buf.push((value as u8 & 0x7f) | 0x80);
            value >>= 7;
        }
        self.buf.push(value as u8);
    }

    pub fn write_bool(&mut self, value: bool) {
        self.write_byte(u8::from(value));
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_string(&mut self, value: &str) -> Result<()> {
        if value.len() > self.config.max_string_len {
            return Err(ChainwatchError::Encode(format!(
                "string length {} exceeds limit {}",
                value.len(),
                self.config.max_string_len
            )));
        }
        self.write_len(value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_optional_string(&mut self, value: Option<&str>) -> Result<()> {
        match value {
            Some(s) => {
                self.write_bool(true);
                self.write_string(s)
            }
            None => {
                self.write_bool(false);
                Ok(())
            }
        }
    }

    /// Present flag followed by epoch milliseconds.
    pub fn write_optional_instant(&mut self, value: Option<DateTime<Utc>>) {
        match value {
            Some(ts) => {
                self.write_bool(true);
                self.write_i64(ts.timestamp_millis());
            }
            None => self.write_bool(false),
        }
    }

    pub fn write_string_collection<I, S>(&mut self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        I::IntoIter: ExactSizeIterator,
        S: AsRef<str>,
    {
        let values = values.into_iter();
        self.write_collection_len("string collection", values.len())?;
        for value in values {
            self.write_string(value.as_ref())?;
        }
        Ok(())
    }

    /// Size-prefixed sequence of string keys and [`Writeable`] values.
    pub fn write_map<'a, I, V>(&mut self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a V)>,
        I::IntoIter: ExactSizeIterator,
        V: Writeable + 'a,
    {
        let entries = entries.into_iter();
        self.write_collection_len("map", entries.len())?;
        for (key, value) in entries {
            self.write_string(key)?;
            value.write_to(self)?;
        }
        Ok(())
    }

    pub fn write_optional_error(&mut self, error: Option<&ErrorValue>) -> Result<()> {
        let depth = error.map_or(0, ErrorValue::depth);
        if depth > self.config.max_error_depth {
            return Err(ChainwatchError::Encode(format!(
                "error cause chain of {depth} exceeds limit {}",
                self.config.max_error_depth
            )));
        }
        self.write_optional_error_unchecked(error)
    }

    fn write_optional_error_unchecked(&mut self, error: Option<&ErrorValue>) -> Result<()> {
        match error {
            Some(err) => {
                self.write_bool(true);
                self.write_error(err)
            }
            None => {
                self.write_bool(false);
                Ok(())
            }
        }
    }

    fn write_error(&mut self, error: &ErrorValue) -> Result<()> {
        match &error.kind {
            ErrorKind::Generic => {
                self.write_byte(ERROR_TAG_GENERIC);
                self.write_optional_string(error.message())?;
            }
            ErrorKind::Script(script) => {
                self.write_byte(ERROR_TAG_SCRIPT);
                self.write_optional_string(error.message())?;
                self.write_string_collection(&script.script_stack)?;
                self.write_string(&script.script)?;
                self.write_string(&script.lang)?;
                match script.position {
                    Some(pos) => {
                        self.write_bool(true);
                        self.write_vint(pos.offset);
                        self.write_vint(pos.start);
                        self.write_vint(pos.end);
                    }
                    None => self.write_bool(false),
                }
            }
        }
        self.write_optional_error_unchecked(error.cause())
    }

    fn write_collection_len(&mut self, what: &str, len: usize) -> Result<()> {
        if len > self.config.max_collection_len {
            return Err(ChainwatchError::Encode(format!(
                "{what} size {len} exceeds limit {}",
                self.config.max_collection_len
            )));
        }
        self.write_len(len)
    }

    fn write_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| ChainwatchError::Encode(format!("length {len} exceeds u32 range")))?;
        self.write_vint(len);
        Ok(())
    }
}
