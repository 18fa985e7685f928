use std::collections::HashSet;

use chrono::{DateTime, Utc};

use chainwatch_types::{
    ChainwatchError, ErrorKind, ErrorValue, Result, ScriptError, ScriptPosition,
};

use crate::config::CodecConfig;
use crate::output::{ERROR_TAG_GENERIC, ERROR_TAG_SCRIPT};
use crate::traits::Readable;

/// Cursor over an encoded byte slice. Every read is bounds-checked and fails
/// with [`ChainwatchError::Decode`] instead of returning partial data.
#[derive(Debug, Clone)]
pub struct StreamInput<'a> {
    buf: &'a [u8],
    pos: usize,
    config: CodecConfig,
}

impl<'a> StreamInput<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_config(buf, CodecConfig::default())
    }

    pub fn with_config(buf: &'a [u8], config: CodecConfig) -> Self {
        Self {
            buf,
            pos: 0,
            config,
        }
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Fails if any bytes are left unread.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(self.error(format!("{n} trailing bytes"))),
        }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        let b = *self
            .buf
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of stream"))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.error(format!(
                "need {len} bytes, {} remaining",
                self.remaining()
            )));
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_vint(&mut self) -> Result<u32> {
        let mut value: u32 = 0;
        for i in 0..5 {
            let b = self.read_byte()?;
            if i == 4 && b > 0x0f {
                return Err(self.error("variable-length int overflows u32"));
            }
            value |= u32::from(b & 0x7f) << (7 * i);
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(self.error("variable-length int longer than 5 bytes"))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_byte()? {
            0 => Ok(false),
            1 => Ok(true),
            b => Err(self.error(format!("invalid boolean byte {b:#04x}"))),
        }
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.read_slice(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(i64::from_be_bytes(arr))
    }

    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_vint()? as usize;
        if len > self.config.max_string_len {
            return Err(self.error(format!(
                "string length {len} exceeds limit {}",
                self.config.max_string_len
            )));
        }
        let bytes = self.read_slice(len)?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| self.error(format!("invalid UTF-8: {e}")))
    }

    pub fn read_optional_string(&mut self) -> Result<Option<String>> {
        if self.read_bool()? {
            self.read_string().map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn read_optional_instant(&mut self) -> Result<Option<DateTime<Utc>>> {
        if !self.read_bool()? {
            return Ok(None);
        }
        let millis = self.read_i64()?;
        DateTime::from_timestamp_millis(millis)
            .map(Some)
            .ok_or_else(|| self.error(format!("timestamp {millis} out of range")))
    }

    /// Reads a collection size prefix. Each element occupies at least one
    /// byte, so a count larger than the remaining input is rejected up front.
    fn read_len(&mut self, what: &str) -> Result<usize> {
        let len = self.read_vint()? as usize;
        if len > self.config.max_collection_len {
            return Err(self.error(format!(
                "{what} size {len} exceeds limit {}",
                self.config.max_collection_len
            )));
        }
        if len > self.remaining() {
            return Err(self.error(format!(
                "{what} size {len} exceeds {} remaining bytes",
                self.remaining()
            )));
        }
        Ok(len)
    }

    pub fn read_string_list(&mut self) -> Result<Vec<String>> {
        let len = self.read_len("string collection")?;
        (0..len).map(|_| self.read_string()).collect()
    }

    /// Reads a string collection, collapsing duplicates.
    pub fn read_string_set(&mut self) -> Result<HashSet<String>> {
        Ok(self.read_string_list()?.into_iter().collect())
    }

    /// Reads a map written by `StreamOutput::write_map`, in stream order.
    pub fn read_map<V: Readable>(&mut self) -> Result<Vec<(String, V)>> {
        let len = self.read_len("map")?;
        let mut seen = HashSet::with_capacity(len);
        let mut entries = Vec::with_capacity(len);
        for _ in 0..len {
            let key = self.read_string()?;
            if !seen.insert(key.clone()) {
                return Err(self.error(format!("duplicate map key '{key}'")));
            }
            let value = V::read_from(self)?;
            entries.push((key, value));
        }
        Ok(entries)
    }

    pub fn read_optional_error(&mut self) -> Result<Option<ErrorValue>> {
        self.read_optional_error_at(1)
    }

    fn read_optional_error_at(&mut self, depth: usize) -> Result<Option<ErrorValue>> {
        if !self.read_bool()? {
            return Ok(None);
        }
        if depth > self.config.max_error_depth {
            return Err(self.error(format!(
                "error cause chain deeper than {}",
                self.config.max_error_depth
            )));
        }
        let is_script = match self.read_byte()? {
            ERROR_TAG_GENERIC => false,
            ERROR_TAG_SCRIPT => true,
            tag => return Err(self.error(format!("unknown error tag {tag}"))),
        };
        let message = self.read_optional_string()?;
        let kind = if is_script {
            let script_stack = self.read_string_list()?;
            let script = self.read_string()?;
            let lang = self.read_string()?;
            let position = if self.read_bool()? {
                Some(ScriptPosition {
                    offset: self.read_vint()?,
                    start: self.read_vint()?,
                    end: self.read_vint()?,
                })
            } else {
                None
            };
            ErrorKind::Script(ScriptError {
                script_stack,
                script,
                lang,
                position,
            })
        } else {
            ErrorKind::Generic
        };
        let cause = self.read_optional_error_at(depth + 1)?.map(Box::new);
        Ok(Some(ErrorValue {
            kind,
            message,
            cause,
        }))
    }

    pub(crate) fn error(&self, msg: impl std::fmt::Display) -> ChainwatchError {
        ChainwatchError::decode(format!("{msg} at byte {}", self.pos))
    }
}
