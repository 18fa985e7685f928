use std::path::Path;

use chainwatch_types::Result;

use crate::config::CodecConfig;
use crate::input::StreamInput;
use crate::output::StreamOutput;

/// A value that can write itself to a [`StreamOutput`].
pub trait Writeable {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()>;
}

/// A value that can be reconstructed from a [`StreamInput`], reading fields
/// in the same order [`Writeable::write_to`] wrote them.
pub trait Readable: Sized {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self>;
}

impl Writeable for String {
    fn write_to(&self, out: &mut StreamOutput) -> Result<()> {
        out.write_string(self)
    }
}

impl Readable for String {
    fn read_from(input: &mut StreamInput<'_>) -> Result<Self> {
        input.read_string()
    }
}

/// Encode a value into a fresh byte buffer.
pub fn to_bytes<T: Writeable + ?Sized>(value: &T) -> Result<Vec<u8>> {
    to_bytes_with_config(value, CodecConfig::default())
}

/// Encode under `config`, failing with an encode error on anything the
/// decoder would refuse under the same limits.
pub fn to_bytes_with_config<T: Writeable + ?Sized>(
    value: &T,
    config: CodecConfig,
) -> Result<Vec<u8>> {
    let mut out = StreamOutput::with_config(config);
    value.write_to(&mut out)?;
    Ok(out.into_bytes())
}

/// Decode a value from `bytes`, rejecting trailing data.
pub fn from_bytes<T: Readable>(bytes: &[u8]) -> Result<T> {
    from_bytes_with_config(bytes, CodecConfig::default())
}

pub fn from_bytes_with_config<T: Readable>(bytes: &[u8], config: CodecConfig) -> Result<T> {
    let mut input = StreamInput::with_config(bytes, config);
    let value = T::read_from(&mut input).inspect_err(|e| {
        tracing::warn!("Rejected stream of {} bytes: {}", bytes.len(), e);
    })?;
    input.finish()?;
    tracing::debug!("Decoded {} bytes", bytes.len());
    Ok(value)
}

/// Decode a value from the file at `path`.
pub fn read_file<T: Readable>(path: &Path, config: CodecConfig) -> Result<T> {
    let bytes = std::fs::read(path)?;
    tracing::debug!("Read {} bytes from {}", bytes.len(), path.display());
    from_bytes_with_config(&bytes, config)
}

/// Encode `value` and write it to `path`, returning the number of bytes written.
pub fn write_file<T: Writeable + ?Sized>(
    path: &Path,
    value: &T,
    config: CodecConfig,
) -> Result<usize> {
    let bytes = to_bytes_with_config(value, config)?;
    std::fs::write(path, &bytes)?;
    Ok(bytes.len())
}
