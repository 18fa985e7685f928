use chainwatch_stream::*;
use chainwatch_types::{ErrorValue, ScriptError};
use proptest::prelude::*;

fn encoded_fixture(names: &[String]) -> Vec<u8> {
    let mut out = StreamOutput::new();
    out.write_string_collection(names).unwrap();
    let script = ScriptError::new("1 +", "painless").with_stack(["1 +"]);
    let err = ErrorValue::script("bad script", script)
        .with_cause(ErrorValue::generic("parse failure"));
    out.write_optional_error(Some(&err)).unwrap();
    out.into_bytes()
}

fn decode_fixture(bytes: &[u8]) -> chainwatch_types::Result<(Vec<String>, Option<ErrorValue>)> {
    let mut input = StreamInput::new(bytes);
    let names = input.read_string_list()?;
    let err = input.read_optional_error()?;
    input.finish()?;
    Ok((names, err))
}

proptest! {
    #[test]
    fn truncated_stream_always_fails_to_decode(
        names in proptest::collection::vec("[a-z0-9-]{0,12}", 0..8),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = encoded_fixture(&names);
        let cut = cut.index(bytes.len());
        let result = decode_fixture(&bytes[..cut]);
        prop_assert!(result.unwrap_err().is_decode());
    }
}

#[test]
fn full_stream_decodes() {
    let names = vec!["alpha".to_string(), "beta".to_string()];
    let bytes = encoded_fixture(&names);
    let (decoded, err) = decode_fixture(&bytes).unwrap();
    assert_eq!(decoded, names);
    let err = err.unwrap();
    assert!(err.is_script());
    assert_eq!(err.cause().unwrap().message(), Some("parse failure"));
}

#[test]
fn trailing_bytes_rejected() {
    let mut bytes = to_bytes(&"trigger".to_string()).unwrap();
    bytes.push(0);
    assert!(from_bytes::<String>(&bytes).unwrap_err().is_decode());
}

#[test]
fn file_roundtrip_and_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("name.bin");
    let written = write_file(&path, &"trigger".to_string(), CodecConfig::default()).unwrap();
    assert_eq!(written, 8);
    let name: String = read_file(&path, CodecConfig::default()).unwrap();
    assert_eq!(name, "trigger");

    let err = read_file::<String>(&dir.path().join("missing.bin"), CodecConfig::default())
        .unwrap_err();
    assert!(matches!(err, chainwatch_types::ChainwatchError::Io(_)));
}

#[test]
fn encoder_refuses_what_decoder_would_reject() {
    let message = "x".repeat(CodecConfig::default().max_string_len + 1);
    let err = ErrorValue::generic(message);
    let mut out = StreamOutput::new();
    let result = out.write_optional_error(Some(&err));
    assert!(matches!(result, Err(chainwatch_types::ChainwatchError::Encode(_))));
}
