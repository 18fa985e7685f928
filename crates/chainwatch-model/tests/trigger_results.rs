use chainwatch_document::DocumentParams;
use chainwatch_model::*;
use chainwatch_stream::{CodecConfig, from_bytes, from_bytes_with_config, to_bytes};
use chainwatch_types::{ErrorValue, ScriptError, ScriptPosition};
use chrono::DateTime;
use proptest::prelude::*;

fn arb_error() -> impl Strategy<Value = ErrorValue> {
    let leaf = prop_oneof![
        "[ -~]{0,24}".prop_map(ErrorValue::generic),
        Just(ErrorValue::unknown()),
        (
            "[ -~]{0,16}",
            proptest::collection::vec("[ -~]{0,16}", 0..4),
            any::<(u32, u32, u32)>(),
        )
            .prop_map(|(msg, stack, (offset, start, end))| {
                ErrorValue::script(
                    msg,
                    ScriptError::new("ctx.x > 1", "painless")
                        .with_stack(stack)
                        .with_position(ScriptPosition { offset, start, end }),
                )
            }),
    ];
    leaf.prop_recursive(3, 8, 1, |inner| {
        ("[ -~]{0,24}", inner).prop_map(|(msg, cause)| ErrorValue::generic(msg).with_cause(cause))
    })
}

fn arb_action() -> impl Strategy<Value = ActionRunResult> {
    (
        "[a-z0-9]{1,8}",
        proptest::collection::btree_map("[a-z]{1,6}", "[ -~]{0,12}", 0..3),
        any::<bool>(),
        proptest::option::of(0i64..4_000_000_000_000),
        proptest::option::of(arb_error()),
    )
        .prop_map(|(name, output, throttled, millis, error)| {
            let mut action = ActionRunResult::new(format!("id-{name}"), name);
            action.output = output;
            action.throttled = throttled;
            action.execution_time = millis.and_then(DateTime::from_timestamp_millis);
            action.error = error;
            action
        })
}

fn arb_chained() -> impl Strategy<Value = ChainedAlertTriggerRunResult> {
    (
        "[a-z][a-z0-9-]{0,15}",
        any::<bool>(),
        proptest::option::of(arb_error()),
        proptest::collection::vec(arb_action(), 0..4),
        proptest::collection::vec("[a-f0-9]{4}", 0..6),
    )
        .prop_map(|(name, triggered, error, actions, alert_ids)| {
            let results: ActionResults = actions
                .into_iter()
                .map(|a| (a.action_id.clone(), a))
                .collect();
            ChainedAlertTriggerRunResult::new(name, triggered, error, alert_ids)
                .with_action_results(results)
        })
}

fn arb_query() -> impl Strategy<Value = QueryLevelTriggerRunResult> {
    (
        "[a-z][a-z0-9-]{0,15}",
        any::<bool>(),
        proptest::option::of(arb_error()),
        proptest::collection::vec(arb_action(), 0..4),
    )
        .prop_map(|(name, triggered, error, actions)| {
            let results: ActionResults = actions
                .into_iter()
                .map(|a| (a.action_id.clone(), a))
                .collect();
            QueryLevelTriggerRunResult::new(name, triggered, error).with_action_results(results)
        })
}

proptest! {
    #[test]
    fn chained_result_survives_stream_roundtrip(result in arb_chained()) {
        let bytes = to_bytes(&result).unwrap();
        let decoded: ChainedAlertTriggerRunResult = from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded, result);
    }

    #[test]
    fn truncated_chained_result_never_decodes(
        result in arb_chained(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = to_bytes(&result).unwrap();
        let cut = cut.index(bytes.len());
        let err = from_bytes::<ChainedAlertTriggerRunResult>(&bytes[..cut]).unwrap_err();
        prop_assert!(err.is_decode());
    }

    #[test]
    fn query_result_survives_stream_roundtrip(result in arb_query()) {
        let bytes = to_bytes(&result).unwrap();
        let decoded: QueryLevelTriggerRunResult = from_bytes(&bytes).unwrap();
        prop_assert_eq!(decoded, result);
    }

    #[test]
    fn truncated_query_result_never_decodes(
        result in arb_query(),
        cut in any::<prop::sample::Index>(),
    ) {
        let bytes = to_bytes(&result).unwrap();
        let cut = cut.index(bytes.len());
        let err = from_bytes::<QueryLevelTriggerRunResult>(&bytes[..cut]).unwrap_err();
        prop_assert!(err.is_decode());
    }

    #[test]
    fn alert_ids_collapse_to_set(ids in proptest::collection::vec("[a-c]", 0..10)) {
        let unique: std::collections::HashSet<&String> = ids.iter().collect();
        let result = ChainedAlertTriggerRunResult::new("t", true, None, ids.clone());
        prop_assert_eq!(result.associated_alert_ids().len(), unique.len());
    }

    #[test]
    fn trigger_error_always_prefixed(result in arb_chained(), msg in "[ -~]{1,16}") {
        let with_error = ChainedAlertTriggerRunResult::new(
            result.trigger_name(),
            result.triggered(),
            Some(ErrorValue::generic(msg)),
            result.associated_alert_ids().iter().cloned(),
        )
        .with_action_results(result.action_results().clone());
        let alert = with_error.alert_error().unwrap();
        prop_assert!(alert.message.starts_with("Failed evaluating trigger:\n"));
    }

    #[test]
    fn document_rendering_is_idempotent(mut result in arb_chained()) {
        let params = DocumentParams::default();
        let first = result.to_document_value(&params).unwrap();
        let second = result.to_document_value(&params).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn results_aggregate_through_trait_objects() {
    let mut chained = ChainedAlertTriggerRunResult::new("chained", true, None, ["alert-7"]);
    chained.add_action_result(
        "notify",
        ActionRunResult::new("notify", "notify").with_error(ErrorValue::generic("403 Forbidden")),
    );
    let query = QueryLevelTriggerRunResult::new("query", false, Some(ErrorValue::unknown()));

    let results: Vec<Box<dyn TriggerRunResult>> = vec![Box::new(chained), Box::new(query)];
    let messages: Vec<String> = results
        .iter()
        .filter_map(|r| r.alert_error())
        .map(|e| e.message)
        .collect();

    assert_eq!(
        messages,
        [
            "Failed running action:\n403 Forbidden",
            "Failed evaluating trigger:\nUnknown Internal error. See the logs for details.",
        ]
    );
}

#[test]
fn script_error_message_uses_stack() {
    let script = ScriptError::new("doc['cpu'].value >", "painless")
        .with_stack(["doc['cpu'].value >", "                  ^---- HERE"]);
    let result = ChainedAlertTriggerRunResult::new(
        "t",
        false,
        Some(ErrorValue::script("compile error", script)),
        Vec::<String>::new(),
    );
    assert_eq!(
        result.alert_error().unwrap().message,
        "Failed evaluating trigger:\ndoc['cpu'].value >\n                  ^---- HERE"
    );
}

#[test]
fn omitted_nulls_drop_error_field() {
    let mut result = ChainedAlertTriggerRunResult::new("t", true, None, ["a"]);
    let params = DocumentParams {
        omit_null_fields: true,
        ..DocumentParams::default()
    };
    let doc = result.to_document_value(&params).unwrap();
    assert!(doc.get("error").is_none());
    assert_eq!(doc["name"], "t");
}

#[test]
fn codec_limits_apply_to_alert_ids() {
    let ids: Vec<String> = (0..10).map(|i| format!("alert-{i}")).collect();
    let result = ChainedAlertTriggerRunResult::new("t", true, None, ids);
    let bytes = to_bytes(&result).unwrap();
    let config = CodecConfig {
        max_collection_len: 5,
        ..CodecConfig::default()
    };
    let err = from_bytes_with_config::<ChainedAlertTriggerRunResult>(&bytes, config).unwrap_err();
    assert!(err.is_decode());
}
