use serde_json::Value;

/// レスポンスエンベロープ `{status, message, data?, pagination?}` 向けアサーション。
pub struct EnvelopeAssert;

impl EnvelopeAssert {
    /// body をエンベロープとしてパースし、status が一致することを検証して返す。
    pub fn parse(body: &[u8], status: u16) -> Value {
        let val: Value = serde_json::from_slice(body).expect("body is not valid JSON");
        assert_eq!(
            val.get("status").and_then(Value::as_u64),
            Some(u64::from(status)),
            "unexpected envelope status in: {val}"
        );
        assert!(
            val.get("message").is_some_and(Value::is_string),
            "envelope has no message: {val}"
        );
        val
    }

    /// JSON 部分一致アサーション。
    ///
    /// `actual` が `expected` の全キー・値を含んでいることを検証する。
    /// `actual` に余分なキーがあっても失敗しない。
    pub fn assert_contains(actual: &Value, expected: &Value) {
        assert!(
            json_contains(actual, expected),
            "JSON partial match failed.\nActual: {actual}\nExpected: {expected}"
        );
    }
}

fn json_contains(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Object(a), Value::Object(e)) => e
            .iter()
            .all(|(k, v)| a.get(k).is_some_and(|av| json_contains(av, v))),
        (Value::Array(a), Value::Array(e)) => {
            e.iter().all(|ev| a.iter().any(|av| json_contains(av, ev)))
        }
        _ => actual == expected,
    }
}
