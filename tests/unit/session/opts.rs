use super::*;

#[test]
fn defaults() {
    let opts = StoreOpts::default();
    assert_eq!(opts.max_history_len, 1024);
    assert!(opts.merge_draws);
    assert!(opts.capture_after_replay);
}

#[test]
fn from_json_fills_missing_fields() {
    let opts = StoreOpts::from_json(r#"{"max_history_len": 8}"#).unwrap();
    assert_eq!(
        opts,
        StoreOpts {
            max_history_len: 8,
            ..StoreOpts::default()
        }
    );
    assert_eq!(StoreOpts::from_json("{}").unwrap(), StoreOpts::default());
}

#[test]
fn from_json_rejects_unknown_fields_and_bad_types() {
    let err = StoreOpts::from_json(r#"{"history": 8}"#).unwrap_err();
    assert!(matches!(err, RestorableError::Serde(_)));
    assert!(StoreOpts::from_json(r#"{"merge_draws": "yes"}"#).is_err());
}

#[test]
fn json_round_trip_keeps_values() {
    let opts = StoreOpts {
        max_history_len: 3,
        merge_draws: false,
        capture_after_replay: false,
    };
    let s = serde_json::to_string(&opts).unwrap();
    assert_eq!(StoreOpts::from_json(&s).unwrap(), opts);
}

fn with_history_var(value: &str) -> StoreOpts {
    StoreOpts::default().with_overrides_from(|key| {
        assert_eq!(key, MAX_HISTORY_ENV);
        Some(value.to_owned())
    })
}

#[test]
fn history_override_accepts_only_positive_integers() {
    assert_eq!(with_history_var("7").max_history_len, 7);
    assert_eq!(with_history_var(" 12 ").max_history_len, 12);
    assert_eq!(with_history_var("0").max_history_len, 1024);
    assert_eq!(with_history_var("junk").max_history_len, 1024);
    assert_eq!(with_history_var("-3").max_history_len, 1024);
    assert_eq!(
        StoreOpts::default()
            .with_overrides_from(|_| None)
            .max_history_len,
        1024
    );
}

#[test]
fn history_override_keeps_other_fields() {
    let opts = StoreOpts {
        merge_draws: false,
        ..StoreOpts::default()
    };
    let opts = opts.with_overrides_from(|_| Some("5".to_owned()));
    assert_eq!(opts.max_history_len, 5);
    assert!(!opts.merge_draws);
    assert!(opts.capture_after_replay);
}
