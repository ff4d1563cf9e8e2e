use device_policy_core::{
    PasswordMode, PolicyAggregator, PolicyError, PolicyRecord, EMPTY_POLICY,
};
use proptest::prelude::*;

fn any_mode() -> impl Strategy<Value = PasswordMode> {
    prop_oneof![
        Just(PasswordMode::None),
        Just(PasswordMode::Simple),
        Just(PasswordMode::Strong),
    ]
}

prop_compose! {
    fn any_record()(
        len in 0u32..=31,
        mode in any_mode(),
        fails in 0u32..=31,
        lock in 0u32..=2047,
        wipe in any::<bool>(),
    ) -> PolicyRecord {
        PolicyRecord::new(len, mode, fails, lock, wipe).unwrap()
    }
}

proptest! {
    #[test]
    fn decode_inverts_encode(record in any_record()) {
        let raw = record.encode();
        prop_assert!(raw < 1 << 26);
        prop_assert_eq!(PolicyRecord::decode(raw).unwrap(), record);
    }

    #[test]
    fn equal_encodings_mean_equal_records(a in any_record(), b in any_record()) {
        prop_assert_eq!(a == b, a.encode() == b.encode());
    }

    #[test]
    fn decode_rejects_exactly_the_reserved_modes(raw in 0u32..(1 << 26)) {
        let mode = (raw >> 5) & 0x0f;
        match PolicyRecord::decode(raw) {
            Ok(record) => {
                prop_assert!(mode <= 2);
                prop_assert_eq!(record.encode(), raw);
            }
            Err(err) => {
                prop_assert!(mode > 2);
                prop_assert_eq!(err, PolicyError::InvalidEncoding { raw, mode });
            }
        }
    }

    #[test]
    fn oversized_length_is_rejected(len in 32u32..10_000) {
        let result = PolicyRecord::new(len, PasswordMode::None, 0, 0, false);
        let is_range_error = matches!(result, Err(PolicyError::Range { .. }));
        prop_assert!(is_range_error);
    }

    #[test]
    fn merge_ignores_order(
        (records, shuffled) in prop::collection::vec(any_record(), 0..8)
            .prop_flat_map(|records| (Just(records.clone()), Just(records).prop_shuffle())),
    ) {
        prop_assert_eq!(
            PolicyAggregator::merge(&shuffled),
            PolicyAggregator::merge(&records)
        );
    }

    #[test]
    fn merge_is_associative(
        left in prop::collection::vec(any_record(), 0..5),
        right in prop::collection::vec(any_record(), 0..5),
    ) {
        let whole: Vec<_> = left.iter().chain(right.iter()).copied().collect();
        let nested = [PolicyAggregator::merge(&left), PolicyAggregator::merge(&right)];
        prop_assert_eq!(PolicyAggregator::merge(&nested), PolicyAggregator::merge(&whole));
    }

    #[test]
    fn merge_is_at_least_as_strict_as_each_input(
        records in prop::collection::vec(any_record(), 1..8),
    ) {
        let merged = PolicyAggregator::merge(&records);
        for record in &records {
            prop_assert!(merged.min_password_length() >= record.min_password_length());
            prop_assert!(merged.password_mode() >= record.password_mode());
            if record.max_password_failures() > 0 {
                prop_assert!(merged.max_password_failures() > 0);
                prop_assert!(merged.max_password_failures() <= record.max_password_failures());
            }
            if record.max_screen_lock_seconds() > 0 {
                prop_assert!(merged.max_screen_lock_seconds() > 0);
                prop_assert!(merged.max_screen_lock_seconds() <= record.max_screen_lock_seconds());
            }
            if record.require_remote_wipe() {
                prop_assert!(merged.require_remote_wipe());
            }
        }
    }

    #[test]
    fn empty_records_never_change_the_merge(
        records in prop::collection::vec(any_record(), 0..6),
        padding in 0usize..4,
    ) {
        let mut padded = records.clone();
        padded.extend(std::iter::repeat(EMPTY_POLICY).take(padding));
        prop_assert_eq!(PolicyAggregator::merge(&padded), PolicyAggregator::merge(&records));
    }
}

#[test]
fn documented_strictness_example() {
    let a = PolicyRecord::new(4, PasswordMode::Simple, 0, 0, false).unwrap();
    let b = PolicyRecord::new(8, PasswordMode::Strong, 5, 0, false).unwrap();
    let expected = PolicyRecord::new(8, PasswordMode::Strong, 5, 0, false).unwrap();
    assert_eq!(PolicyAggregator::merge(&[a, b]), expected);
    assert_eq!(PolicyAggregator::merge(&[b, a]), expected);
}

#[test]
fn serde_uses_the_packed_integer() {
    let record = PolicyRecord::new(8, PasswordMode::Strong, 5, 60, true).unwrap();
    let json = serde_json::to_string(&record).unwrap();
    assert_eq!(json, record.encode().to_string());
    let back: PolicyRecord = serde_json::from_str(&json).unwrap();
    assert_eq!(back, record);

    assert!(serde_json::from_str::<PolicyRecord>(&(3u32 << 5).to_string()).is_err());
}
