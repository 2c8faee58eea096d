mod common;

use common::{user_record, User};
use docsync::encode::encode_record;
use docsync::{
    decode, diff_batch, ChangeBatch, ChangeEvent, DecodeContext, DocumentPath, DocumentRecord,
    DocumentValue,
};
use indexmap::IndexMap;
use proptest::prelude::*;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
enum Step {
    Added(usize),
    Modified(usize, usize),
    Removed(usize),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..50usize).prop_map(Step::Added),
        (0..50usize, 0..50usize).prop_map(|(o, n)| Step::Modified(o, n)),
        (0..50usize).prop_map(Step::Removed),
    ]
}

fn event(position: usize, step: &Step) -> ChangeEvent {
    let record = user_record(&format!("u{position}"), &format!("name{position}"));
    match *step {
        Step::Added(new_index) => ChangeEvent::Added { record, new_index },
        Step::Modified(old_index, new_index) => ChangeEvent::Modified {
            record,
            old_index,
            new_index,
        },
        Step::Removed(old_index) => ChangeEvent::Removed { record, old_index },
    }
}

fn position(user: &User) -> usize {
    user.username
        .trim_start_matches("name")
        .parse()
        .unwrap_or(usize::MAX)
}

fn user_strategy() -> impl Strategy<Value = User> {
    (
        "[a-z]{1,12}",
        prop::option::of("[ -~]{0,16}"),
        any::<i64>(),
        any::<bool>(),
        -1.0e9..1.0e9f64,
    )
        .prop_map(|(username, display_name, age, verified, score)| User {
            username,
            display_name,
            age,
            verified,
            score,
            avatar: None,
        })
}

fn primitive_json() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[ -~]{0,16}".prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        (-1.0e12..1.0e12f64).prop_map(Value::from),
    ]
}

fn primitive_fields() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::vec(("[a-zA-Z_][a-zA-Z0-9_]{0,8}", primitive_json()), 0..10)
        .prop_map(|pairs| pairs.into_iter().collect())
}

proptest! {
    #[test]
    fn buckets_partition_events_in_arrival_order(
        steps in prop::collection::vec(step(), 0..24),
        members in 0..8usize,
    ) {
        let batch = ChangeBatch {
            events: steps.iter().enumerate().map(|(i, s)| event(i, s)).collect(),
            membership: (0..members)
                .map(|i| user_record(&format!("m{i}"), &format!("member{i}")))
                .collect(),
            ..Default::default()
        };
        let diff = diff_batch::<User>(&batch, &DecodeContext::default()).unwrap();

        prop_assert_eq!(diff.change_count(), steps.len());
        prop_assert_eq!(diff.current.len(), members);

        let added: Vec<usize> = diff.additions.iter().map(|a| position(&a.value)).collect();
        let modified: Vec<usize> = diff.modifications.iter().map(|m| position(&m.value)).collect();
        let removed: Vec<usize> = diff.removals.iter().map(|r| position(&r.value)).collect();
        for bucket in [&added, &modified, &removed] {
            prop_assert!(bucket.windows(2).all(|w| w[0] < w[1]));
        }

        for (i, s) in steps.iter().enumerate() {
            match *s {
                Step::Added(new_index) => {
                    let at = added.iter().position(|&p| p == i).unwrap();
                    prop_assert_eq!(diff.additions[at].index, new_index);
                }
                Step::Modified(old_index, new_index) => {
                    let at = modified.iter().position(|&p| p == i).unwrap();
                    prop_assert_eq!(diff.modifications[at].old_index, old_index);
                    prop_assert_eq!(diff.modifications[at].new_index, new_index);
                }
                Step::Removed(old_index) => {
                    let at = removed.iter().position(|&p| p == i).unwrap();
                    prop_assert_eq!(diff.removals[at].old_index, old_index);
                }
            }
        }
    }

    #[test]
    fn encoded_user_decodes_to_itself(user in user_strategy()) {
        let path = DocumentPath::parse("users/p1").unwrap();
        let record: DocumentRecord = encode_record(path, &user).unwrap();
        let back: User = decode(&record, &DecodeContext::default()).unwrap();
        prop_assert_eq!(back, user);
    }

    #[test]
    fn decoded_record_encodes_to_its_fields(fields in primitive_fields()) {
        let path = DocumentPath::parse("things/p1").unwrap();
        let record = DocumentRecord::from_json(path.clone(), Value::Object(fields)).unwrap();
        let decoded: IndexMap<String, DocumentValue> =
            decode(&record, &DecodeContext::default()).unwrap();
        let back = encode_record(path, &decoded).unwrap();
        prop_assert_eq!(back.fields(), record.fields());
    }
}
