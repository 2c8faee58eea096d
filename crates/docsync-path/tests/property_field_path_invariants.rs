use docsync_path::FieldPath;
use proptest::prelude::*;

fn segment() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z_][a-zA-Z0-9_]{0,8}",
        "[0-9]{1,3}",
        "[ -~]{1,8}",
    ]
}

fn path() -> impl Strategy<Value = FieldPath> {
    prop::collection::vec(segment(), 0..6).prop_map(FieldPath::from_segments)
}

proptest! {
    #[test]
    fn display_then_parse_is_identity(p in path()) {
        prop_assert_eq!(FieldPath::parse(&p.to_string()).unwrap(), p);
    }

    #[test]
    fn join_is_associative(a in path(), b in path(), c in path()) {
        prop_assert_eq!(a.join(&b).join(&c), a.join(&b.join(&c)));
    }

    #[test]
    fn child_matches_join(a in path(), s in segment()) {
        prop_assert_eq!(a.child(s.clone()), a.join(&FieldPath::from(s)));
    }

    #[test]
    fn parent_undoes_child(a in path(), s in segment()) {
        prop_assert_eq!(a.child(s).parent().unwrap(), a);
    }
}
