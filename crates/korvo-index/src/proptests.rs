//! Model-based property tests: the tree against `BTreeMap`.

use std::collections::BTreeMap;

use proptest::prelude::*;

use crate::ExpTree;

/// Operations replayed against both implementations.
#[derive(Debug, Clone)]
enum Action {
    Insert(i64, i64),
    Get(i64),
}

/// Keys drawn mostly from a dense cluster so sequences hit replacements
/// and splits, with occasional full-range outliers.
fn key_strategy() -> impl Strategy<Value = i64> {
    prop_oneof![
        4 => -24i64..24,
        1 => any::<i64>(),
    ]
}

fn action_strategy() -> impl Strategy<Value = Action> {
    prop_oneof![
        3 => (key_strategy(), any::<i64>()).prop_map(|(k, v)| Action::Insert(k, v)),
        1 => key_strategy().prop_map(Action::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn matches_btreemap_model(actions in proptest::collection::vec(action_strategy(), 1..512)) {
        let mut tree: ExpTree<i64, i64> = ExpTree::new();
        let mut model: BTreeMap<i64, i64> = BTreeMap::new();

        for action in actions {
            match action {
                Action::Insert(key, value) => {
                    let was_present = tree.insert(key, value).unwrap();
                    prop_assert_eq!(was_present, model.insert(key, value).is_some());
                }
                Action::Get(key) => {
                    prop_assert_eq!(tree.get(&key), model.get(&key).copied());
                }
            }
        }

        prop_assert!(tree.check_invariants());
        prop_assert_eq!(tree.count(), model.len());
        for (key, value) in &model {
            prop_assert_eq!(tree.get(key), Some(*value));
        }
    }

    #[test]
    fn ascending_bulk_load(n in 1usize..2048) {
        let mut tree: ExpTree<i64, i64> = ExpTree::new();
        for i in 0..n as i64 {
            tree.insert(i, !i).unwrap();
        }

        prop_assert!(tree.check_invariants());
        prop_assert_eq!(tree.count(), n);
        prop_assert_eq!(tree.get(&0), Some(!0));
        prop_assert_eq!(tree.get(&(n as i64 - 1)), Some(!(n as i64 - 1)));
        prop_assert_eq!(tree.get(&(n as i64)), None);
    }
}
