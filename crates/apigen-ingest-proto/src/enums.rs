//! Enum alias deduplication.
//!
//! Protobuf enums may declare aliases (`allow_alias`), several names for the
//! same number. Generated code needs exactly one canonical name per number.

use apigen_model::EnumValue;
use std::collections::BTreeMap;

/// Whether `candidate` should replace `current` as the canonical name.
///
/// An all-uppercase name beats a mixed or lowercase one; between names of the
/// same style the strictly shorter one wins. Equal candidates keep `current`.
pub fn is_preferred(candidate: &str, current: &str) -> bool {
    match (is_upper(candidate), is_upper(current)) {
        (true, false) => true,
        (false, true) => false,
        _ => candidate.len() < current.len(),
    }
}

fn is_upper(name: &str) -> bool {
    !name.chars().any(char::is_lowercase)
}

/// Indexes into `values` of one canonical value per distinct number,
/// ascending by number.
pub fn unique_number_values(values: &[EnumValue]) -> Vec<usize> {
    let mut best: BTreeMap<i32, usize> = BTreeMap::new();
    for (idx, value) in values.iter().enumerate() {
        best.entry(value.number)
            .and_modify(|current| {
                if is_preferred(&value.name, &values[*current].name) {
                    *current = idx;
                }
            })
            .or_insert(idx);
    }
    best.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn values(pairs: &[(&str, i32)]) -> Vec<EnumValue> {
        pairs
            .iter()
            .map(|(name, number)| EnumValue {
                name: name.to_string(),
                number: *number,
                parent: ".test.Color".to_string(),
                ..Default::default()
            })
            .collect()
    }

    fn canonical(pairs: &[(&str, i32)]) -> Vec<(String, i32)> {
        let values = values(pairs);
        unique_number_values(&values)
            .into_iter()
            .map(|i| (values[i].name.clone(), values[i].number))
            .collect()
    }

    #[test]
    fn shorter_alias_wins() {
        assert_eq!(
            canonical(&[("RED", 1), ("CRIMSON", 1), ("BLUE", 2)]),
            vec![("RED".to_string(), 1), ("BLUE".to_string(), 2)]
        );
    }

    #[test]
    fn uppercase_beats_lowercase() {
        assert_eq!(canonical(&[("ok", 3), ("OK", 3)]), vec![("OK".to_string(), 3)]);
        assert_eq!(
            canonical(&[("STATE_ACTIVE", 1), ("active", 1)]),
            vec![("STATE_ACTIVE".to_string(), 1)]
        );
    }

    #[test]
    fn ties_keep_first_declared() {
        assert_eq!(canonical(&[("ALPHA", 1), ("OMEGA", 1)]), vec![("ALPHA".to_string(), 1)]);
        assert_eq!(canonical(&[("OMEGA", 1), ("ALPHA", 1)]), vec![("OMEGA".to_string(), 1)]);
    }

    #[test]
    fn many_aliases_and_negative_numbers() {
        assert_eq!(
            canonical(&[
                ("UNSPECIFIED", 0),
                ("LONG_NAME", 5),
                ("Mid", 5),
                ("X", 5),
                ("lower", 5),
                ("NEG", -1),
                ("NEGATIVE", -1),
            ]),
            vec![
                ("NEG".to_string(), -1),
                ("UNSPECIFIED".to_string(), 0),
                ("X".to_string(), 5),
            ]
        );
        assert!(canonical(&[]).is_empty());
    }

    fn name_strategy() -> impl Strategy<Value = String> {
        proptest::string::string_regex("[A-Za-z_]{1,8}").unwrap()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        /// One value per distinct number, ascending.
        #[test]
        fn one_value_per_number(pairs in prop::collection::vec((name_strategy(), -4i32..4), 0..16)) {
            let values: Vec<EnumValue> = pairs
                .iter()
                .map(|(name, number)| EnumValue { name: name.clone(), number: *number, ..Default::default() })
                .collect();
            let unique = unique_number_values(&values);
            let numbers: Vec<i32> = unique.iter().map(|i| values[*i].number).collect();
            let mut expected: Vec<i32> = values.iter().map(|v| v.number).collect();
            expected.sort_unstable();
            expected.dedup();
            prop_assert_eq!(numbers, expected);
        }

        /// The canonical name does not depend on declaration order unless two
        /// candidates are equally preferred.
        #[test]
        fn canonical_name_is_order_independent(
            names in prop::collection::btree_set(name_strategy(), 1..8),
            seed in any::<u64>(),
        ) {
            let names: Vec<String> = names.into_iter().collect();
            let forward: Vec<EnumValue> = names
                .iter()
                .map(|n| EnumValue { name: n.clone(), number: 7, ..Default::default() })
                .collect();
            let mut shuffled = forward.clone();
            let len = shuffled.len();
            shuffled.rotate_left((seed as usize) % len);
            shuffled.reverse();

            let a = &forward[unique_number_values(&forward)[0]].name;
            let b = &shuffled[unique_number_values(&shuffled)[0]].name;

            let ambiguous = names
                .iter()
                .any(|n| n != a && !is_preferred(a, n) && !is_preferred(n, a));
            if !ambiguous {
                prop_assert_eq!(a, b);
            }
            // Whatever was chosen, nothing else is strictly better.
            for n in &names {
                prop_assert!(!is_preferred(n, b));
            }
        }
    }
}
