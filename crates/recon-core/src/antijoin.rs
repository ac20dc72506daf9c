//! Key-set anti-joins.
//!
//! Both reconciliation directions reduce to one primitive: take the rows of
//! one side whose key does not appear in the other side's key set. Empty
//! keys never participate in matching, so a row with an empty key is always
//! part of the difference.

use std::collections::BTreeSet;

use tracing::debug;

use recon_model::{Dataset, ReconError, Result};

/// Collect the distinct non-empty keys of a dataset.
pub fn key_set(dataset: &Dataset, key_column: &str) -> BTreeSet<String> {
    dataset
        .rows()
        .iter()
        .map(|row| row.trimmed(key_column))
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Anti-join: rows of `left` whose key is empty or absent from `right`.
///
/// Errors when either side lacks its key column, which means key generation
/// did not run or the configuration points at the wrong column.
pub fn subtract(
    left: &Dataset,
    left_key: &str,
    right: &Dataset,
    right_key: &str,
) -> Result<Dataset> {
    if !left.is_empty() && !left.has_column(left_key) {
        return Err(ReconError::MissingKeyColumn {
            side: "left".to_string(),
            column: left_key.to_string(),
        });
    }
    if !right.is_empty() && !right.has_column(right_key) {
        return Err(ReconError::MissingKeyColumn {
            side: "right".to_string(),
            column: right_key.to_string(),
        });
    }
    let matched = key_set(right, right_key);
    let (unmatched, _) = left.partition(|row| {
        let key = row.trimmed(left_key);
        key.is_empty() || !matched.contains(key)
    });
    debug!(
        left_rows = left.len(),
        right_keys = matched.len(),
        unmatched = unmatched.len(),
        "anti-join"
    );
    Ok(unmatched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recon_model::Record;

    fn keyed(keys: &[&str]) -> Dataset {
        let mut dataset = Dataset::new(["CHAVE"]);
        for key in keys {
            dataset.push_row(Record::from_pairs([("CHAVE", *key)]));
        }
        dataset
    }

    #[test]
    fn subtract_keeps_only_unmatched_rows() {
        let left = keyed(&["A", "B", "C"]);
        let right = keyed(&["B", "D"]);
        let result = subtract(&left, "CHAVE", &right, "CHAVE").unwrap();
        let keys: Vec<&str> = result.rows().iter().map(|r| r.trimmed("CHAVE")).collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn subtract_is_direction_sensitive() {
        let left = keyed(&["A", "B"]);
        let right = keyed(&["B", "C"]);
        let forward = subtract(&left, "CHAVE", &right, "CHAVE").unwrap();
        let reverse = subtract(&right, "CHAVE", &left, "CHAVE").unwrap();
        assert_eq!(forward.rows()[0].trimmed("CHAVE"), "A");
        assert_eq!(reverse.rows()[0].trimmed("CHAVE"), "C");
    }

    #[test]
    fn empty_keys_never_match_each_other() {
        let left = keyed(&["", "A"]);
        let right = keyed(&["", "A"]);
        let result = subtract(&left, "CHAVE", &right, "CHAVE").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.rows()[0].trimmed("CHAVE"), "");
    }

    #[test]
    fn duplicate_keys_all_survive_or_all_match() {
        let left = keyed(&["A", "A", "B", "B"]);
        let right = keyed(&["A"]);
        let result = subtract(&left, "CHAVE", &right, "CHAVE").unwrap();
        let keys: Vec<&str> = result.rows().iter().map(|r| r.trimmed("CHAVE")).collect();
        assert_eq!(keys, vec!["B", "B"]);
    }

    #[test]
    fn missing_key_column_is_fatal() {
        let left = keyed(&["A"]);
        let mut right = Dataset::new(["OUTRA"]);
        right.push_row(Record::from_pairs([("OUTRA", "x")]));
        let error = subtract(&left, "CHAVE", &right, "CHAVE").unwrap_err();
        assert!(matches!(
            error,
            ReconError::MissingKeyColumn { ref side, .. } if side == "right"
        ));
    }

    #[test]
    fn empty_right_side_returns_left_unchanged() {
        let left = keyed(&["A", "B"]);
        let right = Dataset::default();
        let result = subtract(&left, "CHAVE", &right, "CHAVE").unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn key_set_deduplicates_and_drops_empties() {
        let dataset = keyed(&["A", "A", "", " "]);
        let set = key_set(&dataset, "CHAVE");
        assert_eq!(set.len(), 1);
        assert!(set.contains("A"));
    }
}
