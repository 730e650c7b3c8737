// Operations over ordered lists of column names
// Author: Gabriel Demetrios Lafis

use std::collections::HashSet;

use super::DataError;

fn as_str<S: AsRef<str>>(name: &S) -> &str {
    name.as_ref()
}

/// Check that a name is non-empty and only uses letters, digits, `_` and `-`
pub fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

/// Check that no name occurs twice
pub fn are_names_unique<S: AsRef<str>>(names: &[S]) -> bool {
    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    names.iter().all(|name| seen.insert(as_str(name)))
}

/// Check that `name` occurs in `names`
pub fn contains_name<S: AsRef<str>>(names: &[S], name: &str) -> bool {
    index_of(names, name).is_some()
}

/// Position of `name` in `names`
pub fn index_of<S: AsRef<str>>(names: &[S], name: &str) -> Option<usize> {
    names.iter().position(|n| as_str(n) == name)
}

/// Names of `names` that are not in `remove`, keeping the order of `names`
pub fn name_difference<S: AsRef<str>, T: AsRef<str>>(names: &[S], remove: &[T]) -> Vec<String> {
    names
        .iter()
        .map(as_str)
        .filter(|name| !contains_name(remove, name))
        .map(str::to_string)
        .collect()
}

/// `first` followed by the names of `second` not already in `first`
pub fn merge_names<S: AsRef<str>, T: AsRef<str>>(first: &[S], second: &[T]) -> Vec<String> {
    let mut merged: Vec<String> = first.iter().map(|n| as_str(n).to_string()).collect();
    merged.extend(name_difference(second, first));
    merged
}

/// Fail with a schema error if `names` is empty
pub fn require_non_empty<S: AsRef<str>>(names: &[S], what: &str) -> Result<(), DataError> {
    if names.is_empty() {
        return Err(DataError::Schema(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Fail with a schema error naming the first duplicate
pub fn require_unique<S: AsRef<str>>(names: &[S], what: &str) -> Result<(), DataError> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(names.len());
    for name in names.iter().map(as_str) {
        if !seen.insert(name) {
            return Err(DataError::Schema(format!(
                "Duplicate name '{}' in {}",
                name, what
            )));
        }
    }
    Ok(())
}

/// Fail with a schema error if `name` is not a valid identifier
pub fn require_valid_identifier(name: &str) -> Result<(), DataError> {
    if !is_valid_identifier(name) {
        return Err(DataError::Schema(format!(
            "'{}' is not a valid column name",
            name
        )));
    }
    Ok(())
}
