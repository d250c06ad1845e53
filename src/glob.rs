//! Glob expansion over object-storage keys, with a corrective post-filter.
//!
//! Storage backends list keys by prefix; turning that into shell-style glob
//! matching is done client-side. The translation most clients ship (and the
//! one [`native_glob`] reproduces) is known to diverge from POSIX glob
//! semantics in two ways:
//!
//! - `*` matches across `/`, so `GDL/issues/*` also matches keys in nested
//!   "directories" under `issues/`;
//! - bracket expressions are taken literally (`pages[0].bz2` style keys
//!   match, `[ab]` sets do not).
//!
//! [`fixed_glob`] masks both: it takes the backend's candidate set and
//! re-filters it with a correct shell-glob matcher so the result exactly
//! equals what a conventional glob would produce. Over-matching is a known
//! quirk, not an error, so nothing is surfaced.

use crate::storage::{FileRef, ObjectStore};
use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use regex::Regex;

/// Expand a glob pattern against bucket keys, corrected to shell semantics.
///
/// Zero matches is an empty vector, never an error. Results are sorted.
///
/// # Errors
///
/// Returns an error if the pattern is invalid or the backend listing fails
/// (unreachable storage, missing bucket); listing failures are fatal and
/// not retried.
pub fn fixed_glob(store: &dyn ObjectStore, bucket: &str, pattern: &str) -> Result<Vec<FileRef>> {
    let candidates = native_glob(store, bucket, pattern)?;
    let corrected = post_filter(candidates, pattern)?;
    Ok(corrected
        .into_iter()
        .map(|key| FileRef::new(bucket, key))
        .collect())
}

/// The backend's native glob: prefix listing plus the loose regex
/// translation described in the module docs. Exposed for tests that need
/// to demonstrate the divergence being corrected.
///
/// # Errors
///
/// Returns an error if the listing fails.
pub fn native_glob(
    store: &dyn ObjectStore,
    bucket: &str,
    pattern: &str,
) -> Result<Vec<String>> {
    // A wildcard-free pattern is a plain key: one existence check, no
    // listing round-trip.
    if !pattern.contains(['*', '?', '[']) {
        let exists = store
            .object_exists(bucket, pattern)
            .with_context(|| format!("check {bucket}/{pattern}"))?;
        return Ok(if exists {
            vec![pattern.to_string()]
        } else {
            Vec::new()
        });
    }

    let regex = Regex::new(&glob_to_loose_regex(pattern))
        .with_context(|| format!("invalid glob pattern '{pattern}'"))?;

    let prefix = prefix_before_wildcard(pattern);
    let objects = store
        .list_objects(bucket, prefix.as_deref())
        .with_context(|| format!("list {bucket} under prefix {prefix:?}"))?;

    let mut keys: Vec<String> = objects
        .into_iter()
        .filter(|obj| regex.is_match(&obj.key))
        .map(|obj| obj.key)
        .collect();
    keys.sort();
    Ok(keys)
}

/// Reduce a candidate key set to the keys a conventional shell glob would
/// have matched. `*` and `?` stop at `/`; bracket expressions are honored.
///
/// # Errors
///
/// Returns an error if the pattern is not a valid shell glob.
pub fn post_filter(keys: Vec<String>, pattern: &str) -> Result<Vec<String>> {
    let shell = Pattern::new(pattern)
        .with_context(|| format!("invalid shell glob pattern '{pattern}'"))?;
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: true,
        require_literal_leading_dot: false,
    };
    Ok(keys
        .into_iter()
        .filter(|key| shell.matches_with(key, options))
        .collect())
}

/// Loose glob-to-regex translation matching the backend's behavior:
/// `*` becomes `.*` (crosses `/`), `?` becomes `.`, everything else is
/// escaped literally (including brackets).
fn glob_to_loose_regex(pattern: &str) -> String {
    let mut regex = String::from("^");
    for ch in pattern.chars() {
        match ch {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            '.' | '+' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$' | '\\' => {
                regex.push('\\');
                regex.push(ch);
            }
            _ => regex.push(ch),
        }
    }
    regex.push('$');
    regex
}

/// Static prefix before the first wildcard, used to narrow the listing call.
fn prefix_before_wildcard(pattern: &str) -> Option<String> {
    match pattern.find(['*', '?', '[']) {
        Some(0) => None,
        Some(pos) => Some(pattern[..pos].to_string()),
        None => Some(pattern.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loose_regex_crosses_separators() {
        let re = Regex::new(&glob_to_loose_regex("GDL/issues/*")).unwrap();
        assert!(re.is_match("GDL/issues/a.bz2"));
        // The divergence: nested keys also match.
        assert!(re.is_match("GDL/issues/nested/b.bz2"));
    }

    #[test]
    fn post_filter_restores_shell_semantics() {
        let candidates = vec![
            "GDL/issues/a.bz2".to_string(),
            "GDL/issues/nested/b.bz2".to_string(),
        ];
        let kept = post_filter(candidates, "GDL/issues/*").unwrap();
        assert_eq!(kept, vec!["GDL/issues/a.bz2"]);
    }

    #[test]
    fn prefix_extraction() {
        assert_eq!(
            prefix_before_wildcard("GDL/issues/*").as_deref(),
            Some("GDL/issues/")
        );
        assert_eq!(prefix_before_wildcard("*"), None);
        assert_eq!(
            prefix_before_wildcard("GDL/issues/a.bz2").as_deref(),
            Some("GDL/issues/a.bz2")
        );
    }
}
