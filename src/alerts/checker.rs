//! Outlier detection for categorical columns

use std::collections::{BTreeSet, HashSet};

/// Compare observed values against an allow-list.
///
/// Returns `None` when the sorted observed values equal the sorted expected
/// values. Otherwise returns the alert message naming the expected values and
/// the outliers (observed values missing from `expected`).
///
/// The comparison is on sorted sequences, so duplicates matter, while the
/// outliers come from a set difference. A mismatch caused only by
/// multiplicity, or by an empty `current`, therefore yields an alert with an
/// empty outlier clause.
pub fn evaluate<C, E>(alert_type: &str, current: &[C], expected: &[E]) -> Option<String>
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    let mut sorted_current: Vec<&str> = current.iter().map(|v| v.as_ref()).collect();
    let mut sorted_expected: Vec<&str> = expected.iter().map(|v| v.as_ref()).collect();
    sorted_current.sort_unstable();
    sorted_expected.sort_unstable();

    if sorted_current == sorted_expected {
        return None;
    }

    let outliers = find_outliers(current, expected);
    Some(format_message(alert_type, expected, &outliers))
}

/// Distinct values present in `current` but absent from `expected`
pub fn find_outliers<'a, C, E>(current: &'a [C], expected: &[E]) -> BTreeSet<&'a str>
where
    C: AsRef<str>,
    E: AsRef<str>,
{
    let allowed: HashSet<&str> = expected.iter().map(|v| v.as_ref()).collect();
    current
        .iter()
        .map(|v| v.as_ref())
        .filter(|value| !allowed.contains(value))
        .collect()
}

fn format_message<E: AsRef<str>>(
    alert_type: &str,
    expected: &[E],
    outliers: &BTreeSet<&str>,
) -> String {
    let expected = expected
        .iter()
        .map(|v| v.as_ref())
        .collect::<Vec<_>>()
        .join(", ");
    let outliers = outliers.iter().copied().collect::<Vec<_>>().join(", ");

    format!(
        "{} check failed. Expected: `{}`. Outliers: `{}`.",
        alert_type, expected, outliers
    )
}
