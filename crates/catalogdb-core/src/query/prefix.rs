use crate::{HIGH_SENTINEL, query::Predicate};

/// Build the half-open range matching every value that starts with `term`,
/// compared case-insensitively against a lowercase ordered field.
///
/// A blank term yields `None`: no filter, every record in order.
#[must_use]
pub fn prefix_query(field: &str, term: &str) -> Option<Predicate> {
    let lower = term.trim().to_lowercase();
    if lower.is_empty() {
        return None;
    }

    let mut upper = lower.clone();
    upper.push(HIGH_SENTINEL);

    Some(Predicate::range(field, lower, upper))
}
