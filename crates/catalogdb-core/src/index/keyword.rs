use std::collections::BTreeSet;

/// Persisted keyword set of one record.
pub type KeywordSet = BTreeSet<String>;

/// Derive the keyword set for a record's designated text fields.
///
/// Each present field contributes its trimmed lowercase value as one token
/// plus every whitespace-separated sub-token. Absent and blank fields
/// contribute nothing. Pure: the result depends on the inputs only.
#[must_use]
pub fn index<'a, I>(fields: I) -> KeywordSet
where
    I: IntoIterator<Item = Option<&'a str>>,
{
    let mut keywords = KeywordSet::new();

    for field in fields.into_iter().flatten() {
        let lower = field.trim().to_lowercase();
        if lower.is_empty() {
            continue;
        }

        keywords.extend(lower.split_whitespace().map(str::to_string));
        keywords.insert(lower);
    }

    keywords
}

/// Normalize a caller's search term into the token form stored by `index`.
///
/// Returns `None` for blank input.
#[must_use]
pub fn normalize_token(term: &str) -> Option<String> {
    let token = term.trim().to_lowercase();

    (!token.is_empty()).then_some(token)
}
