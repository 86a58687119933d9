use crate::{
    db::{DataStore, Record},
    error::{CatalogError, ValidationError},
    query::{cursor::Cursor, plan::QueryPlan},
    traits::EntityKind,
};
use serde::Serialize;

///
/// Page
///
/// One window of an ordered, filtered collection.
///
/// `has_more` is `items.len() == page_size`: a final page that happens to be
/// exactly full reports `true`, and the following request returns no items.
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<E> {
    pub items: Vec<Record<E>>,

    /// Token for the last returned item; `None` when the page is empty.
    pub cursor: Option<String>,

    pub has_more: bool,
}

impl<E> Page<E> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            cursor: None,
            has_more: false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Read one page, starting after `token` when present.
pub(crate) fn read_page<E: EntityKind>(
    plan: &QueryPlan,
    rows: &DataStore<E>,
    token: Option<&str>,
    page_size: usize,
) -> Result<Page<E>, CatalogError> {
    if page_size == 0 {
        return Err(ValidationError::ZeroPageSize.into());
    }

    let resume = token.map(|token| Cursor::resume(plan, token)).transpose()?;
    let items = plan.execute_window(rows, resume.as_ref().map(Cursor::boundary), page_size);

    let cursor = items.last().and_then(|last| {
        plan.sort_key(last.id, &last.entity)
            .map(|key| Cursor::new(plan, key).encode())
    });
    let has_more = items.len() == page_size;

    Ok(Page {
        items,
        cursor,
        has_more,
    })
}
