use crate::{
    db::{Collection, Record},
    error::CatalogError,
    query::{Predicate, prefix_query},
    traits::EntityKind,
};
use std::time::Duration;
use tokio::{sync::watch, time};
use tracing::debug;

///
/// PagedSearch
///
/// Incremental prefix search over a collection's primary lowercase name
/// field. Results accumulate across `load_more` calls until the term
/// changes, which drops the cursor and every loaded item.
///

pub struct PagedSearch<E: EntityKind> {
    collection: Collection<E>,
    page_size: usize,
    term: String,
    predicate: Option<Predicate>,
    cursor: Option<String>,
    items: Vec<Record<E>>,
    has_more: bool,
}

impl<E: EntityKind> PagedSearch<E> {
    #[must_use]
    pub fn new(collection: Collection<E>) -> Self {
        let page_size = collection.store().catalog_config().page_size;

        Self {
            collection,
            page_size,
            term: String::new(),
            predicate: None,
            cursor: None,
            items: Vec::new(),
            has_more: false,
        }
    }

    #[must_use]
    pub const fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn items(&self) -> &[Record<E>] {
        &self.items
    }

    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Replace the term. Returns `false` if it did not change.
    pub fn set_term(&mut self, term: &str) -> bool {
        if self.term == term {
            return false;
        }

        self.term = term.to_string();
        self.predicate = prefix_query(E::MODEL.search_field, term);
        self.cursor = None;
        self.items.clear();
        self.has_more = false;

        true
    }

    /// Restart from the first page of the current term.
    pub fn load_first(&mut self) -> Result<&[Record<E>], CatalogError> {
        let page = self.collection.first_page(
            E::MODEL.search_field,
            self.predicate.clone(),
            self.page_size,
        )?;

        self.items = page.items;
        self.cursor = page.cursor;
        self.has_more = page.has_more;

        Ok(self.items.as_slice())
    }

    /// Append the next page. Returns only the newly loaded records; a no-op
    /// once the previous page came back short.
    pub fn load_more(&mut self) -> Result<&[Record<E>], CatalogError> {
        let Some(cursor) = self.cursor.as_deref().filter(|_| self.has_more) else {
            return Ok(&[]);
        };

        let page = self.collection.next_page(
            E::MODEL.search_field,
            self.predicate.clone(),
            cursor,
            self.page_size,
        )?;

        let start = self.items.len();
        self.items.extend(page.items);
        if page.cursor.is_some() {
            self.cursor = page.cursor;
        }
        self.has_more = page.has_more;

        Ok(&self.items[start..])
    }
}

/// Wait for the next term that stays unchanged for `quiet`.
///
/// Returns `None` once the sender is gone and no unseen term remains.
pub async fn next_settled_term(
    terms: &mut watch::Receiver<String>,
    quiet: Duration,
) -> Option<String> {
    if terms.changed().await.is_err() {
        return None;
    }

    loop {
        match time::timeout(quiet, terms.changed()).await {
            // quiet period elapsed, or the sender closed mid-wait
            Err(_) | Ok(Err(_)) => return Some(terms.borrow_and_update().clone()),
            Ok(Ok(())) => {}
        }
    }
}

/// Drive `search` from a term channel, publishing the first page of every
/// settled term. Returns the search state when the term channel closes.
pub async fn run_search<E: EntityKind>(
    mut search: PagedSearch<E>,
    mut terms: watch::Receiver<String>,
    results: watch::Sender<Result<Vec<Record<E>>, CatalogError>>,
) -> PagedSearch<E> {
    let quiet = search.collection.store().catalog_config().search_debounce();

    while let Some(term) = next_settled_term(&mut terms, quiet).await {
        if !search.set_term(&term) {
            continue;
        }
        debug!(collection = E::MODEL.path, term = %term, "search term settled");

        let outcome = search.load_first().map(<[Record<E>]>::to_vec);
        results.send_replace(outcome);
    }

    search
}
