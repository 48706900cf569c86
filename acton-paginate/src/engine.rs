//! Pagination engine
//!
//! [`paginate`] issues two store round trips for one page request: a count
//! of the filtered query, then a fetch of the same query sorted and windowed.
//! The count always runs first. The two reads are not isolated from each
//! other, so a concurrent write between them can make `total` disagree with
//! the fetched results.
//!
//! Store errors are returned unchanged; nothing is retried.

use crate::config::PaginationConfig;
use crate::criteria::Criteria;
use crate::error::Result;
use crate::page::Page;
use crate::query::{Query, QueryComposer};
use crate::schema::EntityDescriptor;
use crate::store::Store;

/// Count and fetch one page of an entity
///
/// # Errors
///
/// Returns [`Error::Store`](crate::error::Error::Store) when either store call fails.
pub async fn paginate<S: Store>(
    criteria: &Criteria,
    config: &PaginationConfig,
    descriptor: &EntityDescriptor,
    store: &S,
) -> Result<Page> {
    let composer = QueryComposer::new(config, descriptor);
    let filtered = composer.filtered(Query::for_entity(descriptor), criteria);

    let total = store.count(&filtered).await?;
    let fetch = composer.windowed(filtered, criteria);
    let results = store.fetch(&fetch).await?;

    tracing::debug!(
        entity = descriptor.name(),
        page = criteria.page(),
        size = criteria.size(),
        total,
        returned = results.len(),
        "paginated"
    );
    Ok(Page::new(total, results))
}
