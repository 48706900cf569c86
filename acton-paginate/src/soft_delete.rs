//! Soft-delete visibility and deletion
//!
//! An entity whose descriptor names a soft-delete field never exposes rows
//! with that field set, and deleting one of its records stamps the field with
//! the current time instead of removing the row. Entities without the field
//! are deleted physically.
//!
//! The stamp's representation follows the field's declared kind, which must
//! be [`FieldKind::NaiveDateTime`](crate::schema::FieldKind::NaiveDateTime) or
//! [`FieldKind::UtcDateTime`](crate::schema::FieldKind::UtcDateTime). Any other
//! kind is reported as a configuration error when a delete is attempted.

use crate::error::{Error, Result};
use crate::query::{Predicate, Query};
use crate::record::Record;
use crate::schema::EntityDescriptor;
use crate::store::Store;

/// Whether the entity uses soft delete
pub fn is_enabled(descriptor: &EntityDescriptor) -> bool {
    descriptor.soft_delete().is_some()
}

/// The "not deleted" predicate, when soft delete is enabled
pub fn visibility_predicate(descriptor: &EntityDescriptor) -> Option<Predicate> {
    descriptor
        .soft_delete()
        .map(|field| Predicate::is_null(field.name()))
}

/// Restrict a query to visible rows
pub fn restrict(query: Query, descriptor: &EntityDescriptor) -> Query {
    match visibility_predicate(descriptor) {
        Some(predicate) => query.filter(predicate),
        None => query,
    }
}

/// Delete a record, softly or physically depending on the descriptor
///
/// Returns the record as it stands after the delete: stamped when soft
/// delete is enabled, unchanged otherwise.
///
/// # Errors
///
/// - [`Error::Configuration`] when the soft-delete field is not a timestamp kind
/// - [`Error::Store`] when the store update or removal fails
pub async fn delete<S: Store>(
    record: Record,
    descriptor: &EntityDescriptor,
    store: &S,
) -> Result<Record> {
    let Some(field) = descriptor.soft_delete() else {
        store.remove(descriptor, &record).await?;
        tracing::debug!(entity = descriptor.name(), "record removed");
        return Ok(record);
    };

    let kind = field.temporal_kind()?;
    let mut stamp = Record::new();
    if let Some(id) = record.id(descriptor.primary_key()) {
        stamp.set(descriptor.primary_key(), id.clone());
    }
    stamp.set(field.name(), store.now(kind));

    let updated = store.update(descriptor, stamp).await.map_err(Error::Store)?;
    tracing::debug!(
        entity = descriptor.name(),
        field = field.name(),
        "record soft-deleted"
    );
    Ok(updated)
}
