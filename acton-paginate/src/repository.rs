//! Soft-delete aware repository
//!
//! A [`Repository`] binds one store handle to one entity descriptor and its
//! pagination declarations. It is built once through [`RepositoryBuilder`]
//! and shared by reference (or cloned) afterwards; every operation reads the
//! same immutable configuration.
//!
//! # Example
//!
//! ```rust
//! use acton_paginate::prelude::*;
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let users = EntityDescriptor::builder("users")
//!     .field("name", FieldKind::String)
//!     .field("deleted_at", FieldKind::UtcDateTime)
//!     .build()?;
//!
//! let repo = Repository::builder()
//!     .store(MemoryStore::new())
//!     .entity(users)
//!     .soft_delete("deleted_at")
//!     .pagination(PaginationConfig::new().with_search(["name"]))
//!     .build()?;
//!
//! let alice = repo.save(None, &json!({"name": "alice"})).await?;
//! repo.delete(alice).await?;
//!
//! let page = repo.paginate(&RequestParams::new()).await?;
//! assert_eq!(page.total, 0);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::config::{Declaration, PaginationConfig};
use crate::criteria::Criteria;
use crate::engine;
use crate::error::{Error, FieldViolation, Result};
use crate::page::Page;
use crate::params::RequestParams;
use crate::query::{FilterValue, Predicate, Query};
use crate::record::{json_type, Record};
use crate::schema::{EntityDescriptor, FieldKind};
use crate::soft_delete;
use crate::store::Store;

/// Pagination and record operations for one entity
#[derive(Debug, Clone)]
pub struct Repository<S> {
    store: S,
    descriptor: Arc<EntityDescriptor>,
    config: Arc<PaginationConfig>,
}

/// Builder for [`Repository`]
#[derive(Debug)]
pub struct RepositoryBuilder<S> {
    store: Option<S>,
    descriptor: Option<EntityDescriptor>,
    config: PaginationConfig,
    soft_delete: Option<String>,
}

impl<S> Default for RepositoryBuilder<S> {
    fn default() -> Self {
        Self {
            store: None,
            descriptor: None,
            config: PaginationConfig::default(),
            soft_delete: None,
        }
    }
}

impl<S> RepositoryBuilder<S> {
    /// Store handle to read and write through
    #[must_use]
    pub fn store(mut self, store: S) -> Self {
        self.store = Some(store);
        self
    }

    /// Entity descriptor
    #[must_use]
    pub fn entity(mut self, descriptor: EntityDescriptor) -> Self {
        self.descriptor = Some(descriptor);
        self
    }

    /// Replace all pagination declarations
    #[must_use]
    pub fn pagination(mut self, config: PaginationConfig) -> Self {
        self.config = config;
        self
    }

    /// Apply one pagination declaration, replacing only its group
    #[must_use]
    pub fn declare(mut self, declaration: Declaration) -> Self {
        self.config = self.config.declare(declaration);
        self
    }

    /// Enable soft delete through the named field
    #[must_use]
    pub fn soft_delete(mut self, field: impl Into<String>) -> Self {
        self.soft_delete = Some(field.into());
        self
    }

    /// Finish the repository
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when the store or the entity is missing.
    pub fn build(self) -> Result<Repository<S>> {
        let store = self
            .store
            .ok_or_else(|| Error::configuration("repository requires a store"))?;
        let descriptor = self
            .descriptor
            .ok_or_else(|| Error::configuration("repository requires an entity descriptor"))?;
        let descriptor = match self.soft_delete {
            Some(field) => descriptor.with_soft_delete(field),
            None => descriptor,
        };

        tracing::debug!(
            entity = descriptor.name(),
            soft_delete = soft_delete::is_enabled(&descriptor),
            "repository registered"
        );
        Ok(Repository {
            store,
            descriptor: Arc::new(descriptor),
            config: Arc::new(self.config),
        })
    }
}

impl<S> Repository<S> {
    /// Start building a repository
    pub fn builder() -> RepositoryBuilder<S> {
        RepositoryBuilder::default()
    }

    /// The underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The entity descriptor
    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    /// The pagination declarations
    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    /// Parse request parameters against this entity's declarations
    pub fn parse(&self, params: &RequestParams) -> Result<Criteria> {
        Criteria::parse(params, &self.config)
    }
}

impl<S: Store> Repository<S> {
    /// Parse the request and fetch one page
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] for malformed `page`/`size`, [`Error::Store`] when a read fails.
    pub async fn paginate(&self, params: &RequestParams) -> Result<Page> {
        let criteria = self.parse(params)?;
        self.paginate_criteria(&criteria).await
    }

    /// Fetch one page for already parsed criteria
    pub async fn paginate_criteria(&self, criteria: &Criteria) -> Result<Page> {
        engine::paginate(criteria, &self.config, &self.descriptor, &self.store).await
    }

    /// Every visible record, unpaged
    pub async fn list_all(&self) -> Result<Vec<Record>> {
        let query = soft_delete::restrict(Query::for_entity(&self.descriptor), &self.descriptor);
        Ok(self.store.fetch(&query).await?)
    }

    /// Look up a visible record by primary key
    ///
    /// `Ok(None)` means no visible record has that key, including ids that
    /// cannot be read as the primary key's kind.
    ///
    /// # Errors
    ///
    /// [`Error::Validation`] when the id is neither a number nor a string.
    pub async fn get(&self, id: impl Into<Value>) -> Result<Option<Record>> {
        let Some(id) = self.id_value(id.into())? else {
            return Ok(None);
        };
        let query = soft_delete::restrict(Query::for_entity(&self.descriptor), &self.descriptor)
            .filter(Predicate::eq(self.descriptor.primary_key(), id));
        Ok(self.store.fetch_one(&query).await?)
    }

    /// Like [`get`](Self::get), with a miss reported as [`Error::NotFound`]
    pub async fn get_strict(&self, id: impl Into<Value>) -> Result<Record> {
        let id = id.into();
        let shown = match &id {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.get(id)
            .await?
            .ok_or_else(|| Error::not_found(self.descriptor.name(), shown))
    }

    /// Insert when `existing` is `None`, otherwise update that record
    ///
    /// Attribute keys the descriptor does not declare are dropped, as are the
    /// primary key and the soft-delete field.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] when `attributes` is not a JSON object, or
    ///   `existing` carries no primary key
    /// - [`Error::Persistence`] when a value does not fit its field's kind, or
    ///   the store rejects the write on schema grounds
    /// - [`Error::Store`] for any other store failure
    pub async fn save(&self, existing: Option<&Record>, attributes: &Value) -> Result<Record> {
        let Value::Object(attributes) = attributes else {
            return Err(Error::validation(format!(
                "attributes must be a map, got {}",
                json_type(attributes)
            )));
        };
        let changes = self.cast(attributes)?;
        let entity = self.descriptor.name();

        match existing {
            None => self
                .store
                .insert(&self.descriptor, changes)
                .await
                .map_err(|e| Error::from_write(entity, e)),
            Some(existing) => {
                let pk = self.descriptor.primary_key();
                let id = existing.id(pk).cloned().ok_or_else(|| {
                    Error::validation(format!("existing {entity} record has no `{pk}`"))
                })?;
                let mut changes = changes;
                changes.set(pk, id);
                self.store
                    .update(&self.descriptor, changes)
                    .await
                    .map_err(|e| Error::from_write(entity, e))
            }
        }
    }

    /// Delete a record, softly when soft delete is enabled
    pub async fn delete(&self, record: Record) -> Result<Record> {
        soft_delete::delete(record, &self.descriptor, &self.store).await
    }

    /// The id as a primary-key value, or `None` when no row could carry it
    fn id_value(&self, id: Value) -> Result<Option<FilterValue>> {
        let kind = self.descriptor.primary_key_kind();
        match (&id, kind) {
            (Value::Number(n), FieldKind::Integer) => Ok(n.as_i64().map(FilterValue::Integer)),
            (Value::String(s), FieldKind::Integer) => {
                Ok(s.trim().parse::<i64>().ok().map(FilterValue::Integer))
            }
            (Value::String(s), FieldKind::String) => Ok(Some(FilterValue::String(s.clone()))),
            (Value::Number(n), FieldKind::String) => Ok(Some(FilterValue::String(n.to_string()))),
            (Value::Number(_) | Value::String(_), kind) => {
                Ok(Some(FilterValue::from_json(&id, Some(kind))))
            }
            _ => Err(Error::validation(format!(
                "{} id must be an integer or a string, got {}",
                self.descriptor.name(),
                json_type(&id)
            ))),
        }
    }

    fn cast(&self, attributes: &Map<String, Value>) -> Result<Record> {
        let pk = self.descriptor.primary_key();
        let soft_delete = self.descriptor.soft_delete().map(|f| f.name());

        let mut record = Record::new();
        let mut violations = Vec::new();
        for (field, value) in attributes {
            if field == pk || Some(field.as_str()) == soft_delete {
                continue;
            }
            let Some(kind) = self.descriptor.field_kind(field) else {
                tracing::trace!(entity = self.descriptor.name(), field, "dropping undeclared field");
                continue;
            };
            match kind.cast(value) {
                Some(value) => {
                    record.set(field.as_str(), value);
                }
                None => violations.push(FieldViolation::new(field.as_str(), "is invalid")),
            }
        }

        if violations.is_empty() {
            Ok(record)
        } else {
            Err(Error::persistence(self.descriptor.name(), violations))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ColumnSet;
    use crate::store::{MemoryStore, StoreErrorKind};
    use serde_json::json;

    fn descriptor() -> EntityDescriptor {
        EntityDescriptor::builder("users")
            .field("name", FieldKind::String)
            .field("age", FieldKind::Integer)
            .field("status", FieldKind::String)
            .field("deleted_at", FieldKind::UtcDateTime)
            .build()
            .unwrap()
    }

    fn repo(soft: bool) -> Repository<MemoryStore> {
        let builder = Repository::builder()
            .store(MemoryStore::new())
            .entity(descriptor())
            .declare(Declaration::Filter(ColumnSet::new(["status"])))
            .declare(Declaration::Search(ColumnSet::new(["name"])));
        let builder = if soft { builder.soft_delete("deleted_at") } else { builder };
        builder.build().unwrap()
    }

    async fn seed(repo: &Repository<MemoryStore>, names: &[&str]) -> Vec<Record> {
        let mut saved = Vec::new();
        for name in names {
            saved.push(repo.save(None, &json!({"name": name})).await.unwrap());
        }
        saved
    }

    #[test]
    fn test_build_requires_store_and_entity() {
        let err = Repository::<MemoryStore>::builder()
            .entity(descriptor())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("store"));

        let err = Repository::builder()
            .store(MemoryStore::new())
            .build()
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("entity"));
    }

    #[test]
    fn test_declarations_accumulate_per_group() {
        let repo = repo(false);
        assert!(repo.config().filter.allows("status"));
        assert!(repo.config().search.allows("name"));
        assert_eq!(repo.config().size.max, 100);
    }

    #[tokio::test]
    async fn test_save_none_inserts_and_existing_updates() {
        let repo = repo(false);
        let inserted = repo.save(None, &json!({"name": "x"})).await.unwrap();
        let id = inserted.get("id").cloned().unwrap();

        let updated = repo.save(Some(&inserted), &json!({"name": "y"})).await.unwrap();
        assert_eq!(updated.get("id"), Some(&id));
        assert_eq!(updated.get("name"), Some(&json!("y")));
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_non_map_attributes() {
        let repo = repo(false);
        let existing = seed(&repo, &["x"]).await.remove(0);
        let err = repo
            .save(Some(&existing), &json!("not-a-map"))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_save_casts_and_drops_protected_fields() {
        let repo = repo(true);
        let saved = repo
            .save(
                None,
                &json!({"id": 77, "name": "x", "age": "31", "deleted_at": "2024-01-01T00:00:00Z", "role": "admin"}),
            )
            .await
            .unwrap();
        assert_eq!(saved.get("id"), Some(&json!(1)));
        assert_eq!(saved.get("age"), Some(&json!(31)));
        assert!(saved.is_unset("deleted_at"));
        assert!(saved.get("role").is_none());
    }

    #[tokio::test]
    async fn test_save_kind_mismatch_is_persistence_error() {
        let repo = repo(false);
        let err = repo
            .save(None, &json!({"name": "x", "age": "old"}))
            .await
            .unwrap_err();
        match err {
            Error::Persistence { entity, violations } => {
                assert_eq!(entity, "users");
                assert_eq!(violations, vec![FieldViolation::new("age", "is invalid")]);
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
        assert!(repo.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_store_rejection_is_persistence_error() {
        let repo = repo(false);
        repo.store().require(repo.descriptor(), ["name"]).await;
        let err = repo.save(None, &json!({"age": 3})).await.unwrap_err();
        match err {
            Error::Persistence { violations, .. } => {
                assert_eq!(violations, vec![FieldViolation::new("name", "can't be blank")]);
            }
            other => panic!("expected persistence error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_of_missing_record_is_store_error() {
        let repo = repo(false);
        let ghost = Record::new().with("id", 5);
        match repo.save(Some(&ghost), &json!({"name": "y"})).await.unwrap_err() {
            Error::Store(e) => assert_eq!(e.kind, StoreErrorKind::NotFound),
            other => panic!("expected store error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_save_existing_without_id_is_validation_error() {
        let repo = repo(false);
        let err = repo
            .save(Some(&Record::new()), &json!({"name": "y"}))
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_reads_on_fresh_store_are_empty() {
        let repo = repo(true);
        let page = repo.paginate(&RequestParams::new()).await.unwrap();
        assert_eq!(page.total, 0);
        assert!(page.is_empty());
        assert!(repo.list_all().await.unwrap().is_empty());
        assert!(repo.get(1).await.unwrap().is_none());
        assert!(repo.get_strict(1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_get_accepts_numbers_and_numeric_strings() {
        let repo = repo(false);
        seed(&repo, &["a", "b"]).await;
        let by_number = repo.get(2).await.unwrap().unwrap();
        let by_string = repo.get("2").await.unwrap().unwrap();
        assert_eq!(by_number, by_string);
        assert_eq!(by_number.get("name"), Some(&json!("b")));
        assert!(repo.get(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_misses_ids_that_cannot_match_the_key() {
        let repo = repo(false);
        seed(&repo, &["a"]).await;
        assert!(repo.get("abc").await.unwrap().is_none());
        assert!(repo.get(1.5).await.unwrap().is_none());

        let err = repo.get_strict("abc").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: users abc");
    }

    #[tokio::test]
    async fn test_get_rejects_non_scalar_ids() {
        let repo = repo(false);
        assert!(repo.get(json!(true)).await.unwrap_err().is_validation());
        assert!(repo.get(json!({"id": 1})).await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_get_strict_promotes_miss() {
        let repo = repo(false);
        let err = repo.get_strict("9").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: users 9");
    }

    #[tokio::test]
    async fn test_soft_deleted_records_are_invisible_everywhere() {
        let repo = repo(true);
        let saved = seed(&repo, &["keep", "drop"]).await;
        let dropped = repo.delete(saved[1].clone()).await.unwrap();
        assert!(!dropped.is_unset("deleted_at"));

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].get("name"), Some(&json!("keep")));

        assert!(repo.get(2).await.unwrap().is_none());
        assert!(repo.get_strict(2).await.unwrap_err().is_not_found());

        let page = repo.paginate(&RequestParams::new()).await.unwrap();
        assert_eq!(page.total, 1);

        assert_eq!(repo.store().rows("users").await.len(), 2);
    }

    #[tokio::test]
    async fn test_hard_delete_removes_row() {
        let repo = repo(false);
        let saved = seed(&repo, &["a"]).await;
        repo.delete(saved[0].clone()).await.unwrap();
        assert!(repo.store().rows("users").await.is_empty());
    }

    #[tokio::test]
    async fn test_paginate_validates_and_filters() {
        let repo = repo(false);
        seed(&repo, &["bob", "alice", "bobby"]).await;
        repo.save(Some(&repo.get(1).await.unwrap().unwrap()), &json!({"status": "active"}))
            .await
            .unwrap();

        assert!(repo
            .paginate(&RequestParams::from_pairs([("page", "zero")]))
            .await
            .unwrap_err()
            .is_validation());

        let page = repo
            .paginate(&RequestParams::from_pairs([("q", "bob"), ("status", "active")]))
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.results[0].get("name"), Some(&json!("bob")));
    }
}
