//! In-process store
//!
//! [`MemoryStore`] keeps each entity's rows in insertion order behind a shared
//! lock and evaluates composed queries directly. Ordering follows PostgreSQL:
//! nulls sort last ascending and first descending. Integer primary keys are
//! assigned sequentially when a record arrives without one.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::{Store, StoreError, StoreOperation, StoreResult};
use crate::error::FieldViolation;
use crate::query::{FilterValue, Order, OrderDirection, Predicate, Query};
use crate::record::Record;
use crate::schema::{EntityDescriptor, FieldKind};

/// In-memory [`Store`] backend
///
/// Cloning is cheap; clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<BTreeMap<String, Table>>>,
}

#[derive(Debug)]
struct Table {
    primary_key: String,
    kinds: BTreeMap<String, FieldKind>,
    required: Vec<String>,
    rows: Vec<Record>,
    next_id: i64,
}

impl Table {
    fn new(descriptor: &EntityDescriptor) -> Self {
        Self {
            primary_key: descriptor.primary_key().to_string(),
            kinds: descriptor
                .fields()
                .map(|(name, kind)| (name.to_string(), kind))
                .collect(),
            required: Vec::new(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn empty() -> Self {
        Self {
            primary_key: String::new(),
            kinds: BTreeMap::new(),
            required: Vec::new(),
            rows: Vec::new(),
            next_id: 1,
        }
    }

    fn value(&self, row: &Record, field: &str) -> FilterValue {
        row.get(field).map_or(FilterValue::Null, |v| {
            FilterValue::from_json(v, self.kinds.get(field).copied())
        })
    }

    fn position(&self, record: &Record) -> Option<usize> {
        let id = record.id(&self.primary_key)?;
        self.rows
            .iter()
            .position(|row| row.id(&self.primary_key) == Some(id))
    }

    fn blank_required(&self, record: &Record) -> Vec<FieldViolation> {
        self.required
            .iter()
            .filter(|field| record.is_unset(field))
            .map(|field| FieldViolation::new(field.as_str(), "can't be blank"))
            .collect()
    }

    fn matches(&self, row: &Record, predicate: &Predicate) -> bool {
        match predicate {
            Predicate::IsNull { field } => row.is_unset(field),
            Predicate::Eq { field, value } => self.equals(row, field, value),
            Predicate::In { field, values } => values.iter().any(|v| self.equals(row, field, v)),
            Predicate::Gte { field, value } => matches!(
                self.value(row, field).compare(value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Predicate::Lte { field, value } => matches!(
                self.value(row, field).compare(value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            Predicate::Contains { field, term } => self
                .value(row, field)
                .search_text()
                .is_some_and(|text| text.to_lowercase().contains(&term.to_lowercase())),
            Predicate::Any(inner) => inner.iter().any(|p| self.matches(row, p)),
        }
    }

    fn equals(&self, row: &Record, field: &str, value: &FilterValue) -> bool {
        if value.is_null() {
            return row.is_unset(field);
        }
        let stored = self.value(row, field);
        match stored.compare(value) {
            Some(ordering) => ordering == Ordering::Equal,
            None => !stored.is_null() && stored.to_json() == value.to_json(),
        }
    }

    fn compare_rows(&self, a: &Record, b: &Record, order: &[Order]) -> Ordering {
        for term in order {
            let left = self.value(a, &term.field);
            let right = self.value(b, &term.field);
            let ordering = match (left.is_null(), right.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => left.compare(&right).unwrap_or(Ordering::Equal),
            };
            let ordering = match term.direction {
                OrderDirection::Ascending => ordering,
                OrderDirection::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    fn select(&self, query: &Query) -> Vec<Record> {
        let mut rows: Vec<&Record> = self
            .rows
            .iter()
            .filter(|row| query.predicates().iter().all(|p| self.matches(row, p)))
            .collect();
        if !query.order().is_empty() {
            rows.sort_by(|a, b| self.compare_rows(a, b, query.order()));
        }

        let offset = query.offset().map_or(0, to_usize);
        let limit = query.limit().map_or(usize::MAX, to_usize);
        rows.into_iter().skip(offset).take(limit).cloned().collect()
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the entity's table if it does not exist yet
    pub async fn register(&self, descriptor: &EntityDescriptor) {
        self.tables
            .write()
            .await
            .entry(descriptor.name().to_string())
            .or_insert_with(|| Table::new(descriptor));
    }

    /// Reject inserts and updates that leave any of these fields unset
    pub async fn require<I, S>(&self, descriptor: &EntityDescriptor, fields: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tables = self.tables.write().await;
        let table = tables
            .entry(descriptor.name().to_string())
            .or_insert_with(|| Table::new(descriptor));
        table.required.extend(fields.into_iter().map(Into::into));
    }

    /// Insert several records, returning them as stored
    pub async fn seed(
        &self,
        descriptor: &EntityDescriptor,
        records: impl IntoIterator<Item = Record>,
    ) -> StoreResult<Vec<Record>> {
        let mut stored = Vec::new();
        for record in records {
            stored.push(self.insert(descriptor, record).await?);
        }
        Ok(stored)
    }

    /// Every row of the entity, soft-deleted ones included, in insertion order
    pub async fn rows(&self, entity: &str) -> Vec<Record> {
        self.tables
            .read()
            .await
            .get(entity)
            .map(|table| table.rows.clone())
            .unwrap_or_default()
    }

    /// Run `f` against the query's table; an entity nothing was written to
    /// reads as empty, matching the lazy creation on insert
    async fn read<T>(
        &self,
        operation: StoreOperation,
        query: &Query,
        f: impl FnOnce(&Table) -> T,
    ) -> T {
        let tables = self.tables.read().await;
        match tables.get(query.source()) {
            Some(table) => f(table),
            None => {
                tracing::trace!(
                    entity = query.source(),
                    %operation,
                    "memory read of unwritten entity"
                );
                f(&Table::empty())
            }
        }
    }
}

impl Store for MemoryStore {
    async fn count(&self, query: &Query) -> StoreResult<u64> {
        let unpaged = query.clone().unpaged();
        Ok(self
            .read(StoreOperation::Count, query, |table| {
                table.select(&unpaged).len() as u64
            })
            .await)
    }

    async fn fetch(&self, query: &Query) -> StoreResult<Vec<Record>> {
        Ok(self
            .read(StoreOperation::Fetch, query, |table| table.select(query))
            .await)
    }

    async fn fetch_one(&self, query: &Query) -> StoreResult<Option<Record>> {
        let first = query.clone().with_limit(1);
        Ok(self
            .read(StoreOperation::FetchOne, query, |table| {
                table.select(&first).into_iter().next()
            })
            .await)
    }

    async fn insert(&self, entity: &EntityDescriptor, mut record: Record) -> StoreResult<Record> {
        let op = StoreOperation::Insert;
        let mut tables = self.tables.write().await;
        let table = tables
            .entry(entity.name().to_string())
            .or_insert_with(|| Table::new(entity));

        let violations = table.blank_required(&record);
        if !violations.is_empty() {
            return Err(StoreError::validation_failed(op, violations).with_entity(entity.name()));
        }

        let pk = table.primary_key.clone();
        let has_id = record.id(&pk).is_some();
        let integer_id = record.id(&pk).and_then(serde_json::Value::as_i64);
        if let Some(id) = integer_id {
            table.next_id = table.next_id.max(id.saturating_add(1));
        } else if !has_id {
            if entity.primary_key_kind() != FieldKind::Integer {
                return Err(StoreError::validation_failed(
                    op,
                    vec![FieldViolation::new(pk, "can't be blank")],
                )
                .with_entity(entity.name()));
            }
            record.set(pk.as_str(), table.next_id);
            table.next_id += 1;
        }

        if table.position(&record).is_some() {
            return Err(StoreError::constraint_violation(
                op,
                format!("duplicate key value violates unique constraint on \"{pk}\""),
            )
            .with_entity(entity.name()));
        }

        tracing::trace!(entity = entity.name(), "memory insert");
        table.rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, entity: &EntityDescriptor, record: Record) -> StoreResult<Record> {
        let op = StoreOperation::Update;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(entity.name())
            .ok_or_else(|| missing_row(op, entity))?;
        let index = table
            .position(&record)
            .ok_or_else(|| missing_row(op, entity))?;

        let mut merged = table.rows[index].clone();
        for (field, value) in record.into_map() {
            merged.set(field, value);
        }

        let violations = table.blank_required(&merged);
        if !violations.is_empty() {
            return Err(StoreError::validation_failed(op, violations).with_entity(entity.name()));
        }

        tracing::trace!(entity = entity.name(), "memory update");
        table.rows[index] = merged.clone();
        Ok(merged)
    }

    async fn remove(&self, entity: &EntityDescriptor, record: &Record) -> StoreResult<()> {
        let op = StoreOperation::Remove;
        let mut tables = self.tables.write().await;
        let table = tables
            .get_mut(entity.name())
            .ok_or_else(|| missing_row(op, entity))?;
        let index = table
            .position(record)
            .ok_or_else(|| missing_row(op, entity))?;

        tracing::trace!(entity = entity.name(), "memory remove");
        table.rows.remove(index);
        Ok(())
    }
}

fn missing_row(operation: StoreOperation, entity: &EntityDescriptor) -> StoreError {
    StoreError::not_found(operation, "no row with the given primary key").with_entity(entity.name())
}
