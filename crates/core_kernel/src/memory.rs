//! In-memory record store for tests
//!
//! Holds every entity type in one store so that foreign keys across
//! entities can be checked the way PostgreSQL checks them: missing targets,
//! unique columns, protective references, cascades and set-null.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::any::Any;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::identifiers::EntityId;
use crate::ports::{
    split_window, AdapterHealth, DomainPort, EffectiveDatedPort, HealthCheckResult,
    HealthCheckable, JournaledPort, PortError, RecordPort, RecordQuery,
};
use crate::record::{check_record, EffectiveDated, OnDelete, Record, Relation, UniqueKey};

/// Type-erased view of a stored row
trait StoredRecord: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn relations(&self) -> Vec<Relation>;
    fn unique_keys(&self) -> Vec<UniqueKey>;
    fn detach(&mut self, column: &'static str);
}

impl<T: Record> StoredRecord for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn relations(&self) -> Vec<Relation> {
        Record::relations(self)
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        Record::unique_keys(self)
    }

    fn detach(&mut self, column: &'static str) {
        Record::detach(self, column);
    }
}

type Table = BTreeMap<Uuid, Box<dyn StoredRecord>>;

#[derive(Default)]
struct Tables {
    tables: HashMap<&'static str, Table>,
}

impl Tables {
    fn table(&self, entity: &str) -> Option<&Table> {
        self.tables.get(entity)
    }

    fn contains(&self, entity: &str, id: Uuid) -> bool {
        self.table(entity).is_some_and(|table| table.contains_key(&id))
    }

    fn get<T: Record>(&self, id: Uuid) -> Option<&T> {
        self.table(T::entity())?
            .get(&id)
            .and_then(|row| row.as_any().downcast_ref::<T>())
    }

    fn get_mut<T: Record>(&mut self, id: Uuid) -> Option<&mut T> {
        self.tables
            .get_mut(T::entity())?
            .get_mut(&id)
            .and_then(|row| row.as_any_mut().downcast_mut::<T>())
    }

    fn put<T: Record>(&mut self, record: T) {
        self.tables
            .entry(T::entity())
            .or_default()
            .insert(record.id().uuid(), Box::new(record));
    }

    /// Checks foreign keys and unique columns of a row about to be written
    fn check_constraints<T: Record>(&self, record: &T) -> Result<(), PortError> {
        let id = record.id().uuid();

        for relation in Record::relations(record) {
            if !self.contains(relation.entity, relation.id) {
                return Err(PortError::missing_reference(
                    T::entity(),
                    relation.column,
                    relation.id,
                ));
            }
        }

        if let Some(table) = self.table(T::entity()) {
            for key in Record::unique_keys(record) {
                let clash = table
                    .iter()
                    .filter(|(other, _)| **other != id)
                    .any(|(_, row)| row.unique_keys().contains(&key));
                if clash {
                    return Err(PortError::duplicate(T::entity(), key.column, &key.value));
                }
            }
        }

        Ok(())
    }

    fn check_insert<T: Record>(&self, record: &T) -> Result<(), PortError> {
        check_record(record)?;
        if self.contains(T::entity(), record.id().uuid()) {
            return Err(PortError::duplicate(T::entity(), "id", record.id()));
        }
        self.check_constraints(record)
    }

    /// Checks a changed row against the stored one and returns it with the
    /// next version, without writing it
    fn check_update<T: Record>(&self, mut record: T) -> Result<T, PortError> {
        let id = record.id();
        let stored_version = self
            .get::<T>(id.uuid())
            .map(|stored| stored.meta().version_no)
            .ok_or_else(|| PortError::not_found(T::entity(), id))?;

        if stored_version != record.meta().version_no {
            return Err(PortError::StaleVersion {
                entity_type: T::entity().to_string(),
                id: id.to_string(),
                expected: record.meta().version_no,
                actual: stored_version,
            });
        }

        check_record(&record)?;
        self.check_constraints(&record)?;
        record.meta_mut().version_no += 1;
        Ok(record)
    }

    /// Rows (entity, id) removed along with the root through cascading relations
    fn cascade_set(&self, entity: &'static str, id: Uuid) -> HashSet<(&'static str, Uuid)> {
        let mut doomed = HashSet::from([(entity, id)]);
        let mut queue = VecDeque::from([(entity, id)]);

        while let Some((parent_entity, parent_id)) = queue.pop_front() {
            for (child_entity, table) in &self.tables {
                for (child_id, row) in table {
                    let cascades = row.relations().iter().any(|relation| {
                        relation.on_delete == OnDelete::Cascade
                            && relation.targets(parent_entity, parent_id)
                    });
                    if cascades && doomed.insert((*child_entity, *child_id)) {
                        queue.push_back((*child_entity, *child_id));
                    }
                }
            }
        }

        doomed
    }
}

/// In-memory implementation of every record port
///
/// Cheap to construct; each test gets its own store.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows held for an entity, soft-deleted rows included
    pub async fn count(&self, entity: &str) -> usize {
        self.tables.read().await.table(entity).map_or(0, BTreeMap::len)
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRecordStore").finish_non_exhaustive()
    }
}

impl DomainPort for InMemoryRecordStore {}

#[async_trait]
impl HealthCheckable for InMemoryRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "in-memory-record-store".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: Some("In-memory store always healthy".to_string()),
            checked_at: Utc::now(),
        }
    }
}

fn matches_query<T: Record>(record: &T, query: &RecordQuery) -> bool {
    if !query.include_deleted && record.meta().delete_fl {
        return false;
    }
    if let (Some(at), Some(window)) = (query.effective_at, record.validity()) {
        if !window.is_effective_at(at) {
            return false;
        }
    }
    if let Some(parent) = query.parent {
        return Record::relations(record)
            .iter()
            .any(|relation| relation.column == parent.column && relation.id == parent.id);
    }
    true
}

#[async_trait]
impl<T: Record> RecordPort<T> for InMemoryRecordStore {
    async fn insert(&self, record: T) -> Result<T, PortError> {
        let mut tables = self.tables.write().await;
        tables.check_insert(&record)?;
        debug!(entity = T::entity(), id = %record.id(), "Inserted record");
        tables.put(record.clone());
        Ok(record)
    }

    async fn get(&self, id: T::Id) -> Result<T, PortError> {
        self.tables
            .read()
            .await
            .get::<T>(id.uuid())
            .cloned()
            .ok_or_else(|| PortError::not_found(T::entity(), id))
    }

    async fn find(&self, query: &RecordQuery) -> Result<Vec<T>, PortError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<T> = tables
            .table(T::entity())
            .into_iter()
            .flat_map(|table| table.values())
            .filter_map(|row| row.as_any().downcast_ref::<T>())
            .filter(|record| matches_query(*record, query))
            .cloned()
            .collect();

        rows.sort_by_key(|record| (record.meta().order_no, record.id().uuid()));

        let offset = query.offset.unwrap_or(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit as usize);
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn update(&self, record: T) -> Result<T, PortError> {
        let mut tables = self.tables.write().await;
        let record = tables.check_update(record)?;
        debug!(
            entity = T::entity(),
            id = %record.id(),
            version = record.meta().version_no,
            "Updated record"
        );
        tables.put(record.clone());
        Ok(record)
    }

    async fn soft_delete(&self, id: T::Id) -> Result<T, PortError> {
        let mut tables = self.tables.write().await;
        let record = tables
            .get_mut::<T>(id.uuid())
            .ok_or_else(|| PortError::not_found(T::entity(), id))?;

        let meta = record.meta_mut();
        meta.delete_fl = true;
        meta.version_no += 1;
        debug!(entity = T::entity(), %id, "Soft-deleted record");
        Ok(record.clone())
    }

    async fn delete(&self, id: T::Id) -> Result<(), PortError> {
        let mut tables = self.tables.write().await;
        let root = id.uuid();
        if !tables.contains(T::entity(), root) {
            return Err(PortError::not_found(T::entity(), id));
        }

        let doomed = tables.cascade_set(T::entity(), root);
        let mut detach: Vec<(&'static str, Uuid, &'static str)> = Vec::new();

        for (entity, table) in &tables.tables {
            for (row_id, row) in table {
                if doomed.contains(&(*entity, *row_id)) {
                    continue;
                }
                for relation in row.relations() {
                    if !doomed.contains(&(relation.entity, relation.id)) {
                        continue;
                    }
                    match relation.on_delete {
                        OnDelete::Protect => {
                            warn!(
                                entity = T::entity(),
                                %id,
                                dependent = *entity,
                                "Delete blocked by protective reference"
                            );
                            return Err(PortError::protected(
                                T::entity(),
                                id,
                                format!("referenced by {}.{} ({})", entity, relation.column, row_id),
                            ));
                        }
                        OnDelete::SetNull => detach.push((*entity, *row_id, relation.column)),
                        OnDelete::Cascade => {}
                    }
                }
            }
        }

        for (entity, row_id, column) in detach {
            if let Some(row) = tables.tables.get_mut(entity).and_then(|t| t.get_mut(&row_id)) {
                row.detach(column);
            }
        }
        for (entity, row_id) in &doomed {
            if let Some(table) = tables.tables.get_mut(entity) {
                table.remove(row_id);
            }
        }

        debug!(entity = T::entity(), %id, removed = doomed.len(), "Deleted record");
        Ok(())
    }

    async fn exists(&self, id: T::Id) -> Result<bool, PortError> {
        Ok(self.tables.read().await.contains(T::entity(), id.uuid()))
    }
}

#[async_trait]
impl<T: Record, J: Record> JournaledPort<T, J> for InMemoryRecordStore {
    async fn update_journaled(&self, record: T, entry: J) -> Result<(T, J), PortError> {
        let mut tables = self.tables.write().await;
        let record = tables.check_update(record)?;
        tables.check_insert(&entry)?;

        tables.put(record.clone());
        tables.put(entry.clone());
        debug!(
            entity = T::entity(),
            id = %record.id(),
            journal = J::entity(),
            "Updated record with journal entry"
        );
        Ok((record, entry))
    }
}

#[async_trait]
impl<T: EffectiveDated> EffectiveDatedPort<T> for InMemoryRecordStore {
    async fn supersede(
        &self,
        id: T::Id,
        at: DateTime<Utc>,
        mut replacement: T,
    ) -> Result<(T, T), PortError> {
        let mut tables = self.tables.write().await;
        let mut current = tables
            .get::<T>(id.uuid())
            .cloned()
            .ok_or_else(|| PortError::not_found(T::entity(), id))?;

        split_window(&mut current, at, &mut replacement)?;
        tables.check_insert(&replacement)?;

        current.meta_mut().version_no += 1;
        tables.put(current.clone());
        tables.put(replacement.clone());
        debug!(entity = T::entity(), %id, replacement = %replacement.id(), "Superseded record");
        Ok((current, replacement))
    }
}
