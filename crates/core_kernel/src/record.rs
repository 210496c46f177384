//! The base record shape shared by every entity
//!
//! Every table carries the same four bookkeeping columns (`reference`,
//! `delete_fl`, `order_no`, `version_no`). They live in [`RecordMeta`], which
//! entities embed rather than inherit. The [`Record`] trait describes what the
//! stores need to know about an entity: its id, its bookkeeping columns, its
//! foreign keys and its unique keys.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::CoreError;
use crate::identifiers::EntityId;
use crate::ports::PortError;
use crate::temporal::{Timezone, Validity};

/// Bookkeeping columns present on every row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RecordMeta {
    /// Free-text external reference
    #[validate(length(max = 2048))]
    pub reference: Option<String>,
    /// Logical delete flag; rows are never physically removed in normal use
    pub delete_fl: bool,
    /// Display ordering
    pub order_no: i32,
    /// Optimistic-locking counter, bumped by the store on every write
    pub version_no: i32,
}

impl RecordMeta {
    pub fn new() -> Self {
        Self {
            reference: None,
            delete_fl: false,
            order_no: 1,
            version_no: 1,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn with_order_no(mut self, order_no: i32) -> Self {
        self.order_no = order_no;
        self
    }

    pub fn is_deleted(&self) -> bool {
        self.delete_fl
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// What happens to a dependent row when the row it references is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OnDelete {
    /// The delete is refused while the dependent exists
    Protect,
    /// The dependent's reference is cleared
    SetNull,
    /// The dependent is deleted as well
    Cascade,
}

/// A foreign key held by a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Relation {
    /// Column holding the reference, e.g. `country_id`
    pub column: &'static str,
    /// Referenced table
    pub entity: &'static str,
    /// Referenced row
    pub id: Uuid,
    pub on_delete: OnDelete,
}

impl Relation {
    pub fn new<I: EntityId>(column: &'static str, id: I, on_delete: OnDelete) -> Self {
        Self {
            column,
            entity: I::ENTITY,
            id: id.uuid(),
            on_delete,
        }
    }

    pub fn protect<I: EntityId>(column: &'static str, id: I) -> Self {
        Self::new(column, id, OnDelete::Protect)
    }

    pub fn set_null<I: EntityId>(column: &'static str, id: I) -> Self {
        Self::new(column, id, OnDelete::SetNull)
    }

    pub fn cascade<I: EntityId>(column: &'static str, id: I) -> Self {
        Self::new(column, id, OnDelete::Cascade)
    }

    /// Returns true if this relation points at the given row
    pub fn targets(&self, entity: &str, id: Uuid) -> bool {
        self.entity == entity && self.id == id
    }
}

/// A value that must be unique within its table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UniqueKey {
    pub column: &'static str,
    pub value: String,
}

impl UniqueKey {
    pub fn new(column: &'static str, value: impl fmt::Display) -> Self {
        Self {
            column,
            value: value.to_string(),
        }
    }
}

/// A persisted entity
///
/// The `validator` rules of the entity are checked by every store before a
/// row is written; see [`check_record`].
pub trait Record: Validate + Clone + fmt::Debug + Send + Sync + 'static {
    type Id: EntityId;

    fn id(&self) -> Self::Id;

    fn meta(&self) -> &RecordMeta;

    fn meta_mut(&mut self) -> &mut RecordMeta;

    /// The row's validity window, for effective-dated entities
    fn validity(&self) -> Option<&Validity> {
        None
    }

    /// Foreign keys currently set on the row
    fn relations(&self) -> Vec<Relation> {
        Vec::new()
    }

    /// Values that must not repeat within the table
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Clears a `SetNull` reference after the referenced row was removed
    fn detach(&mut self, _column: &'static str) {}

    /// Table name of the entity
    fn entity() -> &'static str
    where
        Self: Sized,
    {
        <Self::Id as EntityId>::ENTITY
    }

    /// Returns the row if it passes its validation rules
    ///
    /// ```rust,ignore
    /// let version = ContactVersion::new(contact.id, address.id, email).validated()?;
    /// ```
    fn validated(self) -> Result<Self, CoreError>
    where
        Self: Sized,
    {
        validate_record(&self)?;
        Ok(self)
    }
}

/// An entity whose rows are valid only within a stored window
pub trait EffectiveDated: Record {
    fn validity_mut(&mut self) -> &mut Validity;

    fn window(&self) -> Validity;

    fn is_effective_at(&self, at: chrono::DateTime<chrono::Utc>) -> bool {
        self.window().is_effective_at(at)
    }

    /// Makes the row effective from the start of today in `tz`, open-ended
    ///
    /// Constructors default to UTC; callers holding the configured timezone
    /// pass it here.
    fn effective_today(mut self, tz: &Timezone) -> Self
    where
        Self: Sized,
    {
        *self.validity_mut() = Validity::starting_today(tz);
        self
    }
}

/// Expands to the id and meta accessors of a [`Record`] impl
///
/// Expects the entity to hold `id` and `meta` fields.
#[macro_export]
macro_rules! record_accessors {
    ($id:ty) => {
        type Id = $id;

        fn id(&self) -> $id {
            self.id
        }

        fn meta(&self) -> &$crate::record::RecordMeta {
            &self.meta
        }

        fn meta_mut(&mut self) -> &mut $crate::record::RecordMeta {
            &mut self.meta
        }
    };
}

/// Expands to the [`EffectiveDated`] impl of an entity holding `validity`
#[macro_export]
macro_rules! effective_dated {
    ($entity:ty) => {
        impl $crate::record::EffectiveDated for $entity {
            fn validity_mut(&mut self) -> &mut $crate::temporal::Validity {
                &mut self.validity
            }

            fn window(&self) -> $crate::temporal::Validity {
                self.validity
            }
        }
    };
}

/// Runs `validator` checks and folds the result into a [`CoreError`]
pub fn validate_record<T: Validate>(record: &T) -> Result<(), CoreError> {
    record.validate().map_err(|errors| CoreError::Validation(describe(&errors)))
}

/// Checks a row before a store writes it
///
/// Rejects windows that do not end after they start, then runs the
/// entity's `validator` rules. The first failing field is reported.
pub fn check_record<T: Record>(record: &T) -> Result<(), PortError> {
    if let Some(window) = record.validity() {
        if window.valid_from >= window.valid_until {
            return Err(PortError::validation_field(
                format!(
                    "{}: window [{}, {}) is empty",
                    T::entity(),
                    window.valid_from,
                    window.valid_until
                ),
                "from_dttm",
            ));
        }
    }
    record.validate().map_err(|errors| {
        let fields = field_names(&errors);
        PortError::Validation {
            message: format!("{}: invalid fields: {}", T::entity(), fields.join(", ")),
            field: fields.into_iter().next(),
        }
    })
}

fn field_names(errors: &ValidationErrors) -> Vec<String> {
    let mut fields: Vec<String> = errors
        .errors()
        .keys()
        .map(|field| field.to_string())
        .collect();
    fields.sort();
    fields
}

fn describe(errors: &ValidationErrors) -> String {
    format!("invalid fields: {}", field_names(errors).join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::CountryId;

    #[test]
    fn test_meta_defaults() {
        let meta = RecordMeta::default();
        assert!(!meta.delete_fl);
        assert_eq!(meta.order_no, 1);
        assert_eq!(meta.version_no, 1);
        assert!(meta.reference.is_none());
    }

    #[test]
    fn test_relation_targets() {
        let id = CountryId::new();
        let relation = Relation::protect("country_id", id);
        assert!(relation.targets("country", id.uuid()));
        assert!(!relation.targets("address", id.uuid()));
        assert_eq!(relation.on_delete, OnDelete::Protect);
    }

    #[test]
    fn test_reference_length_limit() {
        let meta = RecordMeta::new().with_reference("x".repeat(2049));
        let err = validate_record(&meta).unwrap_err();
        assert!(err.to_string().contains("reference"));
    }
}
