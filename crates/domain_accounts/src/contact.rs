//! Contacts and their effective-dated details
//!
//! A [`Contact`] is a stable handle. Its personal details live in
//! [`ContactVersion`] rows; changing the details closes the current version
//! and inserts a new one, so the history is kept.

use chrono::{DateTime, Utc};
use core_kernel::{
    effective_dated, record_accessors, AddressId, ContactId, ContactVersionId, Labelled,
    PortError, Record, RecordMeta, RecordPort, RecordQuery, Relation, UniqueKey, Validity,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Contact {
    pub id: ContactId,
    /// Unique when present
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    pub description: String,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Contact {
    pub fn new(internal_key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: ContactId::new_v7(),
            internal_key: Some(internal_key.into()),
            description: description.into(),
            meta: RecordMeta::new(),
        }
    }
}

impl Record for Contact {
    record_accessors!(ContactId);

    fn unique_keys(&self) -> Vec<UniqueKey> {
        self.internal_key
            .iter()
            .map(|key| UniqueKey::new("internal_key", key))
            .collect()
    }
}

/// Form of address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "contact_title", rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Title {
    Dr,
    Miss,
    #[default]
    Mr,
    Mrs,
    Ms,
    Prof,
}

impl Labelled for Title {
    fn label_key(&self) -> &'static str {
        match self {
            Title::Dr => "title-dr",
            Title::Miss => "title-miss",
            Title::Mr => "title-mr",
            Title::Mrs => "title-mrs",
            Title::Ms => "title-ms",
            Title::Prof => "title-prof",
        }
    }
}

/// One version of a contact's details
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ContactVersion {
    pub id: ContactVersionId,
    pub contact_id: ContactId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub validity: Validity,
    pub title: Title,
    #[validate(length(max = 2048))]
    pub initials: Option<String>,
    #[validate(length(max = 2048))]
    pub first_name: Option<String>,
    #[validate(length(max = 2048))]
    pub last_name: Option<String>,
    #[validate(length(max = 2048))]
    pub job_title: Option<String>,
    #[validate(length(max = 2048))]
    pub number1: Option<String>,
    #[validate(length(max = 2048))]
    pub number2: Option<String>,
    #[validate(length(max = 2048))]
    pub number3: Option<String>,
    #[validate(email, length(max = 2048))]
    pub email: String,
    #[validate(length(max = 2048))]
    pub web_browser: Option<String>,
    #[validate(length(max = 2048))]
    pub care_of: Option<String>,
    pub address_id: AddressId,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl ContactVersion {
    pub fn new(contact_id: ContactId, address_id: AddressId, email: impl Into<String>) -> Self {
        Self {
            id: ContactVersionId::new_v7(),
            contact_id,
            validity: Validity::default(),
            title: Title::default(),
            initials: None,
            first_name: None,
            last_name: None,
            job_title: None,
            number1: None,
            number2: None,
            number3: None,
            email: email.into(),
            web_browser: None,
            care_of: None,
            address_id,
            meta: RecordMeta::new(),
        }
    }

    pub fn with_name(mut self, title: Title, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.title = title;
        self.first_name = Some(first_name.into());
        self.last_name = Some(last_name.into());
        self
    }

    /// A copy of these details as a fresh row, ready to supersede this one
    pub fn revision(&self) -> Self {
        Self {
            id: ContactVersionId::new_v7(),
            meta: RecordMeta::new(),
            ..self.clone()
        }
    }

    /// Title, first and last name joined with spaces
    pub fn full_name(&self) -> String {
        let title = core_kernel::labels::label(&self.title);
        [title.as_deref(), self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The version of a contact's details in effect at `at`
    pub async fn current<P>(port: &P, contact_id: ContactId, at: DateTime<Utc>) -> Result<Self, PortError>
    where
        P: RecordPort<ContactVersion> + ?Sized,
    {
        let query = RecordQuery::children_of("contact_id", contact_id).effective_at(at);
        port.find(&query)
            .await?
            .into_iter()
            .max_by_key(|version| version.validity.valid_from)
            .ok_or_else(|| PortError::not_found("contact_version", contact_id))
    }
}

impl Record for ContactVersion {
    record_accessors!(ContactVersionId);

    fn validity(&self) -> Option<&Validity> {
        Some(&self.validity)
    }

    fn relations(&self) -> Vec<Relation> {
        vec![
            Relation::protect("contact_id", self.contact_id),
            Relation::protect("address_id", self.address_id),
        ]
    }
}

effective_dated!(ContactVersion);
