//! Feature component catalog
//!
//! Components are grouped; deleting a group removes its components.

use core_kernel::{
    record_accessors, ComponentGroupId, ComponentId, PortError, Record, RecordMeta, RecordPort,
    RecordQuery, Relation, UniqueKey,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ComponentGroup {
    pub id: ComponentGroupId,
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    #[validate(length(max = 2048))]
    pub language_key: Option<String>,
    #[validate(length(max = 2048))]
    pub code: Option<String>,
    /// Icon name, free text
    #[validate(length(max = 2048))]
    pub icon: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl ComponentGroup {
    pub fn new(internal_key: impl Into<String>) -> Self {
        Self {
            id: ComponentGroupId::new_v7(),
            internal_key: Some(internal_key.into()),
            language_key: None,
            code: None,
            icon: None,
            meta: RecordMeta::new(),
        }
    }

    /// Live components of a group in `order_no` order
    pub async fn components<P>(port: &P, group_id: ComponentGroupId) -> Result<Vec<Component>, PortError>
    where
        P: RecordPort<Component> + ?Sized,
    {
        port.find(&RecordQuery::children_of("component_group_id", group_id)).await
    }
}

impl Record for ComponentGroup {
    record_accessors!(ComponentGroupId);

    fn unique_keys(&self) -> Vec<UniqueKey> {
        self.internal_key
            .iter()
            .map(|key| UniqueKey::new("internal_key", key))
            .collect()
    }
}

impl std::fmt::Display for ComponentGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.internal_key.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Component {
    pub id: ComponentId,
    pub component_group_id: ComponentGroupId,
    #[validate(length(max = 2048))]
    pub internal_key: Option<String>,
    #[validate(length(max = 2048))]
    pub language_key: Option<String>,
    #[validate(length(max = 2048))]
    pub code: Option<String>,
    #[validate(length(max = 2048))]
    pub icon: Option<String>,
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    #[validate(nested)]
    pub meta: RecordMeta,
}

impl Component {
    pub fn new(component_group_id: ComponentGroupId, internal_key: impl Into<String>, order_no: i32) -> Self {
        Self {
            id: ComponentId::new_v7(),
            component_group_id,
            internal_key: Some(internal_key.into()),
            language_key: None,
            code: None,
            icon: None,
            meta: RecordMeta::new().with_order_no(order_no),
        }
    }
}

impl Record for Component {
    record_accessors!(ComponentId);

    fn relations(&self) -> Vec<Relation> {
        vec![Relation::cascade("component_group_id", self.component_group_id)]
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.internal_key.as_deref().unwrap_or_default())
    }
}
