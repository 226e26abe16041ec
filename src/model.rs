//! Entity record, query-string filter and the typed predicate handed to the data context.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// The single persisted record type. Members other than `id`, `property1` and
/// `property2` are kept in `extra` and stored as one JSONB column.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    #[serde(default)]
    pub id: i32,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub property1: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub property2: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(property1: impl Into<String>, property2: impl Into<String>) -> Self {
        Entity {
            id: 0,
            property1: property1.into(),
            property2: property2.into(),
            extra: Map::new(),
        }
    }

    /// Overwrite every mutable field from `other`. The id is left untouched.
    pub fn apply(&mut self, other: &Entity) {
        self.property1 = other.property1.clone();
        self.property2 = other.property2.clone();
        self.extra = other.extra.clone();
    }
}

/// JSON `null` reads as the empty string; the columns are `NOT NULL DEFAULT ''`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// `?property1=..&property2=..`. A missing parameter is the empty string.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct EntityFilter {
    #[serde(default)]
    pub property1: String,
    #[serde(default)]
    pub property2: String,
}

impl From<EntityFilter> for EntityPredicate {
    fn from(f: EntityFilter) -> Self {
        EntityPredicate::Properties {
            property1: f.property1,
            property2: f.property2,
        }
    }
}

/// Equality conjunction evaluated by a [`DataContext`](crate::context::DataContext).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntityPredicate {
    Id(i32),
    Properties { property1: String, property2: String },
}

impl EntityPredicate {
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            EntityPredicate::Id(id) => entity.id == *id,
            EntityPredicate::Properties { property1, property2 } => {
                entity.property1 == *property1 && entity.property2 == *property2
            }
        }
    }
}
