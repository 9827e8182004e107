use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Key under which a document's id is exposed to clients.
pub const ID_FIELD: &str = "_id";

/// Named document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Users,
    Products,
    Advertised,
    Bookings,
    Payments,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Users,
        Collection::Products,
        Collection::Advertised,
        Collection::Bookings,
        Collection::Payments,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Products => "products",
            Collection::Advertised => "advertised",
            Collection::Bookings => "bookings",
            Collection::Payments => "payments",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "users" => Ok(Collection::Users),
            "products" => Ok(Collection::Products),
            "advertised" => Ok(Collection::Advertised),
            "bookings" => Ok(Collection::Bookings),
            "payments" => Ok(Collection::Payments),
            _ => Err(format!("Unknown collection: {}", s)),
        }
    }
}

/// A schemaless JSON object as stored in a collection.
///
/// The reserved [`ID_FIELD`] never lives inside a body; the store owns ids.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Map<String, Value>);

impl Document {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a document from an arbitrary JSON value, rejecting non-objects.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map).without_id()),
            _ => None,
        }
    }

    /// Drop any client-supplied `_id`.
    pub fn without_id(mut self) -> Self {
        self.0.remove(ID_FIELD);
        self
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Shallow merge: every top-level key of `patch` overwrites ours.
    pub fn merge(&mut self, patch: &Document) {
        for (key, value) in &patch.0 {
            self.0.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Document {
    fn from(map: Map<String, Value>) -> Self {
        Self(map).without_id()
    }
}

/// A document together with its store-assigned metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: Uuid,
    pub collection: Collection,
    pub body: Document,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Serialises as the body with `_id` prepended, the shape clients expect.
impl Serialize for StoredDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let body = self.body.as_map();
        let mut map = serializer.serialize_map(Some(body.len() + 1))?;
        map.serialize_entry(ID_FIELD, &self.id)?;
        for (key, value) in body {
            if key != ID_FIELD {
                map.serialize_entry(key, value)?;
            }
        }
        map.end()
    }
}

/// Conjunction of top-level field conditions, optionally pinned to one id.
///
/// Each condition holds when the stored value contains the expected one, as
/// with PostgreSQL's `jsonb @>`.
///
/// An empty filter matches every document in a collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    id: Option<Uuid>,
    fields: Map<String, Value>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: Uuid) -> Self {
        Self {
            id: Some(id),
            fields: Map::new(),
        }
    }

    pub fn eq(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(field.into(), value.into());
        self
    }

    pub fn id(&self) -> Option<Uuid> {
        self.id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// JSON object usable with a containment (`@>`) query.
    pub fn to_containment(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Field values a matching document must carry, used to seed upserts.
    pub fn seed_document(&self) -> Document {
        Document::from(self.fields.clone())
    }

    /// Evaluate the filter in memory with the same containment rules as `@>`.
    pub fn matches(&self, doc: &StoredDocument) -> bool {
        if self.id.is_some_and(|id| id != doc.id) {
            return false;
        }
        self.fields.iter().all(|(key, expected)| {
            doc.body
                .get(key)
                .is_some_and(|actual| json_contains(actual, expected))
        })
    }
}

/// JSONB containment below the top level: objects match key by key, arrays
/// match when every pattern element is contained in some element, numbers
/// compare by value and everything else by equality.
fn json_contains(value: &Value, pattern: &Value) -> bool {
    match (value, pattern) {
        (Value::Object(value), Value::Object(pattern)) => pattern
            .iter()
            .all(|(key, p)| value.get(key).is_some_and(|v| json_contains(v, p))),
        (Value::Array(value), Value::Array(pattern)) => pattern
            .iter()
            .all(|p| value.iter().any(|v| json_contains(v, p))),
        (Value::Number(a), Value::Number(b)) => a == b || a.as_f64() == b.as_f64(),
        _ => value == pattern,
    }
}

/// A single-document update, carried alongside an insert by
/// [`crate::traits::DocumentStore::insert_with_update`].
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOne {
    pub collection: Collection,
    pub filter: Filter,
    pub patch: Document,
    pub upsert: bool,
}

/// Outcome of an insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertResult {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

/// Outcome of an update or upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<Uuid>,
}

/// Outcome of a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Role stored on a user document under the `role` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Seller,
    Buyer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Seller => "seller",
            Role::Buyer => "buyer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "seller" => Ok(Role::Seller),
            "buyer" => Ok(Role::Buyer),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}
