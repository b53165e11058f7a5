//! Typed access to schema-less documents.
//!
//! Documents are ordered string-keyed maps of heterogeneous BSON values.
//! [`DocumentFields`] gives explicit typed accessors over that shape:
//! the `field_*` methods fail on a missing or mistyped field, the
//! `*_opt` variants treat both as absence.

use bson::{Bson, Document, oid::ObjectId};
use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{MondoError, MondoResult};

/// Typed field accessors for BSON documents.
pub trait DocumentFields {
    /// A string field.
    fn field_str(&self, key: &str) -> MondoResult<&str>;

    /// A string field, or `None` when absent or mistyped.
    fn field_str_opt(&self, key: &str) -> Option<&str>;

    /// An i32 field.
    fn field_i32(&self, key: &str) -> MondoResult<i32>;

    /// An i32 field, or `None` when absent or mistyped.
    fn field_i32_opt(&self, key: &str) -> Option<i32>;

    /// An i64 field.
    fn field_i64(&self, key: &str) -> MondoResult<i64>;

    /// An i64 field, or `None` when absent or mistyped.
    fn field_i64_opt(&self, key: &str) -> Option<i64>;

    /// An f64 field.
    fn field_f64(&self, key: &str) -> MondoResult<f64>;

    /// An f64 field, or `None` when absent or mistyped.
    fn field_f64_opt(&self, key: &str) -> Option<f64>;

    /// A bool field.
    fn field_bool(&self, key: &str) -> MondoResult<bool>;

    /// A bool field, or `None` when absent or mistyped.
    fn field_bool_opt(&self, key: &str) -> Option<bool>;

    /// A date field, as a UTC timestamp.
    fn field_datetime(&self, key: &str) -> MondoResult<DateTime<Utc>>;

    /// A date field, or `None` when absent or mistyped.
    fn field_datetime_opt(&self, key: &str) -> Option<DateTime<Utc>>;

    /// An ObjectId field.
    fn field_object_id(&self, key: &str) -> MondoResult<ObjectId>;

    /// An ObjectId field, or `None` when absent or mistyped.
    fn field_object_id_opt(&self, key: &str) -> Option<ObjectId>;

    /// A nested document field.
    fn field_document(&self, key: &str) -> MondoResult<&Document>;

    /// A nested document field, or `None` when absent or mistyped.
    fn field_document_opt(&self, key: &str) -> Option<&Document>;

    /// An array field.
    fn field_array(&self, key: &str) -> MondoResult<&Vec<Bson>>;

    /// An array field, or `None` when absent or mistyped.
    fn field_array_opt(&self, key: &str) -> Option<&Vec<Bson>>;

    /// The reserved `_id` field as an ObjectId.
    fn id(&self) -> MondoResult<ObjectId>;

    /// Map the whole document onto a typed struct.
    fn to_typed<T: DeserializeOwned>(&self) -> MondoResult<T>;
}

fn mistyped(key: &str, expected: &str) -> MondoError {
    MondoError::serialization(format!("field '{}' missing or not {}", key, expected))
}

impl DocumentFields for Document {
    fn field_str(&self, key: &str) -> MondoResult<&str> {
        self.get_str(key).map_err(|_| mistyped(key, "a string"))
    }

    fn field_str_opt(&self, key: &str) -> Option<&str> {
        self.get_str(key).ok()
    }

    fn field_i32(&self, key: &str) -> MondoResult<i32> {
        self.get_i32(key).map_err(|_| mistyped(key, "an i32"))
    }

    fn field_i32_opt(&self, key: &str) -> Option<i32> {
        self.get_i32(key).ok()
    }

    fn field_i64(&self, key: &str) -> MondoResult<i64> {
        self.get_i64(key).map_err(|_| mistyped(key, "an i64"))
    }

    fn field_i64_opt(&self, key: &str) -> Option<i64> {
        self.get_i64(key).ok()
    }

    fn field_f64(&self, key: &str) -> MondoResult<f64> {
        self.get_f64(key).map_err(|_| mistyped(key, "an f64"))
    }

    fn field_f64_opt(&self, key: &str) -> Option<f64> {
        self.get_f64(key).ok()
    }

    fn field_bool(&self, key: &str) -> MondoResult<bool> {
        self.get_bool(key).map_err(|_| mistyped(key, "a bool"))
    }

    fn field_bool_opt(&self, key: &str) -> Option<bool> {
        self.get_bool(key).ok()
    }

    fn field_datetime(&self, key: &str) -> MondoResult<DateTime<Utc>> {
        self.get_datetime(key)
            .map(|dt| dt.to_chrono())
            .map_err(|_| mistyped(key, "a datetime"))
    }

    fn field_datetime_opt(&self, key: &str) -> Option<DateTime<Utc>> {
        self.get_datetime(key).ok().map(|dt| dt.to_chrono())
    }

    fn field_object_id(&self, key: &str) -> MondoResult<ObjectId> {
        self.get_object_id(key)
            .map_err(|_| mistyped(key, "an ObjectId"))
    }

    fn field_object_id_opt(&self, key: &str) -> Option<ObjectId> {
        self.get_object_id(key).ok()
    }

    fn field_document(&self, key: &str) -> MondoResult<&Document> {
        self.get_document(key)
            .map_err(|_| mistyped(key, "a document"))
    }

    fn field_document_opt(&self, key: &str) -> Option<&Document> {
        self.get_document(key).ok()
    }

    fn field_array(&self, key: &str) -> MondoResult<&Vec<Bson>> {
        self.get_array(key).map_err(|_| mistyped(key, "an array"))
    }

    fn field_array_opt(&self, key: &str) -> Option<&Vec<Bson>> {
        self.get_array(key).ok()
    }

    fn id(&self) -> MondoResult<ObjectId> {
        self.field_object_id("_id")
    }

    fn to_typed<T: DeserializeOwned>(&self) -> MondoResult<T> {
        bson::from_document(self.clone()).map_err(|e| MondoError::serialization(e.to_string()))
    }
}

/// Map a typed struct onto a BSON document.
pub fn to_document<T: Serialize>(value: &T) -> MondoResult<Document> {
    bson::to_document(value).map_err(|e| MondoError::serialization(e.to_string()))
}

/// Map a BSON document onto a typed struct.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> MondoResult<T> {
    bson::from_document(doc).map_err(|e| MondoError::serialization(e.to_string()))
}

/// Parse an ObjectId from its hex representation.
pub fn parse_object_id(s: &str) -> MondoResult<ObjectId> {
    ObjectId::parse_str(s).map_err(MondoError::from)
}

/// Generate a fresh ObjectId (12 bytes, timestamp + random + counter).
pub fn new_object_id() -> ObjectId {
    ObjectId::new()
}

/// Conversions between BSON values and common Rust value types.
pub mod bson_values {
    use super::*;
    use uuid::Uuid;

    /// A chrono timestamp as a BSON datetime.
    pub fn datetime_to_bson(dt: DateTime<Utc>) -> Bson {
        Bson::DateTime(bson::DateTime::from_chrono(dt))
    }

    /// A BSON datetime as a chrono timestamp.
    pub fn bson_to_datetime(value: &Bson) -> MondoResult<DateTime<Utc>> {
        match value {
            Bson::DateTime(dt) => Ok(dt.to_chrono()),
            other => Err(MondoError::serialization(format!(
                "expected a datetime, got {}",
                other
            ))),
        }
    }

    /// A UUID as BSON binary with the UUID subtype.
    pub fn uuid_to_bson(uuid: Uuid) -> Bson {
        Bson::Binary(bson::Binary {
            subtype: bson::spec::BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        })
    }

    /// A BSON binary or string as a UUID.
    pub fn bson_to_uuid(value: &Bson) -> MondoResult<Uuid> {
        match value {
            Bson::Binary(binary) => {
                let bytes: [u8; 16] = binary
                    .bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| MondoError::serialization("UUID binary is not 16 bytes"))?;
                Ok(Uuid::from_bytes(bytes))
            }
            Bson::String(s) => Uuid::parse_str(s)
                .map_err(|e| MondoError::serialization(format!("invalid UUID string: {}", e))),
            other => Err(MondoError::serialization(format!(
                "expected binary or string for UUID, got {}",
                other
            ))),
        }
    }
}
