//! Filter document building.

use bson::{Bson, Document, doc, oid::ObjectId};

use crate::error::{MondoError, MondoResult};

/// Builder for filter documents.
///
/// Covers equality, comparison, membership, existence, and logical
/// combinators. Anything beyond that can be written with `doc!` and
/// passed through [`FilterBuilder::merge`].
///
/// # Example
///
/// ```rust,ignore
/// use mondo::FilterBuilder;
///
/// let filter = FilterBuilder::new()
///     .eq("account_type", "checking")
///     .gte("balance", 1000)
///     .build();
///
/// // Produces: { "account_type": "checking", "balance": { "$gte": 1000 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct FilterBuilder {
    doc: Document,
}

impl FilterBuilder {
    /// Create a new empty filter builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a filter builder from an existing document.
    pub fn from_doc(doc: Document) -> Self {
        Self { doc }
    }

    /// Parse a filter from its JSON representation.
    pub fn from_json(json: &str) -> MondoResult<Self> {
        let doc: Document = serde_json::from_str(json)
            .map_err(|e| MondoError::serialization(format!("invalid filter JSON: {}", e)))?;
        Ok(Self { doc })
    }

    /// Add an equality condition.
    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, value.into());
        self
    }

    /// Add a not-equal condition.
    pub fn ne(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, doc! { "$ne": value.into() });
        self
    }

    /// Add a greater-than condition.
    pub fn gt(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, doc! { "$gt": value.into() });
        self
    }

    /// Add a greater-than-or-equal condition.
    pub fn gte(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, doc! { "$gte": value.into() });
        self
    }

    /// Add a less-than condition.
    pub fn lt(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, doc! { "$lt": value.into() });
        self
    }

    /// Add a less-than-or-equal condition.
    pub fn lte(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.doc.insert(field, doc! { "$lte": value.into() });
        self
    }

    /// Add an "in" condition (field value among the given values).
    pub fn in_array(mut self, field: &str, values: Vec<impl Into<Bson>>) -> Self {
        let bson_values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.doc.insert(field, doc! { "$in": bson_values });
        self
    }

    /// Add a "not in" condition.
    pub fn not_in(mut self, field: &str, values: Vec<impl Into<Bson>>) -> Self {
        let bson_values: Vec<Bson> = values.into_iter().map(Into::into).collect();
        self.doc.insert(field, doc! { "$nin": bson_values });
        self
    }

    /// Add an existence condition.
    pub fn exists(mut self, field: &str, exists: bool) -> Self {
        self.doc.insert(field, doc! { "$exists": exists });
        self
    }

    /// Combine sub-filters with AND (`$and`).
    pub fn and(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$and", conditions);
        self
    }

    /// Combine sub-filters with OR (`$or`).
    pub fn or(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$or", conditions);
        self
    }

    /// Combine sub-filters with NOR (`$nor`).
    pub fn nor(mut self, conditions: Vec<Document>) -> Self {
        self.doc.insert("$nor", conditions);
        self
    }

    /// Negate a condition on a field.
    pub fn not(mut self, field: &str, condition: Document) -> Self {
        self.doc.insert(field, doc! { "$not": condition });
        self
    }

    /// Filter on `_id`.
    pub fn by_id(mut self, id: ObjectId) -> Self {
        self.doc.insert("_id", id);
        self
    }

    /// Filter on `_id` given its hex representation.
    pub fn by_id_str(self, id: &str) -> MondoResult<Self> {
        let oid = ObjectId::parse_str(id)?;
        Ok(self.by_id(oid))
    }

    /// Merge another filter document into this one.
    pub fn merge(mut self, other: Document) -> Self {
        for (k, v) in other {
            self.doc.insert(k, v);
        }
        self
    }

    /// Build the filter document.
    pub fn build(self) -> Document {
        self.doc
    }

    /// Check if the filter is empty (matches all documents).
    pub fn is_empty(&self) -> bool {
        self.doc.is_empty()
    }
}

/// An empty filter (matches all documents).
pub fn all() -> Document {
    doc! {}
}

/// A filter selecting one document by `_id`.
pub fn by_id(id: ObjectId) -> Document {
    doc! { "_id": id }
}

/// A filter selecting one document by the hex representation of its `_id`.
pub fn by_id_str(id: &str) -> MondoResult<Document> {
    let oid = ObjectId::parse_str(id)?;
    Ok(doc! { "_id": oid })
}
