//! Update specification building.

use bson::{Bson, Document};

/// Builder for update specifications.
///
/// Each directive lands under its `$`-operator key; directives for the
/// same operator accumulate into one sub-document. The server applies
/// the whole specification atomically per matched document.
///
/// # Example
///
/// ```rust,ignore
/// use mondo::UpdateBuilder;
///
/// let update = UpdateBuilder::new()
///     .set("account_status", "active")
///     .inc("balance", 100)
///     .build();
///
/// // Produces: { "$set": { "account_status": "active" }, "$inc": { "balance": 100 } }
/// ```
#[derive(Debug, Clone, Default)]
pub struct UpdateBuilder {
    ops: Document,
}

impl UpdateBuilder {
    /// Create a new empty update builder.
    pub fn new() -> Self {
        Self::default()
    }

    fn push_op(&mut self, op: &str, field: &str, value: Bson) {
        if let Ok(existing) = self.ops.get_document_mut(op) {
            existing.insert(field, value);
        } else {
            let mut inner = Document::new();
            inner.insert(field, value);
            self.ops.insert(op, inner);
        }
    }

    /// Set a field to a value (`$set`). Creates the field if absent.
    pub fn set(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.push_op("$set", field, value.into());
        self
    }

    /// Increment a numeric field (`$inc`). Negative amounts decrement.
    pub fn inc(mut self, field: &str, amount: impl Into<Bson>) -> Self {
        self.push_op("$inc", field, amount.into());
        self
    }

    /// Multiply a numeric field (`$mul`).
    pub fn mul(mut self, field: &str, factor: impl Into<Bson>) -> Self {
        self.push_op("$mul", field, factor.into());
        self
    }

    /// Remove a field (`$unset`).
    pub fn unset(mut self, field: &str) -> Self {
        self.push_op("$unset", field, Bson::String(String::new()));
        self
    }

    /// Rename a field (`$rename`).
    pub fn rename(mut self, field: &str, new_name: &str) -> Self {
        self.push_op("$rename", field, Bson::String(new_name.to_string()));
        self
    }

    /// Set a field to the smaller of its value and the given one (`$min`).
    pub fn min(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.push_op("$min", field, value.into());
        self
    }

    /// Set a field to the larger of its value and the given one (`$max`).
    pub fn max(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.push_op("$max", field, value.into());
        self
    }

    /// Set a field to the server's current date (`$currentDate`).
    pub fn current_date(mut self, field: &str) -> Self {
        self.push_op("$currentDate", field, Bson::Boolean(true));
        self
    }

    /// Build the update specification.
    pub fn build(self) -> Document {
        self.ops
    }

    /// Check if no directives have been added.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// A one-directive `$set` specification.
pub fn set(field: &str, value: impl Into<Bson>) -> Document {
    UpdateBuilder::new().set(field, value).build()
}

/// A one-directive `$inc` specification.
pub fn inc(field: &str, amount: impl Into<Bson>) -> Document {
    UpdateBuilder::new().inc(field, amount).build()
}

/// Merge several update specifications operator-wise into one.
///
/// A later directive for the same field under the same operator wins.
pub fn combine(specs: Vec<Document>) -> Document {
    let mut builder = UpdateBuilder::new();
    for spec in specs {
        for (op, value) in spec {
            if let Bson::Document(fields) = value {
                for (field, directive) in fields {
                    builder.push_op(&op, &field, directive);
                }
            }
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_inc() {
        let update = UpdateBuilder::new()
            .set("account_status", "active")
            .inc("balance", 100)
            .build();

        let set_ops = update.get_document("$set").unwrap();
        assert_eq!(set_ops.get_str("account_status").unwrap(), "active");
        let inc_ops = update.get_document("$inc").unwrap();
        assert_eq!(inc_ops.get_i32("balance").unwrap(), 100);
    }

    #[test]
    fn test_same_operator_accumulates() {
        let update = UpdateBuilder::new()
            .set("account_status", "active")
            .set("minimum_balance", 100)
            .build();

        let set_ops = update.get_document("$set").unwrap();
        assert_eq!(set_ops.len(), 2);
    }

    #[test]
    fn test_negative_inc_decrements() {
        let update = inc("balance", -200);
        assert_eq!(update.get_document("$inc").unwrap().get_i32("balance").unwrap(), -200);
    }

    #[test]
    fn test_unset_and_rename() {
        let update = UpdateBuilder::new()
            .unset("legacy_flag")
            .rename("addr", "address")
            .build();

        assert!(update.get_document("$unset").unwrap().contains_key("legacy_flag"));
        assert_eq!(
            update.get_document("$rename").unwrap().get_str("addr").unwrap(),
            "address"
        );
    }

    #[test]
    fn test_current_date() {
        let update = UpdateBuilder::new().current_date("last_updated").build();
        assert!(
            update
                .get_document("$currentDate")
                .unwrap()
                .get_bool("last_updated")
                .unwrap()
        );
    }

    #[test]
    fn test_combine_merges_operator_wise() {
        let combined = combine(vec![
            set("account_status", "active"),
            inc("balance", 100),
            set("minimum_balance", 100),
        ]);

        let set_ops = combined.get_document("$set").unwrap();
        assert_eq!(set_ops.len(), 2);
        assert_eq!(combined.get_document("$inc").unwrap().get_i32("balance").unwrap(), 100);
    }

    #[test]
    fn test_empty_builder() {
        assert!(UpdateBuilder::new().is_empty());
        assert!(UpdateBuilder::new().build().is_empty());
    }
}
