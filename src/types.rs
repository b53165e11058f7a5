//! Operation outcome types.
//!
//! Thin, owned views over the driver's result structs so callers never
//! touch `mongodb::results` directly.

use std::collections::HashMap;

use bson::{Bson, oid::ObjectId};
use mongodb::results::{DeleteResult, InsertManyResult, InsertOneResult, UpdateResult};

use crate::error::{MondoError, MondoResult};

/// Outcome of a single-document insert.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOneOutcome {
    /// The `_id` assigned to the inserted document.
    pub inserted_id: Bson,
}

impl InsertOneOutcome {
    /// The assigned identifier as an `ObjectId`.
    ///
    /// Fails when the caller supplied a non-ObjectId `_id` of their own.
    pub fn object_id(&self) -> MondoResult<ObjectId> {
        match self.inserted_id {
            Bson::ObjectId(oid) => Ok(oid),
            ref other => Err(MondoError::InvalidId(format!(
                "inserted _id is not an ObjectId: {}",
                other
            ))),
        }
    }
}

impl From<InsertOneResult> for InsertOneOutcome {
    fn from(result: InsertOneResult) -> Self {
        Self {
            inserted_id: result.inserted_id,
        }
    }
}

/// Outcome of a batch insert: one assigned `_id` per input position.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InsertManyOutcome {
    /// Input position to assigned `_id`.
    pub inserted_ids: HashMap<usize, Bson>,
}

impl InsertManyOutcome {
    /// Number of documents inserted.
    pub fn len(&self) -> usize {
        self.inserted_ids.len()
    }

    /// Whether nothing was inserted.
    pub fn is_empty(&self) -> bool {
        self.inserted_ids.is_empty()
    }

    /// The identifier assigned at `position`, when it is an `ObjectId`.
    pub fn object_id(&self, position: usize) -> Option<ObjectId> {
        match self.inserted_ids.get(&position) {
            Some(Bson::ObjectId(oid)) => Some(*oid),
            _ => None,
        }
    }
}

impl From<InsertManyResult> for InsertManyOutcome {
    fn from(result: InsertManyResult) -> Self {
        Self {
            inserted_ids: result.inserted_ids,
        }
    }
}

/// Outcome of an update.
///
/// `modified <= matched` always holds: a matched document is counted as
/// modified only when the update actually changed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOutcome {
    /// Documents the filter matched.
    pub matched: u64,
    /// Documents the update actually changed.
    pub modified: u64,
}

impl From<UpdateResult> for UpdateOutcome {
    fn from(result: UpdateResult) -> Self {
        Self {
            matched: result.matched_count,
            modified: result.modified_count,
        }
    }
}

/// Outcome of a delete. A zero count is success, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteOutcome {
    /// Documents removed.
    pub deleted: u64,
}

impl From<DeleteResult> for DeleteOutcome {
    fn from(result: DeleteResult) -> Self {
        Self {
            deleted: result.deleted_count,
        }
    }
}
