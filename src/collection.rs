//! Typed collection handles and lazy cursors.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use bson::Document;
use futures::{Stream, StreamExt, TryStreamExt};
use mongodb::Collection;
use mongodb::options::InsertManyOptions;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::error::{MondoError, MondoResult};
use crate::types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};

/// A typed handle on a named collection.
///
/// Wraps the driver collection with outcome types and a client-side
/// per-operation deadline. Cheap to clone; clones share the client's
/// connection pool.
#[derive(Debug, Clone)]
pub struct MondoCollection<T> {
    inner: Collection<T>,
    timeout: Option<Duration>,
}

impl<T> MondoCollection<T> {
    pub(crate) fn new(inner: Collection<T>, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

    /// The collection name.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Override the per-operation deadline for this handle.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove the per-operation deadline for this handle.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Run a driver call under this handle's deadline.
    async fn bounded<F, O>(&self, fut: F) -> MondoResult<O>
    where
        F: Future<Output = Result<O, mongodb::error::Error>>,
    {
        bounded(self.timeout, fut).await
    }
}

/// Run a driver call under an optional client-side deadline.
///
/// On timeout the server may or may not have applied the operation;
/// nothing is assumed rolled back.
pub(crate) async fn bounded<F, O>(limit: Option<Duration>, fut: F) -> MondoResult<O>
where
    F: Future<Output = Result<O, mongodb::error::Error>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => result.map_err(MondoError::from),
            Err(_) => Err(MondoError::Timeout(
                u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
            )),
        },
        None => fut.await.map_err(MondoError::from),
    }
}

impl<T> MondoCollection<T>
where
    T: Serialize + DeserializeOwned + Unpin + Send + Sync,
{
    /// Insert a single document.
    ///
    /// The driver assigns an ObjectId `_id` when the document carries
    /// none; the assigned identifier is returned. A duplicate `_id`
    /// fails with a write-class error (`is_duplicate_key`).
    pub async fn insert_one(&self, document: T) -> MondoResult<InsertOneOutcome> {
        let result = self.bounded(self.inner.insert_one(&document, None)).await?;
        debug!(collection = self.inner.name(), "inserted one document");
        Ok(result.into())
    }

    /// Insert a batch of documents, stopping at the first failure.
    ///
    /// Returns one assigned identifier per input position.
    pub async fn insert_many(&self, documents: Vec<T>) -> MondoResult<InsertManyOutcome> {
        let count = documents.len();
        let result = self.bounded(self.inner.insert_many(&documents, None)).await?;
        debug!(collection = self.inner.name(), count, "inserted documents");
        Ok(result.into())
    }

    /// Insert a batch of documents, continuing past individual failures.
    pub async fn insert_many_unordered(&self, documents: Vec<T>) -> MondoResult<InsertManyOutcome> {
        let count = documents.len();
        let options = InsertManyOptions::builder().ordered(false).build();
        let result = self
            .bounded(self.inner.insert_many(&documents, options))
            .await?;
        debug!(
            collection = self.inner.name(),
            count, "inserted documents (unordered)"
        );
        Ok(result.into())
    }

    /// Find all documents matching a filter, as a lazy cursor.
    ///
    /// The stream is server-paginated and finite. The server-side
    /// cursor is released when the stream is exhausted or dropped,
    /// early termination included. Resuming mid-stream is not
    /// supported; re-issue the filter instead.
    pub async fn find(&self, filter: impl Into<Option<Document>>) -> MondoResult<MondoCursor<T>> {
        let cursor = self.bounded(self.inner.find(filter, None)).await?;
        Ok(MondoCursor { inner: cursor })
    }

    /// Find the first document matching a filter.
    ///
    /// Absence is `Ok(None)`, never an error.
    pub async fn find_one(&self, filter: impl Into<Option<Document>>) -> MondoResult<Option<T>> {
        self.bounded(self.inner.find_one(filter, None)).await
    }

    /// Apply an update specification to the first matching document.
    ///
    /// The match order is server-defined. No match is a zero-count
    /// success.
    pub async fn update_one(
        &self,
        filter: Document,
        update: Document,
    ) -> MondoResult<UpdateOutcome> {
        let result = self
            .bounded(self.inner.update_one(filter, update, None))
            .await?;
        let outcome = UpdateOutcome::from(result);
        debug!(
            collection = self.inner.name(),
            matched = outcome.matched,
            modified = outcome.modified,
            "updated one document"
        );
        Ok(outcome)
    }

    /// Apply an update specification to every matching document.
    ///
    /// Atomic per document, not across the set as a whole.
    pub async fn update_many(
        &self,
        filter: Document,
        update: Document,
    ) -> MondoResult<UpdateOutcome> {
        let result = self
            .bounded(self.inner.update_many(filter, update, None))
            .await?;
        let outcome = UpdateOutcome::from(result);
        debug!(
            collection = self.inner.name(),
            matched = outcome.matched,
            modified = outcome.modified,
            "updated documents"
        );
        Ok(outcome)
    }

    /// Remove the first document matching a filter.
    pub async fn delete_one(&self, filter: Document) -> MondoResult<DeleteOutcome> {
        let result = self.bounded(self.inner.delete_one(filter, None)).await?;
        let outcome = DeleteOutcome::from(result);
        debug!(
            collection = self.inner.name(),
            deleted = outcome.deleted,
            "deleted one document"
        );
        Ok(outcome)
    }

    /// Remove every document matching a filter. Zero matches is success.
    pub async fn delete_many(&self, filter: Document) -> MondoResult<DeleteOutcome> {
        let result = self.bounded(self.inner.delete_many(filter, None)).await?;
        let outcome = DeleteOutcome::from(result);
        debug!(
            collection = self.inner.name(),
            deleted = outcome.deleted,
            "deleted documents"
        );
        Ok(outcome)
    }

    /// Count the documents matching a filter.
    pub async fn count(&self, filter: impl Into<Option<Document>>) -> MondoResult<u64> {
        self.bounded(self.inner.count_documents(filter, None)).await
    }
}

/// A lazy, server-paginated sequence of documents.
///
/// Implements [`Stream`]; dropping it releases the server-side cursor
/// (driver `Drop` sends a kill-cursor), so breaking out of iteration
/// early leaks nothing.
#[derive(Debug)]
pub struct MondoCursor<T> {
    inner: mongodb::Cursor<T>,
}

impl<T> MondoCursor<T>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    /// The next document, or `None` once exhausted.
    pub async fn next(&mut self) -> Option<MondoResult<T>> {
        StreamExt::next(&mut self.inner)
            .await
            .map(|item| item.map_err(MondoError::from))
    }

    /// Drain the cursor into a vector.
    pub async fn to_vec(self) -> MondoResult<Vec<T>> {
        self.inner.try_collect().await.map_err(MondoError::from)
    }
}

impl<T> Stream for MondoCursor<T>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    type Item = MondoResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().inner)
            .poll_next(cx)
            .map(|item| item.map(|r| r.map_err(MondoError::from)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bounded_times_out_hung_calls() {
        let result: MondoResult<()> =
            bounded(Some(Duration::from_millis(5)), futures::future::pending()).await;

        let err = result.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "operation timed out after 5ms");
    }

    #[tokio::test]
    async fn test_bounded_passes_results_through() {
        let result = bounded(None, async { Ok::<_, mongodb::error::Error>(7) }).await;
        assert_eq!(result.unwrap(), 7);

        let result = bounded(
            Some(Duration::from_secs(1)),
            async { Ok::<_, mongodb::error::Error>("fast enough") },
        )
        .await;
        assert_eq!(result.unwrap(), "fast enough");
    }
}
