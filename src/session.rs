//! Sessions and multi-document transactions.
//!
//! A session owns one logical server-side transaction context at a
//! time. All session methods take `&mut self`, so one session can never
//! be driven from two tasks at once.

use std::time::{Duration, Instant};

use bson::Document;
use futures::future::BoxFuture;

use mongodb::error::UNKNOWN_TRANSACTION_COMMIT_RESULT;
use mongodb::{ClientSession, Database};
use tracing::{debug, warn};

use crate::collection::bounded;
use crate::error::{MondoError, MondoResult};
use crate::types::{DeleteOutcome, InsertOneOutcome, UpdateOutcome};

/// Overall deadline for the transaction retry loop (driver convention).
const TXN_RETRY_LIMIT: Duration = Duration::from_secs(120);

/// Transaction lifecycle of a session.
///
/// `Committed` and `Aborted` are terminal for one transaction; the
/// session itself may start another afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxnState {
    /// No transaction open.
    Idle,
    /// A transaction is open; its writes are invisible to other
    /// sessions until commit.
    InProgress,
    /// The last transaction committed.
    Committed,
    /// The last transaction aborted; none of its writes survived.
    Aborted,
}

/// A client session with transaction support.
///
/// Obtained from [`MondoClient::start_session`](crate::MondoClient::start_session).
/// Operations issued through the session while a transaction is open
/// join that transaction.
pub struct MondoSession {
    inner: ClientSession,
    database: Database,
    timeout: Option<Duration>,
    state: TxnState,
}

impl MondoSession {
    pub(crate) fn new(
        inner: ClientSession,
        database: Database,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            inner,
            database,
            timeout,
            state: TxnState::Idle,
        }
    }

    /// The transaction state of this session.
    pub fn state(&self) -> TxnState {
        self.state
    }

    /// Insert a single document through this session.
    pub async fn insert_one(
        &mut self,
        collection: &str,
        document: Document,
    ) -> MondoResult<InsertOneOutcome> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let result = bounded(
            limit,
            coll.insert_one_with_session(document, None, &mut self.inner),
        )
        .await?;
        Ok(result.into())
    }

    /// Find the first matching document through this session.
    pub async fn find_one(
        &mut self,
        collection: &str,
        filter: Document,
    ) -> MondoResult<Option<Document>> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let found = bounded(
            limit,
            coll.find_one_with_session(filter, None, &mut self.inner),
        )
        .await?;
        Ok(found)
    }

    /// Apply an update to the first matching document through this session.
    pub async fn update_one(
        &mut self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> MondoResult<UpdateOutcome> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let result = bounded(
            limit,
            coll.update_one_with_session(filter, update, None, &mut self.inner),
        )
        .await?;
        Ok(result.into())
    }

    /// Apply an update to every matching document through this session.
    pub async fn update_many(
        &mut self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> MondoResult<UpdateOutcome> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let result = bounded(
            limit,
            coll.update_many_with_session(filter, update, None, &mut self.inner),
        )
        .await?;
        Ok(result.into())
    }

    /// Remove the first matching document through this session.
    pub async fn delete_one(
        &mut self,
        collection: &str,
        filter: Document,
    ) -> MondoResult<DeleteOutcome> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let result = bounded(
            limit,
            coll.delete_one_with_session(filter, None, &mut self.inner),
        )
        .await?;
        Ok(result.into())
    }

    /// Remove every matching document through this session.
    pub async fn delete_many(
        &mut self,
        collection: &str,
        filter: Document,
    ) -> MondoResult<DeleteOutcome> {
        let limit = self.timeout;
        let coll = self.database.collection::<Document>(collection);
        let result = bounded(
            limit,
            coll.delete_many_with_session(filter, None, &mut self.inner),
        )
        .await?;
        Ok(result.into())
    }

    /// Run a sequence of operations as one transaction.
    ///
    /// Starts a transaction, runs `op`, commits when it returns `Ok`,
    /// aborts when it returns `Err`. Transient transaction errors
    /// restart the whole body and unknown commit results retry the
    /// commit, both bounded by an overall 120-second deadline. This
    /// loop is the only transaction-level implicit retry in the crate;
    /// `op` must therefore be safe to run more than once.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use futures::future::BoxFuture;
    /// use mondo::{MondoResult, MondoSession, FilterBuilder, UpdateBuilder};
    ///
    /// fn transfer(session: &mut MondoSession) -> BoxFuture<'_, MondoResult<()>> {
    ///     Box::pin(async move {
    ///         session.update_one(
    ///             "accounts",
    ///             FilterBuilder::new().eq("account_id", "MDB310054629").build(),
    ///             UpdateBuilder::new().inc("balance", -200).build(),
    ///         ).await?;
    ///         session.update_one(
    ///             "accounts",
    ///             FilterBuilder::new().eq("account_id", "MDB643731035").build(),
    ///             UpdateBuilder::new().inc("balance", 200).build(),
    ///         ).await?;
    ///         Ok(())
    ///     })
    /// }
    ///
    /// let mut session = client.start_session().await?;
    /// session.with_transaction(transfer).await?;
    /// ```
    pub async fn with_transaction<T, F>(&mut self, mut op: F) -> MondoResult<T>
    where
        F: for<'a> FnMut(&'a mut MondoSession) -> BoxFuture<'a, MondoResult<T>>,
    {
        let started = Instant::now();
        loop {
            self.begin().await?;

            match op(self).await {
                Ok(value) => match self.commit(started).await {
                    Ok(()) => return Ok(value),
                    Err(err)
                        if err.is_transient_transaction()
                            && started.elapsed() < TXN_RETRY_LIMIT =>
                    {
                        warn!("transient error at commit, restarting transaction");
                        continue;
                    }
                    Err(err) => {
                        return Err(MondoError::transaction("commit failed", err));
                    }
                },
                Err(err) => {
                    self.abort().await;
                    if err.is_transient_transaction() && started.elapsed() < TXN_RETRY_LIMIT {
                        warn!("transient error in transaction body, restarting transaction");
                        continue;
                    }
                    return Err(MondoError::transaction("transaction body failed", err));
                }
            }
        }
    }

    async fn begin(&mut self) -> MondoResult<()> {
        self.inner.start_transaction(None).await?;
        self.state = TxnState::InProgress;
        debug!("transaction started");
        Ok(())
    }

    async fn commit(&mut self, started: Instant) -> MondoResult<()> {
        loop {
            match self.inner.commit_transaction().await {
                Ok(()) => {
                    self.state = TxnState::Committed;
                    debug!("transaction committed");
                    return Ok(());
                }
                Err(err)
                    if err.contains_label(UNKNOWN_TRANSACTION_COMMIT_RESULT)
                        && started.elapsed() < TXN_RETRY_LIMIT =>
                {
                    debug!("unknown commit result, retrying commit");
                    continue;
                }
                Err(err) => {
                    self.state = TxnState::Aborted;
                    return Err(err.into());
                }
            }
        }
    }

    async fn abort(&mut self) {
        // Best effort: the server reaps abandoned transactions anyway.
        if let Err(err) = self.inner.abort_transaction().await {
            debug!(error = %err, "abort_transaction failed");
        }
        self.state = TxnState::Aborted;
        debug!("transaction aborted");
    }
}
