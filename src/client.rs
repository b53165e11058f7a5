//! Client wrapper with driver-managed connection pooling.

use std::sync::Arc;

use bson::{Document, doc};
use mongodb::{Client, Database};
use tracing::{debug, info};

use crate::collection::MondoCollection;
use crate::config::ClientConfig;
use crate::error::{MondoError, MondoResult};
use crate::session::MondoSession;

/// A document-store client scoped to one logical database.
///
/// The driver pools connections internally; all collection handles and
/// clones of this client share that pool, and dropping the last clone
/// releases it. Cloning is cheap.
#[derive(Clone)]
pub struct MondoClient {
    client: Client,
    database: Database,
    config: Arc<ClientConfig>,
}

impl MondoClient {
    /// Create a client from configuration.
    pub async fn new(config: ClientConfig) -> MondoResult<Self> {
        if config.database.is_empty() {
            return Err(MondoError::config("database name is required"));
        }

        let options = config.to_client_options().await?;

        let client = Client::with_options(options)
            .map_err(|e| MondoError::connection(format!("failed to create client: {}", e)))?;

        let database = client.database(&config.database);

        info!(
            uri = %config.uri,
            database = %config.database,
            "document-store client created"
        );

        Ok(Self {
            client,
            database,
            config: Arc::new(config),
        })
    }

    /// Connect with defaults: just a URI and a database name.
    ///
    /// A malformed URI fails here; an unreachable host surfaces on the
    /// first operation (or on [`ping`](Self::ping)), since the driver
    /// connects lazily.
    pub async fn connect(
        uri: impl Into<String>,
        database: impl Into<String>,
    ) -> MondoResult<Self> {
        Self::new(ClientConfig::from_uri(uri, database)).await
    }

    /// Create a builder for the client.
    pub fn builder() -> MondoClientBuilder {
        MondoClientBuilder::new()
    }

    /// Get a typed collection handle.
    pub fn collection<T>(&self, name: &str) -> MondoCollection<T>
    where
        T: Send + Sync,
    {
        MondoCollection::new(self.database.collection(name), self.config.operation_timeout)
    }

    /// Get a collection handle over raw BSON documents.
    pub fn collection_doc(&self, name: &str) -> MondoCollection<Document> {
        self.collection(name)
    }

    /// The selected database.
    pub fn database(&self) -> &Database {
        &self.database
    }

    /// The client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Check connectivity by pinging the server.
    pub async fn ping(&self) -> MondoResult<()> {
        self.database
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(MondoError::from)?;
        Ok(())
    }

    /// List all collection names in the database.
    pub async fn list_collections(&self) -> MondoResult<Vec<String>> {
        let names = self
            .database
            .list_collection_names(None)
            .await
            .map_err(MondoError::from)?;
        Ok(names)
    }

    /// Drop a collection.
    pub async fn drop_collection(&self, name: &str) -> MondoResult<()> {
        debug!(collection = %name, "dropping collection");
        self.database
            .collection::<Document>(name)
            .drop(None)
            .await
            .map_err(MondoError::from)?;
        Ok(())
    }

    /// Start a session for transactional work.
    ///
    /// The session owns its server-side transaction context; use one
    /// session per concurrent transaction. Operations issued through
    /// the session honor the client's operation timeout.
    pub async fn start_session(&self) -> MondoResult<MondoSession> {
        let session = self
            .client
            .start_session(None)
            .await
            .map_err(MondoError::from)?;
        Ok(MondoSession::new(
            session,
            self.database.clone(),
            self.config.operation_timeout,
        ))
    }
}

/// Builder for [`MondoClient`].
#[derive(Debug, Default)]
pub struct MondoClientBuilder {
    uri: Option<String>,
    database: Option<String>,
    app_name: Option<String>,
    max_pool_size: Option<u32>,
    min_pool_size: Option<u32>,
    connect_timeout: Option<std::time::Duration>,
    operation_timeout: Option<std::time::Duration>,
    retry_writes: Option<bool>,
    direct_connection: Option<bool>,
}

impl MondoClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection URI.
    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the database name.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    /// Set the maximum pool size.
    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = Some(size);
        self
    }

    /// Set the minimum pool size.
    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.min_pool_size = Some(size);
        self
    }

    /// Set the connection timeout.
    pub fn connect_timeout(mut self, duration: std::time::Duration) -> Self {
        self.connect_timeout = Some(duration);
        self
    }

    /// Set the client-side per-operation deadline.
    pub fn operation_timeout(mut self, duration: std::time::Duration) -> Self {
        self.operation_timeout = Some(duration);
        self
    }

    /// Enable or disable the driver's single write retry.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = Some(enabled);
        self
    }

    /// Enable direct connection (bypass replica set discovery).
    pub fn direct_connection(mut self, enabled: bool) -> Self {
        self.direct_connection = Some(enabled);
        self
    }

    /// Build the client.
    pub async fn build(self) -> MondoResult<MondoClient> {
        let mut config_builder = ClientConfig::builder();

        if let Some(uri) = self.uri {
            config_builder = config_builder.uri(uri);
        }

        if let Some(database) = self.database {
            config_builder = config_builder.database(database);
        }

        if let Some(app_name) = self.app_name {
            config_builder = config_builder.app_name(app_name);
        }

        if let Some(max_pool) = self.max_pool_size {
            config_builder = config_builder.max_pool_size(max_pool);
        }

        if let Some(min_pool) = self.min_pool_size {
            config_builder = config_builder.min_pool_size(min_pool);
        }

        if let Some(timeout) = self.connect_timeout {
            config_builder = config_builder.connect_timeout(timeout);
        }

        if let Some(timeout) = self.operation_timeout {
            config_builder = config_builder.operation_timeout(timeout);
        }

        if let Some(retry) = self.retry_writes {
            config_builder = config_builder.retry_writes(retry);
        }

        if let Some(direct) = self.direct_connection {
            config_builder = config_builder.direct_connection(direct);
        }

        let config = config_builder.build()?;
        MondoClient::new(config).await
    }
}
