//! # mondo
//!
//! A thin async CRUD and transaction client for MongoDB-compatible
//! document stores.
//!
//! The wire protocol, connection pooling, BSON encoding, and
//! transaction coordination are delegated to the official MongoDB
//! driver. This crate provides:
//! - Scoped connection management (`MondoClient`)
//! - Typed collection handles with outcome types and per-operation
//!   deadlines (`MondoCollection`)
//! - Filter and update-specification builders (`FilterBuilder`,
//!   `UpdateBuilder`)
//! - Typed field access over schema-less documents (`DocumentFields`)
//! - Sessions with a retrying `with_transaction` loop (`MondoSession`)
//!
//! ## Example
//!
//! ```rust,ignore
//! use mondo::{MondoClient, FilterBuilder, UpdateBuilder, doc};
//!
//! #[tokio::main]
//! async fn main() -> mondo::MondoResult<()> {
//!     let client = MondoClient::connect("mongodb://localhost:27017", "bank").await?;
//!     let accounts = client.collection_doc("accounts");
//!
//!     let outcome = accounts.insert_one(doc! {
//!         "account_holder": "jane doe",
//!         "account_id": "MDB79101843",
//!         "balance": 1468,
//!         "account_type": "checking",
//!     }).await?;
//!     println!("inserted {}", outcome.object_id()?);
//!
//!     let filter = FilterBuilder::new()
//!         .eq("account_type", "checking")
//!         .gte("balance", 1000)
//!         .build();
//!     let mut cursor = accounts.find(filter).await?;
//!     while let Some(account) = cursor.next().await {
//!         println!("{:?}", account?);
//!     }
//!
//!     accounts.update_one(
//!         FilterBuilder::new().eq("account_id", "MDB79101843").build(),
//!         UpdateBuilder::new().set("account_status", "active").inc("balance", 100).build(),
//!     ).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod collection;
pub mod config;
pub mod document;
pub mod error;
pub mod filter;
pub mod session;
pub mod types;
pub mod update;

pub use bson::oid::ObjectId;
pub use bson::{Bson, Document, doc};
pub use client::{MondoClient, MondoClientBuilder};
pub use collection::{MondoCollection, MondoCursor};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use document::DocumentFields;
pub use error::{MondoError, MondoResult};
pub use filter::FilterBuilder;
pub use session::{MondoSession, TxnState};
pub use types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};
pub use update::UpdateBuilder;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{MondoClient, MondoClientBuilder};
    pub use crate::collection::{MondoCollection, MondoCursor};
    pub use crate::config::{ClientConfig, ClientConfigBuilder};
    pub use crate::document::DocumentFields;
    pub use crate::error::{MondoError, MondoResult};
    pub use crate::filter::FilterBuilder;
    pub use crate::session::{MondoSession, TxnState};
    pub use crate::types::{DeleteOutcome, InsertManyOutcome, InsertOneOutcome, UpdateOutcome};
    pub use crate::update::UpdateBuilder;
    pub use bson::oid::ObjectId;
    pub use bson::{Bson, Document, doc};
}
