//! CRUD and transaction integration tests.
//!
//! These run against a live server and are ignored by default. Point
//! `MONDO_TEST_URI` at a MongoDB instance (a replica set for the
//! transaction tests) and run with `cargo test -- --ignored`.

use std::time::Duration;

use futures::future::BoxFuture;
use mondo::prelude::*;
use pretty_assertions::assert_eq;

fn test_uri() -> String {
    std::env::var("MONDO_TEST_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}

async fn client() -> MondoClient {
    MondoClient::connect(test_uri(), "mondo_it")
        .await
        .expect("connect")
}

fn account(holder: &str, id: &str, balance: i32, kind: &str) -> Document {
    doc! {
        "account_holder": holder,
        "account_id": id,
        "balance": balance,
        "account_type": kind,
    }
}

async fn seed_accounts(client: &MondoClient, collection: &str) -> MondoCollection<Document> {
    let accounts = client.collection_doc(collection);
    client.drop_collection(collection).await.expect("drop");
    accounts
        .insert_many(vec![
            account("john doe", "MDB99115881", 1785, "checking"),
            account("jane doe", "MDB79101843", 1468, "checking"),
            account("mary doe", "MDB643731035", 900, "checking"),
            account("rich doe", "MDB310054629", 2500, "savings"),
        ])
        .await
        .expect("seed");
    accounts
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn insert_one_assigns_stable_object_id() {
    let client = client().await;
    let inspections = client.collection_doc("inspections");
    client.drop_collection("inspections").await.unwrap();

    let inspection = doc! {
        "id": "10021-2015-ENFO",
        "certificate_number": 9278806,
        "business_name": "ATLIXCO DELI GROCERY INC.",
        "result": "No Violation Issued",
        "sector": "Cigarette Retail Dealer - 127",
        "address": { "city": "RIDGEWOOD", "zip": 11385, "street": "MENAHAN ST", "number": 1712 },
    };

    let outcome = inspections.insert_one(inspection.clone()).await.unwrap();
    let id = outcome.object_id().expect("driver-assigned ObjectId");

    // The assigned id is stable on subsequent reads.
    let found = inspections
        .find_one(mondo::filter::by_id(id))
        .await
        .unwrap()
        .expect("document present");
    assert_eq!(found.id().unwrap(), id);

    // Round-trip: every original field reads back unchanged.
    for (key, value) in &inspection {
        assert_eq!(found.get(key), Some(value), "field {key}");
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn insert_many_returns_one_id_per_position() {
    let client = client().await;
    let accounts = client.collection_doc("accounts_batch");
    client.drop_collection("accounts_batch").await.unwrap();

    let outcome = accounts
        .insert_many(vec![
            account("john doe", "MDB99115881", 1785, "checking"),
            account("jane doe", "MDB79101843", 1468, "checking"),
        ])
        .await
        .unwrap();

    assert_eq!(outcome.len(), 2);
    let first = outcome.object_id(0).expect("id at position 0");
    let second = outcome.object_id(1).expect("id at position 1");
    assert_ne!(first, second);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn find_applies_compound_filter() {
    let client = client().await;
    let accounts = seed_accounts(&client, "accounts_find").await;

    let filter = FilterBuilder::new()
        .eq("account_type", "checking")
        .gte("balance", 1000)
        .build();

    let matching = accounts
        .find(filter.clone())
        .await
        .unwrap()
        .to_vec()
        .await
        .unwrap();

    assert_eq!(matching.len(), 2);
    for doc in &matching {
        assert_eq!(doc.field_str("account_type").unwrap(), "checking");
        assert!(doc.field_i32("balance").unwrap() >= 1000);
    }

    // find_one returns the first such document.
    let first = accounts.find_one(filter).await.unwrap();
    assert!(first.is_some());

    // Absence is a value, not an error.
    let none = accounts
        .find_one(FilterBuilder::new().eq("account_type", "brokerage").build())
        .await
        .unwrap();
    assert_eq!(none, None);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn cursor_early_termination_is_clean() {
    let client = client().await;
    let accounts = seed_accounts(&client, "accounts_cursor").await;

    let mut cursor = accounts.find(None).await.unwrap();
    let first = cursor.next().await.expect("at least one document").unwrap();
    assert!(first.id().is_ok());
    // Dropping mid-iteration releases the server-side cursor.
    drop(cursor);

    // The collection is still fully readable afterwards.
    assert_eq!(accounts.count(None).await.unwrap(), 4);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn update_one_touches_exactly_one_document() {
    let client = client().await;
    let accounts = seed_accounts(&client, "accounts_upd1").await;

    let outcome = accounts
        .update_one(
            FilterBuilder::new().eq("account_id", "MDB79101843").build(),
            UpdateBuilder::new()
                .set("account_status", "active")
                .inc("balance", 100)
                .build(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.matched, 1);
    assert!(outcome.modified <= outcome.matched);

    let updated = accounts
        .find_one(FilterBuilder::new().eq("account_id", "MDB79101843").build())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.field_str("account_status").unwrap(), "active");
    assert_eq!(updated.field_i32("balance").unwrap(), 1568);

    // Other documents are untouched.
    let other = accounts
        .find_one(FilterBuilder::new().eq("account_id", "MDB99115881").build())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(other.field_i32("balance").unwrap(), 1785);
    assert_eq!(other.field_str_opt("account_status"), None);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn update_many_touches_every_match() {
    let client = client().await;
    let accounts = seed_accounts(&client, "accounts_updn").await;

    let outcome = accounts
        .update_many(
            FilterBuilder::new().eq("account_type", "checking").build(),
            mondo::update::set("minimum_balance", 100),
        )
        .await
        .unwrap();

    assert_eq!(outcome.matched, 3);
    assert_eq!(outcome.modified, 3);

    let savings = accounts
        .find_one(FilterBuilder::new().eq("account_type", "savings").build())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(savings.field_i32_opt("minimum_balance"), None);
}

#[tokio::test]
#[ignore = "requires a running MongoDB"]
async fn delete_counts_matches_and_zero_is_success() {
    let client = client().await;
    let accounts = seed_accounts(&client, "accounts_del").await;

    let outcome = accounts
        .delete_one(FilterBuilder::new().eq("account_holder", "john doe").build())
        .await
        .unwrap();
    assert_eq!(outcome.deleted, 1);

    let outcome = accounts
        .delete_many(FilterBuilder::new().eq("account_type", "checking").build())
        .await
        .unwrap();
    assert_eq!(outcome.deleted, 2);

    // No match is a zero-count success, not an error.
    let outcome = accounts
        .delete_many(FilterBuilder::new().eq("state", "TN").build())
        .await
        .unwrap();
    assert_eq!(outcome.deleted, 0);
}

// The driver connects lazily, so this needs no server at all. The host
// is unroutable and server selection would block for its full 30s
// default; the operation deadline has to cut the call off first.
#[tokio::test]
async fn operation_deadline_fires_before_server_selection() {
    let client = MondoClient::connect("mongodb://10.255.255.1:27017", "mondo_it")
        .await
        .expect("parsing a well-formed URI needs no server");
    let accounts = client
        .collection_doc("accounts")
        .with_timeout(Duration::from_millis(5));

    let err = accounts.find(None).await.unwrap_err();
    assert!(err.is_timeout());
    assert_eq!(err.to_string(), "operation timed out after 5ms");
}

const TX_COLLECTION: &str = "accounts_tx";
const FROM_ACCOUNT: &str = "MDB310054629";
const TO_ACCOUNT: &str = "MDB643731035";

fn transfer(session: &mut MondoSession) -> BoxFuture<'_, MondoResult<()>> {
    Box::pin(async move {
        session
            .update_one(
                TX_COLLECTION,
                FilterBuilder::new().eq("account_id", FROM_ACCOUNT).build(),
                UpdateBuilder::new().inc("balance", -200).build(),
            )
            .await?;
        session
            .update_one(
                TX_COLLECTION,
                FilterBuilder::new().eq("account_id", TO_ACCOUNT).build(),
                UpdateBuilder::new().inc("balance", 200).build(),
            )
            .await?;
        Ok(())
    })
}

fn failing_transfer(session: &mut MondoSession) -> BoxFuture<'_, MondoResult<()>> {
    Box::pin(async move {
        session
            .update_one(
                TX_COLLECTION,
                FilterBuilder::new().eq("account_id", FROM_ACCOUNT).build(),
                UpdateBuilder::new().inc("balance", -200).build(),
            )
            .await?;
        Err(MondoError::serialization("simulated mid-transaction failure"))
    })
}

async fn balances(accounts: &MondoCollection<Document>) -> (i32, i32) {
    let from = accounts
        .find_one(FilterBuilder::new().eq("account_id", FROM_ACCOUNT).build())
        .await
        .unwrap()
        .unwrap();
    let to = accounts
        .find_one(FilterBuilder::new().eq("account_id", TO_ACCOUNT).build())
        .await
        .unwrap()
        .unwrap();
    (
        from.field_i32("balance").unwrap(),
        to.field_i32("balance").unwrap(),
    )
}

#[tokio::test]
#[ignore = "requires a MongoDB replica set"]
async fn committed_transfer_preserves_balance_sum() {
    let client = client().await;
    let accounts = seed_accounts(&client, TX_COLLECTION).await;
    let (from_before, to_before) = balances(&accounts).await;

    let mut session = client.start_session().await.unwrap();
    session.with_transaction(transfer).await.unwrap();
    assert_eq!(session.state(), TxnState::Committed);

    let (from_after, to_after) = balances(&accounts).await;
    assert_eq!(from_after, from_before - 200);
    assert_eq!(to_after, to_before + 200);
    assert_eq!(from_after + to_after, from_before + to_before);
}

#[tokio::test]
#[ignore = "requires a MongoDB replica set"]
async fn aborted_transfer_leaves_no_trace() {
    let client = client().await;
    let accounts = seed_accounts(&client, TX_COLLECTION).await;
    let (from_before, to_before) = balances(&accounts).await;

    let mut session = client.start_session().await.unwrap();
    let err = session.with_transaction(failing_transfer).await.unwrap_err();
    assert!(matches!(err, MondoError::Transaction { .. }));
    assert_eq!(session.state(), TxnState::Aborted);

    // The withdrawal inside the aborted transaction is invisible.
    let (from_after, to_after) = balances(&accounts).await;
    assert_eq!(from_after, from_before);
    assert_eq!(to_after, to_before);
}
