//! Storage failures surface as `StoreUnavailable` and never as absence.

mod common;

use std::sync::Arc;

use common::{admit, open_registry, party, FailingStore, START};
use starling::core::SignatureStatus;
use starling::store::Namespace;
use starling::{ManualClock, Registry, StarlingError, SubmitOutcome};

async fn failing_registry() -> anyhow::Result<(Arc<FailingStore>, Registry<Arc<FailingStore>>)> {
    let store = Arc::new(FailingStore::new());
    let clock = Arc::new(ManualClock::new(START));
    let registry = open_registry(store.clone(), clock).await?;
    Ok((store, registry))
}

#[tokio::test]
async fn append_reports_unavailable_store() -> anyhow::Result<()> {
    let (store, registry) = failing_registry().await?;
    registry.blocks().append("one").await?;

    store.break_writes(Namespace::Ledger);
    let result = registry.blocks().append("two").await;
    assert!(matches!(result, Err(StarlingError::StoreUnavailable(_))));
    assert_eq!(registry.get_height().await?, Some(1));

    store.repair(Namespace::Ledger);
    let record = registry.blocks().append("two").await?;
    assert_eq!(record.height, 2);
    assert!(registry.validate_chain().await?.valid);
    Ok(())
}

#[tokio::test]
async fn request_admission_propagates_failed_write() -> anyhow::Result<()> {
    let (store, registry) = failing_registry().await?;
    let identity = party(1).identity();

    store.break_writes(Namespace::Pool);
    assert!(matches!(
        registry.request_admission(&identity).await,
        Err(StarlingError::StoreUnavailable(_))
    ));
    assert!(registry.get_admission(&identity).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn validate_signature_propagates_failed_write() -> anyhow::Result<()> {
    let (store, registry) = failing_registry().await?;
    let keypair = party(2);
    let identity = keypair.identity();

    let ticket = registry.request_admission(&identity).await?;
    let signature = keypair.sign_challenge(ticket.challenge());

    store.break_writes(Namespace::Pool);
    assert!(matches!(
        registry.validate_signature(&identity, &signature).await,
        Err(StarlingError::StoreUnavailable(_))
    ));

    let stored = registry.get_admission(&identity).await?.expect("entry kept");
    assert_eq!(stored.status(), SignatureStatus::Unset);
    assert_eq!(
        registry.submit(&identity, "not yet").await?,
        SubmitOutcome::Rejected
    );
    Ok(())
}

#[tokio::test]
async fn failed_append_loses_the_admission() -> anyhow::Result<()> {
    let (store, registry) = failing_registry().await?;
    let keypair = party(3);
    let identity = keypair.identity();
    admit(&registry, &keypair).await?;

    store.break_writes(Namespace::Ledger);
    assert!(matches!(
        registry.submit(&identity, "star").await,
        Err(StarlingError::StoreUnavailable(_))
    ));
    store.repair(Namespace::Ledger);

    // The entry was consumed before the append failed.
    assert!(registry.get_admission(&identity).await?.is_none());
    assert_eq!(
        registry.submit(&identity, "star").await?,
        SubmitOutcome::Rejected
    );
    assert_eq!(registry.get_height().await?, Some(0));

    // A fresh request and signature cycle admits again.
    admit(&registry, &keypair).await?;
    assert!(registry.submit(&identity, "star").await?.is_admitted());
    Ok(())
}
