//! End-to-end scenarios built on the fixtures.

use std::time::Duration;

use proptest::prelude::*;
use starling::{SignatureStatus, StarlingError, SubmitOutcome};
use starling_store::{KvStore, Namespace};
use starling_testkit::{multi_party_fixtures, TestFixture, FIXTURE_START};

#[tokio::test]
async fn audit_reports_every_tampered_height() -> anyhow::Result<()> {
    let fixture = TestFixture::with_seed([1u8; 32]);
    let registry = fixture.registry().await?;
    fixture.append_many(&registry, 9).await?;

    fixture
        .tamper(2, |r| r.body = "induced chain error".into())
        .await?;
    fixture.tamper_hash(6).await?;
    fixture.corrupt(9).await?;

    let report = registry.validate_chain().await?;
    assert!(!report.valid);
    assert_eq!(report.failing_heights, vec![2, 6, 7, 9]);

    assert!(!registry.validate_record(2).await?);
    assert!(!registry.validate_record(9).await?);
    assert!(matches!(
        registry.validate_record(10).await,
        Err(StarlingError::RecordNotFound(10))
    ));

    // The unreadable tip stops the write path.
    assert!(matches!(
        registry.blocks().append("after corruption").await,
        Err(StarlingError::ChainCorruption { height: 9, .. })
    ));
    Ok(())
}

#[tokio::test]
async fn restart_keeps_ledger_and_sweeps_pool() -> anyhow::Result<()> {
    let fixture = TestFixture::with_seed([2u8; 32]);

    let genesis = {
        let registry = fixture.registry().await?;
        fixture.admit(&registry).await?;
        registry.request_admission("pending").await?;
        registry.get_block(0).await?.expect("genesis")
    };

    fixture.clock.advance(300);
    let registry = fixture.registry().await?;

    assert_eq!(registry.get_block(0).await?, Some(genesis));
    assert!(fixture.store.scan(Namespace::Pool).await?.is_empty());
    assert_eq!(
        registry.submit(&fixture.identity(), "too late").await?,
        SubmitOutcome::Rejected
    );
    Ok(())
}

#[tokio::test]
async fn parties_submit_independently() -> anyhow::Result<()> {
    let parties = multi_party_fixtures(4);
    let host = &parties[0];
    let registry = host.registry().await?;

    for party in &parties {
        let ticket = registry.request_admission(&party.identity()).await?;
        let signature = party.sign(ticket.challenge());
        registry
            .validate_signature(&party.identity(), &signature)
            .await?;
    }

    // Submit in reverse order; heights follow submission order.
    for (i, party) in parties.iter().rev().enumerate() {
        let outcome = registry
            .submit(&party.identity(), format!("star from party {}", i))
            .await?;
        assert_eq!(outcome.record().map(|r| r.height), Some(i as u64 + 1));
    }

    for party in &parties {
        let mine = registry.get_blocks_by_identity(&party.identity()).await?;
        assert_eq!(mine.len(), 1);
    }
    assert!(registry.validate_chain().await?.valid);
    Ok(())
}

#[tokio::test]
async fn foreign_signature_then_retry() -> anyhow::Result<()> {
    let fixture = TestFixture::with_seed([3u8; 32]);
    let registry = fixture.registry().await?;
    let identity = fixture.identity();

    let ticket = registry.request_admission(&identity).await?;
    let forged = fixture.foreign_signature(ticket.challenge());
    let checked = registry.validate_signature(&identity, &forged).await?;
    assert_eq!(checked.map(|t| t.status()), Some(SignatureStatus::Invalid));
    assert_eq!(
        registry.submit(&identity, "rejected").await?,
        SubmitOutcome::Rejected
    );

    fixture.clock.advance(30);
    let signature = fixture.sign(ticket.challenge());
    let checked = registry.validate_signature(&identity, &signature).await?;
    assert_eq!(checked.map(|t| t.remaining_secs), Some(270));
    assert!(registry.submit(&identity, "accepted").await?.is_admitted());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn timers_clear_entries_without_reads() -> anyhow::Result<()> {
    let fixture = TestFixture::with_seed([4u8; 32]).with_timers();
    let registry = fixture.registry().await?;

    registry.request_admission("a").await?;
    tokio::time::sleep(Duration::from_secs(100)).await;
    fixture.clock.advance(100);
    registry.request_admission("b").await?;

    tokio::time::sleep(Duration::from_secs(201)).await;
    let keys: Vec<Vec<u8>> = fixture
        .store
        .scan(Namespace::Pool)
        .await?
        .into_iter()
        .map(|(k, _)| k)
        .collect();
    assert_eq!(keys, vec![b"b".to_vec()]);

    tokio::time::sleep(Duration::from_secs(100)).await;
    assert!(fixture.store.scan(Namespace::Pool).await?.is_empty());
    assert_eq!(registry.pool().pending_timers(), 0);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn tampering_any_height_is_detected(length in 1u64..16, pick in any::<prop::sample::Index>()) {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let target = pick.index(length as usize + 1) as u64;

        let report = rt.block_on(async {
            let fixture = TestFixture::with_seed([5u8; 32]);
            let registry = fixture.registry().await.unwrap();
            fixture.append_many(&registry, length).await.unwrap();
            fixture
                .tamper(target, |r| r.timestamp = FIXTURE_START - 1)
                .await
                .unwrap();
            registry.validate_chain().await.unwrap()
        });

        prop_assert!(!report.valid);
        prop_assert_eq!(report.failing_heights, vec![target]);
    }
}
