//! Contract Test: Reconciling against an empty provider
//!
//! Constraints verified:
//! - A missing hosted zone is created, then populated
//! - N desired record sets produce exactly N create changes
//! - A second run finds nothing to do
//! - A dry run reports the same plan and writes nothing

mod common;

use cirrus_core::reconcile::{PlanSummary, SyncOutcome, Synchronizer};
use cirrus_core::traits::ChangeAction;
use cirrus_core::zone::load_zone;
use common::*;

#[tokio::test]
async fn empty_zone_gets_one_create_per_record_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "example.com.zone", EXAMPLE_ZONE);
    let desired = load_zone("example.com", &path).unwrap();
    let expected = desired.record_sets.len();
    assert_eq!(expected, 4);

    let provider = MockDnsProvider::new();
    let outcome = Synchronizer::new(&provider).sync_zone(&desired).await.unwrap();

    match outcome {
        SyncOutcome::Created {
            zone,
            name_servers,
            summary,
        } => {
            assert_eq!(zone, "example.com.");
            assert!(!name_servers.is_empty());
            assert_eq!(summary.creates, expected);
        }
        other => panic!("expected zone creation, got {:?}", other),
    }

    assert!(provider.has_zone("example.com."));
    assert_eq!(provider.count_changes(ChangeAction::Create), expected);
    assert_eq!(provider.recorded_changes().len(), expected);
}

#[tokio::test]
async fn existing_empty_zone_gets_one_create_per_record_set() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "example.com.zone", EXAMPLE_ZONE);
    let desired = load_zone("example.com", &path).unwrap();

    let provider = MockDnsProvider::new().with_zone("example.com", Vec::new());
    let outcome = Synchronizer::new(&provider).sync_zone(&desired).await.unwrap();

    assert_eq!(
        outcome,
        SyncOutcome::Updated {
            zone: "example.com.".to_string(),
            summary: PlanSummary {
                creates: 4,
                updates: 0,
                deletes: 0
            }
        }
    );
    assert_eq!(provider.count_changes(ChangeAction::Create), 4);
    assert_eq!(provider.count_changes(ChangeAction::Delete), 0);

    // converged: the next run writes nothing
    let writes = provider.write_count();
    let again = Synchronizer::new(&provider).sync_zone(&desired).await.unwrap();
    assert!(matches!(again, SyncOutcome::Unchanged { .. }));
    assert_eq!(provider.write_count(), writes);
}

#[tokio::test]
async fn dry_run_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "example.com.zone", EXAMPLE_ZONE);
    let desired = load_zone("example.com", &path).unwrap();

    let provider = MockDnsProvider::new();
    let sync = Synchronizer::new(&provider).with_dry_run(true);
    let outcomes = sync.sync_all(std::slice::from_ref(&desired)).await.unwrap();

    assert!(matches!(
        &outcomes[0],
        SyncOutcome::Created { summary, .. } if summary.creates == 4
    ));
    assert_eq!(provider.write_count(), 0);
    assert!(!provider.has_zone("example.com."));
}

#[tokio::test]
async fn terminate_removes_records_then_zone() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(dir.path(), "example.com.zone", EXAMPLE_ZONE);
    let desired = load_zone("example.com", &path).unwrap();

    let provider = MockDnsProvider::new();
    let sync = Synchronizer::new(&provider);
    sync.sync_zone(&desired).await.unwrap();

    let shown = sync.show("example.com").await.unwrap().unwrap();
    assert!(shown.contains("www.example.com."));
    assert!(shown.contains("\"Alias Z2FDTNDATAQYW2 d111111abcdef8.cloudfront.net.\""));

    let outcome = sync.terminate("example.com").await.unwrap();
    assert_eq!(
        outcome,
        cirrus_core::TerminateOutcome::Removed {
            zone: "example.com.".to_string(),
            deleted_record_sets: 4
        }
    );
    assert!(!provider.has_zone("example.com."));
    assert_eq!(sync.show("example.com").await.unwrap(), None);
}
