//! ReimbursementService tests over the in-memory store

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{ClaimId, HealthCheckable};
use domain_reimbursement::ports::mock::InMemoryClaimStore;
use domain_reimbursement::{
    workflow, ApprovalStage, ClaimPatch, ClaimStats, ClaimStatus, ClaimStore, DecisionAction,
    ReimbursementService,
};
use test_utils::*;

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_submit_assigns_ids_and_persists() {
        let (service, store) = in_memory_service();
        let employee = PrincipalFixtures::employee();

        let first = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();
        let second = service.submit(&employee, ContentFixtures::hotel()).await.unwrap();

        assert_ne!(first.id(), second.id());
        assert_eq!(store.len().await, 2);
        assert_eq!(store.get_by_id(first.id()).await.unwrap(), first);
    }

    #[tokio::test]
    async fn test_submit_returns_owner_name_from_directory() {
        let (service, store) = in_memory_service();
        store
            .register_employee(PrincipalFixtures::employee_id(), "Alice Employee")
            .await;

        let named = service
            .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
            .await
            .unwrap();
        let unnamed = service
            .submit(&PrincipalFixtures::other_employee(), ContentFixtures::taxi())
            .await
            .unwrap();

        assert_eq!(named.employee_name(), Some("Alice Employee"));
        assert_eq!(unnamed.employee_name(), None);

        let decided = service
            .decide(
                &PrincipalFixtures::manager(),
                named.id(),
                ApprovalStage::Manager,
                DecisionAction::Approve,
                None,
            )
            .await
            .unwrap();
        assert_eq!(decided.employee_name(), Some("Alice Employee"));
    }

    #[tokio::test]
    async fn test_out_of_precision_amounts_never_reach_the_store() {
        let (service, store) = in_memory_service();
        for amount in [dec!(12.345), dec!(0.001), dec!(10000000000000)] {
            let result = service
                .submit(&PrincipalFixtures::employee(), ContentFixtures::with_amount(amount))
                .await;
            assert_validation(&result);
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_edit_persists_patch() {
        let (service, store) = in_memory_service();
        let employee = PrincipalFixtures::employee();
        let claim = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();

        let patch = ClaimPatch {
            amount: Some(dec!(65.50)),
            ..ClaimPatch::default()
        };
        let edited = service.edit(&employee, claim.id(), patch).await.unwrap();

        assert_eq!(edited.content().amount, dec!(65.50));
        assert_eq!(store.get_by_id(claim.id()).await.unwrap(), edited);
    }

    #[tokio::test]
    async fn test_withdraw_removes_pending_claim() {
        let (service, store) = in_memory_service();
        let employee = PrincipalFixtures::employee();
        let claim = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();

        service.withdraw(&employee, claim.id()).await.unwrap();

        assert!(store.is_empty().await);
        assert_not_found(&service.get(&employee, claim.id()).await);
    }

    #[tokio::test]
    async fn test_decided_claim_cannot_be_withdrawn() {
        let (service, store) = in_memory_service();
        let claim = ClaimBuilder::new()
            .with_status(ClaimStatus::RejectedByManager)
            .persist(&service)
            .await
            .unwrap();

        let result = service.withdraw(&PrincipalFixtures::employee(), claim.id()).await;
        assert_invalid_state(&result);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_foreign_withdraw_is_forbidden() {
        let (service, store) = in_memory_service();
        let claim = service
            .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
            .await
            .unwrap();

        let result = service.withdraw(&PrincipalFixtures::other_employee(), claim.id()).await;
        assert_forbidden(&result);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found_everywhere() {
        let (service, _) = in_memory_service();
        let missing = ClaimId::new(99);
        let employee = PrincipalFixtures::employee();

        assert_not_found(&service.get(&employee, missing).await);
        assert_not_found(&service.edit(&employee, missing, ClaimPatch::default()).await);
        assert_not_found(&service.withdraw(&employee, missing).await);
        assert_not_found(
            &service
                .decide(
                    &PrincipalFixtures::manager(),
                    missing,
                    ApprovalStage::Manager,
                    DecisionAction::Approve,
                    None,
                )
                .await,
        );
    }

    #[tokio::test]
    async fn test_refused_decision_leaves_store_untouched() {
        let (service, store) = in_memory_service();
        let claim = service
            .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
            .await
            .unwrap();

        let result = service
            .decide(
                &PrincipalFixtures::finance(),
                claim.id(),
                ApprovalStage::Finance,
                DecisionAction::Approve,
                None,
            )
            .await;

        assert_invalid_state(&result);
        assert_eq!(store.get_by_id(claim.id()).await.unwrap(), claim);
    }
}

mod visibility_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_hides_foreign_claims_from_employees() {
        let (service, _) = in_memory_service();
        let claim = service
            .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
            .await
            .unwrap();

        assert_forbidden(&service.get(&PrincipalFixtures::other_employee(), claim.id()).await);
        assert!(service.get(&PrincipalFixtures::manager(), claim.id()).await.is_ok());
        assert!(service.get(&PrincipalFixtures::finance(), claim.id()).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_is_scoped_and_newest_first() {
        let (service, _) = in_memory_service();
        let employee = PrincipalFixtures::employee();
        let older = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();
        let newer = service.submit(&employee, ContentFixtures::hotel()).await.unwrap();
        service
            .submit(&PrincipalFixtures::other_employee(), ContentFixtures::random())
            .await
            .unwrap();

        let own = service.list(&employee).await.unwrap();
        assert_eq!(
            own.iter().map(|c| c.id()).collect::<Vec<_>>(),
            vec![newer.id(), older.id()]
        );

        let everything = service.list(&PrincipalFixtures::manager()).await.unwrap();
        assert_eq!(everything.len(), 3);
    }

    #[tokio::test]
    async fn test_review_queue_per_role() {
        let (service, _) = in_memory_service();
        let pending = ClaimBuilder::new().persist(&service).await.unwrap();
        let approved = ClaimBuilder::new()
            .with_status(ClaimStatus::ApprovedByManager)
            .persist(&service)
            .await
            .unwrap();
        ClaimBuilder::new()
            .with_status(ClaimStatus::RejectedByManager)
            .persist(&service)
            .await
            .unwrap();

        let manager_queue = service.review_queue(&PrincipalFixtures::manager()).await.unwrap();
        assert_eq!(
            manager_queue.iter().map(|c| c.id()).collect::<Vec<_>>(),
            vec![pending.id()]
        );

        let finance_queue = service.review_queue(&PrincipalFixtures::finance()).await.unwrap();
        assert_eq!(
            finance_queue.iter().map(|c| c.id()).collect::<Vec<_>>(),
            vec![approved.id()]
        );

        assert_forbidden(&service.review_queue(&PrincipalFixtures::employee()).await);
    }
}

mod stats_tests {
    use super::*;

    #[tokio::test]
    async fn test_stats_over_mixed_statuses() {
        let (service, _) = in_memory_service();
        ClaimBuilder::new()
            .with_content(ContentFixtures::with_amount(dec!(50)))
            .persist(&service)
            .await
            .unwrap();
        ClaimBuilder::new()
            .with_content(ContentFixtures::with_amount(dec!(100)))
            .with_status(ClaimStatus::ApprovedByFinance)
            .persist(&service)
            .await
            .unwrap();
        ClaimBuilder::new()
            .with_content(ContentFixtures::with_amount(dec!(30)))
            .with_status(ClaimStatus::RejectedByManager)
            .persist(&service)
            .await
            .unwrap();

        let stats = service.stats(&PrincipalFixtures::manager()).await.unwrap();
        assert_eq!(
            stats,
            ClaimStats {
                submitted: 3,
                approved: 1,
                rejected: 1,
                pending: 1,
                total_amount: dec!(180),
            }
        );
    }

    #[tokio::test]
    async fn test_employee_stats_cover_own_claims_only() {
        let (service, _) = in_memory_service();
        ClaimBuilder::new()
            .with_content(ContentFixtures::with_amount(dec!(20)))
            .persist(&service)
            .await
            .unwrap();
        ClaimBuilder::new()
            .owned_by(PrincipalFixtures::other_employee())
            .with_content(ContentFixtures::with_amount(dec!(500)))
            .persist(&service)
            .await
            .unwrap();

        let own = service.stats(&PrincipalFixtures::employee()).await.unwrap();
        assert_eq!(own.submitted, 1);
        assert_eq!(own.total_amount, dec!(20));

        let all = service.stats(&PrincipalFixtures::finance()).await.unwrap();
        assert_eq!(all.submitted, 2);
        assert_eq!(all.total_amount, dec!(520));
    }

    #[tokio::test]
    async fn test_empty_store_has_zero_stats() {
        let (service, _) = in_memory_service();
        let stats = service.stats(&PrincipalFixtures::manager()).await.unwrap();
        assert_eq!(stats, ClaimStats::default());
    }
}

mod concurrency_tests {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_manager_decisions_only_one_wins() {
        for _ in 0..25 {
            let store = InMemoryClaimStore::new();
            let service = ReimbursementService::new(Arc::new(store.clone()));
            let claim = service
                .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
                .await
                .unwrap();

            let approve = {
                let service = service.clone();
                let id = claim.id();
                tokio::spawn(async move {
                    service
                        .decide(
                            &PrincipalFixtures::manager(),
                            id,
                            ApprovalStage::Manager,
                            DecisionAction::Approve,
                            Some("approve".into()),
                        )
                        .await
                })
            };
            let reject = {
                let service = service.clone();
                let id = claim.id();
                tokio::spawn(async move {
                    service
                        .decide(
                            &core_kernel::Principal::manager(11),
                            id,
                            ApprovalStage::Manager,
                            DecisionAction::Reject,
                            Some("reject".into()),
                        )
                        .await
                })
            };

            let results = [approve.await.unwrap(), reject.await.unwrap()];
            let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
            assert_eq!(winners.len(), 1, "exactly one decision may win");
            for result in &results {
                if result.is_err() {
                    assert_invalid_state(result);
                }
            }

            let stored = store.get_by_id(claim.id()).await.unwrap();
            assert_eq!(&stored, winners[0]);
            assert_claim_invariants(&stored);
        }
    }

    #[tokio::test]
    async fn test_stale_snapshot_loses_compare_and_set() {
        let (service, store) = in_memory_service();
        let snapshot = service
            .submit(&PrincipalFixtures::employee(), ContentFixtures::taxi())
            .await
            .unwrap();
        service
            .decide(
                &PrincipalFixtures::manager(),
                snapshot.id(),
                ApprovalStage::Manager,
                DecisionAction::Approve,
                None,
            )
            .await
            .unwrap();

        let error = store.update(&snapshot, snapshot.version()).await.unwrap_err();
        assert!(error.is_conflict());
        assert!(store.delete(snapshot.id(), snapshot.version()).await.unwrap_err().is_conflict());
    }

    #[tokio::test]
    async fn test_decision_from_stale_snapshot_cannot_drop_an_edit() {
        let (service, store) = in_memory_service();
        let employee = PrincipalFixtures::employee();
        let snapshot = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();

        // The owner's edit commits between the manager's read and write.
        let patch = ClaimPatch {
            amount: Some(dec!(999.00)),
            ..ClaimPatch::default()
        };
        let edited = service.edit(&employee, snapshot.id(), patch).await.unwrap();
        assert_eq!(edited.status(), snapshot.status());

        let decided = workflow::decide(
            &PrincipalFixtures::manager(),
            &snapshot,
            ApprovalStage::Manager,
            DecisionAction::Approve,
            None,
        )
        .unwrap();
        let error = store.update(&decided, snapshot.version()).await.unwrap_err();
        assert!(error.is_conflict());

        let stored = store.get_by_id(snapshot.id()).await.unwrap();
        assert_eq!(stored, edited);
        assert_eq!(stored.content().amount, dec!(999.00));
        assert_eq!(stored.status(), ClaimStatus::Pending);
    }

    #[tokio::test]
    async fn test_stale_withdraw_after_edit_is_a_conflict() {
        let (service, store) = in_memory_service();
        let employee = PrincipalFixtures::employee();
        let snapshot = service.submit(&employee, ContentFixtures::taxi()).await.unwrap();
        service
            .edit(
                &employee,
                snapshot.id(),
                ClaimPatch {
                    title: Some("Taxi, corrected".into()),
                    ..ClaimPatch::default()
                },
            )
            .await
            .unwrap();

        assert!(store.delete(snapshot.id(), snapshot.version()).await.unwrap_err().is_conflict());
        assert_eq!(store.len().await, 1);
    }
}

#[tokio::test]
async fn test_in_memory_store_is_healthy() {
    let (service, _) = in_memory_service();
    assert!(service.store().health_check().await.is_healthy());
}
