mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{StandardAccounts, balance_of, memory_service, sqlite_service};
use ledgerd::Storage;
use ledgerd::application::LedgerService;
use ledgerd::domain::{LedgerError, TransferRequest};

async fn check_scenario<S: Storage + ?Sized>(service: &LedgerService<S>) -> Result<()> {
    let (a, b) = StandardAccounts::create_pair(service).await?;
    assert_eq!(balance_of(service, &a).await?, 0);
    assert_eq!(balance_of(service, &b).await?, 0);

    service.deposit(a.id, 100).await?;

    service.transfer(TransferRequest::new(a.id, b.id, 40)).await?;
    assert_eq!(balance_of(service, &a).await?, 60);
    assert_eq!(balance_of(service, &b).await?, 40);

    let err = service
        .transfer(TransferRequest::new(a.id, b.id, 100))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::InsufficientFunds {
            balance: 60,
            required: 100,
            ..
        }
    ));
    assert_eq!(balance_of(service, &a).await?, 60);
    assert_eq!(balance_of(service, &b).await?, 40);

    Ok(())
}

async fn check_self_transfer_always_fails<S: Storage + ?Sized>(
    service: &LedgerService<S>,
) -> Result<()> {
    let (a, _) = StandardAccounts::create_funded_pair(service, 1_000).await?;

    for amount in [1, 500, 1_000, 5_000] {
        let err = service
            .transfer(TransferRequest::new(a.id, a.id, amount))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument(_)));
    }
    assert_eq!(balance_of(service, &a).await?, 1_000);

    Ok(())
}

async fn check_missing_endpoints<S: Storage + ?Sized>(service: &LedgerService<S>) -> Result<()> {
    let (a, b) = StandardAccounts::create_funded_pair(service, 100).await?;
    service.delete_account(b.id).await?;

    assert!(matches!(
        service.transfer(TransferRequest::new(a.id, b.id, 10)).await,
        Err(LedgerError::NotFound(id)) if id == b.id
    ));
    assert!(matches!(
        service.transfer(TransferRequest::new(b.id, a.id, 10)).await,
        Err(LedgerError::NotFound(id)) if id == b.id
    ));
    assert_eq!(balance_of(service, &a).await?, 100);

    Ok(())
}

#[tokio::test]
async fn test_scenario_memory() -> Result<()> {
    check_scenario(&memory_service()).await
}

#[tokio::test]
async fn test_scenario_sqlite() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    check_scenario(&service).await
}

#[tokio::test]
async fn test_self_transfer_always_fails_memory() -> Result<()> {
    check_self_transfer_always_fails(&memory_service()).await
}

#[tokio::test]
async fn test_self_transfer_always_fails_sqlite() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    check_self_transfer_always_fails(&service).await
}

#[tokio::test]
async fn test_missing_endpoints_memory() -> Result<()> {
    check_missing_endpoints(&memory_service()).await
}

#[tokio::test]
async fn test_missing_endpoints_sqlite() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    check_missing_endpoints(&service).await
}

#[tokio::test]
async fn test_nonpositive_amounts_rejected() -> Result<()> {
    let service = memory_service();
    let (a, b) = StandardAccounts::create_funded_pair(&service, 100).await?;

    for amount in [0, -1, -100] {
        assert!(matches!(
            service.transfer(TransferRequest::new(a.id, b.id, amount)).await,
            Err(LedgerError::InvalidArgument(_))
        ));
    }
    assert_eq!(balance_of(&service, &a).await?, 100);
    assert_eq!(balance_of(&service, &b).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_exact_balance_can_be_transferred() -> Result<()> {
    let service = memory_service();
    let (a, b) = StandardAccounts::create_funded_pair(&service, 250).await?;

    service.transfer(TransferRequest::new(a.id, b.id, 250)).await?;
    assert_eq!(balance_of(&service, &a).await?, 0);
    assert_eq!(balance_of(&service, &b).await?, 250);

    Ok(())
}

async fn run_opposing_transfers<S: Storage + ?Sized + 'static>(
    service: LedgerService<S>,
    rounds: usize,
) -> Result<()> {
    let (a, b) = StandardAccounts::create_pair(&service).await?;
    service.deposit(a.id, 500).await?;
    service.deposit(b.id, 500).await?;

    let mut handles = Vec::new();
    for worker in 0..4 {
        let service = service.clone();
        let (from, to) = if worker % 2 == 0 { (a.id, b.id) } else { (b.id, a.id) };
        handles.push(tokio::spawn(async move {
            for i in 0..rounds {
                let amount = (i % 7 + 1) as i64 * 10;
                match service.transfer(TransferRequest::new(from, to, amount)).await {
                    Ok(()) | Err(LedgerError::InsufficientFunds { .. }) => {}
                    Err(other) => panic!("unexpected transfer error: {other}"),
                }
            }
        }));
    }

    let all_done = async {
        for handle in handles {
            handle.await.expect("transfer task panicked");
        }
    };
    tokio::time::timeout(Duration::from_secs(30), all_done)
        .await
        .expect("opposing transfers deadlocked");

    let a_balance = balance_of(&service, &a).await?;
    let b_balance = balance_of(&service, &b).await?;
    assert_eq!(a_balance + b_balance, 1_000);
    assert!(a_balance >= 0 && b_balance >= 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposing_transfers_conserve_money_memory() -> Result<()> {
    run_opposing_transfers(memory_service(), 200).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposing_transfers_conserve_money_sqlite() -> Result<()> {
    let (service, _temp) = sqlite_service().await?;
    run_opposing_transfers(service, 20).await
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_never_see_half_applied_transfer() -> Result<()> {
    let service = memory_service();
    let (a, b) = StandardAccounts::create_funded_pair(&service, 1_000).await?;
    let (a_id, b_id) = (a.id, b.id);

    let writer = {
        let service = service.clone();
        tokio::spawn(async move {
            for i in 0..500 {
                let (from, to) = if i % 2 == 0 { (a_id, b_id) } else { (b_id, a_id) };
                let _ = service.transfer(TransferRequest::new(from, to, 1)).await;
            }
        })
    };

    let reader = {
        let service = service.clone();
        tokio::spawn(async move {
            for _ in 0..500 {
                let accounts = service.get_accounts().await.expect("listing failed");
                let total: i64 = accounts.iter().map(|acc| acc.balance).sum();
                assert_eq!(total, 1_000, "observed a partially applied transfer");
            }
        })
    };

    writer.await?;
    reader.await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_racing_transfers_keeps_balances_sane() -> Result<()> {
    let storage = Arc::new(ledgerd::storage::MemoryStorage::new());
    let service = LedgerService::new(Arc::clone(&storage));
    let (a, b) = StandardAccounts::create_funded_pair(&service, 1_000).await?;
    let (a_id, b_id) = (a.id, b.id);

    let mover = {
        let service = service.clone();
        tokio::spawn(async move {
            let mut moved: i64 = 0;
            for _ in 0..200 {
                match service.transfer(TransferRequest::new(a_id, b_id, 1)).await {
                    Ok(()) => moved += 1,
                    Err(LedgerError::NotFound(id)) => assert_eq!(id, b_id),
                    Err(other) => panic!("unexpected transfer error: {other}"),
                }
            }
            moved
        })
    };

    tokio::task::yield_now().await;
    service.delete_account(b.id).await?;

    let moved = mover.await?;
    // Every successful transfer happened before the delete; every later one was rejected whole.
    assert_eq!(balance_of(&service, &a).await?, 1_000 - moved);
    assert!(matches!(
        storage.get_account_by_id(b.id).await,
        Err(LedgerError::NotFound(_))
    ));

    Ok(())
}
