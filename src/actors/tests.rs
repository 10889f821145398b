use super::WalletActor;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use futures::future::join_all;
use tokio::time::timeout;

use crate::models::{NewTransaction, TransactionType, WalletError, WalletOwner};
use crate::storage::WalletStore;
use crate::types::Monetary;
use crate::workflows::Ledger;

#[tokio::test]
async fn test_actor_runs_jobs_in_arrival_order() -> Result<()> {
    let actor = WalletActor::new(1);
    let mailbox = actor.mailbox();
    let seen = Arc::new(Mutex::new(Vec::new()));

    //NOTE: join_all polls in order, so each job is queued before the next one.
    let jobs = (0..50).map(|index| {
        let seen = seen.clone();
        mailbox.execute(move || {
            seen.lock().map_err(|_| WalletError::engine_unavailable(1))?.push(index);
            Ok(())
        })
    });

    for result in join_all(jobs).await {
        result?;
    }

    drop(mailbox);
    actor.despawn().await?;

    let seen = seen.lock().map_err(|_| anyhow!("lock poisoned"))?;

    assert_eq!(*seen, (0..50).collect::<Vec<_>>());

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_operation_is_skipped() -> Result<()> {
    let actor = WalletActor::new(3);
    let mailbox = actor.mailbox();
    let ran = Arc::new(AtomicBool::new(false));

    let busy = mailbox.clone();
    let running = tokio::spawn(async move {
        busy.execute(|| {
            std::thread::sleep(Duration::from_millis(200));
            Ok(())
        }).await
    });

    tokio::time::sleep(Duration::from_millis(20)).await;

    let flag = ran.clone();
    let abandoned = timeout(Duration::from_millis(20), mailbox.execute(move || {
        flag.store(true, Ordering::SeqCst);
        Ok(())
    })).await;

    assert!(abandoned.is_err());

    running.await??;
    drop(mailbox);
    actor.despawn().await?;

    assert!(!ran.load(Ordering::SeqCst));

    Ok(())
}

#[tokio::test]
async fn test_mailbox_returns_operation_result() -> Result<()> {
    let ledger = Ledger::in_memory();
    let wallet = ledger.wallets.get_or_create(&WalletOwner::Shop(1))?;
    let actor = WalletActor::new(wallet.id);
    let mailbox = actor.mailbox();

    let posting = ledger.clone();
    let transaction = mailbox.execute(move || {
        posting.post(NewTransaction::new(wallet.id, Monetary::from(750), TransactionType::Deposit, "seed"))
    }).await?;

    assert_eq!(transaction.amount, Monetary::from(750));
    assert_eq!(ledger.wallet(wallet.id)?.balance, Monetary::from(750));

    drop(mailbox);
    actor.despawn().await?;

    Ok(())
}

#[tokio::test]
async fn test_actor_survives_failed_operations() -> Result<()> {
    let ledger = Ledger::in_memory();
    let wallet = ledger.wallets.get_or_create(&WalletOwner::Shop(1))?;
    let actor = WalletActor::new(wallet.id);
    let mailbox = actor.mailbox();

    let seed = ledger.clone();
    mailbox.execute(move || seed.wallets.credit(wallet.id, Monetary::from(10))).await?;

    let overdraw = ledger.clone();
    let failed = mailbox.execute(move || overdraw.wallets.debit(wallet.id, Monetary::from(999))).await;

    let topup = ledger.clone();
    mailbox.execute(move || topup.wallets.credit(wallet.id, Monetary::from(20))).await?;

    assert!(matches!(failed, Err(WalletError::InsufficientFunds { .. })));
    assert_eq!(ledger.wallet(wallet.id)?.balance, Monetary::from(30));

    Ok(())
}

#[tokio::test]
async fn test_concurrent_debits_through_one_actor_never_overdraw() -> Result<()> {
    let ledger = Ledger::in_memory();
    let wallet = ledger.wallets.get_or_create(&WalletOwner::Shop(1))?;
    ledger.wallets.credit(wallet.id, Monetary::from(100))?;
    let actor = WalletActor::new(wallet.id);

    let debits = (0..25).map(|_| {
        let mailbox = actor.mailbox();
        let ledger = ledger.clone();
        async move { mailbox.execute(move || ledger.wallets.debit(wallet.id, Monetary::from(10))).await }
    });

    let results = join_all(debits).await;

    assert_eq!(results.iter().filter(|result| result.is_ok()).count(), 10);
    assert_eq!(ledger.wallet(wallet.id)?.balance, Monetary::ZERO);

    Ok(())
}

#[tokio::test]
async fn test_crashed_actor_reports_engine_unavailable() -> Result<()> {
    let actor = WalletActor::new(9);
    let mailbox = actor.mailbox();

    let crashed = mailbox.execute(|| -> Result<(), WalletError> { panic!("job failed") }).await;
    let after = mailbox.execute(|| Ok(())).await;

    assert!(matches!(crashed, Err(WalletError::EngineUnavailable { wallet_id: 9 })));
    assert!(matches!(after, Err(WalletError::EngineUnavailable { wallet_id: 9 })));

    drop(mailbox);

    assert!(actor.despawn().await.is_err());

    Ok(())
}
