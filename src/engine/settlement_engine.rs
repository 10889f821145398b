use std::fs::File;
use std::io::BufReader;
use std::time::Instant;

use csv::{ReaderBuilder, Trim};
use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::{spawn_blocking, JoinHandle};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::actors::{WalletActor, WalletMailbox};
use crate::engine::{EngineConfig, EventRecord, LedgerEvent};
use crate::models::{
    Actor, OrderCancelled, OrderCompleted, PaymentMethod, Wallet, WalletError, WalletOwner, WalletTransaction,
    Withdrawal, WithdrawalDecided, WithdrawalFilter, WithdrawalRequested
};
use crate::types::{Monetary, UserId, WalletId};
use crate::workflows::{
    IncomeOutcome, IncomeRecorder, Ledger, Reconciliation, RefundOutcome, RefundRouter, SettlementReconciler,
    WithdrawalWorkflow
};

/// A wallet as reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSnapshot {
    pub wallet: Wallet,
    /// Sum of the wallet's logged entries, for comparison against the balance.
    pub ledger_total: Monetary
}

/// Async front door over the ledger workflows.
///
/// Every operation runs on the actor of the wallet it changes, so operations on one wallet are
/// serialized while different wallets proceed independently.
pub struct SettlementEngine {
    ledger: Ledger,
    config: EngineConfig,
    withdrawals: WithdrawalWorkflow,
    refunds: RefundRouter,
    reconciler: SettlementReconciler,
    income: IncomeRecorder,
    actors: DashMap<WalletId, WalletActor>
}

impl SettlementEngine {
    pub fn new(ledger: Ledger, config: EngineConfig) -> Self {
        let reconciler = SettlementReconciler::new(ledger.clone());

        Self {
            withdrawals: WithdrawalWorkflow::new(ledger.clone(), config.minimum_withdrawal),
            refunds: RefundRouter::new(ledger.clone()),
            income: IncomeRecorder::new(ledger.clone(), reconciler.clone()),
            reconciler,
            ledger,
            config,
            actors: DashMap::new()
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn record_order_completed(&self, actor: Actor, event: OrderCompleted) -> Result<IncomeOutcome, WalletError> {
        let wallet = self.ledger.wallets.get_or_create(&WalletOwner::Shop(event.shop_id))?;
        let income = self.income.clone();

        self.dispatch(wallet.id, move || income.record(&actor, &event)).await
    }

    /// Refunds the buyer and, when a gateway order was withdrawn from the order book, reconciles
    /// the shop so its balance stops counting that income.
    pub async fn record_order_cancelled(&self, actor: Actor, event: OrderCancelled) -> Result<RefundOutcome, WalletError> {
        //NOTE: A replayed cancellation must not recreate a guest wallet that was already claimed.
        if let Some(existing) = self.refunds.existing_refund(event.order_id)? {
            debug!("Order [{}] was already refunded to wallet [{}]", event.order_id, existing.wallet_id);
            return Ok(RefundOutcome::AlreadyRefunded(existing))
        }

        let wallet = self.refunds.destination(&event)?;
        let refunds = self.refunds.clone();
        let refund_actor = actor.clone();

        let outcome = self.dispatch(wallet.id, move || refunds.refund(&refund_actor, &event)).await?;

        if let RefundOutcome::Credited { cancelled: Some(order), .. } = &outcome
            && order.payment_method == PaymentMethod::Gateway
        {
            let shop = self.ledger.wallets.get_or_create(&WalletOwner::Shop(order.shop_id))?;
            self.reconcile(actor, shop.id).await?;
        }

        Ok(outcome)
    }

    pub async fn request_withdrawal(&self, actor: Actor, request: WithdrawalRequested) -> Result<Withdrawal, WalletError> {
        let workflow = self.withdrawals.clone();

        self.dispatch(request.wallet_id, move || workflow.request(&actor, &request)).await
    }

    pub async fn decide_withdrawal(&self, actor: Actor, decided: WithdrawalDecided) -> Result<Withdrawal, WalletError> {
        let withdrawal = self.ledger.withdrawals.find(decided.withdrawal_id)?
            .ok_or_else(|| WalletError::withdrawal_not_found(decided.withdrawal_id))?;
        let workflow = self.withdrawals.clone();

        self.dispatch(withdrawal.wallet_id, move || workflow.decide(&actor, &decided)).await
    }

    /// Hands a guest balance to a newly registered user.
    ///
    /// A transfer of ownership touches only the guest wallet and runs on its actor. A merge takes
    /// the balance out on the guest wallet's actor and lands it on the user wallet's actor.
    pub async fn claim_guest_balance(&self, actor: Actor, email: &str, user_id: UserId) -> Result<Wallet, WalletError> {
        self.refunds.authorize_claim(&actor)?;

        let owner = WalletOwner::guest(email);
        let guest = self.ledger.wallets.find_by_owner(&owner)?
            .ok_or_else(|| WalletError::owner_not_found(&owner))?;
        let refunds = self.refunds.clone();

        let Some(user_wallet) = self.ledger.wallets.find_by_owner(&WalletOwner::User(user_id))? else {
            let email = email.to_string();
            return self.dispatch(guest.id, move || refunds.claim(&actor, &email, user_id)).await
        };

        let (guest_id, user_wallet_id) = (guest.id, user_wallet.id);
        let amount = self.dispatch(guest_id, move || refunds.release_guest_balance(guest_id, user_wallet_id)).await?;

        if amount.is_zero() {
            return self.ledger.wallet(user_wallet_id)
        }

        let refunds = self.refunds.clone();
        let deposited = self.dispatch(user_wallet_id, move || refunds.deposit_guest_balance(user_wallet_id, guest_id, amount)).await;

        match deposited {
            Ok(wallet) => Ok(wallet),
            //NOTE: A timed-out deposit may still land, so restoring the guest here could pay the amount twice.
            Err(error @ WalletError::Timeout { .. }) => {
                error!("Deposit of {amount} from guest wallet [{guest_id}] into [{user_wallet_id}] timed out: {error}");
                Err(error)
            }
            Err(error) => {
                let refunds = self.refunds.clone();
                let restored = self.dispatch(guest_id, move || refunds.restore_guest_balance(guest_id, user_wallet_id, amount)).await;

                if let Err(restore_error) = restored {
                    error!("Guest wallet [{guest_id}] lost {amount} in a failed claim: {restore_error}");
                }

                Err(error)
            }
        }
    }

    pub async fn reconcile(&self, actor: Actor, wallet_id: WalletId) -> Result<Reconciliation, WalletError> {
        let reconciler = self.reconciler.clone();

        self.dispatch(wallet_id, move || reconciler.reconcile(&actor, wallet_id)).await
    }

    /// Reconciles every wallet, each on its own actor.
    pub async fn reconcile_all(&self, actor: Actor) -> Result<Vec<Result<Reconciliation, WalletError>>, WalletError> {
        let wallets = self.ledger.wallets.wallets()?;
        let runs = wallets.into_iter().map(|wallet| self.reconcile(actor.clone(), wallet.id));

        Ok(join_all(runs).await)
    }

    pub fn wallet_for(&self, owner: &WalletOwner) -> Result<Option<Wallet>, WalletError> {
        Ok(self.ledger.wallets.find_by_owner(owner)?)
    }

    pub fn history(&self, wallet_id: WalletId) -> Result<Vec<WalletTransaction>, WalletError> {
        self.ledger.wallet(wallet_id)?;

        Ok(self.ledger.transactions.entries(wallet_id)?)
    }

    pub fn withdrawals(&self, filter: &WithdrawalFilter) -> Result<Vec<Withdrawal>, WalletError> {
        self.withdrawals.list(filter)
    }

    /// Every wallet with its ledger total, ordered by wallet id.
    pub fn snapshot(&self) -> Result<Vec<WalletSnapshot>, WalletError> {
        self.ledger.wallets.wallets()?
            .into_iter()
            .map(|wallet| {
                let ledger_total = self.ledger.ledger_total(wallet.id)?;
                Ok(WalletSnapshot { wallet, ledger_total })
            })
            .collect()
    }

    /// Routes a decoded event to the matching operation.
    pub async fn apply(&self, actor: Actor, event: LedgerEvent) -> Result<(), WalletError> {
        match event {
            LedgerEvent::OrderCompleted(completed) => {
                self.record_order_completed(actor, completed).await?;
            }
            LedgerEvent::OrderCancelled(cancelled) => {
                self.record_order_cancelled(actor, cancelled).await?;
            }
            LedgerEvent::WithdrawalRequested { owner, amount, bank } => {
                let wallet = self.wallet_for(&owner)?.ok_or_else(|| WalletError::owner_not_found(&owner))?;
                self.request_withdrawal(actor, WithdrawalRequested { wallet_id: wallet.id, amount, bank }).await?;
            }
            LedgerEvent::WithdrawalDecided(decided) => {
                self.decide_withdrawal(actor, decided).await?;
            }
            LedgerEvent::GuestClaimed { email, user_id } => {
                self.claim_guest_balance(actor, &email, user_id).await?;
            }
            LedgerEvent::Reconcile { owner } => {
                let wallet = self.wallet_for(&owner)?.ok_or_else(|| WalletError::owner_not_found(&owner))?;
                self.reconcile(actor, wallet.id).await?;
            }
        }

        Ok(())
    }

    /// Replays a CSV event file through the engine.
    ///
    /// Malformed rows and rejected operations are logged and skipped; the run only fails on
    /// problems with the pipeline itself.
    pub async fn run(&self, path: &str) -> anyhow::Result<()> {
        let (sender, receiver) = mpsc::channel::<(Actor, LedgerEvent)>(self.config.backpressure);
        let csv_handle = self.spawn_csv_reader(path.to_string(), sender);
        let processing_result = self.process_events(receiver).await;

        if let Err(error) = csv_handle.await {
            error!("CSV ingestion failed: {error}");
        }

        processing_result
    }

    /// Stops every wallet actor after it finishes its queue.
    pub async fn shutdown(&self) {
        let wallet_ids: Vec<WalletId> = self.actors.iter().map(|item| *item.key()).collect();
        let actors = wallet_ids.into_iter().filter_map(|wallet_id| self.actors.remove(&wallet_id).map(|(_, actor)| actor));

        let despawns = actors.map(|actor| {
            let wallet_id = actor.wallet_id();
            async move { (wallet_id, actor.despawn().await) }
        });

        for (wallet_id, result) in join_all(despawns).await {
            if let Err(error) = result {
                error!("Wallet actor [{wallet_id}] did not despawn gracefully: {error:?}");
            }
        }
    }

    fn spawn_csv_reader(&self, path: String, sender: mpsc::Sender<(Actor, LedgerEvent)>) -> JoinHandle<()> {
        spawn_blocking(move || {
            let file = match File::open(&path) {
                Ok(file) => file,
                Err(error) => {
                    error!("Error opening CSV at path: {path} | {error}");
                    return;
                }
            };

            let mut reader = ReaderBuilder::new()
                .trim(Trim::All)
                .flexible(true)
                .from_reader(BufReader::new(file));

            for (row, result) in reader.deserialize::<EventRecord>().enumerate() {
                let decoded = match result {
                    Ok(record) => record.decode(),
                    Err(error) => {
                        error!("CSV deserialization error on row {}: {error}", row + 1);
                        continue;
                    }
                };

                match decoded {
                    Ok(event) => {
                        if sender.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(error) => error!("Skipping row {}: {error}", row + 1)
                }
            }
        })
    }

    async fn process_events(&self, mut receiver: mpsc::Receiver<(Actor, LedgerEvent)>) -> anyhow::Result<()> {
        let timer = Instant::now();
        let mut applied = 0usize;
        let mut rejected = 0usize;

        //NOTE: Events are applied one at a time because later rows refer to ids created by earlier ones,
        //      such as a withdrawal decision following its request.
        while let Some((actor, event)) = receiver.recv().await {
            match self.apply(actor, event).await {
                Ok(()) => applied += 1,
                Err(error) if error.is_fatal() => {
                    rejected += 1;
                    error!("{error}");
                }
                Err(error) => {
                    rejected += 1;
                    warn!("{error}");
                }
            }
        }

        info!("Applied {applied} events, rejected {rejected} in {:?}", timer.elapsed());

        Ok(())
    }

    fn mailbox(&self, wallet_id: WalletId) -> WalletMailbox {
        self.actors.entry(wallet_id)
            .or_insert_with(|| {
                debug!("Spawning actor for wallet [{wallet_id}]");
                WalletActor::new(wallet_id)
            })
            .mailbox()
    }

    async fn dispatch<T, F>(&self, wallet_id: WalletId, operation: F) -> Result<T, WalletError>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T, WalletError> + Send + 'static
    {
        let mailbox = self.mailbox(wallet_id);
        let timer = Instant::now();

        match timeout(self.config.operation_timeout, mailbox.execute(operation)).await {
            Ok(result) => result,
            Err(_) => Err(WalletError::timeout(wallet_id, timer.elapsed()))
        }
    }
}
