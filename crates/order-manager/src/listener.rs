//! Order listener
//!
//! Single consumer task between the strategy orchestrator and the market
//! exchange. It is the only writer to the shared portfolio.
//!
//! A submission is threaded through portfolio validation (sizing), stamped
//! with available funds, then executed. Every submission resolves to exactly
//! one [`TradeCompleted`], including ones refused during validation.

use evolver_core::{
    PortfolioStatus, PriceChanged, Rejection, Timestamp, TradeCompleted, TradeSubmitted,
};
use evolver_exchange::MarketExchange;
use evolver_ports::{PortfolioManager, PriceService};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::ledger::{LedgerBook, OutcomeCounts};

/// Portfolio shared between the listener (writer) and readers such as the driver
pub type SharedPortfolio = Arc<RwLock<dyn PortfolioManager>>;

/// Wrap a portfolio manager for sharing
pub fn share_portfolio<P: PortfolioManager + 'static>(portfolio: P) -> SharedPortfolio {
    Arc::new(RwLock::new(portfolio))
}

/// Messages accepted by the order listener, handled in arrival order
#[derive(Debug)]
pub enum ListenerMessage {
    Submitted(TradeSubmitted),
    PriceUpdate(PriceChanged),
    /// Value the portfolio at this time
    Report(Timestamp),
    /// Acknowledged once every earlier message has been handled
    Flush(oneshot::Sender<()>),
}

/// What the listener hands back when its channel closes
#[derive(Debug, Clone, Default)]
pub struct ListenerOutput {
    pub ledgers: LedgerBook,
    pub counts: OutcomeCounts,
}

pub struct OrderListener {
    portfolio: SharedPortfolio,
    prices: Arc<dyn PriceService>,
    market: MarketExchange,
    ledgers: LedgerBook,
    counts: OutcomeCounts,
    reports: Option<mpsc::UnboundedSender<PortfolioStatus>>,
    completions: Option<mpsc::UnboundedSender<TradeCompleted>>,
}

impl OrderListener {
    pub fn new(
        portfolio: SharedPortfolio,
        prices: Arc<dyn PriceService>,
        market: MarketExchange,
    ) -> Self {
        Self {
            portfolio,
            prices,
            market,
            ledgers: LedgerBook::new(),
            counts: OutcomeCounts::default(),
            reports: None,
            completions: None,
        }
    }

    /// Forward every portfolio valuation to `tx`
    pub fn with_reports(mut self, tx: mpsc::UnboundedSender<PortfolioStatus>) -> Self {
        self.reports = Some(tx);
        self
    }

    /// Forward every terminal trade outcome to `tx`
    pub fn with_completions(mut self, tx: mpsc::UnboundedSender<TradeCompleted>) -> Self {
        self.completions = Some(tx);
        self
    }

    pub fn counts(&self) -> OutcomeCounts {
        self.counts
    }

    pub fn ledgers(&self) -> &LedgerBook {
        &self.ledgers
    }

    /// Spawn the listener on the current runtime
    pub fn spawn(self) -> (mpsc::UnboundedSender<ListenerMessage>, JoinHandle<ListenerOutput>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (tx, handle)
    }

    /// Handle messages until every sender is dropped
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ListenerMessage>) -> ListenerOutput {
        log::info!("[OrderListener] started");

        while let Some(message) = rx.recv().await {
            self.handle(message).await;
        }

        log::info!(
            "[OrderListener] stopped: {} submitted, {} confirmed, {} rejected",
            self.counts.submitted,
            self.counts.confirmed,
            self.counts.rejected
        );
        ListenerOutput {
            ledgers: self.ledgers,
            counts: self.counts,
        }
    }

    pub async fn handle(&mut self, message: ListenerMessage) {
        match message {
            ListenerMessage::Submitted(submitted) => {
                let completed = self.on_submitted(submitted).await;
                self.on_completed(completed).await;
            }
            ListenerMessage::PriceUpdate(event) => {
                self.portfolio.write().await.on_price_update(&event);
            }
            ListenerMessage::Report(time) => {
                let status = self
                    .portfolio
                    .write()
                    .await
                    .report_status(time, self.prices.as_ref());
                log::debug!(
                    "[OrderListener] valuation at {}: cash={} value={}",
                    time,
                    status.cash,
                    status.total_value()
                );
                if let Some(tx) = &self.reports {
                    if tx.send(status).is_err() {
                        log::debug!("[OrderListener] report receiver dropped");
                    }
                }
            }
            ListenerMessage::Flush(ack) => {
                let _ = ack.send(());
            }
        }
    }

    /// Validate, stamp funds and execute one submission
    async fn on_submitted(&mut self, mut submitted: TradeSubmitted) -> TradeCompleted {
        self.counts.submitted += 1;
        let prices = self.prices.as_ref();

        let validated = {
            let portfolio = self.portfolio.read().await;
            portfolio
                .validate_trade(submitted.time, &submitted.requested, prices)
                .map(|sized| (sized, portfolio.available_funds(submitted.time)))
        };

        match validated {
            Some((sized, funds)) => {
                submitted.requested = sized;
                submitted.available_funds = funds;
                self.market.execute(&submitted, prices)
            }
            None => {
                log::info!(
                    "[OrderListener] {} {} {} failed validation",
                    submitted.requested.id,
                    submitted.requested.side,
                    submitted.requested.stock
                );
                TradeCompleted::rejected(submitted.requested, Rejection::FailedValidation)
            }
        }
    }

    /// Apply a confirmed trade, or just count the rejection
    ///
    /// A confirmation the portfolio will not book becomes a
    /// [`Rejection::PortfolioRefused`] outcome.
    async fn on_completed(&mut self, completed: TradeCompleted) {
        let completed = match (&completed.confirmed, completed.success) {
            (Some(confirmed), true) => {
                let accepted = self.portfolio.write().await.add_trade(
                    confirmed.time,
                    &completed.requested,
                    confirmed,
                );
                if accepted {
                    self.ledgers.record(&completed.requested, confirmed);
                    completed
                } else {
                    log::warn!(
                        "[OrderListener] portfolio refused confirmed trade {}",
                        confirmed.trade_id
                    );
                    TradeCompleted::rejected(completed.requested, Rejection::PortfolioRefused)
                }
            }
            _ => completed,
        };

        if completed.success {
            self.counts.confirmed += 1;
        } else {
            self.counts.rejected += 1;
        }

        if let Some(tx) = &self.completions {
            let _ = tx.send(completed);
        }
    }
}
