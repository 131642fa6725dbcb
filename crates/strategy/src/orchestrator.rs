//! Strategy orchestrator
//!
//! Turns simulation events into trade submissions. Runs as one task reading
//! a FIFO channel, so events are handled exactly once each, in the order the
//! scheduler fired them. Everything bound for the order listener goes
//! through this task, which keeps price updates, submissions and reports in
//! source order on the listener side too.

use evolver_core::{
    Decision, DecisionSystemSettings, ExchangeSession, ExchangeSnapshot, ExchangeStatusChanged,
    PriceChanged, SimEvent, Ticker, Timestamp, Trade, TradeId, TradeSubmitted,
};
use evolver_order_manager::ListenerMessage;
use evolver_ports::{DecisionProvider, DecisionResult, EventSink, PublishError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::policy::ExecutionPolicy;

/// Messages accepted by the orchestrator task
#[derive(Debug)]
pub enum StrategyMessage {
    Event(SimEvent),
    /// Acknowledged once the order listener has handled everything before it
    Flush(oneshot::Sender<()>),
}

/// Publishing handle for the orchestrator; cheap to clone
#[derive(Debug, Clone)]
pub struct StrategyHandle {
    tx: mpsc::UnboundedSender<StrategyMessage>,
}

impl StrategyHandle {
    /// Request a drain barrier across orchestrator and listener
    pub fn flush(&self) -> Result<oneshot::Receiver<()>, PublishError> {
        let (ack_tx, ack_rx) = oneshot::channel();
        self.tx
            .send(StrategyMessage::Flush(ack_tx))
            .map_err(|_| PublishError::ChannelClosed)?;
        Ok(ack_rx)
    }
}

impl EventSink for StrategyHandle {
    fn publish(&self, event: SimEvent) -> Result<(), PublishError> {
        self.tx
            .send(StrategyMessage::Event(event))
            .map_err(|_| PublishError::ChannelClosed)
    }
}

/// Counters returned when the orchestrator stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrchestratorSummary {
    pub decisions: u64,
    pub submitted: u64,
    /// Decisions still waiting on their policy trigger
    pub pending: usize,
}

pub struct StrategyOrchestrator {
    decider: Box<dyn DecisionProvider>,
    exchange: Arc<ExchangeSnapshot>,
    policy: ExecutionPolicy,
    burn_in_end: Timestamp,
    listener: mpsc::UnboundedSender<ListenerMessage>,
    session: ExchangeSession,
    next_trade_id: u64,
    awaiting_open: Vec<Decision>,
    awaiting_price: HashMap<Ticker, Vec<Decision>>,
    summary: OrchestratorSummary,
}

impl StrategyOrchestrator {
    /// Calibrate the provider and wire the orchestrator to the order listener
    pub fn new(
        mut decider: Box<dyn DecisionProvider>,
        mut settings: DecisionSystemSettings,
        policy: ExecutionPolicy,
        listener: mpsc::UnboundedSender<ListenerMessage>,
    ) -> DecisionResult<Self> {
        decider.calibrate(&mut settings)?;
        settings.normalize();

        log::info!(
            "[Orchestrator] {} calibrated, burn-in ends {}, policy {:?}",
            decider.name(),
            settings.burn_in_end,
            policy
        );

        Ok(Self {
            decider,
            exchange: settings.exchange,
            policy,
            burn_in_end: settings.burn_in_end,
            listener,
            session: ExchangeSession::Closed,
            next_trade_id: 0,
            awaiting_open: Vec::new(),
            awaiting_price: HashMap::new(),
            summary: OrchestratorSummary::default(),
        })
    }

    pub fn burn_in_end(&self) -> Timestamp {
        self.burn_in_end
    }

    pub fn session(&self) -> ExchangeSession {
        self.session
    }

    /// Spawn the orchestrator on the current runtime
    pub fn spawn(self) -> (StrategyHandle, JoinHandle<OrchestratorSummary>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(self.run(rx));
        (StrategyHandle { tx }, handle)
    }

    /// Handle messages until every handle is dropped
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<StrategyMessage>) -> OrchestratorSummary {
        log::info!("[Orchestrator] started");

        while let Some(message) = rx.recv().await {
            match message {
                StrategyMessage::Event(event) => self.handle(event),
                StrategyMessage::Flush(ack) => {
                    if self.listener.send(ListenerMessage::Flush(ack)).is_err() {
                        log::warn!("[Orchestrator] order listener gone, flush dropped");
                    }
                }
            }
        }

        self.summary.pending =
            self.awaiting_open.len() + self.awaiting_price.values().map(Vec::len).sum::<usize>();
        if self.summary.pending > 0 {
            log::info!(
                "[Orchestrator] {} decisions never reached their trigger",
                self.summary.pending
            );
        }
        log::info!(
            "[Orchestrator] stopped: {} decisions, {} submitted",
            self.summary.decisions,
            self.summary.submitted
        );
        self.summary
    }

    /// React to one simulation event
    pub fn handle(&mut self, event: SimEvent) {
        match event {
            SimEvent::TimeIncrement(time) => self.on_time_increment(time),
            SimEvent::ExchangeStatus(change) => self.on_status_changed(change),
            SimEvent::Price(update) => self.on_price(update),
            SimEvent::Report(time) => self.forward(ListenerMessage::Report(time)),
        }
    }

    fn on_time_increment(&mut self, time: Timestamp) {
        if time < self.burn_in_end {
            log::trace!("[Orchestrator] {} inside burn-in", time);
            return;
        }

        let decisions = self.decider.decide(time, &self.exchange);
        log::debug!("[Orchestrator] {} decisions at {}", decisions.len(), time);
        self.summary.decisions += decisions.len() as u64;

        for decision in decisions {
            match self.policy {
                ExecutionPolicy::LogExecution => self.submit(&decision, time),
                ExecutionPolicy::ExchangeOpen => self.awaiting_open.push(decision),
                ExecutionPolicy::ExchangeEvent => self
                    .awaiting_price
                    .entry(decision.stock.clone())
                    .or_default()
                    .push(decision),
            }
        }
    }

    fn on_status_changed(&mut self, change: ExchangeStatusChanged) {
        log::debug!(
            "[Orchestrator] session {:?} -> {:?} at {}",
            change.previous,
            change.new,
            change.time
        );
        self.session = change.new;

        if change.previous == ExchangeSession::Closed && change.new == ExchangeSession::Continuous {
            for decision in std::mem::take(&mut self.awaiting_open) {
                self.submit(&decision, change.time);
            }
        }
    }

    fn on_price(&mut self, update: PriceChanged) {
        let time = update.time;
        let pending = self.awaiting_price.remove(&update.stock);
        self.forward(ListenerMessage::PriceUpdate(update));

        for decision in pending.unwrap_or_default() {
            self.submit(&decision, time);
        }
    }

    fn submit(&mut self, decision: &Decision, time: Timestamp) {
        self.next_trade_id += 1;
        let trade = Trade::from_decision(TradeId(self.next_trade_id), decision, time);
        log::debug!(
            "[Orchestrator] submitting {} {} {} at {}",
            trade.id,
            trade.side,
            trade.stock,
            time
        );
        self.summary.submitted += 1;
        self.forward(ListenerMessage::Submitted(TradeSubmitted::new(trade)));
    }

    fn forward(&self, message: ListenerMessage) {
        if self.listener.send(message).is_err() {
            log::warn!("[Orchestrator] order listener gone, message dropped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deciders::BuyAll;
    use chrono::{NaiveTime, TimeZone, Utc};
    use evolver_core::{Candle, Side, Stock};
    use rust_decimal_macros::dec;

    fn at(d: u32, h: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, d, h, 0, 0).unwrap()
    }

    fn exchange() -> Arc<ExchangeSnapshot> {
        Arc::new(ExchangeSnapshot {
            name: "TEST".to_string(),
            country_code: "US".to_string(),
            open_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
            close_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
            stocks: vec![
                Stock::new("AAA", "Alpha", vec![Candle::flat(at(2, 0), dec!(10))]),
                Stock::new("BBB", "Beta", vec![Candle::flat(at(2, 0), dec!(20))]),
            ],
        })
    }

    fn orchestrator(
        policy: ExecutionPolicy,
    ) -> (StrategyOrchestrator, mpsc::UnboundedReceiver<ListenerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let settings = DecisionSystemSettings::new(at(1, 0), exchange());
        let orchestrator = StrategyOrchestrator::new(Box::new(BuyAll), settings, policy, tx).unwrap();
        (orchestrator, rx)
    }

    fn submissions(rx: &mut mpsc::UnboundedReceiver<ListenerMessage>) -> Vec<Trade> {
        let mut trades = Vec::new();
        while let Ok(message) = rx.try_recv() {
            if let ListenerMessage::Submitted(submitted) = message {
                trades.push(submitted.requested);
            }
        }
        trades
    }

    fn open(time: Timestamp) -> SimEvent {
        SimEvent::ExchangeStatus(ExchangeStatusChanged {
            time,
            previous: ExchangeSession::Closed,
            new: ExchangeSession::Continuous,
        })
    }

    #[test]
    fn test_log_execution_submits_on_increment() {
        let (mut orchestrator, mut rx) = orchestrator(ExecutionPolicy::LogExecution);
        orchestrator.handle(SimEvent::TimeIncrement(at(2, 0)));

        let trades = submissions(&mut rx);
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, TradeId(1));
        assert_eq!(trades[1].id, TradeId(2));
        assert!(trades.iter().all(|t| t.side == Side::Buy && t.shares.is_none()));
        assert!(trades.iter().all(|t| t.time == at(2, 0)));
    }

    #[test]
    fn test_exchange_open_waits_for_session() {
        let (mut orchestrator, mut rx) = orchestrator(ExecutionPolicy::ExchangeOpen);
        orchestrator.handle(SimEvent::TimeIncrement(at(2, 0)));
        assert!(submissions(&mut rx).is_empty());

        orchestrator.handle(open(at(2, 14)));
        let trades = submissions(&mut rx);
        assert_eq!(trades.len(), 2);
        assert!(trades.iter().all(|t| t.time == at(2, 14)));
        assert_eq!(orchestrator.session(), ExchangeSession::Continuous);

        // Already flushed; a second open submits nothing
        orchestrator.handle(open(at(3, 14)));
        assert!(submissions(&mut rx).is_empty());
    }

    #[test]
    fn test_exchange_event_waits_for_own_stock() {
        let (mut orchestrator, mut rx) = orchestrator(ExecutionPolicy::ExchangeEvent);
        orchestrator.handle(SimEvent::TimeIncrement(at(2, 0)));

        orchestrator.handle(SimEvent::Price(PriceChanged {
            time: at(2, 5),
            stock: "BBB".to_string(),
            price: dec!(20),
            candle: Candle::flat(at(2, 5), dec!(20)),
        }));

        let mut messages = Vec::new();
        while let Ok(message) = rx.try_recv() {
            messages.push(message);
        }
        // Price update is forwarded ahead of the trade it releases
        assert!(matches!(messages[0], ListenerMessage::PriceUpdate(_)));
        match &messages[1] {
            ListenerMessage::Submitted(submitted) => {
                assert_eq!(submitted.requested.stock, "BBB");
                assert_eq!(submitted.time, at(2, 5));
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_burn_in_suppresses_decisions() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let settings = DecisionSystemSettings::new(at(1, 0), exchange());
        let decider = crate::deciders::build_decider(crate::DecisionKind::Random, 1, 5);
        let mut orchestrator =
            StrategyOrchestrator::new(decider, settings, ExecutionPolicy::LogExecution, tx).unwrap();

        assert_eq!(orchestrator.burn_in_end(), at(6, 0));
        orchestrator.handle(SimEvent::TimeIncrement(at(2, 0)));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_flush_travels_behind_events() {
        let (orchestrator, mut rx) = orchestrator(ExecutionPolicy::LogExecution);
        let (handle, task) = orchestrator.spawn();

        handle.publish(SimEvent::TimeIncrement(at(2, 0))).unwrap();
        handle.publish(SimEvent::Report(at(2, 0))).unwrap();
        let ack = handle.flush().unwrap();

        let mut kinds = Vec::new();
        for _ in 0..4 {
            match rx.recv().await.unwrap() {
                ListenerMessage::Submitted(_) => kinds.push("submitted"),
                ListenerMessage::Report(_) => kinds.push("report"),
                ListenerMessage::Flush(done) => {
                    kinds.push("flush");
                    done.send(()).unwrap();
                }
                ListenerMessage::PriceUpdate(_) => kinds.push("price"),
            }
        }
        ack.await.unwrap();
        assert_eq!(kinds, vec!["submitted", "submitted", "report", "flush"]);

        drop(handle);
        let summary = task.await.unwrap();
        assert_eq!(summary.decisions, 2);
        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.pending, 0);
        assert!(handle_closed(&mut rx).await);
    }

    async fn handle_closed(rx: &mut mpsc::UnboundedReceiver<ListenerMessage>) -> bool {
        rx.recv().await.is_none()
    }
}
