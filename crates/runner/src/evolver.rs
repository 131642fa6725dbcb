//! Event evolver
//!
//! Owns the scheduler and the clock, and drives one simulation run from
//! start to horizon:
//!
//! 1. `initialize` spawns the order listener and the strategy orchestrator,
//!    then asks every service to schedule its events (prices, session
//!    transitions, clock ticks, reports, in that order).
//! 2. `start` repeatedly advances the clock to the next due instant, fires
//!    everything due there and waits until the pipeline has drained it.
//! 3. `shutdown` values the portfolio one last time, closes the pipeline and
//!    freezes the [`EvolverResult`].

use evolver_clock::{Clock, SimulationClock};
use evolver_core::{
    DecisionSystemSettings, EvolverSettings, ExchangeSnapshot, PortfolioStatus, SimEvent,
    Timestamp,
};
use evolver_exchange::{ExchangePriceService, ExchangeStateMachine, MarketExchange, SessionConfig};
use evolver_order_manager::{ListenerOutput, OrderListener, SharedPortfolio};
use evolver_ports::EventSink;
use evolver_scheduler::Scheduler;
use evolver_strategy::{
    OrchestratorSummary, StrategyHandle, StrategyOrchestrator, StrategySettings, build_decider,
};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{ControlOperation, EvolverError, EvolverState, Result};
use crate::metrics::annualized_return;
use crate::reporting::{ReportFrequency, ReportHook};
use crate::result::EvolverResult;

/// Cooperative stop request, checked before each instant
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Running tasks and the channels that reach them
struct Pipeline {
    handle: StrategyHandle,
    orchestrator: JoinHandle<OrchestratorSummary>,
    listener: JoinHandle<ListenerOutput>,
    reports: mpsc::UnboundedReceiver<PortfolioStatus>,
}

pub struct EventEvolver {
    settings: EvolverSettings,
    exchange: Arc<ExchangeSnapshot>,
    session: SessionConfig,
    portfolio: SharedPortfolio,
    market: MarketExchange,
    half_spread: Decimal,
    strategy: StrategySettings,
    clock: Arc<dyn Clock>,
    report_frequency: Option<ReportFrequency>,
    hooks: Vec<ReportHook>,
    scheduler: Scheduler,
    stop: StopHandle,
    state: EvolverState,
    stopped_early: bool,
    fired_events: usize,
    pipeline: Option<Pipeline>,
    valuations: Vec<PortfolioStatus>,
    result: Option<EvolverResult>,
}

impl EventEvolver {
    pub fn new(
        settings: EvolverSettings,
        exchange: Arc<ExchangeSnapshot>,
        session: SessionConfig,
        portfolio: SharedPortfolio,
    ) -> Self {
        Self {
            clock: SimulationClock::new(settings.start_time()),
            settings,
            exchange,
            session,
            portfolio,
            market: MarketExchange::default(),
            half_spread: Decimal::ZERO,
            strategy: StrategySettings::default(),
            report_frequency: None,
            hooks: Vec::new(),
            scheduler: Scheduler::new(),
            stop: StopHandle::default(),
            state: EvolverState::Created,
            stopped_early: false,
            fired_events: 0,
            pipeline: None,
            valuations: Vec::new(),
            result: None,
        }
    }

    /// Trade costs and quoted spread
    pub fn with_market(mut self, market: MarketExchange, half_spread: Decimal) -> Self {
        self.market = market;
        self.half_spread = half_spread;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategySettings) -> Self {
        self.strategy = strategy;
        self
    }

    /// Replace the simulated clock, e.g. with a paced one
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_report_frequency(mut self, frequency: Option<ReportFrequency>) -> Self {
        self.report_frequency = frequency;
        self
    }

    /// Call `hook` with every portfolio valuation, in time order
    pub fn on_report<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&PortfolioStatus) + Send + 'static,
    {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn state(&self) -> EvolverState {
        self.state
    }

    pub fn supports(&self, operation: ControlOperation) -> bool {
        !matches!(operation, ControlOperation::Restart)
    }

    pub fn result(&self) -> Option<&EvolverResult> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<EvolverResult> {
        self.result
    }

    /// Spawn the pipeline and schedule every event of the run
    pub async fn initialize(&mut self) -> Result<()> {
        self.expect_state(ControlOperation::Initialize, &[EvolverState::Created])?;

        if self.exchange.is_empty() {
            return Err(EvolverError::Setup(format!(
                "exchange '{}' lists no stocks",
                self.exchange.name
            )));
        }

        let prices = Arc::new(ExchangePriceService::new(self.exchange.clone(), self.half_spread));

        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let (listener_tx, listener) = OrderListener::new(self.portfolio.clone(), prices.clone(), self.market)
            .with_reports(report_tx)
            .spawn();

        let decider = build_decider(
            self.strategy.decision,
            self.strategy.seed,
            self.strategy.burn_in_days,
        );
        let decision_settings =
            DecisionSystemSettings::new(self.settings.start_time(), self.exchange.clone());
        let orchestrator = match StrategyOrchestrator::new(
            decider,
            decision_settings,
            self.strategy.policy,
            listener_tx,
        ) {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                listener.abort();
                return Err(e.into());
            }
        };
        let (handle, orchestrator) = orchestrator.spawn();

        let sink: Arc<dyn EventSink> = Arc::new(handle.clone());
        let price_events = prices.initialize(&self.settings, &self.scheduler, sink.clone());
        let session_events = ExchangeStateMachine::new(self.session.clone()).initialize(
            &self.settings,
            &self.scheduler,
            sink.clone(),
        );
        let ticks = self.schedule_ticks(&sink);
        let reports = self.schedule_reports(&sink);

        info!(
            "[Evolver] initialized {} to {} every {}s: {} prices, {} session changes, {} ticks, {} reports",
            self.settings.start_time(),
            self.settings.end_time(),
            self.settings.evolution_increment().num_seconds(),
            price_events,
            session_events,
            ticks,
            reports
        );

        handle
            .publish(SimEvent::Report(self.settings.start_time()))
            .map_err(|e| EvolverError::TaskFailed(e.to_string()))?;

        self.pipeline = Some(Pipeline {
            handle,
            orchestrator,
            listener,
            reports: report_rx,
        });
        self.state = EvolverState::Initialized;
        Ok(())
    }

    fn schedule_ticks(&self, sink: &Arc<dyn EventSink>) -> usize {
        let mut count = 0;
        for tick in self.settings.ticks() {
            let sink = sink.clone();
            self.scheduler.schedule(tick, move |due| {
                sink.publish(SimEvent::TimeIncrement(due))?;
                Ok(())
            });
            count += 1;
        }
        count
    }

    /// Periodic reports strictly inside the window; start and end are valued separately
    fn schedule_reports(&self, sink: &Arc<dyn EventSink>) -> usize {
        let Some(frequency) = self.report_frequency else {
            return 0;
        };

        let times: Vec<Timestamp> = frequency
            .report_times(&self.settings)
            .into_iter()
            .filter(|t| *t > self.settings.start_time() && *t < self.settings.end_time())
            .collect();

        for time in &times {
            let sink = sink.clone();
            self.scheduler.schedule(*time, move |due| {
                sink.publish(SimEvent::Report(due))?;
                Ok(())
            });
        }
        times.len()
    }

    /// Run to the horizon (or a stop request), then shut down
    pub async fn start(&mut self) -> Result<&EvolverResult> {
        if self.state == EvolverState::Created {
            self.initialize().await?;
        }
        self.expect_state(ControlOperation::Start, &[EvolverState::Initialized])?;

        self.state = EvolverState::Running;
        self.scheduler.start();
        info!("[Evolver] running with {}", self.clock.name());

        loop {
            if self.stop.is_stopped() {
                info!("[Evolver] stop requested at {}", self.clock.now());
                self.stopped_early = true;
                break;
            }

            let Some(due) = self.scheduler.next_due() else {
                break;
            };
            if due > self.settings.end_time() {
                break;
            }

            self.clock.wait_until(due).await;
            let fired = self.scheduler.fire_due(due);
            if fired.failed > 0 {
                warn!("[Evolver] {} of {} events failed at {}", fired.failed, fired.fired, due);
            }
            debug!("[Evolver] fired {} events at {}", fired.fired, due);
            self.fired_events += fired.fired;

            self.drain().await?;
        }

        self.shutdown().await
    }

    /// Stop scheduling, take the final valuation and collect the result
    pub async fn shutdown(&mut self) -> Result<&EvolverResult> {
        self.expect_state(
            ControlOperation::Shutdown,
            &[EvolverState::Initialized, EvolverState::Running],
        )?;
        self.scheduler.stop();

        let final_time = if self.stopped_early {
            self.clock
                .now()
                .clamp(self.settings.start_time(), self.settings.end_time())
        } else {
            self.settings.end_time()
        };

        self.drain().await?;
        // The opening valuation precedes every event at the start instant;
        // periodic reports fire last at theirs
        let current = self.valuations.last().is_some_and(|v| {
            v.time == final_time
                && (final_time != self.settings.start_time() || self.fired_events == 0)
        });
        if !current {
            if let Some(pipeline) = &self.pipeline {
                pipeline
                    .handle
                    .publish(SimEvent::Report(final_time))
                    .map_err(|e| EvolverError::TaskFailed(e.to_string()))?;
            }
            self.drain().await?;
        }

        let Pipeline {
            handle,
            orchestrator,
            listener,
            reports: _,
        } = self
            .pipeline
            .take()
            .ok_or_else(|| EvolverError::TaskFailed("pipeline not running".to_string()))?;
        drop(handle);

        let summary = orchestrator
            .await
            .map_err(|e| EvolverError::TaskFailed(format!("orchestrator: {}", e)))?;
        let output = listener
            .await
            .map_err(|e| EvolverError::TaskFailed(format!("order listener: {}", e)))?;

        let valuations = self.portfolio.read().await.valuations().to_vec();
        let (first, last) = match (valuations.first(), valuations.last()) {
            (Some(first), Some(last)) => (first, last.clone()),
            _ => return Err(EvolverError::TaskFailed("portfolio was never valued".to_string())),
        };
        let annualized_return = annualized_return(first, &last);

        info!(
            "[Evolver] finished at {}: {} confirmed, {} rejected, final value {}",
            final_time,
            output.counts.confirmed,
            output.counts.rejected,
            last.total_value()
        );

        self.state = EvolverState::Stopped;
        Ok(self.result.insert(EvolverResult {
            trades: output.ledgers.trades,
            decisions: output.ledgers.decisions,
            final_portfolio: last,
            valuations,
            annualized_return,
            outcomes: output.counts,
            pending_decisions: summary.pending,
            stopped_early: self.stopped_early,
        }))
    }

    pub async fn restart(&mut self) -> Result<()> {
        Err(EvolverError::Unsupported(ControlOperation::Restart))
    }

    /// Wait until everything published so far has been handled, then hand
    /// new valuations to the hooks
    async fn drain(&mut self) -> Result<()> {
        let Some(pipeline) = self.pipeline.as_mut() else {
            return Ok(());
        };

        let ack = pipeline
            .handle
            .flush()
            .map_err(|e| EvolverError::TaskFailed(e.to_string()))?;
        ack.await
            .map_err(|_| EvolverError::TaskFailed("pipeline dropped a flush".to_string()))?;

        while let Ok(status) = pipeline.reports.try_recv() {
            for hook in self.hooks.iter_mut() {
                hook(&status);
            }
            self.valuations.push(status);
        }
        Ok(())
    }

    fn expect_state(&self, operation: ControlOperation, allowed: &[EvolverState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(EvolverError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}
