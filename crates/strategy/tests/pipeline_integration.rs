//! Strategy Pipeline Integration Test
//!
//! Wires a decision provider, the orchestrator task and the order listener
//! together and drives them with hand-published events:
//! 1. BuyAll over a single stock valued on 2024-01-01 yields one buy, no sells
//! 2. A flush acknowledges only after the listener settled earlier trades

use chrono::{NaiveTime, TimeZone, Utc};
use evolver_core::{
    Candle, DecisionSystemSettings, ExchangeSnapshot, SimEvent, Side, Stock, Timestamp,
};
use evolver_exchange::{ExchangePriceService, MarketExchange};
use evolver_order_manager::{
    CashPortfolio, OrderListener, PortfolioSettings, PositionSizing, share_portfolio,
};
use evolver_ports::EventSink;
use evolver_strategy::{DecisionKind, ExecutionPolicy, StrategyOrchestrator, build_decider};
use rust_decimal_macros::dec;
use std::sync::Arc;

fn new_year() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

fn single_stock_exchange() -> Arc<ExchangeSnapshot> {
    Arc::new(ExchangeSnapshot {
        name: "SINGLE".to_string(),
        country_code: "US".to_string(),
        open_time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
        close_time: NaiveTime::from_hms_opt(21, 0, 0).unwrap(),
        stocks: vec![Stock::new(
            "ONLY",
            "Only Stock",
            vec![Candle::flat(new_year(), dec!(100))],
        )],
    })
}

#[tokio::test]
async fn test_buy_all_single_stock_single_day() {
    let _ = env_logger::builder().is_test(true).try_init();

    let exchange = single_stock_exchange();
    let prices = Arc::new(ExchangePriceService::new(exchange.clone(), dec!(0)));
    let portfolio = share_portfolio(
        CashPortfolio::new(
            dec!(10000),
            PortfolioSettings {
                sizing: PositionSizing::FixedShares(10),
                fixed_trade_cost: dec!(0),
            },
        )
        .unwrap(),
    );

    let (listener_tx, listener_task) =
        OrderListener::new(portfolio.clone(), prices, MarketExchange::default()).spawn();
    let orchestrator = StrategyOrchestrator::new(
        build_decider(DecisionKind::BuyAll, 0, 0),
        DecisionSystemSettings::new(new_year(), exchange),
        ExecutionPolicy::LogExecution,
        listener_tx,
    )
    .unwrap();
    let (handle, orchestrator_task) = orchestrator.spawn();

    handle.publish(SimEvent::TimeIncrement(new_year())).unwrap();
    handle.flush().unwrap().await.unwrap();

    // The trade settled before the barrier released
    assert_eq!(portfolio.read().await.available_funds(new_year()), dec!(9000));

    drop(handle);
    let summary = orchestrator_task.await.unwrap();
    let output = listener_task.await.unwrap();

    assert_eq!(summary.decisions, 1);
    let decisions: Vec<_> = output.ledgers.decisions.iter().collect();
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].0, new_year());
    assert_eq!(decisions[0].1.side, Side::Buy);
    assert_eq!(
        output
            .ledgers
            .decisions
            .iter()
            .filter(|(_, t)| t.side == Side::Sell)
            .count(),
        0
    );
    assert!(output.counts.is_balanced());
}

#[tokio::test]
async fn test_decisions_before_valuation_are_empty() {
    let exchange = single_stock_exchange();
    let prices = Arc::new(ExchangePriceService::new(exchange.clone(), dec!(0)));
    let portfolio = share_portfolio(CashPortfolio::new(dec!(100), PortfolioSettings::default()).unwrap());

    let (listener_tx, listener_task) =
        OrderListener::new(portfolio, prices, MarketExchange::default()).spawn();
    let (handle, orchestrator_task) = StrategyOrchestrator::new(
        build_decider(DecisionKind::SellAll, 0, 0),
        DecisionSystemSettings::new(new_year(), exchange),
        ExecutionPolicy::LogExecution,
        listener_tx,
    )
    .unwrap()
    .spawn();

    // Day after the only valuation: nothing valued, nothing decided
    handle
        .publish(SimEvent::TimeIncrement(new_year() + chrono::Duration::days(1)))
        .unwrap();
    drop(handle);

    assert_eq!(orchestrator_task.await.unwrap().decisions, 0);
    assert!(listener_task.await.unwrap().ledgers.is_empty());
}
