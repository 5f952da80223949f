use super::placer::RiskPlacer;
use crate::config::{BotConfig, TradingConfig};
use crate::exchange::{count_open, ExchangeGateway};
use crate::strategy::{Resolution, SignalResolver};
use std::future::Future;
use std::sync::Arc;

/// How a cycle ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CycleOutcome {
    /// Every symbol was visited (or the cap was hit mid-sweep)
    #[default]
    Completed,
    /// Balance read failed; no symbol was touched
    BalanceUnavailable,
    /// Position read failed; no symbol was touched
    PositionsUnavailable,
    /// Already at `max_positions`; no symbol was touched
    PositionCapReached,
}

/// Per-cycle counters, mostly for logging and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub outcome: CycleOutcome,
    pub balance: Option<f64>,
    pub open_positions: usize,
    pub symbols_scanned: usize,
    pub decisions: usize,
    pub orders_placed: usize,
    pub order_failures: usize,
    pub fetch_errors: usize,
    /// Sweep stopped early because the position cap was reached
    pub cap_reached: bool,
}

/// Sequential poll -> resolve -> place loop over a fixed symbol list
pub struct TradingLoop {
    gateway: Arc<dyn ExchangeGateway>,
    resolver: SignalResolver,
    placer: RiskPlacer,
    config: TradingConfig,
}

impl TradingLoop {
    pub fn new(gateway: Arc<dyn ExchangeGateway>, config: &BotConfig) -> Self {
        Self::with_resolver(gateway, SignalResolver::new(config), config)
    }

    pub fn with_resolver(
        gateway: Arc<dyn ExchangeGateway>,
        resolver: SignalResolver,
        config: &BotConfig,
    ) -> Self {
        Self {
            gateway,
            resolver,
            placer: RiskPlacer::new(config.risk.clone()),
            config: config.trading.clone(),
        }
    }

    /// One sweep over `symbols`
    ///
    /// Collaborator failures are logged and counted; nothing here is fatal.
    pub async fn run_cycle(&self, symbols: &[String]) -> CycleReport {
        let gateway = self.gateway.as_ref();
        let max_positions = self.config.max_positions;
        let mut report = CycleReport::default();

        match gateway.balance().await {
            Ok(balance) => {
                tracing::info!("💰 Balance: {:.2} USDT", balance);
                report.balance = Some(balance);
            }
            Err(e) => {
                tracing::warn!("Could not retrieve balance: {}. Check API connection.", e);
                report.outcome = CycleOutcome::BalanceUnavailable;
                return report;
            }
        }

        report.open_positions = match gateway.open_positions().await {
            Ok(positions) => count_open(&positions),
            Err(e) => {
                tracing::warn!("Could not retrieve open positions: {}", e);
                report.outcome = CycleOutcome::PositionsUnavailable;
                return report;
            }
        };
        tracing::info!("Open positions: {}/{}", report.open_positions, max_positions);

        if report.open_positions >= max_positions {
            tracing::info!("Position cap reached, skipping scan");
            report.outcome = CycleOutcome::PositionCapReached;
            return report;
        }

        for symbol in symbols {
            report.symbols_scanned += 1;

            let decision = match self.resolver.resolve(gateway, symbol).await {
                Ok(Resolution::Trade(decision)) => decision,
                Ok(Resolution::NoTrade(_)) => continue,
                Err(e) => {
                    tracing::warn!("[{}] Error fetching klines: {}", symbol, e);
                    report.fetch_errors += 1;
                    continue;
                }
            };
            report.decisions += 1;
            tracing::info!(
                "[{}] {} signal detected",
                symbol,
                decision.side.as_str().to_uppercase()
            );

            // positions may have changed since the cycle started
            match gateway.open_positions().await {
                Ok(positions) => {
                    report.open_positions = count_open(&positions);
                    if report.open_positions >= max_positions {
                        tracing::info!("Position cap reached, stopping sweep at {}", symbol);
                        report.cap_reached = true;
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!("[{}] Skipping order, positions unavailable: {}", symbol, e);
                    report.fetch_errors += 1;
                    continue;
                }
            }

            match self.placer.place(gateway, &decision).await {
                Ok(ack) => {
                    report.orders_placed += 1;
                    tracing::debug!("[{}] Order {} acknowledged", symbol, ack.order_id);
                    tokio::time::sleep(self.config.post_order_delay()).await;
                }
                Err(e) => {
                    tracing::error!("[{}] Error placing order: {}", symbol, e);
                    report.order_failures += 1;
                }
            }
        }

        report
    }

    /// Run cycles until `shutdown` resolves, sleeping `cycle_delay` between them
    pub async fn run<F>(&self, symbols: &[String], shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut cycles = 0;

        tracing::info!(
            "💹 Trading loop starting: {} symbols, {}m candles, max {} positions",
            symbols.len(),
            self.config.interval_minutes,
            self.config.max_positions
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                report = self.run_cycle(symbols) => {
                    cycles += 1;
                    log_summary(cycles, &report);
                }
            }

            tracing::info!(
                "Waiting {} seconds before the next check...",
                self.config.cycle_delay_secs
            );
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.cycle_delay()) => {}
            }
        }

        tracing::info!("Trading loop stopped after {} cycles", cycles);
        cycles
    }
}

fn log_summary(cycle: usize, report: &CycleReport) {
    match report.outcome {
        CycleOutcome::Completed => tracing::info!(
            "📊 Cycle {}: scanned {}, signals {}, orders {} ({} failed), fetch errors {}",
            cycle,
            report.symbols_scanned,
            report.decisions,
            report.orders_placed,
            report.order_failures,
            report.fetch_errors
        ),
        outcome => tracing::info!("📊 Cycle {}: no trading ({:?})", cycle, outcome),
    }
}
