//! Anomaly detection over transaction history.

use std::collections::BTreeMap;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::Flag;
use crate::domain::shared::{MoneyAmount, PortfolioId, Quantity, Symbol, Timestamp};
use crate::domain::transaction::{Transaction, TransactionState};

/// Detection thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnomalyConfig {
    /// Trailing period scanned, measured back from the newest transaction.
    pub lookback: Duration,
    /// Window for the velocity rule.
    pub velocity_window: Duration,
    /// Transactions allowed inside one velocity window.
    pub velocity_max: usize,
    /// Multiple of the trailing average notional that counts as outsized.
    pub size_multiple: Decimal,
    /// Prior transactions required before the size rule applies.
    pub size_min_samples: usize,
    /// Window for the oscillation rule.
    pub oscillation_window: Duration,
    /// BUY↔SELL reversals of one symbol inside the window that raise a flag.
    pub oscillation_min_reversals: usize,
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            lookback: Duration::from_secs(24 * 60 * 60),
            velocity_window: Duration::from_secs(10),
            velocity_max: 3,
            size_multiple: dec!(5),
            size_min_samples: 3,
            oscillation_window: Duration::from_secs(10 * 60),
            oscillation_min_reversals: 2,
        }
    }
}

/// Scans transaction history for suspicious patterns.
///
/// Pure: the same history always yields the same flags, and nothing is
/// blocked or mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnomalyDetector {
    config: AnomalyConfig,
}

/// A maximal run of windows whose score met the threshold:
/// `(first index, last index, peak score)`.
type Burst = (usize, usize, usize);

impl AnomalyDetector {
    /// Create a detector.
    #[must_use]
    pub const fn new(config: AnomalyConfig) -> Self {
        Self { config }
    }

    /// Detection thresholds.
    #[must_use]
    pub const fn config(&self) -> &AnomalyConfig {
        &self.config
    }

    /// Scan `history` and return every flag, velocity first, then size, then
    /// oscillation, each ordered by portfolio.
    ///
    /// Only COMPLETED transactions within the trailing lookback (measured back
    /// from the newest execution) are considered.
    #[must_use]
    pub fn scan(&self, history: &[Transaction]) -> Vec<Flag> {
        let mut completed: Vec<(&Transaction, Timestamp)> = history
            .iter()
            .filter(|tx| tx.state() == TransactionState::Completed)
            .filter_map(|tx| tx.executed_at().map(|at| (tx, at)))
            .collect();
        completed.sort_by_key(|(_, at)| *at);

        let Some(&(_, newest)) = completed.last() else {
            return Vec::new();
        };
        let cutoff = newest.minus(self.config.lookback);

        let mut by_portfolio: BTreeMap<&PortfolioId, Vec<(&Transaction, Timestamp)>> =
            BTreeMap::new();
        for (tx, at) in completed.into_iter().filter(|(_, at)| *at >= cutoff) {
            by_portfolio.entry(tx.portfolio_id()).or_default().push((tx, at));
        }

        let mut velocity = Vec::new();
        let mut size = Vec::new();
        let mut oscillation = Vec::new();
        for (portfolio_id, txs) in &by_portfolio {
            velocity.extend(self.velocity_flags(portfolio_id, txs));
            size.extend(self.size_flags(portfolio_id, txs));
            oscillation.extend(self.oscillation_flags(portfolio_id, txs));
        }

        velocity.extend(size);
        velocity.extend(oscillation);
        velocity
    }

    /// Returns true if [`scan`](Self::scan) finds anything.
    #[must_use]
    pub fn is_suspicious(&self, history: &[Transaction]) -> bool {
        !self.scan(history).is_empty()
    }

    fn velocity_flags(
        &self,
        portfolio_id: &PortfolioId,
        txs: &[(&Transaction, Timestamp)],
    ) -> Vec<Flag> {
        let times: Vec<Timestamp> = txs.iter().map(|(_, at)| *at).collect();
        let threshold = self.config.velocity_max.saturating_add(1);

        bursts(&times, self.config.velocity_window, threshold, |i, j| j - i + 1)
            .into_iter()
            .map(|(start, end, _)| Flag::Velocity {
                portfolio_id: portfolio_id.clone(),
                count: end - start + 1,
                window_start: times[start],
                window_end: times[end],
                transaction_ids: txs[start..=end].iter().map(|(tx, _)| tx.id().clone()).collect(),
            })
            .collect()
    }

    fn size_flags(&self, portfolio_id: &PortfolioId, txs: &[(&Transaction, Timestamp)]) -> Vec<Flag> {
        let mut flags = Vec::new();
        let mut total: Option<MoneyAmount> = None;
        let mut samples: u64 = 0;

        for (tx, _) in txs {
            let Some(notional) = tx.notional() else {
                continue;
            };

            if let Some(sum) = total {
                if samples >= self.config.size_min_samples as u64 {
                    let average = sum.div_units(Quantity::new(samples));
                    let limit = average.and_then(|avg| avg.mul_rate(self.config.size_multiple));
                    if let (Ok(average), Ok(limit)) = (average, limit) {
                        if notional.try_cmp(&limit).is_ok_and(|o| o.is_gt()) {
                            flags.push(Flag::Size {
                                portfolio_id: portfolio_id.clone(),
                                transaction_id: tx.id().clone(),
                                notional,
                                trailing_average: average.round_to_currency(),
                            });
                        }
                    }
                }
            }

            // Notionals in another currency cannot join the average.
            if let Ok(sum) = total.map_or(Ok(notional), |sum| sum.checked_add(&notional)) {
                total = Some(sum);
                samples += 1;
            }
        }

        flags
    }

    fn oscillation_flags(
        &self,
        portfolio_id: &PortfolioId,
        txs: &[(&Transaction, Timestamp)],
    ) -> Vec<Flag> {
        let mut per_symbol: BTreeMap<&Symbol, Vec<(&Transaction, Timestamp)>> = BTreeMap::new();
        for &(tx, at) in txs {
            per_symbol.entry(tx.symbol()).or_default().push((tx, at));
        }

        let mut flags = Vec::new();
        for (symbol, trades) in per_symbol {
            let times: Vec<Timestamp> = trades.iter().map(|(_, at)| *at).collect();
            // reversals[k] = side changes among trades[0..=k]
            let mut reversals = Vec::with_capacity(trades.len());
            let mut count = 0usize;
            for (k, (tx, _)) in trades.iter().enumerate() {
                if k > 0 && trades[k - 1].0.side() != tx.side() {
                    count += 1;
                }
                reversals.push(count);
            }

            let threshold = self.config.oscillation_min_reversals.max(1);
            for (start, end, peak) in bursts(&times, self.config.oscillation_window, threshold, |i, j| {
                reversals[j] - reversals[i]
            }) {
                flags.push(Flag::Oscillation {
                    portfolio_id: portfolio_id.clone(),
                    symbol: symbol.clone(),
                    reversals: peak,
                    window_start: times[start],
                    window_end: times[end],
                });
            }
        }
        flags
    }
}

/// Slide a window of length `window` over ascending `times`, scoring each
/// window `[i, j]` ending at `j`. Consecutive windows scoring at least
/// `threshold` merge into one burst.
fn bursts(
    times: &[Timestamp],
    window: Duration,
    threshold: usize,
    score: impl Fn(usize, usize) -> usize,
) -> Vec<Burst> {
    let mut out = Vec::new();
    let mut current: Option<Burst> = None;
    let mut i = 0;

    for j in 0..times.len() {
        while times[j].elapsed_since(times[i]) > window {
            i += 1;
        }
        let s = score(i, j);
        if s >= threshold {
            current = Some(match current {
                Some((start, _, peak)) => (start, j, peak.max(s)),
                None => (i, j, s),
            });
        } else if let Some(burst) = current.take() {
            out.push(burst);
        }
    }

    out.extend(current);
    out
}
