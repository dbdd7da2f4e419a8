// ============================================================================
// Series derivation: resampling, moving averages, chart assembly
// ============================================================================
// The API layer always returns daily candles. Weekly and monthly views are
// derived here by calendar bucketing, and moving averages are computed on
// the displayed (resampled) series so a weekly MA10 spans ten weeks.

use std::collections::VecDeque;

use chrono::Datelike;

use crate::models::candle::{Candle, CandleSeries, Interval};
use crate::models::markers::{TradeKind, TradeMarker};

/// Collapses daily candles into weekly (ISO week) or monthly buckets.
/// Each bucket keeps the first open, highest high, lowest low, last close
/// and summed volume, stamped with the bucket's last trading day.
pub fn resample(series: &CandleSeries, interval: Interval) -> CandleSeries {
    if matches!(interval, Interval::Daily) || series.is_empty() {
        let mut out = series.clone();
        out.interval = interval;
        return out;
    }

    let mut out = CandleSeries::new(&series.symbol, series.range, interval);
    let mut bucket: Option<(BucketKey, Candle)> = None;

    for candle in &series.candles {
        let key = BucketKey::for_candle(candle, interval);
        bucket = match bucket.take() {
            Some((current_key, mut acc)) if current_key == key => {
                acc.high = acc.high.max(candle.high);
                acc.low = acc.low.min(candle.low);
                acc.close = candle.close;
                acc.volume += candle.volume;
                acc.ts = candle.ts;
                Some((current_key, acc))
            }
            Some((_, acc)) => {
                out.push(acc);
                Some((key, candle.clone()))
            }
            None => Some((key, candle.clone())),
        };
    }
    if let Some((_, acc)) = bucket {
        out.push(acc);
    }
    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BucketKey {
    Week(i32, u32),
    Month(i32, u32),
}

impl BucketKey {
    fn for_candle(candle: &Candle, interval: Interval) -> Self {
        match interval {
            Interval::Weekly => {
                let week = candle.ts.iso_week();
                BucketKey::Week(week.year(), week.week())
            }
            _ => BucketKey::Month(candle.ts.year(), candle.ts.month()),
        }
    }
}

/// Incremental simple moving average. Yields a value only once the window
/// is full, so the first `window - 1` inputs produce nothing.
#[derive(Debug)]
pub struct MovingAverage {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
}

impl MovingAverage {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            values: VecDeque::with_capacity(window),
            sum: 0.0,
        }
    }

    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(dropped) = self.values.pop_front() {
                self.sum -= dropped;
            }
        }
        if self.values.len() == self.window {
            Some(self.sum / self.window as f64)
        } else {
            None
        }
    }
}

/// Moving-average overlay points over a series' closes. Each point keeps
/// the timestamp of the candle that completed its window, so overlays are
/// matched to the price series by time, never by index.
pub fn moving_average_points(series: &CandleSeries, window: usize) -> Vec<(f64, f64)> {
    let mut engine = MovingAverage::new(window);
    series
        .candles
        .iter()
        .filter_map(|c| {
            engine
                .push(c.close)
                .map(|avg| (c.ts.timestamp() as f64, avg))
        })
        .collect()
}

/// One volume bar, colored by the candle's direction.
#[derive(Debug, Clone)]
pub struct VolumeBar {
    pub ts: i64,
    pub volume: u64,
    pub advancing: bool,
}

/// Everything the chart screen draws. One collection per overlay; each
/// carries `(timestamp, value)` points and the collections may have
/// different lengths.
#[derive(Debug, Clone, Default)]
pub struct ChartData {
    pub price: Vec<(f64, f64)>,
    pub ma10: Vec<(f64, f64)>,
    pub ma20: Vec<(f64, f64)>,
    pub ma50: Vec<(f64, f64)>,
    pub buys: Vec<(f64, f64)>,
    pub sells: Vec<(f64, f64)>,
    pub volume: Vec<VolumeBar>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.price.is_empty()
    }

    /// Time-axis bounds from the price series.
    pub fn x_bounds(&self) -> (f64, f64) {
        match (self.price.first(), self.price.last()) {
            (Some((first, _)), Some((last, _))) => (*first, *last),
            _ => (0.0, 1.0),
        }
    }

    /// Price-axis bounds over the close line, the overlays and the trade
    /// markers, padded by 5% and clamped at zero.
    pub fn y_bounds(&self) -> (f64, f64) {
        let ys = self
            .price
            .iter()
            .chain(&self.ma10)
            .chain(&self.ma20)
            .chain(&self.ma50)
            .chain(&self.buys)
            .chain(&self.sells)
            .map(|(_, y)| *y);

        let (min, max) = ys.fold((f64::MAX, f64::MIN), |(lo, hi), y| {
            (lo.min(y), hi.max(y))
        });
        if min > max {
            return (0.0, 1.0);
        }
        let margin = (max - min).abs().max(1e-9) * 0.05;
        ((min - margin).max(0.0), max + margin)
    }

    pub fn max_volume(&self) -> u64 {
        self.volume.iter().map(|b| b.volume).max().unwrap_or(0)
    }
}

/// Builds the chart collections from a displayed series and the recorded
/// trades. Non-finite values are dropped rather than zero-filled, and
/// markers outside the series' time window are left out.
pub fn assemble(series: &CandleSeries, trades: &[TradeMarker]) -> ChartData {
    let price: Vec<(f64, f64)> = series
        .candles
        .iter()
        .map(|c| (c.ts.timestamp() as f64, c.close))
        .filter(|(_, y)| y.is_finite())
        .collect();

    let volume = series
        .candles
        .iter()
        .map(|c| VolumeBar {
            ts: c.ts.timestamp(),
            volume: c.volume,
            advancing: c.is_advancing(),
        })
        .collect();

    let window = match (price.first(), price.last()) {
        (Some((first, _)), Some((last, _))) => Some((*first, *last)),
        _ => None,
    };
    let marker_points = |kind: TradeKind| -> Vec<(f64, f64)> {
        trades
            .iter()
            .filter(|t| t.kind == kind)
            .map(|t| (t.timestamp() as f64, t.price))
            .filter(|(x, y)| {
                y.is_finite()
                    && window
                        .map(|(lo, hi)| *x >= lo && *x <= hi)
                        .unwrap_or(false)
            })
            .collect()
    };

    ChartData {
        ma10: moving_average_points(series, 10),
        ma20: moving_average_points(series, 20),
        ma50: moving_average_points(series, 50),
        buys: marker_points(TradeKind::Buy),
        sells: marker_points(TradeKind::Sell),
        price,
        volume,
    }
}

// ============================================================================
// Tests
// ============================================================================
