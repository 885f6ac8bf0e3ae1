use augur_models::Candle;
use serde::Serialize;

/// Statistics over a window of candles, rendered into each persona prompt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketSummary {
    pub latest_close: f64,
    /// Latest close relative to the oldest close in the window, in percent.
    pub change_percent: f64,
    pub high: f64,
    pub low: f64,
    pub average_volume: f64,
    pub latest_volume: f64,
    pub candle_count: usize,
}

impl MarketSummary {
    /// Summarize candles ordered newest first. `None` when the window is empty.
    pub fn from_candles(candles: &[Candle]) -> Option<Self> {
        let latest = candles.first()?;
        let oldest = candles.last()?;

        let change_percent = if oldest.close > 0.0 {
            (latest.close - oldest.close) / oldest.close * 100.0
        } else {
            0.0
        };
        let high = candles.iter().map(|c| c.high).fold(f64::MIN, f64::max);
        let low = candles.iter().map(|c| c.low).fold(f64::MAX, f64::min);
        let average_volume = candles.iter().map(|c| c.volume).sum::<f64>() / candles.len() as f64;

        Some(Self {
            latest_close: latest.close,
            change_percent,
            high,
            low,
            average_volume,
            latest_volume: latest.volume,
            candle_count: candles.len(),
        })
    }

    pub fn render(&self) -> String {
        format!(
            "Current Price: ${}\n\
             Change: {:+.2}%\n\
             High: ${}\n\
             Low: ${}\n\
             Avg Volume: {}\n\
             Current Volume: {}\n\
             Candles: {}",
            group_thousands(self.latest_close, 2),
            self.change_percent,
            group_thousands(self.high, 2),
            group_thousands(self.low, 2),
            group_thousands(self.average_volume, 0),
            group_thousands(self.latest_volume, 0),
            self.candle_count,
        )
    }
}

/// Fixed-precision formatting with comma thousands separators: `64250.5` -> `64,250.50`.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match formatted.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (formatted.as_str(), None),
    };

    let mut grouped = String::with_capacity(formatted.len() + int_part.len() / 3 + 1);
    if value < 0.0 && !formatted.trim_matches(['0', '.']).is_empty() {
        grouped.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}
