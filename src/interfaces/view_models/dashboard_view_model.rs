use crate::domain::market::Horizon;
use crate::domain::stats::{AccountStats, HorizonStats, IndexStats};
use rust_decimal::Decimal;

/// Direction of a change, drives the row color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Up,
    Down,
    Flat,
}

impl Tone {
    pub fn of(change: f64) -> Self {
        if change > 0.0 {
            Tone::Up
        } else if change < 0.0 {
            Tone::Down
        } else {
            Tone::Flat
        }
    }
}

/// One index row: a small stats table plus the sparkline source.
#[derive(Debug, Clone, PartialEq)]
pub struct HorizonView {
    pub title: String,
    pub change: String,
    pub tone: Tone,
    pub cells: Vec<(String, String)>,
    pub closes: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AccountView {
    pub title: String,
    pub subtitle: String,
    pub rows: Vec<(&'static str, String)>,
    /// Min theta target above max; shown, not corrected.
    pub theta_inverted: bool,
}

/// `+2.00 (+10.00%)`
pub fn format_change(change: f64, change_percent: f64) -> String {
    format!("{:+.2} ({:+.2}%)", change, change_percent * 100.0)
}

/// Two decimals with thousands separators: `125,000.00`.
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

fn format_percent(fraction: Decimal) -> String {
    format!("{}%", (fraction * Decimal::ONE_HUNDRED).normalize())
}

pub struct DashboardViewModel;

impl DashboardViewModel {
    /// Rows in display order: 24-day, 5-day, 1-day.
    pub fn horizons(index: &IndexStats) -> Vec<HorizonView> {
        Horizon::ALL
            .iter()
            .map(|&h| Self::horizon(index, index.horizon(h)))
            .collect()
    }

    fn horizon(index: &IndexStats, stats: &HorizonStats) -> HorizonView {
        let mut cells = vec![
            ("open".to_string(), format!("{:.2}", stats.open)),
            ("rank".to_string(), format!("{:.1}", stats.iv_rank)),
            ("low".to_string(), format!("{:.2}", stats.low)),
            ("high".to_string(), format!("{:.2}", stats.high)),
        ];
        if stats.horizon == Horizon::OneDay {
            cells.insert(0, ("last".to_string(), format!("{:.2}", index.last)));
        }

        HorizonView {
            title: format!("{} {}", index.symbol, stats.horizon.label()),
            change: format_change(stats.change, stats.change_percent),
            tone: Tone::of(stats.change),
            cells,
            closes: stats.closes.clone(),
        }
    }

    pub fn account(stats: &AccountStats) -> AccountView {
        AccountView {
            title: if stats.nickname.is_empty() {
                stats.account_number.clone()
            } else {
                stats.nickname.clone()
            },
            subtitle: stats.account_number.clone(),
            rows: vec![
                ("net liq", format_money(stats.net_liquidating_value)),
                (
                    "cash or low risk",
                    format!(
                        "{} ({})",
                        format_money(stats.cash_or_low_risk),
                        format_percent(stats.cash_or_low_risk_percent)
                    ),
                ),
                (
                    "max short premium",
                    format!(
                        "{} ({})",
                        format_money(stats.max_short_premium),
                        format_percent(stats.max_short_premium_percent)
                    ),
                ),
                ("max undefined risk", format_money(stats.max_undefined_risk_bpr)),
                ("max defined risk", format_money(stats.max_defined_risk_bpr)),
                ("max portfolio theta", stats.portfolio_theta_max.to_string()),
                ("min portfolio theta", stats.portfolio_theta_min.to_string()),
            ],
            theta_inverted: stats.theta_range_inverted(),
        }
    }

    /// Fits `values` into `width` columns, keeping each bucket's maximum, and
    /// shifts them so the series minimum sits at zero (sparklines need `u64`).
    pub fn sparkline(values: &[f64], width: usize) -> Vec<u64> {
        let buckets = downsample_max(values, width);
        let min = buckets.iter().copied().fold(f64::INFINITY, f64::min);
        buckets
            .iter()
            .map(|v| ((v - min) * 100.0).round().max(0.0) as u64)
            .collect()
    }
}

/// Max-per-bucket downsampling. Returns `values` unchanged when it already fits.
pub fn downsample_max(values: &[f64], width: usize) -> Vec<f64> {
    if width == 0 || values.is_empty() {
        return Vec::new();
    }
    if values.len() <= width {
        return values.to_vec();
    }

    (0..width)
        .map(|bucket| {
            let start = bucket * values.len() / width;
            let end = ((bucket + 1) * values.len() / width).max(start + 1);
            values[start..end]
                .iter()
                .copied()
                .fold(f64::NEG_INFINITY, f64::max)
        })
        .collect()
}
