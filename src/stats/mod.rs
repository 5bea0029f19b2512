//! Network statistics and their rendering into channel names
//!
//! Values are fetched fresh every cycle, combined into [`StatReadings`] and
//! rendered per [`StatLabel`]. Anything that could not be fetched or derived
//! is [`MetricValue::Missing`] and renders as [`PLACEHOLDER`].

pub mod fetcher;
pub mod format;

use crate::error::FetchError;
use format::{format_grouped, format_hashrate};

pub use fetcher::StatsFetcher;

/// Text shown in place of a value that is not available this cycle
pub const PLACEHOLDER: &str = "N/A";

/// A single metric for one cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricValue {
    Missing,
    Numeric(f64),
}

impl MetricValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Missing => None,
            Self::Numeric(value) => Some(*value),
        }
    }
}

impl Default for MetricValue {
    fn default() -> Self {
        Self::Missing
    }
}

impl From<Option<f64>> for MetricValue {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Missing, Self::Numeric)
    }
}

impl<E> From<&Result<f64, E>> for MetricValue {
    fn from(result: &Result<f64, E>) -> Self {
        result.as_ref().ok().copied().into()
    }
}

impl std::fmt::Display for MetricValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "{}", PLACEHOLDER),
            Self::Numeric(value) => write!(f, "{}", value),
        }
    }
}

/// The stat channels, in the order they are updated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatLabel {
    Members,
    Difficulty,
    Hashrate,
    Block,
    Supply,
    Price,
    Volume24h,
    MarketCap,
}

impl StatLabel {
    pub const ALL: [StatLabel; 8] = [
        StatLabel::Members,
        StatLabel::Difficulty,
        StatLabel::Hashrate,
        StatLabel::Block,
        StatLabel::Supply,
        StatLabel::Price,
        StatLabel::Volume24h,
        StatLabel::MarketCap,
    ];

    /// Channel name prefix; also the key used to find the channel again
    pub fn label(&self) -> &'static str {
        match self {
            StatLabel::Members => "Members:",
            StatLabel::Difficulty => "Difficulty:",
            StatLabel::Hashrate => "Hashrate:",
            StatLabel::Block => "Block:",
            StatLabel::Supply => "Supply:",
            StatLabel::Price => "Price: $",
            StatLabel::Volume24h => "24h Volume: $",
            StatLabel::MarketCap => "Market Cap: $",
        }
    }

    /// Render a value for this label. `supply_unit` is appended to supply.
    pub fn format_value(&self, value: MetricValue, supply_unit: &str) -> String {
        let Some(value) = value.as_f64() else {
            return PLACEHOLDER.to_string();
        };

        match self {
            StatLabel::Members | StatLabel::Block => format_grouped(value, 0),
            StatLabel::Difficulty => format_grouped(value, 8),
            StatLabel::Hashrate => format_hashrate(value),
            StatLabel::Supply => format!("{} {}", format_grouped(value, 0), supply_unit),
            StatLabel::Price => format!("{:.8}", value),
            StatLabel::Volume24h | StatLabel::MarketCap => format_grouped(value, 2),
        }
    }

    /// Full channel name: `"<label> <formatted value>"`
    pub fn channel_name(&self, value: MetricValue, supply_unit: &str) -> String {
        format!("{} {}", self.label(), self.format_value(value, supply_unit))
    }
}

impl std::fmt::Display for StatLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Exchange market summary; only the two fields we display are kept.
///
/// The fields are decoded independently, so a reply missing `volume` still
/// yields a price.
#[derive(Debug)]
pub struct MarketSummary {
    pub last_price: Result<f64, FetchError>,
    pub volume: Result<f64, FetchError>,
}

impl MarketSummary {
    fn failure_count(&self) -> usize {
        usize::from(self.last_price.is_err()) + usize::from(self.volume.is_err())
    }
}

/// Raw outcome of one fetch round; each metric fails independently
#[derive(Debug)]
pub struct NetworkStats {
    pub difficulty: Result<f64, FetchError>,
    pub hashrate: Result<f64, FetchError>,
    pub block_count: Result<f64, FetchError>,
    pub supply: Result<f64, FetchError>,
    pub market: Result<MarketSummary, FetchError>,
}

impl NetworkStats {
    /// Number of metrics that could not be fetched this round.
    ///
    /// Price and volume count separately; a failed exchange call counts twice.
    pub fn failure_count(&self) -> usize {
        let explorer = [
            self.difficulty.is_err(),
            self.hashrate.is_err(),
            self.block_count.is_err(),
            self.supply.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count();

        explorer + self.market.as_ref().map_or(2, MarketSummary::failure_count)
    }

    pub fn price(&self) -> MetricValue {
        self.market
            .as_ref()
            .map_or(MetricValue::Missing, |m| MetricValue::from(&m.last_price))
    }

    /// Exchange volume in quote currency: `volume * last price`
    pub fn volume_24h(&self) -> MetricValue {
        let volume = self
            .market
            .as_ref()
            .map_or(MetricValue::Missing, |m| MetricValue::from(&m.volume));
        match (volume.as_f64(), self.price().as_f64()) {
            (Some(volume), Some(price)) => MetricValue::Numeric(volume * price),
            _ => MetricValue::Missing,
        }
    }
}

/// Every displayed value for one community, after derivation
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StatReadings {
    pub members: MetricValue,
    pub difficulty: MetricValue,
    pub hashrate: MetricValue,
    pub block: MetricValue,
    pub supply: MetricValue,
    pub price: MetricValue,
    pub volume_24h: MetricValue,
    pub market_cap: MetricValue,
}

impl StatReadings {
    /// Combine fetched network stats with the community's member count.
    pub fn from_stats(stats: &NetworkStats, members: MetricValue) -> Self {
        let supply = MetricValue::from(&stats.supply);
        let price = stats.price();
        let volume_24h = stats.volume_24h();

        Self {
            members,
            difficulty: MetricValue::from(&stats.difficulty),
            hashrate: MetricValue::from(&stats.hashrate),
            block: MetricValue::from(&stats.block_count),
            supply,
            price,
            volume_24h,
            market_cap: market_cap(supply, price),
        }
    }

    pub fn get(&self, label: StatLabel) -> MetricValue {
        match label {
            StatLabel::Members => self.members,
            StatLabel::Difficulty => self.difficulty,
            StatLabel::Hashrate => self.hashrate,
            StatLabel::Block => self.block,
            StatLabel::Supply => self.supply,
            StatLabel::Price => self.price,
            StatLabel::Volume24h => self.volume_24h,
            StatLabel::MarketCap => self.market_cap,
        }
    }

    /// `(label, channel name)` pairs in update order
    pub fn channel_names(&self, supply_unit: &str) -> Vec<(StatLabel, String)> {
        StatLabel::ALL
            .iter()
            .map(|label| (*label, label.channel_name(self.get(*label), supply_unit)))
            .collect()
    }
}

/// Market capitalisation: supply is rounded to whole coins before pricing,
/// and the product is rounded again.
pub fn market_cap(supply: MetricValue, price: MetricValue) -> MetricValue {
    match (supply.as_f64(), price.as_f64()) {
        (Some(supply), Some(price)) => MetricValue::Numeric((supply.round() * price).round()),
        _ => MetricValue::Missing,
    }
}
