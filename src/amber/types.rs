use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Direction of an energy reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelType {
    /// Consumption from the grid
    General,
    /// Separately metered load (hot water etc.)
    ControlledLoad,
    /// Export to the grid
    FeedIn,
    #[serde(other)]
    Unknown,
}

/// Qualitative price band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceDescriptor {
    Negative,
    ExtremelyLow,
    VeryLow,
    Low,
    Neutral,
    High,
    Spike,
    #[default]
    #[serde(other)]
    Unknown,
}

impl PriceDescriptor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::ExtremelyLow => "extremelyLow",
            Self::VeryLow => "veryLow",
            Self::Low => "low",
            Self::Neutral => "neutral",
            Self::High => "high",
            Self::Spike => "spike",
            Self::Unknown => "unknown",
        }
    }
}

/// Whether a price interval is settled, current or forecast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntervalKind {
    ActualInterval,
    CurrentInterval,
    ForecastInterval,
    #[serde(other)]
    Unknown,
}

/// Metered usage for one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageInterval {
    pub start_time: DateTime<Utc>,
    pub channel_type: ChannelType,
    /// Energy in kWh; feed-in readings are zero or negative
    #[serde(default, deserialize_with = "null_as_zero")]
    pub kwh: f64,
    /// Cost in cents
    #[serde(default, deserialize_with = "null_as_zero")]
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_identifier: Option<String>,
}

/// Price for one interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceInterval {
    pub start_time: DateTime<Utc>,
    pub channel_type: ChannelType,
    /// Retail price in c/kWh
    #[serde(default, deserialize_with = "null_as_zero")]
    pub per_kwh: f64,
    /// Wholesale spot price in c/kWh
    #[serde(default, deserialize_with = "null_as_zero")]
    pub spot_per_kwh: f64,
    /// Renewable share of grid generation, 0-100
    #[serde(default, deserialize_with = "null_as_zero")]
    pub renewables: f64,
    #[serde(default)]
    pub descriptor: PriceDescriptor,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<IntervalKind>,
}

/// Site lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SiteStatus {
    Pending,
    Active,
    Closed,
    #[serde(other)]
    Unknown,
}

/// A metered site on the account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub status: SiteStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nmi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval_length: Option<u32>,
}

/// Window for the current-prices endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CurrentPriceOptions {
    /// Intervals before the current one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous: Option<u32>,
    /// Intervals after the current one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
    /// Minutes per interval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<u32>,
}

impl CurrentPriceOptions {
    /// Query pairs for the options that are set
    pub(crate) fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(next) = self.next {
            pairs.push(("next", next.to_string()));
        }
        if let Some(previous) = self.previous {
            pairs.push(("previous", previous.to_string()));
        }
        if let Some(resolution) = self.resolution {
            pairs.push(("resolution", resolution.to_string()));
        }
        pairs
    }
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}
