use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{Config, MARKET_DATA_TIMEOUT_SECS};
use crate::error::Result;
use crate::types::{MarketTrend, MarketTrendSignal, TrendProvenance};

#[derive(Debug, Deserialize)]
struct TrendResponse {
    trend: Option<String>,
}

#[derive(Debug, Clone, Copy)]
struct CachedTrend {
    /// `None` records that the API had no directional read for the pair.
    trend: Option<MarketTrend>,
    fetched_at: Instant,
}

/// Client for the external market trend API with a per-pair TTL cache.
/// Lookups never fail the caller: any error means "no trend".
pub struct MarketData {
    client: reqwest::Client,
    base_url: Option<String>,
    ttl: Duration,
    /// normalized pair (e.g. "EURUSD") → last fetched trend
    cache: DashMap<String, CachedTrend>,
}

impl MarketData {
    pub fn new(cfg: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(MARKET_DATA_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.market_data_url.clone(),
            ttl: Duration::from_secs(cfg.market_trend_ttl_secs),
            cache: DashMap::new(),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }

    /// Current trend for a currency pair, from cache when still fresh.
    pub async fn trend_for(&self, pair: &str) -> Option<MarketTrendSignal> {
        let base_url = self.base_url.as_deref()?;
        let key = normalize_pair(pair);

        if let Some(cached) = self.cache.get(&key).map(|c| *c) {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(pair = %key, "Market trend cache hit");
                return cached.trend.map(|trend| MarketTrendSignal {
                    trend,
                    provenance: TrendProvenance::Cached,
                });
            }
        }

        match self.fetch_trend(base_url, &key).await {
            Ok(trend) => {
                self.remember(&key, trend);
                trend.map(|trend| MarketTrendSignal {
                    trend,
                    provenance: TrendProvenance::Live,
                })
            }
            Err(e) => {
                warn!(pair = %key, "Market trend lookup failed: {e}");
                None
            }
        }
    }

    fn remember(&self, key: &str, trend: Option<MarketTrend>) {
        self.cache.insert(
            key.to_string(),
            CachedTrend {
                trend,
                fetched_at: Instant::now(),
            },
        );
    }

    async fn fetch_trend(&self, base_url: &str, pair: &str) -> Result<Option<MarketTrend>> {
        let url = format!("{base_url}/trend");
        let resp: TrendResponse = self
            .client
            .get(&url)
            .query(&[("pair", pair)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.trend.as_deref().and_then(MarketTrend::parse))
    }
}

/// "eur/usd" and "EURUSD" share a cache entry.
fn normalize_pair(pair: &str) -> String {
    pair.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}
