//! Tunables for the data provider, deserialised from the server config.

use std::time::Duration;

use serde::Deserialize;

/// Admission-control settings for outbound store calls.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
  /// Calls admitted per batch.
  pub max_concurrent:         usize,
  /// Pause each admitted call takes before it reaches the store.
  pub inter_request_delay_ms: u64,
}

impl Default for ThrottleConfig {
  fn default() -> Self {
    Self { max_concurrent: 2, inter_request_delay_ms: 500 }
  }
}

impl ThrottleConfig {
  pub fn inter_request_delay(&self) -> Duration {
    Duration::from_millis(self.inter_request_delay_ms)
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
  pub throttle:              ThrottleConfig,
  /// Reference currency for multi-currency purchase-order totals.
  pub base_currency:         String,
  /// Product ids per image lookup.
  pub image_batch_size:      usize,
  /// Line items resolved together on a purchase-order detail read.
  pub item_batch_size:       usize,
  pub default_page_size:     u64,
  pub max_page_size:         u64,
  /// Products per list page that receive secondary enrichment.
  pub max_products_enriched: usize,
  /// Buffered events per subscriber before the oldest are dropped.
  pub event_capacity:        usize,
}

impl Default for ProviderConfig {
  fn default() -> Self {
    Self {
      throttle:              ThrottleConfig::default(),
      base_currency:         "TZS".to_owned(),
      image_batch_size:      10,
      item_batch_size:       5,
      default_page_size:     50,
      max_page_size:         100,
      max_products_enriched: 50,
      event_capacity:        256,
    }
  }
}
