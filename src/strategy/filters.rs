use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::types::MarketSnapshot;

fn default_countries() -> Vec<String> {
    vec!["GB".to_string(), "IE".to_string()]
}

fn default_min_runners() -> usize {
    2
}

fn default_exclude_inplay() -> bool {
    true
}

/// Market-level gate applied before any rule is evaluated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketFilter {
    /// Allowed event country codes; empty allows every country
    #[serde(default = "default_countries")]
    pub countries: Vec<String>,
    #[serde(default = "default_min_runners")]
    pub min_runners: usize,
    /// Upper bound on active runners; `None` or 0 means unbounded
    #[serde(default)]
    pub max_runners: Option<usize>,
    #[serde(default = "default_exclude_inplay")]
    pub exclude_inplay: bool,
    /// Case-insensitive venue substrings, at least one must match when set
    #[serde(default)]
    pub venue_contains: Vec<String>,
    /// Case-insensitive venue substrings that exclude the market
    #[serde(default)]
    pub venue_excludes: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for MarketFilter {
    fn default() -> Self {
        Self {
            countries: default_countries(),
            min_runners: default_min_runners(),
            max_runners: None,
            exclude_inplay: default_exclude_inplay(),
            venue_contains: Vec::new(),
            venue_excludes: Vec::new(),
            extra: Map::new(),
        }
    }
}

impl MarketFilter {
    /// Returns the reason the market is filtered out, or `None` if it passes
    pub fn check(&self, market: &MarketSnapshot) -> Option<String> {
        if self.exclude_inplay && market.inplay {
            return Some("In-play market excluded".to_string());
        }

        let active_count = market.active_runners().count();
        if active_count < self.min_runners {
            return Some(format!(
                "Only {} active runners (min: {})",
                active_count, self.min_runners
            ));
        }

        if let Some(max) = self.max_runners.filter(|m| *m > 0) {
            if active_count > max {
                return Some(format!("{} runners exceeds max ({})", active_count, max));
            }
        }

        if !self.countries.is_empty() && !self.countries.contains(&market.event_country) {
            return Some(format!(
                "Country {} not in {:?}",
                market.event_country, self.countries
            ));
        }

        let venue = market.venue.to_lowercase();
        if let Some(pattern) = self
            .venue_excludes
            .iter()
            .find(|p| venue.contains(&p.to_lowercase()))
        {
            return Some(format!(
                "Venue '{}' excluded by filter '{}'",
                market.venue, pattern
            ));
        }

        if !self.venue_contains.is_empty()
            && !self
                .venue_contains
                .iter()
                .any(|p| venue.contains(&p.to_lowercase()))
        {
            return Some(format!(
                "Venue '{}' matches none of {:?}",
                market.venue, self.venue_contains
            ));
        }

        None
    }
}
