use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Running star rating; `average` is 0.0 until the first review.
///
/// `star_total` and `review_count` are authoritative. The stored `average`
/// is recomputed from them on read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredRating")]
pub struct ContractorRating {
    pub average: f64,
    pub review_count: u32,
    pub star_total: f64,
}

impl ContractorRating {
    fn from_totals(star_total: f64, review_count: u32) -> Self {
        let average = if review_count == 0 {
            0.0
        } else {
            star_total / f64::from(review_count)
        };
        Self {
            average,
            review_count,
            star_total,
        }
    }

    /// Fold one more review into the average.
    pub fn with_review(self, stars: u8) -> Self {
        Self::from_totals(self.star_total + f64::from(stars), self.review_count + 1)
    }
}

#[derive(Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredRating {
    average: f64,
    review_count: u32,
    star_total: Option<f64>,
}

impl From<StoredRating> for ContractorRating {
    fn from(stored: StoredRating) -> Self {
        // Ratings written before totals were kept only carry the average.
        let star_total = stored
            .star_total
            .unwrap_or(stored.average * f64::from(stored.review_count));
        Self::from_totals(star_total, stored.review_count)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contractor {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    pub email: String,
    pub phone: String,
    pub trades: BTreeSet<String>,
    pub service_area: String,
    pub rating: ContractorRating,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub landlord_ids: Vec<String>,
}

impl Contractor {
    pub fn display_name(&self) -> &str {
        match self.company.as_deref() {
            Some(company) if !company.trim().is_empty() => company,
            _ => &self.name,
        }
    }

    pub fn offers(&self, trade: &str) -> bool {
        self.trades
            .iter()
            .any(|offered| offered.eq_ignore_ascii_case(trade))
    }
}
