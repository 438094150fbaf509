use serde::{Deserialize, Serialize};

/// Highest selectable minimum score.
pub const MAX_MIN_SCORE: u32 = 90;
/// Granularity of the minimum score.
pub const MIN_SCORE_STEP: u32 = 10;

/// Clamp a minimum score to `[0, 90]` and round it down to a multiple of 10.
///
/// Every place that accepts a score from the user goes through this.
pub fn snap_min_score(score: u32) -> u32 {
    let clamped = score.min(MAX_MIN_SCORE);
    clamped - clamped % MIN_SCORE_STEP
}

/// The article-listing filter set.
///
/// Empty strings and a zero score mean "unconstrained". Values are stored as
/// the user chose them; the backend is the authority on what they match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Filters {
    pub category: String,
    pub source: String,
    pub min_score: u32,
    pub search: String,
}

impl Filters {
    /// True when category, source or score narrows the listing.
    ///
    /// Free-text search is not counted.
    pub fn is_active(&self) -> bool {
        !self.category.is_empty() || !self.source.is_empty() || self.min_score > 0
    }

    /// Shallow merge: every field present in `patch` replaces the current value.
    pub fn merge(&self, patch: &FilterPatch) -> Filters {
        Filters {
            category: patch.category.clone().unwrap_or_else(|| self.category.clone()),
            source: patch.source.clone().unwrap_or_else(|| self.source.clone()),
            min_score: patch.min_score.unwrap_or(self.min_score),
            search: patch.search.clone().unwrap_or_else(|| self.search.clone()),
        }
    }
}

/// Partial update for [`Filters`]. `None` leaves a field untouched;
/// `Some(String::new())` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub category: Option<String>,
    pub source: Option<String>,
    pub min_score: Option<u32>,
    pub search: Option<String>,
}

impl FilterPatch {
    pub fn category(value: impl Into<String>) -> Self {
        Self {
            category: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn source(value: impl Into<String>) -> Self {
        Self {
            source: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn min_score(value: u32) -> Self {
        Self {
            min_score: Some(value),
            ..Self::default()
        }
    }

    pub fn search(value: impl Into<String>) -> Self {
        Self {
            search: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.source.is_none()
            && self.min_score.is_none()
            && self.search.is_none()
    }
}
