//! Transit vocabulary shared by timetables and the fare engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An identifier scoped to the data feed it came from, so that ids from
/// different agencies' feeds never collide.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FeedScopedId {
    pub feed_id: String,
    pub id: String,
}

impl FeedScopedId {
    pub fn new(feed_id: impl Into<String>, id: impl Into<String>) -> Self {
        FeedScopedId {
            feed_id: feed_id.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for FeedScopedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.feed_id, self.id)
    }
}

/// A transit stop, carrying the fare zone it belongs to (if any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stop {
    pub id: FeedScopedId,
    pub name: String,
    /// Fare zone designator, e.g. `"1"`, `"2"`, or the boundary zone `"1/2"`.
    pub zone: Option<String>,
}

impl Stop {
    pub fn new(id: FeedScopedId, name: impl Into<String>, zone: Option<String>) -> Self {
        Stop {
            id,
            name: name.into(),
            zone,
        }
    }
}

/// A transit route operated by a single agency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: FeedScopedId,
    /// Identifier of the operating agency, the unit of ticket eligibility.
    pub agency_id: String,
    pub short_name: String,
    pub long_name: String,
}

impl Route {
    pub fn new(
        id: FeedScopedId,
        agency_id: impl Into<String>,
        short_name: impl Into<String>,
        long_name: impl Into<String>,
    ) -> Self {
        Route {
            id,
            agency_id: agency_id.into(),
            short_name: short_name.into(),
            long_name: long_name.into(),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.short_name.is_empty() {
            write!(f, "{}", self.long_name)
        } else {
            write!(f, "{}", self.short_name)
        }
    }
}
