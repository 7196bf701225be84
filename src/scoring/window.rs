// Candidate age window, expressed as an inclusive Snowflake id range.
//
// Ids encode their creation time, so "between min and max hours old" becomes
// "id between first_id_for(now - max) and first_id_for(now - min)".

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::config::ScoringConfig;
use crate::ids::TweetId;
use crate::snowflake::IdMinter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CandidateWindow {
    pub earliest_allowed_id: TweetId,
    pub latest_allowed_id: TweetId,
}

impl CandidateWindow {
    /// Derive the window for `config` as of `now`.
    ///
    /// A max age at or above the system ceiling drops the lower bound to 0.
    pub fn derive(now: DateTime<Utc>, config: &ScoringConfig, minter: &dyn IdMinter) -> Self {
        let latest_allowed_id =
            minter.first_id_for(hours_before(now, config.min_tweet_candidate_age_hours()));
        let earliest_allowed_id = if config.unbounded_max_age() {
            0
        } else {
            minter.first_id_for(hours_before(now, config.max_tweet_candidate_age_hours()))
        };
        Self {
            earliest_allowed_id,
            latest_allowed_id,
        }
    }

    pub fn contains(&self, tweet_id: TweetId) -> bool {
        self.earliest_allowed_id <= tweet_id && tweet_id <= self.latest_allowed_id
    }

    /// True when no id can pass (min age greater than max age).
    pub fn is_empty(&self) -> bool {
        self.earliest_allowed_id > self.latest_allowed_id
    }
}

fn hours_before(now: DateTime<Utc>, hours: u32) -> DateTime<Utc> {
    now.checked_sub_signed(Duration::hours(i64::from(hours)))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
