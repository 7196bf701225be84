// Output formatting — terminal tables.

pub mod terminal;

use chrono::{DateTime, Utc};

use crate::ids::TweetId;
use crate::snowflake;

/// Human-readable age of a tweet as of `now`, from its Snowflake timestamp.
///
/// Ids minted after `now` (clock skew, or a replayed `--at` time) show as
/// "future".
pub fn format_age(tweet_id: TweetId, now: DateTime<Utc>) -> String {
    let Some(created) = snowflake::timestamp_of(tweet_id) else {
        return "?".to_string();
    };
    let age = now.signed_duration_since(created);
    if age.num_milliseconds() < 0 {
        return "future".to_string();
    }
    let days = age.num_days();
    let hours = age.num_hours() % 24;
    let minutes = age.num_minutes() % 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}
