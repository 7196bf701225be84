// Snowflake id <-> time conversion.
//
// Tweet ids carry their creation time in the high bits: milliseconds since
// the Twitter epoch, shifted left past the worker and sequence bits. That lets
// the scorer bound candidate age by comparing ids, without ever looking up a
// timestamp.

use chrono::{DateTime, Utc};

use crate::ids::TweetId;

/// Milliseconds since the Unix epoch at 2010-11-04T01:42:54.657Z.
pub const TWITTER_EPOCH_MS: i64 = 1_288_834_974_657;

/// Bits below the timestamp (worker id + sequence).
pub const TIMESTAMP_SHIFT: u32 = 22;

/// Largest millisecond offset that still fits in the 63-bit id space.
const MAX_OFFSET_MS: i64 = i64::MAX >> TIMESTAMP_SHIFT;

/// Converts a wall-clock instant into the first id that could have been
/// minted at or after it.
pub trait IdMinter: Send + Sync {
    fn first_id_for(&self, time: DateTime<Utc>) -> TweetId;
}

/// The standard Snowflake layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SnowflakeIds;

impl IdMinter for SnowflakeIds {
    fn first_id_for(&self, time: DateTime<Utc>) -> TweetId {
        first_id_for(time)
    }
}

/// First Snowflake id for `time`. Instants at or before the epoch map to 0.
pub fn first_id_for(time: DateTime<Utc>) -> TweetId {
    let offset = time.timestamp_millis().saturating_sub(TWITTER_EPOCH_MS);
    if offset <= 0 {
        return 0;
    }
    (offset.min(MAX_OFFSET_MS) as u64) << TIMESTAMP_SHIFT
}

/// Unix milliseconds encoded in a Snowflake id.
pub fn unix_time_millis(id: TweetId) -> i64 {
    ((id >> TIMESTAMP_SHIFT) as i64) + TWITTER_EPOCH_MS
}

/// Creation time encoded in a Snowflake id.
pub fn timestamp_of(id: TweetId) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(unix_time_millis(id))
}
