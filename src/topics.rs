//! Topic identity.
//!
//! Single-instance sensors publish on their bare base topic.  When more
//! than one identical channel is configured each gets a zero-based
//! `/<index>` suffix matching its configuration order.

use crate::error::CommandError;

/// Topic for channel `index` of `count` channels sharing `base`.
pub fn channel_topic(base: &str, index: usize, count: usize) -> String {
    if count > 1 {
        format!("{base}/{index}")
    } else {
        base.to_string()
    }
}

/// Every channel topic under `base`, in index order.
pub fn channel_topics(base: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| channel_topic(base, i, count)).collect()
}

/// Recover the channel index from a topic under `base`.
///
/// The bare base resolves to channel 0 when only one channel exists.
pub fn parse_channel(topic: &str, base: &str, count: usize) -> Result<usize, CommandError> {
    let rest = topic.strip_prefix(base).ok_or(CommandError::UnknownTopic)?;

    if rest.is_empty() {
        return if count == 1 {
            Ok(0)
        } else {
            Err(CommandError::BadIndex)
        };
    }

    let suffix = rest.strip_prefix('/').ok_or(CommandError::UnknownTopic)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CommandError::BadIndex);
    }
    // Only the canonical form names a channel: no leading zeros, and no
    // suffix at all when the base is a single channel.
    if (suffix.len() > 1 && suffix.starts_with('0')) || count == 1 {
        return Err(CommandError::BadIndex);
    }
    let index: usize = suffix.parse().map_err(|_| CommandError::BadIndex)?;
    if index >= count {
        return Err(CommandError::IndexOutOfRange(index));
    }
    Ok(index)
}
