//! Channel and loop index translation
//!
//! Users address channels and loops starting at 1; the automation
//! interface expects 0-based indices. Translation never clamps: anything
//! that is not an integer >= 1 is rejected before the vendor is called.

use crate::{Error, Result};

/// Convert a user-supplied 1-based channel number to the 0-based index.
///
/// Accepts the raw query or body text so that non-integer input is
/// reported the same way as out-of-range input.
pub fn convert_channel_to_com_index(channel_user: &str) -> Result<usize> {
    let channel: i64 = channel_user.trim().parse().map_err(|_| {
        Error::InvalidParameter("Invalid channel parameter - must be an integer".to_string())
    })?;
    com_index_from_user(channel)
        .ok_or_else(|| Error::InvalidParameter("Channel parameter must be >= 1".to_string()))
}

/// 1-based number to 0-based index, `None` below 1
pub fn com_index_from_user(number: i64) -> Option<usize> {
    if number < 1 {
        None
    } else {
        usize::try_from(number - 1).ok()
    }
}

/// A user-facing number paired with the index sent to the vendor.
///
/// Responses echo both so callers can see the translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TranslatedIndex {
    pub user: i64,
    pub com: usize,
}

impl TranslatedIndex {
    /// Parse and translate a named 1-based parameter (`channelnum`, `loopnum`, ...)
    pub fn parse(name: &str, raw: &str) -> Result<Self> {
        let user: i64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::InvalidParameter(format!("{} must be an integer", name)))?;
        let com = com_index_from_user(user).ok_or_else(|| {
            Error::InvalidParameter(format!(
                "{} must be >= 1 (1-based indexing), got {}",
                name, user
            ))
        })?;
        Ok(Self { user, com })
    }

    /// Reject indices beyond the hardware's channel count
    pub fn check_range(self, name: &str, count: usize) -> Result<Self> {
        if self.com >= count {
            return Err(Error::NotFound(format!(
                "{} {} out of range - must be 1 to {} (1-based)",
                name, self.user, count
            )));
        }
        Ok(self)
    }
}
