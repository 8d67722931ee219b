//! Offset pagination for list queries.

use crate::error::ValidationError;

/// A window over an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 1000;

    /// Build a page from optional query parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidLimit`] when `limit` is outside
    /// `1..=1000`.
    pub fn new(skip: Option<u32>, limit: Option<u32>) -> Result<Self, ValidationError> {
        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT);
        if !(1..=Self::MAX_LIMIT).contains(&limit) {
            return Err(ValidationError::InvalidLimit {
                max: Self::MAX_LIMIT,
            });
        }
        Ok(Self {
            skip: skip.unwrap_or(0),
            limit,
        })
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_first_hundred() {
        let page = Page::new(None, None).unwrap();
        assert_eq!(page, Page { skip: 0, limit: 100 });
    }

    #[test]
    fn should_reject_zero_and_oversized_limits() {
        assert!(Page::new(None, Some(0)).is_err());
        assert!(Page::new(None, Some(1001)).is_err());
        assert!(Page::new(Some(5), Some(1000)).is_ok());
    }
}
