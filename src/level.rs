//! Shared three-level alert ordering used by OAD, VAD and the stress index.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AlertLevel {
    Ok,
    Warn,
    Danger,
}

impl AlertLevel {
    pub fn max(self, other: Self) -> Self {
        std::cmp::max(self, other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_ok_lt_warn_lt_danger() {
        assert!(AlertLevel::Ok < AlertLevel::Warn);
        assert!(AlertLevel::Warn < AlertLevel::Danger);
        assert_eq!(AlertLevel::Ok.max(AlertLevel::Danger), AlertLevel::Danger);
    }
}
