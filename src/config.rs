// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Engine configuration.

use crate::base::MS_PER_HOUR;
use crate::pricing::PRICE_SCALE;
use serde::{Deserialize, Serialize};

/// Tunables of the booking engine.
///
/// # Example
///
/// ```
/// use bike_rental_rs::EngineConfig;
///
/// let config = EngineConfig::default().with_cancellation_notice_hours(24);
/// assert_eq!(config.cancellation_notice, Some(24 * 3_600_000));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Decimal places kept in booking prices.
    pub price_scale: u32,
    /// Minimum time, in milliseconds, between cancelling a booking and its
    /// start. `None` allows cancelling at any time, even after the start.
    pub cancellation_notice: Option<i64>,
    /// Number of bike ids reported in a daily summary.
    pub popular_bikes_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            price_scale: PRICE_SCALE,
            cancellation_notice: None,
            popular_bikes_limit: 5,
        }
    }
}

impl EngineConfig {
    pub fn with_price_scale(mut self, scale: u32) -> Self {
        self.price_scale = scale;
        self
    }

    pub fn with_cancellation_notice(mut self, millis: i64) -> Self {
        self.cancellation_notice = Some(millis);
        self
    }

    /// Hours are converted to milliseconds, saturating at the `i64` bounds.
    pub fn with_cancellation_notice_hours(self, hours: i64) -> Self {
        self.with_cancellation_notice(hours.saturating_mul(MS_PER_HOUR))
    }

    pub fn with_popular_bikes_limit(mut self, limit: usize) -> Self {
        self.popular_bikes_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notice_hours_convert_to_millis() {
        let config = EngineConfig::default().with_cancellation_notice_hours(2);
        assert_eq!(config.cancellation_notice, Some(2 * MS_PER_HOUR));
    }

    #[test]
    fn huge_notice_hours_saturate() {
        let config = EngineConfig::default().with_cancellation_notice_hours(i64::MAX);
        assert_eq!(config.cancellation_notice, Some(i64::MAX));

        let config = EngineConfig::default().with_cancellation_notice_hours(i64::MIN);
        assert_eq!(config.cancellation_notice, Some(i64::MIN));
    }
}
