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

//! Rental pricing.
//!
//! A rental shorter than a day is billed by the hour. Longer rentals are
//! billed per full day, and the leftover hours are billed hourly but capped
//! at one daily rate, so a partial day never costs more than a whole one.
//!
//! All arithmetic uses [`Decimal`]; the final amount is rounded to
//! [`PRICE_SCALE`] places with banker's rounding (round half to even).
//!
//! # Example
//!
//! ```
//! use bike_rental_rs::pricing::calculate_price;
//! use rust_decimal_macros::dec;
//!
//! const HOUR: i64 = 3_600_000;
//! let price = calculate_price(0, 25 * HOUR, dec!(10), dec!(50)).unwrap();
//! assert_eq!(price, dec!(60));
//! ```

use crate::base::{MS_PER_HOUR, Timestamp};
use crate::error::BookingError;
use crate::interval::TimeRange;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Decimal places kept in a computed price (minor currency unit).
pub const PRICE_SCALE: u32 = 2;

const HOURS_PER_DAY: Decimal = dec!(24);

/// Hourly and daily rates of a bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateSchedule {
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
}

impl RateSchedule {
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRate`] if either rate is negative.
    pub fn new(price_per_hour: Decimal, price_per_day: Decimal) -> Result<Self, BookingError> {
        let rates = Self {
            price_per_hour,
            price_per_day,
        };
        rates.validate()?;
        Ok(rates)
    }

    pub fn validate(&self) -> Result<(), BookingError> {
        if self.price_per_hour < Decimal::ZERO || self.price_per_day < Decimal::ZERO {
            return Err(BookingError::InvalidRate);
        }
        Ok(())
    }

    /// Prices `range` rounded to [`PRICE_SCALE`] places.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PriceOverflow`] if the price exceeds [`Decimal::MAX`].
    pub fn quote(&self, range: &TimeRange) -> Result<Decimal, BookingError> {
        self.quote_with_scale(range, PRICE_SCALE)
    }

    /// Prices `range` rounded to `scale` places.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::PriceOverflow`] if the price exceeds [`Decimal::MAX`].
    pub fn quote_with_scale(
        &self,
        range: &TimeRange,
        scale: u32,
    ) -> Result<Decimal, BookingError> {
        let total_hours = Decimal::from(range.duration_ms()) / Decimal::from(MS_PER_HOUR);

        let price = if total_hours < HOURS_PER_DAY {
            total_hours.checked_mul(self.price_per_hour)
        } else {
            let full_days = (total_hours / HOURS_PER_DAY).floor();
            let remaining_hours = total_hours - full_days * HOURS_PER_DAY;
            // An overflowing hourly remainder is above any daily rate.
            let partial_day = remaining_hours
                .checked_mul(self.price_per_hour)
                .map_or(self.price_per_day, |hourly| hourly.min(self.price_per_day));
            full_days
                .checked_mul(self.price_per_day)
                .and_then(|days| days.checked_add(partial_day))
        };
        let price = price.ok_or(BookingError::PriceOverflow)?;

        debug_assert!(
            price >= Decimal::ZERO,
            "Invariant violated: price went negative: {price}"
        );
        Ok(price.round_dp(scale))
    }
}

/// Computes the price of renting from `start` to `end` at the given rates.
///
/// # Errors
///
/// - [`BookingError::InvalidRange`] if `end <= start`.
/// - [`BookingError::InvalidRate`] if a rate is negative.
/// - [`BookingError::PriceOverflow`] if the price exceeds [`Decimal::MAX`].
pub fn calculate_price(
    start: Timestamp,
    end: Timestamp,
    hourly_rate: Decimal,
    daily_rate: Decimal,
) -> Result<Decimal, BookingError> {
    let range = TimeRange::new(start, end)?;
    let rates = RateSchedule::new(hourly_rate, daily_rate)?;
    rates.quote(&range)
}
