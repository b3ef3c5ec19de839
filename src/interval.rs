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

//! Interval overlap checks.
//!
//! Ranges are half-open `[start, end)`: two bookings that merely touch, one
//! ending exactly when the next begins, do not conflict.

use crate::base::{BookingId, Timestamp};
use crate::booking::{Booking, BookingStatus};
use crate::error::BookingError;
use serde::Serialize;

/// A validated time range with `start < end` whose duration fits in an `i64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TimeRange {
    start: Timestamp,
    end: Timestamp,
}

impl TimeRange {
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRange`] unless `start < end` and
    /// `end - start` is representable.
    pub fn new(start: Timestamp, end: Timestamp) -> Result<Self, BookingError> {
        match end.checked_sub(start) {
            Some(duration) if duration > 0 => Ok(Self { start, end }),
            _ => Err(BookingError::InvalidRange { start, end }),
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn duration_ms(&self) -> i64 {
        self.end - self.start
    }

    /// Strict overlap; shared endpoints do not count.
    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Checks whether `[start_a, end_a)` and `[start_b, end_b)` overlap.
///
/// # Errors
///
/// Returns [`BookingError::InvalidRange`] if either range is empty or inverted.
pub fn overlaps(
    start_a: Timestamp,
    end_a: Timestamp,
    start_b: Timestamp,
    end_b: Timestamp,
) -> Result<bool, BookingError> {
    let a = TimeRange::new(start_a, end_a)?;
    let b = TimeRange::new(start_b, end_b)?;
    Ok(a.overlaps(&b))
}

/// The part of a booking the conflict check looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub id: BookingId,
    pub range: TimeRange,
    pub status: BookingStatus,
}

impl TryFrom<&Booking> for Slot {
    type Error = BookingError;

    fn try_from(booking: &Booking) -> Result<Self, Self::Error> {
        Ok(Self {
            id: booking.id,
            range: booking.range()?,
            status: booking.status,
        })
    }
}

/// Returns the id of the first live slot overlapping `candidate`.
///
/// Cancelled slots never conflict, and the slot whose id equals `exclude` is
/// skipped so a booking being rescheduled does not collide with itself.
pub fn find_conflict<'a, I>(
    candidate: &TimeRange,
    slots: I,
    exclude: Option<BookingId>,
) -> Option<BookingId>
where
    I: IntoIterator<Item = &'a Slot>,
{
    slots
        .into_iter()
        .filter(|slot| slot.status != BookingStatus::Cancelled)
        .filter(|slot| Some(slot.id) != exclude)
        .find(|slot| slot.range.overlaps(candidate))
        .map(|slot| slot.id)
}

pub fn has_conflict<'a, I>(candidate: &TimeRange, slots: I, exclude: Option<BookingId>) -> bool
where
    I: IntoIterator<Item = &'a Slot>,
{
    find_conflict(candidate, slots, exclude).is_some()
}
