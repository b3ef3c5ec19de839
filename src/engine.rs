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

//! Booking lifecycle engine.
//!
//! The [`Engine`] is the central component that creates bookings, moves them
//! through their status lifecycle, and administers the bike inventory.
//!
//! # Booking Operations
//!
//! - **Create**: Checks the bike exists and is bookable, rejects ranges that
//!   overlap a live booking, prices the range and stores a `pending` booking.
//! - **Reschedule**: Moves a non-terminal booking to a new range and reprices it.
//! - **Transition**: Confirms, completes or cancels a booking according to the
//!   [`BookingStatus`] state machine.
//! - **Cancel**: Cancels a booking and appends the reason to its notes.
//!
//! # Thread Safety
//!
//! Every read-check-write sequence runs under a per-bike mutex, so two
//! overlapping requests for the same bike cannot both succeed: the first
//! writer wins. Requests for different bikes proceed in parallel.

use crate::analytics::{self, DailySummary};
use crate::base::{BikeId, BookingId, Timestamp, UserId};
use crate::bike::{Bike, BikeDraft, BikePatch, BikeRemoval, NewBike};
use crate::booking::{
    Booking, BookingDraft, BookingPatch, BookingStatus, NewBooking, append_cancellation_reason,
};
use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::BookingError;
use crate::interval::{Slot, TimeRange, find_conflict};
use crate::pricing::RateSchedule;
use crate::store::{MemoryStore, RecordStore};
use dashmap::DashMap;
use parking_lot::Mutex;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Booking engine over a record store and a clock.
///
/// # Invariants
///
/// - Two live (non-cancelled) bookings of the same bike never overlap.
/// - Status only moves `Pending` -> `Confirmed` -> `Completed`, or from
///   `Pending`/`Confirmed` to `Cancelled`.
/// - A booking's price always matches its current range and the bike's rates
///   at the time of the last create or reschedule.
/// - Bookings are never deleted; bikes with booking history are retired, not
///   deleted.
pub struct Engine<S = MemoryStore, C = SystemClock> {
    store: S,
    clock: C,
    config: EngineConfig,
    /// Serializes read-check-write sequences per bike.
    bike_locks: DashMap<BikeId, Arc<Mutex<()>>>,
}

impl Engine {
    /// Creates an engine over an empty in-memory store and the system clock.
    pub fn new() -> Self {
        Self::with_parts(MemoryStore::new(), SystemClock, EngineConfig::default())
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: RecordStore, C: Clock> Engine<S, C> {
    pub fn with_parts(store: S, clock: C, config: EngineConfig) -> Self {
        Engine {
            store,
            clock,
            config,
            bike_locks: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // === Bookings ===

    /// Creates a `pending` booking.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRange`] - `start_time` is not before `end_time`.
    /// - [`BookingError::BikeNotFound`] - The bike does not exist.
    /// - [`BookingError::BikeUnavailable`] - The bike is not bookable.
    /// - [`BookingError::Conflict`] - The range overlaps a live booking of the bike.
    pub fn create_booking(&self, request: NewBooking) -> Result<Booking, BookingError> {
        let range = TimeRange::new(request.start_time, request.end_time)?;
        let bike_id = request.bike_id;

        self.with_bike_lock(bike_id, || {
            let bike = self
                .store
                .bike(bike_id)
                .ok_or(BookingError::BikeNotFound(bike_id))?;
            if !bike.is_available {
                debug!(bike = %bike_id, "rejected booking: bike unavailable");
                return Err(BookingError::BikeUnavailable(bike_id));
            }

            self.ensure_no_conflict(bike_id, &range, None)?;

            let total_price = self.price(&bike.rates(), &range)?;
            let now = self.clock.now();
            let draft = BookingDraft {
                bike_id,
                user_id: request.user_id,
                start_time: range.start(),
                end_time: range.end(),
                total_price,
                status: BookingStatus::Pending,
                notes: request.notes.filter(|notes| !notes.is_empty()),
                created_at: now,
                updated_at: now,
            };

            // Persisting is the last step: every failure above leaves the store untouched.
            let id = self.store.insert_booking(draft.clone());
            debug!(booking = %id, bike = %bike_id, price = %total_price, "booking created");
            Ok(draft.into_booking(id))
        })
    }

    /// Moves a booking to a new range and reprices it with the bike's
    /// current rates. A `None` bound keeps the existing one.
    ///
    /// Nothing is written when neither the range nor the price changes.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BookingNotFound`] - The booking does not exist.
    /// - [`BookingError::TerminalBooking`] - The booking is completed or cancelled.
    /// - [`BookingError::InvalidRange`] - The merged range is empty or inverted.
    /// - [`BookingError::Conflict`] - The new range overlaps another live booking.
    pub fn update_booking_times(
        &self,
        id: BookingId,
        new_start: Option<Timestamp>,
        new_end: Option<Timestamp>,
    ) -> Result<Booking, BookingError> {
        self.with_booking_lock(id, |booking| {
            if booking.status.is_terminal() {
                debug!(booking = %id, status = %booking.status, "rejected reschedule of terminal booking");
                return Err(BookingError::TerminalBooking {
                    id,
                    status: booking.status,
                });
            }

            let range = TimeRange::new(
                new_start.unwrap_or(booking.start_time),
                new_end.unwrap_or(booking.end_time),
            )?;
            self.ensure_no_conflict(booking.bike_id, &range, Some(id))?;

            let bike = self
                .store
                .bike(booking.bike_id)
                .ok_or(BookingError::BikeNotFound(booking.bike_id))?;
            let total_price = self.price(&bike.rates(), &range)?;

            if range.start() == booking.start_time
                && range.end() == booking.end_time
                && total_price == booking.total_price
            {
                return Ok(booking);
            }

            let patch = BookingPatch {
                start_time: Some(range.start()),
                end_time: Some(range.end()),
                total_price: Some(total_price),
                updated_at: Some(self.clock.now()),
                ..Default::default()
            };
            let updated = self
                .store
                .patch_booking(id, &patch)
                .ok_or(BookingError::BookingNotFound(id))?;
            debug!(booking = %id, price = %total_price, "booking rescheduled");
            Ok(updated)
        })
    }

    /// Moves a booking to `next` if the transition is legal.
    ///
    /// | From | Legal targets |
    /// |------|---------------|
    /// | Pending | Confirmed, Cancelled |
    /// | Confirmed | Completed, Cancelled |
    /// | Completed | - |
    /// | Cancelled | - |
    ///
    /// # Errors
    ///
    /// - [`BookingError::BookingNotFound`] - The booking does not exist.
    /// - [`BookingError::IllegalTransition`] - `next` is not reachable from the current status.
    /// - [`BookingError::CancellationWindowClosed`] - Cancelling inside the configured notice.
    pub fn transition_status(
        &self,
        id: BookingId,
        next: BookingStatus,
    ) -> Result<Booking, BookingError> {
        self.with_booking_lock(id, |booking| self.apply_transition(booking, next, None))
    }

    /// Cancels a booking, appending `reason` to its notes.
    ///
    /// # Errors
    ///
    /// Same as [`transition_status`](Self::transition_status) with
    /// [`BookingStatus::Cancelled`].
    pub fn cancel_booking(
        &self,
        id: BookingId,
        reason: Option<&str>,
    ) -> Result<Booking, BookingError> {
        self.with_booking_lock(id, |booking| {
            self.apply_transition(booking, BookingStatus::Cancelled, reason)
        })
    }

    /// Prices a prospective booking without storing anything.
    ///
    /// # Errors
    ///
    /// - [`BookingError::InvalidRange`] - `start` is not before `end`.
    /// - [`BookingError::BikeNotFound`] - The bike does not exist.
    pub fn quote(
        &self,
        bike_id: BikeId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Decimal, BookingError> {
        let range = TimeRange::new(start, end)?;
        let bike = self
            .store
            .bike(bike_id)
            .ok_or(BookingError::BikeNotFound(bike_id))?;
        self.price(&bike.rates(), &range)
    }

    pub fn get_booking(&self, id: BookingId) -> Option<Booking> {
        self.store.booking(id)
    }

    pub fn bookings(&self) -> Vec<Booking> {
        self.store.bookings_where(&|_: &Booking| true)
    }

    pub fn bookings_for_bike(&self, bike_id: BikeId) -> Vec<Booking> {
        self.store
            .bookings_where(&|booking: &Booking| booking.bike_id == bike_id)
    }

    pub fn bookings_for_user(&self, user_id: &UserId) -> Vec<Booking> {
        self.store
            .bookings_where(&|booking: &Booking| &booking.user_id == user_id)
    }

    /// Summarizes bookings created in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRange`] if `start` is not before `end`.
    pub fn summary(&self, start: Timestamp, end: Timestamp) -> Result<DailySummary, BookingError> {
        let window = TimeRange::new(start, end)?;
        let created = self.store.bookings_where(&|booking: &Booking| {
            window.start() <= booking.created_at && booking.created_at < window.end()
        });
        Ok(analytics::summarize(&created, self.config.popular_bikes_limit))
    }

    // === Bikes ===

    /// Adds a bike to the inventory.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRate`] if a rate is negative.
    pub fn add_bike(&self, bike: NewBike) -> Result<Bike, BookingError> {
        RateSchedule::new(bike.price_per_hour, bike.price_per_day)?;

        let now = self.clock.now();
        let draft = BikeDraft {
            name: bike.name,
            category: bike.category,
            price_per_hour: bike.price_per_hour,
            price_per_day: bike.price_per_day,
            is_available: bike.is_available,
            created_at: now,
            updated_at: now,
        };
        let id = self.store.insert_bike(draft.clone());
        debug!(bike = %id, "bike added");
        Ok(draft.into_bike(id))
    }

    /// Applies a partial update to a bike.
    ///
    /// Existing bookings keep their price; new rates apply to bookings created
    /// or rescheduled afterwards.
    ///
    /// # Errors
    ///
    /// - [`BookingError::BikeNotFound`] - The bike does not exist.
    /// - [`BookingError::InvalidRate`] - The resulting rates would be negative.
    pub fn update_bike(&self, id: BikeId, mut patch: BikePatch) -> Result<Bike, BookingError> {
        self.with_bike_lock(id, || {
            let bike = self.store.bike(id).ok_or(BookingError::BikeNotFound(id))?;
            RateSchedule::new(
                patch.price_per_hour.unwrap_or(bike.price_per_hour),
                patch.price_per_day.unwrap_or(bike.price_per_day),
            )?;

            patch.updated_at = Some(self.clock.now());
            let updated = self
                .store
                .patch_bike(id, &patch)
                .ok_or(BookingError::BikeNotFound(id))?;
            debug!(bike = %id, "bike updated");
            Ok(updated)
        })
    }

    /// Removes a bike from the inventory.
    ///
    /// A bike that was ever booked is only marked unavailable so its booking
    /// history keeps a valid reference.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::BikeNotFound`] if the bike does not exist.
    pub fn remove_bike(&self, id: BikeId) -> Result<BikeRemoval, BookingError> {
        self.with_bike_lock(id, || {
            if self.store.bike(id).is_none() {
                return Err(BookingError::BikeNotFound(id));
            }

            if self.bookings_for_bike(id).is_empty() {
                self.store.delete_bike(id);
                debug!(bike = %id, "bike deleted");
                return Ok(BikeRemoval::Deleted);
            }

            let patch = BikePatch {
                is_available: Some(false),
                updated_at: Some(self.clock.now()),
                ..Default::default()
            };
            self.store
                .patch_bike(id, &patch)
                .ok_or(BookingError::BikeNotFound(id))?;
            debug!(bike = %id, "bike retired");
            Ok(BikeRemoval::Retired)
        })
    }

    pub fn get_bike(&self, id: BikeId) -> Option<Bike> {
        self.store.bike(id)
    }

    pub fn bikes(&self) -> Vec<Bike> {
        self.store.bikes_where(&|_: &Bike| true)
    }

    /// Bikes flagged available with no live booking overlapping `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRange`] if `start` is not before `end`.
    pub fn available_bikes(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<Bike>, BookingError> {
        let window = TimeRange::new(start, end)?;
        let booked: HashSet<BikeId> = self
            .store
            .bookings_where(&|booking: &Booking| {
                booking.is_live() && booking.range().is_ok_and(|range| range.overlaps(&window))
            })
            .into_iter()
            .map(|booking| booking.bike_id)
            .collect();

        Ok(self
            .store
            .bikes_where(&|bike: &Bike| bike.is_available && !booked.contains(&bike.id)))
    }

    // === Internals ===

    fn price(&self, rates: &RateSchedule, range: &TimeRange) -> Result<Decimal, BookingError> {
        rates.quote_with_scale(range, self.config.price_scale)
    }

    /// Returns the lock of an existing bike. Unknown ids never get an entry.
    fn bike_lock(&self, bike_id: BikeId) -> Result<Arc<Mutex<()>>, BookingError> {
        if let Some(lock) = self.bike_locks.get(&bike_id) {
            return Ok(lock.clone());
        }
        if self.store.bike(bike_id).is_none() {
            return Err(BookingError::BikeNotFound(bike_id));
        }
        Ok(self
            .bike_locks
            .entry(bike_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    fn with_bike_lock<T>(
        &self,
        bike_id: BikeId,
        f: impl FnOnce() -> Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        let lock = self.bike_lock(bike_id)?;
        let _guard = lock.lock();
        let result = f();
        // Deleted bikes never come back, so their lock can go. This also
        // drops an entry raced in between the existence check and a delete.
        if self.store.bike(bike_id).is_none() {
            self.bike_locks.remove(&bike_id);
        }
        result
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.bike_locks.len()
    }

    /// Runs `f` on a fresh copy of the booking while its bike is locked.
    fn with_booking_lock<T>(
        &self,
        id: BookingId,
        f: impl FnOnce(Booking) -> Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        let bike_id = self
            .store
            .booking(id)
            .ok_or(BookingError::BookingNotFound(id))?
            .bike_id;

        self.with_bike_lock(bike_id, || {
            // Re-read under the lock; the bike id of a booking never changes.
            let booking = self
                .store
                .booking(id)
                .ok_or(BookingError::BookingNotFound(id))?;
            f(booking)
        })
    }

    fn ensure_no_conflict(
        &self,
        bike_id: BikeId,
        range: &TimeRange,
        exclude: Option<BookingId>,
    ) -> Result<(), BookingError> {
        let existing = self
            .store
            .bookings_where(&|booking: &Booking| booking.bike_id == bike_id);
        let slots = existing
            .iter()
            .map(Slot::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        match find_conflict(range, &slots, exclude) {
            Some(conflicting) => {
                debug!(bike = %bike_id, conflicting = %conflicting, "rejected overlapping range");
                Err(BookingError::Conflict {
                    bike_id,
                    conflicting,
                })
            }
            None => Ok(()),
        }
    }

    fn apply_transition(
        &self,
        booking: Booking,
        next: BookingStatus,
        reason: Option<&str>,
    ) -> Result<Booking, BookingError> {
        if !booking.status.can_transition_to(next) {
            debug!(booking = %booking.id, from = %booking.status, to = %next, "rejected transition");
            return Err(BookingError::IllegalTransition {
                from: booking.status,
                to: next,
            });
        }

        let now = self.clock.now();
        if next == BookingStatus::Cancelled
            && let Some(notice) = self.config.cancellation_notice
            && booking.start_time.saturating_sub(now) <= notice
        {
            return Err(BookingError::CancellationWindowClosed {
                id: booking.id,
                start_time: booking.start_time,
            });
        }

        let patch = BookingPatch {
            status: Some(next),
            notes: reason.and_then(|reason| {
                append_cancellation_reason(booking.notes.as_deref(), Some(reason))
            }),
            updated_at: Some(now),
            ..Default::default()
        };
        let updated = self
            .store
            .patch_booking(booking.id, &patch)
            .ok_or(BookingError::BookingNotFound(booking.id))?;
        debug!(booking = %booking.id, from = %booking.status, to = %next, "status changed");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::MS_PER_HOUR;
    use rust_decimal_macros::dec;

    fn add_bike(engine: &Engine) -> BikeId {
        engine
            .add_bike(NewBike::new("Roadster", "road", dec!(10), dec!(50)))
            .unwrap()
            .id
    }

    #[test]
    fn unknown_bikes_do_not_grow_lock_map() {
        let engine = Engine::new();

        for id in 1_000..11_000 {
            let request = NewBooking::new(BikeId(id), "user_1", 0, MS_PER_HOUR);
            assert_eq!(
                engine.create_booking(request),
                Err(BookingError::BikeNotFound(BikeId(id)))
            );
            assert_eq!(
                engine.update_bike(BikeId(id), BikePatch::availability(false)),
                Err(BookingError::BikeNotFound(BikeId(id)))
            );
            assert_eq!(
                engine.remove_bike(BikeId(id)),
                Err(BookingError::BikeNotFound(BikeId(id)))
            );
        }

        assert_eq!(engine.lock_count(), 0);
    }

    #[test]
    fn deleted_bike_releases_its_lock() {
        let engine = Engine::new();
        let bike = add_bike(&engine);
        engine
            .update_bike(bike, BikePatch::availability(true))
            .unwrap();
        assert_eq!(engine.lock_count(), 1);

        assert_eq!(engine.remove_bike(bike), Ok(BikeRemoval::Deleted));
        assert_eq!(engine.lock_count(), 0);

        let request = NewBooking::new(bike, "user_1", 0, MS_PER_HOUR);
        assert_eq!(
            engine.create_booking(request),
            Err(BookingError::BikeNotFound(bike))
        );
        assert_eq!(engine.lock_count(), 0);
    }

    #[test]
    fn retired_bike_keeps_its_lock() {
        let engine = Engine::new();
        let bike = add_bike(&engine);
        engine
            .create_booking(NewBooking::new(bike, "user_1", 0, MS_PER_HOUR))
            .unwrap();

        assert_eq!(engine.remove_bike(bike), Ok(BikeRemoval::Retired));
        assert_eq!(engine.lock_count(), 1);
    }
}
