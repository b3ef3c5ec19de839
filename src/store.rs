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

//! Record store contract and an in-memory implementation.
//!
//! The engine only needs get / list-by-predicate / insert / patch / delete.
//! Any backing database that can offer those operations can sit behind
//! [`RecordStore`].

use crate::base::{BikeId, BookingId};
use crate::bike::{Bike, BikeDraft, BikePatch};
use crate::booking::{Booking, BookingDraft, BookingPatch};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU32, Ordering};

/// Storage operations consumed by the engine.
///
/// List operations return records in ascending id order.
pub trait RecordStore: Send + Sync {
    fn bike(&self, id: BikeId) -> Option<Bike>;

    fn bikes_where(&self, predicate: &dyn Fn(&Bike) -> bool) -> Vec<Bike>;

    fn insert_bike(&self, draft: BikeDraft) -> BikeId;

    /// Applies `patch` and returns the updated record, or `None` if absent.
    fn patch_bike(&self, id: BikeId, patch: &BikePatch) -> Option<Bike>;

    /// Returns `false` if the bike did not exist.
    fn delete_bike(&self, id: BikeId) -> bool;

    fn booking(&self, id: BookingId) -> Option<Booking>;

    fn bookings_where(&self, predicate: &dyn Fn(&Booking) -> bool) -> Vec<Booking>;

    fn insert_booking(&self, draft: BookingDraft) -> BookingId;

    /// Applies `patch` and returns the updated record, or `None` if absent.
    fn patch_booking(&self, id: BookingId, patch: &BookingPatch) -> Option<Booking>;
}

/// A [`RecordStore`] held in concurrent hash maps.
///
/// Ids are assigned from per-table counters starting at 1.
#[derive(Debug)]
pub struct MemoryStore {
    bikes: DashMap<BikeId, Bike>,
    bookings: DashMap<BookingId, Booking>,
    next_bike_id: AtomicU32,
    next_booking_id: AtomicU32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            bikes: DashMap::new(),
            bookings: DashMap::new(),
            next_bike_id: AtomicU32::new(1),
            next_booking_id: AtomicU32::new(1),
        }
    }

    pub fn bike_count(&self) -> usize {
        self.bikes.len()
    }

    pub fn booking_count(&self) -> usize {
        self.bookings.len()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for MemoryStore {
    fn bike(&self, id: BikeId) -> Option<Bike> {
        self.bikes.get(&id).map(|bike| bike.clone())
    }

    fn bikes_where(&self, predicate: &dyn Fn(&Bike) -> bool) -> Vec<Bike> {
        let mut bikes: Vec<Bike> = self
            .bikes
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bikes.sort_by_key(|bike| bike.id);
        bikes
    }

    fn insert_bike(&self, draft: BikeDraft) -> BikeId {
        let id = BikeId(self.next_bike_id.fetch_add(1, Ordering::SeqCst));
        self.bikes.insert(id, draft.into_bike(id));
        id
    }

    fn patch_bike(&self, id: BikeId, patch: &BikePatch) -> Option<Bike> {
        let mut bike = self.bikes.get_mut(&id)?;
        patch.apply(&mut bike);
        Some(bike.clone())
    }

    fn delete_bike(&self, id: BikeId) -> bool {
        self.bikes.remove(&id).is_some()
    }

    fn booking(&self, id: BookingId) -> Option<Booking> {
        self.bookings.get(&id).map(|booking| booking.clone())
    }

    fn bookings_where(&self, predicate: &dyn Fn(&Booking) -> bool) -> Vec<Booking> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        bookings.sort_by_key(|booking| booking.id);
        bookings
    }

    fn insert_booking(&self, draft: BookingDraft) -> BookingId {
        let id = BookingId(self.next_booking_id.fetch_add(1, Ordering::SeqCst));
        self.bookings.insert(id, draft.into_booking(id));
        id
    }

    fn patch_booking(&self, id: BookingId, patch: &BookingPatch) -> Option<Booking> {
        let mut booking = self.bookings.get_mut(&id)?;
        patch.apply(&mut booking);
        Some(booking.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base::UserId;
    use crate::booking::BookingStatus;
    use rust_decimal_macros::dec;

    fn bike_draft(name: &str) -> BikeDraft {
        BikeDraft {
            name: name.to_owned(),
            category: "city".to_owned(),
            price_per_hour: dec!(10),
            price_per_day: dec!(50),
            is_available: true,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn booking_draft(bike_id: BikeId, start_time: i64, end_time: i64) -> BookingDraft {
        BookingDraft {
            bike_id,
            user_id: UserId::new("user"),
            start_time,
            end_time,
            total_price: dec!(20),
            status: BookingStatus::Pending,
            notes: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn ids_start_at_one_and_increase() {
        let store = MemoryStore::new();
        assert_eq!(store.insert_bike(bike_draft("a")), BikeId(1));
        assert_eq!(store.insert_bike(bike_draft("b")), BikeId(2));
        assert_eq!(store.insert_booking(booking_draft(BikeId(1), 0, 10)), BookingId(1));
    }

    #[test]
    fn list_by_predicate_is_sorted_by_id() {
        let store = MemoryStore::new();
        for i in 0..20 {
            store.insert_booking(booking_draft(BikeId(i % 2), i64::from(i), i64::from(i) + 1));
        }
        let on_bike_one = store.bookings_where(&|b| b.bike_id == BikeId(1));
        assert_eq!(on_bike_one.len(), 10);
        assert!(on_bike_one.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[test]
    fn patch_missing_record_returns_none() {
        let store = MemoryStore::new();
        assert!(store.patch_bike(BikeId(5), &BikePatch::availability(false)).is_none());
        assert!(store
            .patch_booking(BookingId(5), &BookingPatch::default())
            .is_none());
    }

    #[test]
    fn delete_bike_reports_presence() {
        let store = MemoryStore::new();
        let id = store.insert_bike(bike_draft("a"));
        assert!(store.delete_bike(id));
        assert!(!store.delete_bike(id));
        assert!(store.bike(id).is_none());
    }
}
