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

//! # Bike Rental
//!
//! This library provides the booking engine of a bike-rental marketplace:
//! conflict detection between booking time ranges, rate-based pricing, and the
//! booking status lifecycle (pending, confirmed, completed, cancelled).
//!
//! ## Core Components
//!
//! - [`Engine`]: Booking lifecycle manager and bike inventory administration
//! - [`interval`]: Half-open time range overlap checks
//! - [`pricing`]: Hourly/daily price calculation with a partial-day cap
//! - [`BookingStatus`]: The booking state machine
//! - [`RecordStore`]: Storage contract, with [`MemoryStore`] as the bundled implementation
//! - [`BookingError`]: Error types for booking failures
//!
//! ## Example
//!
//! ```
//! use bike_rental_rs::{BookingError, BookingStatus, Engine, NewBike, NewBooking, UserId};
//! use rust_decimal_macros::dec;
//!
//! const HOUR: i64 = 3_600_000;
//! let engine = Engine::new();
//! let bike = engine
//!     .add_bike(NewBike::new("Trail 5", "mountain", dec!(10), dec!(50)))
//!     .unwrap();
//!
//! // Book two hours
//! let booking = engine
//!     .create_booking(NewBooking::new(bike.id, UserId::new("user_1"), 9 * HOUR, 11 * HOUR))
//!     .unwrap();
//! assert_eq!(booking.total_price, dec!(20));
//! assert_eq!(booking.status, BookingStatus::Pending);
//!
//! // An overlapping request for the same bike is rejected
//! let clash = engine.create_booking(NewBooking::new(bike.id, "user_2", 10 * HOUR, 12 * HOUR));
//! assert!(matches!(clash, Err(BookingError::Conflict { .. })));
//! ```
//!
//! ## Thread Safety
//!
//! The engine serializes operations per bike, so concurrent requests for the
//! same bike are checked and written one at a time while different bikes are
//! handled in parallel.

pub mod analytics;
mod base;
pub mod bike;
pub mod booking;
pub mod clock;
mod config;
mod engine;
pub mod error;
pub mod interval;
pub mod pricing;
pub mod store;

pub use base::{BikeId, BookingId, MS_PER_DAY, MS_PER_HOUR, Timestamp, UserId};
pub use bike::{Bike, BikePatch, BikeRemoval, NewBike};
pub use booking::{Booking, BookingStatus, NewBooking};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{BookingError, ErrorKind};
pub use interval::TimeRange;
pub use pricing::{RateSchedule, calculate_price};
pub use store::{MemoryStore, RecordStore};
