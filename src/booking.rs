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

//! Booking records and the booking status state machine.
//!
//! ```text
//! Pending ──confirm──► Confirmed ──complete──► Completed
//!    │                    │
//!    └──────cancel────────┴──────────────────► Cancelled
//! ```
//!
//! `Completed` and `Cancelled` are terminal: no further transition and no
//! time edit is accepted once a booking reaches either of them.

use crate::base::{BikeId, BookingId, Timestamp, UserId};
use crate::error::BookingError;
use crate::interval::TimeRange;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Prefix written in front of a cancellation reason in a booking's notes.
pub const CANCELLATION_PREFIX: &str = "Cancellation reason: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub const ALL: [BookingStatus; 4] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::Completed,
        BookingStatus::Cancelled,
    ];

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed)
                | (Self::Pending, Self::Cancelled)
                | (Self::Confirmed, Self::Completed)
                | (Self::Confirmed, Self::Cancelled)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a status string from the store is not one of the four
/// known states.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown booking status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for BookingStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(UnknownStatus(s.to_owned())),
        }
    }
}

/// A stored booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub bike_id: BikeId,
    pub user_id: UserId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Booking {
    /// The booked range.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidRange`] for a corrupt record with
    /// `start_time >= end_time`.
    pub fn range(&self) -> Result<TimeRange, BookingError> {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn is_live(&self) -> bool {
        self.status != BookingStatus::Cancelled
    }
}

/// A booking request from a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub bike_id: BikeId,
    pub user_id: UserId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewBooking {
    pub fn new(
        bike_id: BikeId,
        user_id: impl Into<UserId>,
        start_time: Timestamp,
        end_time: Timestamp,
    ) -> Self {
        Self {
            bike_id,
            user_id: user_id.into(),
            start_time,
            end_time,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// A booking ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingDraft {
    pub bike_id: BikeId,
    pub user_id: UserId,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BookingDraft {
    pub fn into_booking(self, id: BookingId) -> Booking {
        Booking {
            id,
            bike_id: self.bike_id,
            user_id: self.user_id,
            start_time: self.start_time,
            end_time: self.end_time,
            total_price: self.total_price,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial update of a stored booking. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingPatch {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
    pub total_price: Option<Decimal>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
    pub updated_at: Option<Timestamp>,
}

impl BookingPatch {
    pub fn apply(&self, booking: &mut Booking) {
        if let Some(start_time) = self.start_time {
            booking.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            booking.end_time = end_time;
        }
        if let Some(total_price) = self.total_price {
            booking.total_price = total_price;
        }
        if let Some(status) = self.status {
            booking.status = status;
        }
        if let Some(notes) = &self.notes {
            booking.notes = Some(notes.clone());
        }
        if let Some(updated_at) = self.updated_at {
            booking.updated_at = updated_at;
        }
    }
}

/// Appends a cancellation reason to existing notes.
///
/// Prior notes are kept and the reason goes on a new line. A blank reason
/// leaves the notes as they are.
pub fn append_cancellation_reason(notes: Option<&str>, reason: Option<&str>) -> Option<String> {
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());
    match (notes.filter(|n| !n.is_empty()), reason) {
        (existing, None) => existing.map(str::to_owned),
        (None, Some(reason)) => Some(format!("{CANCELLATION_PREFIX}{reason}")),
        (Some(existing), Some(reason)) => {
            Some(format!("{existing}\n{CANCELLATION_PREFIX}{reason}"))
        }
    }
}
