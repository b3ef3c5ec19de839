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

//! Error types for booking and inventory operations.

use crate::base::{BikeId, BookingId, Timestamp};
use crate::booking::BookingStatus;
use thiserror::Error;

/// Booking engine errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BookingError {
    /// Start of a time range is not strictly before its end
    #[error("invalid time range: start {start} must be before end {end}")]
    InvalidRange { start: Timestamp, end: Timestamp },

    /// Hourly or daily rate is negative
    #[error("invalid rate (must not be negative)")]
    InvalidRate,

    /// Computed price does not fit in a `Decimal`
    #[error("price exceeds the representable range")]
    PriceOverflow,

    /// Referenced bike does not exist
    #[error("bike {0} not found")]
    BikeNotFound(BikeId),

    /// Referenced booking does not exist
    #[error("booking {0} not found")]
    BookingNotFound(BookingId),

    /// Bike is flagged as not bookable
    #[error("bike {0} is not available for booking")]
    BikeUnavailable(BikeId),

    /// Requested range overlaps a live booking on the same bike
    #[error("bike {bike_id} is already booked for this time period (booking {conflicting})")]
    Conflict {
        bike_id: BikeId,
        conflicting: BookingId,
    },

    /// Status change is not in the transition table
    #[error("illegal status transition from {from} to {to}")]
    IllegalTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Booking times cannot change once the booking is terminal
    #[error("booking {id} is {status} and can no longer be modified")]
    TerminalBooking { id: BookingId, status: BookingStatus },

    /// Cancellation requested inside the configured notice period
    #[error("booking {id} starting at {start_time} can no longer be cancelled")]
    CancellationWindowClosed { id: BookingId, start_time: Timestamp },
}

/// Coarse error classification for callers that render messages or map
/// errors onto another protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidRange,
    InvalidRate,
    NotFound,
    Unavailable,
    Conflict,
    IllegalTransition,
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::InvalidRate | Self::PriceOverflow => ErrorKind::InvalidRate,
            Self::BikeNotFound(_) | Self::BookingNotFound(_) => ErrorKind::NotFound,
            Self::BikeUnavailable(_) => ErrorKind::Unavailable,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::IllegalTransition { .. }
            | Self::TerminalBooking { .. }
            | Self::CancellationWindowClosed { .. } => ErrorKind::IllegalTransition,
        }
    }
}
