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

//! Booking activity summaries.

use crate::base::{BikeId, UserId};
use crate::booking::{Booking, BookingStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Aggregate of the bookings created during one window (usually a day).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub total_bookings: usize,
    /// Sum of prices of bookings that were not cancelled.
    pub revenue: Decimal,
    /// Distinct users who created a booking.
    pub active_users: usize,
    /// Most frequently booked bikes, most popular first.
    pub popular_bikes: Vec<BikeId>,
}

/// Summarizes `bookings`, which the caller has already narrowed to one window.
///
/// Popular bikes are ranked by booking count; ties go to the lower id.
pub fn summarize<'a, I>(bookings: I, popular_limit: usize) -> DailySummary
where
    I: IntoIterator<Item = &'a Booking>,
{
    let mut total_bookings = 0;
    let mut revenue = Decimal::ZERO;
    let mut users: HashSet<&UserId> = HashSet::new();
    let mut frequency: HashMap<BikeId, usize> = HashMap::new();

    for booking in bookings {
        total_bookings += 1;
        if booking.status != BookingStatus::Cancelled {
            revenue = revenue.saturating_add(booking.total_price);
        }
        users.insert(&booking.user_id);
        *frequency.entry(booking.bike_id).or_insert(0) += 1;
    }

    let mut ranked: Vec<(BikeId, usize)> = frequency.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    DailySummary {
        total_bookings,
        revenue,
        active_users: users.len(),
        popular_bikes: ranked
            .into_iter()
            .take(popular_limit)
            .map(|(id, _)| id)
            .collect(),
    }
}
