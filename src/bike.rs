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

//! Bike inventory records.

use crate::base::{BikeId, Timestamp};
use crate::pricing::RateSchedule;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A rentable bike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bike {
    pub id: BikeId,
    pub name: String,
    /// Mountain, road, city, ...
    pub category: String,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Bike {
    pub fn rates(&self) -> RateSchedule {
        RateSchedule {
            price_per_hour: self.price_per_hour,
            price_per_day: self.price_per_day,
        }
    }
}

/// Admin input for a new bike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBike {
    pub name: String,
    pub category: String,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

fn available_by_default() -> bool {
    true
}

impl NewBike {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        price_per_hour: Decimal,
        price_per_day: Decimal,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            price_per_hour,
            price_per_day,
            is_available: true,
        }
    }

    pub fn unavailable(mut self) -> Self {
        self.is_available = false;
        self
    }
}

/// A bike ready to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BikeDraft {
    pub name: String,
    pub category: String,
    pub price_per_hour: Decimal,
    pub price_per_day: Decimal,
    pub is_available: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl BikeDraft {
    pub fn into_bike(self, id: BikeId) -> Bike {
        Bike {
            id,
            name: self.name,
            category: self.category,
            price_per_hour: self.price_per_hour,
            price_per_day: self.price_per_day,
            is_available: self.is_available,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Partial update of a bike. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BikePatch {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_per_hour: Option<Decimal>,
    pub price_per_day: Option<Decimal>,
    pub is_available: Option<bool>,
    #[serde(skip)]
    pub updated_at: Option<Timestamp>,
}

impl BikePatch {
    pub fn availability(is_available: bool) -> Self {
        Self {
            is_available: Some(is_available),
            ..Default::default()
        }
    }

    pub fn rates(price_per_hour: Decimal, price_per_day: Decimal) -> Self {
        Self {
            price_per_hour: Some(price_per_hour),
            price_per_day: Some(price_per_day),
            ..Default::default()
        }
    }

    pub fn apply(&self, bike: &mut Bike) {
        if let Some(name) = &self.name {
            bike.name = name.clone();
        }
        if let Some(category) = &self.category {
            bike.category = category.clone();
        }
        if let Some(price_per_hour) = self.price_per_hour {
            bike.price_per_hour = price_per_hour;
        }
        if let Some(price_per_day) = self.price_per_day {
            bike.price_per_day = price_per_day;
        }
        if let Some(is_available) = self.is_available {
            bike.is_available = is_available;
        }
        if let Some(updated_at) = self.updated_at {
            bike.updated_at = updated_at;
        }
    }
}

/// What [`remove_bike`](crate::Engine::remove_bike) did with the bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BikeRemoval {
    /// The bike had no bookings and was deleted.
    Deleted,
    /// The bike has booking history and was marked unavailable instead.
    Retired,
}
