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

use bike_rental_rs::{
    BikeId, BookingId, BookingStatus, Engine, EngineConfig, MemoryStore, NewBike, NewBooking,
    SystemClock, Timestamp, UserId,
};
use clap::Parser;
use csv::{ReaderBuilder, Trim, Writer};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{Level, debug, error, info, warn};

/// Bike Rental - Replay booking operations against a bike inventory
///
/// Loads bikes from one CSV file, applies booking operations from another,
/// and writes the resulting bookings to stdout as CSV.
#[derive(Parser, Debug)]
#[command(name = "bike-rental-rs")]
#[command(about = "A booking engine that replays bike rental operations from CSV", long_about = None)]
struct Args {
    /// Path to CSV file with bikes
    ///
    /// Expected format: bike,name,category,price_per_hour,price_per_day,available
    #[arg(long, value_name = "FILE")]
    bikes: PathBuf,

    /// Path to CSV file with booking operations
    ///
    /// Expected format: op,booking,bike,user,start,end,reason
    /// Example: cargo run -- --bikes bikes.csv operations.csv > bookings.csv
    #[arg(value_name = "FILE")]
    operations: PathBuf,

    /// Refuse cancellations closer than this many hours to the booking start
    #[arg(long, value_name = "HOURS")]
    cancellation_notice_hours: Option<i64>,

    /// Decimal places kept in booking prices
    #[arg(long, default_value_t = 2)]
    price_scale: u32,

    /// Log every skipped row and rejected operation
    #[arg(short, long)]
    verbose: bool,
}

type CliEngine = Engine<MemoryStore, SystemClock>;

fn main() {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the CSV output.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if args.verbose { Level::DEBUG } else { Level::WARN })
        .init();

    let mut config = EngineConfig::default().with_price_scale(args.price_scale);
    if let Some(hours) = args.cancellation_notice_hours {
        config = config.with_cancellation_notice_hours(hours);
    }
    let engine = Engine::with_parts(MemoryStore::new(), SystemClock, config);

    let bikes = match open(&args.bikes).and_then(|file| load_bikes(&engine, file)) {
        Ok(bikes) => bikes,
        Err(e) => {
            error!("Error loading bikes from '{}': {}", args.bikes.display(), e);
            process::exit(1);
        }
    };
    info!("loaded {} bikes", bikes.len());

    if let Err(e) =
        open(&args.operations).and_then(|file| process_operations(&engine, &bikes, file))
    {
        error!(
            "Error processing operations from '{}': {}",
            args.operations.display(),
            e
        );
        process::exit(1);
    }

    if let Err(e) = write_bookings(&engine, std::io::stdout()) {
        error!("Error writing output: {}", e);
        process::exit(1);
    }
}

fn open(path: &Path) -> Result<BufReader<File>, csv::Error> {
    Ok(BufReader::new(File::open(path)?))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All) // Handle whitespace in fields like " book "
        .flexible(true) // Allow missing trailing fields
        .has_headers(true)
        .from_reader(reader)
}

/// Raw CSV record of the bikes file.
///
/// Fields: `bike, name, category, price_per_hour, price_per_day, available`
#[derive(Debug, Deserialize)]
struct BikeRecord {
    bike: u32,
    name: String,
    category: String,
    price_per_hour: Decimal,
    price_per_day: Decimal,
    #[serde(default = "default_available")]
    available: bool,
}

fn default_available() -> bool {
    true
}

/// Loads bikes into the engine.
///
/// Returns a map from the file's own bike references to store-assigned ids.
/// Malformed rows and bikes with negative rates are skipped.
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
fn load_bikes<R: Read>(
    engine: &CliEngine,
    reader: R,
) -> Result<HashMap<u32, BikeId>, csv::Error> {
    let mut bikes = HashMap::new();

    for result in csv_reader(reader).deserialize::<BikeRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed bike row: {}", e);
                continue;
            }
        };

        let mut new_bike = NewBike::new(
            record.name,
            record.category,
            record.price_per_hour,
            record.price_per_day,
        );
        if !record.available {
            new_bike = new_bike.unavailable();
        }

        match engine.add_bike(new_bike) {
            Ok(bike) => {
                bikes.insert(record.bike, bike.id);
            }
            Err(e) => warn!("Skipping bike {}: {}", record.bike, e),
        }
    }

    Ok(bikes)
}

/// Raw CSV record of the operations file.
///
/// Fields: `op, booking, bike, user, start, end, reason`
#[derive(Debug, Deserialize)]
struct OperationRecord {
    op: String,
    booking: u32,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    bike: Option<u32>,
    #[serde(default)]
    user: Option<String>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    start: Option<Timestamp>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    end: Option<Timestamp>,
    #[serde(default)]
    reason: Option<String>,
}

/// A booking operation decoded from a CSV row.
#[derive(Debug)]
enum Operation {
    Book {
        booking: u32,
        bike: u32,
        user: UserId,
        start: Timestamp,
        end: Timestamp,
    },
    Reschedule {
        booking: u32,
        start: Option<Timestamp>,
        end: Option<Timestamp>,
    },
    Transition {
        booking: u32,
        status: BookingStatus,
    },
    Cancel {
        booking: u32,
        reason: Option<String>,
    },
}

impl OperationRecord {
    /// Converts the CSV record to an [`Operation`].
    ///
    /// Returns `None` for unknown operations or missing required fields.
    fn into_operation(self) -> Option<Operation> {
        let booking = self.booking;
        match self.op.to_lowercase().as_str() {
            "book" => Some(Operation::Book {
                booking,
                bike: self.bike?,
                user: UserId::new(self.user.filter(|u| !u.is_empty())?),
                start: self.start?,
                end: self.end?,
            }),
            "reschedule" => Some(Operation::Reschedule {
                booking,
                start: self.start,
                end: self.end,
            }),
            "confirm" => Some(Operation::Transition {
                booking,
                status: BookingStatus::Confirmed,
            }),
            "complete" => Some(Operation::Transition {
                booking,
                status: BookingStatus::Completed,
            }),
            "cancel" => Some(Operation::Cancel {
                booking,
                reason: self.reason.filter(|r| !r.is_empty()),
            }),
            _ => None,
        }
    }
}

/// Applies booking operations from a CSV reader.
///
/// Rows reference bikes by the bikes file's ids and bookings by the
/// operations file's own booking numbers; both are mapped to store ids.
/// Malformed rows and rejected operations are logged and skipped.
///
/// # CSV Format
///
/// ```csv
/// op,booking,bike,user,start,end,reason
/// book,1,1,user_1,1700000000000,1700007200000,
/// confirm,1,,,,,
/// cancel,1,,,,,rain
/// ```
///
/// # Errors
///
/// Returns a CSV error if the reader fails.
fn process_operations<R: Read>(
    engine: &CliEngine,
    bikes: &HashMap<u32, BikeId>,
    reader: R,
) -> Result<(), csv::Error> {
    let mut bookings: HashMap<u32, BookingId> = HashMap::new();

    for result in csv_reader(reader).deserialize::<OperationRecord>() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!("Skipping malformed row: {}", e);
                continue;
            }
        };

        let Some(operation) = record.into_operation() else {
            warn!("Skipping invalid operation record");
            continue;
        };

        if let Err(e) = apply_operation(engine, bikes, &mut bookings, &operation) {
            debug!("Skipping {:?}: {}", operation, e);
        }
    }

    Ok(())
}

fn apply_operation(
    engine: &CliEngine,
    bikes: &HashMap<u32, BikeId>,
    bookings: &mut HashMap<u32, BookingId>,
    operation: &Operation,
) -> Result<(), String> {
    match operation {
        Operation::Book {
            booking,
            bike,
            user,
            start,
            end,
        } => {
            if bookings.contains_key(booking) {
                return Err(format!("duplicate booking reference {booking}"));
            }
            let bike_id = *bikes
                .get(bike)
                .ok_or_else(|| format!("unknown bike reference {bike}"))?;
            let created = engine
                .create_booking(NewBooking::new(bike_id, user.clone(), *start, *end))
                .map_err(|e| e.to_string())?;
            bookings.insert(*booking, created.id);
        }
        Operation::Reschedule {
            booking,
            start,
            end,
        } => {
            engine
                .update_booking_times(resolve_booking(bookings, *booking)?, *start, *end)
                .map_err(|e| e.to_string())?;
        }
        Operation::Transition { booking, status } => {
            engine
                .transition_status(resolve_booking(bookings, *booking)?, *status)
                .map_err(|e| e.to_string())?;
        }
        Operation::Cancel { booking, reason } => {
            engine
                .cancel_booking(resolve_booking(bookings, *booking)?, reason.as_deref())
                .map_err(|e| e.to_string())?;
        }
    }

    Ok(())
}

fn resolve_booking(bookings: &HashMap<u32, BookingId>, booking: u32) -> Result<BookingId, String> {
    bookings
        .get(&booking)
        .copied()
        .ok_or_else(|| format!("unknown booking reference {booking}"))
}

/// Write bookings to a CSV writer in creation order.
///
/// # CSV Format
///
/// Columns: `id, bikeId, userId, startTime, endTime, totalPrice, status, notes, createdAt, updatedAt`
///
/// # Errors
///
/// Returns a CSV error if writing fails.
fn write_bookings<W: Write>(engine: &CliEngine, writer: W) -> Result<(), csv::Error> {
    let mut wtr = Writer::from_writer(writer);

    for booking in engine.bookings() {
        wtr.serialize(&booking)?;
    }

    wtr.flush()?;
    Ok(())
}
