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

//! REST API server exposing the booking engine.
//!
//! Run with: `cargo run --example server`
//!
//! # Example requests
//!
//! ```bash
//! # Add a bike
//! curl -X POST http://localhost:3000/bikes \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Roadster", "category": "road", "pricePerHour": "10.00", "pricePerDay": "50.00"}'
//!
//! # Book it for two hours
//! curl -X POST http://localhost:3000/bookings \
//!   -H "Content-Type: application/json" \
//!   -d '{"bikeId": 1, "userId": "alice", "startTime": 1767261600000, "endTime": 1767268800000}'
//!
//! # Which bikes are free in a window
//! curl "http://localhost:3000/bikes/available?start=1767261600000&end=1767268800000"
//!
//! # Confirm, then cancel with a reason
//! curl -X POST http://localhost:3000/bookings/1/status -d '{"status": "confirmed"}' \
//!   -H "Content-Type: application/json"
//! curl -X POST http://localhost:3000/bookings/1/cancel -d '{"reason": "rain"}' \
//!   -H "Content-Type: application/json"
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use bike_rental_rs::analytics::DailySummary;
use bike_rental_rs::{
    Bike, BikeId, BikePatch, BikeRemoval, Booking, BookingError, BookingId, BookingStatus,
    Engine, ErrorKind, NewBike, NewBooking, Timestamp, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

// === Request/Response DTOs ===

/// Query string for endpoints taking a `[start, end)` window.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub start: Timestamp,
    pub end: Timestamp,
}

/// Request body for moving a booking.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleRequest {
    pub start_time: Option<Timestamp>,
    pub end_time: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: BookingStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CancelRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct RemovalResponse {
    pub outcome: BikeRemoval,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the booking engine.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

// === Error Handling ===

/// Wrapper for converting `BookingError` into HTTP responses.
pub struct AppError(BookingError);

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::InvalidRange | ErrorKind::InvalidRate => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unavailable => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::Conflict | ErrorKind::IllegalTransition => StatusCode::CONFLICT,
        };
        let code = match &self.0 {
            BookingError::InvalidRange { .. } => "INVALID_RANGE",
            BookingError::InvalidRate => "INVALID_RATE",
            BookingError::PriceOverflow => "PRICE_OVERFLOW",
            BookingError::BikeNotFound(_) => "BIKE_NOT_FOUND",
            BookingError::BookingNotFound(_) => "BOOKING_NOT_FOUND",
            BookingError::BikeUnavailable(_) => "BIKE_UNAVAILABLE",
            BookingError::Conflict { .. } => "BOOKING_CONFLICT",
            BookingError::IllegalTransition { .. } => "ILLEGAL_TRANSITION",
            BookingError::TerminalBooking { .. } => "BOOKING_CLOSED",
            BookingError::CancellationWindowClosed { .. } => "CANCELLATION_WINDOW_CLOSED",
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Bike Handlers ===

/// POST /bikes - Add a bike.
async fn create_bike(
    State(state): State<AppState>,
    Json(request): Json<NewBike>,
) -> Result<(StatusCode, Json<Bike>), AppError> {
    let bike = state.engine.add_bike(request)?;
    Ok((StatusCode::CREATED, Json(bike)))
}

/// GET /bikes - List all bikes.
async fn list_bikes(State(state): State<AppState>) -> Json<Vec<Bike>> {
    Json(state.engine.bikes())
}

/// GET /bikes/:id - Get a bike.
async fn get_bike(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Bike>, AppError> {
    let id = BikeId(id);
    state
        .engine
        .get_bike(id)
        .map(Json)
        .ok_or(AppError(BookingError::BikeNotFound(id)))
}

/// PATCH /bikes/:id - Partially update a bike.
async fn update_bike(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(patch): Json<BikePatch>,
) -> Result<Json<Bike>, AppError> {
    Ok(Json(state.engine.update_bike(BikeId(id), patch)?))
}

/// DELETE /bikes/:id - Delete a bike, or retire it if it has bookings.
async fn remove_bike(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<RemovalResponse>, AppError> {
    let outcome = state.engine.remove_bike(BikeId(id))?;
    Ok(Json(RemovalResponse { outcome }))
}

/// GET /bikes/available?start=&end= - Bikes free for a whole window.
async fn available_bikes(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<Vec<Bike>>, AppError> {
    Ok(Json(state.engine.available_bikes(window.start, window.end)?))
}

/// GET /bikes/:id/quote?start=&end= - Price a window without booking it.
async fn quote(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<QuoteResponse>, AppError> {
    let price = state.engine.quote(BikeId(id), window.start, window.end)?;
    Ok(Json(QuoteResponse { price }))
}

// === Booking Handlers ===

/// POST /bookings - Create a booking.
async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<NewBooking>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = state.engine.create_booking(request)?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings - List all bookings.
async fn list_bookings(State(state): State<AppState>) -> Json<Vec<Booking>> {
    Json(state.engine.bookings())
}

/// GET /bookings/:id - Get a booking.
async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<Booking>, AppError> {
    let id = BookingId(id);
    state
        .engine
        .get_booking(id)
        .map(Json)
        .ok_or(AppError(BookingError::BookingNotFound(id)))
}

/// GET /users/:id/bookings - Bookings made by a user.
async fn user_bookings(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Json<Vec<Booking>> {
    Json(state.engine.bookings_for_user(&UserId::new(user)))
}

/// POST /bookings/:id/reschedule - Move a booking and reprice it.
async fn reschedule_booking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state.engine.update_booking_times(
        BookingId(id),
        request.start_time,
        request.end_time,
    )?;
    Ok(Json(booking))
}

/// POST /bookings/:id/status - Change a booking's status.
async fn transition_booking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(
        state.engine.transition_status(BookingId(id), request.status)?,
    ))
}

/// POST /bookings/:id/cancel - Cancel a booking with an optional reason.
async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<Booking>, AppError> {
    let booking = state
        .engine
        .cancel_booking(BookingId(id), request.reason.as_deref())?;
    Ok(Json(booking))
}

/// GET /summary?start=&end= - Aggregates over bookings created in a window.
async fn summary(
    State(state): State<AppState>,
    Query(window): Query<WindowQuery>,
) -> Result<Json<DailySummary>, AppError> {
    Ok(Json(state.engine.summary(window.start, window.end)?))
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/bikes", get(list_bikes).post(create_bike))
        .route("/bikes/available", get(available_bikes))
        .route(
            "/bikes/{id}",
            get(get_bike).patch(update_bike).delete(remove_bike),
        )
        .route("/bikes/{id}/quote", get(quote))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/{id}", get(get_booking))
        .route("/bookings/{id}/reschedule", post(reschedule_booking))
        .route("/bookings/{id}/status", post(transition_booking))
        .route("/bookings/{id}/cancel", post(cancel_booking))
        .route("/users/{id}/bookings", get(user_bookings))
        .route("/summary", get(summary))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let state = AppState {
        engine: Arc::new(Engine::new()),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await?;
    info!("bike rental API listening on http://127.0.0.1:3000");
    info!("  GET/POST   /bikes                      - List or add bikes");
    info!("  GET        /bikes/available            - Free bikes for ?start=&end=");
    info!("  GET/PATCH/DELETE /bikes/:id            - Read, update, remove a bike");
    info!("  GET        /bikes/:id/quote            - Price ?start=&end=");
    info!("  GET/POST   /bookings                   - List or create bookings");
    info!("  POST       /bookings/:id/reschedule    - Move a booking");
    info!("  POST       /bookings/:id/status        - Change status");
    info!("  POST       /bookings/:id/cancel        - Cancel with a reason");
    info!("  GET        /summary                    - Aggregates for ?start=&end=");

    axum::serve(listener, app).await
}
