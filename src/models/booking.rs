use actix_web::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::Display;
use thiserror::Error;
use validator::Validate;

use super::property::Property;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Property {0} not found")]
    PropertyNotFound(i64),

    #[error("Check-out must be after check-in")]
    InvalidStay,

    #[error("invalid booking: {0}")]
    Invalid(#[from] validator::ValidationErrors),

    #[error("Not enough rooms available. {taken} taken, {requested} requested, {total} total.")]
    NoAvailability {
        taken: i64,
        requested: i64,
        total: i64,
    },

    #[error("Cannot cancel booking: {0}")]
    NotCancellable(&'static str),

    #[error("database error")]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::PropertyNotFound(_) => StatusCode::NOT_FOUND,
            BookingError::InvalidStay | BookingError::Invalid(_) => StatusCode::BAD_REQUEST,
            BookingError::NoAvailability { .. } | BookingError::NotCancellable(_) => {
                StatusCode::CONFLICT
            }
            BookingError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize, Display)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Booking {
    pub id: i64,
    pub property_id: i64,
    pub room_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub special_requests: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: i64,
    pub guests_count: i64,
    pub nightly_rate: f64,
    pub taxes: f64,
    pub total_price: f64,
    pub payment_reference: Option<String>,
    pub card_last4: Option<String>,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
}

/// Insert payload. Prices are computed by the caller from a quote.
#[derive(Debug, Clone, Validate)]
pub struct NewBooking {
    pub property_id: i64,
    #[validate(length(min = 1))]
    pub room_name: String,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1))]
    pub rooms: i64,
    #[validate(range(min = 1))]
    pub guests_count: i64,
    pub nightly_rate: f64,
    pub taxes: f64,
    pub total_price: f64,
    pub payment_reference: Option<String>,
    pub card_last4: Option<String>,
}

impl Booking {
    /// Inserts a confirmed booking after checking that enough rooms remain
    /// for every night of the stay.
    pub async fn create(pool: &SqlitePool, data: &NewBooking) -> Result<Self, BookingError> {
        data.validate()?;
        if data.check_in >= data.check_out {
            return Err(BookingError::InvalidStay);
        }

        let mut tx = pool.begin().await?;

        let property = sqlx::query_as::<_, Property>("SELECT * FROM properties WHERE id = ?")
            .bind(data.property_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(BookingError::PropertyNotFound(data.property_id))?;

        let taken: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(rooms), 0) FROM bookings
            WHERE property_id = ?
            AND status = 'confirmed'
            AND check_in < ?
            AND check_out > ?
            "#,
        )
        .bind(data.property_id)
        .bind(data.check_out)
        .bind(data.check_in)
        .fetch_one(&mut *tx)
        .await?;

        if taken + data.rooms > property.total_rooms {
            log::warn!(
                "rejecting booking for property {}: {taken} taken, {} requested",
                property.id,
                data.rooms
            );
            return Err(BookingError::NoAvailability {
                taken,
                requested: data.rooms,
                total: property.total_rooms,
            });
        }

        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (
                property_id, room_name, first_name, last_name, email, phone,
                special_requests, check_in, check_out, rooms, guests_count,
                nightly_rate, taxes, total_price, payment_reference, card_last4, status
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'confirmed')
            RETURNING *
            "#,
        )
        .bind(data.property_id)
        .bind(&data.room_name)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(&data.phone)
        .bind(&data.special_requests)
        .bind(data.check_in)
        .bind(data.check_out)
        .bind(data.rooms)
        .bind(data.guests_count)
        .bind(data.nightly_rate)
        .bind(data.taxes)
        .bind(data.total_price)
        .bind(&data.payment_reference)
        .bind(&data.card_last4)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!(
            "booking {} confirmed for property {} ({} to {}, {} rooms)",
            booking.id,
            booking.property_id,
            booking.check_in,
            booking.check_out,
            booking.rooms
        );
        Ok(booking)
    }

    pub async fn find_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_email(pool: &SqlitePool, email: &str) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE lower(email) = lower(?)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(email.trim())
        .fetch_all(pool)
        .await
    }

    /// Returns `Ok(None)` when the booking does not exist.
    pub async fn cancel(
        pool: &SqlitePool,
        id: i64,
        today: NaiveDate,
    ) -> Result<Option<Self>, BookingError> {
        let mut tx = pool.begin().await?;

        let Some(booking) = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        if booking.status == BookingStatus::Cancelled {
            return Err(BookingError::NotCancellable("already cancelled"));
        }
        if booking.check_in <= today {
            return Err(BookingError::NotCancellable("check-in date has passed"));
        }

        let cancelled = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'cancelled' WHERE id = ? RETURNING *",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        log::info!("booking {id} cancelled");
        Ok(Some(cancelled))
    }
}
