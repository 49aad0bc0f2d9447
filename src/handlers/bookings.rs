use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::Deserialize;
use validator::Validate;

use super::{load_property, today};
use crate::{
    error::AppError,
    flow::GuestDetails,
    models::booking::{Booking, NewBooking},
    pricing,
    rooms::{find_room, room_options},
    state::AppState,
};

/// Direct booking without the wizard; the guest pays at the property.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBooking {
    pub property_id: i64,
    /// Room option id; the first option when omitted.
    #[serde(default)]
    pub room: Option<String>,
    #[serde(flatten)]
    pub guest: GuestDetails,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[validate(range(min = 1))]
    pub rooms: i64,
    #[validate(range(min = 1))]
    pub guests_count: i64,
}

#[derive(Deserialize)]
pub struct BookingLookup {
    pub email: String,
}

pub async fn create_booking(
    state: web::Data<AppState>,
    body: web::Json<CreateBooking>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;
    let body = body.into_inner();
    let guest = body.guest.checked()?;

    if body.check_in < today() {
        return Err(AppError::BadRequest("Check-in cannot be in the past".to_string()));
    }
    let nights = pricing::nights(body.check_in, body.check_out)?;

    let property = load_property(&state.pool, body.property_id).await?;
    let rooms = room_options(&property);
    let room = match body.room.as_deref() {
        Some(id) => find_room(&rooms, id)
            .ok_or_else(|| AppError::BadRequest(format!("unknown room option: {id}")))?,
        None => rooms
            .first()
            .ok_or_else(|| AppError::BadRequest("property has no room options".to_string()))?,
    };

    if room.sleeps * body.rooms < body.guests_count {
        return Err(AppError::BadRequest(format!(
            "{} guests do not fit in {} x {}",
            body.guests_count, body.rooms, room.name
        )));
    }

    let quote = pricing::quote(
        property.price_per_night,
        room.price_multiplier,
        nights,
        body.rooms,
        state.config.tax_rate,
    )?;

    let booking = Booking::create(
        &state.pool,
        &NewBooking {
            property_id: property.id,
            room_name: room.name.clone(),
            first_name: guest.first_name,
            last_name: guest.last_name,
            email: guest.email,
            phone: guest.phone,
            special_requests: guest.special_requests,
            check_in: body.check_in,
            check_out: body.check_out,
            rooms: body.rooms,
            guests_count: body.guests_count,
            nightly_rate: quote.nightly_rate,
            taxes: quote.taxes,
            total_price: quote.total,
            payment_reference: None,
            card_last4: None,
        },
    )
    .await?;

    Ok(HttpResponse::Created().json(booking))
}

pub async fn get_booking(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    match Booking::find_by_id(&state.pool, id).await? {
        Some(booking) => Ok(HttpResponse::Ok().json(booking)),
        None => Err(AppError::NotFound(format!("Booking {id}"))),
    }
}

pub async fn list_bookings(
    state: web::Data<AppState>,
    params: web::Query<BookingLookup>,
) -> Result<HttpResponse, AppError> {
    if params.email.trim().is_empty() {
        return Err(AppError::BadRequest("email must not be empty".to_string()));
    }

    let bookings = Booking::list_by_email(&state.pool, &params.email).await?;
    Ok(HttpResponse::Ok().json(bookings))
}

pub async fn cancel_booking(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let booking = Booking::cancel(&state.pool, id, today())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {id}")))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Booking cancelled successfully",
        "id": booking.id,
        "status": booking.status,
        "refund_amount": booking.total_price
    })))
}
