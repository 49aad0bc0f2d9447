use actix_web::{web, HttpResponse};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{load_property, today};
use crate::{
    date_picker::MonthView,
    error::AppError,
    flow::{BookingFlow, GuestDetails},
    models::booking::{Booking, NewBooking},
    payment::{self, CardSummary, PaymentDetails},
    state::AppState,
};

fn one() -> i64 {
    1
}

#[derive(Deserialize)]
pub struct StartFlow {
    pub property_id: i64,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    #[serde(default = "one")]
    pub guests: i64,
    #[serde(default = "one")]
    pub rooms: i64,
}

#[derive(Deserialize)]
pub struct CalendarQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

#[derive(Deserialize)]
pub struct DateClick {
    pub date: NaiveDate,
}

#[derive(Deserialize)]
pub struct RoomChoice {
    pub room_id: String,
}

#[derive(Serialize)]
struct Confirmation {
    flow: BookingFlow,
    booking: Booking,
}

pub async fn start_flow(
    state: web::Data<AppState>,
    body: web::Json<StartFlow>,
) -> Result<HttpResponse, AppError> {
    let property = load_property(&state.pool, body.property_id).await?;
    let flow = BookingFlow::start(
        property,
        body.check_in,
        body.check_out,
        body.guests,
        body.rooms,
        today(),
    )?;

    let flow = state.flows.insert(flow).await;
    log::info!("booking flow {} started for property {}", flow.id, flow.property.id);
    Ok(HttpResponse::Created().json(flow))
}

pub async fn get_flow(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let flow = state.flows.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(flow))
}

pub async fn delete_flow(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    state.flows.remove(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_calendar(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    params: web::Query<CalendarQuery>,
) -> Result<HttpResponse, AppError> {
    let flow = state.flows.get(path.into_inner()).await?;
    let today = today();

    let anchor = flow.dates.check_in().unwrap_or(today);
    let view = MonthView::build(
        params.year.unwrap_or(anchor.year()),
        params.month.unwrap_or(anchor.month()),
        &flow.dates,
        today,
    )?;
    Ok(HttpResponse::Ok().json(view))
}

pub async fn click_date(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<DateClick>,
) -> Result<HttpResponse, AppError> {
    let today = today();
    let flow = state
        .flows
        .update(path.into_inner(), |f| {
            f.click_date(body.date, today)?;
            Ok(f.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(flow))
}

pub async fn select_room(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<RoomChoice>,
) -> Result<HttpResponse, AppError> {
    let tax_rate = state.config.tax_rate;
    let flow = state
        .flows
        .update(path.into_inner(), |f| {
            f.select_room(&body.room_id, tax_rate)?;
            Ok(f.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(flow))
}

pub async fn submit_guest(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<GuestDetails>,
) -> Result<HttpResponse, AppError> {
    let details = body.into_inner();
    let flow = state
        .flows
        .update(path.into_inner(), |f| {
            f.submit_guest(details)?;
            Ok(f.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(flow))
}

/// Charges the card, inserts the booking and moves the flow to
/// confirmation. The work runs in its own task so the flow settles even if
/// the client goes away. A failed insert is recorded on the flow, which
/// stays at the payment step so the guest can retry.
pub async fn submit_payment(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PaymentDetails>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let today = today();

    let (card, new_booking) = state
        .flows
        .update(id, |f| f.authorize_payment(&body, today))
        .await?;

    let task = actix_web::rt::spawn(settle_payment(state.clone(), id, card, new_booking));
    match task.await {
        Ok(confirmation) => Ok(HttpResponse::Ok().json(confirmation?)),
        Err(e) => {
            log::error!("booking flow {id} payment task failed: {e}");
            state
                .flows
                .update(id, |f| {
                    f.fail_payment("payment could not be completed");
                    Ok(())
                })
                .await?;
            Err(AppError::Internal("payment could not be completed".to_string()))
        }
    }
}

async fn settle_payment(
    state: web::Data<AppState>,
    id: Uuid,
    card: CardSummary,
    mut new_booking: NewBooking,
) -> Result<Confirmation, AppError> {
    let receipt = payment::process(&card, state.config.payment_delay).await;
    new_booking.payment_reference = Some(receipt.reference.clone());

    match Booking::create(&state.pool, &new_booking).await {
        Ok(booking) => {
            let flow = state
                .flows
                .update(id, |f| {
                    f.confirm(booking.id, receipt)?;
                    Ok(f.clone())
                })
                .await?;
            log::info!("booking flow {id} confirmed as booking {}", booking.id);
            Ok(Confirmation { flow, booking })
        }
        Err(e) => {
            log::error!("booking flow {id} failed to save booking: {e}");
            let message = e.to_string();
            state
                .flows
                .update(id, |f| {
                    f.fail_payment(message);
                    Ok(())
                })
                .await?;
            Err(e.into())
        }
    }
}

pub async fn go_back(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let flow = state
        .flows
        .update(path.into_inner(), |f| {
            f.back()?;
            Ok(f.clone())
        })
        .await?;
    Ok(HttpResponse::Ok().json(flow))
}
