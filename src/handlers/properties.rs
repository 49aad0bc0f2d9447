use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::load_property;
use crate::{
    error::AppError,
    models::property::{NewProperty, Property},
    pricing,
    rooms::{find_room, room_options, RoomOption},
    search::{SearchFilters, SearchParams},
    state::AppState,
};

#[derive(Serialize)]
struct PropertyDetail {
    property: Property,
    rooms: Vec<RoomOption>,
}

#[derive(Deserialize)]
pub struct QuoteParams {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub rooms: Option<i64>,
    /// Room option id; the first option when omitted.
    pub room: Option<String>,
}

pub async fn search_properties(
    state: web::Data<AppState>,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let filters = SearchFilters::from_params(params.into_inner())?;
    let page = Property::search(&state.pool, &filters).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn create_property(
    state: web::Data<AppState>,
    body: web::Json<NewProperty>,
) -> Result<HttpResponse, AppError> {
    body.validate()?;

    let property = Property::create(&state.pool, &body).await?;
    log::info!("created property {} ({})", property.id, property.name);
    Ok(HttpResponse::Created().json(property))
}

pub async fn get_property(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let property = load_property(&state.pool, path.into_inner()).await?;
    let rooms = room_options(&property);
    Ok(HttpResponse::Ok().json(PropertyDetail { property, rooms }))
}

pub async fn get_quote(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    params: web::Query<QuoteParams>,
) -> Result<HttpResponse, AppError> {
    let property = load_property(&state.pool, path.into_inner()).await?;
    let rooms = room_options(&property);

    let room = match params.room.as_deref() {
        Some(id) => find_room(&rooms, id)
            .ok_or_else(|| AppError::BadRequest(format!("unknown room option: {id}")))?,
        None => rooms
            .first()
            .ok_or_else(|| AppError::BadRequest("property has no room options".to_string()))?,
    };

    let nights = pricing::nights(params.check_in, params.check_out)?;
    let quote = pricing::quote(
        property.price_per_night,
        room.price_multiplier,
        nights,
        params.rooms.unwrap_or(1),
        state.config.tax_rate,
    )?;
    Ok(HttpResponse::Ok().json(quote))
}
