use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::{error::AppError, models::property::Property, state::AppState};

#[derive(Deserialize)]
pub struct DestinationQuery {
    pub q: String,
    pub limit: Option<i64>,
}

pub async fn get_destinations(
    state: web::Data<AppState>,
    params: web::Query<DestinationQuery>,
) -> Result<HttpResponse, AppError> {
    let q = params.q.trim();
    if q.is_empty() {
        return Err(AppError::BadRequest("q must not be empty".to_string()));
    }

    let limit = params.limit.unwrap_or(8);
    if !(1..=20).contains(&limit) {
        return Err(AppError::BadRequest("limit must be between 1 and 20".to_string()));
    }

    let destinations = Property::destinations(&state.pool, q, limit).await?;
    Ok(HttpResponse::Ok().json(destinations))
}
