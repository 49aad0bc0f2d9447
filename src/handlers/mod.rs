use actix_web::web;
use chrono::NaiveDate;
use sqlx::SqlitePool;

use crate::{error::AppError, models::property::Property};

pub mod bookings;
pub mod destinations;
pub mod flows;
pub mod properties;

/// Extractor failures are reported like every other error, as JSON 400s.
fn bad_request(err: impl std::fmt::Display) -> actix_web::Error {
    AppError::BadRequest(err.to_string()).into()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::QueryConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::JsonConfig::default().error_handler(|err, _| bad_request(err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| bad_request(err)));

    cfg.service(
        web::scope("/destinations").route("", web::get().to(destinations::get_destinations)),
    )
    .service(
        web::scope("/properties")
            .route("", web::get().to(properties::search_properties))
            .route("", web::post().to(properties::create_property))
            .route("/{id}", web::get().to(properties::get_property))
            .route("/{id}/quote", web::get().to(properties::get_quote)),
    )
    .service(
        web::scope("/bookings")
            .route("", web::get().to(bookings::list_bookings))
            .route("", web::post().to(bookings::create_booking))
            .route("/{id}", web::get().to(bookings::get_booking))
            .route("/{id}", web::delete().to(bookings::cancel_booking)),
    )
    .service(
        web::scope("/flows")
            .route("", web::post().to(flows::start_flow))
            .route("/{id}", web::get().to(flows::get_flow))
            .route("/{id}", web::delete().to(flows::delete_flow))
            .route("/{id}/calendar", web::get().to(flows::get_calendar))
            .route("/{id}/dates", web::post().to(flows::click_date))
            .route("/{id}/room", web::post().to(flows::select_room))
            .route("/{id}/guest", web::post().to(flows::submit_guest))
            .route("/{id}/payment", web::post().to(flows::submit_payment))
            .route("/{id}/back", web::post().to(flows::go_back)),
    );
}

pub(crate) fn today() -> NaiveDate {
    chrono::Utc::now().naive_utc().date()
}

pub(crate) async fn load_property(pool: &SqlitePool, id: i64) -> Result<Property, AppError> {
    Property::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Property {id}")))
}
