use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

use crate::{
    date_picker::DatePickerError, flow::FlowError, models::booking::BookingError,
    pricing::PricingError, search::SearchError,
};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error(transparent)]
    Pricing(#[from] PricingError),

    #[error(transparent)]
    DatePicker(#[from] DatePickerError),

    #[error(transparent)]
    Flow(#[from] FlowError),

    #[error(transparent)]
    Booking(#[from] BookingError),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_)
            | AppError::Validation(_)
            | AppError::Search(_)
            | AppError::Pricing(_)
            | AppError::DatePicker(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Flow(e) => e.status_code(),
            AppError::Booking(e) => e.status_code(),
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Database(e) => log::error!("database error: {e}"),
            AppError::Booking(BookingError::Database(e)) => {
                log::error!("booking database error: {e}")
            }
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}
