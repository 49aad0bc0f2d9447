mod store;

use actix_web::http::StatusCode;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

pub use store::FlowStore;

use crate::{
    date_picker::DateSelection,
    models::{booking::NewBooking, property::Property},
    payment::{CardSummary, PaymentDetails, PaymentError, PaymentReceipt},
    pricing::{self, PriceQuote, PricingError},
    rooms::{find_room, room_options, RoomOption},
};

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("booking flow {0} not found")]
    NotFound(Uuid),

    #[error("expected step {expected}, flow is at {actual}")]
    WrongStep {
        expected: BookingStep,
        actual: BookingStep,
    },

    #[error("booking is already confirmed")]
    Completed,

    #[error("cannot go back from {0}")]
    CannotGoBack(BookingStep),

    #[error("select check-in and check-out dates first")]
    DatesIncomplete,

    #[error("check-in date {0} has passed")]
    CheckInPassed(NaiveDate),

    #[error("unknown room option: {0}")]
    UnknownRoom(String),

    #[error("{guests} guests do not fit in {rooms} x {room} (sleeps {sleeps})")]
    Capacity {
        guests: i64,
        rooms: i64,
        room: String,
        sleeps: i64,
    },

    #[error("{0}")]
    InvalidParty(String),

    #[error("a payment is already being processed")]
    PaymentInProgress,

    #[error("invalid guest details: {0}")]
    Guest(#[from] validator::ValidationErrors),

    #[error("{0}")]
    InvalidPhone(&'static str),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Pricing(#[from] PricingError),
}

impl FlowError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FlowError::NotFound(_) => StatusCode::NOT_FOUND,
            FlowError::WrongStep { .. }
            | FlowError::Completed
            | FlowError::CannotGoBack(_)
            | FlowError::PaymentInProgress => StatusCode::CONFLICT,
            FlowError::DatesIncomplete
            | FlowError::CheckInPassed(_)
            | FlowError::UnknownRoom(_)
            | FlowError::Capacity { .. }
            | FlowError::InvalidParty(_)
            | FlowError::Guest(_)
            | FlowError::InvalidPhone(_)
            | FlowError::Payment(_)
            | FlowError::Pricing(_) => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BookingStep {
    Room,
    Guest,
    Payment,
    Confirmation,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GuestDetails {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 500))]
    pub special_requests: Option<String>,
}

impl GuestDetails {
    /// Trims every field and validates the result.
    pub fn checked(self) -> Result<Self, FlowError> {
        let details = self.normalized();
        details.validate()?;
        details.check_phone()?;
        Ok(details)
    }

    fn normalized(mut self) -> Self {
        self.first_name = self.first_name.trim().to_string();
        self.last_name = self.last_name.trim().to_string();
        self.email = self.email.trim().to_string();
        self.phone = self.phone.trim().to_string();
        self.special_requests = self
            .special_requests
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self
    }

    fn check_phone(&self) -> Result<(), FlowError> {
        let allowed = |c: char| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')');
        if !self.phone.chars().all(allowed) {
            return Err(FlowError::InvalidPhone(
                "phone may only contain digits, spaces, +, - and parentheses",
            ));
        }
        if self.phone.chars().filter(char::is_ascii_digit).count() < 7 {
            return Err(FlowError::InvalidPhone("phone needs at least 7 digits"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentSummary {
    pub card_holder: String,
    pub last4: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingFlow {
    pub id: Uuid,
    pub step: BookingStep,
    pub property: Property,
    pub room_options: Vec<RoomOption>,
    pub dates: DateSelection,
    pub guests: i64,
    pub rooms: i64,
    pub room: Option<RoomOption>,
    pub guest: Option<GuestDetails>,
    pub quote: Option<PriceQuote>,
    pub payment: Option<PaymentSummary>,
    pub booking_id: Option<i64>,
    pub processing: bool,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookingFlow {
    pub fn start(
        property: Property,
        check_in: Option<NaiveDate>,
        check_out: Option<NaiveDate>,
        guests: i64,
        rooms: i64,
        today: NaiveDate,
    ) -> Result<Self, FlowError> {
        if guests < 1 {
            return Err(FlowError::InvalidParty("guests must be at least 1".to_string()));
        }
        if rooms < 1 || rooms > property.total_rooms {
            return Err(FlowError::InvalidParty(format!(
                "rooms must be between 1 and {}",
                property.total_rooms
            )));
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            step: BookingStep::Room,
            room_options: room_options(&property),
            property,
            dates: DateSelection::from_stay(check_in, check_out, today),
            guests,
            rooms,
            room: None,
            guest: None,
            quote: None,
            payment: None,
            booking_id: None,
            processing: false,
            last_error: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_complete(&self) -> bool {
        self.step == BookingStep::Confirmation
    }

    fn expect_step(&self, expected: BookingStep) -> Result<(), FlowError> {
        if self.is_complete() {
            return Err(FlowError::Completed);
        }
        if self.step != expected {
            return Err(FlowError::WrongStep {
                expected,
                actual: self.step,
            });
        }
        Ok(())
    }

    pub fn click_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), FlowError> {
        self.expect_step(BookingStep::Room)?;

        let dates = self.dates.click(date, today);
        if dates != self.dates {
            self.dates = dates;
            self.quote = None;
        }
        Ok(())
    }

    pub fn select_room(&mut self, room_id: &str, tax_rate: f64) -> Result<&PriceQuote, FlowError> {
        self.expect_step(BookingStep::Room)?;

        let (check_in, check_out) = self.dates.stay().ok_or(FlowError::DatesIncomplete)?;
        let room = find_room(&self.room_options, room_id)
            .ok_or_else(|| FlowError::UnknownRoom(room_id.to_string()))?
            .clone();

        if room.sleeps * self.rooms < self.guests {
            return Err(FlowError::Capacity {
                guests: self.guests,
                rooms: self.rooms,
                room: room.name,
                sleeps: room.sleeps,
            });
        }

        let nights = pricing::nights(check_in, check_out)?;
        let quote = pricing::quote(
            self.property.price_per_night,
            room.price_multiplier,
            nights,
            self.rooms,
            tax_rate,
        )?;

        self.room = Some(room);
        self.step = BookingStep::Guest;
        Ok(self.quote.insert(quote))
    }

    pub fn submit_guest(&mut self, details: GuestDetails) -> Result<(), FlowError> {
        self.expect_step(BookingStep::Guest)?;

        self.guest = Some(details.checked()?);
        self.step = BookingStep::Payment;
        Ok(())
    }

    /// Checks the card and returns the booking to insert. The flow stays at
    /// the payment step, marked as processing, until it is confirmed or
    /// failed.
    pub fn authorize_payment(
        &mut self,
        details: &PaymentDetails,
        today: NaiveDate,
    ) -> Result<(CardSummary, NewBooking), FlowError> {
        self.expect_step(BookingStep::Payment)?;
        if self.processing {
            return Err(FlowError::PaymentInProgress);
        }

        let (check_in, check_out) = self.dates.stay().ok_or(FlowError::DatesIncomplete)?;
        if check_in < today {
            return Err(FlowError::CheckInPassed(check_in));
        }

        let card = details.check(today)?;
        let (Some(room), Some(guest), Some(quote)) = (&self.room, &self.guest, &self.quote) else {
            return Err(FlowError::WrongStep {
                expected: BookingStep::Room,
                actual: self.step,
            });
        };

        let booking = NewBooking {
            property_id: self.property.id,
            room_name: room.name.clone(),
            first_name: guest.first_name.clone(),
            last_name: guest.last_name.clone(),
            email: guest.email.clone(),
            phone: guest.phone.clone(),
            special_requests: guest.special_requests.clone(),
            check_in,
            check_out,
            rooms: self.rooms,
            guests_count: self.guests,
            nightly_rate: quote.nightly_rate,
            taxes: quote.taxes,
            total_price: quote.total,
            payment_reference: None,
            card_last4: Some(card.last4.clone()),
        };

        self.processing = true;
        self.last_error = None;
        Ok((card, booking))
    }

    pub fn confirm(&mut self, booking_id: i64, receipt: PaymentReceipt) -> Result<(), FlowError> {
        self.expect_step(BookingStep::Payment)?;

        self.payment = Some(PaymentSummary {
            card_holder: receipt.card_holder,
            last4: receipt.last4,
            reference: receipt.reference,
        });
        self.booking_id = Some(booking_id);
        self.processing = false;
        self.last_error = None;
        self.step = BookingStep::Confirmation;
        Ok(())
    }

    pub fn fail_payment(&mut self, message: impl Into<String>) {
        self.processing = false;
        self.last_error = Some(message.into());
    }

    pub fn back(&mut self) -> Result<BookingStep, FlowError> {
        if self.is_complete() {
            return Err(FlowError::Completed);
        }
        if self.processing {
            return Err(FlowError::PaymentInProgress);
        }

        self.step = match self.step {
            BookingStep::Guest => BookingStep::Room,
            BookingStep::Payment => BookingStep::Guest,
            step => return Err(FlowError::CannotGoBack(step)),
        };
        self.last_error = None;
        Ok(self.step)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDateTime;
    use sqlx::types::Json;

    use super::*;
    use crate::models::property::PropertyType;

    pub(crate) fn property() -> Property {
        Property {
            id: 7,
            name: "Seaside Inn".to_string(),
            property_type: PropertyType::Hotel,
            city: "Lisbon".to_string(),
            country: "Portugal".to_string(),
            address: String::new(),
            description: String::new(),
            price_per_night: 100.0,
            max_guests: 4,
            total_rooms: 5,
            rating: 4.2,
            review_count: 40,
            amenities: Json(vec!["wifi".to_string()]),
            images: Json(vec![]),
            bed_configuration: None,
            created_at: NaiveDateTime::default(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        date("2030-06-01")
    }

    pub(crate) fn guest() -> GuestDetails {
        GuestDetails {
            first_name: " Grace ".to_string(),
            last_name: "Hopper".to_string(),
            email: "grace@example.com".to_string(),
            phone: "+1 (555) 010-2030".to_string(),
            special_requests: Some("  ".to_string()),
        }
    }

    fn card() -> PaymentDetails {
        PaymentDetails {
            card_holder: "Grace Hopper".to_string(),
            card_number: "4111 1111 1111 1111".to_string(),
            expiry: "12/31".to_string(),
            cvc: "123".to_string(),
        }
    }

    fn flow_with_dates() -> BookingFlow {
        BookingFlow::start(
            property(),
            Some(date("2030-06-10")),
            Some(date("2030-06-12")),
            2,
            1,
            today(),
        )
        .unwrap()
    }

    #[test]
    fn test_start_validates_party() {
        assert!(BookingFlow::start(property(), None, None, 0, 1, today()).is_err());
        assert!(BookingFlow::start(property(), None, None, 2, 6, today()).is_err());

        let flow = BookingFlow::start(property(), None, None, 2, 1, today()).unwrap();
        assert_eq!(flow.step, BookingStep::Room);
        assert_eq!(flow.dates, DateSelection::Empty);
        assert_eq!(flow.room_options.len(), 3);
    }

    #[test]
    fn test_room_step_needs_dates() {
        let mut flow = BookingFlow::start(property(), None, None, 2, 1, today()).unwrap();
        assert!(matches!(flow.select_room("standard", 0.12), Err(FlowError::DatesIncomplete)));

        flow.click_date(date("2030-06-10"), today()).unwrap();
        flow.click_date(date("2030-06-13"), today()).unwrap();
        let quote = flow.select_room("deluxe", 0.12).unwrap();
        assert_eq!(quote.nights, 3);
        assert_eq!(quote.subtotal, 405.0);
        assert_eq!(flow.step, BookingStep::Guest);
    }

    #[test]
    fn test_room_capacity() {
        let mut flow = BookingFlow::start(
            property(),
            Some(date("2030-06-10")),
            Some(date("2030-06-12")),
            3,
            1,
            today(),
        )
        .unwrap();
        assert!(matches!(flow.select_room("standard", 0.12), Err(FlowError::Capacity { .. })));
        assert!(matches!(flow.select_room("penthouse", 0.12), Err(FlowError::UnknownRoom(_))));
        assert_eq!(flow.step, BookingStep::Room);
        assert!(flow.select_room("deluxe", 0.12).is_ok());
    }

    #[test]
    fn test_steps_must_follow_in_order() {
        let mut flow = flow_with_dates();
        assert!(matches!(
            flow.submit_guest(guest()),
            Err(FlowError::WrongStep {
                expected: BookingStep::Guest,
                actual: BookingStep::Room,
            })
        ));
        assert!(matches!(flow.back(), Err(FlowError::CannotGoBack(BookingStep::Room))));

        flow.select_room("standard", 0.12).unwrap();
        assert!(flow.click_date(date("2030-06-20"), today()).is_err());
    }

    #[test]
    fn test_guest_details_are_normalized_and_checked() {
        let mut flow = flow_with_dates();
        flow.select_room("standard", 0.12).unwrap();

        let mut bad = guest();
        bad.email = "not-an-email".to_string();
        assert!(matches!(flow.submit_guest(bad), Err(FlowError::Guest(_))));

        let mut bad = guest();
        bad.phone = "call me maybe".to_string();
        assert!(matches!(flow.submit_guest(bad), Err(FlowError::InvalidPhone(_))));
        assert_eq!(flow.step, BookingStep::Guest);

        flow.submit_guest(guest()).unwrap();
        let stored = flow.guest.as_ref().unwrap();
        assert_eq!(stored.first_name, "Grace");
        assert_eq!(stored.special_requests, None);
        assert_eq!(flow.step, BookingStep::Payment);
    }

    #[test]
    fn test_payment_builds_booking_and_confirms() {
        let mut flow = flow_with_dates();
        flow.select_room("standard", 0.12).unwrap();
        flow.submit_guest(guest()).unwrap();

        let (card, booking) = flow.authorize_payment(&card(), today()).unwrap();
        assert!(flow.processing);
        assert_eq!(card.last4, "1111");
        assert_eq!(booking.total_price, 224.0);
        assert_eq!(booking.room_name, "Standard Room");
        assert!(matches!(
            flow.authorize_payment(&self::card(), today()),
            Err(FlowError::PaymentInProgress)
        ));
        assert!(matches!(flow.back(), Err(FlowError::PaymentInProgress)));

        flow.confirm(
            42,
            PaymentReceipt {
                reference: "PAY-ABC".to_string(),
                card_holder: card.card_holder,
                last4: card.last4,
            },
        )
        .unwrap();
        assert!(flow.is_complete());
        assert_eq!(flow.booking_id, Some(42));
        assert!(matches!(flow.back(), Err(FlowError::Completed)));
    }

    #[test]
    fn test_failed_payment_can_be_retried() {
        let mut flow = flow_with_dates();
        flow.select_room("standard", 0.12).unwrap();
        flow.submit_guest(guest()).unwrap();
        flow.authorize_payment(&card(), today()).unwrap();

        flow.fail_payment("Not enough rooms available");
        assert_eq!(flow.step, BookingStep::Payment);
        assert!(!flow.processing);
        assert!(flow.last_error.is_some());

        assert!(flow.authorize_payment(&card(), today()).is_ok());
    }

    #[test]
    fn test_payment_after_check_in_date_is_rejected() {
        let mut flow = flow_with_dates();
        flow.select_room("standard", 0.12).unwrap();
        flow.submit_guest(guest()).unwrap();

        let day_after = date("2030-06-11");
        assert!(matches!(
            flow.authorize_payment(&card(), day_after),
            Err(FlowError::CheckInPassed(d)) if d == date("2030-06-10")
        ));
        assert!(!flow.processing);

        // paying on the check-in day itself is fine
        assert!(flow.authorize_payment(&card(), date("2030-06-10")).is_ok());
    }

    #[test]
    fn test_back_navigation() {
        let mut flow = flow_with_dates();
        flow.select_room("standard", 0.12).unwrap();
        flow.submit_guest(guest()).unwrap();
        assert_eq!(flow.back().unwrap(), BookingStep::Guest);
        assert_eq!(flow.back().unwrap(), BookingStep::Room);

        // choosing new dates drops the old quote
        flow.click_date(date("2030-06-20"), today()).unwrap();
        assert!(flow.quote.is_none());
    }
}
