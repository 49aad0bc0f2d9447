use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    #[error("Check-out must be after check-in")]
    InvalidStay {
        check_in: NaiveDate,
        check_out: NaiveDate,
    },

    #[error("rooms must be at least 1")]
    InvalidRooms,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PriceQuote {
    pub nights: i64,
    pub rooms: i64,
    /// Per room, after the room option multiplier.
    pub nightly_rate: f64,
    pub subtotal: f64,
    pub tax_rate: f64,
    pub taxes: f64,
    pub total: f64,
}

pub fn nights(check_in: NaiveDate, check_out: NaiveDate) -> Result<i64, PricingError> {
    if check_out <= check_in {
        return Err(PricingError::InvalidStay { check_in, check_out });
    }
    Ok((check_out - check_in).num_days())
}

pub fn quote(
    price_per_night: f64,
    multiplier: f64,
    nights: i64,
    rooms: i64,
    tax_rate: f64,
) -> Result<PriceQuote, PricingError> {
    if rooms < 1 {
        return Err(PricingError::InvalidRooms);
    }

    let nightly_rate = round2(price_per_night * multiplier);
    let subtotal = round2(nightly_rate * nights as f64 * rooms as f64);
    let taxes = round2(subtotal * tax_rate);

    Ok(PriceQuote {
        nights,
        rooms,
        nightly_rate,
        subtotal,
        tax_rate,
        taxes,
        total: round2(subtotal + taxes),
    })
}

/// Rounds to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_nights() {
        assert_eq!(nights(date("2030-01-30"), date("2030-02-02")), Ok(3));
        assert!(nights(date("2030-02-02"), date("2030-02-02")).is_err());
        assert!(nights(date("2030-02-03"), date("2030-02-02")).is_err());
    }

    #[test]
    fn test_quote_applies_multiplier_rooms_and_tax() {
        let q = quote(100.0, 1.35, 2, 1, 0.12).unwrap();
        assert_eq!(q.nightly_rate, 135.0);
        assert_eq!(q.subtotal, 270.0);
        assert_eq!(q.taxes, 32.4);
        assert_eq!(q.total, 302.4);

        let q = quote(80.0, 1.0, 3, 2, 0.1).unwrap();
        assert_eq!(q.subtotal, 480.0);
        assert_eq!(q.taxes, 48.0);
        assert_eq!(q.total, 528.0);
    }

    #[test]
    fn test_quote_rounds_to_cents() {
        let q = quote(99.99, 1.2, 1, 1, 0.12).unwrap();
        assert_eq!(q.nightly_rate, 119.99);
        assert_eq!(q.taxes, 14.4);
        assert_eq!(q.total, 134.39);
    }

    #[test]
    fn test_quote_needs_a_room() {
        assert_eq!(quote(100.0, 1.0, 1, 0, 0.12), Err(PricingError::InvalidRooms));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.005_1), 1.01);
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(-1.236), -1.24);
    }
}
