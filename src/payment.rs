use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    #[error("card holder name is required")]
    MissingHolder,

    #[error("card number must be 13 to 19 digits")]
    CardNumberFormat,

    #[error("card number is invalid")]
    CardNumberChecksum,

    #[error("expiry must be MM/YY")]
    ExpiryFormat,

    #[error("card has expired")]
    Expired,

    #[error("security code must be 3 or 4 digits")]
    Cvc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentDetails {
    pub card_holder: String,
    pub card_number: String,
    /// `MM/YY`
    pub expiry: String,
    pub cvc: String,
}

/// What is kept of a card once it has been checked.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CardSummary {
    pub card_holder: String,
    pub last4: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PaymentReceipt {
    pub reference: String,
    pub card_holder: String,
    pub last4: String,
}

impl PaymentDetails {
    pub fn check(&self, today: NaiveDate) -> Result<CardSummary, PaymentError> {
        let card_holder = self.card_holder.trim();
        if card_holder.is_empty() {
            return Err(PaymentError::MissingHolder);
        }

        let digits: String = self
            .card_number
            .chars()
            .filter(|c| !matches!(c, ' ' | '-'))
            .collect();
        if !(13..=19).contains(&digits.len()) || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::CardNumberFormat);
        }
        if !luhn_valid(&digits) {
            return Err(PaymentError::CardNumberChecksum);
        }

        let (month, year) = parse_expiry(&self.expiry)?;
        if (year, month) < (today.year(), today.month()) {
            return Err(PaymentError::Expired);
        }

        let cvc = self.cvc.trim();
        if !(3..=4).contains(&cvc.len()) || !cvc.chars().all(|c| c.is_ascii_digit()) {
            return Err(PaymentError::Cvc);
        }

        Ok(CardSummary {
            card_holder: card_holder.to_string(),
            last4: digits[digits.len() - 4..].to_string(),
        })
    }
}

/// Simulated processor: waits `delay` and approves. Callers check the card
/// first.
pub async fn process(card: &CardSummary, delay: Duration) -> PaymentReceipt {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let reference = format!("PAY-{}", &Uuid::new_v4().simple().to_string()[..12]).to_uppercase();
    log::info!("payment {reference} approved for card ending {}", card.last4);

    PaymentReceipt {
        reference,
        card_holder: card.card_holder.clone(),
        last4: card.last4.clone(),
    }
}

fn parse_expiry(raw: &str) -> Result<(u32, i32), PaymentError> {
    let (month, year) = raw.trim().split_once('/').ok_or(PaymentError::ExpiryFormat)?;
    let (month, year) = (month.trim(), year.trim());
    let two_digits = |s: &str| s.len() == 2 && s.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(month) || !two_digits(year) {
        return Err(PaymentError::ExpiryFormat);
    }

    let month: u32 = month.parse().map_err(|_| PaymentError::ExpiryFormat)?;
    let year: i32 = year.parse().map_err(|_| PaymentError::ExpiryFormat)?;
    if !(1..=12).contains(&month) {
        return Err(PaymentError::ExpiryFormat);
    }

    Ok((month, 2000 + year))
}

fn luhn_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}
