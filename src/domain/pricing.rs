//! Reservation pricing policy.
//!
//! The deposit stored with a reservation is always derived from its purchase
//! type; submitted amounts are never trusted.

use serde::Serialize;

use crate::domain::types::PurchaseType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub price: i64,
    pub deposit: i64,
}

const SOLO_DEVICE: Quote = Quote {
    price: 50_000,
    deposit: 50_000,
};
const BUNDLE_KIT: Quote = Quote {
    price: 80_000,
    deposit: 80_000,
};
const PILOT_PROGRAM: Quote = Quote {
    price: 200_000,
    deposit: 0,
};

pub fn quote(kind: PurchaseType) -> Quote {
    match kind {
        PurchaseType::SoloDevice => SOLO_DEVICE,
        PurchaseType::BundleKit => BUNDLE_KIT,
        PurchaseType::PilotProgram => PILOT_PROGRAM,
    }
}

/// Quote for a raw form code. Unknown codes get the first tier.
pub fn quote_for_code(code: &str) -> Quote {
    PurchaseType::from_code(code).map_or(SOLO_DEVICE, quote)
}

pub fn deposit_for(kind: PurchaseType) -> i64 {
    quote(kind).deposit
}

/// `CLP $80.000` style label.
pub fn format_clp(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0 { "-" } else { "" };
    format!("CLP {sign}${grouped}")
}
