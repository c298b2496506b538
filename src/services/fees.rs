//! Fee calculation
//!
//! Pure arithmetic over a registration's charge components. Amounts are
//! plain sums; negative-value rejection belongs to request validation.

use serde::{Deserialize, Serialize};

/// One merchandise line entering the fee total
#[derive(Debug, Clone, Copy)]
pub struct MerchandiseLine {
    pub unit_price: f64,
    pub quantity: i32,
}

impl MerchandiseLine {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Decomposition of a registration's total charge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub registration_fee: f64,
    pub guest_total: f64,
    pub merchandise_total: f64,
    pub donation: f64,
    pub total: f64,
}

/// Compute the full charge breakdown for a registration
pub fn fee_breakdown(
    registration_fee: f64,
    guest_count: u32,
    guest_fee: f64,
    merchandise: &[MerchandiseLine],
    donation: f64,
) -> FeeBreakdown {
    let guest_total = guest_count as f64 * guest_fee;
    let merchandise_total: f64 = merchandise.iter().map(MerchandiseLine::line_total).sum();

    FeeBreakdown {
        registration_fee,
        guest_total,
        merchandise_total,
        donation,
        total: registration_fee + guest_total + merchandise_total + donation,
    }
}

impl FeeBreakdown {
    /// Whether the registrant owes anything
    pub fn payment_required(&self) -> bool {
        self.total > 0.0
    }
}

/// Recompute a registration total from already-aggregated components
pub fn total_from_components(
    registration_fee: f64,
    guest_fees: f64,
    merchandise_total: f64,
    donation: f64,
) -> f64 {
    registration_fee + guest_fees + merchandise_total + donation
}
