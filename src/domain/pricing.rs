//! Deterministic price calculation over a profile and the selected options.
//!
//! All arithmetic is integer cents. The advertised total is VAT-inclusive;
//! the tax portion is divided out with round-half-up at cent precision so
//! that `tax + net == total` holds exactly.
use serde::{Deserialize, Serialize};

use crate::domain::profile::{ClientCategory, DeadlineTier, DeliveryMethod, Profile, ServiceOptions};

pub const CURRENCY: &str = "CHF";

/// Inclusive VAT rate, in tenths of a percent (8.1%).
const VAT_PER_MILLE: i64 = 81;

const BASE_FEE: i64 = 50_00;
const COUPLE_SURCHARGE: i64 = 20_00;
const INDEPENDENT_SURCHARGE: i64 = 30_00;
const PER_CHILD_FEE: i64 = 10_00;
const PER_PROPERTY_FEE: i64 = 20_00;
const SECURITIES_SURCHARGE: i64 = 15_00;
/// Position count above which the securities surcharge applies.
const SECURITIES_THRESHOLD: u32 = 10;
const POSTAL_DELIVERY_SURCHARGE: i64 = 10_00;
const EXPERT_REVIEW_SURCHARGE: i64 = 40_00;
const EXTENDED_DEADLINE_SURCHARGE: i64 = 20_00;
const EXPRESS_DEADLINE_SURCHARGE: i64 = 80_00;

/// One itemized component of a quote.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuoteLine {
    pub label: String,
    pub amount_cents: i64,
}

/// The VAT-inclusive price for a submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Quote {
    pub total_cents: i64,
    pub tax_cents: i64,
    pub net_cents: i64,
    pub currency: String,
    pub lines: Vec<QuoteLine>,
}

/// Integer division with round-half-up for non-negative operands.
fn div_round_half_up(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator / 2) / denominator
}

/// Splits the inclusive VAT portion out of a gross amount.
pub fn tax_portion(total_cents: i64) -> i64 {
    div_round_half_up(total_cents * VAT_PER_MILLE, 1000 + VAT_PER_MILLE)
}

fn deadline_surcharge(tier: DeadlineTier) -> i64 {
    match tier {
        DeadlineTier::Standard => 0,
        DeadlineTier::Extended => EXTENDED_DEADLINE_SURCHARGE,
        DeadlineTier::Express => EXPRESS_DEADLINE_SURCHARGE,
    }
}

/// Computes the quote for a profile and the selected options.
pub fn quote(profile: &Profile, options: &ServiceOptions) -> Quote {
    let mut lines = vec![QuoteLine {
        label: "Base fee".to_string(),
        amount_cents: BASE_FEE,
    }];

    match profile.category {
        ClientCategory::Couple => lines.push(QuoteLine {
            label: "Joint declaration".to_string(),
            amount_cents: COUPLE_SURCHARGE,
        }),
        ClientCategory::Independent => lines.push(QuoteLine {
            label: "Self-employment".to_string(),
            amount_cents: INDEPENDENT_SURCHARGE,
        }),
        ClientCategory::Private => {}
    }

    if profile.children_count > 0 {
        lines.push(QuoteLine {
            label: format!("Children ({})", profile.children_count),
            amount_cents: PER_CHILD_FEE * i64::from(profile.children_count),
        });
    }

    if profile.owns_property && profile.property_count > 0 {
        lines.push(QuoteLine {
            label: format!("Properties ({})", profile.property_count),
            amount_cents: PER_PROPERTY_FEE * i64::from(profile.property_count),
        });
    }

    if profile
        .securities
        .count()
        .is_some_and(|count| count > SECURITIES_THRESHOLD)
    {
        lines.push(QuoteLine {
            label: "Extended securities register".to_string(),
            amount_cents: SECURITIES_SURCHARGE,
        });
    }

    if options.delivery == DeliveryMethod::Postal {
        lines.push(QuoteLine {
            label: "Postal delivery".to_string(),
            amount_cents: POSTAL_DELIVERY_SURCHARGE,
        });
    }

    if options.expert_review {
        lines.push(QuoteLine {
            label: "Expert review".to_string(),
            amount_cents: EXPERT_REVIEW_SURCHARGE,
        });
    }

    let deadline = deadline_surcharge(options.deadline);
    if deadline > 0 {
        lines.push(QuoteLine {
            label: format!("Deadline: {:?}", options.deadline).to_lowercase(),
            amount_cents: deadline,
        });
    }

    let total_cents: i64 = lines.iter().map(|line| line.amount_cents).sum();
    let tax_cents = tax_portion(total_cents);

    Quote {
        total_cents,
        tax_cents,
        net_cents: total_cents - tax_cents,
        currency: CURRENCY.to_string(),
        lines,
    }
}
