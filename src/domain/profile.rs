//! The evolving answer set describing a user's tax situation.
//!
//! `Profile` is an immutable value: every change goes through
//! [`Profile::apply`] with a [`ProfileUpdate`] command and yields a new
//! value, so persistence can hang off a single mutation pipeline.
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::types::{CantonCode, ContactEmail, EmployerName, Remarks};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ClientCategory {
    #[default]
    Private,
    Independent,
    Couple,
}

impl ClientCategory {
    /// Number of adults covered by one submission of this category.
    pub fn adult_count(self) -> usize {
        match self {
            ClientCategory::Couple => 2,
            _ => 1,
        }
    }
}

impl Display for ClientCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientCategory::Private => write!(f, "private"),
            ClientCategory::Independent => write!(f, "independent"),
            ClientCategory::Couple => write!(f, "couple"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Employed,
    Independent,
    Retired,
    Unemployed,
}

impl EmploymentStatus {
    /// Whether this status implies a commute worth declaring.
    pub fn requires_workplace(self) -> bool {
        matches!(self, EmploymentStatus::Employed | EmploymentStatus::Independent)
    }
}

impl Display for EmploymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmploymentStatus::Employed => write!(f, "employed"),
            EmploymentStatus::Independent => write!(f, "independent"),
            EmploymentStatus::Retired => write!(f, "retired"),
            EmploymentStatus::Unemployed => write!(f, "unemployed"),
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Train,
    Car,
    Bike,
    None,
}

/// Which adult of a submission a record belongs to. `Second` is only
/// meaningful for the `couple` category.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum AdultIndex {
    #[default]
    First,
    Second,
}

impl AdultIndex {
    /// One-based ordinal used in user-facing texts.
    pub fn ordinal(self) -> usize {
        match self {
            AdultIndex::First => 1,
            AdultIndex::Second => 2,
        }
    }
}

/// One record per (adult, employer) commute.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Workplace {
    pub adult: AdultIndex,
    pub employer: EmployerName,
    pub transport: TransportMode,
    pub distance_km: u32,
    pub yearly_days: u32,
    /// Employer reimbursement terms, free text.
    pub reimbursement: Option<String>,
}

/// A boolean fact with a companion amount in cents.
///
/// The amount is meaningless while `enabled` is false; consumers must gate on
/// the flag and never infer an obligation from a non-zero amount alone.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlaggedAmount {
    pub enabled: bool,
    pub amount_cents: i64,
}

impl FlaggedAmount {
    pub fn on(amount_cents: i64) -> Self {
        Self {
            enabled: true,
            amount_cents,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled
    }

    /// The declared amount, present only while the flag is set.
    pub fn amount(&self) -> Option<i64> {
        self.enabled.then_some(self.amount_cents)
    }
}

/// A boolean fact with a companion count.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct FlaggedCount {
    pub enabled: bool,
    pub count: u32,
}

impl FlaggedCount {
    pub fn on(count: u32) -> Self {
        Self {
            enabled: true,
            count,
        }
    }

    pub fn is_active(&self) -> bool {
        self.enabled
    }

    pub fn count(&self) -> Option<u32> {
        self.enabled.then_some(self.count)
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    #[default]
    Electronic,
    Postal,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineTier {
    #[default]
    Standard,
    Extended,
    Express,
}

/// Delivery and service preferences selected alongside the profile.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ServiceOptions {
    pub delivery: DeliveryMethod,
    pub deadline: DeadlineTier,
    pub expert_review: bool,
    /// Address used for payment and summary notifications.
    pub contact_email: Option<ContactEmail>,
}

/// The structured answer set for one submission.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Profile {
    pub canton: Option<CantonCode>,
    pub category: ClientCategory,
    pub employment: Option<EmploymentStatus>,
    /// Employment status of the second adult; meaningful only for couples.
    pub partner_employment: Option<EmploymentStatus>,
    pub children_count: u32,
    pub childcare: FlaggedAmount,
    pub securities: FlaggedCount,
    pub pillar3a: FlaggedAmount,
    pub donations: FlaggedAmount,
    pub debts: FlaggedAmount,
    pub alimony_received: FlaggedAmount,
    pub alimony_paid: FlaggedAmount,
    pub owns_property: bool,
    pub property_count: u32,
    pub mortgage: FlaggedAmount,
    pub renovations: FlaggedAmount,
    pub workplaces: Vec<Workplace>,
    pub remarks: Option<Remarks>,
}

/// A single mutation command applied through [`Profile::apply`].
#[derive(Clone, Debug, Deserialize)]
pub enum ProfileUpdate {
    Situation {
        canton: CantonCode,
        category: ClientCategory,
        employment: EmploymentStatus,
        partner_employment: Option<EmploymentStatus>,
        children_count: u32,
        childcare: FlaggedAmount,
    },
    Financials {
        securities: FlaggedCount,
        pillar3a: FlaggedAmount,
        donations: FlaggedAmount,
        debts: FlaggedAmount,
        alimony_received: FlaggedAmount,
        alimony_paid: FlaggedAmount,
    },
    Property {
        owns_property: bool,
        property_count: u32,
        mortgage: FlaggedAmount,
        renovations: FlaggedAmount,
    },
    AddWorkplace(Workplace),
    RemoveWorkplace {
        index: usize,
    },
    Remarks(Option<Remarks>),
}

impl Profile {
    /// Applies one update command, returning the successor profile.
    #[must_use]
    pub fn apply(&self, update: ProfileUpdate) -> Profile {
        let mut next = self.clone();
        match update {
            ProfileUpdate::Situation {
                canton,
                category,
                employment,
                partner_employment,
                children_count,
                childcare,
            } => {
                next.canton = Some(canton);
                next.category = category;
                next.employment = Some(employment);
                next.partner_employment = if category == ClientCategory::Couple {
                    partner_employment
                } else {
                    None
                };
                next.children_count = children_count;
                next.childcare = childcare;
            }
            ProfileUpdate::Financials {
                securities,
                pillar3a,
                donations,
                debts,
                alimony_received,
                alimony_paid,
            } => {
                next.securities = securities;
                next.pillar3a = pillar3a;
                next.donations = donations;
                next.debts = debts;
                next.alimony_received = alimony_received;
                next.alimony_paid = alimony_paid;
            }
            ProfileUpdate::Property {
                owns_property,
                property_count,
                mortgage,
                renovations,
            } => {
                next.owns_property = owns_property;
                next.property_count = if owns_property { property_count } else { 0 };
                next.mortgage = if owns_property {
                    mortgage
                } else {
                    FlaggedAmount::default()
                };
                next.renovations = if owns_property {
                    renovations
                } else {
                    FlaggedAmount::default()
                };
            }
            ProfileUpdate::AddWorkplace(workplace) => next.workplaces.push(workplace),
            ProfileUpdate::RemoveWorkplace { index } => {
                if index < next.workplaces.len() {
                    next.workplaces.remove(index);
                }
            }
            ProfileUpdate::Remarks(remarks) => next.remarks = remarks,
        }
        next
    }

    /// Employment status per adult, in adult order.
    pub fn employment_statuses(&self) -> Vec<(AdultIndex, EmploymentStatus)> {
        let mut statuses = Vec::new();
        if let Some(status) = self.employment {
            statuses.push((AdultIndex::First, status));
        }
        if self.category == ClientCategory::Couple
            && let Some(status) = self.partner_employment
        {
            statuses.push((AdultIndex::Second, status));
        }
        statuses
    }

    /// Workplaces declared for the given adult.
    pub fn workplaces_for(&self, adult: AdultIndex) -> impl Iterator<Item = &Workplace> {
        self.workplaces.iter().filter(move |w| w.adult == adult)
    }

    /// Adults whose employment status requires a workplace but who have none
    /// declared yet. Empty when the situation step may be left.
    pub fn adults_missing_workplace(&self) -> Vec<AdultIndex> {
        self.employment_statuses()
            .into_iter()
            .filter(|(adult, status)| {
                status.requires_workplace() && self.workplaces_for(*adult).next().is_none()
            })
            .map(|(adult, _)| adult)
            .collect()
    }
}
