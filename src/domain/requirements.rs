//! Derivation of supporting-document requirements from a profile.
//!
//! [`derive`] is pure and total: it never fails, and an incomplete profile
//! simply yields fewer requirements. The rule list is evaluated in a fixed
//! order and a category appears at most once in the output, so two calls with
//! an unchanged profile produce identical ordered lists.
use std::collections::HashSet;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::domain::profile::{AdultIndex, ClientCategory, EmploymentStatus, Profile};
use crate::domain::types::TypeConstraintError;

/// Stable document category identifiers shared with renderers.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Bank,
    Insurance,
    Salary,
    Pension,
    UnemploymentBenefits,
    BusinessAccounts,
    Securities,
    Pillar3a,
    Childcare,
    AlimonyReceived,
    AlimonyPaid,
    Donations,
    Debts,
    Mortgage,
    Renovations,
    ExpenseReceipts,
}

impl DocumentCategory {
    /// The stable identifier used in API payloads and storage paths.
    pub fn key(self) -> &'static str {
        match self {
            DocumentCategory::Bank => "bank",
            DocumentCategory::Insurance => "insurance",
            DocumentCategory::Salary => "salary",
            DocumentCategory::Pension => "pension",
            DocumentCategory::UnemploymentBenefits => "unemployment_benefits",
            DocumentCategory::BusinessAccounts => "business_accounts",
            DocumentCategory::Securities => "securities",
            DocumentCategory::Pillar3a => "pillar3a",
            DocumentCategory::Childcare => "childcare",
            DocumentCategory::AlimonyReceived => "alimony_received",
            DocumentCategory::AlimonyPaid => "alimony_paid",
            DocumentCategory::Donations => "donations",
            DocumentCategory::Debts => "debts",
            DocumentCategory::Mortgage => "mortgage",
            DocumentCategory::Renovations => "renovations",
            DocumentCategory::ExpenseReceipts => "expense_receipts",
        }
    }
}

impl Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl std::str::FromStr for DocumentCategory {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CATEGORIES
            .iter()
            .find(|category| category.key() == s)
            .copied()
            .ok_or_else(|| TypeConstraintError::InvalidValue(format!("unknown category: {s}")))
    }
}

const ALL_CATEGORIES: [DocumentCategory; 16] = [
    DocumentCategory::Bank,
    DocumentCategory::Insurance,
    DocumentCategory::Salary,
    DocumentCategory::Pension,
    DocumentCategory::UnemploymentBenefits,
    DocumentCategory::BusinessAccounts,
    DocumentCategory::Securities,
    DocumentCategory::Pillar3a,
    DocumentCategory::Childcare,
    DocumentCategory::AlimonyReceived,
    DocumentCategory::AlimonyPaid,
    DocumentCategory::Donations,
    DocumentCategory::Debts,
    DocumentCategory::Mortgage,
    DocumentCategory::Renovations,
    DocumentCategory::ExpenseReceipts,
];

/// One derived document requirement. Never persisted, always a projection.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct DocumentRequirement {
    pub category: DocumentCategory,
    pub required: bool,
    pub justification: String,
}

struct RequirementList {
    requirements: Vec<DocumentRequirement>,
    seen: HashSet<DocumentCategory>,
}

impl RequirementList {
    fn new() -> Self {
        Self {
            requirements: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Appends a requirement unless its category was already added by an
    /// earlier rule.
    fn push(&mut self, category: DocumentCategory, required: bool, justification: impl Into<String>) {
        if self.seen.insert(category) {
            self.requirements.push(DocumentRequirement {
                category,
                required,
                justification: justification.into(),
            });
        }
    }
}

fn employment_requirement(adult: AdultIndex, status: EmploymentStatus, couple: bool) -> (DocumentCategory, String) {
    let who = if couple {
        format!("adult {}", adult.ordinal())
    } else {
        "you".to_string()
    };
    match status {
        EmploymentStatus::Employed => (
            DocumentCategory::Salary,
            format!("Salary certificate because {who} declared salaried employment."),
        ),
        EmploymentStatus::Independent => (
            DocumentCategory::BusinessAccounts,
            format!("Business accounts because {who} declared self-employment."),
        ),
        EmploymentStatus::Retired => (
            DocumentCategory::Pension,
            format!("Pension statement because {who} declared retirement."),
        ),
        EmploymentStatus::Unemployed => (
            DocumentCategory::UnemploymentBenefits,
            format!("Unemployment benefit statement because {who} declared unemployment."),
        ),
    }
}

/// Derives the ordered list of document requirements for a profile.
pub fn derive(profile: &Profile) -> Vec<DocumentRequirement> {
    let mut list = RequirementList::new();

    // Baseline documents, independent of any declared fact.
    list.push(
        DocumentCategory::Bank,
        true,
        "Year-end bank statements are required for every declaration.",
    );
    list.push(
        DocumentCategory::Insurance,
        true,
        "Health insurance premium statements are required for every declaration.",
    );

    // Employment-status documents, evaluated per adult and unioned.
    let couple = profile.category == ClientCategory::Couple;
    for (adult, status) in profile.employment_statuses() {
        let (category, justification) = employment_requirement(adult, status, couple);
        list.push(category, true, justification);
    }

    // Conditional documents fire only when their boolean flag is set.
    if profile.securities.is_active() {
        list.push(
            DocumentCategory::Securities,
            true,
            "Securities register because you declared stock positions.",
        );
    }
    if profile.pillar3a.is_active() {
        list.push(
            DocumentCategory::Pillar3a,
            true,
            "Pillar 3a certificate because you declared pillar 3a contributions.",
        );
    }
    if profile.childcare.is_active() {
        list.push(
            DocumentCategory::Childcare,
            true,
            "Childcare cost receipts because you declared third-party care costs.",
        );
    }
    if profile.alimony_received.is_active() {
        list.push(
            DocumentCategory::AlimonyReceived,
            true,
            "Proof of alimony received because you declared incoming support payments.",
        );
    }
    if profile.alimony_paid.is_active() {
        list.push(
            DocumentCategory::AlimonyPaid,
            true,
            "Proof of alimony paid because you declared outgoing support payments.",
        );
    }
    if profile.donations.is_active() {
        list.push(
            DocumentCategory::Donations,
            true,
            "Donation receipts because you declared charitable donations.",
        );
    }
    if profile.debts.is_active() {
        list.push(
            DocumentCategory::Debts,
            true,
            "Debt and interest statements because you declared private debts.",
        );
    }
    if profile.mortgage.is_active() {
        list.push(
            DocumentCategory::Mortgage,
            true,
            "Mortgage interest statement because you declared a mortgage.",
        );
    }
    if profile.renovations.is_active() {
        list.push(
            DocumentCategory::Renovations,
            true,
            "Renovation invoices because you declared value-preserving works.",
        );
    }

    // Optional catch-all for deductible out-of-pocket expenses.
    list.push(
        DocumentCategory::ExpenseReceipts,
        false,
        "Receipts for professional expenses may increase your deductions.",
    );

    list.requirements
}

/// Required categories not yet covered by the uploaded set.
pub fn missing_required(
    requirements: &[DocumentRequirement],
    uploaded: &HashSet<DocumentCategory>,
) -> Vec<DocumentCategory> {
    requirements
        .iter()
        .filter(|r| r.required && !uploaded.contains(&r.category))
        .map(|r| r.category)
        .collect()
}

/// Whether every required category is covered by the uploaded set.
pub fn all_required_satisfied(
    requirements: &[DocumentRequirement],
    uploaded: &HashSet<DocumentCategory>,
) -> bool {
    missing_required(requirements, uploaded).is_empty()
}
