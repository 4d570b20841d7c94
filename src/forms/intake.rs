use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use serde::Deserialize;
use validator::Validate;

use crate::domain::draft::FormStep;
use crate::domain::profile::{
    AdultIndex, ClientCategory, DeadlineTier, DeliveryMethod, EmploymentStatus, FlaggedAmount,
    FlaggedCount, ProfileUpdate, ServiceOptions, TransportMode, Workplace,
};
use crate::domain::requirements::DocumentCategory;
use crate::domain::types::{CantonCode, ContactEmail, EmployerName, Remarks};
use crate::forms::FormError;

/// A declared fact with its amount, as submitted by the client.
#[derive(Clone, Copy, Default, Deserialize, Validate)]
pub struct FlaggedAmountForm {
    #[serde(default)]
    pub enabled: bool,
    #[validate(range(min = 0))]
    #[serde(default)]
    pub amount_cents: i64,
}

impl From<FlaggedAmountForm> for FlaggedAmount {
    fn from(form: FlaggedAmountForm) -> Self {
        Self {
            enabled: form.enabled,
            amount_cents: form.amount_cents,
        }
    }
}

#[derive(Clone, Copy, Default, Deserialize, Validate)]
pub struct FlaggedCountForm {
    #[serde(default)]
    pub enabled: bool,
    #[validate(range(max = 10_000))]
    #[serde(default)]
    pub count: u32,
}

impl From<FlaggedCountForm> for FlaggedCount {
    fn from(form: FlaggedCountForm) -> Self {
        Self {
            enabled: form.enabled,
            count: form.count,
        }
    }
}

#[derive(Deserialize, Validate)]
/// Form data for the situation step.
pub struct SituationForm {
    /// Two-letter canton code.
    #[validate(length(equal = 2))]
    pub canton: String,
    pub category: ClientCategory,
    pub employment: EmploymentStatus,
    pub partner_employment: Option<EmploymentStatus>,
    #[validate(range(max = 20))]
    #[serde(default)]
    pub children_count: u32,
    #[validate(nested)]
    #[serde(default)]
    pub childcare: FlaggedAmountForm,
}

#[derive(Deserialize, Validate)]
/// Form data for the financial facts step.
pub struct FinancialsForm {
    #[validate(nested)]
    #[serde(default)]
    pub securities: FlaggedCountForm,
    #[validate(nested)]
    #[serde(default)]
    pub pillar3a: FlaggedAmountForm,
    #[validate(nested)]
    #[serde(default)]
    pub donations: FlaggedAmountForm,
    #[validate(nested)]
    #[serde(default)]
    pub debts: FlaggedAmountForm,
    #[validate(nested)]
    #[serde(default)]
    pub alimony_received: FlaggedAmountForm,
    #[validate(nested)]
    #[serde(default)]
    pub alimony_paid: FlaggedAmountForm,
}

#[derive(Deserialize, Validate)]
/// Form data for the property step.
pub struct PropertyForm {
    #[serde(default)]
    pub owns_property: bool,
    #[validate(range(max = 50))]
    #[serde(default)]
    pub property_count: u32,
    #[validate(nested)]
    #[serde(default)]
    pub mortgage: FlaggedAmountForm,
    #[validate(nested)]
    #[serde(default)]
    pub renovations: FlaggedAmountForm,
}

#[derive(Deserialize, Validate)]
/// Form data for one workplace record.
pub struct WorkplaceForm {
    #[serde(default)]
    pub adult: AdultIndex,
    #[validate(length(min = 1, max = 120))]
    pub employer: String,
    pub transport: TransportMode,
    #[validate(range(max = 500))]
    #[serde(default)]
    pub distance_km: u32,
    #[validate(range(max = 366))]
    #[serde(default)]
    pub yearly_days: u32,
    #[validate(length(max = 250))]
    pub reimbursement: Option<String>,
}

impl TryFrom<WorkplaceForm> for Workplace {
    type Error = FormError;

    fn try_from(form: WorkplaceForm) -> Result<Self, Self::Error> {
        Ok(Self {
            adult: form.adult,
            employer: EmployerName::new(form.employer)?,
            transport: form.transport,
            distance_km: form.distance_km,
            yearly_days: form.yearly_days,
            reimbursement: form
                .reimbursement
                .filter(|r| !r.trim().is_empty()),
        })
    }
}

#[derive(Deserialize, Validate)]
/// Form data for the delivery and service preferences.
pub struct OptionsForm {
    pub delivery: DeliveryMethod,
    pub deadline: DeadlineTier,
    #[serde(default)]
    pub expert_review: bool,
    #[validate(email)]
    pub contact_email: Option<String>,
}

impl TryFrom<OptionsForm> for ServiceOptions {
    type Error = FormError;

    fn try_from(form: OptionsForm) -> Result<Self, Self::Error> {
        let contact_email = form
            .contact_email
            .filter(|e| !e.trim().is_empty())
            .map(ContactEmail::new)
            .transpose()?;
        Ok(Self {
            delivery: form.delivery,
            deadline: form.deadline,
            expert_review: form.expert_review,
            contact_email,
        })
    }
}

/// One draft mutation, as accepted by `PATCH /drafts/{id}/profile`.
#[derive(Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftUpdateForm {
    Situation(SituationForm),
    Financials(FinancialsForm),
    Property(PropertyForm),
    AddWorkplace(WorkplaceForm),
    RemoveWorkplace { index: usize },
    Remarks { remarks: Option<String> },
    Options(OptionsForm),
}

/// The validated command a [`DraftUpdateForm`] turns into.
pub enum DraftCommand {
    Profile(ProfileUpdate),
    Options(ServiceOptions),
}

impl DraftUpdateForm {
    /// Validates the form and converts it into a draft command.
    pub fn into_command(self) -> Result<DraftCommand, FormError> {
        match self {
            DraftUpdateForm::Situation(form) => {
                form.validate()?;
                Ok(DraftCommand::Profile(ProfileUpdate::Situation {
                    canton: CantonCode::new(form.canton)?,
                    category: form.category,
                    employment: form.employment,
                    partner_employment: form.partner_employment,
                    children_count: form.children_count,
                    childcare: form.childcare.into(),
                }))
            }
            DraftUpdateForm::Financials(form) => {
                form.validate()?;
                Ok(DraftCommand::Profile(ProfileUpdate::Financials {
                    securities: form.securities.into(),
                    pillar3a: form.pillar3a.into(),
                    donations: form.donations.into(),
                    debts: form.debts.into(),
                    alimony_received: form.alimony_received.into(),
                    alimony_paid: form.alimony_paid.into(),
                }))
            }
            DraftUpdateForm::Property(form) => {
                form.validate()?;
                Ok(DraftCommand::Profile(ProfileUpdate::Property {
                    owns_property: form.owns_property,
                    property_count: form.property_count,
                    mortgage: form.mortgage.into(),
                    renovations: form.renovations.into(),
                }))
            }
            DraftUpdateForm::AddWorkplace(form) => {
                form.validate()?;
                Ok(DraftCommand::Profile(ProfileUpdate::AddWorkplace(
                    form.try_into()?,
                )))
            }
            DraftUpdateForm::RemoveWorkplace { index } => {
                Ok(DraftCommand::Profile(ProfileUpdate::RemoveWorkplace {
                    index,
                }))
            }
            DraftUpdateForm::Remarks { remarks } => {
                let remarks = remarks
                    .filter(|r| !r.trim().is_empty())
                    .map(Remarks::new)
                    .transpose()?;
                Ok(DraftCommand::Profile(ProfileUpdate::Remarks(remarks)))
            }
            DraftUpdateForm::Options(form) => {
                form.validate()?;
                Ok(DraftCommand::Options(form.try_into()?))
            }
        }
    }
}

#[derive(Deserialize)]
/// Form data for moving the wizard step pointer.
pub struct StepForm {
    pub step: FormStep,
}

#[derive(Deserialize)]
/// Form data for selecting the document category being worked on.
pub struct ActiveCategoryForm {
    pub category: Option<DocumentCategory>,
}

#[derive(Deserialize)]
/// Form data for the certification checkbox.
pub struct CertifyForm {
    pub certified: bool,
}

#[derive(MultipartForm)]
/// Multipart form attaching one document to the draft.
pub struct AttachDocumentForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
    pub category: Text<String>,
}

#[derive(MultipartForm)]
/// Multipart form re-attaching the bytes of a file lost across a reload.
pub struct ReattachDocumentForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}
