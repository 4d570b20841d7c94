use serde::Deserialize;
use validator::Validate;

#[derive(Deserialize, Validate)]
/// Operator form updating a submission's status.
pub struct UpdateStatusForm {
    #[validate(length(min = 1, max = 60))]
    pub new_status: String,
    /// The status the operator last saw; a mismatch is a conflict.
    #[validate(length(min = 1, max = 60))]
    pub expected_old: String,
    #[validate(length(min = 1, max = 120))]
    pub actor: String,
    #[serde(default)]
    pub notify: bool,
}

#[derive(Debug, Deserialize)]
/// Query parameters for the submission list view.
pub struct ListSubmissionsParams {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}
