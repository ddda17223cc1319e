//! Forms for creating or joining a family.
//!
//! Both forms are checked locally before anything is sent to the backend.

use crate::family::{is_valid_family_code, ValidationError};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateFamilyForm {
  pub family_name: String,
  pub nickname: String,
  pub avatar: String,
}

impl CreateFamilyForm {
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.family_name.trim().is_empty() {
      return Err(ValidationError::MissingField("family name"));
    }
    if self.nickname.trim().is_empty() {
      return Err(ValidationError::MissingField("nickname"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinFamilyForm {
  pub code: String,
  pub nickname: String,
  pub avatar: String,
}

impl JoinFamilyForm {
  pub fn validate(&self) -> Result<(), ValidationError> {
    let code = self.code.trim();
    if code.is_empty() {
      return Err(ValidationError::MissingField("family code"));
    }
    if self.nickname.trim().is_empty() {
      return Err(ValidationError::MissingField("nickname"));
    }
    if !is_valid_family_code(code) {
      return Err(ValidationError::InvalidFamilyCode);
    }
    Ok(())
  }
}
