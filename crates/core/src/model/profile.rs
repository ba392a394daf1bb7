use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ProfileId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProfileError {
    #[error("age must be between 1 and 120, got {0}")]
    InvalidAge(u16),

    #[error("unknown gender: {0}")]
    UnknownGender(String),

    #[error("unknown smoking status: {0}")]
    UnknownSmokingStatus(String),

    #[error("unknown training class: {0}")]
    UnknownTrainingClass(String),
}

pub const MIN_AGE: u16 = 1;
pub const MAX_AGE: u16 = 120;

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gender {
    Male,
    Female,
    NonBinary,
    PreferNotToSay,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::NonBinary => "non-binary",
            Gender::PreferNotToSay => "prefer-not-to-say",
        }
    }
}

impl FromStr for Gender {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "non-binary" => Ok(Gender::NonBinary),
            "prefer-not-to-say" => Ok(Gender::PreferNotToSay),
            other => Err(ProfileError::UnknownGender(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SmokingStatus {
    Never,
    Former,
    Current,
}

impl SmokingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SmokingStatus::Never => "never",
            SmokingStatus::Former => "former",
            SmokingStatus::Current => "current",
        }
    }
}

impl FromStr for SmokingStatus {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "never" => Ok(SmokingStatus::Never),
            "former" => Ok(SmokingStatus::Former),
            "current" => Ok(SmokingStatus::Current),
            other => Err(ProfileError::UnknownSmokingStatus(other.to_owned())),
        }
    }
}

/// Training programme assigned at onboarding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrainingClass {
    Prevention,
    Recovery,
    Maintenance,
}

impl TrainingClass {
    /// Derive the programme from onboarding answers.
    ///
    /// Current smokers, rhinitis and the 45-65 age window go to recovery;
    /// former smokers to maintenance; everyone else to prevention.
    #[must_use]
    pub fn derive(age: u16, smoking_status: SmokingStatus, has_rhinitis: bool) -> Self {
        let in_menopause_window = (45..=65).contains(&age);
        let has_risk_factors = smoking_status == SmokingStatus::Current || has_rhinitis;

        if has_risk_factors || in_menopause_window {
            return TrainingClass::Recovery;
        }
        if smoking_status == SmokingStatus::Former {
            return TrainingClass::Maintenance;
        }
        TrainingClass::Prevention
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TrainingClass::Prevention => "prevention",
            TrainingClass::Recovery => "recovery",
            TrainingClass::Maintenance => "maintenance",
        }
    }
}

impl FromStr for TrainingClass {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prevention" => Ok(TrainingClass::Prevention),
            "recovery" => Ok(TrainingClass::Recovery),
            "maintenance" => Ok(TrainingClass::Maintenance),
            other => Err(ProfileError::UnknownTrainingClass(other.to_owned())),
        }
    }
}

impl fmt::Display for TrainingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── PROFILE ───────────────────────────────────────────────────────────────────
//

/// Onboarding answers before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub age: u16,
    pub gender: Gender,
    pub is_menopausal: bool,
    pub smoking_status: SmokingStatus,
    pub has_rhinitis: bool,
    pub preferred_perfume: Option<String>,
}

impl ProfileDraft {
    /// Validate the draft and derive the training class.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidAge` if the age is outside `1..=120`.
    pub fn validate(self, now: DateTime<Utc>) -> Result<UserProfile, ProfileError> {
        validate_age(self.age)?;
        let training_class = TrainingClass::derive(self.age, self.smoking_status, self.has_rhinitis);
        Ok(UserProfile {
            id: ProfileId::generate(),
            age: self.age,
            gender: self.gender,
            is_menopausal: self.is_menopausal,
            smoking_status: self.smoking_status,
            has_rhinitis: self.has_rhinitis,
            preferred_perfume: normalize_optional(self.preferred_perfume),
            training_class,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    id: ProfileId,
    age: u16,
    gender: Gender,
    is_menopausal: bool,
    smoking_status: SmokingStatus,
    has_rhinitis: bool,
    preferred_perfume: Option<String>,
    training_class: TrainingClass,
    created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Rehydrate a stored profile. The stored training class is kept as-is.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidAge` if the stored age is out of range.
    #[allow(clippy::too_many_arguments, clippy::fn_params_excessive_bools)]
    pub fn from_persisted(
        id: ProfileId,
        age: u16,
        gender: Gender,
        is_menopausal: bool,
        smoking_status: SmokingStatus,
        has_rhinitis: bool,
        preferred_perfume: Option<String>,
        training_class: TrainingClass,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        validate_age(age)?;
        Ok(Self {
            id,
            age,
            gender,
            is_menopausal,
            smoking_status,
            has_rhinitis,
            preferred_perfume: normalize_optional(preferred_perfume),
            training_class,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ProfileId {
        self.id
    }

    #[must_use]
    pub fn age(&self) -> u16 {
        self.age
    }

    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }

    #[must_use]
    pub fn is_menopausal(&self) -> bool {
        self.is_menopausal
    }

    #[must_use]
    pub fn smoking_status(&self) -> SmokingStatus {
        self.smoking_status
    }

    #[must_use]
    pub fn has_rhinitis(&self) -> bool {
        self.has_rhinitis
    }

    #[must_use]
    pub fn preferred_perfume(&self) -> Option<&str> {
        self.preferred_perfume.as_deref()
    }

    #[must_use]
    pub fn training_class(&self) -> TrainingClass {
        self.training_class
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

fn validate_age(age: u16) -> Result<(), ProfileError> {
    if (MIN_AGE..=MAX_AGE).contains(&age) {
        Ok(())
    } else {
        Err(ProfileError::InvalidAge(age))
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn draft(age: u16, smoking_status: SmokingStatus, has_rhinitis: bool) -> ProfileDraft {
        ProfileDraft {
            age,
            gender: Gender::Female,
            is_menopausal: false,
            smoking_status,
            has_rhinitis,
            preferred_perfume: Some("  lancome-lavie ".into()),
        }
    }

    #[test]
    fn training_class_rules() {
        assert_eq!(
            TrainingClass::derive(30, SmokingStatus::Current, false),
            TrainingClass::Recovery
        );
        assert_eq!(
            TrainingClass::derive(30, SmokingStatus::Never, true),
            TrainingClass::Recovery
        );
        assert_eq!(
            TrainingClass::derive(45, SmokingStatus::Former, false),
            TrainingClass::Recovery
        );
        assert_eq!(
            TrainingClass::derive(65, SmokingStatus::Never, false),
            TrainingClass::Recovery
        );
        assert_eq!(
            TrainingClass::derive(66, SmokingStatus::Former, false),
            TrainingClass::Maintenance
        );
        assert_eq!(
            TrainingClass::derive(42, SmokingStatus::Never, false),
            TrainingClass::Prevention
        );
    }

    #[test]
    fn validate_derives_class_and_trims_perfume() {
        let profile = draft(42, SmokingStatus::Former, false)
            .validate(fixed_now())
            .unwrap();
        assert_eq!(profile.training_class(), TrainingClass::Maintenance);
        assert_eq!(profile.preferred_perfume(), Some("lancome-lavie"));
        assert_eq!(profile.created_at(), fixed_now());
    }

    #[test]
    fn zero_age_is_rejected() {
        let err = draft(0, SmokingStatus::Never, false)
            .validate(fixed_now())
            .unwrap_err();
        assert_eq!(err, ProfileError::InvalidAge(0));
    }

    #[test]
    fn enum_strings_roundtrip() {
        for gender in [
            Gender::Male,
            Gender::Female,
            Gender::NonBinary,
            Gender::PreferNotToSay,
        ] {
            assert_eq!(gender.as_str().parse::<Gender>().unwrap(), gender);
        }
        assert!("sometimes".parse::<SmokingStatus>().is_err());
        assert_eq!(
            "recovery".parse::<TrainingClass>().unwrap(),
            TrainingClass::Recovery
        );
    }
}
