//! Patient Record - validated model input
//!
//! `RawPatient` is what arrives over the wire or out of a CSV row.
//! `PatientRecord` can only be obtained through validation, so every
//! record that reaches the encoder is already inside its domain.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Oldest accepted age
pub const MAX_AGE: i64 = 120;

// ============================================================================
// CATEGORIES
// ============================================================================

/// A closed set of labelled values belonging to one one-hot group
pub trait Category: Copy + Sized + 'static {
    /// Column prefix of the one-hot group (`Sex`, `BP`, ...)
    const GROUP: &'static str;

    /// Every value of the category, in canonical order
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;
}

/// Case-insensitive lookup of a category by its label
pub fn parse_category<C: Category>(raw: &str) -> CoreResult<C> {
    let wanted = raw.trim();
    C::ALL
        .iter()
        .copied()
        .find(|c| c.label().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| {
            let allowed: Vec<&str> = C::ALL.iter().map(|c| c.label()).collect();
            CoreError::Validation(format!(
                "{} must be one of {:?}, got {:?}",
                C::GROUP,
                allowed,
                raw
            ))
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sex {
    F,
    M,
}

impl Category for Sex {
    const GROUP: &'static str = "Sex";
    const ALL: &'static [Self] = &[Sex::F, Sex::M];

    fn label(&self) -> &'static str {
        match self {
            Sex::F => "F",
            Sex::M => "M",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BloodPressure {
    High,
    Normal,
    Low,
}

impl Category for BloodPressure {
    const GROUP: &'static str = "BP";
    const ALL: &'static [Self] = &[BloodPressure::High, BloodPressure::Normal, BloodPressure::Low];

    fn label(&self) -> &'static str {
        match self {
            BloodPressure::High => "HIGH",
            BloodPressure::Normal => "NORMAL",
            BloodPressure::Low => "LOW",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Cholesterol {
    High,
    Normal,
}

impl Category for Cholesterol {
    const GROUP: &'static str = "Cholesterol";
    const ALL: &'static [Self] = &[Cholesterol::High, Cholesterol::Normal];

    fn label(&self) -> &'static str {
        match self {
            Cholesterol::High => "HIGH",
            Cholesterol::Normal => "NORMAL",
        }
    }
}

macro_rules! impl_from_str {
    ($($ty:ty),*) => {
        $(
            impl FromStr for $ty {
                type Err = CoreError;

                fn from_str(s: &str) -> Result<Self, Self::Err> {
                    parse_category(s)
                }
            }

            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )*
    };
}

impl_from_str!(Sex, BloodPressure, Cholesterol);

// ============================================================================
// RAW INPUT (boundary)
// ============================================================================

/// Unvalidated patient data as received from a request or a CSV row.
///
/// Field names follow the drug200 dataset header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPatient {
    #[serde(rename = "Age")]
    pub age: i64,
    #[serde(rename = "Sex")]
    pub sex: String,
    #[serde(rename = "BP")]
    pub bp: String,
    #[serde(rename = "Cholesterol")]
    pub cholesterol: String,
    #[serde(rename = "Na_to_K")]
    pub na_to_k: f64,
}

impl RawPatient {
    /// Check every field against its domain
    pub fn validate(&self) -> CoreResult<PatientRecord> {
        if self.age < 0 {
            return Err(CoreError::Validation(format!(
                "Age must be non-negative, got {}",
                self.age
            )));
        }
        if self.age > MAX_AGE {
            return Err(CoreError::Validation(format!(
                "Age must be at most {}, got {}",
                MAX_AGE, self.age
            )));
        }

        PatientRecord::new(
            self.age as u32,
            parse_category(&self.sex)?,
            parse_category(&self.bp)?,
            parse_category(&self.cholesterol)?,
            self.na_to_k,
        )
    }
}

// ============================================================================
// VALIDATED RECORD
// ============================================================================

/// One validated observation. Immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PatientRecord {
    age: u32,
    sex: Sex,
    blood_pressure: BloodPressure,
    cholesterol: Cholesterol,
    na_to_k: f64,
}

impl PatientRecord {
    pub fn new(
        age: u32,
        sex: Sex,
        blood_pressure: BloodPressure,
        cholesterol: Cholesterol,
        na_to_k: f64,
    ) -> CoreResult<Self> {
        if i64::from(age) > MAX_AGE {
            return Err(CoreError::Validation(format!(
                "Age must be at most {}, got {}",
                MAX_AGE, age
            )));
        }
        if !na_to_k.is_finite() || na_to_k <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Na_to_K must be a positive number, got {}",
                na_to_k
            )));
        }

        Ok(Self {
            age,
            sex,
            blood_pressure,
            cholesterol,
            na_to_k,
        })
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn sex(&self) -> Sex {
        self.sex
    }

    pub fn blood_pressure(&self) -> BloodPressure {
        self.blood_pressure
    }

    pub fn cholesterol(&self) -> Cholesterol {
        self.cholesterol
    }

    pub fn na_to_k(&self) -> f64 {
        self.na_to_k
    }

    /// Back to the wire representation
    pub fn to_raw(&self) -> RawPatient {
        RawPatient {
            age: i64::from(self.age),
            sex: self.sex.label().to_string(),
            bp: self.blood_pressure.label().to_string(),
            cholesterol: self.cholesterol.label().to_string(),
            na_to_k: self.na_to_k,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(age: i64, sex: &str, bp: &str, chol: &str, ratio: f64) -> RawPatient {
        RawPatient {
            age,
            sex: sex.to_string(),
            bp: bp.to_string(),
            cholesterol: chol.to_string(),
            na_to_k: ratio,
        }
    }

    #[test]
    fn test_valid_record() {
        let record = raw(45, "M", "HIGH", "NORMAL", 15.5).validate().unwrap();
        assert_eq!(record.age(), 45);
        assert_eq!(record.sex(), Sex::M);
        assert_eq!(record.blood_pressure(), BloodPressure::High);
        assert_eq!(record.cholesterol(), Cholesterol::Normal);
        assert_eq!(record.na_to_k(), 15.5);
    }

    #[test]
    fn test_categories_are_case_insensitive() {
        let record = raw(30, " f ", "low", "High", 9.0).validate().unwrap();
        assert_eq!(record.sex(), Sex::F);
        assert_eq!(record.blood_pressure(), BloodPressure::Low);
        assert_eq!(record.cholesterol(), Cholesterol::High);
    }

    #[test]
    fn test_negative_age_rejected() {
        let err = raw(-5, "M", "HIGH", "NORMAL", 15.5).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_age_upper_bound() {
        assert!(raw(120, "M", "HIGH", "NORMAL", 15.5).validate().is_ok());
        let err = raw(121, "M", "HIGH", "NORMAL", 15.5).validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_ratio_must_be_positive_and_finite() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = raw(40, "F", "NORMAL", "HIGH", bad).validate().unwrap_err();
            assert!(matches!(err, CoreError::Validation(_)), "ratio {} accepted", bad);
        }
    }

    #[test]
    fn test_unknown_category_text_rejected() {
        let err = raw(40, "X", "NORMAL", "HIGH", 10.0).validate().unwrap_err();
        assert!(err.to_string().contains("Sex"));

        let err = raw(40, "F", "VERY_HIGH", "HIGH", 10.0).validate().unwrap_err();
        assert!(err.to_string().contains("BP"));
    }

    #[test]
    fn test_raw_json_field_names() {
        let json = r#"{"Age": 23, "Sex": "F", "BP": "HIGH", "Cholesterol": "HIGH", "Na_to_K": 25.355}"#;
        let parsed: RawPatient = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.age, 23);
        assert_eq!(parsed.validate().unwrap().to_raw(), parsed);
    }
}
