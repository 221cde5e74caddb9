//! Synthetic drug200-like data for tests.
//!
//! Labels follow a fixed rule aligned with the bucket edges so a forest can
//! learn them:
//! - Na_to_K > 19 → `DrugY`
//! - BP HIGH, age ≤ 49 → `drugA`
//! - BP HIGH, age ≥ 50 → `drugB`
//! - BP LOW, cholesterol HIGH → `drugC`
//! - otherwise → `drugX`

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::LabeledRecord;
use crate::logic::features::{BloodPressure, Category, Cholesterol, PatientRecord, Sex};

/// Label produced by the generating rule
pub fn rule_label(record: &PatientRecord) -> &'static str {
    if record.na_to_k() > 19.0 {
        return "DrugY";
    }
    match (record.blood_pressure(), record.cholesterol()) {
        (BloodPressure::High, _) if record.age() <= 49 => "drugA",
        (BloodPressure::High, _) => "drugB",
        (BloodPressure::Low, Cholesterol::High) => "drugC",
        _ => "drugX",
    }
}

/// Generate `n` labelled rows with a fixed seed
pub fn generate(n: usize, seed: u64) -> Vec<LabeledRecord> {
    let mut rng = StdRng::seed_from_u64(seed);

    (0..n)
        .map(|_| {
            let age = rng.gen_range(15..=74);
            let sex = Sex::ALL[rng.gen_range(0..Sex::ALL.len())];
            let bp = BloodPressure::ALL[rng.gen_range(0..BloodPressure::ALL.len())];
            let chol = Cholesterol::ALL[rng.gen_range(0..Cholesterol::ALL.len())];
            let ratio = rng.gen_range(6.0..38.0);

            let record = PatientRecord::new(age, sex, bp, chol, ratio)
                .expect("generated values are in domain");
            LabeledRecord {
                label: rule_label(&record).to_string(),
                record,
            }
        })
        .collect()
}

/// Render rows in the drug200 CSV layout
pub fn to_csv(rows: &[LabeledRecord]) -> String {
    let mut out = String::from("Age,Sex,BP,Cholesterol,Na_to_K,Drug\n");
    for row in rows {
        let r = &row.record;
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            r.age(),
            r.sex(),
            r.blood_pressure(),
            r.cholesterol(),
            r.na_to_k(),
            row.label
        ));
    }
    out
}
