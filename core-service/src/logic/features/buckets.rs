//! Bucket edges for the two continuous fields.
//!
//! Edges are upper-inclusive; the lowest bucket also takes its lower edge
//! and the highest bucket is open-ended.
//!
//! | Age        | bucket |   | Na_to_K      | bucket  |
//! |------------|--------|---|--------------|---------|
//! | 0..=19     | `<20s` |   | (0, 9]       | `<10`   |
//! | 20..=29    | `20s`  |   | (9, 19]      | `10-20` |
//! | 30..=39    | `30s`  |   | (19, 29]     | `20-30` |
//! | 40..=49    | `40s`  |   | (29, ∞)      | `>30`   |
//! | 50..=59    | `50s`  |   |              |         |
//! | 60..=69    | `60s`  |   |              |         |
//! | 70..       | `>60s` |   |              |         |

use serde::{Deserialize, Serialize};

use super::record::Category;

/// Upper-inclusive age edges; anything above the last edge is `>60s`
pub const AGE_EDGES: [u32; 6] = [19, 29, 39, 49, 59, 69];

/// Upper-inclusive Na/K edges; anything above the last edge is `>30`
pub const NA_TO_K_EDGES: [f64; 3] = [9.0, 19.0, 29.0];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgeBucket {
    Under20,
    Twenties,
    Thirties,
    Forties,
    Fifties,
    Sixties,
    Over60,
}

impl AgeBucket {
    pub fn of(age: u32) -> Self {
        let idx = AGE_EDGES
            .iter()
            .position(|&edge| age <= edge)
            .unwrap_or(AGE_EDGES.len());
        Self::ALL[idx]
    }
}

impl Category for AgeBucket {
    const GROUP: &'static str = "Age_binned";
    const ALL: &'static [Self] = &[
        AgeBucket::Under20,
        AgeBucket::Twenties,
        AgeBucket::Thirties,
        AgeBucket::Forties,
        AgeBucket::Fifties,
        AgeBucket::Sixties,
        AgeBucket::Over60,
    ];

    fn label(&self) -> &'static str {
        match self {
            AgeBucket::Under20 => "<20s",
            AgeBucket::Twenties => "20s",
            AgeBucket::Thirties => "30s",
            AgeBucket::Forties => "40s",
            AgeBucket::Fifties => "50s",
            AgeBucket::Sixties => "60s",
            AgeBucket::Over60 => ">60s",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NaToKBucket {
    Under10,
    From10To20,
    From20To30,
    Over30,
}

impl NaToKBucket {
    pub fn of(ratio: f64) -> Self {
        let idx = NA_TO_K_EDGES
            .iter()
            .position(|&edge| ratio <= edge)
            .unwrap_or(NA_TO_K_EDGES.len());
        Self::ALL[idx]
    }
}

impl Category for NaToKBucket {
    const GROUP: &'static str = "Na_to_K_binned";
    const ALL: &'static [Self] = &[
        NaToKBucket::Under10,
        NaToKBucket::From10To20,
        NaToKBucket::From20To30,
        NaToKBucket::Over30,
    ];

    fn label(&self) -> &'static str {
        match self {
            NaToKBucket::Under10 => "<10",
            NaToKBucket::From10To20 => "10-20",
            NaToKBucket::From20To30 => "20-30",
            NaToKBucket::Over30 => ">30",
        }
    }
}
