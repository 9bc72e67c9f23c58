//! Percentages and letter grades for marked work.

use serde::Serialize;
use std::fmt;

/// `obtained / total * 100`, or `None` when the total is not positive.
pub fn percentage(obtained: f64, total: f64) -> Option<f64> {
    if total > 0.0 {
        Some(obtained / total * 100.0)
    } else {
        None
    }
}

/// Twelve-point letter scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LetterGrade {
    A,
    AMinus,
    BPlus,
    B,
    BMinus,
    CPlus,
    C,
    CMinus,
    DPlus,
    D,
    E,
}

impl LetterGrade {
    pub fn from_percentage(pct: f64) -> Self {
        // lower bounds, highest first
        const BANDS: [(f64, LetterGrade); 10] = [
            (80.0, LetterGrade::A),
            (75.0, LetterGrade::AMinus),
            (70.0, LetterGrade::BPlus),
            (65.0, LetterGrade::B),
            (60.0, LetterGrade::BMinus),
            (55.0, LetterGrade::CPlus),
            (50.0, LetterGrade::C),
            (45.0, LetterGrade::CMinus),
            (40.0, LetterGrade::DPlus),
            (35.0, LetterGrade::D),
        ];
        BANDS
            .iter()
            .find(|(floor, _)| pct >= *floor)
            .map(|(_, g)| *g)
            .unwrap_or(LetterGrade::E)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LetterGrade::A => "A",
            LetterGrade::AMinus => "A-",
            LetterGrade::BPlus => "B+",
            LetterGrade::B => "B",
            LetterGrade::BMinus => "B-",
            LetterGrade::CPlus => "C+",
            LetterGrade::C => "C",
            LetterGrade::CMinus => "C-",
            LetterGrade::DPlus => "D+",
            LetterGrade::D => "D",
            LetterGrade::E => "E",
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
