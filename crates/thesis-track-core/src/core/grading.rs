// crates/thesis-track-core/src/core/grading.rs
// ============================================================================
// Module: Thesis Track Grading Aggregation
// Description: Validated grades, letter classification, and dual-grader aggregation.
// Purpose: Combine two independent judge grades into one final outcome.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Grades live on a 0-20 scale and are validated at every boundary, including
//! deserialization from storage. Aggregation is pure and side-effect-free: the
//! final grade is the arithmetic mean of the internal and external grades, and
//! the letter classification applies the same four bands to single grades and
//! to the final grade. No weighting scheme is supported.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Grade Value
// ============================================================================

/// Maximum grade on the grading scale.
pub const GRADE_SCALE_MAX: f64 = 20.0;

/// Grade validation errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GradeError {
    /// Grade is outside the 0-20 scale.
    #[error("grade out of range: {0} (expected 0 to 20)")]
    OutOfRange(f64),
    /// Grade is NaN or infinite.
    #[error("grade is not a finite number")]
    NotFinite,
}

/// A validated grade on the 0-20 scale.
///
/// # Invariants
/// - The inner value is finite and within `0.0..=20.0`; deserialization
///   rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Grade(f64);

impl Grade {
    /// Creates a validated grade.
    ///
    /// # Errors
    ///
    /// Returns [`GradeError`] when the value is not finite or outside 0-20.
    pub fn new(value: f64) -> Result<Self, GradeError> {
        if !value.is_finite() {
            return Err(GradeError::NotFinite);
        }
        if !(0.0 ..= GRADE_SCALE_MAX).contains(&value) {
            return Err(GradeError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Returns the numeric grade value.
    #[must_use]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Returns the letter classification for this grade.
    #[must_use]
    pub fn letter(self) -> LetterGrade {
        LetterGrade::for_grade(self)
    }
}

impl TryFrom<f64> for Grade {
    type Error = GradeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Grade> for f64 {
    fn from(grade: Grade) -> Self {
        grade.0
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ============================================================================
// SECTION: Letter Classification
// ============================================================================

/// Letter classification bands for the 0-20 grading scale.
///
/// # Invariants
/// - Variants are stable for serialization and archive records.
/// - Bands: `g >= 17 -> A`, `g >= 14 -> B`, `g >= 10 -> C`, else `D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LetterGrade {
    /// 17 and above.
    A,
    /// 14 up to (excluding) 17.
    B,
    /// 10 up to (excluding) 14.
    C,
    /// Below 10.
    D,
}

impl LetterGrade {
    /// Maps a grade onto its letter band.
    #[must_use]
    pub fn for_grade(grade: Grade) -> Self {
        let value = grade.value();
        if value >= 17.0 {
            Self::A
        } else if value >= 14.0 {
            Self::B
        } else if value >= 10.0 {
            Self::C
        } else {
            Self::D
        }
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Grading Roles
// ============================================================================

/// Role a judge holds when grading a defense.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradingRole {
    /// Internal judge (a professor other than the advisor).
    Internal,
    /// External judge (drawn from the external capacity pool).
    External,
}

impl fmt::Display for GradingRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Internal => "internal",
            Self::External => "external",
        };
        f.write_str(label)
    }
}

// ============================================================================
// SECTION: Final Grade Aggregation
// ============================================================================

/// Aggregated final outcome of a defense.
///
/// # Invariants
/// - `letter` is the band of `grade`; both derive from the same mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FinalGrade {
    /// Arithmetic mean of the internal and external grades.
    pub grade: Grade,
    /// Letter band of the mean.
    pub letter: LetterGrade,
}

/// Combines the internal and external grades into the final outcome.
///
/// The mean of two values in `0..=20` stays in range, so the result is always
/// a valid [`Grade`].
#[must_use]
pub fn aggregate(internal: Grade, external: Grade) -> FinalGrade {
    let mean = f64::midpoint(internal.value(), external.value());
    let grade = Grade::new(mean).unwrap_or(internal);
    FinalGrade {
        grade,
        letter: grade.letter(),
    }
}
