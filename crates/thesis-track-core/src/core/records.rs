// crates/thesis-track-core/src/core/records.rs
// ============================================================================
// Module: Thesis Track Records
// Description: Persisted entity records for the thesis workflow.
// Purpose: Typed request, capacity, and archive records with closed statuses.
// Dependencies: crate::core::{calendar, grading, identifiers}, serde, time
// ============================================================================

//! ## Overview
//! Every entity family the system persists is an explicit tagged record with
//! a closed status enumeration; unknown statuses fail deserialization at the
//! storage boundary instead of propagating. Fields that do not exist before a
//! transition (approval dates, judges, grades) are `Option` and absent on the
//! wire, so invariants can be checked by presence rather than by sentinel
//! comparison.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use time::Date;

use crate::core::grading::Grade;
use crate::core::grading::LetterGrade;
use crate::core::identifiers::CourseId;
use crate::core::identifiers::ExternalJudgeId;
use crate::core::identifiers::ProfessorId;
use crate::core::identifiers::StudentId;

// ============================================================================
// SECTION: Enrollment Requests
// ============================================================================

/// Lifecycle status of an enrollment request.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Awaiting the advisor's decision.
    Pending,
    /// Approved by the advisor; starts the defense cooldown.
    Approved,
    /// Rejected by the advisor; the reserved course slot is released.
    Rejected,
}

/// A student's request to enroll into a supervised thesis course slot.
///
/// # Invariants
/// - At most one request per student has status other than `Rejected`.
/// - `approved_date` is set iff status is `Approved`; `rejected_date` iff
///   `Rejected`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrollmentRequest {
    /// Requesting student.
    pub student_id: StudentId,
    /// Thesis course being requested.
    pub course_id: CourseId,
    /// Advisor owning the course.
    pub professor_id: ProfessorId,
    /// Current lifecycle status.
    pub status: EnrollmentStatus,
    /// Date the request was created.
    pub created_at: Date,
    /// Date of approval, when approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<Date>,
    /// Date of rejection, when rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_date: Option<Date>,
}

// ============================================================================
// SECTION: Defense Requests
// ============================================================================

/// Lifecycle status of a defense request.
///
/// # Invariants
/// - Variants are stable for serialization and contract matching.
/// - `Rejected` and `Closed` are terminal; `Closed` is reached only through
///   the grade-completion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefenseStatus {
    /// Awaiting the advisor's decision.
    PendingApproval,
    /// Approved; judges assigned and grading open from the defense date.
    Approved,
    /// Rejected by the advisor.
    Rejected,
    /// Both grades recorded, final grade archived.
    Closed,
}

/// A student's request to defend their thesis.
///
/// # Invariants
/// - At most one request per student has status other than `Rejected`.
/// - `internal_judge_id != professor_id`.
/// - `final_grade` and `final_letter_grade` are set iff both judge grades are
///   set, and only on `Closed` records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefenseRequest {
    /// Defending student.
    pub student_id: StudentId,
    /// Course slot the enrollment reserved; credited back on close.
    pub course_id: CourseId,
    /// Advisor supervising the thesis.
    pub professor_id: ProfessorId,
    /// Thesis title.
    pub title: String,
    /// Thesis abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Thesis keywords.
    pub keywords: Vec<String>,
    /// Relative paths of stored artifacts (thesis PDF, page images).
    pub artifact_paths: Vec<String>,
    /// Current lifecycle status.
    pub status: DefenseStatus,
    /// Date the request was submitted.
    pub submission_date: Date,
    /// Date of approval, when approved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_date: Option<Date>,
    /// Date of rejection, when rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_date: Option<Date>,
    /// Scheduled defense session date, set at approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defense_date: Option<Date>,
    /// Assigned internal judge, set at approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_judge_id: Option<ProfessorId>,
    /// Assigned external judge, set at approval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_judge_id: Option<ExternalJudgeId>,
    /// Internal judge's grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_grade: Option<Grade>,
    /// Date the internal grade was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_grade_date: Option<Date>,
    /// External judge's grade.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_grade: Option<Grade>,
    /// Date the external grade was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_grade_date: Option<Date>,
    /// Final grade (mean of both judge grades), set at close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_grade: Option<Grade>,
    /// Letter band of the final grade, set at close.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_letter_grade: Option<LetterGrade>,
}

impl DefenseRequest {
    /// Returns whether both judge grades have been recorded.
    #[must_use]
    pub const fn both_grades_present(&self) -> bool {
        self.internal_grade.is_some() && self.external_grade.is_some()
    }
}

// ============================================================================
// SECTION: Capacity Records
// ============================================================================

/// A supervised thesis course slot with remaining enrollment capacity.
///
/// # Invariants
/// - `capacity` is non-negative by construction and never driven below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSlot {
    /// Course identifier.
    pub course_id: CourseId,
    /// Professor owning the course.
    pub professor_id: ProfessorId,
    /// Remaining reservable enrollment units.
    pub capacity: u32,
}

/// Grading capacity of a professor acting as internal judge.
///
/// # Invariants
/// - `capacity` is non-negative by construction and never driven below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalJudgeCapacity {
    /// Professor identifier.
    pub professor_id: ProfessorId,
    /// Remaining reservable grading units.
    pub capacity: u32,
}

/// Grading capacity of an external judge.
///
/// # Invariants
/// - `capacity` is non-negative by construction and never driven below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalJudgeCapacity {
    /// External judge identifier.
    pub judge_id: ExternalJudgeId,
    /// Remaining reservable grading units.
    pub capacity: u32,
}

// ============================================================================
// SECTION: Archive
// ============================================================================

/// Immutable snapshot of a closed defense, appended to the archive exactly
/// once.
///
/// Every field a closed defense is guaranteed to carry is required here, so
/// archive consumers never re-check presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchivedThesis {
    /// Defending student.
    pub student_id: StudentId,
    /// Course slot credited back when the defense closed.
    pub course_id: CourseId,
    /// Advisor supervising the thesis.
    pub professor_id: ProfessorId,
    /// Thesis title.
    pub title: String,
    /// Thesis abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    /// Thesis keywords.
    pub keywords: Vec<String>,
    /// Relative paths of stored artifacts.
    pub artifact_paths: Vec<String>,
    /// Date the defense request was submitted.
    pub submission_date: Date,
    /// Date the defense request was approved.
    pub approved_date: Date,
    /// Defense session date.
    pub defense_date: Date,
    /// Internal judge.
    pub internal_judge_id: ProfessorId,
    /// External judge.
    pub external_judge_id: ExternalJudgeId,
    /// Internal judge's grade.
    pub internal_grade: Grade,
    /// Date the internal grade was recorded.
    pub internal_grade_date: Date,
    /// External judge's grade.
    pub external_grade: Grade,
    /// Date the external grade was recorded.
    pub external_grade_date: Date,
    /// Final grade (mean of both judge grades).
    pub final_grade: Grade,
    /// Letter band of the final grade.
    pub final_letter_grade: LetterGrade,
}
