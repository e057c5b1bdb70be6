// crates/thesis-track-core/src/core/mod.rs
// ============================================================================
// Module: Thesis Track Core Types
// Description: Identifiers, records, calendar arithmetic, and grading.
// Purpose: Canonical data model shared by the ledger, pool, and controller.
// Dependencies: serde, thiserror, time
// ============================================================================

//! ## Overview
//! The core module holds the pure data model: strongly typed identifiers,
//! persisted records with closed status enumerations, calendar-month
//! arithmetic for the defense cooldown, and the dual-grader aggregation
//! rules. Nothing in this module performs I/O.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod calendar;
pub mod grading;
pub mod identifiers;
pub mod records;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use calendar::CooldownStatus;
pub use calendar::DEFENSE_COOLDOWN_MONTHS;
pub use calendar::RemainingWait;
pub use calendar::add_months;
pub use calendar::defense_cooldown;
pub use calendar::months_days_between;
pub use grading::FinalGrade;
pub use grading::GRADE_SCALE_MAX;
pub use grading::Grade;
pub use grading::GradeError;
pub use grading::GradingRole;
pub use grading::LetterGrade;
pub use grading::aggregate;
pub use identifiers::CourseId;
pub use identifiers::ExternalJudgeId;
pub use identifiers::ProfessorId;
pub use identifiers::StudentId;
pub use records::ArchivedThesis;
pub use records::CourseSlot;
pub use records::DefenseRequest;
pub use records::DefenseStatus;
pub use records::EnrollmentRequest;
pub use records::EnrollmentStatus;
pub use records::ExternalJudgeCapacity;
pub use records::InternalJudgeCapacity;
