// crates/thesis-track-core/src/runtime/ledger.rs
// ============================================================================
// Module: Thesis Track Request Ledger
// Description: Authoritative enrollment, defense, and archive records.
// Purpose: Enforce per-student uniqueness and status transition invariants.
// Dependencies: crate::core, thiserror, time
// ============================================================================

//! ## Overview
//! The request ledger owns the authoritative workflow records and is the only
//! place transitions are applied. Each operation validates before mutating:
//! at most one non-rejected enrollment and one non-rejected defense exist per
//! student, defenses become eligible only after the enrollment cooldown, and
//! a defense closes exactly once, appending exactly one archive snapshot.
//!
//! Capacity accounting is deliberately *not* here; the controller pairs each
//! ledger transition with the matching capacity pool movement inside one
//! staged transaction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use time::Date;

use crate::core::ArchivedThesis;
use crate::core::CooldownStatus;
use crate::core::CourseId;
use crate::core::DefenseRequest;
use crate::core::DefenseStatus;
use crate::core::EnrollmentRequest;
use crate::core::EnrollmentStatus;
use crate::core::ExternalJudgeId;
use crate::core::Grade;
use crate::core::GradingRole;
use crate::core::ProfessorId;
use crate::core::RemainingWait;
use crate::core::StudentId;
use crate::core::defense_cooldown;
use crate::core::grading::aggregate;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Reasons a student is not yet eligible to request a defense.
///
/// # Invariants
/// - Variants are stable for programmatic handling and user guidance.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EligibilityError {
    /// The student has no enrollment request at all.
    #[error("no enrollment request on file")]
    NoEnrollment,
    /// The student's enrollment is not approved.
    #[error("enrollment is not approved (status: {0:?})")]
    EnrollmentNotApproved(EnrollmentStatus),
    /// The three-calendar-month cooldown has not elapsed.
    #[error("cooldown active: eligible on {eligible_on}, {remaining} left")]
    CooldownActive {
        /// Precise remaining wait.
        remaining: RemainingWait,
        /// First eligible date.
        eligible_on: Date,
    },
}

/// Request ledger errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The student already has a non-rejected enrollment request.
    #[error("student {0} already has an active enrollment request")]
    DuplicateActiveEnrollment(StudentId),
    /// The student already has a non-rejected defense request.
    #[error("student {0} already has an active defense request")]
    DuplicateActiveDefense(StudentId),
    /// No enrollment request exists for the student.
    #[error("no enrollment request for student {0}")]
    EnrollmentNotFound(StudentId),
    /// No defense request exists for the student.
    #[error("no defense request for student {0}")]
    DefenseNotFound(StudentId),
    /// The enrollment request is not in the status the transition requires.
    #[error("enrollment for student {student} is {status:?}, transition not allowed")]
    InvalidEnrollmentState {
        /// Student owning the request.
        student: StudentId,
        /// Status the request is actually in.
        status: EnrollmentStatus,
    },
    /// The defense request is not in the status the transition requires.
    #[error("defense for student {student} is {status:?}, transition not allowed")]
    InvalidDefenseState {
        /// Student owning the request.
        student: StudentId,
        /// Status the request is actually in.
        status: DefenseStatus,
    },
    /// The student is not eligible to request a defense.
    #[error("not eligible for defense: {0}")]
    NotEligible(#[from] EligibilityError),
    /// The advisor was selected as the internal judge of their own advisee.
    #[error("advisor {0} cannot be the internal judge of their own advisee")]
    AdvisorAsInternalJudge(ProfessorId),
    /// Grading was attempted before the scheduled defense session.
    #[error("defense session is scheduled for {scheduled}; grading opens then")]
    GradingBeforeDefense {
        /// Scheduled defense date.
        scheduled: Date,
    },
    /// A required field is empty.
    #[error("required field is empty: {0}")]
    EmptyField(&'static str),
    /// A field that must be present at this point of the lifecycle is absent.
    #[error("record is missing required field: {0}")]
    MissingField(&'static str),
}

// ============================================================================
// SECTION: Operation Outcomes
// ============================================================================

/// Judge panel and session date assigned when a defense is approved.
///
/// # Invariants
/// - `internal_judge_id` must differ from the advisor; checked on apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgePanel {
    /// Scheduled defense session date.
    pub defense_date: Date,
    /// Internal judge (a professor other than the advisor).
    pub internal_judge_id: ProfessorId,
    /// External judge.
    pub external_judge_id: ExternalJudgeId,
}

/// Outcome of recording one judge's grade.
///
/// # Invariants
/// - `first_for_role` is false when the grade overwrote a prior one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeOutcome {
    /// Whether this was the first grade recorded for the role.
    pub first_for_role: bool,
    /// Whether both judge grades are now present.
    pub both_present: bool,
}

// ============================================================================
// SECTION: Request Ledger
// ============================================================================

/// Staged authoritative records for one transaction.
///
/// # Invariants
/// - At most one enrollment and one defense per student has a non-rejected
///   status (checked on creation, preserved by transitions).
/// - The archive is append-only; entries are never mutated or removed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestLedger {
    /// Enrollment requests, in storage order.
    enrollments: Vec<EnrollmentRequest>,
    /// Defense requests, in storage order.
    defenses: Vec<DefenseRequest>,
    /// Archived theses, in append order.
    archive: Vec<ArchivedThesis>,
}

impl RequestLedger {
    /// Builds a ledger from loaded records.
    #[must_use]
    pub const fn new(
        enrollments: Vec<EnrollmentRequest>,
        defenses: Vec<DefenseRequest>,
        archive: Vec<ArchivedThesis>,
    ) -> Self {
        Self {
            enrollments,
            defenses,
            archive,
        }
    }

    // ------------------------------------------------------------------
    // Enrollment operations
    // ------------------------------------------------------------------

    /// Returns the student's non-rejected enrollment request, if any.
    #[must_use]
    pub fn active_enrollment(&self, student: &StudentId) -> Option<&EnrollmentRequest> {
        self.enrollments
            .iter()
            .find(|req| &req.student_id == student && req.status != EnrollmentStatus::Rejected)
    }

    /// Returns the student's most recent enrollment request, if any.
    #[must_use]
    pub fn latest_enrollment(&self, student: &StudentId) -> Option<&EnrollmentRequest> {
        self.enrollments.iter().rev().find(|req| &req.student_id == student)
    }

    /// Creates a pending enrollment request.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateActiveEnrollment`] when the student
    /// already has a non-rejected request.
    pub fn create_enrollment(
        &mut self,
        student: StudentId,
        course: CourseId,
        professor: ProfessorId,
        today: Date,
    ) -> Result<&EnrollmentRequest, LedgerError> {
        if self.active_enrollment(&student).is_some() {
            return Err(LedgerError::DuplicateActiveEnrollment(student));
        }
        self.enrollments.push(EnrollmentRequest {
            student_id: student,
            course_id: course,
            professor_id: professor,
            status: EnrollmentStatus::Pending,
            created_at: today,
            approved_date: None,
            rejected_date: None,
        });
        Ok(self.last_enrollment())
    }

    /// Approves the student's pending enrollment request.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EnrollmentNotFound`] when no request exists and
    /// [`LedgerError::InvalidEnrollmentState`] when it is not pending.
    pub fn approve_enrollment(
        &mut self,
        student: &StudentId,
        today: Date,
    ) -> Result<&EnrollmentRequest, LedgerError> {
        let request = self.pending_enrollment_mut(student)?;
        request.status = EnrollmentStatus::Approved;
        request.approved_date = Some(today);
        Ok(&*request)
    }

    /// Rejects the student's pending enrollment request and returns the
    /// course whose reserved slot must be released.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EnrollmentNotFound`] when no request exists and
    /// [`LedgerError::InvalidEnrollmentState`] when it is not pending.
    pub fn reject_enrollment(
        &mut self,
        student: &StudentId,
        today: Date,
    ) -> Result<CourseId, LedgerError> {
        let request = self.pending_enrollment_mut(student)?;
        request.status = EnrollmentStatus::Rejected;
        request.rejected_date = Some(today);
        Ok(request.course_id.clone())
    }

    // ------------------------------------------------------------------
    // Defense operations
    // ------------------------------------------------------------------

    /// Returns the student's non-rejected defense request, if any.
    #[must_use]
    pub fn active_defense(&self, student: &StudentId) -> Option<&DefenseRequest> {
        self.defenses
            .iter()
            .find(|req| &req.student_id == student && req.status != DefenseStatus::Rejected)
    }

    /// Returns the student's most recent defense request, if any.
    #[must_use]
    pub fn latest_defense(&self, student: &StudentId) -> Option<&DefenseRequest> {
        self.defenses.iter().rev().find(|req| &req.student_id == student)
    }

    /// Checks defense eligibility and returns the approved enrollment the
    /// defense will be tied to.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotEligible`] when the enrollment is missing,
    /// not approved, or inside the three-calendar-month cooldown.
    pub fn defense_eligibility(
        &self,
        student: &StudentId,
        today: Date,
    ) -> Result<&EnrollmentRequest, LedgerError> {
        let enrollment = self
            .active_enrollment(student)
            .ok_or(LedgerError::NotEligible(EligibilityError::NoEnrollment))?;
        if enrollment.status != EnrollmentStatus::Approved {
            return Err(EligibilityError::EnrollmentNotApproved(enrollment.status).into());
        }
        let approved_on =
            enrollment.approved_date.ok_or(LedgerError::MissingField("approved_date"))?;
        match defense_cooldown(approved_on, today) {
            CooldownStatus::Elapsed => Ok(enrollment),
            CooldownStatus::Waiting {
                remaining,
                eligible_on,
            } => Err(EligibilityError::CooldownActive {
                remaining,
                eligible_on,
            }
            .into()),
        }
    }

    /// Creates a pending-approval defense request.
    ///
    /// The course and advisor are taken from the student's approved
    /// enrollment, so the slot credited on close is the one the enrollment
    /// reserved.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateActiveDefense`] when the student
    /// already has a non-rejected defense, [`LedgerError::NotEligible`] when
    /// the cooldown has not elapsed, and [`LedgerError::EmptyField`] when the
    /// title or abstract is blank.
    pub fn create_defense(
        &mut self,
        student: StudentId,
        title: String,
        abstract_text: String,
        keywords: Vec<String>,
        artifact_paths: Vec<String>,
        today: Date,
    ) -> Result<&DefenseRequest, LedgerError> {
        if self.active_defense(&student).is_some() {
            return Err(LedgerError::DuplicateActiveDefense(student));
        }
        if title.trim().is_empty() {
            return Err(LedgerError::EmptyField("title"));
        }
        if abstract_text.trim().is_empty() {
            return Err(LedgerError::EmptyField("abstract"));
        }
        let enrollment = self.defense_eligibility(&student, today)?;
        let course_id = enrollment.course_id.clone();
        let professor_id = enrollment.professor_id.clone();
        self.defenses.push(DefenseRequest {
            student_id: student,
            course_id,
            professor_id,
            title,
            abstract_text,
            keywords,
            artifact_paths,
            status: DefenseStatus::PendingApproval,
            submission_date: today,
            approved_date: None,
            rejected_date: None,
            defense_date: None,
            internal_judge_id: None,
            external_judge_id: None,
            internal_grade: None,
            internal_grade_date: None,
            external_grade: None,
            external_grade_date: None,
            final_grade: None,
            final_letter_grade: None,
        });
        Ok(self.last_defense())
    }

    /// Approves the student's pending defense request, assigning the judge
    /// panel and session date.
    ///
    /// Capacity for both judges must already be reserved by the caller.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DefenseNotFound`] /
    /// [`LedgerError::InvalidDefenseState`] when no pending request exists
    /// and [`LedgerError::AdvisorAsInternalJudge`] when the panel names the
    /// advisor as internal judge.
    pub fn approve_defense(
        &mut self,
        student: &StudentId,
        panel: JudgePanel,
        today: Date,
    ) -> Result<&DefenseRequest, LedgerError> {
        let request = self.pending_defense_mut(student)?;
        if panel.internal_judge_id == request.professor_id {
            return Err(LedgerError::AdvisorAsInternalJudge(panel.internal_judge_id));
        }
        request.status = DefenseStatus::Approved;
        request.approved_date = Some(today);
        request.defense_date = Some(panel.defense_date);
        request.internal_judge_id = Some(panel.internal_judge_id);
        request.external_judge_id = Some(panel.external_judge_id);
        Ok(&*request)
    }

    /// Rejects the student's pending defense request.
    ///
    /// No capacity moves: judge units are only reserved at approval.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DefenseNotFound`] /
    /// [`LedgerError::InvalidDefenseState`] when no pending request exists.
    pub fn reject_defense(
        &mut self,
        student: &StudentId,
        today: Date,
    ) -> Result<&DefenseRequest, LedgerError> {
        let request = self.pending_defense_mut(student)?;
        request.status = DefenseStatus::Rejected;
        request.rejected_date = Some(today);
        Ok(&*request)
    }

    /// Records one judge's grade on the student's approved defense,
    /// overwriting any prior grade for that role.
    ///
    /// Grading opens on the scheduled defense date; earlier attempts are
    /// refused with the scheduled date for guidance.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DefenseNotFound`] when no defense exists,
    /// [`LedgerError::InvalidDefenseState`] when it is not approved, and
    /// [`LedgerError::GradingBeforeDefense`] when the session has not been
    /// held yet.
    pub fn submit_grade(
        &mut self,
        student: &StudentId,
        role: GradingRole,
        grade: Grade,
        today: Date,
    ) -> Result<GradeOutcome, LedgerError> {
        let request = self.defense_in_status_mut(student, DefenseStatus::Approved)?;
        let scheduled = request.defense_date.ok_or(LedgerError::MissingField("defense_date"))?;
        if today < scheduled {
            return Err(LedgerError::GradingBeforeDefense {
                scheduled,
            });
        }
        let first_for_role = match role {
            GradingRole::Internal => {
                let first = request.internal_grade.is_none();
                request.internal_grade = Some(grade);
                request.internal_grade_date = Some(today);
                first
            }
            GradingRole::External => {
                let first = request.external_grade.is_none();
                request.external_grade = Some(grade);
                request.external_grade_date = Some(today);
                first
            }
        };
        Ok(GradeOutcome {
            first_for_role,
            both_present: request.both_grades_present(),
        })
    }

    /// Closes the student's approved, fully graded defense: computes the
    /// final grade, marks the request `Closed`, and appends the archive
    /// snapshot.
    ///
    /// Returns the course whose slot must be credited back. Callable at most
    /// once per defense: the status moves to `Closed`, which this method
    /// refuses.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidDefenseState`] unless the request is
    /// `Approved`, and [`LedgerError::MissingField`] when either grade is
    /// absent.
    pub fn close_defense(&mut self, student: &StudentId) -> Result<CourseId, LedgerError> {
        let request = self.defense_in_status_mut(student, DefenseStatus::Approved)?;
        let internal = request.internal_grade.ok_or(LedgerError::MissingField("internal_grade"))?;
        let external = request.external_grade.ok_or(LedgerError::MissingField("external_grade"))?;
        let outcome = aggregate(internal, external);
        request.final_grade = Some(outcome.grade);
        request.final_letter_grade = Some(outcome.letter);
        request.status = DefenseStatus::Closed;
        let snapshot = ArchivedThesis {
            student_id: request.student_id.clone(),
            course_id: request.course_id.clone(),
            professor_id: request.professor_id.clone(),
            title: request.title.clone(),
            abstract_text: request.abstract_text.clone(),
            keywords: request.keywords.clone(),
            artifact_paths: request.artifact_paths.clone(),
            submission_date: request.submission_date,
            approved_date: request.approved_date.ok_or(LedgerError::MissingField("approved_date"))?,
            defense_date: request.defense_date.ok_or(LedgerError::MissingField("defense_date"))?,
            internal_judge_id: request
                .internal_judge_id
                .clone()
                .ok_or(LedgerError::MissingField("internal_judge_id"))?,
            external_judge_id: request
                .external_judge_id
                .clone()
                .ok_or(LedgerError::MissingField("external_judge_id"))?,
            internal_grade: internal,
            internal_grade_date: request
                .internal_grade_date
                .ok_or(LedgerError::MissingField("internal_grade_date"))?,
            external_grade: external,
            external_grade_date: request
                .external_grade_date
                .ok_or(LedgerError::MissingField("external_grade_date"))?,
            final_grade: outcome.grade,
            final_letter_grade: outcome.letter,
        };
        let course_id = request.course_id.clone();
        self.archive.push(snapshot);
        Ok(course_id)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Returns all enrollment requests, in storage order.
    #[must_use]
    pub fn enrollments(&self) -> &[EnrollmentRequest] {
        &self.enrollments
    }

    /// Returns all defense requests, in storage order.
    #[must_use]
    pub fn defenses(&self) -> &[DefenseRequest] {
        &self.defenses
    }

    /// Returns the archive, in append order.
    #[must_use]
    pub fn archive(&self) -> &[ArchivedThesis] {
        &self.archive
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Returns the most recently created enrollment request.
    fn last_enrollment(&self) -> &EnrollmentRequest {
        // Only called right after a push.
        #[allow(clippy::indexing_slicing, reason = "index is in bounds right after push")]
        &self.enrollments[self.enrollments.len() - 1]
    }

    /// Returns the most recently created defense request.
    fn last_defense(&self) -> &DefenseRequest {
        // Only called right after a push.
        #[allow(clippy::indexing_slicing, reason = "index is in bounds right after push")]
        &self.defenses[self.defenses.len() - 1]
    }

    /// Returns the student's pending enrollment request mutably.
    fn pending_enrollment_mut(
        &mut self,
        student: &StudentId,
    ) -> Result<&mut EnrollmentRequest, LedgerError> {
        let status = match self.active_enrollment(student) {
            None => return Err(LedgerError::EnrollmentNotFound(student.clone())),
            Some(req) => req.status,
        };
        if status != EnrollmentStatus::Pending {
            return Err(LedgerError::InvalidEnrollmentState {
                student: student.clone(),
                status,
            });
        }
        self.enrollments
            .iter_mut()
            .find(|req| &req.student_id == student && req.status == EnrollmentStatus::Pending)
            .ok_or_else(|| LedgerError::EnrollmentNotFound(student.clone()))
    }

    /// Returns the student's pending defense request mutably.
    fn pending_defense_mut(
        &mut self,
        student: &StudentId,
    ) -> Result<&mut DefenseRequest, LedgerError> {
        self.defense_in_status_mut(student, DefenseStatus::PendingApproval)
    }

    /// Returns the student's active defense mutably, requiring `expected`.
    fn defense_in_status_mut(
        &mut self,
        student: &StudentId,
        expected: DefenseStatus,
    ) -> Result<&mut DefenseRequest, LedgerError> {
        let status = match self.active_defense(student) {
            None => return Err(LedgerError::DefenseNotFound(student.clone())),
            Some(req) => req.status,
        };
        if status != expected {
            return Err(LedgerError::InvalidDefenseState {
                student: student.clone(),
                status,
            });
        }
        self.defenses
            .iter_mut()
            .find(|req| &req.student_id == student && req.status == expected)
            .ok_or_else(|| LedgerError::DefenseNotFound(student.clone()))
    }
}
