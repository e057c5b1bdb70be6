// crates/thesis-track-core/src/runtime/controller.rs
// ============================================================================
// Module: Thesis Track Lifecycle Controller
// Description: Atomic workflow commands over the ledger and capacity pool.
// Purpose: One command, one transaction; authorization and capacity pairing.
// Dependencies: crate::core, crate::interfaces, crate::runtime, thiserror, time
// ============================================================================

//! ## Overview
//! The lifecycle controller is the single entry point for workflow commands.
//! Each command authorizes the caller, stages a [`Transaction`] over storage,
//! applies the ledger transition together with its paired capacity movement,
//! and commits everything as one batch. A failure at any point, validation,
//! capacity, or persistence, abandons the staged state so observable storage
//! never reflects a partial command.
//!
//! Commands are serialized through an internal lock, which is what makes
//! check-then-reserve on the shared capacity counters race free. The core
//! never reads the wall clock; every command carries its operation date.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Mutex;

use thiserror::Error;
use time::Date;

use crate::core::ArchivedThesis;
use crate::core::CooldownStatus;
use crate::core::CourseId;
use crate::core::DefenseRequest;
use crate::core::EnrollmentRequest;
use crate::core::EnrollmentStatus;
use crate::core::ExternalJudgeId;
use crate::core::Grade;
use crate::core::GradeError;
use crate::core::GradingRole;
use crate::core::ProfessorId;
use crate::core::StudentId;
use crate::core::defense_cooldown;
use crate::interfaces::ArtifactError;
use crate::interfaces::ArtifactRepository;
use crate::interfaces::AuthError;
use crate::interfaces::AuthProvider;
use crate::interfaces::PersistenceError;
use crate::interfaces::Role;
use crate::interfaces::Storage;
use crate::runtime::capacity::CapacityError;
use crate::runtime::capacity::CapacityPool;
use crate::runtime::capacity::ResourceKey;
use crate::runtime::ledger::JudgePanel;
use crate::runtime::ledger::LedgerError;
use crate::runtime::ledger::RequestLedger;
use crate::runtime::staging::Transaction;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Lifecycle command errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Any error means the command had no observable effect on storage.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// An input value failed validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// A grade value was out of range or not finite.
    #[error(transparent)]
    Grade(#[from] GradeError),
    /// A ledger invariant refused the transition.
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    /// A referenced resource or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// No reservable capacity remains for the resource.
    #[error("capacity exhausted: {0}")]
    CapacityExhausted(String),
    /// The judge panel names the advisor or a judge without capacity.
    #[error("invalid judge selection: {0}")]
    InvalidJudgeSelection(String),
    /// The caller is not allowed to perform the command.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The auth provider failed.
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// The artifact repository refused or failed to store an artifact.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    /// Storage failed; the command was rolled back.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    /// The internal command lock was poisoned by a panicking thread.
    #[error("command lock poisoned")]
    LockPoisoned,
}

impl From<CapacityError> for CommandError {
    fn from(err: CapacityError) -> Self {
        match err {
            CapacityError::Exhausted(detail) => Self::CapacityExhausted(detail),
            CapacityError::UnknownResource(detail) => Self::NotFound(detail),
        }
    }
}

// ============================================================================
// SECTION: Command Inputs
// ============================================================================

/// Advisor's ruling on a pending enrollment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentDecision {
    /// Approve the enrollment; starts the defense cooldown.
    Approve,
    /// Reject the enrollment; the reserved course slot is released.
    Reject,
}

/// Advisor's ruling on a pending defense request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefenseDecision {
    /// Approve with a judge panel and session date; reserves one grading
    /// unit per judge.
    Approve(JudgePanel),
    /// Reject the defense request.
    Reject,
}

/// Identity of the judge submitting a grade.
///
/// # Invariants
/// - The variant fixes the grading role; the controller matches it against
///   the judge assigned on the defense request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraderRef {
    /// The assigned internal judge (a professor).
    Internal(ProfessorId),
    /// The assigned external judge.
    External(ExternalJudgeId),
}

impl GraderRef {
    /// Returns the grading role the reference fills.
    #[must_use]
    pub const fn role(&self) -> GradingRole {
        match self {
            Self::Internal(_) => GradingRole::Internal,
            Self::External(_) => GradingRole::External,
        }
    }
}

/// Input for [`LifecycleController::create_defense`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefenseSubmission {
    /// Requesting student.
    pub student_id: StudentId,
    /// Thesis title.
    pub title: String,
    /// Thesis abstract.
    pub abstract_text: String,
    /// Thesis keywords.
    pub keywords: Vec<String>,
    /// Source references of artifacts to store (thesis PDF, page images).
    pub artifact_refs: Vec<String>,
}

// ============================================================================
// SECTION: Command Outputs
// ============================================================================

/// Result of recording a judge's grade.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecorded {
    /// The defense request after the grade was applied.
    pub request: DefenseRequest,
    /// Whether this grade completed the panel and closed the defense.
    pub closed: bool,
}

/// Read-only snapshot of a student's workflow position.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestStatus {
    /// The student's most recent enrollment request, if any.
    pub enrollment: Option<EnrollmentRequest>,
    /// The student's most recent defense request, if any.
    pub defense: Option<DefenseRequest>,
    /// Cooldown position, present once the enrollment is approved.
    pub cooldown: Option<CooldownStatus>,
}

// ============================================================================
// SECTION: Lifecycle Controller
// ============================================================================

/// Coordinates the thesis workflow over pluggable collaborators.
///
/// # Invariants
/// - Commands run one at a time under the internal lock.
/// - Every capacity movement is paired with exactly one ledger transition
///   inside the same transaction.
#[derive(Debug)]
pub struct LifecycleController<S, A, R> {
    /// Storage backend.
    storage: S,
    /// Role lookup for caller authorization.
    auth: A,
    /// Artifact store for defense submissions.
    artifacts: R,
    /// Serializes commands so capacity checks cannot race.
    command_lock: Mutex<()>,
}

impl<S, A, R> LifecycleController<S, A, R>
where
    S: Storage,
    A: AuthProvider,
    R: ArtifactRepository,
{
    /// Creates a controller over the given collaborators.
    #[must_use]
    pub const fn new(storage: S, auth: A, artifacts: R) -> Self {
        Self {
            storage,
            auth,
            artifacts,
            command_lock: Mutex::new(()),
        }
    }

    // ------------------------------------------------------------------
    // Enrollment commands
    // ------------------------------------------------------------------

    /// Creates a pending enrollment request, reserving one course slot.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the caller is not a student, the course
    /// is unknown or not supervised by the named professor, the student
    /// already has an active request, no slot remains, or persistence fails.
    pub fn create_enrollment(
        &self,
        student_id: StudentId,
        course_id: CourseId,
        professor_id: ProfessorId,
        today: Date,
    ) -> Result<EnrollmentRequest, CommandError> {
        let _guard = self.lock()?;
        self.require_role(student_id.as_str(), Role::Student)?;
        let mut tx = Transaction::begin(&self.storage)?;
        if tx.ledger().active_enrollment(&student_id).is_some() {
            return Err(LedgerError::DuplicateActiveEnrollment(student_id).into());
        }
        let slot = tx
            .pool()
            .course_slot(&course_id)
            .ok_or_else(|| CommandError::NotFound(format!("course {course_id}")))?;
        if slot.professor_id != professor_id {
            return Err(CommandError::Validation(format!(
                "course {course_id} is not supervised by professor {professor_id}"
            )));
        }
        reserve(tx.pool_mut(), &ResourceKey::CourseSlot(course_id.clone()))?;
        let record = tx
            .ledger_mut()
            .create_enrollment(student_id, course_id, professor_id, today)?
            .clone();
        tx.commit()?;
        Ok(record)
    }

    /// Applies the advisor's decision to a pending enrollment request.
    ///
    /// Rejection releases the course slot the request had reserved.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the caller is not the advisor on the
    /// request, the request is missing or not pending, or persistence fails.
    pub fn decide_enrollment(
        &self,
        caller: ProfessorId,
        student_id: StudentId,
        decision: EnrollmentDecision,
        today: Date,
    ) -> Result<EnrollmentRequest, CommandError> {
        let _guard = self.lock()?;
        self.require_role(caller.as_str(), Role::Professor)?;
        let mut tx = Transaction::begin(&self.storage)?;
        let advisor = tx
            .ledger()
            .active_enrollment(&student_id)
            .ok_or_else(|| LedgerError::EnrollmentNotFound(student_id.clone()))?
            .professor_id
            .clone();
        if advisor != caller {
            return Err(CommandError::Unauthorized(format!(
                "enrollment for student {student_id} is advised by professor {advisor}"
            )));
        }
        let record = match decision {
            EnrollmentDecision::Approve => {
                tx.ledger_mut().approve_enrollment(&student_id, today)?.clone()
            }
            EnrollmentDecision::Reject => {
                let course_id = tx.ledger_mut().reject_enrollment(&student_id, today)?;
                release(tx.pool_mut(), &ResourceKey::CourseSlot(course_id))?;
                tx.ledger()
                    .latest_enrollment(&student_id)
                    .ok_or_else(|| LedgerError::EnrollmentNotFound(student_id.clone()))?
                    .clone()
            }
        };
        tx.commit()?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Defense commands
    // ------------------------------------------------------------------

    /// Creates a pending-approval defense request.
    ///
    /// Eligibility requires an approved enrollment whose three-calendar-month
    /// cooldown has elapsed. Artifacts are stored through the repository and
    /// only their returned paths are recorded.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the caller is not a student, the student
    /// is not eligible or already has an active defense, an artifact is
    /// rejected, or persistence fails.
    pub fn create_defense(
        &self,
        submission: DefenseSubmission,
        today: Date,
    ) -> Result<DefenseRequest, CommandError> {
        let _guard = self.lock()?;
        self.require_role(submission.student_id.as_str(), Role::Student)?;
        let mut tx = Transaction::begin(&self.storage)?;
        if tx.ledger().active_defense(&submission.student_id).is_some() {
            return Err(LedgerError::DuplicateActiveDefense(submission.student_id).into());
        }
        tx.ledger().defense_eligibility(&submission.student_id, today)?;
        let mut artifact_paths = Vec::with_capacity(submission.artifact_refs.len());
        for source_ref in &submission.artifact_refs {
            artifact_paths.push(self.artifacts.store(source_ref)?);
        }
        let record = tx
            .ledger_mut()
            .create_defense(
                submission.student_id,
                submission.title,
                submission.abstract_text,
                submission.keywords,
                artifact_paths,
                today,
            )?
            .clone();
        tx.commit()?;
        Ok(record)
    }

    /// Applies the advisor's decision to a pending defense request.
    ///
    /// Approval assigns the judge panel and session date, reserving one
    /// grading unit from each judge. Rejection moves no capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the caller is not the advisor on the
    /// request, the panel names the advisor as internal judge, a judge is
    /// unknown or has no capacity left, or persistence fails.
    pub fn decide_defense(
        &self,
        caller: ProfessorId,
        student_id: StudentId,
        decision: DefenseDecision,
        today: Date,
    ) -> Result<DefenseRequest, CommandError> {
        let _guard = self.lock()?;
        self.require_role(caller.as_str(), Role::Professor)?;
        let mut tx = Transaction::begin(&self.storage)?;
        let advisor = tx
            .ledger()
            .active_defense(&student_id)
            .ok_or_else(|| LedgerError::DefenseNotFound(student_id.clone()))?
            .professor_id
            .clone();
        if advisor != caller {
            return Err(CommandError::Unauthorized(format!(
                "defense for student {student_id} is advised by professor {advisor}"
            )));
        }
        let record = match decision {
            DefenseDecision::Approve(panel) => {
                if panel.internal_judge_id == advisor {
                    return Err(CommandError::InvalidJudgeSelection(format!(
                        "advisor {advisor} cannot judge their own advisee"
                    )));
                }
                reserve_judge(
                    tx.pool_mut(),
                    &ResourceKey::InternalJudge(panel.internal_judge_id.clone()),
                )?;
                reserve_judge(
                    tx.pool_mut(),
                    &ResourceKey::ExternalJudge(panel.external_judge_id.clone()),
                )?;
                tx.ledger_mut().approve_defense(&student_id, panel, today)?.clone()
            }
            DefenseDecision::Reject => {
                tx.ledger_mut().reject_defense(&student_id, today)?.clone()
            }
        };
        tx.commit()?;
        Ok(record)
    }

    // ------------------------------------------------------------------
    // Grading commands
    // ------------------------------------------------------------------

    /// Records a judge's grade on the student's approved defense.
    ///
    /// The judge's reserved grading unit is released the first time that
    /// role's grade is recorded; re-grading overwrites without releasing
    /// again. When both grades are present the defense closes in the same
    /// transaction: the final grade is computed, the course slot is credited
    /// back, and the archive snapshot is appended.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the grade is out of range, the caller is
    /// not the assigned judge for the role, the defense is not approved, the
    /// session date has not been reached, or persistence fails.
    pub fn submit_grade(
        &self,
        grader: GraderRef,
        student_id: StudentId,
        value: f64,
        today: Date,
    ) -> Result<GradeRecorded, CommandError> {
        let _guard = self.lock()?;
        let required_role = match &grader {
            GraderRef::Internal(_) => Role::Professor,
            GraderRef::External(_) => Role::ExternalJudge,
        };
        self.require_role(grader_user_id(&grader), required_role)?;
        let grade = Grade::new(value)?;
        let mut tx = Transaction::begin(&self.storage)?;
        let judge_resource = Self::assigned_judge_resource(tx.ledger(), &student_id, &grader)?;
        let outcome =
            tx.ledger_mut().submit_grade(&student_id, grader.role(), grade, today)?;
        if outcome.first_for_role {
            release(tx.pool_mut(), &judge_resource)?;
        }
        let closed = outcome.both_present;
        if closed {
            let course_id = tx.ledger_mut().close_defense(&student_id)?;
            release(tx.pool_mut(), &ResourceKey::CourseSlot(course_id))?;
        }
        let request = tx
            .ledger()
            .latest_defense(&student_id)
            .ok_or_else(|| LedgerError::DefenseNotFound(student_id.clone()))?
            .clone();
        tx.commit()?;
        Ok(GradeRecorded {
            request,
            closed,
        })
    }

    // ------------------------------------------------------------------
    // Read-only views
    // ------------------------------------------------------------------

    /// Reports the student's latest enrollment and defense state, with the
    /// cooldown position once the enrollment is approved.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Persistence`] when loading fails.
    pub fn request_status(
        &self,
        student_id: &StudentId,
        today: Date,
    ) -> Result<RequestStatus, CommandError> {
        let tx = Transaction::begin(&self.storage)?;
        let enrollment = tx.ledger().latest_enrollment(student_id).cloned();
        let defense = tx.ledger().latest_defense(student_id).cloned();
        let cooldown = enrollment.as_ref().and_then(|req| {
            if req.status == EnrollmentStatus::Approved {
                req.approved_date.map(|approved| defense_cooldown(approved, today))
            } else {
                None
            }
        });
        Ok(RequestStatus {
            enrollment,
            defense,
            cooldown,
        })
    }

    /// Lists archived theses, in append order.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Persistence`] when loading fails.
    pub fn archived_theses(&self) -> Result<Vec<ArchivedThesis>, CommandError> {
        let tx = Transaction::begin(&self.storage)?;
        Ok(tx.ledger().archive().to_vec())
    }

    /// Lists judge candidates for a student's pending defense: internal
    /// judges with capacity other than the advisor, and external judges with
    /// capacity.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError`] when the student has no active defense or
    /// loading fails.
    pub fn judge_candidates(
        &self,
        student_id: &StudentId,
    ) -> Result<(Vec<ProfessorId>, Vec<ExternalJudgeId>), CommandError> {
        let tx = Transaction::begin(&self.storage)?;
        let advisor = tx
            .ledger()
            .active_defense(student_id)
            .ok_or_else(|| LedgerError::DefenseNotFound(student_id.clone()))?
            .professor_id
            .clone();
        let internal = tx
            .pool()
            .internal_judge_candidates(&advisor)
            .into_iter()
            .map(|judge| judge.professor_id.clone())
            .collect();
        let external = tx
            .pool()
            .external_judge_candidates()
            .into_iter()
            .map(|judge| judge.judge_id.clone())
            .collect();
        Ok((internal, external))
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Acquires the command lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, CommandError> {
        self.command_lock.lock().map_err(|_| CommandError::LockPoisoned)
    }

    /// Requires the auth provider to report exactly `role` for the user.
    fn require_role(&self, user_id: &str, role: Role) -> Result<(), CommandError> {
        match self.auth.role_of(user_id)? {
            Some(actual) if actual == role => Ok(()),
            Some(actual) => Err(CommandError::Unauthorized(format!(
                "user {user_id} has role {actual}, command requires {role}"
            ))),
            None => Err(CommandError::Unauthorized(format!("unknown user: {user_id}"))),
        }
    }

    /// Resolves the grader against the judge assigned on the student's
    /// defense and returns the capacity resource that judge holds.
    fn assigned_judge_resource(
        ledger: &RequestLedger,
        student_id: &StudentId,
        grader: &GraderRef,
    ) -> Result<ResourceKey, CommandError> {
        let request = ledger
            .active_defense(student_id)
            .ok_or_else(|| LedgerError::DefenseNotFound(student_id.clone()))?;
        match grader {
            GraderRef::Internal(caller) => {
                let assigned = request
                    .internal_judge_id
                    .as_ref()
                    .ok_or(LedgerError::MissingField("internal_judge_id"))?;
                if assigned != caller {
                    return Err(CommandError::Unauthorized(format!(
                        "internal judge for student {student_id} is {assigned}"
                    )));
                }
                Ok(ResourceKey::InternalJudge(caller.clone()))
            }
            GraderRef::External(caller) => {
                let assigned = request
                    .external_judge_id
                    .as_ref()
                    .ok_or(LedgerError::MissingField("external_judge_id"))?;
                if assigned != caller {
                    return Err(CommandError::Unauthorized(format!(
                        "external judge for student {student_id} is {assigned}"
                    )));
                }
                Ok(ResourceKey::ExternalJudge(caller.clone()))
            }
        }
    }
}

// ============================================================================
// SECTION: Capacity Mapping
// ============================================================================

/// Reserves a unit, mapping capacity errors onto command errors.
fn reserve(pool: &mut CapacityPool, resource: &ResourceKey) -> Result<(), CommandError> {
    pool.reserve(resource).map_err(CommandError::from)
}

/// Reserves a judge's grading unit; exhaustion is an invalid selection, not a
/// generic capacity failure, so callers can pick a different judge.
fn reserve_judge(pool: &mut CapacityPool, resource: &ResourceKey) -> Result<(), CommandError> {
    pool.reserve(resource).map_err(|err| match err {
        CapacityError::Exhausted(detail) => {
            CommandError::InvalidJudgeSelection(format!("no grading capacity left for {detail}"))
        }
        other => CommandError::from(other),
    })
}

/// Releases a unit, mapping capacity errors onto command errors.
fn release(pool: &mut CapacityPool, resource: &ResourceKey) -> Result<(), CommandError> {
    pool.release(resource).map_err(CommandError::from)
}

/// Returns the user identifier string behind a grader reference.
fn grader_user_id(grader: &GraderRef) -> &str {
    match grader {
        GraderRef::Internal(id) => id.as_str(),
        GraderRef::External(id) => id.as_str(),
    }
}
