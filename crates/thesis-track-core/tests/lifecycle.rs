// crates/thesis-track-core/tests/lifecycle.rs
// ============================================================================
// Module: Lifecycle Controller Tests
// Description: End-to-end workflow command tests over in-memory backends.
// Purpose: Validate atomic commands, authorization, and capacity pairing.
// Dependencies: thesis-track-core, serde_json, time
// ============================================================================
//! ## Overview
//! Drives the controller through the full workflow: enrollment with slot
//! reservation, advisor decisions, cooldown-gated defense requests, judge
//! panel approval, dual grading with exactly-once capacity return, and the
//! archived close. Also verifies that failed commands, including persistence
//! failures, leave storage untouched.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use serde_json::Value;
use thesis_track_core::ArchivedThesis;
use thesis_track_core::Collection;
use thesis_track_core::CommandError;
use thesis_track_core::CooldownStatus;
use thesis_track_core::CourseId;
use thesis_track_core::CourseSlot;
use thesis_track_core::DefenseDecision;
use thesis_track_core::DefenseStatus;
use thesis_track_core::DefenseSubmission;
use thesis_track_core::EnrollmentDecision;
use thesis_track_core::EnrollmentRequest;
use thesis_track_core::EnrollmentStatus;
use thesis_track_core::ExternalJudgeCapacity;
use thesis_track_core::ExternalJudgeId;
use thesis_track_core::GradeError;
use thesis_track_core::GraderRef;
use thesis_track_core::InMemoryArtifactRepository;
use thesis_track_core::InMemoryStorage;
use thesis_track_core::InternalJudgeCapacity;
use thesis_track_core::JudgePanel;
use thesis_track_core::LedgerError;
use thesis_track_core::LetterGrade;
use thesis_track_core::LifecycleController;
use thesis_track_core::MapAuthProvider;
use thesis_track_core::PersistenceError;
use thesis_track_core::ProfessorId;
use thesis_track_core::Role;
use thesis_track_core::Storage;
use thesis_track_core::StudentId;
use time::macros::date;

type Controller = LifecycleController<InMemoryStorage, MapAuthProvider, InMemoryArtifactRepository>;

fn student() -> StudentId {
    StudentId::new("student-1")
}

fn advisor() -> ProfessorId {
    ProfessorId::new("prof-1")
}

fn internal_judge() -> ProfessorId {
    ProfessorId::new("prof-2")
}

fn external_judge() -> ExternalJudgeId {
    ExternalJudgeId::new("ext-1")
}

fn course() -> CourseId {
    CourseId::new("thesis-a")
}

fn auth() -> MapAuthProvider {
    MapAuthProvider::new()
        .with("student-1", Role::Student)
        .with("student-2", Role::Student)
        .with("prof-1", Role::Professor)
        .with("prof-2", Role::Professor)
        .with("ext-1", Role::ExternalJudge)
}

fn encode<T: serde::Serialize>(records: &[T]) -> Vec<Value> {
    records.iter().map(|r| serde_json::to_value(r).expect("encode")).collect()
}

fn decode<T: serde::de::DeserializeOwned>(storage: &InMemoryStorage, collection: Collection) -> Vec<T> {
    storage
        .load(collection)
        .expect("load")
        .into_iter()
        .map(|value| serde_json::from_value(value).expect("decode"))
        .collect()
}

fn seed(storage: &InMemoryStorage) {
    storage
        .save(
            Collection::CourseSlots,
            &encode(&[CourseSlot {
                course_id: course(),
                professor_id: advisor(),
                capacity: 1,
            }]),
        )
        .expect("seed slots");
    storage
        .save(
            Collection::InternalJudgeCapacities,
            &encode(&[
                InternalJudgeCapacity {
                    professor_id: advisor(),
                    capacity: 1,
                },
                InternalJudgeCapacity {
                    professor_id: internal_judge(),
                    capacity: 1,
                },
            ]),
        )
        .expect("seed internal");
    storage
        .save(
            Collection::ExternalJudgeCapacities,
            &encode(&[ExternalJudgeCapacity {
                judge_id: external_judge(),
                capacity: 1,
            }]),
        )
        .expect("seed external");
}

/// Controller plus a handle onto its shared storage.
fn controller() -> (Controller, InMemoryStorage) {
    let storage = InMemoryStorage::new();
    seed(&storage);
    let handle = storage.clone();
    (LifecycleController::new(storage, auth(), InMemoryArtifactRepository::new()), handle)
}

fn slot_capacity(storage: &InMemoryStorage) -> u32 {
    let slots: Vec<CourseSlot> = decode(storage, Collection::CourseSlots);
    slots[0].capacity
}

fn judge_capacity(storage: &InMemoryStorage, professor: &ProfessorId) -> u32 {
    let judges: Vec<InternalJudgeCapacity> = decode(storage, Collection::InternalJudgeCapacities);
    judges
        .iter()
        .find(|j| &j.professor_id == professor)
        .expect("tracked judge")
        .capacity
}

fn external_capacity(storage: &InMemoryStorage) -> u32 {
    let judges: Vec<ExternalJudgeCapacity> = decode(storage, Collection::ExternalJudgeCapacities);
    judges[0].capacity
}

/// Runs the workflow up to an approved defense scheduled for 2024-06-10.
fn advance_to_approved_defense(controller: &Controller) {
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Approve, date!(2024 - 01 - 02))
        .expect("approve enrollment");
    controller
        .create_defense(
            DefenseSubmission {
                student_id: student(),
                title: "Adaptive Scheduling".to_owned(),
                abstract_text: "A study of adaptive schedulers.".to_owned(),
                keywords: vec!["scheduling".to_owned()],
                artifact_refs: vec!["uploads/thesis.pdf".to_owned()],
            },
            date!(2024 - 05 - 01),
        )
        .expect("create defense");
    controller
        .decide_defense(
            advisor(),
            student(),
            DefenseDecision::Approve(JudgePanel {
                defense_date: date!(2024 - 06 - 10),
                internal_judge_id: internal_judge(),
                external_judge_id: external_judge(),
            }),
            date!(2024 - 05 - 02),
        )
        .expect("approve defense");
}

#[test]
fn full_workflow_closes_with_the_mean_grade_archived() {
    let (controller, storage) = controller();
    advance_to_approved_defense(&controller);

    // Slot and both judge units are held at this point.
    assert_eq!(slot_capacity(&storage), 0);
    assert_eq!(judge_capacity(&storage, &internal_judge()), 0);
    assert_eq!(external_capacity(&storage), 0);

    let first = controller
        .submit_grade(
            GraderRef::Internal(internal_judge()),
            student(),
            15.5,
            date!(2024 - 06 - 10),
        )
        .expect("internal grade");
    assert!(!first.closed);
    // The internal judge's unit returns on the first grade.
    assert_eq!(judge_capacity(&storage, &internal_judge()), 1);

    let second = controller
        .submit_grade(
            GraderRef::External(external_judge()),
            student(),
            16.5,
            date!(2024 - 06 - 11),
        )
        .expect("external grade");
    assert!(second.closed);
    assert_eq!(second.request.status, DefenseStatus::Closed);
    assert_eq!(second.request.final_grade.map(f64::from), Some(16.0));
    assert_eq!(second.request.final_letter_grade, Some(LetterGrade::B));

    // Close credits the course slot and the external judge unit.
    assert_eq!(slot_capacity(&storage), 1);
    assert_eq!(external_capacity(&storage), 1);

    let archive: Vec<ArchivedThesis> = decode(&storage, Collection::ArchivedTheses);
    assert_eq!(archive.len(), 1);
    assert_eq!(archive[0].student_id, student());
    assert_eq!(archive[0].final_letter_grade, LetterGrade::B);
    assert_eq!(archive[0].artifact_paths, vec!["documents/thesis.pdf".to_owned()]);
}

#[test]
fn enrollment_reserves_and_rejection_releases_the_slot() {
    let (controller, storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    assert_eq!(slot_capacity(&storage), 0);

    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Reject, date!(2024 - 01 - 02))
        .expect("reject enrollment");
    assert_eq!(slot_capacity(&storage), 1);

    // The student can request again after a rejection.
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 03))
        .expect("second request");
    let requests: Vec<EnrollmentRequest> = decode(&storage, Collection::EnrollmentRequests);
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].status, EnrollmentStatus::Rejected);
    assert_eq!(requests[1].status, EnrollmentStatus::Pending);
}

#[test]
fn exhausted_course_slot_refuses_further_enrollment() {
    let (controller, storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("first student takes the slot");
    let err = controller
        .create_enrollment(StudentId::new("student-2"), course(), advisor(), date!(2024 - 01 - 01))
        .expect_err("no slot left");
    assert!(matches!(err, CommandError::CapacityExhausted(_)));
    let requests: Vec<EnrollmentRequest> = decode(&storage, Collection::EnrollmentRequests);
    assert_eq!(requests.len(), 1, "failed command must not persist a record");
}

#[test]
fn only_the_advisor_may_decide() {
    let (controller, _storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    let err = controller
        .decide_enrollment(
            internal_judge(),
            student(),
            EnrollmentDecision::Approve,
            date!(2024 - 01 - 02),
        )
        .expect_err("not the advisor");
    assert!(matches!(err, CommandError::Unauthorized(_)));
}

#[test]
fn unknown_callers_and_wrong_roles_are_refused() {
    let (controller, _storage) = controller();
    let err = controller
        .create_enrollment(StudentId::new("nobody"), course(), advisor(), date!(2024 - 01 - 01))
        .expect_err("unknown user");
    assert!(matches!(err, CommandError::Unauthorized(_)));

    // A professor cannot file an enrollment request as a student.
    let err = controller
        .create_enrollment(StudentId::new("prof-1"), course(), advisor(), date!(2024 - 01 - 01))
        .expect_err("wrong role");
    assert!(matches!(err, CommandError::Unauthorized(_)));
}

#[test]
fn cooldown_blocks_early_defense_requests() {
    let (controller, _storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Approve, date!(2024 - 01 - 01))
        .expect("approve enrollment");

    let submission = DefenseSubmission {
        student_id: student(),
        title: "Title".to_owned(),
        abstract_text: "Abstract.".to_owned(),
        keywords: Vec::new(),
        artifact_refs: Vec::new(),
    };
    let err = controller
        .create_defense(submission.clone(), date!(2024 - 02 - 01))
        .expect_err("inside cooldown");
    assert!(matches!(
        err,
        CommandError::Ledger(LedgerError::NotEligible(_))
    ));

    controller.create_defense(submission, date!(2024 - 04 - 02)).expect("after cooldown");
}

#[test]
fn advisor_as_internal_judge_is_always_refused() {
    let (controller, storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Approve, date!(2024 - 01 - 02))
        .expect("approve enrollment");
    controller
        .create_defense(
            DefenseSubmission {
                student_id: student(),
                title: "Title".to_owned(),
                abstract_text: "Abstract.".to_owned(),
                keywords: Vec::new(),
                artifact_refs: Vec::new(),
            },
            date!(2024 - 05 - 01),
        )
        .expect("create defense");
    let err = controller
        .decide_defense(
            advisor(),
            student(),
            DefenseDecision::Approve(JudgePanel {
                defense_date: date!(2024 - 06 - 10),
                internal_judge_id: advisor(),
                external_judge_id: external_judge(),
            }),
            date!(2024 - 05 - 02),
        )
        .expect_err("advisor on own panel");
    assert!(matches!(err, CommandError::InvalidJudgeSelection(_)));
    // The failed approval must not leak judge reservations.
    assert_eq!(judge_capacity(&storage, &advisor()), 1);
    assert_eq!(external_capacity(&storage), 1);
}

#[test]
fn out_of_range_grade_changes_nothing() {
    let (controller, storage) = controller();
    advance_to_approved_defense(&controller);
    let err = controller
        .submit_grade(GraderRef::Internal(internal_judge()), student(), 21.0, date!(2024 - 06 - 10))
        .expect_err("out of scale");
    assert_eq!(err, CommandError::Grade(GradeError::OutOfRange(21.0)));
    let defenses: Vec<thesis_track_core::DefenseRequest> =
        decode(&storage, Collection::DefenseRequests);
    assert_eq!(defenses[0].internal_grade, None);
    assert_eq!(judge_capacity(&storage, &internal_judge()), 0);
}

#[test]
fn grading_before_the_session_date_is_refused() {
    let (controller, _storage) = controller();
    advance_to_approved_defense(&controller);
    let err = controller
        .submit_grade(GraderRef::Internal(internal_judge()), student(), 15.0, date!(2024 - 06 - 09))
        .expect_err("session not held");
    assert!(matches!(
        err,
        CommandError::Ledger(LedgerError::GradingBeforeDefense { .. })
    ));
}

#[test]
fn only_the_assigned_judge_may_grade_their_role() {
    let (controller, _storage) = controller();
    advance_to_approved_defense(&controller);
    let err = controller
        .submit_grade(GraderRef::Internal(advisor()), student(), 15.0, date!(2024 - 06 - 10))
        .expect_err("not the assigned internal judge");
    assert!(matches!(err, CommandError::Unauthorized(_)));
    let err = controller
        .submit_grade(
            GraderRef::External(ExternalJudgeId::new("ext-2")),
            student(),
            15.0,
            date!(2024 - 06 - 10),
        )
        .expect_err("not the assigned external judge");
    assert!(matches!(err, CommandError::Unauthorized(_)));
}

#[test]
fn second_approval_against_a_drained_judge_is_refused() {
    // One external judge with a single grading unit, two slots in the course.
    let storage = InMemoryStorage::new();
    storage
        .save(
            Collection::CourseSlots,
            &encode(&[CourseSlot {
                course_id: course(),
                professor_id: advisor(),
                capacity: 2,
            }]),
        )
        .expect("seed slots");
    storage
        .save(
            Collection::InternalJudgeCapacities,
            &encode(&[InternalJudgeCapacity {
                professor_id: internal_judge(),
                capacity: 2,
            }]),
        )
        .expect("seed internal");
    storage
        .save(
            Collection::ExternalJudgeCapacities,
            &encode(&[ExternalJudgeCapacity {
                judge_id: external_judge(),
                capacity: 1,
            }]),
        )
        .expect("seed external");
    let handle = storage.clone();
    let controller =
        LifecycleController::new(storage, auth(), InMemoryArtifactRepository::new());

    for name in ["student-1", "student-2"] {
        let id = StudentId::new(name);
        controller
            .create_enrollment(id.clone(), course(), advisor(), date!(2024 - 01 - 01))
            .expect("create enrollment");
        controller
            .decide_enrollment(advisor(), id.clone(), EnrollmentDecision::Approve, date!(2024 - 01 - 02))
            .expect("approve enrollment");
        controller
            .create_defense(
                DefenseSubmission {
                    student_id: id,
                    title: "Title".to_owned(),
                    abstract_text: "Abstract.".to_owned(),
                    keywords: Vec::new(),
                    artifact_refs: Vec::new(),
                },
                date!(2024 - 05 - 01),
            )
            .expect("create defense");
    }

    let panel = JudgePanel {
        defense_date: date!(2024 - 06 - 10),
        internal_judge_id: internal_judge(),
        external_judge_id: external_judge(),
    };
    let first = controller
        .decide_defense(
            advisor(),
            student(),
            DefenseDecision::Approve(panel.clone()),
            date!(2024 - 05 - 02),
        )
        .expect("first approval takes the unit");
    assert_eq!(first.status, DefenseStatus::Approved);
    assert_eq!(external_capacity(&handle), 0);

    let err = controller
        .decide_defense(
            advisor(),
            StudentId::new("student-2"),
            DefenseDecision::Approve(panel),
            date!(2024 - 05 - 02),
        )
        .expect_err("judge unit already taken");
    assert!(matches!(err, CommandError::InvalidJudgeSelection(_)));

    // The first approval stands and no extra unit was consumed.
    let defenses: Vec<thesis_track_core::DefenseRequest> =
        decode(&handle, Collection::DefenseRequests);
    assert_eq!(defenses[0].status, DefenseStatus::Approved);
    assert_eq!(defenses[1].status, DefenseStatus::PendingApproval);
    assert_eq!(external_capacity(&handle), 0);
    assert_eq!(judge_capacity(&handle, &internal_judge()), 1);
}

#[test]
fn regrading_does_not_return_capacity_twice() {
    let (controller, storage) = controller();
    advance_to_approved_defense(&controller);
    controller
        .submit_grade(GraderRef::Internal(internal_judge()), student(), 14.0, date!(2024 - 06 - 10))
        .expect("first grade");
    assert_eq!(judge_capacity(&storage, &internal_judge()), 1);
    controller
        .submit_grade(GraderRef::Internal(internal_judge()), student(), 15.0, date!(2024 - 06 - 11))
        .expect("regrade");
    assert_eq!(judge_capacity(&storage, &internal_judge()), 1);
}

#[test]
fn request_status_reports_the_remaining_wait() {
    let (controller, _storage) = controller();
    let empty = controller.request_status(&student(), date!(2024 - 01 - 01)).expect("status");
    assert!(empty.enrollment.is_none());
    assert!(empty.defense.is_none());
    assert!(empty.cooldown.is_none());

    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Approve, date!(2024 - 01 - 01))
        .expect("approve enrollment");

    let status = controller.request_status(&student(), date!(2024 - 02 - 01)).expect("status");
    match status.cooldown {
        Some(CooldownStatus::Waiting {
            remaining,
            eligible_on,
        }) => {
            assert_eq!(eligible_on, date!(2024 - 04 - 01));
            assert_eq!((remaining.months, remaining.days), (2, 0));
        }
        other => panic!("expected waiting cooldown, got {other:?}"),
    }

    let status = controller.request_status(&student(), date!(2024 - 05 - 01)).expect("status");
    assert_eq!(status.cooldown, Some(CooldownStatus::Elapsed));
}

#[test]
fn judge_candidates_exclude_the_advisor() {
    let (controller, _storage) = controller();
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("create enrollment");
    controller
        .decide_enrollment(advisor(), student(), EnrollmentDecision::Approve, date!(2024 - 01 - 02))
        .expect("approve enrollment");
    controller
        .create_defense(
            DefenseSubmission {
                student_id: student(),
                title: "Title".to_owned(),
                abstract_text: "Abstract.".to_owned(),
                keywords: Vec::new(),
                artifact_refs: Vec::new(),
            },
            date!(2024 - 05 - 01),
        )
        .expect("create defense");
    let (internal, external) = controller.judge_candidates(&student()).expect("candidates");
    assert_eq!(internal, vec![internal_judge()]);
    assert_eq!(external, vec![external_judge()]);
}

// ----------------------------------------------------------------------
// Persistence failure rollback
// ----------------------------------------------------------------------

/// Storage wrapper whose commit fails while armed.
#[derive(Debug, Clone)]
struct FailingCommit {
    inner: InMemoryStorage,
    armed: Arc<AtomicBool>,
}

impl Storage for FailingCommit {
    fn load(&self, collection: Collection) -> Result<Vec<Value>, PersistenceError> {
        self.inner.load(collection)
    }

    fn save(&self, collection: Collection, records: &[Value]) -> Result<(), PersistenceError> {
        self.inner.save(collection, records)
    }

    fn commit(&self, batch: &[(Collection, Vec<Value>)]) -> Result<(), PersistenceError> {
        if self.armed.load(Ordering::SeqCst) {
            return Err(PersistenceError::Io("disk full".to_owned()));
        }
        self.inner.commit(batch)
    }
}

#[test]
fn persistence_failure_rolls_the_command_back() {
    let inner = InMemoryStorage::new();
    seed(&inner);
    let armed = Arc::new(AtomicBool::new(false));
    let storage = FailingCommit {
        inner: inner.clone(),
        armed: Arc::clone(&armed),
    };
    let controller =
        LifecycleController::new(storage, auth(), InMemoryArtifactRepository::new());

    armed.store(true, Ordering::SeqCst);
    let err = controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect_err("commit fails");
    assert!(matches!(err, CommandError::Persistence(_)));

    // Nothing reached storage: no record, and the slot is still free.
    let requests: Vec<EnrollmentRequest> = decode(&inner, Collection::EnrollmentRequests);
    assert!(requests.is_empty());
    assert_eq!(slot_capacity(&inner), 1);

    // The same command succeeds once the backend recovers.
    armed.store(false, Ordering::SeqCst);
    controller
        .create_enrollment(student(), course(), advisor(), date!(2024 - 01 - 01))
        .expect("retry succeeds");
    assert_eq!(slot_capacity(&inner), 0);
}
