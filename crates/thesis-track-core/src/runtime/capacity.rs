// crates/thesis-track-core/src/runtime/capacity.rs
// ============================================================================
// Module: Thesis Track Capacity Pool
// Description: Reservable units for course slots and judge grading capacity.
// Purpose: One place to enforce non-negativity across all finite resources.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The capacity pool consolidates every counter the workflow consumes: course
//! enrollment slots, professors' internal-judging capacity, and external
//! judges' capacity. Reserve refuses rather than blocks when a unit is
//! unavailable; release restores a unit and never drives a counter below
//! zero. Callers must not double-release -- the controller releases each unit
//! exactly once per transition.
//!
//! The pool itself is plain staged data; mutual exclusion across callers is
//! provided by the controller, which serializes commands (see the runtime
//! module docs).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

use crate::core::CourseId;
use crate::core::CourseSlot;
use crate::core::ExternalJudgeCapacity;
use crate::core::ExternalJudgeId;
use crate::core::InternalJudgeCapacity;
use crate::core::ProfessorId;

// ============================================================================
// SECTION: Resource Keys
// ============================================================================

/// Key of a reservable resource tracked by the pool.
///
/// # Invariants
/// - Internal-judge resources are keyed on professor identity; external-judge
///   resources on external-judge identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceKey {
    /// An enrollment unit of a thesis course.
    CourseSlot(CourseId),
    /// A grading unit of a professor acting as internal judge.
    InternalJudge(ProfessorId),
    /// A grading unit of an external judge.
    ExternalJudge(ExternalJudgeId),
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CourseSlot(id) => write!(f, "course slot {id}"),
            Self::InternalJudge(id) => write!(f, "internal judge {id}"),
            Self::ExternalJudge(id) => write!(f, "external judge {id}"),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Capacity pool errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapacityError {
    /// No reservable unit remains for the resource.
    #[error("no capacity left for {0}")]
    Exhausted(String),
    /// The resource is not tracked by the pool.
    #[error("unknown resource: {0}")]
    UnknownResource(String),
}

// ============================================================================
// SECTION: Capacity Pool
// ============================================================================

/// Staged capacity counters for one transaction.
///
/// # Invariants
/// - All counters are `>= 0` (unsigned) and only move through
///   [`CapacityPool::reserve`] / [`CapacityPool::release`].
/// - Record order is preserved for deterministic persistence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapacityPool {
    /// Course slots, in storage order.
    course_slots: Vec<CourseSlot>,
    /// Internal-judge capacities, in storage order.
    internal: Vec<InternalJudgeCapacity>,
    /// External-judge capacities, in storage order.
    external: Vec<ExternalJudgeCapacity>,
}

impl CapacityPool {
    /// Builds a pool from loaded capacity records.
    #[must_use]
    pub const fn new(
        course_slots: Vec<CourseSlot>,
        internal: Vec<InternalJudgeCapacity>,
        external: Vec<ExternalJudgeCapacity>,
    ) -> Self {
        Self {
            course_slots,
            internal,
            external,
        }
    }

    /// Reserves one unit of the resource.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::UnknownResource`] when the resource is not
    /// tracked and [`CapacityError::Exhausted`] when no unit remains. The
    /// pool is unchanged on error.
    pub fn reserve(&mut self, resource: &ResourceKey) -> Result<(), CapacityError> {
        let counter = self.counter_mut(resource)?;
        if *counter == 0 {
            return Err(CapacityError::Exhausted(resource.to_string()));
        }
        *counter -= 1;
        Ok(())
    }

    /// Releases one unit of the resource back to the pool.
    ///
    /// Release never refuses for a tracked resource; the caller is
    /// responsible for not double-releasing.
    ///
    /// # Errors
    ///
    /// Returns [`CapacityError::UnknownResource`] when the resource is not
    /// tracked.
    pub fn release(&mut self, resource: &ResourceKey) -> Result<(), CapacityError> {
        let counter = self.counter_mut(resource)?;
        *counter += 1;
        Ok(())
    }

    /// Returns the remaining units of the resource, or `None` when untracked.
    #[must_use]
    pub fn available(&self, resource: &ResourceKey) -> Option<u32> {
        match resource {
            ResourceKey::CourseSlot(id) => self
                .course_slots
                .iter()
                .find(|slot| &slot.course_id == id)
                .map(|slot| slot.capacity),
            ResourceKey::InternalJudge(id) => self
                .internal
                .iter()
                .find(|judge| &judge.professor_id == id)
                .map(|judge| judge.capacity),
            ResourceKey::ExternalJudge(id) => self
                .external
                .iter()
                .find(|judge| &judge.judge_id == id)
                .map(|judge| judge.capacity),
        }
    }

    /// Returns the course slot record for a course, when tracked.
    #[must_use]
    pub fn course_slot(&self, course_id: &CourseId) -> Option<&CourseSlot> {
        self.course_slots.iter().find(|slot| &slot.course_id == course_id)
    }

    /// Lists internal judges with remaining capacity, excluding the advisor.
    ///
    /// The advisor is excluded from the candidate set regardless of their own
    /// remaining capacity: an advisor never judges their own advisee.
    #[must_use]
    pub fn internal_judge_candidates(&self, advisor: &ProfessorId) -> Vec<&InternalJudgeCapacity> {
        self.internal
            .iter()
            .filter(|judge| judge.capacity > 0 && &judge.professor_id != advisor)
            .collect()
    }

    /// Lists external judges with remaining capacity.
    #[must_use]
    pub fn external_judge_candidates(&self) -> Vec<&ExternalJudgeCapacity> {
        self.external.iter().filter(|judge| judge.capacity > 0).collect()
    }

    /// Returns the course slot records, in storage order.
    #[must_use]
    pub fn course_slots(&self) -> &[CourseSlot] {
        &self.course_slots
    }

    /// Returns the internal-judge capacity records, in storage order.
    #[must_use]
    pub fn internal_capacities(&self) -> &[InternalJudgeCapacity] {
        &self.internal
    }

    /// Returns the external-judge capacity records, in storage order.
    #[must_use]
    pub fn external_capacities(&self) -> &[ExternalJudgeCapacity] {
        &self.external
    }

    /// Returns a mutable reference to the counter behind a resource key.
    fn counter_mut(&mut self, resource: &ResourceKey) -> Result<&mut u32, CapacityError> {
        match resource {
            ResourceKey::CourseSlot(id) => self
                .course_slots
                .iter_mut()
                .find(|slot| &slot.course_id == id)
                .map(|slot| &mut slot.capacity),
            ResourceKey::InternalJudge(id) => self
                .internal
                .iter_mut()
                .find(|judge| &judge.professor_id == id)
                .map(|judge| &mut judge.capacity),
            ResourceKey::ExternalJudge(id) => self
                .external
                .iter_mut()
                .find(|judge| &judge.judge_id == id)
                .map(|judge| &mut judge.capacity),
        }
        .ok_or_else(|| CapacityError::UnknownResource(resource.to_string()))
    }
}
