// crates/thesis-track-core/tests/proptest_capacity.rs
// ============================================================================
// Module: Capacity Property-Based Tests
// Description: Property tests for capacity reserve/release accounting.
// Purpose: Detect counter drift across arbitrary operation sequences.
// ============================================================================

//! Property-based tests for capacity pool invariants.

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
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use thesis_track_core::CapacityPool;
use thesis_track_core::CourseId;
use thesis_track_core::CourseSlot;
use thesis_track_core::ProfessorId;
use thesis_track_core::ResourceKey;

fn pool_with_capacity(capacity: u32) -> CapacityPool {
    CapacityPool::new(
        vec![CourseSlot {
            course_id: CourseId::new("thesis-a"),
            professor_id: ProfessorId::new("prof-1"),
            capacity,
        }],
        Vec::new(),
        Vec::new(),
    )
}

proptest! {
    #[test]
    fn reserve_then_release_restores_the_counter(initial in 1_u32 .. 100) {
        let mut pool = pool_with_capacity(initial);
        let slot = ResourceKey::CourseSlot(CourseId::new("thesis-a"));
        pool.reserve(&slot).expect("unit available");
        pool.release(&slot).expect("tracked resource");
        prop_assert_eq!(pool.available(&slot), Some(initial));
    }

    #[test]
    fn reserve_fails_exactly_when_the_counter_is_zero(
        initial in 0_u32 .. 8,
        ops in prop::collection::vec(any::<bool>(), 0 .. 64),
    ) {
        let mut pool = pool_with_capacity(initial);
        let slot = ResourceKey::CourseSlot(CourseId::new("thesis-a"));
        let mut expected = initial;
        for is_reserve in ops {
            let before = pool.available(&slot).expect("tracked resource");
            prop_assert_eq!(before, expected);
            if is_reserve {
                if before == 0 {
                    prop_assert!(pool.reserve(&slot).is_err());
                } else {
                    pool.reserve(&slot).expect("unit available");
                    expected -= 1;
                }
            } else {
                pool.release(&slot).expect("tracked resource");
                expected += 1;
            }
        }
        prop_assert_eq!(pool.available(&slot), Some(expected));
    }
}
