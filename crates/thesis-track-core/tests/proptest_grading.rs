// crates/thesis-track-core/tests/proptest_grading.rs
// ============================================================================
// Module: Grading Property-Based Tests
// Description: Property tests for grade validation and aggregation.
// Purpose: Detect band and range violations across wide input ranges.
// ============================================================================

//! Property-based tests for grading invariants.

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
use thesis_track_core::GRADE_SCALE_MAX;
use thesis_track_core::Grade;
use thesis_track_core::LetterGrade;
use thesis_track_core::aggregate;

fn band_rank(letter: LetterGrade) -> u8 {
    match letter {
        LetterGrade::D => 0,
        LetterGrade::C => 1,
        LetterGrade::B => 2,
        LetterGrade::A => 3,
    }
}

proptest! {
    #[test]
    fn valid_range_always_constructs(value in 0.0_f64 ..= GRADE_SCALE_MAX) {
        let grade = Grade::new(value);
        prop_assert!(grade.is_ok());
    }

    #[test]
    fn out_of_range_never_constructs(value in prop_oneof![
        -1.0e6_f64 .. -f64::MIN_POSITIVE,
        GRADE_SCALE_MAX + f64::EPSILON .. 1.0e6_f64,
    ]) {
        prop_assert!(Grade::new(value).is_err());
    }

    #[test]
    fn letter_bands_are_monotone(a in 0.0_f64 ..= GRADE_SCALE_MAX, b in 0.0_f64 ..= GRADE_SCALE_MAX) {
        let ga = Grade::new(a).expect("valid grade");
        let gb = Grade::new(b).expect("valid grade");
        if a <= b {
            prop_assert!(band_rank(ga.letter()) <= band_rank(gb.letter()));
        } else {
            prop_assert!(band_rank(ga.letter()) >= band_rank(gb.letter()));
        }
    }

    #[test]
    fn aggregate_is_symmetric_and_bounded(
        a in 0.0_f64 ..= GRADE_SCALE_MAX,
        b in 0.0_f64 ..= GRADE_SCALE_MAX,
    ) {
        let ga = Grade::new(a).expect("valid grade");
        let gb = Grade::new(b).expect("valid grade");
        let forward = aggregate(ga, gb);
        let backward = aggregate(gb, ga);
        prop_assert_eq!(forward.grade.value(), backward.grade.value());
        prop_assert_eq!(forward.letter, backward.letter);
        let mean = forward.grade.value();
        prop_assert!(mean >= a.min(b));
        prop_assert!(mean <= a.max(b));
        prop_assert_eq!(forward.letter, forward.grade.letter());
    }

    #[test]
    fn grade_round_trips_through_json(value in 0.0_f64 ..= GRADE_SCALE_MAX) {
        let grade = Grade::new(value).expect("valid grade");
        let encoded = serde_json::to_value(grade).expect("encode");
        let decoded: Grade = serde_json::from_value(encoded).expect("decode");
        prop_assert_eq!(decoded.value(), grade.value());
    }
}
