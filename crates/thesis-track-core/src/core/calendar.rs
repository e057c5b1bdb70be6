// crates/thesis-track-core/src/core/calendar.rs
// ============================================================================
// Module: Thesis Track Calendar Arithmetic
// Description: Calendar-month arithmetic and defense cooldown evaluation.
// Purpose: Compute eligibility deadlines and precise remaining waits.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! The defense cooldown is three *calendar* months after enrollment approval,
//! not a fixed day count. This module provides the month-addition rule (day
//! clamped to the end of the target month) and the months-plus-days remainder
//! used for user-facing guidance. The core never reads wall-clock time;
//! callers supply the operation date on every command.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::Date;
use time::Month;
use time::util::days_in_year_month;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Calendar months a student must wait between enrollment approval and a
/// defense request.
pub const DEFENSE_COOLDOWN_MONTHS: i32 = 3;

// ============================================================================
// SECTION: Month Arithmetic
// ============================================================================

/// Adds `months` calendar months to `date`, clamping the day-of-month to the
/// last day of the target month.
///
/// # Invariants
/// - The returned day never exceeds the length of the target month
///   (e.g. `2024-11-30 + 3` is `2025-02-28`).
#[must_use]
pub fn add_months(date: Date, months: i32) -> Date {
    let zero_based = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = zero_based.div_euclid(12);
    let month_number = zero_based.rem_euclid(12) + 1;
    // rem_euclid keeps the value in 1..=12, so the conversion cannot fail.
    let month = u8::try_from(month_number)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .unwrap_or(date.month());
    let day = date.day().min(days_in_year_month(year, month));
    Date::from_calendar_date(year, month, day).unwrap_or(date)
}

/// Calendar distance from `from` to `to` expressed as whole months plus
/// residual days.
///
/// # Invariants
/// - `from <= to`; the result is zero months and zero days otherwise.
/// - `add_months(from, months) + days == to` for the returned pair.
#[must_use]
pub fn months_days_between(from: Date, to: Date) -> (u32, u32) {
    if to < from {
        return (0, 0);
    }
    let mut months = (to.year() - from.year()) * 12 + i32::from(u8::from(to.month()))
        - i32::from(u8::from(from.month()));
    if to.day() < from.day() {
        months -= 1;
    }
    let months = months.max(0);
    let anchor = add_months(from, months);
    let days = u32::try_from((to - anchor).whole_days().max(0)).unwrap_or(0);
    (u32::try_from(months).unwrap_or(0), days)
}

// ============================================================================
// SECTION: Cooldown Evaluation
// ============================================================================

/// Remaining wait before a student becomes defense-eligible.
///
/// # Invariants
/// - Both components are zero only when the cooldown has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemainingWait {
    /// Whole calendar months still to wait.
    pub months: u32,
    /// Residual days after the whole months.
    pub days: u32,
}

impl fmt::Display for RemainingWait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} months and {} days", self.months, self.days)
    }
}

/// Outcome of evaluating the defense cooldown for a student.
///
/// # Invariants
/// - Variants are stable for serialization and user-facing guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CooldownStatus {
    /// Three calendar months have elapsed; a defense request is allowed.
    Elapsed,
    /// The cooldown is still running.
    Waiting {
        /// Precise remaining wait, for user-facing guidance.
        remaining: RemainingWait,
        /// First date on which a defense request becomes eligible.
        eligible_on: Date,
    },
}

/// Evaluates the defense cooldown given the enrollment approval date and the
/// current operation date.
#[must_use]
pub fn defense_cooldown(approved_on: Date, today: Date) -> CooldownStatus {
    let eligible_on = add_months(approved_on, DEFENSE_COOLDOWN_MONTHS);
    if today >= eligible_on {
        CooldownStatus::Elapsed
    } else {
        let (months, days) = months_days_between(today, eligible_on);
        CooldownStatus::Waiting {
            remaining: RemainingWait {
                months,
                days,
            },
            eligible_on,
        }
    }
}
