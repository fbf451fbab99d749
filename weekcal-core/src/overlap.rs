use chrono::NaiveDateTime;

use crate::event::Span;
use crate::time::end_of;

/// Half-open interval intersection: ranges that merely touch do not overlap.
#[must_use]
pub fn overlaps(
    a_start: NaiveDateTime,
    a_duration: u32,
    b_start: NaiveDateTime,
    b_duration: u32,
) -> bool {
    let a_end = end_of(a_start, a_duration);
    let b_end = end_of(b_start, b_duration);
    a_start < b_end && b_start < a_end
}

#[must_use]
pub fn spans_overlap<A: Span, B: Span>(a: &A, b: &B) -> bool {
    overlaps(a.start(), a.duration_minutes(), b.start(), b.duration_minutes())
}

/// The events in `existing` that `candidate` would collide with.
pub fn conflicts<'a, C: Span, E: Span>(
    candidate: &'a C,
    existing: &'a [E],
) -> impl Iterator<Item = &'a E> {
    existing
        .iter()
        .filter(move |event| spans_overlap(candidate, *event))
}
