use crate::{grid::GridPos, wires::Segment};

/// Orthogonal path from `start` to `end` with at most one bend.
///
/// The longer axis is walked first; ties go vertical first. Zero-length legs
/// are left out, so straight lines come back as a single segment.
pub fn route(start: GridPos, end: GridPos) -> Option<Vec<Segment>> {
    if start == end {
        return None;
    }

    let delta = end - start;
    let bend = if delta.x.abs() > delta.y.abs() {
        GridPos::new(end.x, start.y)
    } else {
        GridPos::new(start.x, end.y)
    };

    let segments = [Segment::new(start, bend), Segment::new(bend, end)]
        .into_iter()
        .filter(|segment| !segment.is_empty())
        .collect();
    Some(segments)
}
