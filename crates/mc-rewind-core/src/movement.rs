//! Relative movement decomposition.
//!
//! 1.9 sends relative moves as shorts in 1/4096 of a block; 1.8 and older
//! only take signed bytes in 1/32 of a block. A wide delta becomes several
//! legacy moves plus a sub-unit remainder that the caller carries into the
//! entity's next move, so nothing is lost over time.

/// Newer fine units per legacy unit (4096 / 32).
pub const FINE_PER_LEGACY: i32 = 128;

/// Largest whole step a single legacy move carries per axis.
const CHUNK: i32 = i8::MAX as i32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LegacyMove {
    pub dx: i8,
    pub dy: i8,
    pub dz: i8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    /// Never empty. The first move holds the leftover, the rest whole chunks.
    pub moves: Vec<LegacyMove>,
    /// Fine units below one legacy unit, `|r| < 128` per axis.
    pub remainder: [i32; 3],
}

/// Split one delta, given in fine units, into legacy moves.
pub fn split(dx: i32, dy: i32, dz: i32) -> Split {
    let deltas = [dx, dy, dz];
    let mut legacy = [0i64; 3];
    let mut remainder = [0i32; 3];
    for axis in 0..3 {
        let d = deltas[axis] as i64;
        let whole = d / FINE_PER_LEGACY as i64;
        legacy[axis] = whole;
        remainder[axis] = (d - whole * FINE_PER_LEGACY as i64) as i32;
    }

    let count = legacy
        .iter()
        .map(|l| chunks_needed(*l))
        .max()
        .unwrap_or(1);

    let mut moves = vec![LegacyMove::default(); count];
    for (axis, &total) in legacy.iter().enumerate() {
        for (i, step) in axis_steps(total).into_iter().enumerate() {
            let m = &mut moves[i];
            match axis {
                0 => m.dx = step,
                1 => m.dy = step,
                _ => m.dz = step,
            }
        }
    }

    Split { moves, remainder }
}

fn chunks_needed(total: i64) -> usize {
    let magnitude = total.unsigned_abs();
    (magnitude.div_ceil(CHUNK as u64) as usize).max(1)
}

/// Leftover first, then `±127` chunks.
fn axis_steps(total: i64) -> Vec<i8> {
    let count = chunks_needed(total);
    let sign = total.signum();
    let whole = sign * CHUNK as i64 * (count as i64 - 1);
    let mut steps = Vec::with_capacity(count);
    steps.push((total - whole) as i8);
    for _ in 1..count {
        steps.push((sign * CHUNK as i64) as i8);
    }
    steps
}
