//! Small numeric helpers used by [`crate::cache`] and [`crate::checkpoint`].

use crate::common::error::TidalSimError;

/// Ceiling of `log2(x)`.
///
/// # Errors
///
/// Returns [`TidalSimError::InvariantViolation`] if `x == 0`, which has no
/// well-defined log.
pub fn clog2(x: u64) -> Result<u32, TidalSimError> {
    if x == 0 {
        return Err(TidalSimError::InvariantViolation {
            context: "clog2 domain error: x must be positive".to_string(),
            expected: 1,
            actual: 0,
        });
    }
    let n = x - 1;
    Ok(u64::BITS - n.leading_zeros())
}

/// Converts absolute instruction commit points into the step sequence
/// between them: `[p0, p1 - p0, p2 - p1, ...]`, treating `p[-1]` as 0.
///
/// # Errors
///
/// Returns [`TidalSimError::InvariantViolation`] if `inst_points` is not
/// strictly increasing.
pub fn inst_points_to_inst_steps(inst_points: &[u64]) -> Result<Vec<u64>, TidalSimError> {
    let mut steps = Vec::with_capacity(inst_points.len());
    let mut prev = 0;
    for &p in inst_points {
        if p < prev {
            return Err(TidalSimError::InvariantViolation {
                context: "inst_points must be strictly increasing".to_string(),
                expected: prev as usize,
                actual: p as usize,
            });
        }
        steps.push(p - prev);
        prev = p;
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clog2_powers_of_two() {
        assert_eq!(clog2(1).expect("1 is valid"), 0);
        assert_eq!(clog2(2).expect("2 is valid"), 1);
        assert_eq!(clog2(4).expect("4 is valid"), 2);
        assert_eq!(clog2(64).expect("64 is valid"), 6);
    }

    #[test]
    fn clog2_non_powers_round_up() {
        assert_eq!(clog2(3).expect("3 is valid"), 2);
        assert_eq!(clog2(5).expect("5 is valid"), 3);
        assert_eq!(clog2(9).expect("9 is valid"), 4);
    }

    #[test]
    fn clog2_rejects_zero() {
        assert!(matches!(clog2(0), Err(TidalSimError::InvariantViolation { .. })));
    }

    #[test]
    fn inst_points_to_steps() {
        assert_eq!(
            inst_points_to_inst_steps(&[100, 1000, 2000]).expect("increasing"),
            vec![100, 900, 1000]
        );
        assert_eq!(inst_points_to_inst_steps(&[]).expect("empty is increasing"), Vec::<u64>::new());
        assert_eq!(inst_points_to_inst_steps(&[5]).expect("single point is increasing"), vec![5]);
    }

    #[test]
    fn inst_points_rejects_non_increasing() {
        assert!(matches!(
            inst_points_to_inst_steps(&[100, 50]),
            Err(TidalSimError::InvariantViolation { .. })
        ));
    }
}
