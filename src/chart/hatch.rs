/// Diagonal hatch strokes within the unit square, bottom-left to top-right.
///
/// Each stroke is a segment of `v = u + c`, clipped to `[0, 1]²`.
#[allow(clippy::cast_precision_loss)]
pub fn unit_strokes(n_strokes: usize) -> impl Iterator<Item = [(f64, f64); 2]> {
    let spacing = 2.0 / (n_strokes + 1) as f64;
    (1..=n_strokes).map(move |index| {
        let c = (index as f64).mul_add(spacing, -1.0);
        if c >= 0.0 { [(0.0, c), (1.0 - c, 1.0)] } else { [(-c, 0.0), (1.0, 1.0 + c)] }
    })
}

/// Hatch strokes scaled onto the rectangle between the corners.
pub fn strokes(
    (left, bottom): (f64, f64),
    (right, top): (f64, f64),
    n_strokes: usize,
) -> impl Iterator<Item = [(f64, f64); 2]> {
    let scale = move |(u, v): (f64, f64)| (u.mul_add(right - left, left), v.mul_add(top - bottom, bottom));
    unit_strokes(n_strokes).map(move |[from, to]| [scale(from), scale(to)])
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_unit_strokes_stay_within_square() {
        let strokes: Vec<_> = unit_strokes(5).collect();
        assert_eq!(strokes.len(), 5);
        for [(u1, v1), (u2, v2)] in strokes {
            for coordinate in [u1, v1, u2, v2] {
                assert!((0.0..=1.0).contains(&coordinate));
            }
            assert_abs_diff_eq!(v2 - v1, u2 - u1, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_middle_stroke_is_diagonal() {
        let strokes: Vec<_> = unit_strokes(3).collect();
        assert_abs_diff_eq!(strokes[1][0].0, 0.0);
        assert_abs_diff_eq!(strokes[1][0].1, 0.0);
        assert_abs_diff_eq!(strokes[1][1].0, 1.0);
        assert_abs_diff_eq!(strokes[1][1].1, 1.0);
    }

    #[test]
    fn test_scaled_strokes() {
        // Bar from x = 1.6 to 2.4, reaching 10 kWh.
        let strokes: Vec<_> = strokes((1.6, 0.0), (2.4, 10.0), 1).collect();
        assert_eq!(strokes.len(), 1);
        let [(x1, y1), (x2, y2)] = strokes[0];
        assert_abs_diff_eq!(x1, 1.6);
        assert_abs_diff_eq!(y1, 0.0);
        assert_abs_diff_eq!(x2, 2.4, epsilon = 1e-12);
        assert_abs_diff_eq!(y2, 10.0, epsilon = 1e-12);
    }
}
