use ndarray::ArrayView1;

pub fn l2_norm(vector: &[f32]) -> f32 {
    let view = ArrayView1::from(vector);
    view.dot(&view).sqrt()
}

/// Scales `vector` to unit length in place. A zero vector is left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if norm <= f32::EPSILON {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(left: f32, right: f32) -> bool {
        (left - right).abs() < 1e-5
    }

    #[test]
    fn normalizes_to_unit_length() {
        let mut vec = vec![3.0, 4.0];
        l2_normalize(&mut vec);
        assert!(approx_eq(vec[0], 0.6));
        assert!(approx_eq(vec[1], 0.8));
        assert!(approx_eq(l2_norm(&vec), 1.0));
    }

    #[test]
    fn zero_vector_is_unchanged() {
        let mut vec = vec![0.0, 0.0, 0.0];
        l2_normalize(&mut vec);
        assert_eq!(vec, vec![0.0, 0.0, 0.0]);
    }
}
