//! Gap filling for numeric and categorical columns
//!
//! Every strategy is a pure function of the column and method. Missing points
//! are `None`; valid points are never modified. A column without any valid
//! point is returned unchanged.

use crate::app::models::InterpolationMethod;

/// Fill gaps with the nearest earlier value, falling back to the first later one
pub fn forward_fill<T: Clone>(values: &[Option<T>]) -> Vec<Option<T>> {
    let Some(first_valid) = values.iter().flatten().next() else {
        return values.to_vec();
    };

    let mut last = first_valid;
    values
        .iter()
        .map(|value| {
            if let Some(value) = value {
                last = value;
            }
            Some(last.clone())
        })
        .collect()
}

/// Fill gaps with the nearest later value, falling back to the last earlier one
pub fn backward_fill<T: Clone>(values: &[Option<T>]) -> Vec<Option<T>> {
    let Some(last_valid) = values.iter().rev().flatten().next() else {
        return values.to_vec();
    };

    let mut next = last_valid;
    let mut filled: Vec<Option<T>> = values
        .iter()
        .rev()
        .map(|value| {
            if let Some(value) = value {
                next = value;
            }
            Some(next.clone())
        })
        .collect();
    filled.reverse();
    filled
}

/// Interpolate between the neighbouring valid points
///
/// Gaps with a valid point on one side only take that side's value.
pub fn linear_fill(values: &[Option<f64>]) -> Vec<Option<f64>> {
    let previous = anchors(values.iter().enumerate());
    let mut next = anchors(values.iter().enumerate().rev());
    next.reverse();

    values
        .iter()
        .enumerate()
        .map(|(index, value)| {
            if value.is_some() {
                return *value;
            }
            match (previous[index], next[index]) {
                (Some((left, a)), Some((right, b))) => {
                    let offset = (index - left) as f64;
                    let span = (right - left) as f64;
                    Some(a + (b - a) * offset / span)
                }
                (Some((_, a)), None) => Some(a),
                (None, Some((_, b))) => Some(b),
                (None, None) => None,
            }
        })
        .collect()
}

/// Nearest valid point seen so far while walking `points` in the given order
fn anchors<'a>(
    points: impl Iterator<Item = (usize, &'a Option<f64>)>,
) -> Vec<Option<(usize, f64)>> {
    let mut anchor = None;
    points
        .map(|(index, value)| {
            if let Some(value) = value {
                anchor = Some((index, *value));
            }
            anchor
        })
        .collect()
}

/// Fill a numeric column with the chosen strategy
pub fn fill_numeric(values: &[Option<f64>], method: InterpolationMethod) -> Vec<Option<f64>> {
    match method {
        InterpolationMethod::Forward => forward_fill(values),
        InterpolationMethod::Backward => backward_fill(values),
        InterpolationMethod::Linear => linear_fill(values),
        InterpolationMethod::None => values.to_vec(),
    }
}

/// Fill a categorical column; states have no order, so only forward fill applies
pub fn fill_categorical(values: &[Option<String>]) -> Vec<Option<String>> {
    forward_fill(values)
}
