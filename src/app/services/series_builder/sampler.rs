//! Shape-preserving downsampling of row sequences
//!
//! The first and last rows are always kept and the interior is walked with a
//! fixed stride of `len / (target - 2)`, so output size stays near the target
//! regardless of input length and a second pass over sampled output is the
//! identity.

use tracing::debug;

/// Stride between kept interior rows, or `None` when no sampling is needed
fn stride(len: usize, target: usize) -> Option<usize> {
    if len <= target {
        return None;
    }

    let interior_budget = target.saturating_sub(2);
    if interior_budget == 0 {
        // Only the endpoints fit
        return Some(len);
    }

    Some((len / interior_budget).max(1))
}

fn is_kept(index: usize, len: usize, stride: usize) -> bool {
    index == 0 || index == len - 1 || (index % stride == 0 && index <= len - 2)
}

/// Indices of the rows [`sample`] keeps, in ascending order
pub fn sample_indices(len: usize, target: usize) -> Vec<usize> {
    match stride(len, target) {
        None => (0..len).collect(),
        Some(stride) => (0..len).filter(|&index| is_kept(index, len, stride)).collect(),
    }
}

/// Sample a borrowed slice, cloning the kept elements
pub fn sample<T: Clone>(items: &[T], target: usize) -> Vec<T> {
    match stride(items.len(), target) {
        None => items.to_vec(),
        Some(stride) => {
            let len = items.len();
            let sampled: Vec<T> = items
                .iter()
                .enumerate()
                .filter(|(index, _)| is_kept(*index, len, stride))
                .map(|(_, item)| item.clone())
                .collect();
            debug!("Sampled {} of {} rows (stride {})", sampled.len(), len, stride);
            sampled
        }
    }
}

/// Sample an owned vector without cloning
pub fn sample_owned<T>(items: Vec<T>, target: usize) -> Vec<T> {
    let len = items.len();
    match stride(len, target) {
        None => items,
        Some(stride) => {
            let sampled: Vec<T> = items
                .into_iter()
                .enumerate()
                .filter(|(index, _)| is_kept(*index, len, stride))
                .map(|(_, item)| item)
                .collect();
            debug!("Sampled {} of {} rows (stride {})", sampled.len(), len, stride);
            sampled
        }
    }
}
