//! Hypervolume indicator by recursive slicing.
//!
//! Two objectives use a sweep; higher dimensions slice along the last
//! objective and recurse on the projections. Exact for any number of
//! objectives, exponential in the number of objectives.

use crate::archive::ObjectiveVector;
use crate::dominance::strictly_inside;

/// Volume dominated by `points` and bounded by `reference`.
///
/// Points that are not strictly inside the reference box add nothing.
/// Dominated points are allowed.
pub fn hypervolume(points: &[ObjectiveVector], reference: &[f64]) -> f64 {
    let inside: Vec<&[f64]> = points
        .iter()
        .map(|p| p.as_slice())
        .filter(|p| strictly_inside(p, reference))
        .collect();
    if inside.is_empty() {
        return 0.0;
    }
    slice_volume(&inside, reference)
}

fn slice_volume(points: &[&[f64]], reference: &[f64]) -> f64 {
    match reference.len() {
        0 => 0.0,
        1 => {
            let best = points.iter().map(|p| p[0]).fold(f64::INFINITY, f64::min);
            (reference[0] - best).max(0.0)
        }
        2 => sweep_2d(points, reference),
        m => {
            let last = m - 1;
            let mut sorted: Vec<&[f64]> = points.to_vec();
            sorted.sort_by(|a, b| a[last].total_cmp(&b[last]));

            let mut volume = 0.0;
            let mut projected: Vec<&[f64]> = Vec::with_capacity(sorted.len());
            for (i, p) in sorted.iter().enumerate() {
                projected.push(&p[..last]);
                let upper = sorted
                    .get(i + 1)
                    .map(|q| q[last])
                    .unwrap_or(reference[last]);
                let depth = upper - p[last];
                if depth > 0.0 {
                    volume += depth * slice_volume(&projected, &reference[..last]);
                }
            }
            volume
        }
    }
}

fn sweep_2d(points: &[&[f64]], reference: &[f64]) -> f64 {
    let mut sorted: Vec<&[f64]> = points.to_vec();
    sorted.sort_by(|a, b| a[0].total_cmp(&b[0]).then(a[1].total_cmp(&b[1])));

    let mut volume = 0.0;
    let mut ceiling = reference[1];
    for p in sorted {
        if p[1] < ceiling {
            volume += (reference[0] - p[0]) * (ceiling - p[1]);
            ceiling = p[1];
        }
    }
    volume
}
