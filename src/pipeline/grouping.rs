//! Spatial grouping of processed images into trees.
//!
//! Clusters are anchored on a seed: every unassigned image within the
//! threshold of the seed joins it, and later members are never used as
//! anchors themselves. Two photos 2.9 m from the seed but 5 m from each
//! other end up in the same tree; a photo 2 m from a member but 4 m from
//! the seed does not.

use super::types::{GpsCoordinate, ProcessedImage, Tree};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Photos this close to a seed are taken to show the same tree.
pub const PROXIMITY_THRESHOLD_METERS: f64 = 3.0;

/// Great-circle distance between two coordinates, in metres.
pub fn haversine_distance(a: &GpsCoordinate, b: &GpsCoordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Group images into trees using the fixed proximity threshold.
pub fn group_into_trees(images: Vec<ProcessedImage>) -> Vec<Tree> {
    group_within(images, PROXIMITY_THRESHOLD_METERS)
}

/// Seed-anchored single pass over `images` in input order.
pub fn group_within(images: Vec<ProcessedImage>, threshold_meters: f64) -> Vec<Tree> {
    let positions: Vec<GpsCoordinate> = images.iter().map(|image| image.gps).collect();
    let mut assigned = vec![false; positions.len()];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for seed in 0..positions.len() {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![seed];

        for candidate in (seed + 1)..positions.len() {
            if assigned[candidate] {
                continue;
            }
            if haversine_distance(&positions[seed], &positions[candidate]) <= threshold_meters {
                assigned[candidate] = true;
                members.push(candidate);
            }
        }

        clusters.push(members);
    }

    let mut slots: Vec<Option<ProcessedImage>> = images.into_iter().map(Some).collect();
    let trees: Vec<Tree> = clusters
        .into_iter()
        .map(|members| {
            Tree::new(
                members
                    .into_iter()
                    .filter_map(|index| slots[index].take())
                    .collect(),
            )
        })
        .collect();

    tracing::debug!(trees = trees.len(), threshold_meters, "Grouped images into trees");
    trees
}
