//! Reduction of a client face mesh to the landmark subset the model uses.

use livecheck_common::config::PipelineConfig;

/// Maps a flattened face mesh onto the configured landmark subset.
///
/// A mesh that already has exactly the subset's point count passes through.
/// A full mesh is reduced to the configured indices, in order. Any other
/// mesh is unusable.
#[derive(Debug, Clone)]
pub struct LandmarkSelector {
    indices: Vec<usize>,
    required_points: usize,
}

impl LandmarkSelector {
    pub fn new(indices: Vec<usize>) -> Self {
        let required_points = indices.iter().max().map_or(0, |max| max + 1);
        Self {
            indices,
            required_points,
        }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.landmark_indices.clone())
    }

    /// Output width: selected points × 3 coordinates.
    pub fn channels(&self) -> usize {
        self.indices.len() * 3
    }

    /// Select landmarks from flat `[x, y, z, ...]` coordinates.
    pub fn select(&self, coords: &[f64]) -> Option<Vec<f64>> {
        if self.indices.is_empty() || coords.is_empty() || coords.len() % 3 != 0 {
            return None;
        }

        let points = coords.len() / 3;
        if points == self.indices.len() {
            return Some(coords.to_vec());
        }
        if points < self.required_points {
            return None;
        }

        let mut selected = Vec::with_capacity(self.channels());
        for &idx in &self.indices {
            selected.extend_from_slice(&coords[idx * 3..idx * 3 + 3]);
        }
        Some(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livecheck_common::config::DEFAULT_LANDMARK_INDICES;

    fn full_mesh(points: usize) -> Vec<f64> {
        (0..points)
            .flat_map(|i| [i as f64, i as f64 + 0.25, i as f64 + 0.5])
            .collect()
    }

    #[test]
    fn test_full_mesh_is_reduced_to_configured_indices() {
        let selector = LandmarkSelector::new(DEFAULT_LANDMARK_INDICES.to_vec());
        let selected = selector.select(&full_mesh(468)).unwrap();

        assert_eq!(selected.len(), 84);
        for (slot, &idx) in DEFAULT_LANDMARK_INDICES.iter().enumerate() {
            assert_eq!(selected[slot * 3], idx as f64);
            assert_eq!(selected[slot * 3 + 1], idx as f64 + 0.25);
        }
    }

    #[test]
    fn test_preselected_mesh_passes_through() {
        let selector = LandmarkSelector::new(DEFAULT_LANDMARK_INDICES.to_vec());
        let mesh = full_mesh(28);
        assert_eq!(selector.select(&mesh), Some(mesh));
    }

    #[test]
    fn test_short_mesh_is_unusable() {
        let selector = LandmarkSelector::new(DEFAULT_LANDMARK_INDICES.to_vec());
        assert_eq!(selector.select(&full_mesh(10)), None);
        assert_eq!(selector.select(&full_mesh(300)), None);
        assert_eq!(selector.select(&[]), None);
        assert_eq!(selector.select(&[0.1, 0.2]), None);
    }
}
