//! Rectangular material-id snapshots used for grid export/import,
//! copy/paste, and the `sync_world` wire frame.

use silt_core::Material;

/// A rectangle of material ids, row-major with x outer and y inner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionSnapshot {
    /// Rectangle width in cells.
    pub width: u32,
    /// Rectangle height in cells.
    pub height: u32,
    /// Material ids, `width * height` entries.
    pub ids: Vec<Material>,
}

impl RegionSnapshot {
    /// The material at `(x, y)` within the snapshot; out-of-range reads
    /// as air.
    pub fn get(&self, x: i32, y: i32) -> Material {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return Material::Air;
        }
        self.ids[(x as usize) * (self.height as usize) + (y as usize)]
    }

    /// Number of cells in the snapshot.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the snapshot holds no cells.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_is_x_outer_y_inner() {
        let snapshot = RegionSnapshot {
            width: 2,
            height: 3,
            ids: vec![
                Material::Stone,
                Material::Sand,
                Material::Water,
                Material::Air,
                Material::Iron,
                Material::Wood,
            ],
        };
        assert_eq!(snapshot.get(0, 0), Material::Stone);
        assert_eq!(snapshot.get(0, 2), Material::Water);
        assert_eq!(snapshot.get(1, 1), Material::Iron);
        assert_eq!(snapshot.get(2, 0), Material::Air);
        assert_eq!(snapshot.get(-1, 0), Material::Air);
    }
}
