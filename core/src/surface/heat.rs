use ndarray::Array2;

/// Screen-space density grid behind the heat layer.
///
/// Points are binned into square cells of `cell_size` pixels; intensities are
/// normalized so the densest cell reads 1.0.
#[derive(Debug, Clone)]
pub struct HeatGrid {
    cells: Array2<f32>,
    cell_size: f32,
}

impl HeatGrid {
    pub fn accumulate<I>(points: I, width: f32, height: f32, cell_size: f32) -> Self
    where
        I: IntoIterator<Item = (f32, f32)>,
    {
        let cell_size = cell_size.max(1.0);
        let cols = (width / cell_size).ceil().max(1.0) as usize;
        let rows = (height / cell_size).ceil().max(1.0) as usize;
        let mut cells = Array2::<f32>::zeros((rows, cols));

        for (x, y) in points {
            if !(0.0..width).contains(&x) || !(0.0..height).contains(&y) {
                continue;
            }
            let col = ((x / cell_size) as usize).min(cols - 1);
            let row = ((y / cell_size) as usize).min(rows - 1);
            cells[[row, col]] += 1.0;
        }

        let peak = cells.iter().cloned().fold(0.0, f32::max);
        if peak > 0.0 {
            cells.mapv_inplace(|count| count / peak);
        }

        Self { cells, cell_size }
    }

    pub fn intensity(&self, row: usize, col: usize) -> f32 {
        self.cells.get((row, col)).copied().unwrap_or(0.0)
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Non-empty cells as (top-left x, top-left y, intensity).
    pub fn hot_cells(&self) -> impl Iterator<Item = (f32, f32, f32)> + '_ {
        self.cells
            .indexed_iter()
            .filter(|(_, intensity)| **intensity > 0.0)
            .map(move |((row, col), &intensity)| {
                (
                    col as f32 * self.cell_size,
                    row as f32 * self.cell_size,
                    intensity,
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn densest_cell_is_normalized_to_one() {
        let grid = HeatGrid::accumulate(
            vec![(1.0, 1.0), (2.0, 2.0), (15.0, 1.0)],
            20.0,
            20.0,
            10.0,
        );
        assert_eq!(grid.intensity(0, 0), 1.0);
        assert_eq!(grid.intensity(0, 1), 0.5);
        assert_eq!(grid.hot_cells().count(), 2);
    }

    #[test]
    fn offscreen_points_are_ignored() {
        let grid = HeatGrid::accumulate(vec![(-5.0, 3.0), (50.0, 3.0)], 20.0, 20.0, 10.0);
        assert_eq!(grid.hot_cells().count(), 0);
    }
}
