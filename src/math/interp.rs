use crate::math::array::NdArray;
use crate::utils::error::{PropError, Result};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpMethod {
    #[default]
    Linear,
    Nearest,
}

impl InterpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpMethod::Linear => "linear",
            InterpMethod::Nearest => "nearest",
        }
    }

    fn min_points(&self) -> usize {
        match self {
            InterpMethod::Linear => 2,
            InterpMethod::Nearest => 1,
        }
    }
}

impl FromStr for InterpMethod {
    type Err = PropError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "slinear" => Ok(InterpMethod::Linear),
            "nearest" => Ok(InterpMethod::Nearest),
            other => Err(PropError::invalid_field(
                "!table",
                "method",
                format!("unsupported interpolation method '{}' (linear, nearest)", other),
            )),
        }
    }
}

impl fmt::Display for InterpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpolation on a rectilinear grid in any number of dimensions. Points
/// outside the grid evaluate to NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInterpolator {
    grid: Vec<Vec<f64>>,
    values: NdArray,
    method: InterpMethod,
}

impl GridInterpolator {
    pub fn new(grid: Vec<Vec<f64>>, values: NdArray, method: InterpMethod) -> Result<Self> {
        if grid.len() != values.ndim() {
            return Err(PropError::shape(format!(
                "{} grid axes for a {}-dimensional table",
                grid.len(),
                values.ndim()
            )));
        }

        let mut grid = grid;
        let mut values = values;
        for axis in 0..grid.len() {
            let points = &grid[axis];
            if points.len() != values.shape()[axis] {
                return Err(PropError::shape(format!(
                    "axis {} has {} grid points but the table has {}",
                    axis,
                    points.len(),
                    values.shape()[axis]
                )));
            }
            if points.len() < method.min_points() {
                return Err(PropError::shape(format!(
                    "axis {} has {} point(s), {} interpolation needs at least {}",
                    axis,
                    points.len(),
                    method,
                    method.min_points()
                )));
            }

            let ascending = points.windows(2).all(|w| w[0] < w[1]);
            let descending = points.windows(2).all(|w| w[0] > w[1]);
            if !ascending {
                if !descending {
                    return Err(PropError::shape(format!(
                        "axis {} grid must be strictly monotonic",
                        axis
                    )));
                }
                grid[axis].reverse();
                values = values.reverse_axis(axis);
            }
        }

        Ok(Self {
            grid,
            values,
            method,
        })
    }

    pub fn ndim(&self) -> usize {
        self.grid.len()
    }

    pub fn grid(&self) -> &[Vec<f64>] {
        &self.grid
    }

    pub fn method(&self) -> InterpMethod {
        self.method
    }

    /// Table values, reordered to match ascending grid axes.
    pub fn values(&self) -> &NdArray {
        &self.values
    }

    /// Interpolates a single point with one coordinate per axis.
    pub fn interpolate_point(&self, point: &[f64]) -> f64 {
        let mut cells = Vec::with_capacity(point.len());
        for (axis, &x) in self.grid.iter().zip(point) {
            match locate(axis, x) {
                Some(cell) => cells.push(cell),
                None => return f64::NAN,
            }
        }

        match self.method {
            InterpMethod::Nearest => {
                let index: Vec<usize> = cells
                    .iter()
                    .map(|&(i, t)| if t <= 0.5 { i } else { i + 1 })
                    .collect();
                self.value_at(&index)
            }
            InterpMethod::Linear => {
                let mut total = 0.0;
                let mut index = vec![0usize; cells.len()];
                for corner in 0..(1usize << cells.len()) {
                    let mut weight = 1.0;
                    for (axis, &(i, t)) in cells.iter().enumerate() {
                        if corner & (1 << axis) == 0 {
                            weight *= 1.0 - t;
                            index[axis] = i;
                        } else {
                            weight *= t;
                            index[axis] = i + 1;
                        }
                    }
                    if weight != 0.0 {
                        total += weight * self.value_at(&index);
                    }
                }
                total
            }
        }
    }

    fn value_at(&self, index: &[usize]) -> f64 {
        let shape = self.values.shape();
        let mut flat = 0;
        for (axis, &i) in index.iter().enumerate() {
            // single-point axes only appear with nearest interpolation
            flat = flat * shape[axis] + i.min(shape[axis] - 1);
        }
        self.values.as_slice()[flat]
    }
}

/// Lower cell index and fractional position of `x` on an ascending axis.
fn locate(axis: &[f64], x: f64) -> Option<(usize, f64)> {
    if x.is_nan() || x < axis[0] || x > axis[axis.len() - 1] {
        return None;
    }
    if axis.len() == 1 {
        return Some((0, 0.0));
    }
    let upper = axis.partition_point(|&g| g <= x).min(axis.len() - 1).max(1);
    let i = upper - 1;
    let t = (x - axis[i]) / (axis[i + 1] - axis[i]);
    Some((i, t))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_2d() -> GridInterpolator {
        // f(x, y) = x + 10 y
        let values = NdArray::from_shape_vec(vec![2, 3], vec![0.0, 10.0, 20.0, 1.0, 11.0, 21.0])
            .unwrap();
        GridInterpolator::new(
            vec![vec![0.0, 1.0], vec![0.0, 1.0, 2.0]],
            values,
            InterpMethod::Linear,
        )
        .unwrap()
    }

    #[test]
    fn test_linear_is_exact_for_bilinear_data() {
        let interp = table_2d();
        assert!((interp.interpolate_point(&[0.25, 1.5]) - 15.25).abs() < 1e-12);
        assert!((interp.interpolate_point(&[1.0, 2.0]) - 21.0).abs() < 1e-12);
    }

    #[test]
    fn test_outside_grid_is_nan() {
        assert!(table_2d().interpolate_point(&[1.5, 0.0]).is_nan());
    }

    #[test]
    fn test_nearest_ties_go_to_lower_point() {
        let interp = GridInterpolator::new(
            vec![vec![0.0, 1.0, 2.0]],
            NdArray::from_vec(vec![5.0, 6.0, 7.0]),
            InterpMethod::Nearest,
        )
        .unwrap();
        assert_eq!(interp.interpolate_point(&[0.5]), 5.0);
        assert_eq!(interp.interpolate_point(&[0.51]), 6.0);
        assert_eq!(interp.interpolate_point(&[2.0]), 7.0);
    }

    #[test]
    fn test_descending_grid_is_flipped() {
        let interp = GridInterpolator::new(
            vec![vec![2.0, 1.0, 0.0]],
            NdArray::from_vec(vec![20.0, 10.0, 0.0]),
            InterpMethod::Linear,
        )
        .unwrap();
        assert_eq!(interp.grid()[0], vec![0.0, 1.0, 2.0]);
        assert!((interp.interpolate_point(&[1.5]) - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_non_monotonic_grid_is_rejected() {
        let result = GridInterpolator::new(
            vec![vec![0.0, 2.0, 1.0]],
            NdArray::from_vec(vec![0.0, 1.0, 2.0]),
            InterpMethod::Linear,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_grid_length_mismatch() {
        let result = GridInterpolator::new(
            vec![vec![0.0, 1.0]],
            NdArray::from_vec(vec![0.0, 1.0, 2.0]),
            InterpMethod::Linear,
        );
        assert!(matches!(result, Err(PropError::ShapeError { .. })));
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("slinear".parse::<InterpMethod>().unwrap(), InterpMethod::Linear);
        assert_eq!("Nearest".parse::<InterpMethod>().unwrap(), InterpMethod::Nearest);
        assert!("cubic".parse::<InterpMethod>().is_err());
    }
}
