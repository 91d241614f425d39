//! Open-circuit-voltage lookup over state of charge and temperature.
//!
//! The table is a bilinear grid: SOC breakpoints (percent) along rows and
//! temperature breakpoints (°C) along columns, both ascending. Queries outside
//! the grid are clamped to its edges.

use std::sync::{Arc, LazyLock};

use ndarray::Array2;

use crate::error::{BatteryError, Result};

/// SOC breakpoints of the reference LFP calibration, percent.
pub const SOC_BREAKPOINTS: [f64; 21] = [
    0.0, 5.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 55.0, 60.0, 65.0, 70.0, 75.0,
    80.0, 85.0, 90.0, 95.0, 100.0,
];

/// Temperature breakpoints of the reference LFP calibration, °C.
pub const TEMPERATURE_BREAKPOINTS: [f64; 7] = [-10.0, 0.0, 10.0, 15.0, 25.0, 35.0, 45.0];

/// Reference OCV samples in volts, rows from SOC = 100 % down to 0 %,
/// columns in `TEMPERATURE_BREAKPOINTS` order.
#[rustfmt::skip]
const LFP_OCV_DESCENDING: [[f64; 7]; 21] = [
    [3.361, 3.335, 3.340, 3.352, 3.375, 3.354, 3.334], // 100 %
    [3.320, 3.319, 3.325, 3.326, 3.329, 3.330, 3.331],
    [3.309, 3.318, 3.324, 3.325, 3.328, 3.329, 3.331],
    [3.309, 3.318, 3.324, 3.325, 3.328, 3.329, 3.331],
    [3.309, 3.318, 3.324, 3.325, 3.328, 3.329, 3.331],
    [3.309, 3.318, 3.324, 3.325, 3.328, 3.329, 3.331],
    [3.304, 3.314, 3.323, 3.324, 3.327, 3.329, 3.330],
    [3.293, 3.304, 3.316, 3.319, 3.324, 3.325, 3.327],
    [3.292, 3.293, 3.298, 3.302, 3.310, 3.306, 3.301],
    [3.285, 3.285, 3.288, 3.290, 3.294, 3.295, 3.297],
    [3.280, 3.282, 3.285, 3.287, 3.290, 3.293, 3.296], // 50 %
    [3.277, 3.280, 3.284, 3.285, 3.289, 3.292, 3.295],
    [3.276, 3.279, 3.283, 3.285, 3.288, 3.291, 3.294],
    [3.274, 3.279, 3.282, 3.284, 3.288, 3.290, 3.293],
    [3.273, 3.277, 3.280, 3.281, 3.284, 3.280, 3.277],
    [3.272, 3.273, 3.272, 3.272, 3.272, 3.267, 3.261],
    [3.270, 3.264, 3.258, 3.256, 3.253, 3.248, 3.242],
    [3.266, 3.250, 3.236, 3.234, 3.230, 3.223, 3.217],
    [3.259, 3.230, 3.215, 3.213, 3.210, 3.205, 3.201],
    [3.246, 3.209, 3.188, 3.186, 3.180, 3.149, 3.117],
    [3.227, 3.175, 3.072, 3.024, 2.928, 2.830, 2.732], // 0 %
];

static LFP_REFERENCE: LazyLock<Arc<OcvTable>> = LazyLock::new(|| {
    let rows = SOC_BREAKPOINTS.len();
    let samples = Array2::from_shape_fn((rows, TEMPERATURE_BREAKPOINTS.len()), |(i, j)| {
        LFP_OCV_DESCENDING[rows - 1 - i][j]
    });
    Arc::new(OcvTable {
        soc_levels: SOC_BREAKPOINTS.to_vec(),
        temperatures: TEMPERATURE_BREAKPOINTS.to_vec(),
        samples,
    })
});

#[derive(Debug, Clone, PartialEq)]
pub struct OcvTable {
    soc_levels: Vec<f64>,
    temperatures: Vec<f64>,
    /// Indexed `[soc_index, temperature_index]`.
    samples: Array2<f64>,
}

impl OcvTable {
    /// The shared reference LFP calibration.
    pub fn lfp_reference() -> Arc<OcvTable> {
        Arc::clone(&LFP_REFERENCE)
    }

    /// Builds a table from ascending breakpoints and one row of samples per SOC breakpoint.
    pub fn new(
        soc_levels: Vec<f64>,
        temperatures: Vec<f64>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self> {
        check_axis("soc", &soc_levels)?;
        check_axis("temperature", &temperatures)?;

        if rows.len() != soc_levels.len() {
            return Err(BatteryError::Calibration(format!(
                "expected {} soc rows, got {}",
                soc_levels.len(),
                rows.len()
            )));
        }
        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != temperatures.len())
        {
            return Err(BatteryError::Calibration(format!(
                "row {} has {} samples, expected {}",
                i,
                row.len(),
                temperatures.len()
            )));
        }

        let shape = (soc_levels.len(), temperatures.len());
        let samples = Array2::from_shape_vec(shape, rows.into_iter().flatten().collect())
            .map_err(|e| BatteryError::Calibration(e.to_string()))?;

        Ok(OcvTable {
            soc_levels,
            temperatures,
            samples,
        })
    }

    pub fn soc_levels(&self) -> &[f64] {
        &self.soc_levels
    }

    pub fn temperatures(&self) -> &[f64] {
        &self.temperatures
    }

    /// Stored sample at a breakpoint pair, if the indices are in range.
    pub fn sample(&self, soc_index: usize, temperature_index: usize) -> Option<f64> {
        self.samples.get([soc_index, temperature_index]).copied()
    }

    /// Bilinear OCV at `soc_percent` (0..100) and `temperature` (°C).
    ///
    /// A query at the first breakpoint of an axis uses the first segment,
    /// so it reproduces the stored sample rather than stepping below the grid.
    pub fn interpolate(&self, soc_percent: f64, temperature: f64) -> f64 {
        let (soc, i_lo, i_hi) = bracket(&self.soc_levels, soc_percent);
        let (temp, j_lo, j_hi) = bracket(&self.temperatures, temperature);

        let v00 = self.samples[[i_lo, j_lo]];
        let v01 = self.samples[[i_lo, j_hi]];
        let v10 = self.samples[[i_hi, j_lo]];
        let v11 = self.samples[[i_hi, j_hi]];

        let wx = weight(&self.soc_levels, i_lo, i_hi, soc);
        let wy = weight(&self.temperatures, j_lo, j_hi, temp);

        let v0 = v00 + wx * (v10 - v00);
        let v1 = v01 + wx * (v11 - v01);
        v0 + wy * (v1 - v0)
    }
}

fn check_axis(name: &str, breakpoints: &[f64]) -> Result<()> {
    if breakpoints.len() < 2 {
        return Err(BatteryError::Calibration(format!(
            "{} axis needs at least 2 breakpoints, got {}",
            name,
            breakpoints.len()
        )));
    }
    if breakpoints.iter().any(|b| !b.is_finite()) {
        return Err(BatteryError::Calibration(format!(
            "{} axis has non-finite breakpoints",
            name
        )));
    }
    if breakpoints.windows(2).any(|w| w[1] < w[0]) {
        return Err(BatteryError::Calibration(format!(
            "{} axis must be ascending",
            name
        )));
    }
    Ok(())
}

/// Clamps `x` into the axis and returns it with the surrounding breakpoint indices.
fn bracket(axis: &[f64], x: f64) -> (f64, usize, usize) {
    let x = x.clamp(axis[0], axis[axis.len() - 1]);
    // Smallest index whose breakpoint is >= x.
    let hi = axis.partition_point(|&b| b < x).clamp(1, axis.len() - 1);
    (x, hi - 1, hi)
}

fn weight(axis: &[f64], lo: usize, hi: usize, x: f64) -> f64 {
    if axis[hi] == axis[lo] {
        0.0
    } else {
        (x - axis[lo]) / (axis[hi] - axis[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_reference_table_is_ascending_in_soc() {
        let table = OcvTable::lfp_reference();
        // 0 % row, 25 °C column
        assert_eq!(table.sample(0, 4), Some(2.928));
        // 100 % row, 25 °C column
        assert_eq!(table.sample(20, 4), Some(3.375));
        assert_eq!(table.sample(21, 0), None);
    }

    #[test]
    fn test_reference_table_is_shared() {
        let a = OcvTable::lfp_reference();
        let b = OcvTable::lfp_reference();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_exact_at_every_breakpoint() {
        let table = OcvTable::lfp_reference();
        for (i, &soc) in SOC_BREAKPOINTS.iter().enumerate() {
            for (j, &temp) in TEMPERATURE_BREAKPOINTS.iter().enumerate() {
                assert_eq!(
                    table.interpolate(soc, temp),
                    table.sample(i, j).unwrap(),
                    "soc={} temp={}",
                    soc,
                    temp
                );
            }
        }
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let table = OcvTable::lfp_reference();
        assert_eq!(table.interpolate(150.0, 25.0), table.interpolate(100.0, 25.0));
        assert_eq!(table.interpolate(-20.0, 25.0), table.interpolate(0.0, 25.0));
        assert_eq!(table.interpolate(50.0, 80.0), table.interpolate(50.0, 45.0));
        assert_eq!(table.interpolate(50.0, -40.0), table.interpolate(50.0, -10.0));
        assert_eq!(table.interpolate(-5.0, -40.0), table.sample(0, 0).unwrap());
    }

    #[test]
    fn test_midpoint_along_soc() {
        let table = OcvTable::lfp_reference();
        // Between 0 % (2.928) and 5 % (3.180) at 25 °C
        assert_abs_diff_eq!(table.interpolate(2.5, 25.0), (2.928 + 3.180) / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_bilinear_center_of_cell() {
        let table = OcvTable::lfp_reference();
        // SOC 0..5 %, temperature 15..25 °C
        let expected = (3.024 + 2.928 + 3.186 + 3.180) / 4.0;
        assert_abs_diff_eq!(table.interpolate(2.5, 20.0), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_custom_table() {
        let table = OcvTable::new(
            vec![0.0, 100.0],
            vec![0.0, 20.0],
            vec![vec![3.0, 3.2], vec![3.4, 3.6]],
        )
        .unwrap();
        assert_abs_diff_eq!(table.interpolate(50.0, 10.0), 3.3, epsilon = 1e-12);
    }

    #[test]
    fn test_coincident_breakpoints_use_zero_weight() {
        let table = OcvTable::new(
            vec![50.0, 50.0],
            vec![0.0, 20.0],
            vec![vec![3.0, 3.2], vec![3.4, 3.6]],
        )
        .unwrap();
        assert_abs_diff_eq!(table.interpolate(50.0, 10.0), 3.1, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_row_count_mismatch() {
        let result = OcvTable::new(vec![0.0, 100.0], vec![0.0, 20.0], vec![vec![3.0, 3.2]]);
        assert!(matches!(result, Err(BatteryError::Calibration(_))));
    }

    #[test]
    fn test_rejects_short_row() {
        let result = OcvTable::new(
            vec![0.0, 100.0],
            vec![0.0, 20.0],
            vec![vec![3.0, 3.2], vec![3.4]],
        );
        assert!(matches!(result, Err(BatteryError::Calibration(_))));
    }

    #[test]
    fn test_rejects_descending_axis() {
        let result = OcvTable::new(
            vec![100.0, 0.0],
            vec![0.0, 20.0],
            vec![vec![3.0, 3.2], vec![3.4, 3.6]],
        );
        assert!(matches!(result, Err(BatteryError::Calibration(_))));
    }

    #[test]
    fn test_rejects_single_breakpoint() {
        let result = OcvTable::new(vec![0.0], vec![0.0, 20.0], vec![vec![3.0, 3.2]]);
        assert!(matches!(result, Err(BatteryError::Calibration(_))));
    }
}
