use electrical::LfpBattery;
use electrical::analysis::{Profile, simulate_profile};
use plotters::prelude::*;

fn range_of(values: &[f64]) -> (f64, f64) {
    let min = values.iter().cloned().fold(f64::INFINITY, |a, b| a.min(b));
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, |a, b| a.max(b));
    // Flat series (e.g. SOC pinned at 1.0) still need a non-empty axis
    let pad = ((max - min) * 0.05).max(1e-3);
    (min - pad, max + pad)
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    y_label: &str,
    x: &[f64],
    y: &[f64],
    color: &RGBColor,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (x_min, x_max) = range_of(x);
    let (y_min, y_max) = range_of(y);

    let mut chart = ChartBuilder::on(area)
        .margin(10)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc(y_label)
        .draw()?;

    chart.draw_series(LineSeries::new(
        x.iter().cloned().zip(y.iter().cloned()),
        color,
    ))?;

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 52 Ah cell: one hour charging at 26 A, then one hour at rest
    let mut battery = LfpBattery::new(52.0, 25.0)?;
    let trace = simulate_profile(&mut battery, &Profile::default(), 1.0)?;

    let filename = "simulation_plot.png";
    let root = BitMapBackend::new(filename, (1400, 1000)).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled("LFP cell: charge then rest", ("sans-serif", 28))?;

    let panels = root.split_evenly((3, 1));
    draw_panel(&panels[0], "Terminal Voltage (V)", &trace.times, &trace.voltages, &BLUE)?;
    draw_panel(&panels[1], "SOC", &trace.times, &trace.soc, &GREEN)?;
    draw_panel(&panels[2], "Hysteresis State (h)", &trace.times, &trace.hysteresis, &RED)?;

    root.present()?;
    println!("Wrote {}", filename);
    Ok(())
}
