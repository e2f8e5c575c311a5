// Horizontal bar chart of per-relay rates, rendered to PNG bytes in memory.
// Relays with a missing sample keep their label but get no bar.

use crate::models::SampleCount;
use anyhow::Context;
use image::ImageFormat;
use plotters::prelude::*;
use std::io::Cursor;

pub trait ChartRenderer: Send + Sync {
    fn render(&self, title: &str, entries: &[(String, SampleCount)]) -> anyhow::Result<Vec<u8>>;
}

const WIDTH: u32 = 1200;
const HEIGHT: u32 = 600;
const BAR_COLOR: RGBColor = RGBColor(0x58, 0xB2, 0xDC);

pub struct BarChartRenderer;

fn draw_err<E: std::fmt::Display>(e: E) -> anyhow::Error {
    anyhow::anyhow!("chart render: {e}")
}

impl ChartRenderer for BarChartRenderer {
    fn render(&self, title: &str, entries: &[(String, SampleCount)]) -> anyhow::Result<Vec<u8>> {
        anyhow::ensure!(!entries.is_empty(), "nothing to chart");

        let names: Vec<String> = entries.iter().map(|(name, _)| name.clone()).collect();
        let max = entries
            .iter()
            .filter_map(|(_, count)| count.known())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut buf = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buf, (WIDTH, HEIGHT)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 36))
                .margin(20)
                .x_label_area_size(50)
                .y_label_area_size(240)
                .build_cartesian_2d(
                    0u64..max + max / 10 + 1,
                    (0..entries.len()).into_segmented(),
                )
                .map_err(draw_err)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("posts / 10 min")
                .y_label_formatter(&|seg| match seg {
                    SegmentValue::CenterOf(i) | SegmentValue::Exact(i) => {
                        names.get(*i).cloned().unwrap_or_default()
                    }
                    SegmentValue::Last => String::new(),
                })
                .label_style(("sans-serif", 20))
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(entries.iter().enumerate().filter_map(|(i, (_, count))| {
                    count.known().map(|value| {
                        Rectangle::new(
                            [
                                (0u64, SegmentValue::Exact(i)),
                                (value, SegmentValue::Exact(i + 1)),
                            ],
                            BAR_COLOR.filled(),
                        )
                    })
                }))
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        let img =
            image::RgbImage::from_raw(WIDTH, HEIGHT, buf).context("chart buffer size mismatch")?;
        let mut png = Vec::new();
        img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
        Ok(png)
    }
}
