mod layout;
mod panel;

pub use layout::{AxisRange, Rect, StackLayout};
pub use panel::{
    CONNECTIONS_AXIS_LABEL, CONNECTIONS_TITLE, LATENCY_AXIS_LABEL, LATENCY_TITLE, PanelDescriptor,
    TIME_AXIS_LABEL, measurement_panels,
};

use crate::{error::MonitorError, measurement::MeasurementLog, sink::ChartSink};
use plotters::{coord::Shift, prelude::*};
use resvg::{tiny_skia, usvg};
use std::sync::Arc;

pub const BASE_WIDTH: u32 = 800;
pub const PADDING: u32 = 10;

const FONT_FAMILY: &str = "sans-serif";
const TITLE_FONT_SIZE: f64 = 28.0;
const AXIS_DESC_FONT_SIZE: f64 = 18.0;
const TICK_FONT_SIZE: f64 = 14.0;
const PANEL_MARGIN: u32 = 12;
const X_LABEL_AREA: u32 = 50;
// Same for every panel so the plot areas line up on the shared time axis.
const Y_LABEL_AREA: u32 = 80;
const MARKER_RADIUS: u32 = 3;
const SERIES_COLOR: RGBColor = RGBColor(31, 119, 180);

const SANS_SERIF_CANDIDATES: [&str; 5] = [
    "DejaVu Sans",
    "Liberation Sans",
    "Noto Sans",
    "Arial",
    "Helvetica",
];

/// Turns a [`MeasurementLog`] into a PNG with one panel per series.
pub struct ChartRenderer {
    layout: StackLayout,
    fonts: Arc<usvg::fontdb::Database>,
}

impl Default for ChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl ChartRenderer {
    /// Renderer for the standard 800x1600 canvas. Loads the system fonts once.
    #[must_use]
    pub fn new() -> Self {
        Self::with_layout(StackLayout::tall(BASE_WIDTH, PADDING))
    }

    #[must_use]
    pub fn with_layout(layout: StackLayout) -> Self {
        Self {
            layout,
            fonts: Arc::new(system_fonts()),
        }
    }

    #[must_use]
    pub const fn layout(&self) -> StackLayout {
        self.layout
    }

    /// Renders `log` and hands the PNG to `sink`. Nothing reaches the sink if
    /// rendering fails.
    ///
    /// # Errors
    /// Returns [`MonitorError::EmptyLog`] for an empty log, otherwise any
    /// render or sink error.
    pub fn render_to<S: ChartSink + ?Sized>(
        &self,
        log: &MeasurementLog,
        sink: &mut S,
    ) -> Result<(), MonitorError> {
        let png = self.render(log)?;
        sink.write_chart(&png)
    }

    /// Renders `log` to PNG bytes.
    ///
    /// # Errors
    /// Returns [`MonitorError::EmptyLog`] for an empty log and
    /// [`MonitorError::Render`] when drawing or encoding fails.
    pub fn render(&self, log: &MeasurementLog) -> Result<Vec<u8>, MonitorError> {
        let svg = self.render_svg(log)?;
        self.rasterize(&svg)
    }

    /// Vector form of the chart. Identical logs give identical documents.
    ///
    /// # Errors
    /// Same as [`ChartRenderer::render`].
    pub fn render_svg(&self, log: &MeasurementLog) -> Result<String, MonitorError> {
        let panels = measurement_panels(log)?;
        self.draw_panels(&panels)
    }

    /// Draws `panels` top to bottom on one canvas. Every panel gets the same
    /// time range, and each one scales its own y-axis.
    ///
    /// # Errors
    /// Returns [`MonitorError::Render`] if the layout or any drawing call fails.
    pub fn draw_panels(&self, panels: &[PanelDescriptor]) -> Result<String, MonitorError> {
        let rects = self.layout.panel_rects(panels.len())?;
        let time = AxisRange::shared_time(panels);

        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, (self.layout.width(), self.layout.height()))
                .into_drawing_area();
            root.fill(&WHITE).map_err(MonitorError::render)?;
            for (panel, rect) in panels.iter().zip(rects) {
                let area = root
                    .clone()
                    .shrink((rect.x, rect.y), (rect.width, rect.height));
                draw_panel(&area, panel, time)?;
            }
            root.present().map_err(MonitorError::render)?;
        }
        Ok(svg)
    }

    fn rasterize(&self, svg: &str) -> Result<Vec<u8>, MonitorError> {
        let mut options = usvg::Options::default();
        options.fontdb = Arc::clone(&self.fonts);
        let tree = usvg::Tree::from_str(svg, &options).map_err(MonitorError::render)?;

        let size = tree.size().to_int_size();
        let mut pixmap = tiny_skia::Pixmap::new(size.width(), size.height()).ok_or_else(|| {
            MonitorError::Render(format!(
                "cannot allocate {}x{} canvas",
                size.width(),
                size.height()
            ))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);
        resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
        pixmap.encode_png().map_err(MonitorError::render)
    }
}

fn draw_panel(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    panel: &PanelDescriptor,
    time: AxisRange,
) -> Result<(), MonitorError> {
    let values = AxisRange::fit(panel.points().iter().map(|(_, v)| *v)).unwrap_or(AxisRange::UNIT);

    let mut chart = ChartBuilder::on(area)
        .caption(panel.title(), (FONT_FAMILY, TITLE_FONT_SIZE).into_font())
        .margin(PANEL_MARGIN)
        .x_label_area_size(X_LABEL_AREA)
        .y_label_area_size(Y_LABEL_AREA)
        .build_cartesian_2d(time.min..time.max, values.min..values.max)
        .map_err(MonitorError::render)?;

    chart
        .configure_mesh()
        .x_desc(panel.x_label())
        .y_desc(panel.y_label())
        .axis_desc_style((FONT_FAMILY, AXIS_DESC_FONT_SIZE).into_font())
        .label_style((FONT_FAMILY, TICK_FONT_SIZE).into_font())
        .draw()
        .map_err(MonitorError::render)?;

    chart
        .draw_series(LineSeries::new(
            panel.points().iter().copied(),
            SERIES_COLOR.stroke_width(2),
        ))
        .map_err(MonitorError::render)?;
    chart
        .draw_series(
            panel
                .points()
                .iter()
                .map(|&point| Circle::new(point, MARKER_RADIUS, SERIES_COLOR.filled())),
        )
        .map_err(MonitorError::render)?;
    Ok(())
}

/// Loads system fonts and points the generic sans-serif family at one that is
/// actually installed. Without any font the chart renders without text.
fn system_fonts() -> usvg::fontdb::Database {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();

    let installed = |name: &str| {
        db.faces()
            .any(|face| face.families.iter().any(|(family, _)| family == name))
    };
    let family = SANS_SERIF_CANDIDATES
        .into_iter()
        .find(|name| installed(*name))
        .map(str::to_string)
        .or_else(|| {
            db.faces()
                .find_map(|face| face.families.first().map(|(family, _)| family.clone()))
        });

    match family {
        Some(family) => {
            log::debug!("using {family:?} for chart text ({} faces loaded)", db.len());
            db.set_sans_serif_family(family);
        }
        None => log::warn!("No system fonts found, chart labels will be missing"),
    }
    db
}
