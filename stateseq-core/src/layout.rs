//! Pixel geometry for one category of a state sequence chart.
//!
//! A [`ChartLayout`] is the render command handed to renderers. It is built
//! once per draw from a [`Dataset`] and can be re-placed for a new size
//! without touching the dataset again.

use serde::{Deserialize, Serialize};

use crate::scale::{format_tick, LinearScale};
use crate::{CategoryDomain, ChartConfig, ChartError, Dataset, Margins};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AxisOrient {
    Top,
    Left,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tick {
    pub value: f64,
    /// Pixel offset along the axis.
    pub offset: f64,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisLayout {
    pub orient: AxisOrient,
    /// Axis line length in pixels.
    pub length: f64,
    pub ticks: Vec<Tick>,
}

/// One state rectangle, positioned inside its column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RectLayout {
    pub state: String,
    pub start: f64,
    pub duration: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
}

/// One sequence drawn as a vertical column of states.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ColumnLayout {
    pub sequence_id: String,
    pub x: f64,
    pub y: f64,
    pub rects: Vec<RectLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartLayout {
    pub category: String,
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub domain: CategoryDomain,
    pub x_scale: LinearScale,
    pub y_scale: LinearScale,
    pub x_axis: AxisLayout,
    pub y_axis: AxisLayout,
    pub columns: Vec<ColumnLayout>,
    column_fill: f64,
    rect_gap: f64,
    y_tick_count: usize,
}

impl ChartLayout {
    /// Lay out every record of `category` for a `width` x `height` chart.
    pub fn build(
        dataset: &Dataset,
        category: &str,
        width: f64,
        height: f64,
        config: &ChartConfig,
    ) -> Result<Self, ChartError> {
        let domain = *dataset
            .domain(category)
            .ok_or_else(|| ChartError::UnknownCategory(category.to_string()))?;

        let columns = dataset
            .records(category)
            .iter()
            .map(|record| ColumnLayout {
                sequence_id: record.sequence_id.clone(),
                x: 0.0,
                y: 0.0,
                rects: record
                    .states
                    .iter()
                    .map(|entry| RectLayout {
                        state: entry.state.clone(),
                        start: entry.start,
                        duration: entry.duration,
                        y: 0.0,
                        width: 0.0,
                        height: 0.0,
                        fill: config.fill_for(&entry.state).to_string(),
                    })
                    .collect(),
            })
            .collect();

        let mut layout = Self {
            category: category.to_string(),
            width,
            height,
            margins: config.margins,
            canvas_width: 0.0,
            canvas_height: 0.0,
            domain,
            x_scale: LinearScale::from_extent(domain.x, (0.0, 0.0)),
            y_scale: LinearScale::from_extent(domain.y, (0.0, 0.0)),
            x_axis: AxisLayout {
                orient: AxisOrient::Top,
                length: 0.0,
                ticks: Vec::new(),
            },
            y_axis: AxisLayout {
                orient: AxisOrient::Left,
                length: 0.0,
                ticks: Vec::new(),
            },
            columns,
            column_fill: config.column_fill,
            rect_gap: config.rect_gap,
            y_tick_count: config.y_tick_count,
        };
        layout.place(width, height);
        Ok(layout)
    }

    /// Recompute scales and element geometry for a new size.
    ///
    /// Columns and rectangles keep their data; only positions change.
    pub fn place(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.canvas_width = (width - self.margins.left - self.margins.right).max(0.0);
        self.canvas_height = (height - self.margins.top - self.margins.bottom).max(0.0);

        let x_scale = LinearScale::from_extent(self.domain.x, (0.0, self.canvas_width));
        let y_scale = LinearScale::from_extent(self.domain.y, (0.0, self.canvas_height));

        self.x_axis.length = self.canvas_width;
        self.y_axis.length = self.canvas_height;
        self.y_axis.ticks = y_scale
            .ticks(self.y_tick_count)
            .into_iter()
            .map(|value| Tick {
                value,
                offset: y_scale.apply(value),
                label: format_tick(value),
            })
            .collect();

        let column_width = x_scale.span(self.column_fill);
        let column_top = y_scale.range.0;
        for (index, column) in self.columns.iter_mut().enumerate() {
            column.x = x_scale.apply(index as f64);
            column.y = column_top;
            for rect in &mut column.rects {
                rect.y = y_scale.apply(rect.start);
                rect.height = (y_scale.span(rect.duration) - self.rect_gap).max(0.0);
                rect.width = column_width;
            }
        }

        self.x_scale = x_scale;
        self.y_scale = y_scale;
    }

    /// Copy of this layout placed for a new size.
    pub fn resized(&self, width: f64, height: f64) -> Self {
        let mut next = self.clone();
        next.place(width, height);
        next
    }

    pub fn rect_count(&self) -> usize {
        self.columns.iter().map(|column| column.rects.len()).sum()
    }
}
