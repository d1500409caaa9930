//! SVG renderer writing straight into the page DOM.

use stateseq_core::layout::AxisOrient;
use stateseq_core::{AxisLayout, ChartError, ChartLayout, ChartRenderer};
use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

const SVG_NS: &str = "http://www.w3.org/2000/svg";
const AXIS_PATH_STYLE: &str = "fill:none;stroke:black;shape-rendering:crispEdges";
const AXIS_TEXT_STYLE: &str = "font-family:sans-serif;font-size:10px";
const TICK_SIZE: f64 = 6.0;

struct ColumnNodes {
    group: Element,
    rects: Vec<Element>,
}

/// Nodes created under the chart's `<svg>` element.
struct Mounted {
    svg: Element,
    canvas: Element,
    data_canvas: Element,
    axes: Vec<Element>,
    columns: Vec<ColumnNodes>,
}

pub(crate) struct DomRenderer {
    id: String,
    document: Document,
    mounted: Option<Mounted>,
}

impl DomRenderer {
    pub(crate) fn new(id: impl Into<String>, document: Document) -> Self {
        Self {
            id: id.into(),
            document,
            mounted: None,
        }
    }

    fn target(&self) -> Result<Element, ChartError> {
        self.document
            .get_element_by_id(&self.id)
            .ok_or_else(|| ChartError::Render(format!("no element with id `{}`", self.id)))
    }

    /// Width of the element holding the chart, for dynamic sizing.
    pub(crate) fn container_width(&self) -> Option<f64> {
        let target = self.target().ok()?;
        let parent = target.parent_element()?;
        Some(f64::from(parent.client_width()))
    }

    /// Clear the target `<svg>` and create the canvas groups.
    pub(crate) fn mount(&mut self, width: f64, height: f64) -> Result<(), ChartError> {
        let svg = self.target()?;
        if !svg.tag_name().eq_ignore_ascii_case("svg") {
            return Err(ChartError::Render(format!(
                "element `{}` is a <{}>, expected <svg>",
                self.id,
                svg.tag_name()
            )));
        }
        set_attrs(
            &svg,
            &[("width", width.to_string()), ("height", height.to_string())],
        )?;
        svg.set_inner_html("");

        let canvas = self.create("g")?;
        set_attrs(
            &canvas,
            &[
                ("id", format!("StateSequenceVisualization-canvas-{}", self.id)),
                ("class", "StateSequenceVisualization-canvas".to_string()),
            ],
        )?;
        let data_canvas = self.create("g")?;
        set_attrs(
            &data_canvas,
            &[
                (
                    "id",
                    format!("StateSequenceVisualization-data_canvas-{}", self.id),
                ),
                ("class", "StateSequenceVisualization-data_canvas".to_string()),
            ],
        )?;
        append(&canvas, &data_canvas)?;
        append(&svg, &canvas)?;

        self.mounted = Some(Mounted {
            svg,
            canvas,
            data_canvas,
            axes: Vec::new(),
            columns: Vec::new(),
        });
        Ok(())
    }

    fn create(&self, tag: &str) -> Result<Element, ChartError> {
        self.document
            .create_element_ns(Some(SVG_NS), tag)
            .map_err(js_error)
    }

    fn mounted(&self) -> Result<&Mounted, ChartError> {
        self.mounted
            .as_ref()
            .ok_or_else(|| ChartError::Render("renderer is not mounted".to_string()))
    }

    /// Size the svg, shift the canvas by the margins and rebuild both axes.
    fn frame(&mut self, layout: &ChartLayout) -> Result<(), ChartError> {
        let mounted = self.mounted()?;
        set_attrs(
            &mounted.svg,
            &[
                ("width", layout.width.to_string()),
                ("height", layout.height.to_string()),
            ],
        )?;
        set_attrs(
            &mounted.canvas,
            &[(
                "transform",
                translate(layout.margins.left, layout.margins.top),
            )],
        )?;

        let y_axis = self.build_axis(&layout.y_axis, "y_axis")?;
        let x_axis = self.build_axis(&layout.x_axis, "x_axis")?;

        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        for axis in mounted.axes.drain(..) {
            axis.remove();
        }
        append(&mounted.canvas, &y_axis)?;
        append(&mounted.canvas, &x_axis)?;
        mounted.axes = vec![y_axis, x_axis];
        Ok(())
    }

    fn build_axis(&self, axis: &AxisLayout, class: &str) -> Result<Element, ChartError> {
        let group = self.create("g")?;
        set_attrs(
            &group,
            &[
                ("class", format!("axis {class}")),
                (
                    "id",
                    format!("StateSequenceVisualization-{class}-{}", self.id),
                ),
            ],
        )?;

        let path = self.create("path")?;
        let d = match axis.orient {
            AxisOrient::Left => format!(
                "M{},0H0V{}H{}",
                -TICK_SIZE, axis.length, -TICK_SIZE
            ),
            AxisOrient::Top => format!(
                "M0,{}V0H{}V{}",
                -TICK_SIZE, axis.length, -TICK_SIZE
            ),
        };
        set_attrs(
            &path,
            &[("d", d), ("style", AXIS_PATH_STYLE.to_string())],
        )?;
        append(&group, &path)?;

        for tick in &axis.ticks {
            let (transform, line_attrs, text_attrs) = match axis.orient {
                AxisOrient::Left => (
                    translate(0.0, tick.offset),
                    [("x2", -TICK_SIZE), ("y2", 0.0)],
                    [
                        ("x", (-(TICK_SIZE + 3.0)).to_string()),
                        ("dy", ".32em".to_string()),
                        ("text-anchor", "end".to_string()),
                    ],
                ),
                AxisOrient::Top => (
                    translate(tick.offset, 0.0),
                    [("x2", 0.0), ("y2", -TICK_SIZE)],
                    [
                        ("y", (-(TICK_SIZE + 3.0)).to_string()),
                        ("dy", "0em".to_string()),
                        ("text-anchor", "middle".to_string()),
                    ],
                ),
            };
            let tick_group = self.create("g")?;
            set_attrs(
                &tick_group,
                &[("class", "tick".to_string()), ("transform", transform)],
            )?;
            let line = self.create("line")?;
            let mut attrs: Vec<(&str, String)> = line_attrs
                .iter()
                .map(|(name, value)| (*name, value.to_string()))
                .collect();
            attrs.push(("stroke", "black".to_string()));
            set_attrs(&line, &attrs)?;
            let text = self.create("text")?;
            let mut attrs = text_attrs.to_vec();
            attrs.push(("style", AXIS_TEXT_STYLE.to_string()));
            set_attrs(&text, &attrs)?;
            text.set_text_content(Some(&tick.label));
            append(&tick_group, &line)?;
            append(&tick_group, &text)?;
            append(&group, &tick_group)?;
        }
        Ok(group)
    }
}

impl ChartRenderer for DomRenderer {
    fn draw(&mut self, layout: &ChartLayout) -> Result<(), ChartError> {
        self.frame(layout)?;

        let mut columns = Vec::with_capacity(layout.columns.len());
        for column in &layout.columns {
            let group = self.create("g")?;
            set_attrs(
                &group,
                &[
                    ("class", format!("state-sequence-{}", self.id)),
                    ("id", format!("{}_{}", column.sequence_id, self.id)),
                    ("transform", translate(column.x, column.y)),
                ],
            )?;

            let mut rects = Vec::with_capacity(column.rects.len());
            for rect in &column.rects {
                let node = self.create("rect")?;
                set_attrs(
                    &node,
                    &[
                        ("class", rect.state.clone()),
                        ("state", rect.state.clone()),
                        ("start", rect.start.to_string()),
                        ("duration", rect.duration.to_string()),
                        ("transform", translate(0.0, rect.y)),
                        ("height", rect.height.to_string()),
                        ("width", rect.width.to_string()),
                        ("fill", rect.fill.clone()),
                    ],
                )?;
                append(&group, &node)?;
                rects.push(node);
            }
            columns.push(ColumnNodes { group, rects });
        }

        let mounted = self
            .mounted
            .as_mut()
            .ok_or_else(|| ChartError::Render("renderer is not mounted".to_string()))?;
        mounted.data_canvas.set_inner_html("");
        for column in &columns {
            append(&mounted.data_canvas, &column.group)?;
        }
        mounted.columns = columns;
        Ok(())
    }

    fn resize(&mut self, layout: &ChartLayout) -> Result<(), ChartError> {
        self.frame(layout)?;

        let mounted = self.mounted()?;
        for (nodes, column) in mounted.columns.iter().zip(&layout.columns) {
            set_attrs(&nodes.group, &[("transform", translate(column.x, column.y))])?;
            for (node, rect) in nodes.rects.iter().zip(&column.rects) {
                set_attrs(
                    node,
                    &[
                        ("transform", translate(0.0, rect.y)),
                        ("height", rect.height.to_string()),
                        ("width", rect.width.to_string()),
                    ],
                )?;
            }
        }
        Ok(())
    }

    fn clear(&mut self) -> Result<(), ChartError> {
        let Some(mounted) = self.mounted.as_mut() else {
            return Ok(());
        };
        for axis in mounted.axes.drain(..) {
            axis.remove();
        }
        mounted.data_canvas.set_inner_html("");
        mounted.columns.clear();
        Ok(())
    }
}

fn translate(x: f64, y: f64) -> String {
    format!("translate({x},{y})")
}

fn set_attrs(element: &Element, attrs: &[(&str, String)]) -> Result<(), ChartError> {
    for (name, value) in attrs {
        element.set_attribute(name, value).map_err(js_error)?;
    }
    Ok(())
}

fn append(parent: &Element, child: &Element) -> Result<(), ChartError> {
    parent.append_child(child).map(|_| ()).map_err(js_error)
}

fn js_error(err: JsValue) -> ChartError {
    ChartError::Render(format!("{err:?}"))
}
