//! Standalone SVG export of a [`ChartLayout`].

use std::fmt::Write;

use crate::layout::ChartLayout;

const AXIS_STYLE: &str = "fill:none;stroke:black;shape-rendering:crispEdges";
const TICK_SIZE: f64 = 6.0;

/// Render `layout` as an SVG document string.
///
/// Element ids and classes mirror the live DOM renderer, with `id` as the
/// chart instance id.
pub fn render_svg(layout: &ChartLayout, id: &str) -> String {
    let id = escape_xml(id);
    let mut svg = String::with_capacity(256 + layout.rect_count() * 160);
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" id="{id}" width="{}" height="{}" style="font-family:sans-serif;font-size:10px">"#,
        layout.width, layout.height,
    );
    let _ = write!(
        svg,
        r#"<g id="StateSequenceVisualization-canvas-{id}" class="StateSequenceVisualization-canvas" transform="translate({},{})">"#,
        layout.margins.left, layout.margins.top,
    );

    let _ = write!(
        svg,
        r#"<g id="StateSequenceVisualization-data_canvas-{id}" class="StateSequenceVisualization-data_canvas">"#
    );
    for column in &layout.columns {
        let _ = write!(
            svg,
            r#"<g class="state-sequence-{id}" id="{}_{id}" transform="translate({},{})">"#,
            escape_xml(&column.sequence_id),
            column.x,
            column.y,
        );
        for rect in &column.rects {
            let state = escape_xml(&rect.state);
            let _ = write!(
                svg,
                r#"<rect class="{state}" state="{state}" start="{}" duration="{}" transform="translate(0,{})" width="{}" height="{}" fill="{}"><title>{state}</title></rect>"#,
                rect.start,
                rect.duration,
                rect.y,
                rect.width,
                rect.height,
                escape_xml(&rect.fill),
            );
        }
        svg.push_str("</g>");
    }
    svg.push_str("</g>");

    // y axis: vertical line on the left with outward ticks.
    let _ = write!(
        svg,
        r#"<g class="axis y_axis" id="StateSequenceVisualization-y_axis-{id}"><path d="M{},0H0V{}H{}" style="{AXIS_STYLE}"/>"#,
        -TICK_SIZE, layout.y_axis.length, -TICK_SIZE,
    );
    for tick in &layout.y_axis.ticks {
        let _ = write!(
            svg,
            r#"<g class="tick" transform="translate(0,{})"><line x2="{}" y2="0" stroke="black"/><text x="{}" dy=".32em" text-anchor="end">{}</text></g>"#,
            tick.offset,
            -TICK_SIZE,
            -(TICK_SIZE + 3.0),
            escape_xml(&tick.label),
        );
    }
    svg.push_str("</g>");

    // x axis: bare line along the top.
    let _ = write!(
        svg,
        r#"<g class="axis x_axis" id="StateSequenceVisualization-x_axis-{id}"><path d="M0,{}V0H{}V{}" style="{AXIS_STYLE}"/></g>"#,
        -TICK_SIZE, layout.x_axis.length, -TICK_SIZE,
    );

    svg.push_str("</g></svg>");
    svg
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::build_dataset;
    use crate::{ChartConfig, RawRow};

    #[test]
    fn exports_columns_and_axes() {
        let dataset = build_dataset(
            &[RawRow {
                states: "A-B<&>".into(),
                starts: "0-5".into(),
                durations: "5-3".into(),
                category: "X".into(),
                sequence_id: "r1".into(),
            }],
            "-",
        );
        let layout =
            ChartLayout::build(&dataset, "X", 260.0, 100.0, &ChartConfig::default()).unwrap();
        let svg = render_svg(&layout, "vis");

        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert_eq!(svg.matches("<rect ").count(), 2);
        assert!(svg.contains(r#"id="r1_vis""#));
        assert!(svg.contains(r#"class="B&lt;&amp;&gt;""#));
        assert!(svg.contains("StateSequenceVisualization-y_axis-vis"));
        assert!(svg.contains(r#"transform="translate(50,10)""#));
    }

    #[test]
    fn instance_id_is_escaped() {
        let dataset = build_dataset(
            &[RawRow {
                states: "A".into(),
                starts: "0".into(),
                durations: "1".into(),
                category: "X".into(),
                sequence_id: "r1".into(),
            }],
            "-",
        );
        let layout =
            ChartLayout::build(&dataset, "X", 260.0, 100.0, &ChartConfig::default()).unwrap();
        let svg = render_svg(&layout, r#"a"b<c"#);

        assert!(svg.contains(r#"id="a&quot;b&lt;c""#));
        assert!(svg.contains(r#"id="r1_a&quot;b&lt;c""#));
        assert!(!svg.contains(r#"a"b"#));
    }
}
