//! Yew view of a state sequence chart for WebAssembly hosts.

use serde::Deserialize;
use stateseq_core::{Dataset, DEFAULT_DELIMITER};

mod styles;

/// Options accepted by `mount_state_sequence_view`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MountOptions {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_width() -> f64 {
    800.0
}

fn default_height() -> f64 {
    400.0
}

fn default_delimiter() -> String {
    DEFAULT_DELIMITER.to_string()
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            delimiter: default_delimiter(),
            category: None,
        }
    }
}

/// Pick the category to show: `requested` when known, else the first one.
///
/// The second value is a warning when a fallback happened.
pub fn resolve_category(dataset: &Dataset, requested: &str) -> Option<(String, Option<String>)> {
    if dataset.contains_category(requested) {
        return Some((requested.to_string(), None));
    }
    let first = dataset.categories.first()?;
    let warning = (!requested.is_empty()).then(|| {
        format!("Failed to find category: {requested}. Displaying default: {first}")
    });
    Some((first.clone(), warning))
}

#[cfg(target_arch = "wasm32")]
mod wasm_ui {
    use std::rc::Rc;

    use crate::{resolve_category, styles, MountOptions};
    use serde_wasm_bindgen::from_value;
    use stateseq_core::{ChartConfig, ChartLayout, ColumnLayout, ColumnMap, Dataset};
    use wasm_bindgen::prelude::*;
    use web_sys::{console, Document, Element, HtmlSelectElement, Window};
    use yew::prelude::*;
    use yew::TargetCast;

    #[derive(Properties, PartialEq)]
    pub struct StateSequenceViewProps {
        pub dataset: Rc<Dataset>,
        pub width: f64,
        pub height: f64,
        #[prop_or_default]
        pub config: ChartConfig,
        #[prop_or_default]
        pub initial_category: Option<String>,
    }

    #[function_component(StateSequenceView)]
    fn state_sequence_view(props: &StateSequenceViewProps) -> Html {
        use_effect_with((), |_| {
            if let Some(window) = web_sys::window() {
                if let Some(document) = window.document() {
                    if let Err(err) = styles::ensure_styles(&document) {
                        console::error_1(&err);
                    }
                }
            }
            || ()
        });

        let requested = use_state(|| props.initial_category.clone().unwrap_or_default());

        let on_select = {
            let requested = requested.clone();
            Callback::from(move |event: Event| {
                let select: HtmlSelectElement = event.target_unchecked_into();
                requested.set(select.value());
            })
        };

        let Some((category, warning)) = resolve_category(&props.dataset, &requested) else {
            return html! {
                <div class="stateseq-root">
                    <p class="stateseq-warning">{"No categories found in the loaded data."}</p>
                </div>
            };
        };

        let layout = match ChartLayout::build(
            &props.dataset,
            &category,
            props.width,
            props.height,
            &props.config,
        ) {
            Ok(layout) => layout,
            Err(err) => {
                return html! {
                    <div class="stateseq-root">
                        <p class="stateseq-warning">{ err.to_string() }</p>
                    </div>
                };
            }
        };

        let skipped = props.dataset.skipped.len();

        html! {
            <div class="stateseq-root">
                <div class="stateseq-toolbar">
                    <label for="stateseq-category">{"Category"}</label>
                    <select id="stateseq-category" onchange={on_select}>
                        {
                            for props.dataset.categories.iter().map(|name| html! {
                                <option value={name.clone()} selected={*name == category}>{ name.clone() }</option>
                            })
                        }
                    </select>
                    <span class="stateseq-stat">{ format!("{} sequences", layout.columns.len()) }</span>
                    {
                        if skipped > 0 {
                            html! { <span class="stateseq-stat">{ format!("{skipped} rows skipped") }</span> }
                        } else {
                            html! {}
                        }
                    }
                </div>
                { warning.map(|text| html! { <p class="stateseq-warning">{ text }</p> }).unwrap_or_default() }
                { render_chart(&layout) }
            </div>
        }
    }

    fn render_chart(layout: &ChartLayout) -> Html {
        let canvas_transform = format!(
            "translate({},{})",
            layout.margins.left, layout.margins.top
        );
        html! {
            <svg class="stateseq-chart" width={layout.width.to_string()} height={layout.height.to_string()}>
                <g transform={canvas_transform}>
                    <g class="data_canvas">
                        { for layout.columns.iter().map(render_column) }
                    </g>
                    <g class="axis y_axis">
                        <path d={format!("M-6,0H0V{}H-6", layout.y_axis.length)} />
                        {
                            for layout.y_axis.ticks.iter().map(|tick| html! {
                                <g class="tick" transform={format!("translate(0,{})", tick.offset)}>
                                    <line x2="-6" y2="0" />
                                    <text x="-9" dy=".32em" text-anchor="end">{ tick.label.clone() }</text>
                                </g>
                            })
                        }
                    </g>
                    <g class="axis x_axis">
                        <path d={format!("M0,-6V0H{}V-6", layout.x_axis.length)} />
                    </g>
                </g>
            </svg>
        }
    }

    fn render_column(column: &ColumnLayout) -> Html {
        html! {
            <g class="state-sequence" transform={format!("translate({},{})", column.x, column.y)}>
                {
                    for column.rects.iter().map(|rect| html! {
                        <rect
                            class={rect.state.clone()}
                            transform={format!("translate(0,{})", rect.y)}
                            width={rect.width.to_string()}
                            height={rect.height.to_string()}
                            fill={rect.fill.clone()}
                        >
                            <title>{ format!("{} {}: {} + {}", column.sequence_id, rect.state, rect.start, rect.duration) }</title>
                        </rect>
                    })
                }
            </g>
        }
    }

    /// Parse `csv` and mount the view under the first element matching `selector`.
    #[wasm_bindgen]
    pub fn mount_state_sequence_view(
        selector: &str,
        csv: &str,
        columns: JsValue,
        options: Option<JsValue>,
    ) -> Result<(), JsValue> {
        let window: Window = web_sys::window().ok_or_else(|| JsValue::from_str("No window"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document"))?;

        let target: Element = document
            .query_selector(selector)
            .map_err(|err| JsValue::from_str(&format!("Bad selector: {err:?}")))?
            .ok_or_else(|| JsValue::from_str("No element matches selector"))?;

        let columns: ColumnMap = from_value(columns)?;
        let options: MountOptions = match options {
            Some(value) if !value.is_undefined() && !value.is_null() => from_value(value)?,
            _ => MountOptions::default(),
        };

        let dataset = stateseq_csv::load_str(csv, &columns, &options.delimiter)
            .map_err(|err| JsValue::from_str(&err.to_string()))?;

        yew::Renderer::<StateSequenceView>::with_root_and_props(
            target,
            StateSequenceViewProps {
                dataset: Rc::new(dataset),
                width: options.width,
                height: options.height,
                config: ChartConfig::default(),
                initial_category: options.category,
            },
        )
        .render();
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use wasm_ui::mount_state_sequence_view;

#[cfg(not(target_arch = "wasm32"))]
pub fn mount_state_sequence_view(
    _: &str,
    _: &str,
    _: wasm_bindgen::JsValue,
    _: Option<wasm_bindgen::JsValue>,
) -> Result<(), wasm_bindgen::JsValue> {
    Err(wasm_bindgen::JsValue::from_str(
        "stateseq-ui only supports the wasm32 target",
    ))
}
