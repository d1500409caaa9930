//! Bridge WASM <-> JavaScript for state sequence charts.

use serde::{Deserialize, Serialize};
use serde_wasm_bindgen::from_value;
use stateseq_core::{ChartConfig, ChartError, ColumnMap, Margins, DEFAULT_DELIMITER};
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod handle;

#[cfg(target_arch = "wasm32")]
pub use handle::StateSequenceChart;

#[derive(Deserialize)]
struct JsMargins {
    #[serde(default)]
    top: Option<f64>,
    #[serde(default)]
    right: Option<f64>,
    #[serde(default)]
    bottom: Option<f64>,
    #[serde(default)]
    left: Option<f64>,
}

#[derive(Deserialize)]
struct JsChartConfig {
    #[serde(default)]
    margins: Option<JsMargins>,
    #[serde(default)]
    column_fill: Option<f64>,
    #[serde(default)]
    rect_gap: Option<f64>,
    #[serde(default)]
    default_fill: Option<String>,
    #[serde(default)]
    y_tick_count: Option<usize>,
    #[serde(default)]
    state_fills: Option<std::collections::HashMap<String, String>>,
}

impl From<JsMargins> for Margins {
    fn from(js: JsMargins) -> Self {
        let base = Margins::default();
        Margins {
            top: js.top.unwrap_or(base.top),
            right: js.right.unwrap_or(base.right),
            bottom: js.bottom.unwrap_or(base.bottom),
            left: js.left.unwrap_or(base.left),
        }
    }
}

impl From<JsChartConfig> for ChartConfig {
    fn from(cfg: JsChartConfig) -> Self {
        let mut base = ChartConfig::default();
        if let Some(margins) = cfg.margins {
            base.margins = margins.into();
        }
        if let Some(fill) = cfg.column_fill {
            base.column_fill = fill;
        }
        if let Some(gap) = cfg.rect_gap {
            base.rect_gap = gap;
        }
        if let Some(fill) = cfg.default_fill {
            base.default_fill = fill;
        }
        if let Some(count) = cfg.y_tick_count {
            base.y_tick_count = count;
        }
        if let Some(fills) = cfg.state_fills {
            base.state_fills = fills;
        }
        base
    }
}

/// Merge a partial JS config object over the defaults.
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub(crate) fn parse_config(config: Option<JsValue>) -> Result<ChartConfig, JsValue> {
    match config {
        Some(js_cfg) if !js_cfg.is_undefined() && !js_cfg.is_null() => {
            let cfg: JsChartConfig = from_value(js_cfg)
                .map_err(|err| JsValue::from_str(&format!("Could not read config: {err}")))?;
            Ok(ChartConfig::from(cfg))
        }
        _ => Ok(ChartConfig::default()),
    }
}

/// Column names as sent from JS; all five are required.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsColumns {
    states: String,
    starts: String,
    durations: String,
    category: String,
    sequence_id: String,
}

impl From<JsColumns> for ColumnMap {
    fn from(js: JsColumns) -> Self {
        ColumnMap::new(js.states, js.starts, js.durations, js.category, js.sequence_id)
    }
}

pub(crate) fn delimiter_or_default(delim: Option<String>) -> String {
    delim
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DEFAULT_DELIMITER.to_string())
}

/// Parse CSV text and return a per-category summary without drawing anything.
#[wasm_bindgen(js_name = summarizeCsv)]
pub fn summarize_csv(
    text: &str,
    columns: JsValue,
    delim: Option<String>,
) -> Result<JsValue, JsValue> {
    #[cfg(target_arch = "wasm32")]
    handle::init_runtime();

    let columns: JsColumns = from_value(columns)
        .map_err(|err| JsValue::from_str(&format!("Could not read columns: {err}")))?;
    let summary = stateseq_csv::summarize_str(text, &columns.into(), &delimiter_or_default(delim))
        .map_err(|err| JsValue::from_str(&format_chart_error(err)))?;

    to_js(&summary)
}

/// Serialize with plain JS objects for maps instead of `Map`.
pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|err| JsValue::from_str(&format!("Could not serialize value: {err}")))
}

pub(crate) fn format_chart_error(err: ChartError) -> String {
    format!("State sequence chart error: {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = ChartConfig::from(JsChartConfig {
            margins: Some(JsMargins {
                top: None,
                right: None,
                bottom: None,
                left: Some(80.0),
            }),
            column_fill: None,
            rect_gap: None,
            default_fill: Some("black".to_string()),
            y_tick_count: None,
            state_fills: None,
        });
        assert_eq!(cfg.margins.left, 80.0);
        assert_eq!(cfg.margins.top, 10.0);
        assert_eq!(cfg.default_fill, "black");
        assert_eq!(cfg.column_fill, 0.9);
    }

    #[test]
    fn empty_delimiter_uses_default() {
        assert_eq!(delimiter_or_default(None), "-");
        assert_eq!(delimiter_or_default(Some(String::new())), "-");
        assert_eq!(delimiter_or_default(Some("|".to_string())), "|");
    }

    #[test]
    fn error_messages_are_prefixed() {
        assert_eq!(
            format_chart_error(ChartError::NoCategories),
            "State sequence chart error: no categories found in data source"
        );
    }
}
