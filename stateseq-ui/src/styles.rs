//! Stylesheet injected once per document by the view.

#[cfg(target_arch = "wasm32")]
const STYLE_ATTR: &str = "data-stateseq-ui";
#[cfg(target_arch = "wasm32")]
const STYLE_VERSION: &str = "2";

/// Default CSS for the view along with easy-to-override design tokens.
pub const DEFAULT_STYLES: &str = r#"
:root {
  --stateseq-font-family: 'Inter', system-ui, -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
  --stateseq-bg: #ffffff;
  --stateseq-text: #1f2933;
  --stateseq-muted: #52606d;
  --stateseq-border: rgba(148, 163, 184, 0.28);
  --stateseq-radius: 12px;
  --stateseq-warning-bg: rgba(220, 104, 3, 0.12);
  --stateseq-warning-text: #b54708;
  --stateseq-axis: #11181c;
}

.stateseq-root {
  font-family: var(--stateseq-font-family);
  background: var(--stateseq-bg);
  color: var(--stateseq-text);
  border: 1px solid var(--stateseq-border);
  border-radius: var(--stateseq-radius);
  padding: 16px;
  display: flex;
  flex-direction: column;
  gap: 12px;
}

.stateseq-toolbar {
  display: flex;
  flex-wrap: wrap;
  align-items: center;
  gap: 12px;
}

.stateseq-toolbar label {
  font-size: 0.85rem;
  font-weight: 600;
  color: var(--stateseq-muted);
}

.stateseq-toolbar select {
  font: inherit;
  padding: 4px 8px;
  border-radius: 8px;
  border: 1px solid var(--stateseq-border);
}

.stateseq-stat {
  font-size: 0.78rem;
  color: var(--stateseq-muted);
  font-variant-numeric: tabular-nums;
}

.stateseq-warning {
  background: var(--stateseq-warning-bg);
  color: var(--stateseq-warning-text);
  border-radius: 8px;
  padding: 8px 12px;
  font-size: 0.85rem;
}

.stateseq-chart .axis path,
.stateseq-chart .axis line {
  fill: none;
  stroke: var(--stateseq-axis);
  shape-rendering: crispEdges;
}

.stateseq-chart .axis text {
  font-family: sans-serif;
  font-size: 10px;
  fill: var(--stateseq-axis);
}

.stateseq-chart rect:hover {
  opacity: 0.75;
}
"#;

/// Add the stylesheet to `document`, or refresh one left by another version.
#[cfg(target_arch = "wasm32")]
pub fn ensure_styles(document: &web_sys::Document) -> Result<(), wasm_bindgen::JsValue> {
    use wasm_bindgen::JsValue;

    let selector = format!("style[{STYLE_ATTR}]");
    if let Some(existing) = document.query_selector(&selector)? {
        if existing.get_attribute(STYLE_ATTR).as_deref() != Some(STYLE_VERSION) {
            existing.set_attribute(STYLE_ATTR, STYLE_VERSION)?;
            existing.set_text_content(Some(DEFAULT_STYLES));
        }
        return Ok(());
    }

    let style = document.create_element("style")?;
    style.set_attribute(STYLE_ATTR, STYLE_VERSION)?;
    style.set_text_content(Some(DEFAULT_STYLES));

    let parent: web_sys::Element = match document.head() {
        Some(head) => head.into(),
        None => document
            .document_element()
            .ok_or_else(|| JsValue::from_str("stateseq-ui: document has no root element"))?,
    };
    parent.append_child(&style)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::DEFAULT_STYLES;

    #[test]
    fn stylesheet_covers_view_classes() {
        for class in [
            ".stateseq-root",
            ".stateseq-toolbar",
            ".stateseq-stat",
            ".stateseq-warning",
            ".stateseq-chart",
        ] {
            assert!(DEFAULT_STYLES.contains(class), "missing {class}");
        }
    }
}
