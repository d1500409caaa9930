//! `StateSequenceChart`: the JS-facing chart instance.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

use js_sys::Function;
use stateseq_core::{
    ChartError, ColumnMap, DataSource, LoadRequest, LoadTicket, SequenceChart,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Window};

use crate::dom::DomRenderer;
use crate::{delimiter_or_default, format_chart_error, parse_config, to_js};

pub(crate) fn init_runtime() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        console_error_panic_hook::set_once();
        if let Err(err) = console_log::init_with_level(log::Level::Info) {
            web_sys::console::warn_1(&JsValue::from_str(&err.to_string()));
        }
    });
}

/// State shared between the JS handle and its event/fetch callbacks.
struct Shared {
    chart: RefCell<SequenceChart<DomRenderer>>,
    on_warning: RefCell<Option<Function>>,
    window: Window,
}

impl Shared {
    /// Mount the renderer and replay anything queued before the page was ready.
    fn setup(self: &Rc<Self>) {
        let tickets = {
            let mut chart = self.chart.borrow_mut();
            if chart.is_initialized() {
                return;
            }
            if chart.is_dynamic_width() {
                if let Some(width) = chart.renderer().container_width() {
                    if let Err(err) = chart.host_resize(width) {
                        log::error!("{err}");
                    }
                }
            }
            let (width, height) = (chart.width(), chart.height());
            if let Err(err) = chart.renderer_mut().mount(width, height) {
                drop(chart);
                self.report(err);
                return;
            }
            chart.initialize()
        };
        for ticket in tickets {
            spawn_load(Rc::clone(self), ticket);
        }
        self.flush_warnings();
    }

    fn on_window_resize(&self) {
        let result = {
            let mut chart = self.chart.borrow_mut();
            if !chart.is_dynamic_width() {
                return;
            }
            match chart.renderer().container_width() {
                Some(width) => chart.host_resize(width),
                None => Ok(()),
            }
        };
        self.finish(result);
    }

    /// Flush warnings, then report `result`'s error if any.
    fn finish(&self, result: Result<(), ChartError>) {
        self.flush_warnings();
        if let Err(err) = result {
            self.report(err);
        }
    }

    fn report(&self, err: ChartError) {
        let message = format_chart_error(err);
        log::error!("{message}");
        self.show_warning(&message);
    }

    /// Hand queued warnings to the host outside of any chart borrow.
    fn flush_warnings(&self) {
        let warnings = self.chart.borrow_mut().take_warnings();
        for warning in warnings {
            self.show_warning(&warning);
        }
    }

    fn show_warning(&self, message: &str) {
        let callback = self.on_warning.borrow().clone();
        match callback {
            Some(callback) => {
                if let Err(err) = callback.call1(&JsValue::NULL, &JsValue::from_str(message)) {
                    log::error!("warning callback failed: {err:?}");
                }
            }
            None => {
                let _ = self.window.alert_with_message(message);
            }
        }
    }
}

fn spawn_load(shared: Rc<Shared>, ticket: LoadTicket) {
    wasm_bindgen_futures::spawn_local(async move {
        let text = match &ticket.request.source {
            DataSource::Location(url) => fetch_text(url).await,
            DataSource::Inline { text, .. } => Ok(text.clone()),
        };
        let result = text.and_then(|text| {
            stateseq_csv::load_str(&text, &ticket.request.columns, &ticket.request.delimiter)
        });

        let outcome = shared.chart.borrow_mut().complete_load(&ticket, result);
        // Load failures are already queued as warnings by the chart.
        shared.flush_warnings();
        if let Err(err) = outcome {
            log::debug!("load of {} ended with {err}", ticket.request.source);
        }
    });
}

async fn fetch_text(url: &str) -> Result<String, ChartError> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|err| ChartError::Fetch(format!("{url}: {err}")))?;
    if !response.ok() {
        return Err(ChartError::Fetch(format!(
            "{url}: HTTP {}",
            response.status()
        )));
    }
    response
        .text()
        .await
        .map_err(|err| ChartError::Fetch(format!("{url}: {err}")))
}

/// A state sequence chart bound to an `<svg>` element by id.
#[wasm_bindgen]
pub struct StateSequenceChart {
    id: String,
    shared: Rc<Shared>,
    resize_listener: Closure<dyn FnMut()>,
    ready_listener: Option<Closure<dyn FnMut()>>,
}

#[wasm_bindgen]
impl StateSequenceChart {
    /// Create a chart for the `<svg id="{id}">` element.
    ///
    /// Setup runs once the document is parsed; calls made before then are
    /// queued and replayed in order.
    #[wasm_bindgen(constructor)]
    pub fn new(
        id: &str,
        width: f64,
        height: f64,
        dynamic_width: Option<bool>,
        config: Option<JsValue>,
    ) -> Result<StateSequenceChart, JsValue> {
        init_runtime();

        let config = parse_config(config)?;
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("No window available"))?;
        let document: Document = window
            .document()
            .ok_or_else(|| JsValue::from_str("No document available"))?;

        let renderer = DomRenderer::new(id, document.clone());
        let chart = SequenceChart::with_config(
            renderer,
            width,
            height,
            dynamic_width.unwrap_or(false),
            config,
        );
        let shared = Rc::new(Shared {
            chart: RefCell::new(chart),
            on_warning: RefCell::new(None),
            window: window.clone(),
        });

        let resize_listener = {
            let shared = Rc::clone(&shared);
            Closure::<dyn FnMut()>::new(move || shared.on_window_resize())
        };
        window.add_event_listener_with_callback(
            "resize",
            resize_listener.as_ref().unchecked_ref(),
        )?;

        let ready_listener = if document.ready_state() == "loading" {
            let shared = Rc::clone(&shared);
            let listener = Closure::<dyn FnMut()>::new(move || shared.setup());
            document.add_event_listener_with_callback(
                "DOMContentLoaded",
                listener.as_ref().unchecked_ref(),
            )?;
            Some(listener)
        } else {
            shared.setup();
            None
        };

        log::debug!("created state sequence chart `{id}`");
        Ok(StateSequenceChart {
            id: id.to_string(),
            shared,
            resize_listener,
            ready_listener,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.id.clone()
    }

    /// Fetch a CSV file and draw it once loaded.
    #[wasm_bindgen(js_name = loadDataFromCSV)]
    #[allow(clippy::too_many_arguments)]
    pub fn load_data_from_csv(
        &self,
        filename: &str,
        states: &str,
        starts: &str,
        durations: &str,
        category: &str,
        sequence_id: &str,
        delim: Option<String>,
    ) {
        let columns = ColumnMap::new(states, starts, durations, category, sequence_id);
        self.load(LoadRequest::new(filename, columns).with_delimiter(delimiter_or_default(delim)));
    }

    /// Load CSV text already in memory and draw it.
    #[wasm_bindgen(js_name = loadDataFromText)]
    #[allow(clippy::too_many_arguments)]
    pub fn load_data_from_text(
        &self,
        text: String,
        states: &str,
        starts: &str,
        durations: &str,
        category: &str,
        sequence_id: &str,
        delim: Option<String>,
    ) {
        let columns = ColumnMap::new(states, starts, durations, category, sequence_id);
        let source = DataSource::Inline {
            name: format!("inline data for {}", self.id),
            text,
        };
        self.load(LoadRequest::new(source, columns).with_delimiter(delimiter_or_default(delim)));
    }

    fn load(&self, request: LoadRequest) {
        let ticket = self.shared.chart.borrow_mut().load_data(request);
        if let Some(ticket) = ticket {
            spawn_load(Rc::clone(&self.shared), ticket);
        }
    }

    /// Show another category. Unknown categories fall back to the first one on draw.
    #[wasm_bindgen(js_name = setCurrentCategory)]
    pub fn set_current_category(&self, category: &str) {
        let result = self
            .shared
            .chart
            .borrow_mut()
            .set_current_category(category);
        self.shared.finish(result);
    }

    #[wasm_bindgen(js_name = currentCategory)]
    pub fn current_category(&self) -> String {
        self.shared.chart.borrow().current_category().to_string()
    }

    pub fn categories(&self) -> Vec<String> {
        self.shared.chart.borrow().categories().to_vec()
    }

    #[wasm_bindgen(js_name = sequenceIds)]
    pub fn sequence_ids(&self, category: &str) -> Vec<String> {
        self.shared.chart.borrow().sequence_ids(category).to_vec()
    }

    /// Fix the width; turns dynamic width off.
    #[wasm_bindgen(js_name = setWidth)]
    pub fn set_width(&self, width: f64) {
        let result = self.shared.chart.borrow_mut().set_width(width);
        self.shared.finish(result);
    }

    #[wasm_bindgen(js_name = setHeight)]
    pub fn set_height(&self, height: f64) {
        let result = self.shared.chart.borrow_mut().set_height(height);
        self.shared.finish(result);
    }

    /// Fix both dimensions; turns dynamic width off.
    #[wasm_bindgen(js_name = setSize)]
    pub fn set_size(&self, width: f64, height: f64) {
        let result = self.shared.chart.borrow_mut().set_size(width, height);
        self.shared.finish(result);
    }

    pub fn width(&self) -> f64 {
        self.shared.chart.borrow().width()
    }

    pub fn height(&self) -> f64 {
        self.shared.chart.borrow().height()
    }

    #[wasm_bindgen(js_name = isDynamicWidth)]
    pub fn is_dynamic_width(&self) -> bool {
        self.shared.chart.borrow().is_dynamic_width()
    }

    #[wasm_bindgen(js_name = setDynamicWidth)]
    pub fn set_dynamic_width(&self, dynamic: bool) {
        self.shared.chart.borrow_mut().set_dynamic_width(dynamic);
    }

    /// Draw the current category; queued until the page is ready.
    pub fn draw(&self) {
        let result = self.shared.chart.borrow_mut().draw();
        self.shared.finish(result);
    }

    /// Redraw if already drawn.
    pub fn redraw(&self) {
        let result = self.shared.chart.borrow_mut().redraw();
        self.shared.finish(result);
    }

    /// Route warnings to `callback` instead of `window.alert`.
    #[wasm_bindgen(js_name = onWarning)]
    pub fn on_warning(&self, callback: Option<Function>) {
        *self.shared.on_warning.borrow_mut() = callback;
    }

    /// Current layout as a plain object, or `null` before the first draw.
    pub fn layout(&self) -> Result<JsValue, JsValue> {
        match self.shared.chart.borrow().layout() {
            Some(layout) => to_js(layout),
            None => Ok(JsValue::NULL),
        }
    }

    pub fn phase(&self) -> String {
        format!("{:?}", self.shared.chart.borrow().phase())
    }
}

impl Drop for StateSequenceChart {
    fn drop(&mut self) {
        let _ = self.shared.window.remove_event_listener_with_callback(
            "resize",
            self.resize_listener.as_ref().unchecked_ref(),
        );
        if let (Some(listener), Some(document)) =
            (self.ready_listener.as_ref(), self.shared.window.document())
        {
            let _ = document.remove_event_listener_with_callback(
                "DOMContentLoaded",
                listener.as_ref().unchecked_ref(),
            );
        }
    }
}
