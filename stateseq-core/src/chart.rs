//! Chart adapter: owns the loaded data, tracks the displayed category and
//! drives a [`ChartRenderer`].
//!
//! Loading is split in two so the host can fetch asynchronously:
//! [`SequenceChart::load_data`] hands out a [`LoadTicket`], the host fetches
//! and parses the source, then calls [`SequenceChart::complete_load`].
//! Requests made before [`SequenceChart::initialize`] are queued and replayed
//! in order when it runs.

use std::collections::VecDeque;
use std::fmt;

use crate::layout::ChartLayout;
use crate::{ChartConfig, ChartError, ColumnMap, Dataset, DEFAULT_DELIMITER};

/// Backend that turns layouts into visible elements.
pub trait ChartRenderer {
    /// Replace whatever is drawn with `layout`.
    fn draw(&mut self, layout: &ChartLayout) -> Result<(), ChartError>;

    /// Move the elements created by the last `draw` to match `layout`.
    fn resize(&mut self, layout: &ChartLayout) -> Result<(), ChartError>;

    /// Remove everything drawn so far.
    fn clear(&mut self) -> Result<(), ChartError>;
}

/// A tabular resource to load.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    /// Fetched by the host (URL or path).
    Location(String),
    /// Text already in memory; `name` labels it in messages.
    Inline { name: String, text: String },
}

impl DataSource {
    pub fn name(&self) -> &str {
        match self {
            DataSource::Location(location) => location,
            DataSource::Inline { name, .. } => name,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&str> for DataSource {
    fn from(location: &str) -> Self {
        DataSource::Location(location.to_string())
    }
}

impl From<String> for DataSource {
    fn from(location: String) -> Self {
        DataSource::Location(location)
    }
}

/// Where to load data from and how to read it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub source: DataSource,
    pub columns: ColumnMap,
    pub delimiter: String,
}

impl LoadRequest {
    pub fn new(source: impl Into<DataSource>, columns: ColumnMap) -> Self {
        Self {
            source: source.into(),
            columns,
            delimiter: DEFAULT_DELIMITER.to_string(),
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}

/// Handle for an in-flight load. Only the most recent ticket is honoured.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    pub generation: u64,
    pub request: LoadRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartPhase {
    Uninitialized,
    Ready,
    Loading,
    Loaded,
    Drawn,
}

#[derive(Debug)]
enum PendingOp {
    Load(LoadRequest),
    Draw,
}

#[derive(Debug, Default)]
struct ChartState {
    dataset: Dataset,
    current_category: String,
    loaded: bool,
    drawn: bool,
}

pub struct SequenceChart<R> {
    renderer: R,
    config: ChartConfig,
    width: f64,
    height: f64,
    dynamic_width: bool,
    initialized: bool,
    pending: VecDeque<PendingOp>,
    generation: u64,
    loading: bool,
    state: ChartState,
    layout: Option<ChartLayout>,
    warnings: Vec<String>,
}

impl<R: ChartRenderer> SequenceChart<R> {
    pub fn new(renderer: R, width: f64, height: f64, dynamic_width: bool) -> Self {
        Self::with_config(renderer, width, height, dynamic_width, ChartConfig::default())
    }

    pub fn with_config(
        renderer: R,
        width: f64,
        height: f64,
        dynamic_width: bool,
        config: ChartConfig,
    ) -> Self {
        Self {
            renderer,
            config,
            width,
            height,
            dynamic_width,
            initialized: false,
            pending: VecDeque::new(),
            generation: 0,
            loading: false,
            state: ChartState::default(),
            layout: None,
            warnings: Vec::new(),
        }
    }

    /// Mark the render target as ready and replay queued operations in order.
    ///
    /// Returns the tickets of replayed loads; the host must fetch each one.
    /// Calling this again does nothing.
    pub fn initialize(&mut self) -> Vec<LoadTicket> {
        if self.initialized {
            return Vec::new();
        }
        self.initialized = true;

        let mut tickets = Vec::new();
        while let Some(op) = self.pending.pop_front() {
            match op {
                PendingOp::Load(request) => tickets.push(self.start_load(request)),
                PendingOp::Draw => {
                    if let Err(err) = self.draw() {
                        log::warn!("queued draw did not run: {err}");
                    }
                }
            }
        }
        tickets
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Begin loading `request`. Returns `None` while the chart is not initialized;
    /// the request is then replayed by [`initialize`](Self::initialize).
    pub fn load_data(&mut self, request: LoadRequest) -> Option<LoadTicket> {
        if !self.initialized {
            self.pending.push_back(PendingOp::Load(request));
            return None;
        }
        Some(self.start_load(request))
    }

    fn start_load(&mut self, request: LoadRequest) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        self.state.loaded = false;
        self.state.drawn = false;
        self.state.dataset = Dataset::default();
        self.layout = None;
        log::debug!(
            "loading `{}` (generation {})",
            request.source,
            self.generation
        );
        LoadTicket {
            generation: self.generation,
            request,
        }
    }

    /// Finish the load identified by `ticket` and draw.
    ///
    /// Completions for superseded tickets are dropped. Failures are also
    /// reported as warnings.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Dataset, ChartError>,
    ) -> Result<(), ChartError> {
        if ticket.generation != self.generation {
            log::debug!(
                "ignoring stale load of `{}` (generation {}, current {})",
                ticket.request.source,
                ticket.generation,
                self.generation
            );
            return Ok(());
        }
        self.loading = false;

        let dataset = match result {
            Ok(dataset) => dataset,
            Err(err) => {
                if let Err(clear_err) = self.renderer.clear() {
                    log::warn!("could not clear the previous chart: {clear_err}");
                }
                self.warn(format!("Failed to load {}: {err}", ticket.request.source));
                return Err(err);
            }
        };

        if !dataset.skipped.is_empty() {
            self.warn(format!(
                "Skipped {} malformed row(s) in {}",
                dataset.skipped.len(),
                ticket.request.source
            ));
        }
        if dataset.is_empty() {
            self.warn(format!(
                "Can't find categories in {}! Nothing will be drawn",
                ticket.request.source
            ));
        }

        log::info!(
            "loaded {} sequences in {} categories from {}",
            dataset.record_count(),
            dataset.categories.len(),
            ticket.request.source
        );

        self.state.dataset = dataset;
        self.state.loaded = true;
        if self.state.current_category.is_empty() {
            if let Some(first) = self.state.dataset.categories.first() {
                self.state.current_category = first.clone();
            }
        }

        if self.state.dataset.is_empty() {
            return Ok(());
        }
        self.draw()
    }

    /// Draw the current category, falling back to the first one when the
    /// current category is unknown.
    ///
    /// While a load is in flight this does nothing; the load draws on completion.
    pub fn draw(&mut self) -> Result<(), ChartError> {
        if !self.initialized {
            self.pending.push_back(PendingOp::Draw);
            return Ok(());
        }
        if !self.state.loaded {
            if self.loading {
                log::debug!("draw deferred until the pending load completes");
                return Ok(());
            }
            return Err(ChartError::NotLoaded);
        }
        let Some(first) = self.state.dataset.categories.first().cloned() else {
            return Err(ChartError::NoCategories);
        };

        if !self
            .state
            .dataset
            .contains_category(&self.state.current_category)
        {
            self.warn(format!(
                "Failed to find category: {}. Displaying default: {first}",
                self.state.current_category
            ));
            self.state.current_category = first;
        }

        let layout = ChartLayout::build(
            &self.state.dataset,
            &self.state.current_category,
            self.width,
            self.height,
            &self.config,
        )?;
        self.renderer.draw(&layout)?;
        self.layout = Some(layout);
        self.state.drawn = true;
        Ok(())
    }

    /// Draw again if something is already drawn.
    pub fn redraw(&mut self) -> Result<(), ChartError> {
        if !self.state.drawn {
            return Ok(());
        }
        self.draw()
    }

    /// Re-place drawn elements for the current size. No-op until drawn.
    pub fn resize(&mut self) -> Result<(), ChartError> {
        if !self.state.drawn {
            return Ok(());
        }
        let Some(layout) = self.layout.as_mut() else {
            return Ok(());
        };
        layout.place(self.width, self.height);
        self.renderer.resize(layout)
    }

    /// Window resize hook: adopt the container width when sizing dynamically.
    pub fn host_resize(&mut self, container_width: f64) -> Result<(), ChartError> {
        if !self.dynamic_width {
            return Ok(());
        }
        self.width = container_width;
        self.resize()
    }

    /// Set the category to display. Validity is checked on draw.
    pub fn set_current_category(&mut self, category: impl Into<String>) -> Result<(), ChartError> {
        self.state.current_category = category.into();
        if self.state.loaded {
            return self.draw();
        }
        Ok(())
    }

    /// Current category; empty until data loads or a category is set.
    pub fn current_category(&self) -> &str {
        &self.state.current_category
    }

    pub fn categories(&self) -> &[String] {
        &self.state.dataset.categories
    }

    pub fn sequence_ids(&self, category: &str) -> &[String] {
        self.state.dataset.sequence_ids(category)
    }

    pub fn dataset(&self) -> &Dataset {
        &self.state.dataset
    }

    pub fn layout(&self) -> Option<&ChartLayout> {
        self.layout.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.state.loaded
    }

    pub fn is_drawn(&self) -> bool {
        self.state.drawn
    }

    pub fn phase(&self) -> ChartPhase {
        if !self.initialized {
            ChartPhase::Uninitialized
        } else if self.state.drawn {
            ChartPhase::Drawn
        } else if self.state.loaded {
            ChartPhase::Loaded
        } else if self.loading {
            ChartPhase::Loading
        } else {
            ChartPhase::Ready
        }
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn is_dynamic_width(&self) -> bool {
        self.dynamic_width
    }

    pub fn set_dynamic_width(&mut self, dynamic: bool) {
        self.dynamic_width = dynamic;
    }

    /// Fix the width (turns off dynamic width) and resize.
    pub fn set_width(&mut self, width: f64) -> Result<(), ChartError> {
        self.dynamic_width = false;
        self.width = width;
        self.resize()
    }

    pub fn set_height(&mut self, height: f64) -> Result<(), ChartError> {
        self.height = height;
        self.resize()
    }

    /// Fix both dimensions (turns off dynamic width) and resize.
    pub fn set_size(&mut self, width: f64, height: f64) -> Result<(), ChartError> {
        self.dynamic_width = false;
        self.width = width;
        self.height = height;
        self.resize()
    }

    pub fn config(&self) -> &ChartConfig {
        &self.config
    }

    /// Swap presentation settings and redraw if drawn.
    pub fn set_config(&mut self, config: ChartConfig) -> Result<(), ChartError> {
        self.config = config;
        self.redraw()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Drain user-facing warnings collected since the last call.
    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    fn warn(&mut self, message: String) {
        log::warn!("{message}");
        self.warnings.push(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::build_dataset;
    use crate::RawRow;

    #[derive(Default)]
    struct RecordingRenderer {
        draws: Vec<ChartLayout>,
        resizes: Vec<ChartLayout>,
        clears: usize,
    }

    impl ChartRenderer for RecordingRenderer {
        fn draw(&mut self, layout: &ChartLayout) -> Result<(), ChartError> {
            self.draws.push(layout.clone());
            Ok(())
        }

        fn resize(&mut self, layout: &ChartLayout) -> Result<(), ChartError> {
            self.resizes.push(layout.clone());
            Ok(())
        }

        fn clear(&mut self) -> Result<(), ChartError> {
            self.clears += 1;
            Ok(())
        }
    }

    fn columns() -> ColumnMap {
        ColumnMap::new("states", "starts", "durations", "treatment", "replicate")
    }

    fn row(states: &str, starts: &str, durations: &str, category: &str, id: &str) -> RawRow {
        RawRow {
            states: states.into(),
            starts: starts.into(),
            durations: durations.into(),
            category: category.into(),
            sequence_id: id.into(),
        }
    }

    fn dataset() -> Dataset {
        build_dataset(
            &[
                row("A-B", "0-5", "5-3", "X", "1"),
                row("A", "0", "2", "X", "2"),
                row("C", "0", "4", "Y", "1"),
            ],
            "-",
        )
    }

    fn loaded_chart() -> SequenceChart<RecordingRenderer> {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let ticket = chart
            .load_data(LoadRequest::new("data.csv", columns()))
            .expect("initialized chart issues a ticket");
        chart.complete_load(&ticket, Ok(dataset())).unwrap();
        chart
    }

    #[test]
    fn load_draws_first_category() {
        let mut chart = loaded_chart();
        assert_eq!(chart.phase(), ChartPhase::Drawn);
        assert_eq!(chart.current_category(), "X");
        assert_eq!(chart.categories(), ["X".to_string(), "Y".to_string()]);
        assert_eq!(chart.renderer().draws.len(), 1);
        assert_eq!(chart.renderer().draws[0].columns.len(), 2);
        assert!(chart.take_warnings().is_empty());
    }

    #[test]
    fn operations_before_initialize_are_replayed_in_order() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        assert!(chart.load_data(LoadRequest::new("a.csv", columns())).is_none());
        assert!(chart.draw().is_ok());
        assert!(chart
            .load_data(LoadRequest::new("b.csv", columns()).with_delimiter("|"))
            .is_none());
        assert_eq!(chart.phase(), ChartPhase::Uninitialized);

        let tickets = chart.initialize();
        let sources: Vec<&str> = tickets.iter().map(|t| t.request.source.name()).collect();
        assert_eq!(sources, ["a.csv", "b.csv"]);
        assert_eq!(tickets[1].request.delimiter, "|");
        assert_eq!(chart.phase(), ChartPhase::Loading);
        assert!(chart.renderer().draws.is_empty());

        assert!(chart.initialize().is_empty());
    }

    #[test]
    fn stale_completion_is_ignored() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let first = chart.load_data(LoadRequest::new("a.csv", columns())).unwrap();
        let second = chart.load_data(LoadRequest::new("b.csv", columns())).unwrap();

        chart.complete_load(&first, Ok(dataset())).unwrap();
        assert_eq!(chart.phase(), ChartPhase::Loading);
        assert!(chart.renderer().draws.is_empty());

        chart.complete_load(&second, Ok(dataset())).unwrap();
        assert_eq!(chart.phase(), ChartPhase::Drawn);
    }

    #[test]
    fn unknown_category_falls_back_with_warning() {
        let mut chart = loaded_chart();
        chart.set_current_category("missing").unwrap();

        assert_eq!(chart.current_category(), "X");
        let warnings = chart.take_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("missing"));
        assert!(warnings[0].contains("Displaying default: X"));
        assert_eq!(chart.renderer().draws.len(), 2);
    }

    #[test]
    fn category_set_before_load_is_kept() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.set_current_category("Y").unwrap();
        assert!(chart.renderer().draws.is_empty());

        chart.initialize();
        let ticket = chart.load_data(LoadRequest::new("a.csv", columns())).unwrap();
        chart.complete_load(&ticket, Ok(dataset())).unwrap();
        assert_eq!(chart.current_category(), "Y");
        assert_eq!(chart.renderer().draws[0].category, "Y");
    }

    #[test]
    fn switching_category_redraws() {
        let mut chart = loaded_chart();
        chart.set_current_category("Y").unwrap();
        let last = chart.renderer().draws.last().unwrap();
        assert_eq!(last.category, "Y");
        assert_eq!(last.columns.len(), 1);
    }

    #[test]
    fn resize_before_draw_is_noop() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, true);
        chart.initialize();
        chart.set_size(400.0, 200.0).unwrap();
        assert!(chart.renderer().resizes.is_empty());
        assert!(!chart.is_dynamic_width());
        assert_eq!(chart.redraw(), Ok(()));
        assert!(chart.renderer().draws.is_empty());
    }

    #[test]
    fn resize_moves_without_redrawing() {
        let mut chart = loaded_chart();
        chart.set_width(460.0).unwrap();
        chart.set_width(460.0).unwrap();

        let renderer = chart.renderer();
        assert_eq!(renderer.draws.len(), 1);
        assert_eq!(renderer.resizes.len(), 2);
        assert_eq!(renderer.resizes[0], renderer.resizes[1]);
        assert_eq!(renderer.resizes[0].columns[1].x, 200.0);
    }

    #[test]
    fn host_resize_only_applies_when_dynamic() {
        let mut chart = loaded_chart();
        chart.host_resize(900.0).unwrap();
        assert_eq!(chart.width(), 260.0);
        assert!(chart.renderer().resizes.is_empty());

        chart.set_dynamic_width(true);
        chart.host_resize(460.0).unwrap();
        assert_eq!(chart.width(), 460.0);
        assert_eq!(chart.renderer().resizes.len(), 1);
    }

    #[test]
    fn set_height_keeps_dynamic_width() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, true);
        chart.set_height(300.0).unwrap();
        assert!(chart.is_dynamic_width());
        assert_eq!(chart.height(), 300.0);
    }

    #[test]
    fn empty_dataset_warns_and_stays_undrawn() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let ticket = chart.load_data(LoadRequest::new("empty.csv", columns())).unwrap();
        chart.complete_load(&ticket, Ok(Dataset::default())).unwrap();

        assert_eq!(chart.phase(), ChartPhase::Loaded);
        assert_eq!(chart.current_category(), "");
        assert_eq!(chart.draw(), Err(ChartError::NoCategories));
        let warnings = chart.take_warnings();
        assert!(warnings[0].contains("Can't find categories"));
    }

    #[test]
    fn failed_load_is_reported() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let ticket = chart.load_data(LoadRequest::new("gone.csv", columns())).unwrap();
        let err = ChartError::Fetch("404".to_string());
        assert_eq!(chart.complete_load(&ticket, Err(err.clone())), Err(err));
        assert_eq!(chart.phase(), ChartPhase::Ready);
        assert!(chart.take_warnings()[0].starts_with("Failed to load gone.csv"));
    }

    #[test]
    fn skipped_rows_are_summarized() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let ticket = chart.load_data(LoadRequest::new("a.csv", columns())).unwrap();
        let data = build_dataset(
            &[row("A-B", "0", "1", "X", "1"), row("A", "0", "1", "X", "2")],
            "-",
        );
        chart.complete_load(&ticket, Ok(data)).unwrap();
        assert_eq!(chart.phase(), ChartPhase::Drawn);
        assert_eq!(
            chart.take_warnings(),
            vec!["Skipped 1 malformed row(s) in a.csv".to_string()]
        );
    }

    #[test]
    fn inline_source_is_named_in_warnings() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        let source = DataSource::Inline {
            name: "pasted".to_string(),
            text: String::new(),
        };
        let ticket = chart.load_data(LoadRequest::new(source, columns())).unwrap();
        chart.complete_load(&ticket, Ok(Dataset::default())).unwrap();
        assert!(chart.take_warnings()[0].contains("in pasted!"));
    }

    #[test]
    fn reload_resets_drawn_state() {
        let mut chart = loaded_chart();
        let ticket = chart.load_data(LoadRequest::new("again.csv", columns())).unwrap();
        assert_eq!(chart.phase(), ChartPhase::Loading);
        assert!(chart.layout().is_none());
        assert_eq!(chart.redraw(), Ok(()));
        chart.complete_load(&ticket, Ok(dataset())).unwrap();
        assert_eq!(chart.renderer().draws.len(), 2);
    }

    #[test]
    fn queued_draw_waits_for_queued_load() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        assert!(chart.load_data(LoadRequest::new("a.csv", columns())).is_none());
        assert!(chart.draw().is_ok());

        let tickets = chart.initialize();
        assert_eq!(chart.phase(), ChartPhase::Loading);
        assert_eq!(chart.draw(), Ok(()));
        assert!(chart.renderer().draws.is_empty());

        chart.complete_load(&tickets[0], Ok(dataset())).unwrap();
        assert_eq!(chart.renderer().draws.len(), 1);
        assert_eq!(chart.phase(), ChartPhase::Drawn);
    }

    #[test]
    fn draw_without_any_load_is_not_loaded() {
        let mut chart = SequenceChart::new(RecordingRenderer::default(), 260.0, 100.0, false);
        chart.initialize();
        assert_eq!(chart.draw(), Err(ChartError::NotLoaded));
    }

    #[test]
    fn failed_reload_drops_previous_data() {
        let mut chart = loaded_chart();
        let ticket = chart.load_data(LoadRequest::new("gone.csv", columns())).unwrap();
        assert!(chart.categories().is_empty());

        let err = ChartError::Fetch("404".to_string());
        assert_eq!(chart.complete_load(&ticket, Err(err.clone())), Err(err));
        assert!(chart.categories().is_empty());
        assert!(chart.sequence_ids("X").is_empty());
        assert_eq!(chart.renderer().clears, 1);
        assert_eq!(chart.phase(), ChartPhase::Ready);
    }
}
