use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use stateseq_core::layout::ChartLayout;
use stateseq_core::svg::render_svg;
use stateseq_core::{ChartConfig, ColumnMap};
use stateseq_csv::{load_str, LoadSummary};

#[derive(Parser, Debug)]
#[command(
    name = "stateseq-cli",
    about = "Summarize a state sequence CSV and export one category as SVG."
)]
struct Args {
    /// Path to the CSV file.
    #[arg(short, long)]
    input: PathBuf,

    /// Column with the delimiter-joined state sequence.
    #[arg(long, default_value = "lineage_coded_phenotype_sequence")]
    states: String,

    /// Column with the state start values.
    #[arg(long, default_value = "lineage_coded_start_updates")]
    starts: String,

    /// Column with the state durations.
    #[arg(long, default_value = "lineage_coded_duration_updates")]
    durations: String,

    #[arg(long, default_value = "treatment")]
    category_column: String,

    #[arg(long, default_value = "replicate")]
    id_column: String,

    /// Delimiter inside the list columns.
    #[arg(short, long, default_value = "-")]
    delim: String,

    /// Category to export; defaults to the first one in the file.
    #[arg(short, long)]
    category: Option<String>,

    /// Write an SVG of the category here.
    #[arg(long)]
    svg: Option<PathBuf>,

    #[arg(long, default_value_t = 800.0)]
    width: f64,

    #[arg(long, default_value_t = 400.0)]
    height: f64,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let data = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Could not read {:?}", args.input))?;

    let columns = ColumnMap::new(
        &args.states,
        &args.starts,
        &args.durations,
        &args.category_column,
        &args.id_column,
    );
    let dataset = load_str(&data, &columns, &args.delim)
        .with_context(|| format!("Could not load {:?}", args.input))?;

    if !dataset.skipped.is_empty() {
        log::warn!("skipped {} malformed row(s)", dataset.skipped.len());
    }

    let summary = LoadSummary::from(&dataset);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "Sequences: {}\nCategories: {}\nSkipped rows: {}",
            summary.sequences,
            summary.categories.len(),
            summary.skipped.len()
        );
        for category in &summary.categories {
            println!(
                "  {}: {} sequences ({} ids), y = [{}, {}]",
                category.category,
                category.sequences,
                category.unique_ids,
                category.domain.y.min,
                category.domain.y.max
            );
        }
    }

    if let Some(path) = &args.svg {
        let Some(first) = dataset.categories.first() else {
            bail!("No categories found in {:?}", args.input);
        };
        let category = match &args.category {
            Some(requested) if dataset.contains_category(requested) => requested.clone(),
            Some(requested) => {
                log::warn!("category `{requested}` not found, exporting `{first}`");
                first.clone()
            }
            None => first.clone(),
        };

        let layout = ChartLayout::build(
            &dataset,
            &category,
            args.width,
            args.height,
            &ChartConfig::default(),
        )?;
        std::fs::write(path, render_svg(&layout, "stateseq"))
            .with_context(|| format!("Could not write {path:?}"))?;
        log::info!("wrote {} sequences of `{category}` to {path:?}", layout.columns.len());
    }

    Ok(())
}
