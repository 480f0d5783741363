use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use vizgraph::chart::chart_categories;
use vizgraph::{
    AxisRole, ChartType, CompileOptions, CurvePoint, Dataset, DatasetInput, GraphRegistry,
    GraphSpec, VisualizationCompiler,
};

#[derive(Parser, Debug)]
#[command(name = "vizgraph")]
#[command(
    about = "Compile graph definitions into renderer-neutral plot specifications",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the supported chart types grouped by category
    ChartTypes,
    /// Build a graph from a JSON definition and print its plot specification
    Compile(CompileArgs),
}

#[derive(clap::Args, Debug)]
struct CompileArgs {
    /// Graph definition (JSON: graphName, graphType, dataset, selectedFeatures)
    #[arg(long)]
    spec: PathBuf,

    /// Dataset file overriding the definition's dataset (.csv or JSON)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Chart type to switch to after creation
    #[arg(long = "type")]
    chart_type: Option<ChartType>,

    /// Series color (any CSS color: hex, rgb(), hsl() or a named color)
    #[arg(long)]
    color: Option<String>,

    /// Axis assignment such as `x=time`; may be repeated
    #[arg(long = "axis", value_parser = parse_axis)]
    axes: Vec<(AxisRole, String)>,

    /// 1-based row indices to plot, comma separated
    #[arg(long, value_delimiter = ',')]
    rows: Vec<usize>,

    /// Additional Y feature plotted as its own series; may be repeated
    #[arg(long = "more-y", value_delimiter = ',')]
    more_y: Vec<String>,

    /// JSON array of {x, y} points to overlay as a fitted curve
    #[arg(long)]
    fitted: Option<PathBuf>,

    /// JSON file with compile options
    #[arg(long)]
    options: Option<PathBuf>,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn parse_axis(s: &str) -> Result<(AxisRole, String), String> {
    let (role, feature) = s
        .split_once('=')
        .ok_or_else(|| format!("Expected AXIS=FEATURE, got '{}'", s))?;
    let feature = feature.trim();
    if feature.is_empty() {
        return Err(format!("Missing feature name in '{}'", s));
    }
    Ok((role.parse()?, feature.to_string()))
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();

    let args = Args::parse();
    let output = match args.command {
        Command::ChartTypes => list_chart_types(),
        Command::Compile(compile_args) => compile(compile_args)?,
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(output.as_bytes())
        .context("Failed to write output to stdout")?;
    handle.flush().context("Failed to flush stdout")?;

    Ok(())
}

fn list_chart_types() -> String {
    let mut out = String::new();
    for (category, descriptors) in chart_categories() {
        out.push_str(&format!("{}:\n", category));
        for d in descriptors {
            out.push_str(&format!(
                "  {:<14}{:<18}{} feature(s)\n",
                d.type_id, d.display_name, d.required_feature_count
            ));
        }
    }
    out
}

fn compile(args: CompileArgs) -> Result<String> {
    let spec_text = fs::read_to_string(&args.spec)
        .with_context(|| format!("Failed to read graph definition {}", args.spec.display()))?;
    let mut spec: GraphSpec =
        serde_json::from_str(&spec_text).context("Failed to parse graph definition")?;

    if let Some(ref path) = args.data {
        spec.dataset = Some(DatasetInput::from(load_dataset(path)?));
    }
    // A definition without a type takes the one from the command line
    let mut pending_type = args.chart_type;
    if spec.graph_type.is_none() {
        spec.graph_type = pending_type.take().map(|t| t.id().to_string());
    }

    let options = match args.options {
        Some(ref path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read options {}", path.display()))?;
            serde_json::from_str::<CompileOptions>(&text)
                .context("Failed to parse compile options")?
        }
        None => CompileOptions::default(),
    };

    let mut registry = GraphRegistry::new();
    registry.on_change(|event, store| {
        debug!(?event, graphs = store.len(), "Registry changed");
    });

    let id = registry
        .try_create_graph(spec)
        .context("Failed to create graph")?;

    if let Some(chart_type) = pending_type {
        ensure(registry.change_type(&id, chart_type), "change chart type")?;
    }
    for (role, feature) in &args.axes {
        ensure(registry.change_axis(&id, *role, feature), "change axis")?;
    }
    if let Some(ref color) = args.color {
        ensure(registry.change_graph_color(&id, color), "change color")?;
    }
    if !args.rows.is_empty() {
        ensure(registry.set_showed_datapoints(&id, args.rows.iter().copied()), "set rows")?;
    }
    if !args.more_y.is_empty() {
        ensure(registry.set_more_y_axes(&id, args.more_y.clone()), "set extra Y axes")?;
    }
    if let Some(ref path) = args.fitted {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read fitted curve {}", path.display()))?;
        let points: Vec<CurvePoint> =
            serde_json::from_str(&text).context("Failed to parse fitted curve points")?;
        ensure(registry.apply_curve_fitting(&id, points), "apply curve fitting")?;
    }

    let graph = registry
        .get_graph_by_id(&id)
        .ok_or_else(|| anyhow!("Graph {} vanished from the registry", id))?;
    let plot = VisualizationCompiler::new(options)
        .try_visualize(graph)
        .context("Failed to compile graph")?;

    let mut json = if args.pretty {
        serde_json::to_string_pretty(&plot)
    } else {
        serde_json::to_string(&plot)
    }
    .context("Failed to serialize plot specification")?;
    json.push('\n');
    Ok(json)
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    if is_csv {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dataset {}", path.display()))?;
        Dataset::from_csv_reader(file).context("Failed to read CSV dataset")
    } else {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset {}", path.display()))?;
        let input: DatasetInput =
            serde_json::from_str(&text).context("Failed to parse JSON dataset")?;
        Ok(input.into_dataset())
    }
}

fn ensure(applied: bool, action: &str) -> Result<()> {
    if applied {
        Ok(())
    } else {
        Err(anyhow!("Failed to {}", action))
    }
}
