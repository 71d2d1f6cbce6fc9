//! pathfacet CLI: browse a knowledge-graph answer set with facet filters.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};

use pathfacet::config::EngineConfig;
use pathfacet::engine::Engine;
use pathfacet::filter::{Filter, make_tag_filter};
use pathfacet::graph::ResultSet;
use pathfacet::outline::PathOutline;
use pathfacet::store::{DurableStore, MemStore, Storage};
use pathfacet::tag::{Family, Scope};

#[derive(Parser)]
#[command(name = "pathfacet", version, about = "Faceted evidence browser for knowledge-graph results")]
struct Cli {
    /// Normalized result set (JSON).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Directory for persistent seen status. Memory-only when omitted.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Engine configuration (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Activate a facet by tag id; prefix with `!` to exclude.
    #[arg(long = "filter", global = true)]
    filters: Vec<String>,

    /// Entity search text; prefix with `!` to exclude.
    #[arg(long, global = true)]
    search: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show result set statistics.
    Info,

    /// List facets of a scope grouped by family.
    Facets {
        #[arg(long, value_enum, default_value = "result")]
        scope: ScopeArg,

        /// Narrow one family: `<family code>=<text>`, e.g. `role=kinase`.
        #[arg(long = "family-search")]
        family_search: Vec<String>,
    },

    /// List results that survive the active filters.
    Results,

    /// Show the path outline of a result, with support paths.
    Outline {
        /// Result id.
        result_id: String,
    },

    /// Inspect and change seen status.
    Seen {
        #[command(subcommand)]
        action: SeenAction,
    },

    /// Wrap character spans of a text in emphasis markers.
    Annotate {
        text: String,

        /// Half-open character range `start,end`. Repeatable.
        #[arg(long = "span", value_parser = parse_span)]
        spans: Vec<SpanArg>,
    },
}

#[derive(Subcommand)]
enum SeenAction {
    /// Show seen edges and paths of a query.
    Show { pk: String },
    /// Mark an edge as seen.
    MarkEdge { pk: String, edge_id: String },
    /// Mark an edge as not seen.
    UnmarkEdge { pk: String, edge_id: String },
    /// Mark a path as seen.
    MarkPath { pk: String, path_id: String },
    /// Forget everything seen for a query.
    Reset { pk: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    #[value(alias = "r")]
    Result,
    #[value(alias = "p")]
    Path,
}

impl From<ScopeArg> for Scope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::Result => Scope::Result,
            ScopeArg::Path => Scope::Path,
        }
    }
}

#[derive(Clone)]
struct SpanArg(Vec<i64>);

fn parse_span(s: &str) -> std::result::Result<SpanArg, String> {
    s.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid span bound {part:?}: {e}"))
        })
        .collect::<std::result::Result<Vec<_>, _>>()
        .map(SpanArg)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let results = match &cli.data {
        Some(path) => {
            let json = std::fs::read_to_string(path).into_diagnostic()?;
            ResultSet::from_json(&json)?
        }
        None => ResultSet::default(),
    };
    let storage: Box<dyn Storage> = match &cli.data_dir {
        Some(dir) => Box::new(DurableStore::open(dir)?),
        None => Box::new(MemStore::new()),
    };

    let mut engine = Engine::new(results, storage, config)?;
    for raw in &cli.filters {
        let filter = facet_filter(&engine, raw);
        engine.activate_filter(filter);
    }
    for raw in &cli.search {
        let filter = match raw.strip_prefix('!') {
            Some(text) => Filter::entity_search(text).negate(),
            None => Filter::entity_search(raw.as_str()),
        };
        engine.activate_filter(filter);
    }

    match cli.command {
        Commands::Info => {
            print!("{}", engine.info());
        }

        Commands::Facets {
            scope,
            family_search,
        } => {
            let mut search = HashMap::new();
            for raw in &family_search {
                let Some((code, text)) = raw.split_once('=') else {
                    miette::bail!("family search must look like <family>=<text>, got {raw:?}");
                };
                let Some(family) = Family::from_code(code) else {
                    miette::bail!("unknown family code {code:?}");
                };
                search.insert(family, text.to_string());
            }

            let grouped = engine.grouped_filters_with_search(scope.into(), search);
            if grouped.is_empty() {
                println!("No facets.");
            }
            for (family, entries) in &grouped {
                println!("{} ({}):", family.caption(), entries.len());
                for entry in entries {
                    let active = entry
                        .id
                        .as_deref()
                        .is_some_and(|id| engine.active_filters().has_tag(id));
                    println!(
                        "  {} {} [{}] {}",
                        if active { "*" } else { " " },
                        entry.name,
                        entry.id.as_deref().unwrap_or(""),
                        entry.count.map(|c| c.to_string()).unwrap_or_default()
                    );
                }
            }
        }

        Commands::Results => {
            let visible = engine.visible_results();
            println!("Results ({} of {}):", visible.len(), engine.results().results.len());
            for result in visible {
                println!("  {} {} ({} paths)", result.id, result.drug_name, result.paths.len());
            }
        }

        Commands::Outline { result_id } => {
            if engine.results().result(&result_id).is_none() {
                miette::bail!("unknown result {result_id:?}");
            }
            let outline = engine.outline(&result_id);
            if outline.is_empty() {
                println!("No visible paths.");
            }
            for path in &outline {
                print_outline(&engine, path);
            }
        }

        Commands::Seen { action } => {
            match action {
                SeenAction::Show { pk } => match engine.seen().record(&pk) {
                    Some(record) => {
                        println!("Seen edges ({}):", record.seen_edges.len());
                        for id in &record.seen_edges {
                            println!("  {id}");
                        }
                        println!("Seen paths ({}):", record.seen_paths.len());
                        for id in &record.seen_paths {
                            println!("  {id}");
                        }
                    }
                    None => println!("Nothing seen for {pk}."),
                },
                SeenAction::MarkEdge { pk, edge_id } => {
                    let changed = engine.seen_mut().mark_edge_seen(&pk, &edge_id);
                    println!("{edge_id}: seen{}", if changed { "" } else { " (unchanged)" });
                }
                SeenAction::UnmarkEdge { pk, edge_id } => {
                    let changed = engine.seen_mut().mark_edge_unseen(&pk, &edge_id);
                    println!("{edge_id}: not seen{}", if changed { "" } else { " (unchanged)" });
                }
                SeenAction::MarkPath { pk, path_id } => {
                    let changed = engine.seen_mut().mark_path_seen(&pk, &path_id);
                    println!("{path_id}: seen{}", if changed { "" } else { " (unchanged)" });
                }
                SeenAction::Reset { pk } => {
                    if engine.seen_mut().reset_seen_status(&pk) {
                        println!("Reset seen status for {pk}.");
                    } else {
                        println!("Nothing seen for {pk}.");
                    }
                }
            }
            engine.flush()?;
        }

        Commands::Annotate { text, spans } => {
            let ranges: Vec<Option<&[i64]>> = spans.iter().map(|s| Some(s.0.as_slice())).collect();
            println!("{}", engine.annotate(&text, &ranges));
        }
    }

    Ok(())
}

/// A facet filter for `raw`, named from the catalogue when it is listed there.
fn facet_filter<S: Storage>(engine: &Engine<S>, raw: &str) -> Filter {
    let (id, negated) = match raw.strip_prefix('!') {
        Some(id) => (id, true),
        None => (raw, false),
    };
    let mut filter = engine
        .results()
        .catalogue
        .get(id)
        .cloned()
        .unwrap_or_else(|| make_tag_filter(id, 1.0, 1.0))
        .with_id(id);
    filter.negated = negated;
    filter
}

fn print_outline<S: Storage>(engine: &Engine<S>, path: &PathOutline) {
    let indent = "  ".repeat(path.depth + 1);
    let mut flags = Vec::new();
    if path.filtered {
        flags.push("filtered");
    }
    if path.truncated {
        flags.push("truncated");
    }
    let flags = if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    };

    let label = engine
        .results()
        .path(&path.path_id)
        .map(|p| {
            p.node_ids()
                .map(|id| engine.results().node_name(id))
                .collect::<Vec<_>>()
                .join(" -> ")
        })
        .unwrap_or_default();
    println!("{indent}{} {}{flags}", path.key, label);

    for support in &path.supports {
        println!("{indent}  supports {}:", support.edge_id);
        for child in &support.paths {
            print_outline(engine, child);
        }
    }
}
