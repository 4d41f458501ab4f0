use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use syntra_fx::config::{self, EffectsConfig};
use syntra_fx::engine::Engine;
use syntra_fx::form::{RecordingTransport, TransportError};
use syntra_fx::output::{self, FormReport, PageCheck, ScrollStep, SimulationReport};
use syntra_fx::{page, render, rotator};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use walkdir::WalkDir;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "syntra-fx")]
#[command(about = "Simulate the SyntraEdge site effects against page fixtures")]
#[command(long_about = "\
Simulate the SyntraEdge site effects against page fixtures

A page fixture (TOML or JSON) describes the element tree a browser would
report: tags, ids, classes, attributes, inline styles and each element's
vertical box. The simulator loads it, runs page-load initialization, scrolls
the viewport, advances a virtual clock, and prints what happened.

Site directory layout:

  site/
  ├── config.toml          # Effect settings (optional, overrides defaults)
  └── pages/
      ├── home.toml
      └── contact.json

Logging goes to stderr; set RUST_LOG=syntra_fx=debug to trace every reveal,
counter and rotation step.

Run 'syntra-fx gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Directory holding config.toml
    #[arg(long, default_value = ".", global = true)]
    site: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct SimulateArgs {
    /// Page fixture (.toml or .json)
    page: PathBuf,

    /// Scroll to this offset (px); repeat for a scroll sequence
    #[arg(long = "scroll", value_name = "PX")]
    scrolls: Vec<f64>,

    /// Virtual time to run after each scroll
    #[arg(long, default_value_t = 500)]
    step_ms: u64,

    /// Virtual time to run at the end
    #[arg(long, default_value_t = 5000)]
    run_ms: u64,

    /// Set a form field before submitting, as NAME=VALUE
    #[arg(long = "fill", value_name = "NAME=VALUE", value_parser = parse_fill)]
    fills: Vec<(String, String)>,

    /// Submit the contact form after scrolling
    #[arg(long)]
    submit: bool,

    /// Make every form request fail with a network error
    #[arg(long)]
    fail_network: bool,

    /// Navigate to this page at the end (e.g. careers.html)
    #[arg(long, value_name = "PAGE")]
    navigate: Option<String>,

    /// Write the final document as HTML
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a page fixture through load, scroll, and time
    Simulate(SimulateArgs),
    /// Validate every page fixture under a directory
    Check {
        /// Directory to scan for .toml/.json fixtures
        dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn parse_fill(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected NAME=VALUE, got {raw:?}")),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => {
            let config = config::load_config(&cli.site)?;
            let report = simulate(&args, config)?;
            output::print_simulation(&report);
        }
        Command::Check { dir } => {
            let checks = check(&dir);
            output::print_check(&checks);
            let failed = checks.iter().filter(|c| c.result.is_err()).count();
            if failed > 0 {
                return Err(format!("{failed} page fixture(s) failed to load").into());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn simulate(
    args: &SimulateArgs,
    config: EffectsConfig,
) -> Result<SimulationReport, Box<dyn std::error::Error>> {
    let spec = page::load_page(&args.page)?;
    let doc = spec.to_document()?;
    let transport = if args.fail_network {
        RecordingTransport::failing(TransportError::Network(
            "simulated network failure".to_string(),
        ))
    } else {
        RecordingTransport::new()
    };
    let mut engine = Engine::new(doc, config, transport)?;

    let mut report = SimulationReport {
        title: spec.title.clone(),
        elements: spec.element_count(),
        ..SimulationReport::default()
    };

    let init = engine.init()?;
    report.active_link = init
        .active_link
        .map(|n| output::element_label(engine.document(), n));
    report.observed = init.observed;
    report.revealed_on_load = output::element_labels(engine.document(), &init.revealed_on_load);

    for &scroll_y in &args.scrolls {
        let revealed = engine.scroll_to(scroll_y)?;
        report.scrolls.push(ScrollStep {
            scroll_y,
            revealed: output::element_labels(engine.document(), &revealed),
        });
        engine.run_for(args.step_ms)?;
    }

    if args.submit {
        fill_fields(&mut engine, &args.fills);
        let outcome = engine.submit_contact_form();
        engine.advance(0)?;
        report.form = Some(FormReport {
            outcome,
            delivery: None,
            requests: Vec::new(),
        });
    }

    engine.run_for(args.run_ms)?;
    report.elapsed_ms = engine.now_ms();
    report.tasks_run = engine.tasks_run();

    if let Some(form) = report.form.as_mut() {
        form.delivery = engine.forms().deliveries().last().copied().flatten();
        form.requests = engine.transport().requests().to_vec();
    }

    let doc = engine.document();
    let revealed: Vec<_> = engine.reveal().revealed().collect();
    report.revealed = output::element_labels(doc, &revealed);
    report.counters = doc
        .query_all(".counter-number")?
        .into_iter()
        .map(|n| (output::element_label(doc, n), doc.text(n).to_string()))
        .collect();
    report.rotation = engine.rotation().and_then(|handle| {
        rotator::displayed_fragments(doc, engine.rotator().fragments(handle))
            .first()
            .map(|n| doc.text(*n).to_string())
    });

    if let Some(target) = &args.navigate {
        report.location = Some(engine.navigate_to_page(target).to_string());
    }

    if let Some(path) = &args.html {
        let html = render::render_document(engine.document(), &spec.title);
        std::fs::write(path, html.into_string())?;
        report.html_path = Some(path.clone());
    }

    Ok(report)
}

/// Apply `--fill` values to the named fields of the contact form.
fn fill_fields<T: syntra_fx::form::Transport>(engine: &mut Engine<T>, fills: &[(String, String)]) {
    let form_id = engine.config().form.form_id.clone();
    let doc = engine.document_mut();
    let Some(form) = doc.by_id(&form_id) else {
        return;
    };
    for (name, value) in fills {
        let fields: Vec<_> = doc
            .descendants(form)
            .into_iter()
            .filter(|n| doc.attr(*n, "name") == Some(name.as_str()))
            .collect();
        for field in fields {
            doc.node_mut(field).value = value.clone();
        }
    }
}

/// Load and build every page fixture under `dir`. `config.toml` files are
/// site config, not pages.
fn check(dir: &Path) -> Vec<PageCheck> {
    let mut checks = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                checks.push(PageCheck {
                    path: err.path().unwrap_or(dir).to_path_buf(),
                    result: Err(err.to_string()),
                });
                continue;
            }
        };
        let path = entry.path();
        if !entry.file_type().is_file()
            || !page::is_page_file(path)
            || entry.file_name() == "config.toml"
        {
            continue;
        }
        let result = page::load_page(path)
            .and_then(|spec| spec.to_document().map(|_| spec.element_count()))
            .map_err(|e| e.to_string());
        checks.push(PageCheck {
            path: path.strip_prefix(dir).unwrap_or(path).to_path_buf(),
            result,
        });
    }
    checks
}
