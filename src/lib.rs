//! stamp renders text templates into files or streams, with values pulled
//! from pluggable data sources. Inputs can be an inline string, a list of
//! files, or a whole directory tree.

/// Nested template aliases
pub mod aliases;

/// Command-line interface
pub mod cli;

/// Configuration file and flag handling
pub mod config;

/// Common constants
pub mod constants;

/// Data sources and the rendering context
pub mod context;

/// Error types and handling
pub mod error;

/// Template helper functions
pub mod funcs;

/// Discovery of input templates and their outputs
pub mod gather;

/// Ignore files and exclude globs for directory inputs
/// Processes nested .stampignore files
pub mod ignore;

pub mod logger;

/// Run metrics
pub mod metrics;

/// Output permission resolution
pub mod mode;

/// Output path naming
pub mod namer;

/// The render engine
pub mod renderer;

/// The template unit
pub mod template;

/// Lazy, idempotent output writers
pub mod writer;

use aliases::parse_template_args;
use config::Config;
use context::{create_context, DataSource, Sources};
use error::Result;
use funcs::FuncMap;
use gather::Streams;
use metrics::Metrics;
use renderer::MiniJinjaRenderer;

/// Renders every template described by `cfg`.
///
/// `cfg` is expected to have had defaults applied and to be valid. The data
/// sources are cleaned up whether rendering succeeds or not, and `metrics`
/// reflects the run either way.
pub fn run(cfg: &Config, streams: &mut Streams, metrics: &mut Metrics) -> Result<()> {
    metrics.reset();
    let mut sources = Sources::from_map(&cfg.context).inspect_err(|_| metrics.errors += 1)?;
    let result = run_with(cfg, &mut sources, FuncMap::new(), std::env::vars(), streams, metrics);
    sources.cleanup();
    result
}

/// Renders every template described by `cfg`, with a caller-supplied data
/// source, function registry and environment.
pub fn run_with<E>(
    cfg: &Config,
    source: &mut dyn DataSource,
    funcs: FuncMap,
    env: E,
    streams: &mut Streams,
    metrics: &mut Metrics,
) -> Result<()>
where
    E: IntoIterator<Item = (String, String)>,
{
    metrics.reset();
    let mut renderer = match build_renderer(cfg, source, funcs, env) {
        Ok(renderer) => renderer,
        Err(e) => {
            metrics.errors += 1;
            return Err(e);
        }
    };
    renderer.run_templates(cfg, streams, metrics)
}

fn build_renderer<E>(
    cfg: &Config,
    source: &mut dyn DataSource,
    funcs: FuncMap,
    env: E,
) -> Result<MiniJinjaRenderer>
where
    E: IntoIterator<Item = (String, String)>,
{
    let nested = parse_template_args(&cfg.templates)?;
    let context = create_context(cfg.context.keys().map(String::as_str), source, env)?;
    MiniJinjaRenderer::new(funcs, cfg.left_delim(), cfg.right_delim(), &nested, context)
}
