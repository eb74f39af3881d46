//! Template rendering for stamp.
//! All templates of a run are compiled into one MiniJinja environment, so any
//! template can include another, or a nested alias, by name.

use crate::aliases::TemplateAliases;
use crate::config::Config;
use crate::constants::{DEFAULT_LEFT_DELIM, DEFAULT_RIGHT_DELIM};
use crate::error::{Error, Result};
use crate::funcs::{template_funcs, FuncMap};
use crate::gather::{gather_templates, Streams};
use crate::metrics::Metrics;
use crate::namer::{OutputNamer, StaticNamer, TemplatedNamer};
use crate::template::Template;
use log::debug;
use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A flag that stops a render pass before its next template.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// MiniJinja-based render engine.
///
/// Undefined variables are errors, output is never auto-escaped, and trailing
/// newlines are kept so rendered files match their templates byte for byte.
pub struct MiniJinjaRenderer {
    /// Shared namespace of every compiled template
    env: Environment<'static>,
    /// Rendering context handed to every template
    context: serde_json::Value,
    cancel: Option<CancelFlag>,
}

impl MiniJinjaRenderer {
    /// Creates a renderer and loads the nested aliases into its namespace.
    ///
    /// # Arguments
    /// * `funcs` - Extra functions, merged over the built-in `tpl` and `tmpl`
    /// * `left_delim`, `right_delim` - Variable delimiters
    /// * `nested` - Templates to register under their aliases
    /// * `context` - Rendering context
    ///
    /// # Errors
    /// * `Error::ConfigError` if the delimiters are unusable
    /// * `Error::LoadError` if a nested template cannot be read
    /// * `Error::ExecutionError` if a nested template does not compile
    pub fn new(
        funcs: FuncMap,
        left_delim: &str,
        right_delim: &str,
        nested: &TemplateAliases,
        context: serde_json::Value,
    ) -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);

        if left_delim != DEFAULT_LEFT_DELIM || right_delim != DEFAULT_RIGHT_DELIM {
            let syntax = SyntaxConfig::builder()
                .variable_delimiters(left_delim.to_string(), right_delim.to_string())
                .build()
                .map_err(|e| Error::ConfigError(format!("invalid delimiters: {e}")))?;
            env.set_syntax(syntax);
        }

        for (name, value) in template_funcs(&context).into_iter().chain(funcs) {
            env.add_global(name, value);
        }

        for (alias, path) in nested {
            let source = std::fs::read_to_string(path).map_err(|source| Error::LoadError {
                name: path.display().to_string(),
                source,
            })?;
            debug!("Registering nested template '{alias}' from {}", path.display());
            env.add_template_owned(alias.clone(), source)?;
        }

        Ok(Self { env, context, cancel: None })
    }

    /// Stops rendering before the next template once `flag` is set.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn context(&self) -> &serde_json::Value {
        &self.context
    }

    /// Chooses the output namer for directory inputs.
    pub fn namer(&self, cfg: &Config) -> Box<dyn OutputNamer> {
        match &cfg.output_map {
            Some(mapping) => {
                Box::new(TemplatedNamer::new(self.env.clone(), mapping.clone(), self.context.clone()))
            }
            None => {
                let output_dir = cfg.output_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                Box::new(StaticNamer::new(output_dir))
            }
        }
    }

    /// Gathers the configured templates and renders them in order.
    ///
    /// `metrics` is reset first and always reflects what happened, even when an
    /// error is returned.
    pub fn run_templates(
        &mut self,
        cfg: &Config,
        streams: &mut Streams,
        metrics: &mut Metrics,
    ) -> Result<()> {
        metrics.reset();

        let start = Instant::now();
        let namer = self.namer(cfg);
        let gathered = gather_templates(cfg, streams, namer.as_ref());
        metrics.gather_duration = start.elapsed();
        let templates = gathered.map_err(|e| {
            metrics.errors += 1;
            Error::GatherError(Box::new(e))
        })?;
        metrics.templates_gathered = templates.len();

        let start = Instant::now();
        let result = self.render_templates(templates, metrics);
        metrics.total_render_duration = start.elapsed();
        result
    }

    /// Renders templates in order, stopping at the first failure.
    pub fn render_templates(&mut self, templates: Vec<Template>, metrics: &mut Metrics) -> Result<()> {
        for template in templates {
            if self.cancel.as_ref().is_some_and(CancelFlag::is_cancelled) {
                metrics.errors += 1;
                return Err(Error::CancelledError { next: template.name });
            }

            let name = template.name.clone();
            let start = Instant::now();
            let result = self.render_template(template);
            metrics.render_duration.insert(name.clone(), start.elapsed());
            if let Err(e) = result {
                metrics.errors += 1;
                return Err(Error::RenderError { name, source: Box::new(e) });
            }
            metrics.templates_processed += 1;
        }
        Ok(())
    }

    /// Compiles a template into the shared namespace.
    ///
    /// # Errors
    /// * `Error::ConfigError` if the name is already taken
    /// * `Error::ExecutionError` if the template does not compile
    pub fn compile(&mut self, template: &Template) -> Result<()> {
        if self.env.get_template(&template.name).is_ok() {
            return Err(Error::ConfigError(format!(
                "template name '{}' is used more than once",
                template.name
            )));
        }
        self.env.add_template_owned(template.name.clone(), template.contents.clone())?;
        Ok(())
    }

    /// Compiles and executes one template, then writes and closes its target.
    pub fn render_template(&mut self, mut template: Template) -> Result<()> {
        debug!("Rendering template '{}'", template.name);
        self.compile(&template)?;
        let rendered = self.env.get_template(&template.name)?.render(&self.context)?;

        let mut target = template.target.take().ok_or_else(|| {
            Error::ConfigError(format!("no output target for template '{}'", template.name))
        })?;
        target.write_all(rendered.as_bytes())?;
        target.close()?;
        Ok(())
    }

    /// Renders a string against the shared namespace without registering it.
    pub fn render_str(&self, name: &str, source: &str) -> Result<String> {
        Ok(self.env.render_named_str(name, source, &self.context)?)
    }
}
