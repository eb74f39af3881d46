//! Template helper functions that need the shared template namespace.

use crate::constants::INLINE_TEMPLATE_NAME;
use indexmap::IndexMap;
use minijinja::value::{from_args, Object, ObjectRepr, Value};
use minijinja::{Error, ErrorKind, State};
use std::sync::Arc;

/// Functions made available to every template, by name.
pub type FuncMap = IndexMap<String, Value>;

/// Renders other templates from inside a template.
///
/// Called directly (`tpl("{{ x }}")`) it renders an inline template string.
/// As the `tmpl` namespace it offers `tmpl.exec(name)` and `tmpl.inline(source)`.
/// Both take an optional context, defaulting to the shared rendering context.
#[derive(Debug)]
pub struct TemplateFuncs {
    context: Value,
}

impl TemplateFuncs {
    pub fn new(context: Value) -> Self {
        Self { context }
    }

    fn inline(&self, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let (source, ctx): (String, Option<Value>) = from_args(args)?;
        let ctx = ctx.unwrap_or_else(|| self.context.clone());
        state.env().render_named_str(INLINE_TEMPLATE_NAME, &source, ctx).map(Value::from)
    }

    fn exec(&self, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        let (name, ctx): (String, Option<Value>) = from_args(args)?;
        let ctx = ctx.unwrap_or_else(|| self.context.clone());
        state.env().get_template(&name)?.render(ctx).map(Value::from)
    }
}

impl Object for TemplateFuncs {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call(self: &Arc<Self>, state: &State<'_, '_>, args: &[Value]) -> Result<Value, Error> {
        self.inline(state, args)
    }

    fn call_method(
        self: &Arc<Self>,
        state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, Error> {
        match method {
            "exec" => self.exec(state, args),
            "inline" => self.inline(state, args),
            _ => Err(Error::new(
                ErrorKind::UnknownMethod,
                format!("tmpl has no method named {method}"),
            )),
        }
    }
}

/// Builds the functions that render through the shared namespace.
pub fn template_funcs(context: &serde_json::Value) -> FuncMap {
    let funcs = Value::from_object(TemplateFuncs::new(Value::from_serialize(context)));
    let mut map = FuncMap::new();
    map.insert("tpl".to_string(), funcs.clone());
    map.insert("tmpl".to_string(), funcs);
    map
}
