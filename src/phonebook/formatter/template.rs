//! Template plugin units.
//!
//! A unit is a `*.jinja` file. Each unit gets its own [`Environment`] whose
//! loader is rooted at the unit's folder, so `{% import %}` and
//! `{% from ... import %}` resolve against sibling units and nothing else.

use super::{Formatter, PluginWarning};
use crate::error::{PhonebookError, Result};
use minijinja::value::Value;
use minijinja::{context, path_loader, Environment};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// File extension of plugin units.
pub const UNIT_EXTENSION: &str = "jinja";

/// Top-level `{% macro NAME` and `{% set NAME` declarations.
static DECLARATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{%[-+]?\s*(macro|set)\s+([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex")
});

/// A single-argument macro exported by a plugin unit.
pub struct TemplateFormatter {
    name: String,
    template: String,
    env: Arc<Environment<'static>>,
}

impl Formatter for TemplateFormatter {
    fn name(&self) -> &str {
        &self.name
    }

    fn format(&self, value: &serde_json::Value) -> Result<String> {
        let template = self.env.get_template(&self.template)?;
        let state = template.eval_to_state(context! {})?;
        let callable = state.lookup(&self.name).ok_or_else(|| {
            PhonebookError::Formatter(format!(
                "{} no longer exports {}",
                self.template, self.name
            ))
        })?;
        let rendered = callable.call(&state, &[Value::from_serialize(value)])?;
        Ok(rendered.to_string())
    }
}

/// What loading one unit produced.
#[derive(Default)]
pub(crate) struct UnitScan {
    pub formatters: Vec<TemplateFormatter>,
    pub warnings: Vec<PluginWarning>,
}

/// Loads a unit and extracts every format-capable type it declares.
///
/// Never fails: syntax or evaluation errors become a warning for the unit,
/// and declared names that can't format become one warning each.
pub(crate) fn scan_unit(path: &Path) -> UnitScan {
    let mut scan = UnitScan::default();
    let folder = path.parent().unwrap_or_else(|| Path::new("."));

    let (Some(file_name), Ok(source)) = (
        path.file_name().map(|n| n.to_string_lossy().into_owned()),
        fs::read_to_string(path),
    ) else {
        scan.warnings
            .push(PluginWarning::unit(path, "unit could not be read"));
        return scan;
    };

    let declared = declared_names(&source);

    let mut env = Environment::new();
    env.set_loader(path_loader(folder));
    if let Err(err) = env.add_template_owned(file_name.clone(), source) {
        scan.warnings.push(PluginWarning::unit(
            path,
            format!("failed to load unit: {}", err),
        ));
        return scan;
    }
    let env = Arc::new(env);

    let exports = match exported_types(&env, &file_name) {
        Ok(exports) => exports,
        Err(err) => {
            scan.warnings.push(PluginWarning::unit(
                path,
                format!("failed to evaluate unit: {}", err),
            ));
            return scan;
        }
    };

    for (name, arity, kind) in exports {
        if name.starts_with("__") || !declared.contains(&name) {
            continue;
        }
        if arity != Some(1) {
            scan.warnings.push(PluginWarning::type_without_format(
                &name,
                folder,
                &kind,
            ));
            continue;
        }
        scan.formatters.push(TemplateFormatter {
            name,
            template: file_name.clone(),
            env: Arc::clone(&env),
        });
    }
    scan
}

/// Every top-level export with its macro arity (`None` for non-macros) and a
/// description for warnings.
fn exported_types(
    env: &Environment<'static>,
    template: &str,
) -> std::result::Result<Vec<(String, Option<usize>, String)>, minijinja::Error> {
    let template = env.get_template(template)?;
    let state = template.eval_to_state(context! {})?;
    let mut exports: Vec<_> = state
        .exports()
        .into_iter()
        .filter_map(|name| {
            let value = state.lookup(name)?;
            let arity = macro_arity(&value);
            let kind = match arity {
                Some(1) => "macro with 1 argument".to_string(),
                Some(n) => format!("macro with {} arguments", n),
                None => value.kind().to_string(),
            };
            Some((name.to_string(), arity, kind))
        })
        .collect();
    exports.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(exports)
}

fn macro_arity(value: &Value) -> Option<usize> {
    let arguments = value.get_attr("arguments").ok()?;
    if arguments.is_undefined() || value.get_attr("name").ok()?.is_undefined() {
        return None;
    }
    arguments.len()
}

fn declared_names(source: &str) -> BTreeSet<String> {
    DECLARATION_RE
        .captures_iter(source)
        .map(|caps| caps[2].to_string())
        .collect()
}
