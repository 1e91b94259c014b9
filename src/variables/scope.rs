//! Classification of `{{...}}` expressions into variable scopes.
//!
//! Every expression is turned into a [`VariableRef`] before any lookup
//! happens, so the resolver dispatches over a closed set of variants.

use super::VarError;

/// Which half of a recorded step a `steps.` reference reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDataKind {
    Request,
    Response,
}

impl StepDataKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepDataKind::Request => "request",
            StepDataKind::Response => "response",
        }
    }
}

/// A classified variable reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableRef {
    /// `{{name}}`, looked up through the precedence chain.
    Unscoped { name: String, optional: bool },
    /// `{{profile.K}}`
    Profile { key: String, optional: bool },
    /// `{{api.K}}`
    Api { key: String, optional: bool },
    /// `{{endpoint.K}}`
    Endpoint { key: String, optional: bool },
    /// `{{env.K}}`
    Env { key: String, optional: bool },
    /// `{{secret.K}}`
    Secret { key: String, optional: bool },
    /// `{{plugins.NAME.FUNC}}` or `{{plugins.NAME.FUNC(a, b)}}`.
    /// `args` is `None` when no parentheses were written.
    Plugin {
        plugin: String,
        function: String,
        args: Option<Vec<String>>,
    },
    /// `{{$NAME}}`
    Dynamic { name: String },
    /// `{{steps.ID.KIND[.PATH]}}`
    Step {
        step_id: String,
        kind: StepDataKind,
        path: Option<String>,
    },
}

impl VariableRef {
    /// True if the reference carried a trailing `?` optional marker.
    pub fn is_optional(&self) -> bool {
        match self {
            VariableRef::Unscoped { optional, .. }
            | VariableRef::Profile { optional, .. }
            | VariableRef::Api { optional, .. }
            | VariableRef::Endpoint { optional, .. }
            | VariableRef::Env { optional, .. }
            | VariableRef::Secret { optional, .. } => *optional,
            VariableRef::Plugin { .. } | VariableRef::Dynamic { .. } | VariableRef::Step { .. } => {
                false
            }
        }
    }
}

/// Classifies a trimmed expression (the text between `{{` and `}}`).
///
/// Names that contain a dot but no known scope prefix are treated as unscoped
/// keys, so `{{app.name}}` looks up the literal key `app.name`.
pub fn classify(expression: &str) -> Result<VariableRef, VarError> {
    let expression = expression.trim();

    if let Some(name) = expression.strip_prefix('$') {
        return Ok(VariableRef::Dynamic {
            name: name.to_string(),
        });
    }

    if let Some(rest) = expression.strip_prefix("plugins.") {
        return classify_plugin(expression, rest);
    }

    if let Some(rest) = expression.strip_prefix("steps.") {
        return classify_step(expression, rest);
    }

    let (name, optional) = match expression.strip_suffix('?') {
        Some(stripped) => (stripped.trim_end(), true),
        None => (expression, false),
    };

    let scoped = |prefix: &str| name.strip_prefix(prefix).map(str::to_string);

    let reference = if let Some(key) = scoped("profile.") {
        VariableRef::Profile { key, optional }
    } else if let Some(key) = scoped("api.") {
        VariableRef::Api { key, optional }
    } else if let Some(key) = scoped("endpoint.") {
        VariableRef::Endpoint { key, optional }
    } else if let Some(key) = scoped("env.") {
        VariableRef::Env { key, optional }
    } else if let Some(key) = scoped("secret.") {
        VariableRef::Secret { key, optional }
    } else {
        VariableRef::Unscoped {
            name: name.to_string(),
            optional,
        }
    };

    Ok(reference)
}

fn classify_plugin(expression: &str, rest: &str) -> Result<VariableRef, VarError> {
    let invalid = || VarError::InvalidPluginFormat {
        expression: expression.to_string(),
    };

    let (head, args) = match rest.find('(') {
        Some(open) => {
            let inner = rest[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
            (&rest[..open], Some(split_arguments(inner)))
        }
        None => (rest, None),
    };

    let (plugin, function) = head.split_once('.').ok_or_else(invalid)?;
    let (plugin, function) = (plugin.trim(), function.trim());
    if plugin.is_empty() || function.is_empty() {
        return Err(invalid());
    }

    Ok(VariableRef::Plugin {
        plugin: plugin.to_string(),
        function: function.to_string(),
        args,
    })
}

fn classify_step(expression: &str, rest: &str) -> Result<VariableRef, VarError> {
    let mut parts = rest.splitn(3, '.');
    let step_id = parts.next().unwrap_or_default();
    let kind = parts.next();

    let kind = match kind {
        Some(kind) if !step_id.is_empty() => kind,
        _ => {
            return Err(VarError::InvalidStepFormat {
                expression: expression.to_string(),
            })
        }
    };

    let kind = match kind {
        "request" => StepDataKind::Request,
        "response" => StepDataKind::Response,
        other => {
            return Err(VarError::InvalidStepDataType {
                kind: other.to_string(),
                expression: expression.to_string(),
            })
        }
    };

    let path = parts.next().filter(|p| !p.is_empty()).map(str::to_string);

    Ok(VariableRef::Step {
        step_id: step_id.to_string(),
        kind,
        path,
    })
}

/// Splits a plugin argument list on top-level commas.
///
/// Arguments are trimmed; one pair of matching single or double quotes around
/// an argument is removed. Commas inside quotes do not split.
fn split_arguments(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for ch in inner.chars() {
        match (ch, quote) {
            ('"' | '\'', None) => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(ch);
            }
            (',', None) => args.push(unquote(&current)),
            _ => current.push(ch),
        }
        if ch == ',' && quote.is_none() {
            current.clear();
        }
    }
    args.push(unquote(&current));

    args
}

fn unquote(raw: &str) -> String {
    let trimmed = raw.trim();
    for q in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(q) && trimmed.ends_with(q) {
            return trimmed[1..trimmed.len() - 1].to_string();
        }
    }
    trimmed.to_string()
}
