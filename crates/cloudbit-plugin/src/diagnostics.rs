//! Diagnostics reported back to Terraform

use crate::proto::tfplugin6;

/// Severity of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// One step of an attribute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathStep {
    Attribute(String),
    Index(i64),
    Key(String),
}

/// Path to an attribute inside a configuration or state value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributePath(pub Vec<PathStep>);

impl AttributePath {
    pub fn root(name: impl Into<String>) -> Self {
        Self(vec![PathStep::Attribute(name.into())])
    }

    pub fn attribute(&self, name: impl Into<String>) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Attribute(name.into()));
        Self(steps)
    }

    pub fn index(&self, index: usize) -> Self {
        let mut steps = self.0.clone();
        steps.push(PathStep::Index(index as i64));
        Self(steps)
    }
}

impl std::fmt::Display for AttributePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, step) in self.0.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
                PathStep::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}

impl From<&AttributePath> for tfplugin6::AttributePath {
    fn from(path: &AttributePath) -> Self {
        use tfplugin6::attribute_path::{Step, step::Selector};

        tfplugin6::AttributePath {
            steps: path
                .0
                .iter()
                .map(|step| Step {
                    selector: Some(match step {
                        PathStep::Attribute(name) => Selector::AttributeName(name.clone()),
                        PathStep::Index(index) => Selector::ElementKeyInt(*index),
                        PathStep::Key(key) => Selector::ElementKeyString(key.clone()),
                    }),
                })
                .collect(),
        }
    }
}

/// A single diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub summary: String,
    pub detail: String,
    pub attribute: Option<AttributePath>,
}

impl Diagnostic {
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn warning(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            summary: summary.into(),
            detail: detail.into(),
            attribute: None,
        }
    }

    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        self.attribute = Some(path);
        self
    }
}

impl From<&Diagnostic> for tfplugin6::Diagnostic {
    fn from(diag: &Diagnostic) -> Self {
        let severity = match diag.severity {
            Severity::Error => tfplugin6::diagnostic::Severity::Error,
            Severity::Warning => tfplugin6::diagnostic::Severity::Warning,
        };

        tfplugin6::Diagnostic {
            severity: severity as i32,
            summary: diag.summary.clone(),
            detail: diag.detail.clone(),
            attribute: diag.attribute.as_ref().map(Into::into),
        }
    }
}

/// An ordered collection of diagnostics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.0.push(diag);
    }

    pub fn add_error(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::error(summary, detail));
    }

    pub fn add_warning(&mut self, summary: impl Into<String>, detail: impl Into<String>) {
        self.push(Diagnostic::warning(summary, detail));
    }

    pub fn append(&mut self, other: Diagnostics) {
        self.0.extend(other.0);
    }

    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.0.iter()
    }

    pub(crate) fn to_proto(&self) -> Vec<tfplugin6::Diagnostic> {
        self.0.iter().map(Into::into).collect()
    }
}

impl From<Diagnostic> for Diagnostics {
    fn from(diag: Diagnostic) -> Self {
        Self(vec![diag])
    }
}

impl From<crate::error::PluginError> for Diagnostics {
    fn from(err: crate::error::PluginError) -> Self {
        Diagnostic::error("Value Conversion Error", err.to_string()).into()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_error_ignores_warnings() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Deprecated", "use something else");
        assert!(!diags.has_error());

        diags.add_error("Client Error", "boom");
        assert!(diags.has_error());
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn test_path_display() {
        let path = AttributePath::root("health_check")
            .attribute("interval")
            .index(2);
        assert_eq!(path.to_string(), "health_check.interval[2]");
    }

    #[test]
    fn test_proto_conversion() {
        let diag = Diagnostic::error("Invalid CIDR", "not a network")
            .with_attribute(AttributePath::root("cidr"));
        let proto = tfplugin6::Diagnostic::from(&diag);

        assert_eq!(proto.severity, tfplugin6::diagnostic::Severity::Error as i32);
        assert_eq!(proto.summary, "Invalid CIDR");
        assert_eq!(proto.attribute.unwrap().steps.len(), 1);
    }
}
