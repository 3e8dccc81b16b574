//! Attribute paths used to point diagnostics at a node in a configuration tree

use std::fmt;

/// One step of an [`AttributePath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathStep {
    /// Named attribute of an object (`spec`, `metadata`)
    Attribute(String),
    /// Key of a map or untyped mapping (`["app.kubernetes.io/name"]`)
    Key(String),
    /// Position in a list, set or tuple
    Index(usize),
}

/// Location of a value inside a configuration tree
///
/// Rendered the way Terraform prints attribute paths:
/// `spec.values["image"][0]`. The empty path prints as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    /// The empty path (the value itself)
    pub fn root() -> Self {
        Self::default()
    }

    /// Path consisting of a single attribute name
    pub fn attribute(name: impl Into<String>) -> Self {
        Self::root().with_attribute(name)
    }

    /// Parse a dotted attribute path such as `metadata.name`
    pub fn parse_dotted(dotted: &str) -> Self {
        let steps = dotted
            .split('.')
            .filter(|s| !s.is_empty())
            .map(|s| PathStep::Attribute(s.to_string()))
            .collect();
        Self { steps }
    }

    /// Extend with an attribute step
    pub fn with_attribute(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::Attribute(name.into()))
    }

    /// Extend with a map key step
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::Key(key.into()))
    }

    /// Extend with a list index step
    pub fn with_index(&self, index: usize) -> Self {
        self.with_step(PathStep::Index(index))
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = self.steps.clone();
        steps.push(step);
        Self { steps }
    }

    /// Steps from the root
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// True for the empty path
    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Same as [`AttributePath::is_root`]
    pub fn is_empty(&self) -> bool {
        self.is_root()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return write!(f, "<root>");
        }

        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{}", name)?,
                PathStep::Attribute(name) => write!(f, ".{}", name)?,
                PathStep::Key(key) => write!(f, "[{:?}]", key)?,
                PathStep::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_display() {
        assert_eq!(AttributePath::root().to_string(), "<root>");
    }

    #[test]
    fn test_mixed_steps_display() {
        let path = AttributePath::attribute("spec")
            .with_attribute("values")
            .with_key("image")
            .with_index(0);

        assert_eq!(path.to_string(), r#"spec.values["image"][0]"#);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn test_parse_dotted() {
        let path = AttributePath::parse_dotted("metadata.name");
        assert_eq!(
            path.steps(),
            &[
                PathStep::Attribute("metadata".into()),
                PathStep::Attribute("name".into())
            ]
        );
    }

    #[test]
    fn test_key_with_quotes_is_escaped() {
        let path = AttributePath::attribute("annotations").with_key(r#"a"b"#);
        assert_eq!(path.to_string(), r#"annotations["a\"b"]"#);
    }
}
