use std::path::Path;
use std::sync::Arc;

/// Index to human-readable label table. Loaded once, shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabels {
    labels: Arc<[String]>,
}

impl ClassLabels {
    pub fn new(labels: Vec<String>) -> Self {
        Self {
            labels: labels.into(),
        }
    }

    /// One label per line, surrounding whitespace trimmed. Line `i` is class
    /// `i`, so a blank line in the middle is an empty label.
    #[allow(dead_code)]
    pub fn from_file(
        path: impl AsRef<Path>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("reading labels {}: {}", path.display(), e))?;
        let labels = Self::parse(&content);
        if labels.is_empty() {
            return Err(format!("labels file {} is empty", path.display()).into());
        }
        Ok(labels)
    }

    /// Trailing blank lines are dropped.
    pub fn parse(content: &str) -> Self {
        let mut labels: Vec<String> = content
            .lines()
            .map(|line| line.trim().to_string())
            .collect();
        while labels.last().is_some_and(|label| label.is_empty()) {
            labels.pop();
        }
        Self::new(labels)
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ClassLabels {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}
