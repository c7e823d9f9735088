use crate::library::logger::interface::Logger;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub level: &'static str,
    pub namespace: String,
    pub message: String,
}

/// Collects log lines in memory. Child loggers share the parent's buffer.
#[derive(Debug, Clone, Default)]
pub struct LoggerFake {
    namespace: String,
    lines: Arc<Mutex<Vec<LogLine>>>,
}

impl LoggerFake {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<LogLine> {
        self.lines()
            .into_iter()
            .filter(|line| line.level == "ERROR")
            .collect()
    }

    fn push(
        &self,
        level: &'static str,
        message: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| "log buffer poisoned".to_string())?;
        lines.push(LogLine {
            level,
            namespace: self.namespace.clone(),
            message: message.to_string(),
        });
        Ok(())
    }
}

impl Logger for LoggerFake {
    fn info(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push("INFO", message)
    }

    fn error(&self, message: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.push("ERROR", message)
    }

    fn with_namespace(&self, namespace: &str) -> Arc<dyn Logger + Send + Sync> {
        let namespace = if self.namespace.is_empty() {
            namespace.to_string()
        } else {
            format!("{}:{}", self.namespace, namespace)
        };
        Arc::new(LoggerFake {
            namespace,
            lines: self.lines.clone(),
        })
    }
}
