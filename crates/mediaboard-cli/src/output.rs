use clap::ValueEnum;
use mediaboard_models::{Change, ChangeRecord};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    #[value(name = "json-pretty")]
    JsonPretty,
}

/// User-facing output; logs go through `tracing` instead
pub struct Output {
    format: OutputFormat,
    quiet: bool,
}

impl Output {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_json(&self) -> bool {
        self.format != OutputFormat::Human
    }

    pub fn success(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => println!("{} {}", "✓".green(), msg.as_ref()),
            _ => self.print_json(&message("success", msg.as_ref())),
        }
    }

    /// Always shown, even in quiet mode
    pub fn error(&self, msg: impl AsRef<str>) {
        match self.format {
            OutputFormat::Human => eprintln!("{} {}", "✗".red(), msg.as_ref()),
            _ => self.print_json(&message("error", msg.as_ref())),
        }
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => println!("{}", msg.as_ref()),
            _ => self.print_json(&message("info", msg.as_ref())),
        }
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        if self.quiet {
            return;
        }
        match self.format {
            OutputFormat::Human => println!("{} {}", "⚠".yellow(), msg.as_ref()),
            _ => self.print_json(&message("warning", msg.as_ref())),
        }
    }

    /// Human-readable change list; JSON callers include changes in their own document
    pub fn changes(&self, changes: &[ChangeRecord]) {
        if self.quiet || self.is_json() {
            return;
        }
        for record in changes {
            let marker = match record.change {
                Change::StatusChange { .. } => "status".cyan().to_string(),
                Change::SeasonsAdded { .. } => "seasons".green().to_string(),
                Change::PlatformChange { .. } => "platform".magenta().to_string(),
            };
            println!(
                "  {} [{}] {} ({} #{}): {}",
                "•".dimmed(),
                marker,
                record.title.bold(),
                record.kind,
                record.item_id,
                record.change.describe()
            );
        }
    }

    pub fn json(&self, data: &Value) {
        if self.quiet && self.is_json() {
            return;
        }
        self.print_json(data);
    }

    fn print_json(&self, data: &Value) {
        match self.format {
            OutputFormat::JsonPretty => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
            _ => println!("{}", serde_json::to_string(data).unwrap_or_default()),
        }
    }
}

fn message(kind: &str, msg: &str) -> Value {
    json!({
        "type": kind,
        "message": msg
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_shape() {
        let value = message("warning", "careful");
        assert_eq!(value["type"], "warning");
        assert_eq!(value["message"], "careful");
    }

    #[test]
    fn test_is_json() {
        assert!(!Output::new(OutputFormat::Human, false).is_json());
        assert!(Output::new(OutputFormat::JsonPretty, false).is_json());
    }
}
