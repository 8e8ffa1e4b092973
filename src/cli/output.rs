//! Colored output helpers for CLI

use crate::types::AgentInfo;
use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "fabric".bright_cyan().bold(),
                version.dimmed(),
                "multi-framework agent backend".bright_white()
            );
        } else {
            println!("\n   fabric {}\n   multi-framework agent backend\n", version);
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// One line per agent: name, availability and description
    pub fn agent(&self, info: &AgentInfo) {
        let status = if info.available { "available" } else { "unavailable" };
        if self.colored {
            let status = if info.available {
                status.green().bold().to_string()
            } else {
                status.red().to_string()
            };
            println!(
                "    {:<12} {:<22} {}",
                info.name.bright_white(),
                status,
                info.description.dimmed()
            );
        } else {
            println!("    {:<12} {:<12} {}", info.name, status, info.description);
        }
    }

    /// Print a raw value meant to be copied, with no decoration
    pub fn raw(&self, value: &str) {
        println!("{}", value);
    }
}
