use serde::Serialize;

use crate::errors::CliError;

#[derive(Debug, Clone, Default)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl OutputMode {
    fn human(&self) -> bool {
        !self.json && !self.quiet
    }

    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        println!("{}", serde_json::to_string(value)?);
        Ok(())
    }

    pub fn print_human(&self, message: &str) {
        if self.human() {
            println!("{message}");
        }
    }

    /// Progress lines go to stderr so stdout stays clean for piping.
    pub fn print_progress(&self, message: &str) {
        if self.human() {
            eprintln!("{message}");
        }
    }

    pub fn print_verbose(&self, message: &str) {
        if self.verbose && self.human() {
            eprintln!("{message}");
        }
    }

    pub fn print_list(&self, heading: &str, items: &[String]) {
        if !self.human() {
            return;
        }
        println!("{heading}");
        if items.is_empty() {
            println!("  (none)");
        }
        for item in items {
            println!("  - {item}");
        }
    }
}

pub fn print_error(error: &CliError, mode: &OutputMode) {
    if mode.json {
        let payload = serde_json::json!({
            "error": error.to_string(),
            "code": error.exit_code()
        });
        println!(
            "{}",
            serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"unknown\"}".to_string())
        );
        return;
    }

    eprintln!("Error: {error}");
}
