// SPDX-FileCopyrightText: 2026 Watchtower Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for Watchtower.
//!
//! TOML configuration with strict validation (`deny_unknown_fields`), a
//! system/user/local file hierarchy, `WATCHTOWER_` environment overrides, and
//! miette diagnostics with typo suggestions.
//!
//! ```no_run
//! use watchtower_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("hub port: {}", config.hub.port);
//! ```

pub mod diagnostic;
pub mod loader;
pub mod model;
pub mod validation;

use std::path::Path;

pub use diagnostic::{ConfigError, SourceFiles, render_errors};
pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::WatchtowerConfig;

/// Load configuration from the file hierarchy and validate it.
pub fn load_and_validate() -> Result<WatchtowerConfig, Vec<ConfigError>> {
    finish(loader::load_config(), collect_sources)
}

/// Load configuration from one file (plus env overrides) and validate it.
pub fn load_and_validate_path(path: &Path) -> Result<WatchtowerConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_path(path), || {
        let mut sources = SourceFiles::new();
        if let Ok(content) = std::fs::read_to_string(path) {
            sources.add(path.display().to_string(), content);
        }
        sources
    })
}

/// Load configuration from a TOML string and validate it.
pub fn load_and_validate_str(toml_content: &str) -> Result<WatchtowerConfig, Vec<ConfigError>> {
    finish(loader::load_config_from_str(toml_content), || {
        let mut sources = SourceFiles::new();
        sources.add("<inline>", toml_content);
        sources
    })
}

fn finish(
    loaded: Result<WatchtowerConfig, figment::Error>,
    sources: impl FnOnce() -> SourceFiles,
) -> Result<WatchtowerConfig, Vec<ConfigError>> {
    match loaded {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(diagnostic::figment_to_config_errors(err, &sources())),
    }
}

fn collect_sources() -> SourceFiles {
    let mut sources = SourceFiles::new();
    for path in loader::config_file_candidates() {
        if let Ok(content) = std::fs::read_to_string(&path) {
            let display = std::fs::canonicalize(&path)
                .unwrap_or(path)
                .display()
                .to_string();
            sources.add(display, content);
        }
    }
    sources
}
