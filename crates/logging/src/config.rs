//! crates/logging/src/config.rs
//! Router configuration loaded from JSON.
//!
//! ```json
//! {
//!   "pool_capacity": 32,
//!   "destinations": [
//!     { "encoder": "structured", "sinks": [{ "file": "/var/log/app.json" }] },
//!     {
//!       "encoder": { "template": "{{c}}{{l/S}}{{c/reset}} {{m}}\n" },
//!       "min_level": "warning",
//!       "level_colors": { "warning": "fg:yellow" },
//!       "sinks": ["stderr"]
//!     }
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use encoding::{ColorSpecError, FieldLayout, StructuredEncoder, TemplateEncoder};
use logging_sink::{LineMode, LineSink};
use record::Level;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::router::{Registration, Router, RouterError};

/// Failure to load or apply a [`RouterConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The document is not valid configuration, including unknown sink
    /// or encoder names.
    #[error("invalid router configuration: {0}")]
    Parse(#[from] serde_json::Error),
    /// Reading the configuration source failed.
    #[error("failed to read router configuration: {0}")]
    Read(#[source] io::Error),
    /// A level color override did not parse.
    #[error("invalid color for level {level}: {source}")]
    Color {
        /// Level whose color was rejected.
        level: Level,
        /// Underlying parse failure.
        #[source]
        source: ColorSpecError,
    },
    /// A file sink could not be opened.
    #[error("failed to open log file {path}: {source}", path = path.display())]
    OpenFile {
        /// Path from the configuration.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// Finalizing the router failed.
    #[error(transparent)]
    Router(#[from] RouterError),
}

/// Destination groups plus pool sizing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouterConfig {
    /// Idle events kept for reuse; the router default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool_capacity: Option<usize>,
    /// Groups in dispatch order.
    pub destinations: Vec<DestinationConfig>,
}

/// One destination group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DestinationConfig {
    /// How events are encoded.
    #[serde(default)]
    pub encoder: EncoderConfig,
    /// Least severe level accepted.
    #[serde(default = "default_min_level")]
    pub min_level: Level,
    /// Least severe level for which a stack trace is captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_stacktrace_level: Option<Level>,
    /// Per-level color overrides for template encoders.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub level_colors: BTreeMap<Level, String>,
    /// Emit zero-valued vary fields.
    #[serde(default)]
    pub allow_empty: bool,
    /// Structured `fields` as one flattened object.
    #[serde(default)]
    pub flatten_fields: bool,
    /// Destinations written in order.
    pub sinks: Vec<SinkConfig>,
}

const fn default_min_level() -> Level {
    Level::Debug
}

/// Encoder selection: `"structured"` or `{ "template": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderConfig {
    /// [`StructuredEncoder`].
    Structured,
    /// [`TemplateEncoder`] compiled from the given template; a blank
    /// template selects the default one.
    Template(String),
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self::Template(String::new())
    }
}

/// Sink selection: `"stdout"`, `"stderr"` or `{ "file": "path" }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkConfig {
    /// Standard output.
    Stdout,
    /// Standard error.
    Stderr,
    /// A file opened for appending, created when missing. Every event is
    /// terminated by a newline.
    File(PathBuf),
}

impl RouterConfig {
    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads and parses a JSON document.
    pub fn from_reader(mut reader: impl Read) -> Result<Self, ConfigError> {
        let mut text = String::new();
        reader.read_to_string(&mut text).map_err(ConfigError::Read)?;
        Self::from_json(&text)
    }

    /// Builds a router with the default capture and unwinder.
    pub fn build(&self) -> Result<Router, ConfigError> {
        self.build_with(Router::new())
    }

    /// Installs the configured destinations into `router`.
    ///
    /// The router's capture and unwinder are kept; the pool is resized
    /// when `pool_capacity` is set.
    pub fn build_with(&self, router: Router) -> Result<Router, ConfigError> {
        let router = match self.pool_capacity {
            Some(capacity) => router.with_pool_capacity(capacity),
            None => router,
        };
        let mut registration = router.register();
        for destination in &self.destinations {
            registration = destination.register(registration)?;
        }
        registration.build()?;
        Ok(router)
    }
}

impl DestinationConfig {
    fn register<'r>(&self, registration: Registration<'r>) -> Result<Registration<'r>, ConfigError> {
        let registration = match &self.encoder {
            EncoderConfig::Structured => {
                let layout = if self.flatten_fields {
                    FieldLayout::Flattened
                } else {
                    FieldLayout::List
                };
                registration.with_encoder(
                    StructuredEncoder::new()
                        .with_layout(layout)
                        .allow_empty(self.allow_empty),
                )
            }
            EncoderConfig::Template(template) => {
                let mut builder = TemplateEncoder::builder(template).allow_empty(self.allow_empty);
                for (&level, spec) in &self.level_colors {
                    builder = builder
                        .level_color(level, spec)
                        .map_err(|source| ConfigError::Color { level, source })?;
                }
                registration.with_encoder(builder.build())
            }
        };
        let mut registration = registration.with_min_level(self.min_level);
        if let Some(level) = self.min_stacktrace_level {
            registration = registration.with_min_stacktrace_level(level);
        }
        for sink in &self.sinks {
            registration = match sink {
                SinkConfig::Stdout => registration.write_to([io::stdout()]),
                SinkConfig::Stderr => registration.write_to([io::stderr()]),
                SinkConfig::File(path) => {
                    let file = open_append(path).map_err(|source| ConfigError::OpenFile {
                        path: path.clone(),
                        source,
                    })?;
                    registration.write_to([LineSink::new(file, LineMode::WithNewline)])
                }
            };
        }
        Ok(registration)
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_encoders_levels_and_sinks() {
        let config = RouterConfig::from_json(
            r#"{
                "pool_capacity": 8,
                "destinations": [
                    { "encoder": "structured", "flatten_fields": true, "sinks": ["stdout"] },
                    {
                        "encoder": { "template": "{{l/S}} {{m}}" },
                        "min_level": "warning",
                        "min_stacktrace_level": "err",
                        "level_colors": { "warning": "fg:yellow" },
                        "sinks": ["stderr", { "file": "/tmp/app.log" }]
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(config.pool_capacity, Some(8));
        let [structured, template] = config.destinations.as_slice() else {
            panic!("expected two destinations");
        };
        assert_eq!(structured.encoder, EncoderConfig::Structured);
        assert!(structured.flatten_fields);
        assert_eq!(structured.min_level, Level::Debug);
        assert_eq!(
            template.encoder,
            EncoderConfig::Template("{{l/S}} {{m}}".to_owned())
        );
        assert_eq!(template.min_level, Level::Warning);
        assert_eq!(template.min_stacktrace_level, Some(Level::Error));
        assert_eq!(template.level_colors[&Level::Warning], "fg:yellow");
        assert_eq!(
            template.sinks,
            [SinkConfig::Stderr, SinkConfig::File("/tmp/app.log".into())]
        );
    }

    #[test]
    fn missing_encoder_selects_the_default_template() {
        let config = RouterConfig::from_json(r#"{ "destinations": [{ "sinks": ["stdout"] }] }"#)
            .unwrap();
        assert_eq!(
            config.destinations[0].encoder,
            EncoderConfig::Template(String::new())
        );
    }

    #[test]
    fn unknown_sink_names_are_rejected() {
        let error = RouterConfig::from_json(r#"{ "destinations": [{ "sinks": ["syslog"] }] }"#)
            .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
        assert!(error.to_string().contains("syslog"));
    }

    #[test]
    fn unknown_levels_are_rejected() {
        let error = RouterConfig::from_json(
            r#"{ "destinations": [{ "min_level": "loud", "sinks": ["stdout"] }] }"#,
        )
        .unwrap_err();
        assert!(matches!(error, ConfigError::Parse(_)));
    }

    #[test]
    fn invalid_level_color_names_the_level() {
        let config = RouterConfig::from_json(
            r#"{ "destinations": [{ "level_colors": { "error": "fg:chartreuse" }, "sinks": ["stdout"] }] }"#,
        )
        .unwrap();
        let error = config.build().unwrap_err();
        let ConfigError::Color { level, source } = &error else {
            panic!("expected a color error, got {error}");
        };
        assert_eq!(*level, Level::Error);
        assert_eq!(source.token(), "fg:chartreuse");
    }

    #[test]
    fn empty_destinations_fail_to_build() {
        let error = RouterConfig::default().build().unwrap_err();
        assert!(matches!(
            error,
            ConfigError::Router(RouterError::NoDestinations)
        ));
    }

    #[test]
    fn file_sinks_append_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let config = RouterConfig {
            pool_capacity: Some(2),
            destinations: vec![DestinationConfig {
                encoder: EncoderConfig::Template("{{l/s}} {{m}}".to_owned()),
                min_level: Level::Info,
                min_stacktrace_level: None,
                level_colors: BTreeMap::new(),
                allow_empty: false,
                flatten_fields: false,
                sinks: vec![SinkConfig::File(path.clone())],
            }],
        };
        let router = config.build().unwrap();
        assert_eq!(router.pool().capacity(), 2);

        for (level, message) in [(Level::Info, "up"), (Level::Debug, "noise"), (Level::Error, "down")] {
            let mut event = router.acquire(level);
            event.set_message(message);
            event.dispatch();
        }
        router.flush().unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "Inf up\nErr down\n"
        );
    }

    #[test]
    fn unopenable_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");
        let config = RouterConfig {
            pool_capacity: None,
            destinations: vec![DestinationConfig {
                encoder: EncoderConfig::Structured,
                min_level: Level::Debug,
                min_stacktrace_level: None,
                level_colors: BTreeMap::new(),
                allow_empty: false,
                flatten_fields: false,
                sinks: vec![SinkConfig::File(path.clone())],
            }],
        };
        let error = config.build().unwrap_err();
        assert!(matches!(&error, ConfigError::OpenFile { path: failed, .. } if *failed == path));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RouterConfig::from_json(
            r#"{ "destinations": [{ "encoder": "structured", "min_level": "notice", "sinks": ["stdout"] }] }"#,
        )
        .unwrap();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(RouterConfig::from_json(&text).unwrap(), config);
    }
}
