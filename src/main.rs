//! @ai:module:intent CLI entry point for linting and dumping API annotations
//! @ai:module:layer presentation
//! @ai:module:public_api main
//! @ai:module:depends_on linter, documentation, output, config

use apidoc::{
    linter, output, parse_options, Codebase, Config, Documentation, LintConfig, Mson,
    MsonOptions, OutputFormat, Version, VersionConstraint,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apidoc")]
#[command(author, version, about = "Parse and validate @api-* documentation annotations")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every configured resource and representation, reporting all errors
    Lint {
        /// Path to the TOML configuration
        #[arg(long, short, default_value = "apidoc.toml")]
        config: PathBuf,

        /// Warn about resources that implement no HTTP method
        #[arg(long, default_value = "false")]
        strict: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: Format,
    },

    /// Build the documentation and print it, stopping at the first error
    Dump {
        /// Path to the TOML configuration
        #[arg(long, short, default_value = "apidoc.toml")]
        config: PathBuf,

        /// Only include what this API version exposes
        #[arg(long)]
        api_version: Option<String>,

        /// Only include what a consumer holding these capabilities sees
        #[arg(long, value_delimiter = ',')]
        capabilities: Option<Vec<String>>,

        /// Drop private actions and annotations
        #[arg(long, default_value = "false")]
        public: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value = "json-pretty")]
        format: Format,
    },

    /// Validate a single annotation value inline
    Validate {
        #[arg(value_enum)]
        kind: ValueKind,

        /// The value to validate, e.g. `>=1.1` or `id (string) - Movie id`
        value: String,
    },

    /// Write a starter configuration
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "apidoc.toml")]
        output: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
    JsonPretty,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Text => OutputFormat::Text,
            Format::Json => OutputFormat::Json,
            Format::JsonPretty => OutputFormat::JsonPretty,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum ValueKind {
    Version,
    Mson,
    Options,
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("apidoc=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Lint {
            config,
            strict,
            format,
        } => {
            let lint_config = if strict {
                LintConfig::strict()
            } else {
                LintConfig::default()
            };

            let result = load_config(&config)
                .and_then(|config| linter::lint_sources(&config, &lint_config));

            match result {
                Ok(lint_result) => {
                    println!("{}", output::format_lint_result(&lint_result, format.into()));

                    if lint_result.passed() {
                        ExitCode::SUCCESS
                    } else {
                        ExitCode::from(1)
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    ExitCode::from(2)
                }
            }
        }

        Commands::Dump {
            config,
            api_version,
            capabilities,
            public,
            format,
        } => {
            let loaded = load_config(&config).and_then(|config| {
                let codebase = Codebase::scan(&config.sources)?;
                Ok((config, codebase))
            });
            let (config, codebase) = match loaded {
                Ok(loaded) => loaded,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    return ExitCode::from(2);
                }
            };

            let mut documentation = match Documentation::build(&codebase, &config) {
                Ok(documentation) => documentation,
                Err(e) => {
                    eprintln!("{}", output::format_error(&e, format.into()));
                    return ExitCode::from(1);
                }
            };

            if let Some(version) = api_version {
                match Version::parse(&version) {
                    Ok(version) => documentation = documentation.for_version(&version),
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return ExitCode::from(2);
                    }
                }
            }
            if let Some(capabilities) = capabilities {
                documentation = documentation.visible_to(&capabilities);
            }
            if public {
                documentation = documentation.public();
            }

            println!("{}", output::format_documentation(&documentation, format.into()));
            ExitCode::SUCCESS
        }

        Commands::Validate { kind, value } => {
            let result = match kind {
                ValueKind::Version => VersionConstraint::parse(&value).map(|c| c.to_string()),
                ValueKind::Mson => Mson::parse(&value, MsonOptions::default())
                    .map(|m| output::to_json(&m, false)),
                ValueKind::Options => parse_options(&value).map(|o| format!("[{}]", o.join("|"))),
            };

            match result {
                Ok(canonical) => {
                    println!("OK {}", canonical);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("{} ({})", e.validation_message(), e.kind.code());
                    ExitCode::from(1)
                }
            }
        }

        Commands::Init { output } => match Config::default().save(&output) {
            Ok(()) => {
                println!("Wrote {}", output.display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::from(2)
            }
        },
    }
}

fn load_config(path: &Path) -> apidoc::Result<Config> {
    let config = Config::load(path)?;
    tracing::debug!(
        controllers = config.controllers.len(),
        representations = config.representations.len(),
        "Loaded configuration"
    );
    Ok(config)
}
