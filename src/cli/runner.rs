//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::context::ContextStore;
use crate::error::{Error, Result};
use crate::loader::{load_job, open_source, JobDefinition};
use crate::reader::{PaginatedReader, ReaderState};
use crate::step::{ReadStep, StepConfig};
use serde_json::{json, Value};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Read {
                limit,
                commit_interval,
            } => self.read(*limit, *commit_interval).await,
            Commands::State => self.show_state().await,
            Commands::Reset => self.reset().await,
            Commands::Validate => self.validate(),
        }
    }

    /// Load job definition
    fn load_job(&self) -> Result<JobDefinition> {
        let path = self
            .cli
            .job
            .as_ref()
            .ok_or_else(|| Error::config("Job file not specified (use -j flag)"))?;
        load_job(path)
    }

    /// Load state
    fn load_state(&self) -> Result<ContextStore> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            ContextStore::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            ContextStore::from_file(path)
        } else {
            Ok(ContextStore::in_memory())
        }
    }

    /// Read records and checkpoint the reader state
    async fn read(&self, limit: Option<u64>, commit_interval: u64) -> Result<()> {
        let job = self.load_job()?;
        let store = self.load_state()?;
        let config = job.reader_config();

        let provider = open_source(&job.name, &job.source)?;
        let mut reader: PaginatedReader<Value, _> =
            PaginatedReader::open_with_context(&config, provider, &store.context().await)?;

        let mut step_config = StepConfig::new().with_commit_interval(commit_interval);
        if let Some(limit) = limit {
            step_config = step_config.with_limit(limit);
        }
        let mut step = ReadStep::new().with_config(step_config);

        let result = step
            .run(&mut reader, &store, |record| {
                self.output_message(&json!({
                    "type": "RECORD",
                    "record": {
                        "stream": job.name,
                        "data": record
                    }
                }));
                Ok(())
            })
            .await;

        let state = reader.snapshot();
        reader.close();
        let stats = result?;

        self.output_message(&json!({
            "type": "STATE",
            "state": state
        }));
        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Read {} records from '{}' ({} checkpoints, {} ms)",
                    stats.items_read,
                    job.name,
                    stats.checkpoints,
                    stats.duration_ms
                )
            }
        }));

        Ok(())
    }

    /// Show the saved reader state
    async fn show_state(&self) -> Result<()> {
        let job = self.load_job()?;
        let store = self.load_state()?;
        let state = ReaderState::read_from(&job.reader_name(), &store.context().await)?;

        self.output_message(&json!({
            "type": "STATE",
            "state": state
        }));

        Ok(())
    }

    /// Clear the saved reader state
    async fn reset(&self) -> Result<()> {
        let job = self.load_job()?;
        let path = self
            .cli
            .state
            .as_ref()
            .ok_or_else(|| Error::config("State file not specified (use -s flag)"))?;

        let store = ContextStore::from_file(path)?;
        let removed = store.clear_namespace(&job.reader_name()).await?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Cleared {removed} state entries for reader '{}'",
                    job.reader_name()
                )
            }
        }));

        Ok(())
    }

    /// Validate job definition
    fn validate(&self) -> Result<()> {
        let job = self.load_job()?;

        self.output_message(&json!({
            "type": "LOG",
            "log": {
                "level": "INFO",
                "message": format!(
                    "Job '{}' is valid: {} source, page size {}, sort {}",
                    job.name,
                    job.source.kind(),
                    job.reader.page_size,
                    job.reader.sort
                )
            }
        }));

        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}
