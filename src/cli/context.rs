use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Result};

use civic_connect_cli::config::AppConfig;
use civic_core_types::{DraftId, ReportId, SystemClock};
use civic_intake::Validator;
use civic_lifecycle::LifecycleEngine;
use civic_report_store::{FileBackend, Repository};

use super::output::OutputFormat;

pub struct CliContext {
    config: Arc<AppConfig>,
    config_path: PathBuf,
    data_path: PathBuf,
    output: OutputFormat,
    engine: Arc<LifecycleEngine>,
}

impl CliContext {
    pub fn open(
        config: AppConfig,
        config_path: PathBuf,
        data_override: Option<PathBuf>,
        offline: bool,
        output: OutputFormat,
    ) -> Self {
        let data_path = data_override.unwrap_or_else(|| config.resolved_data_path());
        let repo = Repository::open(Arc::new(FileBackend::new(&data_path)));
        let engine = LifecycleEngine::new(
            Arc::new(repo),
            Validator::new(config.validation.clone()),
            SystemClock::shared(),
        );
        engine.set_offline(offline || config.offline);
        Self {
            config: Arc::new(config),
            config_path,
            data_path,
            output,
            engine: Arc::new(engine),
        }
    }

    pub fn config(&self) -> &AppConfig {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn engine(&self) -> &Arc<LifecycleEngine> {
        &self.engine
    }

    /// Accepts a full report id or a unique prefix such as the eight
    /// characters shown in listings.
    pub fn resolve_report(&self, raw: &str) -> Result<ReportId> {
        let raw = raw.trim();
        let ids = self
            .engine
            .repository()
            .all()
            .into_iter()
            .map(|report| report.id);
        resolve_prefix(raw, ids, "report")
    }

    pub fn resolve_draft(&self, raw: &str) -> Result<DraftId> {
        let raw = raw.trim();
        let ids = self
            .engine
            .repository()
            .drafts()
            .into_iter()
            .map(|draft| draft.id);
        resolve_prefix(raw, ids, "draft")
    }
}

fn resolve_prefix<I, T>(raw: &str, ids: I, kind: &str) -> Result<T>
where
    I: IntoIterator<Item = T>,
    T: AsRef<str> + From<String>,
{
    if raw.is_empty() {
        bail!("{kind} id must not be empty");
    }
    let mut matches: Vec<T> = ids
        .into_iter()
        .filter(|id| id.as_ref().starts_with(raw))
        .collect();
    if let Some(pos) = matches.iter().position(|id| id.as_ref() == raw) {
        return Ok(matches.swap_remove(pos));
    }
    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => Ok(T::from(raw.to_string())),
        n => bail!("{kind} id `{raw}` is ambiguous ({n} matches)"),
    }
}
