use crate::cli::RunArgs;
use crate::config::{PartialSearchConfig, SearchConfig};
use crate::error::{CliError, Result};
use crate::scoring::ExternalScorer;
use crate::utils::progress::CliProgressHandler;
use conflib::core::geometry::NoGeometry;
use conflib::core::observations::ObservationSet;
use conflib::engine::config::ConfigurationMode;
use conflib::engine::history::SearchHistory;
use conflib::engine::model::ModelSource;
use conflib::engine::models::RandomSearchModel;
use conflib::engine::progress::ProgressReporter;
use conflib::workflows::ConfigurationGenerator;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(args: RunArgs) -> Result<()> {
    let base_dir = args
        .config
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let partial = PartialSearchConfig::from_file(&args.config)?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial.merge_with_cli(&args, &base_dir)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!("Starting search ({} steps)...", config.steps);
    let history = execute(&config, &reporter)?;

    write_history(&history, &config.output)?;
    match history.best() {
        Some(best) => {
            println!(
                "✓ Best score {:.6} (step {}) at:",
                best.score, best.step
            );
            for (key, value) in &best.coordinates {
                println!("    {} = {}", key, value);
            }
        }
        None => {
            warn!("Search completed without any finite score.");
            println!("Warning: no finite score was observed.");
        }
    }
    println!(
        "History of {} sample(s) written to: {}",
        history.len(),
        config.output.display()
    );
    Ok(())
}

/// Runs the whole search described by `config` and hands back its history.
pub fn execute(config: &SearchConfig, reporter: &ProgressReporter) -> Result<SearchHistory> {
    ensure_dict_mode(config.generator.configuration_mode)?;

    info!("Loading initial observations from {:?}", &config.initial_observations);
    let initial = ObservationSet::read_csv_path(&config.initial_observations).map_err(|e| {
        CliError::FileParsing {
            path: config.initial_observations.clone(),
            source: e.into(),
        }
    })?;

    let scorer = ExternalScorer::new(&config.scoring).with_working_dir(&config.base_dir);
    let mut generator = ConfigurationGenerator::new(
        ModelSource::<RandomSearchModel>::construct(config.model.clone()),
        NoGeometry,
        &initial,
        scorer,
        &config.generator,
    )?;

    info!("Invoking the search workflow...");
    generator.run(config.steps, reporter)?;
    Ok(generator.into_history())
}

fn ensure_dict_mode(mode: ConfigurationMode) -> Result<()> {
    if mode == ConfigurationMode::Dict {
        return Ok(());
    }
    Err(CliError::Config(format!(
        "configuration-mode '{}' needs a geometry service; the command line tool only supports 'dict'",
        mode
    )))
}

fn write_history(history: &SearchHistory, output: &Path) -> Result<()> {
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    info!("Writing search history to {:?}", output);
    history
        .write_csv_path(output)
        .map_err(|e| CliError::FileParsing {
            path: output.to_path_buf(),
            source: e.into(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringSection;
    use conflib::core::observations::ObservationKey;
    use conflib::engine::config::GeneratorConfig;
    use conflib::engine::models::RandomSearchOptions;
    use std::fs;
    use tempfile::tempdir;

    fn search_config(dir: &Path, mode: ConfigurationMode, steps: u64) -> SearchConfig {
        SearchConfig {
            initial_observations: dir.join("initial.csv"),
            steps,
            output: dir.join("history.csv"),
            generator: GeneratorConfig::builder()
                .configuration_mode(mode)
                .build()
                .unwrap(),
            model: RandomSearchOptions {
                batch_size: 2,
                padding: 0.1,
                seed: Some(5),
            },
            scoring: ScoringSection {
                command: "sh".to_string(),
                args: vec!["-c".to_string(), "tail -n +2 | cut -d, -f1".to_string()],
            },
            base_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn geometry_modes_are_rejected() {
        assert!(ensure_dict_mode(ConfigurationMode::Dict).is_ok());
        assert!(matches!(
            ensure_dict_mode(ConfigurationMode::Cartesian),
            Err(CliError::Config(_))
        ));
        assert!(matches!(
            ensure_dict_mode(ConfigurationMode::Internal),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn missing_initial_observations_is_a_parse_error() {
        let dir = tempdir().unwrap();
        let config = search_config(dir.path(), ConfigurationMode::Dict, 1);
        let result = execute(&config, &ProgressReporter::new());
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn execute_runs_search_and_history_is_written() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("initial.csv"),
            "\"(0, 1)\",\"(1, 2)\",values\n1.0,2.0,3.0\n1.5,2.5,1.0\n",
        )
        .unwrap();
        let config = search_config(dir.path(), ConfigurationMode::Dict, 3);

        let history = execute(&config, &ProgressReporter::new()).unwrap();
        assert_eq!(history.steps(), 3);
        assert_eq!(history.len(), 6);
        let first = history
            .observations()
            .get(&ObservationKey::coordinate([0, 1]))
            .unwrap()
            .to_vec();
        assert_eq!(history.observations().scores(), Some(&first[..]));

        write_history(&history, &config.output).unwrap();
        let reread = ObservationSet::read_csv_path(&config.output).unwrap();
        assert_eq!(reread.sample_count(), Some(6));
    }

    #[test]
    fn write_history_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let output: PathBuf = dir.path().join("nested/out/history.csv");
        let mut history = SearchHistory::new();
        history.record(
            &ObservationSet::new()
                .with([0, 1], vec![0.5])
                .with(ObservationKey::Values, vec![1.0]),
        );

        write_history(&history, &output).unwrap();
        assert!(output.exists());
    }
}
