use std::path::{Path, PathBuf};

/// Weight file extensions that count as "model weights present".
const WEIGHT_EXTENSIONS: [&str; 3] = ["safetensors", "bin", "pth"];

/// Presence report for the mounted model cache.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ModelValidation {
    pub cache_dir: PathBuf,
    pub cache_dir_exists: bool,
    pub model_dir: PathBuf,
    pub model_dir_exists: bool,
    pub model_files_count: usize,
    pub has_weights: bool,
    pub has_config: bool,
    /// `None` when no LoRA is configured.
    pub lora_dir: Option<PathBuf>,
    pub lora_found: bool,
    pub models_found: bool,
    pub errors: Vec<String>,
}

/// Inspect `cache_dir/model_name` (and optionally `cache_dir/lora_name`).
///
/// The base model counts as found when its directory holds at least one weight file and one
/// `config*` file. The LoRA is optional and never affects `models_found`.
pub fn validate_model_dir(
    cache_dir: &Path,
    model_name: &str,
    lora_name: Option<&str>,
) -> ModelValidation {
    let model_dir = cache_dir.join(model_name);
    let mut report = ModelValidation {
        cache_dir: cache_dir.to_path_buf(),
        cache_dir_exists: cache_dir.is_dir(),
        model_dir: model_dir.clone(),
        lora_dir: lora_name.map(|n| cache_dir.join(n)),
        ..ModelValidation::default()
    };

    if let Some(lora_dir) = report.lora_dir.as_deref() {
        report.lora_found = dir_is_non_empty(lora_dir);
    }

    if !report.cache_dir_exists {
        report
            .errors
            .push(format!("models directory not found: {}", cache_dir.display()));
        return report;
    }

    report.model_dir_exists = model_dir.is_dir();
    if !report.model_dir_exists {
        report
            .errors
            .push(format!("model not found: {}", model_dir.display()));
        return report;
    }

    let entries = match std::fs::read_dir(&model_dir) {
        Ok(entries) => entries,
        Err(e) => {
            report.errors.push(format!(
                "error listing model files in {}: {e}",
                model_dir.display()
            ));
            return report;
        }
    };

    for entry in entries.flatten() {
        report.model_files_count += 1;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("config") {
            report.has_config = true;
        }
        if let Some((_, ext)) = name.rsplit_once('.')
            && WEIGHT_EXTENSIONS.contains(&ext)
        {
            report.has_weights = true;
        }
    }

    report.models_found = report.has_weights && report.has_config;
    if !report.models_found {
        report
            .errors
            .push("model files incomplete (missing weights or config)".to_string());
    }
    report
}

fn dir_is_non_empty(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/model/validate.rs"]
mod tests;
