use std::path::PathBuf;

use anyhow::{bail, Context};
use testimony_core::clip_time::ClipTimeThresholds;

/// Default number of records validated per blocking task.
pub const DEFAULT_SHARD_SIZE: usize = 500;

/// Settings for one audit run.
///
/// | Variable             | Required          | Default        |
/// |----------------------|-------------------|----------------|
/// | `CLIP_STORE_PATH`    | yes               | --             |
/// | `AUDIT_OUTPUT_DIR`   | no                | `audit-output` |
/// | `AUDIT_EPISODE`      | no                | all episodes   |
/// | `AUDIT_APPLY_SAFE`   | no                | `false`        |
/// | `AUDIT_APPROVED_BY`  | when applying     | --             |
/// | `AUDIT_SHARD_SIZE`   | no                | `500`          |
///
/// Threshold overrides use the same `CLIP_*_SECS` variables as the API.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    pub store_path: PathBuf,
    pub output_dir: PathBuf,
    pub episode: Option<String>,
    /// Write auto-applicable proposals back to the store.
    pub apply_safe: bool,
    /// Reviewer name stamped on applied repairs.
    pub approved_by: Option<String>,
    pub shard_size: usize,
    pub thresholds: ClipTimeThresholds,
}

impl AuditConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let store_path = non_blank("CLIP_STORE_PATH")
            .map(PathBuf::from)
            .context("CLIP_STORE_PATH is required")?;

        let output_dir = non_blank("AUDIT_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("audit-output"));

        let episode = non_blank("AUDIT_EPISODE").map(|e| e.trim().to_string());

        let apply_safe = match non_blank("AUDIT_APPLY_SAFE") {
            None => false,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => bail!("AUDIT_APPLY_SAFE must be true or false, got '{other}'"),
            },
        };

        let approved_by = non_blank("AUDIT_APPROVED_BY").map(|a| a.trim().to_string());
        if apply_safe && approved_by.is_none() {
            bail!("AUDIT_APPROVED_BY is required when AUDIT_APPLY_SAFE is enabled");
        }

        let shard_size = match non_blank("AUDIT_SHARD_SIZE") {
            None => DEFAULT_SHARD_SIZE,
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .with_context(|| format!("AUDIT_SHARD_SIZE must be a positive integer, got '{raw}'"))?,
        };

        let thresholds =
            ClipTimeThresholds::from_lookup(&lookup).context("invalid clip thresholds")?;

        Ok(Self {
            store_path,
            output_dir,
            episode,
            apply_safe,
            approved_by,
            shard_size,
            thresholds,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<AuditConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AuditConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn store_path_is_required() {
        let err = config_from(&[]).unwrap_err();
        assert!(err.to_string().contains("CLIP_STORE_PATH"));
    }

    #[test]
    fn defaults() {
        let config = config_from(&[("CLIP_STORE_PATH", "clips.json")]).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("audit-output"));
        assert_eq!(config.episode, None);
        assert!(!config.apply_safe);
        assert_eq!(config.shard_size, DEFAULT_SHARD_SIZE);
        assert_eq!(config.thresholds, ClipTimeThresholds::default());
    }

    #[test]
    fn applying_requires_approver() {
        let err = config_from(&[("CLIP_STORE_PATH", "clips.json"), ("AUDIT_APPLY_SAFE", "true")])
            .unwrap_err();
        assert!(err.to_string().contains("AUDIT_APPROVED_BY"));

        let config = config_from(&[
            ("CLIP_STORE_PATH", "clips.json"),
            ("AUDIT_APPLY_SAFE", "YES"),
            ("AUDIT_APPROVED_BY", " ada "),
        ])
        .unwrap();
        assert!(config.apply_safe);
        assert_eq!(config.approved_by.as_deref(), Some("ada"));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(config_from(&[("CLIP_STORE_PATH", "c.json"), ("AUDIT_APPLY_SAFE", "maybe")]).is_err());
        assert!(config_from(&[("CLIP_STORE_PATH", "c.json"), ("AUDIT_SHARD_SIZE", "0")]).is_err());
        assert!(config_from(&[("CLIP_STORE_PATH", "c.json"), ("CLIP_MIN_DURATION_SECS", "x")]).is_err());
    }
}
