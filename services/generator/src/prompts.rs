use anyhow::{Context, Result};
use patient_sim_core::prompts::PromptTemplates;
use std::{collections::HashMap, fs, path::Path};

/// Loads every `*.md` file in `prompts_path`, keyed by file stem.
pub fn load_prompts(prompts_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();
    let entries = fs::read_dir(prompts_path)
        .with_context(|| format!("Failed to read prompts directory {}", prompts_path.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
            let prompt_key = path
                .file_stem()
                .and_then(|s| s.to_str())
                .context("Could not get file stem")?
                .to_string();
            let content = fs::read_to_string(&path)?;
            prompts.insert(prompt_key, content);
        }
    }
    Ok(prompts)
}

/// Loads the directory and checks that all three oracle templates are present.
pub fn load_templates(prompts_path: &Path) -> Result<PromptTemplates> {
    let prompts = load_prompts(prompts_path)?;
    Ok(PromptTemplates::from_map(prompts)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_prompts_keys_markdown_files_by_stem() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("evaluate_mood.md"), "mood {persona}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let prompts = load_prompts(dir.path()).unwrap();
        assert_eq!(prompts.len(), 1);
        assert_eq!(prompts["evaluate_mood"], "mood {persona}");
    }

    #[test]
    fn test_load_templates_requires_all_three() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("evaluate_mood.md"), "a").unwrap();
        fs::write(dir.path().join("generate_reply.md"), "b").unwrap();

        let err = load_templates(dir.path()).unwrap_err();
        assert!(err.to_string().contains("evaluate_reply"));
    }

    #[test]
    fn test_shipped_prompts_are_complete() {
        let shipped = Path::new(env!("CARGO_MANIFEST_DIR")).join("prompts");
        let templates = load_templates(&shipped).unwrap();

        assert!(templates.evaluate_mood.contains("{persona}"));
        assert!(templates.generate_reply.contains("{therapist_statement}"));
        assert!(templates.evaluate_reply.contains("{patient_reply}"));
    }
}
