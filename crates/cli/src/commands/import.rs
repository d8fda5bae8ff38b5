use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tutur_core::domain::activity::ActivityDocument;
use tutur_db::repositories::{ActivityRepository, SqlActivityRepository};

use crate::commands::{with_migrated_pool, CommandResult, StepFailure};

pub fn run(file: &Path) -> CommandResult {
    let documents = match read_documents(file) {
        Ok(documents) => documents,
        Err(error) => {
            return CommandResult::failure(
                "import-activities",
                "invalid_input",
                format!("{error:#}"),
                6,
            );
        }
    };

    with_migrated_pool("import-activities", move |pool| async move {
        let repository = SqlActivityRepository::new(pool);
        let total = documents.len();
        for document in documents {
            let principal_id = document.principal_id.clone();
            repository.upsert(document).await.map_err(|error| {
                StepFailure::new(
                    "store_write",
                    format!("failed to store activity `{principal_id}`: {error}"),
                    7,
                )
            })?;
        }
        Ok(format!("imported {total} activities"))
    })
}

/// Parses a JSON array of activity documents. Every document needs a
/// non-blank `principalId` and ids must be unique within the file.
pub fn read_documents(file: &Path) -> Result<Vec<ActivityDocument>> {
    let raw = fs::read_to_string(file)
        .with_context(|| format!("failed to read `{}`", file.display()))?;
    let documents: Vec<ActivityDocument> = serde_json::from_str(&raw)
        .with_context(|| format!("`{}` is not a JSON array of activities", file.display()))?;

    let mut seen = HashSet::new();
    for (index, document) in documents.iter().enumerate() {
        let id = document.principal_id.as_str().trim();
        if id.is_empty() {
            bail!("activity at index {index} has no principalId");
        }
        if !seen.insert(id.to_string()) {
            bail!("principalId `{id}` appears more than once");
        }
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::read_documents;

    #[test]
    fn reads_partial_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        fs::write(
            &path,
            r#"[{"principalId":"a1","city":"Lima","totalScore":4.5},{"principalId":"a2"}]"#,
        )
        .expect("write");

        let documents = read_documents(&path).expect("documents");
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].city.as_deref(), Some("Lima"));
        assert!(documents[1].city.is_none());
    }

    #[test]
    fn rejects_blank_and_repeated_ids() {
        let dir = tempfile::tempdir().expect("tempdir");
        let blank = dir.path().join("blank.json");
        fs::write(&blank, r#"[{"principalId":"  "}]"#).expect("write");
        let error = read_documents(&blank).expect_err("blank id");
        assert!(error.to_string().contains("index 0"));

        let repeated = dir.path().join("repeated.json");
        fs::write(&repeated, r#"[{"principalId":"a1"},{"principalId":"a1"}]"#).expect("write");
        let error = read_documents(&repeated).expect_err("repeated id");
        assert!(error.to_string().contains("more than once"));
    }

    #[test]
    fn rejects_non_array_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("object.json");
        fs::write(&path, r#"{"principalId":"a1"}"#).expect("write");

        let error = read_documents(&path).expect_err("object");
        assert!(format!("{error:#}").contains("not a JSON array"));
    }
}
