use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use wordsense_engine::BuildOutput;

pub const SENSES_FILE: &str = "senses.jsonl";
pub const RELATIONS_FILE: &str = "relations.jsonl";
pub const FORMS_FILE: &str = "forms.jsonl";
pub const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Serialize)]
struct FormRow<'a> {
    word: &'a str,
    form: &'a str,
}

#[derive(Debug, Serialize)]
pub struct WrittenFiles {
    pub senses: PathBuf,
    pub relations: PathBuf,
    pub forms: PathBuf,
    pub snapshot: PathBuf,
}

/// Export the three tables as JSONL plus a reloadable snapshot under `dir`
pub async fn write_outputs(dir: &Path, output: &BuildOutput) -> Result<WrittenFiles> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create output dir {}", dir.display()))?;

    let files = WrittenFiles {
        senses: dir.join(SENSES_FILE),
        relations: dir.join(RELATIONS_FILE),
        forms: dir.join(FORMS_FILE),
        snapshot: dir.join(SNAPSHOT_FILE),
    };

    let senses = write_jsonl(&files.senses, output.store.senses()).await?;
    let relations = write_jsonl(&files.relations, output.store.relations()).await?;
    let forms = write_jsonl(
        &files.forms,
        output
            .forms
            .explode()
            .map(|(word, form)| FormRow { word, form }),
    )
    .await?;
    output
        .store
        .save(&files.snapshot)
        .await
        .with_context(|| format!("Failed to save snapshot {}", files.snapshot.display()))?;

    log::info!(
        "Wrote {senses} senses, {relations} relations and {forms} forms to {}",
        dir.display()
    );
    Ok(files)
}

async fn write_jsonl<T, I>(path: &Path, rows: I) -> Result<usize>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let mut buf = Vec::new();
    let mut count = 0;
    for row in rows {
        serde_json::to_writer(&mut buf, &row)?;
        buf.push(b'\n');
        count += 1;
    }
    let tmp = path.with_extension("jsonl.tmp");
    tokio::fs::write(&tmp, &buf)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(count)
}
