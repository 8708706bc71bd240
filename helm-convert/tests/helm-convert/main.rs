use std::path::Path;

use anyhow::Context;
use helm_convert::Options;
use serde::Deserialize;

datatest_stable::harness! {
    { test = test, root = "tests/helm-convert/testdata", pattern = r".*/input\.yaml" },
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let dir = path.parent().context("input has a parent directory")?;
    let options_path = dir.join("options.yaml");
    let options = if options_path.exists() {
        Options::load(&options_path)?
    } else {
        Options::default()
    };

    let mut resources = helm_convert::load::parse_str(&std::fs::read_to_string(path)?)?;
    match helm_convert::convert(&options, &mut resources) {
        Ok(kustomization) => {
            let actual = helm_convert::write::to_string(&kustomization, &resources)?;
            compare_documents(&dir.join("expected.yaml"), &actual)
        }
        Err(err) => snapshot(&dir.join("expected.stderr"), &format!("{err}\n")),
    }
}

/// Compares yaml streams document by document, ignoring document and key order.
fn compare_documents(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    let mut remaining = documents(actual)?;
    let mut missing = Vec::new();
    for document in documents(&expected)? {
        match remaining.iter().position(|actual| *actual == document) {
            Some(index) => {
                remaining.remove(index);
            }
            None => missing.push(document),
        }
    }

    if missing.is_empty() && remaining.is_empty() {
        return Ok(());
    }

    let formatted = format_chunks(dissimilar::diff(
        &render(&missing)?,
        &render(&remaining)?,
    ));
    eprintln!("Snapshot mismatch for {}:\n{}", path.display(), formatted);

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn documents(s: &str) -> anyhow::Result<Vec<serde_yaml::Value>> {
    let mut documents = Vec::new();
    for document in serde_yaml::Deserializer::from_str(s) {
        let value = serde_yaml::Value::deserialize(document)?;
        if !value.is_null() {
            documents.push(value);
        }
    }
    Ok(documents)
}

fn render(documents: &[serde_yaml::Value]) -> anyhow::Result<String> {
    let mut buf = String::new();
    for document in documents {
        buf.push_str("---\n");
        buf.push_str(&serde_yaml::to_string(document)?);
    }
    Ok(buf)
}

fn snapshot(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if expected == actual {
        return Ok(());
    }

    let formatted = format_chunks(dissimilar::diff(&expected, actual));
    eprintln!("Snapshot mismatch for {}:\n{}", path.display(), formatted);

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{text}\x1b[0m"),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{text}\x1b[0m"),
        };
        buf.push_str(&formatted);
    }
    buf
}
