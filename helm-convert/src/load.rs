use std::{
    io::Read,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;
use serde_json::Value;

use crate::{resmap::ResourceMap, resource::Resource};

/// Parses a multi-document yaml stream such as the output of `helm template`.
///
/// Empty documents are skipped and `List` documents contribute their items.
pub fn parse_str(input: &str) -> anyhow::Result<ResourceMap> {
    let mut resources = ResourceMap::default();
    for (index, document) in serde_yaml::Deserializer::from_str(input).enumerate() {
        let value = Value::deserialize(document)
            .with_context(|| format!("parsing yaml document {index}"))?;

        for value in flatten(value) {
            let resource = serde_json::from_value::<Resource>(value)
                .with_context(|| format!("invalid resource in yaml document {index}"))?;
            resources.insert(resource)?;
        }
    }

    tracing::debug!(resources = resources.len(), "parsed resources");
    Ok(resources)
}

/// Loads a single file, every yaml file in a directory, or stdin if `path` is `-`.
pub fn load_path(path: impl AsRef<Path>) -> anyhow::Result<ResourceMap> {
    let path = path.as_ref();
    if path == Path::new("-") {
        let mut input = String::new();
        std::io::stdin()
            .read_to_string(&mut input)
            .context("reading stdin")?;
        return parse_str(&input);
    }

    if !path.is_dir() {
        return load_file(path);
    }

    let mut files = std::fs::read_dir(path)
        .with_context(|| format!("reading directory `{}`", path.display()))?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<std::io::Result<Vec<PathBuf>>>()
        .with_context(|| format!("reading directory `{}`", path.display()))?;
    files.retain(|file| {
        file.is_file()
            && file
                .extension()
                .is_some_and(|ext| ext == "yaml" || ext == "yml")
    });
    files.sort();

    let mut resources = ResourceMap::default();
    for file in files {
        resources.merge(load_file(&file)?)?;
    }
    Ok(resources)
}

#[tracing::instrument(level = "debug")]
fn load_file(path: &Path) -> anyhow::Result<ResourceMap> {
    let input = std::fs::read_to_string(path)
        .with_context(|| format!("reading `{}`", path.display()))?;
    parse_str(&input).with_context(|| format!("loading `{}`", path.display()))
}

fn flatten(value: Value) -> Vec<Value> {
    match value {
        Value::Null => vec![],
        Value::Object(mut object) if is_list(&object) => match object.remove("items") {
            Some(Value::Array(items)) => items.into_iter().flat_map(flatten).collect(),
            _ => vec![],
        },
        value => vec![value],
    }
}

fn is_list(object: &serde_json::Map<String, Value>) -> bool {
    object
        .get("kind")
        .and_then(Value::as_str)
        .is_some_and(|kind| kind.ends_with("List"))
        && object.get("items").is_some_and(Value::is_array)
}
