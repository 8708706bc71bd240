use std::{
    collections::BTreeMap,
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::{Context, bail};

use crate::{
    manifest::Kustomization,
    resmap::ResourceMap,
    resource::{ResId, Resource},
};

pub const KUSTOMIZATION_FILE: &str = "kustomization.yaml";

/// The file a resource is written to within an overlay, `<name>-<kind>[.<group>].yaml`.
pub fn file_name(id: &ResId) -> PathBuf {
    let name = if id.group.is_empty() {
        format!("{}-{}.yaml", id.name, id.kind)
    } else {
        format!("{}-{}.{}.yaml", id.name, id.kind, id.group)
    };
    PathBuf::from(name.to_lowercase())
}

/// Renders the kustomization followed by every resource as one yaml stream.
pub fn to_string(config: &Kustomization, resources: &ResourceMap) -> anyhow::Result<String> {
    let mut out = serde_yaml::to_string(config)?;
    for resource in resources.iter() {
        writeln!(out, "---")?;
        out.push_str(&serde_yaml::to_string(resource)?);
    }
    Ok(out)
}

/// Writes every resource to its own file in `dir` along with a `kustomization.yaml` listing them.
#[tracing::instrument(skip(config, resources), fields(resources = resources.len()))]
pub fn write_overlay(
    dir: &Path,
    config: &mut Kustomization,
    resources: &ResourceMap,
) -> anyhow::Result<()> {
    let mut files = BTreeMap::<PathBuf, &Resource>::new();
    for resource in resources.iter() {
        let file = file_name(resource.id());
        if let Some(other) = files.insert(file.clone(), resource) {
            bail!(
                "resources `{}` and `{}` would both be written to `{}`",
                other.id(),
                resource.id(),
                file.display()
            );
        }
    }

    std::fs::create_dir_all(dir).with_context(|| format!("creating `{}`", dir.display()))?;
    for (file, resource) in &files {
        write_yaml(&dir.join(file), resource)?;
    }

    config.resources = files.into_keys().collect();
    write_yaml(&dir.join(KUSTOMIZATION_FILE), config)?;

    tracing::debug!(dir = %dir.display(), "wrote overlay");
    Ok(())
}

fn write_yaml(path: &Path, value: &impl serde::Serialize) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating `{}`", path.display()))?;
    serde_yaml::to_writer(std::io::BufWriter::new(file), value)
        .with_context(|| format!("writing `{}`", path.display()))
}
