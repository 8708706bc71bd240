use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::manifest::Str;

/// Which transformers run and how they are configured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Options {
    /// Transformers in the order they run.
    pub transformers: Vec<TransformerKind>,
    /// Annotation keys removed by the annotations transformer.
    pub remove_annotations: Vec<Str>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            transformers: TransformerKind::ALL.to_vec(),
            remove_annotations: HELM_HOOK_ANNOTATIONS.iter().copied().map(Str::from).collect(),
        }
    }
}

pub const HELM_HOOK_ANNOTATIONS: &[&str] = &[
    "helm.sh/hook",
    "helm.sh/hook-weight",
    "helm.sh/hook-delete-policy",
];

impl Options {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening options `{}`", path.display()))?;
        serde_yaml::from_reader(file)
            .with_context(|| format!("parsing options `{}`", path.display()))
    }

    /// Drops every occurrence of `kind` from the transformer list.
    pub fn skip(&mut self, kind: TransformerKind) {
        self.transformers.retain(|k| *k != kind);
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "camelCase")]
pub enum TransformerKind {
    Namespace,
    Annotations,
    Images,
}

impl TransformerKind {
    pub const ALL: [TransformerKind; 3] = [
        TransformerKind::Namespace,
        TransformerKind::Annotations,
        TransformerKind::Images,
    ];
}
