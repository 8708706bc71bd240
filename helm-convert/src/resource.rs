mod access;

use std::{fmt, ops::Deref};

use anyhow::ensure;
use compact_str::format_compact;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{manifest::Str, path::FieldPath};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Gvk {
    pub group: Str,
    pub version: Str,
    pub kind: Str,
}

impl Gvk {
    pub fn from_api_version(api_version: &str, kind: impl Into<Str>) -> Self {
        let (group, version) = api_version
            .split_once('/')
            .map_or(("".into(), api_version.into()), |(g, v)| (g.into(), v.into()));

        Gvk {
            group,
            version,
            kind: kind.into(),
        }
    }

    pub fn api_version(&self) -> Str {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format_compact!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.kind, self.version)
        } else {
            write!(f, "{}.{}.{}", self.kind, self.version, self.group)
        }
    }
}

/// Matches a `Gvk` on every component that is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct GvkMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<Str>,
}

impl fmt::Display for GvkMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = &self.kind {
            write!(f, "{kind}.")?;
        }

        if let Some(version) = &self.version {
            write!(f, "{version}.")?;
        }

        if let Some(group) = &self.group {
            write!(f, "{group}")
        } else {
            write!(f, "*")
        }
    }
}

impl GvkMatcher {
    pub fn matches(&self, gvk: &Gvk) -> bool {
        (self.group.is_none() || self.group.as_ref() == Some(&gvk.group))
            && (self.version.is_none() || self.version.as_ref() == Some(&gvk.version))
            && (self.kind.is_none() || self.kind.as_ref() == Some(&gvk.kind))
    }
}

/// Identifies a resource within a `ResourceMap`.
///
/// The namespace is the one declared when the resource was loaded, it is not
/// updated when a transformer strips `metadata.namespace` from the document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ResId {
    #[serde(flatten)]
    pub gvk: Gvk,
    pub name: Str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
}

impl ResId {
    pub fn new(gvk: Gvk, name: impl Into<Str>) -> Self {
        ResId {
            gvk,
            name: name.into(),
            namespace: None,
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<Str>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

impl Deref for ResId {
    type Target = Gvk;

    fn deref(&self) -> &Self::Target {
        &self.gvk
    }
}

impl fmt::Debug for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ResId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(namespace) = &self.namespace {
            write!(f, "{}/{}.{namespace}", self.gvk, self.name)?;
        } else {
            write!(f, "{}/{}", self.gvk, self.name)?;
        }
        Ok(())
    }
}

pub type Object = serde_json::Map<String, Value>;

/// A single rendered manifest.
///
/// `apiVersion` and `kind` live in the id, `root` holds every other top-level field
/// (`metadata` included) and is always a map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    id: ResId,
    root: Value,
}

impl Resource {
    pub fn new(id: ResId, root: Object) -> anyhow::Result<Self> {
        ensure!(
            !root.contains_key("apiVersion") && !root.contains_key("kind"),
            "root of `{id}` must not duplicate apiVersion or kind"
        );

        Ok(Resource {
            id,
            root: Value::Object(root),
        })
    }

    pub fn id(&self) -> &ResId {
        &self.id
    }

    pub fn name(&self) -> &Str {
        &self.id.name
    }

    pub fn gvk(&self) -> &Gvk {
        &self.id.gvk
    }

    pub fn kind(&self) -> &Str {
        &self.id.kind
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// The `metadata.namespace` currently declared by the document, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.get(&metadata_namespace()).and_then(Value::as_str)
    }
}

fn metadata_namespace() -> FieldPath {
    FieldPath::keys(["metadata", "namespace"])
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Res {
    api_version: Str,
    kind: Str,
    #[serde(flatten)]
    root: Object,
}

impl Serialize for Resource {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        let root = match &self.root {
            Value::Object(root) => root.clone(),
            _ => return Err(serde::ser::Error::custom("resource root must be a map")),
        };

        Res {
            api_version: self.id.gvk.api_version(),
            kind: self.kind().clone(),
            root,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::de::Deserializer<'de>,
    {
        let res = Res::deserialize(deserializer)
            .map_err(|err| serde::de::Error::custom(format!("parsing resource: {err}")))?;

        let metadata = res
            .root
            .get("metadata")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "resource of kind `{}` has no metadata map",
                    res.kind
                ))
            })?;

        let name = metadata
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                serde::de::Error::custom(format!(
                    "resource of kind `{}` has no metadata.name",
                    res.kind
                ))
            })?;

        let namespace = metadata
            .get("namespace")
            .and_then(Value::as_str)
            .filter(|ns| !ns.is_empty())
            .map(Str::from);

        let id = ResId {
            gvk: Gvk::from_api_version(&res.api_version, res.kind),
            name: name.into(),
            namespace,
        };

        Resource::new(id, res.root).map_err(serde::de::Error::custom)
    }
}
