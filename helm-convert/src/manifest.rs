use core::fmt;
use std::path::PathBuf;

use compact_str::CompactString;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub type Str = CompactString;

/// The overlay descriptor that hoisted values accumulate into.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kustomization {
    #[serde(flatten)]
    pub type_meta: TypeMeta<apiversion::V1Beta1, kind::Kustomization>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub common_labels: IndexMap<Str, Str>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub common_annotations: IndexMap<Str, Str>,
    #[serde(default, skip_serializing_if = "<[_]>::is_empty")]
    pub resources: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "<[_]>::is_empty")]
    pub images: Vec<Image>,
}

/// An image override as understood by kustomize's `images` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Image {
    pub name: Str,
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub new_name: Str,
    // `new_tag` is the value used to replace the original tag.
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub new_tag: Str,
    // `digest` is the value used to replace the original image tag.
    // If `digest` is present `new_tag` is ignored.
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub digest: Str,
}

impl Image {
    pub fn new(name: impl Into<Str>) -> Self {
        Image {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_tag(mut self, tag: impl Into<Str>) -> Self {
        self.new_tag = tag.into();
        self
    }

    pub fn with_digest(mut self, digest: impl Into<Str>) -> Self {
        self.digest = digest.into();
        self
    }
}

impl fmt::Display for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.digest.is_empty() {
            write!(f, "@{}", self.digest)
        } else if !self.new_tag.is_empty() {
            write!(f, ":{}", self.new_tag)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeMeta<V, K> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<V>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<K>,
}

impl<V, K> Default for TypeMeta<V, K>
where
    V: Default,
    K: Default,
{
    fn default() -> Self {
        Self {
            api_version: Some(V::default()),
            kind: Some(K::default()),
        }
    }
}

pub mod kind {
    use super::define_symbol;

    define_symbol!(Kustomization = "Kustomization");
}

pub mod apiversion {
    use super::define_symbol;

    define_symbol!(V1Beta1 = "kustomize.config.k8s.io/v1beta1");
}

macro_rules! define_symbol {
    ($name:ident = $value:literal) => {
        #[derive(Clone, PartialEq, Eq, Hash, Default)]
        pub struct $name;

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", $value)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", $value)
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str($value)
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let value: $crate::manifest::Str = ::serde::Deserialize::deserialize(deserializer)?;
                if value == $value {
                    Ok($name)
                } else {
                    Err(::serde::de::Error::custom(format!(
                        "expected `{}`, found `{value}`",
                        $value
                    )))
                }
            }
        }
    };
}

use define_symbol;
