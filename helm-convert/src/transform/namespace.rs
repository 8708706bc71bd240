use std::collections::BTreeSet;

use serde_json::Value;

use crate::{
    error::{DocumentError, PathError, Shape, TransformError},
    manifest::{Kustomization, Str},
    path::FieldPath,
    resmap::ResourceMap,
    resource::Resource,
};

use super::Transformer;

/// Hoists the namespace into the kustomization if every resource that declares
/// one declares the same one.
#[derive(Debug, Default)]
pub struct NamespaceTransformer;

impl Transformer for NamespaceTransformer {
    fn name(&self) -> &'static str {
        "namespace"
    }

    #[tracing::instrument(skip_all, name = "namespace_transform")]
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> Result<(), TransformError> {
        let path = FieldPath::keys(["metadata", "namespace"]);

        let mut namespaces = BTreeSet::<Str>::new();
        namespaces.extend(config.namespace.clone().filter(|ns| !ns.is_empty()));

        let mut errors = Vec::new();
        for resource in resources.iter() {
            match declared_namespace(resource, &path) {
                Ok(Some(namespace)) => {
                    namespaces.insert(namespace.into());
                }
                Ok(None) => {}
                Err(source) => errors.push(DocumentError {
                    resource: resource.id().clone(),
                    source,
                }),
            }
        }
        TransformError::check(self.name(), errors)?;

        if namespaces.len() != 1 {
            tracing::debug!(?namespaces, "resources do not share a single namespace");
            return Ok(());
        }

        let Some(namespace) = namespaces.pop_first() else {
            return Ok(());
        };

        let mut errors = Vec::new();
        for resource in resources.iter_mut() {
            if resource.get(&path).and_then(Value::as_str) != Some(namespace.as_str()) {
                continue;
            }

            if let Err(source) = resource.delete(&path) {
                errors.push(DocumentError {
                    resource: resource.id().clone(),
                    source,
                });
            }
        }
        TransformError::check(self.name(), errors)?;

        tracing::debug!(%namespace, "hoisted common namespace");
        config.namespace = Some(namespace);
        Ok(())
    }
}

/// The non-empty namespace a resource declares.
fn declared_namespace<'a>(
    resource: &'a Resource,
    path: &FieldPath,
) -> Result<Option<&'a str>, PathError> {
    let mut namespace = None;
    resource.for_each(path, |at, value| match value {
        Value::String(ns) => {
            namespace = Some(ns.as_str()).filter(|ns| !ns.is_empty());
            Ok(())
        }
        _ => Err(PathError::mismatch(at.clone(), Shape::String, value)),
    })?;
    Ok(namespace)
}
