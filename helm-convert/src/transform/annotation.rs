use indexmap::IndexSet;
use serde_json::Value;

use crate::{
    error::{DocumentError, PathError, Shape, TransformError},
    fieldspec,
    manifest::{Kustomization, Str},
    resmap::ResourceMap,
};

use super::Transformer;

/// Removes a fixed set of annotation keys wherever annotations live.
///
/// The annotations map itself is kept even if it ends up empty.
#[derive(Debug, Clone)]
pub struct AnnotationsTransformer {
    keys: IndexSet<Str>,
}

impl AnnotationsTransformer {
    pub fn new<S: Into<Str>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Transformer for AnnotationsTransformer {
    fn name(&self) -> &'static str {
        "annotations"
    }

    #[tracing::instrument(skip_all, name = "annotations_transform", fields(keys = ?self.keys))]
    fn transform(
        &mut self,
        _config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> Result<(), TransformError> {
        if self.keys.is_empty() {
            return Ok(());
        }

        let field_specs = &fieldspec::Builtin::get().annotations;
        let mut errors = Vec::new();

        for resource in resources.iter_mut() {
            let id = resource.id().clone();

            // Check every location first so a bad document is left untouched.
            let checked = field_specs.for_each(resource, |at, annotations| {
                if annotations.is_object() {
                    Ok(())
                } else {
                    Err(PathError::mismatch(at.clone(), Shape::Map, annotations))
                }
            });
            if let Err(source) = checked {
                errors.push(DocumentError { resource: id, source });
                continue;
            }

            let mut removed = 0;
            let result = field_specs.for_each_mut(resource, |at, annotations| match annotations {
                Value::Object(annotations) => {
                    for key in &self.keys {
                        if annotations.remove(key.as_str()).is_some() {
                            removed += 1;
                        }
                    }
                    Ok(())
                }
                _ => Err(PathError::mismatch(at.clone(), Shape::Map, annotations)),
            });

            match result {
                Ok(()) if removed > 0 => {
                    tracing::debug!(resource = %id, removed, "removed annotations");
                }
                Ok(()) => {}
                Err(source) => errors.push(DocumentError { resource: id, source }),
            }
        }

        TransformError::check(self.name(), errors)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use crate::{
        error::{PathError, Shape},
        manifest::Kustomization,
        resmap::ResourceMap,
        resource::Resource,
        transform::Transformer,
    };

    use super::AnnotationsTransformer;

    fn ingress() -> Value {
        json!({
            "apiVersion": "networking.k8s.io/v1",
            "kind": "Ingress",
            "metadata": {
                "name": "ing1",
                "annotations": { "kubernetes.io/ingress.class": "nginx" },
            },
        })
    }

    fn deployment(metadata: Value, template: Value) -> Value {
        json!({
            "apiVersion": "apps/v1",
            "kind": "Deployment",
            "metadata": {
                "name": "deploy1",
                "annotations": metadata,
            },
            "spec": {
                "template": {
                    "metadata": { "annotations": template },
                },
            },
        })
    }

    fn resources(documents: impl IntoIterator<Item = Value>) -> ResourceMap {
        ResourceMap::from_resources(
            documents
                .into_iter()
                .map(|value| serde_json::from_value::<Resource>(value).unwrap()),
        )
        .unwrap()
    }

    fn transformer() -> AnnotationsTransformer {
        AnnotationsTransformer::new(["helm.sh/hook", "helm.sh/hook-weight", "remove-me"])
    }

    #[test]
    fn removes_matching_annotations() {
        let mut actual = resources([
            ingress(),
            deployment(
                json!({ "helm.sh/hook": "pre-install", "helm.sh/hook-weight": "5" }),
                json!({ "iam.amazonaws.com/role": "role-arn", "remove-me": "true" }),
            ),
        ]);
        let mut config = Kustomization::default();
        transformer().transform(&mut config, &mut actual).unwrap();

        let expected = resources([
            ingress(),
            deployment(json!({}), json!({ "iam.amazonaws.com/role": "role-arn" })),
        ]);
        assert_eq!(actual, expected);
        assert_eq!(config, Kustomization::default());
    }

    #[test]
    fn keeps_unrelated_and_absent_locations() {
        let pod = json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": { "name": "pod" },
            "spec": { "containers": [] },
        });
        let mut actual = resources([pod.clone()]);
        transformer()
            .transform(&mut Kustomization::default(), &mut actual)
            .unwrap();
        assert_eq!(actual, resources([pod]));
    }

    #[test]
    fn duplicate_keys_are_inert() {
        let mut actual = resources([deployment(
            json!({ "helm.sh/hook": "pre-install", "keep": "me" }),
            json!(null),
        )]);
        AnnotationsTransformer::new(["helm.sh/hook", "helm.sh/hook"])
            .transform(&mut Kustomization::default(), &mut actual)
            .unwrap();

        assert_eq!(
            actual,
            resources([deployment(json!({ "keep": "me" }), json!(null))])
        );
    }

    fn notifier() -> Value {
        json!({
            "apiVersion": "example.com/v1",
            "kind": "Notifier",
            "metadata": {
                "name": "n",
                "annotations": { "helm.sh/hook": "post-install", "keep": "me" },
            },
            "spec": { "template": "Hello {{ .Name }}" },
        })
    }

    #[test]
    fn skips_locations_behind_other_shapes() {
        let mut actual = resources([notifier()]);
        transformer()
            .transform(&mut Kustomization::default(), &mut actual)
            .unwrap();

        let mut expected = notifier();
        expected["metadata"]["annotations"] = json!({ "keep": "me" });
        assert_eq!(actual, resources([expected]));
    }

    #[test]
    fn non_map_annotations_are_reported() {
        let broken = deployment(
            json!({ "helm.sh/hook": "pre-install" }),
            json!("helm.sh/hook=pre-install"),
        );
        let mut actual = resources([ingress(), broken.clone()]);
        let err = transformer()
            .transform(&mut Kustomization::default(), &mut actual)
            .unwrap_err();

        assert_eq!(err.transformer, "annotations");
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].resource.name, "deploy1");
        assert_eq!(
            err.errors[0].source,
            PathError::Mismatch {
                path: "spec.template.metadata.annotations".parse().unwrap(),
                expected: Shape::Map,
                found: Shape::String,
            }
        );
        // The offending document is left as it was.
        assert_eq!(actual, resources([ingress(), broken]));
    }
}
