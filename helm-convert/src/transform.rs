mod annotation;
mod image;
mod namespace;

use core::fmt;

pub use self::annotation::AnnotationsTransformer;
pub use self::image::{ImageRef, ImageTransformer};
pub use self::namespace::NamespaceTransformer;

use crate::{
    error::TransformError,
    manifest::Kustomization,
    options::{Options, TransformerKind},
    resmap::ResourceMap,
};

/// A single pass over every resource.
///
/// Transformers never add or remove resources and only communicate through the
/// `Kustomization` they are given, which they merge into rather than overwrite.
pub trait Transformer {
    fn name(&self) -> &'static str;

    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> Result<(), TransformError>;
}

/// An ordered list of transformers, run one full pass at a time.
#[derive(Default)]
pub struct Pipeline {
    transformers: Vec<Box<dyn Transformer>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl Pipeline {
    pub fn from_options(options: &Options) -> Self {
        let mut pipeline = Pipeline::default();
        for kind in &options.transformers {
            match kind {
                TransformerKind::Namespace => pipeline.push(NamespaceTransformer::default()),
                TransformerKind::Annotations => pipeline.push(AnnotationsTransformer::new(
                    options.remove_annotations.iter().cloned(),
                )),
                TransformerKind::Images => pipeline.push(ImageTransformer::default()),
            }
        }
        pipeline
    }

    pub fn push(&mut self, transformer: impl Transformer + 'static) {
        self.transformers.push(Box::new(transformer));
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        self.transformers.iter().map(|transformer| transformer.name())
    }

    /// Runs every transformer in order, stopping at the first failure.
    #[tracing::instrument(skip_all, fields(resources = resources.len()))]
    pub fn run(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> Result<(), TransformError> {
        for transformer in &mut self.transformers {
            tracing::debug!(transformer = transformer.name(), "running transformer");
            transformer.transform(config, resources)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        error::TransformError,
        manifest::Kustomization,
        options::{Options, TransformerKind},
        resmap::ResourceMap,
        resource::Resource,
    };

    use super::{Pipeline, Transformer};

    struct Record(&'static str);

    impl Transformer for Record {
        fn name(&self) -> &'static str {
            self.0
        }

        fn transform(
            &mut self,
            config: &mut Kustomization,
            _: &mut ResourceMap,
        ) -> Result<(), TransformError> {
            config.common_labels.insert(self.0.into(), "seen".into());
            if self.0 == "fail" {
                return Err(TransformError::new(self.0, vec![]));
            }
            Ok(())
        }
    }

    #[test]
    fn runs_in_order_and_stops_on_error() {
        let mut pipeline = Pipeline::default();
        pipeline.push(Record("first"));
        pipeline.push(Record("fail"));
        pipeline.push(Record("never"));

        let mut config = Kustomization::default();
        let err = pipeline
            .run(&mut config, &mut ResourceMap::default())
            .unwrap_err();

        assert_eq!(err.transformer, "fail");
        assert_eq!(
            config
                .common_labels
                .keys()
                .map(|key| key.as_str())
                .collect::<Vec<_>>(),
            ["first", "fail"]
        );
    }

    #[test]
    fn from_options() {
        let pipeline = Pipeline::from_options(&Options::default());
        assert_eq!(
            pipeline.names().collect::<Vec<_>>(),
            ["namespace", "annotations", "images"]
        );

        let options = Options {
            transformers: vec![TransformerKind::Images],
            ..Default::default()
        };
        assert_eq!(
            Pipeline::from_options(&options).names().collect::<Vec<_>>(),
            ["images"]
        );
    }

    #[test]
    fn full_pipeline() {
        let resources = [
            json!({
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "metadata": {
                    "name": "web",
                    "namespace": "staging",
                    "annotations": { "helm.sh/hook": "pre-install" },
                },
                "spec": {
                    "template": {
                        "spec": { "containers": [{ "name": "nginx", "image": "nginx:1.7.9" }] },
                    },
                },
            }),
            json!({
                "apiVersion": "v1",
                "kind": "Service",
                "metadata": { "name": "web", "namespace": "staging" },
            }),
        ];
        let mut resources = ResourceMap::from_resources(
            resources
                .into_iter()
                .map(|value| serde_json::from_value::<Resource>(value).unwrap()),
        )
        .unwrap();

        let mut config = Kustomization::default();
        Pipeline::from_options(&Options::default())
            .run(&mut config, &mut resources)
            .unwrap();

        assert_eq!(config.namespace.as_deref(), Some("staging"));
        assert_eq!(config.images.len(), 1);
        for resource in resources.iter() {
            assert_eq!(resource.namespace(), None);
        }
        let deployment = resources.iter().next().unwrap();
        assert_eq!(
            deployment.root()["metadata"]["annotations"],
            json!({}),
            "annotations map is kept even when emptied"
        );
    }
}
