use std::collections::{BTreeMap, btree_map::Entry};

use serde_json::Value;

use crate::{
    error::{DocumentError, PathError, Shape, TransformError},
    fieldspec,
    manifest::{Image, Kustomization, Str},
    resmap::ResourceMap,
    resource::Resource,
};

use super::Transformer;

/// A container image reference split into its parts, borrowing from the original string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRef<'a> {
    pub name: &'a str,
    pub tag: Option<&'a str>,
    pub digest: Option<&'a str>,
}

impl<'a> ImageRef<'a> {
    /// Splits `name@digest` or `name[:tag]`.
    ///
    /// A tag is only recognized after the last `/` so a registry port is kept in the name.
    pub fn parse(image: &'a str) -> Self {
        if let Some((name, digest)) = image.split_once('@') {
            return ImageRef {
                name,
                tag: None,
                digest: Some(digest).filter(|digest| !digest.is_empty()),
            };
        }

        let start = image.rfind('/').map_or(0, |i| i + 1);
        match image[start..].rfind(':') {
            Some(i) => {
                let (name, tag) = image.split_at(start + i);
                ImageRef {
                    name,
                    tag: Some(&tag[1..]).filter(|tag| !tag.is_empty()),
                    digest: None,
                }
            }
            None => ImageRef {
                name: image,
                tag: None,
                digest: None,
            },
        }
    }
}

impl From<ImageRef<'_>> for Image {
    fn from(image: ImageRef<'_>) -> Self {
        Image {
            name: image.name.into(),
            new_tag: image.tag.map(Str::from).unwrap_or_default(),
            digest: image.digest.map(Str::from).unwrap_or_default(),
            ..Default::default()
        }
    }
}

/// Collects every container image into the kustomization's `images`.
///
/// Resources are never modified.
#[derive(Debug, Default)]
pub struct ImageTransformer;

impl Transformer for ImageTransformer {
    fn name(&self) -> &'static str {
        "images"
    }

    #[tracing::instrument(skip_all, name = "image_transform")]
    fn transform(
        &mut self,
        config: &mut Kustomization,
        resources: &mut ResourceMap,
    ) -> Result<(), TransformError> {
        let mut images = BTreeMap::<Str, Image>::new();
        for image in &config.images {
            record(&mut images, image.clone());
        }

        let mut errors = Vec::new();
        for resource in resources.iter_sorted() {
            match container_images(resource) {
                Ok(found) => {
                    for image in found {
                        record(&mut images, ImageRef::parse(image).into());
                    }
                }
                Err(source) => errors.push(DocumentError {
                    resource: resource.id().clone(),
                    source,
                }),
            }
        }
        TransformError::check(self.name(), errors)?;

        tracing::debug!(images = images.len(), "collected images");
        config.images = images.into_values().collect();
        Ok(())
    }
}

/// Every non-empty image string in a resource, in field spec order.
fn container_images(resource: &Resource) -> Result<Vec<&str>, PathError> {
    let mut images = Vec::new();
    fieldspec::Builtin::get()
        .images
        .for_each(resource, |at, value| match value {
            Value::String(image) if image.is_empty() => Ok(()),
            Value::String(image) => {
                images.push(image.as_str());
                Ok(())
            }
            _ => Err(PathError::mismatch(at.clone(), Shape::String, value)),
        })?;
    Ok(images)
}

/// The first record for a name wins.
fn record(images: &mut BTreeMap<Str, Image>, image: Image) {
    match images.entry(image.name.clone()) {
        Entry::Vacant(entry) => {
            tracing::debug!(%image, "discovered image");
            entry.insert(image);
        }
        Entry::Occupied(entry) => {
            let kept = entry.get();
            if kept.new_tag != image.new_tag || kept.digest != image.digest {
                tracing::warn!(%kept, ignored = %image, "conflicting image references");
            }
        }
    }
}
