use std::sync::OnceLock;

use serde::Deserialize;

use super::FieldSpecs;

const ANNOTATIONS: &[u8] = include_bytes!("annotations.yaml");
const IMAGES: &[u8] = include_bytes!("images.yaml");

/// The locations the builtin transformers visit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct Builtin {
    pub annotations: FieldSpecs,
    pub images: FieldSpecs,
}

impl Builtin {
    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<Builtin> = OnceLock::new();
        INSTANCE.get_or_init(|| Builtin {
            annotations: serde_yaml::from_slice::<FieldSpecs>(ANNOTATIONS)
                .expect("builtin annotations field specs"),
            images: serde_yaml::from_slice::<FieldSpecs>(IMAGES).expect("builtin images field specs"),
        })
    }
}

#[cfg(test)]
#[test]
fn ensure_builtin_fieldspecs_valid() {
    let builtin = Builtin::get();
    assert_eq!(builtin.annotations.len(), 2);
    assert!(builtin.images.iter().all(|spec| spec.path.has_wildcard()));
}
