pub mod error;
pub mod fieldspec;
pub mod load;
pub mod manifest;
pub mod options;
pub mod path;
pub mod resmap;
pub mod resource;
pub mod transform;
pub mod write;

pub use self::error::{DocumentError, PathError, TransformError};
pub use self::manifest::{Image, Kustomization};
pub use self::options::Options;
pub use self::resmap::ResourceMap;
pub use self::resource::{ResId, Resource};
pub use self::transform::Pipeline;

/// Runs the configured transformers over `resources` and returns the kustomization
/// the hoisted values were collected into.
pub fn convert(
    options: &Options,
    resources: &mut ResourceMap,
) -> Result<Kustomization, TransformError> {
    let mut config = Kustomization::default();
    Pipeline::from_options(options).run(&mut config, resources)?;
    Ok(config)
}
