mod builtin;

use std::ops::Deref;

pub use self::builtin::Builtin;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::PathError,
    path::FieldPath,
    resource::{GvkMatcher, Resource},
};

/// A location within resources of matching kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    #[serde(flatten)]
    pub matcher: GvkMatcher,
    pub path: FieldPath,
}

impl FieldSpec {
    pub fn for_each<'a>(
        &self,
        resource: &'a Resource,
        f: &mut impl FnMut(&FieldPath, &'a Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        if !self.matcher.matches(resource.gvk()) {
            return Ok(());
        }

        resource.for_each(&self.path, f)
    }

    pub fn for_each_mut(
        &self,
        resource: &mut Resource,
        f: &mut impl FnMut(&FieldPath, &mut Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        if !self.matcher.matches(resource.gvk()) {
            return Ok(());
        }

        resource.for_each_mut(&self.path, f)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldSpecs {
    specs: Vec<FieldSpec>,
}

impl Deref for FieldSpecs {
    type Target = [FieldSpec];

    fn deref(&self) -> &Self::Target {
        &self.specs
    }
}

impl FieldSpecs {
    /// Visits every node any of the specs match, in spec order.
    pub fn for_each<'a>(
        &self,
        resource: &'a Resource,
        mut f: impl FnMut(&FieldPath, &'a Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        for spec in &self.specs {
            spec.for_each(resource, &mut f)?;
        }

        Ok(())
    }

    pub fn for_each_mut(
        &self,
        resource: &mut Resource,
        mut f: impl FnMut(&FieldPath, &mut Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        for spec in &self.specs {
            spec.for_each_mut(resource, &mut f)?;
        }

        Ok(())
    }
}
