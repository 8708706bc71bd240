use core::fmt;

use indexmap::{IndexMap, map::Entry};

use crate::resource::{ResId, Resource};

/// The set of resources under transformation, keyed by id.
///
/// Insertion order is kept for output stability only, transformers must not depend on it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ResourceMap {
    resources: IndexMap<ResId, Resource>,
}

impl fmt::Debug for ResourceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resources.values()).finish()
    }
}

impl ResourceMap {
    pub fn from_resources(resources: impl IntoIterator<Item = Resource>) -> Result<Self, Conflict> {
        let mut map = Self::default();
        for resource in resources {
            map.insert(resource)?;
        }
        Ok(map)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn insert(&mut self, resource: Resource) -> Result<(), Conflict> {
        match self.resources.entry(resource.id().clone()) {
            Entry::Occupied(_) => Err(Conflict { resource }),
            Entry::Vacant(entry) => {
                entry.insert(resource);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ResId) -> Option<&Resource> {
        self.resources.get(id)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Resource> + DoubleEndedIterator {
        self.resources.values()
    }

    pub fn iter_mut(
        &mut self,
    ) -> impl ExactSizeIterator<Item = &mut Resource> + DoubleEndedIterator {
        self.resources.values_mut()
    }

    /// Resources in ascending id order, independent of insertion order.
    pub fn iter_sorted(&self) -> impl ExactSizeIterator<Item = &Resource> {
        let mut resources = self.resources.values().collect::<Vec<_>>();
        resources.sort_by(|a, b| a.id().cmp(b.id()));
        resources.into_iter()
    }

    /// In-place merge of two `ResourceMap`s, any conflicting resources will be an error
    pub fn merge(&mut self, other: ResourceMap) -> Result<(), Conflict> {
        for resource in other {
            self.insert(resource)?;
        }
        Ok(())
    }
}

impl IntoIterator for ResourceMap {
    type Item = Resource;
    type IntoIter = indexmap::map::IntoValues<ResId, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.resources.into_values()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub resource: Resource,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "may not add resource with an already registered id `{}`",
            self.resource.id()
        )
    }
}

impl std::error::Error for Conflict {}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::resource::Resource;

    use super::ResourceMap;

    fn config_map(name: &str) -> Resource {
        serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "ConfigMap",
            "metadata": { "name": name },
        }))
        .unwrap()
    }

    #[test]
    fn insert_rejects_duplicates() {
        let mut resources = ResourceMap::default();
        resources.insert(config_map("a")).unwrap();
        let conflict = resources.insert(config_map("a")).unwrap_err();
        assert_eq!(
            conflict.to_string(),
            "may not add resource with an already registered id `ConfigMap.v1/a`"
        );
        assert_eq!(resources.len(), 1);
    }

    #[test]
    fn iter_sorted_ignores_insertion_order() {
        let resources =
            ResourceMap::from_resources([config_map("c"), config_map("a"), config_map("b")])
                .unwrap();

        let names = resources
            .iter_sorted()
            .map(|r| r.name().as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["a", "b", "c"]);
    }
}
