//! Path based access to the document tree of a `Resource`.
//!
//! Absence is never an error here: a missing key, an out of range index, or a
//! `null` along the way all mean "not found". `set` and `delete` report a node of
//! the wrong shape as a `PathError::Mismatch` naming the offending node. The
//! multi-target traversals treat it as "not found" and leave judging the visited
//! nodes themselves to the callback.

use serde_json::Value;

use crate::{
    error::{PathError, Shape},
    path::{FieldPath, Segment},
};

use super::{Object, Resource};

impl Resource {
    /// The node at `path`, if any. Paths containing a wildcard address no single node.
    pub fn get(&self, path: &FieldPath) -> Option<&Value> {
        let mut curr = &self.root;
        for segment in path {
            curr = match segment {
                Segment::Key(key) => curr.as_object()?.get(key.as_str())?,
                Segment::Index(index) => curr.as_array()?.get(*index)?,
                Segment::Each => return None,
            };
        }
        Some(curr)
    }

    /// Sets the node at `path` to `value`, returning the previous value.
    ///
    /// Missing (or `null`) intermediate nodes are created as empty maps.
    pub fn set(&mut self, path: &FieldPath, value: Value) -> Result<Option<Value>, PathError> {
        if path.has_wildcard() {
            return Err(PathError::Wildcard(path.clone()));
        }

        let Some((last, parents)) = path.split_last() else {
            if !value.is_object() {
                return Err(PathError::mismatch(path.clone(), Shape::Map, &value));
            }
            return Ok(Some(std::mem::replace(&mut self.root, value)));
        };

        let mut curr = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            curr = match segment {
                Segment::Key(key) => {
                    let obj = as_object_mut(curr, path, depth)?;
                    let child = obj
                        .entry(key.as_str())
                        .or_insert_with(|| Value::Object(Object::new()));
                    if child.is_null() {
                        *child = Value::Object(Object::new());
                    }
                    child
                }
                Segment::Index(index) => {
                    let seq = as_array_mut(curr, path, depth)?;
                    let len = seq.len();
                    seq.get_mut(*index).ok_or_else(|| PathError::OutOfBounds {
                        path: path.prefix(depth + 1),
                        len,
                    })?
                }
                Segment::Each => unreachable!("checked for wildcards above"),
            };
        }

        let depth = parents.len();
        match last {
            Segment::Key(key) => Ok(as_object_mut(curr, path, depth)?.insert(key.to_string(), value)),
            Segment::Index(index) => {
                let seq = as_array_mut(curr, path, depth)?;
                match seq.get_mut(*index) {
                    Some(slot) => Ok(Some(std::mem::replace(slot, value))),
                    None => Err(PathError::OutOfBounds {
                        path: path.clone(),
                        len: seq.len(),
                    }),
                }
            }
            Segment::Each => unreachable!("checked for wildcards above"),
        }
    }

    /// Removes the node at `path`, returning it. A missing path is a no-op.
    pub fn delete(&mut self, path: &FieldPath) -> Result<Option<Value>, PathError> {
        if path.has_wildcard() {
            return Err(PathError::Wildcard(path.clone()));
        }

        let Some((last, parents)) = path.split_last() else {
            return Ok(None);
        };

        let mut curr = &mut self.root;
        for (depth, segment) in parents.iter().enumerate() {
            let next = match segment {
                Segment::Key(key) => match curr {
                    Value::Null => None,
                    Value::Object(obj) => obj.get_mut(key.as_str()),
                    _ => return Err(PathError::mismatch(path.prefix(depth), Shape::Map, curr)),
                },
                Segment::Index(index) => match curr {
                    Value::Null => None,
                    Value::Array(seq) => seq.get_mut(*index),
                    _ => {
                        return Err(PathError::mismatch(
                            path.prefix(depth),
                            Shape::Sequence,
                            curr,
                        ));
                    }
                },
                Segment::Each => unreachable!("checked for wildcards above"),
            };

            match next {
                Some(next) => curr = next,
                None => return Ok(None),
            }
        }

        let depth = parents.len();
        match (last, curr) {
            (_, Value::Null) => Ok(None),
            (Segment::Key(key), Value::Object(obj)) => Ok(obj.remove(key.as_str())),
            (Segment::Index(index), Value::Array(seq)) => {
                Ok((*index < seq.len()).then(|| seq.remove(*index)))
            }
            (Segment::Key(_), curr) => Err(PathError::mismatch(path.prefix(depth), Shape::Map, curr)),
            (Segment::Index(_), curr) => {
                Err(PathError::mismatch(path.prefix(depth), Shape::Sequence, curr))
            }
            (Segment::Each, _) => unreachable!("checked for wildcards above"),
        }
    }

    /// Calls `f` with every non-null node matched by `path`, expanding wildcards.
    ///
    /// The path passed to `f` is the concrete location of the node.
    pub fn for_each<'a>(
        &'a self,
        path: &FieldPath,
        mut f: impl FnMut(&FieldPath, &'a Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        let mut at = Vec::with_capacity(path.len());
        visit(&self.root, path, &mut at, &mut f)
    }

    /// Mutable counterpart of `for_each`.
    pub fn for_each_mut(
        &mut self,
        path: &FieldPath,
        mut f: impl FnMut(&FieldPath, &mut Value) -> Result<(), PathError>,
    ) -> Result<(), PathError> {
        let mut at = Vec::with_capacity(path.len());
        visit_mut(&mut self.root, path, &mut at, &mut f)
    }
}

fn as_object_mut<'a>(
    value: &'a mut Value,
    path: &FieldPath,
    depth: usize,
) -> Result<&'a mut Object, PathError> {
    match value {
        Value::Object(obj) => Ok(obj),
        _ => Err(PathError::mismatch(path.prefix(depth), Shape::Map, value)),
    }
}

fn as_array_mut<'a>(
    value: &'a mut Value,
    path: &FieldPath,
    depth: usize,
) -> Result<&'a mut Vec<Value>, PathError> {
    match value {
        Value::Array(seq) => Ok(seq),
        _ => Err(PathError::mismatch(path.prefix(depth), Shape::Sequence, value)),
    }
}

fn visit<'a>(
    node: &'a Value,
    rest: &[Segment],
    at: &mut Vec<Segment>,
    f: &mut dyn FnMut(&FieldPath, &'a Value) -> Result<(), PathError>,
) -> Result<(), PathError> {
    if node.is_null() {
        return Ok(());
    }

    let Some((segment, rest)) = rest.split_first() else {
        return f(&FieldPath::new(at.iter().cloned()), node);
    };

    // An intermediate node of another shape does not contain the path.
    match (segment, node) {
        (Segment::Key(key), Value::Object(obj)) => {
            if let Some(child) = obj.get(key.as_str()) {
                at.push(segment.clone());
                visit(child, rest, at, f)?;
                at.pop();
            }
        }
        (Segment::Index(index), Value::Array(seq)) => {
            if let Some(child) = seq.get(*index) {
                at.push(segment.clone());
                visit(child, rest, at, f)?;
                at.pop();
            }
        }
        (Segment::Each, Value::Array(seq)) => {
            for (index, child) in seq.iter().enumerate() {
                at.push(Segment::Index(index));
                visit(child, rest, at, f)?;
                at.pop();
            }
        }
        _ => {}
    }

    Ok(())
}

fn visit_mut(
    node: &mut Value,
    rest: &[Segment],
    at: &mut Vec<Segment>,
    f: &mut dyn FnMut(&FieldPath, &mut Value) -> Result<(), PathError>,
) -> Result<(), PathError> {
    if node.is_null() {
        return Ok(());
    }

    let Some((segment, rest)) = rest.split_first() else {
        return f(&FieldPath::new(at.iter().cloned()), node);
    };

    match segment {
        Segment::Key(key) => {
            if let Some(child) = node.as_object_mut().and_then(|obj| obj.get_mut(key.as_str())) {
                at.push(segment.clone());
                visit_mut(child, rest, at, f)?;
                at.pop();
            }
        }
        Segment::Index(index) => {
            if let Some(child) = node.as_array_mut().and_then(|seq| seq.get_mut(*index)) {
                at.push(segment.clone());
                visit_mut(child, rest, at, f)?;
                at.pop();
            }
        }
        Segment::Each => {
            if let Value::Array(seq) = node {
                for (index, child) in seq.iter_mut().enumerate() {
                    at.push(Segment::Index(index));
                    visit_mut(child, rest, at, f)?;
                    at.pop();
                }
            }
        }
    }

    Ok(())
}
