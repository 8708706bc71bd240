use core::fmt;
use std::{ops::Deref, str::FromStr};

use crate::manifest::Str;

/// An ordered sequence of segments addressing nodes within a resource document.
///
/// The textual form is dotted: `metadata.namespace`, `spec.containers[0].image`.
/// A trailing `[]` on a key (`containers[]`) expands over every element of the
/// sequence and is only meaningful for multi-target traversal.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Box<[Segment]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(Str),
    Index(usize),
    Each,
}

impl FieldPath {
    pub fn new(segments: impl IntoIterator<Item = Segment>) -> Self {
        Self {
            segments: segments.into_iter().collect(),
        }
    }

    /// Build a path of plain keys, useful when a key itself contains dots (e.g. `helm.sh/hook`).
    pub fn keys<S: Into<Str>>(keys: impl IntoIterator<Item = S>) -> Self {
        Self::new(keys.into_iter().map(|key| Segment::Key(key.into())))
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Each)
    }

    /// The path made of the first `len` segments.
    pub fn prefix(&self, len: usize) -> Self {
        Self::new(self.segments.iter().take(len).cloned())
    }
}

impl Deref for FieldPath {
    type Target = [Segment];

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

impl<'a> IntoIterator for &'a FieldPath {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

impl fmt::Debug for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, r#""{self}""#)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
                Segment::Each => write!(f, "[]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            anyhow::bail!("path cannot be empty");
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (key, mut rest) = part.find('[').map_or((part, ""), |i| part.split_at(i));

            if key.is_empty() {
                anyhow::bail!("empty key in path `{s}`");
            }
            if key.contains(']') {
                anyhow::bail!("unexpected `]` in key `{key}` of path `{s}`");
            }
            segments.push(Segment::Key(key.into()));

            while !rest.is_empty() {
                let close = rest
                    .find(']')
                    .ok_or_else(|| anyhow::anyhow!("unclosed `[` in path `{s}`"))?;
                let inner = &rest[1..close];
                if inner.is_empty() {
                    segments.push(Segment::Each);
                } else {
                    let index = inner.parse::<usize>().map_err(|_| {
                        anyhow::anyhow!("invalid index `{inner}` in path `{s}`")
                    })?;
                    segments.push(Segment::Index(index));
                }

                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    anyhow::bail!("unexpected `{rest}` after index in path `{s}`");
                }
            }
        }

        Ok(FieldPath::new(segments))
    }
}

impl serde::Serialize for FieldPath {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for FieldPath {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
