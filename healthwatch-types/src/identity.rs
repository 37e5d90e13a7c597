//! Component identities - how a position in the module tree becomes a key.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Separator between segments in the canonical string form.
pub const SEPARATOR: char = '.';

/// Errors raised while constructing a [`FullModuleId`] or [`Identity`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// No segments were supplied.
    #[error("identity must have at least one segment")]
    Empty,

    /// A segment was the empty string.
    #[error("identity segment {position} is empty")]
    EmptySegment { position: usize },

    /// A segment contained the separator character.
    #[error("identity segment {segment:?} contains the '.' separator")]
    Separator { segment: String },
}

fn validate<I, S>(segments: I) -> Result<Vec<String>, IdentityError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
    if segments.is_empty() {
        return Err(IdentityError::Empty);
    }
    for (position, segment) in segments.iter().enumerate() {
        check_segment(segment, position)?;
    }
    Ok(segments)
}

fn check_segment(segment: &str, position: usize) -> Result<(), IdentityError> {
    if segment.is_empty() {
        return Err(IdentityError::EmptySegment { position });
    }
    if segment.contains(SEPARATOR) {
        return Err(IdentityError::Separator {
            segment: segment.to_string(),
        });
    }
    Ok(())
}

/// The path of a module in the application's component tree.
///
/// A module id is never empty and none of its segments are empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullModuleId(Vec<String>);

impl FullModuleId {
    /// Create a module id from its path segments.
    ///
    /// # Example
    ///
    /// ```rust
    /// use healthwatch_types::FullModuleId;
    ///
    /// let id = FullModuleId::new(["foo", "bar"]).unwrap();
    /// assert_eq!(id.to_string(), "foo.bar");
    /// assert!(FullModuleId::new(["foo", ""]).is_err());
    /// ```
    pub fn new<I, S>(segments: I) -> Result<Self, IdentityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate(segments).map(Self)
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for FullModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(&SEPARATOR.to_string()))
    }
}

/// The primary key of a status row: a module id plus any number of scopes.
///
/// Identities compare, hash and order by their canonical dotted string, so
/// an identity built from a module id and then extended with scopes equals
/// one built directly from the same segment sequence.
///
/// Cloning is a pair of reference-count bumps.
#[derive(Clone)]
pub struct Identity {
    segments: Arc<[String]>,
    key: Arc<str>,
}

impl Identity {
    /// Create an identity directly from its segments.
    pub fn new<I, S>(segments: I) -> Result<Self, IdentityError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        validate(segments).map(Self::from_segments)
    }

    /// The identity of a module itself, with no scopes.
    pub fn from_module(module: &FullModuleId) -> Self {
        Self::from_segments(module.0.clone())
    }

    fn from_segments(segments: Vec<String>) -> Self {
        let key = segments.join(&SEPARATOR.to_string());
        Self {
            segments: segments.into(),
            key: key.into(),
        }
    }

    /// Extend this identity with one more scope segment.
    pub fn child(&self, name: impl Into<String>) -> Result<Self, IdentityError> {
        let name = name.into();
        check_segment(&name, self.segments.len())?;

        let mut segments = self.segments.to_vec();
        segments.push(name);
        Ok(Self::from_segments(segments))
    }

    /// The segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The canonical dotted form.
    pub fn as_str(&self) -> &str {
        &self.key
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Whether `self` is `ancestor` or lies beneath it.
    pub fn starts_with(&self, ancestor: &Identity) -> bool {
        self.segments.starts_with(&ancestor.segments)
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Identity {}

impl Hash for Identity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Identity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Identity").field(&self.key).finish()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl From<&FullModuleId> for Identity {
    fn from(module: &FullModuleId) -> Self {
        Self::from_module(module)
    }
}

impl FromStr for Identity {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(IdentityError::Empty);
        }
        Self::new(s.split(SEPARATOR))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Identity {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Identity {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_id_rejects_empty_input() {
        let none: [&str; 0] = [];
        assert_eq!(FullModuleId::new(none), Err(IdentityError::Empty));
        assert_eq!(
            FullModuleId::new(["foo", ""]),
            Err(IdentityError::EmptySegment { position: 1 })
        );
    }

    #[test]
    fn child_appends_segment() {
        let module = FullModuleId::new(["foo", "bar"]).unwrap();
        let id = Identity::from_module(&module)
            .child("zzz")
            .unwrap()
            .child("xxx")
            .unwrap();

        assert_eq!(id.as_str(), "foo.bar.zzz.xxx");
        assert_eq!(id.depth(), 4);
    }

    #[test]
    fn construction_paths_agree() {
        let module = FullModuleId::new(["foo", "bar"]).unwrap();
        let scoped = Identity::from_module(&module).child("zzz").unwrap();

        let direct_module = FullModuleId::new(["foo", "bar", "zzz"]).unwrap();
        let direct = Identity::from_module(&direct_module);

        assert_eq!(scoped, direct);
        assert_eq!(scoped, Identity::new(["foo", "bar", "zzz"]).unwrap());
    }

    #[test]
    fn child_rejects_bad_names() {
        let id = Identity::new(["foo"]).unwrap();
        assert_eq!(
            id.child(""),
            Err(IdentityError::EmptySegment { position: 1 })
        );
        assert!(matches!(
            id.child("a.b"),
            Err(IdentityError::Separator { .. })
        ));
    }

    #[test]
    fn parse_round_trips_display() {
        let id: Identity = "foo.bar.zzz".parse().unwrap();
        assert_eq!(id.segments(), ["foo", "bar", "zzz"]);
        assert_eq!(id.to_string(), "foo.bar.zzz");

        assert!("".parse::<Identity>().is_err());
        assert!("foo..bar".parse::<Identity>().is_err());
    }

    #[test]
    fn starts_with_matches_whole_segments() {
        let parent: Identity = "foo.bar".parse().unwrap();
        let child: Identity = "foo.bar.zzz".parse().unwrap();
        let sibling: Identity = "foo.bar2.zzz".parse().unwrap();

        assert!(child.starts_with(&parent));
        assert!(parent.starts_with(&parent));
        assert!(!sibling.starts_with(&parent));
        assert!(!parent.starts_with(&child));
    }

    #[test]
    fn ordering_follows_dotted_form() {
        let a: Identity = "foo.bar.zzz".parse().unwrap();
        let b: Identity = "foo.bar2.zzz".parse().unwrap();
        assert!(a < b);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_string() {
        let id: Identity = "foo.bar".parse().unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"foo.bar\"");

        let parsed: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, id);
        assert!(serde_json::from_str::<Identity>("\"foo..bar\"").is_err());
    }
}
