//! Common types for parsers

/// Classification of a dependency change, derived from which versions are present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    /// Only the new version is present
    Addition,
    /// Only the old version is present
    Removal,
    /// Both versions are present
    Update,
}

impl ChangeKind {
    /// Returns the string representation of the change kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Addition => "addition",
            ChangeKind::Removal => "removal",
            ChangeKind::Update => "update",
        }
    }
}

/// A change of one package's pinned version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChange {
    /// Package name (e.g., "requests")
    pub name: String,
    /// Version before the change
    pub old_version: Option<String>,
    /// Version after the change
    pub new_version: Option<String>,
}

impl DependencyChange {
    pub fn new(name: &str, old_version: Option<&str>, new_version: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            old_version: old_version.map(str::to_string),
            new_version: new_version.map(str::to_string),
        }
    }

    /// Convenience constructor for a version bump
    pub fn update(name: &str, old_version: &str, new_version: &str) -> Self {
        Self::new(name, Some(old_version), Some(new_version))
    }

    /// Returns the classification, or None when neither version is present
    pub fn kind(&self) -> Option<ChangeKind> {
        match (&self.old_version, &self.new_version) {
            (None, Some(_)) => Some(ChangeKind::Addition),
            (Some(_), None) => Some(ChangeKind::Removal),
            (Some(_), Some(_)) => Some(ChangeKind::Update),
            (None, None) => None,
        }
    }

    pub fn is_update(&self) -> bool {
        self.kind() == Some(ChangeKind::Update)
    }

    /// Returns `(old, new)` when this change is an update
    pub fn versions(&self) -> Option<(&str, &str)> {
        match (&self.old_version, &self.new_version) {
            (Some(old), Some(new)) => Some((old.as_str(), new.as_str())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, Some("1.0.0"), Some(ChangeKind::Addition))]
    #[case(Some("1.0.0"), None, Some(ChangeKind::Removal))]
    #[case(Some("1.0.0"), Some("2.0.0"), Some(ChangeKind::Update))]
    #[case(None, None, None)]
    fn kind_is_derived_from_present_versions(
        #[case] old: Option<&str>,
        #[case] new: Option<&str>,
        #[case] expected: Option<ChangeKind>,
    ) {
        let change = DependencyChange::new("pkg", old, new);
        assert_eq!(change.kind(), expected);
    }

    #[rstest]
    #[case(ChangeKind::Addition, "addition")]
    #[case(ChangeKind::Removal, "removal")]
    #[case(ChangeKind::Update, "update")]
    fn kind_as_str(#[case] kind: ChangeKind, #[case] expected: &str) {
        assert_eq!(kind.as_str(), expected);
    }

    #[test]
    fn versions_returns_pair_only_for_updates() {
        assert_eq!(
            DependencyChange::update("requests", "2.25.1", "2.26.0").versions(),
            Some(("2.25.1", "2.26.0"))
        );
        assert_eq!(
            DependencyChange::new("flask", None, Some("1.1.2")).versions(),
            None
        );
    }
}
