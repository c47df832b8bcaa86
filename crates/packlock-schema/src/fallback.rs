//! Asset target fallback: a root framework plus an ordered list of
//! frameworks to try when the root has no compatible assets.

use crate::framework::Framework;
use std::fmt;

/// Root framework followed by fallbacks in search order.
///
/// Equality and hashing take the fallback list as a sequence: the same
/// frameworks in a different order describe a different search.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetTargetFallbackFramework {
    root: Framework,
    fallback: Vec<Framework>,
}

impl AssetTargetFallbackFramework {
    pub fn new(root: Framework, fallback: Vec<Framework>) -> Self {
        Self { root, fallback }
    }

    pub fn root(&self) -> &Framework {
        &self.root
    }

    pub fn fallback(&self) -> &[Framework] {
        &self.fallback
    }

    /// Root first, then each fallback in order.
    pub fn candidates(&self) -> impl Iterator<Item = &Framework> {
        std::iter::once(&self.root).chain(&self.fallback)
    }
}

impl fmt::Display for AssetTargetFallbackFramework {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for fallback in &self.fallback {
            write!(f, ";{fallback}")?;
        }
        Ok(())
    }
}

/// The framework a target restores against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetFramework {
    Framework(Framework),
    AssetTargetFallback(AssetTargetFallbackFramework),
}

impl TargetFramework {
    /// The declared project framework.
    pub fn root(&self) -> &Framework {
        match self {
            Self::Framework(framework) => framework,
            Self::AssetTargetFallback(fallback) => fallback.root(),
        }
    }

    pub fn as_fallback(&self) -> Option<&AssetTargetFallbackFramework> {
        match self {
            Self::Framework(_) => None,
            Self::AssetTargetFallback(fallback) => Some(fallback),
        }
    }
}

impl From<Framework> for TargetFramework {
    fn from(framework: Framework) -> Self {
        Self::Framework(framework)
    }
}

impl From<AssetTargetFallbackFramework> for TargetFramework {
    fn from(fallback: AssetTargetFallbackFramework) -> Self {
        Self::AssetTargetFallback(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn fw(s: &str) -> Framework {
        Framework::parse(s)
    }

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn same_root_and_order_are_equal() {
        let a = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net461"), fw("net462")]);
        let b = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net461"), fw("net462")]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn fallback_order_matters() {
        let a = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net461"), fw("net462")]);
        let b = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net462"), fw("net461")]);
        assert_ne!(a, b);
    }

    #[test]
    fn root_and_membership_matter() {
        let a = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net461")]);
        let other_root = AssetTargetFallbackFramework::new(fw("netcoreapp2.1"), vec![fw("net461")]);
        let other_set = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net45")]);
        let longer = AssetTargetFallbackFramework::new(fw("netcoreapp2.0"), vec![fw("net461"), fw("net45")]);
        assert_ne!(a, other_root);
        assert_ne!(a, other_set);
        assert_ne!(a, longer);
    }

    #[test]
    fn candidates_start_at_root() {
        let atf = AssetTargetFallbackFramework::new(fw("net6.0"), vec![fw("net48"), fw("net472")]);
        let names: Vec<String> = atf.candidates().map(ToString::to_string).collect();
        assert_eq!(names, ["net6.0", "net48", "net472"]);
        assert_eq!(atf.to_string(), "net6.0;net48;net472");
    }

    #[test]
    fn target_framework_root() {
        let atf = AssetTargetFallbackFramework::new(fw("net6.0"), vec![fw("net48")]);
        let target = TargetFramework::from(atf.clone());
        assert_eq!(target.root(), &fw("net6.0"));
        assert_eq!(target.as_fallback(), Some(&atf));
        assert_ne!(target, TargetFramework::from(fw("net6.0")));
    }
}
