use std::collections::BTreeMap;

/// Alias to concrete type name substitutions, read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypePreferences {
    map: BTreeMap<String, String>,
}

impl TypePreferences {
    #[inline]
    #[must_use]
    pub fn new(map: BTreeMap<String, String>) -> Self {
        Self { map }
    }

    /// Returns the preferred name for `name`, or `name` itself if there is no preference for it.
    #[inline]
    #[must_use]
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.map.get(name).map_or(name, String::as_str)
    }
}

impl<A: Into<String>, C: Into<String>> FromIterator<(A, C)> for TypePreferences {
    fn from_iter<I: IntoIterator<Item = (A, C)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(alias, concrete)| (alias.into(), concrete.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TypePreferences;

    #[test]
    fn test_resolve() {
        let preferences = TypePreferences::from_iter([("Cache", "RedisCache")]);

        assert_eq!(preferences.resolve("Cache"), "RedisCache");
        assert_eq!(preferences.resolve("RedisCache"), "RedisCache");
        assert_eq!(preferences.resolve("Db"), "Db");
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let preferences = TypePreferences::from_iter([("Cache", "RedisCache")]);
        let before = preferences.clone();

        for _ in 0..3 {
            assert_eq!(preferences.resolve("Cache"), "RedisCache");
        }
        assert_eq!(preferences, before);
    }
}
