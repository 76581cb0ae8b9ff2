use std::{
    collections::hash_map::DefaultHasher,
    fmt,
    hash::{Hash, Hasher},
};

/// Partition of the lock key space.
///
/// Operations in different namespaces never contend, even for the same
/// username.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LockNamespace {
    Login,
    Register,
}

impl LockNamespace {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Register => "register",
        }
    }
}

impl fmt::Display for LockNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a lock slot: a namespace and a hash of the protected name.
///
/// Two names hashing to the same value share a slot. This only serializes
/// unrelated operations, it never releases a slot held by someone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockKey {
    namespace: LockNamespace,
    hash: u64,
}

impl LockKey {
    pub fn new(namespace: LockNamespace, name: &str) -> Self {
        // `DefaultHasher::new` uses fixed keys, so the value is stable for a
        // given name across calls and instances.
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);

        Self {
            namespace,
            hash: hasher.finish(),
        }
    }

    pub fn login(username: &str) -> Self {
        Self::new(LockNamespace::Login, username)
    }

    pub fn register(username: &str) -> Self {
        Self::new(LockNamespace::Register, username)
    }

    pub fn namespace(&self) -> LockNamespace {
        self.namespace
    }

    pub fn hash(&self) -> u64 {
        self.hash
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:016x}", self.namespace, self.hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_gives_same_key() {
        assert_eq!(LockKey::login("alice"), LockKey::login("alice"));
        assert_eq!(
            LockKey::register("alice").hash(),
            LockKey::login("alice").hash()
        );
    }

    #[test]
    fn namespaces_split_the_key_space() {
        assert_ne!(LockKey::login("alice"), LockKey::register("alice"));
        assert_eq!(LockKey::login("bob").namespace(), LockNamespace::Login);
        assert_eq!(LockKey::register("bob").namespace(), LockNamespace::Register);
    }

    #[test]
    fn different_names_usually_differ() {
        assert_ne!(LockKey::login("alice"), LockKey::login("bob"));
    }

    #[test]
    fn display_includes_namespace() {
        let key = LockKey::register("alice");

        assert!(key.to_string().starts_with("register:"));
    }
}
