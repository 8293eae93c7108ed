use std::{hash::Hash, sync::Arc};

/// Name of the destination a broadcast is published to.
///
/// `Channel` is cheap to clone. Equality uses string comparison with a
/// fast-path for pointer equality when two channels share the same
/// allocation, so channels built from the same literal in test code and in
/// application code compare equal.
///
/// # Example
///
/// ```
/// use castcheck::Channel;
///
/// let a = Channel::new("chat_room_1");
/// let b: Channel = "chat_room_1".into();
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "chat_room_1");
/// ```
#[derive(Debug, Clone, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Channel(Arc<str>);

impl Channel {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    /// Channel for broadcasts addressed to a single model.
    ///
    /// The name is `"{prefix}:{stream_param}"`, where the stream parameter
    /// is whatever the model chooses to identify itself with.
    ///
    /// ```
    /// use castcheck::{Channel, Streamable};
    ///
    /// struct Room(u32);
    ///
    /// impl Streamable for Room {
    ///     fn to_stream_param(&self) -> String {
    ///         format!("room-{}", self.0)
    ///     }
    /// }
    ///
    /// assert_eq!(Channel::broadcasting_for("chat", &Room(7)).as_str(), "chat:room-7");
    /// ```
    pub fn broadcasting_for<M: Streamable + ?Sized>(prefix: &str, model: &M) -> Self {
        Self::from(format!("{prefix}:{}", model.to_stream_param()))
    }

    /// Returns the string representation of this channel.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for Channel {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Eq for Channel {}

impl PartialEq<str> for Channel {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for Channel {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl Hash for Channel {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Channel {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Channel {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl From<&String> for Channel {
    fn from(s: &String) -> Self {
        Self::new(s)
    }
}

impl From<&Channel> for Channel {
    fn from(c: &Channel) -> Self {
        c.clone()
    }
}

/// A model that can be the target of a broadcast.
///
/// Implementors supply an opaque, stable parameter identifying the record.
/// How that parameter is encoded (global ids, database keys) is up to the
/// application; castcheck only concatenates it into a [`Channel`] name.
pub trait Streamable {
    fn to_stream_param(&self) -> String;
}

impl<T: Streamable + ?Sized> Streamable for &T {
    fn to_stream_param(&self) -> String {
        (**self).to_stream_param()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct User {
        id: u64,
    }

    impl Streamable for User {
        fn to_stream_param(&self) -> String {
            format!("gid://dummy/User/{}", self.id)
        }
    }

    #[test]
    fn channels_from_same_name_are_equal() {
        let a = Channel::new("stream");
        let b = Channel::from(String::from("stream"));
        assert_eq!(a, b);
        assert_eq!(a, "stream");
        assert_ne!(a, Channel::new("stream_a"));
    }

    #[test]
    fn channels_hash_by_name() {
        let mut set = HashSet::new();
        set.insert(Channel::new("stream"));
        assert!(set.contains(&Channel::from("stream")));
    }

    #[test]
    fn broadcasting_for_joins_prefix_and_stream_param() {
        let user = User { id: 42 };
        let channel = Channel::broadcasting_for("notifications", &user);
        assert_eq!(channel.as_str(), "notifications:gid://dummy/User/42");
    }

    #[test]
    fn display_prints_the_name() {
        assert_eq!(Channel::new("stream_b").to_string(), "stream_b");
    }
}
