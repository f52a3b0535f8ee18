#[cfg(test)]
mod tests {
    use crate::events::{Event, EventKey};
    use std::collections::HashSet;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping {
        sequence: u64,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Pong {
        sequence: u64,
    }

    #[test]
    fn test_event_key_matches_static_type() {
        let ping = Ping { sequence: 1 };
        assert_eq!(ping.event_key(), EventKey::of::<Ping>());
        assert_ne!(ping.event_key(), EventKey::of::<Pong>());
    }

    #[test]
    fn test_event_key_through_trait_object_uses_runtime_type() {
        let ping = Ping { sequence: 7 };
        let erased: &dyn Event = &ping;

        assert_eq!(erased.event_key(), EventKey::of::<Ping>());
        assert!(erased.type_name().ends_with("Ping"));
        assert_eq!(erased.as_any().downcast_ref::<Ping>(), Some(&ping));
    }

    #[test]
    fn test_event_key_hashing_ignores_name() {
        let mut keys = HashSet::new();
        keys.insert(EventKey::of::<Ping>());
        keys.insert(Ping { sequence: 2 }.event_key());
        keys.insert(EventKey::of::<Pong>());

        assert_eq!(keys.len(), 2);
    }

    #[test]
    fn test_event_key_display() {
        let key = EventKey::of::<Pong>();
        assert!(key.to_string().ends_with("Pong"));
        assert!(format!("{:?}", key).starts_with("EventKey("));
    }
}
