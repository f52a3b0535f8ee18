//! # Declaration Macros
//!
//! [`declare_handlers!`] lets a listener list its handler methods the way it
//! would read in a method table, instead of spelling out [`HandlerSet`]
//! builder calls.
//!
//! [`HandlerSet`]: crate::HandlerSet

/// Declares handler methods of a listener.
///
/// Each entry names a method on `Self` and its parameter types:
///
/// - `on_ping(Ping)`: handler for `Ping` at `Priority::Normal`
/// - `Priority::High => on_ping(Ping)`: handler with an explicit priority
/// - `on_pair(Ping, Pong)`: a handler-marked method with the wrong arity,
///   recorded so that discovery can skip it with a diagnostic
/// - `@legacy on_ping(Ping)`: the deprecated mechanism; registering the
///   listener fails
///
/// Single-parameter methods must have the signature
/// `fn(&self, &Event) -> HandlerResult`.
///
/// # Examples
///
/// ```rust
/// use eventlib::{declare_handlers, HandlerResult, HandlerSet, Listener, Priority};
///
/// #[derive(Debug)]
/// struct Ping;
/// #[derive(Debug)]
/// struct Shutdown;
///
/// struct Monitor;
///
/// impl Monitor {
///     fn on_ping(&self, _event: &Ping) -> HandlerResult { Ok(()) }
///     fn on_shutdown(&self, _event: &Shutdown) -> HandlerResult { Ok(()) }
/// }
///
/// impl Listener for Monitor {
///     fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
///         declare_handlers!(handlers;
///             on_ping(Ping),
///             Priority::Highest => on_shutdown(Shutdown),
///         );
///     }
/// }
/// ```
#[macro_export]
macro_rules! declare_handlers {
    ($set:expr; $(,)?) => {};

    ($set:expr; @legacy $method:ident($param:ty) $(, $($rest:tt)*)?) => {
        $set.legacy::<$param, _>(stringify!($method), |listener: &Self, event: &$param| {
            listener.$method(event)
        });
        $crate::declare_handlers!($set; $($($rest)*)?);
    };

    ($set:expr; $method:ident($param:ty) $(, $($rest:tt)*)?) => {
        $crate::declare_handlers!($set; $crate::Priority::Normal => $method($param) $(, $($rest)*)?);
    };

    ($set:expr; $method:ident($($param:ty),*) $(, $($rest:tt)*)?) => {
        $crate::declare_handlers!($set; $crate::Priority::Normal => $method($($param),*) $(, $($rest)*)?);
    };

    ($set:expr; $priority:expr => $method:ident($param:ty) $(, $($rest:tt)*)?) => {
        $set.on::<$param, _>(stringify!($method), $priority, |listener: &Self, event: &$param| {
            listener.$method(event)
        });
        $crate::declare_handlers!($set; $($($rest)*)?);
    };

    ($set:expr; $priority:expr => $method:ident($($param:ty),*) $(, $($rest:tt)*)?) => {
        $set.declare_malformed(
            stringify!($method),
            $priority,
            &[$($crate::ParamType::of::<$param>()),*],
        );
        $crate::declare_handlers!($set; $($($rest)*)?);
    };
}

#[cfg(test)]
mod tests {
    use crate::{HandlerMarker, HandlerResult, HandlerSet, Listener, Priority};

    #[derive(Debug)]
    struct Ping;

    #[derive(Debug)]
    struct Pong;

    struct Declared;

    impl Declared {
        fn on_ping(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }

        fn on_pong(&self, _event: &Pong) -> HandlerResult {
            Ok(())
        }

        fn on_legacy(&self, _event: &Ping) -> HandlerResult {
            Ok(())
        }
    }

    impl Listener for Declared {
        fn declare_handlers(&self, handlers: &mut HandlerSet<Self>) {
            declare_handlers!(handlers;
                on_ping(Ping),
                Priority::Lowest => on_pong(Pong),
                on_pair(Ping, Pong),
                Priority::High => on_nothing(),
                @legacy on_legacy(Ping),
            );
        }
    }

    #[test]
    fn test_macro_declares_every_form() {
        let mut set = HandlerSet::new();
        Declared.declare_handlers(&mut set);

        let summary: Vec<_> = set
            .descriptors()
            .iter()
            .map(|d| (d.name(), d.marker(), d.arity()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("on_ping", HandlerMarker::Subscribe(Priority::Normal), 1),
                ("on_pong", HandlerMarker::Subscribe(Priority::Lowest), 1),
                ("on_pair", HandlerMarker::Subscribe(Priority::Normal), 2),
                ("on_nothing", HandlerMarker::Subscribe(Priority::High), 0),
                ("on_legacy", HandlerMarker::Legacy, 1),
            ]
        );
    }
}
