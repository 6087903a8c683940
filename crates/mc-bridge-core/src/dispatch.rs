//! Packet translator registry and dispatch.
//!
//! Handlers are registered per packet name. Before the first dispatch the
//! registry is frozen into a [`Dispatcher`]: handlers are sorted by
//! [`Priority`], then topologically by their `before`/`after` tags within a
//! tier, ties broken by registration order.

use std::collections::{BTreeSet, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::error::BridgeError;

/// What a handler did with the packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Stop: later handlers do not see the packet.
    Handled,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    /// Every handler returned [`HandlerState::Continue`].
    Continued,
    /// No handler is registered for the packet.
    PassThrough,
}

/// Coarse ordering tier; tiers always run before lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    First,
    Early,
    #[default]
    Normal,
    Late,
    Last,
}

impl Priority {
    pub fn weight(self) -> i32 {
        match self {
            Self::First => 100,
            Self::Early => 50,
            Self::Normal => 0,
            Self::Late => -50,
            Self::Last => -100,
        }
    }
}

/// Anything a dispatcher can run handlers against.
pub trait DispatchTarget {
    /// Used in log lines.
    fn session_id(&self) -> u64;
}

pub type Handler<C, P> = Box<dyn Fn(&mut C, &P) -> Result<HandlerState, BridgeError> + Send + Sync>;

/// Placement of one handler.
#[derive(Debug, Clone, Default)]
pub struct HandlerOptions {
    pub tag: Option<&'static str>,
    pub priority: Priority,
    /// Tags this handler must run before, within its tier.
    pub before: Vec<&'static str>,
    /// Tags this handler must run after, within its tier.
    pub after: Vec<&'static str>,
}

impl HandlerOptions {
    pub fn tagged(tag: &'static str) -> Self {
        Self {
            tag: Some(tag),
            ..Default::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn before(mut self, tag: &'static str) -> Self {
        self.before.push(tag);
        self
    }

    pub fn after(mut self, tag: &'static str) -> Self {
        self.after.push(tag);
        self
    }
}

struct Registration<C, P> {
    options: HandlerOptions,
    handler: Handler<C, P>,
}

impl<C, P> Registration<C, P> {
    fn label(&self) -> &'static str {
        self.options.tag.unwrap_or("<untagged>")
    }
}

/// Mutable registration table; see [`TranslatorRegistry::build`].
pub struct TranslatorRegistry<C, P> {
    handlers: HashMap<&'static str, Vec<Registration<C, P>>>,
}

impl<C, P> Default for TranslatorRegistry<C, P> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }
}

impl<C: DispatchTarget, P> TranslatorRegistry<C, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, packet: &'static str, options: HandlerOptions, handler: F)
    where
        F: Fn(&mut C, &P) -> Result<HandlerState, BridgeError> + Send + Sync + 'static,
    {
        self.handlers.entry(packet).or_default().push(Registration {
            options,
            handler: Box::new(handler),
        });
    }

    pub fn handler_count(&self, packet: &str) -> usize {
        self.handlers.get(packet).map_or(0, Vec::len)
    }

    /// Resolves the execution order of every packet's handlers.
    pub fn build(self) -> Result<Dispatcher<C, P>, BridgeError> {
        let mut ordered = HashMap::with_capacity(self.handlers.len());
        for (packet, registrations) in self.handlers {
            let order = resolve_order(packet, &registrations)?;
            let mut slots: Vec<Option<Registration<C, P>>> =
                registrations.into_iter().map(Some).collect();
            let handlers = order
                .into_iter()
                .filter_map(|i| slots[i].take())
                .collect::<Vec<_>>();
            ordered.insert(packet, handlers);
        }
        Ok(Dispatcher { handlers: ordered })
    }
}

/// Indices into `registrations` in execution order.
fn resolve_order<C, P>(
    packet: &str,
    registrations: &[Registration<C, P>],
) -> Result<Vec<usize>, BridgeError> {
    let mut tiers: Vec<Priority> = registrations.iter().map(|r| r.options.priority).collect();
    tiers.sort_by_key(|p| -p.weight());
    tiers.dedup();

    let mut order = Vec::with_capacity(registrations.len());
    for tier in tiers {
        let members: Vec<usize> = (0..registrations.len())
            .filter(|&i| registrations[i].options.priority == tier)
            .collect();
        order.extend(sort_tier(packet, registrations, &members)?);
    }
    Ok(order)
}

/// Kahn's algorithm over one tier, always taking the earliest registered
/// ready handler so the result is deterministic.
fn sort_tier<C, P>(
    packet: &str,
    registrations: &[Registration<C, P>],
    members: &[usize],
) -> Result<Vec<usize>, BridgeError> {
    let position = |tag: &str| -> Vec<usize> {
        members
            .iter()
            .copied()
            .filter(|&i| registrations[i].options.tag == Some(tag))
            .collect()
    };

    let mut edges: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut indegree: HashMap<usize, usize> = members.iter().map(|&i| (i, 0)).collect();
    let mut add_edge = |from: usize, to: usize| {
        let targets = edges.entry(from).or_default();
        if !targets.contains(&to) {
            targets.push(to);
            *indegree.entry(to).or_default() += 1;
        }
    };

    for &i in members {
        let options = &registrations[i].options;
        let constraints = options
            .before
            .iter()
            .map(|t| (*t, true))
            .chain(options.after.iter().map(|t| (*t, false)));
        for (tag, before) in constraints {
            let targets = position(tag);
            if targets.is_empty() {
                let elsewhere = registrations.iter().any(|r| r.options.tag == Some(tag));
                if elsewhere {
                    warn!(
                        packet,
                        handler = registrations[i].label(),
                        tag,
                        "ordering constraint crosses priority tiers, ignored"
                    );
                } else {
                    debug!(packet, handler = registrations[i].label(), tag, "ordering tag not registered");
                }
                continue;
            }
            for target in targets.into_iter().filter(|&t| t != i) {
                if before {
                    add_edge(i, target);
                } else {
                    add_edge(target, i);
                }
            }
        }
    }

    let mut ready: BTreeSet<usize> = members
        .iter()
        .copied()
        .filter(|i| indegree[i] == 0)
        .collect();
    let mut sorted = Vec::with_capacity(members.len());
    while let Some(next) = ready.pop_first() {
        sorted.push(next);
        for &target in edges.get(&next).map(Vec::as_slice).unwrap_or(&[]) {
            let degree = indegree.entry(target).or_default();
            *degree -= 1;
            if *degree == 0 {
                ready.insert(target);
            }
        }
    }

    if sorted.len() != members.len() {
        let stuck = members
            .iter()
            .filter(|i| !sorted.contains(i))
            .map(|&i| registrations[i].label())
            .collect::<Vec<_>>()
            .join(", ");
        return Err(BridgeError::DispatchCycle(format!("{packet}: {stuck}")));
    }
    Ok(sorted)
}

/// Frozen handler table.
pub struct Dispatcher<C, P> {
    handlers: HashMap<&'static str, Vec<Registration<C, P>>>,
}

impl<C: DispatchTarget, P> Dispatcher<C, P> {
    /// Tags in execution order, untagged handlers as `<untagged>`.
    pub fn order(&self, packet: &str) -> Vec<&'static str> {
        self.handlers
            .get(packet)
            .map(|hs| hs.iter().map(Registration::label).collect())
            .unwrap_or_default()
    }

    pub fn has_handlers(&self, packet: &str) -> bool {
        self.handlers.get(packet).is_some_and(|hs| !hs.is_empty())
    }

    /// Runs every handler for `packet` until one claims it.
    ///
    /// A failing handler is logged and skipped. Fatal errors and panics end
    /// dispatch and are returned so the caller can disconnect the session.
    pub fn dispatch(&self, ctx: &mut C, packet: &'static str, value: &P) -> Result<DispatchOutcome, BridgeError> {
        let Some(handlers) = self.handlers.get(packet).filter(|hs| !hs.is_empty()) else {
            return Ok(DispatchOutcome::PassThrough);
        };

        for registration in handlers {
            let result = catch_unwind(AssertUnwindSafe(|| (registration.handler)(ctx, value)));
            match result {
                Ok(Ok(HandlerState::Handled)) => return Ok(DispatchOutcome::Handled),
                Ok(Ok(HandlerState::Continue)) => {}
                Ok(Err(e)) if e.is_fatal() => return Err(e),
                Ok(Err(e)) => {
                    warn!(
                        session = ctx.session_id(),
                        packet,
                        handler = registration.label(),
                        error = %e,
                        "translator failed"
                    );
                }
                Err(_) => {
                    return Err(BridgeError::CorruptState(format!(
                        "translator {} panicked on {packet}",
                        registration.label()
                    )));
                }
            }
        }
        Ok(DispatchOutcome::Continued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Trace {
        seen: Vec<&'static str>,
    }

    impl DispatchTarget for Trace {
        fn session_id(&self) -> u64 {
            7
        }
    }

    fn recorder(tag: &'static str) -> impl Fn(&mut Trace, &u32) -> Result<HandlerState, BridgeError> {
        move |t, _| {
            t.seen.push(tag);
            Ok(HandlerState::Continue)
        }
    }

    fn run(registry: TranslatorRegistry<Trace, u32>) -> Vec<&'static str> {
        let dispatcher = registry.build().unwrap();
        let mut trace = Trace::default();
        dispatcher.dispatch(&mut trace, "Packet", &0).unwrap();
        trace.seen
    }

    #[test]
    fn registration_order_within_a_tier() {
        let mut registry = TranslatorRegistry::new();
        for tag in ["a", "b", "c"] {
            registry.register("Packet", HandlerOptions::tagged(tag), recorder(tag));
        }
        assert_eq!(run(registry), vec!["a", "b", "c"]);
    }

    #[test]
    fn tiers_sort_first() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Packet", HandlerOptions::tagged("late").with_priority(Priority::Late), recorder("late"));
        registry.register("Packet", HandlerOptions::tagged("normal"), recorder("normal"));
        registry.register("Packet", HandlerOptions::tagged("last").with_priority(Priority::Last), recorder("last"));
        registry.register("Packet", HandlerOptions::tagged("early").with_priority(Priority::Early), recorder("early"));
        registry.register("Packet", HandlerOptions::tagged("first").with_priority(Priority::First), recorder("first"));
        assert_eq!(run(registry), vec!["first", "early", "normal", "late", "last"]);
    }

    #[test]
    fn before_and_after_tags() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Packet", HandlerOptions::tagged("x"), recorder("x"));
        registry.register("Packet", HandlerOptions::tagged("y").before("x"), recorder("y"));
        registry.register("Packet", HandlerOptions::tagged("z").after("w"), recorder("z"));
        registry.register("Packet", HandlerOptions::tagged("w").after("x"), recorder("w"));
        let order = run(registry);
        let index = |t| order.iter().position(|s| *s == t).unwrap();
        assert!(index("y") < index("x"));
        assert!(index("x") < index("w"));
        assert!(index("w") < index("z"));
        assert_eq!(order, vec!["y", "x", "w", "z"]);
    }

    #[test]
    fn tags_never_override_tiers() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Packet", HandlerOptions::tagged("early").with_priority(Priority::Early), recorder("early"));
        // asks to run before a handler in a higher tier: ignored
        registry.register("Packet", HandlerOptions::tagged("late").with_priority(Priority::Late).before("early"), recorder("late"));
        registry.register("Packet", HandlerOptions::tagged("normal").after("late"), recorder("normal"));
        assert_eq!(run(registry), vec!["early", "normal", "late"]);
    }

    #[test]
    fn counter_property_over_many_handlers() {
        let mut registry = TranslatorRegistry::new();
        let tags = ["h0", "h1", "h2", "h3", "h4", "h5", "h6", "h7"];
        let tiers = [Priority::Late, Priority::Early, Priority::Normal];
        for (i, tag) in tags.iter().enumerate() {
            let mut options = HandlerOptions::tagged(tag).with_priority(tiers[i % 3]);
            if i >= 3 {
                options = options.before(tags[i - 3]);
            }
            registry.register("Packet", options, recorder(tag));
        }
        let order = run(registry);
        let tier_of = |t: &str| tiers[tags.iter().position(|s| *s == t).unwrap() % 3].weight();
        for pair in order.windows(2) {
            assert!(tier_of(pair[0]) >= tier_of(pair[1]), "{order:?}");
        }
        for i in 3..tags.len() {
            let a = order.iter().position(|s| *s == tags[i]).unwrap();
            let b = order.iter().position(|s| *s == tags[i - 3]).unwrap();
            assert!(a < b, "{} should precede {}: {order:?}", tags[i], tags[i - 3]);
        }
    }

    #[test]
    fn cycles_are_rejected() {
        let mut registry = TranslatorRegistry::<Trace, u32>::new();
        registry.register("Packet", HandlerOptions::tagged("a").before("b"), recorder("a"));
        registry.register("Packet", HandlerOptions::tagged("b").before("a"), recorder("b"));
        assert!(matches!(registry.build(), Err(BridgeError::DispatchCycle(_))));
    }

    #[test]
    fn handled_stops_dispatch() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Packet", HandlerOptions::tagged("claim"), |t: &mut Trace, _: &u32| {
            t.seen.push("claim");
            Ok(HandlerState::Handled)
        });
        registry.register("Packet", HandlerOptions::tagged("after"), recorder("after"));
        let dispatcher = registry.build().unwrap();
        let mut trace = Trace::default();
        assert_eq!(dispatcher.dispatch(&mut trace, "Packet", &0).unwrap(), DispatchOutcome::Handled);
        assert_eq!(trace.seen, vec!["claim"]);
    }

    #[test]
    fn unregistered_packets_pass_through() {
        let dispatcher = TranslatorRegistry::<Trace, u32>::new().build().unwrap();
        let mut trace = Trace::default();
        assert_eq!(dispatcher.dispatch(&mut trace, "Other", &0).unwrap(), DispatchOutcome::PassThrough);
    }

    #[test]
    fn recoverable_errors_skip_only_that_handler() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Packet", HandlerOptions::tagged("broken"), |_: &mut Trace, _: &u32| {
            Err(BridgeError::UnknownEntity(5))
        });
        registry.register("Packet", HandlerOptions::tagged("next"), recorder("next"));
        assert_eq!(run(registry), vec!["next"]);
    }

    #[test]
    fn fatal_errors_and_panics_abort() {
        let mut registry = TranslatorRegistry::new();
        registry.register("Fatal", HandlerOptions::default(), |_: &mut Trace, _: &u32| {
            Err(BridgeError::CorruptState("inventory desync".into()))
        });
        registry.register("Panic", HandlerOptions::tagged("boom"), |_: &mut Trace, value: &u32| {
            if *value == 0 {
                panic!("injected");
            }
            Ok(HandlerState::Continue)
        });
        registry.register("Panic", HandlerOptions::tagged("never"), recorder("never"));
        let dispatcher = registry.build().unwrap();
        let mut trace = Trace::default();
        assert!(matches!(
            dispatcher.dispatch(&mut trace, "Fatal", &0),
            Err(BridgeError::CorruptState(_))
        ));
        assert!(matches!(
            dispatcher.dispatch(&mut trace, "Panic", &0),
            Err(BridgeError::CorruptState(msg)) if msg.contains("boom")
        ));
        assert!(trace.seen.is_empty());
    }
}
