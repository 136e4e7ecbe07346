use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Handle returned by [`Subscriptions::subscribe`]; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubscriptionToken(u64);

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

pub type Handler<A> = Box<dyn FnMut(&A) -> anyhow::Result<()>>;

/// Token-keyed handler registry.
///
/// Handlers run in subscription order over the set registered when dispatch
/// began. A failing handler is logged and the rest still run.
pub struct Subscriptions<A> {
    handlers: BTreeMap<SubscriptionToken, Handler<A>>,
    next: u64,
}

impl<A> Default for Subscriptions<A> {
    fn default() -> Self {
        Self {
            handlers: BTreeMap::new(),
            next: 0,
        }
    }
}

impl<A> Subscriptions<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, handler: Handler<A>) -> SubscriptionToken {
        self.next += 1;
        let token = SubscriptionToken(self.next);
        self.handlers.insert(token, handler);
        token
    }

    /// Returns whether the token was registered. Tokens are never reused.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.handlers.remove(&token).is_some()
    }

    /// Runs every handler with `event`. Returns the number of failures.
    pub fn dispatch(&mut self, event: &A) -> usize {
        let snapshot: Vec<SubscriptionToken> = self.handlers.keys().copied().collect();
        let mut failed = 0;
        for token in snapshot {
            let Some(handler) = self.handlers.get_mut(&token) else {
                continue;
            };
            if let Err(err) = handler(event) {
                failed += 1;
                tracing::error!(%token, error = %err, "Subscriber failed");
            }
        }
        failed
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_dispatch_in_subscription_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut subs: Subscriptions<u32> = Subscriptions::new();
        for tag in ["a", "b"] {
            let seen = Rc::clone(&seen);
            subs.subscribe(Box::new(move |v: &u32| {
                seen.borrow_mut().push(format!("{tag}{v}"));
                Ok(())
            }));
        }
        subs.dispatch(&1);
        assert_eq!(*seen.borrow(), vec!["a1", "b1"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut subs: Subscriptions<()> = Subscriptions::new();
        let c = Rc::clone(&count);
        let token = subs.subscribe(Box::new(move |_: &()| {
            *c.borrow_mut() += 1;
            Ok(())
        }));
        subs.dispatch(&());
        assert!(subs.unsubscribe(token));
        assert!(!subs.unsubscribe(token));
        subs.dispatch(&());
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_failure_is_isolated() {
        let count = Rc::new(RefCell::new(0));
        let mut subs: Subscriptions<()> = Subscriptions::new();
        subs.subscribe(Box::new(|_: &()| -> anyhow::Result<()> {
            anyhow::bail!("nope")
        }));
        let c = Rc::clone(&count);
        subs.subscribe(Box::new(move |_: &()| {
            *c.borrow_mut() += 1;
            Ok(())
        }));
        assert_eq!(subs.dispatch(&()), 1);
        assert_eq!(*count.borrow(), 1);
    }
}
