//! Listener selection
//!
//! Decides which listeners receive an event: first the listeners whose
//! patterns match the event name are collected in configuration order,
//! then the dispatch strategy narrows them down.

use crate::listener::Listener;
use crate::matcher::Matcher;
use crate::types::{DispatchStrategy, Event, MultiStrategy};

/// Select the listeners that receive `event`, in configuration order
///
/// Under `DispatchStrategy::Multi` the matched listeners are folded left
/// to right. The first one is always taken; each later one applies its own
/// `MultiStrategy`:
///
/// | strategy  | effect on the selection so far   |
/// |-----------|----------------------------------|
/// | `none`    | append                           |
/// | `replace` | discard it, keep only this one   |
/// | `skip`    | leave it unchanged               |
pub fn select<'a>(
    listeners: &'a [Listener],
    event: &Event,
    strategy: DispatchStrategy,
    matcher: &dyn Matcher,
) -> Vec<&'a Listener> {
    let mut matched = listeners
        .iter()
        .filter(|listener| matcher.is_match(&event.name, listener.patterns()));

    match strategy {
        DispatchStrategy::FirstMatch => matched.next().into_iter().collect(),
        DispatchStrategy::LastMatch => matched.last().into_iter().collect(),
        DispatchStrategy::Multi => {
            let mut selected: Vec<&Listener> = Vec::new();
            for listener in matched {
                if selected.is_empty() {
                    selected.push(listener);
                    continue;
                }
                match listener.multi_strategy() {
                    MultiStrategy::None => selected.push(listener),
                    MultiStrategy::Replace => {
                        selected.clear();
                        selected.push(listener);
                    }
                    MultiStrategy::Skip => {}
                }
            }
            selected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::GlobMatcher;
    use crate::transport::memory::MemoryTransport;

    fn listener(name: &str, pattern: &str, strategy: MultiStrategy) -> Listener {
        Listener::builder(name)
            .pattern(pattern)
            .multi_strategy(strategy)
            .transport(MemoryTransport::default())
            .build()
            .unwrap()
    }

    fn names(selected: &[&Listener]) -> Vec<String> {
        selected.iter().map(|l| l.name().to_string()).collect()
    }

    fn run(listeners: &[Listener], event_name: &str, strategy: DispatchStrategy) -> Vec<String> {
        let event = Event::new(event_name, serde_json::json!({}));
        names(&select(listeners, &event, strategy, &GlobMatcher::new()))
    }

    #[test]
    fn test_no_match_is_empty() {
        let listeners = vec![listener("a", "order.*", MultiStrategy::None)];
        for strategy in [
            DispatchStrategy::FirstMatch,
            DispatchStrategy::LastMatch,
            DispatchStrategy::Multi,
        ] {
            assert!(run(&listeners, "user.signup", strategy).is_empty());
        }
    }

    #[test]
    fn test_first_and_last_match() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "user.*", MultiStrategy::None),
            listener("c", "order.created", MultiStrategy::None),
            listener("d", "**", MultiStrategy::None),
        ];

        assert_eq!(run(&listeners, "order.created", DispatchStrategy::FirstMatch), ["a"]);
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::LastMatch), ["d"]);
        assert_eq!(run(&listeners, "user.signup", DispatchStrategy::FirstMatch), ["b"]);
    }

    #[test]
    fn test_multi_keeps_configuration_order() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "user.*", MultiStrategy::None),
            listener("c", "**", MultiStrategy::None),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["a", "c"]);
    }

    #[test]
    fn test_multi_replace_then_skip() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "order.*", MultiStrategy::Replace),
            listener("c", "order.*", MultiStrategy::Skip),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["b"]);
    }

    #[test]
    fn test_multi_none_then_skip() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "order.*", MultiStrategy::None),
            listener("c", "order.*", MultiStrategy::Skip),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["a", "b"]);
    }

    #[test]
    fn test_multi_leading_replace_is_taken() {
        let listeners = vec![listener("a", "order.*", MultiStrategy::Replace)];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["a"]);
    }

    #[test]
    fn test_multi_leading_skip_is_taken() {
        let listeners = vec![
            listener("a", "user.*", MultiStrategy::None),
            listener("b", "order.*", MultiStrategy::Skip),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["b"]);
    }

    #[test]
    fn test_multi_consecutive_replace_keeps_last() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "order.*", MultiStrategy::Replace),
            listener("c", "order.*", MultiStrategy::Replace),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["c"]);
    }

    #[test]
    fn test_multi_all_pairs() {
        use MultiStrategy::{None as N, Replace as R, Skip as S};

        let cases = [
            (N, N, vec!["a", "b"]),
            (N, R, vec!["b"]),
            (N, S, vec!["a"]),
            (R, N, vec!["a", "b"]),
            (R, R, vec!["b"]),
            (R, S, vec!["a"]),
            (S, N, vec!["a", "b"]),
            (S, R, vec!["b"]),
            (S, S, vec!["a"]),
        ];

        for (first, second, expected) in cases {
            let listeners = vec![
                listener("a", "order.*", first),
                listener("b", "order.*", second),
            ];
            assert_eq!(
                run(&listeners, "order.created", DispatchStrategy::Multi),
                expected,
                "pair ({:?}, {:?})",
                first,
                second
            );
        }
    }

    #[test]
    fn test_unmatched_listeners_do_not_affect_fold() {
        let listeners = vec![
            listener("a", "order.*", MultiStrategy::None),
            listener("b", "user.*", MultiStrategy::Replace),
            listener("c", "order.*", MultiStrategy::None),
        ];
        assert_eq!(run(&listeners, "order.created", DispatchStrategy::Multi), ["a", "c"]);
    }

    #[test]
    fn test_custom_matcher() {
        let listeners = vec![
            listener("a", "ignored", MultiStrategy::None),
            listener("b", "ignored", MultiStrategy::None),
        ];
        let event = Event::new("anything", serde_json::json!({}));
        let everything = |_: &str, _: &[String]| true;

        let selected = select(&listeners, &event, DispatchStrategy::LastMatch, &everything);
        assert_eq!(names(&selected), ["b"]);
    }
}
