//! Mermaid flowchart export of a compiled graph.

use std::fmt::Write;

use super::conditional::NextEntry;
use super::{CompiledStateGraph, END, START};

fn label(id: &str) -> &str {
    match id {
        START => "__start__([START])",
        END => "__end__([END])",
        other => other,
    }
}

/// Renders the graph as Mermaid `flowchart TD` text.
///
/// Plain edges are solid arrows. Conditional edges with a path map are dotted
/// arrows labelled by routing key; a router without a path map is drawn as a
/// dotted arrow marked `?`.
pub fn generate_mermaid<S>(graph: &CompiledStateGraph<S>) -> String
where
    S: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    let mut out = String::from("flowchart TD\n");
    let _ = writeln!(out, "    {} --> {}", label(START), label(graph.entry()));
    for id in graph.node_ids() {
        match graph.next_entry(id) {
            Some(NextEntry::Unconditional(to)) => {
                let _ = writeln!(out, "    {} --> {}", id, label(to));
            }
            Some(NextEntry::Conditional(router)) => match &router.path_map {
                Some(map) => {
                    let mut routes: Vec<_> = map.iter().collect();
                    routes.sort();
                    for (key, to) in routes {
                        let _ = writeln!(out, "    {} -.->|{}| {}", id, key, label(to));
                    }
                }
                None => {
                    let _ = writeln!(out, "    {} -.->|?| {}", id, label(END));
                }
            },
            None => {
                let _ = writeln!(out, "    {} --> {}", id, label(END));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::graph::{FnNode, Next, StateGraph};

    /// **Scenario**: Linear graph renders START, node, and END arrows.
    #[test]
    fn mermaid_linear_graph() {
        let mut graph = StateGraph::<i32>::new();
        graph.add_node(
            "printer",
            Arc::new(FnNode::new("printer", |n: i32| async move { Ok((n + 1, Next::Continue)) })),
        );
        graph.add_edge(START, "printer");
        graph.add_edge("printer", END);
        let text = generate_mermaid(&graph.compile().unwrap());
        assert!(text.starts_with("flowchart TD\n"));
        assert!(text.contains("__start__([START]) --> printer"), "{}", text);
        assert!(text.contains("printer --> __end__([END])"), "{}", text);
    }
}
