use std::{collections::VecDeque, fmt};

use crate::{record::Records, BiMap, NodeId, Side, Threaded, SENTINEL};

impl<L, R, CL, CR> BiMap<L, R, CL, CR> {
    /// Writes the tree of side `S` as a Graphviz digraph named `name`.
    ///
    /// Nodes are labelled `key:rank`; missing children are drawn as points.
    pub fn dotgraph<S, W>(&self, name: &str, mut w: W) -> fmt::Result
    where
        S: Side,
        S::Key<L, R>: fmt::Display,
        W: fmt::Write,
    {
        let records = &self.records;
        let root = match <Records<L, R> as Threaded<S>>::left(records, SENTINEL) {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item {
            Node(NodeId),
            Missing(u32),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{"
        )?;

        let mut missing = 0;
        let mut links = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let node = match queue.pop_front() {
                    Some(Item::Node(node)) => node,
                    Some(Item::Missing(id)) => {
                        write!(w, "\"graph{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                    None => break,
                };

                let key = S::key(records.pair(node));
                let rank = records.rank_of(node);
                write!(w, "\"graph{name}-{key}\" [label=\"{key}:{rank}\"]; ")?;

                for child in [
                    <Records<L, R> as Threaded<S>>::left(records, node),
                    <Records<L, R> as Threaded<S>>::right(records, node),
                ] {
                    if let Some(child) = child {
                        let child_key = S::key(records.pair(child));

                        queue.push_back(Item::Node(child));
                        writeln!(
                            links,
                            "\"graph{name}-{key}\" -> \"graph{name}-{child_key}\";"
                        )?;
                    } else {
                        queue.push_back(Item::Missing(missing));
                        writeln!(
                            links,
                            "\"graph{name}-{key}\" -> \"graph{name}-missing{missing}\";"
                        )?;
                        missing += 1;
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&links)?;

        w.write_str(" }\n}")
    }
}
