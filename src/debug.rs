use std::{collections::VecDeque, fmt};

use crate::{NodeId, WavlTree};

impl<T: fmt::Display> WavlTree<T> {
    /// Writes the shape of the tree as a Graphviz digraph, one row per depth.
    ///
    /// Nodes are labelled `element:rank`; missing children are drawn as points.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let root = match self.root {
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
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let node = match item {
                    Item::Node(node) => node,
                    Item::Missing(id) => {
                        write!(w, "\"{name}-missing{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let links = self.links(node);
                let element = self.element(node);
                write!(
                    w,
                    "\"{name}-{node}\" [label=\"{element}:{}\"]; ",
                    links.rank()
                )?;

                for child in [links.left(), links.right()] {
                    match child {
                        Some(child) => {
                            queue.push_back(Item::Node(child));
                            writeln!(edges, "\"{name}-{node}\" -> \"{name}-{child}\";")?;
                        }
                        None => {
                            queue.push_back(Item::Missing(missing));
                            writeln!(edges, "\"{name}-{node}\" -> \"{name}-missing{missing}\";")?;
                            missing += 1;
                        }
                    }
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}
