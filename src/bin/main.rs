use wavl_index::WavlTree;

fn print_ranks(tree: &WavlTree<u32>) {
    let mut ranks = Vec::with_capacity(tree.len());
    let mut cur = tree.first();

    while let Some(node) = cur {
        ranks.push((*node.element(), node.rank()));
        cur = tree.successor(node);
    }

    println!("{ranks:?}");
}

fn main() {
    let mut tree: WavlTree<u32> = WavlTree::new();

    for key in [8, 5, 11, 3, 7, 10, 12, 2, 4, 6, 9, 1] {
        tree.insert(key);
        tree.assert_invariants();
        print_ranks(&tree);
    }

    assert!(tree.delete(&12));
    tree.assert_invariants();
    print_ranks(&tree);

    let root = tree.root().map(|node| *node.element());
    assert_eq!(root, Some(5));

    let mut graph = String::new();
    tree.dotgraph("demo", &mut graph).expect("formatting into a String cannot fail");
    println!("{graph}");
}
