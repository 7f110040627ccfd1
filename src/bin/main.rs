use treap_bimap::{BiMap, Left, Right};

fn main() {
    let mut map: BiMap<u32, char> = BiMap::with_seed(1);

    for (left, right) in [(2, 'k'), (0, 'x'), (3, 'a'), (4, 'q'), (5, 'c'), (1, 'm'), (6, 'b')] {
        map.insert(left, right);
        map.assert_invariants();
        println!("{:?}", map.iter_right().map(|(r, _)| *r).collect::<Vec<_>>());
    }

    // Duplicates on either side are rejected.
    assert!(map.insert(0, 'z').is_end());
    assert!(map.insert(9, 'a').is_end());

    let first = map.begin_left();
    assert_eq!(first.get(), Some(&0));
    assert_eq!(first.flip().get(), Some(&'x'));

    assert!(map.erase_right(&'x'));
    map.assert_invariants();
    println!("{map:?}");

    let mut graph = String::new();
    if map.dotgraph::<Left, _>("left", &mut graph).is_ok()
        && map.dotgraph::<Right, _>("right", &mut graph).is_ok()
    {
        println!("{graph}");
    }
}
