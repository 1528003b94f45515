#![no_main]

use arbitrary::Arbitrary;
use graphlens_core::{FieldPath, impl_structural, path_get, with_props};
use libfuzzer_sys::fuzz_target;

#[derive(Clone, Debug, PartialEq)]
struct Leaf {
    text: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Node {
    leaf: Leaf,
    count: u32,
}

#[derive(Clone, Debug, PartialEq)]
struct Root {
    node: Node,
    label: String,
}

impl_structural! {
    Leaf {
        leaves { text: String }
        nodes {}
    }
}

impl_structural! {
    Node {
        leaves { count: u32 }
        nodes { leaf: Leaf }
    }
}

impl_structural! {
    Root {
        leaves { label: String }
        nodes { node: Node }
    }
}

#[derive(Arbitrary, Debug)]
struct Input {
    path: String,
    value: String,
}

// Arbitrary paths against a fixed tree: resolution either fails with a
// PathError or produces a tree that satisfies the lens laws. No panics.
fuzz_target!(|input: Input| {
    let root = Root {
        node: Node {
            leaf: Leaf {
                text: "seed".to_owned(),
            },
            count: 3,
        },
        label: "root".to_owned(),
    };

    let Ok(path) = FieldPath::parse(&input.path) else {
        return;
    };
    if let Ok(updated) = with_props(&root, &path, input.value.clone()) {
        let read: String = path_get(&updated, &path).expect("updated path reads back");
        assert_eq!(read, input.value);
    }
});
