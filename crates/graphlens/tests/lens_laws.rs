//! Lens-law properties over a four-level immutable tree.

use std::rc::Rc;

use graphlens::prelude::*;
use proptest::prelude::*;

#[derive(Clone, Debug, PartialEq)]
struct Leaf {
    text: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Branch {
    leaf: Leaf,
    marker: Rc<u8>,
}

#[derive(Clone, Debug, PartialEq)]
struct Trunk {
    branch: Branch,
    label: String,
}

#[derive(Clone, Debug, PartialEq)]
struct Tree {
    trunk: Trunk,
    age: u32,
}

impl_structural! {
    Leaf {
        leaves { text: String }
        nodes {}
    }
}

impl_structural! {
    Branch {
        leaves { marker: Rc<u8> }
        nodes { leaf: Leaf }
    }
}

impl_structural! {
    Trunk {
        leaves { label: String }
        nodes { branch: Branch }
    }
}

impl_structural! {
    Tree {
        leaves { age: u32 }
        nodes { trunk: Trunk }
    }
}

fn tree(text: &str) -> Tree {
    Tree {
        trunk: Trunk {
            branch: Branch {
                leaf: Leaf {
                    text: text.to_owned(),
                },
                marker: Rc::new(1),
            },
            label: "trunk".to_owned(),
        },
        age: 12,
    }
}

fn depth_paths() -> [&'static str; 4] {
    [
        "age",
        "trunk.label",
        "trunk.branch.marker",
        "trunk.branch.leaf.text",
    ]
}

#[test]
fn every_depth_satisfies_set_of_current_is_identity() {
    let t = tree("seed");
    for path in depth_paths() {
        let path = FieldPath::parse(path).unwrap();
        // Read whatever is there and write it straight back.
        let rebuilt = match path.depth() {
            1 => with_props(&t, &path, path_get::<_, u32>(&t, &path).unwrap()),
            2 => with_props(&t, &path, path_get::<_, String>(&t, &path).unwrap()),
            3 => with_props(&t, &path, path_get::<_, Rc<u8>>(&t, &path).unwrap()),
            _ => with_props(&t, &path, path_get::<_, String>(&t, &path).unwrap()),
        }
        .unwrap();
        assert_eq!(t, rebuilt, "set(get) must be identity for {path}");
    }
}

#[test]
fn structural_sharing_holds_off_the_updated_path() {
    let t = tree("seed");
    let path = FieldPath::parse("trunk.branch.leaf.text").unwrap();
    let t2 = with_props(&t, &path, "grown".to_owned()).unwrap();

    assert_eq!(t2.trunk.branch.leaf.text, "grown");
    assert!(
        Rc::ptr_eq(&t.trunk.branch.marker, &t2.trunk.branch.marker),
        "marker is off the path and must stay shared"
    );
    assert_eq!(t.trunk.branch.leaf.text, "seed");
}

proptest! {
    #[test]
    fn get_after_set_returns_the_written_value(seed in ".*", value in ".*") {
        let t = tree(&seed);
        let path = FieldPath::parse("trunk.branch.leaf.text").unwrap();
        let t2 = with_props(&t, &path, value.clone()).unwrap();
        let read: String = path_get(&t2, &path).unwrap();
        prop_assert_eq!(read, value);
    }

    #[test]
    fn typed_chain_agrees_with_dynamic_path(seed in ".*", value in ".*") {
        let t = tree(&seed);
        let typed = field_lens!(Tree, trunk)
            .then(field_lens!(Trunk, branch))
            .then(field_lens!(Branch, leaf))
            .then(field_lens!(Leaf, text));
        let path = FieldPath::parse("trunk.branch.leaf.text").unwrap();
        let dynamic: Lens<Tree, String> = Lens::from_path(&t, &path).unwrap();

        prop_assert_eq!(typed.get(&t), dynamic.get(&t));
        prop_assert_eq!(
            typed.set(&t, value.clone()),
            dynamic.set(&t, value)
        );
    }

    #[test]
    fn set_at_depth_two_only_touches_its_spine(label in ".*") {
        let t = tree("seed");
        let path = FieldPath::parse("trunk.label").unwrap();
        let t2 = with_props(&t, &path, label.clone()).unwrap();
        prop_assert_eq!(t2.trunk.label, label);
        prop_assert_eq!(&t2.trunk.branch, &t.trunk.branch);
        prop_assert_eq!(t2.age, t.age);
    }
}
