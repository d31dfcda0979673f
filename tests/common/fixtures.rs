#![allow(dead_code)]

use example_filter::{EntityRef, Group, GroupDecl, Metadata, World};

pub struct Bar;
pub struct Foo;

pub fn bar() -> EntityRef {
    EntityRef::of::<Bar>()
}

pub fn foo() -> EntityRef {
    EntityRef::of::<Foo>()
}

pub fn declare(decl: GroupDecl) -> Group {
    Group::declare(decl).expect("valid declaration")
}

/// Three groups describing `Bar` with differing metadata, then a `Foo` group
/// whose cases carry their own `awesome` flags.
pub fn inclusion_groups() -> Vec<Group> {
    vec![
        declare(
            GroupDecl::describing(bar(), "find group-1")
                .meta("foo", 1)
                .meta("color", "blue")
                .meta("feature", "reporting"),
        ),
        declare(
            GroupDecl::describing(bar(), "find group-2")
                .meta("pending", true)
                .meta("feature", "reporting"),
        ),
        declare(
            GroupDecl::describing(bar(), "find group-3")
                .meta("array", [1, 2, 3, 4])
                .meta("color", "blue"),
        ),
        declare(
            GroupDecl::describing(foo(), "find these examples")
                .example("I have no options")
                .example_with("this is awesome", Metadata::new().with("awesome", true))
                .example_with("this is too", Metadata::new().with("awesome", true))
                .example_with("not so awesome", Metadata::new().with("awesome", false))
                .example("I also have no options"),
        ),
    ]
}

/// A `Bar` group of three red cases, the last one not awesome.
pub fn awesome_world() -> World {
    let mut world = World::new();
    world
        .register(
            GroupDecl::describing(bar(), "find these examples")
                .example_with(
                    "I have no options",
                    Metadata::new().with("color", "red").with("awesome", true),
                )
                .example_with(
                    "I also have no options",
                    Metadata::new().with("color", "red").with("awesome", true),
                )
                .example_with(
                    "not so awesome",
                    Metadata::new().with("color", "red").with("awesome", false),
                ),
        )
        .expect("valid declaration");
    world
}
