//! `example_filter` decides which declared example groups and cases run.
//!
//! Groups carry metadata that their cases inherit; cases may add or override
//! keys. A [`World`] holds the registered groups plus an inclusion and an
//! exclusion [`FilterCriteria`], and [`World::select_run_set`] produces the
//! ordered [`RunSet`] handed to whatever executes the examples.
//!
//! ```
//! use example_filter::{EntityRef, FilterCriteria, GroupDecl, Metadata, World};
//!
//! struct Parser;
//!
//! let mut world = World::new();
//! let id = world
//!     .register(
//!         GroupDecl::describing(EntityRef::of::<Parser>(), "parsing")
//!             .meta("color", "red")
//!             .example("reads numbers")
//!             .example_with("talks to the network", Metadata::new().with("network", true)),
//!     )
//!     .unwrap();
//!
//! world.set_exclusion_filter(FilterCriteria::new().with("network", true));
//! let run_set = world.select_run_set();
//! assert_eq!(run_set.examples_to_run(id).unwrap().len(), 1);
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod format;
pub mod logging;
pub mod matcher;
pub mod model;
pub mod validation;
pub mod world;

pub use config::FilterConfig;
pub use error::{ErrorCode, Result, SelectError, ValidationError};
pub use filter::{
    Expected, FilterCriteria, GROUP_LINK_KEY, GroupCriteria, Pattern, Predicate, ValuePredicate,
    evaluate,
};
pub use matcher::{Filterable, first_mismatch, matches};
pub use model::{Case, CaseDecl, CaseId, EntityRef, Group, GroupDecl, GroupId, Metadata, Value};
pub use world::{
    RunSet, SelectedGroup, Selection, SkipReason, SkippedCase, World, apply_exclusion_filters,
    apply_inclusion_filters,
};
