//! The injection decision and patch engine.
//!
//! Given a pod and a [`Catalog`] of injectable resources, the engine decides
//! what to inject, resolves per-pod overrides from annotations, mutates a
//! copy of the pod and emits a JSON patch against the decoded pod.
//!
//! ```text
//! raw pod ─► decode ─► resolve directive ─► materialize ─► mutate ─► diff
//!                         │                     │
//!                         └─ skip (allow)       └─ missing resource (reject)
//! ```

mod catalog;
mod directive;
mod error;
mod ext;
mod injector;
mod matcher;
mod materializer;
mod patch;
mod quantity;

pub use self::{
    catalog::{Catalog, CatalogDocument, CatalogError, EnvironmentBinding, InjectorRule},
    directive::{InjectionDirective, SkipReason, resolve},
    error::{Error, ResourceKind},
    ext::{Phase, PodExt, ResourceOverride, parse_name_list},
    injector::{Decision, Injector, Outcome},
    matcher::{MatchedResources, match_rules},
    materializer::{Materialized, Materializer, OverrideOutcome, RejectedOverride},
    patch::{Injection, InjectionPlan, emit_patch},
    quantity::{QuantityError, parse_quantity},
};
