//! Resolving reference data: cache, then chain, then create.
//!
//! Every kind of reference data follows the same protocol:
//!
//! 1. the in-pass cache of the [`MappingContext`],
//! 2. the reference data chain, by short name or name, ignoring case,
//! 3. otherwise a new thing is added to a clone of the most specific
//!    library, committed, the library refreshed, and the thing re-read by
//!    identifier so the caller holds the post-commit instance.
//!
//! A failed commit is logged and reported as `None`. Callers carry on
//! without the missing piece.

use rustc_hash::FxHashMap;
use tracing::{debug, error, trace};

use crate::base::short_name;
use crate::hub::{
    Category, ClassKind, Iid, MeasurementScale, MeasurementUnit, ParameterType, ReferenceData,
    Thing, Transaction,
};

use super::context::MappingContext;

/// Reference data with a per-pass cache in the context.
pub trait CachedReferenceData: ReferenceData {
    fn cache<'c>(ctx: &'c mut MappingContext<'_>) -> &'c mut FxHashMap<String, Self>;
}

impl CachedReferenceData for Category {
    fn cache<'c>(ctx: &'c mut MappingContext<'_>) -> &'c mut FxHashMap<String, Self> {
        &mut ctx.categories
    }
}

impl CachedReferenceData for ParameterType {
    fn cache<'c>(ctx: &'c mut MappingContext<'_>) -> &'c mut FxHashMap<String, Self> {
        &mut ctx.parameter_types
    }
}

impl CachedReferenceData for MeasurementScale {
    fn cache<'c>(ctx: &'c mut MappingContext<'_>) -> &'c mut FxHashMap<String, Self> {
        &mut ctx.scales
    }
}

impl CachedReferenceData for MeasurementUnit {
    fn cache<'c>(ctx: &'c mut MappingContext<'_>) -> &'c mut FxHashMap<String, Self> {
        &mut ctx.units
    }
}

fn cache_key(name: &str, short_name: &str) -> String {
    if short_name.is_empty() {
        name.to_ascii_lowercase()
    } else {
        short_name.to_ascii_lowercase()
    }
}

/// Find reference data by name, creating it with `build` when absent.
pub fn resolve_or_create<T: CachedReferenceData>(
    ctx: &mut MappingContext<'_>,
    name: &str,
    short_name: &str,
    build: impl FnOnce() -> T,
) -> Option<T> {
    let key = cache_key(name, short_name);
    if let Some(hit) = T::cache(ctx).get(&key) {
        trace!(kind = T::LABEL, key = %key, "cache hit");
        return Some(hit.clone());
    }

    let found = ctx.chain().by_name::<T>(name, short_name).cloned();
    if let Some(found) = found {
        debug!(kind = T::LABEL, key = %key, "found in reference data chain");
        T::cache(ctx).insert(key, found.clone());
        return Some(found);
    }

    let created = create_in_library(ctx, build())?;
    T::cache(ctx).insert(key, created.clone());
    Some(created)
}

fn create_in_library<T: ReferenceData>(ctx: &mut MappingContext<'_>, thing: T) -> Option<T> {
    let library = ctx.chain().most_specific().cloned();
    let Some(mut library) = library else {
        error!(kind = T::LABEL, name = thing.name(), "no reference data library to create in");
        return None;
    };

    let iid = thing.iid();
    let name = thing.name().to_string();
    let library_iid = library.iid;
    T::in_library_mut(&mut library).push(thing);

    let mut transaction = Transaction::new();
    transaction.create_or_update(Thing::ReferenceDataLibrary(library));
    if let Err(err) = ctx.hub.write(transaction) {
        error!(kind = T::LABEL, name = %name, error = %err, "failed to create reference data");
        return None;
    }
    if let Err(err) = ctx.hub.refresh_reference_data_library(library_iid) {
        error!(kind = T::LABEL, name = %name, error = %err, "failed to refresh reference data library");
        return None;
    }

    let canonical = ctx.chain().by_iid::<T>(iid).cloned();
    match &canonical {
        Some(_) => debug!(kind = T::LABEL, name = %name, iid = %iid, "created reference data"),
        None => error!(kind = T::LABEL, name = %name, "reference data missing after commit"),
    }
    canonical
}

/// Find or create a category restricted to the given kinds.
pub fn resolve_or_create_category(
    ctx: &mut MappingContext<'_>,
    name: &str,
    permissible: &[ClassKind],
) -> Option<Category> {
    let short = short_name(name);
    resolve_or_create(ctx, name, &short, || {
        Category::new(name, short.clone()).with_permissible(permissible)
    })
}

/// Names of the categories with the given identifiers, skipping unknown ones.
pub fn category_names(ctx: &MappingContext<'_>, categories: &[Iid]) -> Vec<String> {
    let chain = ctx.chain();
    categories
        .iter()
        .filter_map(|iid| chain.by_iid::<Category>(*iid))
        .map(|c| c.name.clone())
        .collect()
}
