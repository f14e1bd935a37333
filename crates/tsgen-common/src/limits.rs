//! Centralized limits and thresholds for the generic type resolution engine.
//!
//! This module provides shared constants for recursion depths, operation counts,
//! and capacity limits. The solver's `RecursionProfile` presets read their
//! numbers from here so that each limit is defined exactly once.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for nested generic instantiation.
///
/// Every time instantiating one generic reference requires instantiating
/// another (for example the `next` field of `List<T>` referring back to
/// `List<T>`, or `Foo<Foo<T>>` inside `Foo<T>`), the nested instantiation runs
/// one level deeper. Self-references with identical arguments collapse into a
/// lazy placeholder and never deepen; templates whose arguments keep growing do.
/// When this depth is exceeded the engine reports
/// `RecursiveGenericExpansionLimit` (code 2589) for the outermost site.
///
/// ```typescript
/// type List<T> = { value: T, next: List<T> | null };  // depth 1, fine
/// type Foo<T> = { value: Foo<Foo<T>> };
/// type Boom = Foo<string>;
/// //   ~~~~ 2589: Type instantiation is excessively deep and possibly infinite.
/// ```
pub const MAX_INSTANTIATION_DEPTH: u32 = 50;

/// Maximum depth for structural subtype checks.
///
/// Structural comparison of recursive types can legitimately nest deeply
/// before a cycle is found, so this is twice the instantiation depth.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum depth for shallow type walks (free-variable collection,
/// contains-checks, formatting).
pub const MAX_TRAVERSAL_DEPTH: u32 = 256;

// =============================================================================
// Operation Counts
// =============================================================================

/// Total work budget for a single recursion guard.
///
/// Bounds the number of `enter` attempts regardless of depth so that wide but
/// shallow expansions still terminate.
pub const MAX_GUARD_ITERATIONS: u32 = 100_000;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Inline capacity for type lists built during union normalization.
pub const TYPE_LIST_INLINE: usize = 8;
