//! Bytecode patches for the option library's erased bridges.
//!
//! Two independent edits live here. [`eliminate_cast`] rewrites the
//! `orElse` bridge of a `Some` class so it no longer casts its argument.
//! [`Catalog`] and [`patch_empty_variant`] give the empty class a bridge for
//! every abstract method of the specialised interfaces it is made to
//! implement.

#![forbid(unsafe_code)]

pub mod bridge;
pub mod cast;
pub mod catalog;
pub mod classify;
pub mod declare;
mod error;
pub mod layout;
pub mod variant;

pub use crate::bridge::{synthesize, SynthesisContext, SynthesizedBridge};
pub use crate::cast::eliminate_cast;
pub use crate::catalog::{AbstractMethodDeclaration, Catalog, CatalogEntry, Origin};
pub use crate::classify::{
    classify, Classification, FactoryOwner, IfSomeShape, Supplied, SynthesisPattern,
};
pub use crate::declare::patch_empty_variant;
pub use crate::error::{PatchError, Result};
pub use crate::layout::{LibraryLayout, MethodRef};
pub use crate::variant::Primitive;
