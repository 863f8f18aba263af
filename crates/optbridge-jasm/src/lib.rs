//! Structural model of Krakatau-style JVM assembly text.
//!
//! The crate reads the textual form of one class into a small tree, lets
//! callers edit it structurally and prints it back. It also understands
//! erased descriptors and generic signatures well enough to split and
//! rewrite them.

#![forbid(unsafe_code)]

pub mod descriptor;
mod error;
pub mod insn;
pub mod model;
pub mod reader;
pub mod signature;
pub mod writer;

pub use crate::descriptor::{
    parse_descriptor_list, parse_method_descriptor, BaseType, DescriptorList, MethodDescriptor,
    TypeDescriptor,
};
pub use crate::error::{Error, Result};
pub use crate::insn::{CodeBuilder, Insn, InvokeKind, ValueKind};
pub use crate::model::{
    ClassFile, ClassItem, Code, CodeItem, Instruction, LineNumber, LocalVariable, Method,
    MethodAttribute, SignatureText,
};
pub use crate::reader::parse_class;
pub use crate::signature::{
    parse_class_signature, parse_method_signature, ClassSignature, MethodSignature, TypeParameter,
};
pub use crate::writer::write_class;
