//! In-memory tree for the structural text of one class.
//!
//! Only the parts the patchers edit are modelled (interfaces, the class
//! signature, methods and their code). Everything else is carried as raw
//! lines so a read/print cycle does not disturb it.

use crate::descriptor::{parse_method_descriptor, MethodDescriptor};
use crate::error::Result;
use crate::signature::{parse_method_signature, MethodSignature};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassFile {
    pub items: Vec<ClassItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassItem {
    Implements(String),
    Signature(SignatureText),
    Method(Method),
    Raw(String),
}

/// Value of a `.signature` directive, remembering whether it was quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureText {
    pub value: String,
    pub quote: Option<char>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Method {
    pub flags: Vec<String>,
    pub name: String,
    pub descriptor: String,
    pub attributes: Vec<MethodAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodAttribute {
    Code(Code),
    Signature(SignatureText),
    Exceptions(Vec<String>),
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code {
    pub stack: u16,
    pub locals: u16,
    pub items: Vec<CodeItem>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeItem {
    Instruction(Instruction),
    LineNumberTable(Vec<LineNumber>),
    LocalVariableTable(Vec<LocalVariable>),
    LocalVariableTypeTable(Vec<LocalVariable>),
    Raw(String),
}

/// A labelled instruction; an empty `text` marks a bare label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineNumber {
    pub label: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub index: u16,
    pub name: String,
    pub descriptor: String,
    pub start: String,
    pub end: String,
}

impl SignatureText {
    pub fn unquoted(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote: None,
        }
    }

    /// Same quoting style, different value.
    pub fn with_value(&self, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote: self.quote,
        }
    }
}

impl ClassFile {
    /// Internal name from the `.class` directive.
    pub fn this_class(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            ClassItem::Raw(line) => line
                .trim_end()
                .strip_prefix(".class ")
                .and_then(|rest| rest.split_whitespace().last()),
            _ => None,
        })
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            ClassItem::Implements(name) => Some(name.as_str()),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.items.iter().filter_map(|item| match item {
            ClassItem::Method(method) => Some(method),
            _ => None,
        })
    }

    /// Index of the class-level `.signature` item.
    pub fn signature_index(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, ClassItem::Signature(_)))
    }

    pub fn signature(&self) -> Option<&SignatureText> {
        self.items.iter().find_map(|item| match item {
            ClassItem::Signature(sig) => Some(sig),
            _ => None,
        })
    }
}

impl Method {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn is_abstract(&self) -> bool {
        self.has_flag("abstract")
    }

    pub fn is_bridge(&self) -> bool {
        self.has_flag("bridge")
    }

    pub fn code(&self) -> Option<&Code> {
        self.attributes.iter().find_map(|attr| match attr {
            MethodAttribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn code_mut(&mut self) -> Option<&mut Code> {
        self.attributes.iter_mut().find_map(|attr| match attr {
            MethodAttribute::Code(code) => Some(code),
            _ => None,
        })
    }

    pub fn signature(&self) -> Option<&SignatureText> {
        self.attributes.iter().find_map(|attr| match attr {
            MethodAttribute::Signature(sig) => Some(sig),
            _ => None,
        })
    }

    pub fn parsed_descriptor(&self) -> Result<MethodDescriptor> {
        parse_method_descriptor(&self.descriptor)
    }

    pub fn parsed_signature(&self) -> Result<Option<MethodSignature>> {
        self.signature()
            .map(|sig| parse_method_signature(&sig.value))
            .transpose()
    }
}

impl Code {
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.items.iter().filter_map(|item| match item {
            CodeItem::Instruction(insn) => Some(insn),
            _ => None,
        })
    }

    pub fn line_numbers(&self) -> Option<&Vec<LineNumber>> {
        self.items.iter().find_map(|item| match item {
            CodeItem::LineNumberTable(entries) => Some(entries),
            _ => None,
        })
    }

    pub fn line_numbers_mut(&mut self) -> Option<&mut Vec<LineNumber>> {
        self.items.iter_mut().find_map(|item| match item {
            CodeItem::LineNumberTable(entries) => Some(entries),
            _ => None,
        })
    }

    pub fn local_variables(&self) -> Option<&Vec<LocalVariable>> {
        self.items.iter().find_map(|item| match item {
            CodeItem::LocalVariableTable(entries) => Some(entries),
            _ => None,
        })
    }

    pub fn local_variables_mut(&mut self) -> Option<&mut Vec<LocalVariable>> {
        self.items.iter_mut().find_map(|item| match item {
            CodeItem::LocalVariableTable(entries) => Some(entries),
            _ => None,
        })
    }

    pub fn local_variable_types(&self) -> Option<&Vec<LocalVariable>> {
        self.items.iter().find_map(|item| match item {
            CodeItem::LocalVariableTypeTable(entries) => Some(entries),
            _ => None,
        })
    }
}
