//! Typed instructions and a builder that lays them out into a [`Code`] block.
//!
//! Only the handful of opcodes the synthesised bodies need are modelled.
//! Labels are byte offsets, so every instruction knows its encoded size.

use std::fmt;

use crate::descriptor::{BaseType, MethodDescriptor, TypeDescriptor};
use crate::model::{Code, CodeItem, Instruction, LineNumber, LocalVariable};

/// Computational category of a value, as far as load/return opcodes care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Long,
    Float,
    Double,
    Reference,
}

impl ValueKind {
    /// `None` for `V`.
    pub fn of(descriptor: &TypeDescriptor) -> Option<Self> {
        if descriptor.is_void() {
            return None;
        }
        Some(match descriptor.base_type() {
            Some(BaseType::Long) => ValueKind::Long,
            Some(BaseType::Float) => ValueKind::Float,
            Some(BaseType::Double) => ValueKind::Double,
            Some(_) => ValueKind::Int,
            None => ValueKind::Reference,
        })
    }

    pub fn words(self) -> u16 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }

    fn prefix(self) -> char {
        match self {
            ValueKind::Int => 'i',
            ValueKind::Long => 'l',
            ValueKind::Float => 'f',
            ValueKind::Double => 'd',
            ValueKind::Reference => 'a',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokeKind {
    Static,
    Virtual,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insn {
    Load(ValueKind, u16),
    /// `None` is a plain `return`.
    Return(Option<ValueKind>),
    Athrow,
    Iconst0,
    Checkcast(String),
    Invoke {
        kind: InvokeKind,
        /// Whether `owner` is an interface (selects `InterfaceMethod`).
        interface: bool,
        owner: String,
        name: String,
        descriptor: MethodDescriptor,
    },
}

impl Insn {
    pub fn invoke_static(owner: &str, name: &str, descriptor: MethodDescriptor) -> Self {
        Insn::Invoke {
            kind: InvokeKind::Static,
            interface: false,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor,
        }
    }

    pub fn invoke_interface(owner: &str, name: &str, descriptor: MethodDescriptor) -> Self {
        Insn::Invoke {
            kind: InvokeKind::Interface,
            interface: true,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor,
        }
    }

    pub fn invoke_virtual(owner: &str, name: &str, descriptor: MethodDescriptor) -> Self {
        Insn::Invoke {
            kind: InvokeKind::Virtual,
            interface: false,
            owner: owner.to_string(),
            name: name.to_string(),
            descriptor,
        }
    }

    /// Encoded length in bytes.
    pub fn size(&self) -> u32 {
        match self {
            Insn::Load(_, 0..=3) => 1,
            Insn::Load(_, 4..=255) => 2,
            Insn::Load(..) => 4,
            Insn::Return(_) | Insn::Athrow | Insn::Iconst0 => 1,
            Insn::Checkcast(_) => 3,
            Insn::Invoke {
                kind: InvokeKind::Interface,
                ..
            } => 5,
            Insn::Invoke { .. } => 3,
        }
    }

    /// Operand stack words `(popped, pushed)`.
    pub fn stack_effect(&self) -> (u16, u16) {
        match self {
            Insn::Load(kind, _) => (0, kind.words()),
            Insn::Return(kind) => (kind.map_or(0, ValueKind::words), 0),
            Insn::Athrow => (1, 0),
            Insn::Iconst0 => (0, 1),
            Insn::Checkcast(_) => (1, 1),
            Insn::Invoke {
                kind, descriptor, ..
            } => {
                let receiver = u16::from(*kind != InvokeKind::Static);
                (
                    receiver + descriptor.param_slots(),
                    descriptor.return_type.slots(),
                )
            }
        }
    }
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Load(kind, index @ 0..=3) => write!(f, "{}load_{index}", kind.prefix()),
            Insn::Load(kind, index) => write!(f, "{}load {index}", kind.prefix()),
            Insn::Return(None) => f.write_str("return"),
            Insn::Return(Some(kind)) => write!(f, "{}return", kind.prefix()),
            Insn::Athrow => f.write_str("athrow"),
            Insn::Iconst0 => f.write_str("iconst_0"),
            Insn::Checkcast(class) => write!(f, "checkcast {class}"),
            Insn::Invoke {
                kind,
                interface,
                owner,
                name,
                descriptor,
            } => {
                let opcode = match kind {
                    InvokeKind::Static => "invokestatic",
                    InvokeKind::Virtual => "invokevirtual",
                    InvokeKind::Interface => "invokeinterface",
                };
                let reference = if *interface {
                    "InterfaceMethod"
                } else {
                    "Method"
                };
                write!(f, "{opcode} {reference} {owner} {name} {descriptor}")?;
                if *kind == InvokeKind::Interface {
                    write!(f, " {}", 1 + descriptor.param_slots())?;
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Local {
    index: u16,
    name: String,
    descriptor: TypeDescriptor,
    generic: Option<TypeDescriptor>,
}

/// Collects locals and instructions, then computes labels, sizes and the
/// debug tables in one go.
#[derive(Debug, Clone, Default)]
pub struct CodeBuilder {
    locals: Vec<Local>,
    next_slot: u16,
    insns: Vec<Insn>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next local slot(s) and returns the first index.
    ///
    /// A `generic` type puts the local into the local variable type table.
    pub fn local(
        &mut self,
        name: &str,
        descriptor: TypeDescriptor,
        generic: Option<TypeDescriptor>,
    ) -> u16 {
        let index = self.next_slot;
        self.next_slot += descriptor.slots();
        self.locals.push(Local {
            index,
            name: name.to_string(),
            descriptor,
            generic,
        });
        index
    }

    pub fn push(&mut self, insn: Insn) -> &mut Self {
        self.insns.push(insn);
        self
    }

    pub fn max_locals(&self) -> u16 {
        self.next_slot
    }

    /// Deepest operand stack reached by straight-line execution.
    pub fn max_stack(&self) -> u16 {
        let mut depth = 0u16;
        let mut max = 0u16;
        for insn in &self.insns {
            let (popped, pushed) = insn.stack_effect();
            depth = depth.saturating_sub(popped) + pushed;
            max = max.max(depth);
        }
        max
    }

    pub fn finish(self, line: Option<u32>) -> Code {
        let stack = self.max_stack();
        let locals = self.max_locals();

        let mut items = Vec::with_capacity(self.insns.len() + 4);
        let mut offset = 0u32;
        for insn in &self.insns {
            items.push(CodeItem::Instruction(Instruction {
                label: format!("L{offset}"),
                text: insn.to_string(),
            }));
            offset += insn.size();
        }
        let end = format!("L{offset}");
        items.push(CodeItem::Instruction(Instruction {
            label: end.clone(),
            text: String::new(),
        }));

        if let Some(line) = line {
            items.push(CodeItem::LineNumberTable(vec![LineNumber {
                label: "L0".to_string(),
                line,
            }]));
        }

        let entry = |local: &Local, descriptor: &TypeDescriptor| LocalVariable {
            index: local.index,
            name: local.name.clone(),
            descriptor: descriptor.to_string(),
            start: "L0".to_string(),
            end: end.clone(),
        };
        if !self.locals.is_empty() {
            items.push(CodeItem::LocalVariableTable(
                self.locals.iter().map(|l| entry(l, &l.descriptor)).collect(),
            ));
        }
        let typed: Vec<_> = self
            .locals
            .iter()
            .filter_map(|l| l.generic.as_ref().map(|generic| entry(l, generic)))
            .collect();
        if !typed.is_empty() {
            items.push(CodeItem::LocalVariableTypeTable(typed));
        }

        Code {
            stack,
            locals,
            items,
        }
    }
}
