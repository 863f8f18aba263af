use optbridge_jasm::{BaseType, TypeDescriptor, ValueKind};
use serde::Serialize;

/// The eight primitive specialisations of the option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Primitive {
    Boolean,
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
}

struct VariantInfo {
    upper: &'static str,
    lower: &'static str,
    boxed: &'static str,
    base: BaseType,
}

const INFO: [VariantInfo; 8] = [
    VariantInfo {
        upper: "Boolean",
        lower: "boolean",
        boxed: "java/lang/Boolean",
        base: BaseType::Boolean,
    },
    VariantInfo {
        upper: "Byte",
        lower: "byte",
        boxed: "java/lang/Byte",
        base: BaseType::Byte,
    },
    VariantInfo {
        upper: "Char",
        lower: "char",
        boxed: "java/lang/Character",
        base: BaseType::Char,
    },
    VariantInfo {
        upper: "Double",
        lower: "double",
        boxed: "java/lang/Double",
        base: BaseType::Double,
    },
    VariantInfo {
        upper: "Float",
        lower: "float",
        boxed: "java/lang/Float",
        base: BaseType::Float,
    },
    VariantInfo {
        upper: "Int",
        lower: "int",
        boxed: "java/lang/Integer",
        base: BaseType::Int,
    },
    VariantInfo {
        upper: "Long",
        lower: "long",
        boxed: "java/lang/Long",
        base: BaseType::Long,
    },
    VariantInfo {
        upper: "Short",
        lower: "short",
        boxed: "java/lang/Short",
        base: BaseType::Short,
    },
];

impl Primitive {
    pub const ALL: [Primitive; 8] = [
        Primitive::Boolean,
        Primitive::Byte,
        Primitive::Char,
        Primitive::Double,
        Primitive::Float,
        Primitive::Int,
        Primitive::Long,
        Primitive::Short,
    ];

    fn info(self) -> &'static VariantInfo {
        &INFO[self as usize]
    }

    /// `Int`, as used in class and method names.
    pub fn upper_name(self) -> &'static str {
        self.info().upper
    }

    /// `int`, the Java keyword.
    pub fn lower_name(self) -> &'static str {
        self.info().lower
    }

    /// Internal name of the wrapper class.
    pub fn boxed(self) -> &'static str {
        self.info().boxed
    }

    pub fn boxed_descriptor(self) -> TypeDescriptor {
        TypeDescriptor::object(self.boxed())
    }

    pub fn base_type(self) -> BaseType {
        self.info().base
    }

    pub fn type_code(self) -> char {
        self.info().base.code()
    }

    pub fn descriptor(self) -> TypeDescriptor {
        TypeDescriptor::base(self.base_type())
    }

    pub fn value_kind(self) -> ValueKind {
        match self {
            Primitive::Long => ValueKind::Long,
            Primitive::Double => ValueKind::Double,
            Primitive::Float => ValueKind::Float,
            _ => ValueKind::Int,
        }
    }

    pub fn from_upper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.upper_name() == name)
    }

    pub fn from_lower_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.lower_name() == name)
    }
}
