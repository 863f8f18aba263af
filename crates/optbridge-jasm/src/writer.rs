//! Printer for the structural model.
//!
//! Modelled lines come out in the canonical layout the disassembler uses;
//! raw lines are written back exactly as they were read.

use std::fmt;

use crate::model::{
    ClassFile, ClassItem, Code, CodeItem, Instruction, LocalVariable, Method, MethodAttribute,
    SignatureText,
};

const ATTRIBUTE_INDENT: &str = "    ";
const TABLE_INDENT: &str = "        ";
const ENTRY_INDENT: &str = "            ";

pub fn write_class(class: &ClassFile) -> String {
    class.to_string()
}

impl fmt::Display for ClassFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, item) in self.items.iter().enumerate() {
            if idx > 0 {
                f.write_str("\n")?;
            }
            match item {
                ClassItem::Implements(name) => write!(f, ".implements {name}")?,
                ClassItem::Signature(sig) => write!(f, ".signature {sig}")?,
                ClassItem::Method(method) => write!(f, "{method}")?,
                ClassItem::Raw(line) => f.write_str(line)?,
            }
        }
        Ok(())
    }
}

impl fmt::Display for SignatureText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote {
            Some(quote) => write!(f, "{quote}{}{quote}", self.value),
            None => f.write_str(&self.value),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(".method ")?;
        for flag in &self.flags {
            write!(f, "{flag} ")?;
        }
        writeln!(f, "{} : {}", self.name, self.descriptor)?;
        for attr in &self.attributes {
            match attr {
                MethodAttribute::Code(code) => writeln!(f, "{code}")?,
                MethodAttribute::Signature(sig) => {
                    writeln!(f, "{ATTRIBUTE_INDENT}.signature {sig}")?
                }
                MethodAttribute::Exceptions(names) => {
                    writeln!(f, "{ATTRIBUTE_INDENT}.exceptions {}", names.join(" "))?
                }
                MethodAttribute::Raw(line) => writeln!(f, "{line}")?,
            }
        }
        f.write_str(".end method")
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.text.is_empty() {
            write!(f, "{}:", self.label)
        } else {
            let label = format!("{}:", self.label);
            write!(f, "{label:<7} {}", self.text)
        }
    }
}

impl fmt::Display for LocalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} is {} {} from {} to {}",
            self.index, self.name, self.descriptor, self.start, self.end
        )
    }
}

fn write_table<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    directive: &str,
    entries: &[T],
) -> fmt::Result {
    writeln!(f, "{TABLE_INDENT}.{directive}")?;
    for entry in entries {
        writeln!(f, "{ENTRY_INDENT}{entry}")?;
    }
    writeln!(f, "{TABLE_INDENT}.end {directive}")
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{ATTRIBUTE_INDENT}.code stack {} locals {}",
            self.stack, self.locals
        )?;
        for item in &self.items {
            match item {
                CodeItem::Instruction(insn) => writeln!(f, "{insn}")?,
                CodeItem::LineNumberTable(entries) => {
                    writeln!(f, "{TABLE_INDENT}.linenumbertable")?;
                    for entry in entries {
                        writeln!(f, "{ENTRY_INDENT}{} {}", entry.label, entry.line)?;
                    }
                    writeln!(f, "{TABLE_INDENT}.end linenumbertable")?;
                }
                CodeItem::LocalVariableTable(entries) => {
                    write_table(f, "localvariabletable", entries)?
                }
                CodeItem::LocalVariableTypeTable(entries) => {
                    write_table(f, "localvariabletypetable", entries)?
                }
                CodeItem::Raw(line) => writeln!(f, "{line}")?,
            }
        }
        write!(f, "{ATTRIBUTE_INDENT}.end code")
    }
}
