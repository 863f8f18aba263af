use crate::error::{Error, Result};
use crate::model::{
    ClassFile, ClassItem, Code, CodeItem, Instruction, LineNumber, LocalVariable, Method,
    MethodAttribute, SignatureText,
};

/// Parses the structural text of one class.
///
/// Lines the patchers never look at are kept verbatim as raw items.
pub fn parse_class(text: &str) -> Result<ClassFile> {
    let mut reader = Reader::new(text);
    let mut items = Vec::new();

    while let Some((line_no, line)) = reader.next_line() {
        let trimmed = line.trim_end();
        if let Some(header) = trimmed.strip_prefix(".method ") {
            items.push(ClassItem::Method(reader.method(line_no, header)?));
        } else if let Some(name) = trimmed.strip_prefix(".implements ") {
            items.push(ClassItem::Implements(name.trim().to_string()));
        } else if let Some(value) = trimmed.strip_prefix(".signature ") {
            items.push(ClassItem::Signature(signature_text(value)));
        } else {
            items.push(ClassItem::Raw(line.to_string()));
        }
    }

    Ok(ClassFile { items })
}

struct Reader<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            pos: 0,
        }
    }

    /// Next line with its 1-based number.
    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line.strip_suffix('\r').unwrap_or(line)))
    }

    fn expect_line(&mut self, expected: &'static str) -> Result<(usize, &'a str)> {
        self.next_line().ok_or(Error::UnexpectedEof { expected })
    }

    fn method(&mut self, line_no: usize, header: &str) -> Result<Method> {
        let (head, descriptor) = header
            .split_once(" : ")
            .ok_or_else(|| Error::malformed(line_no, "method header without ` : `"))?;
        let mut words: Vec<String> = head.split_whitespace().map(str::to_string).collect();
        let name = words
            .pop()
            .ok_or_else(|| Error::malformed(line_no, "method header without a name"))?;

        let mut attributes = Vec::new();
        loop {
            let (line_no, line) = self.expect_line(".end method")?;
            let trimmed = line.trim();
            if trimmed == ".end method" {
                break;
            }
            if let Some(sizes) = trimmed.strip_prefix(".code ") {
                attributes.push(MethodAttribute::Code(self.code(line_no, sizes)?));
            } else if let Some(value) = trimmed.strip_prefix(".signature ") {
                attributes.push(MethodAttribute::Signature(signature_text(value)));
            } else if let Some(names) = trimmed.strip_prefix(".exceptions ") {
                attributes.push(MethodAttribute::Exceptions(
                    names.split_whitespace().map(str::to_string).collect(),
                ));
            } else {
                attributes.push(MethodAttribute::Raw(line.to_string()));
            }
        }

        Ok(Method {
            flags: words,
            name,
            descriptor: descriptor.trim().to_string(),
            attributes,
        })
    }

    fn code(&mut self, line_no: usize, sizes: &str) -> Result<Code> {
        let (stack, locals) = match sizes.split_whitespace().collect::<Vec<_>>().as_slice() {
            ["stack", stack, "locals", locals] => (
                parse_number(line_no, stack)?,
                parse_number(line_no, locals)?,
            ),
            _ => return Err(Error::malformed(line_no, format!("bad .code sizes `{sizes}`"))),
        };

        let mut items = Vec::new();
        loop {
            let (line_no, line) = self.expect_line(".end code")?;
            let trimmed = line.trim();
            match trimmed {
                ".end code" => break,
                ".linenumbertable" => {
                    let mut entries = Vec::new();
                    for (line_no, entry) in self.table(".end linenumbertable")? {
                        match entry.split_whitespace().collect::<Vec<_>>().as_slice() {
                            [label, line] => entries.push(LineNumber {
                                label: label.to_string(),
                                line: parse_number(line_no, line)?,
                            }),
                            _ => {
                                return Err(Error::malformed(
                                    line_no,
                                    format!("bad line number entry `{}`", entry.trim()),
                                ))
                            }
                        }
                    }
                    items.push(CodeItem::LineNumberTable(entries));
                }
                ".localvariabletable" => {
                    let entries = self.local_variables(".end localvariabletable")?;
                    items.push(CodeItem::LocalVariableTable(entries));
                }
                ".localvariabletypetable" => {
                    let entries = self.local_variables(".end localvariabletypetable")?;
                    items.push(CodeItem::LocalVariableTypeTable(entries));
                }
                _ => match label_of(line) {
                    Some((label, text)) => items.push(CodeItem::Instruction(Instruction {
                        label: label.to_string(),
                        text: text.trim().to_string(),
                    })),
                    None => items.push(CodeItem::Raw(line.to_string())),
                },
            }
        }

        Ok(Code {
            stack,
            locals,
            items,
        })
    }

    fn table(&mut self, end: &'static str) -> Result<Vec<(usize, &'a str)>> {
        let mut entries = Vec::new();
        loop {
            let (line_no, line) = self.expect_line(end)?;
            if line.trim() == end {
                return Ok(entries);
            }
            entries.push((line_no, line));
        }
    }

    fn local_variables(&mut self, end: &'static str) -> Result<Vec<LocalVariable>> {
        self.table(end)?
            .into_iter()
            .map(|(line_no, entry)| {
                match entry.split_whitespace().collect::<Vec<_>>().as_slice() {
                    [index, "is", name, descriptor, "from", start, "to", end] => {
                        Ok(LocalVariable {
                            index: parse_number(line_no, index)?,
                            name: name.to_string(),
                            descriptor: descriptor.to_string(),
                            start: start.to_string(),
                            end: end.to_string(),
                        })
                    }
                    _ => Err(Error::malformed(
                        line_no,
                        format!("bad local variable entry `{}`", entry.trim()),
                    )),
                }
            })
            .collect()
    }
}

/// Splits `L12:     aload_0` into its label and instruction text.
fn label_of(line: &str) -> Option<(&str, &str)> {
    let first = line.chars().next()?;
    if !(first.is_ascii_alphabetic() || first == '_') {
        return None;
    }
    let (label, rest) = line.split_once(':')?;
    label
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        .then_some((label, rest))
}

fn parse_number<T: std::str::FromStr>(line_no: usize, text: &str) -> Result<T> {
    text.parse()
        .map_err(|_| Error::malformed(line_no, format!("expected a number, found `{text}`")))
}

fn signature_text(value: &str) -> SignatureText {
    let value = value.trim();
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return SignatureText {
                value: value[1..value.len() - 1].to_string(),
                quote: Some(quote),
            };
        }
    }
    SignatureText::unquoted(value)
}
