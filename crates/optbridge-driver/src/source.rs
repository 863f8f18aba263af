use std::path::Path;

use optbridge_patch::LibraryLayout;
use regex::Regex;

use crate::error::DriverError;

/// 1-based line of the empty class's declaration in its Java source.
///
/// Synthesised bridges have no source of their own, so their line number
/// table points here.
pub fn source_line(sources: &Path, layout: &LibraryLayout) -> Result<u32, DriverError> {
    let path = sources.join(format!("{}.java", layout.empty_class_name()));
    let text = std::fs::read_to_string(&path).map_err(|err| DriverError::io(&path, err))?;
    find_declaration(&text, &layout.empty_class).ok_or_else(|| DriverError::SourceLine {
        name: layout.empty_class.clone(),
        path,
    })
}

fn find_declaration(text: &str, name: &str) -> Option<u32> {
    let pattern = format!(
        r"^\s*(?:(?:public|protected|private|abstract|static|final|sealed|non-sealed|strictfp)\s+)*class\s+{}\b",
        regex::escape(name)
    );
    let re = Regex::new(&pattern).ok()?;
    let idx = text.lines().position(|line| re.is_match(line))?;
    u32::try_from(idx + 1).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_the_class_line_not_mentions() {
        let text = "\
package me.dkleszyk.java.option;

/**
 * The class None is the empty option.
 */
final class None<T>
    implements Option<T>, Serializable
{
    static class NoneHolder {}
}
";
        assert_eq!(find_declaration(text, "None"), Some(6));
        assert_eq!(find_declaration(text, "NoneHolder"), Some(9));
        assert_eq!(find_declaration(text, "Some"), None);
    }

    #[test]
    fn name_must_match_whole_word() {
        assert_eq!(find_declaration("class Nonesuch {}\nclass None {}\n", "None"), Some(2));
    }
}
