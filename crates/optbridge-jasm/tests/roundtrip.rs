use optbridge_jasm::{parse_class, write_class, ClassItem};
use pretty_assertions::assert_eq;

const SOME_LONG: &str = include_str!("fixtures/SomeLong.j");

#[test]
fn disassembler_output_survives_a_print_cycle() {
    let class = parse_class(SOME_LONG).unwrap();
    let printed = write_class(&class);
    assert_eq!(parse_class(&printed).unwrap(), class);
    assert_eq!(write_class(&parse_class(&printed).unwrap()), printed);
}

#[test]
fn structure_of_a_some_class() {
    let class = parse_class(SOME_LONG).unwrap();
    assert_eq!(class.this_class(), Some("me/dkleszyk/java/option/SomeLong"));
    assert_eq!(
        class.interfaces().collect::<Vec<_>>(),
        vec!["me/dkleszyk/java/option/LongOption"]
    );

    let methods: Vec<_> = class
        .methods()
        .map(|m| (m.name.as_str(), m.descriptor.as_str(), m.is_bridge()))
        .collect();
    assert_eq!(
        methods,
        vec![
            ("<init>", "(J)V", false),
            ("orElse", "(Ljava/lang/Long;)Ljava/lang/Long;", false),
            ("orElse", "(Ljava/lang/Object;)Ljava/lang/Object;", true),
        ]
    );

    let bridge = class.methods().nth(2).unwrap();
    let texts: Vec<_> = bridge
        .code()
        .unwrap()
        .instructions()
        .map(|i| i.text.as_str())
        .collect();
    assert_eq!(texts[2], "checkcast java/lang/Long");
    assert_eq!(texts.last(), Some(&""));
}

#[test]
fn unmodelled_lines_are_kept_verbatim() {
    let class = parse_class(SOME_LONG).unwrap();
    let raw: Vec<_> = class
        .items
        .iter()
        .filter_map(|item| match item {
            ClassItem::Raw(line) => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert!(raw.contains(&".field private final value J "));
    assert!(raw.contains(&".sourcefile \"SomeLong.java\" "));
    assert!(write_class(&class).contains(".super java/lang/Object \n"));
}
