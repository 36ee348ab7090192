use pretty_assertions::assert_eq;

use mcasm::diag::Location;
use mcasm::lexer::Pos;
use mcasm::symbols::Scope;
use mcasm::{AsmConfig, Assembler, Reporter, Severity};

fn assemble(src: &str) -> Assembler {
    let mut asm = Assembler::new(AsmConfig::default(), Reporter::capture()).unwrap();
    asm.assemble_str("t.mc", src);
    asm
}

fn errors(asm: &Assembler) -> Vec<String> {
    asm.reporter()
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .map(|d| d.message.clone())
        .collect()
}

fn at(line: u32, col: u32) -> Option<Location> {
    Some(Location {
        file: "t.mc".into(),
        pos: Pos { line, col },
    })
}

#[test]
fn missing_close_brace_keeps_parsing() {
    let asm = assemble("port a 1\ngrp 0 {\n a = a\ndef k 5\ngrp 1 {\n a =# k\n}\n");
    assert!(asm.failed());
    let diags = asm.reporter().diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "expected command group to terminate with }");
    assert_eq!(diags[0].location, at(4, 1));
    // the statements after the open group still took effect
    assert_eq!(asm.lookup(Scope::Symbol, "k"), Some(5));
    assert_eq!(asm.image().read_u16(0), Some(0x8101));
    assert_eq!(asm.image().read_u16(16), Some(0x0105));
}

#[test]
fn group_open_at_end_of_input() {
    let asm = assemble("port a 1\ngrp 0 {\n a = a\n");
    assert_eq!(errors(&asm), vec!["expected command group to terminate with }".to_string()]);
    assert_eq!(asm.image().read_u16(0), Some(0x8101));
}

#[test]
fn missing_open_brace() {
    let asm = assemble("port a 1\ngrp 0\n a = a\n}\n");
    assert_eq!(
        errors(&asm),
        vec!["expected { to start a command group, found new line".to_string()]
    );
    assert_eq!(asm.image().read_u16(0), Some(0x8101));
}

#[test]
fn unknown_label_is_reported_at_the_reference() {
    let asm = assemble("port a 1\ngrp 0 {\n a = a\n  a =: nowhere\n}\n");
    let diags = asm.reporter().diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].message, "referenced label, nowhere, not found");
    assert_eq!(diags[0].location, at(4, 3));
    assert_eq!(asm.image().read_u16(2), Some(0x0100));
}

#[test]
fn bad_lines_still_use_a_slot() {
    let src = "\
port a 1
grp 0 {
 a a a a a a = a
 a b
 a =
 = a
 a = a
}
";
    let asm = assemble(src);
    assert_eq!(
        errors(&asm),
        vec![
            "too many destination options at a; at most 4 are allowed".to_string(),
            "expected an assignment operator before the end of the line".to_string(),
            "expected a source after =".to_string(),
            "expected a destination, found =".to_string(),
        ]
    );
    assert_eq!(asm.image().read_u16(0), Some(0));
    assert_eq!(asm.image().read_u16(8), Some(0x8101));
}

#[test]
fn trailing_words_and_bad_values() {
    let asm = assemble("def a 1 2\ndef k 12z\nport\ndef q\n");
    assert_eq!(
        errors(&asm),
        vec![
            "Expected new line, found 2".to_string(),
            "error deriving value for symbol 12z".to_string(),
            "No port defined".to_string(),
            "No value for symbol q".to_string(),
        ]
    );
    assert_eq!(asm.lookup(Scope::Symbol, "a"), Some(1));
    assert_eq!(asm.lookup(Scope::Symbol, "k"), Some(-1));
    assert_eq!(asm.lookup(Scope::Symbol, "q"), Some(-1));
}

#[test]
fn unexpected_keyword_skips_the_line() {
    let asm = assemble("bogus 1 2\ndef a 3\n}\n");
    assert_eq!(
        errors(&asm),
        vec![
            "unexpected statement keyword: bogus".to_string(),
            "unexpected statement keyword: }".to_string(),
        ]
    );
    assert_eq!(asm.lookup(Scope::Symbol, "a"), Some(3));
}

#[test]
fn group_id_checks() {
    let asm = assemble("grp\ngrp 256 {\n 1 = 1\n}\n");
    assert_eq!(
        errors(&asm),
        vec![
            "Expected a cmdGrp id".to_string(),
            "Command Id, 256, is out of range 0..255".to_string(),
        ]
    );
    // the out-of-range group is written at id 0
    assert_eq!(asm.image().read_u16(0), Some(0x8101));
}

#[test]
fn full_group_hands_leftover_lines_to_the_statement_loop() {
    let mut src = String::from("grp 0 {\n");
    for _ in 0..17 {
        src.push_str(" 1 = 1\n");
    }
    src.push_str("}\ndef after 1\n");
    let asm = assemble(&src);
    assert_eq!(
        errors(&asm),
        vec![
            "expected command group to terminate with }".to_string(),
            "unexpected statement keyword: 1".to_string(),
            "unexpected statement keyword: }".to_string(),
        ]
    );
    let diags = asm.reporter().diagnostics();
    assert_eq!(diags[0].location, at(18, 2));
    assert_eq!(asm.image().read_u16(30), Some(0x8101));
    assert_eq!(asm.image().read_u16(32), Some(0));
    assert_eq!(asm.lookup(Scope::Symbol, "after"), Some(1));
}

#[test]
fn overlong_word_is_truncated_and_reported() {
    let long = "z".repeat(300);
    let asm = assemble(&format!("def {long} 1\n"));
    assert_eq!(
        errors(&asm),
        vec![format!("Length of token, {long}, exceeds the maximum, 255")]
    );
    assert_eq!(asm.lookup(Scope::Symbol, &long[..255]), Some(1));
}
