use case_compiler::*;

fn compile_source(source: &str) -> String {
    compile(source).expect("source should compile")
}

/// Generated lines with indentation stripped.
fn lines(code: &str) -> Vec<&str> {
    code.lines().map(str::trim).collect()
}

fn position(lines: &[&str], wanted: &str) -> usize {
    lines
        .iter()
        .position(|line| *line == wanted)
        .unwrap_or_else(|| panic!("missing line {:?}", wanted))
}

#[test]
fn test_minimal_case_output() {
    let code = compile_source(r#"Config { """host=x;port=1"""} TestCase T1 { :"SELECT 1"; }"#);
    insta::assert_snapshot!(code.trim_end(), @r###"
// Generated by case-compiler. Do not edit.
#![allow(unused_variables, non_snake_case)]

use std::sync::Arc;

use case_compiler::runtime::prelude::*;

pub const CONFIG: &str = r#"host=x;port=1"#;

pub struct GeneratedCases {
    env: CaseEnv,
}

impl GeneratedCases {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            env: CaseEnv::new(CONFIG, connector),
        }
    }

    pub fn test_1_T1(&self) -> CaseResult {
        let terminals = TerminalRegistry::new();
        let outcome = match guarded(|| -> CaseResult {
            let case_terminal = terminals.start("case_terminal", &self.env)?;
            case_terminal.execute("SELECT 1");
            case_terminal.wait_finish();
            Ok(())
        }) {
            Err(CaseFailure::Assertion(failure)) => fail_assertion("test_1_T1", failure),
            Err(failure) => fail_unexpected("test_1_T1", failure),
            Ok(()) => Ok(()),
        };
        let terminals = terminals.into_inner();
        for term in &terminals {
            term.close();
        }
        for term in &terminals {
            term.join();
        }
        outcome
    }
}

pub fn run_all(connector: Arc<dyn Connector>) -> SuiteReport {
    let cases = GeneratedCases::new(connector);
    let mut suite = SuiteRunner::new();
    suite.run("test_1_T1", || cases.test_1_T1());
    suite.finish()
}
"###);
}

#[test]
fn test_async_never_waits() {
    let source = r#"
Config { "c" }
TestCase T2 {
    Terminal a b;
    a:"SELECT 1";
    Async b :"SELECT 2";
    expect_equal(1,1);
}
"#;
    let code = compile_source(source);
    let lines = lines(&code);

    let a_exec = position(&lines, r#"a.execute("SELECT 1");"#);
    assert_eq!(lines[a_exec + 1], "a.wait_finish();");

    let b_exec = position(&lines, r#"b.execute("SELECT 2");"#);
    assert_ne!(lines[b_exec + 1], "b.wait_finish();");
    assert!(!lines.contains(&"b.wait_finish();"));
}

#[test]
fn test_terminals_start_in_declaration_order() {
    let source = r#"Config {"c"} TestCase T2 { Terminal a b; a:"SELECT 1"; Async b :"SELECT 2"; }"#;
    let code = compile_source(source);
    let lines = lines(&code);

    let default = position(&lines, r#"let case_terminal = terminals.start("case_terminal", &self.env)?;"#);
    let a = position(&lines, r#"let a = terminals.start("a", &self.env)?;"#);
    let b = position(&lines, r#"let b = terminals.start("b", &self.env)?;"#);
    assert!(default < a && a < b);
}

#[test]
fn test_teardown_closes_all_before_joining() {
    let code = compile_source(r#"Config {"c"} TestCase T { Terminal a; a:"q"; }"#);
    let lines = lines(&code);

    let outcome = position(&lines, "Ok(()) => Ok(()),");
    let close = position(&lines, "term.close();");
    let join = position(&lines, "term.join();");
    assert!(outcome < close && close < join);
    assert_eq!(lines[join + 2], "outcome");
}

#[test]
fn test_result_set_is_fetched_not_status_code() {
    let source = r#"
Config { "c" }
TestCase T3 {
    x = :ResultSet("SELECT id FROM t");
    expect_in(x, 1);
}
"#;
    let code = compile_source(source);
    let lines = lines(&code);

    let exec = position(&lines, r#"case_terminal.execute("SELECT id FROM t");"#);
    assert_eq!(
        &lines[exec..exec + 9],
        &[
            r#"case_terminal.execute("SELECT id FROM t");"#,
            r#"case_terminal.store_result("result");"#,
            "case_terminal.wait_finish();",
            r#"let tmp_1 = case_terminal.get_result_set("result")?;"#,
            "let x = tmp_1.clone();",
            "let tmp_2 = x.clone();",
            "let tmp_3 = Value::Int(1);",
            "expect_in(&tmp_2, &tmp_3)?;",
            "Ok(())",
        ]
    );
    assert!(!code.contains("get_last_ret_code"));
}

#[test]
fn test_plain_query_expression_reads_return_code() {
    let code = compile_source(r#"Config {"c"} TestCase T { expect_equal(:"UPDATE t", 0); }"#);
    let lines = lines(&code);

    assert!(lines.contains(&"let tmp_1 = case_terminal.get_last_ret_code();"));
    assert!(lines.contains(&"let tmp_2 = Value::Int(0);"));
    assert!(lines.contains(&"expect_equal(&tmp_1, &tmp_2)?;"));
    assert!(!code.contains("store_result"));
}

#[test]
fn test_named_terminal_uses_scope_result_name() {
    let code = compile_source(
        r#"Config {"c"} TestCase T { Terminal a; Async a: ResultSet("q"); y = a: ResultSet("r"); }"#,
    );
    let lines = lines(&code);

    let first = position(&lines, r#"a.execute("q");"#);
    assert_eq!(lines[first + 1], r#"a.store_result("scope_term_result");"#);
    assert_eq!(lines[first + 2], r#"a.execute("r");"#);

    let second = position(&lines, r#"a.execute("r");"#);
    assert_eq!(lines[second + 1], r#"a.store_result("scope_term_result");"#);
    assert_eq!(lines[second + 2], "a.wait_finish();");
    assert_eq!(
        lines[second + 3],
        r#"let tmp_1 = a.get_result_set("scope_term_result")?;"#
    );
}

#[test]
fn test_assertion_operands_keep_source_order() {
    let code = compile_source(
        r#"Config {"c"} TestCase T { expect_substr("haystack", "hay"); expect_not_in(x, 2.5); }"#,
    );
    let lines = lines(&code);

    assert!(lines.contains(&r#"let tmp_1 = Value::from("haystack");"#));
    assert!(lines.contains(&r#"let tmp_2 = Value::from("hay");"#));
    assert!(lines.contains(&"expect_substr(&tmp_1, &tmp_2)?;"));
    assert!(lines.contains(&"let tmp_3 = x.clone();"));
    assert!(lines.contains(&"let tmp_4 = Value::Float(2.5);"));
    assert!(lines.contains(&"expect_not_in(&tmp_3, &tmp_4)?;"));
}

#[test]
fn test_temporaries_restart_per_case() {
    let code = compile_source(
        r#"Config {"c"} TestCase A { x = 1; y = 2; } TestCase B { z = 3; }"#,
    );
    let lines = lines(&code);

    assert!(lines.contains(&"let tmp_2 = Value::Int(2);"));
    assert!(lines.contains(&"let tmp_1 = Value::Int(3);"));
}

#[test]
fn test_config_round_trips() {
    let config = "host=db;options=\"a\"#b\nsecond line";
    let source = format!("Config {{ \"\"\"{}\"\"\" }} TestCase T {{ :\"q\"; }}", config);
    let code = compile_source(&source);

    let start = code.find("pub const CONFIG").unwrap();
    let expected = format!("pub const CONFIG: &str = r##\"{}\"##;", config);
    assert!(code[start..].starts_with(&expected));
}

#[test]
fn test_query_text_is_escaped() {
    let code = compile_source(r#"Config {"c"} TestCase T { :"SELECT \"x\" FROM t"; }"#);
    assert!(lines(&code).contains(&r#"case_terminal.execute("SELECT \"x\" FROM t");"#));
}

#[test]
fn test_cases_with_same_name_get_distinct_functions() {
    let code = compile_source(r#"Config {"c"} TestCase T { :"1"; } TestCase T { :"2"; }"#);
    let lines = lines(&code);

    assert!(lines.contains(&"pub fn test_1_T(&self) -> CaseResult {"));
    assert!(lines.contains(&"pub fn test_2_T(&self) -> CaseResult {"));
    let first = position(&lines, r#"suite.run("test_1_T", || cases.test_1_T());"#);
    let second = position(&lines, r#"suite.run("test_2_T", || cases.test_2_T());"#);
    assert!(first < second);
}

#[test]
fn test_keyword_terminal_is_raw_identifier() {
    let code = compile_source(r#"Config {"c"} TestCase T { Terminal type; type: "q"; }"#);
    let lines = lines(&code);

    assert!(lines.contains(&r#"let r#type = terminals.start("type", &self.env)?;"#));
    assert!(lines.contains(&r#"r#type.execute("q");"#));
}

#[test]
fn test_self_cannot_be_a_terminal() {
    let err = compile(r#"Config {"c"} TestCase T { Terminal self; }"#).unwrap_err();
    assert!(matches!(
        err,
        CompileError::CodeGen(codegen::CodeGenError::InvalidIdentifier(ref name)) if name == "self"
    ));
}

#[test]
fn test_scaffold_names_are_reserved() {
    for name in ["terminals", "outcome", "CONFIG", "tmp_1", "Ok", "case_terminal"] {
        let source = format!(r#"Config {{"c"}} TestCase T {{ {} = 1; }}"#, name);
        let err = compile(&source).unwrap_err();
        assert!(
            matches!(
                &err,
                CompileError::Lowering(lowering::LoweringError::ReservedName { name: n, case }) if n == name && case == "T"
            ),
            "{} should be reserved, got {:?}",
            name,
            err
        );
    }
}

#[test]
fn test_default_terminal_cannot_be_redeclared() {
    let err = compile(r#"Config {"c"} TestCase Shadow { Terminal case_terminal; :"q"; }"#).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Lowering(lowering::LoweringError::ReservedName { ref name, .. }) if name == "case_terminal"
    ));
}

#[test]
fn test_temp_prefix_alone_is_not_reserved() {
    let code = compile_source(r#"Config {"c"} TestCase T { tmp_x = 1; tmp_ = 2; }"#);
    assert!(lines(&code).contains(&"let tmp_x = tmp_1.clone();"));
}

#[test]
fn test_number_out_of_range() {
    let err = compile(r#"Config {"c"} TestCase T { x = 99999999999999999999; }"#).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Lowering(lowering::LoweringError::NumberOutOfRange(ref n)) if n == "99999999999999999999"
    ));
}
