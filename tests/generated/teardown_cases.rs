// Generated by case-compiler. Do not edit.
#![allow(unused_variables, non_snake_case)]

use std::sync::Arc;

use case_compiler::runtime::prelude::*;

pub const CONFIG: &str = r#"host=mem;db=cases"#;

pub struct GeneratedCases {
    env: CaseEnv,
}

impl GeneratedCases {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            env: CaseEnv::new(CONFIG, connector),
        }
    }

    pub fn test_1_Passing(&self) -> CaseResult {
        let terminals = TerminalRegistry::new();
        let outcome = match guarded(|| -> CaseResult {
            let case_terminal = terminals.start("case_terminal", &self.env)?;
            let a = terminals.start("a", &self.env)?;
            let b = terminals.start("b", &self.env)?;
            a.execute("INSERT INTO t VALUES (1)");
            a.wait_finish();
            b.execute("UPDATE t SET id = 2");
            case_terminal.execute("SELECT id FROM t");
            case_terminal.store_result("result");
            case_terminal.wait_finish();
            let tmp_1 = case_terminal.get_result_set("result")?;
            let rows = tmp_1.clone();
            let tmp_2 = rows.clone();
            let tmp_3 = Value::from("[[1]]");
            expect_str_equal(&tmp_2, &tmp_3)?;
            a.execute("SELECT 1");
            a.wait_finish();
            let tmp_4 = a.get_last_ret_code();
            let tmp_5 = Value::Int(0);
            expect_equal(&tmp_4, &tmp_5)?;
            Ok(())
        }) {
            Err(CaseFailure::Assertion(failure)) => fail_assertion("test_1_Passing", failure),
            Err(failure) => fail_unexpected("test_1_Passing", failure),
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

    pub fn test_2_FailsAssertion(&self) -> CaseResult {
        let terminals = TerminalRegistry::new();
        let outcome = match guarded(|| -> CaseResult {
            let case_terminal = terminals.start("case_terminal", &self.env)?;
            let a = terminals.start("a", &self.env)?;
            a.execute("DELETE FROM missing");
            a.wait_finish();
            let tmp_1 = a.get_last_ret_code();
            let tmp_2 = Value::Int(0);
            expect_equal(&tmp_1, &tmp_2)?;
            case_terminal.execute("never runs");
            case_terminal.wait_finish();
            Ok(())
        }) {
            Err(CaseFailure::Assertion(failure)) => fail_assertion("test_2_FailsAssertion", failure),
            Err(failure) => fail_unexpected("test_2_FailsAssertion", failure),
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

    pub fn test_3_RuntimeError(&self) -> CaseResult {
        let terminals = TerminalRegistry::new();
        let outcome = match guarded(|| -> CaseResult {
            let case_terminal = terminals.start("case_terminal", &self.env)?;
            case_terminal.execute("SELECT 1");
            case_terminal.wait_finish();
            let tmp_1 = case_terminal.get_last_ret_code();
            let tmp_2 = Value::Int(1);
            expect_in(&tmp_1, &tmp_2)?;
            Ok(())
        }) {
            Err(CaseFailure::Assertion(failure)) => fail_assertion("test_3_RuntimeError", failure),
            Err(failure) => fail_unexpected("test_3_RuntimeError", failure),
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

    pub fn test_4_CrashedTerminal(&self) -> CaseResult {
        let terminals = TerminalRegistry::new();
        let outcome = match guarded(|| -> CaseResult {
            let case_terminal = terminals.start("case_terminal", &self.env)?;
            let a = terminals.start("a", &self.env)?;
            a.execute("SELECT boom");
            a.wait_finish();
            a.execute("q");
            a.wait_finish();
            let tmp_1 = a.get_last_ret_code();
            let tmp_2 = Value::Int(0);
            expect_equal(&tmp_1, &tmp_2)?;
            Ok(())
        }) {
            Err(CaseFailure::Assertion(failure)) => fail_assertion("test_4_CrashedTerminal", failure),
            Err(failure) => fail_unexpected("test_4_CrashedTerminal", failure),
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
    suite.run("test_1_Passing", || cases.test_1_Passing());
    suite.run("test_2_FailsAssertion", || cases.test_2_FailsAssertion());
    suite.run("test_3_RuntimeError", || cases.test_3_RuntimeError());
    suite.run("test_4_CrashedTerminal", || cases.test_4_CrashedTerminal());
    suite.finish()
}
