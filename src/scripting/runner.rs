//! Script runner
//!
//! Executes a test script line by line against a [`ToolInvoker`]. Each
//! non-blank line is one command; the first failure aborts the run with the
//! offending line number attached.

use std::fmt;
use std::time::Duration;

use colored::Colorize;
use futures_util::future::{BoxFuture, FutureExt};
use serde_json::Value;
use tracing::{debug, warn};

use super::assertions;
use super::coerce::build_arguments;
use super::command::Command;
use super::extract::{extract, scalar_string, RAW_RESPONSE};
use super::invoker::{InputSource, ToolInvoker};
use super::lexer::{preprocess_line, tokenize, Heredoc, HeredocLine};
use super::vars::VariableStore;
use crate::common::{Error, Result};
use crate::mcp::{content_fragments, describe_fragment, flatten_text, is_error_result};

/// Operand prefix that is resolved against the last result
const PATH_OPERAND: &str = "$.";

/// Mutable state of one script run
#[derive(Debug, Default)]
pub struct RunnerState {
    pub variables: VariableStore,
    /// Last successful tool result, verbatim
    pub last_raw: Option<Value>,
    /// Concatenated text fragments of the last result, or the error message
    /// captured by `expect_error`
    pub last_text: String,
    /// Pretty-printed last result, or the error message captured by
    /// `expect_error`
    pub last_response: String,
    pub executed: usize,
    pub passed: usize,
}

impl RunnerState {
    fn record(&mut self, result: Value) -> Result<()> {
        self.last_text = flatten_text(&result);
        self.last_response = serde_json::to_string_pretty(&result)?;
        self.last_raw = Some(result);
        Ok(())
    }

    fn record_error(&mut self, message: String) {
        self.last_text = message.clone();
        self.last_response = message;
    }

    /// Resolve a `set_var` path to its string form
    pub fn resolve(&self, path: &str) -> Result<String> {
        if path == RAW_RESPONSE {
            if self.last_raw.is_none() && self.last_response.is_empty() {
                return Err(no_previous_response());
            }
            return Ok(self.last_response.clone());
        }

        let root = self.last_raw.as_ref().ok_or_else(no_previous_response)?;
        extract(root, path).map(scalar_string)
    }

    /// An assertion operand, with `$.path` operands resolved
    fn operand(&self, token: &str) -> Result<String> {
        if token.starts_with(PATH_OPERAND) {
            self.resolve(token)
        } else {
            Ok(token.to_string())
        }
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            executed: self.executed,
            passed: self.passed,
        }
    }
}

fn no_previous_response() -> Error {
    Error::Path("no previous response available".to_string())
}

/// Counters reported at the end of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub executed: usize,
    pub passed: usize,
}

impl RunSummary {
    pub fn failed(&self) -> usize {
        self.executed - self.passed
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Test Summary: {} commands executed, {} passed, {} failed",
            self.executed,
            self.passed,
            self.failed()
        )
    }
}

/// Runs scripts against one tool server
pub struct Runner<I, R> {
    invoker: I,
    input: R,
    state: RunnerState,
    raw: bool,
}

impl<I: ToolInvoker, R: InputSource> Runner<I, R> {
    pub fn new(invoker: I, input: R) -> Self {
        Self {
            invoker,
            input,
            state: RunnerState::default(),
            raw: false,
        }
    }

    /// Print the full JSON of every tool result
    pub fn raw_output(mut self, raw: bool) -> Self {
        self.raw = raw;
        self
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    pub fn input(&self) -> &R {
        &self.input
    }

    pub fn into_invoker(self) -> I {
        self.invoker
    }

    /// Execute a whole script, printing the summary either way
    ///
    /// Every run starts from a fresh [`RunnerState`].
    pub async fn run(&mut self, script: &str) -> Result<RunSummary> {
        self.state = RunnerState::default();
        let outcome = self.run_lines(script).await;
        let summary = self.state.summary();
        println!("\n{}", summary);
        outcome.map(|()| summary)
    }

    async fn run_lines(&mut self, script: &str) -> Result<()> {
        let mut heredoc: Option<Heredoc> = None;

        for (idx, raw) in script.lines().enumerate() {
            let line_no = idx + 1;

            if let Some(open) = heredoc.as_mut() {
                if let HeredocLine::Closed(text) = open.feed(raw) {
                    if let Some(done) = heredoc.take() {
                        self.step(&done.prefix, Some(text), done.start_line).await?;
                    }
                }
                continue;
            }

            let cleaned = preprocess_line(raw);
            if cleaned.is_empty() {
                continue;
            }

            match Heredoc::open(cleaned, line_no) {
                Ok(Some(open)) => {
                    debug!(line = line_no, marker = %open.marker, "heredoc opened");
                    heredoc = Some(open);
                }
                Ok(None) => self.step(cleaned, None, line_no).await?,
                Err(e) => {
                    self.state.executed += 1;
                    return Err(self.fail(e, line_no));
                }
            }
        }

        match heredoc {
            Some(open) => {
                self.state.executed += 1;
                let line_no = open.start_line;
                Err(self.fail(open.unterminated(), line_no))
            }
            None => Ok(()),
        }
    }

    /// Parse and execute one command, updating the counters
    async fn step(&mut self, line: &str, heredoc: Option<String>, line_no: usize) -> Result<()> {
        self.state.executed += 1;

        let line = self.state.variables.interpolate(line);
        let command = match tokenize(&line).and_then(|mut tokens| {
            tokens.extend(heredoc);
            Command::parse(&tokens)
        }) {
            Ok(command) => command,
            Err(e) => return Err(self.fail(e, line_no)),
        };

        debug!(line = line_no, command = command.name(), "executing");
        match self.execute(&command).await {
            Ok(()) => {
                self.state.passed += 1;
                Ok(())
            }
            Err(e) => Err(self.fail(e, line_no)),
        }
    }

    fn fail(&self, error: Error, line_no: usize) -> Error {
        let error = error.at_line(line_no);
        println!("{} {}", "✗".red(), error);
        error
    }

    fn execute<'a>(&'a mut self, command: &'a Command) -> BoxFuture<'a, Result<()>> {
        async move {
            match command {
                Command::CallTool { name, args } => self.call_tool(name, args).await,

                Command::SetVar { name, path } => {
                    let value = self.state.resolve(path)?;
                    println!("{} Variable set: {} = {}", "✓".green(), name, value);
                    self.state.variables.set(name, value);
                    Ok(())
                }

                Command::InputVar { name, prompt } => {
                    let prompt = prompt
                        .clone()
                        .unwrap_or_else(|| format!("Enter value for {}: ", name));
                    match self.input.read_line(&prompt).await? {
                        Some(value) => self.state.variables.set(name, value),
                        None => warn!(variable = %name, "end of input, variable left unset"),
                    }
                    Ok(())
                }

                Command::AssertContains { a, b } => {
                    let a = self.state.operand(a)?;
                    let message = match b {
                        None => assertions::contains(
                            &self.state.last_text,
                            &self.state.last_response,
                            None,
                            &a,
                        )?,
                        Some(b) => {
                            let b = self.state.operand(b)?;
                            assertions::contains("", "", Some(a.as_str()), &b)?
                        }
                    };
                    passed(&message);
                    Ok(())
                }

                Command::AssertEquals { a, b } => {
                    let a = self.state.operand(a)?;
                    let b = b.as_deref().map(|b| self.state.operand(b)).transpose()?;
                    let message = assertions::equals(
                        &self.state.last_text,
                        &self.state.last_response,
                        &a,
                        b.as_deref(),
                    )?;
                    passed(&message);
                    Ok(())
                }

                Command::AssertNumber { value } => {
                    passed(&assertions::is_number(&self.state.operand(value)?)?);
                    Ok(())
                }

                Command::AssertGreaterThan { a, b } => {
                    let a = self.state.operand(a)?;
                    let b = self.state.operand(b)?;
                    passed(&assertions::greater_than(&a, &b)?);
                    Ok(())
                }

                Command::AssertStringLength { value, min, max } => {
                    let value = self.state.operand(value)?;
                    passed(&assertions::string_length(&value, *min, *max)?);
                    Ok(())
                }

                Command::Timeout { ms, inner } => {
                    match tokio::time::timeout(Duration::from_millis(*ms), self.execute(inner)).await {
                        Ok(result) => result,
                        Err(_) => Err(Error::Timeout(*ms)),
                    }
                }

                Command::ExpectError { inner } => match self.execute(inner).await {
                    Ok(()) => Err(Error::Assertion(
                        "expected error but command succeeded".to_string(),
                    )),
                    Err(e) => {
                        let message = e.into_inner().to_string();
                        println!("{} Expected error: {}", "✓".green(), message);
                        self.state.record_error(message);
                        Ok(())
                    }
                },
            }
        }
        .boxed()
    }

    async fn call_tool(&mut self, name: &str, args: &[String]) -> Result<()> {
        let tools = self.invoker.list_tools().await?;
        let tool = tools
            .into_iter()
            .find(|t| t.name == name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;

        let (arguments, surplus) = build_arguments(&tool, args);
        if !surplus.is_empty() {
            warn!(tool = %name, ?surplus, "ignoring arguments with no matching property");
        }

        println!(
            "{} {} {}",
            "Executing:".cyan(),
            name.bold(),
            Value::Object(arguments.clone())
        );
        let result = self.invoker.call_tool(name, arguments).await?;

        for fragment in content_fragments(&result) {
            println!("  {} {}", "Response:".dimmed(), describe_fragment(fragment));
        }
        if is_error_result(&result) {
            println!("  {}", "Tool reported an error (isError: true)".yellow());
        }
        self.state.record(result)?;
        if self.raw {
            println!("{}\n{}", "Raw Response:".dimmed(), self.state.last_response);
        }
        Ok(())
    }
}

fn passed(message: &str) {
    println!("{} Assertion passed: {}", "✓".green(), message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scripting::testing::{text_result, MockInvoker, ScriptedInput};
    use serde_json::json;

    fn runner(invoker: MockInvoker) -> Runner<MockInvoker, ScriptedInput> {
        Runner::new(invoker, ScriptedInput::default())
    }

    fn echo_server() -> MockInvoker {
        MockInvoker::new()
            .tool("echo", &[("message", "string")], text_result("Echo: hello"))
            .tool("add", &[("a", "integer"), ("b", "integer")], json!({ "sum": 5 }))
            .tool(
                "describe",
                &[],
                json!({
                    "id": 42,
                    "name": "tester",
                    "nothing": null,
                    "nested": { "key": "value", "list": ["a", "b", "c"] }
                }),
            )
            .tool(
                "fail",
                &[],
                json!({ "content": [{ "type": "text", "text": "boom" }], "isError": true }),
            )
    }

    #[tokio::test]
    async fn test_all_success_counts() {
        let mut runner = runner(echo_server());
        let script = "\
# leading comment

call_tool echo hello
// another comment
assert_contains Echo
assert_equals \"Echo: hello\"   # trailing comment
";
        let summary = runner.run(script).await.unwrap();
        assert_eq!(summary, RunSummary { executed: 3, passed: 3 });
        assert_eq!(summary.failed(), 0);
        assert_eq!(
            summary.to_string(),
            "Test Summary: 3 commands executed, 3 passed, 0 failed"
        );
    }

    #[tokio::test]
    async fn test_named_args_and_path_operand() {
        let mut runner = runner(echo_server());
        runner
            .run("call_tool add a:2 b:3\nassert_equals $.sum 5")
            .await
            .unwrap();

        let (tool, args) = &runner.invoker().calls[0];
        assert_eq!(tool, "add");
        assert_eq!(Value::Object(args.clone()), json!({ "a": 2, "b": 3 }));
    }

    #[tokio::test]
    async fn test_unterminated_heredoc() {
        let mut runner = runner(echo_server());
        let err = runner
            .run("call_tool echo hi\ncall_tool echo message <<EOF\nsome text\n")
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "PARSE_ERROR");
        assert_eq!(
            err.to_string(),
            "line 2: parse error: heredoc marker 'EOF' not found"
        );
        assert_eq!(runner.state().summary(), RunSummary { executed: 2, passed: 1 });
    }

    #[tokio::test]
    async fn test_heredoc_is_one_raw_argument() {
        let mut runner = runner(echo_server());
        let script = "\
call_tool echo <<END
line one # not a comment
  // still text $NOT_A_VAR

END
assert_contains Echo
";
        let summary = runner.run(script).await.unwrap();
        assert_eq!(summary.executed, 2);

        let (_, args) = &runner.invoker().calls[0];
        assert_eq!(
            args["message"],
            json!("line one # not a comment\n  // still text $NOT_A_VAR\n")
        );
    }

    #[tokio::test]
    async fn test_heredoc_error_reports_opening_line() {
        let mut runner = runner(echo_server());
        let err = runner
            .run("\ncall_tool missing <<EOF\nbody\nEOF\n")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "line 2: tool not found: missing");
    }

    #[tokio::test]
    async fn test_assert_gt() {
        let mut runner = runner(echo_server());
        runner.run("assert_gt 10 5").await.unwrap();

        let err = runner.run("assert_gt 10 5\nassert_gt 5 10").await.unwrap_err();
        assert_eq!(err.kind(), "ASSERTION_ERROR");
        assert!(err.to_string().starts_with("line 2: assertion failed"), "{}", err);

        let err = runner.run("assert_gt 10 10").await.unwrap_err();
        assert!(err.to_string().starts_with("line 1:"), "{}", err);
    }

    #[tokio::test]
    async fn test_path_out_of_bounds() {
        let mut runner = runner(echo_server());
        let err = runner
            .run("call_tool describe\nset_var x nested.list.99")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "PATH_ERROR");
        assert!(err.to_string().contains("out of bounds"), "{}", err);
        assert!(runner.state().variables.get("x").is_none());
    }

    #[tokio::test]
    async fn test_expect_error_captures_message() {
        let mut runner = runner(echo_server());
        let summary = runner
            .run("expect_error call_tool missing_tool\nassert_contains \"tool not found\"")
            .await
            .unwrap();

        assert_eq!(summary.passed, 2);
        assert_eq!(runner.state().last_text, "tool not found: missing_tool");
        assert_eq!(runner.state().last_response, "tool not found: missing_tool");
    }

    #[tokio::test]
    async fn test_expect_error_on_success_fails() {
        let mut runner = runner(echo_server());
        let err = runner.run("expect_error call_tool echo hi").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 1: assertion failed: expected error but command succeeded"
        );
    }

    #[tokio::test]
    async fn test_is_error_result_is_recorded() {
        let mut runner = runner(echo_server());
        let summary = runner
            .run("call_tool fail\nassert_contains boom\nassert_equals $.isError true")
            .await
            .unwrap();
        assert_eq!(summary, RunSummary { executed: 3, passed: 3 });
        assert_eq!(runner.state().last_text, "boom");

        let err = runner.run("expect_error call_tool fail").await.unwrap_err();
        assert!(err.to_string().contains("expected error but command succeeded"), "{}", err);
    }

    #[tokio::test]
    async fn test_each_run_starts_fresh() {
        let mut runner = Runner::new(echo_server(), ScriptedInput::new(&["v"]));
        runner.run("input_var X\ncall_tool echo hi").await.unwrap();
        assert_eq!(runner.state().variables.get("X"), Some("v"));

        let err = runner.run("assert_equals $X v").await.unwrap_err();
        assert!(err.to_string().starts_with("line 1: assertion failed"), "{}", err);
        assert_eq!(runner.state().summary(), RunSummary { executed: 1, passed: 0 });
        assert!(runner.state().variables.is_empty());
        assert!(runner.state().last_raw.is_none());
    }

    #[tokio::test]
    async fn test_set_var_and_interpolation() {
        let mut runner = runner(echo_server());
        let script = "\
call_tool describe
set_var NAME name
set_var ID $.id
set_var RAW rawResponse
assert_equals $NAME tester
assert_gt $ID 41
assert_string_length $NAME 6 6
";
        runner.run(script).await.unwrap();

        let state = runner.state();
        assert_eq!(state.variables.get("ID"), Some("42"));
        assert_eq!(state.variables.get("RAW"), Some(state.last_response.as_str()));
    }

    #[tokio::test]
    async fn test_null_path_is_not_found() {
        let mut runner = runner(echo_server());
        let err = runner
            .run("call_tool describe\nset_var x nothing")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not found"), "{}", err);
    }

    #[tokio::test]
    async fn test_set_var_without_result() {
        let mut runner = runner(echo_server());
        let err = runner.run("set_var x id").await.unwrap_err();
        assert_eq!(err.kind(), "PATH_ERROR");
        assert!(err.to_string().contains("no previous response"));
    }

    #[tokio::test]
    async fn test_input_var() {
        let mut runner = Runner::new(echo_server(), ScriptedInput::new(&["  secret value "]));
        runner
            .run("input_var TOKEN\ninput_var OTHER Other please:\nassert_equals \"$TOKEN\" \"  secret value \"")
            .await
            .unwrap();

        assert_eq!(runner.state().variables.get("TOKEN"), Some("  secret value "));
        // input ran out for the second prompt
        assert!(runner.state().variables.get("OTHER").is_none());
        assert_eq!(
            runner.input().prompts,
            vec!["Enter value for TOKEN: ".to_string(), "Other please:".to_string()]
        );
    }

    #[tokio::test]
    async fn test_timeout() {
        let invoker = echo_server().slow_tool("slow", Duration::from_millis(500), text_result("late"));
        let mut runner = runner(invoker);

        let err = runner.run("timeout 20 call_tool slow").await.unwrap_err();
        assert_eq!(err.kind(), "TIMEOUT");
        assert_eq!(err.to_string(), "line 1: operation timed out after 20 ms");

        runner
            .run("expect_error timeout 20 call_tool slow\nassert_equals \"operation timed out after 20 ms\"")
            .await
            .unwrap();

        runner.run("timeout 5000 call_tool echo hi").await.unwrap();
    }

    #[tokio::test]
    async fn test_surplus_arguments_ignored() {
        let mut runner = runner(echo_server());
        runner.run("call_tool echo hi extra words").await.unwrap();
        let (_, args) = &runner.invoker().calls[0];
        assert_eq!(Value::Object(args.clone()), json!({ "message": "hi" }));
    }

    #[tokio::test]
    async fn test_failure_stops_the_run() {
        let mut runner = runner(echo_server());
        let err = runner
            .run("call_tool echo hi\nfrobnicate\ncall_tool echo again")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "line 2: unknown command: frobnicate");
        assert_eq!(runner.state().summary(), RunSummary { executed: 2, passed: 1 });
        assert_eq!(runner.invoker().calls.len(), 1);
    }

    #[tokio::test]
    async fn test_quote_errors_are_tagged() {
        let mut runner = runner(echo_server());
        let err = runner.run("\n\nassert_equals \"open").await.unwrap_err();
        assert_eq!(err.to_string(), "line 3: parse error: unterminated \" quote");
    }
}
