//! Arithmetic commands: add, sub, mul, div

use crate::command::{Command, CommandContext, CommandOutput, CommandRegistry};
use crate::commands::usage;
use crate::error::{ShellError, ShellResult};
use crate::script::value::{ArithOp, Value};

/// Register arithmetic commands
pub fn register(registry: &mut CommandRegistry) {
    registry.register(ArithCommand { name: "add", op: ArithOp::Add, min_args: 1 });
    registry.register(ArithCommand { name: "sub", op: ArithOp::Sub, min_args: 2 });
    registry.register(ArithCommand { name: "mul", op: ArithOp::Mul, min_args: 1 });
    registry.register(ArithCommand { name: "div", op: ArithOp::Div, min_args: 2 });
}

/// One left-to-right fold over numeric operands.
struct ArithCommand {
    name: &'static str,
    op: ArithOp,
    min_args: usize,
}

impl Command for ArithCommand {
    fn name(&self) -> &str {
        self.name
    }

    fn help(&self) -> &str {
        match self.op {
            ArithOp::Add => "add <n1> <n2> [<n3> …]\n  Add numbers (integers/floats)",
            ArithOp::Sub => "sub <n1> <n2> [<n3> …]\n  Subtract numbers (n1 - n2 - n3 …)",
            ArithOp::Mul => "mul <n1> <n2> [<n3> …]\n  Multiply numbers",
            ArithOp::Div => "div <n1> <n2> [<n3> …]\n  Divide numbers (n1 / n2 / n3 …)",
        }
    }

    fn execute(&self, _ctx: &mut CommandContext<'_>, args: &[String]) -> ShellResult<CommandOutput> {
        if args.len() < self.min_args {
            return Err(usage(self.name, self.help()));
        }
        let operands = args
            .iter()
            .map(|arg| match Value::parse_literal(arg) {
                Value::Str(_) => Err(ShellError::handler(self.name, format!("not a number: {arg}"))),
                number => Ok(number),
            })
            .collect::<ShellResult<Vec<Value>>>()?;
        let result = Value::fold(self.op, &operands).map_err(|e| ShellError::handler(self.name, e))?;
        Ok(CommandOutput::text(result.to_string()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::commands::test_support::{output, shell};

    #[test]
    fn integer_and_float_results() {
        assert_eq!(output("add 1 2 3"), vec!["6"]);
        assert_eq!(output("sub 10 2.5"), vec!["7.5"]);
        assert_eq!(output("mul 2 0.5"), vec!["1"]);
        assert_eq!(output("div 9 2"), vec!["4.5"]);
        assert_eq!(output("div 8 2"), vec!["4"]);
    }

    #[test]
    fn variables_as_operands() {
        assert_eq!(output("let a = 4\nmul a $a"), vec!["16"]);
    }

    #[test]
    fn division_by_zero_fails() {
        let (_dir, mut it) = shell();
        it.run_script("div 1 0");
        assert_eq!(it.console().errors(), ["div: division by zero"]);
        assert_eq!(it.session().vars.status(), 1);
    }

    #[test]
    fn non_numbers_rejected() {
        let (_dir, mut it) = shell();
        it.run_script("add 1 pear\nsub 1");
        assert_eq!(it.console().errors(), ["add: not a number: pear", "sub: usage: sub <n1> <n2> [<n3> …]"]);
    }
}
