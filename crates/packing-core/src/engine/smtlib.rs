use super::{Assignment, SolvingEngine, Verdict};
use crate::model::{EncodingStrategy, Model};
use crate::types::*;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::debug;
use wait_timeout::ChildExt;

/// Extra wall time granted to the process beyond its own time limit, never more than
/// the budget itself.
const GRACE: Duration = Duration::from_secs(2);

pub(crate) fn wall_limit(budget: Duration) -> Duration {
    budget.saturating_add(GRACE.min(budget))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmtSolver {
    /// Supports `(minimize ...)` through its optimisation engine.
    Z3,
    Cvc5,
}

impl SmtSolver {
    fn default_binary(&self) -> &'static str {
        match self {
            Self::Z3 => "z3",
            Self::Cvc5 => "cvc5",
        }
    }
}

/// Runs arithmetic models through an external SMT solver speaking SMT-LIB 2.
#[derive(Debug, Clone)]
pub struct SmtLibEngine {
    solver: SmtSolver,
    binary: PathBuf,
}

impl SmtLibEngine {
    pub fn new(solver: SmtSolver, binary: Option<PathBuf>) -> Self {
        let binary = binary.unwrap_or_else(|| PathBuf::from(solver.default_binary()));
        Self { solver, binary }
    }

    fn command(&self, script: &Path, budget: Duration) -> Command {
        let mut command = Command::new(&self.binary);
        match self.solver {
            SmtSolver::Z3 => {
                command
                    .arg("-smt2")
                    .arg(format!("-t:{}", budget.as_millis().max(1)));
            }
            SmtSolver::Cvc5 => {
                command
                    .arg("--lang")
                    .arg("smt2")
                    .arg("--produce-models")
                    .arg(format!("--tlimit={}", budget.as_millis().max(1)));
            }
        }
        command.arg(script);
        command
    }
}

/// Kills and reaps the solver process on every exit path.
struct ChildGuard(Child);

impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

impl SolvingEngine for SmtLibEngine {
    fn name(&self) -> &str {
        match self.solver {
            SmtSolver::Z3 => "z3",
            SmtSolver::Cvc5 => "cvc5",
        }
    }

    fn supports_minimize(&self) -> bool {
        self.solver == SmtSolver::Z3
    }

    fn supports(&self, family: EncodingStrategy) -> bool {
        family != EncodingStrategy::OrderSat
    }

    fn solve(&mut self, model: &Model, budget: Duration) -> Result<Verdict> {
        let Model::Linear(linear) = model else {
            return Err(PackingError::UnsupportedModel {
                engine: self.name().to_string(),
                family: model.family().to_string(),
            });
        };
        if linear.objective().is_some() && !self.supports_minimize() {
            return Err(PackingError::UnsupportedMode(format!(
                "{} cannot minimise the plate height",
                self.name()
            )));
        }
        if budget.is_zero() {
            return Ok(Verdict::TimedOut);
        }

        let mut script = tempfile::Builder::new()
            .prefix("packing-")
            .suffix(".smt2")
            .tempfile()?;
        script.write_all(linear.to_smtlib().as_bytes())?;
        script.flush()?;
        let output = tempfile::NamedTempFile::new()?;

        let child = self
            .command(script.path(), budget)
            .stdin(Stdio::null())
            .stdout(output.reopen()?)
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => PackingError::Engine(format!(
                    "solver binary '{}' not found",
                    self.binary.display()
                )),
                _ => PackingError::Io(err),
            })?;
        let mut guard = ChildGuard(child);

        match guard.0.wait_timeout(wall_limit(budget))? {
            Some(status) => debug!("{} exited with {status}", self.name()),
            None => {
                debug!("{} exceeded {:.1}s, killing it", self.name(), budget.as_secs_f64());
                return Ok(Verdict::TimedOut);
            }
        }

        let text = std::fs::read_to_string(output.path())?;
        parse_output(&text)
    }
}

/// Interprets solver stdout: a status line, then the `get-value` answer when `sat`.
pub(crate) fn parse_output(text: &str) -> Result<Verdict> {
    let mut lines = text.lines().map(str::trim).filter(|line| !line.is_empty());
    let status = lines.next().unwrap_or("");

    match status {
        "sat" => {
            let rest: Vec<&str> = lines.collect();
            let values = parse_values(&rest.join(" "))?;
            Ok(Verdict::Feasible(Assignment::Named(values)))
        }
        "unsat" => Ok(Verdict::Infeasible),
        "unknown" | "timeout" | "" => Ok(Verdict::TimedOut),
        other => Err(PackingError::Engine(format!(
            "unexpected solver output '{other}'"
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Sexp {
    Atom(String),
    List(Vec<Sexp>),
}

fn parse_values(text: &str) -> Result<BTreeMap<String, i64>> {
    let mut tokens = tokenize(text).into_iter().peekable();
    while tokens.peek().is_some() {
        let Sexp::List(entries) = parse_sexp(&mut tokens)? else {
            continue;
        };
        if let Some(values) = value_list(&entries) {
            return values;
        }
    }
    Err(PackingError::Engine(
        "solver reported sat without a get-value answer".to_string(),
    ))
}

/// Reads `((name value) ...)`. `None` when the list has another shape, e.g. `(error ...)`.
fn value_list(entries: &[Sexp]) -> Option<Result<BTreeMap<String, i64>>> {
    let pairs: Option<Vec<(&str, &Sexp)>> = entries
        .iter()
        .map(|entry| match entry {
            Sexp::List(pair) => match pair.as_slice() {
                [Sexp::Atom(name), value] => Some((name.as_str(), value)),
                _ => None,
            },
            Sexp::Atom(_) => None,
        })
        .collect();

    let pairs = pairs?;
    Some(
        pairs
            .into_iter()
            .map(|(name, value)| Ok((name.to_string(), value_of(name, value)?)))
            .collect(),
    )
}

fn value_of(name: &str, value: &Sexp) -> Result<i64> {
    let parsed = match value {
        Sexp::Atom(atom) if atom == "true" => Some(1),
        Sexp::Atom(atom) if atom == "false" => Some(0),
        Sexp::Atom(atom) => atom.parse().ok(),
        Sexp::List(items) => match items.as_slice() {
            [Sexp::Atom(minus), Sexp::Atom(atom)] if minus == "-" => {
                atom.parse::<i64>().ok().map(|v| -v)
            }
            _ => None,
        },
    };
    parsed.ok_or_else(|| {
        PackingError::Engine(format!("cannot read value of '{name}': {value:?}"))
    })
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut atom = String::new();
    for c in text.chars() {
        match c {
            '(' | ')' => {
                if !atom.is_empty() {
                    tokens.push(std::mem::take(&mut atom));
                }
                tokens.push(c.to_string());
            }
            c if c.is_whitespace() => {
                if !atom.is_empty() {
                    tokens.push(std::mem::take(&mut atom));
                }
            }
            c => atom.push(c),
        }
    }
    if !atom.is_empty() {
        tokens.push(atom);
    }
    tokens
}

fn parse_sexp(tokens: &mut std::iter::Peekable<std::vec::IntoIter<String>>) -> Result<Sexp> {
    match tokens.next() {
        Some(token) if token == "(" => {
            let mut items = Vec::new();
            loop {
                match tokens.peek().map(String::as_str) {
                    Some(")") => {
                        tokens.next();
                        return Ok(Sexp::List(items));
                    }
                    Some(_) => items.push(parse_sexp(tokens)?),
                    None => {
                        return Err(PackingError::Engine(
                            "unbalanced parentheses in solver output".to_string(),
                        ))
                    }
                }
            }
        }
        Some(token) if token == ")" => Err(PackingError::Engine(
            "unbalanced parentheses in solver output".to_string(),
        )),
        Some(token) => Ok(Sexp::Atom(token)),
        None => Err(PackingError::Engine("empty solver output".to_string())),
    }
}
