//! Problem-file parsing for the command-line driver.
//!
//! One directive per line; `#` starts a comment and blank lines are skipped:
//!
//! ```text
//! clock 10.0
//! op    add 1 3.5 -1
//! op    mul 2 0.0 1
//! stmt  t0  add
//! stmt  t1  mul t0
//! ```
//!
//! `op` fields are name, latency (cycles), delay (time units), and limit
//! (negative = unlimited). `stmt` fields are name, kind, and the names of
//! the statements whose values it reads.

use rustc_hash::FxHashMap;

use crate::graph::Dfg;
use crate::models::Op;

/// A fully parsed scheduling problem.
#[derive(Debug, PartialEq)]
pub struct Problem {
    pub ops: Vec<Op>,
    pub dfg: Dfg,
    pub clock_period: f64,
}

/// Errors produced while reading a problem file.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    /// No `clock` directive in the file.
    MissingClock,
    /// A second `clock` directive (line number).
    DuplicateClock(usize),
    /// Unrecognized directive (line number, directive).
    UnknownDirective(usize, String),
    /// Too few fields for the directive (line number).
    MalformedLine(usize),
    /// A field failed numeric parsing or range checks (line number, field).
    BadNumber(usize, String),
    /// Redefinition of an op name (line number, name).
    DuplicateOp(usize, String),
    /// Redefinition of a statement name (line number, name).
    DuplicateStmt(usize, String),
    /// Statement references an op never declared (line number, name).
    UnknownOp(usize, String),
    /// Statement depends on a name not yet declared (line number, name).
    UnknownDep(usize, String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingClock => write!(f, "no clock directive in problem file"),
            Self::DuplicateClock(line) => write!(f, "line {}: duplicate clock directive", line),
            Self::UnknownDirective(line, word) => {
                write!(f, "line {}: unknown directive {:?}", line, word)
            }
            Self::MalformedLine(line) => write!(f, "line {}: too few fields", line),
            Self::BadNumber(line, field) => {
                write!(f, "line {}: bad numeric field {:?}", line, field)
            }
            Self::DuplicateOp(line, name) => {
                write!(f, "line {}: op {:?} already declared", line, name)
            }
            Self::DuplicateStmt(line, name) => {
                write!(f, "line {}: statement {:?} already declared", line, name)
            }
            Self::UnknownOp(line, name) => write!(f, "line {}: unknown op {:?}", line, name),
            Self::UnknownDep(line, name) => {
                write!(f, "line {}: unknown dependency {:?}", line, name)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse a problem description into an op catalog, a graph, and the clock.
pub fn parse_problem(text: &str) -> Result<Problem, ParseError> {
    let mut clock: Option<f64> = None;
    let mut ops: Vec<Op> = Vec::new();
    let mut op_ids: FxHashMap<String, usize> = FxHashMap::default();
    let mut dfg = Dfg::new();
    let mut stmt_ids: FxHashMap<String, usize> = FxHashMap::default();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let content = raw.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }

        let mut fields = content.split_whitespace();
        let directive = fields.next().unwrap_or("");
        match directive {
            "clock" => {
                if clock.is_some() {
                    return Err(ParseError::DuplicateClock(line));
                }
                let field = fields.next().ok_or(ParseError::MalformedLine(line))?;
                let period = parse_f64(line, field)?;
                if period < 0.0 {
                    return Err(ParseError::BadNumber(line, field.to_string()));
                }
                clock = Some(period);
            }
            "op" => {
                let name = fields.next().ok_or(ParseError::MalformedLine(line))?;
                let latency_field = fields.next().ok_or(ParseError::MalformedLine(line))?;
                let delay_field = fields.next().ok_or(ParseError::MalformedLine(line))?;
                let limit_field = fields.next().ok_or(ParseError::MalformedLine(line))?;

                if op_ids.contains_key(name) {
                    return Err(ParseError::DuplicateOp(line, name.to_string()));
                }
                let latency = parse_i32(line, latency_field)?;
                if latency < 0 {
                    return Err(ParseError::BadNumber(line, latency_field.to_string()));
                }
                let delay = parse_f64(line, delay_field)?;
                if delay < 0.0 {
                    return Err(ParseError::BadNumber(line, delay_field.to_string()));
                }
                let limit = parse_i32(line, limit_field)?;

                op_ids.insert(name.to_string(), ops.len());
                ops.push(Op::new(name, latency, delay, limit));
            }
            "stmt" => {
                let name = fields.next().ok_or(ParseError::MalformedLine(line))?;
                let op_name = fields.next().ok_or(ParseError::MalformedLine(line))?;

                if stmt_ids.contains_key(name) {
                    return Err(ParseError::DuplicateStmt(line, name.to_string()));
                }
                let &op = op_ids
                    .get(op_name)
                    .ok_or_else(|| ParseError::UnknownOp(line, op_name.to_string()))?;

                let idx = dfg.add_stmt(op);
                stmt_ids.insert(name.to_string(), idx);

                for dep_name in fields {
                    let &dep = stmt_ids
                        .get(dep_name)
                        .ok_or_else(|| ParseError::UnknownDep(line, dep_name.to_string()))?;
                    dfg.add_edge(dep, idx);
                }
            }
            other => {
                return Err(ParseError::UnknownDirective(line, other.to_string()));
            }
        }
    }

    let clock_period = clock.ok_or(ParseError::MissingClock)?;
    Ok(Problem {
        ops,
        dfg,
        clock_period,
    })
}

fn parse_f64(line: usize, field: &str) -> Result<f64, ParseError> {
    field
        .parse()
        .map_err(|_| ParseError::BadNumber(line, field.to_string()))
}

fn parse_i32(line: usize, field: &str) -> Result<i32, ParseError> {
    field
        .parse()
        .map_err(|_| ParseError::BadNumber(line, field.to_string()))
}
