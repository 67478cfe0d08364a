/*! Implements a reader for the QCIR-G14 circuit format, producing a
quantified Boolean formula by expanding gate definitions at their use sites.

See <http://www.qbflib.org/qcir.pdf> for details on the file format. Gate
sharing is not preserved: a gate referenced twice is expanded twice.
*/
use crate::error::Error;
use crate::syntax::{Var, QBF};
use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::{all_consuming, map, opt},
    multi::{separated_list0, separated_list1},
    sequence::{delimited, pair, separated_pair, terminated},
    IResult,
};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

// A possibly negated reference to a variable or a gate.
type Lit<'a> = (bool, &'a str);

enum Body<'a> {
    // `(v, ..., v; lit)`, the body of a quantifier gate
    Scoped(Vec<&'a str>, Lit<'a>),
    // `(lit, ..., lit)`, the body of an operator gate or a prefix statement
    Args(Vec<Lit<'a>>),
}

enum Statement<'a> {
    // `keyword(body)`, a prefix block or the output statement
    Plain { keyword: &'a str, body: Body<'a> },
    // `name = operator(body)`
    Gate {
        name: &'a str,
        operator: &'a str,
        body: Body<'a>,
    },
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn literal(input: &str) -> IResult<&str, Lit> {
    map(pair(opt(ws(char('-'))), ws(identifier)), |(neg, name)| {
        (neg.is_some(), name)
    })(input)
}

fn body(input: &str) -> IResult<&str, Body> {
    alt((
        map(
            separated_pair(
                separated_list1(char(','), ws(identifier)),
                char(';'),
                literal,
            ),
            |(variables, output)| Body::Scoped(variables, output),
        ),
        map(separated_list0(char(','), literal), Body::Args),
    ))(input)
}

fn parenthesized_body(input: &str) -> IResult<&str, Body> {
    delimited(ws(char('(')), body, ws(char(')')))(input)
}

fn gate_statement(input: &str) -> IResult<&str, Statement> {
    map(
        pair(
            terminated(ws(identifier), char('=')),
            pair(ws(identifier), parenthesized_body),
        ),
        |(name, (operator, body))| Statement::Gate {
            name,
            operator,
            body,
        },
    )(input)
}

fn plain_statement(input: &str) -> IResult<&str, Statement> {
    map(
        pair(ws(identifier), parenthesized_body),
        |(keyword, body)| Statement::Plain { keyword, body },
    )(input)
}

fn statement(input: &str) -> IResult<&str, Statement> {
    all_consuming(alt((gate_statement, plain_statement)))(input)
}

// Resolves a literal against the gates defined so far; an unknown identifier
// denotes an input variable.
fn resolve(lit: Lit, gates: &HashMap<String, QBF>) -> QBF {
    let (negated, name) = lit;
    let formula = gates
        .get(name)
        .cloned()
        .unwrap_or_else(|| QBF::from(Var::from(name)));
    if negated {
        QBF::not(formula)
    } else {
        formula
    }
}

fn plain_variables(body: Body, path: &Path, line: usize) -> Result<Vec<Var>, Error> {
    match body {
        Body::Args(args) => args
            .into_iter()
            .map(|(negated, name)| {
                if negated {
                    Err(Error::parse(path, line, "unexpected negation"))
                } else {
                    Ok(Var::from(name))
                }
            })
            .collect(),
        Body::Scoped(..) => Err(Error::parse(path, line, "unexpected `;`")),
    }
}

/// Reads a QCIR circuit from `reader`, returning the quantified Boolean
/// formula it denotes. The given `path` is used in diagnostics only.
///
/// Gates must be defined before they are referenced; `and`, `or`, `xor`,
/// `ite`, `forall` and `exists` gates are supported, and gate keywords are
/// case-insensitive. An empty `and()` denotes truth, an empty `or()`
/// falsehood, and single-operand gates collapse to their operand.
pub fn read<R: BufRead>(reader: R, path: impl AsRef<Path>) -> Result<QBF, Error> {
    let path = path.as_ref();

    let mut gates: HashMap<String, QBF> = HashMap::new();
    let mut declared: HashSet<String> = HashSet::new();
    let mut blocks: Vec<(bool, Vec<Var>)> = Vec::new();
    let mut output: Option<(bool, String)> = None;
    let mut number = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        number = index + 1;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (_, parsed) = statement(line)
            .map_err(|_| Error::parse(path, number, format!("malformed statement `{}`", line)))?;

        match parsed {
            Statement::Plain { keyword, body } => match keyword.to_ascii_lowercase().as_str() {
                "free" => {
                    if output.is_some() {
                        return Err(Error::parse(path, number, "prefix line after output"));
                    }
                    let variables = plain_variables(body, path, number)?;
                    declared.extend(variables.into_iter().map(|v| v.name().to_string()));
                }
                "forall" | "exists" => {
                    if output.is_some() {
                        return Err(Error::parse(path, number, "prefix line after output"));
                    }
                    let variables = plain_variables(body, path, number)?;
                    declared.extend(variables.iter().map(|v| v.name().to_string()));
                    blocks.push((keyword.eq_ignore_ascii_case("forall"), variables));
                }
                "output" => {
                    if output.is_some() {
                        return Err(Error::parse(path, number, "duplicate output statement"));
                    }
                    match body {
                        Body::Args(args) if args.len() == 1 => {
                            let (negated, name) = args[0];
                            output = Some((negated, name.to_string()));
                        }
                        _ => {
                            return Err(Error::parse(
                                path,
                                number,
                                "expecting a single output literal",
                            ))
                        }
                    }
                }
                other => {
                    return Err(Error::parse(
                        path,
                        number,
                        format!("unexpected statement `{}`", other),
                    ))
                }
            },
            Statement::Gate {
                name,
                operator,
                body,
            } => {
                if output.is_none() {
                    return Err(Error::parse(path, number, "gate statement before output"));
                }
                if gates.contains_key(name) || declared.contains(name) {
                    return Err(Error::parse(
                        path,
                        number,
                        format!("`{}` is defined twice", name),
                    ));
                }
                let formula = match (operator.to_ascii_lowercase().as_str(), body) {
                    ("and", Body::Args(args)) => {
                        QBF::conjoin(args.into_iter().map(|l| resolve(l, &gates)).collect())
                    }
                    ("or", Body::Args(args)) => {
                        QBF::disjoin(args.into_iter().map(|l| resolve(l, &gates)).collect())
                    }
                    ("xor", Body::Args(args)) if args.len() == 2 => {
                        let left = resolve(args[0], &gates);
                        let right = resolve(args[1], &gates);
                        QBF::disjoin(vec![
                            QBF::conjoin(vec![left.clone(), QBF::not(right.clone())]),
                            QBF::conjoin(vec![QBF::not(left), right]),
                        ])
                    }
                    ("ite", Body::Args(args)) if args.len() == 3 => {
                        let condition = resolve(args[0], &gates);
                        let then = resolve(args[1], &gates);
                        let otherwise = resolve(args[2], &gates);
                        QBF::disjoin(vec![
                            QBF::conjoin(vec![condition.clone(), then]),
                            QBF::conjoin(vec![QBF::not(condition), otherwise]),
                        ])
                    }
                    ("forall", Body::Scoped(variables, operand)) => QBF::forall(
                        variables.into_iter().map(Var::from).collect(),
                        resolve(operand, &gates),
                    )
                    .map_err(|e| Error::parse(path, number, e.to_string()))?,
                    ("exists", Body::Scoped(variables, operand)) => QBF::exists(
                        variables.into_iter().map(Var::from).collect(),
                        resolve(operand, &gates),
                    )
                    .map_err(|e| Error::parse(path, number, e.to_string()))?,
                    ("and", _) | ("or", _) | ("xor", _) | ("ite", _) | ("forall", _)
                    | ("exists", _) => {
                        return Err(Error::parse(
                            path,
                            number,
                            format!("malformed operands for `{}`", operator),
                        ))
                    }
                    (other, _) => {
                        return Err(Error::parse(
                            path,
                            number,
                            format!("unsupported gate `{}`", other),
                        ))
                    }
                };
                gates.insert(name.to_string(), formula);
            }
        }
    }

    let (negated, name) = output.ok_or_else(|| {
        Error::parse(path, number.max(1), "missing output statement")
    })?;
    let mut formula = resolve((negated, name.as_str()), &gates);
    for (universal, variables) in blocks.into_iter().rev() {
        formula = if universal {
            QBF::forall(variables, formula)
        } else {
            QBF::exists(variables, formula)
        }
        .map_err(|e| Error::parse(path, number, e.to_string()))?;
    }
    Ok(formula)
}

/// Reads a QCIR circuit from the file at `path`.
pub fn read_file(path: impl AsRef<Path>) -> Result<QBF, Error> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file), path)
}
