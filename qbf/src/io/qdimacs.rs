/*! Implements a reader and a writer for the QDIMACS file format.

See <http://www.qbflib.org/qdimacs.html> for details on the file format. The
writer requires its input to be in prenex conjunctive normal form.
*/
use crate::error::Error;
use crate::syntax::{Var, QBF};
use itertools::Itertools;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Prefix,
    Matrix,
}

// Collects the tokens of a prefix or clause line: the tokens before the
// terminating `0`, of which there must be at least one.
fn statement_tokens<'a>(
    tokens: impl Iterator<Item = &'a str>,
    path: &Path,
    line: usize,
) -> Result<Vec<&'a str>, Error> {
    let mut items = Vec::new();
    let mut terminated = false;
    for token in tokens {
        if terminated {
            return Err(Error::parse(path, line, "token after terminating 0"));
        }
        if token == "0" {
            terminated = true;
        } else {
            items.push(token);
        }
    }
    if !terminated {
        return Err(Error::parse(path, line, "missing terminating 0"));
    }
    if items.is_empty() {
        return Err(Error::parse(path, line, "missing variables"));
    }
    Ok(items)
}

/// Reads a QDIMACS problem from `reader`, returning the quantified Boolean
/// formula it contains. The given `path` is used in diagnostics only.
///
/// The prefix lines must form a contiguous block between the preamble and the
/// first clause; a single-clause matrix is returned as that clause directly,
/// and a single-literal clause as that literal.
pub fn read<R: BufRead>(reader: R, path: impl AsRef<Path>) -> Result<QBF, Error> {
    let path = path.as_ref();

    let mut section = Section::Preamble;
    let mut seen_problem = false;
    let mut prefix: Vec<(bool, Vec<Var>)> = Vec::new();
    let mut clauses: Vec<QBF> = Vec::new();
    let mut number = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        number = index + 1;

        // a line is classified by its first token alone: a variable named
        // `cat` or `paint` does not start a comment or problem line
        let mut tokens = line.split_whitespace().peekable();
        let marker = match tokens.peek() {
            None => continue,
            Some(&token) => token,
        };

        match marker {
            "c" => continue,
            "p" => {
                if seen_problem {
                    return Err(Error::parse(path, number, "unexpected problem line"));
                }
                tokens.next();
                if tokens.next() != Some("cnf") {
                    return Err(Error::parse(path, number, "expecting `p cnf`"));
                }
                // the numeric fields are ignored; the writer recomputes them
                seen_problem = true;
            }
            "a" | "e" => {
                if !seen_problem {
                    return Err(Error::parse(path, number, "missing problem line"));
                }
                if section == Section::Matrix {
                    return Err(Error::parse(path, number, "prefix line after a clause"));
                }
                section = Section::Prefix;
                tokens.next();
                let variables = statement_tokens(tokens, path, number)?
                    .into_iter()
                    .map(|name| parse_variable(name, path, number))
                    .collect::<Result<Vec<_>, _>>()?;
                prefix.push((marker == "a", variables));
            }
            _ => {
                if !seen_problem {
                    return Err(Error::parse(path, number, "missing problem line"));
                }
                section = Section::Matrix;
                let literals = statement_tokens(tokens, path, number)?
                    .into_iter()
                    .map(|token| parse_literal(token, path, number))
                    .collect::<Result<Vec<_>, _>>()?;
                clauses.push(QBF::disjoin(literals));
            }
        }
    }

    if !seen_problem {
        return Err(Error::parse(path, number.max(1), "missing problem line"));
    }
    if clauses.is_empty() {
        return Err(Error::parse(path, number.max(1), "missing clauses"));
    }

    let mut formula = QBF::conjoin(clauses);
    for (universal, variables) in prefix.into_iter().rev() {
        formula = if universal {
            QBF::forall(variables, formula)
        } else {
            QBF::exists(variables, formula)
        }
        .map_err(|e| Error::parse(path, number, e.to_string()))?;
    }
    Ok(formula)
}

fn parse_variable(name: &str, path: &Path, line: usize) -> Result<Var, Error> {
    if name.starts_with('-') || !Var::is_valid_name(name) {
        return Err(Error::parse(
            path,
            line,
            format!("illegal variable name `{}`", name),
        ));
    }
    Ok(Var::from(name))
}

fn parse_literal(token: &str, path: &Path, line: usize) -> Result<QBF, Error> {
    match token.strip_prefix('-') {
        Some(name) => {
            if name.is_empty() || name == "0" || !Var::is_valid_name(name) {
                return Err(Error::parse(path, line, format!("illegal literal `{}`", token)));
            }
            Ok(QBF::not(Var::from(name).into()))
        }
        None => Ok(parse_variable(token, path, line)?.into()),
    }
}

/// Reads a QDIMACS problem from the file at `path`.
pub fn read_file(path: impl AsRef<Path>) -> Result<QBF, Error> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file), path)
}

/// Writes `formula` to `sink` in the QDIMACS format.
///
/// The body of the formula after stripping the prefix must be a CNF matrix:
/// a clause, or a conjunction of clauses, where a clause is a literal or a
/// disjunction of literals. Any other shape fails with [`Error::NotCnf`].
/// Variable names are written exactly as they appear in the formula.
pub fn write<W: Write>(formula: &QBF, mut sink: W) -> Result<(), Error> {
    let mut buffer = String::new();
    let mut variables: HashSet<&str> = HashSet::new();
    let mut clauses = 0;

    for quantifier in formula.prefix() {
        let (letter, bound) = match quantifier {
            QBF::ForAll(this) => ('a', &this.variables),
            QBF::Exists(this) => ('e', &this.variables),
            _ => unreachable!("the prefix stream only produces quantifiers"),
        };
        variables.extend(bound.iter().map(Var::name));
        let names = bound.iter().map(Var::name).join(" ");
        buffer.push_str(&format!("{} {} 0\n", letter, names));
    }

    let matrix = formula.skeleton();
    match matrix {
        QBF::And(this) => {
            for clause in &this.formulas {
                append_clause(clause, &mut buffer, &mut variables, &mut clauses)?;
            }
        }
        clause => append_clause(clause, &mut buffer, &mut variables, &mut clauses)?,
    }

    write!(sink, "p cnf {} {}\n", variables.len(), clauses)?;
    sink.write_all(buffer.as_bytes())?;
    Ok(())
}

// Appends one clause line to the buffer, failing unless `clause` is a literal
// or a disjunction of literals.
fn append_clause<'a>(
    clause: &'a QBF,
    buffer: &mut String,
    variables: &mut HashSet<&'a str>,
    clauses: &mut usize,
) -> Result<(), Error> {
    let line = match clause {
        QBF::Or(this) => this
            .formulas
            .iter()
            .map(|literal| literal_token(literal, variables))
            .collect::<Result<Vec<_>, _>>()?
            .join(" "),
        literal => literal_token(literal, variables)?,
    };
    buffer.push_str(&line);
    buffer.push_str(" 0\n");
    *clauses += 1;
    Ok(())
}

fn literal_token<'a>(
    literal: &'a QBF,
    variables: &mut HashSet<&'a str>,
) -> Result<String, Error> {
    match literal {
        QBF::Variable(v) => {
            variables.insert(v.name());
            Ok(v.name().to_string())
        }
        QBF::Not(this) => match &this.formula {
            QBF::Variable(v) => {
                variables.insert(v.name());
                Ok(format!("-{}", v.name()))
            }
            _ => Err(Error::NotCnf),
        },
        _ => Err(Error::NotCnf),
    }
}

/// Writes `formula` to the file at `path` in the QDIMACS format.
pub fn write_file(formula: &QBF, path: impl AsRef<Path>) -> Result<(), Error> {
    let file = File::create(path)?;
    write(formula, BufWriter::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{and, exists, forall, lit, or};
    use std::io::Cursor;

    fn parse(input: &str) -> Result<QBF, Error> {
        read(Cursor::new(input), "test.qdimacs")
    }

    fn print(formula: &QBF) -> Result<String, Error> {
        let mut sink = Vec::new();
        write(formula, &mut sink)?;
        Ok(String::from_utf8(sink).expect("QDIMACS output is ASCII"))
    }

    #[test]
    fn test_read_prenex_formula() {
        let formula = parse("p cnf 2 1\na 1 0\ne 2 0\n-1 2 0\n").unwrap();
        let expected = QBF::forall(
            vec![Var::from("1")],
            QBF::exists(
                vec![Var::from("2")],
                or!(
                    QBF::not(Var::from("1").into()),
                    QBF::from(Var::from("2"))
                ),
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(expected, formula);
    }

    #[test]
    fn test_read_single_unit_clause() {
        let formula = parse("p cnf 1 1\n1 0\n").unwrap();
        assert_eq!(QBF::from(Var::from("1")), formula);
    }

    #[test]
    fn test_read_single_clause_matrix_is_the_clause() {
        let formula = parse("p cnf 2 1\n1 -2 0\n").unwrap();
        assert!(matches!(formula, QBF::Or(_)));
    }

    #[test]
    fn test_read_multiple_clauses_form_a_conjunction() {
        let formula = parse("p cnf 2 2\n1 2 0\n-1 0\n").unwrap();
        assert!(matches!(formula, QBF::And(_)));
    }

    #[test]
    fn test_read_skips_comments_and_blank_lines() {
        let formula = parse("c a comment\nc another\np cnf 1 1\n\n1 0\n").unwrap();
        assert_eq!(QBF::from(Var::from("1")), formula);
    }

    #[test]
    fn test_read_accepts_tab_separators() {
        let formula = parse("p cnf 2 1\n1\t-2 0\n").unwrap();
        assert!(matches!(formula, QBF::Or(_)));
    }

    #[test]
    fn test_read_variables_starting_with_marker_letters() {
        // a token is a marker only when it is exactly `c`, `p`, `a` or `e`
        let formula = parse("p cnf 4 2\na paint 0\ncat each 0\nant 0\n").unwrap();
        let expected = forall!([paint]; and!(or!(lit!(cat), lit!(each)), lit!(ant)));
        assert_eq!(expected, formula);
    }

    #[test]
    fn test_round_trip_named_variables() {
        let formula = exists!([cat]; lit!(cat));
        let written = print(&formula).unwrap();
        assert_eq!("p cnf 1 1\ne cat 0\ncat 0\n", written);
        assert_eq!(formula, parse(&written).unwrap());
    }

    #[test]
    fn test_read_consecutive_same_kind_levels_stay_separate() {
        let formula = parse("p cnf 2 1\na 1 0\na 2 0\n1 2 0\n").unwrap();
        assert_eq!(2, formula.prefix().count());
    }

    #[test]
    fn test_read_rejects_empty_file() {
        assert!(matches!(parse(""), Err(Error::Parse { line: 1, .. })));
    }

    #[test]
    fn test_read_rejects_missing_problem_line() {
        assert!(matches!(
            parse("a 1 0\ne 2 0\n1 2 0\n"),
            Err(Error::Parse { line: 1, .. })
        ));
    }

    #[test]
    fn test_read_rejects_duplicate_problem_line() {
        assert!(matches!(
            parse("p cnf 1 1\np cnf 1 1\n1 0\n"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_rejects_prefix_line_after_clause() {
        assert!(matches!(
            parse("p cnf 2 2\na 1 0\n1 0\ne 2 0\n2 0\n"),
            Err(Error::Parse { line: 4, .. })
        ));
    }

    #[test]
    fn test_read_rejects_empty_prefix_line() {
        // a terminating 0 alone is not a prefix level
        assert!(matches!(
            parse("p cnf 1 1\na 0\n1 0\n"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_rejects_empty_clause() {
        assert!(matches!(
            parse("p cnf 1 1\n0\n"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_rejects_missing_terminator() {
        assert!(matches!(
            parse("p cnf 2 1\n1 2\n"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_rejects_tokens_after_terminator() {
        assert!(matches!(
            parse("p cnf 2 1\n1 0 2\n"),
            Err(Error::Parse { line: 2, .. })
        ));
    }

    #[test]
    fn test_read_rejects_missing_clauses() {
        assert!(matches!(
            parse("p cnf 1 0\na 1 0\n"),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn test_write_prenex_cnf() {
        let formula = forall!([x]; exists!([y]; and!(or!(lit!(x), lit!(-y)), lit!(y))));
        assert_eq!(
            "p cnf 2 2\na x 0\ne y 0\nx -y 0\ny 0\n",
            print(&formula).unwrap()
        );
    }

    #[test]
    fn test_write_single_literal_matrix() {
        let formula = exists!([x]; lit!(x));
        assert_eq!("p cnf 1 1\ne x 0\nx 0\n", print(&formula).unwrap());
    }

    #[test]
    fn test_write_quantifier_free_clause() {
        let formula = or!(lit!(x), lit!(-y));
        assert_eq!("p cnf 2 1\nx -y 0\n", print(&formula).unwrap());
    }

    #[test]
    fn test_write_counts_prefix_only_variables() {
        // z is bound but does not occur in the matrix
        let formula = forall!([x, z]; or!(lit!(x), lit!(y)));
        assert_eq!("p cnf 3 1\na x z 0\nx y 0\n", print(&formula).unwrap());
    }

    #[test]
    fn test_write_rejects_non_cnf_bodies() {
        // a quantifier below the prefix is not a CNF matrix
        let formula = and!(lit!(x), forall!([y]; lit!(y)));
        assert!(matches!(print(&formula), Err(Error::NotCnf)));

        // a conjunction below a disjunction is not a clause
        let formula = or!(and!(lit!(x), lit!(y)), lit!(z));
        assert!(matches!(print(&formula), Err(Error::NotCnf)));

        // constants are not literals
        assert!(matches!(print(&QBF::True), Err(Error::NotCnf)));
        let formula = and!(lit!(x), QBF::False);
        assert!(matches!(print(&formula), Err(Error::NotCnf)));

        // a negation of a non-variable is not a literal
        let formula = QBF::not(or!(lit!(x), lit!(y)));
        assert!(matches!(print(&formula), Err(Error::NotCnf)));
    }

    #[test]
    fn test_round_trip_preserves_formula() {
        let text = "p cnf 3 2\na 1 2 0\ne 3 0\n-1 3 0\n2 -3 0\n";
        let formula = parse(text).unwrap();
        let written = print(&formula).unwrap();
        assert_eq!(formula, parse(&written).unwrap());
    }

    #[test]
    fn test_header_matches_emission() {
        let formula = forall!([x]; and!(or!(lit!(x), lit!(y)), or!(lit!(-x), lit!(z)), lit!(y)));
        let written = print(&formula).unwrap();
        let header = written.lines().next().unwrap().to_string();
        let clauses = written
            .lines()
            .skip(1)
            .filter(|l| !l.starts_with('a') && !l.starts_with('e'))
            .count();
        assert_eq!(format!("p cnf 3 {}", clauses), header);
    }
}
