//! a module turns a String expression into a symbolic expression
//!# Example
//! ```
//! use RustedCylindrical::symbolic::symbolic_engine::Expr;
//! let parsed = Expr::parse_expression("r**2 * sin(theta) + exp(-z)", &["r", "theta", "z"]).unwrap();
//! println!("parsed_expression {}", parsed);
//! ```

use crate::symbolic::symbolic_engine::Expr;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit0, digit1, multispace0, one_of},
    combinator::{map_res, not, opt, recognize},
    error::ErrorKind,
    multi::many0,
    sequence::{delimited, pair, preceded, terminated},
};
use std::f64::consts::{E, PI};
use thiserror::Error;
//  grammar (lowest precedence first)
//      sum     := product (('+' | '-') product)*
//      product := unary (('*' | '/') unary)*
//      unary   := ('-' | '+') unary | power
//      power   := primary (('**' | '^') unary)?
//      primary := '(' sum ')' | number | name '(' sum ')' | name

/// Reasons a text can not be turned into an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expression is empty")]
    Empty,
    #[error("unbalanced parentheses at position {position}")]
    UnbalancedParentheses { position: usize },
    #[error("unknown identifier '{name}'")]
    UnknownIdentifier { name: String },
    #[error("unknown function '{name}'")]
    UnknownFunction { name: String },
    #[error("syntax error at position {position} near '{fragment}'")]
    Syntax { position: usize, fragment: String },
}

const FUNCTIONS: [&str; 9] = ["sin", "cos", "tan", "tg", "exp", "log", "ln", "sqrt", "abs"];
const CONSTANTS: [&str; 2] = ["pi", "e"];

impl Expr {
    /// Parses `input` into an expression whose free variables all belong to `variables`.
    ///
    /// Accepts `+ - * /`, powers written `**` or `^`, unary signs, parentheses, decimal numbers
    /// with optional exponent, the functions sin cos tan exp log sqrt (with aliases tg, ln, abs)
    /// and the constants pi and e.
    pub fn parse_expression(input: &str, variables: &[&str]) -> Result<Expr, ParseError> {
        if input.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        check_parentheses(input)?;
        check_identifiers(input, variables)?;

        match parse_sum(input) {
            Ok((rest, expr)) => {
                let rest = rest.trim_start();
                if !rest.is_empty() {
                    return Err(syntax_error(input, rest));
                }
                if let Some(name) = expr
                    .extract_variables()
                    .into_iter()
                    .find(|name| !variables.contains(&name.as_str()))
                {
                    return Err(ParseError::UnknownIdentifier { name });
                }
                Ok(expr)
            }
            Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(syntax_error(input, e.input)),
            Err(nom::Err::Incomplete(_)) => Err(ParseError::Syntax {
                position: input.len(),
                fragment: String::new(),
            }),
        }
    }
}

fn syntax_error(input: &str, remaining: &str) -> ParseError {
    ParseError::Syntax {
        position: input.len() - remaining.len(),
        fragment: remaining.chars().take(12).collect(),
    }
}

/// Every ')' must close an earlier '(' and every '(' must be closed.
fn check_parentheses(input: &str) -> Result<(), ParseError> {
    let mut open = Vec::new();
    for (position, c) in input.char_indices() {
        match c {
            '(' => open.push(position),
            ')' => {
                if open.pop().is_none() {
                    return Err(ParseError::UnbalancedParentheses { position });
                }
            }
            _ => {}
        }
    }
    match open.pop() {
        Some(position) => Err(ParseError::UnbalancedParentheses { position }),
        None => Ok(()),
    }
}

/// Lexical pass over the names in the text: a name followed by '(' must be a known function,
/// any other name must be an allowed variable, a constant or a function name.
fn check_identifiers(input: &str, variables: &[&str]) -> Result<(), ParseError> {
    let bytes = input.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        let starts_number = c.is_ascii_digit()
            || (c == b'.' && i + 1 < bytes.len() && bytes[i + 1].is_ascii_digit());
        if starts_number {
            i = skip_number(bytes, i);
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            let name = &input[start..i];
            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let is_call = j < bytes.len() && bytes[j] == b'(';
            if is_call && !FUNCTIONS.contains(&name) {
                return Err(ParseError::UnknownFunction {
                    name: name.to_string(),
                });
            }
            if !is_call
                && !variables.contains(&name)
                && !CONSTANTS.contains(&name)
                && !FUNCTIONS.contains(&name)
            {
                return Err(ParseError::UnknownIdentifier {
                    name: name.to_string(),
                });
            }
        } else {
            i += 1;
        }
    }
    Ok(())
}

fn skip_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
        i += 1;
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        if j < bytes.len() && bytes[j].is_ascii_digit() {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}

fn parse_sum(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_product(input)?;
    let operator = preceded(multispace0, alt((char('+'), char('-'))));
    let mut parser = many0(pair(operator, parse_product));
    let (input, rest) = parser.parse(input)?;

    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '+' => Expr::Add(acc.boxed(), rhs.boxed()),
        _ => Expr::Sub(acc.boxed(), rhs.boxed()),
    });
    Ok((input, expr))
}

fn parse_product(input: &str) -> IResult<&str, Expr> {
    let (input, first) = parse_unary(input)?;
    // a lone '*', the pair "**" belongs to the power rule
    let multiply = terminated(char('*'), not(char('*')));
    let operator = preceded(multispace0, alt((multiply, char('/'))));
    let mut parser = many0(pair(operator, parse_unary));
    let (input, rest) = parser.parse(input)?;

    let expr = rest.into_iter().fold(first, |acc, (op, rhs)| match op {
        '*' => Expr::Mul(acc.boxed(), rhs.boxed()),
        _ => Expr::Div(acc.boxed(), rhs.boxed()),
    });
    Ok((input, expr))
}

fn parse_unary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let mut sign = opt(alt((char('-'), char('+'))));
    let (input, sign) = sign.parse(input)?;
    match sign {
        Some('-') => {
            let (input, operand) = parse_unary(input)?;
            Ok((input, negate(operand)))
        }
        Some(_) => parse_unary(input),
        None => parse_power(input),
    }
}

fn negate(expr: Expr) -> Expr {
    match expr {
        Expr::Const(val) => Expr::Const(-val),
        other => -other,
    }
}

/// right associative: the exponent is itself a unary, so 2^3^2 = 2^9 and r**-1 is allowed
fn parse_power(input: &str) -> IResult<&str, Expr> {
    let (input, base) = parse_primary(input)?;
    let operator = preceded(multispace0, alt((tag("**"), tag("^"))));
    let mut exponent = opt(preceded(operator, parse_unary));
    let (input, exponent) = exponent.parse(input)?;
    match exponent {
        Some(exp) => Ok((input, Expr::Pow(base.boxed(), exp.boxed()))),
        None => Ok((input, base)),
    }
}

fn parse_primary(input: &str) -> IResult<&str, Expr> {
    let (input, _) = multispace0(input)?;
    let mut parser = alt((parse_parens, parse_number, parse_call_or_name));
    parser.parse(input)
}

fn parse_parens(input: &str) -> IResult<&str, Expr> {
    let mut parser = delimited(char('('), parse_sum, preceded(multispace0, char(')')));
    parser.parse(input)
}

/// 2, 2.5, 2., .5, 1e-3, 2.5E+4
fn parse_number(input: &str) -> IResult<&str, Expr> {
    let mantissa = alt((
        recognize(pair(digit1, opt(pair(char('.'), digit0)))),
        recognize(pair(char('.'), digit1)),
    ));
    let exponent = opt(recognize(pair(one_of("eE"), pair(opt(one_of("+-")), digit1))));
    let mut parser = map_res(recognize(pair(mantissa, exponent)), |s: &str| {
        s.parse::<f64>()
    });
    let (input, value) = parser.parse(input)?;
    Ok((input, Expr::Const(value)))
}

fn parse_name(input: &str) -> IResult<&str, &str> {
    let mut parser = recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ));
    parser.parse(input)
}

fn parse_call_or_name(input: &str) -> IResult<&str, Expr> {
    let (rest, name) = parse_name(input)?;
    let mut argument = opt(delimited(
        preceded(multispace0, char('(')),
        parse_sum,
        preceded(multispace0, char(')')),
    ));
    let (rest, argument) = argument.parse(rest)?;

    let expr = match argument {
        Some(arg) => build_function(name, arg),
        None if FUNCTIONS.contains(&name) => None,
        None => Some(match name {
            "pi" => Expr::Const(PI),
            "e" => Expr::Const(E),
            _ => Expr::Var(name.to_string()),
        }),
    };
    match expr {
        Some(expr) => Ok((rest, expr)),
        None => Err(nom::Err::Failure(nom::error::Error::new(
            input,
            ErrorKind::Verify,
        ))),
    }
}

fn build_function(name: &str, arg: Expr) -> Option<Expr> {
    let expr = match name {
        "sin" => Expr::sin(arg.boxed()),
        "cos" => Expr::cos(arg.boxed()),
        "tan" | "tg" => Expr::tg(arg.boxed()),
        "exp" => Expr::Exp(arg.boxed()),
        "log" | "ln" => Expr::Ln(arg.boxed()),
        "sqrt" => Expr::Pow(arg.boxed(), Expr::Const(0.5).boxed()),
        "abs" => Expr::Abs(arg.boxed()),
        _ => return None,
    };
    Some(expr)
}
