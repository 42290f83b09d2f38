//! Textual rule syntax
//!
//! ```text
//! IF age IS tua AND (trestbps IS tinggi OR chol IS tinggi) THEN risk IS tinggi
//! IF thalach IS tinggi AND oldpeak IS normal THEN risk IS rendah WITH 0.8
//! ```
//!
//! Keywords are case-insensitive. AND binds tighter than OR; parentheses
//! group. Several consequents may be joined with AND, each with an optional
//! `WITH <weight>`.

use nom::{
    IResult,
    branch::alt,
    bytes::complete::take_while,
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map, opt, recognize, verify},
    multi::{many0, separated_list1},
    number::complete::double,
    sequence::{delimited, pair, preceded, tuple},
};

use crate::error::{FuzzyError, FuzzyResult};
use super::rule::{Antecedent, Consequent, Rule};

const KEYWORDS: &[&str] = &["if", "then", "and", "or", "is", "with"];

/// Parse a single rule
pub fn parse_rule(text: &str) -> FuzzyResult<Rule> {
    let trimmed = text.trim();
    match all_consuming(rule)(trimmed) {
        Ok((_, rule)) => Ok(rule),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let position = trimmed.len() - e.input.len();
            let near: String = e.input.chars().take(16).collect();
            Err(FuzzyError::rule_syntax(format!(
                "Cannot parse rule at position {}{}",
                position,
                if near.is_empty() { " (unexpected end)".to_string() } else { format!(" near '{}'", near) }
            ))
            .with_context("rule", trimmed)
            .with_context("position", position.to_string())
            .with_hint("Rules look like: IF age IS tua AND chol IS tinggi THEN risk IS tinggi"))
        }
        Err(nom::Err::Incomplete(_)) => Err(FuzzyError::rule_syntax("Incomplete rule").with_context("rule", trimmed)),
    }
}

/// Parse one rule per line, skipping blank lines and `#` comments
pub fn parse_rules(text: &str) -> FuzzyResult<Vec<Rule>> {
    text.lines()
        .enumerate()
        .map(|(n, line)| (n, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
        .map(|(n, line)| parse_rule(line).map_err(|e| e.with_context("line", (n + 1).to_string())))
        .collect()
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn word(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn keyword<'a>(kw: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    ws(verify(word, move |s: &str| s.eq_ignore_ascii_case(kw)))
}

fn identifier(input: &str) -> IResult<&str, &str> {
    ws(verify(word, |s: &str| !KEYWORDS.iter().any(|k| s.eq_ignore_ascii_case(k))))(input)
}

fn term(input: &str) -> IResult<&str, Antecedent> {
    map(
        tuple((identifier, keyword("is"), identifier)),
        |(variable, _, label)| Antecedent::term(variable, label),
    )(input)
}

fn atom(input: &str) -> IResult<&str, Antecedent> {
    alt((
        delimited(ws(char('(')), or_expr, ws(char(')'))),
        term,
    ))(input)
}

fn and_expr(input: &str) -> IResult<&str, Antecedent> {
    let (input, first) = atom(input)?;
    let (input, rest) = many0(preceded(keyword("and"), atom))(input)?;
    Ok((input, rest.into_iter().fold(first, Antecedent::and)))
}

fn or_expr(input: &str) -> IResult<&str, Antecedent> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(keyword("or"), and_expr))(input)?;
    Ok((input, rest.into_iter().fold(first, Antecedent::or)))
}

fn consequent(input: &str) -> IResult<&str, Consequent> {
    map(
        tuple((
            identifier,
            keyword("is"),
            identifier,
            opt(preceded(keyword("with"), ws(double))),
        )),
        |(variable, _, label, weight)| Consequent::new(variable, label).with_weight(weight.unwrap_or(1.0)),
    )(input)
}

fn rule(input: &str) -> IResult<&str, Rule> {
    let (input, _) = keyword("if")(input)?;
    let (input, antecedent) = or_expr(input)?;
    let (input, _) = keyword("then")(input)?;
    let (input, consequents) = separated_list1(keyword("and"), consequent)(input)?;
    Ok((
        input,
        Rule {
            name: None,
            antecedent,
            consequents,
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_simple_rule() {
        let rule = parse_rule("IF age IS tua THEN risk IS tinggi").unwrap();
        assert_eq!(rule.antecedent, Antecedent::term("age", "tua"));
        assert_eq!(rule.consequents, vec![Consequent::new("risk", "tinggi")]);
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let rule = parse_rule("if a is x or b is y and c is z then out is hi").unwrap();
        let expected = Antecedent::term("a", "x")
            .or(Antecedent::term("b", "y").and(Antecedent::term("c", "z")));
        assert_eq!(rule.antecedent, expected);
    }

    #[test]
    fn test_parentheses_group() {
        let rule = parse_rule("IF (a IS x OR b IS y) AND c IS z THEN out IS hi").unwrap();
        let expected = Antecedent::term("a", "x")
            .or(Antecedent::term("b", "y"))
            .and(Antecedent::term("c", "z"));
        assert_eq!(rule.antecedent, expected);
    }

    #[test]
    fn test_flat_conjunction() {
        let rule = parse_rule("IF age IS tua AND trestbps IS tinggi AND chol IS tinggi THEN risk IS tinggi")
            .unwrap();
        assert_eq!(rule.antecedent.terms().len(), 3);
        assert!(matches!(rule.antecedent, Antecedent::And(ref c) if c.len() == 3));
    }

    #[test]
    fn test_weights_and_multiple_consequents() {
        let rule = parse_rule("IF a IS x THEN risk IS tinggi WITH 0.25 AND alert IS on").unwrap();
        assert_eq!(rule.consequents.len(), 2);
        assert!((rule.consequents[0].weight - 0.25).abs() < 1e-12);
        assert_eq!(rule.consequents[1].weight, 1.0);
        assert_eq!(rule.consequents[1].variable, "alert");
    }

    #[test]
    fn test_display_reparses() {
        let text = "IF (oldpeak IS tinggi OR trestbps IS tinggi) AND age IS tua THEN risk IS tinggi WITH 0.5";
        let rule = parse_rule(text).unwrap();
        assert_eq!(rule.to_string(), text);
        assert_eq!(parse_rule(&rule.to_string()).unwrap(), rule);
    }

    #[test]
    fn test_syntax_errors() {
        for bad in [
            "",
            "age IS tua THEN risk IS tinggi",
            "IF age IS tua",
            "IF age tua THEN risk IS tinggi",
            "IF (age IS tua THEN risk IS tinggi",
            "IF age IS and THEN risk IS tinggi",
            "IF age IS tua THEN risk IS tinggi extra",
        ] {
            let err = parse_rule(bad).unwrap_err();
            assert_eq!(err.code, ErrorCode::RuleSyntax, "input: {}", bad);
        }
    }

    #[test]
    fn test_parse_rules_skips_comments() {
        let rules = parse_rules(
            "# reference rules\n\
             IF a IS x THEN out IS hi\n\
             \n\
             IF b IS y THEN out IS lo\n",
        )
        .unwrap();
        assert_eq!(rules.len(), 2);

        let err = parse_rules("IF a IS x THEN out IS hi\nIF broken").unwrap_err();
        assert_eq!(err.context_field("line"), Some("2"));
    }
}
