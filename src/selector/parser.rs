//! Nom parser for selector expressions
//!
//! ```text
//! selector   = step *(ws step)
//! step       = neighbor / function / attribute / shape-type
//! neighbor   = ">" / "<" / "~>" / "-[" labels "]->" / "<-[" labels "]-"
//! function   = ":" name "(" selector *("," selector) ")"
//! attribute  = "[" path [comparator values ["i"]] "]"
//!            / "[@" [path] ":" assertion *("&&" assertion) "]"
//! ```
//!
//! Once a bracket, function or relationship list is opened, errors are
//! fatal (`cut`) so the reported position points at the real problem.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::{cut, map, opt, peek, recognize},
    error::{ErrorKind, ParseError},
    multi::{many1, separated_list1},
    sequence::{delimited, pair, preceded, terminated},
    IResult,
};

use super::ast::*;
use super::SelectorSyntaxError;
use crate::domain::RelationshipType;

/// Parse error carrying the remaining input (for positions) and a message
#[derive(Debug, PartialEq)]
pub(crate) struct SyntaxFailure<'a> {
    input: &'a str,
    message: String,
}

impl<'a> ParseError<&'a str> for SyntaxFailure<'a> {
    fn from_error_kind(input: &'a str, kind: ErrorKind) -> Self {
        Self {
            input,
            message: format!("Unexpected input ({})", kind.description()),
        }
    }

    fn append(_input: &'a str, _kind: ErrorKind, other: Self) -> Self {
        other
    }

    // Keep the alternative that got furthest
    fn or(self, other: Self) -> Self {
        if other.input.len() < self.input.len() {
            other
        } else {
            self
        }
    }
}

type PResult<'a, T> = IResult<&'a str, T, SyntaxFailure<'a>>;

fn failure<'a, T>(input: &'a str, message: impl Into<String>) -> PResult<'a, T> {
    Err(nom::Err::Failure(SyntaxFailure {
        input,
        message: message.into(),
    }))
}

// =============================================================================
// ENTRY POINT
// =============================================================================

pub(crate) fn parse_selector(expression: &str) -> Result<Vec<Step>, SelectorSyntaxError> {
    if expression.trim().is_empty() {
        return Err(SelectorSyntaxError::new(expression, 0, "Selector expression is empty"));
    }

    let position = |rest: &str| expression.len() - rest.len();

    match terminated(selector, ws)(expression) {
        Ok(("", steps)) => Ok(steps),
        Ok((rest, _)) => Err(SelectorSyntaxError::new(
            expression,
            position(rest),
            format!("Unexpected selector input `{}`", rest.chars().next().unwrap_or(' ')),
        )),
        Err(nom::Err::Error(e) | nom::Err::Failure(e)) => {
            Err(SelectorSyntaxError::new(expression, position(e.input), e.message))
        }
        Err(nom::Err::Incomplete(_)) => Err(SelectorSyntaxError::new(
            expression,
            expression.len(),
            "Unexpected end of selector",
        )),
    }
}

// =============================================================================
// HELPER PARSERS
// =============================================================================

fn ws(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

fn sym<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    char(c)
}

fn lit<'a>(t: &'static str) -> impl FnMut(&'a str) -> PResult<'a, &'a str> {
    tag(t)
}

/// Like `sym`, but a missing character is a fatal error
fn expect<'a>(c: char) -> impl FnMut(&'a str) -> PResult<'a, char> {
    move |input: &'a str| match input.chars().next() {
        Some(found) if found == c => Ok((&input[c.len_utf8()..], c)),
        _ => failure(input, format!("Expected `{}`", c)),
    }
}

fn comma(input: &str) -> PResult<'_, char> {
    delimited(ws, sym(','), ws)(input)
}

fn identifier(input: &str) -> PResult<'_, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn quoted(input: &str) -> PResult<'_, &str> {
    alt((
        delimited(sym('"'), take_until("\""), sym('"')),
        delimited(sym('\''), take_until("'"), sym('\'')),
    ))(input)
}

fn unquoted(input: &str) -> PResult<'_, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || "_.#$-+".contains(c))(input)
}

fn value(input: &str) -> PResult<'_, String> {
    map(alt((quoted, unquoted)), str::to_string)(input)
}

// =============================================================================
// STEPS
// =============================================================================

fn selector(input: &str) -> PResult<'_, Vec<Step>> {
    many1(preceded(ws, step))(input)
}

fn step(input: &str) -> PResult<'_, Step> {
    alt((neighbor, function, attribute, shape_type))(input)
}

fn shape_type(input: &str) -> PResult<'_, Step> {
    let (rest, name) = alt((lit("*"), identifier))(input)?;
    match TypeFilter::from_name(name) {
        Some(filter) => Ok((rest, Step::Type(filter))),
        None => failure(input, format!("Unknown shape type `{}`", name)),
    }
}

fn relationship_label(input: &str) -> PResult<'_, String> {
    let (rest, name) = identifier(input)?;
    if RelationshipType::is_selector_label(name) {
        Ok((rest, name.to_string()))
    } else {
        failure(input, format!("Unknown relationship type `{}`", name))
    }
}

fn labels(input: &str) -> PResult<'_, Vec<String>> {
    delimited(ws, separated_list1(comma, relationship_label), ws)(input)
}

fn neighbor(input: &str) -> PResult<'_, Step> {
    let forward = |labels| {
        Step::Neighbor(NeighborStep {
            direction: Direction::Forward,
            labels,
        })
    };
    let reverse = |labels| {
        Step::Neighbor(NeighborStep {
            direction: Direction::Reverse,
            labels,
        })
    };
    alt((
        map(lit("~>"), |_| Step::Recursive),
        map(
            preceded(lit("-["), cut(terminated(labels, lit("]->")))),
            forward,
        ),
        map(
            preceded(lit("<-["), cut(terminated(labels, lit("]-")))),
            reverse,
        ),
        map(sym('>'), move |_| forward(Vec::new())),
        map(sym('<'), move |_| reverse(Vec::new())),
    ))(input)
}

fn function(input: &str) -> PResult<'_, Step> {
    let (rest, name) = preceded(sym(':'), cut(identifier))(input)?;
    let (rest, mut args) = cut(delimited(
        pair(expect('('), ws),
        separated_list1(comma, selector),
        pair(ws, expect(')')),
    ))(rest)?;

    let step = match name {
        "is" | "each" => Step::Is(args),
        "test" => Step::Test(args),
        "not" if args.len() == 1 => Step::Not(args.remove(0)),
        "not" => return failure(input, ":not accepts exactly one selector"),
        "topdown" if args.len() <= 2 => {
            let qualifier = args.remove(0);
            Step::TopDown {
                qualifier,
                disqualifier: args.pop(),
            }
        }
        "topdown" => return failure(input, ":topdown accepts one or two selectors"),
        other => return failure(input, format!("Unknown selector function `:{}`", other)),
    };
    Ok((rest, step))
}

// =============================================================================
// ATTRIBUTES
// =============================================================================

fn attribute(input: &str) -> PResult<'_, Step> {
    let (rest, _) = sym('[')(input)?;
    cut(terminated(
        alt((scoped_attribute, attribute_filter)),
        pair(ws, expect(']')),
    ))(rest)
}

fn path_segment(input: &str) -> PResult<'_, &str> {
    alt((
        recognize(delimited(sym('('), identifier, sym(')'))),
        take_while1(|c: char| c.is_ascii_alphanumeric() || "_.#$-".contains(c)),
    ))(input)
}

fn path(input: &str) -> PResult<'_, Vec<String>> {
    map(separated_list1(sym('|'), path_segment), |segments| {
        segments.into_iter().map(str::to_string).collect()
    })(input)
}

/// Checks that a shape attribute path starts with a known attribute
fn validate_attribute_path(path: &[String]) -> Result<(), String> {
    let rest: Vec<&str> = path[1..].iter().map(String::as_str).collect();
    match (path[0].as_str(), rest.as_slice()) {
        ("id", []) | ("id", ["namespace" | "name" | "member"]) => Ok(()),
        ("id", _) => Err("`id` only supports `namespace`, `name` and `member`".to_string()),
        ("service", []) | ("service", ["version"]) => Ok(()),
        ("service", _) => Err("`service` only supports `version`".to_string()),
        ("trait", _) => Ok(()),
        (other, _) => Err(format!("Unknown attribute `{}`", other)),
    }
}

fn attribute_path(input: &str) -> PResult<'_, Vec<String>> {
    let (rest, segments) = path(input)?;
    match validate_attribute_path(&segments) {
        Ok(()) => Ok((rest, segments)),
        Err(message) => failure(input, message),
    }
}

fn comparator(input: &str) -> PResult<'_, Comparator> {
    alt((
        map(lit("!="), |_| Comparator::NotEquals),
        map(lit("^="), |_| Comparator::StartsWith),
        map(lit("$="), |_| Comparator::EndsWith),
        map(lit("*="), |_| Comparator::Contains),
        map(lit("?="), |_| Comparator::Exists),
        map(lit(">="), |_| Comparator::GreaterThanOrEqual),
        map(lit("<="), |_| Comparator::LessThanOrEqual),
        map(lit("="), |_| Comparator::Equals),
        map(lit(">"), |_| Comparator::GreaterThan),
        map(lit("<"), |_| Comparator::LessThan),
    ))(input)
}

/// A trailing ` i` before `]` or `&&`
fn case_flag(input: &str) -> PResult<'_, bool> {
    map(
        opt(preceded(
            multispace1,
            terminated(sym('i'), peek(preceded(ws, alt((lit("]"), lit("&&")))))),
        )),
        |flag| flag.is_some(),
    )(input)
}

fn comparison(input: &str) -> PResult<'_, Comparison> {
    let (rest, comparator) = preceded(ws, comparator)(input)?;
    let (rest, values) = cut(preceded(ws, separated_list1(comma, value)))(rest)?;
    let (rest, case_insensitive) = case_flag(rest)?;
    Ok((
        rest,
        Comparison {
            comparator,
            values,
            case_insensitive,
        },
    ))
}

fn attribute_filter(input: &str) -> PResult<'_, Step> {
    let (rest, path) = preceded(ws, attribute_path)(input)?;
    let (rest, comparison) = opt(comparison)(rest)?;
    Ok((rest, Step::Attribute(AttributeFilter { path, comparison })))
}

fn scoped_value(input: &str) -> PResult<'_, ScopedValue> {
    alt((
        map(
            preceded(lit("@{"), cut(terminated(path, expect('}')))),
            ScopedValue::Context,
        ),
        map(value, ScopedValue::Literal),
    ))(input)
}

fn scoped_assertion(input: &str) -> PResult<'_, ScopedAssertion> {
    let (rest, lhs) = scoped_value(input)?;
    let (rest, comparator) = preceded(ws, comparator)(rest)?;
    let (rest, rhs) = preceded(ws, separated_list1(comma, scoped_value))(rest)?;
    let (rest, case_insensitive) = case_flag(rest)?;
    Ok((
        rest,
        ScopedAssertion {
            lhs,
            comparator,
            rhs,
            case_insensitive,
        },
    ))
}

fn scoped_attribute(input: &str) -> PResult<'_, Step> {
    let (rest, _) = preceded(ws, sym('@'))(input)?;
    let (rest, scope) = cut(terminated(opt(attribute_path), preceded(ws, expect(':'))))(rest)?;
    let (rest, assertions) = cut(separated_list1(
        delimited(ws, lit("&&"), ws),
        preceded(ws, scoped_assertion),
    ))(rest)?;
    Ok((
        rest,
        Step::ScopedAttribute(ScopedAttributeFilter {
            scope: scope.unwrap_or_default(),
            assertions,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ShapeType;

    fn parse(expression: &str) -> Vec<Step> {
        parse_selector(expression).unwrap()
    }

    fn error(expression: &str) -> SelectorSyntaxError {
        parse_selector(expression).unwrap_err()
    }

    #[test]
    fn shape_types_and_categories() {
        assert_eq!(parse("*"), vec![Step::Type(TypeFilter::Any)]);
        assert_eq!(
            parse("structure"),
            vec![Step::Type(TypeFilter::Type(ShapeType::Structure))]
        );
        assert_eq!(parse("number"), vec![Step::Type(TypeFilter::Number)]);
        assert_eq!(parse("  simpleType  "), vec![Step::Type(TypeFilter::SimpleType)]);
    }

    #[test]
    fn neighbors() {
        let steps = parse("structure > member ~> string");
        assert_eq!(steps.len(), 5);
        assert_eq!(steps[3], Step::Recursive);

        let steps = parse("operation -[input, output]-> structure");
        assert_eq!(
            steps[1],
            Step::Neighbor(NeighborStep {
                direction: Direction::Forward,
                labels: vec!["input".to_string(), "output".to_string()],
            })
        );

        let steps = parse("member <-[member]- structure");
        assert!(matches!(
            &steps[1],
            Step::Neighbor(NeighborStep { direction: Direction::Reverse, labels }) if labels == &["member"]
        ));

        assert_eq!(parse("structure>member").len(), 3);
    }

    #[test]
    fn attributes() {
        let steps = parse("string[trait|documentation]");
        assert_eq!(
            steps[1],
            Step::Attribute(AttributeFilter {
                path: vec!["trait".to_string(), "documentation".to_string()],
                comparison: None,
            })
        );

        let steps = parse("[id|name ^= 'Get', List i]");
        let Step::Attribute(filter) = &steps[0] else {
            panic!("expected attribute");
        };
        let comparison = filter.comparison.as_ref().unwrap();
        assert_eq!(comparison.comparator, Comparator::StartsWith);
        assert_eq!(comparison.values, vec!["Get", "List"]);
        assert!(comparison.case_insensitive);

        let steps = parse("[trait|http|code >= 400]");
        let Step::Attribute(filter) = &steps[0] else {
            panic!("expected attribute");
        };
        assert_eq!(filter.path, vec!["trait", "http", "code"]);
        assert_eq!(
            filter.comparison.as_ref().unwrap().comparator,
            Comparator::GreaterThanOrEqual
        );

        let steps = parse("[trait|tags|(values) = \"a b\"]");
        let Step::Attribute(filter) = &steps[0] else {
            panic!("expected attribute");
        };
        assert_eq!(filter.path[2], "(values)");
        assert_eq!(filter.comparison.as_ref().unwrap().values, vec!["a b"]);
    }

    #[test]
    fn scoped_attributes() {
        let steps = parse("[@trait|range: @{min} > 1 && @{max} <= 10]");
        let Step::ScopedAttribute(filter) = &steps[0] else {
            panic!("expected scoped attribute");
        };
        assert_eq!(filter.scope, vec!["trait", "range"]);
        assert_eq!(filter.assertions.len(), 2);
        assert_eq!(
            filter.assertions[0].lhs,
            ScopedValue::Context(vec!["min".to_string()])
        );
        assert_eq!(
            filter.assertions[1].rhs,
            vec![ScopedValue::Literal("10".to_string())]
        );

        let steps = parse("[@: @{id|name} = @{id|member}]");
        let Step::ScopedAttribute(filter) = &steps[0] else {
            panic!("expected scoped attribute");
        };
        assert!(filter.scope.is_empty());
    }

    #[test]
    fn functions() {
        let steps = parse(":is(string, integer > member)");
        let Step::Is(alternatives) = &steps[0] else {
            panic!("expected :is");
        };
        assert_eq!(alternatives.len(), 2);
        assert_eq!(alternatives[1].len(), 3);

        assert!(matches!(parse(":each(string)")[0], Step::Is(_)));
        assert!(matches!(parse(":not(string)")[0], Step::Not(_)));
        assert!(matches!(parse("structure :test(> member)")[1], Step::Test(_)));
        assert!(matches!(
            parse(":topdown([trait|sensitive], [trait|private])")[0],
            Step::TopDown { disqualifier: Some(_), .. }
        ));
    }

    #[test]
    fn errors_carry_positions() {
        let err = error("structure :is(");
        assert_eq!(err.expression(), "structure :is(");
        assert_eq!(err.position(), "structure :is(".len());

        let err = error("widget");
        assert_eq!(err.position(), 0);
        assert!(err.message().contains("Unknown shape type"));

        let err = error("string [id|name = foo");
        assert_eq!(err.position(), "string [id|name = foo".len());

        let err = error("operation -[sibling]-> *");
        assert_eq!(err.position(), 12);
        assert!(err.message().contains("sibling"));

        let err = error(":nope(string)");
        assert!(err.message().contains(":nope"));

        let err = error(":not(string, integer)");
        assert_eq!(err.position(), 0);

        let err = error("[color = red]");
        assert_eq!(err.position(), 1);

        assert_eq!(error("").position(), 0);
        assert!(error("string )").message().contains("Unexpected"));
    }
}
