/* A (class, method, shorty) triple naming one method in a dex file */

use nom::bytes::complete::{is_a, tag, take_until, take_while1};
use nom::character::complete::char;
use nom::combinator::all_consuming;
use nom::sequence::tuple;
use nom::IResult;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

const SHORTY_CHARS: &str = "VZBSCIJFDL";

#[derive(Debug)]
pub struct QueryError {
    pub details: String,
}

impl QueryError {
    pub fn new(msg: &str) -> QueryError {
        QueryError {
            details: msg.to_string(),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for QueryError {}

/// Identifies a method by declaring class descriptor, name and prototype shorty.
///
/// # Examples
///
/// ```
/// use dexhollow::query::MethodQuery;
///
/// let q: MethodQuery = "Lcom/example/Check;->isRooted:Z".parse().unwrap();
/// assert_eq!(q.class_name(), "Lcom/example/Check;");
///
/// let q = MethodQuery::new("com.example.Check", "isRooted", "Z").unwrap();
/// assert_eq!(q.to_string(), "Lcom/example/Check;->isRooted:Z");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodQuery {
    class_name: String,
    method_name: String,
    shorty: String,
}

impl MethodQuery {
    /// Builds a query. A Java style class name (`com.example.Foo`) is turned into its descriptor.
    pub fn new(class_name: &str, method_name: &str, shorty: &str) -> Result<MethodQuery, QueryError> {
        if class_name.is_empty() {
            return Err(QueryError::new("empty class name"));
        }
        if method_name.is_empty() {
            return Err(QueryError::new("empty method name"));
        }
        if shorty.is_empty() || !shorty.chars().all(|c| SHORTY_CHARS.contains(c)) {
            return Err(QueryError::new(&format!("invalid shorty '{}'", shorty)));
        }
        Ok(MethodQuery {
            class_name: to_descriptor(class_name),
            method_name: method_name.to_string(),
            shorty: shorty.to_string(),
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    pub fn shorty(&self) -> &str {
        &self.shorty
    }
}

fn to_descriptor(class_name: &str) -> String {
    if class_name.starts_with('[') || (class_name.starts_with('L') && class_name.ends_with(';')) {
        class_name.to_string()
    } else {
        format!("L{};", class_name.replace('.', "/"))
    }
}

fn parse_query(input: &str) -> IResult<&str, (&str, &str, &str)> {
    let (input, (class_name, _, method_name, _, shorty)) = all_consuming(tuple((
        take_until("->"),
        tag("->"),
        take_while1(|c: char| c != ':'),
        char(':'),
        is_a(SHORTY_CHARS),
    )))(input)?;
    Ok((input, (class_name, method_name, shorty)))
}

impl FromStr for MethodQuery {
    type Err = QueryError;

    /// Parses `Lpkg/Cls;->name:SHORTY`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (_, (class_name, method_name, shorty)) = parse_query(s.trim())
            .map_err(|_| QueryError::new(&format!("cannot parse method query '{}'", s)))?;
        MethodQuery::new(class_name, method_name, shorty)
    }
}

impl fmt::Display for MethodQuery {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}->{}:{}", self.class_name, self.method_name, self.shorty)
    }
}
