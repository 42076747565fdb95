//! Minimal ARFF reader for openSMILE GeMaps descriptor files.
//!
//! Supports `@relation`, `@attribute`, `@data` and dense data rows. Values are
//! numbers, quoted or bare strings, or `?` for missing.

use nom::{
    branch::alt,
    bytes::complete::{tag_no_case, take_while, take_while1},
    character::complete::{alpha1, char, multispace0, multispace1, space0},
    combinator::{all_consuming, map, rest},
    multi::separated_list1,
    sequence::{delimited, preceded},
    IResult,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArffError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: data row has {found} values, expected {expected}")]
    RowWidth {
        line: usize,
        found: usize,
        expected: usize,
    },

    #[error("missing @data section")]
    MissingData,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArffValue {
    Number(f64),
    Text(String),
    Missing,
}

impl ArffValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArffAttribute {
    pub name: String,
    /// Declared type, e.g. `numeric` or `string`
    pub kind: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArffDocument {
    pub relation: Option<String>,
    pub attributes: Vec<ArffAttribute>,
    pub data: Vec<Vec<ArffValue>>,
}

impl ArffDocument {
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|attribute| attribute.name.as_str())
    }
}

pub fn parse_arff(text: &str) -> Result<ArffDocument, ArffError> {
    let mut document = ArffDocument::default();
    let mut in_data = false;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('%') {
            continue;
        }

        if in_data {
            let (_, values) = all_consuming(data_row)(line).map_err(|err| ArffError::Syntax {
                line: line_no,
                message: err.to_string(),
            })?;
            if values.len() != document.attributes.len() {
                return Err(ArffError::RowWidth {
                    line: line_no,
                    found: values.len(),
                    expected: document.attributes.len(),
                });
            }
            document.data.push(values);
            continue;
        }

        let syntax = |message: String| ArffError::Syntax {
            line: line_no,
            message,
        };
        let (_, keyword) = directive(line).map_err(|err| syntax(err.to_string()))?;
        match keyword.to_ascii_lowercase().as_str() {
            "relation" => {
                let (_, name) = relation_line(line).map_err(|err| syntax(err.to_string()))?;
                document.relation = Some(name.trim().to_string());
            }
            "attribute" => {
                let (_, (name, kind)) =
                    attribute_line(line).map_err(|err| syntax(err.to_string()))?;
                document.attributes.push(ArffAttribute {
                    name: name.to_string(),
                    kind: kind.trim().to_string(),
                });
            }
            "data" => in_data = true,
            other => return Err(syntax(format!("unknown directive @{}", other))),
        }
    }

    if !in_data {
        return Err(ArffError::MissingData);
    }
    Ok(document)
}

fn directive(input: &str) -> IResult<&str, &str> {
    preceded(char('@'), alpha1)(input)
}

fn quoted(input: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('\''), take_while(|c: char| c != '\''), char('\'')),
        delimited(char('"'), take_while(|c: char| c != '"'), char('"')),
    ))(input)
}

fn token(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace())(input)
}

fn relation_line(input: &str) -> IResult<&str, &str> {
    let (input, _) = tag_no_case("@relation")(input)?;
    let (input, _) = multispace1(input)?;
    alt((quoted, rest))(input)
}

fn attribute_line(input: &str) -> IResult<&str, (&str, &str)> {
    let (input, _) = tag_no_case("@attribute")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = alt((quoted, token))(input)?;
    let (input, _) = multispace0(input)?;
    let (input, kind) = rest(input)?;
    Ok((input, (name, kind)))
}

fn data_value(input: &str) -> IResult<&str, ArffValue> {
    delimited(
        space0,
        alt((
            map(quoted, |text| ArffValue::Text(text.to_string())),
            map(take_while1(|c: char| c != ','), classify_bare),
        )),
        space0,
    )(input)
}

fn data_row(input: &str) -> IResult<&str, Vec<ArffValue>> {
    separated_list1(char(','), data_value)(input)
}

fn classify_bare(raw: &str) -> ArffValue {
    let value = raw.trim();
    if value == "?" {
        ArffValue::Missing
    } else if let Ok(number) = value.parse::<f64>() {
        ArffValue::Number(number)
    } else {
        ArffValue::Text(value.to_string())
    }
}
