use serde_json::Value as Json;
use winnow::ascii::{dec_int, till_line_ending};
use winnow::combinator::{alt, cut_err, fail, opt, preceded, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::types::{
    boolean, json, number, string, Assertion, ColumnSpec, ConditionNode, ConditionTree, Num,
    Relation,
};

use super::parser::{IndexClause, InstructionBlock, ParsedScript, QueryClause};

// -- Whitespace & comments ----------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

// -- Keywords -----------------------------------------------------------------

fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
    )
        .take()
        .parse_next(input)
}

/// Match one whole keyword, backtracking on a different word so that `a`
/// never eats the front of `and`.
fn keyword(word: &'static str) -> impl FnMut(&mut &str) -> ModalResult<()> {
    move |input: &mut &str| {
        let checkpoint = input.checkpoint();
        let name = ident.parse_next(input)?;
        if name == word {
            Ok(())
        } else {
            input.reset(&checkpoint);
            Err(ErrMode::from_input(input))
        }
    }
}

// -- Literals -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    let quote = alt(('\'', '"')).parse_next(input)?;
    let mut s = String::new();
    loop {
        let ch = any.parse_next(input)?;
        if ch == quote {
            return Ok(s);
        }
        match ch {
            '\\' => {
                let esc = any.parse_next(input)?;
                match esc {
                    '\'' => s.push('\''),
                    '"' => s.push('"'),
                    '\\' => s.push('\\'),
                    'n' => s.push('\n'),
                    't' => s.push('\t'),
                    other => {
                        s.push('\\');
                        s.push(other);
                    }
                }
            }
            c => s.push(c),
        }
    }
}

fn string_list(input: &mut &str) -> ModalResult<Vec<String>> {
    separated(
        1..,
        preceded(
            ws,
            string_literal.context(StrContext::Expected(StrContextValue::Description(
                "a quoted string",
            ))),
        ),
        (ws, ','),
    )
    .parse_next(input)
}

fn negative_number(input: &mut &str) -> ModalResult<Num> {
    let neg_str = (
        '-',
        take_while(1.., |c: char| c.is_ascii_digit() || c == '.'),
    )
        .take()
        .parse_next(input)?;
    if neg_str.contains('.') {
        let f: f64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Num::Float(f))
    } else {
        let i: i64 = neg_str
            .parse()
            .map_err(|_| ErrMode::from_input(input).cut())?;
        Ok(Num::Int(i))
    }
}

fn float_literal(input: &mut &str) -> ModalResult<f64> {
    // Only match floats that contain a decimal point
    (
        take_while(1.., |c: char| c.is_ascii_digit()),
        '.',
        take_while(1.., |c: char| c.is_ascii_digit()),
    )
        .take()
        .try_map(|s: &str| s.parse::<f64>())
        .parse_next(input)
}

fn num_literal(input: &mut &str) -> ModalResult<Num> {
    alt((
        negative_number,
        float_literal.map(Num::Float),
        dec_int::<_, i64, _>.map(Num::Int),
    ))
    .context(StrContext::Expected(StrContextValue::Description("a number")))
    .parse_next(input)
}

// -- Object literals ----------------------------------------------------------

fn json_entry(input: &mut &str) -> ModalResult<(String, Json)> {
    ws.parse_next(input)?;
    let key = string_literal.parse_next(input)?;
    ws.parse_next(input)?;
    cut_err(':')
        .context(StrContext::Expected(StrContextValue::CharLiteral(':')))
        .parse_next(input)?;
    let value = json_value.parse_next(input)?;
    Ok((key, value))
}

fn json_object(input: &mut &str) -> ModalResult<serde_json::Map<String, Json>> {
    (ws, '{').parse_next(input)?;
    let entries: Vec<(String, Json)> = separated(0.., json_entry, (ws, ',')).parse_next(input)?;
    (ws, cut_err('}')).parse_next(input)?;
    Ok(entries.into_iter().collect())
}

fn json_array(input: &mut &str) -> ModalResult<Vec<Json>> {
    (ws, '[').parse_next(input)?;
    let items: Vec<Json> = separated(0.., json_value, (ws, ',')).parse_next(input)?;
    (ws, cut_err(']')).parse_next(input)?;
    Ok(items)
}

fn json_value(input: &mut &str) -> ModalResult<Json> {
    ws.parse_next(input)?;
    alt((
        json_object.map(Json::Object),
        json_array.map(Json::Array),
        string_literal.map(Json::String),
        keyword("true").value(Json::Bool(true)),
        keyword("false").value(Json::Bool(false)),
        keyword("null").value(Json::Null),
        num_literal.verify_map(|n| match n {
            Num::Int(i) => Some(Json::Number(i.into())),
            Num::Float(f) => serde_json::Number::from_f64(f).map(Json::Number),
        }),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "an object value",
    )))
    .parse_next(input)
}

// -- Assertions ---------------------------------------------------------------

#[derive(Clone, Copy, PartialEq)]
enum Kind {
    Str,
    Num,
    Bool,
    Json,
}

fn opt_string_arg(input: &mut &str) -> ModalResult<Option<String>> {
    preceded(
        ws,
        alt((keyword("null").value(None), string_literal.map(Some))),
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "a quoted string or null",
    )))
    .parse_next(input)
}

fn opt_num_arg(input: &mut &str) -> ModalResult<Option<Num>> {
    preceded(ws, alt((keyword("null").value(None), num_literal.map(Some))))
        .context(StrContext::Expected(StrContextValue::Description(
            "a number or null",
        )))
        .parse_next(input)
}

fn opt_bool_arg(input: &mut &str) -> ModalResult<Option<bool>> {
    preceded(
        ws,
        alt((
            keyword("null").value(None),
            keyword("true").value(Some(true)),
            keyword("false").value(Some(false)),
        )),
    )
    .context(StrContext::Expected(StrContextValue::Description(
        "true, false or null",
    )))
    .parse_next(input)
}

/// A non-null string argument; substring operators reject `null` outright.
fn required_string_arg(input: &mut &str) -> ModalResult<String> {
    ws.parse_next(input)?;
    let checkpoint = input.checkpoint();
    if keyword("null").parse_next(input).is_ok() {
        input.reset(&checkpoint);
        return cut_err(fail.context(StrContext::Expected(StrContextValue::Description(
            "a non-null string argument",
        ))))
        .parse_next(input);
    }
    cut_err(string_literal)
        .context(StrContext::Expected(StrContextValue::Description(
            "a quoted string",
        )))
        .parse_next(input)
}

fn in_args<T>(
    input: &mut &str,
    mut element: impl FnMut(&mut &str) -> ModalResult<T>,
) -> ModalResult<Vec<T>> {
    ws.parse_next(input)?;
    cut_err('(')
        .context(StrContext::Expected(StrContextValue::CharLiteral('(')))
        .parse_next(input)?;
    let values: Vec<T> = separated(0.., |i: &mut &str| element(i), (ws, ',')).parse_next(input)?;
    (ws, cut_err(')')).parse_next(input)?;
    Ok(values)
}

fn assertion(input: &mut &str) -> ModalResult<Assertion> {
    ws.parse_next(input)?;
    let kind = alt((
        keyword("str").value(Kind::Str),
        keyword("num").value(Kind::Num),
        keyword("bool").value(Kind::Bool),
        keyword("json").value(Kind::Json),
    ))
    .parse_next(input)?;

    ws.parse_next(input)?;
    let prop = cut_err(string_literal)
        .context(StrContext::Expected(StrContextValue::Description(
            "a quoted property name",
        )))
        .parse_next(input)?;

    ws.parse_next(input)?;
    let op_start = input.checkpoint();
    let op = cut_err(ident)
        .context(StrContext::Expected(StrContextValue::Description(
            "an operator",
        )))
        .parse_next(input)?
        .to_owned();

    match (kind, op.as_str()) {
        (Kind::Str, "is") => Ok(string(prop).is(opt_string_arg.parse_next(input)?.as_deref())),
        (Kind::Str, "not") => Ok(string(prop).not(opt_string_arg.parse_next(input)?.as_deref())),
        (Kind::Str, "contains") => Ok(string(prop).contains(required_string_arg.parse_next(input)?)),
        (Kind::Str, "starts_with") => {
            Ok(string(prop).starts_with(required_string_arg.parse_next(input)?))
        }
        (Kind::Str, "ends_with") => {
            Ok(string(prop).ends_with(required_string_arg.parse_next(input)?))
        }
        (Kind::Str, "in") => {
            let values = in_args(input, opt_string_arg)?;
            let borrowed: Vec<Option<&str>> = values.iter().map(Option::as_deref).collect();
            Ok(string(prop).is_in(&borrowed))
        }
        (Kind::Str, "is_empty") => Ok(string(prop).is_empty()),
        (Kind::Str, "is_present") => Ok(string(prop).is_present()),

        (Kind::Num, "is") => Ok(number(prop).is(opt_num_arg.parse_next(input)?)),
        (Kind::Num, "not") => Ok(number(prop).not(opt_num_arg.parse_next(input)?)),
        (Kind::Num, "in") => Ok(number(prop).is_in(&in_args(input, opt_num_arg)?)),
        (Kind::Num, "is_empty") => Ok(number(prop).is_empty()),
        (Kind::Num, "is_present") => Ok(number(prop).is_present()),

        (Kind::Bool, "is") => Ok(boolean(prop).is(opt_bool_arg.parse_next(input)?)),
        (Kind::Bool, "not") => Ok(boolean(prop).not(opt_bool_arg.parse_next(input)?)),
        (Kind::Bool, "in") => Ok(boolean(prop).is_in(&in_args(input, opt_bool_arg)?)),
        (Kind::Bool, "is_empty") => Ok(boolean(prop).is_empty()),
        (Kind::Bool, "is_present") => Ok(boolean(prop).is_present()),

        (Kind::Json, "is") => Ok(json(prop).is(cut_err(json_object).parse_next(input)?)),
        (Kind::Json, "not") => Ok(json(prop).not(cut_err(json_object).parse_next(input)?)),
        (Kind::Json, "overlaps") => {
            Ok(json(prop).overlaps(cut_err(json_object).parse_next(input)?))
        }
        (Kind::Json, "is_empty") => Ok(json(prop).is_empty()),
        (Kind::Json, "is_present") => Ok(json(prop).is_present()),

        _ => {
            input.reset(&op_start);
            cut_err(fail.context(StrContext::Expected(StrContextValue::Description(
                "a matching operator for the value type",
            ))))
            .parse_next(input)
        }
    }
}

// -- Conditions (no precedence, strictly left to right) -------------------------

fn cond_term(input: &mut &str) -> ModalResult<ConditionNode> {
    ws.parse_next(input)?;
    alt((
        preceded('(', cut_err((condition, ws, ')')))
            .map(|(tree, (), _)| ConditionNode::Group(tree)),
        assertion.map(ConditionNode::Assertion),
    ))
    .context(StrContext::Expected(StrContextValue::Description(
        "an assertion or a parenthesized group",
    )))
    .parse_next(input)
}

fn condition(input: &mut &str) -> ModalResult<ConditionTree> {
    let first = cond_term.parse_next(input)?;
    let mut tree = ConditionTree::new().or(first);
    loop {
        let relation = opt(preceded(
            ws,
            alt((
                keyword("and").value(Relation::And),
                keyword("or").value(Relation::Or),
            )),
        ))
        .parse_next(input)?;
        let Some(relation) = relation else {
            return Ok(tree);
        };
        let term = cut_err(cond_term).parse_next(input)?;
        tree = match relation {
            Relation::And => tree.and(term),
            Relation::Or => tree.or(term),
        };
    }
}

// -- Query blocks ---------------------------------------------------------------

fn limit_value(input: &mut &str) -> ModalResult<u64> {
    ws.parse_next(input)?;
    let start = input.checkpoint();
    let n: i64 = cut_err(dec_int::<_, i64, _>)
        .context(StrContext::Expected(StrContextValue::Description(
            "a limit count",
        )))
        .parse_next(input)?;
    match u64::try_from(n) {
        Ok(limit) => Ok(limit),
        Err(_) => {
            input.reset(&start);
            cut_err(fail.context(StrContext::Expected(StrContextValue::Description(
                "a non-negative limit",
            ))))
            .parse_next(input)
        }
    }
}

fn column(input: &mut &str) -> ModalResult<ColumnSpec> {
    ws.parse_next(input)?;
    let prop = string_literal.parse_next(input)?;
    let title = opt(preceded(
        (ws, keyword("as"), ws),
        cut_err(string_literal).context(StrContext::Expected(StrContextValue::Description(
            "a column title",
        ))),
    ))
    .parse_next(input)?;
    Ok(ColumnSpec::new(prop, title))
}

fn column_list(input: &mut &str) -> ModalResult<Vec<ColumnSpec>> {
    separated(1.., column, (ws, ',')).parse_next(input)
}

fn where_clause(input: &mut &str) -> ModalResult<QueryClause> {
    keyword("where").parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;
    let tree = cut_err(condition).parse_next(input)?;
    (ws, cut_err('}')).parse_next(input)?;
    Ok(QueryClause::Where(tree))
}

fn query_clause(input: &mut &str) -> ModalResult<QueryClause> {
    ws.parse_next(input)?;
    alt((
        preceded(
            alt((keyword("an"), keyword("a"))),
            cut_err(preceded(ws, string_literal)).context(StrContext::Expected(
                StrContextValue::Description("a quoted type name"),
            )),
        )
        .map(QueryClause::Single),
        preceded(keyword("every"), cut_err(string_list)).map(QueryClause::Every),
        preceded(keyword("from"), cut_err(string_list)).map(QueryClause::From),
        where_clause,
        preceded(keyword("limit"), limit_value).map(QueryClause::Limit),
        preceded(keyword("show"), cut_err(column_list)).map(QueryClause::Show),
    ))
    .parse_next(input)
}

fn query_block(input: &mut &str) -> ModalResult<InstructionBlock> {
    keyword("query").parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;
    let clauses: Vec<QueryClause> = repeat(0.., query_clause).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('}')
        .context(StrContext::Expected(StrContextValue::Description(
            "a query clause or '}'",
        )))
        .parse_next(input)?;
    Ok(InstructionBlock::Query(clauses))
}

// -- Index blocks -----------------------------------------------------------------

fn index_clause(input: &mut &str) -> ModalResult<IndexClause> {
    ws.parse_next(input)?;
    alt((
        preceded(keyword("types"), cut_err(string_list)).map(IndexClause::Types),
        preceded(keyword("schemas"), cut_err(string_list)).map(IndexClause::Schemas),
    ))
    .parse_next(input)
}

fn index_block(input: &mut &str) -> ModalResult<InstructionBlock> {
    keyword("index").parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('{')
        .context(StrContext::Expected(StrContextValue::CharLiteral('{')))
        .parse_next(input)?;
    let clauses: Vec<IndexClause> = repeat(0.., index_clause).parse_next(input)?;
    ws.parse_next(input)?;
    cut_err('}')
        .context(StrContext::Expected(StrContextValue::Description(
            "an index clause or '}'",
        )))
        .parse_next(input)?;
    Ok(InstructionBlock::Index(clauses))
}

// -- Top-level parser ----------------------------------------------------------

pub fn parse_script(input: &mut &str) -> ModalResult<ParsedScript> {
    let blocks: Vec<InstructionBlock> = repeat(
        0..,
        preceded(
            ws,
            alt((query_block, index_block)).context(StrContext::Expected(
                StrContextValue::Description("a 'query' or 'index' block"),
            )),
        ),
    )
    .parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedScript { blocks })
}
